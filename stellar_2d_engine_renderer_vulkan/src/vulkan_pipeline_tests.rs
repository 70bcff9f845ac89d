use super::*;

#[test]
fn test_vertex_bindings_strides_and_rates() {
    let bindings = vertex_binding_descriptions();
    assert_eq!(bindings[0].binding, 0);
    assert_eq!(bindings[0].stride, 24);
    assert_eq!(bindings[0].input_rate, vk::VertexInputRate::VERTEX);
    assert_eq!(bindings[1].binding, 1);
    assert_eq!(bindings[1].stride, 40);
    assert_eq!(bindings[1].input_rate, vk::VertexInputRate::INSTANCE);
}

#[test]
fn test_vertex_attributes_locations_are_contiguous() {
    let attributes = vertex_attribute_descriptions();
    let locations: Vec<u32> = attributes.iter().map(|a| a.location).collect();
    assert_eq!(locations, vec![0, 1, 2, 3, 4]);
}

#[test]
fn test_vertex_attributes_match_record_layouts() {
    let attributes = vertex_attribute_descriptions();

    // Vertex2D: position vec2, color vec4
    assert_eq!((attributes[0].binding, attributes[0].offset), (0, 0));
    assert_eq!(attributes[0].format, vk::Format::R32G32_SFLOAT);
    assert_eq!((attributes[1].binding, attributes[1].offset), (0, 8));
    assert_eq!(attributes[1].format, vk::Format::R32G32B32A32_SFLOAT);

    // MeshInstance: scale vec2, position vec3, color vec4 after the type id
    assert_eq!((attributes[2].binding, attributes[2].offset), (1, 4));
    assert_eq!(attributes[2].format, vk::Format::R32G32_SFLOAT);
    assert_eq!((attributes[3].binding, attributes[3].offset), (1, 12));
    assert_eq!(attributes[3].format, vk::Format::R32G32B32_SFLOAT);
    assert_eq!((attributes[4].binding, attributes[4].offset), (1, 24));
    assert_eq!(attributes[4].format, vk::Format::R32G32B32A32_SFLOAT);
}

#[test]
fn test_instance_attributes_fit_inside_stride() {
    let stride = vertex_binding_descriptions()[1].stride;
    let color = vertex_attribute_descriptions()[4];
    // vec4 of f32
    assert!(color.offset + 16 <= stride);
}

#[test]
fn test_alpha_blend_factors() {
    let attachment = alpha_blend_attachment();
    assert_eq!(attachment.blend_enable, vk::TRUE);
    assert_eq!(attachment.src_color_blend_factor, vk::BlendFactor::SRC_ALPHA);
    assert_eq!(attachment.dst_color_blend_factor, vk::BlendFactor::ONE_MINUS_SRC_ALPHA);
    assert_eq!(attachment.color_write_mask, vk::ColorComponentFlags::RGBA);
}
