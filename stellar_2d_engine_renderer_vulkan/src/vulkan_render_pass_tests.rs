use super::*;

#[test]
fn test_color_attachment_is_loaded_in_present_layout() {
    let [color, _] = attachment_descriptions(vk::Format::B8G8R8A8_UNORM, vk::Format::D32_SFLOAT);
    assert_eq!(color.format, vk::Format::B8G8R8A8_UNORM);
    assert_eq!(color.load_op, vk::AttachmentLoadOp::LOAD);
    assert_eq!(color.store_op, vk::AttachmentStoreOp::STORE);
    assert_eq!(color.initial_layout, vk::ImageLayout::PRESENT_SRC_KHR);
    assert_eq!(color.final_layout, vk::ImageLayout::PRESENT_SRC_KHR);
}

#[test]
fn test_depth_attachment_is_cleared_every_pass() {
    let [_, depth] = attachment_descriptions(vk::Format::B8G8R8A8_UNORM, vk::Format::D32_SFLOAT);
    assert_eq!(depth.format, vk::Format::D32_SFLOAT);
    assert_eq!(depth.load_op, vk::AttachmentLoadOp::CLEAR);
    assert_eq!(depth.initial_layout, vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL);
    assert_eq!(depth.final_layout, vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL);
}
