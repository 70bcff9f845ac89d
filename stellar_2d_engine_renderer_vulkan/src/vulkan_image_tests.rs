//! Unit tests for the layout-transition helpers

use super::*;

#[test]
fn test_subresource_range_covers_one_mip_and_layer() {
    let range = subresource_range(vk::ImageAspectFlags::COLOR);
    assert_eq!(range.aspect_mask, vk::ImageAspectFlags::COLOR);
    assert_eq!(range.base_mip_level, 0);
    assert_eq!(range.level_count, 1);
    assert_eq!(range.layer_count, 1);
}

#[test]
fn test_layout_access_transfer_dst() {
    let (access, stage) = layout_access(vk::ImageLayout::TRANSFER_DST_OPTIMAL);
    assert_eq!(access, vk::AccessFlags::TRANSFER_WRITE);
    assert_eq!(stage, vk::PipelineStageFlags::TRANSFER);
}

#[test]
fn test_layout_access_undefined_waits_on_nothing() {
    let (access, stage) = layout_access(vk::ImageLayout::UNDEFINED);
    assert!(access.is_empty());
    assert_eq!(stage, vk::PipelineStageFlags::TOP_OF_PIPE);
}

#[test]
fn test_layout_access_depth_attachment() {
    let (access, stage) = layout_access(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL);
    assert!(access.contains(vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE));
    assert!(stage.contains(vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS));
}

#[test]
fn test_layout_barrier_present_to_transfer() {
    let barrier = layout_barrier(
        vk::Image::null(),
        vk::ImageAspectFlags::COLOR,
        vk::ImageLayout::PRESENT_SRC_KHR,
        vk::ImageLayout::TRANSFER_DST_OPTIMAL,
    );
    assert_eq!(barrier.old_layout, vk::ImageLayout::PRESENT_SRC_KHR);
    assert_eq!(barrier.new_layout, vk::ImageLayout::TRANSFER_DST_OPTIMAL);
    assert_eq!(barrier.src_access_mask, vk::AccessFlags::COLOR_ATTACHMENT_WRITE);
    assert_eq!(barrier.dst_access_mask, vk::AccessFlags::TRANSFER_WRITE);
    assert_eq!(barrier.src_queue_family_index, vk::QUEUE_FAMILY_IGNORED);
    assert_eq!(barrier.subresource_range.aspect_mask, vk::ImageAspectFlags::COLOR);
}
