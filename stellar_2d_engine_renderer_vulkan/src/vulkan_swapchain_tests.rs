use super::*;

fn capabilities(min_count: u32, max_count: u32, current: (u32, u32)) -> vk::SurfaceCapabilitiesKHR {
    vk::SurfaceCapabilitiesKHR {
        min_image_count: min_count,
        max_image_count: max_count,
        current_extent: vk::Extent2D { width: current.0, height: current.1 },
        min_image_extent: vk::Extent2D { width: 16, height: 16 },
        max_image_extent: vk::Extent2D { width: 4096, height: 2048 },
        ..Default::default()
    }
}

fn format(format: vk::Format) -> vk::SurfaceFormatKHR {
    vk::SurfaceFormatKHR {
        format,
        color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
    }
}

// ============================================================================
// clamp_extent
// ============================================================================

#[test]
fn test_clamp_extent_uses_fixed_current_extent() {
    let caps = capabilities(2, 3, (800, 600));
    let extent = clamp_extent(&caps, 1024, 768);
    assert_eq!((extent.width, extent.height), (800, 600));
}

#[test]
fn test_clamp_extent_follows_window_when_surface_is_flexible() {
    let caps = capabilities(2, 3, (u32::MAX, u32::MAX));
    let extent = clamp_extent(&caps, 1024, 768);
    assert_eq!((extent.width, extent.height), (1024, 768));
}

#[test]
fn test_clamp_extent_clamps_to_supported_range() {
    let caps = capabilities(2, 3, (u32::MAX, u32::MAX));
    let extent = clamp_extent(&caps, 8, 4000);
    assert_eq!((extent.width, extent.height), (16, 2048));
}

// ============================================================================
// SwapchainSize
// ============================================================================

#[test]
fn test_size_clamped_extent_still_matches_its_window() {
    let caps = capabilities(2, 3, (u32::MAX, u32::MAX));
    let size = SwapchainSize::for_window(&caps, 5000, 1000);

    assert_eq!((size.extent.width, size.extent.height), (4096, 1000));
    assert!(size.matches((5000, 1000)));
    assert!(!size.matches((4096, 1000)));
}

#[test]
fn test_size_fixed_extent_still_matches_its_window() {
    let caps = capabilities(2, 3, (799, 600));
    let size = SwapchainSize::for_window(&caps, 800, 600);

    assert_eq!((size.extent.width, size.extent.height), (799, 600));
    assert!(size.matches((800, 600)));
}

#[test]
fn test_size_detects_resized_window() {
    let caps = capabilities(2, 3, (u32::MAX, u32::MAX));
    let size = SwapchainSize::for_window(&caps, 800, 600);

    assert!(size.matches((800, 600)));
    assert!(!size.matches((1024, 768)));
    assert!(!size.matches((0, 0)));
}

// ============================================================================
// choose_present_mode
// ============================================================================

#[test]
fn test_present_mode_mailbox_when_preferred_and_available() {
    let modes = [vk::PresentModeKHR::FIFO, vk::PresentModeKHR::MAILBOX];
    assert_eq!(choose_present_mode(&modes, true), vk::PresentModeKHR::MAILBOX);
}

#[test]
fn test_present_mode_fifo_when_mailbox_missing() {
    let modes = [vk::PresentModeKHR::FIFO, vk::PresentModeKHR::IMMEDIATE];
    assert_eq!(choose_present_mode(&modes, true), vk::PresentModeKHR::FIFO);
}

#[test]
fn test_present_mode_fifo_when_low_latency_not_preferred() {
    let modes = [vk::PresentModeKHR::MAILBOX, vk::PresentModeKHR::FIFO];
    assert_eq!(choose_present_mode(&modes, false), vk::PresentModeKHR::FIFO);
}

// ============================================================================
// choose_image_count
// ============================================================================

#[test]
fn test_image_count_is_one_above_minimum() {
    assert_eq!(choose_image_count(&capabilities(2, 8, (1, 1))), 3);
}

#[test]
fn test_image_count_clamped_to_maximum() {
    assert_eq!(choose_image_count(&capabilities(3, 3, (1, 1))), 3);
}

#[test]
fn test_image_count_unbounded_maximum() {
    assert_eq!(choose_image_count(&capabilities(4, 0, (1, 1))), 5);
}

// ============================================================================
// choose_surface_format
// ============================================================================

#[test]
fn test_surface_format_takes_first_advertised() {
    let formats = [format(vk::Format::R8G8B8A8_UNORM), format(vk::Format::B8G8R8A8_SRGB)];
    assert_eq!(choose_surface_format(&formats, None), Some(formats[0]));
}

#[test]
fn test_surface_format_undefined_means_any() {
    let formats = [format(vk::Format::UNDEFINED)];
    let chosen = choose_surface_format(&formats, None).unwrap();
    assert_eq!(chosen.format, vk::Format::B8G8R8A8_UNORM);
    assert_eq!(chosen.color_space, vk::ColorSpaceKHR::SRGB_NONLINEAR);
}

#[test]
fn test_surface_format_keeps_previous_when_still_available() {
    let formats = [format(vk::Format::R8G8B8A8_UNORM), format(vk::Format::B8G8R8A8_SRGB)];
    let previous = format(vk::Format::B8G8R8A8_SRGB);
    assert_eq!(choose_surface_format(&formats, Some(previous)), Some(previous));
}

#[test]
fn test_surface_format_previous_gone_falls_back_to_first() {
    let formats = [format(vk::Format::R8G8B8A8_UNORM)];
    let previous = format(vk::Format::B8G8R8A8_SRGB);
    assert_eq!(choose_surface_format(&formats, Some(previous)), Some(formats[0]));
}

#[test]
fn test_surface_format_none_when_nothing_advertised() {
    assert_eq!(choose_surface_format(&[], None), None);
}
