//! Renderer module - backend-agnostic GPU abstractions
//!
//! Backends implement these traits with their own resource types; the mesh
//! manager and batch renderer are written once against them.

pub mod buffer;
pub mod command_list;
pub mod config;
pub mod frame_ring;
pub mod graphics_device;
pub mod swapchain;

#[cfg(test)]
pub mod mock_graphics_device;

pub use buffer::*;
pub use command_list::*;
pub use config::*;
pub use frame_ring::*;
pub use graphics_device::*;
pub use swapchain::*;
