//! Plugin descriptor exported by every backend

use std::fmt;
use bitflags::bitflags;
use crate::plugin::GraphicsPlugin;

/// Name of the exported descriptor function
pub const PLUGIN_DESCRIPTOR_SYMBOL: &str = "stellar2d_plugin_descriptor";

/// Signature of the exported descriptor function
pub type PluginDescriptorFn = fn() -> &'static PluginDescriptor;

/// Kind of functionality a plugin provides
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginType {
    Graphics,
}

/// Release date of a plugin build
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PluginVersion {
    pub year: u16,
    pub month: u8,
    pub day: u8,
}

impl fmt::Display for PluginVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}.{:02}.{:02}", self.year, self.month, self.day)
    }
}

bitflags! {
    /// Platforms a plugin build supports
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PlatformFlags: u32 {
        const WINDOWS = 1 << 0;
        const LINUX = 1 << 1;
        const MACOS = 1 << 2;
        const ANDROID = 1 << 3;
        const IOS = 1 << 4;
    }
}

impl PlatformFlags {
    /// Flag of the platform this crate was compiled for
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Self::WINDOWS
        } else if cfg!(target_os = "android") {
            Self::ANDROID
        } else if cfg!(target_os = "ios") {
            Self::IOS
        } else if cfg!(target_os = "macos") {
            Self::MACOS
        } else {
            Self::LINUX
        }
    }
}

/// Function table specific to the plugin type
#[derive(Clone, Copy)]
pub enum PluginData {
    Graphics(&'static dyn GraphicsPlugin),
}

impl fmt::Debug for PluginData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PluginData::Graphics(_) => write!(f, "PluginData::Graphics"),
        }
    }
}

/// Static description of a plugin
#[derive(Debug)]
pub struct PluginDescriptor {
    pub plugin_type: PluginType,
    pub name: &'static str,
    pub version: PluginVersion,
    pub license: &'static str,
    pub platform: PlatformFlags,
    pub plugin_data: PluginData,
    /// Create the plugin-global state; false on failure
    pub init: fn() -> bool,
    /// Release the plugin-global state; all contexts must be destroyed first
    pub deinit: fn(),
}

impl PluginDescriptor {
    /// Graphics table, if this is a graphics plugin
    pub fn graphics(&self) -> Option<&'static dyn GraphicsPlugin> {
        match self.plugin_data {
            PluginData::Graphics(table) if self.plugin_type == PluginType::Graphics => Some(table),
            _ => None,
        }
    }

    /// Whether the plugin can run on the current platform
    pub fn supports_current_platform(&self) -> bool {
        self.platform.contains(PlatformFlags::current())
    }
}

#[cfg(test)]
#[path = "plugin_tests.rs"]
mod tests;
