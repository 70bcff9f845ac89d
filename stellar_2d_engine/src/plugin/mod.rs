//! Plugin ABI
//!
//! A graphics backend exports one `PluginDescriptor` through the fixed symbol
//! named by `PLUGIN_DESCRIPTOR_SYMBOL`. The host resolves that symbol, calls
//! `init`, then drives rendering through the `GraphicsPlugin` table.

mod descriptor;
mod graphics_plugin;

pub use descriptor::*;
pub use graphics_plugin::*;
