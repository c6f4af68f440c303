pub use vmcore::types;

pub mod action_sheet;
pub mod audio;
pub mod config;
pub mod error;
pub mod gates;
pub mod host;
pub mod plugin;
pub mod registry;
pub mod scoped;
pub mod settings;
pub mod transform;

pub use plugin::{Plugin, PluginBuilder};
