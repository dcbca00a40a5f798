#![allow(clippy::uninlined_format_args)]
#![doc = include_str!("../README.md")]

pub mod compiler;
pub mod error;
pub mod escape;
pub mod filter;
pub mod minify_plugin;
pub mod options;
pub mod plugin;
pub mod resolver;
pub mod swc_plugin;
pub mod tsconfig;

#[macro_use]
extern crate lazy_static;

pub use compiler::Compiler;
pub use error::{Error, Result};
pub use filter::FilterPattern;
pub use minify_plugin::MinifyPlugin;
pub use options::{CompilerOptions, MinifyOptions, PluginOptions};
pub use plugin::{ChunkInfo, Plugin, TransformOutput};
pub use swc_plugin::SwcPlugin;
pub use tsconfig::TsconfigOption;
pub use serde_json;
