//! Minify-only plugin.

use async_trait::async_trait;

use crate::compiler::Compiler;
use crate::error::Result;
use crate::escape;
use crate::options::MinifyOptions;
use crate::plugin::{ChunkInfo, Plugin, TransformOutput};
use crate::swc_plugin::decode_output;

pub const PLUGIN_NAME: &str = "swc-minify";

/// Minifies every rendered chunk. Modules are left to other plugins.
#[derive(Debug, Clone)]
pub struct MinifyPlugin {
    options: MinifyOptions,
    compiler: Compiler,
}

impl MinifyPlugin {
    pub fn new(options: MinifyOptions) -> Self {
        Self::with_compiler(options, Compiler::new())
    }

    pub fn with_compiler(options: MinifyOptions, compiler: Compiler) -> Self {
        Self { options, compiler }
    }
}

#[async_trait]
impl Plugin for MinifyPlugin {
    fn name(&self) -> &'static str {
        PLUGIN_NAME
    }

    async fn render_chunk(&self, code: &str, chunk: &ChunkInfo) -> Result<Option<TransformOutput>> {
        let output = self
            .compiler
            .minify(
                escape::encode(code).into_owned(),
                &chunk.file_name,
                self.options.clone(),
            )
            .await?;
        Ok(Some(decode_output(output)))
    }
}
