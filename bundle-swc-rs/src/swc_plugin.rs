//! Transpiles TypeScript/JSX modules and optionally minifies chunks.

use std::path::Path;

use async_trait::async_trait;
use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use log::{debug, trace};

use crate::compiler::Compiler;
use crate::error::Result;
use crate::escape;
use crate::filter::{accepted_extension, Filter};
use crate::options::{merge, CompilerOptions, PluginOptions, SourceMapsConfig};
use crate::plugin::{ChunkInfo, Plugin, TransformOutput};
use crate::resolver::resolve_import;
use crate::tsconfig;

pub const PLUGIN_NAME: &str = "swc";

/// Plugin that resolves extensionless relative imports, compiles eligible
/// modules, and minifies rendered chunks when `minify` is set.
#[derive(Debug, Clone)]
pub struct SwcPlugin {
    options: PluginOptions,
    filter: Filter,
    compiler: Compiler,
}

impl SwcPlugin {
    pub fn new(options: PluginOptions) -> Result<Self> {
        Self::with_compiler(options, Compiler::new())
    }

    /// Shares an existing compiler worker instead of starting a new one.
    pub fn with_compiler(options: PluginOptions, compiler: Compiler) -> Result<Self> {
        let filter = Filter::new(options.include.as_deref(), options.exclude.as_deref())?;
        Ok(Self {
            options,
            filter,
            compiler,
        })
    }

    pub fn options(&self) -> &PluginOptions {
        &self.options
    }

    async fn compiler_options_for(&self, id: &str) -> Result<CompilerOptions> {
        let directory = Path::new(id).parent().unwrap_or_else(|| Path::new(""));
        let ambient = tsconfig::load(directory, &self.options.tsconfig).await?;
        let options = merge(&ambient, &self.options.compiler, id);
        trace!("Merged options for {}: {:?}", id, options);
        Ok(options)
    }
}

#[async_trait]
impl Plugin for SwcPlugin {
    fn name(&self) -> &'static str {
        PLUGIN_NAME
    }

    async fn resolve_id(&self, specifier: &str, importer: Option<&str>) -> Result<Option<String>> {
        Ok(resolve_import(specifier, importer)
            .await
            .map(|path| path.to_string_lossy().into_owned()))
    }

    async fn transform(&self, code: &str, id: &str) -> Result<Option<TransformOutput>> {
        if !self.filter.should_process(id) {
            debug!("Skipping {}: filtered out", id.escape_debug());
            return Ok(None);
        }
        if accepted_extension(id).is_none() {
            debug!("Skipping {}: unsupported extension", id);
            return Ok(None);
        }

        let options = self.compiler_options_for(id).await?;
        let inline_map = options.source_maps == Some(SourceMapsConfig::Inline);
        let output = self
            .compiler
            .transform(escape::encode(code).into_owned(), options)
            .await?;
        let output = decode_output(output);
        Ok(Some(if inline_map {
            inline_source_map(output)
        } else {
            output
        }))
    }

    async fn render_chunk(&self, code: &str, chunk: &ChunkInfo) -> Result<Option<TransformOutput>> {
        if self.options.compiler.minify != Some(true) {
            return Ok(None);
        }
        let minify_options = self.options.compiler.jsc.minify.clone().unwrap_or_default();
        let output = self
            .compiler
            .minify(
                escape::encode(code).into_owned(),
                &chunk.file_name,
                minify_options,
            )
            .await?;
        Ok(Some(decode_output(output)))
    }
}

/// Restores virtual module ids in compiler output. The source map is JSON,
/// so the sentinel goes back in escaped form.
pub(crate) fn decode_output(output: TransformOutput) -> TransformOutput {
    TransformOutput {
        code: escape::decode(&output.code).into_owned(),
        map: output.map.map(|map| escape::decode_json(&map).into_owned()),
    }
}

/// Moves the source map into a data URL comment at the end of the code.
fn inline_source_map(output: TransformOutput) -> TransformOutput {
    let TransformOutput { mut code, map } = output;
    if let Some(map) = map {
        code.push_str("\n//# sourceMappingURL=data:application/json;base64,");
        BASE64_STANDARD.encode_string(map, &mut code);
    }
    TransformOutput { code, map: None }
}
