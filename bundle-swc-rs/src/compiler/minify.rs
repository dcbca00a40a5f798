//! Chunk minification through oxc's compressor and mangler.

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use oxc_allocator::Allocator;
use oxc_codegen::{Codegen, CodegenOptions};
use oxc_minifier::{CompressOptions, MangleOptions, Minifier, MinifierOptions};
use oxc_parser::Parser;
use oxc_span::SourceType;

use super::text::strip_bom;
use crate::options::MinifyOptions;
use crate::plugin::TransformOutput;

/// Compresses and mangles `code` (an ES module), then prints it minified.
pub fn minify(code: &str, file_name: &str, options: &MinifyOptions) -> Result<TransformOutput> {
    let allocator = Allocator::default();
    let parsed = Parser::new(&allocator, strip_bom(code), SourceType::mjs()).parse();
    if let Some(error) = parsed.errors.first() {
        return Err(anyhow!("{}: {}", file_name, error));
    }
    let mut program = parsed.program;

    let minifier_options = MinifierOptions {
        mangle: options.mangle.unwrap_or(true).then(MangleOptions::default),
        compress: options.compress.unwrap_or(true).then(CompressOptions::default),
    };
    let minified = Minifier::new(minifier_options).minify(&allocator, &mut program);

    let mut codegen_options = CodegenOptions::minify();
    if options.source_map.unwrap_or(false) {
        codegen_options.source_map_path = Some(PathBuf::from(file_name));
    }
    let printed = Codegen::new()
        .with_options(codegen_options)
        .with_scoping(minified.scoping)
        .build(&program);

    let map = match printed.map {
        Some(map) => Some(finish_map(
            &map.to_json_string(),
            options.inline_sources_content.unwrap_or(false),
        )?),
        None => None,
    };
    Ok(TransformOutput {
        code: printed.code,
        map,
    })
}

fn finish_map(map: &str, inline_sources: bool) -> Result<String> {
    let mut value: serde_json::Value = serde_json::from_str(map)?;
    if !inline_sources {
        if let Some(object) = value.as_object_mut() {
            object.remove("sourcesContent");
        }
    }
    Ok(serde_json::to_string(&value)?)
}
