//! Parsing, transforming and code generation through deno_ast's swc.

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use deno_ast::swc;
use deno_ast::swc::ast::EsVersion;
use deno_ast::swc::common::comments::SingleThreadedComments;
use deno_ast::swc::common::{Globals, Mark, GLOBALS};
use deno_ast::swc::parser::lexer::Lexer;
use deno_ast::swc::parser::{EsSyntax, StringInput, TsSyntax};
use deno_ast::{
    DecoratorsTranspileOption, JsxAutomaticOptions, JsxClassicOptions, JsxRuntime, Marks,
    MediaType, ModuleSpecifier, ParseDiagnostic, SourceMap, SourceTextInfo, TranspileOptions,
};

use super::text::strip_bom;
use crate::options::{CompilerOptions, ParserConfig, ReactRuntime, SourceMapsConfig, Syntax};
use crate::plugin::TransformOutput;
use crate::resolver::absolutize;

const DEFAULT_PRAGMA: &str = "React.createElement";
const DEFAULT_PRAGMA_FRAG: &str = "React.Fragment";

/// Maps a `target` option (`es5`, `es2020`, `esnext`, ...) to a codegen version.
pub fn parse_target(target: &str) -> Option<EsVersion> {
    let version = match target.to_ascii_lowercase().as_str() {
        "es3" => EsVersion::Es3,
        "es5" => EsVersion::Es5,
        "es6" | "es2015" => EsVersion::Es2015,
        "es2016" => EsVersion::Es2016,
        "es2017" => EsVersion::Es2017,
        "es2018" => EsVersion::Es2018,
        "es2019" => EsVersion::Es2019,
        "es2020" => EsVersion::Es2020,
        "es2021" => EsVersion::Es2021,
        "es2022" => EsVersion::Es2022,
        "es2023" | "es2024" | "esnext" => EsVersion::EsNext,
        _ => return None,
    };
    Some(version)
}

/// Strips types, compiles JSX and decorators, and prints `code` at `target`.
pub fn transform(code: &str, options: &CompilerOptions, target: EsVersion) -> Result<TransformOutput> {
    let file_name = options.filename.as_deref().unwrap_or("input.js");
    let specifier = specifier_for(file_name)?;
    let media_type = MediaType::from_path(Path::new(file_name));
    let syntax = syntax_for(&options.jsc.parser, media_type);
    let transpile_options = transpile_options(options);
    let source_maps = options.source_maps.unwrap_or(SourceMapsConfig::Bool(true));

    let globals = Globals::new();
    GLOBALS.set(&globals, || {
        let cm = SourceMap::default();
        let comments = SingleThreadedComments::default();
        let (module, diagnostics) = parse_module(&specifier, code, syntax, &cm, &comments)?;

        let marks = Marks {
            top_level: Mark::fresh(Mark::root()),
            unresolved: Mark::new(),
        };
        let program = deno_ast::fold_program(
            swc::ast::Program::Module(module),
            &transpile_options,
            &cm,
            &comments,
            &marks,
            Box::new(diagnostics.iter()),
        )?;
        let module = match program {
            swc::ast::Program::Module(module) => module,
            _ => unreachable!(),
        };

        let source_map = source_maps != SourceMapsConfig::Bool(false);
        emit_module(&module, &cm, &comments, target, source_map)
    })
}

fn specifier_for(file_name: &str) -> Result<ModuleSpecifier> {
    let path = absolutize(Path::new(file_name));
    ModuleSpecifier::from_file_path(&path)
        .map_err(|_| anyhow!("Cannot convert \"{}\" to a module specifier", file_name))
}

fn syntax_for(parser: &ParserConfig, media_type: MediaType) -> swc::parser::Syntax {
    let is_typescript = matches!(
        media_type,
        MediaType::TypeScript | MediaType::Mts | MediaType::Cts | MediaType::Tsx
    );
    let syntax = parser.syntax.unwrap_or(if is_typescript {
        Syntax::Typescript
    } else {
        Syntax::Ecmascript
    });
    let decorators = parser.decorators.unwrap_or(false);

    match syntax {
        Syntax::Typescript => swc::parser::Syntax::Typescript(TsSyntax {
            tsx: parser.tsx.unwrap_or(media_type == MediaType::Tsx),
            decorators,
            dts: false,
            no_early_errors: true,
            disallow_ambiguous_jsx_like: false,
        }),
        Syntax::Ecmascript => swc::parser::Syntax::Es(EsSyntax {
            jsx: parser.jsx.unwrap_or(media_type == MediaType::Jsx),
            decorators,
            ..Default::default()
        }),
    }
}

fn transpile_options(options: &CompilerOptions) -> TranspileOptions {
    let transform = &options.jsc.transform;
    let decorators = if transform.legacy_decorator.unwrap_or(false) {
        DecoratorsTranspileOption::LegacyTypeScript {
            emit_metadata: transform.decorator_metadata.unwrap_or(false),
        }
    } else {
        DecoratorsTranspileOption::Ecma
    };

    let react = &transform.react;
    let jsx = match react.runtime.unwrap_or(ReactRuntime::Classic) {
        ReactRuntime::Classic => Some(JsxRuntime::Classic(JsxClassicOptions {
            factory: react.pragma.clone().unwrap_or_else(|| DEFAULT_PRAGMA.to_string()),
            fragment_factory: react
                .pragma_frag
                .clone()
                .unwrap_or_else(|| DEFAULT_PRAGMA_FRAG.to_string()),
        })),
        ReactRuntime::Automatic => Some(JsxRuntime::Automatic(JsxAutomaticOptions {
            development: react.development.unwrap_or(false),
            import_source: react.import_source.clone(),
        })),
        ReactRuntime::Preserve => None,
    };

    TranspileOptions {
        decorators,
        jsx,
        ..Default::default()
    }
}

type ParsedModule = (swc::ast::Module, Vec<ParseDiagnostic>);

fn parse_module(
    specifier: &ModuleSpecifier,
    code: &str,
    syntax: swc::parser::Syntax,
    cm: &SourceMap,
    comments: &SingleThreadedComments,
) -> Result<ParsedModule> {
    let source_file = cm.new_source_file(specifier.clone(), strip_bom(code).to_string());
    let input = StringInput::from(&*source_file);
    let lexer = Lexer::new(syntax, deno_ast::ES_VERSION, input, Some(comments));
    let mut parser = swc::parser::Parser::new_from(lexer);
    let module = parser.parse_module().map_err(|e| {
        ParseDiagnostic::from_swc_error(
            e,
            specifier,
            SourceTextInfo::from_string(source_file.src.to_string()),
        )
    })?;

    let diagnostics = {
        let errors = parser.take_errors();
        if errors.is_empty() {
            Vec::new()
        } else {
            let info = SourceTextInfo::from_string(source_file.src.to_string());
            errors
                .into_iter()
                .map(|e| ParseDiagnostic::from_swc_error(e, specifier, info.clone()))
                .collect()
        }
    };

    Ok((module, diagnostics))
}

fn emit_module(
    module: &swc::ast::Module,
    cm: &SourceMap,
    comments: &SingleThreadedComments,
    target: EsVersion,
    source_map: bool,
) -> Result<TransformOutput> {
    let mut buf = Vec::new();
    let mut srcmap = Vec::new();
    {
        // can't use struct expr because Config has #[non_exhaustive]
        let mut cfg = swc::codegen::Config::default();
        cfg.minify = false;
        cfg.ascii_only = false;
        cfg.target = target;
        cfg.omit_last_semi = false;
        let wr = Box::new(swc::codegen::text_writer::JsWriter::new(
            cm.inner().clone(),
            "\n",
            &mut buf,
            Some(&mut srcmap),
        ));
        let mut emitter = swc::codegen::Emitter {
            cfg,
            cm: cm.inner().clone(),
            comments: Some(comments as &dyn swc::common::comments::Comments),
            wr,
        };
        emitter
            .emit_module(module)
            .context("Unable to emit module.")?;
    }

    let code = String::from_utf8(buf).context("Emitted code is an invalid string.")?;
    let mut map = None;
    if source_map {
        let mut map_buf = Vec::new();
        let source_map_config = deno_ast::SourceMapConfig {
            inline_sources: true,
            maybe_base: None,
        };
        cm.inner()
            .build_source_map(&srcmap, None, source_map_config)
            .to_writer(&mut map_buf)?;
        map = Some(String::from_utf8(map_buf)?);
    }

    Ok(TransformOutput { code, map })
}
