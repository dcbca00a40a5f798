//! Plugin and compiler options.
//!
//! Compiler options come from three layers, merged field by field with the
//! later layer winning:
//!
//! 1. values derived from the ambient `tsconfig.json` and the file extension,
//! 2. the user's [`PluginOptions::compiler`],
//! 3. a per-call override fixing `filename` and turning `minify` off.
//!
//! Every field is an `Option` so an unset field never clobbers a lower layer.
//! Nested groups (`jsc`, `jsc.parser`, `jsc.transform.react`, ...) are merged
//! key-wise; lists are replaced, not concatenated.

use crate::filter::FilterPattern;
use crate::tsconfig::{AmbientConfig, TsconfigOption};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Options given to [`SwcPlugin`](crate::SwcPlugin) at construction.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PluginOptions {
    /// Ids to process. Defaults to [`DEFAULT_INCLUDE`](crate::filter::DEFAULT_INCLUDE).
    #[serde(deserialize_with = "one_or_many")]
    pub include: Option<Vec<FilterPattern>>,
    /// Ids to skip. Defaults to [`DEFAULT_EXCLUDE`](crate::filter::DEFAULT_EXCLUDE).
    #[serde(deserialize_with = "one_or_many")]
    pub exclude: Option<Vec<FilterPattern>>,
    /// Where ambient compiler settings come from.
    pub tsconfig: TsconfigOption,
    /// Passed through to the compiler. `filename` is overwritten per module.
    #[serde(flatten)]
    pub compiler: CompilerOptions,
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Option<Vec<FilterPattern>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(FilterPattern),
        Many(Vec<FilterPattern>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => None,
        Some(OneOrMany::One(pattern)) => Some(vec![pattern]),
        Some(OneOrMany::Many(patterns)) => Some(patterns),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Syntax {
    Typescript,
    Ecmascript,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParserConfig {
    pub syntax: Option<Syntax>,
    pub tsx: Option<bool>,
    pub jsx: Option<bool>,
    pub decorators: Option<bool>,
}

/// How JSX elements are compiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactRuntime {
    /// `React.createElement` style calls using `pragma`/`pragma_frag`.
    Classic,
    /// `jsx()` calls imported from `import_source`.
    Automatic,
    /// JSX is left in the output.
    Preserve,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReactConfig {
    pub runtime: Option<ReactRuntime>,
    pub pragma: Option<String>,
    pub pragma_frag: Option<String>,
    pub import_source: Option<String>,
    pub development: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransformConfig {
    pub legacy_decorator: Option<bool>,
    pub decorator_metadata: Option<bool>,
    pub react: ReactConfig,
}

/// Options for minifying a rendered chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MinifyOptions {
    /// ECMAScript version of the emitted code, e.g. `es2020`.
    pub target: Option<String>,
    /// Run the compressor (dead code removal, constant folding). Defaults to on.
    pub compress: Option<bool>,
    /// Shorten local binding names. Defaults to on.
    pub mangle: Option<bool>,
    /// Produce a source map for the minified chunk.
    pub source_map: Option<bool>,
    /// Embed original sources in the source map.
    pub inline_sources_content: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JscConfig {
    pub parser: ParserConfig,
    pub transform: TransformConfig,
    pub target: Option<String>,
    pub base_url: Option<PathBuf>,
    pub paths: Option<BTreeMap<String, Vec<String>>>,
    pub external_helpers: Option<bool>,
    pub minify: Option<MinifyOptions>,
}

/// `sourceMaps: true | false | "inline"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceMapsConfig {
    Bool(bool),
    Inline,
}

impl<'de> Deserialize<'de> for SourceMapsConfig {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Bool(bool),
            Str(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Bool(b) => Ok(SourceMapsConfig::Bool(b)),
            Raw::Str(s) if s == "inline" => Ok(SourceMapsConfig::Inline),
            Raw::Str(s) => Err(serde::de::Error::custom(format!(
                "expected true, false or \"inline\" for sourceMaps, got \"{s}\""
            ))),
        }
    }
}

/// The option surface handed to the compiler.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompilerOptions {
    pub filename: Option<String>,
    pub minify: Option<bool>,
    pub source_maps: Option<SourceMapsConfig>,
    pub jsc: JscConfig,
}

/// Field-wise merge where `top` wins wherever it is set.
trait Overlay {
    fn overlay(self, top: Self) -> Self;
}

impl<T: Overlay> Overlay for Option<T> {
    fn overlay(self, top: Self) -> Self {
        match (self, top) {
            (Some(base), Some(top)) => Some(base.overlay(top)),
            (base, top) => top.or(base),
        }
    }
}

impl Overlay for ParserConfig {
    fn overlay(self, top: Self) -> Self {
        Self {
            syntax: top.syntax.or(self.syntax),
            tsx: top.tsx.or(self.tsx),
            jsx: top.jsx.or(self.jsx),
            decorators: top.decorators.or(self.decorators),
        }
    }
}

impl Overlay for ReactConfig {
    fn overlay(self, top: Self) -> Self {
        Self {
            runtime: top.runtime.or(self.runtime),
            pragma: top.pragma.or(self.pragma),
            pragma_frag: top.pragma_frag.or(self.pragma_frag),
            import_source: top.import_source.or(self.import_source),
            development: top.development.or(self.development),
        }
    }
}

impl Overlay for TransformConfig {
    fn overlay(self, top: Self) -> Self {
        Self {
            legacy_decorator: top.legacy_decorator.or(self.legacy_decorator),
            decorator_metadata: top.decorator_metadata.or(self.decorator_metadata),
            react: self.react.overlay(top.react),
        }
    }
}

impl Overlay for MinifyOptions {
    fn overlay(self, top: Self) -> Self {
        Self {
            target: top.target.or(self.target),
            compress: top.compress.or(self.compress),
            mangle: top.mangle.or(self.mangle),
            source_map: top.source_map.or(self.source_map),
            inline_sources_content: top.inline_sources_content.or(self.inline_sources_content),
        }
    }
}

impl Overlay for BTreeMap<String, Vec<String>> {
    fn overlay(mut self, top: Self) -> Self {
        self.extend(top);
        self
    }
}

impl Overlay for JscConfig {
    fn overlay(self, top: Self) -> Self {
        Self {
            parser: self.parser.overlay(top.parser),
            transform: self.transform.overlay(top.transform),
            target: top.target.or(self.target),
            base_url: top.base_url.or(self.base_url),
            paths: self.paths.overlay(top.paths),
            external_helpers: top.external_helpers.or(self.external_helpers),
            minify: self.minify.overlay(top.minify),
        }
    }
}

impl Overlay for CompilerOptions {
    fn overlay(self, top: Self) -> Self {
        Self {
            filename: top.filename.or(self.filename),
            minify: top.minify.or(self.minify),
            source_maps: top.source_maps.or(self.source_maps),
            jsc: self.jsc.overlay(top.jsc),
        }
    }
}

impl CompilerOptions {
    /// The layer derived from the ambient tsconfig for the module `file_id`.
    pub fn from_ambient(ambient: &AmbientConfig, file_id: &str) -> Self {
        let ext = Path::new(file_id)
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        let is_typescript = ext == "ts" || ext == "tsx";

        let parser = if is_typescript {
            ParserConfig {
                syntax: Some(Syntax::Typescript),
                tsx: Some(ext == "tsx"),
                jsx: None,
                decorators: ambient.experimental_decorators,
            }
        } else {
            ParserConfig {
                syntax: Some(Syntax::Ecmascript),
                tsx: None,
                jsx: Some(ext == "jsx"),
                decorators: ambient.experimental_decorators,
            }
        };

        let (runtime, development) = match ambient.jsx.as_deref() {
            Some("react") => (Some(ReactRuntime::Classic), None),
            Some("react-jsx") => (Some(ReactRuntime::Automatic), Some(false)),
            Some("react-jsxdev") => (Some(ReactRuntime::Automatic), Some(true)),
            Some("preserve") | Some("react-native") => (Some(ReactRuntime::Preserve), None),
            _ => (None, None),
        };

        Self {
            jsc: JscConfig {
                parser,
                transform: TransformConfig {
                    legacy_decorator: ambient.experimental_decorators,
                    decorator_metadata: ambient.emit_decorator_metadata,
                    react: ReactConfig {
                        runtime,
                        pragma: ambient.jsx_factory.clone(),
                        pragma_frag: ambient.jsx_fragment_factory.clone(),
                        import_source: ambient.jsx_import_source.clone(),
                        development,
                    },
                },
                target: ambient.target.as_ref().map(|t| t.to_lowercase()),
                base_url: ambient.base_url.clone(),
                paths: ambient.paths.clone(),
                external_helpers: ambient.import_helpers,
                minify: None,
            },
            ..Default::default()
        }
    }
}

/// Builds the options for compiling `file_id`: ambient-derived values, then
/// the user's options, then `filename = file_id` and `minify = false`.
pub fn merge(ambient: &AmbientConfig, user: &CompilerOptions, file_id: &str) -> CompilerOptions {
    let call_override = CompilerOptions {
        filename: Some(file_id.to_string()),
        minify: Some(false),
        ..Default::default()
    };
    CompilerOptions::from_ambient(ambient, file_id)
        .overlay(user.clone())
        .overlay(call_override)
}
