//! Ambient `tsconfig.json` lookup.
//!
//! Only the handful of `compilerOptions` that influence code generation are
//! read. Type checking related settings are ignored.

use crate::error::{Error, Result};
use crate::resolver::{absolutize, is_dir, is_file};
use futures::future::{BoxFuture, FutureExt};
use jsonc_parser::ParseOptions;
use log::{debug, warn};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const TSCONFIG_FILE_NAME: &str = "tsconfig.json";

/// Where ambient compiler settings are read from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TsconfigOption {
    /// The nearest `tsconfig.json` above the module.
    #[default]
    Nearest,
    /// A specific config file, directory, or file name searched upwards.
    Path(PathBuf),
    /// No ambient settings.
    Disabled,
}

impl<'de> Deserialize<'de> for TsconfigOption {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Bool(bool),
            Path(PathBuf),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Bool(false) => TsconfigOption::Disabled,
            Raw::Bool(true) => TsconfigOption::Nearest,
            Raw::Path(path) => TsconfigOption::Path(path),
        })
    }
}

/// The `compilerOptions` subset that shapes compiler options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AmbientConfig {
    pub import_helpers: Option<bool>,
    pub experimental_decorators: Option<bool>,
    pub emit_decorator_metadata: Option<bool>,
    pub jsx: Option<String>,
    pub jsx_factory: Option<String>,
    pub jsx_fragment_factory: Option<String>,
    pub jsx_import_source: Option<String>,
    pub target: Option<String>,
    pub base_url: Option<PathBuf>,
    pub paths: Option<BTreeMap<String, Vec<String>>>,
}

impl AmbientConfig {
    /// Settings of an extending config win over the config it extends.
    fn extended_by(self, child: Self) -> Self {
        Self {
            import_helpers: child.import_helpers.or(self.import_helpers),
            experimental_decorators: child.experimental_decorators.or(self.experimental_decorators),
            emit_decorator_metadata: child.emit_decorator_metadata.or(self.emit_decorator_metadata),
            jsx: child.jsx.or(self.jsx),
            jsx_factory: child.jsx_factory.or(self.jsx_factory),
            jsx_fragment_factory: child.jsx_fragment_factory.or(self.jsx_fragment_factory),
            jsx_import_source: child.jsx_import_source.or(self.jsx_import_source),
            target: child.target.or(self.target),
            base_url: child.base_url.or(self.base_url),
            paths: child.paths.or(self.paths),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct TsconfigFile {
    extends: Option<Extends>,
    compiler_options: AmbientConfig,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Extends {
    One(String),
    Many(Vec<String>),
}

impl Extends {
    fn into_vec(self) -> Vec<String> {
        match self {
            Extends::One(one) => vec![one],
            Extends::Many(many) => many,
        }
    }
}

/// Loads the ambient settings that apply to modules in `directory`.
///
/// A missing config yields empty settings; an unreadable or malformed one is
/// an error.
pub async fn load(directory: &Path, option: &TsconfigOption) -> Result<AmbientConfig> {
    let found = match option {
        TsconfigOption::Disabled => return Ok(AmbientConfig::default()),
        TsconfigOption::Nearest => find_up(directory, Path::new(TSCONFIG_FILE_NAME)).await,
        TsconfigOption::Path(path) => {
            let found = locate(directory, path).await;
            if found.is_none() {
                warn!("tsconfig {} not found from {}", path.display(), directory.display());
            }
            found
        }
    };

    match found {
        Some(path) => {
            debug!("Loading {} for {}", path.display(), directory.display());
            let mut stack = Vec::new();
            load_file(path, &mut stack).await
        }
        None => Ok(AmbientConfig::default()),
    }
}

async fn locate(directory: &Path, path: &Path) -> Option<PathBuf> {
    let candidate = absolutize(&directory.join(path));
    if is_file(&candidate).await {
        return Some(candidate);
    }
    if is_dir(&candidate).await {
        let nested = candidate.join(TSCONFIG_FILE_NAME);
        return is_file(&nested).await.then_some(nested);
    }
    if path.components().count() == 1 {
        return find_up(directory, path).await;
    }
    None
}

async fn find_up(directory: &Path, file_name: &Path) -> Option<PathBuf> {
    let start = absolutize(directory);
    for dir in start.ancestors() {
        let candidate = dir.join(file_name);
        if is_file(&candidate).await {
            return Some(candidate);
        }
    }
    None
}

fn load_file(path: PathBuf, stack: &mut Vec<PathBuf>) -> BoxFuture<'_, Result<AmbientConfig>> {
    async move {
        if stack.contains(&path) {
            return Err(Error::TsconfigCycle(path));
        }

        let text = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| Error::TsconfigRead {
                path: path.clone(),
                source,
            })?;
        let file = parse(&path, &text)?;
        let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();

        let mut own = file.compiler_options;
        own.base_url = own.base_url.map(|base_url| absolutize(&dir.join(base_url)));

        stack.push(path.clone());
        let mut config = AmbientConfig::default();
        for spec in file.extends.map(Extends::into_vec).unwrap_or_default() {
            match resolve_extends(&dir, &spec).await {
                Some(base) => {
                    let base_config = load_file(base, stack).await?;
                    config = config.extended_by(base_config);
                }
                None => warn!("Ignoring extends \"{}\" in {}", spec, path.display()),
            }
        }
        stack.pop();

        Ok(config.extended_by(own))
    }
    .boxed()
}

fn parse(path: &Path, text: &str) -> Result<TsconfigFile> {
    let value = jsonc_parser::parse_to_serde_value(text, &ParseOptions::default()).map_err(|e| {
        Error::TsconfigParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        }
    })?;
    match value {
        Some(value) => serde_json::from_value(value).map_err(|e| Error::TsconfigParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        }),
        None => Ok(TsconfigFile::default()),
    }
}

/// Relative and absolute `extends` entries are followed. Package references
/// would need node_modules resolution and are not.
async fn resolve_extends(dir: &Path, spec: &str) -> Option<PathBuf> {
    if !(spec.starts_with('.') || Path::new(spec).is_absolute()) {
        return None;
    }
    let candidate = absolutize(&dir.join(spec));
    if is_file(&candidate).await {
        return Some(candidate);
    }
    let with_json = PathBuf::from(format!("{}.json", candidate.display()));
    if is_file(&with_json).await {
        return Some(with_json);
    }
    let nested = candidate.join(TSCONFIG_FILE_NAME);
    is_file(&nested).await.then_some(nested)
}
