//! Include/exclude filtering of module ids.

use crate::error::{Error, Result};
use crate::escape::VIRTUAL_MODULE_SENTINEL;
use glob::{MatchOptions, Pattern};
use regex::Regex;
use serde::{Deserialize, Deserializer};
use std::path::Path;
use std::str::FromStr;

/// Matches `.js`, `.jsx`, `.mjs`, `.ts`, `.tsx` (and `.mts`/`.mjsx`/`.mtsx`,
/// which the extension gate turns away).
pub const DEFAULT_INCLUDE: &str = r"\.m?[jt]sx?$";

/// Matches any id inside a dependency directory.
pub const DEFAULT_EXCLUDE: &str = r"node_modules";

/// Extensions the compiler is asked to handle, in resolution priority order.
pub const ACCEPTED_EXTENSIONS: [&str; 5] = [".ts", ".mjs", ".js", ".tsx", ".jsx"];

lazy_static! {
    static ref DEFAULT_INCLUDE_PATTERNS: Vec<FilterPattern> =
        vec![FilterPattern::Regex(Regex::new(DEFAULT_INCLUDE).unwrap())];
    static ref DEFAULT_EXCLUDE_PATTERNS: Vec<FilterPattern> =
        vec![FilterPattern::Regex(Regex::new(DEFAULT_EXCLUDE).unwrap())];
}

const GLOB_MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// A single include or exclude pattern.
///
/// From strings, `/.../` is read as a regular expression and anything else
/// as a glob.
#[derive(Debug, Clone)]
pub enum FilterPattern {
    Regex(Regex),
    Glob(String),
}

impl FilterPattern {
    pub fn regex(pattern: &str) -> Result<Self> {
        Regex::new(pattern)
            .map(FilterPattern::Regex)
            .map_err(|e| Error::InvalidPattern {
                pattern: pattern.to_string(),
                message: e.to_string(),
            })
    }

    pub fn glob(pattern: impl Into<String>) -> Self {
        FilterPattern::Glob(pattern.into())
    }
}

impl FromStr for FilterPattern {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.strip_prefix('/').and_then(|rest| rest.strip_suffix('/')) {
            Some(body) if !body.is_empty() => FilterPattern::regex(body),
            _ => Ok(FilterPattern::glob(s)),
        }
    }
}

impl<'de> Deserialize<'de> for FilterPattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone)]
enum Matcher {
    Regex(Regex),
    Glob(Pattern),
}

impl Matcher {
    fn compile(pattern: &FilterPattern, base: Option<&Path>) -> Result<Self> {
        match pattern {
            FilterPattern::Regex(re) => Ok(Matcher::Regex(re.clone())),
            FilterPattern::Glob(glob) => {
                let anchored = anchor_glob(glob, base);
                Pattern::new(&anchored)
                    .map(Matcher::Glob)
                    .map_err(|e| Error::InvalidPattern {
                        pattern: glob.clone(),
                        message: e.to_string(),
                    })
            }
        }
    }

    fn is_match(&self, id: &str) -> bool {
        match self {
            Matcher::Regex(re) => re.is_match(id),
            Matcher::Glob(pattern) => pattern.matches_with(id, GLOB_MATCH_OPTIONS),
        }
    }
}

/// Relative globs are anchored at `base`; globs starting with `**` or an
/// absolute path are used as written.
fn anchor_glob(glob: &str, base: Option<&Path>) -> String {
    let glob = normalize_separators(glob);
    match base {
        Some(base) if !glob.starts_with("**") && !Path::new(&glob).is_absolute() => {
            let base = Pattern::escape(&normalize_separators(&base.to_string_lossy()));
            format!(
                "{}/{}",
                base.trim_end_matches('/'),
                glob.trim_start_matches("./")
            )
        }
        _ => glob,
    }
}

fn normalize_separators(path: &str) -> String {
    path.replace('\\', "/")
}

/// Decides which module ids are eligible for transformation.
#[derive(Debug, Clone)]
pub struct Filter {
    include: Vec<Matcher>,
    exclude: Vec<Matcher>,
}

impl Filter {
    /// Builds a filter, falling back to [`DEFAULT_INCLUDE`] and
    /// [`DEFAULT_EXCLUDE`] for missing lists. Relative globs are anchored at
    /// the current directory.
    pub fn new(include: Option<&[FilterPattern]>, exclude: Option<&[FilterPattern]>) -> Result<Self> {
        let cwd = std::env::current_dir().ok();
        Self::with_base(include, exclude, cwd.as_deref())
    }

    pub fn with_base(
        include: Option<&[FilterPattern]>,
        exclude: Option<&[FilterPattern]>,
        base: Option<&Path>,
    ) -> Result<Self> {
        let compile = |patterns: &[FilterPattern]| -> Result<Vec<Matcher>> {
            patterns.iter().map(|p| Matcher::compile(p, base)).collect()
        };
        Ok(Self {
            include: compile(include.unwrap_or(DEFAULT_INCLUDE_PATTERNS.as_slice()))?,
            exclude: compile(exclude.unwrap_or(DEFAULT_EXCLUDE_PATTERNS.as_slice()))?,
        })
    }

    /// True when `id` matches an include pattern (or the include list is
    /// empty) and no exclude pattern. Virtual ids never pass.
    pub fn should_process(&self, id: &str) -> bool {
        if id.contains(VIRTUAL_MODULE_SENTINEL) {
            return false;
        }
        let id = normalize_separators(id);
        if self.exclude.iter().any(|m| m.is_match(&id)) {
            return false;
        }
        self.include.is_empty() || self.include.iter().any(|m| m.is_match(&id))
    }
}

/// The accepted extension of `id`, if it has one.
pub fn accepted_extension(id: &str) -> Option<&'static str> {
    let ext = Path::new(id).extension()?.to_str()?;
    ACCEPTED_EXTENSIONS
        .iter()
        .copied()
        .find(|accepted| accepted[1..] == *ext)
}
