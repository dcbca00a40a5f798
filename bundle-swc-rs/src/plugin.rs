//! The hook surface a host bundler drives.

use async_trait::async_trait;

use crate::error::Result;

/// Code produced by a hook, with an optional JSON source map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformOutput {
    pub code: String,
    pub map: Option<String>,
}

/// The rendered chunk a `render_chunk` call belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkInfo {
    pub file_name: String,
}

impl ChunkInfo {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
        }
    }
}

/// A bundler plugin. Hooks return `Ok(None)` to let the host (or the next
/// plugin) handle the request.
#[async_trait]
pub trait Plugin: Send + Sync {
    fn name(&self) -> &'static str;

    async fn resolve_id(&self, _specifier: &str, _importer: Option<&str>) -> Result<Option<String>> {
        Ok(None)
    }

    async fn transform(&self, _code: &str, _id: &str) -> Result<Option<TransformOutput>> {
        Ok(None)
    }

    async fn render_chunk(
        &self,
        _code: &str,
        _chunk: &ChunkInfo,
    ) -> Result<Option<TransformOutput>> {
        Ok(None)
    }
}
