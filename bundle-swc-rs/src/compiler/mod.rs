//! Handle to the external compiler.
//!
//! swc's syntax trees and source maps are reference counted with `Rc` and
//! its hygiene data lives in scoped thread locals, so the compiler is driven
//! from a dedicated thread. [`Compiler`] is a cheap, cloneable, `Send + Sync`
//! handle that forwards requests over a channel and awaits the answer.

mod emit;
mod minify;
mod text;

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::thread::JoinHandle;

use deno_ast::swc::ast::EsVersion;
use futures::channel::{mpsc, mpsc::Sender, oneshot};
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, trace};

use crate::error::{Error, Result};
use crate::options::{CompilerOptions, MinifyOptions};
use crate::plugin::TransformOutput;

pub use emit::parse_target;

/// Neither the transforms nor the minifier lower syntax, so output may use
/// anything up to this version.
pub const LOWEST_TARGET: EsVersion = EsVersion::Es2022;

type Responder = oneshot::Sender<anyhow::Result<TransformOutput>>;

enum CompileCommand {
    Transform {
        code: String,
        options: CompilerOptions,
        target: EsVersion,
        responder: Responder,
    },
    Minify {
        code: String,
        file_name: String,
        options: MinifyOptions,
        responder: Responder,
    },
}

/// Cloneable handle to a compiler worker thread. The thread exits once every
/// clone has been dropped.
#[derive(Clone)]
pub struct Compiler {
    sender: Sender<CompileCommand>,
    _handle: Arc<JoinHandle<()>>,
}

impl std::fmt::Debug for Compiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compiler").finish_non_exhaustive()
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Compiler {
    pub fn new() -> Self {
        let (sender, mut receiver) = mpsc::channel::<CompileCommand>(32);

        let handle = Arc::new(thread::spawn(move || {
            while let Some(cmd) = futures::executor::block_on(receiver.next()) {
                match cmd {
                    CompileCommand::Transform {
                        code,
                        options,
                        target,
                        responder,
                    } => {
                        let result = guarded(|| emit::transform(&code, &options, target));
                        responder.send(result).ok();
                    }
                    CompileCommand::Minify {
                        code,
                        file_name,
                        options,
                        responder,
                    } => {
                        let result = guarded(|| minify::minify(&code, &file_name, &options));
                        responder.send(result).ok();
                    }
                }
            }
        }));

        Self {
            sender,
            _handle: handle,
        }
    }

    /// Compiles one module. `options.filename` names the module; the result
    /// carries the compiler diagnostic as the error message on failure.
    pub async fn transform(&self, code: String, options: CompilerOptions) -> Result<TransformOutput> {
        let id = options.filename.clone().unwrap_or_default();
        let target = resolve_target(options.jsc.target.as_deref())?;
        log_unsupported(&id, &options);
        trace!("Compiling {} with {:?}", id, options);

        let (responder, response) = oneshot::channel();
        self.dispatch(CompileCommand::Transform {
            code,
            options,
            target,
            responder,
        })
        .await?;

        match response.await {
            Ok(result) => result.map_err(|e| Error::Transform {
                id,
                message: format!("{e:#}"),
            }),
            Err(err) => Err(Error::CompilerUnavailable(err.to_string())),
        }
    }

    /// Minifies a rendered chunk.
    pub async fn minify(
        &self,
        code: String,
        file_name: &str,
        options: MinifyOptions,
    ) -> Result<TransformOutput> {
        resolve_target(options.target.as_deref())?;

        let (responder, response) = oneshot::channel();
        self.dispatch(CompileCommand::Minify {
            code,
            file_name: file_name.to_string(),
            options,
            responder,
        })
        .await?;

        match response.await {
            Ok(result) => result.map_err(|e| Error::Minify {
                chunk: file_name.to_string(),
                message: format!("{e:#}"),
            }),
            Err(err) => Err(Error::CompilerUnavailable(err.to_string())),
        }
    }

    async fn dispatch(&self, cmd: CompileCommand) -> Result<()> {
        let mut sender = self.sender.clone();
        sender
            .send(cmd)
            .await
            .map_err(|err| Error::CompilerUnavailable(err.to_string()))
    }
}

fn resolve_target(target: Option<&str>) -> Result<EsVersion> {
    let Some(target) = target else {
        return Ok(LOWEST_TARGET);
    };
    match parse_target(target) {
        None => Err(Error::UnknownTarget(target.to_string())),
        Some(version) if version < LOWEST_TARGET => Err(Error::UnsupportedTarget(target.to_string())),
        Some(version) => Ok(version),
    }
}

/// Runs one compiler job, turning a panic into an error for that job so the
/// worker thread survives it.
fn guarded<F>(job: F) -> anyhow::Result<TransformOutput>
where
    F: FnOnce() -> anyhow::Result<TransformOutput>,
{
    catch_unwind(AssertUnwindSafe(job)).unwrap_or_else(|payload| {
        let message = panic_message(payload.as_ref());
        error!("Compiler panicked: {}", message);
        Err(anyhow::anyhow!("Compiler panicked: {}", message))
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Options accepted for compatibility that the swc build in deno_ast has no
/// switch for.
fn log_unsupported(id: &str, options: &CompilerOptions) {
    let jsc = &options.jsc;
    if jsc.external_helpers == Some(true) {
        debug!("{}: externalHelpers is not supported, helpers are inlined", id);
    }
    if jsc.base_url.is_some() || jsc.paths.is_some() {
        debug!("{}: baseUrl/paths are not applied to import specifiers", id);
    }
}
