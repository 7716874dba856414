//! Ready-made wrappers built only on the public hook contract.

use std::fmt;
use std::sync::Arc;

use hookwrap_core::{Error, Result, Value};
use tracing::{Level, debug, error, info, trace, warn};

use crate::extras::Extras;
use crate::hooks::{AfterHook, HookSet, InsteadHook};
use crate::invocation::Invocation;
use crate::wrapper::Wrapper;

type CatchFn = dyn Fn(&Error) -> bool + Send + Sync;
type HandlerFn = dyn Fn(&Error) + Send + Sync;
type ReraiseFn = dyn Fn(Error) -> Error + Send + Sync;

/// What [`intercept`] catches and what it does with it.
///
/// By default every target error is caught, nothing handles it, and the
/// call returns `Null`. Errors raised by the core itself (bad keys,
/// missing receivers) are never caught by the default predicate.
#[derive(Clone)]
pub struct InterceptOptions {
    catch: Arc<CatchFn>,
    handler: Option<Arc<HandlerFn>>,
    reraise: Option<Arc<ReraiseFn>>,
}

impl InterceptOptions {
    /// Catch every target error.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Catch errors matching `predicate`.
    #[must_use]
    pub fn catch<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Error) -> bool + Send + Sync + 'static,
    {
        self.catch = Arc::new(predicate);
        self
    }

    /// Catch target errors whose concrete type is `E`.
    #[must_use]
    pub fn catch_type<E: std::error::Error + 'static>(self) -> Self {
        self.catch(|e| e.downcast_target_ref::<E>().is_some())
    }

    /// Run `handler` on every caught error.
    #[must_use]
    pub fn handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&Error) + Send + Sync + 'static,
    {
        self.handler = Some(Arc::new(handler));
        self
    }

    /// After handling, raise `map(caught)` instead of returning `Null`.
    #[must_use]
    pub fn reraise<F>(mut self, map: F) -> Self
    where
        F: Fn(Error) -> Error + Send + Sync + 'static,
    {
        self.reraise = Some(Arc::new(map));
        self
    }
}

impl Default for InterceptOptions {
    fn default() -> Self {
        Self {
            catch: Arc::new(Error::is_target),
            handler: None,
            reraise: None,
        }
    }
}

impl fmt::Debug for InterceptOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptOptions")
            .field("handler", &self.handler.is_some())
            .field("reraise", &self.reraise.is_some())
            .finish_non_exhaustive()
    }
}

struct Intercept {
    options: InterceptOptions,
}

impl InsteadHook for Intercept {
    fn instead(&self, invocation: &mut Invocation, _extras: &Extras) -> Result<Option<Value>> {
        match invocation.proceed() {
            Ok(value) => Ok(Some(value)),
            Err(err) if (self.options.catch)(&err) => {
                debug!(callable = invocation.target_name(), error = %err, "intercepted error");
                if let Some(handler) = &self.options.handler {
                    handler(&err);
                }
                match &self.options.reraise {
                    Some(map) => Err(map(err)),
                    None => Ok(Some(Value::Null)),
                }
            }
            Err(err) => Err(err),
        }
    }
}

/// Wrapper that catches, handles, and optionally re-raises target errors.
pub fn intercept(options: InterceptOptions) -> Wrapper {
    Wrapper::new(HookSet::new().with_instead(Arc::new(Intercept { options })))
}

struct LogCall {
    level: Level,
}

impl AfterHook for LogCall {
    fn after(&self, invocation: &Invocation, _extras: &Extras) -> Result<Option<Value>> {
        let name = invocation.target_name();
        let call = invocation.call_args();
        let result = invocation.result().cloned().unwrap_or_default();
        if self.level == Level::ERROR {
            error!(callable = name, "{name}{call} -> {result}");
        } else if self.level == Level::WARN {
            warn!(callable = name, "{name}{call} -> {result}");
        } else if self.level == Level::INFO {
            info!(callable = name, "{name}{call} -> {result}");
        } else if self.level == Level::DEBUG {
            debug!(callable = name, "{name}{call} -> {result}");
        } else {
            trace!(callable = name, "{name}{call} -> {result}");
        }
        Ok(None)
    }
}

/// Wrapper logging `name(args) -> result` at `level` after every call.
pub fn log_call(level: Level) -> Wrapper {
    Wrapper::new(HookSet::new().with_after(Arc::new(LogCall { level })))
}
