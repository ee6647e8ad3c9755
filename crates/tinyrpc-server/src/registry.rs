//! Function registry.
//!
//! Maps function names to handlers. The registry is read by every
//! connection task and written by [`FunctionRegistry::register`], so it
//! sits behind a read-write lock and may be extended while the server is
//! serving.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tinyrpc_common::{Result, RpcError, RpcPayload};

/// A registered remote function.
///
/// Returning `None` signals failure; the server then answers with an error
/// response. Handlers are called synchronously and should return in
/// bounded time: a handler that never returns occupies its worker forever.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, payload: RpcPayload) -> Option<RpcPayload>;
}

impl<F> Handler for F
where
    F: Fn(RpcPayload) -> Option<RpcPayload> + Send + Sync + 'static,
{
    fn call(&self, payload: RpcPayload) -> Option<RpcPayload> {
        self(payload)
    }
}

/// Thread-safe name-to-handler mapping.
///
/// # Example
///
/// ```
/// use tinyrpc_common::RpcPayload;
/// use tinyrpc_server::FunctionRegistry;
///
/// let registry = FunctionRegistry::new();
/// registry.register("add2", |p: RpcPayload| Some(RpcPayload::from_integer(p.integer() + 2))).unwrap();
///
/// let handler = registry.lookup("add2").unwrap();
/// assert_eq!(handler.call(RpcPayload::from_integer(1)).unwrap().integer(), 3);
/// ```
#[derive(Default)]
pub struct FunctionRegistry {
    functions: RwLock<HashMap<String, Arc<dyn Handler>>>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` under `name`, replacing any handler already
    /// registered under that name.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `name` is empty.
    pub fn register<H: Handler>(&self, name: &str, handler: H) -> Result<()> {
        if name.is_empty() {
            return Err(RpcError::InvalidArgument(
                "function name must not be empty".to_string(),
            ));
        }

        let mut functions = self.functions.write().unwrap_or_else(PoisonError::into_inner);
        if functions.insert(name.to_string(), Arc::new(handler)).is_some() {
            tracing::debug!("Replaced handler for function: {}", name);
        } else {
            tracing::debug!("Registered function: {}", name);
        }

        Ok(())
    }

    /// Looks up the handler registered under `name`.
    ///
    /// The returned handle is independent of the lock, so the handler can
    /// run while other tasks register or look up functions.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no function has that name.
    pub fn lookup(&self, name: &str) -> Result<Arc<dyn Handler>> {
        self.functions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
            .ok_or_else(|| RpcError::NotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.functions.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .functions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }
}

impl std::fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("functions", &self.names())
            .finish()
    }
}
