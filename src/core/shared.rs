//! Lazily initialized shared backends
//!
//! Expensive backends (models, large pattern sets) are built on first use
//! and then shared read-only across worker tasks. Initialization runs at
//! most once successfully; concurrent first callers wait for the winner.

use anyhow::{anyhow, Result};
use std::sync::{Mutex, OnceLock};

type InitFn<T> = Box<dyn Fn() -> Result<T> + Send + Sync>;

/// A value built on first access and shared read-only afterwards
pub struct SharedBackend<T> {
    cell: OnceLock<T>,
    init: InitFn<T>,
    init_lock: Mutex<()>,
}

impl<T: Send + Sync> SharedBackend<T> {
    /// Create a backend that runs `init` on first access
    pub fn new<F>(init: F) -> Self
    where
        F: Fn() -> Result<T> + Send + Sync + 'static,
    {
        Self {
            cell: OnceLock::new(),
            init: Box::new(init),
            init_lock: Mutex::new(()),
        }
    }

    /// Create an already initialized backend
    pub fn ready(value: T) -> Self {
        let cell = OnceLock::new();
        let _ = cell.set(value);
        Self {
            cell,
            init: Box::new(|| Err(anyhow!("backend was constructed initialized"))),
            init_lock: Mutex::new(()),
        }
    }

    /// Get the backend, initializing it if needed
    pub fn get(&self) -> Result<&T> {
        if let Some(value) = self.cell.get() {
            return Ok(value);
        }

        let _guard = self
            .init_lock
            .lock()
            .map_err(|_| anyhow!("backend initialization lock poisoned"))?;

        if let Some(value) = self.cell.get() {
            return Ok(value);
        }

        let value = (self.init)()?;
        tracing::debug!("Shared backend initialized");
        Ok(self.cell.get_or_init(|| value))
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.get().is_some()
    }
}
