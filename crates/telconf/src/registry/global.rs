//! Process-wide registry shared by every configuration pass.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use once_cell::sync::Lazy;

use super::{ComponentRegistry, Factory};
use crate::component::Component;
use crate::error::FactoryError;
use crate::model::{ComponentArgs, Signal};

static GLOBAL: Lazy<SharedRegistry> =
    Lazy::new(|| SharedRegistry::new(ComponentRegistry::with_builtins()));

/// Returns the process-wide registry, pre-populated with the built-ins.
#[must_use]
pub fn global() -> &'static SharedRegistry {
    &GLOBAL
}

/// A lock-protected registry.
///
/// Builds never hold the lock: [`SharedRegistry::snapshot`] hands them a
/// private copy, so registrations made during a build apply to the next
/// pass. A poisoned lock is recovered rather than propagated, since every
/// mutation leaves the table consistent.
#[derive(Debug)]
pub struct SharedRegistry {
    inner: RwLock<ComponentRegistry>,
}

impl SharedRegistry {
    /// Wraps `registry` for shared use.
    #[must_use]
    pub const fn new(registry: ComponentRegistry) -> Self {
        Self {
            inner: RwLock::new(registry),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, ComponentRegistry> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ComponentRegistry> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a factory; see [`ComponentRegistry::register`].
    pub fn register(
        &self,
        signal: Signal,
        name: impl Into<String>,
        factory: Factory,
    ) -> Option<Factory> {
        self.write().register(signal, name, factory)
    }

    /// Registers an exporter constructor.
    pub fn register_exporter<F>(
        &self,
        signal: Signal,
        name: impl Into<String>,
        factory: F,
    ) -> Option<Factory>
    where
        F: Fn(&ComponentArgs) -> Result<Component, FactoryError> + Send + Sync + 'static,
    {
        self.write().register_exporter(signal, name, factory)
    }

    /// Registers a stage constructor.
    pub fn register_stage<F>(
        &self,
        signal: Signal,
        name: impl Into<String>,
        factory: F,
    ) -> Option<Factory>
    where
        F: Fn(&ComponentArgs, Component) -> Result<Component, FactoryError> + Send + Sync + 'static,
    {
        self.write().register_stage(signal, name, factory)
    }

    /// Returns a copy of the current table.
    #[must_use]
    pub fn snapshot(&self) -> ComponentRegistry {
        self.read().clone()
    }

    /// Restores the built-in table, discarding custom registrations.
    pub fn reset(&self) {
        *self.write() = ComponentRegistry::with_builtins();
    }
}
