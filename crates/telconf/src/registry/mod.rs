//! Component registry keyed by signal, role, and name.
//!
//! The [`ComponentRegistry`] maps `(signal, role, name)` to a [`Factory`].
//! Registering a key twice replaces the earlier factory; the last
//! registration wins. Resolution is pure dispatch: the registry invokes the
//! factory, then checks that the produced [`Component`] offers the
//! capability expected for the signal and role it was registered under.

mod global;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::component::{Capability, Component};
use crate::error::{FactoryError, ResolutionError};
use crate::model::{ComponentArgs, Role, Signal, StageKind};

pub use self::global::{SharedRegistry, global};

/// Builds an exporter from its declared arguments.
pub type ExporterFactory =
    dyn Fn(&ComponentArgs) -> Result<Component, FactoryError> + Send + Sync;

/// Builds a pipeline stage from its arguments and the exporter it feeds.
pub type StageFactory =
    dyn Fn(&ComponentArgs, Component) -> Result<Component, FactoryError> + Send + Sync;

/// A registered constructor.
#[derive(Clone)]
pub enum Factory {
    /// Constructs exporters.
    Exporter(Arc<ExporterFactory>),
    /// Constructs pipeline stages.
    Stage(Arc<StageFactory>),
}

impl Factory {
    /// Wraps an exporter constructor.
    #[must_use]
    pub fn exporter<F>(factory: F) -> Self
    where
        F: Fn(&ComponentArgs) -> Result<Component, FactoryError> + Send + Sync + 'static,
    {
        Self::Exporter(Arc::new(factory))
    }

    /// Wraps a stage constructor.
    #[must_use]
    pub fn stage<F>(factory: F) -> Self
    where
        F: Fn(&ComponentArgs, Component) -> Result<Component, FactoryError> + Send + Sync + 'static,
    {
        Self::Stage(Arc::new(factory))
    }

    /// Returns the role the factory constructs components for.
    #[must_use]
    pub const fn role(&self) -> Role {
        match self {
            Self::Exporter(_) => Role::Exporter,
            Self::Stage(_) => Role::Stage,
        }
    }
}

impl fmt::Debug for Factory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Factory").field(&self.role()).finish()
    }
}

/// Registry key: the signal, role, and name a factory is registered under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentKey {
    signal: Signal,
    role: Role,
    name: String,
}

impl ComponentKey {
    /// Creates a key.
    #[must_use]
    pub fn new(signal: Signal, role: Role, name: impl Into<String>) -> Self {
        Self {
            signal,
            role,
            name: name.into(),
        }
    }

    /// Returns the signal.
    #[must_use]
    pub const fn signal(&self) -> Signal {
        self.signal
    }

    /// Returns the role.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Returns the component name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for ComponentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.signal, self.role, self.name)
    }
}

/// Registry of component factories.
///
/// # Example
///
/// ```
/// use telconf::{ComponentArgs, ComponentRegistry, Signal};
///
/// let registry = ComponentRegistry::with_builtins();
/// let exporter = registry
///     .resolve_exporter(Signal::Traces, "console", &ComponentArgs::new())
///     .expect("console is built in");
/// assert_eq!(exporter.capability().to_string(), "span exporter");
/// ```
#[derive(Debug, Clone, Default)]
pub struct ComponentRegistry {
    factories: HashMap<ComponentKey, Factory>,
}

impl ComponentRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in components.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::builtin::register_builtins(&mut registry);
        registry
    }

    /// Registers `factory` under `name` for `signal`, in the role the factory
    /// constructs for.
    ///
    /// Returns the factory previously registered under the same key, which
    /// this registration replaces.
    pub fn register(
        &mut self,
        signal: Signal,
        name: impl Into<String>,
        factory: Factory,
    ) -> Option<Factory> {
        let key = ComponentKey::new(signal, factory.role(), name);
        let previous = self.factories.insert(key.clone(), factory);
        if previous.is_some() {
            debug!(key = %key, "replaced registered factory");
        }
        previous
    }

    /// Registers an exporter constructor.
    pub fn register_exporter<F>(
        &mut self,
        signal: Signal,
        name: impl Into<String>,
        factory: F,
    ) -> Option<Factory>
    where
        F: Fn(&ComponentArgs) -> Result<Component, FactoryError> + Send + Sync + 'static,
    {
        self.register(signal, name, Factory::exporter(factory))
    }

    /// Registers a stage constructor.
    pub fn register_stage<F>(
        &mut self,
        signal: Signal,
        name: impl Into<String>,
        factory: F,
    ) -> Option<Factory>
    where
        F: Fn(&ComponentArgs, Component) -> Result<Component, FactoryError> + Send + Sync + 'static,
    {
        self.register(signal, name, Factory::stage(factory))
    }

    /// Returns `true` when a factory is registered under the key.
    #[must_use]
    pub fn contains(&self, signal: Signal, role: Role, name: &str) -> bool {
        self.factories
            .contains_key(&ComponentKey::new(signal, role, name))
    }

    /// Returns the sorted names registered for `signal` and `role`.
    #[must_use]
    pub fn names(&self, signal: Signal, role: Role) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .factories
            .keys()
            .filter(|key| key.signal == signal && key.role == role)
            .map(ComponentKey::name)
            .collect();
        names.sort_unstable();
        names
    }

    /// Returns the number of registered factories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Returns `true` when no factories are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Constructs the exporter registered as `name` for `signal`.
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError::NotRegistered`] when no exporter factory is
    /// registered under the key, [`ResolutionError::Construction`] when the
    /// factory rejects `args`, and [`ResolutionError::CapabilityMismatch`]
    /// when the result is not an exporter for `signal`.
    pub fn resolve_exporter(
        &self,
        signal: Signal,
        name: &str,
        args: &ComponentArgs,
    ) -> Result<Component, ResolutionError> {
        let key = ComponentKey::new(signal, Role::Exporter, name);
        let Some(Factory::Exporter(factory)) = self.factories.get(&key) else {
            return Err(not_registered(key));
        };
        let component = factory(args).map_err(|source| construction(&key, source))?;
        check_capability(key, component)
    }

    /// Constructs the stage registered for `kind` on `signal`, feeding
    /// `exporter`.
    ///
    /// # Errors
    ///
    /// Fails as [`ComponentRegistry::resolve_exporter`] does, with the stage
    /// capability of `signal` as the expected one.
    pub fn resolve_stage(
        &self,
        signal: Signal,
        kind: &StageKind,
        args: &ComponentArgs,
        exporter: Component,
    ) -> Result<Component, ResolutionError> {
        let key = ComponentKey::new(signal, Role::Stage, kind.as_str());
        let Some(Factory::Stage(factory)) = self.factories.get(&key) else {
            return Err(not_registered(key));
        };
        let component = factory(args, exporter).map_err(|source| construction(&key, source))?;
        check_capability(key, component)
    }
}

fn not_registered(key: ComponentKey) -> ResolutionError {
    ResolutionError::NotRegistered {
        signal: key.signal,
        role: key.role,
        name: key.name,
    }
}

fn construction(key: &ComponentKey, source: FactoryError) -> ResolutionError {
    ResolutionError::Construction {
        signal: key.signal,
        role: key.role,
        name: key.name.clone(),
        source,
    }
}

fn check_capability(key: ComponentKey, component: Component) -> Result<Component, ResolutionError> {
    let expected = Capability::expected(key.signal, key.role);
    let found = component.capability();
    if found == expected {
        Ok(component)
    } else {
        Err(ResolutionError::CapabilityMismatch {
            signal: key.signal,
            role: key.role,
            name: key.name,
            expected,
            found,
        })
    }
}

#[cfg(test)]
mod tests;
