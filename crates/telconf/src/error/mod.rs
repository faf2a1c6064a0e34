//! Domain errors raised while resolving and assembling pipelines.
//!
//! Only [`ResolveError`] crosses the entry boundary, and only through the
//! `try_*` functions; [`crate::resolve_configuration`] converts it into the
//! inert configuration. [`ResolutionError`] is localised to a single
//! pipeline stage and surfaces as a build diagnostic.

use thiserror::Error;

use telconf_schema::{DecodeError, ValidationError};

use crate::component::Capability;
use crate::model::{ModelError, Role, Signal};

/// Failures producing a typed configuration from a document.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The document could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The document does not conform to the schema.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The validated tree could not be typed.
    #[error(transparent)]
    Typing(#[from] ModelError),
}

/// Failures resolving one named component through the registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    /// No factory is registered under the requested key.
    #[error("no {role} named '{name}' is registered for {signal}")]
    NotRegistered {
        /// Signal being built.
        signal: Signal,
        /// Role that was looked up.
        role: Role,
        /// Requested name.
        name: String,
    },

    /// A stage references an exporter missing from the signal's `exporters`.
    #[error("exporter '{name}' is not declared under {signal}.exporters")]
    UndeclaredExporter {
        /// Signal being built.
        signal: Signal,
        /// Referenced exporter name.
        name: String,
    },

    /// The factory produced a component lacking the expected capability.
    #[error("{role} '{name}' for {signal} must be a {expected} but the factory produced a {found}")]
    CapabilityMismatch {
        /// Signal being built.
        signal: Signal,
        /// Role that was looked up.
        role: Role,
        /// Requested name.
        name: String,
        /// Capability required for the signal and role.
        expected: Capability,
        /// Capability the component actually offers.
        found: Capability,
    },

    /// The factory rejected its arguments.
    #[error("{role} '{name}' for {signal} could not be constructed: {source}")]
    Construction {
        /// Signal being built.
        signal: Signal,
        /// Role that was looked up.
        role: Role,
        /// Requested name.
        name: String,
        /// Reason reported by the factory.
        #[source]
        source: FactoryError,
    },
}

impl ResolutionError {
    /// Returns the component name the failure concerns.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::NotRegistered { name, .. }
            | Self::UndeclaredExporter { name, .. }
            | Self::CapabilityMismatch { name, .. }
            | Self::Construction { name, .. } => name,
        }
    }
}

/// Failures reported by a component factory.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FactoryError {
    /// An argument is present but has the wrong type or value.
    #[error("argument '{argument}' {reason}")]
    InvalidArgument {
        /// Argument name.
        argument: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The arguments do not have the shape the factory expects.
    #[error("arguments do not match the expected shape: {reason}")]
    MalformedArguments {
        /// Description of the mismatch.
        reason: String,
    },

    /// A stage factory received an exporter for a different signal.
    #[error("expected a {expected} but received a {found}")]
    WrongExporter {
        /// Exporter capability the stage needs.
        expected: Capability,
        /// Capability it was given.
        found: Capability,
    },

    /// The component could not be created for another reason.
    #[error("{message}")]
    Unavailable {
        /// Description of the failure.
        message: String,
    },
}

impl FactoryError {
    /// Creates a new `InvalidArgument` error.
    #[must_use]
    pub fn invalid_argument(argument: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            argument: argument.into(),
            reason: reason.into(),
        }
    }

    /// Creates a new `Unavailable` error.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}

/// Failures building the process resource.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResourceError {
    /// An attribute key is empty or blank.
    #[error("resource attribute keys must not be empty")]
    EmptyKey,
}

/// Failures delivering telemetry to an exporter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExportError {
    /// Writing to the destination failed.
    #[error("export I/O failed: {message}")]
    Io {
        /// Description of the failure.
        message: String,
    },

    /// A record could not be encoded.
    #[error("failed to encode telemetry: {message}")]
    Encode {
        /// Description of the failure.
        message: String,
    },

    /// The component has already been shut down.
    #[error("component has been shut down")]
    ShutDown,
}
