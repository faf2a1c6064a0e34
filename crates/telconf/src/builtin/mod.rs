//! Components available without any registration.
//!
//! | Signal  | Exporters           | Stages              |
//! |---------|---------------------|---------------------|
//! | traces  | `console`, `memory` | `batch`, `simple`   |
//! | metrics | `console`, `memory` | `periodic`          |
//! | logs    | `console`, `memory` | `batch`, `simple`   |
//!
//! The `memory` exporter created by the registry keeps its buffer private;
//! to inspect exported data, register a factory handing out clones of an
//! [`InMemoryExporter`] you hold.

mod exporter;
mod processor;

use std::sync::Arc;

use crate::component::{
    Capability, Component, Exporter, LogRecord, MetricPoint, SpanData, Telemetry,
};
use crate::error::FactoryError;
use crate::model::{Role, Signal};
use crate::registry::ComponentRegistry;

pub use self::exporter::{ConsoleExporter, InMemoryExporter};
pub use self::processor::{BatchConfig, BatchStage, PeriodicConfig, PeriodicReader, SimpleStage};

/// Registry name of the console exporter.
pub const CONSOLE: &str = "console";
/// Registry name of the in-memory exporter.
pub const MEMORY: &str = "memory";

/// Registers every built-in component into `registry`.
pub fn register_builtins(registry: &mut ComponentRegistry) {
    register_exporters::<SpanData>(registry);
    register_exporters::<MetricPoint>(registry);
    register_exporters::<LogRecord>(registry);

    register_processors::<SpanData>(registry);
    register_processors::<LogRecord>(registry);

    registry.register_stage(Signal::Metrics, "periodic", |args, exporter| {
        let config = PeriodicConfig::from_args(args)?;
        let target = exporter_for::<MetricPoint>(&exporter)?;
        Ok(MetricPoint::stage(Arc::new(PeriodicReader::new(target, config))))
    });
}

fn register_exporters<T: Telemetry>(registry: &mut ComponentRegistry) {
    registry.register_exporter(T::SIGNAL, CONSOLE, |_| {
        Ok(T::exporter(Arc::new(ConsoleExporter::<T>::new())))
    });
    registry.register_exporter(T::SIGNAL, MEMORY, |_| {
        Ok(T::exporter(Arc::new(InMemoryExporter::<T>::default())))
    });
}

fn register_processors<T: Telemetry>(registry: &mut ComponentRegistry) {
    registry.register_stage(T::SIGNAL, "batch", |args, exporter| {
        let config = BatchConfig::from_args(args)?;
        Ok(T::stage(Arc::new(BatchStage::new(exporter_for::<T>(&exporter)?, config))))
    });
    registry.register_stage(T::SIGNAL, "simple", |_, exporter| {
        Ok(T::stage(Arc::new(SimpleStage::new(exporter_for::<T>(&exporter)?))))
    });
}

/// Extracts the exporter a stage of item type `T` can feed.
///
/// # Errors
///
/// Returns [`FactoryError::WrongExporter`] when `component` is not an
/// exporter of `T`'s signal.
pub fn exporter_for<T: Telemetry>(
    component: &Component,
) -> Result<Arc<dyn Exporter<T>>, FactoryError> {
    T::as_exporter(component).ok_or_else(|| FactoryError::WrongExporter {
        expected: Capability::expected(T::SIGNAL, Role::Exporter),
        found: component.capability(),
    })
}
