//! Built-in exporters.

use std::fmt;
use std::io::{self, Write};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::component::{Exporter, Telemetry};
use crate::error::ExportError;

/// Writes every item as one JSON line on standard output.
pub struct ConsoleExporter<T> {
    _item: PhantomData<fn(&T)>,
}

impl<T> ConsoleExporter<T> {
    /// Creates a console exporter.
    #[must_use]
    pub const fn new() -> Self {
        Self { _item: PhantomData }
    }
}

impl<T> Default for ConsoleExporter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for ConsoleExporter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsoleExporter").finish()
    }
}

impl<T: Telemetry> Exporter<T> for ConsoleExporter<T> {
    fn export(&self, batch: &[T]) -> Result<(), ExportError> {
        let mut out = io::stdout().lock();
        for item in batch {
            serde_json::to_writer(&mut out, item).map_err(|error| ExportError::Encode {
                message: error.to_string(),
            })?;
            writeln!(out).map_err(io_error)?;
        }
        out.flush().map_err(io_error)
    }
}

fn io_error(error: io::Error) -> ExportError {
    ExportError::Io {
        message: error.to_string(),
    }
}

/// Collects exported items in process memory.
///
/// Clones share the same buffer, so a test can keep one handle and give
/// the other to a pipeline.
///
/// # Example
///
/// ```
/// use telconf::{Exporter, SpanData, builtin::InMemoryExporter};
///
/// let exporter = InMemoryExporter::<SpanData>::default();
/// exporter.export(&[SpanData::new("checkout")]).expect("export succeeds");
/// assert_eq!(exporter.finished().len(), 1);
/// ```
#[derive(Debug)]
pub struct InMemoryExporter<T> {
    items: Arc<Mutex<Vec<T>>>,
    shut_down: Arc<AtomicBool>,
}

impl<T> Clone for InMemoryExporter<T> {
    fn clone(&self) -> Self {
        Self {
            items: Arc::clone(&self.items),
            shut_down: Arc::clone(&self.shut_down),
        }
    }
}

impl<T> Default for InMemoryExporter<T> {
    fn default() -> Self {
        Self {
            items: Arc::new(Mutex::new(Vec::new())),
            shut_down: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl<T: Clone> InMemoryExporter<T> {
    /// Returns a copy of every item exported so far.
    #[must_use]
    pub fn finished(&self) -> Vec<T> {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Discards the collected items.
    pub fn reset(&self) {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Returns `true` once the exporter has been shut down.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::Acquire)
    }
}

impl<T: Telemetry> Exporter<T> for InMemoryExporter<T> {
    fn export(&self, batch: &[T]) -> Result<(), ExportError> {
        if self.is_shut_down() {
            return Err(ExportError::ShutDown);
        }
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(batch);
        Ok(())
    }

    fn shutdown(&self) -> Result<(), ExportError> {
        self.shut_down.store(true, Ordering::Release);
        Ok(())
    }
}
