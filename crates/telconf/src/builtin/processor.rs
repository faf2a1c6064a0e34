//! Built-in pipeline stages.
//!
//! Stages buffer behind a `Mutex` and export on the caller's thread; there
//! are no background timers. Delay and timeout arguments are validated and
//! retained so that callers and diagnostics can inspect them.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::debug;

use crate::component::{Exporter, Stage, Telemetry};
use crate::error::{ExportError, FactoryError};
use crate::model::ComponentArgs;

const DEFAULT_MAX_QUEUE_SIZE: usize = 2048;
const DEFAULT_MAX_EXPORT_BATCH_SIZE: usize = 512;
const DEFAULT_SCHEDULE_DELAY_MS: u64 = 5000;
const DEFAULT_EXPORT_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_INTERVAL_MS: u64 = 60_000;
const DEFAULT_READER_TIMEOUT_MS: u64 = 30_000;

fn size_arg(args: &ComponentArgs, key: &str, default: usize) -> Result<usize, FactoryError> {
    let value = match args.get_u64(key)? {
        Some(raw) => {
            usize::try_from(raw).map_err(|_| FactoryError::invalid_argument(key, "is too large"))?
        }
        None => default,
    };
    if value == 0 {
        return Err(FactoryError::invalid_argument(key, "must be greater than zero"));
    }
    Ok(value)
}

fn millis_arg(args: &ComponentArgs, key: &str, default: u64) -> Result<Duration, FactoryError> {
    Ok(Duration::from_millis(args.get_u64(key)?.unwrap_or(default)))
}

/// Settings of a batching stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchConfig {
    max_queue_size: usize,
    max_export_batch_size: usize,
    schedule_delay: Duration,
    export_timeout: Duration,
}

impl BatchConfig {
    /// Reads the settings from stage arguments, applying defaults.
    ///
    /// Recognised arguments are `max_queue_size`, `max_export_batch_size`,
    /// `schedule_delay` and `export_timeout` (both in milliseconds).
    ///
    /// # Errors
    ///
    /// Returns [`FactoryError::InvalidArgument`] when an argument is mistyped
    /// or the batch size exceeds the queue size.
    pub fn from_args(args: &ComponentArgs) -> Result<Self, FactoryError> {
        let config = Self {
            max_queue_size: size_arg(args, "max_queue_size", DEFAULT_MAX_QUEUE_SIZE)?,
            max_export_batch_size: size_arg(
                args,
                "max_export_batch_size",
                DEFAULT_MAX_EXPORT_BATCH_SIZE,
            )?,
            schedule_delay: millis_arg(args, "schedule_delay", DEFAULT_SCHEDULE_DELAY_MS)?,
            export_timeout: millis_arg(args, "export_timeout", DEFAULT_EXPORT_TIMEOUT_MS)?,
        };
        if config.max_export_batch_size > config.max_queue_size {
            return Err(FactoryError::invalid_argument(
                "max_export_batch_size",
                "must not exceed max_queue_size",
            ));
        }
        Ok(config)
    }

    /// Returns the number of items buffered before new ones are dropped.
    #[must_use]
    pub const fn max_queue_size(&self) -> usize {
        self.max_queue_size
    }

    /// Returns the number of items exported at once.
    #[must_use]
    pub const fn max_export_batch_size(&self) -> usize {
        self.max_export_batch_size
    }

    /// Returns the delay between scheduled exports.
    #[must_use]
    pub const fn schedule_delay(&self) -> Duration {
        self.schedule_delay
    }

    /// Returns the time allowed for one export.
    #[must_use]
    pub const fn export_timeout(&self) -> Duration {
        self.export_timeout
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_queue_size: DEFAULT_MAX_QUEUE_SIZE,
            max_export_batch_size: DEFAULT_MAX_EXPORT_BATCH_SIZE,
            schedule_delay: Duration::from_millis(DEFAULT_SCHEDULE_DELAY_MS),
            export_timeout: Duration::from_millis(DEFAULT_EXPORT_TIMEOUT_MS),
        }
    }
}

/// Settings of a periodic metric reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodicConfig {
    interval: Duration,
    timeout: Duration,
    max_queue_size: usize,
}

impl PeriodicConfig {
    /// Reads `interval` and `timeout` (milliseconds) and `max_queue_size`
    /// from stage arguments.
    ///
    /// # Errors
    ///
    /// Returns [`FactoryError::InvalidArgument`] when an argument is mistyped
    /// or the interval is zero.
    pub fn from_args(args: &ComponentArgs) -> Result<Self, FactoryError> {
        let interval = millis_arg(args, "interval", DEFAULT_INTERVAL_MS)?;
        if interval.is_zero() {
            return Err(FactoryError::invalid_argument("interval", "must be greater than zero"));
        }
        Ok(Self {
            interval,
            timeout: millis_arg(args, "timeout", DEFAULT_READER_TIMEOUT_MS)?,
            max_queue_size: size_arg(args, "max_queue_size", DEFAULT_MAX_QUEUE_SIZE)?,
        })
    }

    /// Returns the collection interval.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns the time allowed for one collection.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the number of points held between flushes.
    #[must_use]
    pub const fn max_queue_size(&self) -> usize {
        self.max_queue_size
    }
}

impl Default for PeriodicConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(DEFAULT_INTERVAL_MS),
            timeout: Duration::from_millis(DEFAULT_READER_TIMEOUT_MS),
            max_queue_size: DEFAULT_MAX_QUEUE_SIZE,
        }
    }
}

/// Bounded, lock-protected item buffer shared by the buffering stages.
#[derive(Debug)]
struct Buffer<T> {
    items: Mutex<Vec<T>>,
    capacity: usize,
    dropped: AtomicU64,
    shut_down: AtomicBool,
}

impl<T: Telemetry> Buffer<T> {
    const fn new(capacity: usize) -> Self {
        Self {
            items: Mutex::new(Vec::new()),
            capacity,
            dropped: AtomicU64::new(0),
            shut_down: AtomicBool::new(false),
        }
    }

    fn ensure_open(&self) -> Result<(), ExportError> {
        if self.shut_down.load(Ordering::Acquire) {
            Err(ExportError::ShutDown)
        } else {
            Ok(())
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<T>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends `item` to the locked `items` unless the buffer is full, in
    /// which case the item is dropped and counted.
    fn admit(&self, items: &mut Vec<T>, item: T) -> bool {
        if items.len() >= self.capacity {
            self.count_dropped(1);
            return false;
        }
        items.push(item);
        true
    }

    fn count_dropped(&self, count: usize) {
        if count > 0 {
            self.dropped
                .fetch_add(u64::try_from(count).unwrap_or(u64::MAX), Ordering::Relaxed);
            debug!(signal = %T::SIGNAL, count, "buffer full, dropping items");
        }
    }

    fn drain(&self) -> Vec<T> {
        std::mem::take(&mut *self.lock())
    }

    /// Puts a rejected batch back in front of the queue, as far as it fits.
    fn requeue(&self, batch: &[T]) {
        let mut items = self.lock();
        let room = self.capacity.saturating_sub(items.len());
        let kept = batch.len().min(room);
        items.splice(0..0, batch.iter().take(kept).cloned());
        drop(items);
        self.count_dropped(batch.len().saturating_sub(kept));
    }

    fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Marks the buffer closed; returns `false` if it already was.
    fn close(&self) -> bool {
        !self.shut_down.swap(true, Ordering::AcqRel)
    }
}

/// Buffers items and exports them in batches.
///
/// A full batch is exported as soon as it accumulates. A batch the exporter
/// rejects goes back to the front of the queue for the next attempt; items
/// arriving while the queue is full are dropped and counted.
#[derive(Debug)]
pub struct BatchStage<T> {
    exporter: Arc<dyn Exporter<T>>,
    config: BatchConfig,
    buffer: Buffer<T>,
}

impl<T: Telemetry> BatchStage<T> {
    /// Creates a batching stage feeding `exporter`.
    #[must_use]
    pub const fn new(exporter: Arc<dyn Exporter<T>>, config: BatchConfig) -> Self {
        Self {
            exporter,
            config,
            buffer: Buffer::new(config.max_queue_size),
        }
    }

    /// Returns the stage settings.
    #[must_use]
    pub const fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Returns the number of items dropped because the queue was full.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.buffer.dropped()
    }
}

impl<T: Telemetry> Stage<T> for BatchStage<T> {
    fn submit(&self, item: T) -> Result<(), ExportError> {
        self.buffer.ensure_open()?;
        let ready = {
            let mut items = self.buffer.lock();
            if !self.buffer.admit(&mut items, item) {
                return Ok(());
            }
            if items.len() >= self.config.max_export_batch_size {
                items.drain(..self.config.max_export_batch_size).collect()
            } else {
                Vec::new()
            }
        };
        if ready.is_empty() {
            return Ok(());
        }
        self.exporter
            .export(&ready)
            .inspect_err(|_| self.buffer.requeue(&ready))
    }

    fn force_flush(&self) -> Result<(), ExportError> {
        let pending = self.buffer.drain();
        let mut rest = pending.as_slice();
        while !rest.is_empty() {
            let (batch, tail) = rest.split_at(rest.len().min(self.config.max_export_batch_size));
            if let Err(error) = self.exporter.export(batch) {
                self.buffer.requeue(rest);
                return Err(error);
            }
            rest = tail;
        }
        Ok(())
    }

    fn shutdown(&self) -> Result<(), ExportError> {
        if !self.buffer.close() {
            return Ok(());
        }
        self.force_flush()
    }
}

/// Exports every item as soon as it is submitted.
#[derive(Debug)]
pub struct SimpleStage<T> {
    exporter: Arc<dyn Exporter<T>>,
    shut_down: AtomicBool,
}

impl<T: Telemetry> SimpleStage<T> {
    /// Creates a pass-through stage feeding `exporter`.
    #[must_use]
    pub const fn new(exporter: Arc<dyn Exporter<T>>) -> Self {
        Self {
            exporter,
            shut_down: AtomicBool::new(false),
        }
    }
}

impl<T: Telemetry> Stage<T> for SimpleStage<T> {
    fn submit(&self, item: T) -> Result<(), ExportError> {
        if self.shut_down.load(Ordering::Acquire) {
            return Err(ExportError::ShutDown);
        }
        self.exporter.export(std::slice::from_ref(&item))
    }

    fn force_flush(&self) -> Result<(), ExportError> {
        Ok(())
    }

    fn shutdown(&self) -> Result<(), ExportError> {
        self.shut_down.store(true, Ordering::Release);
        Ok(())
    }
}

/// Collects metric points and exports them when flushed.
///
/// The collection interval is retained but not driven by a timer; callers
/// flush explicitly or on shutdown. Points the exporter rejects stay
/// buffered for the next flush. At most `max_queue_size` points are held;
/// further points are dropped and counted.
#[derive(Debug)]
pub struct PeriodicReader<T> {
    exporter: Arc<dyn Exporter<T>>,
    config: PeriodicConfig,
    buffer: Buffer<T>,
}

impl<T: Telemetry> PeriodicReader<T> {
    /// Creates a reader feeding `exporter`.
    #[must_use]
    pub const fn new(exporter: Arc<dyn Exporter<T>>, config: PeriodicConfig) -> Self {
        Self {
            exporter,
            config,
            buffer: Buffer::new(config.max_queue_size),
        }
    }

    /// Returns the reader settings.
    #[must_use]
    pub const fn config(&self) -> &PeriodicConfig {
        &self.config
    }

    /// Returns the number of points dropped because the buffer was full.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.buffer.dropped()
    }
}

impl<T: Telemetry> Stage<T> for PeriodicReader<T> {
    fn submit(&self, item: T) -> Result<(), ExportError> {
        self.buffer.ensure_open()?;
        self.buffer.admit(&mut self.buffer.lock(), item);
        Ok(())
    }

    fn force_flush(&self) -> Result<(), ExportError> {
        let collected = self.buffer.drain();
        if collected.is_empty() {
            return Ok(());
        }
        self.exporter
            .export(&collected)
            .inspect_err(|_| self.buffer.requeue(&collected))
    }

    fn shutdown(&self) -> Result<(), ExportError> {
        if !self.buffer.close() {
            return Ok(());
        }
        self.force_flush()
    }
}
