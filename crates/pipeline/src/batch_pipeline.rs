//! Bounded batch pipeline
//!
//! One pipeline per sink. Producers push records into a bounded queue without
//! blocking; a single background worker accumulates them into batches and
//! hands each batch to the sink when the batch is full or the flush interval
//! elapses.
//!
//! # Lifecycle
//!
//! ```text
//!              try_enqueue / enqueue
//! producers ─────────────────────────→ [bounded queue] ──→ worker ──→ sink.deliver(batch)
//!     │                                                      ↑
//!     │ queue full or closed                     flush() ────┘ (control channel)
//!     └──────────────→ sink.deliver([record])  (synchronous fallback)
//! ```
//!
//! `close()` takes the queue handle out of the state cell (the transition to
//! closed), which ends the worker's receive loop. The worker delivers what is
//! left and exits; `close()` joins it and closes the sink.
//!
//! # Failure semantics
//!
//! Background deliveries are attempted once and never retried. Their
//! failures go to a rate-limited error log and the metrics counters. The
//! fallback path, `flush()` and `close()` return delivery errors to the
//! caller.

use std::sync::Arc;
use std::time::Duration;

use beacon_protocol::EventRecord;
use chrono::Utc;
use parking_lot::Mutex;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, info};

use crate::config::PipelineConfig;
use crate::error::{Busy, PipelineError, SinkError};
use crate::logger::{DEFAULT_LOG_INTERVAL, RateLimitedLogger};
use crate::metrics::{MetricsSnapshot, PipelineMetrics};
use crate::sink::Sink;

/// Pending flush requests the control channel can hold
const CONTROL_CHANNEL_SIZE: usize = 16;

/// Upper bound on the batch buffer's initial allocation
const MAX_PREALLOCATED_BATCH: usize = 1024;

/// How an `enqueue` call was satisfied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Record admitted to the queue, delivery happens in the background
    Queued,

    /// Queue unavailable, record delivered synchronously
    Delivered,
}

/// Requests from pipeline handles to the worker
enum Control {
    Flush(oneshot::Sender<Result<(), SinkError>>),
}

/// Sending half of the open pipeline
struct QueueHandle {
    records: mpsc::Sender<EventRecord>,
    control: mpsc::Sender<Control>,
}

/// Bounded batch-delivery pipeline in front of one sink
pub struct BatchPipeline {
    name: String,
    config: PipelineConfig,
    sink: Arc<dyn Sink>,

    /// `Some` while open; taking the handle closes the pipeline
    state: Mutex<Option<QueueHandle>>,

    /// Background worker, joined by `close()`
    worker: Mutex<Option<JoinHandle<Result<(), SinkError>>>>,

    metrics: Arc<PipelineMetrics>,
}

impl BatchPipeline {
    /// Create the pipeline and start its worker
    ///
    /// # Errors
    ///
    /// Returns error if the config is invalid or no tokio runtime is
    /// running.
    pub fn spawn(
        name: impl Into<String>,
        config: PipelineConfig,
        sink: Arc<dyn Sink>,
    ) -> Result<Self, PipelineError> {
        config.validate()?;
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| PipelineError::NoRuntime)?;

        let name = name.into();
        let metrics = Arc::new(PipelineMetrics::new());
        let (records_tx, records_rx) = mpsc::channel(config.capacity);
        let (control_tx, control_rx) = mpsc::channel(CONTROL_CHANNEL_SIZE);

        let worker = Worker {
            logger: RateLimitedLogger::new(name.clone(), DEFAULT_LOG_INTERVAL),
            name: name.clone(),
            sink: Arc::clone(&sink),
            metrics: Arc::clone(&metrics),
            batch: Vec::with_capacity(config.batch_size.min(MAX_PREALLOCATED_BATCH)),
            batch_size: config.batch_size,
            flush_interval: config.flush_interval,
        };
        let handle = runtime.spawn(worker.run(records_rx, control_rx));

        info!(
            sink = %name,
            capacity = config.capacity,
            batch_size = config.batch_size,
            flush_interval = ?config.flush_interval,
            "pipeline started"
        );

        Ok(Self {
            name,
            config,
            sink,
            state: Mutex::new(Some(QueueHandle {
                records: records_tx,
                control: control_tx,
            })),
            worker: Mutex::new(Some(handle)),
            metrics,
        })
    }

    /// Admit a record to the queue without blocking
    ///
    /// Missing timestamps are filled with the current time first.
    ///
    /// # Errors
    ///
    /// Returns `Busy` with the record when the queue is full or the pipeline
    /// is closed.
    pub fn try_enqueue(&self, mut record: EventRecord) -> Result<(), Busy> {
        record.stamp(Utc::now());

        let state = self.state.lock();
        let Some(queue) = state.as_ref() else {
            return Err(Busy(record));
        };
        match queue.records.try_send(record) {
            Ok(()) => {
                self.metrics.record_enqueued();
                Ok(())
            }
            Err(TrySendError::Full(record) | TrySendError::Closed(record)) => Err(Busy(record)),
        }
    }

    /// Admit a record, delivering it synchronously if the queue can't take it
    ///
    /// # Errors
    ///
    /// Returns the sink error of a failed synchronous delivery.
    pub async fn enqueue(&self, record: EventRecord) -> Result<Admission, SinkError> {
        match self.try_enqueue(record) {
            Ok(()) => Ok(Admission::Queued),
            Err(busy) => {
                self.metrics.record_fallback();
                debug!(sink = %self.name, "queue unavailable, delivering synchronously");
                deliver(self.sink.as_ref(), &self.metrics, vec![busy.into_inner()])
                    .await
                    .map(|()| Admission::Delivered)
            }
        }
    }

    /// Deliver everything queued right now in one sink call
    ///
    /// Includes the worker's partial batch. Records arriving while the flush
    /// runs wait for the next trigger.
    ///
    /// # Errors
    ///
    /// Returns the sink error of the flush delivery.
    pub async fn flush(&self) -> Result<(), SinkError> {
        let control = match self.state.lock().as_ref() {
            Some(queue) => queue.control.clone(),
            None => return Ok(()),
        };

        let (reply, response) = oneshot::channel();
        if control.send(Control::Flush(reply)).await.is_err() {
            return Ok(());
        }
        // worker exited before answering: its final drain covered the queue
        response.await.unwrap_or(Ok(()))
    }

    /// Stop the worker, deliver the remainder and close the sink
    ///
    /// Idempotent: later calls return `Ok(())` without side effects. After
    /// close, `enqueue` keeps working through the synchronous fallback.
    ///
    /// # Errors
    ///
    /// Returns the drain delivery error, else the sink's close error.
    pub async fn close(&self) -> Result<(), SinkError> {
        let Some(queue) = self.state.lock().take() else {
            return Ok(());
        };
        drop(queue);

        let worker = self.worker.lock().take();
        let drained = match worker {
            Some(handle) => match handle.await {
                Ok(result) => result,
                Err(e) => Err(SinkError::unavailable(format!("pipeline worker failed: {e}"))),
            },
            None => Ok(()),
        };
        let closed = self.sink.close().await;

        let snapshot = self.metrics.snapshot();
        info!(
            sink = %self.name,
            records_enqueued = snapshot.records_enqueued,
            records_fallback = snapshot.records_fallback,
            batches_delivered = snapshot.batches_delivered,
            records_delivered = snapshot.records_delivered,
            delivery_errors = snapshot.delivery_errors,
            records_lost = snapshot.records_lost,
            "pipeline closed"
        );

        drained.and(closed)
    }

    /// Pipeline (sink) name
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// The sink this pipeline delivers to
    #[inline]
    pub fn sink(&self) -> &Arc<dyn Sink> {
        &self.sink
    }

    /// Whether `close()` has been called
    pub fn is_closed(&self) -> bool {
        self.state.lock().is_none()
    }

    /// Current metrics
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

impl std::fmt::Debug for BatchPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchPipeline")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// One delivery whose outcome goes back to the caller
async fn deliver(
    sink: &dyn Sink,
    metrics: &PipelineMetrics,
    batch: Vec<EventRecord>,
) -> Result<(), SinkError> {
    let count = batch.len();
    let result = sink.deliver(batch).await;
    match &result {
        Ok(()) => metrics.record_delivered(count),
        Err(_) => metrics.record_delivery_error(0),
    }
    result
}

// =============================================================================
// Worker
// =============================================================================

/// Background consumer owning the current batch
struct Worker {
    name: String,
    sink: Arc<dyn Sink>,
    metrics: Arc<PipelineMetrics>,
    logger: RateLimitedLogger,
    batch: Vec<EventRecord>,
    batch_size: usize,
    flush_interval: Duration,
}

impl Worker {
    /// Run until the record queue is closed and drained
    ///
    /// Returns the outcome of the final delivery.
    async fn run(
        mut self,
        mut records: mpsc::Receiver<EventRecord>,
        mut control: mpsc::Receiver<Control>,
    ) -> Result<(), SinkError> {
        let mut ticker = interval_at(Instant::now() + self.flush_interval, self.flush_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                Some(Control::Flush(reply)) = control.recv() => {
                    self.metrics.record_flush();
                    let result = self.flush_pending(&mut records).await;
                    let _ = reply.send(result);
                }

                record = records.recv() => {
                    let Some(record) = record else {
                        break;
                    };
                    self.batch.push(record);
                    if self.batch.len() >= self.batch_size {
                        self.deliver_in_background().await;
                    }
                }

                _ = ticker.tick() => {
                    if !self.batch.is_empty() {
                        self.deliver_in_background().await;
                    }
                }
            }
        }

        if self.batch.is_empty() {
            debug!(sink = %self.name, "worker stopped, nothing to drain");
            return Ok(());
        }
        let batch = std::mem::take(&mut self.batch);
        debug!(sink = %self.name, count = batch.len(), "worker stopped, delivering remainder");
        deliver(self.sink.as_ref(), &self.metrics, batch).await
    }

    /// Deliver the partial batch plus everything already queued
    async fn flush_pending(
        &mut self,
        records: &mut mpsc::Receiver<EventRecord>,
    ) -> Result<(), SinkError> {
        while let Ok(record) = records.try_recv() {
            self.batch.push(record);
        }
        if self.batch.is_empty() {
            return Ok(());
        }
        let batch = self.take_batch();
        deliver(self.sink.as_ref(), &self.metrics, batch).await
    }

    /// Deliver the current batch; failures are logged and counted
    async fn deliver_in_background(&mut self) {
        let batch = self.take_batch();
        let count = batch.len();
        match self.sink.deliver(batch).await {
            Ok(()) => {
                self.metrics.record_delivered(count);
                debug!(sink = %self.name, count, "batch delivered");
            }
            Err(e) => {
                self.metrics.record_delivery_error(count);
                self.logger.error("batch delivery failed", &e);
            }
        }
    }

    fn take_batch(&mut self) -> Vec<EventRecord> {
        let capacity = self.batch_size.min(MAX_PREALLOCATED_BATCH);
        std::mem::replace(&mut self.batch, Vec::with_capacity(capacity))
    }
}
