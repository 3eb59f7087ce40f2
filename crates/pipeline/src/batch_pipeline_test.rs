//! Tests for the batch pipeline

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use beacon_protocol::EventRecord;
use parking_lot::Mutex;
use tokio::sync::{Notify, Semaphore};

use crate::batch_pipeline::{Admission, BatchPipeline};
use crate::config::PipelineConfig;
use crate::error::{PipelineError, SinkError};
use crate::sink::Sink;

// =============================================================================
// Test Sinks
// =============================================================================

/// Records every delivered batch
#[derive(Default)]
struct RecordingSink {
    batches: Mutex<Vec<Vec<EventRecord>>>,
    fail: AtomicBool,
    closes: AtomicUsize,
}

impl RecordingSink {
    fn failing() -> Self {
        let sink = Self::default();
        sink.fail.store(true, Ordering::SeqCst);
        sink
    }

    fn record(&self, batch: Vec<EventRecord>) -> Result<(), SinkError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(SinkError::unavailable("connection refused"));
        }
        self.batches.lock().push(batch);
        Ok(())
    }

    fn batch_sizes(&self) -> Vec<usize> {
        self.batches.lock().iter().map(Vec::len).collect()
    }

    fn events(&self) -> Vec<String> {
        self.batches
            .lock()
            .iter()
            .flatten()
            .map(|r| r.event().to_string())
            .collect()
    }
}

#[async_trait]
impl Sink for RecordingSink {
    fn name(&self) -> &str {
        "recording"
    }

    async fn deliver(&self, batch: Vec<EventRecord>) -> Result<(), SinkError> {
        self.record(batch)
    }

    async fn close(&self) -> Result<(), SinkError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Holds its first delivery until the gate opens
struct GatedSink {
    inner: RecordingSink,
    gate: Semaphore,
    armed: AtomicBool,
    started: Notify,
}

impl GatedSink {
    fn new() -> Self {
        Self {
            inner: RecordingSink::default(),
            gate: Semaphore::new(0),
            armed: AtomicBool::new(true),
            started: Notify::new(),
        }
    }

    fn open(&self) {
        self.gate.add_permits(1);
    }
}

#[async_trait]
impl Sink for GatedSink {
    fn name(&self) -> &str {
        "gated"
    }

    async fn deliver(&self, batch: Vec<EventRecord>) -> Result<(), SinkError> {
        if self.armed.swap(false, Ordering::SeqCst) {
            self.started.notify_one();
            let _permit = self
                .gate
                .acquire()
                .await
                .map_err(|_| SinkError::Closed)?;
        }
        self.inner.record(batch)
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn config(capacity: usize, batch_size: usize, flush_interval: Duration) -> PipelineConfig {
    PipelineConfig::new(capacity, batch_size, flush_interval)
}

fn record(name: &str) -> EventRecord {
    EventRecord::new(name).with_field("distinct_id", "visitor-1")
}

/// Let the worker catch up with the queue (paused clock)
async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

const HOUR: Duration = Duration::from_secs(3600);

// =============================================================================
// Construction
// =============================================================================

#[test]
fn test_spawn_requires_runtime() {
    let sink = Arc::new(RecordingSink::default());
    let err = BatchPipeline::spawn("test", PipelineConfig::default(), sink).unwrap_err();
    assert!(matches!(err, PipelineError::NoRuntime));
}

#[tokio::test]
async fn test_spawn_rejects_invalid_config() {
    let sink = Arc::new(RecordingSink::default());
    let err = BatchPipeline::spawn("test", config(10, 0, HOUR), sink).unwrap_err();
    assert!(matches!(err, PipelineError::InvalidConfig(_)));
}

// =============================================================================
// Triggers
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_size_trigger_delivers_full_batches() {
    let sink = Arc::new(RecordingSink::default());
    let pipeline = BatchPipeline::spawn("test", config(100, 3, HOUR), sink.clone()).unwrap();

    for i in 0..7 {
        let admission = pipeline.enqueue(record(&format!("e{i}"))).await.unwrap();
        assert_eq!(admission, Admission::Queued);
    }
    settle().await;

    assert_eq!(sink.batch_sizes(), vec![3, 3]);
    assert_eq!(sink.events(), vec!["e0", "e1", "e2", "e3", "e4", "e5"]);

    pipeline.close().await.unwrap();
    assert_eq!(sink.batch_sizes(), vec![3, 3, 1]);
}

#[tokio::test(start_paused = true)]
async fn test_time_trigger_fires_after_interval() {
    let sink = Arc::new(RecordingSink::default());
    let pipeline =
        BatchPipeline::spawn("test", config(100, 10, Duration::from_secs(5)), sink.clone())
            .unwrap();

    pipeline.enqueue(record("a")).await.unwrap();
    pipeline.enqueue(record("b")).await.unwrap();

    tokio::time::sleep(Duration::from_millis(4900)).await;
    assert!(sink.batch_sizes().is_empty(), "delivered before the interval");

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(sink.batch_sizes(), vec![2]);

    pipeline.close().await.unwrap();
    assert_eq!(sink.batch_sizes(), vec![2]);
}

#[tokio::test(start_paused = true)]
async fn test_empty_tick_delivers_nothing() {
    let sink = Arc::new(RecordingSink::default());
    let pipeline =
        BatchPipeline::spawn("test", config(100, 10, Duration::from_secs(5)), sink.clone())
            .unwrap();

    tokio::time::sleep(Duration::from_secs(16)).await;
    assert!(sink.batch_sizes().is_empty());

    pipeline.close().await.unwrap();
    assert!(sink.batch_sizes().is_empty());
    assert_eq!(pipeline.metrics().batches_delivered, 0);
}

#[tokio::test(start_paused = true)]
async fn test_background_failure_is_not_returned_to_producer() {
    let sink = Arc::new(RecordingSink::failing());
    let pipeline = BatchPipeline::spawn("test", config(100, 1, HOUR), sink.clone()).unwrap();

    let admission = pipeline.enqueue(record("a")).await.unwrap();
    assert_eq!(admission, Admission::Queued);
    settle().await;

    let metrics = pipeline.metrics();
    assert_eq!(metrics.delivery_errors, 1);
    assert_eq!(metrics.records_lost, 1);

    // nothing left to drain, so close succeeds
    pipeline.close().await.unwrap();
}

// =============================================================================
// Flush
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_flush_delivers_everything_in_one_call() {
    let sink = Arc::new(RecordingSink::default());
    let pipeline = BatchPipeline::spawn("test", config(100, 100, HOUR), sink.clone()).unwrap();

    for i in 0..5 {
        pipeline.enqueue(record(&format!("e{i}"))).await.unwrap();
    }
    pipeline.flush().await.unwrap();

    assert_eq!(sink.batch_sizes(), vec![5]);
    assert_eq!(pipeline.metrics().flushes, 1);

    // empty flush is a no-op
    pipeline.flush().await.unwrap();
    assert_eq!(sink.batch_sizes(), vec![5]);

    pipeline.close().await.unwrap();
    assert_eq!(sink.batch_sizes(), vec![5]);
}

#[tokio::test(start_paused = true)]
async fn test_flush_includes_partial_batch() {
    let sink = Arc::new(RecordingSink::default());
    let pipeline = BatchPipeline::spawn("test", config(100, 10, HOUR), sink.clone()).unwrap();

    pipeline.enqueue(record("a")).await.unwrap();
    pipeline.enqueue(record("b")).await.unwrap();
    settle().await;
    pipeline.enqueue(record("c")).await.unwrap();

    pipeline.flush().await.unwrap();
    assert_eq!(sink.events(), vec!["a", "b", "c"]);
    assert_eq!(sink.batch_sizes(), vec![3]);

    pipeline.close().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_flush_returns_delivery_error() {
    let sink = Arc::new(RecordingSink::failing());
    let pipeline = BatchPipeline::spawn("test", config(100, 10, HOUR), sink.clone()).unwrap();

    pipeline.enqueue(record("a")).await.unwrap();
    let err = pipeline.flush().await.unwrap_err();
    assert!(matches!(err, SinkError::Unavailable(_)));

    // the failed batch is not retried by close
    pipeline.close().await.unwrap();
}

#[tokio::test]
async fn test_flush_after_close_is_noop() {
    let sink = Arc::new(RecordingSink::default());
    let pipeline = BatchPipeline::spawn("test", config(100, 10, HOUR), sink.clone()).unwrap();

    pipeline.close().await.unwrap();
    pipeline.flush().await.unwrap();
    assert!(sink.batch_sizes().is_empty());
}

// =============================================================================
// Close
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_close_drains_remainder() {
    let sink = Arc::new(RecordingSink::default());
    let pipeline = BatchPipeline::spawn("test", config(100, 10, HOUR), sink.clone()).unwrap();

    for i in 0..4 {
        pipeline.enqueue(record(&format!("e{i}"))).await.unwrap();
    }
    pipeline.close().await.unwrap();

    assert_eq!(sink.batch_sizes(), vec![4]);
    assert!(pipeline.is_closed());
}

#[tokio::test]
async fn test_close_twice_is_idempotent() {
    let sink = Arc::new(RecordingSink::default());
    let pipeline = BatchPipeline::spawn("test", config(100, 10, HOUR), sink.clone()).unwrap();

    pipeline.enqueue(record("a")).await.unwrap();
    pipeline.close().await.unwrap();
    pipeline.close().await.unwrap();

    assert_eq!(sink.batch_sizes(), vec![1]);
    assert_eq!(sink.closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_close_returns_drain_error() {
    let sink = Arc::new(RecordingSink::failing());
    let pipeline = BatchPipeline::spawn("test", config(100, 10, HOUR), sink.clone()).unwrap();

    pipeline.enqueue(record("a")).await.unwrap();
    let err = pipeline.close().await.unwrap_err();
    assert!(matches!(err, SinkError::Unavailable(_)));
    assert_eq!(sink.closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_enqueue_after_close_falls_back() {
    let sink = Arc::new(RecordingSink::default());
    let pipeline = BatchPipeline::spawn("test", config(100, 10, HOUR), sink.clone()).unwrap();
    pipeline.close().await.unwrap();

    assert!(pipeline.try_enqueue(record("late")).is_err());

    let admission = pipeline.enqueue(record("late")).await.unwrap();
    assert_eq!(admission, Admission::Delivered);
    assert_eq!(sink.batch_sizes(), vec![1]);
    assert_eq!(pipeline.metrics().records_fallback, 1);
}

#[tokio::test]
async fn test_fallback_error_is_returned() {
    let sink = Arc::new(RecordingSink::failing());
    let pipeline = BatchPipeline::spawn("test", config(100, 10, HOUR), sink.clone()).unwrap();
    pipeline.close().await.unwrap();

    let err = pipeline.enqueue(record("late")).await.unwrap_err();
    assert!(matches!(err, SinkError::Unavailable(_)));
}

// =============================================================================
// Overflow
// =============================================================================

#[tokio::test]
async fn test_full_queue_delivers_synchronously() {
    let sink = Arc::new(GatedSink::new());
    let pipeline = BatchPipeline::spawn("test", config(2, 1, HOUR), sink.clone()).unwrap();

    // r1 is taken by the worker, which then blocks inside deliver
    pipeline.enqueue(record("r1")).await.unwrap();
    sink.started.notified().await;

    assert_eq!(pipeline.enqueue(record("r2")).await.unwrap(), Admission::Queued);
    assert_eq!(pipeline.enqueue(record("r3")).await.unwrap(), Admission::Queued);

    let busy = pipeline.try_enqueue(record("probe")).unwrap_err();
    assert_eq!(busy.into_inner().event(), "probe");

    assert_eq!(
        pipeline.enqueue(record("r4")).await.unwrap(),
        Admission::Delivered
    );
    assert_eq!(sink.inner.events(), vec!["r4"]);

    sink.open();
    pipeline.close().await.unwrap();

    assert_eq!(sink.inner.events(), vec!["r4", "r1", "r2", "r3"]);
    assert_eq!(sink.inner.batch_sizes(), vec![1, 1, 1, 1]);
}

// =============================================================================
// Delivery guarantees
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_every_record_delivered_exactly_once() {
    const PRODUCERS: usize = 4;
    const PER_PRODUCER: usize = 250;

    let sink = Arc::new(RecordingSink::default());
    let pipeline = Arc::new(
        BatchPipeline::spawn("test", config(64, 16, Duration::from_millis(5)), sink.clone())
            .unwrap(),
    );

    let mut producers = Vec::new();
    for p in 0..PRODUCERS {
        let pipeline = Arc::clone(&pipeline);
        producers.push(tokio::spawn(async move {
            for i in 0..PER_PRODUCER {
                let record = record("tick").with_field("seq", (p * PER_PRODUCER + i) as u64);
                pipeline.enqueue(record).await.unwrap();
            }
        }));
    }
    for producer in producers {
        producer.await.unwrap();
    }
    pipeline.close().await.unwrap();

    let seqs: Vec<u64> = sink
        .batches
        .lock()
        .iter()
        .flatten()
        .map(|r| r.field("seq").and_then(|v| v.as_u64()).unwrap())
        .collect();
    let unique: HashSet<u64> = seqs.iter().copied().collect();

    assert_eq!(seqs.len(), PRODUCERS * PER_PRODUCER);
    assert_eq!(unique.len(), PRODUCERS * PER_PRODUCER);

    let metrics = pipeline.metrics();
    assert_eq!(
        metrics.records_enqueued + metrics.records_fallback,
        (PRODUCERS * PER_PRODUCER) as u64
    );
    assert_eq!(metrics.records_delivered, (PRODUCERS * PER_PRODUCER) as u64);
}

#[tokio::test]
async fn test_records_are_stamped_on_admission() {
    let sink = Arc::new(RecordingSink::default());
    let pipeline = BatchPipeline::spawn("test", config(100, 10, HOUR), sink.clone()).unwrap();

    pipeline.enqueue(EventRecord::new("a")).await.unwrap();
    pipeline.close().await.unwrap();

    let batches = sink.batches.lock();
    let delivered = &batches[0][0];
    assert!(delivered.is_stamped());
    assert_eq!(delivered.str_field("lib"), Some(beacon_protocol::DEFAULT_LIB));
}
