use crate::common::{MetricsSnapshot, SinkMetrics};

#[test]
fn test_metrics_start_at_zero() {
    assert_eq!(SinkMetrics::new().snapshot(), MetricsSnapshot::default());
}

#[test]
fn test_metrics_counting() {
    let metrics = SinkMetrics::new();
    metrics.request_ok(10);
    metrics.request_ok(1);
    metrics.request_failed();
    metrics.rejected(4);

    let snap = metrics.snapshot();
    assert_eq!(snap.requests_sent, 3);
    assert_eq!(snap.records_written, 11);
    assert_eq!(snap.request_errors, 1);
    assert_eq!(snap.records_rejected, 4);
}
