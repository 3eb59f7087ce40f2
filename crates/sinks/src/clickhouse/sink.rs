//! ClickHouse storage sink
//!
//! Converts records into wide `events` rows and inserts them, either as one
//! multi-row insert per batch or as independent server-side async inserts.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use beacon_pipeline::{Sink, SinkError};
use beacon_protocol::EventRecord;
use chrono::{DateTime, Utc};
use clickhouse::Client;
use clickhouse::insert::Insert;

use crate::common::{MetricsSnapshot, SinkMetrics};

use super::config::ClickHouseConfig;
use super::schema::schema_statements;
use super::tables::EventRow;

/// ClickHouse sink for analytics events
pub struct ClickHouseSink {
    name: String,
    config: ClickHouseConfig,

    /// Client for batched inserts and queries
    client: Client,

    /// Client with async insert settings
    async_client: Client,

    closed: AtomicBool,
    metrics: Arc<SinkMetrics>,
}

impl ClickHouseSink {
    /// Create a new ClickHouse sink
    pub fn new(config: ClickHouseConfig) -> Self {
        Self::with_name(config, "clickhouse")
    }

    /// Create a new ClickHouse sink with a custom name
    pub fn with_name(config: ClickHouseConfig, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            client: config.build_client(),
            async_client: config.build_async_insert_client(),
            config,
            closed: AtomicBool::new(false),
            metrics: Arc::new(SinkMetrics::new()),
        }
    }

    /// Get reference to config
    pub fn config(&self) -> &ClickHouseConfig {
        &self.config
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// One multi-row insert; any encoding error rejects the whole batch
    async fn deliver_batched(
        &self,
        batch: &[EventRecord],
        now: DateTime<Utc>,
    ) -> Result<(), SinkError> {
        let rows = batch
            .iter()
            .map(|record| EventRow::from_record(record, now))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| {
                self.metrics.rejected(batch.len());
                SinkError::batch_rejected(batch.len(), e.to_string())
            })?;

        let result = self
            .bounded(write_rows(&self.client, &self.config.table, &rows))
            .await;
        match &result {
            Ok(()) => {
                self.metrics.request_ok(rows.len());
                tracing::debug!(sink = %self.name, rows = rows.len(), "batch inserted");
            }
            Err(_) => self.metrics.request_failed(),
        }
        result
    }

    /// One async insert per record; every record is attempted
    async fn deliver_async(
        &self,
        batch: &[EventRecord],
        now: DateTime<Utc>,
    ) -> Result<(), SinkError> {
        let total = batch.len();
        let mut failed = 0;
        let mut last_error = None;

        for record in batch {
            let outcome = match EventRow::from_record(record, now) {
                Ok(row) => {
                    let result = self
                        .bounded(write_rows(
                            &self.async_client,
                            &self.config.table,
                            std::slice::from_ref(&row),
                        ))
                        .await;
                    match &result {
                        Ok(()) => self.metrics.request_ok(1),
                        Err(_) => self.metrics.request_failed(),
                    }
                    result
                }
                Err(e) => {
                    self.metrics.rejected(1);
                    Err(e)
                }
            };

            if let Err(e) = outcome {
                tracing::debug!(sink = %self.name, event = record.event(), error = %e, "async insert failed");
                failed += 1;
                last_error = Some(e);
            }
        }

        match last_error {
            None => Ok(()),
            Some(e) if total == 1 => Err(e),
            Some(_) => Err(SinkError::Partial { failed, total }),
        }
    }

    /// Run a store call under the request timeout
    async fn bounded<F>(&self, call: F) -> Result<(), SinkError>
    where
        F: Future<Output = Result<(), clickhouse::error::Error>>,
    {
        let timeout = self.config.request_timeout;
        match tokio::time::timeout(timeout, call).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(store_error(e)),
            Err(_) => Err(SinkError::Timeout(timeout)),
        }
    }
}

#[async_trait]
impl Sink for ClickHouseSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn deliver(&self, batch: Vec<EventRecord>) -> Result<(), SinkError> {
        if batch.is_empty() {
            return Ok(());
        }

        let now = Utc::now();
        if self.config.async_insert {
            self.deliver_async(&batch, now).await
        } else {
            self.deliver_batched(&batch, now).await
        }
    }

    async fn ensure_ready(&self, timeout: Duration) -> Result<(), SinkError> {
        // The target database may not exist yet, so DDL runs against `default`
        let admin = self.config.build_client().with_database("default");
        let statements = schema_statements(&self.config.database);

        let apply = async {
            for statement in &statements {
                admin.query(statement).execute().await.map_err(store_error)?;
            }
            Ok::<(), SinkError>(())
        };

        tokio::time::timeout(timeout, apply)
            .await
            .map_err(|_| SinkError::Timeout(timeout))??;

        tracing::info!(
            sink = %self.name,
            database = %self.config.database,
            statements = statements.len(),
            "schema ready"
        );
        Ok(())
    }

    async fn close(&self) -> Result<(), SinkError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        let snapshot = self.metrics.snapshot();
        tracing::info!(
            sink = %self.name,
            requests_sent = snapshot.requests_sent,
            records_written = snapshot.records_written,
            request_errors = snapshot.request_errors,
            records_rejected = snapshot.records_rejected,
            "clickhouse sink closed"
        );
        Ok(())
    }
}

/// Stream rows through one insert
///
/// Returning early drops the insert, which aborts it without committing.
async fn write_rows(
    client: &Client,
    table: &str,
    rows: &[EventRow],
) -> Result<(), clickhouse::error::Error> {
    let mut insert: Insert<EventRow> = client.insert(table).await?;
    for row in rows {
        insert.write(row).await?;
    }
    insert.end().await
}

fn store_error(e: clickhouse::error::Error) -> SinkError {
    match e {
        clickhouse::error::Error::Network(_) => SinkError::unavailable(e.to_string()),
        other => SinkError::Store(other.to_string()),
    }
}
