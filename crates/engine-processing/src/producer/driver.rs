use crate::{context::PipelineContext, error::ProducerError};
use connectors::source::RowSource;
use engine_config::settings::TransferSettings;
use model::records::{Batch, Record};
use tracing::{debug, error, info, trace};

/// What one extraction pass produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractionSummary {
    pub rows_read: u64,
    pub batches_enqueued: u64,
    /// The pass stopped before the end of the result set, either because the
    /// error flag went up or because the queue refused a batch.
    pub interrupted: bool,
}

/// Single producer of the pipeline: reads the source table row by row and
/// feeds fixed-size batches into the hand-off queue.
pub struct ExtractionDriver {
    ctx: PipelineContext,
    source_table: String,
    database: String,
    destination_table: String,
    query: String,
    batch_size: usize,
}

impl ExtractionDriver {
    pub fn new(ctx: PipelineContext, settings: &TransferSettings) -> Self {
        Self {
            ctx,
            source_table: settings.source_table.clone(),
            database: settings.database.clone(),
            destination_table: settings.destination_table.clone(),
            query: settings.source_query(),
            batch_size: settings.batch_size.max(1),
        }
    }

    /// Runs one extraction pass.
    ///
    /// Source and serialization failures are logged and turned into a raised
    /// error flag plus a queue wake-up; they never reach the caller. Returns
    /// `None` in that case.
    pub fn run(&self, source: &mut dyn RowSource) -> Option<ExtractionSummary> {
        match self.extract(source) {
            Ok(summary) => {
                info!(
                    table = %self.source_table,
                    rows = summary.rows_read,
                    batches = summary.batches_enqueued,
                    interrupted = summary.interrupted,
                    "Extraction finished"
                );
                Some(summary)
            }
            Err(err) => {
                error!(table = %self.source_table, error = %err, "Extraction failed");
                self.ctx.abort();
                None
            }
        }
    }

    fn extract(&self, source: &mut dyn RowSource) -> Result<ExtractionSummary, ProducerError> {
        let columns = source.list_columns(&self.source_table)?;
        debug!(table = %self.source_table, columns = columns.len(), "Listed source columns");
        trace!(query = %self.query, "Running source query");

        let mut summary = ExtractionSummary::default();
        let mut batch = Batch::new(1);
        let mut failure = None;

        let mut on_row = |values: &[String]| -> bool {
            let record = Record::new(&self.database, &self.destination_table, &columns, values);
            if let Err(err) = batch.push_record(&record) {
                failure = Some(err);
                return false;
            }

            summary.rows_read += 1;
            self.ctx.metrics.increment_rows_read(1);
            self.ctx.reporter.run_maybe();

            if batch.row_count() >= self.batch_size {
                let next = Batch::new(batch.seq() + 1);
                let full = std::mem::replace(&mut batch, next);
                if !self.enqueue(full) {
                    summary.interrupted = true;
                    return false;
                }
                summary.batches_enqueued += 1;
            }

            !self.ctx.flag.is_raised()
        };

        source.stream_rows(&self.query, &mut on_row)?;

        if let Some(err) = failure {
            return Err(err.into());
        }

        if self.ctx.flag.is_raised() {
            summary.interrupted = true;
            return Ok(summary);
        }

        if !summary.interrupted && !batch.is_empty() {
            if self.enqueue(batch) {
                summary.batches_enqueued += 1;
            } else {
                summary.interrupted = true;
            }
        }

        if !self.ctx.queue.wait_until_empty() {
            summary.interrupted = true;
        }

        Ok(summary)
    }

    /// Blocking insert. `false` if the queue was woken while full.
    fn enqueue(&self, batch: Batch) -> bool {
        let seq = batch.seq();
        let rows = batch.row_count();

        match self.ctx.queue.insert(batch) {
            Ok(()) => {
                self.ctx.metrics.increment_batches_enqueued(1);
                debug!(batch = seq, rows, "Batch enqueued");
                true
            }
            Err(batch) => {
                debug!(batch = batch.seq(), "Queue woken, batch not enqueued");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use connectors::error::SourceError;
    use engine_core::{metrics::TransferMetrics, progress::RateLimitedReporter};
    use serde_json::Value;
    use std::{thread, time::Duration};

    struct VecSource {
        columns: Vec<String>,
        rows: Vec<Vec<String>>,
        fail_after: Option<usize>,
    }

    impl VecSource {
        fn numbered(count: usize) -> Self {
            Self {
                columns: vec!["id".to_string(), "name".to_string()],
                rows: (0..count)
                    .map(|i| vec![i.to_string(), format!("row-{i}")])
                    .collect(),
                fail_after: None,
            }
        }
    }

    impl RowSource for VecSource {
        fn list_columns(&mut self, table: &str) -> Result<Vec<String>, SourceError> {
            if table == "missing" {
                return Err(SourceError::UnknownTable(table.to_string()));
            }
            Ok(self.columns.clone())
        }

        fn stream_rows(
            &mut self,
            _query: &str,
            on_row: &mut dyn FnMut(&[String]) -> bool,
        ) -> Result<(), SourceError> {
            for (i, row) in self.rows.iter().enumerate() {
                if self.fail_after == Some(i) {
                    return Err(SourceError::Other("connection lost".to_string()));
                }
                if !on_row(row) {
                    break;
                }
            }
            Ok(())
        }
    }

    fn context() -> PipelineContext {
        PipelineContext::new(
            1,
            TransferMetrics::new(),
            RateLimitedReporter::new(Duration::from_secs(3600), || {}),
        )
    }

    fn settings(batch_size: usize) -> TransferSettings {
        let mut settings = TransferSettings::new("src", "dst", "localhost", 9175, "db");
        settings.batch_size = batch_size;
        settings
    }

    /// Drains the queue on a separate thread until it is woken empty.
    fn collector(ctx: &PipelineContext) -> thread::JoinHandle<Vec<Batch>> {
        let queue = ctx.queue.clone();
        thread::spawn(move || {
            let mut batches = Vec::new();
            while let Some(batch) = queue.interruptible_pop() {
                batches.push(batch);
            }
            batches
        })
    }

    fn ids(batch: &Batch) -> Vec<String> {
        let body: Value = serde_json::from_str(&batch.to_json_array()).unwrap();
        body.as_array()
            .unwrap()
            .iter()
            .map(|r| r["data"]["id"].as_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn splits_rows_into_fixed_size_batches() {
        let ctx = context();
        let consumer = collector(&ctx);
        let driver = ExtractionDriver::new(ctx.clone(), &settings(128));

        let summary = driver.run(&mut VecSource::numbered(300)).unwrap();
        ctx.queue.wakeup();
        let batches = consumer.join().unwrap();

        assert_eq!(summary.rows_read, 300);
        assert_eq!(summary.batches_enqueued, 3);
        assert!(!summary.interrupted);

        let sizes: Vec<usize> = batches.iter().map(Batch::row_count).collect();
        assert_eq!(sizes, vec![128, 128, 44]);
        let seqs: Vec<u64> = batches.iter().map(Batch::seq).collect();
        assert_eq!(seqs, vec![1, 2, 3]);

        let all: Vec<String> = batches.iter().flat_map(ids).collect();
        let expected: Vec<String> = (0..300).map(|i| i.to_string()).collect();
        assert_eq!(all, expected);
        assert_eq!(ctx.metrics.snapshot().rows_read, 300);
    }

    #[test]
    fn exact_multiple_leaves_no_trailing_batch() {
        let ctx = context();
        let consumer = collector(&ctx);
        let driver = ExtractionDriver::new(ctx.clone(), &settings(10));

        let summary = driver.run(&mut VecSource::numbered(30)).unwrap();
        ctx.queue.wakeup();
        let batches = consumer.join().unwrap();

        assert_eq!(summary.batches_enqueued, 3);
        assert!(batches.iter().all(|b| b.row_count() == 10));
    }

    #[test]
    fn empty_table_enqueues_nothing() {
        let ctx = context();
        let driver = ExtractionDriver::new(ctx.clone(), &settings(10));

        let summary = driver.run(&mut VecSource::numbered(0)).unwrap();

        assert_eq!(summary, ExtractionSummary::default());
        assert!(ctx.queue.is_empty());
        assert!(!ctx.flag.is_raised());
    }

    #[test]
    fn source_failure_raises_flag_and_wakes_queue() {
        let ctx = context();
        let consumer = collector(&ctx);
        let driver = ExtractionDriver::new(ctx.clone(), &settings(10));

        let mut source = VecSource::numbered(200);
        source.fail_after = Some(50);

        assert!(driver.run(&mut source).is_none());
        assert!(ctx.flag.is_raised());
        assert!(ctx.queue.is_woken());

        let batches = consumer.join().unwrap();
        let rows: usize = batches.iter().map(Batch::row_count).sum();
        assert!(rows <= 50);
        assert_eq!(ctx.metrics.snapshot().rows_read, 50);
    }

    #[test]
    fn unknown_table_aborts_before_streaming() {
        let ctx = context();
        let mut settings = settings(10);
        settings.source_table = "missing".to_string();
        let driver = ExtractionDriver::new(ctx.clone(), &settings);

        assert!(driver.run(&mut VecSource::numbered(5)).is_none());
        assert!(ctx.flag.is_raised());
        assert_eq!(ctx.metrics.snapshot().rows_read, 0);
    }

    #[test]
    fn raised_flag_stops_the_stream() {
        let ctx = context();
        ctx.abort();
        let driver = ExtractionDriver::new(ctx.clone(), &settings(10));

        let summary = driver.run(&mut VecSource::numbered(100)).unwrap();

        assert!(summary.interrupted);
        assert_eq!(summary.rows_read, 1);
        assert_eq!(summary.batches_enqueued, 0);
    }
}
