use crate::{
    error::TransferError,
    execution::{abort::AbortHandle, report::TransferReport},
};
use connectors::{sink::SinkFactory, source::RowSource};
use engine_config::settings::TransferSettings;
use engine_core::{metrics::TransferMetrics, progress::RateLimitedReporter};
use engine_processing::{
    consumer::UploadWorkerPool, context::PipelineContext, producer::ExtractionDriver,
};
use std::{fmt, sync::Arc, time::Instant};
use tracing::{debug, error, info, warn};

/// Runs one transfer to completion.
pub fn run(
    settings: TransferSettings,
    sinks: Arc<dyn SinkFactory>,
    source: &mut dyn RowSource,
) -> Result<TransferReport, TransferError> {
    TransferExecutor::new(settings, sinks)?.execute(source)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Starting,
    Extracting,
    Draining,
    Joining,
    Done { success: bool },
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineStage::Starting => write!(f, "starting"),
            PipelineStage::Extracting => write!(f, "extracting"),
            PipelineStage::Draining => write!(f, "draining"),
            PipelineStage::Joining => write!(f, "joining"),
            PipelineStage::Done { success: true } => write!(f, "done (success)"),
            PipelineStage::Done { success: false } => write!(f, "done (failure)"),
        }
    }
}

/// Owns the shared state of one run and sequences its stages:
/// start workers, extract, drain, join, report.
pub struct TransferExecutor {
    settings: TransferSettings,
    sinks: Arc<dyn SinkFactory>,
    ctx: PipelineContext,
    stage: PipelineStage,
}

impl TransferExecutor {
    pub fn new(
        settings: TransferSettings,
        sinks: Arc<dyn SinkFactory>,
    ) -> Result<Self, TransferError> {
        settings.validate()?;

        let metrics = TransferMetrics::new();
        let status = metrics.clone();
        let reporter = RateLimitedReporter::new(settings.status_interval, move || {
            info!("Uploading... {} rows", status.rows_uploaded());
        });
        let ctx = PipelineContext::new(settings.queue_capacity, metrics, reporter);

        Ok(Self {
            settings,
            sinks,
            ctx,
            stage: PipelineStage::Starting,
        })
    }

    /// Handle that cancels this run. Valid before and during [`Self::execute`].
    pub fn abort_handle(&self) -> AbortHandle {
        AbortHandle::new(self.ctx.clone())
    }

    pub fn stage(&self) -> PipelineStage {
        self.stage
    }

    /// Drives the pipeline on the calling thread.
    ///
    /// Only a failure to spawn the worker threads is returned as an error;
    /// everything else that goes wrong is reported through
    /// [`TransferReport::success`].
    pub fn execute(mut self, source: &mut dyn RowSource) -> Result<TransferReport, TransferError> {
        let started = Instant::now();
        info!(
            source = %self.settings.source_table,
            destination = %format!("{}.{}", self.settings.database, self.settings.destination_table),
            target = self.sinks.endpoint(),
            batch_size = self.settings.batch_size,
            workers = self.settings.workers,
            "Starting upload"
        );

        self.transition(PipelineStage::Starting);
        let pool = UploadWorkerPool::start(
            &self.ctx,
            self.sinks.clone(),
            self.settings.retry_policy(),
            self.settings.workers,
        )?;

        self.transition(PipelineStage::Extracting);
        let driver = ExtractionDriver::new(self.ctx.clone(), &self.settings);
        driver.run(source);

        self.transition(PipelineStage::Draining);
        if !self.ctx.flag.is_raised() && !self.ctx.queue.wait_until_empty() {
            debug!("Drain wait interrupted");
        }

        self.transition(PipelineStage::Joining);
        self.ctx.mark_producer_done();
        self.ctx.queue.wakeup();
        match pool.join() {
            Ok(batches) => debug!(batches, "Upload workers joined"),
            Err(err) => warn!(error = %err, "Upload workers joined with errors"),
        }

        let success = !self.ctx.flag.is_raised();
        self.transition(PipelineStage::Done { success });
        self.ctx.reporter.run_force();

        if success {
            info!("Upload finished successfully");
        } else {
            error!("Upload finished with errors");
        }

        Ok(TransferReport {
            success,
            metrics: self.ctx.metrics.snapshot(),
            elapsed: started.elapsed(),
        })
    }

    fn transition(&mut self, next: PipelineStage) {
        debug!(from = %self.stage, to = %next, "Pipeline stage");
        self.stage = next;
    }
}
