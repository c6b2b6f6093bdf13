use engine_processing::context::PipelineContext;

/// Cancels a running transfer from another thread, e.g. a signal handler.
///
/// Aborting has the same effect as a worker failure: the error flag goes up,
/// everything blocked on the queue is released and the run ends with a
/// failed verdict.
#[derive(Clone)]
pub struct AbortHandle {
    ctx: PipelineContext,
}

impl AbortHandle {
    pub(crate) fn new(ctx: PipelineContext) -> Self {
        Self { ctx }
    }

    /// Returns `true` if this call was the one that stopped the run.
    pub fn abort(&self) -> bool {
        self.ctx.abort()
    }

    pub fn is_aborted(&self) -> bool {
        self.ctx.flag.is_raised()
    }
}
