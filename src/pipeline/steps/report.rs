use crate::pipeline::{StepContext, StepError};
use crate::report::render_report;
use crate::state::WorkflowState;

pub fn build_report(state: &mut WorkflowState, _ctx: &StepContext<'_>) -> Result<(), StepError> {
    let report = render_report(state);
    tracing::debug!(bytes = report.len(), "built report");
    state.report = Some(report);
    Ok(())
}
