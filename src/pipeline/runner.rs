use super::{StepContext, StepDescriptor, StepError, StepName};
use crate::state::{snapshot_digests, WorkflowState};
use anyhow::{anyhow, Result};
use std::time::Instant;

/// Drives the steps of one run strictly in sequence.
pub struct PipelineRunner<'a> {
    ctx: StepContext<'a>,
    check_contracts: bool,
}

impl<'a> PipelineRunner<'a> {
    pub fn new(ctx: StepContext<'a>) -> Self {
        Self {
            ctx,
            check_contracts: cfg!(debug_assertions),
        }
    }

    /// After each step, fail the run if a field outside the step's declared
    /// write set changed or if the error list lost entries.
    pub fn with_contract_checks(mut self, enabled: bool) -> Self {
        self.check_contracts = enabled;
        self
    }

    /// Run `plan_run`, then every step it planned, in order.
    pub fn run(&self, state: WorkflowState) -> Result<WorkflowState> {
        let started = Instant::now();
        let mut state = self.run_step(state, StepName::PlanRun)?;
        let planned = state.plan.steps.clone();
        for step in planned.into_iter().skip_while(|step| *step == StepName::PlanRun) {
            state = self.run_step(state, step)?;
        }
        tracing::info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            steps = state.completed_steps.len(),
            errors = state.errors.len(),
            "pipeline complete"
        );
        Ok(state)
    }

    /// Execute one step against `state`, recording expected errors and the
    /// step name. Only faults and contract violations are returned as `Err`.
    pub fn run_step(&self, state: WorkflowState, step: StepName) -> Result<WorkflowState> {
        self.run_descriptor(state, step.descriptor())
    }

    /// [`Self::run_step`] for an explicit descriptor.
    pub fn run_descriptor(
        &self,
        mut state: WorkflowState,
        descriptor: &StepDescriptor,
    ) -> Result<WorkflowState> {
        let step = descriptor.name;
        let before = if self.check_contracts {
            Some((snapshot_digests(&state)?, state.errors.clone()))
        } else {
            None
        };
        let errors_before = state.errors.len();
        let started = Instant::now();

        match (descriptor.run)(&mut state, &self.ctx) {
            Ok(()) => {}
            Err(StepError::Fault(err)) => {
                tracing::error!(step = %step, error = %format!("{err:#}"), "step faulted");
                return Err(err.context(format!("step {step} faulted")));
            }
            Err(err) => state.record_error(err.to_string()),
        }
        state.completed_steps.push(step);

        if let Some((digests, errors)) = before {
            check_contract(descriptor, &digests, &errors, &state)?;
        }

        let errors_added = state.errors.len().saturating_sub(errors_before);
        for message in state.errors.iter().skip(errors_before) {
            tracing::warn!(step = %step, "{message}");
        }
        tracing::info!(
            step = %step,
            elapsed_ms = started.elapsed().as_millis() as u64,
            errors_added,
            "step complete"
        );
        Ok(state)
    }
}

fn check_contract(
    descriptor: &StepDescriptor,
    before: &[(crate::state::StateField, String)],
    errors_before: &[String],
    state: &WorkflowState,
) -> Result<()> {
    let after = snapshot_digests(state)?;
    for ((field, old), (_, new)) in before.iter().zip(after.iter()) {
        if old != new && !descriptor.may_write(*field) {
            return Err(anyhow!(
                "step {} mutated undeclared field {:?}",
                descriptor.name,
                field
            ));
        }
    }
    if !state.errors.starts_with(errors_before) {
        return Err(anyhow!(
            "step {} removed or rewrote recorded errors",
            descriptor.name
        ));
    }
    Ok(())
}

/// Run the full pipeline with the default contract-check setting.
pub fn run_pipeline(state: WorkflowState, ctx: StepContext<'_>) -> Result<WorkflowState> {
    PipelineRunner::new(ctx).run(state)
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
