//! Startup bootstrap orchestration.
//!
//! Sequences the identity provider readiness probe and the seeding steps in
//! a fixed order, isolates the non-critical privileged-account assignment,
//! and exposes the automatic run-at-startup entry point plus the manual
//! per-step re-trigger used by the administrative endpoints.
//!
//! Concurrent re-triggers are not serialized; every step is idempotent
//! (find-or-create), which is what makes overlapping invocations safe.

use serde::Serialize;
use tokio::sync::RwLock;
use utoipa::ToSchema;

use crate::error::{AppError, Result};
use crate::services::readiness::ReadinessProbe;
use crate::services::seeding::{SeedStep, SeedingService};

/// Pseudo-step recording the readiness probe result in the outcome list
const PROBE_STEP: &str = "readinessProbe";

/// Non-critical step: grants admin roles to the configured account
pub const PRIVILEGED_ACCOUNT_STEP: &str = "privilegedAccount";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Succeeded,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StepOutcome {
    pub step: String,
    pub status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StepOutcome {
    fn succeeded(step: &str) -> Self {
        Self {
            step: step.to_string(),
            status: StepStatus::Succeeded,
            error: None,
        }
    }

    fn failed(step: &str, error: &AppError) -> Self {
        Self {
            step: step.to_string(),
            status: StepStatus::Failed,
            error: Some(error.to_string()),
        }
    }

    fn skipped(step: &str) -> Self {
        Self {
            step: step.to_string(),
            status: StepStatus::Skipped,
            error: None,
        }
    }
}

/// Terminal state of one orchestration run. There is no failed terminal
/// state: failures are recorded per step and the process keeps serving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub enum RunState {
    #[serde(rename = "completed")]
    Completed,
    #[serde(rename = "completedWithWarnings")]
    CompletedWithWarnings,
}

/// Result of one orchestration run: the ordered step outcomes. Transient,
/// logged and returned to the caller, never persisted.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BootstrapOutcome {
    pub state: RunState,
    pub steps: Vec<StepOutcome>,
}

impl BootstrapOutcome {
    pub fn has_failures(&self) -> bool {
        self.steps.iter().any(|s| s.status == StepStatus::Failed)
    }

    pub fn first_failure(&self) -> Option<&StepOutcome> {
        self.steps.iter().find(|s| s.status == StepStatus::Failed)
    }
}

pub struct BootstrapOrchestrator {
    seeding: SeedingService,
    probe: ReadinessProbe,
    last_outcome: RwLock<Option<BootstrapOutcome>>,
}

impl BootstrapOrchestrator {
    pub fn new(seeding: SeedingService, probe: ReadinessProbe) -> Self {
        Self {
            seeding,
            probe,
            last_outcome: RwLock::new(None),
        }
    }

    /// Seeding steps in execution order, after the readiness probe.
    fn step_sequence() -> [&'static str; 6] {
        [
            SeedStep::Roles.name(),
            SeedStep::ClaimMappers.name(),
            PRIVILEGED_ACCOUNT_STEP,
            SeedStep::Endpoints.name(),
            SeedStep::RolePermissions.name(),
            SeedStep::StaticPages.name(),
        ]
    }

    fn is_known_step(name: &str) -> bool {
        name == PRIVILEGED_ACCOUNT_STEP || SeedStep::from_name(name).is_some()
    }

    /// Execute one step body. The privileged-account assignment reports a
    /// skip when no account is configured.
    async fn execute(&self, name: &str) -> Result<StepStatus> {
        if name == PRIVILEGED_ACCOUNT_STEP {
            let assigned = self.seeding.assign_privileged_account_roles().await?;
            return Ok(if assigned {
                StepStatus::Succeeded
            } else {
                StepStatus::Skipped
            });
        }

        let step = SeedStep::from_name(name)
            .ok_or_else(|| AppError::NotFound(format!("Unknown bootstrap step: {}", name)))?;
        self.seeding.run(step).await?;
        Ok(StepStatus::Succeeded)
    }

    /// Run the full bootstrap sequence. Never returns an error: a probe
    /// exhaustion or a critical step failure truncates the remaining steps
    /// for this run and is reported in the outcome, and the process keeps
    /// serving traffic. The roles seeding call doubles as the readiness
    /// probe, so it must be both idempotent and a valid connectivity signal.
    pub async fn run(&self) -> BootstrapOutcome {
        tracing::info!("Starting bootstrap run");
        let mut steps: Vec<StepOutcome> = Vec::new();
        let mut aborted = false;

        match self
            .probe
            .wait_until_ready(|| self.seeding.seed_roles())
            .await
        {
            Ok(()) => steps.push(StepOutcome::succeeded(PROBE_STEP)),
            Err(e) => {
                tracing::error!("Identity provider never became ready: {}", e);
                steps.push(StepOutcome::failed(PROBE_STEP, &e));
                aborted = true;
            }
        }

        for name in Self::step_sequence() {
            if aborted {
                steps.push(StepOutcome::skipped(name));
                continue;
            }

            match self.execute(name).await {
                Ok(status) => steps.push(StepOutcome {
                    step: name.to_string(),
                    status,
                    error: None,
                }),
                Err(e) if name == PRIVILEGED_ACCOUNT_STEP => {
                    // Explicitly non-critical: swallowed here, sequence continues
                    tracing::warn!("Non-critical step '{}' failed: {}", name, e);
                    steps.push(StepOutcome::failed(name, &e));
                }
                Err(e) => {
                    tracing::error!(
                        "Bootstrap step '{}' failed, aborting remaining steps for this run: {}",
                        name,
                        e
                    );
                    steps.push(StepOutcome::failed(name, &e));
                    aborted = true;
                }
            }
        }

        let state = if steps.iter().any(|s| s.status == StepStatus::Failed) {
            RunState::CompletedWithWarnings
        } else {
            RunState::Completed
        };
        let outcome = BootstrapOutcome { state, steps };

        match state {
            RunState::Completed => tracing::info!("Bootstrap run completed"),
            RunState::CompletedWithWarnings => {
                tracing::warn!("Bootstrap run completed with warnings")
            }
        }

        *self.last_outcome.write().await = Some(outcome.clone());
        outcome
    }

    /// Re-execute exactly one named step, outside the full sequence and
    /// without the readiness probe. Unknown names are NotFound; a step
    /// failure is reported as a structured error for the admin caller.
    pub async fn run_step(&self, name: &str) -> Result<StepOutcome> {
        if !Self::is_known_step(name) {
            return Err(AppError::NotFound(format!(
                "Unknown bootstrap step: {}",
                name
            )));
        }

        tracing::info!("Manually running bootstrap step '{}'", name);
        match self.execute(name).await {
            Ok(status) => Ok(StepOutcome {
                step: name.to_string(),
                status,
                error: None,
            }),
            Err(e) => Err(AppError::StepFailed {
                step: name.to_string(),
                detail: e.to_string(),
            }),
        }
    }

    /// Outcome of the most recent full run, if any.
    pub async fn last_outcome(&self) -> Option<BootstrapOutcome> {
        self.last_outcome.read().await.clone()
    }
}
