// vouch-core/src/domain/checkpoint.rs

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::{info, warn};

use crate::domain::batch::Batch;
use crate::domain::error::DomainError;
use crate::domain::registry::ExpectationRegistry;
use crate::domain::validation::{ValidationResult, evaluate};

pub const DEFAULT_RUN_NAME_TEMPLATE: &str = "%Y%m%d-%H%M%S";

/// Post-validation capabilities, executed in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// Persists the raw validation result.
    StoreValidationResult,
    /// Renders the validation report and refreshes the local site index.
    UpdateDataDocs,
    /// Sends a notification, only for failed validations.
    NotifyOnFailure {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        channel: Option<String>,
    },
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::StoreValidationResult => "store_validation_result",
            Action::UpdateDataDocs => "update_data_docs",
            Action::NotifyOnFailure { .. } => "notify_on_failure",
        }
    }

    pub fn applies_to(&self, state: RunState) -> bool {
        match self {
            Action::StoreValidationResult | Action::UpdateDataDocs => true,
            Action::NotifyOnFailure { .. } => state == RunState::Failed,
        }
    }
}

fn default_actions() -> Vec<Action> {
    vec![
        Action::StoreValidationResult,
        Action::UpdateDataDocs,
        Action::NotifyOnFailure { channel: None },
    ]
}

fn default_config_version() -> u32 {
    1
}

fn default_run_name_template() -> String {
    DEFAULT_RUN_NAME_TEMPLATE.to_string()
}

/// A reusable run configuration: which registry, how runs are named, and
/// what happens after validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub name: String,
    #[serde(default = "default_config_version")]
    pub config_version: u32,
    pub registry_name: String,
    #[serde(default = "default_run_name_template")]
    pub run_name_template: String,
    #[serde(default = "default_actions")]
    pub actions: Vec<Action>,
}

impl Checkpoint {
    pub fn new(name: impl Into<String>, registry_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config_version: default_config_version(),
            registry_name: registry_name.into(),
            run_name_template: default_run_name_template(),
            actions: default_actions(),
        }
    }

    pub fn with_run_name_template(mut self, template: impl Into<String>) -> Self {
        self.run_name_template = template.into();
        self
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::invalid_parameter("checkpoint", "name is required"));
        }
        if self.registry_name.trim().is_empty() {
            return Err(DomainError::invalid_parameter(
                "checkpoint",
                "registry name is required",
            ));
        }
        if self.run_name_template.is_empty()
            || StrftimeItems::new(&self.run_name_template).any(|item| matches!(item, Item::Error))
        {
            return Err(DomainError::invalid_parameter(
                "checkpoint",
                format!("invalid run name template '{}'", self.run_name_template),
            ));
        }
        self.render_run_name(DateTime::<Utc>::default()).map(|_| ())
    }

    pub fn run_name(&self, run_time: DateTime<Utc>) -> Result<String, DomainError> {
        self.validate()?;
        self.render_run_name(run_time)
    }

    // Run names become a directory of the validation store: one plain segment.
    fn render_run_name(&self, run_time: DateTime<Utc>) -> Result<String, DomainError> {
        let rendered = run_time.format(&self.run_name_template).to_string();
        if rendered.trim().is_empty()
            || rendered.starts_with('.')
            || rendered.contains(['/', '\\'])
            || rendered.chars().any(char::is_control)
        {
            return Err(DomainError::invalid_parameter(
                "checkpoint",
                format!(
                    "run name template '{}' renders '{}', which is not a plain name",
                    self.run_name_template, rendered
                ),
            ));
        }
        Ok(rendered)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl RunState {
    pub fn transition(self, next: RunState) -> Result<RunState, DomainError> {
        match (self, next) {
            (RunState::Pending, RunState::Running)
            | (RunState::Running, RunState::Succeeded)
            | (RunState::Running, RunState::Failed) => Ok(next),
            _ => Err(DomainError::InvalidTransition {
                from: self.to_string(),
                to: next.to_string(),
            }),
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Succeeded | RunState::Failed)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunState::Pending => "PENDING",
            RunState::Running => "RUNNING",
            RunState::Succeeded => "SUCCEEDED",
            RunState::Failed => "FAILED",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ActionStatus {
    Succeeded {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
    },
    Skipped,
    Failed {
        error: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionOutcome {
    pub action: String,
    #[serde(flatten)]
    pub status: ActionStatus,
}

impl ActionOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self.status, ActionStatus::Failed { .. })
    }
}

/// Everything an action may need to know about the pair it runs for.
pub struct ActionContext<'a> {
    pub checkpoint: &'a Checkpoint,
    pub run_name: &'a str,
    pub state: RunState,
    pub registry: &'a ExpectationRegistry,
    pub result: &'a ValidationResult,
}

/// Side-effecting half of a checkpoint. The runner decides which actions
/// apply; the executor only carries them out.
pub trait ActionExecutor {
    type Error: fmt::Display;

    /// Returns an optional human readable detail (e.g. the path written).
    fn execute(&mut self, action: &Action, ctx: &ActionContext<'_>) -> Result<Option<String>, Self::Error>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairResult {
    pub state: RunState,
    pub validation: ValidationResult,
    pub actions: Vec<ActionOutcome>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointResult {
    pub checkpoint_name: String,
    pub run_name: String,
    pub state: RunState,
    pub success: bool,
    pub run_results: Vec<PairResult>,
}

impl CheckpointResult {
    pub fn action_failures(&self) -> impl Iterator<Item = &ActionOutcome> {
        self.run_results
            .iter()
            .flat_map(|r| r.actions.iter())
            .filter(|a| a.is_failure())
    }
}

/// Validates every `(batch, registry)` pair, then runs the checkpoint actions
/// pair by pair. Engine faults abort the run before any action executes. A
/// failing action is recorded and the next one still runs; the validation
/// outcome is never affected by action failures.
pub fn run_checkpoint<E: ActionExecutor>(
    checkpoint: &Checkpoint,
    pairs: &[(&Batch, &ExpectationRegistry)],
    run_time: DateTime<Utc>,
    executor: &mut E,
) -> Result<CheckpointResult, DomainError> {
    let run_name = checkpoint.run_name(run_time)?;
    let mut state = RunState::Pending.transition(RunState::Running)?;
    info!(checkpoint = %checkpoint.name, run = %run_name, pairs = pairs.len(), "Checkpoint running");

    // Results are addressed by (registry, run, fingerprint).
    let mut seen = HashSet::with_capacity(pairs.len());
    for (batch, registry) in pairs {
        let fingerprint = batch.id().fingerprint();
        if !seen.insert((registry.name(), fingerprint.clone())) {
            return Err(DomainError::invalid_parameter(
                "checkpoint",
                format!(
                    "batch '{}' is validated twice against '{}' in run '{}'",
                    fingerprint,
                    registry.name(),
                    run_name
                ),
            ));
        }
    }

    let validations = pairs
        .iter()
        .map(|(batch, registry)| evaluate(batch, registry))
        .collect::<Result<Vec<_>, _>>()?;

    let mut run_results = Vec::with_capacity(pairs.len());
    for ((_, registry), validation) in pairs.iter().zip(validations) {
        let pair_state = RunState::Running.transition(if validation.success {
            RunState::Succeeded
        } else {
            RunState::Failed
        })?;

        let ctx = ActionContext {
            checkpoint,
            run_name: &run_name,
            state: pair_state,
            registry,
            result: &validation,
        };

        let actions = checkpoint
            .actions
            .iter()
            .map(|action| {
                let status = if !action.applies_to(pair_state) {
                    ActionStatus::Skipped
                } else {
                    match executor.execute(action, &ctx) {
                        Ok(detail) => ActionStatus::Succeeded { detail },
                        Err(e) => {
                            let err = DomainError::ActionExecution {
                                action: action.name().to_string(),
                                reason: e.to_string(),
                            };
                            warn!(checkpoint = %checkpoint.name, "{}", err);
                            ActionStatus::Failed {
                                error: err.to_string(),
                            }
                        }
                    }
                };
                ActionOutcome {
                    action: action.name().to_string(),
                    status,
                }
            })
            .collect();

        run_results.push(PairResult {
            state: pair_state,
            validation,
            actions,
        });
    }

    let success = run_results.iter().all(|r| r.validation.success);
    state = state.transition(if success {
        RunState::Succeeded
    } else {
        RunState::Failed
    })?;
    info!(checkpoint = %checkpoint.name, run = %run_name, %state, "Checkpoint finished");

    Ok(CheckpointResult {
        checkpoint_name: checkpoint.name.clone(),
        run_name,
        state,
        success,
        run_results,
    })
}
