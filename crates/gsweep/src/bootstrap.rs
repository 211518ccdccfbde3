//! Startup sequence with a deadline
//!
//! A [`Bootstrap`] runs named async steps in order under one overall timeout
//! and publishes its progress on a `watch` channel, so anything waiting on
//! startup can tell "still pending" from "settled".

use std::time::Duration;

use futures_util::future::BoxFuture;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{error, info};

/// Overall startup deadline
pub const BOOTSTRAP_DEADLINE: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum BootstrapStatus {
    Pending { step: Option<String> },
    Ready,
    Failed { step: String, message: String },
    TimedOut,
}

impl BootstrapStatus {
    pub fn is_settled(&self) -> bool {
        !matches!(self, BootstrapStatus::Pending { .. })
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BootstrapError {
    #[error("Startup step '{step}' failed: {message}")]
    StepFailed { step: String, message: String },
    #[error("Startup timed out after {0:?}")]
    TimedOut(Duration),
}

type Step = Box<dyn FnOnce() -> BoxFuture<'static, Result<(), String>> + Send>;

pub struct Bootstrap {
    deadline: Duration,
    steps: Vec<(String, Step)>,
    status: watch::Sender<BootstrapStatus>,
}

impl Default for Bootstrap {
    fn default() -> Self {
        Self::new()
    }
}

impl Bootstrap {
    pub fn new() -> Self {
        Self::with_deadline(BOOTSTRAP_DEADLINE)
    }

    pub fn with_deadline(deadline: Duration) -> Self {
        let (status, _) = watch::channel(BootstrapStatus::Pending { step: None });
        Self {
            deadline,
            steps: Vec::new(),
            status,
        }
    }

    pub fn step<F>(mut self, name: impl Into<String>, run: F) -> Self
    where
        F: FnOnce() -> BoxFuture<'static, Result<(), String>> + Send + 'static,
    {
        self.steps.push((name.into(), Box::new(run)));
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<BootstrapStatus> {
        self.status.subscribe()
    }

    pub fn status(&self) -> BootstrapStatus {
        self.status.borrow().clone()
    }

    /// Run every step in order. The whole sequence shares one deadline.
    pub async fn run(self) -> Result<(), BootstrapError> {
        let Bootstrap {
            deadline,
            steps,
            status,
        } = self;

        let sequence = async {
            for (name, run) in steps {
                info!(step = %name, "Bootstrap step");
                status.send_replace(BootstrapStatus::Pending {
                    step: Some(name.clone()),
                });
                if let Err(message) = run().await {
                    return Err(BootstrapError::StepFailed { step: name, message });
                }
            }
            Ok(())
        };

        let outcome = match tokio::time::timeout(deadline, sequence).await {
            Ok(result) => result,
            Err(_) => Err(BootstrapError::TimedOut(deadline)),
        };

        let settled = match &outcome {
            Ok(()) => BootstrapStatus::Ready,
            Err(BootstrapError::StepFailed { step, message }) => {
                error!(step = %step, "Bootstrap step failed");
                BootstrapStatus::Failed {
                    step: step.clone(),
                    message: message.clone(),
                }
            }
            Err(BootstrapError::TimedOut(_)) => {
                error!(deadline_ms = deadline.as_millis() as u64, "Bootstrap timed out");
                BootstrapStatus::TimedOut
            }
        };
        status.send_replace(settled);
        outcome
    }
}
