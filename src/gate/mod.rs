//! Asset readiness gate
//!
//! Large assets handed to the remote analysis service are not usable until
//! the remote side reports them active, which can take a while. The gate is
//! a retry-of-a-retry: an inner poll loop bounds responsiveness within one
//! attempt, and an outer attempt loop bounds the total elapsed-time budget.
//! Transitions live in a pure `step` function so both budgets are testable
//! without a clock.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{FrameGrabError, FrameGrabResult};
use crate::ports::{RemoteStore, UploadHandle, UploadState};

/// Budgets and pacing for the readiness gate
#[derive(Debug, Clone)]
pub struct GateConfig {
    /// Delay between status polls within one attempt
    pub poll_interval: Duration,
    /// Polls allowed per attempt
    pub max_polls: u32,
    /// Submit-and-poll attempts before terminal failure
    pub max_attempts: u32,
    /// Delay before starting a fresh attempt
    pub attempt_backoff: Duration,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            max_polls: 10,
            max_attempts: 3,
            attempt_backoff: Duration::from_secs(2),
        }
    }
}

/// Gate states; `Active` and `Failed` are terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    /// Submitting the asset, on the given attempt (1-based)
    Submitting { attempt: u32 },
    /// Submitted, polling for readiness
    Pending { attempt: u32, polls: u32 },
    /// Remote side reports the asset usable
    Active,
    /// All attempts exhausted
    Failed,
}

/// Observed events driving the gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateEvent {
    SubmitOk,
    SubmitFailed,
    PollActive,
    PollPending,
    PollFailed,
}

/// Pure transition function for the gate state machine.
///
/// A failed or still-pending poll consumes one unit of the poll budget;
/// exhausting it rolls over into a fresh attempt until the attempt budget
/// runs out too. Terminal states absorb every event.
pub fn step(state: GateState, event: GateEvent, config: &GateConfig) -> GateState {
    match (state, event) {
        (GateState::Submitting { attempt }, GateEvent::SubmitOk) => {
            GateState::Pending { attempt, polls: 0 }
        }
        (GateState::Submitting { attempt }, GateEvent::SubmitFailed) => {
            if attempt < config.max_attempts {
                GateState::Submitting { attempt: attempt + 1 }
            } else {
                GateState::Failed
            }
        }
        (GateState::Pending { .. }, GateEvent::PollActive) => GateState::Active,
        (GateState::Pending { attempt, polls }, GateEvent::PollPending)
        | (GateState::Pending { attempt, polls }, GateEvent::PollFailed) => {
            if polls + 1 < config.max_polls {
                GateState::Pending {
                    attempt,
                    polls: polls + 1,
                }
            } else if attempt < config.max_attempts {
                GateState::Submitting { attempt: attempt + 1 }
            } else {
                GateState::Failed
            }
        }
        // Submit events cannot arrive while pending; ignore rather than panic
        (state @ GateState::Pending { .. }, _) => state,
        (state @ GateState::Submitting { .. }, _) => state,
        (terminal, _) => terminal,
    }
}

/// Uploads an asset and blocks until the remote side reports it ready
pub struct AssetReadinessGate {
    store: Arc<dyn RemoteStore>,
    config: GateConfig,
}

impl AssetReadinessGate {
    /// Create a gate over the given store with default budgets
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self::with_config(store, GateConfig::default())
    }

    /// Create a gate with explicit budgets
    pub fn with_config(store: Arc<dyn RemoteStore>, config: GateConfig) -> Self {
        Self { store, config }
    }

    /// Submit `asset` and poll until it is active.
    ///
    /// Returns the handle on success, or a definitive error once both the
    /// poll and attempt budgets are exhausted. Never returns a partial or
    /// degraded handle.
    pub async fn await_ready(&self, asset: &Path) -> FrameGrabResult<UploadHandle> {
        let mut state = GateState::Submitting { attempt: 1 };
        let mut handle: Option<UploadHandle> = None;

        loop {
            state = match state {
                GateState::Submitting { attempt } => {
                    if attempt > 1 {
                        tokio::time::sleep(self.config.attempt_backoff).await;
                    }
                    debug!("Upload attempt {}/{}", attempt, self.config.max_attempts);
                    match self.store.submit(asset).await {
                        Ok(h) => {
                            handle = Some(h);
                            step(state, GateEvent::SubmitOk, &self.config)
                        }
                        Err(e) => {
                            warn!("Upload attempt {} failed: {}", attempt, e);
                            handle = None;
                            step(state, GateEvent::SubmitFailed, &self.config)
                        }
                    }
                }
                GateState::Pending { .. } => {
                    tokio::time::sleep(self.config.poll_interval).await;
                    let event = match &handle {
                        Some(h) => match self.store.poll(h).await {
                            Ok(UploadState::Active) => GateEvent::PollActive,
                            Ok(_) => GateEvent::PollPending,
                            Err(e) => {
                                warn!("Status poll failed: {}", e);
                                GateEvent::PollFailed
                            }
                        },
                        None => GateEvent::PollFailed,
                    };
                    step(state, event, &self.config)
                }
                GateState::Active => {
                    return handle.ok_or_else(|| FrameGrabError::UploadError {
                        message: "gate reached active state without a handle".to_string(),
                    });
                }
                GateState::Failed => {
                    return Err(FrameGrabError::UploadError {
                        message: format!(
                            "asset never became active after {} attempts",
                            self.config.max_attempts
                        ),
                    });
                }
            };
        }
    }
}
