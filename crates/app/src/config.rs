//! Engine tuning knobs.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::roles::RoleBindings;

/// How a rule behaves while its condition keeps holding across evaluations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetriggerPolicy {
    /// Fire on every evaluation where the condition holds.
    #[default]
    EveryPoll,
    /// Fire once when the condition becomes true; re-arm when it clears.
    OnTransition,
}

impl RetriggerPolicy {
    /// Whether a rule fires this evaluation. `latch` remembers whether the
    /// condition held last time and is updated in place.
    pub fn should_fire(self, latch: &mut bool, holds: bool) -> bool {
        let fire = match self {
            Self::EveryPoll => holds,
            Self::OnTransition => holds && !*latch,
        };
        *latch = holds;
        fire
    }
}

/// Cadences and rule behaviour for one [`Engine`](crate::engine::Engine).
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Safety evaluation cadence.
    pub safety_poll: Duration,
    /// Read-only overview cadence.
    pub overview_poll: Duration,
    /// Period of one timer second (countdown and box timer).
    pub timer_tick: Duration,
    pub retrigger: RetriggerPolicy,
    /// Window offered to the operator to confirm travel-mode overconsumption.
    pub travel_confirm_minutes: u32,
    pub roles: RoleBindings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            safety_poll: Duration::from_secs(3),
            overview_poll: Duration::from_secs(6),
            timer_tick: Duration::from_secs(1),
            retrigger: RetriggerPolicy::default(),
            travel_confirm_minutes: 15,
            roles: RoleBindings::default(),
        }
    }
}
