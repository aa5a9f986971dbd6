//! Alert descriptors handed to the notification layer.
//!
//! The engine decides content and severity. Rendering (toasts, sounds) is
//! someone else's job; [`AlertCue`] only names which sound pattern fits, and
//! informational alerts usually have none.

use serde::{Deserialize, Serialize};

use crate::category::Subsystem;
use crate::id::AlertId;
use crate::time::Timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warn,
    Critical,
}

/// Audio pattern the presentation layer should play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertCue {
    Warn,
    Critical,
    Access,
    Gas,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: AlertId,
    pub severity: Severity,
    pub subsystem: Subsystem,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cue: Option<AlertCue>,
    pub raised_at: Timestamp,
}

impl Alert {
    /// Build an alert with the cue that matches its severity (none for info).
    #[must_use]
    pub fn new(
        severity: Severity,
        subsystem: Subsystem,
        message: impl Into<String>,
        raised_at: Timestamp,
    ) -> Self {
        let cue = match severity {
            Severity::Critical => Some(AlertCue::Critical),
            Severity::Warn => Some(AlertCue::Warn),
            Severity::Info => None,
        };
        Self {
            id: AlertId::new(),
            severity,
            subsystem,
            message: message.into(),
            cue,
            raised_at,
        }
    }

    #[must_use]
    pub fn with_cue(mut self, cue: AlertCue) -> Self {
        self.cue = Some(cue);
        self
    }

    /// Drop the audio cue; the alert is still shown.
    #[must_use]
    pub fn silent(mut self) -> Self {
        self.cue = None;
        self
    }
}
