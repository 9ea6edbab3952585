//! Permission-gated activation.
//!
//! All scheduling is gated behind OS notification authorization, which is a
//! multi-step, revocable negotiation: the one-shot OS prompt must never be
//! wasted on an unprepared user, so an explanation screen always precedes
//! it, and the prompt runs at most once per install. Some platforms add a
//! secondary "exact alarm" capability with its own explanation/request leg.
//!
//! ```text
//! Initial -> ShowNotificationExplanation -> RequestingNotificationPermission
//!         -> { ShowExactAlarmExplanation -> RequestingExactAlarmPermission,
//!              Completed }
//!         -> Completed
//! ```
//!
//! `Denied` is absorbing for the session: no automatic re-prompt, and
//! scheduling keeps returning `false` until the user re-enables the
//! permission externally and the app re-checks on the next foreground.

use std::sync::Arc;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{PreferencesError, Result};
use crate::platform::PlatformScheduler;

/// Where the activation flow currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionState {
    Initial,
    /// Explain why notifications are needed before the OS prompt.
    ShowNotificationExplanation,
    RequestingNotificationPermission,
    /// Explain the exact-alarm capability before its prompt.
    ShowExactAlarmExplanation,
    RequestingExactAlarmPermission,
    /// Scheduling may run.
    Completed,
    /// Absorbing for the session.
    Denied,
}

/// Persisted record of whether the one-shot prompt was ever shown (or
/// skipped because permission was already granted). Owned by the
/// preference store so the flow runs at most once per install across
/// restarts.
pub trait PromptHistory: Send + Sync {
    fn prompt_shown(&self) -> bool;
    fn mark_prompt_shown(&self) -> std::result::Result<(), PreferencesError>;
}

/// Drives the activation state machine against the platform layer.
pub struct PermissionFlow {
    platform: Arc<dyn PlatformScheduler>,
    history: Arc<dyn PromptHistory>,
    state: PermissionState,
}

impl PermissionFlow {
    pub fn new(platform: Arc<dyn PlatformScheduler>, history: Arc<dyn PromptHistory>) -> Self {
        Self {
            platform,
            history,
            state: PermissionState::Initial,
        }
    }

    pub fn state(&self) -> PermissionState {
        self.state
    }

    /// Whether scheduling is allowed to run.
    pub fn is_completed(&self) -> bool {
        self.state == PermissionState::Completed
    }

    /// Entry point on app start.
    ///
    /// Already-granted permission skips straight to the exact-alarm check.
    /// A previously shown (and evidently not granted) prompt lands in
    /// `Denied` without prompting again. Otherwise the explanation screen
    /// comes first -- never prompt cold.
    pub async fn start(&mut self) -> Result<PermissionState> {
        if self.state != PermissionState::Initial {
            return Ok(self.state);
        }
        if self.platform.is_authorized().await {
            // The prompt is moot for this install; record the skip.
            self.history.mark_prompt_shown()?;
            return self.check_exact_alarm().await;
        }
        if self.history.prompt_shown() {
            debug!("notification prompt already used for this install; staying denied");
            self.state = PermissionState::Denied;
            return Ok(self.state);
        }
        self.state = PermissionState::ShowNotificationExplanation;
        Ok(self.state)
    }

    /// The user acknowledged the explanation: invoke the one-shot OS
    /// prompt. The prompt-shown flag is persisted before the request so a
    /// crash mid-dialog still counts as used.
    pub async fn request_notification_permission(&mut self) -> Result<PermissionState> {
        if self.state != PermissionState::ShowNotificationExplanation {
            return Ok(self.state);
        }
        self.state = PermissionState::RequestingNotificationPermission;
        self.history.mark_prompt_shown()?;
        if self.platform.request_authorization().await? {
            self.check_exact_alarm().await
        } else {
            self.state = PermissionState::Denied;
            Ok(self.state)
        }
    }

    /// The user acknowledged the exact-alarm explanation: request the
    /// capability. Exact alarms are an upgrade, not a requirement, so a
    /// denial here still completes the flow; reminders just may be coalesced
    /// by the OS.
    pub async fn request_exact_alarm_permission(&mut self) -> Result<PermissionState> {
        if self.state != PermissionState::ShowExactAlarmExplanation {
            return Ok(self.state);
        }
        self.state = PermissionState::RequestingExactAlarmPermission;
        if !self.platform.request_exact_alarm_authorization().await? {
            debug!("exact-alarm capability denied; reminders will be inexact");
        }
        self.state = PermissionState::Completed;
        Ok(self.state)
    }

    /// Re-check on app foreground. A `Denied` flow recovers if the user
    /// re-enabled the permission in system settings.
    pub async fn refresh(&mut self) -> Result<PermissionState> {
        if self.state == PermissionState::Denied && self.platform.is_authorized().await {
            return self.check_exact_alarm().await;
        }
        Ok(self.state)
    }

    async fn check_exact_alarm(&mut self) -> Result<PermissionState> {
        self.state = if self.platform.is_exact_alarm_authorized().await {
            PermissionState::Completed
        } else {
            PermissionState::ShowExactAlarmExplanation
        };
        Ok(self.state)
    }
}
