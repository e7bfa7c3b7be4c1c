use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};

use crate::detection::domain::detection::Detection;
use crate::shared::clock::{elapsed_between, Clock};

/// Process-wide alert bookkeeping. `None` until the first alert fires.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AlertState {
    pub last_alert_time: Option<DateTime<Local>>,
}

/// Decides whether a detection raises an alert.
///
/// An authorized human never alerts. Everything else is subject to one
/// cooldown shared by all detection types: an alert fires only when strictly
/// more than `cooldown` has passed since the previous one, and firing restarts
/// the cooldown immediately.
pub struct AlertPolicy {
    cooldown: Duration,
    clock: Arc<dyn Clock>,
    state: AlertState,
}

impl AlertPolicy {
    pub fn new(cooldown: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            cooldown,
            clock,
            state: AlertState::default(),
        }
    }

    pub fn state(&self) -> &AlertState {
        &self.state
    }

    pub fn should_alert(&mut self, detection: &Detection, authorized_present: bool) -> bool {
        if detection.is_human() && authorized_present {
            log::debug!(
                "Suppressed {} alert: authorized person present",
                detection.class_name
            );
            return false;
        }

        let now = self.clock.now();
        if let Some(last) = self.state.last_alert_time {
            if elapsed_between(last, now) <= self.cooldown {
                return false;
            }
        }
        self.state.last_alert_time = Some(now);
        true
    }
}
