use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};

use crate::recognition::domain::face_matcher::{FaceMatch, FaceMatcher};
use crate::recognition::domain::identity_gallery::IdentityGallery;
use crate::shared::clock::{elapsed_between, Clock};
use crate::shared::frame::Frame;

/// Throttle bookkeeping for the authorization check.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AuthorizationState {
    pub last_check_time: Option<DateTime<Local>>,
    pub last_result: bool,
}

/// Outcome of one authorization check.
#[derive(Clone, Debug, PartialEq)]
pub enum Authorization {
    /// Called within the check interval; no matching was attempted.
    Throttled,
    NoGallery,
    NoMatch,
    Matched(FaceMatch),
}

impl Authorization {
    pub fn is_authorized(&self) -> bool {
        matches!(self, Authorization::Matched(_))
    }
}

/// Rate-limited "is an authorized person in view" check.
///
/// Inside the interval the answer is always "not authorized"; the previous
/// result is recorded but never reused.
pub struct AuthorizationGate {
    interval: Duration,
    clock: Arc<dyn Clock>,
    state: AuthorizationState,
}

impl AuthorizationGate {
    pub fn new(interval: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            interval,
            clock,
            state: AuthorizationState::default(),
        }
    }

    pub fn state(&self) -> &AuthorizationState {
        &self.state
    }

    pub fn check(
        &mut self,
        frame: &Frame,
        gallery: &IdentityGallery,
        matcher: &mut FaceMatcher,
    ) -> Result<Authorization, Box<dyn std::error::Error>> {
        let now = self.clock.now();
        if let Some(last) = self.state.last_check_time {
            if elapsed_between(last, now) < self.interval {
                return Ok(Authorization::Throttled);
            }
        }
        self.state.last_check_time = Some(now);

        if gallery.is_empty() {
            self.state.last_result = false;
            return Ok(Authorization::NoGallery);
        }

        let outcome = match matcher.match_frame(frame, gallery) {
            Ok(Some(found)) => {
                log::info!(
                    "Authorized user detected: {} (distance {:.3})",
                    found.name,
                    found.distance
                );
                Authorization::Matched(found)
            }
            Ok(None) => Authorization::NoMatch,
            Err(e) => {
                self.state.last_result = false;
                return Err(e);
            }
        };
        self.state.last_result = outcome.is_authorized();
        Ok(outcome)
    }

    pub fn is_authorized(
        &mut self,
        frame: &Frame,
        gallery: &IdentityGallery,
        matcher: &mut FaceMatcher,
    ) -> Result<bool, Box<dyn std::error::Error>> {
        Ok(self.check(frame, gallery, matcher)?.is_authorized())
    }
}
