//! Retry-once-after-refresh decision logic for API calls.
//!
//! One [`RefreshFlow`] tracks one original request:
//!
//! ```text
//! Sent ──401, not retried, not the refresh call──▶ RefreshAttempt
//! RefreshAttempt ──refresh ok──▶ Retry(original)
//! RefreshAttempt ──refresh failed──▶ Redirect(login)
//! any other response ──▶ Done (passed through unchanged)
//! ```
//!
//! There is no backoff and no coordination between flows: concurrent
//! requests that all get a 401 each attempt their own refresh.

use serde::Serialize;

pub const UNAUTHORIZED: u16 = 401;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowState {
    Sent,
    RefreshAttempt,
    Retry,
    Redirect,
    Done,
}

/// What the transport must do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Hand the response to the caller as-is.
    Deliver,
    /// Call the refresh endpoint, then report via [`RefreshFlow::on_refresh`].
    Refresh,
    /// Send the original request again with the new token.
    Resend,
    /// Session is gone; clear it and send the user to login.
    RedirectToLogin,
}

#[derive(Debug, Clone)]
pub struct RefreshFlow {
    state: FlowState,
    retried: bool,
    exempt: bool,
}

impl Default for RefreshFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl RefreshFlow {
    pub fn new() -> Self {
        Self {
            state: FlowState::Sent,
            retried: false,
            exempt: false,
        }
    }

    /// A flow for the refresh request itself, which never triggers a refresh.
    pub fn for_refresh_call() -> Self {
        Self {
            exempt: true,
            ..Self::new()
        }
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    pub fn retried(&self) -> bool {
        self.retried
    }

    /// Feed the HTTP status of the latest send.
    pub fn on_response(&mut self, status: u16) -> Step {
        let may_refresh = !self.retried && !self.exempt;
        if status == UNAUTHORIZED && may_refresh && self.state == FlowState::Sent {
            self.state = FlowState::RefreshAttempt;
            Step::Refresh
        } else {
            self.state = FlowState::Done;
            Step::Deliver
        }
    }

    /// Feed the outcome of the refresh call.
    ///
    /// Outside `RefreshAttempt` this is a no-op returning [`Step::Deliver`].
    pub fn on_refresh(&mut self, succeeded: bool) -> Step {
        if self.state != FlowState::RefreshAttempt {
            return Step::Deliver;
        }
        if succeeded {
            self.state = FlowState::Retry;
            self.retried = true;
            Step::Resend
        } else {
            self.state = FlowState::Redirect;
            Step::RedirectToLogin
        }
    }

    /// Called when the retried request has been sent again.
    pub fn on_resent(&mut self, status: u16) -> Step {
        if self.state == FlowState::Retry {
            self.state = FlowState::Sent;
        }
        self.on_response(status)
    }
}
