//! Native browser prompt and page navigation

use bankscope_core::{Decision, DecisionProvider, Navigator};
use std::time::Duration;

/// Asks with `window.confirm`, which blocks the page until answered
pub struct ConfirmDialog;

impl DecisionProvider for ConfirmDialog {
    fn confirm_stay_signed_in(&self, remaining: Duration) -> Decision {
        let minutes = remaining.as_secs().div_ceil(60);
        let message = format!(
            "Your session will expire in {minutes} minutes due to inactivity.\n\nStay signed in?"
        );
        match gloo::utils::window().confirm_with_message(&message) {
            Ok(true) => Decision::Accept,
            Ok(false) => Decision::Decline,
            // dialogs suppressed by the browser never get an answer
            Err(err) => {
                tracing::warn!(error = ?err, "session prompt could not be shown");
                Decision::TimedOut
            }
        }
    }
}

/// Leaves the page for the sign-in page
pub struct LocationNavigator {
    login_path: String,
}

impl LocationNavigator {
    pub fn new(login_path: impl Into<String>) -> Self {
        Self {
            login_path: login_path.into(),
        }
    }
}

impl Navigator for LocationNavigator {
    fn redirect_to_login(&self) {
        if let Err(err) = gloo::utils::window().location().set_href(&self.login_path) {
            tracing::error!(error = ?err, path = %self.login_path, "redirect to sign-in failed");
        }
    }
}
