//! Capabilities the session borrows from the page: asking the user and
//! leaving for the sign-in page

use std::time::Duration;

/// Answer to the "stay signed in?" prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Decline,
    /// The prompt could not be shown or was dismissed without an answer
    TimedOut,
}

/// Asks the user whether to extend the session.
///
/// The call blocks the page until answered: no timer or activity event is
/// processed while the prompt is open.
#[cfg_attr(test, mockall::automock)]
pub trait DecisionProvider {
    fn confirm_stay_signed_in(&self, remaining: Duration) -> Decision;
}

/// Moves the page to the unauthenticated entry point
#[cfg_attr(test, mockall::automock)]
pub trait Navigator {
    fn redirect_to_login(&self);
}
