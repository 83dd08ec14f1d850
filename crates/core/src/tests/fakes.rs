use crate::indicator::{StatusDisplay, StatusSurface};
use crate::interaction::{Decision, DecisionProvider, Navigator};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::time::Duration;

/// Answers the stay-signed-in prompt from a script, declining once it runs out
#[derive(Default)]
pub struct ScriptedDecisions {
    answers: RefCell<VecDeque<Decision>>,
    asked: RefCell<Vec<Duration>>,
}

impl ScriptedDecisions {
    pub fn new(answers: impl IntoIterator<Item = Decision>) -> Self {
        Self {
            answers: RefCell::new(answers.into_iter().collect()),
            asked: RefCell::new(Vec::new()),
        }
    }

    /// Remaining time shown at each prompt, in order
    #[must_use]
    pub fn asked(&self) -> Vec<Duration> {
        self.asked.borrow().clone()
    }
}

impl DecisionProvider for ScriptedDecisions {
    fn confirm_stay_signed_in(&self, remaining: Duration) -> Decision {
        self.asked.borrow_mut().push(remaining);
        self.answers
            .borrow_mut()
            .pop_front()
            .unwrap_or(Decision::Decline)
    }
}

/// Counts redirects to the sign-in page
#[derive(Default)]
pub struct RecordingNavigator {
    redirects: Cell<usize>,
}

impl RecordingNavigator {
    #[must_use]
    pub fn redirects(&self) -> usize {
        self.redirects.get()
    }
}

impl Navigator for RecordingNavigator {
    fn redirect_to_login(&self) {
        self.redirects.set(self.redirects.get() + 1);
    }
}

/// Keeps every frame the status indicator renders
#[derive(Default)]
pub struct RecordingSurface {
    frames: RefCell<Vec<Option<StatusDisplay>>>,
}

impl RecordingSurface {
    #[must_use]
    pub fn frames(&self) -> Vec<Option<StatusDisplay>> {
        self.frames.borrow().clone()
    }

    #[must_use]
    pub fn last(&self) -> Option<StatusDisplay> {
        self.frames.borrow().last().cloned().flatten()
    }
}

impl StatusSurface for RecordingSurface {
    fn render(&self, display: Option<&StatusDisplay>) {
        self.frames.borrow_mut().push(display.cloned());
    }
}
