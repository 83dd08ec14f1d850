//! `setTimeout`-backed scheduler

use bankscope_core::{Scheduler, TimerHandle, TimerTask};
use gloo::timers::callback::Timeout;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;
use wasm_bindgen_futures::spawn_local;

#[derive(Default)]
struct Timers {
    live: HashMap<TimerHandle, Timeout>,
    // fired timeouts can't be dropped from inside their own callback
    fired: Vec<TimerHandle>,
}

impl Timers {
    fn purge(&mut self) {
        for handle in self.fired.drain(..) {
            self.live.remove(&handle);
        }
    }
}

/// Runs each task on the page's event loop once its delay has passed
#[derive(Default)]
pub struct BrowserScheduler {
    next_id: Cell<u64>,
    timers: Rc<RefCell<Timers>>,
}

impl BrowserScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Scheduler for BrowserScheduler {
    fn schedule(&self, delay: Duration, task: TimerTask) -> TimerHandle {
        let handle = TimerHandle::new(self.next_id.get());
        self.next_id.set(handle.id() + 1);

        let millis = u32::try_from(delay.as_millis()).unwrap_or(u32::MAX);
        let timers = Rc::downgrade(&self.timers);
        let timeout = Timeout::new(millis, move || {
            if let Some(timers) = timers.upgrade() {
                timers.borrow_mut().fired.push(handle);
            }
            spawn_local(task);
        });

        let mut timers = self.timers.borrow_mut();
        timers.purge();
        timers.live.insert(handle, timeout);
        handle
    }

    fn cancel(&self, handle: TimerHandle) {
        let mut timers = self.timers.borrow_mut();
        timers.purge();
        // dropping a gloo Timeout clears it
        if timers.live.remove(&handle).is_none() {
            tracing::trace!(%handle, "cancel of a timer that already ran");
        }
    }
}
