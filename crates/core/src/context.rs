//! Shared session context
//!
//! One `SessionContext` per page owns everything the session components read
//! and write: settings, clock, credential store, remote configuration and the
//! session record. Components receive it by `Rc` at construction time.

use crate::clock::{Clock, SystemClock};
use crate::config::RemoteConfigProvider;
use crate::session::Session;
use crate::settings::SessionSettings;
use crate::store::CredentialStore;
use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

pub struct SessionContext {
    settings: SessionSettings,
    clock: Rc<dyn Clock>,
    store: Rc<dyn CredentialStore>,
    config: Rc<RemoteConfigProvider>,
    session: RefCell<Session>,
}

impl SessionContext {
    /// Create a context using the wall clock
    pub fn new(
        settings: SessionSettings,
        store: Rc<dyn CredentialStore>,
        config: Rc<RemoteConfigProvider>,
    ) -> Rc<Self> {
        Self::with_clock(settings, store, config, Rc::new(SystemClock))
    }

    /// Create a context with an explicit time source
    pub fn with_clock(
        settings: SessionSettings,
        store: Rc<dyn CredentialStore>,
        config: Rc<RemoteConfigProvider>,
        clock: Rc<dyn Clock>,
    ) -> Rc<Self> {
        Rc::new(Self {
            settings,
            clock,
            store,
            config,
            session: RefCell::new(Session::default()),
        })
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn store(&self) -> &dyn CredentialStore {
        self.store.as_ref()
    }

    pub fn config(&self) -> &RemoteConfigProvider {
        &self.config
    }

    /// Read the session record. Never hold the guard across an `.await`.
    pub fn session(&self) -> Ref<'_, Session> {
        self.session.borrow()
    }

    pub(crate) fn session_mut(&self) -> RefMut<'_, Session> {
        self.session.borrow_mut()
    }
}
