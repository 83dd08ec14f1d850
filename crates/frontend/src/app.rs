//! Page-wide session wiring
//!
//! One [`SessionApp`] exists per page. It owns the session engine, the DOM
//! listeners feeding it and the indicator rendering it.

use crate::dialogs::{ConfirmDialog, LocationNavigator};
use crate::listeners;
use crate::logging;
use crate::storage::LocalStorageCredentialStore;
use crate::surface::ElementStatusSurface;
use crate::timers::BrowserScheduler;
use bankscope_core::{
    ActivityMonitor, ApiClient, HttpConfigSource, RemoteConfigProvider, Result, Scheduler,
    SessionContext, SessionError, SessionLifecycleManager, SessionSettings, SessionState,
    SessionStatusIndicator, SignInClient, StatusSurface, TokenRefreshClient,
};
use gloo::events::EventListener;
use std::cell::RefCell;
use std::rc::Rc;

thread_local! {
    static APP: RefCell<Option<Rc<SessionApp>>> = const { RefCell::new(None) };
}

pub struct SessionApp {
    manager: Rc<SessionLifecycleManager>,
    indicator: Rc<SessionStatusIndicator>,
    identity: SignInClient,
    api: ApiClient,
    _listeners: Vec<EventListener>,
}

impl SessionApp {
    /// Wire the session engine into the page. A second call returns the
    /// instance created by the first.
    ///
    /// When the remote configuration cannot be loaded the page keeps running
    /// signed out; stored credentials are left untouched for the next load.
    pub async fn boot(settings: SessionSettings) -> Result<Rc<Self>> {
        if let Some(app) = Self::current() {
            return Ok(app);
        }
        settings.validate()?;
        logging::init(&settings.log_level);

        let store = Rc::new(LocalStorageCredentialStore::open()?);
        let config = Rc::new(RemoteConfigProvider::new(HttpConfigSource::new(
            config_url(&settings.config_path)?,
        )));
        let navigator = Rc::new(LocationNavigator::new(settings.login_path.clone()));
        let ctx = SessionContext::new(settings, store, config);

        let scheduler: Rc<dyn Scheduler> = Rc::new(BrowserScheduler::new());
        let manager = SessionLifecycleManager::new(
            ctx.clone(),
            scheduler.clone(),
            Rc::new(ConfirmDialog),
            navigator,
            TokenRefreshClient::new(ctx.clone()),
        );

        match ctx.config().load().await {
            Ok(_) => {
                manager.resume();
            }
            Err(e) => {
                tracing::warn!(error = %e, "remote configuration unavailable; staying signed out");
            }
        }

        let monitor = Rc::new(ActivityMonitor::new(ctx.clone(), manager.clone()));
        let mut page_listeners = listeners::activity(&monitor);
        page_listeners.push(listeners::cross_tab(&manager));

        let surface = ElementStatusSurface::find().map(|s| Rc::new(s) as Rc<dyn StatusSurface>);
        if surface.is_none() {
            tracing::debug!("no session indicator element on this page");
        }
        let indicator = SessionStatusIndicator::new(ctx.clone(), scheduler, surface);
        indicator.start();

        let app = Rc::new(Self {
            identity: SignInClient::new(ctx),
            api: ApiClient::new(manager.clone()),
            manager,
            indicator,
            _listeners: page_listeners,
        });
        APP.with(|slot| *slot.borrow_mut() = Some(app.clone()));
        tracing::info!(state = %app.state(), "session engine ready");
        Ok(app)
    }

    /// The booted instance, if any
    pub fn current() -> Option<Rc<Self>> {
        APP.with(|slot| slot.borrow().clone())
    }

    /// Sign in with email and password and start a fresh session
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<()> {
        let credentials = self.identity.sign_in(email, password).await?;
        self.manager.begin(&credentials)?;
        self.indicator.tick();
        Ok(())
    }

    /// End the session and leave for the sign-in page
    pub fn logout(&self) -> bool {
        let ended = self.manager.logout();
        self.indicator.tick();
        ended
    }

    pub fn state(&self) -> SessionState {
        self.manager.state()
    }

    pub const fn api(&self) -> &ApiClient {
        &self.api
    }
}

/// Absolute URL of the config document; the page origin is prepended to
/// relative paths
fn config_url(path: &str) -> Result<String> {
    if path.starts_with("https://") || path.starts_with("http://") {
        return Ok(path.to_string());
    }
    let origin = gloo::utils::window()
        .location()
        .origin()
        .map_err(|e| SessionError::config_unavailable(format!("page origin unknown: {e:?}")))?;
    Ok(format!("{origin}/{}", path.trim_start_matches('/')))
}
