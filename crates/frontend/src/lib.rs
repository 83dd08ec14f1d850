//! Browser bindings for the Bankscope session engine
//!
//! Implements the engine's page capabilities on `localStorage`, `setTimeout`,
//! `window.confirm`, DOM events and `location`, and exports the entry points
//! the page scripts call.

pub mod app;
pub mod dialogs;
pub mod entry;
pub mod listeners;
pub mod logging;
pub mod storage;
pub mod surface;
pub mod timers;

pub use app::SessionApp;
pub use dialogs::{ConfirmDialog, LocationNavigator};
pub use storage::LocalStorageCredentialStore;
pub use surface::ElementStatusSurface;
pub use timers::BrowserScheduler;
