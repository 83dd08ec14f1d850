//! Functions exported to the page scripts

use crate::app::SessionApp;
use bankscope_core::{SessionError, SessionSettings, SessionState};
use serde::Serialize;
use std::rc::Rc;
use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
}

/// Turn a session error into a JS `Error` carrying the user-facing message
fn to_js(err: &SessionError) -> JsValue {
    let error = js_sys::Error::new(&err.user_message());
    error.set_name("SessionError");
    let _ = js_sys::Reflect::set(&error, &"detail".into(), &err.to_string().into());
    error.into()
}

fn booted() -> Result<Rc<SessionApp>, JsValue> {
    SessionApp::current().ok_or_else(|| JsError::new("session engine not booted").into())
}

/// Start the session engine. `options` may override any setting, e.g.
/// `{ sessionTimeout: 1800, loginPath: "/signin" }`.
#[wasm_bindgen]
pub async fn boot(options: JsValue) -> Result<(), JsValue> {
    let settings = if options.is_undefined() || options.is_null() {
        SessionSettings::default()
    } else {
        serde_wasm_bindgen::from_value(options)?
    };
    SessionApp::boot(settings).await.map(drop).map_err(|e| to_js(&e))
}

#[wasm_bindgen(js_name = signIn)]
pub async fn sign_in(email: String, password: String) -> Result<(), JsValue> {
    booted()?
        .sign_in(&email, &password)
        .await
        .map_err(|e| to_js(&e))
}

/// Returns `false` when there was no session to end
#[wasm_bindgen]
pub fn logout() -> Result<bool, JsValue> {
    Ok(booted()?.logout())
}

/// `ACTIVE`, `WARNING_ISSUED` or `EXPIRED`
#[wasm_bindgen(js_name = sessionState)]
pub fn session_state() -> String {
    SessionApp::current()
        .map_or(SessionState::Expired, |app| app.state())
        .as_str()
        .to_string()
}

/// `POST` a JSON body to a backend path with the session's credentials
#[wasm_bindgen(js_name = authorizedPost)]
pub async fn authorized_post(path: String, body: JsValue) -> Result<JsValue, JsValue> {
    let body: serde_json::Value = serde_wasm_bindgen::from_value(body)?;
    let answer: serde_json::Value = booted()?
        .api()
        .post_json(&path, &body)
        .await
        .map_err(|e| to_js(&e))?;
    Ok(answer.serialize(&serde_wasm_bindgen::Serializer::json_compatible())?)
}
