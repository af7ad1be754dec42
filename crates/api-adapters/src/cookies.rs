//! Cookie names and builders.
//!
//! - session: the signed session token
//! - anonymous: a random id that anchors forgery tokens before login
//! - flash: a one-shot [`ActionOutcome`] consumed by the next page render

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use tracing::debug;

use domains::ActionOutcome;

pub const SESSION_COOKIE: &str = "inkwell_session";
pub const ANON_COOKIE: &str = "inkwell_anon";
pub const FLASH_COOKIE: &str = "inkwell_flash";

fn build(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

pub fn session(token: String, secure: bool) -> Cookie<'static> {
    build(SESSION_COOKIE, token, secure)
}

pub fn anonymous(id: String, secure: bool) -> Cookie<'static> {
    build(ANON_COOKIE, id, secure)
}

/// A cookie that, passed to [`CookieJar::remove`], expires `name`.
pub fn removal(name: &'static str) -> Cookie<'static> {
    Cookie::build(name).path("/").build()
}

pub fn encode_flash(outcome: &ActionOutcome) -> Option<String> {
    serde_json::to_vec(outcome)
        .ok()
        .map(|json| URL_SAFE_NO_PAD.encode(json))
}

pub fn decode_flash(value: &str) -> Option<ActionOutcome> {
    let bytes = URL_SAFE_NO_PAD.decode(value).ok()?;
    serde_json::from_slice(&bytes).ok()
}

pub fn set_flash(jar: CookieJar, outcome: &ActionOutcome, secure: bool) -> CookieJar {
    match encode_flash(outcome) {
        Some(value) => jar.add(build(FLASH_COOKIE, value, secure)),
        None => jar,
    }
}

/// Reads the pending flash message, if any, and schedules its removal.
pub fn take_flash(jar: CookieJar) -> (CookieJar, Option<ActionOutcome>) {
    let Some(value) = jar.get(FLASH_COOKIE).map(|c| c.value().to_string()) else {
        return (jar, None);
    };
    let outcome = decode_flash(&value);
    if outcome.is_none() {
        debug!("discarding unreadable flash cookie");
    }
    (jar.remove(removal(FLASH_COOKIE)), outcome)
}
