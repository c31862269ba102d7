//! One-time user-facing notices, queued in the cookie session by the
//! mutation endpoints and drained by the next rendered page.

use actix_session::Session;
use actix_utils::future::{ready, Ready};
use actix_web::{error, FromRequest, HttpRequest};

const FLASH_SESSION_KEY: &str = "flash";

/// Queue a notice for the next rendered page.
pub fn push(session: &Session, message: impl Into<String>) {
    let mut pending: Vec<String> = session.get(FLASH_SESSION_KEY).ok().flatten().unwrap_or_default();
    pending.push(message.into());

    if let Err(e) = session.insert(FLASH_SESSION_KEY, pending) {
        log::warn!("failed to queue flash message: {e}");
    }
}

/// Drain every pending notice. Notices are shown once, so taking them
/// removes them from the session.
pub fn take(session: &Session) -> Vec<String> {
    match session.remove_as::<Vec<String>>(FLASH_SESSION_KEY) {
        Some(Ok(flashes)) => flashes,
        Some(Err(raw)) => {
            log::warn!("discarding malformed flash payload: {raw:?}");
            Vec::new()
        }
        None => Vec::new(),
    }
}

/// Extractor that drains the pending notices for a page handler.
pub struct Flashes(pub Vec<String>);

impl FromRequest for Flashes {
    type Error = actix_web::error::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut actix_web::dev::Payload) -> Self::Future {
        let result = Session::from_request(req, payload)
            .into_inner()
            .map(|session| Flashes(take(&session)))
            .map_err(error::ErrorInternalServerError);

        ready(result)
    }
}
