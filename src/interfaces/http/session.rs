use actix_web::cookie::{Cookie, SameSite};
use actix_web::HttpRequest;

use crate::infrastructure::session_store::SessionStore;

pub const SESSION_COOKIE: &str = "csv_session";

/// Session id from the request cookie, if it is one we could have issued
pub fn session_id(req: &HttpRequest) -> Option<String> {
    req.cookie(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|id| SessionStore::is_valid_id(id))
}

/// Existing session id, or a fresh one for a first upload
pub fn session_id_or_new(req: &HttpRequest) -> String {
    session_id(req).unwrap_or_else(SessionStore::new_session_id)
}

pub fn session_cookie(id: &str) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, id.to_string())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .finish()
}
