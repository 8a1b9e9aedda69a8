use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use super::AppState;

/// Session token resolved for the current request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionToken(pub String);

impl SessionToken {
    pub fn as_str(&self) -> &str { &self.0 }
}

pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim())
}

/// Attaches a [`SessionToken`] to every request, issuing a fresh one when
/// the cookie is missing or isn't a token we hand out.
pub async fn resolve(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let existing = cookie_value(req.headers(), &state.session_cookie)
        .filter(|token| Uuid::parse_str(token).is_ok())
        .map(str::to_string);

    let (token, issued) = match existing {
        Some(token) => (token, false),
        None => (Uuid::new_v4().to_string(), true),
    };
    req.extensions_mut().insert(SessionToken(token.clone()));

    let mut response = next.run(req).await;
    if issued {
        let cookie = format!("{}={token}; Path=/; HttpOnly; SameSite=Lax", state.session_cookie);
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(e) => tracing::error!(error = %e, "failed to encode session cookie"),
        }
    }
    response
}
