use axum::{
    extract::Request,
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;

use crate::handlers::ApiError;

const TOKEN_COOKIE: &str = "admin_token";

/// Admin bearer token, forwarded as-is to the survey backend.
#[derive(Debug, Clone)]
pub struct AdminToken(pub String);

/// Requires an admin token from `Authorization: Bearer` or the
/// `admin_token` cookie. The backend decides whether it is valid.
pub async fn admin_token_middleware(
    headers: HeaderMap,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_token(&headers, &jar).ok_or_else(|| {
        tracing::warn!("Admin request without token: {}", request.uri().path());
        ApiError::Unauthorized("Missing authorization token".to_string())
    })?;

    request.extensions_mut().insert(AdminToken(token));
    Ok(next.run(request).await)
}

fn extract_token(headers: &HeaderMap, jar: &CookieJar) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    // Read admin_token from the cookie set by the admin UI
    jar.get(TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn token_from(headers: &HeaderMap) -> Option<String> {
        extract_token(headers, &CookieJar::from_headers(headers))
    }

    #[test]
    fn bearer_header_is_preferred() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        headers.insert(header::COOKIE, HeaderValue::from_static("admin_token=cookie"));
        assert_eq!(token_from(&headers).as_deref(), Some("abc"));
    }

    #[test]
    fn cookie_is_used_without_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; admin_token=xyz"),
        );
        assert_eq!(token_from(&headers).as_deref(), Some("xyz"));
    }

    #[test]
    fn empty_cookie_value_is_missing() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("admin_token="));
        assert_eq!(token_from(&headers), None);
    }

    #[test]
    fn blank_or_non_bearer_tokens_are_missing() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer   "));
        assert_eq!(token_from(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(token_from(&headers), None);
    }
}
