use axum::http::{
    header::{COOKIE, SET_COOKIE},
    HeaderMap, HeaderValue,
};
use cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use tracing::warn;

use super::types::TokenPair;
use crate::config::AuthConfig;

/// Finds a cookie by name across all `Cookie` headers of a request
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == name && !cookie.value().is_empty())
        .map(|cookie| cookie.value().to_string())
}

fn build_cookie(name: &str, value: &str, max_age_seconds: i64, secure: bool) -> String {
    Cookie::build((name.to_string(), value.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(CookieDuration::seconds(max_age_seconds))
        .build()
        .to_string()
}

fn append(headers: &mut HeaderMap, cookie: String) {
    match HeaderValue::from_str(&cookie) {
        Ok(value) => {
            headers.append(SET_COOKIE, value);
        }
        Err(e) => warn!(error = %e, "Skipping cookie that is not a valid header value"),
    }
}

/// Appends `Set-Cookie` headers for both tokens of a pair
pub fn set_token_cookies(headers: &mut HeaderMap, config: &AuthConfig, pair: &TokenPair) {
    append(
        headers,
        build_cookie(
            &config.access_cookie_name,
            &pair.access_token,
            pair.access_expires_in,
            config.secure_cookies,
        ),
    );
    append(
        headers,
        build_cookie(
            &config.refresh_cookie_name,
            &pair.refresh_token,
            pair.refresh_expires_in,
            config.secure_cookies,
        ),
    );
}

/// Appends `Set-Cookie` headers that make the client drop both token cookies
pub fn clear_token_cookies(headers: &mut HeaderMap, config: &AuthConfig) {
    append(
        headers,
        build_cookie(&config.access_cookie_name, "", 0, config.secure_cookies),
    );
    append(
        headers,
        build_cookie(&config.refresh_cookie_name, "", 0, config.secure_cookies),
    );
}
