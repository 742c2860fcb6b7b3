//! Test assertion helpers - fluent API for verifying responses
#![allow(dead_code)] // Test utilities may not all be used in every test

use axum::http::{header::LOCATION, StatusCode};
use serde_json::Value;

use super::setup::TestResponse;

// ============================================================================
// Assertion Helpers
// ============================================================================

pub struct ResponseAssertion<'a> {
    response: &'a TestResponse,
}

impl<'a> ResponseAssertion<'a> {
    pub fn of(response: &'a TestResponse) -> Self {
        Self { response }
    }

    fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.response.body).to_string()
    }

    pub fn has_status(self, expected: StatusCode) -> Self {
        assert_eq!(
            self.response.status,
            expected,
            "unexpected status, body: {}",
            self.body_text()
        );
        self
    }

    /// The `{"error": ...}` body every failure carries
    pub fn has_error(self, expected: &str) -> Self {
        let body: Value = self.response.json();
        assert_eq!(body["error"], expected, "unexpected error body");
        self
    }

    pub fn sets_cookie_with_max_age(self, name: &str, max_age_secs: i64) -> Self {
        let cookie = self
            .response
            .set_cookie(name)
            .unwrap_or_else(|| panic!("response should set cookie {}", name));

        assert!(!cookie.value().is_empty(), "{} should not be empty", name);
        assert_eq!(cookie.http_only(), Some(true), "{} should be HttpOnly", name);
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(
            cookie.max_age().map(|age| age.whole_seconds()),
            Some(max_age_secs),
            "wrong max-age on {}",
            name
        );
        self
    }

    pub fn clears_cookie(self, name: &str) -> Self {
        let cookie = self
            .response
            .set_cookie(name)
            .unwrap_or_else(|| panic!("response should clear cookie {}", name));

        assert!(cookie.value().is_empty(), "{} should be emptied", name);
        assert_eq!(cookie.max_age().map(|age| age.whole_seconds()), Some(0));
        self
    }

    pub fn sets_no_cookies(self) -> Self {
        assert!(
            self.response.set_cookies().is_empty(),
            "response should not touch cookies"
        );
        self
    }

    pub fn redirects_to(self, location: &str) -> Self {
        let header = self
            .response
            .headers
            .get(LOCATION)
            .and_then(|value| value.to_str().ok());
        assert_eq!(header, Some(location));
        self
    }
}
