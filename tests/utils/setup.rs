#![allow(dead_code)] // Test utilities may not all be used in every test

use axum::{
    body::{Body, Bytes},
    http::{
        header::{ACCEPT, CONTENT_TYPE, COOKIE, SET_COOKIE},
        HeaderMap, Method, Request, StatusCode,
    },
    Router,
};
use cookie::Cookie;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tower::ServiceExt; // for `oneshot`

use certdesk::{
    auth::password::hash_password, build_router, user::models::UserModel, AppState, AuthConfig,
    InMemoryInventoryRepository, InMemoryUserRepository,
};

pub const TEST_SECRET: &str = "integration-test-secret";

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub struct TestSetup {
    pub state: AppState,
    pub router: Router,
}

pub struct TestSetupBuilder {
    users: Vec<(String, String)>,
    auth_config: AuthConfig,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            users: vec![],
            auth_config: AuthConfig::new(TEST_SECRET),
        }
    }

    pub fn with_user(mut self, login: &str, password: &str) -> Self {
        self.users.push((login.to_string(), password.to_string()));
        self
    }

    pub fn with_admin(self) -> Self {
        self.with_user("admin", "admin-password")
    }

    pub fn with_auth_config(mut self, config: AuthConfig) -> Self {
        self.auth_config = config;
        self
    }

    pub fn build(self) -> TestSetup {
        let users = self
            .users
            .iter()
            .map(|(login, password)| {
                UserModel::new(login.clone(), hash_password(password).unwrap(), None)
            })
            .collect();

        let state = AppState::new(
            self.auth_config,
            Arc::new(InMemoryUserRepository::with_users(users)),
            Arc::new(InMemoryInventoryRepository::new()),
        );

        TestSetup {
            router: build_router(state.clone()),
            state,
        }
    }
}

impl TestSetup {
    /// A client with an empty cookie jar
    pub fn client(&self) -> TestClient {
        TestClient {
            router: self.router.clone(),
            cookies: BTreeMap::new(),
            accept_html: false,
        }
    }

    /// A client that has already logged in
    pub async fn logged_in(&self, login: &str, password: &str) -> TestClient {
        let mut client = self.client();
        let response = client.login(login, password).await;
        assert_eq!(response.status, StatusCode::OK, "login as {} failed", login);
        client
    }
}

// ============================================================================
// Browser-like client with a cookie jar
// ============================================================================

pub struct TestClient {
    router: Router,
    pub cookies: BTreeMap<String, String>,
    accept_html: bool,
}

impl TestClient {
    pub fn accepting_html(mut self) -> Self {
        self.accept_html = true;
        self
    }

    pub fn set_cookie(&mut self, name: &str, value: &str) {
        self.cookies.insert(name.to_string(), value.to_string());
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    pub async fn send(&mut self, method: Method, uri: &str, body: Option<Body>) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);

        if !self.cookies.is_empty() {
            let header = self
                .cookies
                .iter()
                .map(|(name, value)| format!("{}={}", name, value))
                .collect::<Vec<_>>()
                .join("; ");
            builder = builder.header(COOKIE, header);
        }
        if self.accept_html {
            builder = builder.header(ACCEPT, "text/html,application/xhtml+xml");
        }

        let request = match body {
            Some(body) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(body)
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let response = TestResponse {
            status,
            headers,
            body,
        };
        self.absorb_cookies(&response);
        response
    }

    fn absorb_cookies(&mut self, response: &TestResponse) {
        for cookie in response.set_cookies() {
            if cookie.value().is_empty() {
                self.cookies.remove(cookie.name());
            } else {
                self.cookies
                    .insert(cookie.name().to_string(), cookie.value().to_string());
            }
        }
    }

    pub async fn get(&mut self, uri: &str) -> TestResponse {
        self.send(Method::GET, uri, None).await
    }

    pub async fn delete(&mut self, uri: &str) -> TestResponse {
        self.send(Method::DELETE, uri, None).await
    }

    pub async fn post(&mut self, uri: &str, body: Value) -> TestResponse {
        self.send(Method::POST, uri, Some(Body::from(body.to_string())))
            .await
    }

    pub async fn post_empty(&mut self, uri: &str) -> TestResponse {
        self.send(Method::POST, uri, None).await
    }

    pub async fn put(&mut self, uri: &str, body: Value) -> TestResponse {
        self.send(Method::PUT, uri, Some(Body::from(body.to_string())))
            .await
    }

    pub async fn login(&mut self, username: &str, password: &str) -> TestResponse {
        self.post(
            "/login",
            json!({"username": username, "password": password}),
        )
        .await
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json<T: DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body).unwrap_or_else(|e| {
            panic!(
                "body is not the expected JSON ({}): {}",
                e,
                String::from_utf8_lossy(&self.body)
            )
        })
    }

    pub fn set_cookies(&self) -> Vec<Cookie<'static>> {
        self.headers
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .filter_map(|value| Cookie::parse(value.to_string()).ok())
            .collect()
    }

    pub fn set_cookie(&self, name: &str) -> Option<Cookie<'static>> {
        self.set_cookies()
            .into_iter()
            .find(|cookie| cookie.name() == name)
    }
}
