use reqwest::Method;

use crate::client::http::{ClientResult, HttpClient, to_body};
use crate::models::{LoginPayload, LoginResponse, PublicUser, RegisterPayload};

/// Session endpoints. `login` only returns the token; storing it is up to the caller.
#[derive(Clone)]
pub struct AuthApiClient {
    http: HttpClient,
}

impl AuthApiClient {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub async fn register(&self, username: &str, password: &str) -> ClientResult<PublicUser> {
        let body = to_body(&RegisterPayload {
            username: username.to_string(),
            password: password.to_string(),
        })?;
        self.http
            .make_request(Method::POST, "/auth/register", &[], Some(body))
            .await
    }

    pub async fn login(&self, username: &str, password: &str) -> ClientResult<LoginResponse> {
        let body = to_body(&LoginPayload {
            username: username.to_string(),
            password: password.to_string(),
        })?;
        self.http
            .make_request(Method::POST, "/auth/login", &[], Some(body))
            .await
    }

    pub async fn me(&self) -> ClientResult<PublicUser> {
        self.http
            .make_request(Method::GET, "/auth/me", &[], None)
            .await
    }

    pub async fn logout(&self) -> ClientResult<()> {
        self.http
            .make_request_empty(Method::POST, "/auth/logout", None)
            .await
    }
}
