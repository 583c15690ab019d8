//! services/client/src/api/auth.rs
//!
//! Login, signup and account endpoints. A successful token exchange is handed
//! straight to the session store.

use astrometric_core::domain::{AuthPayload, Role, UserSummary};
use astrometric_core::ports::ApiRequest;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::MessageResponse;
use crate::error::ClientResult;
use crate::http::ApiClient;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl SignupRequest {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            name: None,
            role: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role.as_str().to_string());
        self
    }
}

#[derive(Serialize)]
struct ChangePasswordRequest<'a> {
    current_password: &'a str,
    new_password: &'a str,
}

/// The user object as the server serializes it.
#[derive(Debug, Clone, Deserialize)]
pub struct UserPayload {
    pub id: i64,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

impl UserPayload {
    pub fn to_domain(self) -> UserSummary {
        UserSummary {
            id: self.id,
            email: self.email,
            name: self.name,
            role: self.role.as_deref().map(Role::parse).unwrap_or_default(),
        }
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    user: UserPayload,
}

#[derive(Deserialize)]
struct SignupResponse {
    user: UserPayload,
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
}

//=========================================================================================
// Endpoints
//=========================================================================================

/// POST /api/auth/login - exchanges credentials for tokens and stores the session.
pub async fn login(client: &ApiClient, email: &str, password: &str) -> ClientResult<UserSummary> {
    let response: TokenResponse = client
        .post_json("/api/auth/login", &LoginRequest { email, password })
        .await?;
    let user = response.user.to_domain();
    client.session().set_session(AuthPayload {
        user: user.clone(),
        access_token: response.access_token,
        refresh_token: response.refresh_token,
    });
    info!(user_id = user.id, role = %user.role, "Logged in");
    Ok(user)
}

/// POST /api/auth/signup - creates an account.
///
/// When the server also issues tokens the new user is signed in immediately;
/// otherwise the caller is expected to `login` next.
pub async fn signup(client: &ApiClient, request: &SignupRequest) -> ClientResult<UserSummary> {
    let response: SignupResponse = client.post_json("/api/auth/signup", request).await?;
    let user = response.user.to_domain();
    if let Some(access_token) = response.access_token {
        client.session().set_session(AuthPayload {
            user: user.clone(),
            access_token,
            refresh_token: response.refresh_token,
        });
    }
    info!(user_id = user.id, "Account created");
    Ok(user)
}

/// GET /api/auth/me
pub async fn me(client: &ApiClient) -> ClientResult<UserSummary> {
    let user: UserPayload = client.get_json(ApiRequest::get("/api/auth/me")).await?;
    Ok(user.to_domain())
}

/// PUT /api/auth/change-password
pub async fn change_password(
    client: &ApiClient,
    current_password: &str,
    new_password: &str,
) -> ClientResult<MessageResponse> {
    client
        .put_json(
            "/api/auth/change-password",
            &ChangePasswordRequest {
                current_password,
                new_password,
            },
        )
        .await
}

/// Local sign-out; there is no server round trip.
pub fn logout(client: &ApiClient) {
    client.session().logout();
}
