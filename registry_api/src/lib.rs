//! Thin HTTP surface over `registry_core`.
//!
//! A stateless web layer that extracts a verified principal and delegates
//! straight into the core engine, adding nothing of its own beyond JSON
//! (de)serialization and status-code mapping. Auth token verification,
//! pagination, and persistence choice are external collaborators; this
//! binary stubs the first one just enough to show the seam.

use actix_web::{dev::Payload, error::ResponseError, http::StatusCode, FromRequest, HttpRequest, HttpResponse};
use serde::Serialize;
use std::future::{ready, Ready};
use std::sync::Arc;
use std::time::Duration;

use registry_core::config::RegistryConfig;
use registry_core::ids::TeamId;
use registry_core::{RegistryError, Store};

pub struct AppState {
    pub store: Store,
    pub config: RegistryConfig,
    pub http_client: reqwest::Client,
}

impl AppState {
    pub fn new(config: RegistryConfig) -> Self {
        AppState {
            store: Store::new(),
            config,
            http_client: reqwest::Client::new(),
        }
    }

    pub fn health_probe_timeout(&self) -> Duration {
        self.config.health_probe_timeout
    }
}

/// Stands in for the external auth verifier's `{userId, email, roles[],
/// teamIds[], teamRoles{}}` principal. Here it is a bare-bones bearer-token
/// check: any non-empty token is accepted and granted every role, since
/// cryptographic verification and role derivation live outside the core.
#[derive(Debug, Clone)]
pub struct Principal {
    pub user_id: String,
    pub roles: Vec<String>,
}

impl Principal {
    pub fn can_write(&self) -> bool {
        self.roles.iter().any(|r| r == "writer" || r == "admin")
    }
}

impl FromRequest for Principal {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let header = req
            .headers()
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));
        let result = match header {
            Some(token) if !token.is_empty() => {
                let roles = req
                    .headers()
                    .get("x-role")
                    .and_then(|v| v.to_str().ok())
                    .map(|r| vec![r.to_string()])
                    .unwrap_or_else(|| vec!["writer".to_string(), "reader".to_string()]);
                Ok(Principal {
                    user_id: token.to_string(),
                    roles,
                })
            }
            _ => Err(ApiError(RegistryError::authorization("missing bearer token"))),
        };
        ready(result)
    }
}

/// Wraps `RegistryError` so it can be returned directly from actix handlers;
/// serializes to a `{status, message}` body.
#[derive(Debug)]
pub struct ApiError(pub RegistryError);

impl From<RegistryError> for ApiError {
    fn from(e: RegistryError) -> Self {
        ApiError(e)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    status: u16,
    message: String,
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        HttpResponse::build(status).json(ErrorBody {
            status: status.as_u16(),
            message: self.0.to_string(),
        })
    }
}

pub fn parse_team_id(raw: &str) -> Result<TeamId, ApiError> {
    uuid::Uuid::parse_str(raw)
        .map(TeamId)
        .map_err(|_| ApiError(RegistryError::validation("malformed team id")))
}

pub fn parse_id<T>(raw: &str) -> Result<registry_core::Id<T>, ApiError> {
    uuid::Uuid::parse_str(raw)
        .map(registry_core::Id::from_uuid)
        .map_err(|_| ApiError(RegistryError::validation("malformed id")))
}

pub mod handlers;

pub fn app_state(config: RegistryConfig) -> Arc<AppState> {
    Arc::new(AppState::new(config))
}
