//! Gateway error types

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use gantry_kernel::plugin::{DefinitionError, ResolveError};
use serde_json::json;
use thiserror::Error;

/// Gateway-level errors
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Resolving a plugin's configuration failed; the request must not be
    /// served with a partial plugin set.
    #[error("failed to resolve configuration of plugin '{plugin}': {source}")]
    PluginResolution {
        plugin: String,
        #[source]
        source: ResolveError,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<DefinitionError> for GatewayError {
    fn from(err: DefinitionError) -> Self {
        GatewayError::InvalidConfig(err.to_string())
    }
}

impl From<gantry_kernel::config::ConfigError> for GatewayError {
    fn from(err: gantry_kernel::config::ConfigError) -> Self {
        GatewayError::InvalidConfig(err.to_string())
    }
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn code(&self) -> &'static str {
        match self {
            GatewayError::PluginResolution { .. } => "PLUGIN_RESOLUTION_FAILED",
            GatewayError::InvalidConfig(_) => "INVALID_CONFIG",
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        // Resolution details stay in the logs; clients only learn that the
        // request could not be processed.
        let message = match &self {
            GatewayError::PluginResolution { .. } => "An unexpected error occurred".to_string(),
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": message,
            }
        }));

        (self.status(), body).into_response()
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;
