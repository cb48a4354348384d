//! Request/response types for auth endpoints.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::session::SessionInfo;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub confirm_password: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ResetPasswordRequest {
    pub password: String,
    pub confirm_password: String,
    pub code: Option<String>,
    pub token_hash: Option<String>,
    #[serde(rename = "type")]
    pub otp_type: Option<String>,
}

#[derive(IntoParams, Deserialize, Debug, Default)]
pub struct ConfirmQuery {
    pub code: Option<String>,
    pub token_hash: Option<String>,
    #[serde(rename = "type")]
    pub otp_type: Option<String>,
    pub redirect_to: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct MessageData {
    pub message: String,
}

/// Success envelope: `{success: true, data: {...}}`.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct MessageResponse {
    pub success: bool,
    pub data: MessageData,
}

impl MessageResponse {
    #[must_use]
    pub fn new(message: &str) -> Self {
        Self {
            success: true,
            data: MessageData {
                message: message.to_string(),
            },
        }
    }
}

#[derive(ToSchema, Serialize, Debug)]
pub struct SessionResponse {
    pub success: bool,
    pub data: SessionInfo,
}
