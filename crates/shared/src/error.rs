use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    BadRequest,
    NotFound,
    Validation,
    Unavailable,
    Internal,
    Unknown,
}

impl ErrorCode {
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => Self::BadRequest,
            404 => Self::NotFound,
            422 => Self::Validation,
            502..=504 => Self::Unavailable,
            500..=599 => Self::Internal,
            _ => Self::Unknown,
        }
    }
}

/// Error body returned by the prediction service.
///
/// Every field is optional on the wire; servers differ in what they send.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ApiError {
    pub fn code(&self) -> ErrorCode {
        self.status
            .map(ErrorCode::from_status)
            .unwrap_or(ErrorCode::Unknown)
    }

    /// Best human-readable description the body offers.
    pub fn describe(&self) -> Option<&str> {
        self.message
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .or(self.error.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_partial_service_error_body() {
        let body: ApiError =
            serde_json::from_str(r#"{"status":500,"error":"Internal Server Error"}"#)
                .expect("decode");
        assert_eq!(body.code(), ErrorCode::Internal);
        assert_eq!(body.describe(), Some("Internal Server Error"));
    }

    #[test]
    fn blank_message_falls_back_to_error_label() {
        let body = ApiError {
            status: Some(400),
            error: Some("Bad Request".into()),
            message: Some("  ".into()),
        };
        assert_eq!(body.code(), ErrorCode::BadRequest);
        assert_eq!(body.describe(), Some("Bad Request"));
    }
}
