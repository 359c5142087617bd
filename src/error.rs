use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const STATUS_OK: u16 = 200;
pub const STATUS_BAD_REQUEST: u16 = 400;
pub const STATUS_INTERNAL_SERVER_ERROR: u16 = 500;

#[derive(Debug, Error)]
pub enum DetectionError {
    #[error("no image specified")]
    NoImageSpecified,

    #[error("bad input data")]
    BadInput,

    #[error("can't read image")]
    CantReadImage,

    #[error("image type not supported")]
    ImageTypeNotSupported,

    /// An empty but successful result. Reported with a success status.
    #[error("no faces found")]
    NoFacesFound,

    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl DetectionError {
    /// Status code reported alongside the error envelope.
    pub fn status_code(&self) -> u16 {
        match self {
            DetectionError::NoImageSpecified
            | DetectionError::BadInput
            | DetectionError::CantReadImage
            | DetectionError::ImageTypeNotSupported => STATUS_BAD_REQUEST,
            DetectionError::NoFacesFound => STATUS_OK,
            DetectionError::Internal(_) => STATUS_INTERNAL_SERVER_ERROR,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code() == STATUS_OK
    }
}

/// Wire form of an error: `{"error":{"message":..,"code":..}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorResource,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResource {
    pub message: String,
    pub code: u16,
}

impl From<&DetectionError> for ErrorEnvelope {
    fn from(err: &DetectionError) -> ErrorEnvelope {
        ErrorEnvelope {
            error: ErrorResource {
                message: err.to_string(),
                code: err.status_code(),
            },
        }
    }
}
