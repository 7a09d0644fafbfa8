use thiserror::Error;

pub const INVALID_QR_MESSAGE: &str = "Invalid QR code";
pub const CAMERA_DENIED_MESSAGE: &str =
    "Camera access was denied. Allow camera access in your browser settings and try again.";
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong, please try again.";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Malformed QR payload: {0}")]
    MalformedPayload(String),

    #[error("Unexpected command: {0}")]
    UnexpectedCommand(String),

    #[error("Derivation path mismatch: expected {expected}, got {actual}")]
    PathMismatch { expected: String, actual: String },

    #[error("Invalid public key: {0}")]
    InvalidKey(String),

    #[error("Camera permission denied")]
    CameraPermissionDenied,

    #[error("Invalid derivation path: {0}")]
    InvalidPath(String),

    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),

    #[error("Chunk size must be greater than zero")]
    InvalidChunkSize,

    #[error("Cannot cycle an empty frame sequence")]
    EmptyFrames,

    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Collaborator(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Whether the error came from a scanned QR payload that failed validation.
    pub fn is_scan_rejection(&self) -> bool {
        matches!(
            self,
            Self::MalformedPayload(_)
                | Self::UnexpectedCommand(_)
                | Self::PathMismatch { .. }
                | Self::InvalidKey(_)
        )
    }

    /// Text shown to the user for this error.
    pub fn user_message(&self) -> &'static str {
        if self.is_scan_rejection() {
            INVALID_QR_MESSAGE
        } else if matches!(self, Self::CameraPermissionDenied) {
            CAMERA_DENIED_MESSAGE
        } else {
            GENERIC_FAILURE_MESSAGE
        }
    }
}
