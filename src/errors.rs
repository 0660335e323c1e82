use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while generating, rendering or measuring a curve
#[derive(Error, Debug)]
pub enum FractalError {
    /// A generation, render or estimation parameter is out of range
    #[error("Invalid parameter: {field} - {message}")]
    InvalidParameter { field: String, message: String },

    /// Error related to IO operations (unwritable output path, missing directory)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The image encoder rejected the output
    #[error("Failed to render {path}: {message}")]
    Render { path: PathBuf, message: String },

    /// Not enough data to fit a scaling law
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// The point set has no spatial extent
    #[error("Degenerate input: {0}")]
    DegenerateInput(String),
}

impl FractalError {
    /// Shorthand for [`FractalError::InvalidParameter`]
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Process exit code for this error kind
    ///
    /// Parameter errors share clap's usage exit code.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::InvalidParameter { .. } => 2,
            _ => 1,
        }
    }
}

/// Convert an encoder error for `path`, keeping IO failures as [`FractalError::Io`]
pub fn from_image_error(path: impl Into<PathBuf>, err: image::ImageError) -> FractalError {
    match err {
        image::ImageError::IoError(e) => FractalError::Io(e),
        other => FractalError::Render {
            path: path.into(),
            message: other.to_string(),
        },
    }
}

/// Type alias for Result with `FractalError`
pub type Result<T> = std::result::Result<T, FractalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_parameter_message() {
        let err = FractalError::invalid("iterations", "must be >= 0, got -1");
        assert_eq!(
            err.to_string(),
            "Invalid parameter: iterations - must be >= 0, got -1"
        );
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_io_error_exit_code() {
        let err: FractalError = io::Error::new(io::ErrorKind::PermissionDenied, "denied").into();
        assert!(matches!(err, FractalError::Io(_)));
        assert_eq!(err.exit_code(), 1);
    }
}
