use thiserror::Error;

/// Errors from the codec adapter (decode/encode).
#[derive(Debug, Clone, Error)]
pub enum CodecError {
    /// Input bytes are not a recognized or valid image container.
    ///
    /// This indicates bad client input and should map to HTTP 400.
    #[error("Failed to decode image: {message}")]
    Decode { message: String },

    /// The target format/option combination could not be encoded.
    ///
    /// This indicates an internal adapter defect, not bad input,
    /// and should map to HTTP 500.
    #[error("Failed to encode image as {format}: {message}")]
    Encode { format: String, message: String },
}

impl CodecError {
    /// Build a decode error from any displayable source.
    pub fn decode(err: impl std::fmt::Display) -> Self {
        CodecError::Decode {
            message: err.to_string(),
        }
    }

    /// Build an encode error for the given target format.
    pub fn encode(format: impl Into<String>, err: impl std::fmt::Display) -> Self {
        CodecError::Encode {
            format: format.into(),
            message: err.to_string(),
        }
    }
}

/// Errors from the background removal capability.
#[derive(Debug, Clone, Error)]
pub enum SegmentError {
    /// Background removal was requested but no segmenter is configured.
    ///
    /// Callers are expected to check availability before invoking the
    /// pipeline; if they don't, the pipeline fails loudly with this
    /// variant rather than silently skipping the step.
    #[error("Background removal is not available")]
    Unavailable,

    /// The segmentation backend failed to produce an alpha-carrying image.
    #[error("Foreground segmentation failed: {message}")]
    Backend { message: String },
}

impl SegmentError {
    /// Build a backend error from any displayable source.
    pub fn backend(err: impl std::fmt::Display) -> Self {
        SegmentError::Backend {
            message: err.to_string(),
        }
    }
}

/// Errors that can occur while processing an image through the pipeline.
#[derive(Debug, Clone, Error)]
pub enum ProcessError {
    /// Decode or encode failure from the codec adapter
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Background removal failure
    #[error(transparent)]
    Segment(#[from] SegmentError),

    /// Request parameters outside the accepted ranges
    #[error("Invalid parameters: {message}")]
    InvalidParams { message: String },
}

impl ProcessError {
    /// Whether this error was caused by the client's input rather than
    /// an internal processing failure.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ProcessError::Codec(CodecError::Decode { .. })
                | ProcessError::Segment(SegmentError::Unavailable)
                | ProcessError::InvalidParams { .. }
        )
    }
}
