//! HTTP request handlers for the image processing API.
//!
//! # Endpoints
//!
//! - `GET /health` - Health check with feature flags
//! - `GET /features` - Available optional capabilities
//! - `POST /upload` - Inspect an uploaded image (base64 + metadata)
//! - `POST /process` - Transform an image, respond inline as base64
//! - `POST /download` - Transform an image, respond as an attachment

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Multipart, Query, State},
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use bytes::Bytes;
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::codec::{self, ImageInfo, TargetFormat};
use crate::error::{CodecError, ProcessError, SegmentError};
use crate::pipeline::{Metadata, ProcessingParams, Processor};

// =============================================================================
// Application State
// =============================================================================

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The transformation pipeline
    pub processor: Arc<Processor>,

    /// Maximum accepted upload size in bytes
    pub max_upload_size: usize,
}

impl AppState {
    /// Create state around a processor with the given upload limit.
    pub fn new(processor: Processor, max_upload_size: usize) -> Self {
        Self {
            processor: Arc::new(processor),
            max_upload_size,
        }
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON error response returned for all error conditions.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error type identifier (e.g., "decode_error", "invalid_upload")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// HTTP status code (included for convenience)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ErrorResponse {
    /// Create a new error response with status code.
    pub fn with_status(
        error: impl Into<String>,
        message: impl Into<String>,
        status: StatusCode,
    ) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: Some(status.as_u16()),
        }
    }
}

/// Optional capabilities of this deployment.
#[derive(Debug, Serialize)]
pub struct FeaturesResponse {
    /// Whether background removal can be requested
    pub background_removal: bool,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Human-readable status line
    pub message: String,

    /// Service version
    pub version: String,

    /// Feature availability
    pub features: FeaturesResponse,
}

/// Response from the upload inspection endpoint.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,

    /// The uploaded image, base64-encoded
    pub image: String,

    /// Basic image information
    pub info: ImageInfo,

    /// Original filename, if the client sent one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

/// Response from the inline processing endpoint.
#[derive(Debug, Serialize)]
pub struct ProcessResponse {
    pub success: bool,

    /// The processed image, base64-encoded
    pub image: String,

    /// Transformation metadata
    pub metadata: Metadata,
}

// =============================================================================
// Error Mapping
// =============================================================================

/// All the ways a handler can fail, mapped to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Upload is missing a `file` field
    MissingFile,

    /// Upload's declared content type is not `image/*`
    NotAnImage,

    /// Upload exceeds the configured size limit
    TooLarge { max_bytes: usize },

    /// Malformed multipart body
    Multipart(String),

    /// Pipeline or codec failure
    Process(ProcessError),

    /// Worker task failure (panic in the blocking pipeline call)
    Internal(String),
}

impl From<ProcessError> for ApiError {
    fn from(err: ProcessError) -> Self {
        ApiError::Process(err)
    }
}

impl From<CodecError> for ApiError {
    fn from(err: CodecError) -> Self {
        ApiError::Process(ProcessError::Codec(err))
    }
}

/// Convert ApiError to an HTTP response.
///
/// 4xx errors are logged at WARN (client errors), 5xx at ERROR.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            ApiError::MissingFile => (
                StatusCode::BAD_REQUEST,
                "invalid_upload",
                "Missing 'file' field in multipart body".to_string(),
            ),

            ApiError::NotAnImage => (
                StatusCode::BAD_REQUEST,
                "invalid_upload",
                "File must be an image".to_string(),
            ),

            ApiError::TooLarge { max_bytes } => (
                StatusCode::BAD_REQUEST,
                "file_too_large",
                format!(
                    "File too large. Maximum size is {}MB",
                    max_bytes / (1024 * 1024)
                ),
            ),

            ApiError::Multipart(msg) => (
                StatusCode::BAD_REQUEST,
                "invalid_upload",
                format!("Malformed upload: {}", msg),
            ),

            ApiError::Process(err) => {
                let error_type = match err {
                    ProcessError::Codec(CodecError::Decode { .. }) => "decode_error",
                    ProcessError::Codec(CodecError::Encode { .. }) => "encode_error",
                    ProcessError::Segment(SegmentError::Unavailable) => {
                        "background_removal_unavailable"
                    }
                    ProcessError::Segment(SegmentError::Backend { .. }) => "segmentation_error",
                    ProcessError::InvalidParams { .. } => "invalid_parameters",
                };
                let status = if err.is_client_error() {
                    StatusCode::BAD_REQUEST
                } else {
                    StatusCode::INTERNAL_SERVER_ERROR
                };
                (status, error_type, err.to_string())
            }

            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                format!("Processing task failed: {}", msg),
            ),
        };

        if status.is_server_error() {
            error!(
                error_type = error_type,
                status = status.as_u16(),
                "Server error: {}",
                message
            );
        } else {
            warn!(
                error_type = error_type,
                status = status.as_u16(),
                "Client error: {}",
                message
            );
        }

        let body = ErrorResponse::with_status(error_type, message, status);
        (status, Json(body)).into_response()
    }
}

// =============================================================================
// Parameter Extraction
// =============================================================================

/// Query extractor for [`ProcessingParams`] whose rejection is the standard
/// JSON error shape.
///
/// Axum's own `Query` rejection is a plain-text 400, which would be the one
/// error path not returning an [`ErrorResponse`]; unparseable parameters
/// (e.g. `format=avif`) come back as `invalid_parameters` instead, same as
/// out-of-range values caught by validation.
pub struct ParamsQuery(pub ProcessingParams);

impl<S> FromRequestParts<S> for ParamsQuery
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(params) = Query::<ProcessingParams>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                ApiError::Process(ProcessError::InvalidParams {
                    message: rejection.body_text(),
                })
            })?;
        Ok(ParamsQuery(params))
    }
}

// =============================================================================
// Upload Extraction
// =============================================================================

/// One file extracted from a multipart upload.
struct Upload {
    bytes: Bytes,
    filename: Option<String>,
}

/// Pull the `file` field out of a multipart body and validate it.
///
/// Enforces the `image/*` content-type check and the configured size
/// limit before any decoding happens. Content beyond the declared type is
/// still sniffed by the decoder later; this check only rejects uploads
/// that don't even claim to be images.
async fn read_upload(state: &AppState, mut multipart: Multipart) -> Result<Upload, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Multipart(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let is_image = field
            .content_type()
            .map(|ct| ct.starts_with("image/"))
            .unwrap_or(false);
        if !is_image {
            return Err(ApiError::NotAnImage);
        }

        let filename = field.file_name().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::Multipart(e.to_string()))?;

        if bytes.len() > state.max_upload_size {
            return Err(ApiError::TooLarge {
                max_bytes: state.max_upload_size,
            });
        }

        return Ok(Upload { bytes, filename });
    }

    Err(ApiError::MissingFile)
}

/// Run the blocking pipeline on a worker thread.
async fn run_pipeline(
    state: &AppState,
    bytes: Bytes,
    params: ProcessingParams,
) -> Result<crate::pipeline::ProcessingResult, ApiError> {
    // Precondition: reject removal requests before the pipeline is invoked
    // when the capability is absent.
    if params.remove_background && !state.processor.background_removal_available() {
        return Err(ProcessError::from(SegmentError::Unavailable).into());
    }

    let processor = Arc::clone(&state.processor);
    tokio::task::spawn_blocking(move || processor.process(bytes, &params))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .map_err(ApiError::from)
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle health check requests.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response
///
/// `200 OK` with JSON body:
/// ```json
/// {
///   "status": "ok",
///   "message": "imgsquish is running",
///   "version": "0.1.0",
///   "features": { "background_removal": false }
/// }
/// ```
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        message: "imgsquish is running".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        features: FeaturesResponse {
            background_removal: state.processor.background_removal_available(),
        },
    })
}

/// Handle feature discovery requests.
///
/// # Endpoint
///
/// `GET /features`
pub async fn features_handler(State(state): State<AppState>) -> Json<FeaturesResponse> {
    Json(FeaturesResponse {
        background_removal: state.processor.background_removal_available(),
    })
}

/// Handle upload inspection requests.
///
/// # Endpoint
///
/// `POST /upload` with a multipart `file` field.
///
/// # Response
///
/// - `200 OK`: base64 image plus `{width, height, format, mode, size_bytes}`
/// - `400 Bad Request`: not an image, too large, or undecodable
pub async fn upload_handler(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let upload = read_upload(&state, multipart).await?;
    let info = codec::inspect(&upload.bytes)?;

    debug!(
        filename = upload.filename.as_deref().unwrap_or("<unnamed>"),
        format = %info.format,
        size_bytes = info.size_bytes,
        "Upload inspected"
    );

    Ok(Json(UploadResponse {
        success: true,
        image: BASE64.encode(&upload.bytes),
        info,
        filename: upload.filename,
    }))
}

/// Handle inline processing requests.
///
/// # Endpoint
///
/// `POST /process` with a multipart `file` field.
///
/// # Query Parameters
///
/// - `width`, `height`: target dimensions, 1-10000 (absent = keep original)
/// - `format`: jpeg | jpg | png | webp (default: webp)
/// - `quality`: 1-100 (default: 80)
/// - `keep_aspect_ratio`: default true
/// - `remove_background`: default false; rejected when unavailable
///
/// # Response
///
/// - `200 OK`: base64 image plus transformation metadata
/// - `400 Bad Request`: invalid upload, parameters, or undecodable image
/// - `500 Internal Server Error`: encode or segmentation failure
pub async fn process_handler(
    State(state): State<AppState>,
    ParamsQuery(params): ParamsQuery,
    multipart: Multipart,
) -> Result<Json<ProcessResponse>, ApiError> {
    let upload = read_upload(&state, multipart).await?;
    let result = run_pipeline(&state, upload.bytes, params).await?;

    Ok(Json(ProcessResponse {
        success: true,
        image: BASE64.encode(&result.bytes),
        metadata: result.metadata,
    }))
}

/// Handle process-and-download requests.
///
/// # Endpoint
///
/// `POST /download` with a multipart `file` field; same query parameters
/// as `/process`.
///
/// # Response
///
/// `200 OK` with the raw processed image, the content type of the
/// resulting format (which may be PNG when background removal forced it),
/// and a `Content-Disposition` attachment named after the original file
/// with a `_nobg` or `_compressed` suffix.
pub async fn download_handler(
    State(state): State<AppState>,
    ParamsQuery(params): ParamsQuery,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let upload = read_upload(&state, multipart).await?;
    let result = run_pipeline(&state, upload.bytes, params).await?;

    // The pipeline may have changed the format (background removal forces
    // PNG), so derive the content type from the result, not the request.
    let content_type = result
        .metadata
        .format
        .parse::<TargetFormat>()
        .map(|f| f.content_type())
        .unwrap_or("application/octet-stream");

    let filename = download_filename(
        upload.filename.as_deref(),
        &result.metadata.format,
        result.metadata.background_removed,
    );

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        )
        .body(axum::body::Body::from(result.bytes))
        .unwrap();

    Ok(response)
}

/// Build the attachment filename: original base name plus a suffix
/// reflecting what happened, with the resulting format as extension.
fn download_filename(original: Option<&str>, format: &str, background_removed: bool) -> String {
    let original = original.unwrap_or("image");
    let base = match original.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => original,
    };
    let suffix = if background_removed {
        "_nobg"
    } else {
        "_compressed"
    };
    format!("{}{}.{}", base, suffix, format)
}

// =============================================================================
// Tests
// =============================================================================
