//! HTTP server layer.
//!
//! Thin plumbing around the transformation pipeline: multipart upload
//! extraction and validation, query-parameter parsing, base64 response
//! encoding, CORS, and the health/feature endpoints. All image logic
//! lives in [`crate::pipeline`] and [`crate::codec`]; this layer only
//! validates inputs and relays outputs.

pub mod handlers;
pub mod routes;

pub use handlers::{
    download_handler, features_handler, health_handler, process_handler, upload_handler, ApiError,
    AppState, ErrorResponse, FeaturesResponse, HealthResponse, ProcessResponse, UploadResponse,
};
pub use routes::{create_router, RouterConfig, DEFAULT_MAX_UPLOAD_SIZE};
