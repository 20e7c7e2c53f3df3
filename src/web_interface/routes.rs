use std::convert::Infallible;
use std::sync::Arc;

use base64::{engine::general_purpose, Engine as _};
use log::{error, info, warn};
use serde::Serialize;
use serde_json::Value;
use warp::filters::body::BodyDeserializeError;
use warp::{http::StatusCode, reject, reply, Filter, Rejection, Reply};

use super::types::{ApiError, CompareRequest, HealthResponse, SaveHistoryResponse};
use crate::dimension::{find_preset, presets};
use crate::dispatch::types::ImageUpload;
use crate::dispatch::DispatchCoordinator;
use crate::error_handling::types::{DispatchError, StorageError};
use crate::storage::storage_trait::HistoryStorage;
use crate::storage::types::HistoryLog;

const HISTORY_BODY_LIMIT: u64 = 16 * 1024 * 1024;

/// Status code plus JSON body, produced by every handler below.
#[derive(Debug)]
pub struct ApiReply {
    pub status: StatusCode,
    pub body: Value,
}

impl ApiReply {
    fn ok<T: Serialize>(body: &T) -> Self {
        match serde_json::to_value(body) {
            Ok(body) => Self {
                status: StatusCode::OK,
                body,
            },
            Err(e) => {
                error!("Failed to encode response: {}", e);
                Self::error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to encode response", None)
            }
        }
    }

    fn error(status: StatusCode, message: &str, detail: Option<String>) -> Self {
        let body = serde_json::to_value(ApiError {
            error: message.to_string(),
            detail,
        })
        .unwrap_or(Value::Null);
        Self { status, body }
    }
}

impl Reply for ApiReply {
    fn into_response(self) -> reply::Response {
        reply::with_status(reply::json(&self.body), self.status).into_response()
    }
}

/// Reads the log, degrading any failure to an empty history.
pub async fn get_history(storage: Arc<dyn HistoryStorage>) -> ApiReply {
    let log = match tokio::task::spawn_blocking(move || storage.read_all()).await {
        Ok(Ok(log)) => log,
        Ok(Err(e)) => {
            warn!("Could not read history ({}), returning empty array", e);
            HistoryLog::new()
        }
        Err(e) => {
            error!("History read task failed: {}", e);
            HistoryLog::new()
        }
    };
    ApiReply::ok(&log)
}

/// Replaces the log with `body.history`, which must be an array of records.
pub async fn save_history(storage: Arc<dyn HistoryStorage>, body: Value) -> ApiReply {
    let payload = body.get("history").cloned().unwrap_or(Value::Null);
    let log = match HistoryLog::from_payload(payload) {
        Ok(log) => log,
        Err(StorageError::InvalidHistoryShape(detail)) => {
            warn!("Rejected history payload: {}", detail);
            return ApiReply::error(
                StatusCode::BAD_REQUEST,
                "History must be an array",
                Some(detail),
            );
        }
        Err(e) => {
            return ApiReply::error(StatusCode::BAD_REQUEST, "History must be an array", Some(e.to_string()))
        }
    };
    replace_history(storage, log).await
}

pub async fn clear_history(storage: Arc<dyn HistoryStorage>) -> ApiReply {
    replace_history(storage, HistoryLog::new()).await
}

async fn replace_history(storage: Arc<dyn HistoryStorage>, log: HistoryLog) -> ApiReply {
    match tokio::task::spawn_blocking(move || storage.replace_all(&log)).await {
        Ok(Ok(count)) => ApiReply::ok(&SaveHistoryResponse {
            success: true,
            message: "History saved successfully".to_string(),
            count,
        }),
        Ok(Err(e)) => {
            error!("Error saving history: {}", e);
            ApiReply::error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to save history", None)
        }
        Err(e) => {
            error!("History write task failed: {}", e);
            ApiReply::error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to save history", None)
        }
    }
}

pub fn health() -> ApiReply {
    ApiReply::ok(&HealthResponse {
        status: "ok",
        message: "Backend is running",
    })
}

pub fn list_presets() -> ApiReply {
    ApiReply::ok(&presets())
}

/// Runs one comparison and records it in the history.
///
/// A failed history save is logged only; the result is still returned.
pub async fn compare(
    coordinator: Arc<DispatchCoordinator>,
    storage: Arc<dyn HistoryStorage>,
    request: CompareRequest,
) -> ApiReply {
    let (bytes, uri_content_type) = match decode_image(&request.image) {
        Ok(decoded) => decoded,
        Err(detail) => {
            return ApiReply::error(StatusCode::BAD_REQUEST, "Invalid image payload", Some(detail))
        }
    };

    let requested = match (&request.dimensions, &request.preset) {
        (Some(dimensions), _) => *dimensions,
        (None, Some(name)) => match find_preset(name) {
            Some(preset) => preset.dimension(),
            None => {
                return ApiReply::error(
                    StatusCode::BAD_REQUEST,
                    "Unknown preset",
                    Some(name.clone()),
                )
            }
        },
        (None, None) => {
            return ApiReply::error(
                StatusCode::BAD_REQUEST,
                "Either dimensions or preset is required",
                None,
            )
        }
    };

    let content_type = request
        .content_type
        .or(uri_content_type)
        .unwrap_or_else(|| "application/octet-stream".to_string());
    let file_name = request.file_name.unwrap_or_else(|| "upload".to_string());
    let upload = ImageUpload::new(bytes, file_name, content_type);

    let result = match coordinator.compare_reframing(&upload, requested).await {
        Ok(result) => result,
        Err(DispatchError::InvalidDimension(e)) => {
            return ApiReply::error(StatusCode::BAD_REQUEST, &e.to_string(), None)
        }
        Err(e @ DispatchError::UploadFailed(_)) => {
            return ApiReply::error(StatusCode::BAD_GATEWAY, &e.to_string(), None)
        }
    };

    let record = result.clone();
    match tokio::task::spawn_blocking(move || storage.append(record)).await {
        Ok(Ok(log)) => info!("Comparison {} saved, history holds {}", result.id(), log.len()),
        Ok(Err(e)) => error!("Could not save comparison {} to history: {}", result.id(), e),
        Err(e) => error!("History append task failed: {}", e),
    }
    ApiReply::ok(&result)
}

/// Decodes plain base64 or a `data:<mime>;base64,<data>` URI.
fn decode_image(image: &str) -> Result<(Vec<u8>, Option<String>), String> {
    let (content_type, data) = match image.strip_prefix("data:") {
        Some(rest) => {
            let (header, data) = rest
                .split_once(',')
                .ok_or_else(|| "data URI without payload".to_string())?;
            let mime = header.strip_suffix(";base64").ok_or_else(|| {
                "only base64 data URIs are supported".to_string()
            })?;
            let mime = if mime.is_empty() { None } else { Some(mime.to_string()) };
            (mime, data)
        }
        None => (None, image),
    };
    let bytes = general_purpose::STANDARD
        .decode(data.trim())
        .map_err(|e| e.to_string())?;
    if bytes.is_empty() {
        return Err("image is empty".to_string());
    }
    Ok((bytes, content_type))
}

/// GET /api/history
pub fn get_history_route(
    storage: Arc<dyn HistoryStorage>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("api" / "history")
        .and(warp::get())
        .and_then(move || {
            let storage = storage.clone();
            async move { Ok::<_, Rejection>(get_history(storage).await) }
        })
}

/// POST /api/history
pub fn save_history_route(
    storage: Arc<dyn HistoryStorage>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("api" / "history")
        .and(warp::post())
        .and(warp::body::content_length_limit(HISTORY_BODY_LIMIT))
        .and(warp::body::json())
        .and_then(move |body: Value| {
            let storage = storage.clone();
            async move { Ok::<_, Rejection>(save_history(storage, body).await) }
        })
}

/// DELETE /api/history
pub fn clear_history_route(
    storage: Arc<dyn HistoryStorage>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("api" / "history")
        .and(warp::delete())
        .and_then(move || {
            let storage = storage.clone();
            async move { Ok::<_, Rejection>(clear_history(storage).await) }
        })
}

/// GET /api/health
pub fn health_route() -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("api" / "health")
        .and(warp::get())
        .map(health)
}

/// GET /api/presets
pub fn presets_route() -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("api" / "presets")
        .and(warp::get())
        .map(list_presets)
}

/// POST /api/compare
pub fn compare_route(
    coordinator: Arc<DispatchCoordinator>,
    storage: Arc<dyn HistoryStorage>,
    max_upload_bytes: u64,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("api" / "compare")
        .and(warp::post())
        .and(warp::body::content_length_limit(max_upload_bytes))
        .and(warp::body::json())
        .and_then(move |request: CompareRequest| {
            let coordinator = coordinator.clone();
            let storage = storage.clone();
            async move { Ok::<_, Rejection>(compare(coordinator, storage, request).await) }
        })
}

/// Turns filter rejections (unknown path, wrong method, bad or oversized
/// body) into the same JSON error shape the handlers use.
pub async fn handle_rejection(err: Rejection) -> Result<ApiReply, Infallible> {
    let reply = if let Some(e) = err.find::<BodyDeserializeError>() {
        warn!("Rejected request body: {}", e);
        ApiReply::error(
            StatusCode::BAD_REQUEST,
            "Invalid request body",
            Some(e.to_string()),
        )
    } else if err.find::<reject::PayloadTooLarge>().is_some() {
        ApiReply::error(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large", None)
    } else if err.find::<reject::LengthRequired>().is_some() {
        ApiReply::error(StatusCode::LENGTH_REQUIRED, "Content-Length required", None)
    } else if err.find::<reject::UnsupportedMediaType>().is_some() {
        ApiReply::error(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "Expected an application/json body",
            None,
        )
    } else if err.find::<reject::MethodNotAllowed>().is_some() {
        ApiReply::error(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed", None)
    } else if err.is_not_found() {
        ApiReply::error(StatusCode::NOT_FOUND, "Not found", None)
    } else {
        error!("Unhandled rejection: {:?}", err);
        ApiReply::error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", None)
    };
    Ok(reply)
}
