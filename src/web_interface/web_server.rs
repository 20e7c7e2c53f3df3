use std::net::SocketAddr;
use std::sync::Arc;

use log::{error, info};
use warp::{Filter, Rejection, Reply};

use super::routes::{
    clear_history_route, compare_route, get_history_route, handle_rejection, health_route,
    presets_route, save_history_route,
};
use crate::dispatch::DispatchCoordinator;
use crate::error_handling::types::WebError;
use crate::storage::storage_trait::HistoryStorage;

/// HTTP transport for the history log and the comparison workflow
pub struct WebServer {
    storage: Arc<dyn HistoryStorage>,
    coordinator: Arc<DispatchCoordinator>,
    max_upload_bytes: u64,
}

impl WebServer {
    pub fn new(
        storage: Arc<dyn HistoryStorage>,
        coordinator: Arc<DispatchCoordinator>,
        max_upload_bytes: u64,
    ) -> Self {
        Self {
            storage,
            coordinator,
            max_upload_bytes,
        }
    }

    /// All routes with permissive CORS so a browser client on another
    /// origin can call them.
    pub fn routes(&self) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
        let cors = warp::cors()
            .allow_any_origin()
            .allow_methods(vec!["GET", "POST", "DELETE"])
            .allow_header("content-type");

        get_history_route(self.storage.clone())
            .or(save_history_route(self.storage.clone()))
            .or(clear_history_route(self.storage.clone()))
            .or(health_route())
            .or(presets_route())
            .or(compare_route(
                self.coordinator.clone(),
                self.storage.clone(),
                self.max_upload_bytes,
            ))
            .recover(handle_rejection)
            .with(cors)
    }

    /// Serve until the process stops.
    pub async fn start(&self, addr: SocketAddr) -> Result<(), WebError> {
        // Surface an occupied port as an error instead of a panic inside warp
        std::net::TcpListener::bind(addr).map_err(|e| {
            error!("Cannot bind {}: {}", addr, e);
            WebError::BindFailed(format!("{}: {}", addr, e))
        })?;

        info!("Server running on http://{}", addr);
        warp::serve(self.routes()).run(addr).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dimension::ProviderDescriptor;
    use crate::dispatch::services::{ProviderService, UploadService};
    use crate::dispatch::types::ImageUpload;
    use crate::error_handling::types::ProviderError;
    use crate::storage::memory_storage::MemoryHistoryStorage;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::time::Duration;
    use warp::http::StatusCode;

    struct FixedUploader;

    #[async_trait]
    impl UploadService for FixedUploader {
        async fn upload(&self, _image: &ImageUpload) -> Result<String, ProviderError> {
            Ok("https://cdn/src.png".to_string())
        }
    }

    struct EchoProvider(&'static str);

    #[async_trait]
    impl ProviderService for EchoProvider {
        fn name(&self) -> &str {
            self.0
        }

        async fn invoke(&self, _r: &str, d: &ProviderDescriptor) -> Result<String, ProviderError> {
            Ok(format!("https://cdn/{}/{}.png", self.0, d))
        }
    }

    fn server() -> WebServer {
        let coordinator = DispatchCoordinator::new(
            Arc::new(FixedUploader),
            Arc::new(EchoProvider("a")),
            Arc::new(EchoProvider("b")),
            Duration::from_secs(1),
        );
        WebServer::new(
            Arc::new(MemoryHistoryStorage::new()),
            Arc::new(coordinator),
            1024,
        )
    }

    fn body_of<B: AsRef<[u8]>>(res: &warp::http::Response<B>) -> Value {
        serde_json::from_slice(res.body().as_ref()).unwrap()
    }

    #[tokio::test]
    async fn test_health_and_presets_routes() {
        let routes = server().routes();

        let res = warp::test::request().path("/api/health").reply(&routes).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_of(&res), json!({"status": "ok", "message": "Backend is running"}));

        let res = warp::test::request().path("/api/presets").reply(&routes).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_of(&res).as_array().unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_history_routes() {
        let routes = server().routes();

        let res = warp::test::request().path("/api/history").reply(&routes).await;
        assert_eq!(body_of(&res), json!([]));

        let res = warp::test::request()
            .method("POST")
            .path("/api/history")
            .json(&json!({"history": "nope"}))
            .reply(&routes)
            .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_of(&res)["error"], "History must be an array");

        let res = warp::test::request()
            .method("POST")
            .path("/api/history")
            .json(&json!({"history": []}))
            .reply(&routes)
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_of(&res)["count"], 0);

        let res = warp::test::request()
            .method("DELETE")
            .path("/api/history")
            .reply(&routes)
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_of(&res)["success"], true);
    }

    #[tokio::test]
    async fn test_compare_route_records_history() {
        let routes = server().routes();

        let res = warp::test::request()
            .method("POST")
            .path("/api/compare")
            .json(&json!({"image": "AQID", "dimensions": {"width": 1920, "height": 1080}}))
            .reply(&routes)
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_of(&res)["resolvedDescriptorB"], "landscape_16_9");

        let res = warp::test::request().path("/api/history").reply(&routes).await;
        assert_eq!(body_of(&res).as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_bodies_get_json_errors() {
        let routes = server().routes();

        let res = warp::test::request()
            .method("POST")
            .path("/api/compare")
            .json(&json!({"image": "AQID", "dimensions": {"width": -3, "height": 2}}))
            .reply(&routes)
            .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_of(&res)["error"], "Invalid request body");

        let res = warp::test::request()
            .method("POST")
            .path("/api/compare")
            .json(&json!({"image": "A".repeat(2048), "preset": "Square"}))
            .reply(&routes)
            .await;
        assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body_of(&res)["error"], "Request body too large");
    }

    #[tokio::test]
    async fn test_unknown_path_and_method() {
        let routes = server().routes();

        let res = warp::test::request().path("/api/nothing").reply(&routes).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_of(&res)["error"], "Not found");

        let res = warp::test::request()
            .method("PUT")
            .path("/api/history")
            .reply(&routes)
            .await;
        assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_cross_origin_requests_are_allowed() {
        let routes = server().routes();

        let res = warp::test::request()
            .method("OPTIONS")
            .path("/api/history")
            .header("origin", "http://localhost:5173")
            .header("access-control-request-method", "POST")
            .header("access-control-request-headers", "content-type")
            .reply(&routes)
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.headers().contains_key("access-control-allow-origin"));

        let res = warp::test::request()
            .path("/api/health")
            .header("origin", "http://localhost:5173")
            .reply(&routes)
            .await;
        assert!(res.headers().contains_key("access-control-allow-origin"));
    }

    #[tokio::test]
    async fn test_start_reports_occupied_port() {
        let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = taken.local_addr().unwrap();
        let result = server().start(addr).await;
        assert!(matches!(result, Err(WebError::BindFailed(_))));
    }
}
