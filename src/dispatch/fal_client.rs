//! HTTP adapters for the fal.ai REST API.
//!
//! [`FalClient`] performs the two-step storage upload (initiate, then PUT the
//! bytes) and [`FalModel`] calls one synchronous model endpoint. Both map every
//! transport or payload problem onto [`ProviderError`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, trace};
use reqwest::{header, Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::services::{ProviderService, UploadService};
use super::types::ImageUpload;
use crate::dimension::ProviderDescriptor;
use crate::error_handling::types::ProviderError;

#[derive(Debug, Serialize)]
struct InitiateUploadRequest<'a> {
    content_type: &'a str,
    file_name: &'a str,
}

#[derive(Debug, Deserialize)]
struct InitiateUploadResponse {
    upload_url: String,
    file_url: String,
}

#[derive(Debug, Deserialize)]
struct ReframeResponse {
    #[serde(default)]
    images: Vec<ImageRef>,
}

#[derive(Debug, Deserialize)]
struct ImageRef {
    url: Option<String>,
}

/// Shared HTTP client and credentials.
pub struct FalClient {
    http: Client,
    api_key: String,
    storage_base_url: String,
    run_base_url: String,
}

impl FalClient {
    pub fn new(
        api_key: impl Into<String>,
        storage_base_url: impl Into<String>,
        run_base_url: impl Into<String>,
        request_timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let http = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| ProviderError::Request(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            http,
            api_key: api_key.into(),
            storage_base_url: trim_base(storage_base_url.into()),
            run_base_url: trim_base(run_base_url.into()),
        })
    }

    fn auth_value(&self) -> String {
        format!("Key {}", self.api_key)
    }

    async fn run_model(&self, endpoint: &str, input: &Value) -> Result<String, ProviderError> {
        let url = format!("{}/{}", self.run_base_url, endpoint.trim_start_matches('/'));
        trace!("POST {} {}", url, input);
        let response = self
            .http
            .post(&url)
            .header(header::AUTHORIZATION, self.auth_value())
            .json(input)
            .send()
            .await
            .map_err(|e| ProviderError::Request(e.to_string()))?;
        let response = check_status(response).await?;

        let body: ReframeResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;
        first_image_url(body)
    }
}

#[async_trait]
impl UploadService for FalClient {
    async fn upload(&self, image: &ImageUpload) -> Result<String, ProviderError> {
        let url = format!(
            "{}/storage/upload/initiate?storage_type=fal-cdn-v3",
            self.storage_base_url
        );
        let response = self
            .http
            .post(&url)
            .header(header::AUTHORIZATION, self.auth_value())
            .json(&InitiateUploadRequest {
                content_type: &image.content_type,
                file_name: &image.file_name,
            })
            .send()
            .await
            .map_err(|e| ProviderError::Request(e.to_string()))?;
        let initiated: InitiateUploadResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

        debug!("Uploading {} byte(s) for {}", image.bytes.len(), image.file_name);
        let response = self
            .http
            .put(&initiated.upload_url)
            .header(header::CONTENT_TYPE, image.content_type.as_str())
            .body(image.bytes.clone())
            .send()
            .await
            .map_err(|e| ProviderError::Request(e.to_string()))?;
        check_status(response).await?;

        Ok(initiated.file_url)
    }
}

/// One reframing model reachable through a [`FalClient`].
///
/// `descriptor_field` names the input key that carries the resolved
/// descriptor (`aspect_ratio` or `image_size`).
pub struct FalModel {
    client: Arc<FalClient>,
    name: String,
    endpoint: String,
    descriptor_field: String,
}

impl FalModel {
    pub fn new(
        client: Arc<FalClient>,
        name: impl Into<String>,
        endpoint: impl Into<String>,
        descriptor_field: impl Into<String>,
    ) -> Self {
        Self {
            client,
            name: name.into(),
            endpoint: endpoint.into(),
            descriptor_field: descriptor_field.into(),
        }
    }

    fn payload(&self, image_reference: &str, descriptor: &ProviderDescriptor) -> Value {
        let mut input = json!({ "image_url": image_reference });
        input[self.descriptor_field.as_str()] = Value::String(descriptor.as_str().to_string());
        input
    }
}

#[async_trait]
impl ProviderService for FalModel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(
        &self,
        image_reference: &str,
        descriptor: &ProviderDescriptor,
    ) -> Result<String, ProviderError> {
        let input = self.payload(image_reference, descriptor);
        debug!("{} payload: {}", self.name, input);
        self.client.run_model(&self.endpoint, &input).await
    }
}

fn trim_base(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

async fn check_status(response: Response) -> Result<Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ProviderError::Status(status.as_u16(), error_detail(&body)))
}

/// Pulls a human-readable message out of an error body.
///
/// Understands `{"detail": "..."}`, `{"detail": [{"msg": "..."}]}` and
/// `{"message": "..."}`; anything else yields an empty string.
fn error_detail(body: &str) -> String {
    let value: Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(_) => return String::new(),
    };
    match &value["detail"] {
        Value::String(s) => return s.clone(),
        Value::Array(items) => {
            if let Some(msg) = items.iter().find_map(|i| i["msg"].as_str()) {
                return msg.to_string();
            }
        }
        _ => {}
    }
    value["message"].as_str().unwrap_or_default().to_string()
}

fn first_image_url(body: ReframeResponse) -> Result<String, ProviderError> {
    body.images
        .into_iter()
        .next()
        .and_then(|first| first.url)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ProviderError::MalformedResponse("no image url in response".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(field: &str) -> FalModel {
        let client = FalClient::new(
            "key",
            "https://rest.example/",
            "https://run.example",
            Duration::from_secs(5),
        )
        .unwrap();
        FalModel::new(Arc::new(client), "test", "fal-ai/test/reframe", field)
    }

    #[test]
    fn test_payload_uses_descriptor_field() {
        let m = model("image_size");
        let payload = m.payload("https://cdn/src.png", &ProviderDescriptor::new("square_hd"));
        assert_eq!(
            payload,
            json!({"image_url": "https://cdn/src.png", "image_size": "square_hd"})
        );
    }

    #[test]
    fn test_base_urls_are_trimmed() {
        let m = model("aspect_ratio");
        assert_eq!(m.client.storage_base_url, "https://rest.example");
        assert_eq!(m.client.auth_value(), "Key key");
    }

    #[test]
    fn test_error_detail_shapes() {
        assert_eq!(error_detail(r#"{"detail":"Invalid image"}"#), "Invalid image");
        assert_eq!(
            error_detail(r#"{"detail":[{"loc":["body"],"msg":"field required"}]}"#),
            "field required"
        );
        assert_eq!(error_detail(r#"{"message":"Unauthorized"}"#), "Unauthorized");
        assert_eq!(error_detail("<html>bad gateway</html>"), "");
    }

    #[test]
    fn test_first_image_url() {
        let body: ReframeResponse =
            serde_json::from_str(r#"{"images":[{"url":"https://cdn/out.png","width":1}],"seed":3}"#)
                .unwrap();
        assert_eq!(first_image_url(body).unwrap(), "https://cdn/out.png");

        let empty: ReframeResponse = serde_json::from_str(r#"{"images":[]}"#).unwrap();
        assert!(matches!(
            first_image_url(empty),
            Err(ProviderError::MalformedResponse(_))
        ));

        let missing: ReframeResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert!(first_image_url(missing).is_err());
    }

    #[test]
    fn test_only_first_image_counts() {
        let body: ReframeResponse = serde_json::from_str(
            r#"{"images":[{"url":""},{"url":"https://cdn/second.png"}]}"#,
        )
        .unwrap();
        assert!(matches!(
            first_image_url(body),
            Err(ProviderError::MalformedResponse(_))
        ));

        let body: ReframeResponse = serde_json::from_str(
            r#"{"images":[{"url":"https://cdn/first.png"},{"url":"https://cdn/second.png"}]}"#,
        )
        .unwrap();
        assert_eq!(first_image_url(body).unwrap(), "https://cdn/first.png");
    }
}
