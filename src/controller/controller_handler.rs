use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};

use crate::configuration::config::Config;
use crate::configuration::types::{ProviderConfig, StorageBackend};
use crate::dispatch::fal_client::{FalClient, FalModel};
use crate::dispatch::DispatchCoordinator;
use crate::error_handling::types::*;
use crate::storage::file_storage::FileHistoryStorage;
use crate::storage::memory_storage::MemoryHistoryStorage;
use crate::storage::storage_trait::HistoryStorage;
use crate::web_interface::WebServer;

/// Wires configuration, storage, providers and the HTTP transport together.
pub struct Controller {
    pub config: Config,
    storage: Arc<dyn HistoryStorage>,
    web_server: WebServer,
}

impl Controller {
    pub fn new(config: Config) -> Result<Self, ControllerError> {
        info!("Initializing controller");
        config.validate()?;

        let storage = build_storage(&config);

        let api_key = config
            .api_key
            .clone()
            .ok_or(ControllerError::ConfigurationError(ConfigError::MissingApiKey))?;
        let client = FalClient::new(
            api_key,
            config.storage_base_url.clone(),
            config.run_base_url.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
        .map_err(|e| ControllerError::InitializationFailed(e.to_string()))?;
        let client = Arc::new(client);

        let coordinator = DispatchCoordinator::new(
            client.clone(),
            Arc::new(build_model(&client, &config.provider_a)),
            Arc::new(build_model(&client, &config.provider_b)),
            Duration::from_secs(config.provider_timeout_secs),
        );
        debug!(
            "Comparing {} against {}",
            config.provider_a.endpoint, config.provider_b.endpoint
        );

        let web_server = WebServer::new(
            storage.clone(),
            Arc::new(coordinator),
            config.max_upload_bytes,
        );

        Ok(Self {
            config,
            storage,
            web_server,
        })
    }

    pub fn storage(&self) -> Arc<dyn HistoryStorage> {
        self.storage.clone()
    }

    pub async fn run(&mut self) -> Result<(), ControllerError> {
        let addr: SocketAddr = self.config.socket_addr()?;
        info!("Starting web server on {}", addr);
        self.web_server.start(addr).await?;
        info!("Web server stopped");
        Ok(())
    }
}

fn build_storage(config: &Config) -> Arc<dyn HistoryStorage> {
    match config.storage_backend {
        StorageBackend::File => Arc::new(FileHistoryStorage::new(
            &config.storage_path,
            &config.history_file,
        )),
        StorageBackend::Memory => {
            info!("Using in-memory history, nothing will be persisted");
            Arc::new(MemoryHistoryStorage::new())
        }
    }
}

fn build_model(client: &Arc<FalClient>, provider: &ProviderConfig) -> FalModel {
    FalModel::new(
        client.clone(),
        provider.name.clone(),
        provider.endpoint.clone(),
        provider.descriptor_field.clone(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config() -> Config {
        Config {
            api_key: Some("test-key".to_string()),
            storage_backend: StorageBackend::Memory,
            ..Config::default()
        }
    }

    #[test]
    fn test_new_requires_api_key() {
        let result = Controller::new(Config::default());
        assert!(matches!(
            result,
            Err(ControllerError::ConfigurationError(ConfigError::MissingApiKey))
        ));
    }

    #[test]
    fn test_new_with_memory_backend() {
        let controller = Controller::new(config()).unwrap();
        assert!(controller.storage().read_all().unwrap().is_empty());
    }

    #[test]
    fn test_file_backend_uses_configured_location() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            storage_backend: StorageBackend::File,
            storage_path: dir.path().join("data"),
            history_file: "runs.json".to_string(),
            ..config()
        };
        let controller = Controller::new(config).unwrap();
        let storage = controller.storage();
        storage.clear().unwrap();
        assert!(dir.path().join("data").join("runs.json").exists());
    }

    #[tokio::test]
    async fn test_run_fails_on_occupied_port() {
        let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let mut controller = Controller::new(Config {
            bind_address: "127.0.0.1".to_string(),
            port: taken.local_addr().unwrap().port(),
            ..config()
        })
        .unwrap();
        assert!(matches!(
            controller.run().await,
            Err(ControllerError::WebError(WebError::BindFailed(_)))
        ));
    }
}
