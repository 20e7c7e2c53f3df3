use std::fmt;

#[derive(Debug)]
pub enum ConfigError {
    IoError(std::io::Error),
    TomlError(String),
    MissingApiKey,
    NotInRange(String),
    InvalidValue(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
            ConfigError::TomlError(e) => write!(f, "TOML parsing error: {}", e),
            ConfigError::MissingApiKey => {
                write!(f, "No provider API key configured (set FAL_KEY or api_key)")
            }
            ConfigError::NotInRange(e) => write!(f, "Value out of range: {}", e),
            ConfigError::InvalidValue(e) => write!(f, "Invalid configuration value: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::IoError(err)
    }
}

/// Rejection raised by the dimension resolver before any network activity.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolveError {
    InvalidDimension(String),
    EmptyVocabulary,
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::InvalidDimension(e) => write!(f, "Invalid dimension: {}", e),
            ResolveError::EmptyVocabulary => write!(f, "Vocabulary has no descriptors"),
        }
    }
}

impl std::error::Error for ResolveError {}

/// Failure reported by an upload or provider collaborator.
///
/// These never escape the dispatch coordinator for provider calls: they are
/// turned into `Outcome::Failure` using the `Display` text as message.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderError {
    Request(String),
    Status(u16, String),
    MalformedResponse(String),
    Timeout,
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::Request(e) => write!(f, "{}", e),
            ProviderError::Status(code, e) if e.is_empty() => {
                write!(f, "Provider returned HTTP {}", code)
            }
            ProviderError::Status(_, e) => write!(f, "{}", e),
            ProviderError::MalformedResponse(e) => write!(f, "Malformed provider response: {}", e),
            ProviderError::Timeout => write!(f, "timeout"),
        }
    }
}

impl std::error::Error for ProviderError {}

#[derive(Debug, Clone, PartialEq)]
pub enum DispatchError {
    InvalidDimension(ResolveError),
    UploadFailed(String),
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::InvalidDimension(e) => write!(f, "{}", e),
            DispatchError::UploadFailed(e) => write!(f, "Upload failed: {}", e),
        }
    }
}

impl std::error::Error for DispatchError {}

impl From<ResolveError> for DispatchError {
    fn from(err: ResolveError) -> Self {
        DispatchError::InvalidDimension(err)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StorageError {
    InvalidHistoryShape(String),
    Unavailable,
    WriteFailed,
    ReadFailed,
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::InvalidHistoryShape(e) => write!(f, "Invalid history shape: {}", e),
            StorageError::Unavailable => write!(f, "Storage unavailable"),
            StorageError::WriteFailed => write!(f, "Storage write failed"),
            StorageError::ReadFailed => write!(f, "Storage read failed"),
        }
    }
}

impl std::error::Error for StorageError {}

#[derive(Debug)]
pub enum WebError {
    BindFailed(String),
}

impl fmt::Display for WebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebError::BindFailed(e) => write!(f, "Web server bind failed: {}", e),
        }
    }
}

impl std::error::Error for WebError {}

#[derive(Debug)]
pub enum ControllerError {
    ConfigurationError(ConfigError),
    WebError(WebError),
    InitializationFailed(String),
}

impl fmt::Display for ControllerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerError::ConfigurationError(e) => write!(f, "Configuration error: {}", e),
            ControllerError::WebError(e) => write!(f, "Web error: {}", e),
            ControllerError::InitializationFailed(e) => write!(f, "Initialization failed: {}", e),
        }
    }
}

impl std::error::Error for ControllerError {}

impl From<ConfigError> for ControllerError {
    fn from(err: ConfigError) -> Self {
        ControllerError::ConfigurationError(err)
    }
}

impl From<WebError> for ControllerError {
    fn from(err: WebError) -> Self {
        ControllerError::WebError(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_messages() {
        assert_eq!(ProviderError::Timeout.to_string(), "timeout");
        assert_eq!(
            ProviderError::Status(422, String::new()).to_string(),
            "Provider returned HTTP 422"
        );
        assert_eq!(
            ProviderError::Status(422, "image too small".into()).to_string(),
            "image too small"
        );
    }

    #[test]
    fn test_controller_error_wraps_startup_failures() {
        let err: ControllerError = ConfigError::MissingApiKey.into();
        assert!(matches!(err, ControllerError::ConfigurationError(ConfigError::MissingApiKey)));
        let err: ControllerError = WebError::BindFailed("0.0.0.0:3001: in use".into()).into();
        assert_eq!(
            err.to_string(),
            "Web error: Web server bind failed: 0.0.0.0:3001: in use"
        );
    }

    #[test]
    fn test_dispatch_error_from_resolve() {
        let err: DispatchError = ResolveError::InvalidDimension("height is 0".into()).into();
        assert_eq!(err.to_string(), "Invalid dimension: height is 0");
    }
}
