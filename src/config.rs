use std::env;

pub const DEFAULT_TRACKED_ACCESS_PREFIX: &str = "tracked_accesses";

/// Where tracked accesses are persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Redis,
    Memory,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub frontend_url: String,
    pub store_backend: StoreBackend,
    pub redis_url: String,
    pub tracked_access_prefix: String,
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub smtp_timeout_seconds: u64,
    pub sender_display_name: Option<String>,
    pub tracked_file_path: String,
    pub max_attachment_bytes: usize,
    pub trust_proxy: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let frontend_url = env::var("FRONTEND_URL")
            .unwrap_or_else(|_| "https://mailcannon.vercel.app".to_string());
        if axum::http::HeaderValue::from_str(&frontend_url).is_err() {
            return Err(ConfigError::InvalidFrontendUrl(frontend_url));
        }

        let store_backend = match env::var("STORE_BACKEND")
            .unwrap_or_else(|_| "redis".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "redis" => StoreBackend::Redis,
            "memory" => StoreBackend::Memory,
            other => return Err(ConfigError::InvalidStoreBackend(other.to_string())),
        };

        let tracked_access_prefix = match env::var("TRACKED_ACCESS_PREFIX") {
            Ok(prefix) if !prefix.trim().is_empty() => prefix.trim().to_string(),
            _ => {
                tracing::warn!(
                    "TRACKED_ACCESS_PREFIX is not set or is empty, defaulting to '{}'",
                    DEFAULT_TRACKED_ACCESS_PREFIX
                );
                DEFAULT_TRACKED_ACCESS_PREFIX.to_string()
            }
        };

        Ok(Config {
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("BACKEND_PORT")
                .unwrap_or_else(|_| "7000".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidPort)?,
            frontend_url,
            store_backend,
            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            tracked_access_prefix,
            smtp_host: env::var("SMTP_HOST")
                .ok()
                .map(|h| h.trim().to_string())
                .filter(|h| !h.is_empty()),
            smtp_port: env::var("SMTP_PORT")
                .unwrap_or_else(|_| "587".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidSmtpPort)?,
            smtp_timeout_seconds: env::var("SMTP_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| "15".to_string())
                .parse()
                .unwrap_or(15),
            sender_display_name: env::var("SENDER_DISPLAY_NAME")
                .ok()
                .filter(|n| !n.trim().is_empty()),
            tracked_file_path: env::var("TRACKED_FILE_PATH")
                .unwrap_or_else(|_| "public/trackable/document.txt".to_string()),
            max_attachment_bytes: env::var("MAX_ATTACHMENT_BYTES")
                .unwrap_or_else(|_| "10485760".to_string())
                .parse()
                .unwrap_or(10 * 1024 * 1024),
            trust_proxy: env::var("TRUST_PROXY")
                .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
        })
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    /// Port 465 is the implicit-TLS submission port
    pub fn smtp_implicit_tls(&self) -> bool {
        self.smtp_port == 465
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid server port")]
    InvalidPort,
    #[error("Invalid SMTP port")]
    InvalidSmtpPort,
    #[error("FRONTEND_URL is not a valid origin: {0}")]
    InvalidFrontendUrl(String),
    #[error("Unknown STORE_BACKEND '{0}' (expected 'redis' or 'memory')")]
    InvalidStoreBackend(String),
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        server_host: "localhost".to_string(),
        server_port: 7000,
        frontend_url: "http://localhost:3000".to_string(),
        store_backend: StoreBackend::Memory,
        redis_url: "redis://localhost".to_string(),
        tracked_access_prefix: DEFAULT_TRACKED_ACCESS_PREFIX.to_string(),
        smtp_host: Some("smtp.example.com".to_string()),
        smtp_port: 587,
        smtp_timeout_seconds: 15,
        sender_display_name: None,
        tracked_file_path: "public/trackable/document.txt".to_string(),
        max_attachment_bytes: 10 * 1024 * 1024,
        trust_proxy: false,
    }
}
