use crate::error::AppError;
use secrecy::{ExposeSecret, Secret};
use std::env;
use subtle::ConstantTimeEq;

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub environment: Environment,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub port: u16,
    /// Externally reachable base URL of this gateway, used to build the
    /// pairing and share URLs handed to second devices.
    pub public_url: String,
    pub cache: CacheConfig,
    pub storage: StorageConfig,
    pub credentials: Credentials,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    Dev,
    Prod,
}

/// Which grant-cache backend to use. `Local` is a single-node in-process
/// map; `Redis` shares state across instances and survives restarts.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheBackend {
    Local,
    Redis,
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    pub redis_url: Option<String>,
    /// TTL for a pairing session that has not been authenticated yet.
    pub pending_ttl_secs: u64,
    /// TTL re-armed when a pairing session is authenticated. Kept separate
    /// from the pending TTL so an authenticated session can outlive the
    /// pairing window if desired.
    pub authenticated_ttl_secs: u64,
    pub share_ttl_secs: u64,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Public object-storage endpoint, also the prefix of issued grant URLs.
    pub endpoint: String,
    pub namespace: String,
    pub bucket: String,
    pub grant_validity_secs: u64,
}

/// The single shared credential pair for the whole gateway. There are no
/// per-user accounts.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: Secret<String>,
}

impl Credentials {
    /// Constant-time comparison of both fields; evaluates both so the
    /// timing does not reveal which one mismatched.
    pub fn matches(&self, username: &str, password: &str) -> bool {
        let user_ok = username.as_bytes().ct_eq(self.username.as_bytes());
        let pass_ok = password
            .as_bytes()
            .ct_eq(self.password.expose_secret().as_bytes());
        bool::from(user_ok & pass_ok)
    }
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let env_str = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string());
        let environment: Environment = env_str
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let is_prod = environment == Environment::Prod;

        let config = GatewayConfig {
            environment,
            service_name: get_env("SERVICE_NAME", Some("mediagate"), is_prod)?,
            service_version: get_env("SERVICE_VERSION", Some(env!("CARGO_PKG_VERSION")), is_prod)?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            port: parse_env("PORT", Some("8080"), is_prod)?,
            public_url: get_env("PUBLIC_URL", Some("http://localhost:8080"), is_prod)?,
            cache: CacheConfig {
                backend: get_env("CACHE_BACKEND", Some("local"), is_prod)?
                    .parse()
                    .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?,
                redis_url: env::var("REDIS_URL").ok(),
                pending_ttl_secs: parse_env("PAIRING_PENDING_TTL_SECS", Some("900"), is_prod)?,
                authenticated_ttl_secs: parse_env(
                    "PAIRING_AUTHENTICATED_TTL_SECS",
                    Some("900"),
                    is_prod,
                )?,
                share_ttl_secs: parse_env("SHARE_TTL_SECS", Some("172800"), is_prod)?,
            },
            storage: StorageConfig {
                endpoint: get_env(
                    "STORAGE_ENDPOINT",
                    Some("https://objectstorage.us-ashburn-1.oraclecloud.com"),
                    is_prod,
                )?,
                namespace: get_env("STORAGE_NAMESPACE", None, is_prod)?,
                bucket: get_env("BUCKET", None, is_prod)?,
                grant_validity_secs: parse_env("GRANT_VALIDITY_SECS", Some("7200"), is_prod)?,
            },
            credentials: Credentials {
                username: get_env("GATEWAY_USERNAME", None, is_prod)?,
                password: Secret::new(get_env("GATEWAY_PASSWORD", None, is_prod)?),
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.port == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "PORT must be greater than 0"
            )));
        }

        if self.cache.backend == CacheBackend::Redis && self.cache.redis_url.is_none() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "REDIS_URL is required when CACHE_BACKEND is 'redis'"
            )));
        }

        if self.cache.pending_ttl_secs == 0
            || self.cache.authenticated_ttl_secs == 0
            || self.cache.share_ttl_secs == 0
        {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "cache TTLs must be positive"
            )));
        }

        if self.storage.grant_validity_secs == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "GRANT_VALIDITY_SECS must be positive"
            )));
        }

        if self.credentials.username.is_empty()
            || self.credentials.password.expose_secret().is_empty()
        {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "GATEWAY_USERNAME and GATEWAY_PASSWORD must be non-empty"
            )));
        }

        Ok(())
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required in production but not set",
                    key
                ))))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required but not set",
                    key
                ))))
            }
        }
    }
}

fn parse_env<T>(key: &str, default: Option<&str>, is_prod: bool) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env(key, default, is_prod)?.parse().map_err(|e: T::Err| {
        AppError::ConfigError(anyhow::anyhow!("{} is not valid: {}", key, e))
    })
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}

impl std::str::FromStr for CacheBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(CacheBackend::Local),
            "redis" => Ok(CacheBackend::Redis),
            _ => Err(format!(
                "Invalid cache backend '{}': must be 'local' or 'redis'",
                s
            )),
        }
    }
}
