//! Worker configuration with layered loading.
//!
//! Configuration is loaded once at startup with figment and is immutable
//! afterwards:
//!
//! 1. Environment variables (SWCACHE_*)
//! 2. TOML config file (if SWCACHE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::http::{self, Request};
use crate::policy::StaticManifest;

mod validation;

pub use validation::ConfigError;

/// Static assets cached at install time.
///
/// Changing this list requires bumping `cache_version`; otherwise stale
/// entries stay in the static partition until the next bump.
pub const DEFAULT_STATIC_ASSETS: &[&str] = &[
    "/",
    "/index.html",
    "/css/styles.css",
    "/js/script.js",
    "https://cdnjs.cloudflare.com/ajax/libs/Chart.js/3.9.1/chart.min.js",
];

/// Worker configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SWCACHE_*)
/// 2. TOML config file (if SWCACHE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Application name used as the partition name prefix.
    ///
    /// Set via SWCACHE_APP_NAME environment variable.
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// Cache version embedded in both partition names.
    ///
    /// Set via SWCACHE_CACHE_VERSION environment variable.
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// Origin of the application; root-relative URLs resolve against it.
    ///
    /// Set via SWCACHE_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Ordered static asset list, root-relative or absolute.
    #[serde(default = "default_static_assets")]
    pub static_assets: Vec<String>,

    /// Path prefix of requests that always go live to the network.
    ///
    /// Set via SWCACHE_API_PREFIX environment variable.
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,

    /// Path to the SQLite cache storage.
    ///
    /// Set via SWCACHE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for network requests.
    ///
    /// Set via SWCACHE_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Optional network timeout in milliseconds. Unset means a hung fetch
    /// hangs the response.
    ///
    /// Set via SWCACHE_TIMEOUT_MS environment variable.
    #[serde(default)]
    pub timeout_ms: Option<u64>,

    /// Maximum number of redirects to follow.
    ///
    /// Set via SWCACHE_MAX_REDIRECTS environment variable.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
}

fn default_app_name() -> String {
    "moodify".into()
}

fn default_cache_version() -> String {
    "v1.0.0".into()
}

fn default_origin() -> String {
    "http://localhost:8080".into()
}

fn default_static_assets() -> Vec<String> {
    DEFAULT_STATIC_ASSETS.iter().map(|s| s.to_string()).collect()
}

fn default_api_prefix() -> String {
    "/api/".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./swcache.sqlite")
}

fn default_user_agent() -> String {
    "swcache/0.1".into()
}

fn default_max_redirects() -> usize {
    5
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
            cache_version: default_cache_version(),
            origin: default_origin(),
            static_assets: default_static_assets(),
            api_prefix: default_api_prefix(),
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            timeout_ms: None,
            max_redirects: default_max_redirects(),
        }
    }
}

impl WorkerConfig {
    /// Load configuration from all sources with layered precedence.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file or environment cannot be parsed,
    /// or if validation fails after loading.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(Self::figment())
    }

    fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("SWCACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment.merge(
            Env::prefixed("SWCACHE_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        )
    }

    fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Name of the static partition for this version.
    pub fn static_cache_name(&self) -> String {
        format!("{}-static-{}", self.app_name, self.cache_version)
    }

    /// Name of the dynamic partition for this version.
    pub fn dynamic_cache_name(&self) -> String {
        format!("{}-dynamic-{}", self.app_name, self.cache_version)
    }

    /// Whether a partition name belongs to the current version.
    pub fn is_current_partition(&self, name: &str) -> bool {
        name == self.static_cache_name() || name == self.dynamic_cache_name()
    }

    /// Network timeout, if one is configured.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Parsed application origin.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if `origin` is not an absolute http(s) URL.
    pub fn origin_url(&self) -> Result<Url, ConfigError> {
        http::parse_origin(&self.origin)
            .map_err(|e| ConfigError::Invalid { field: "origin".into(), reason: e.to_string() })
    }

    /// Resolve a root-relative or absolute URL against the origin.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the origin or the input is invalid.
    pub fn resolve(&self, input: &str) -> Result<Url, ConfigError> {
        let origin = self.origin_url()?;
        http::resolve(&origin, input)
            .map_err(|e| ConfigError::Invalid { field: "url".into(), reason: format!("{input}: {e}") })
    }

    /// The static asset list used for routing decisions, built from the same
    /// resolved URLs install fetches.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the origin or any entry cannot be resolved.
    pub fn manifest(&self) -> Result<StaticManifest, ConfigError> {
        let origin = self.origin_url()?;
        let requests = self.static_requests()?;
        Ok(StaticManifest::new(&origin, requests.into_iter().map(|r| r.url)))
    }

    /// GET requests for every static asset, in list order.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if any entry cannot be resolved.
    pub fn static_requests(&self) -> Result<Vec<Request>, ConfigError> {
        self.static_assets.iter().map(|asset| self.resolve(asset).map(Request::get)).collect()
    }

    /// GET request for the application root document (the offline page).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the origin is invalid.
    pub fn root_request(&self) -> Result<Request, ConfigError> {
        self.resolve("/").map(Request::get)
    }
}
