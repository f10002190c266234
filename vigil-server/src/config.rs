//! Server configuration module
//!
//! Handles loading configuration from environment variables with sensible defaults.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use vigil_core::PipelineConfig;

/// Server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port (default: 5000)
    pub port: u16,
    /// Server host (default: 127.0.0.1)
    pub host: [u8; 4],
    /// Allowed CORS origins, comma-separated (default: allow all in dev)
    pub allowed_origins: Option<Vec<String>>,
    /// Request body limit in MB (default: 200)
    pub body_limit_mb: usize,
    /// Maximum video size per upload in MB (default: 100)
    pub max_file_size_mb: usize,
    /// Request timeout in seconds (default: 600, training walks the whole dataset)
    pub timeout_secs: u64,
    /// Enable rate limiting (default: false for tests, true when loaded from env)
    pub rate_limit_enabled: bool,
    /// Rate limit: requests per second (default: 10)
    pub rate_limit_per_sec: u64,
    /// Rate limit: burst size (default: 20)
    pub rate_limit_burst: u32,
    /// Directory holding the `drunk/` and `sober/` collections (default: ".")
    pub dataset_root: PathBuf,
    /// Feature cache file (default: features_cache.cbor)
    pub cache_path: PathBuf,
    /// Recognized video extensions, lowercase without the dot (default: mp4)
    pub video_extensions: Vec<String>,
    /// Where uploads are spooled while being classified (default: system temp dir)
    pub upload_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 5000,
            host: [127, 0, 0, 1],
            allowed_origins: None, // None = allow all (dev mode)
            body_limit_mb: 200,
            max_file_size_mb: 100,
            timeout_secs: 600,
            rate_limit_enabled: false, // Disabled by default (for tests)
            rate_limit_per_sec: 10,
            rate_limit_burst: 20,
            dataset_root: PathBuf::from("."),
            cache_path: PathBuf::from("features_cache.cbor"),
            video_extensions: vec!["mp4".to_string()],
            upload_dir: None,
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Split a comma-separated list, dropping blanks.
fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_extensions(raw: &str) -> Vec<String> {
    parse_list(raw)
        .into_iter()
        .map(|e| e.trim_start_matches('.').to_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let host = std::env::var("HOST")
            .ok()
            .and_then(|h| Ipv4Addr::from_str(h.trim()).ok())
            .map(|ip| ip.octets())
            .unwrap_or(defaults.host);

        let allowed_origins = std::env::var("ALLOWED_ORIGINS")
            .ok()
            .map(|origins| parse_list(&origins));

        // Rate limiting enabled by default in production, can be disabled with RATE_LIMIT_ENABLED=false
        let rate_limit_enabled = std::env::var("RATE_LIMIT_ENABLED")
            .map(|v| v.to_lowercase() != "false")
            .unwrap_or(true);

        let video_extensions = std::env::var("VIDEO_EXTENSIONS")
            .ok()
            .map(|v| parse_extensions(&v))
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.video_extensions);

        Self {
            port: env_or("PORT", defaults.port),
            host,
            allowed_origins,
            body_limit_mb: env_or("BODY_LIMIT_MB", defaults.body_limit_mb),
            max_file_size_mb: env_or("MAX_FILE_SIZE_MB", defaults.max_file_size_mb),
            timeout_secs: env_or("REQUEST_TIMEOUT_SECS", defaults.timeout_secs),
            rate_limit_enabled,
            rate_limit_per_sec: env_or("RATE_LIMIT_PER_SEC", defaults.rate_limit_per_sec),
            rate_limit_burst: env_or("RATE_LIMIT_BURST", defaults.rate_limit_burst),
            dataset_root: env_or("DATASET_ROOT", defaults.dataset_root),
            cache_path: env_or("FEATURE_CACHE_PATH", defaults.cache_path),
            video_extensions,
            upload_dir: std::env::var_os("UPLOAD_DIR").map(PathBuf::from),
        }
    }

    /// Get socket address from config
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::from((self.host, self.port))
    }

    /// Maximum accepted upload size in bytes
    pub fn max_file_size(&self) -> usize {
        self.max_file_size_mb * 1024 * 1024
    }

    /// Pipeline settings derived from this configuration
    pub fn pipeline(&self) -> PipelineConfig {
        PipelineConfig {
            video_extensions: self.video_extensions.clone(),
            ..PipelineConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.port, 5000);
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:5000");
        assert_eq!(config.cache_path, PathBuf::from("features_cache.cbor"));
        assert!(!config.rate_limit_enabled);
        assert!(config.upload_dir.is_none());
    }

    #[test]
    fn test_parse_list_drops_blanks() {
        assert_eq!(
            parse_list("http://a.test, ,http://b.test,"),
            vec!["http://a.test", "http://b.test"]
        );
    }

    #[test]
    fn test_parse_extensions_normalizes() {
        assert_eq!(parse_extensions(".MP4, mov,,."), vec!["mp4", "mov"]);
    }

    #[test]
    fn test_pipeline_uses_extensions() {
        let config = Config {
            video_extensions: vec!["mov".into()],
            ..Config::default()
        };
        let pipeline = config.pipeline();
        assert!(pipeline.is_video_extension("MOV"));
        assert!(!pipeline.is_video_extension("mp4"));
    }

    #[test]
    fn test_max_file_size_bytes() {
        let config = Config {
            max_file_size_mb: 2,
            ..Config::default()
        };
        assert_eq!(config.max_file_size(), 2 * 1024 * 1024);
    }
}
