//! Gateway configuration.

use std::path::PathBuf;

use clap::Parser;
use quill_core::StorageConfig;

/// Quill HTTP gateway command line arguments.
#[derive(Debug, Parser)]
#[command(name = "quill-gateway")]
#[command(about = "HTTP/JSON gateway for the Quill CMS schema")]
pub struct Args {
    /// Address to listen on for HTTP requests.
    #[arg(short, long, default_value = "0.0.0.0:8080")]
    pub listen: String,

    /// Directory holding the data store.
    #[arg(short, long, default_value = "./quill_data")]
    pub data_dir: PathBuf,

    /// Use a temporary store that is discarded on exit.
    #[arg(long)]
    pub temporary: bool,

    /// Store page cache capacity in megabytes.
    #[arg(long, default_value_t = 256)]
    pub cache_capacity_mb: u64,

    /// Flush interval (ms). Zero flushes on every write.
    #[arg(long, default_value_t = 1000)]
    pub flush_every_ms: u64,

    /// Path prefix under which entity routes are mounted.
    #[arg(long, default_value = "/api")]
    pub api_prefix: String,
}

/// Gateway configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Address to listen on for HTTP requests.
    pub listen_addr: String,
    /// Directory holding the data store.
    pub data_dir: PathBuf,
    /// Whether the store is temporary.
    pub temporary: bool,
    /// Store page cache capacity in bytes.
    pub cache_capacity: u64,
    /// Flush interval. None flushes on every write.
    pub flush_every_ms: Option<u64>,
    /// Path prefix for entity and schema routes, without a trailing slash.
    pub api_prefix: String,
}

impl GatewayConfig {
    /// Storage configuration for the data store.
    pub fn storage_config(&self) -> StorageConfig {
        let config = if self.temporary {
            StorageConfig::temporary()
        } else {
            StorageConfig::new(&self.data_dir)
        };
        config
            .with_cache_capacity(self.cache_capacity)
            .with_flush_every_ms(self.flush_every_ms)
    }

    /// Join a path onto the API prefix.
    pub fn api_path(&self, path: &str) -> String {
        format!("{}/{}", self.api_prefix, path.trim_start_matches('/'))
    }
}

impl From<&Args> for GatewayConfig {
    fn from(args: &Args) -> Self {
        Self {
            listen_addr: args.listen.clone(),
            data_dir: args.data_dir.clone(),
            temporary: args.temporary,
            cache_capacity: args.cache_capacity_mb * 1024 * 1024,
            flush_every_ms: (args.flush_every_ms > 0).then_some(args.flush_every_ms),
            api_prefix: normalize_prefix(&args.api_prefix),
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            data_dir: PathBuf::from("./quill_data"),
            temporary: false,
            cache_capacity: 256 * 1024 * 1024,
            flush_every_ms: Some(1000),
            api_prefix: "/api".to_string(),
        }
    }
}

fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_to_config() {
        let args = Args::parse_from([
            "quill-gateway",
            "--temporary",
            "--api-prefix",
            "v1/",
            "--flush-every-ms",
            "0",
        ]);
        let config = GatewayConfig::from(&args);

        assert!(config.temporary);
        assert_eq!(config.api_prefix, "/v1");
        assert!(config.flush_every_ms.is_none());
        assert_eq!(config.cache_capacity, 256 * 1024 * 1024);
        assert!(config.storage_config().temporary);
    }

    #[test]
    fn test_api_path() {
        let config = GatewayConfig::default();
        assert_eq!(config.api_path("posts"), "/api/posts");
        assert_eq!(config.api_path("/schema"), "/api/schema");
    }

    #[test]
    fn test_empty_prefix() {
        assert_eq!(normalize_prefix("/"), "");
        assert_eq!(normalize_prefix("api"), "/api");
    }
}
