//! # Registrar Config
//!
//! Configuration types for the Registrar API.
//!
//! Each structure is loaded from environment variables with `from_env()`:
//!
//! - [`server`]: listen address
//! - [`storage`]: storage backend selection and database pool settings
//! - [`cors`]: CORS (Cross-Origin Resource Sharing) configuration
//! - [`catalog`]: optional permission catalog override
//! - [`observability`]: logging, tracing and metrics settings
//!
//! # Example
//!
//! ```ignore
//! use registrar_config::{CorsConfig, ServerConfig, StorageConfig};
//!
//! let server = ServerConfig::from_env();
//! let storage = StorageConfig::from_env()?;
//! let cors = CorsConfig::from_env();
//! ```

pub mod catalog;
pub mod cors;
pub mod observability;
pub mod server;
pub mod storage;

// Re-export commonly used types at crate root
pub use catalog::CatalogConfig;
pub use cors::CorsConfig;
pub use observability::ObservabilityConfig;
pub use server::ServerConfig;
pub use storage::{StorageBackend, StorageConfig};

/// Interprets common truthy/falsy spellings; anything else yields `default`.
pub fn parse_bool(value: Option<&str>, default: bool) -> bool {
    match value.map(|v| v.trim().to_ascii_lowercase()) {
        Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => true,
        Some(v) if matches!(v.as_str(), "0" | "false" | "no" | "off") => false,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool(Some("true"), false));
        assert!(parse_bool(Some(" YES "), false));
        assert!(!parse_bool(Some("0"), true));
        assert!(!parse_bool(Some("off"), true));
        assert!(parse_bool(None, true));
        assert!(!parse_bool(Some("maybe"), false));
    }
}
