use std::env;
use std::path::PathBuf;

/// Where the permission catalog comes from.
///
/// When `PERMISSION_CATALOG_PATH` is unset the built-in catalog is used.
#[derive(Clone, Debug, Default)]
pub struct CatalogConfig {
    pub path: Option<PathBuf>,
}

impl CatalogConfig {
    pub fn from_env() -> Self {
        let path = env::var("PERMISSION_CATALOG_PATH")
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        Self { path }
    }
}
