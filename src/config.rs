use std::env;
use std::path::PathBuf;

use log::info;

use crate::app_response::AppResponse;

const DEFAULT_STORE_PATH: &str = "order_analytics";
const DEFAULT_MAP_SIZE_MB: usize = 64;
const DEFAULT_MAX_READERS: u32 = 126;

/// Where and how the LMDB environment is opened.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    /// Base name; the environment lives in `<path>.lmdb/`.
    pub path: PathBuf,
    pub map_size: usize,
    pub max_readers: u32,
}

impl StoreConfig {
    pub fn new(name: impl Into<PathBuf>) -> Self {
        StoreConfig {
            path: name.into(),
            map_size: DEFAULT_MAP_SIZE_MB * 1024 * 1024,
            max_readers: DEFAULT_MAX_READERS,
        }
    }

    /// Reads `ORDER_STORE_PATH`, `ORDER_STORE_MAP_SIZE_MB` and
    /// `ORDER_STORE_MAX_READERS`, after loading a `.env` file if one exists.
    pub fn from_env() -> Result<Self, AppResponse> {
        if let Ok(path) = dotenvy::dotenv() {
            info!("Loaded environment from {}", path.display());
        }

        let path = env::var("ORDER_STORE_PATH").unwrap_or_else(|_| DEFAULT_STORE_PATH.to_string());
        let mut config = StoreConfig::new(path);

        if let Some(map_size_mb) = parse_var::<usize>("ORDER_STORE_MAP_SIZE_MB")? {
            config.map_size = map_size_mb.checked_mul(1024 * 1024).ok_or_else(|| {
                AppResponse::ValidationError(format!("ORDER_STORE_MAP_SIZE_MB is too large: {map_size_mb}"))
            })?;
        }
        if let Some(max_readers) = parse_var::<u32>("ORDER_STORE_MAX_READERS")? {
            config.max_readers = max_readers;
        }

        Ok(config)
    }

    /// Directory that holds the LMDB data and lock files.
    pub fn lmdb_dir(&self) -> PathBuf {
        let mut dir = self.path.clone().into_os_string();
        dir.push(".lmdb");
        PathBuf::from(dir)
    }
}

/// Reads a positive integer variable. Unset means `None`; zero is rejected.
fn parse_var<T>(key: &str) -> Result<Option<T>, AppResponse>
where
    T: std::str::FromStr + PartialEq + Default,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .ok()
            .filter(|value| *value != T::default())
            .map(Some)
            .ok_or_else(|| AppResponse::ValidationError(format!("{key} must be a positive number, got {raw:?}"))),
        Err(_) => Ok(None),
    }
}
