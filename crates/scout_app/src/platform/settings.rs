use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use engine_logging::{engine_info, engine_warn};
use scout_core::normalize_queries;
use scout_engine::PipelineConfig;

const CONFIG_FILENAME: &str = "scout.ron";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config {path:?}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("config {path:?} lists no queries")]
    NoQueries { path: PathBuf },
}

/// Config file named by the first argument, `scout.ron` otherwise.
pub(crate) fn config_path(mut args: impl Iterator<Item = String>) -> PathBuf {
    args.next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILENAME))
}

pub(crate) fn load_config(path: &Path) -> Result<PipelineConfig, ConfigError> {
    let mut config = match fs::read_to_string(path) {
        Ok(text) => ron::from_str::<PipelineConfig>(&text).map_err(|err| ConfigError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            engine_warn!("config {:?} not found; using defaults", path);
            PipelineConfig::default()
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    config.queries = normalize_queries(&config.queries, config.region_suffix.as_deref());
    if config.queries.is_empty() {
        return Err(ConfigError::NoQueries {
            path: path.to_path_buf(),
        });
    }
    engine_info!(
        "loaded {} queries from {:?} (continuous: {}, batch size: {})",
        config.queries.len(),
        path,
        config.continuous,
        config.batch_size
    );
    Ok(config)
}
