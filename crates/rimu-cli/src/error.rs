use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Api(#[from] rimu_api::Error),

    #[error(transparent)]
    Cluster(#[from] rimu_cluster::Error),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read settings from {}: {source}", path.display())]
    Settings {
        path: PathBuf,
        source: dotenvy::Error,
    },

    #[error("{0}")]
    InvalidArgument(String),

    #[error("invalid json in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to render output: {0}")]
    Output(#[source] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
