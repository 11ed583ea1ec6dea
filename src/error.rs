use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Listing already recorded: {external_id}")]
    Duplicate { external_id: String },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Corrupt record: {reason}")]
    Corrupt { reason: String },
}

impl StoreError {
    /// Duplicate inserts mean the listing is already known, not that the store failed.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, StoreError::Duplicate { .. })
    }
}

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Message to {channel} rejected: {reason}")]
    Rejected { channel: String, reason: String },
}

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Malformed listing: {reason}")]
    Parse { reason: String },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration parsing error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: String, reason: String },
}
