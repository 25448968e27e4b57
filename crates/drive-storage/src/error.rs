use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{stage} failed with status {status}: {body}")]
    Status {
        stage: &'static str,
        status: u16,
        body: String,
    },

    #[error("{stage} response is missing '{field}'")]
    MissingField {
        stage: &'static str,
        field: &'static str,
    },

    #[error("Invalid storage configuration: {0}")]
    InvalidConfig(String),
}
