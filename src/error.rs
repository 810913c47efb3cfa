//! Error types for speakeasy

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Contact already exists: {0}")]
    DuplicateContact(String),

    #[error("Contact not found: {0}")]
    ContactNotFound(String),

    #[error("Could not find recipient: {0}")]
    RecipientNotFound(String),

    #[error("Delivery error: {0}")]
    Delivery(String),

    #[error("Config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
