use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum CurrexError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Upstream returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("{0}")]
    Auth(String),

    #[error("{0}")]
    Parse(String),

    #[error("Invalid rate: {0}")]
    InvalidRate(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, CurrexError>;

impl ResponseError for CurrexError {
    fn status_code(&self) -> StatusCode {
        match self {
            CurrexError::Auth(_) => StatusCode::UNAUTHORIZED,
            CurrexError::Parse(_) | CurrexError::InvalidRate(_) => StatusCode::BAD_REQUEST,
            CurrexError::NotFound(_) => StatusCode::NOT_FOUND,
            CurrexError::Http(_) | CurrexError::Upstream { .. } => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}
