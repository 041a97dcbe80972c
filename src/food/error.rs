use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Search query must not be empty")]
    EmptyQuery,
    #[error("Image payload is empty")]
    EmptyImage,
    #[error("Invalid data URL: {0}")]
    InvalidDataUrl(String),
    #[error("Could not decode image: {0}")]
    ImageDecode(#[from] image::ImageError),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API request failed with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Invalid response from {provider}: {message}")]
    InvalidResponse { provider: String, message: String },
    #[error("{0} is not supported by this provider")]
    Unsupported(&'static str),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Calorie goal must be between 1000 and 5000, got {0}")]
    InvalidGoal(u32),
    #[error("Servings must be positive, got {0}")]
    InvalidServings(f64),
    #[error("Unknown food: {0}")]
    UnknownFood(String),
    #[error("Unknown meal: {0} (expected breakfast, lunch, dinner or snacks)")]
    UnknownMeal(String),
    #[error("Unknown activity level: {0} (expected sedentary, light, moderate or very)")]
    UnknownActivity(String),
    #[error("Invalid import data: {0}")]
    InvalidImport(String),
}

impl ScanError {
    pub fn invalid_response(provider: &str, message: impl Into<String>) -> Self {
        ScanError::InvalidResponse {
            provider: provider.to_string(),
            message: message.into(),
        }
    }

    /// Whether a retry could plausibly succeed. 4xx responses other than 429
    /// are deterministic client errors.
    pub fn is_transient(&self) -> bool {
        match self {
            ScanError::Http(_) => true,
            ScanError::Status { status, .. } => *status == 429 || !(400..500).contains(status),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;
