use thiserror::Error;

/// Failure of a single Bot API call.
#[derive(Error, Debug)]
pub enum DeliveryError {
    /// Transport failure without its request URL, which embeds the token.
    /// Build it through [`DeliveryError::http`].
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    #[error("Bot API error {code}: {description}")]
    Api { code: i32, description: String },

    #[error("Malformed Bot API response: {0}")]
    Decode(String),

    #[error("Client is closed")]
    ClientClosed,
}

impl DeliveryError {
    pub fn http(error: reqwest::Error) -> Self {
        DeliveryError::Http(error.without_url())
    }

    pub fn api(code: Option<i32>, description: Option<String>) -> Self {
        DeliveryError::Api {
            code: code.unwrap_or_default(),
            description: description.unwrap_or_else(|| "unknown error".to_string()),
        }
    }
}
