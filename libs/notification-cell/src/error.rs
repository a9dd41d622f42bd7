use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("Mail transport not configured")]
    NotConfigured,

    #[error("Mail API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Mail transport error: {0}")]
    Transport(#[from] reqwest::Error),
}
