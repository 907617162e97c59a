use layer_publisher_core::notification::RetryExhausted;
use layer_publisher_core::ValidationError;

pub mod failure;
pub mod fetch;
pub mod generate;
pub mod publish;

#[cfg(test)]
mod testing;

#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error(transparent)]
    Core(#[from] layer_publisher_core::Error),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    Adapter(String),

    #[error("failed to publish failure notification: {0}")]
    Notification(#[from] RetryExhausted),
}

impl HandlerError {
    pub fn adapter(message: impl Into<String>) -> Self {
        Self::Adapter(message.into())
    }
}
