use thiserror::Error;

#[derive(Debug, Error)]
pub enum OverlayError {
    #[error("Surface I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, OverlayError>;
