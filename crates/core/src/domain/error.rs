// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid request status transition: {from} -> {to}")]
    InvalidStatusTransition { from: String, to: String },
}

pub type Result<T> = std::result::Result<T, DomainError>;
