// Domain Layer - Pure business logic and entities

pub mod context;
pub mod error;
pub mod request;
pub mod result;
pub mod session;

// Re-exports
pub use context::InterpreterContext;
pub use error::DomainError;
pub use request::{ClassifiedRequest, LanguageName, RequestStatus, SessionId, TAG_MARKER};
pub use result::{ExecutionResult, ResultKind};
pub use session::{Session, SessionKey};
