// Application Layer - Use Cases and Business Logic

pub mod classifier;
pub mod constants;
pub mod handler;
pub mod interpreter_service;
pub mod registry;
pub mod session_lock;

// Re-exports
pub use classifier::{parse_request, RequestClassifier};
pub use handler::{
    HandlerError, HandlerFactory, InterpreterHandler, Interpretation, LanguageSettings,
    PythonHandler, QuoteStyle, ShellHandler,
};
pub use interpreter_service::InterpreterService;
pub use registry::{handler_type_name, HandlerRegistry};
pub use session_lock::{SessionGuard, SessionLocks};
