// Application constants (no magic values)

/// Property holding the full-match request validation pattern
pub const REQUEST_PATTERN_KEY: &str = "global.request.pattern";

/// `%<letters> <body>`; the body may span several lines
pub const DEFAULT_REQUEST_PATTERN: &str = r"%[A-Za-z]+\s+[\s\S]+";

/// Prefix of every language-scoped property (`interpreter.<lang>.<key>`)
pub const INTERPRETER_PROPERTY_PREFIX: &str = "interpreter";

/// Language-scoped property keys
pub const TIMEOUT_PROPERTY: &str = "timeout";
pub const SEPARATOR_PROPERTY: &str = "separator";

/// Process timeout when none is configured (5s)
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// History fragment separator when none is configured
pub const DEFAULT_SEPARATOR: &str = "|";

/// Flag passed to every command-line interpreter before the code
pub const COMMAND_FLAG: &str = "-c";

/// Suffix of registered handler type names (`PythonHandler`)
pub const HANDLER_SUFFIX: &str = "Handler";

/// Result content prefixes distinguishing execution failures from launch failures
pub const EXECUTION_ERROR_PREFIX: &str = "Error executing command, due to syntax or execution time : ";
pub const LAUNCH_ERROR_PREFIX: &str = "Error executing command, : ";
