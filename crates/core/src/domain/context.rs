// Interpreter Context Domain Model

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::domain::request::LanguageName;

/// Per-language configuration bundle: one per supported language.
///
/// Sessions are not embedded here; they live in the session store and
/// reference their context by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterpreterContext {
    pub name: LanguageName,
    pub executable_path: PathBuf,
}

impl InterpreterContext {
    pub fn new(name: impl Into<String>, executable_path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            executable_path: executable_path.into(),
        }
    }

    pub fn executable_path(&self) -> &Path {
        &self.executable_path
    }

    /// Existence check only, executability is not verified
    pub fn has_executable(&self) -> bool {
        self.executable_path.exists()
    }
}
