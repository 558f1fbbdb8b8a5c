// Handler Registry - language name -> shared handler instance

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{error, info, warn};

use crate::application::constants::HANDLER_SUFFIX;
use crate::application::handler::{
    HandlerFactory, InterpreterHandler, LanguageSettings, PythonHandler, ShellHandler,
};
use crate::domain::InterpreterContext;
use crate::port::{ConfigSource, ProcessRunner};

/// `python` -> `PythonHandler`
pub fn handler_type_name(language: &str) -> String {
    let mut chars = language.chars();
    match chars.next() {
        Some(first) => format!("{}{}{}", first.to_uppercase(), chars.as_str(), HANDLER_SUFFIX),
        None => HANDLER_SUFFIX.to_string(),
    }
}

/// Resolves languages to handlers through an explicit factory table.
///
/// Instances are created on first use and cached for the process lifetime
/// (one per language, keyed `<language>Handler`). Construction failures are
/// not cached.
pub struct HandlerRegistry {
    factories: HashMap<String, HandlerFactory>,
    instances: Mutex<HashMap<String, Arc<dyn InterpreterHandler>>>,
    runner: Arc<dyn ProcessRunner>,
    config: Arc<dyn ConfigSource>,
}

impl HandlerRegistry {
    /// Empty registry (no factories)
    pub fn new(runner: Arc<dyn ProcessRunner>, config: Arc<dyn ConfigSource>) -> Self {
        Self {
            factories: HashMap::new(),
            instances: Mutex::new(HashMap::new()),
            runner,
            config,
        }
    }

    /// Registry with every built-in handler registered
    pub fn with_builtin_handlers(
        runner: Arc<dyn ProcessRunner>,
        config: Arc<dyn ConfigSource>,
    ) -> Self {
        let mut registry = Self::new(runner, config);
        registry.register("PythonHandler", PythonHandler::create);
        registry.register("ShellHandler", ShellHandler::create);
        registry
    }

    /// Register a factory under its handler type name (`<Capitalized>Handler`)
    pub fn register(&mut self, type_name: impl Into<String>, factory: HandlerFactory) {
        self.factories.insert(type_name.into(), factory);
    }

    /// Cached instance for the context's language, created on first use.
    ///
    /// `None` when no factory matches or construction fails.
    pub fn resolve(&self, context: &InterpreterContext) -> Option<Arc<dyn InterpreterHandler>> {
        let type_name = handler_type_name(&context.name);
        let Some(factory) = self.factories.get(&type_name) else {
            warn!(language = %context.name, handler = %type_name, "No interpreter implementation was found");
            return None;
        };

        let instance_name = format!("{}{}", context.name, HANDLER_SUFFIX);
        // Held across construction so concurrent first calls build one instance
        let mut instances = self.instances.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(handler) = instances.get(&instance_name) {
            info!(language = %context.name, "Reusing cached interpreter instance");
            return Some(Arc::clone(handler));
        }

        info!(language = %context.name, "No cached interpreter instance, creating one");
        match factory(context, Arc::clone(&self.runner)) {
            Ok(handler) => {
                instances.insert(instance_name, Arc::clone(&handler));
                Some(handler)
            }
            Err(e) => {
                error!(language = %context.name, error = %e, "Interpreter construction failed");
                None
            }
        }
    }

    /// Every property under `interpreter.<language>.`, full keys retained
    pub fn config_for(&self, language: &str) -> LanguageSettings {
        let prefix = LanguageSettings::prefix_for(language);
        let properties: BTreeMap<String, String> = self
            .config
            .property_names()
            .into_iter()
            .filter(|key| key.starts_with(&prefix))
            .filter_map(|key| self.config.get_property(&key).map(|value| (key, value)))
            .collect();

        info!(language = %language, count = properties.len(), "Loaded interpreter properties");
        LanguageSettings::new(language, properties)
    }

    pub fn cached_count(&self) -> usize {
        self.instances
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::process_runner::mocks::MockProcessRunner;
    use crate::port::PropertyMap;

    fn registry(props: PropertyMap) -> HandlerRegistry {
        HandlerRegistry::with_builtin_handlers(
            Arc::new(MockProcessRunner::new_success("")),
            Arc::new(props),
        )
    }

    #[test]
    fn test_handler_type_name() {
        assert_eq!(handler_type_name("python"), "PythonHandler");
        assert_eq!(handler_type_name("shell"), "ShellHandler");
        assert_eq!(handler_type_name("Python"), "PythonHandler");
    }

    #[test]
    fn test_resolve_returns_cached_instance() {
        let exe = tempfile::NamedTempFile::new().unwrap();
        let context = InterpreterContext::new("python", exe.path());
        let registry = registry(PropertyMap::new());

        let first = registry.resolve(&context).unwrap();
        let second = registry.resolve(&context).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.language(), "python");
        assert_eq!(registry.cached_count(), 1);
    }

    #[test]
    fn test_unknown_language_is_absent() {
        let exe = tempfile::NamedTempFile::new().unwrap();
        let context = InterpreterContext::new("cobol", exe.path());
        let registry = registry(PropertyMap::new());

        assert!(registry.resolve(&context).is_none());
        assert_eq!(registry.cached_count(), 0);
    }

    #[test]
    fn test_missing_executable_never_resolves() {
        let context = InterpreterContext::new("python", "/no/such/python3");
        let registry = registry(PropertyMap::new());

        for _ in 0..3 {
            assert!(registry.resolve(&context).is_none());
        }
        assert_eq!(registry.cached_count(), 0);
    }

    #[test]
    fn test_config_for_keeps_full_keys() {
        let registry = registry(
            PropertyMap::new()
                .with("interpreter.python.timeout", "1000")
                .with("interpreter.python.separator", ";")
                .with("interpreter.pythonic.timeout", "1")
                .with("interpreter.shell.timeout", "2")
                .with("global.request.pattern", "%.*"),
        );

        let settings = registry.config_for("python");
        assert_eq!(settings.len(), 2);
        assert_eq!(settings.get("interpreter.python.timeout"), Some("1000"));
        assert_eq!(settings.property("separator"), Some(";"));
        assert!(settings.get("interpreter.pythonic.timeout").is_none());
    }
}
