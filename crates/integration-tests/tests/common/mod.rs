//! Shared wiring: SQLite file store + real subprocess runner

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use notebook_core::application::constants::DEFAULT_REQUEST_PATTERN;
use notebook_core::application::{HandlerRegistry, InterpreterService, RequestClassifier};
use notebook_core::domain::InterpreterContext;
use notebook_core::port::{ContextRepository, PropertyMap};
use notebook_infra_sqlite::{create_pool, run_migrations, SqliteStore};
use notebook_infra_system::SubprocessRunner;

pub const SHELL: &str = "/bin/sh";

pub struct Harness {
    pub dir: tempfile::TempDir,
    pub store: Arc<SqliteStore>,
    pub service: InterpreterService,
}

pub async fn open_store(dir: &Path) -> Arc<SqliteStore> {
    let url = format!("sqlite://{}", dir.join("notebook.db").display());
    let pool = create_pool(&url).await.unwrap();
    run_migrations(&pool).await.unwrap();
    Arc::new(SqliteStore::new(pool))
}

pub fn service(store: Arc<SqliteStore>, properties: PropertyMap) -> InterpreterService {
    let properties = Arc::new(properties);
    let registry = Arc::new(HandlerRegistry::with_builtin_handlers(
        Arc::new(SubprocessRunner::default()),
        properties.clone(),
    ));
    InterpreterService::new(
        store.clone(),
        store,
        registry,
        RequestClassifier::new(Some(DEFAULT_REQUEST_PATTERN)),
    )
}

/// Store with a `shell` context on /bin/sh plus whatever `contexts` adds
pub async fn harness(properties: PropertyMap, contexts: &[InterpreterContext]) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(dir.path()).await;
    ContextRepository::save(store.as_ref(), &InterpreterContext::new("shell", SHELL))
        .await
        .unwrap();
    for context in contexts {
        ContextRepository::save(store.as_ref(), context).await.unwrap();
    }
    let service = service(store.clone(), properties);
    Harness {
        dir,
        store,
        service,
    }
}

/// First python interpreter found on this machine
pub fn find_python() -> Option<&'static str> {
    ["/usr/bin/python3", "/usr/local/bin/python3", "/bin/python3"]
        .into_iter()
        .find(|p| Path::new(p).exists())
}
