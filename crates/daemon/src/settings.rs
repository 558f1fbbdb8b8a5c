//! Layered server configuration
//!
//! Defaults, then an optional TOML file, then `NOTEBOOK__*` environment
//! variables. Everything is flattened into dotted property keys for the core.

use anyhow::{Context, Result};
use ::config::{Config, Environment, File, FileFormat, Map, Source, Value};
use std::path::PathBuf;
use tracing::{debug, warn};

use notebook_api_rpc::server::{DEFAULT_RPC_HOST, DEFAULT_RPC_PORT};
use notebook_api_rpc::RpcServerConfig;
use notebook_core::application::constants::{DEFAULT_REQUEST_PATTERN, REQUEST_PATTERN_KEY};
use notebook_core::domain::{InterpreterContext, SessionId};
use notebook_core::port::{ConfigSource, PropertyMap};

pub const CONFIG_PATH_ENV: &str = "NOTEBOOK_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "~/.notebook/notebook.toml";
const ENV_PREFIX: &str = "NOTEBOOK";
const ENV_SEPARATOR: &str = "__";

const DEFAULT_INTERPRETER_NAME_KEY: &str = "default.interpreter.name";
const DEFAULT_INTERPRETER_PATH_KEY: &str = "default.interpreter.path";
const DEFAULT_SESSION_KEY: &str = "default.session.id";
const SERVER_HOST_KEY: &str = "server.host";
const SERVER_PORT_KEY: &str = "server.port";
const DATABASE_URL_KEY: &str = "database.url";
/// `interpreters.<name> = <path>` registers extra contexts
const INTERPRETERS_PREFIX: &str = "interpreters.";

const DEFAULT_INTERPRETER_NAME: &str = "python";
const DEFAULT_INTERPRETER_PATH: &str = "/usr/bin/python3";
const DEFAULT_SESSION_ID: i64 = 321;
const DEFAULT_DATABASE_PATH: &str = "~/.notebook/notebook.db";
/// `database.url` value selecting the in-memory store
pub const MEMORY_DATABASE: &str = "memory";

/// Where sessions and contexts live
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Storage {
    Memory,
    Sqlite { url: String, path: Option<PathBuf> },
}

/// Typed view over the flattened properties
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub properties: PropertyMap,
    pub rpc: RpcServerConfig,
    pub storage: Storage,
    pub default_context: InterpreterContext,
    pub default_session: Option<SessionId>,
    pub extra_contexts: Vec<InterpreterContext>,
}

impl ServerConfig {
    /// Load from `$NOTEBOOK_CONFIG` (or the default path) and the environment
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
        let path = shellexpand::tilde(&path).into_owned();
        debug!(path = %path, "Loading configuration");

        let properties = load_properties(Some(&path))?;
        Self::from_properties(properties)
    }

    pub fn from_properties(properties: PropertyMap) -> Result<Self> {
        let host = properties
            .get(SERVER_HOST_KEY)
            .unwrap_or(DEFAULT_RPC_HOST)
            .to_string();
        let port = match properties.get(SERVER_PORT_KEY) {
            Some(raw) => raw
                .parse::<u16>()
                .with_context(|| format!("Invalid {}: '{}'", SERVER_PORT_KEY, raw))?,
            None => DEFAULT_RPC_PORT,
        };

        let default_context = InterpreterContext::new(
            properties
                .get(DEFAULT_INTERPRETER_NAME_KEY)
                .unwrap_or(DEFAULT_INTERPRETER_NAME),
            expand(
                properties
                    .get(DEFAULT_INTERPRETER_PATH_KEY)
                    .unwrap_or(DEFAULT_INTERPRETER_PATH),
            ),
        );

        let default_session = match properties.get(DEFAULT_SESSION_KEY) {
            Some("") => None,
            Some(raw) => Some(
                raw.parse::<SessionId>()
                    .with_context(|| format!("Invalid {}: '{}'", DEFAULT_SESSION_KEY, raw))?,
            ),
            None => Some(DEFAULT_SESSION_ID),
        };

        let extra_contexts = properties
            .property_names()
            .into_iter()
            .filter_map(|key| {
                let name = key.strip_prefix(INTERPRETERS_PREFIX)?.to_string();
                let path = properties.get(&key)?;
                Some(InterpreterContext::new(name, expand(path)))
            })
            .collect();

        let storage = storage_for(properties.get(DATABASE_URL_KEY).unwrap_or(DEFAULT_DATABASE_PATH));

        Ok(Self {
            rpc: RpcServerConfig { host, port },
            storage,
            default_context,
            default_session,
            extra_contexts,
            properties,
        })
    }

    /// Every context bootstrap should make sure exists
    pub fn contexts(&self) -> Vec<InterpreterContext> {
        let mut contexts = vec![self.default_context.clone()];
        contexts.extend(
            self.extra_contexts
                .iter()
                .filter(|c| c.name != self.default_context.name)
                .cloned(),
        );
        contexts
    }
}

/// Build the layered configuration and flatten it
pub fn load_properties(path: Option<&str>) -> Result<PropertyMap> {
    let mut builder = Config::builder()
        .set_default(REQUEST_PATTERN_KEY, DEFAULT_REQUEST_PATTERN)?
        .set_default(DEFAULT_INTERPRETER_NAME_KEY, DEFAULT_INTERPRETER_NAME)?
        .set_default(DEFAULT_INTERPRETER_PATH_KEY, DEFAULT_INTERPRETER_PATH)?
        .set_default(SERVER_HOST_KEY, DEFAULT_RPC_HOST)?
        .set_default(SERVER_PORT_KEY, i64::from(DEFAULT_RPC_PORT))?
        .set_default(DATABASE_URL_KEY, DEFAULT_DATABASE_PATH)?;

    if let Some(path) = path {
        builder = builder.add_source(File::new(path, FileFormat::Toml).required(false));
    }

    let settings = builder
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator(ENV_SEPARATOR)
                .separator(ENV_SEPARATOR),
        )
        .build()
        .context("Failed to build configuration")?;

    let table = settings
        .collect()
        .context("Failed to read configuration table")?;

    let mut properties = PropertyMap::new();
    flatten("", table, &mut properties);
    Ok(properties)
}

/// Nested tables become dotted keys; scalars are kept as strings
fn flatten(prefix: &str, table: Map<String, Value>, out: &mut PropertyMap) {
    for (key, value) in table {
        let full_key = if prefix.is_empty() {
            key
        } else {
            format!("{}.{}", prefix, key)
        };

        match value.clone().into_table() {
            Ok(nested) => flatten(&full_key, nested, out),
            Err(_) => match value.into_string() {
                Ok(scalar) => out.insert(full_key, scalar),
                Err(e) => warn!(key = %full_key, error = %e, "Skipping non-scalar property"),
            },
        }
    }
}

fn expand(path: &str) -> String {
    shellexpand::tilde(path).into_owned()
}

fn storage_for(raw: &str) -> Storage {
    if raw == MEMORY_DATABASE {
        return Storage::Memory;
    }
    if raw.starts_with("sqlite:") {
        return Storage::Sqlite {
            url: raw.to_string(),
            path: None,
        };
    }
    let path = PathBuf::from(expand(raw));
    Storage::Sqlite {
        url: format!("sqlite://{}", path.display()),
        path: Some(path),
    }
}
