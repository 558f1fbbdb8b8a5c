//! JSON-RPC API Layer
//!
//! Exposes the interpreter service as a JSON-RPC 2.0 server.

pub mod handler;
pub mod server;
pub mod types;

pub use server::{RpcServer, RpcServerConfig};
