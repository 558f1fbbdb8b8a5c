//! RPC Method Handlers
//!
//! Thin adapters from JSON-RPC params to the interpreter service.

use crate::types::{ExecuteRequest, ExecuteResponse};
use jsonrpsee::types::ErrorObjectOwned;
use notebook_core::application::InterpreterService;
use std::sync::Arc;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

/// Liveness answer of notebook.status.v1
pub const STATUS_ALIVE: &str = "Alive!";

/// RPC Handler with injected dependencies
pub struct RpcHandler {
    service: Arc<InterpreterService>,
}

impl RpcHandler {
    pub fn new(service: Arc<InterpreterService>) -> Self {
        Self { service }
    }

    /// notebook.status.v1
    pub async fn status(&self) -> Result<String, ErrorObjectOwned> {
        Ok(STATUS_ALIVE.to_string())
    }

    /// notebook.execute.v1
    ///
    /// Interpretation failures are results of kind `error`, never RPC errors.
    pub async fn execute(
        &self,
        params: ExecuteRequest,
    ) -> Result<ExecuteResponse, ErrorObjectOwned> {
        let request_id = Uuid::new_v4();
        let span = info_span!("rpc.execute", request_id = %request_id);

        async move {
            info!("Received execution request");
            let session_field = params.session_field();
            let result = self
                .service
                .execute(&params.code, session_field.as_deref())
                .await;
            info!(kind = %result.kind, "Execution request answered");
            Ok(result.into())
        }
        .instrument(span)
        .await
    }
}
