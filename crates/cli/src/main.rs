//! Notebook CLI - Command-line client for the notebook interpreter server

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::io::Read;

const DEFAULT_RPC_URL: &str = "http://127.0.0.1:9528";

#[derive(Parser)]
#[command(name = "notebook")]
#[command(about = "Notebook interpreter CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// RPC server URL
    #[arg(long, env = "NOTEBOOK_RPC_URL", default_value = DEFAULT_RPC_URL)]
    rpc_url: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a `%<language> <code>` request
    Exec {
        /// Tagged code, e.g. '%python print(1+1)'; `-` reads it from stdin
        code: String,

        /// Session to run in (history is replayed before the code)
        #[arg(short, long)]
        session: Option<i64>,
    },

    /// Check that the server is alive
    Status,
}

#[derive(Serialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    method: String,
    params: serde_json::Value,
    id: u64,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    result: Option<serde_json::Value>,
    error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

#[derive(Deserialize)]
struct ExecuteResult {
    kind: String,
    content: String,
}

async fn call_rpc(url: &str, method: &str, params: serde_json::Value) -> Result<serde_json::Value> {
    let request = JsonRpcRequest {
        jsonrpc: "2.0".to_string(),
        method: method.to_string(),
        params,
        id: 1,
    };

    let client = reqwest::Client::new();
    let response: JsonRpcResponse = client
        .post(url)
        .json(&request)
        .send()
        .await
        .context("Failed to connect to server")?
        .json()
        .await
        .context("Failed to parse response")?;

    if let Some(error) = response.error {
        anyhow::bail!("RPC error ({}): {}", error.code, error.message);
    }

    response
        .result
        .ok_or_else(|| anyhow::anyhow!("No result in response"))
}

fn read_code(code: String) -> Result<String> {
    if code != "-" {
        return Ok(code);
    }
    let mut buf = String::new();
    std::io::stdin()
        .read_to_string(&mut buf)
        .context("Failed to read code from stdin")?;
    Ok(buf)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Exec { code, session } => {
            let params = json!({
                "code": read_code(code)?,
                "session_id": session,
            });

            let result = call_rpc(&cli.rpc_url, "notebook.execute.v1", params).await?;
            let result: ExecuteResult =
                serde_json::from_value(result).context("Unexpected execute result")?;

            if result.kind == "error" {
                eprintln!("{}", result.content.red());
                std::process::exit(1);
            }
            if !result.content.is_empty() {
                println!("{}", result.content);
            }
        }

        Commands::Status => match call_rpc(&cli.rpc_url, "notebook.status.v1", json!([])).await {
            Ok(status) => {
                println!("  {} {}", "RPC URL:".bold(), cli.rpc_url);
                println!(
                    "  {} {}",
                    "Status:".bold(),
                    status.as_str().unwrap_or("unknown").green()
                );
            }
            Err(e) => {
                println!("  {} {}", "Status:".bold(), "OFFLINE".red());
                println!("  {} {}", "Error:".bold(), e);
                std::process::exit(1);
            }
        },
    }

    Ok(())
}
