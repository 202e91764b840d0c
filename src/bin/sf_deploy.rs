//! Command line entry point.
//!
//! ```sh
//! # Run one tool call read from stdin
//! echo '{"name": "create_report_folder", "arguments": {"developer_name": "Finance"}}' | sf-deploy
//!
//! sf-deploy list       # enabled tools
//! sf-deploy gen-key    # fresh base64 ENCRYPTION_KEY
//! sf-deploy encrypt    # encrypt credentials JSON from stdin with ENCRYPTION_KEY
//! ```

use std::io::Read;
use std::process::ExitCode;

use busbar_sf_auth::{encrypt_credentials, Credentials, EncryptionKey};
use busbar_sf_deploy::{ServiceConfig, ToolCall, ToolRegistry};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let command = std::env::args().nth(1);
    let result = match command.as_deref() {
        None | Some("call") => call().await,
        Some("list") => list(),
        Some("gen-key") => {
            println!("{}", EncryptionKey::generate().to_base64());
            Ok(ExitCode::SUCCESS)
        }
        Some("encrypt") => encrypt(),
        Some(other) => Err(format!(
            "unknown command '{other}' (expected call, list, gen-key or encrypt)"
        )),
    };

    match result {
        Ok(code) => code,
        Err(message) => {
            eprintln!("Error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn read_stdin() -> Result<String, String> {
    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .map_err(|e| format!("failed to read stdin: {e}"))?;
    Ok(input)
}

fn registry() -> Result<ToolRegistry, String> {
    let config = ServiceConfig::from_env().map_err(|e| e.to_string())?;
    ToolRegistry::from_config(&config).map_err(|e| e.to_string())
}

fn list() -> Result<ExitCode, String> {
    for tool in registry()?.tools() {
        println!("{:<30} {}", tool.name, tool.description);
    }
    Ok(ExitCode::SUCCESS)
}

fn encrypt() -> Result<ExitCode, String> {
    let encoded = std::env::var("ENCRYPTION_KEY")
        .map_err(|_| "ENCRYPTION_KEY is not set".to_string())?;
    let key = EncryptionKey::from_base64(&encoded).map_err(|e| e.to_string())?;
    let credentials = Credentials::from_json(&read_stdin()?).map_err(|e| e.to_string())?;
    credentials.validate().map_err(|e| e.to_string())?;

    println!(
        "{}",
        encrypt_credentials(&credentials, &key).map_err(|e| e.to_string())?
    );
    Ok(ExitCode::SUCCESS)
}

async fn call() -> Result<ExitCode, String> {
    let registry = registry()?;
    let call: ToolCall =
        serde_json::from_str(&read_stdin()?).map_err(|e| format!("invalid tool call: {e}"))?;

    match registry.call(call).await {
        Ok(output) => {
            println!("{}", output.text);
            Ok(if output.is_error {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            })
        }
        Err(err) => Err(err.to_string()),
    }
}
