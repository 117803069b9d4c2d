//! Command executor for dispatching CLI commands
//!
//! This module runs a parsed command against an open cache and returns the
//! text to print, if any.

use serde_json::Value;

use super::parser::Commands;
use crate::cache::{Cache, CacheResult};

/// Execute a CLI command against `cache`
///
/// Returns the line to print on stdout: the stored value for `get` and
/// `pull`, `true`/`false` for `has`, nothing for the writers.
pub async fn execute_command(command: &Commands, cache: &Cache) -> CacheResult<Option<String>> {
    match command {
        Commands::Set { key, value } => {
            cache.set(key, &parse_value(value)).await?;
            tracing::info!(key = %key, "value stored");
            Ok(None)
        }
        Commands::Add { key, value } => {
            cache.add(key, &parse_value(value)).await?;
            tracing::info!(key = %key, "value added");
            Ok(None)
        }
        Commands::Get { key } => {
            let payload = cache.get(key).await?;
            Ok(Some(render_payload(&payload)))
        }
        Commands::Pull { key } => {
            let payload = cache.pull(key).await?;
            Ok(Some(render_payload(&payload)))
        }
        Commands::Has { key } => Ok(Some(cache.has(key).await.to_string())),
        Commands::Delete { key } => {
            cache.delete(key).await?;
            tracing::info!(key = %key, "key deleted");
            Ok(None)
        }
        Commands::Flush => {
            cache.flush().await?;
            tracing::info!(backend = %cache.kind(), "cache flushed");
            Ok(None)
        }
    }
}

/// Parse a command-line value as JSON, falling back to a JSON string
pub fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Render a stored payload; payloads written by other producers are shown as text
fn render_payload(payload: &[u8]) -> String {
    match serde_json::from_slice::<Value>(payload) {
        Ok(value) => value.to_string(),
        Err(_) => String::from_utf8_lossy(payload).into_owned(),
    }
}
