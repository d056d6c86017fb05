//! Output formatting for the CLI.
//!
//! Results go to stdout as pretty JSON; errors go to stderr.

use serde::Serialize;

/// Print a value as pretty JSON.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a `{"status": "success", "message": ...}` acknowledgement.
pub fn print_success(message: &str) -> anyhow::Result<()> {
    print_json(&serde_json::json!({
        "status": "success",
        "message": message,
    }))
}

/// Print an error and its causes to stderr.
pub fn print_error(error: &anyhow::Error) {
    eprintln!("Error: {}", error);
    for cause in error.chain().skip(1) {
        eprintln!("  caused by: {}", cause);
    }
}
