//! Remote command execution seam

use anyhow::Result;
use std::process::Output;

/// Executes commands and file operations on one machine.
///
/// Every call is blocking and sudo-transparent: implementations run the
/// command with root privileges whatever user they connect as.
pub trait Runner: Send + Sync {
    /// Run a shell command, discarding its output
    fn run(&self, command: &str) -> Result<()>;

    /// Run a shell command and return its stdout
    fn run_out(&self, command: &str) -> Result<Vec<u8>>;

    /// Write a file, creating parent directories as needed
    fn write_file(&self, path: &str, content: &[u8]) -> Result<()>;

    /// Remove a file; a missing file is not an error
    fn remove_file(&self, path: &str) -> Result<()>;

    /// Check if a regular file exists
    fn file_exists(&self, path: &str) -> Result<bool>;
}

/// Escape a string for safe use in shell commands
pub fn shell_escape(s: &str) -> String {
    if s.is_empty() {
        return "''".to_string();
    }

    if s.chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '/' || c == '.')
    {
        return s.to_string();
    }

    // End the quote, add an escaped quote, start a new quote
    let escaped = s.replace('\'', "'\"'\"'");
    format!("'{}'", escaped)
}

/// Turn a finished process into stdout, or an error carrying its stderr
pub fn check_output(output: Output, what: &str) -> Result<Vec<u8>> {
    if output.status.success() {
        return Ok(output.stdout);
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    anyhow::bail!(
        "{} failed with exit code {}: {}",
        what,
        output
            .status
            .code()
            .map(|c| c.to_string())
            .unwrap_or_else(|| "signal".to_string()),
        stderr.trim()
    )
}
