//! Byte transfer over the shell gateway. Content moves base64-encoded so
//! arbitrary bytes survive shell quoting and binary-unsafe pipes.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::app::error::AppError;
use crate::app::fs::paths::shell_quote;
use crate::app::shell::ShellExecutor;

pub fn pull_bytes<E: ShellExecutor>(
    shell: &E,
    path: &str,
    trace_id: &str,
) -> Result<Vec<u8>, AppError> {
    let output = shell.run(&format!("base64 {}", shell_quote(path)), trace_id)?;
    if !output.success() {
        return Err(AppError::shell(
            format!("Failed to read {path}: {}", output.stderr.trim()),
            trace_id,
        ));
    }
    // The device-side encoder wraps lines.
    let compact: String = output
        .stdout
        .split_whitespace()
        .collect::<Vec<_>>()
        .concat();
    STANDARD.decode(compact.as_bytes()).map_err(|err| {
        AppError::system(format!("Invalid base64 stream from {path}: {err}"), trace_id)
    })
}

pub fn push_bytes<E: ShellExecutor>(
    shell: &E,
    path: &str,
    bytes: &[u8],
    append: bool,
    trace_id: &str,
) -> Result<(), AppError> {
    let encoded = STANDARD.encode(bytes);
    let redirect = if append { ">>" } else { ">" };
    let command = format!(
        "echo '{encoded}' | base64 -d {redirect} {}",
        shell_quote(path)
    );
    let output = shell.run(&command, trace_id)?;
    if !output.success() {
        return Err(AppError::shell(
            format!("Failed to write {path}: {}", output.stderr.trim()),
            trace_id,
        ));
    }
    Ok(())
}
