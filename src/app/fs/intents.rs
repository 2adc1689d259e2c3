//! Android intent and downloader command construction for the open/share/
//! download operations.

use mime_guess::MimeGuess;

use crate::app::error::AppError;
use crate::app::fs::paths::shell_quote;
use crate::app::shell::ShellExecutor;

pub const FALLBACK_MIME: &str = "application/octet-stream";

/// Asks the device's `file` tool for the MIME type, falling back to an
/// extension guess when the tool is missing or silent.
pub fn resolve_mime_type<E: ShellExecutor>(shell: &E, path: &str, trace_id: &str) -> String {
    if let Ok(output) = shell.run(&format!("file --mime-type -b {}", shell_quote(path)), trace_id) {
        let detected = output.stdout.trim();
        if output.success() && !detected.is_empty() {
            return detected.to_string();
        }
    }
    MimeGuess::from_path(path)
        .first_raw()
        .unwrap_or(FALLBACK_MIME)
        .to_string()
}

/// VIEW intent: open the file with the system default app.
pub fn build_view_command(path: &str, mime_type: &str) -> String {
    format!(
        "am start -a android.intent.action.VIEW -d {} -t {}",
        shell_quote(&format!("file://{path}")),
        shell_quote(mime_type)
    )
}

/// SEND intent: hand the file to the system share sheet.
pub fn build_send_command(path: &str, mime_type: &str, title: &str) -> String {
    format!(
        "am start -a android.intent.action.SEND -t {} \
         --es android.intent.extra.SUBJECT {} \
         --es android.intent.extra.STREAM {} \
         --ez android.intent.extra.STREAM_REFERENCE true",
        shell_quote(mime_type),
        shell_quote(title),
        shell_quote(&format!("file://{path}"))
    )
}

/// Picks the device's available downloader, preferring `wget` over `curl`.
pub fn build_download_command<E: ShellExecutor>(
    shell: &E,
    url: &str,
    dest_path: &str,
    trace_id: &str,
) -> Result<String, AppError> {
    let wget = shell.run("which wget", trace_id)?;
    if wget.success() && !wget.stdout.trim().is_empty() {
        return Ok(format!(
            "wget {} -O {} --no-check-certificate -q",
            shell_quote(url),
            shell_quote(dest_path)
        ));
    }
    let curl = shell.run("which curl", trace_id)?;
    if curl.success() && !curl.stdout.trim().is_empty() {
        return Ok(format!(
            "curl -L {} -o {} -s",
            shell_quote(url),
            shell_quote(dest_path)
        ));
    }
    Err(AppError::dependency(
        "Neither wget nor curl is available on the device",
        trace_id,
    ))
}
