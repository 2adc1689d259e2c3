use std::path::Path;

/// Resolves the configured adb program: trims whitespace and one matching
/// pair of wrapping quotes, and falls back to `adb` on PATH when the setting
/// is blank.
pub fn resolve_adb_program(configured: &str) -> String {
    let mut candidate = configured.trim();
    for quote in ['"', '\''] {
        if let Some(inner) = candidate
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            candidate = inner.trim();
        }
    }
    if candidate.is_empty() {
        "adb".to_string()
    } else {
        candidate.to_string()
    }
}

pub fn validate_adb_program(program: &str) -> Result<(), String> {
    let program = program.trim();
    if program.is_empty() {
        return Err("adb command is not configured".to_string());
    }
    // A bare command name is resolved through PATH at spawn time.
    if !program.contains('/') && !program.contains('\\') {
        return Ok(());
    }
    let path = Path::new(program);
    if !path.exists() {
        return Err(format!("adb executable not found at {program}"));
    }
    if path.is_dir() {
        return Err(format!("{program} is a directory, not an executable"));
    }
    Ok(())
}
