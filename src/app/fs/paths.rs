/// System prefixes that delete/move must never touch.
pub const RESTRICTED_PREFIXES: [&str; 4] = ["/system", "/data", "/proc", "/dev"];

pub fn validate_device_path(path: &str) -> Result<(), String> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return Err("path is required".to_string());
    }
    if !trimmed.starts_with('/') {
        return Err("path must be an absolute device path starting with '/'".to_string());
    }
    if trimmed.contains('\0') {
        return Err("path contains invalid characters".to_string());
    }
    if trimmed == "/" {
        return Err("path must not be root".to_string());
    }
    for segment in trimmed.split('/') {
        if segment == ".." {
            return Err("path must not contain '..' segments".to_string());
        }
    }
    Ok(())
}

pub fn is_restricted(path: &str) -> bool {
    RESTRICTED_PREFIXES
        .iter()
        .any(|prefix| path.starts_with(prefix))
}

pub fn device_parent_dir(device_path: &str) -> String {
    let trimmed = device_path.trim();
    if trimmed.is_empty() || trimmed == "/" {
        return "/".to_string();
    }
    let mut path = trimmed.trim_end_matches('/').to_string();
    if path.is_empty() {
        return "/".to_string();
    }
    match path.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(index) => {
            path.truncate(index);
            if path.is_empty() {
                "/".to_string()
            } else {
                path
            }
        }
    }
}

/// Directory paths are listed with a trailing slash so symlinked directories
/// resolve to their contents.
pub fn normalize_dir_path(path: &str) -> String {
    if path.ends_with('/') {
        path.to_string()
    } else {
        format!("{path}/")
    }
}

/// Wraps a value in single quotes for a POSIX shell, escaping embedded
/// single quotes with the `'\''` dance.
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "'\\''"))
}
