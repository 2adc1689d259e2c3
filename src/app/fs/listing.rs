use std::sync::OnceLock;

use chrono::{NaiveDateTime, Utc};
use regex::Regex;
use tracing::debug;

use crate::app::models::FileEntry;

const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Android `toybox ls -la` row:
/// `crwxrw--- 2 u0_a425 media_rw 4056 2025-03-14 06:04 Android`
fn android_line_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(\S+)\s+(\d+)\s+(\S+\s*\S*)\s+(\S+)\s+(\d+)\s+(\d{4}-\d{2}-\d{2})\s+(\d{2}:\d{2})\s+(.+)$",
        )
        .ok()
    })
    .as_ref()
}

/// Looser `ls -l` row for non-Android flavors with free-form date fields.
fn generic_line_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([\-ld][\w-]{9})\s+(\d+)\s+(\w+)\s+(\w+)\s+(\d+)\s+([\w\d\s\-:\.]+)\s+(.+)$")
            .ok()
    })
    .as_ref()
}

fn iso_date_time_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}\s+\d{2}:\d{2}$").ok())
        .as_ref()
}

fn iso_date_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").ok())
        .as_ref()
}

fn parse_timestamp_millis(date_time: &str) -> Option<String> {
    NaiveDateTime::parse_from_str(date_time, DATE_TIME_FORMAT)
        .ok()
        .map(|parsed| parsed.and_utc().timestamp_millis().to_string())
}

/// Symlink rows render as `name -> target`; keep only the name.
fn strip_symlink_target(permissions: &str, name: &mut String) {
    if permissions.starts_with('l') {
        if let Some(index) = name.find(" -> ") {
            name.truncate(index);
        }
    }
}

fn parse_android_line(line: &str) -> Option<FileEntry> {
    let caps = android_line_re()?.captures(line)?;
    let permissions = caps.get(1)?.as_str().to_string();
    let size = caps.get(5)?.as_str().parse::<u64>().unwrap_or(0);
    let date = caps.get(6)?.as_str();
    let time = caps.get(7)?.as_str();
    let mut name = caps.get(8)?.as_str().to_string();

    // Android reports some virtual directories (e.g. /sdcard/Android in
    // certain mount contexts) with a character-device type marker.
    let is_directory = permissions.starts_with('d') || permissions.starts_with('c');
    strip_symlink_target(&permissions, &mut name);

    let last_modified =
        parse_timestamp_millis(&format!("{date} {time}")).unwrap_or_else(|| "0".to_string());

    Some(FileEntry {
        name,
        is_directory,
        size,
        permissions,
        last_modified,
    })
}

fn parse_generic_line(line: &str) -> Option<FileEntry> {
    let caps = generic_line_re()?.captures(line)?;
    let permissions = caps.get(1)?.as_str().to_string();
    let size = caps.get(5)?.as_str().parse::<u64>().unwrap_or(0);
    let date_time = caps.get(6)?.as_str().trim().to_string();
    let mut name = caps.get(7)?.as_str().to_string();

    let is_directory = permissions.starts_with('d');
    strip_symlink_target(&permissions, &mut name);

    // A date field that is not `YYYY-MM-DD HH:MM` (e.g. `Mar 14 06:04`) is
    // approximated with the current time instead of aborting the entry.
    let last_modified = if iso_date_time_re().is_some_and(|re| re.is_match(&date_time)) {
        parse_timestamp_millis(&date_time).unwrap_or_else(|| "0".to_string())
    } else {
        Utc::now().timestamp_millis().to_string()
    };

    Some(FileEntry {
        name,
        is_directory,
        size,
        permissions,
        last_modified,
    })
}

/// Last-resort parse for whitespace-separated rows neither regex accepts.
/// Anchors on the first `YYYY-MM-DD` token: the token after it is the time,
/// everything past the time is the name, the token before it is the size.
fn parse_positional_line(line: &str) -> Option<FileEntry> {
    // Permission field is always 10 characters wide; shorter lines (or lines
    // with a multi-byte character straddling the boundary) are unusable.
    let permissions = line.get(0..10)?.trim().to_string();
    let is_directory = permissions.starts_with('d') || permissions.starts_with('c');

    let parts: Vec<&str> = line.get(10..)?.split_whitespace().collect();
    if parts.len() < 6 {
        return None;
    }

    let date_re = iso_date_re()?;
    let date_index = parts.iter().position(|token| date_re.is_match(token))?;
    let time_index = date_index + 1;
    if time_index >= parts.len() {
        return None;
    }
    let name_start = time_index + 1;
    if name_start >= parts.len() {
        return None;
    }

    // Rejoining with single spaces reconstructs names containing spaces.
    let mut name = parts[name_start..].join(" ");
    strip_symlink_target(&permissions, &mut name);

    let size = if date_index >= 1 {
        parts[date_index - 1].parse::<u64>().unwrap_or(0)
    } else {
        0
    };

    let last_modified =
        parse_timestamp_millis(&format!("{} {}", parts[date_index], parts[time_index]))
            .unwrap_or_else(|| "0".to_string());

    Some(FileEntry {
        name,
        is_directory,
        size,
        permissions,
        last_modified,
    })
}

/// Parses raw `ls -la` output into ordered entries. Never fails: lines no
/// tier accepts are skipped with a diagnostic, `.`/`..` rows are dropped, and
/// the rest come back in listing order. `path` is only used for diagnostics.
pub fn parse_directory_listing(output: &str, path: &str) -> Vec<FileEntry> {
    let trimmed = output.trim();
    let lines: Vec<&str> = trimmed.split('\n').collect();

    // `ls -la` usually opens with a "total NNN" summary row.
    let start_index = usize::from(lines.first().is_some_and(|line| line.starts_with("total")));

    let mut entries = Vec::new();
    for line in &lines[start_index..] {
        if line.trim().is_empty() {
            continue;
        }
        let parsed = parse_android_line(line)
            .or_else(|| parse_generic_line(line))
            .or_else(|| parse_positional_line(line));
        match parsed {
            Some(entry) if entry.name == "." || entry.name == ".." => continue,
            Some(entry) => entries.push(entry),
            None => debug!("Skipping unparseable listing line for {path}: {line}"),
        }
    }
    entries
}

/// Converts a 3-digit octal permission string to the 9-character symbolic
/// form (`"755"` -> `"rwxr-xr-x"`). Returns `"???"` on invalid input.
pub fn octal_to_symbolic(octal_perm: &str) -> String {
    let Ok(bits) = u32::from_str_radix(octal_perm, 8) else {
        return "???".to_string();
    };

    let mut chars = ['-'; 9];
    chars[0] = if bits & 0o400 != 0 { 'r' } else { '-' };
    chars[1] = if bits & 0o200 != 0 { 'w' } else { '-' };
    chars[2] = if bits & 0o100 != 0 { 'x' } else { '-' };
    chars[3] = if bits & 0o40 != 0 { 'r' } else { '-' };
    chars[4] = if bits & 0o20 != 0 { 'w' } else { '-' };
    chars[5] = if bits & 0o10 != 0 { 'x' } else { '-' };
    chars[6] = if bits & 0o4 != 0 { 'r' } else { '-' };
    chars[7] = if bits & 0o2 != 0 { 'w' } else { '-' };
    chars[8] = if bits & 0o1 != 0 { 'x' } else { '-' };
    chars.iter().collect()
}
