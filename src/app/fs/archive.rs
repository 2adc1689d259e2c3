//! Zip/unzip for device paths. The archive itself is built and read locally
//! in a scratch directory; file bytes cross the shell gateway base64-encoded.
//! A file that fails to pull or push is skipped so one unreadable entry does
//! not sink the whole archive.

use std::fs::File;
use std::io::{Read, Write};

use tracing::warn;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

use crate::app::error::AppError;
use crate::app::fs::paths::shell_quote;
use crate::app::fs::transfer::{pull_bytes, push_bytes};
use crate::app::fs::{ensure_parent_dir, remote_exists, remote_is_dir};
use crate::app::models::FileOperation;
use crate::app::shell::ShellExecutor;

fn zip_error(err: impl std::fmt::Display, trace_id: &str) -> AppError {
    AppError::system(format!("Zip error: {err}"), trace_id)
}

fn io_error(err: impl std::fmt::Display, trace_id: &str) -> AppError {
    AppError::system(format!("Temp file error: {err}"), trace_id)
}

fn list_remote_files<E: ShellExecutor>(
    shell: &E,
    source: &str,
    trace_id: &str,
) -> Result<Vec<String>, AppError> {
    let output = shell.run(&format!("find {} -type f", shell_quote(source)), trace_id)?;
    Ok(output
        .stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect())
}

pub fn zip_path<E: ShellExecutor>(
    shell: &E,
    source: &str,
    dest: &str,
    trace_id: &str,
) -> Result<FileOperation, AppError> {
    if !remote_exists(shell, "-e", source, trace_id)? {
        return Err(AppError::not_found(
            format!("Source file or directory does not exist: {source}"),
            trace_id,
        ));
    }
    let is_directory = remote_is_dir(shell, source, trace_id)?;
    ensure_parent_dir(shell, dest, trace_id);

    let scratch = tempfile::tempdir().map_err(|err| io_error(err, trace_id))?;
    let bundle_path = scratch.path().join("bundle.zip");
    let file = File::create(&bundle_path).map_err(|err| io_error(err, trace_id))?;
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default();

    if is_directory {
        let base = source.trim_end_matches('/');
        for remote_path in list_remote_files(shell, base, trace_id)? {
            let Some(relative) = remote_path
                .strip_prefix(base)
                .map(|rest| rest.trim_start_matches('/'))
                .filter(|rest| !rest.is_empty())
            else {
                continue;
            };
            let bytes = match pull_bytes(shell, &remote_path, trace_id) {
                Ok(bytes) => bytes,
                Err(err) => {
                    warn!("Skipping {remote_path} while zipping: {err}");
                    continue;
                }
            };
            writer
                .start_file(relative, options)
                .map_err(|err| zip_error(err, trace_id))?;
            writer
                .write_all(&bytes)
                .map_err(|err| zip_error(err, trace_id))?;
        }
    } else {
        let name = source.rsplit('/').next().unwrap_or(source);
        let bytes = pull_bytes(shell, source, trace_id)?;
        writer
            .start_file(name, options)
            .map_err(|err| zip_error(err, trace_id))?;
        writer
            .write_all(&bytes)
            .map_err(|err| zip_error(err, trace_id))?;
    }
    writer.finish().map_err(|err| zip_error(err, trace_id))?;

    let archive_bytes = std::fs::read(&bundle_path).map_err(|err| io_error(err, trace_id))?;
    push_bytes(shell, dest, &archive_bytes, false, trace_id)?;

    Ok(FileOperation::succeeded(
        "zip",
        source,
        format!("Successfully compressed {source} to {dest}"),
    ))
}

pub fn unzip_path<E: ShellExecutor>(
    shell: &E,
    source: &str,
    dest: &str,
    trace_id: &str,
) -> Result<FileOperation, AppError> {
    if !remote_exists(shell, "-f", source, trace_id)? {
        return Err(AppError::not_found(
            format!("Zip file does not exist: {source}"),
            trace_id,
        ));
    }
    let mkdir = shell.run(&format!("mkdir -p {}", shell_quote(dest)), trace_id)?;
    if !mkdir.success() {
        return Err(AppError::shell(
            format!("Failed to create destination directory: {}", mkdir.stderr.trim()),
            trace_id,
        ));
    }

    let scratch = tempfile::tempdir().map_err(|err| io_error(err, trace_id))?;
    let bundle_path = scratch.path().join("bundle.zip");
    let archive_bytes = pull_bytes(shell, source, trace_id)?;
    std::fs::write(&bundle_path, &archive_bytes).map_err(|err| io_error(err, trace_id))?;

    let file = File::open(&bundle_path).map_err(|err| io_error(err, trace_id))?;
    let mut archive = ZipArchive::new(file).map_err(|err| zip_error(err, trace_id))?;
    let dest_base = dest.trim_end_matches('/');

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).map_err(|err| zip_error(err, trace_id))?;
        // Reject entries that would escape the destination (zip slip).
        if entry.enclosed_name().is_none() {
            warn!("Skipping unsafe archive entry {}", entry.name());
            continue;
        }
        let name = entry.name().trim_matches('/').to_string();
        if name.is_empty() {
            continue;
        }
        let target = format!("{dest_base}/{name}");
        if entry.is_dir() {
            let _ = shell.run(&format!("mkdir -p {}", shell_quote(&target)), trace_id);
            continue;
        }
        ensure_parent_dir(shell, &target, trace_id);
        let mut bytes = Vec::new();
        if let Err(err) = entry.read_to_end(&mut bytes) {
            warn!("Skipping corrupt archive entry {name}: {err}");
            continue;
        }
        if let Err(err) = push_bytes(shell, &target, &bytes, false, trace_id) {
            warn!("Failed to extract {name} to {target}: {err}");
        }
    }

    Ok(FileOperation::succeeded(
        "unzip",
        source,
        format!("Successfully extracted {source} to {dest}"),
    ))
}
