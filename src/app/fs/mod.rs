pub mod archive;
pub mod intents;
pub mod listing;
pub mod paths;
pub mod transfer;

#[cfg(test)]
mod tests;

use tracing::{info, warn};

use crate::app::error::AppError;
use crate::app::models::{
    DirectoryListing, FileContent, FileExists, FileInfo, FileOperation, FindFilesResult,
};
use crate::app::shell::{ShellExecutor, ShellOutput};

use listing::parse_directory_listing;
use paths::{
    device_parent_dir, is_restricted, normalize_dir_path, shell_quote, validate_device_path,
};

pub const DEFAULT_MAX_READ_SIZE_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    pub use_path_pattern: bool,
    pub case_insensitive: bool,
    pub max_depth: Option<u32>,
}

/// File management operations over a device shell. Every operation validates
/// its paths first, issues shell commands through the injected executor, and
/// verifies the outcome before reporting success.
pub struct FileTools<E: ShellExecutor> {
    shell: E,
    max_read_size_bytes: u64,
}

pub(crate) fn remote_exists<E: ShellExecutor>(
    shell: &E,
    test_flag: &str,
    path: &str,
    trace_id: &str,
) -> Result<bool, AppError> {
    let command = format!(
        "test {test_flag} {} && echo 'exists' || echo 'not exists'",
        shell_quote(path)
    );
    let output = shell.run(&command, trace_id)?;
    Ok(output.success() && output.stdout.trim() == "exists")
}

pub(crate) fn remote_is_dir<E: ShellExecutor>(
    shell: &E,
    path: &str,
    trace_id: &str,
) -> Result<bool, AppError> {
    let command = format!(
        "test -d {} && echo 'true' || echo 'false'",
        shell_quote(path)
    );
    let output = shell.run(&command, trace_id)?;
    Ok(output.success() && output.stdout.trim() == "true")
}

pub(crate) fn remote_size<E: ShellExecutor>(
    shell: &E,
    path: &str,
    trace_id: &str,
) -> Result<u64, AppError> {
    let command = format!("stat -c %s {} 2>/dev/null || echo '0'", shell_quote(path));
    let output = shell.run(&command, trace_id)?;
    Ok(output.stdout.trim().parse::<u64>().unwrap_or(0))
}

/// Best-effort parent creation; a failure is logged and surfaced by the
/// verification step of the calling operation instead.
pub(crate) fn ensure_parent_dir<E: ShellExecutor>(shell: &E, path: &str, trace_id: &str) {
    let parent = device_parent_dir(path);
    if parent == "/" {
        return;
    }
    match shell.run(&format!("mkdir -p {}", shell_quote(&parent)), trace_id) {
        Ok(output) if !output.success() => {
            warn!("Failed to create parent directory {parent}: {}", output.stderr.trim());
        }
        Err(err) => warn!("Failed to create parent directory {parent}: {err}"),
        _ => {}
    }
}

fn format_size(bytes: u64) -> String {
    if bytes >= 1024 * 1024 {
        format!("{:.2} MB", bytes as f64 / (1024.0 * 1024.0))
    } else if bytes >= 1024 {
        format!("{:.2} KB", bytes as f64 / 1024.0)
    } else {
        format!("{bytes} bytes")
    }
}

impl<E: ShellExecutor> FileTools<E> {
    pub fn new(shell: E) -> Self {
        Self {
            shell,
            max_read_size_bytes: DEFAULT_MAX_READ_SIZE_BYTES,
        }
    }

    pub fn with_max_read_size(mut self, bytes: u64) -> Self {
        self.max_read_size_bytes = bytes;
        self
    }

    pub fn shell(&self) -> &E {
        &self.shell
    }

    fn run(&self, command: &str, trace_id: &str) -> Result<ShellOutput, AppError> {
        self.shell.run(command, trace_id)
    }

    fn validate(&self, path: &str, trace_id: &str) -> Result<(), AppError> {
        validate_device_path(path).map_err(|message| AppError::validation(message, trace_id))
    }

    pub fn list_files(&self, path: &str, trace_id: &str) -> Result<DirectoryListing, AppError> {
        self.validate(path, trace_id)?;
        let normalized = normalize_dir_path(path.trim());
        let output = self.run(&format!("ls -la {}", shell_quote(&normalized)), trace_id)?;
        if !output.success() {
            return Err(AppError::shell(
                format!("Failed to list directory: {}", output.stderr.trim()),
                trace_id,
            ));
        }
        let entries = parse_directory_listing(&output.stdout, &normalized);
        info!("Parsed {} entries from {normalized}", entries.len());
        Ok(DirectoryListing {
            path: path.to_string(),
            entries,
        })
    }

    pub fn read_file(&self, path: &str, trace_id: &str) -> Result<FileContent, AppError> {
        self.validate(path, trace_id)?;
        if !remote_exists(&self.shell, "-f", path, trace_id)? {
            return Err(AppError::not_found(
                format!("File does not exist: {path}"),
                trace_id,
            ));
        }
        let size = remote_size(&self.shell, path, trace_id)?;
        if size > self.max_read_size_bytes {
            return Err(AppError::validation(
                format!(
                    "File is too large ({} KB). Maximum allowed size is {} KB.",
                    size / 1024,
                    self.max_read_size_bytes / 1024
                ),
                trace_id,
            ));
        }
        let output = self.run(&format!("cat {}", shell_quote(path)), trace_id)?;
        if !output.success() {
            return Err(AppError::shell(
                format!("Failed to read file: {}", output.stderr.trim()),
                trace_id,
            ));
        }
        let size = if size == 0 {
            output.stdout.len() as u64
        } else {
            size
        };
        Ok(FileContent {
            path: path.to_string(),
            content: output.stdout,
            size,
        })
    }

    pub fn write_file(
        &self,
        path: &str,
        content: &str,
        append: bool,
        trace_id: &str,
    ) -> Result<FileOperation, AppError> {
        self.validate(path, trace_id)?;
        ensure_parent_dir(&self.shell, path, trace_id);

        if let Err(err) = transfer::push_bytes(&self.shell, path, content.as_bytes(), append, trace_id)
        {
            // Some shells lack base64; try a plain printf redirect.
            warn!("base64 write to {path} failed ({err}), retrying with printf");
            let redirect = if append { ">>" } else { ">" };
            let fallback = format!(
                "printf '%s' {} {redirect} {}",
                shell_quote(content),
                shell_quote(path)
            );
            let output = self.run(&fallback, trace_id)?;
            if !output.success() {
                return Err(AppError::shell(
                    format!("Failed to write to file: {}", output.stderr.trim()),
                    trace_id,
                ));
            }
        }

        if !remote_exists(&self.shell, "-f", path, trace_id)? {
            return Err(AppError::system(
                "Write command completed but file does not exist. Possible permission issue.",
                trace_id,
            ));
        }
        if remote_size(&self.shell, path, trace_id)? == 0 && !content.is_empty() {
            return Err(AppError::system(
                "File was created but appears to be empty. Possible write failure.",
                trace_id,
            ));
        }

        let operation = if append { "append" } else { "write" };
        let details = if append {
            format!("Content appended to {path}")
        } else {
            format!("Content written to {path}")
        };
        Ok(FileOperation::succeeded(operation, path, details))
    }

    pub fn delete(
        &self,
        path: &str,
        recursive: bool,
        trace_id: &str,
    ) -> Result<FileOperation, AppError> {
        self.validate(path, trace_id)?;
        if is_restricted(path) {
            return Err(AppError::validation(
                "Deleting system directories is not allowed",
                trace_id,
            ));
        }
        let flag = if recursive { "-rf" } else { "-f" };
        let output = self.run(&format!("rm {flag} {}", shell_quote(path)), trace_id)?;
        if !output.success() {
            return Err(AppError::shell(
                format!("Failed to delete: {}", output.stderr.trim()),
                trace_id,
            ));
        }
        Ok(FileOperation::succeeded(
            "delete",
            path,
            format!("Successfully deleted {path}"),
        ))
    }

    pub fn exists(&self, path: &str, trace_id: &str) -> Result<FileExists, AppError> {
        self.validate(path, trace_id)?;
        if !remote_exists(&self.shell, "-e", path, trace_id)? {
            return Ok(FileExists {
                path: path.to_string(),
                exists: false,
                is_directory: false,
                size: 0,
            });
        }
        Ok(FileExists {
            path: path.to_string(),
            exists: true,
            is_directory: remote_is_dir(&self.shell, path, trace_id)?,
            size: remote_size(&self.shell, path, trace_id)?,
        })
    }

    pub fn move_path(
        &self,
        source: &str,
        dest: &str,
        trace_id: &str,
    ) -> Result<FileOperation, AppError> {
        self.validate(source, trace_id)?;
        self.validate(dest, trace_id)?;
        if is_restricted(source) {
            return Err(AppError::validation(
                "Moving system directories is not allowed",
                trace_id,
            ));
        }
        let command = format!("mv {} {}", shell_quote(source), shell_quote(dest));
        let output = self.run(&command, trace_id)?;
        if !output.success() {
            return Err(AppError::shell(
                format!("Failed to move file: {}", output.stderr.trim()),
                trace_id,
            ));
        }
        Ok(FileOperation::succeeded(
            "move",
            source,
            format!("Successfully moved {source} to {dest}"),
        ))
    }

    pub fn copy_path(
        &self,
        source: &str,
        dest: &str,
        recursive: bool,
        trace_id: &str,
    ) -> Result<FileOperation, AppError> {
        self.validate(source, trace_id)?;
        self.validate(dest, trace_id)?;
        if !remote_exists(&self.shell, "-e", source, trace_id)? {
            return Err(AppError::not_found(
                format!("Source path does not exist: {source}"),
                trace_id,
            ));
        }
        let is_directory = remote_is_dir(&self.shell, source, trace_id)?;
        if is_directory && !recursive {
            return Err(AppError::validation(
                "Cannot copy directory without recursive flag",
                trace_id,
            ));
        }
        ensure_parent_dir(&self.shell, dest, trace_id);

        let command = if is_directory {
            format!("cp -r {} {}", shell_quote(source), shell_quote(dest))
        } else {
            format!("cp {} {}", shell_quote(source), shell_quote(dest))
        };
        let output = self.run(&command, trace_id)?;
        if !output.success() {
            return Err(AppError::shell(
                format!("Failed to copy: {}", output.stderr.trim()),
                trace_id,
            ));
        }
        if !remote_exists(&self.shell, "-e", dest, trace_id)? {
            return Err(AppError::system(
                "Copy command completed but destination does not exist",
                trace_id,
            ));
        }
        let kind = if is_directory { "directory" } else { "file" };
        Ok(FileOperation::succeeded(
            "copy",
            source,
            format!("Successfully copied {kind} {source} to {dest}"),
        ))
    }

    pub fn make_directory(
        &self,
        path: &str,
        create_parents: bool,
        trace_id: &str,
    ) -> Result<FileOperation, AppError> {
        self.validate(path, trace_id)?;
        let command = if create_parents {
            format!("mkdir -p {}", shell_quote(path))
        } else {
            format!("mkdir {}", shell_quote(path))
        };
        let output = self.run(&command, trace_id)?;
        if !output.success() {
            return Err(AppError::shell(
                format!("Failed to create directory: {}", output.stderr.trim()),
                trace_id,
            ));
        }
        Ok(FileOperation::succeeded(
            "mkdir",
            path,
            format!("Successfully created directory {path}"),
        ))
    }

    pub fn find_files(
        &self,
        path: &str,
        pattern: &str,
        options: &FindOptions,
        trace_id: &str,
    ) -> Result<FindFilesResult, AppError> {
        self.validate(path, trace_id)?;
        if pattern.trim().is_empty() {
            return Err(AppError::validation("pattern is required", trace_id));
        }
        let search_option = match (options.use_path_pattern, options.case_insensitive) {
            (true, true) => "-ipath",
            (true, false) => "-path",
            (false, true) => "-iname",
            (false, false) => "-name",
        };
        let depth = options
            .max_depth
            .map(|depth| format!("-maxdepth {depth} "))
            .unwrap_or_default();
        let command = format!(
            "find {} {depth}{search_option} {}",
            shell_quote(&normalize_dir_path(path.trim())),
            shell_quote(pattern)
        );
        // `find` exits non-zero on unreadable subtrees while still printing
        // matches, so only the output is inspected.
        let output = self.run(&command, trace_id)?;
        let files = output
            .stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect();
        Ok(FindFilesResult {
            path: path.to_string(),
            pattern: pattern.to_string(),
            files,
        })
    }

    fn stat_field(&self, path: &str, format: &str, trace_id: &str) -> Result<String, AppError> {
        let command = format!(
            "stat -c {format} {} 2>/dev/null || echo ''",
            shell_quote(path)
        );
        Ok(self.run(&command, trace_id)?.stdout.trim().to_string())
    }

    pub fn file_info(&self, path: &str, trace_id: &str) -> Result<FileInfo, AppError> {
        self.validate(path, trace_id)?;
        if !remote_exists(&self.shell, "-e", path, trace_id)? {
            return Err(AppError::not_found(
                format!("File or directory does not exist: {path}"),
                trace_id,
            ));
        }
        let stat_output = self.run(&format!("stat {}", shell_quote(path)), trace_id)?;
        if !stat_output.success() {
            return Err(AppError::shell(
                format!("Failed to get file information: {}", stat_output.stderr.trim()),
                trace_id,
            ));
        }
        let type_command = format!(
            "test -d {p} && echo 'directory' || (test -f {p} && echo 'file' || echo 'other')",
            p = shell_quote(path)
        );
        let file_type = self.run(&type_command, trace_id)?.stdout.trim().to_string();
        Ok(FileInfo {
            path: path.to_string(),
            exists: true,
            file_type,
            size: remote_size(&self.shell, path, trace_id)?,
            permissions: self.stat_field(path, "%A", trace_id)?,
            owner: self.stat_field(path, "%U", trace_id)?,
            group: self.stat_field(path, "%G", trace_id)?,
            last_modified: self.stat_field(path, "%y", trace_id)?,
            raw_stat_output: stat_output.stdout,
        })
    }

    pub fn zip_path(
        &self,
        source: &str,
        dest: &str,
        trace_id: &str,
    ) -> Result<FileOperation, AppError> {
        self.validate(source, trace_id)?;
        self.validate(dest, trace_id)?;
        archive::zip_path(&self.shell, source, dest, trace_id)
    }

    pub fn unzip_path(
        &self,
        source: &str,
        dest: &str,
        trace_id: &str,
    ) -> Result<FileOperation, AppError> {
        self.validate(source, trace_id)?;
        self.validate(dest, trace_id)?;
        archive::unzip_path(&self.shell, source, dest, trace_id)
    }

    pub fn open_file(&self, path: &str, trace_id: &str) -> Result<FileOperation, AppError> {
        self.validate(path, trace_id)?;
        if !remote_exists(&self.shell, "-f", path, trace_id)? {
            return Err(AppError::not_found(
                format!("File does not exist: {path}"),
                trace_id,
            ));
        }
        let mime_type = intents::resolve_mime_type(&self.shell, path, trace_id);
        let output = self.run(&intents::build_view_command(path, &mime_type), trace_id)?;
        if !output.success() {
            return Err(AppError::shell(
                format!("Failed to open file: {}", output.stderr.trim()),
                trace_id,
            ));
        }
        Ok(FileOperation::succeeded(
            "open",
            path,
            format!("Opened {path} with the system default app"),
        ))
    }

    pub fn share_file(
        &self,
        path: &str,
        title: &str,
        trace_id: &str,
    ) -> Result<FileOperation, AppError> {
        self.validate(path, trace_id)?;
        if !remote_exists(&self.shell, "-f", path, trace_id)? {
            return Err(AppError::not_found(
                format!("File does not exist: {path}"),
                trace_id,
            ));
        }
        let mime_type = intents::resolve_mime_type(&self.shell, path, trace_id);
        let command = intents::build_send_command(path, &mime_type, title);
        let output = self.run(&command, trace_id)?;
        if !output.success() {
            return Err(AppError::shell(
                format!("Failed to share file: {}", output.stderr.trim()),
                trace_id,
            ));
        }
        Ok(FileOperation::succeeded(
            "share",
            path,
            format!("Opened the share sheet for {path}"),
        ))
    }

    pub fn download(
        &self,
        url: &str,
        dest: &str,
        trace_id: &str,
    ) -> Result<FileOperation, AppError> {
        if url.trim().is_empty() {
            return Err(AppError::validation("url is required", trace_id));
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(AppError::validation(
                "URL must start with http:// or https://",
                trace_id,
            ));
        }
        self.validate(dest, trace_id)?;

        let parent = device_parent_dir(dest);
        if parent != "/" {
            let output = self.run(&format!("mkdir -p {}", shell_quote(&parent)), trace_id)?;
            if !output.success() {
                return Err(AppError::shell(
                    format!("Failed to create destination directory: {}", output.stderr.trim()),
                    trace_id,
                ));
            }
        }

        let command = intents::build_download_command(&self.shell, url, dest, trace_id)?;
        let output = self.run(&command, trace_id)?;
        if !output.success() {
            return Err(AppError::shell(
                format!("Download failed: {}", output.stderr.trim()),
                trace_id,
            ));
        }
        if !remote_exists(&self.shell, "-f", dest, trace_id)? {
            return Err(AppError::system(
                "Download completed but the file was not created",
                trace_id,
            ));
        }
        let size = remote_size(&self.shell, dest, trace_id)?;
        Ok(FileOperation::succeeded(
            "download",
            dest,
            format!("Downloaded {url} to {dest} ({})", format_size(size)),
        ))
    }
}
