use super::*;

use std::sync::Mutex;

use crate::app::error::AppError;
use crate::app::shell::{ShellExecutor, ShellOutput};

fn ok(stdout: &str) -> ShellOutput {
    ShellOutput {
        stdout: stdout.to_string(),
        stderr: String::new(),
        exit_code: Some(0),
    }
}

fn fail(stderr: &str) -> ShellOutput {
    ShellOutput {
        stdout: String::new(),
        stderr: stderr.to_string(),
        exit_code: Some(1),
    }
}

/// Fake device shell: answers the first scripted rule whose needle occurs in
/// the command, records every command, and returns empty success otherwise.
struct ScriptedShell {
    rules: Vec<(String, ShellOutput)>,
    commands: Mutex<Vec<String>>,
}

impl ScriptedShell {
    fn new(rules: Vec<(&str, ShellOutput)>) -> Self {
        Self {
            rules: rules
                .into_iter()
                .map(|(needle, output)| (needle.to_string(), output))
                .collect(),
            commands: Mutex::new(Vec::new()),
        }
    }

    fn saw_command_containing(&self, needle: &str) -> bool {
        self.commands
            .lock()
            .expect("command log")
            .iter()
            .any(|command| command.contains(needle))
    }
}

impl ShellExecutor for ScriptedShell {
    fn run(&self, command: &str, _trace_id: &str) -> Result<ShellOutput, AppError> {
        self.commands
            .lock()
            .expect("command log")
            .push(command.to_string());
        for (needle, output) in &self.rules {
            if command.contains(needle.as_str()) {
                return Ok(output.clone());
            }
        }
        Ok(ok(""))
    }
}

#[test]
fn list_files_parses_ls_output() {
    let listing = "total 24\n\
        drwxr-xr-x 2 u0_a1 media_rw 4096 2025-03-14 06:04 Android\n\
        -rw-r--r-- 1 u0_a1 media_rw 123 2025-03-14 06:05 notes.txt\n";
    let shell = ScriptedShell::new(vec![("ls -la", ok(listing))]);
    let tools = FileTools::new(shell);

    let result = tools.list_files("/sdcard", "trace-1").expect("listing");
    assert_eq!(result.path, "/sdcard");
    assert_eq!(result.entries.len(), 2);
    assert_eq!(result.entries[0].name, "Android");
    assert!(result.entries[0].is_directory);
    assert_eq!(result.entries[1].size, 123);
    assert!(tools.shell().saw_command_containing("ls -la '/sdcard/'"));
}

#[test]
fn list_files_rejects_relative_paths() {
    let tools = FileTools::new(ScriptedShell::new(vec![]));
    let err = tools.list_files("sdcard", "trace-2").expect_err("validation");
    assert_eq!(err.code, "ERR_VALIDATION");
    assert_eq!(err.trace_id, "trace-2");
}

#[test]
fn list_files_surfaces_shell_failure() {
    let shell = ScriptedShell::new(vec![("ls -la", fail("Permission denied"))]);
    let tools = FileTools::new(shell);
    let err = tools.list_files("/oem", "trace-3").expect_err("shell failure");
    assert_eq!(err.code, "ERR_SHELL");
    assert!(err.error.contains("Permission denied"));
}

#[test]
fn read_file_requires_existence() {
    let shell = ScriptedShell::new(vec![("test -f", ok("not exists"))]);
    let tools = FileTools::new(shell);
    let err = tools
        .read_file("/sdcard/missing.txt", "trace-4")
        .expect_err("missing");
    assert_eq!(err.code, "ERR_NOT_FOUND");
}

#[test]
fn read_file_rejects_oversized_files() {
    let shell = ScriptedShell::new(vec![
        ("test -f", ok("exists")),
        ("stat -c %s", ok("2048")),
    ]);
    let tools = FileTools::new(shell).with_max_read_size(1024);
    let err = tools
        .read_file("/sdcard/big.bin", "trace-5")
        .expect_err("too large");
    assert_eq!(err.code, "ERR_VALIDATION");
    assert!(err.error.contains("too large"));
}

#[test]
fn read_file_returns_content_and_size() {
    let shell = ScriptedShell::new(vec![
        ("test -f", ok("exists")),
        ("stat -c %s", ok("5")),
        ("cat ", ok("hello")),
    ]);
    let tools = FileTools::new(shell);
    let content = tools.read_file("/sdcard/hello.txt", "trace-6").expect("read");
    assert_eq!(content.content, "hello");
    assert_eq!(content.size, 5);
}

#[test]
fn write_file_verifies_the_result() {
    let shell = ScriptedShell::new(vec![
        ("base64 -d", ok("")),
        ("test -f", ok("exists")),
        ("stat -c %s", ok("11")),
    ]);
    let tools = FileTools::new(shell);
    let operation = tools
        .write_file("/sdcard/notes/todo.txt", "hello world", false, "trace-7")
        .expect("write");
    assert_eq!(operation.operation, "write");
    assert!(operation.successful);
    assert!(tools.shell().saw_command_containing("mkdir -p '/sdcard/notes'"));
}

#[test]
fn write_file_reports_silently_lost_content() {
    // Write command succeeds, but the file never appears.
    let shell = ScriptedShell::new(vec![
        ("base64 -d", ok("")),
        ("test -f", ok("not exists")),
    ]);
    let tools = FileTools::new(shell);
    let err = tools
        .write_file("/sdcard/ghost.txt", "data", false, "trace-8")
        .expect_err("verification");
    assert_eq!(err.code, "ERR_SYSTEM");
    assert!(err.error.contains("does not exist"));
}

#[test]
fn write_file_flags_empty_result_for_nonempty_content() {
    let shell = ScriptedShell::new(vec![
        ("base64 -d", ok("")),
        ("test -f", ok("exists")),
        ("stat -c %s", ok("0")),
    ]);
    let tools = FileTools::new(shell);
    let err = tools
        .write_file("/sdcard/empty.txt", "data", false, "trace-9")
        .expect_err("empty file");
    assert_eq!(err.code, "ERR_SYSTEM");
    assert!(err.error.contains("empty"));
}

#[test]
fn append_uses_append_redirect() {
    let shell = ScriptedShell::new(vec![
        ("base64 -d", ok("")),
        ("test -f", ok("exists")),
        ("stat -c %s", ok("4")),
    ]);
    let tools = FileTools::new(shell);
    let operation = tools
        .write_file("/sdcard/log.txt", "more", true, "trace-10")
        .expect("append");
    assert_eq!(operation.operation, "append");
    assert!(tools.shell().saw_command_containing(">> '/sdcard/log.txt'"));
}

#[test]
fn delete_refuses_system_directories() {
    let tools = FileTools::new(ScriptedShell::new(vec![]));
    for path in ["/system/app", "/data/local", "/proc/1", "/dev/null"] {
        let err = tools.delete(path, true, "trace-11").expect_err("restricted");
        assert_eq!(err.code, "ERR_VALIDATION");
        assert!(err.error.contains("not allowed"));
    }
}

#[test]
fn delete_picks_recursive_flag() {
    let tools = FileTools::new(ScriptedShell::new(vec![]));
    tools.delete("/sdcard/dir", true, "trace-12").expect("delete");
    assert!(tools.shell().saw_command_containing("rm -rf '/sdcard/dir'"));
    tools.delete("/sdcard/file", false, "trace-13").expect("delete");
    assert!(tools.shell().saw_command_containing("rm -f '/sdcard/file'"));
}

#[test]
fn exists_reports_directory_and_size() {
    let shell = ScriptedShell::new(vec![
        ("test -e", ok("exists")),
        ("test -d", ok("true")),
        ("stat -c %s", ok("4096")),
    ]);
    let tools = FileTools::new(shell);
    let result = tools.exists("/sdcard/Download", "trace-14").expect("exists");
    assert!(result.exists);
    assert!(result.is_directory);
    assert_eq!(result.size, 4096);
}

#[test]
fn exists_short_circuits_on_missing_path() {
    let shell = ScriptedShell::new(vec![("test -e", ok("not exists"))]);
    let tools = FileTools::new(shell);
    let result = tools.exists("/sdcard/nope", "trace-15").expect("exists");
    assert!(!result.exists);
    assert!(!result.is_directory);
    assert_eq!(result.size, 0);
    // Only the existence probe should have run.
    assert!(!tools.shell().saw_command_containing("test -d"));
}

#[test]
fn move_refuses_system_sources() {
    let tools = FileTools::new(ScriptedShell::new(vec![]));
    let err = tools
        .move_path("/system/bin/sh", "/sdcard/sh", "trace-16")
        .expect_err("restricted");
    assert_eq!(err.code, "ERR_VALIDATION");
}

#[test]
fn copy_requires_recursive_for_directories() {
    let shell = ScriptedShell::new(vec![
        ("test -e", ok("exists")),
        ("test -d", ok("true")),
    ]);
    let tools = FileTools::new(shell);
    let err = tools
        .copy_path("/sdcard/dir", "/sdcard/dir2", false, "trace-17")
        .expect_err("needs recursive");
    assert_eq!(err.code, "ERR_VALIDATION");
    assert!(err.error.contains("recursive"));
}

#[test]
fn copy_verifies_destination() {
    let shell = ScriptedShell::new(vec![
        ("test -e '/sdcard/a.txt'", ok("exists")),
        ("test -d", ok("false")),
        ("cp ", ok("")),
        ("test -e '/sdcard/b.txt'", ok("not exists")),
    ]);
    let tools = FileTools::new(shell);
    let err = tools
        .copy_path("/sdcard/a.txt", "/sdcard/b.txt", false, "trace-18")
        .expect_err("verification");
    assert_eq!(err.code, "ERR_SYSTEM");
}

#[test]
fn copy_of_file_reports_success() {
    let shell = ScriptedShell::new(vec![
        ("test -e", ok("exists")),
        ("test -d", ok("false")),
        ("cp ", ok("")),
    ]);
    let tools = FileTools::new(shell);
    let operation = tools
        .copy_path("/sdcard/a.txt", "/sdcard/b.txt", false, "trace-19")
        .expect("copy");
    assert!(operation.successful);
    assert!(operation.details.contains("file"));
    assert!(tools
        .shell()
        .saw_command_containing("cp '/sdcard/a.txt' '/sdcard/b.txt'"));
}

#[test]
fn find_files_builds_expected_command() {
    let shell = ScriptedShell::new(vec![(
        "find ",
        ok("/sdcard/Download/a.png\n/sdcard/Download/b.png\n"),
    )]);
    let tools = FileTools::new(shell);
    let options = FindOptions {
        use_path_pattern: false,
        case_insensitive: true,
        max_depth: Some(2),
    };
    let result = tools
        .find_files("/sdcard/Download", "*.png", &options, "trace-20")
        .expect("find");
    assert_eq!(result.files.len(), 2);
    assert!(tools
        .shell()
        .saw_command_containing("find '/sdcard/Download/' -maxdepth 2 -iname '*.png'"));
}

#[test]
fn find_files_treats_empty_output_as_no_matches() {
    let shell = ScriptedShell::new(vec![("find ", ok("\n"))]);
    let tools = FileTools::new(shell);
    let result = tools
        .find_files("/sdcard", "*.zip", &FindOptions::default(), "trace-21")
        .expect("find");
    assert!(result.files.is_empty());
}

#[test]
fn file_info_collects_stat_fields() {
    let shell = ScriptedShell::new(vec![
        ("test -e", ok("exists")),
        ("stat -c %s", ok("123")),
        ("stat -c %A", ok("-rw-r--r--")),
        ("stat -c %U", ok("u0_a1")),
        ("stat -c %G", ok("media_rw")),
        ("stat -c %y", ok("2025-03-14 06:04:00.000000000 +0000")),
        ("echo 'directory'", ok("file")),
        ("stat ", ok("  File: /sdcard/a.txt\n  Size: 123\n")),
    ]);
    let tools = FileTools::new(shell);
    let info = tools.file_info("/sdcard/a.txt", "trace-22").expect("info");
    assert!(info.exists);
    assert_eq!(info.file_type, "file");
    assert_eq!(info.size, 123);
    assert_eq!(info.permissions, "-rw-r--r--");
    assert_eq!(info.owner, "u0_a1");
    assert_eq!(info.group, "media_rw");
    assert!(info.raw_stat_output.contains("File: /sdcard/a.txt"));
}

#[test]
fn open_file_issues_view_intent() {
    let shell = ScriptedShell::new(vec![
        ("test -f", ok("exists")),
        ("file --mime-type", ok("image/png")),
        ("am start", ok("Starting: Intent { act=android.intent.action.VIEW }")),
    ]);
    let tools = FileTools::new(shell);
    let operation = tools.open_file("/sdcard/p.png", "trace-23").expect("open");
    assert!(operation.successful);
    assert!(tools
        .shell()
        .saw_command_containing("-a android.intent.action.VIEW -d 'file:///sdcard/p.png' -t 'image/png'"));
}

#[test]
fn share_file_issues_send_intent_with_title() {
    let shell = ScriptedShell::new(vec![
        ("test -f", ok("exists")),
        ("file --mime-type", ok("application/pdf")),
        ("am start", ok("")),
    ]);
    let tools = FileTools::new(shell);
    let operation = tools
        .share_file("/sdcard/r.pdf", "Monthly report", "trace-24")
        .expect("share");
    assert!(operation.successful);
    assert!(tools
        .shell()
        .saw_command_containing("android.intent.extra.SUBJECT 'Monthly report'"));
}

#[test]
fn download_rejects_non_http_urls() {
    let tools = FileTools::new(ScriptedShell::new(vec![]));
    let err = tools
        .download("ftp://example.com/a.bin", "/sdcard/a.bin", "trace-25")
        .expect_err("bad scheme");
    assert_eq!(err.code, "ERR_VALIDATION");
    assert!(err.error.contains("http"));
}

#[test]
fn download_prefers_wget_and_verifies_the_file() {
    let shell = ScriptedShell::new(vec![
        ("which wget", ok("/system/bin/wget")),
        ("wget ", ok("")),
        ("test -f", ok("exists")),
        ("stat -c %s", ok("2048")),
    ]);
    let tools = FileTools::new(shell);
    let operation = tools
        .download("https://example.com/a.bin", "/sdcard/dl/a.bin", "trace-26")
        .expect("download");
    assert!(operation.successful);
    assert!(operation.details.contains("2.00 KB"));
    assert!(tools.shell().saw_command_containing("wget 'https://example.com/a.bin'"));
}

#[test]
fn download_falls_back_to_curl() {
    let shell = ScriptedShell::new(vec![
        ("which wget", fail("")),
        ("which curl", ok("/system/bin/curl")),
        ("curl ", ok("")),
        ("test -f", ok("exists")),
        ("stat -c %s", ok("10")),
    ]);
    let tools = FileTools::new(shell);
    tools
        .download("https://example.com/b.bin", "/sdcard/dl/b.bin", "trace-27")
        .expect("download");
    assert!(tools.shell().saw_command_containing("curl -L"));
}

#[test]
fn download_errors_when_no_downloader_exists() {
    let shell = ScriptedShell::new(vec![
        ("which wget", fail("")),
        ("which curl", fail("")),
    ]);
    let tools = FileTools::new(shell);
    let err = tools
        .download("https://example.com/c.bin", "/sdcard/dl/c.bin", "trace-28")
        .expect_err("no downloader");
    assert_eq!(err.code, "ERR_DEPENDENCY");
}
