//! Live-device smoke harness: exercises the file tools end to end against a
//! connected device (or emulator) under a scratch directory, then cleans up.
//!
//! Usage: smoke [--serial SERIAL] [--base-dir /sdcard/Download] [--json] [--keep]

use std::time::{Duration, Instant};

use serde::Serialize;
use uuid::Uuid;

use droidfs::app::config::load_config;
use droidfs::app::fs::{FileTools, FindOptions};
use droidfs::app::logging::init_logging;
use droidfs::app::shell::locator::{resolve_adb_program, validate_adb_program};
use droidfs::app::shell::AdbShell;

#[derive(Debug, Clone)]
struct Args {
    serial: Option<String>,
    base_dir: String,
    json: bool,
    keep: bool,
}

#[derive(Serialize)]
struct SmokeSummary {
    tool: &'static str,
    status: &'static str,
    serial: Option<String>,
    adb_program: String,
    base_dir: String,
    checks: Vec<SmokeCheck>,
}

#[derive(Serialize)]
struct SmokeCheck {
    name: &'static str,
    status: &'static str, // pass|fail
    duration_ms: u128,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn parse_args() -> Result<Args, String> {
    let mut serial = std::env::var("ANDROID_SERIAL")
        .ok()
        .filter(|value| !value.trim().is_empty());
    let mut base_dir = "/sdcard/Download".to_string();
    let mut json = false;
    let mut keep = false;

    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--serial" => {
                serial = Some(iter.next().ok_or("--serial requires a value")?);
            }
            "--base-dir" => {
                base_dir = iter.next().ok_or("--base-dir requires a value")?;
            }
            "--json" => json = true,
            "--keep" => keep = true,
            "--help" | "-h" => {
                return Err(
                    "usage: smoke [--serial SERIAL] [--base-dir DIR] [--json] [--keep]".to_string(),
                );
            }
            other => return Err(format!("unknown argument: {other}")),
        }
    }
    Ok(Args {
        serial,
        base_dir,
        json,
        keep,
    })
}

fn run_check(
    checks: &mut Vec<SmokeCheck>,
    name: &'static str,
    check: impl FnOnce() -> Result<(), String>,
) -> bool {
    let start = Instant::now();
    match check() {
        Ok(()) => {
            checks.push(SmokeCheck {
                name,
                status: "pass",
                duration_ms: start.elapsed().as_millis(),
                error: None,
            });
            true
        }
        Err(error) => {
            checks.push(SmokeCheck {
                name,
                status: "fail",
                duration_ms: start.elapsed().as_millis(),
                error: Some(error),
            });
            false
        }
    }
}

fn trace() -> String {
    Uuid::new_v4().to_string()
}

fn main() {
    let args = match parse_args() {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{message}");
            std::process::exit(2);
        }
    };

    let config = load_config().unwrap_or_default();
    init_logging(&config.logging.log_level);

    let program = resolve_adb_program(&config.shell.adb_path);
    if let Err(message) = validate_adb_program(&program) {
        eprintln!("{message}");
        std::process::exit(2);
    }

    let serial = args.serial.clone().or(config.shell.serial.clone());
    let shell = AdbShell::new(
        program.clone(),
        serial.clone(),
        Duration::from_secs(config.shell.command_timeout_secs),
    );
    let tools = FileTools::new(shell).with_max_read_size(config.max_read_size_bytes());

    let base = args.base_dir.trim_end_matches('/').to_string();
    let run_id = Uuid::new_v4().simple().to_string();
    let scratch = format!("{base}/droidfs_smoke_{run_id}");
    let bundle = format!("{base}/droidfs_smoke_{run_id}.zip");
    let payload = "droidfs smoke payload\n";

    let mut checks = Vec::new();
    let mut all_passed = true;

    all_passed &= run_check(&mut checks, "list_base_dir", || {
        let listing = tools.list_files(&base, &trace()).map_err(|err| err.to_string())?;
        if listing.entries.iter().any(|entry| entry.name.is_empty()) {
            return Err("listing produced an empty entry name".to_string());
        }
        Ok(())
    });

    all_passed &= run_check(&mut checks, "make_scratch_dir", || {
        tools
            .make_directory(&scratch, true, &trace())
            .map(|_| ())
            .map_err(|err| err.to_string())
    });

    let hello = format!("{scratch}/hello.txt");
    all_passed &= run_check(&mut checks, "write_read_roundtrip", || {
        tools
            .write_file(&hello, payload, false, &trace())
            .map_err(|err| err.to_string())?;
        let content = tools.read_file(&hello, &trace()).map_err(|err| err.to_string())?;
        if content.content != payload {
            return Err(format!(
                "content mismatch: wrote {payload:?}, read {:?}",
                content.content
            ));
        }
        Ok(())
    });

    all_passed &= run_check(&mut checks, "append", || {
        tools
            .write_file(&hello, "second line\n", true, &trace())
            .map_err(|err| err.to_string())?;
        let content = tools.read_file(&hello, &trace()).map_err(|err| err.to_string())?;
        if !content.content.ends_with("second line\n") {
            return Err("appended line missing".to_string());
        }
        Ok(())
    });

    let copy = format!("{scratch}/copy.txt");
    let moved = format!("{scratch}/moved.txt");
    all_passed &= run_check(&mut checks, "copy_then_move", || {
        tools
            .copy_path(&hello, &copy, false, &trace())
            .map_err(|err| err.to_string())?;
        tools
            .move_path(&copy, &moved, &trace())
            .map_err(|err| err.to_string())?;
        let gone = tools.exists(&copy, &trace()).map_err(|err| err.to_string())?;
        if gone.exists {
            return Err("source still present after move".to_string());
        }
        let present = tools.exists(&moved, &trace()).map_err(|err| err.to_string())?;
        if !present.exists {
            return Err("destination missing after move".to_string());
        }
        Ok(())
    });

    all_passed &= run_check(&mut checks, "file_info", || {
        let info = tools.file_info(&hello, &trace()).map_err(|err| err.to_string())?;
        if info.file_type != "file" {
            return Err(format!("unexpected file type: {}", info.file_type));
        }
        Ok(())
    });

    all_passed &= run_check(&mut checks, "find_txt_files", || {
        let found = tools
            .find_files(&scratch, "*.txt", &FindOptions::default(), &trace())
            .map_err(|err| err.to_string())?;
        if found.files.len() < 2 {
            return Err(format!("expected at least 2 matches, got {}", found.files.len()));
        }
        Ok(())
    });

    all_passed &= run_check(&mut checks, "zip_unzip_roundtrip", || {
        tools
            .zip_path(&scratch, &bundle, &trace())
            .map_err(|err| err.to_string())?;
        let extracted = format!("{scratch}/unzipped");
        tools
            .unzip_path(&bundle, &extracted, &trace())
            .map_err(|err| err.to_string())?;
        let content = tools
            .read_file(&format!("{extracted}/hello.txt"), &trace())
            .map_err(|err| err.to_string())?;
        if !content.content.starts_with(payload) {
            return Err("extracted content does not match original".to_string());
        }
        Ok(())
    });

    if !args.keep {
        all_passed &= run_check(&mut checks, "cleanup", || {
            tools
                .delete(&scratch, true, &trace())
                .map_err(|err| err.to_string())?;
            tools.delete(&bundle, false, &trace()).map_err(|err| err.to_string())?;
            Ok(())
        });
    }

    let summary = SmokeSummary {
        tool: "droidfs-smoke",
        status: if all_passed { "pass" } else { "fail" },
        serial,
        adb_program: program,
        base_dir: base,
        checks,
    };

    if args.json {
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{json}"),
            Err(err) => eprintln!("failed to serialize summary: {err}"),
        }
    } else {
        println!("droidfs smoke: {}", summary.status);
        for check in &summary.checks {
            match &check.error {
                Some(error) => {
                    println!("  {:<22} {} ({} ms): {error}", check.name, check.status, check.duration_ms)
                }
                None => println!("  {:<22} {} ({} ms)", check.name, check.status, check.duration_ms),
            }
        }
    }

    if !all_passed {
        std::process::exit(1);
    }
}
