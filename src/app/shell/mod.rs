pub mod locator;
pub mod runner;

use std::time::Duration;

use crate::app::error::AppError;

pub use runner::{run_command_with_timeout, ShellOutput};

pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(10);

/// Executes one shell command string on the device and returns captured
/// stdout/stderr plus the exit code. Implementations must not interpret the
/// command beyond handing it to a shell.
pub trait ShellExecutor {
    fn run(&self, command: &str, trace_id: &str) -> Result<ShellOutput, AppError>;
}

/// Runs commands on a device through `adb [-s SERIAL] shell`.
#[derive(Debug, Clone)]
pub struct AdbShell {
    program: String,
    serial: Option<String>,
    timeout: Duration,
}

impl AdbShell {
    pub fn new(program: impl Into<String>, serial: Option<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            serial,
            timeout,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn shell_args(&self, command: &str) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(serial) = &self.serial {
            args.push("-s".to_string());
            args.push(serial.clone());
        }
        args.push("shell".to_string());
        args.push(command.to_string());
        args
    }
}

impl ShellExecutor for AdbShell {
    fn run(&self, command: &str, trace_id: &str) -> Result<ShellOutput, AppError> {
        let args = self.shell_args(command);
        run_command_with_timeout(&self.program, &args, self.timeout, trace_id)
    }
}

/// Runs commands on the host through `sh -c`. Lets the file tools operate on
/// a local tree, which is also how the integration tests exercise them
/// without a device.
#[derive(Debug, Clone)]
pub struct HostShell {
    timeout: Duration,
}

impl HostShell {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for HostShell {
    fn default() -> Self {
        Self::new(DEFAULT_COMMAND_TIMEOUT)
    }
}

impl ShellExecutor for HostShell {
    fn run(&self, command: &str, trace_id: &str) -> Result<ShellOutput, AppError> {
        let args = vec!["-c".to_string(), command.to_string()];
        run_command_with_timeout("sh", &args, self.timeout, trace_id)
    }
}

impl<E: ShellExecutor> ShellExecutor for &E {
    fn run(&self, command: &str, trace_id: &str) -> Result<ShellOutput, AppError> {
        (*self).run(command, trace_id)
    }
}
