pub mod app;

pub use app::fs::{FileTools, FindOptions};
pub use app::models::{DirectoryListing, FileEntry};
pub use app::shell::{AdbShell, HostShell, ShellExecutor, ShellOutput};
