use serde::{Deserialize, Serialize};

/// One parsed row of an `ls -la` directory listing.
///
/// `last_modified` is epoch milliseconds rendered as a decimal string, `"0"`
/// when the listing's date field could not be parsed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileEntry {
    pub name: String,
    pub is_directory: bool,
    pub size: u64,
    pub permissions: String,
    pub last_modified: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DirectoryListing {
    pub path: String,
    pub entries: Vec<FileEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileContent {
    pub path: String,
    pub content: String,
    pub size: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileExists {
    pub path: String,
    pub exists: bool,
    pub is_directory: bool,
    pub size: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileInfo {
    pub path: String,
    pub exists: bool,
    pub file_type: String,
    pub size: u64,
    pub permissions: String,
    pub owner: String,
    pub group: String,
    pub last_modified: String,
    pub raw_stat_output: String,
}

/// Outcome record for a mutating operation (write, delete, move, ...).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileOperation {
    pub operation: String,
    pub path: String,
    pub successful: bool,
    pub details: String,
}

impl FileOperation {
    pub fn succeeded(
        operation: impl Into<String>,
        path: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            operation: operation.into(),
            path: path.into(),
            successful: true,
            details: details.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FindFilesResult {
    pub path: String,
    pub pattern: String,
    pub files: Vec<String>,
}
