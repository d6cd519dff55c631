use std::fmt;

use derive_more::Display;

use crate::config::config::Config;
use crate::filesystem::{Directory, FileSystem};

#[derive(Debug, Clone, PartialEq, Eq, Display)]
#[display("{name} ({size})")]
pub struct DirectorySummary {
    pub name: String,
    pub size: u64,
}

impl From<&Directory> for DirectorySummary {
    fn from(directory: &Directory) -> Self {
        Self {
            name: directory.name().to_string(),
            size: directory.size(),
        }
    }
}

/// Answers to the size queries, computed once after the scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub used_space: u64,
    pub directory_count: usize,
    pub file_count: usize,
    pub small_directory_limit: u64,
    pub small_directories_total: u128,
    pub space_to_free: u64,
    pub deletion_candidate: Option<DirectorySummary>,
}

impl Report {
    pub fn new(file_system: &FileSystem, config: &Config) -> Self {
        let used_space = file_system.used_space();
        let space_to_free = config.disk.space_to_free(used_space);

        Self {
            used_space,
            directory_count: file_system.directory_count(),
            file_count: file_system.file_count(),
            small_directory_limit: config.small_directory_limit,
            small_directories_total: file_system
                .total_size_at_most(config.small_directory_limit),
            space_to_free,
            deletion_candidate: file_system
                .smallest_at_least(space_to_free)
                .map(DirectorySummary::from),
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Used space: {} in {} directories and {} files",
            self.used_space, self.directory_count, self.file_count
        )?;
        writeln!(
            f,
            "Total size of directories up to {}: {}",
            self.small_directory_limit, self.small_directories_total
        )?;
        writeln!(f, "Space to free: {}", self.space_to_free)?;
        match &self.deletion_candidate {
            Some(candidate) => write!(f, "Smallest directory freeing enough space: {candidate}"),
            None => write!(
                f,
                "No directory is large enough to free {}",
                self.space_to_free
            ),
        }
    }
}
