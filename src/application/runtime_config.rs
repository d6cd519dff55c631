use std::path::PathBuf;

use crate::cli::Cli;
use crate::config::config::Config;

/// Settings from the command line that still need the config file to be
/// resolved.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub transcript: PathBuf,
    pub root: PathBuf,
    pub print_tree: bool,
    pub overrides: ConfigOverrides,
}

/// Command-line values that take precedence over `fsreplay.yaml`.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub include_listed_directories: bool,
    pub small_directory_limit: Option<u64>,
    pub total_space: Option<u64>,
    pub required_space: Option<u64>,
}

impl ConfigOverrides {
    pub fn apply(&self, mut config: Config) -> Config {
        config.include_listed_directories |= self.include_listed_directories;
        if let Some(limit) = self.small_directory_limit {
            config.small_directory_limit = limit;
        }
        if let Some(total_space) = self.total_space {
            config.disk.total_space = total_space;
        }
        if let Some(required_space) = self.required_space {
            config.disk.required_space = required_space;
        }
        config
    }
}

impl From<Cli> for RuntimeConfig {
    fn from(cli: Cli) -> Self {
        Self {
            transcript: cli.transcript,
            root: cli.root,
            print_tree: cli.tree,
            overrides: ConfigOverrides {
                include_listed_directories: cli.include_listed_directories,
                small_directory_limit: cli.small_limit,
                total_space: cli.total_space,
                required_space: cli.required_space,
            },
        }
    }
}
