use std::{
    borrow::Cow,
    path::{Path, PathBuf},
    string::FromUtf8Error,
};

use hashlink::LinkedHashMap;
use saphyr::{LoadableYamlNode, Scalar, Yaml};
use snafu::prelude::*;
use tracing::debug;

const CONFIG_FILE_NAME: &str = "fsreplay.yaml";

const DEFAULT_TOTAL_SPACE: u64 = 70_000_000;
const DEFAULT_REQUIRED_SPACE: u64 = 30_000_000;
const DEFAULT_SMALL_DIRECTORY_LIMIT: u64 = 100_000;

fn get_config_file_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE_NAME)
}

/// Size of the disk the transcript was taken from, and how much free space
/// an update needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiskLayout {
    pub total_space: u64,
    pub required_space: u64,
}

impl Default for DiskLayout {
    fn default() -> Self {
        Self {
            total_space: DEFAULT_TOTAL_SPACE,
            required_space: DEFAULT_REQUIRED_SPACE,
        }
    }
}

impl DiskLayout {
    /// How much has to be deleted before `required_space` is free.
    pub fn space_to_free(&self, used_space: u64) -> u64 {
        let unused = self.total_space.saturating_sub(used_space);
        self.required_space.saturating_sub(unused)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub disk: DiskLayout,
    pub small_directory_limit: u64,
    pub include_listed_directories: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            disk: DiskLayout::default(),
            small_directory_limit: DEFAULT_SMALL_DIRECTORY_LIMIT,
            include_listed_directories: false,
        }
    }
}

impl Config {
    /// Reads `fsreplay.yaml` from `root`, falling back to defaults when the
    /// file does not exist.
    pub async fn read(root: &Path) -> Result<Self, ConfigError> {
        let path = get_config_file_path(root);
        if !path.is_file() {
            debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::from_path(path).await
    }

    pub async fn from_path(path: PathBuf) -> Result<Self, ConfigError> {
        debug!("Reading config file: {}", path.display());
        let bytes = compio::fs::read(&path).await.context(ReadSnafu {
            file_path: path.display().to_string(),
        })?;
        debug!("Successfully read config file: {} bytes", bytes.len());

        let contents = String::from_utf8(bytes).context(EncodingSnafu {
            file_path: path.display().to_string(),
        })?;
        contents.as_str().try_into()
    }

    fn apply_disk_section(
        &mut self,
        section: &LinkedHashMap<Yaml, Yaml>,
    ) -> Result<(), ConfigError> {
        for (key, value) in section {
            match key.as_str() {
                Some("totalSpace") => self.disk.total_space = as_size("totalSpace", value)?,
                Some("requiredSpace") => {
                    self.disk.required_space = as_size("requiredSpace", value)?
                }
                _ => debug!("Ignoring unknown disk setting: {:?}", key),
            }
        }
        Ok(())
    }

    fn apply_report_section(
        &mut self,
        section: &LinkedHashMap<Yaml, Yaml>,
    ) -> Result<(), ConfigError> {
        for (key, value) in section {
            match key.as_str() {
                Some("smallDirectoryLimit") => {
                    self.small_directory_limit = as_size("smallDirectoryLimit", value)?
                }
                _ => debug!("Ignoring unknown report setting: {:?}", key),
            }
        }
        Ok(())
    }

    fn apply_scan_section(
        &mut self,
        section: &LinkedHashMap<Yaml, Yaml>,
    ) -> Result<(), ConfigError> {
        for (key, value) in section {
            match key.as_str() {
                Some("includeListedDirectories") => {
                    self.include_listed_directories = as_flag("includeListedDirectories", value)?
                }
                _ => debug!("Ignoring unknown scan setting: {:?}", key),
            }
        }
        Ok(())
    }
}

/// Looks up a top-level section. A missing or empty section yields `None`.
fn get_section<'a, 'input>(
    top_level: &'a LinkedHashMap<Yaml<'input>, Yaml<'input>>,
    name: &'static str,
) -> Result<Option<&'a LinkedHashMap<Yaml<'input>, Yaml<'input>>>, ConfigError> {
    match top_level.get(&Yaml::Value(Scalar::String(Cow::Borrowed(name)))) {
        None | Some(Yaml::Value(Scalar::Null)) => Ok(None),
        Some(value) => value
            .as_mapping()
            .map(Some)
            .context(SectionNotMapSnafu { section: name }),
    }
}

fn as_size(key: &str, value: &Yaml) -> Result<u64, ConfigError> {
    match value {
        Yaml::Value(Scalar::Integer(number)) => {
            u64::try_from(*number).ok().context(InvalidSizeSnafu { key })
        }
        _ => InvalidSizeSnafu { key }.fail(),
    }
}

fn as_flag(key: &str, value: &Yaml) -> Result<bool, ConfigError> {
    match value {
        Yaml::Value(Scalar::Boolean(flag)) => Ok(*flag),
        _ => InvalidFlagSnafu { key }.fail(),
    }
}

impl TryFrom<&str> for Config {
    type Error = ConfigError;

    fn try_from(contents: &str) -> Result<Self, Self::Error> {
        let documents =
            Yaml::load_from_str(contents).map_err(|e| ConfigError::ParseError { source: e })?;

        let mut config = Config::default();
        let Some(document) = documents.first() else {
            debug!("Config file is empty, using defaults");
            return Ok(config);
        };

        let top_level = document.as_mapping().context(TopLevelNotMapSnafu)?;

        if let Some(disk) = get_section(top_level, "disk")? {
            config.apply_disk_section(disk)?;
        }
        if let Some(report) = get_section(top_level, "report")? {
            config.apply_report_section(report)?;
        }
        if let Some(scan) = get_section(top_level, "scan")? {
            config.apply_scan_section(scan)?;
        }

        Ok(config)
    }
}

#[derive(Debug, Snafu)]
pub enum ConfigError {
    #[snafu(display("Failed to read the config file: {}", file_path))]
    ReadError {
        file_path: String,
        source: std::io::Error,
    },
    #[snafu(display("The config file is not valid UTF-8: {}", file_path))]
    EncodingError {
        file_path: String,
        source: FromUtf8Error,
    },
    #[snafu(display("Failed to parse the config file"))]
    ParseError { source: saphyr::ScanError },
    #[snafu(display("Top level of config should be a map"))]
    TopLevelNotMap,
    #[snafu(display("Section '{}' should be a map", section))]
    SectionNotMap { section: String },
    #[snafu(display("Setting '{}' should be a non-negative integer", key))]
    InvalidSize { key: String },
    #[snafu(display("Setting '{}' should be true or false", key))]
    InvalidFlag { key: String },
}
