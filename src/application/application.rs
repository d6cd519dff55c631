use std::path::{Path, PathBuf};
use std::string::FromUtf8Error;

use snafu::Snafu;
use snafu::prelude::*;
use supports_color::Stream;
use tracing::{debug, info};

use crate::application::RuntimeConfig;
use crate::application::report::Report;
use crate::config::config::{Config, ConfigError};
use crate::filesystem::{FileSystem, Interpreter, ScanError, ScanOptions, TreeRenderer};

pub struct Application;

impl Application {
    pub async fn run(app_config: impl Into<RuntimeConfig>) -> Result<(), ApplicationError> {
        let app_config: RuntimeConfig = app_config.into();
        let config = Config::read(&app_config.root)
            .await
            .context(ConfigSnafu)?;
        let config = app_config.overrides.apply(config);
        debug!("Loaded config: {:?}", config);

        let file_system = Self::scan_file(&app_config.transcript, &config).await?;

        if app_config.print_tree {
            println!("{}\n", Self::tree_renderer().render(file_system.root()));
        }

        let report = Report::new(&file_system, &config);
        info!("Report ready: {:?}", report);
        println!("{report}");

        Ok(())
    }

    /// Reads the whole transcript and replays it.
    pub async fn scan_file(path: &Path, config: &Config) -> Result<FileSystem, ApplicationError> {
        ensure!(path.is_file(), TranscriptNotFoundSnafu { path });

        debug!("Reading transcript: {}", path.display());
        let bytes = compio::fs::read(path)
            .await
            .context(TranscriptReadSnafu { path })?;
        let transcript = String::from_utf8(bytes).context(TranscriptEncodingSnafu { path })?;

        let options = ScanOptions {
            include_listed_directories: config.include_listed_directories,
        };
        Interpreter::new(options)
            .scan_str(&transcript)
            .context(ScanSnafu { path })
    }

    fn tree_renderer() -> TreeRenderer {
        if supports_color::on(Stream::Stdout).is_some() {
            colored::control::set_override(true);
            TreeRenderer::colored()
        } else {
            TreeRenderer::plain()
        }
    }
}

#[derive(Debug, Snafu)]
pub enum ApplicationError {
    #[snafu(display("Critical failure encountered during configuration stage"))]
    ConfigError { source: ConfigError },
    #[snafu(display("Transcript {} does not exist or is not a file", path.display()))]
    TranscriptNotFound { path: PathBuf },
    #[snafu(display("Failed to read transcript {}", path.display()))]
    TranscriptReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Transcript {} is not valid UTF-8", path.display()))]
    TranscriptEncodingError {
        path: PathBuf,
        source: FromUtf8Error,
    },
    #[snafu(display("Failed to replay transcript {}", path.display()))]
    ScanError { path: PathBuf, source: ScanError },
}
