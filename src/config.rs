//! Settings resolution for the quiz runner.
//!
//! Each value is taken from the first source that provides it:
//!
//! 1. CLI flags
//! 2. Environment variables (`QUIZ_*`, `.env` included)
//! 3. JSON config file (`config.json` unless `--config` says otherwise)
//! 4. Built-in defaults

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use clap::builder::BoolishValueParser;
use clap::{Parser, ValueEnum};
use serde::Deserialize;
use thiserror::Error;

use crate::quiz::sanitize::SanitizationPolicy;

const DEFAULT_QUIZ_FILE: &str = "quiz.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("error parsing config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("file mode requires {0}")]
    MissingTranscriptPath(&'static str),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Answer on the terminal
    #[default]
    Local,
    /// Replay answers from an input file and write the session to an output file
    File,
}

/// Multiple-choice quiz runner
#[derive(Parser, Debug, Default)]
#[command(name = "quiz", version)]
pub struct Cli {
    /// Where answers are read from
    #[arg(long, value_enum, env = "QUIZ_ENVIRONMENT")]
    pub mode: Option<Mode>,

    /// Path to the quiz JSON file
    #[arg(long, env = "QUIZ_FILE", value_name = "PATH")]
    pub quiz_file: Option<PathBuf>,

    /// Answers to replay in file mode, one per line
    #[arg(long, env = "QUIZ_INPUT_FILE", value_name = "PATH")]
    pub input_file: Option<PathBuf>,

    /// Where the session transcript is written in file mode
    #[arg(long, env = "QUIZ_OUTPUT_FILE", value_name = "PATH")]
    pub output_file: Option<PathBuf>,

    /// Number of questions to present (0 for all)
    #[arg(long, env = "QUIZ_LENGTH", value_name = "N")]
    pub quiz_length: Option<usize>,

    /// How unsafe question text is handled: reject, remove or replace
    #[arg(long, env = "QUIZ_SANITIZATION_POLICY", value_name = "POLICY")]
    pub sanitization_policy: Option<SanitizationPolicy>,

    /// Enable or disable logging
    #[arg(
        long,
        env = "QUIZ_LOGGING_ENABLED",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub logging_enabled: Option<bool>,

    /// Config file to read defaults from
    #[arg(long, env = "QUIZ_CONFIG", value_name = "PATH", default_value = "config.json")]
    pub config: PathBuf,
}

/// Contents of the JSON config file. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub environment: Option<Mode>,
    pub quiz_file: Option<PathBuf>,
    pub input_file: Option<PathBuf>,
    pub output_file: Option<PathBuf>,
    pub quiz_length: Option<usize>,
    pub sanitization_policy: Option<SanitizationPolicy>,
    pub logging_enabled: Option<bool>,
}

impl FileConfig {
    /// A missing file yields the empty config.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelSettings {
    Terminal,
    Transcript { input: PathBuf, output: PathBuf },
}

/// The resolved values the quiz needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub channel: ChannelSettings,
    pub quiz_file: PathBuf,
    pub quiz_length: usize,
    pub policy: SanitizationPolicy,
    pub logging_enabled: bool,
}

impl Settings {
    pub fn resolve(cli: Cli) -> Result<Self, ConfigError> {
        let file = FileConfig::load(&cli.config)?;
        Self::merge(cli, file)
    }

    pub fn merge(cli: Cli, file: FileConfig) -> Result<Self, ConfigError> {
        let mode = cli.mode.or(file.environment).unwrap_or_default();
        let channel = match mode {
            Mode::Local => ChannelSettings::Terminal,
            Mode::File => ChannelSettings::Transcript {
                input: cli
                    .input_file
                    .or(file.input_file)
                    .ok_or(ConfigError::MissingTranscriptPath("an input file"))?,
                output: cli
                    .output_file
                    .or(file.output_file)
                    .ok_or(ConfigError::MissingTranscriptPath("an output file"))?,
            },
        };

        Ok(Self {
            channel,
            quiz_file: cli
                .quiz_file
                .or(file.quiz_file)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_QUIZ_FILE)),
            quiz_length: cli.quiz_length.or(file.quiz_length).unwrap_or(0),
            policy: cli
                .sanitization_policy
                .or(file.sanitization_policy)
                .unwrap_or_default(),
            logging_enabled: cli.logging_enabled.or(file.logging_enabled).unwrap_or(true),
        })
    }
}
