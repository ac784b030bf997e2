use std::path::{Path, PathBuf};
use std::result::Result as StdResult;

use anyhow::Context as _;
use rust_embed::RustEmbed;
use serde::Deserialize;
use serdable::{GlobPattern, Seconds};

use crate::str_interp::Template;
use crate::testing::RunnerConfig;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
    #[serde(skip)]
    pub source_config_file: Option<PathBuf>,

    #[serde(default = "Config::default_shell")]
    pub shell: PathBuf,

    #[serde(default = "Config::default_show_stderr")]
    pub show_stderr: bool,

    #[serde(default = "Config::default_special_time_limit")]
    pub special_time_limit: Seconds,

    #[serde(default)]
    pub command: Vec<CommandConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CommandConfig {
    pub pattern: GlobPattern,
    pub compile: Option<Template>,
    pub run: Template,
}

#[derive(RustEmbed)]
#[folder = "assets/"]
struct Asset;

impl Config {
    pub const FILENAME: &str = "jdg.toml";

    fn default_shell() -> PathBuf {
        PathBuf::from("/bin/sh")
    }

    fn default_show_stderr() -> bool {
        true
    }

    fn default_special_time_limit() -> Seconds {
        Seconds(RunnerConfig::SPECIAL_TIME_LIMIT_FLOOR)
    }

    pub fn example_toml() -> String {
        let file = Asset::get(Self::FILENAME).expect("jdg.toml is embedded at build time");
        String::from_utf8_lossy(file.data.as_ref()).into_owned()
    }

    pub fn from_toml(s: &str) -> StdResult<Self, toml::de::Error> {
        toml::from_str(s)
    }

    pub fn from_toml_file(filepath: PathBuf) -> anyhow::Result<Self> {
        let toml = fsutil::read_to_string(&filepath).context("Cannot read a file")?;
        let mut cfg = Self::from_toml(&toml)
            .with_context(|| format!("Invalid config TOML: {:?}", filepath))?;
        cfg.source_config_file = Some(filepath);
        Ok(cfg)
    }

    /// Find config file in ancestor dirs, including current dir.
    pub fn find_file_in_ancestors(cur_dir: impl AsRef<Path>) -> Option<PathBuf> {
        cur_dir
            .as_ref()
            .ancestors()
            .map(|dir| dir.join(Self::FILENAME))
            .find(|path| path.is_file())
    }

    /// `explicit` if given, else the nearest `jdg.toml`, else the built-in default.
    pub fn load(explicit: Option<PathBuf>, cur_dir: impl AsRef<Path>) -> anyhow::Result<Self> {
        if let Some(path) = explicit.or_else(|| Self::find_file_in_ancestors(cur_dir)) {
            log::debug!("Using config {:?}", path);
            return Self::from_toml_file(path);
        }
        log::debug!("Using built-in config");
        Self::from_toml(&Self::example_toml()).context("Invalid built-in config")
    }

    pub fn find_command_for_filename(&self, filename: impl AsRef<str>) -> Option<&CommandConfig> {
        self.command
            .iter()
            .find(|entry| entry.pattern.matches(filename.as_ref()))
    }
}
