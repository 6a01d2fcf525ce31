use anyhow::{Context, Result, bail};
use image_transform::HistogramConfig;
use log::debug;
use platform_dirs::AppDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

pub const APP_NAME: &str = "dip-studio";

#[derive(Serialize, Deserialize, Default, Debug, Clone)]
pub struct Config {
    #[serde(skip)]
    pub config_path: PathBuf,

    #[serde(skip)]
    pub is_first_run: bool,

    #[serde(default)]
    pub pipeline: Pipeline,

    #[serde(default)]
    pub histogram: Histogram,

    #[serde(default)]
    pub log: Log,
}

#[derive(Serialize, Deserialize, Debug, Clone, Derivative)]
#[derivative(Default)]
pub struct Pipeline {
    #[derivative(Default(value = "true"))]
    pub persist_kernel: bool,

    #[derivative(Default(value = "false"))]
    pub persist_threshold: bool,

    #[derivative(Default(value = "127"))]
    pub default_cutoff: u8,
}

#[derive(Serialize, Deserialize, Debug, Clone, Derivative)]
#[derivative(Default)]
pub struct Histogram {
    #[derivative(Default(value = "640"))]
    pub width: u32,

    #[derivative(Default(value = "480"))]
    pub height: u32,

    #[derivative(Default(value = "16"))]
    pub margin: u32,
}

impl From<&Histogram> for HistogramConfig {
    fn from(h: &Histogram) -> Self {
        HistogramConfig::new()
            .with_width(h.width)
            .with_height(h.height)
            .with_margin(h.margin)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Derivative)]
#[derivative(Default)]
pub struct Log {
    #[derivative(Default(value = "\"info\".to_string()"))]
    pub level: String,
}

impl Config {
    /// Loads the configuration from `path`, or from the platform config
    /// directory when no path is given. A missing file is created with defaults.
    pub fn init(path: Option<PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(path) => path,
            None => {
                let app_dirs = AppDirs::new(Some(APP_NAME), true)
                    .context("no platform config directory available")?;
                app_dirs.config_dir.join(format!("{APP_NAME}.toml"))
            }
        };

        if let Some(dir) = config_path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("create config directory {} failed", dir.display()))?;
        }

        let mut config = Config {
            config_path,
            ..Default::default()
        };
        config.load().with_context(|| "load config file failed")?;
        debug!("{:?}", config);
        Ok(config)
    }

    fn load(&mut self) -> Result<()> {
        match fs::read_to_string(&self.config_path) {
            Ok(text) => match toml::from_str::<Config>(&text) {
                Ok(mut c) => {
                    c.config_path = self.config_path.clone();
                    c.is_first_run = self.is_first_run;
                    *self = c;

                    Ok(())
                }
                Err(e) => {
                    log::warn!("invalid config {}: {e}", self.config_path.display());
                    self.is_first_run = true;

                    if let Some(bak_file) = &self.config_path.as_os_str().to_str() {
                        _ = fs::copy(&self.config_path, format!("{}.bak", bak_file));
                    }

                    self.save()
                }
            },
            Err(_) => {
                self.is_first_run = true;
                self.save()
            }
        }
    }

    pub fn save(&self) -> Result<()> {
        match toml::to_string_pretty(self) {
            Ok(text) => Ok(fs::write(&self.config_path, text)
                .with_context(|| "save config failed".to_string())?),
            Err(e) => bail!(format!("convert config from toml format failed. {e:?}")),
        }
    }

    pub fn log_level(&self) -> log::LevelFilter {
        self.log.level.parse().unwrap_or(log::LevelFilter::Info)
    }
}
