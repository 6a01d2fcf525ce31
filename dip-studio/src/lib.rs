//! DIP Studio
//!
//! An interactive shell for filtering and thresholding a single image. Each
//! command maps to one user action: load, pick a kernel or threshold, apply,
//! restore and save. The displayed image and its histogram can be written to
//! disk at any point.
//!
//! # Architecture
//! - `config`: TOML configuration with defaults for the pipeline and histogram
//! - `logic`: command parsing, the session shell and the custom kernel prompt
//! - `image_transform`: the pipeline itself, shared with other front ends

#[macro_use]
extern crate derivative;

pub mod config;
pub mod logic;

use anyhow::Result;
use clap::Parser;
use image_transform::Session;
use log::LevelFilter;
use std::{io, path::PathBuf};

#[derive(Parser, Debug)]
#[command(name = "dip-studio", version, about = "Apply kernels and thresholds to an image")]
pub struct Cli {
    /// Image to load on startup
    pub image: Option<PathBuf>,

    /// Configuration file, defaults to the platform config directory
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log level, overrides the configuration file
    #[arg(short, long)]
    pub log_level: Option<LevelFilter>,
}

/// Initializes the logger.
///
/// Lines carry a local timestamp, the level, file name and line number.
/// `RUST_LOG` still takes precedence over `level`.
pub fn init_logger(level: LevelFilter) {
    use std::io::Write;

    env_logger::builder()
        .filter_level(level)
        .parse_default_env()
        .format(|buf, record| {
            let style = buf.default_level_style(record.level());
            let ts = chrono::Local::now().format("%H:%M:%S");

            writeln!(
                buf,
                "[{} {style}{}{style:#} {} {}] {}",
                ts,
                record.level(),
                record
                    .file()
                    .unwrap_or("None")
                    .split('/')
                    .next_back()
                    .unwrap_or("None"),
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .init();
}

pub fn desktop_main() -> Result<()> {
    let cli = Cli::parse();
    let config = config::Config::init(cli.config.clone())?;
    init_logger(cli.log_level.unwrap_or_else(|| config.log_level()));

    log::debug!("start...");

    let mut shell = logic::Shell::new(Session::new((&config.histogram).into()), &config.pipeline);

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();

    if let Some(image) = cli.image {
        shell.run_line(&format!("load {}", image.display()), &mut input, &mut output)?;
    }

    shell.run(&mut input, &mut output)?;

    log::debug!("exit...");
    Ok(())
}
