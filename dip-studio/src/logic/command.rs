use anyhow::{Context, Result, anyhow, bail};
use image_transform::{NamedKernel, ThresholdMethod};
use std::{path::PathBuf, str::FromStr};

#[derive(Debug, Clone, PartialEq)]
pub enum KernelArg {
    Named(NamedKernel),
    /// Custom kernel, optionally given inline after the keyword.
    Custom(Option<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistTarget {
    Kernel,
    Threshold,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Load(PathBuf),
    Restore,
    Kernel(KernelArg),
    Reset,
    Show,
    ApplyKernel,
    Threshold(ThresholdMethod),
    Cutoff(u8),
    ApplyThreshold,
    Persist(PersistTarget, bool),
    Save(PathBuf),
    SaveHist(PathBuf),
    Status,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  load <path>                  load an image (PNG or JPEG)
  restore                      re-read the image from disk
  kernel <name>                identity, edge, sharpen, average-blur, gaussian-blur
  kernel custom [matrix]       enter a square matrix, e.g. [[0,0,0],[0,1,0],[0,0,0]]
  reset                        back to the identity kernel
  show                         print the active kernel
  apply-kernel                 filter the image with the active kernel
  threshold <method>           global, adaptive-mean, adaptive-gaussian, otsu, otsu-gaussian
  cutoff <0-255>               global threshold cutoff
  apply-threshold              binarize the image
  persist kernel|threshold on|off
  save <path>                  save the displayed image
  save-hist <path>             save the histogram
  status                       print the session state
  help                         this text
  quit                         leave";

fn path_arg(rest: &str, what: &str) -> Result<PathBuf> {
    if rest.is_empty() {
        bail!("{what} needs a path");
    }
    Ok(PathBuf::from(rest))
}

fn on_off(value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        other => bail!("expected on or off, got `{other}`"),
    }
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let line = line.trim();
        let (word, rest) = line
            .split_once(char::is_whitespace)
            .map(|(w, r)| (w, r.trim()))
            .unwrap_or((line, ""));

        let command = match word.to_ascii_lowercase().as_str() {
            "load" | "open" => Command::Load(path_arg(rest, "load")?),
            "restore" => Command::Restore,
            "kernel" => {
                let (name, matrix) = rest
                    .split_once(char::is_whitespace)
                    .map(|(n, m)| (n, m.trim()))
                    .unwrap_or((rest, ""));
                if name.is_empty() {
                    bail!("kernel needs a name");
                }

                if name.eq_ignore_ascii_case("custom") {
                    let matrix = Some(matrix.to_string()).filter(|m| !m.is_empty());
                    Command::Kernel(KernelArg::Custom(matrix))
                } else {
                    // Names may contain spaces, e.g. `average blur`.
                    match rest.parse()? {
                        NamedKernel::Custom => Command::Kernel(KernelArg::Custom(None)),
                        named => Command::Kernel(KernelArg::Named(named)),
                    }
                }
            }
            "reset" => Command::Reset,
            "show" => Command::Show,
            "apply-kernel" | "apply_kernel" => Command::ApplyKernel,
            "threshold" => {
                if rest.is_empty() {
                    bail!("threshold needs a method");
                }
                Command::Threshold(rest.parse()?)
            }
            "cutoff" => {
                let value = rest
                    .parse::<u8>()
                    .with_context(|| format!("cutoff must be an integer in 0..=255, got `{rest}`"))?;
                Command::Cutoff(value)
            }
            "apply-threshold" | "apply_threshold" => Command::ApplyThreshold,
            "persist" => {
                let mut parts = rest.split_whitespace();
                let target = match parts.next() {
                    Some("kernel") => PersistTarget::Kernel,
                    Some("threshold") => PersistTarget::Threshold,
                    _ => bail!("persist needs `kernel` or `threshold`"),
                };
                let value = on_off(parts.next().ok_or_else(|| anyhow!("persist needs on or off"))?)?;
                Command::Persist(target, value)
            }
            "save" => Command::Save(path_arg(rest, "save")?),
            "save-hist" | "save_hist" => Command::SaveHist(path_arg(rest, "save-hist")?),
            "status" => Command::Status,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            other => bail!("unknown command `{other}`, try `help`"),
        };

        Ok(command)
    }
}
