//! Command handling for the interactive shell
//!
//! One line of input is one user action. Commands are parsed in `command`,
//! run against the session in `shell`, and a custom kernel is read through the
//! re-prompting dialog in `prompt`.

mod command;
mod prompt;
mod shell;

pub use command::{Command, KernelArg, PersistTarget};
pub use prompt::{PromptOutcome, prompt_custom_kernel};
pub use shell::{Flow, Shell};
