use super::{
    command::{Command, HELP, KernelArg, PersistTarget},
    prompt::{PromptOutcome, prompt_custom_kernel},
};
use crate::config;
use anyhow::{Result, bail};
use image_transform::{NamedKernel, Session};
use log::{debug, warn};
use std::io::{BufRead, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

#[derive(Debug)]
pub struct Shell {
    session: Session,
    persist_kernel: bool,
    persist_threshold: bool,
}

impl Shell {
    pub fn new(mut session: Session, pipeline: &config::Pipeline) -> Self {
        session.set_cutoff(pipeline.default_cutoff);

        Self {
            session,
            persist_kernel: pipeline.persist_kernel,
            persist_threshold: pipeline.persist_threshold,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn persists(&self, target: PersistTarget) -> bool {
        match target {
            PersistTarget::Kernel => self.persist_kernel,
            PersistTarget::Threshold => self.persist_threshold,
        }
    }

    /// Reads commands until `quit` or end of input.
    pub fn run<R: BufRead, W: Write>(&mut self, input: &mut R, output: &mut W) -> Result<()> {
        loop {
            write!(output, "> ")?;
            output.flush()?;

            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                writeln!(output)?;
                return Ok(());
            }

            if self.run_line(&line, input, output)? == Flow::Quit {
                return Ok(());
            }
        }
    }

    /// Runs one command line. Command failures are reported on `output` and
    /// leave the session as it was; only write failures are returned.
    pub fn run_line<R: BufRead, W: Write>(
        &mut self,
        line: &str,
        input: &mut R,
        output: &mut W,
    ) -> Result<Flow> {
        if line.trim().is_empty() {
            return Ok(Flow::Continue);
        }

        let result = line
            .parse::<Command>()
            .and_then(|command| self.execute(command, input, output));

        match result {
            Ok(flow) => Ok(flow),
            Err(e) => {
                warn!("`{}` failed: {e:#}", line.trim());
                writeln!(output, "error: {e:#}")?;
                Ok(Flow::Continue)
            }
        }
    }

    fn execute<R: BufRead, W: Write>(
        &mut self,
        command: Command,
        input: &mut R,
        output: &mut W,
    ) -> Result<Flow> {
        debug!("{command:?}");

        match command {
            Command::Load(path) => {
                self.session.load(&path)?;
                writeln!(output, "Image loaded from {}", path.display())?;
                self.write_status(output)?;
            }
            Command::Restore => {
                self.session.restore()?;
                writeln!(output, "Image restored from disk successfully!")?;
            }
            Command::Kernel(KernelArg::Custom(None)) => {
                if prompt_custom_kernel(&mut self.session, input, output)? == PromptOutcome::Accepted {
                    writeln!(output, "Custom kernel set")?;
                    writeln!(output, "{}", self.session.kernel_text())?;
                } else {
                    writeln!(output, "Kernel unchanged")?;
                }
            }
            Command::Kernel(KernelArg::Custom(Some(text))) => {
                self.session.set_custom_kernel(&text)?;
                writeln!(output, "Custom kernel set")?;
                writeln!(output, "{}", self.session.kernel_text())?;
            }
            Command::Kernel(KernelArg::Named(kernel)) => {
                self.session.select_kernel(kernel)?;
                writeln!(output, "{} kernel selected", kernel.name())?;
                writeln!(output, "{}", self.session.kernel_text())?;
            }
            Command::Reset => {
                self.session.reset_kernel();
                writeln!(output, "Kernel reset to identity")?;
            }
            Command::Show => {
                writeln!(output, "{}", self.session.kernel_choice().selection().name())?;
                writeln!(output, "{}", self.session.kernel_text())?;
            }
            Command::ApplyKernel => {
                if self.persist_kernel {
                    self.session.apply_kernel_commit()?;
                } else {
                    self.session.apply_kernel_preview()?;
                }
                writeln!(output, "Kernel applied successfully!")?;
            }
            Command::Threshold(method) => {
                self.session.select_threshold(method);
                writeln!(output, "{} threshold selected", method.label())?;
            }
            Command::Cutoff(cutoff) => {
                let method = self.session.threshold_method();
                if !method.uses_cutoff() {
                    bail!("{} threshold has no cutoff", method.label());
                }
                self.session.set_cutoff(cutoff);
                writeln!(output, "Cutoff set to {cutoff}")?;
            }
            Command::ApplyThreshold => {
                let method = self.session.threshold_method();
                if self.persist_threshold {
                    self.session.apply_threshold_commit()?;
                } else {
                    self.session.apply_threshold_preview()?;
                }
                writeln!(output, "{} Threshold applied successfully!", method.label())?;
            }
            Command::Persist(target, value) => {
                match target {
                    PersistTarget::Kernel => self.persist_kernel = value,
                    PersistTarget::Threshold => self.persist_threshold = value,
                }
                let state = if value { "on" } else { "off" };
                writeln!(output, "Persist {target:?} is {state}")?;
            }
            Command::Save(path) => {
                self.session.save_displayed(&path)?;
                writeln!(output, "Image stored to disk successfully!")?;
            }
            Command::SaveHist(path) => {
                self.session.save_histogram(&path)?;
                writeln!(output, "Histogram stored to disk successfully!")?;
            }
            Command::Status => self.write_status(output)?,
            Command::Help => writeln!(output, "{HELP}")?,
            Command::Quit => return Ok(Flow::Quit),
        }

        Ok(Flow::Continue)
    }

    fn write_status<W: Write>(&self, output: &mut W) -> Result<()> {
        let session = &self.session;

        match (session.source_path(), session.working(), session.displayed()) {
            (Some(path), Some(working), Some(displayed)) => {
                writeln!(output, "image:     {}", path.display())?;
                writeln!(
                    output,
                    "working:   {}x{} {:?}",
                    working.width(),
                    working.height(),
                    working.order()
                )?;
                writeln!(output, "displayed: {:?}", displayed.order())?;
            }
            _ => writeln!(output, "image:     none")?,
        }

        let method = session.threshold_method();
        writeln!(output, "kernel:    {}", session.kernel_choice().selection().name())?;
        if method.uses_cutoff() {
            writeln!(output, "threshold: {} (cutoff {})", method.label(), session.cutoff())?;
        } else {
            writeln!(output, "threshold: {}", method.label())?;
        }
        writeln!(
            output,
            "persist:   kernel {}, threshold {}",
            if self.persist_kernel { "on" } else { "off" },
            if self.persist_threshold { "on" } else { "off" },
        )?;

        Ok(())
    }
}
