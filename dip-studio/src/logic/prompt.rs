use anyhow::Result;
use image_transform::{Session, TransformError};
use std::io::{BufRead, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptOutcome {
    Accepted,
    Cancelled,
}

fn bracket_depth(text: &str) -> i64 {
    text.chars().fold(0, |depth, c| match c {
        '[' => depth + 1,
        ']' => depth - 1,
        _ => depth,
    })
}

/// Reads one matrix, possibly spread over several lines until its brackets
/// balance. An empty line or end of input yields `None`.
fn read_matrix<R: BufRead>(input: &mut R) -> Result<Option<String>> {
    let mut text = String::new();

    loop {
        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Ok(None);
        }

        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        text.push_str(line);
        if bracket_depth(&text) <= 0 {
            return Ok(Some(text));
        }
    }
}

/// Asks for a custom kernel until one is accepted or the prompt is cancelled.
/// The pre-filled text is the active kernel.
pub fn prompt_custom_kernel<R: BufRead, W: Write>(
    session: &mut Session,
    input: &mut R,
    output: &mut W,
) -> Result<PromptOutcome> {
    loop {
        writeln!(output, "Enter a square kernel matrix (empty line cancels):")?;
        writeln!(output, "{}", session.kernel_text())?;
        write!(output, "matrix> ")?;
        output.flush()?;

        let Some(text) = read_matrix(input)? else {
            writeln!(output)?;
            log::debug!("custom kernel prompt cancelled");
            return Ok(PromptOutcome::Cancelled);
        };

        match session.set_custom_kernel(&text) {
            Ok(()) => return Ok(PromptOutcome::Accepted),
            Err(e) if !e.is_input_error() => return Err(e.into()),
            Err(TransformError::Shape { .. }) => {
                writeln!(output, "Non-square matrix entered :(\nPlease try again")?;
            }
            Err(_) => {
                writeln!(output, "Invalid matrix entered :/\nPlease try again")?;
            }
        }
    }
}
