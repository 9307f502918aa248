//! Overwrite confirmation.
//!
//! The question "may I replace this file?" is asked through the
//! [`OverwriteConfirm`] trait so the conversion pipeline never touches stdin
//! itself. The binary wires [`PromptConfirm::stdio`] in; `--yes` and tests use
//! [`AssumeYes`] or a [`PromptConfirm`] over in-memory buffers.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Decides whether an existing output file may be replaced.
pub trait OverwriteConfirm {
    fn confirm_overwrite(&mut self, path: &Path) -> io::Result<bool>;
}

/// Always allows overwriting.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeYes;

impl OverwriteConfirm for AssumeYes {
    fn confirm_overwrite(&mut self, _path: &Path) -> io::Result<bool> {
        Ok(true)
    }
}

/// Asks on `output` and reads one line from `input`. Only `y` (any case)
/// confirms; anything else, including end of input, declines.
#[derive(Debug)]
pub struct PromptConfirm<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PromptConfirm<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl PromptConfirm<io::StdinLock<'static>, io::Stdout> {
    /// Prompt on stdout, answer on stdin.
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> OverwriteConfirm for PromptConfirm<R, W> {
    fn confirm_overwrite(&mut self, path: &Path) -> io::Result<bool> {
        writeln!(self.output, "Warning: Output file already exists: {}", path.display())?;
        write!(self.output, "Overwrite? (y/n): ")?;
        self.output.flush()?;

        let mut answer = String::new();
        self.input.read_line(&mut answer)?;
        let answer = answer.trim_end_matches(['\r', '\n']).to_lowercase();
        debug!("Overwrite answer: {:?}", answer);
        Ok(answer == "y")
    }
}

/// Outcome of checking the output path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputDecision {
    /// Write to this path (absent, or replacement confirmed).
    Write(PathBuf),
    /// The file exists and the user declined.
    Cancelled,
}

/// Ask `confirm` only when `output` already exists.
pub fn decide_output(
    output: &Path,
    confirm: &mut impl OverwriteConfirm,
) -> io::Result<OutputDecision> {
    if output.exists() && !confirm.confirm_overwrite(output)? {
        return Ok(OutputDecision::Cancelled);
    }
    Ok(OutputDecision::Write(output.to_path_buf()))
}
