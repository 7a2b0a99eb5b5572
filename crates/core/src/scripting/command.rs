//! Program-plus-arguments command lines.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An executable and the fixed leading arguments it is always called with.
///
/// `python ../picam/take_picture.py` parses to program `python` with one
/// leading argument. Call-specific arguments are appended at run time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandLine {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl CommandLine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Split a whitespace-separated command string.
    ///
    /// Returns `None` for an empty or all-whitespace string. Quoting is not
    /// interpreted; paths containing spaces must use the JSON form instead.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Build a [`tokio::process::Command`] with `extra` appended after the
    /// leading arguments.
    pub fn to_command<I, S>(&self, extra: I) -> tokio::process::Command
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        let mut cmd = tokio::process::Command::new(&self.program);
        cmd.args(&self.args).args(extra);
        cmd
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}
