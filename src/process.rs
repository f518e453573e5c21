//! Command execution wrapper for external tools.
//!
//! Provides [`Cmd`], a thin builder over `std::process::Command` that
//! captures output and turns spawn failures and non-zero exits into
//! errors carrying the tool's combined output for diagnostics.

use anyhow::{Context, Result};
use std::ffi::OsString;
use std::path::Path;
use std::process::Command;

/// Captured output of a successfully finished command.
#[derive(Debug)]
pub struct CmdOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Builder for running an external command and collecting its output.
///
/// # Example
///
/// ```rust,ignore
/// use iso_staging::process::Cmd;
///
/// let result = Cmd::new("sha512sum")
///     .arg_path(Path::new("image.iso"))
///     .error_msg("sha512sum failed. Install coreutils.")
///     .run()?;
/// println!("{}", result.stdout);
/// ```
pub struct Cmd {
    program: String,
    args: Vec<OsString>,
    error_msg: Option<String>,
}

impl Cmd {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            args: Vec::new(),
            error_msg: None,
        }
    }

    pub fn arg(mut self, arg: &str) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append a path argument without lossy string conversion.
    pub fn arg_path(mut self, path: &Path) -> Self {
        self.args.push(path.as_os_str().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Message prepended to the error if the command fails.
    pub fn error_msg(mut self, msg: impl Into<String>) -> Self {
        self.error_msg = Some(msg.into());
        self
    }

    /// Run the command to completion, capturing stdout and stderr.
    ///
    /// Blocks until the child exits; the child is fully waited on before
    /// this returns. Fails if the program cannot be started or exits
    /// non-zero, appending any output the tool produced to the error.
    pub fn run(self) -> Result<CmdOutput> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .output()
            .with_context(|| {
                match &self.error_msg {
                    Some(msg) => format!("{} (could not start '{}')", msg, self.program),
                    None => format!("could not start '{}'", self.program),
                }
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            let msg = self
                .error_msg
                .unwrap_or_else(|| format!("'{}' failed", self.program));
            let mut combined = String::new();
            if !stdout.is_empty() {
                combined.push_str(&stdout);
            }
            if !stderr.is_empty() {
                combined.push_str(&stderr);
            }
            if combined.is_empty() {
                anyhow::bail!("{}: '{}' exited with {}", msg, self.program, output.status);
            }
            anyhow::bail!(
                "{}: '{}' exited with {}. Output:\n{}",
                msg,
                self.program,
                output.status,
                combined
            );
        }

        Ok(CmdOutput { stdout, stderr })
    }
}
