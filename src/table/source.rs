//! Raw table sources and error types.

use std::fmt;
use std::future::Future;
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;

/// Error type for table acquisition.
///
/// Any acquisition failure is fatal to the scope that requested it: a
/// missing snapshot cannot be diffed.
#[derive(Debug, Error)]
pub enum AcquisitionError {
    /// The source command could not be started.
    #[error("Failed to run '{command}': {source}")]
    Spawn {
        /// The command line that failed.
        command: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The source command ran but reported failure.
    #[error("'{command}' exited with {status}")]
    Exit {
        /// The command line that failed.
        command: String,
        /// Exit status as reported by the OS.
        status: String,
    },

    /// A non-command source failed.
    #[error("Table source error: {message}")]
    Source {
        /// Description of the failure.
        message: String,
    },
}

/// Trait for reading the raw text of a system table.
///
/// # Design
///
/// - Returns one string per output line, in source order
/// - Parsing and filtering are done by the caller, never by the source
/// - Enables dependency injection of scripted sources in tests
pub trait TableSource: Send + Sync {
    /// Reads the current table as text lines.
    ///
    /// # Errors
    ///
    /// Returns [`AcquisitionError`] when the table cannot be read at all.
    fn read_lines(&self) -> impl Future<Output = Result<Vec<String>, AcquisitionError>> + Send;
}

/// Table source that runs an external command and captures its stdout.
///
/// The child is killed if the returned future is dropped, so cancelling a
/// monitor interrupts a hung command.
#[derive(Debug, Clone)]
pub struct CommandSource {
    program: String,
    args: Vec<String>,
}

impl CommandSource {
    /// Creates a source running `program` with `args`.
    #[must_use]
    pub fn new(program: impl Into<String>, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Creates a source from a `(program, args)` pair.
    #[must_use]
    pub fn from_command((program, args): (&str, &[&str])) -> Self {
        Self::new(program, args.iter().copied())
    }
}

impl fmt::Display for CommandSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

impl TableSource for CommandSource {
    async fn read_lines(&self) -> Result<Vec<String>, AcquisitionError> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| AcquisitionError::Spawn {
                command: self.to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(AcquisitionError::Exit {
                command: self.to_string(),
                status: output.status.to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::to_owned)
            .collect())
    }
}
