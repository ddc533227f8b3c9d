//! Top-level diagnostic boundary for application binaries.
//!
//! [`run_app`] default-constructs an [`App`], runs it once, and turns a
//! failure into exactly one line on the error stream. The process still
//! exits successfully; callers that need failure in the exit status should
//! use the driver CLI instead, which maps error severities to exit codes.

pub mod mock;

pub use mock::MockApp;

use std::fmt::Display;
use std::io::Write;
use std::process::ExitCode;

/// A default-constructible application with a single entry operation.
pub trait App: Default {
    type Error: Display;

    fn run(&mut self) -> Result<(), Self::Error>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    /// The failure's message, as written to the error stream.
    Failed(String),
}

impl Outcome {
    /// Always 0, whatever the outcome.
    pub fn exit_status(&self) -> u8 {
        0
    }

    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.exit_status())
    }
}

/// Runs `A::default()` once. On failure writes the message and one line
/// break to `err`. A failed write to `err` is ignored.
pub fn run_app<A: App>(err: &mut impl Write) -> Outcome {
    let mut app = A::default();
    match app.run() {
        Ok(()) => {
            tracing::debug!("application completed");
            Outcome::Completed
        }
        Err(e) => {
            let message = e.to_string();
            tracing::debug!("application failed");
            let _ = writeln!(err, "{}", message).and_then(|()| err.flush());
            Outcome::Failed(message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Succeeds;

    impl App for Succeeds {
        type Error = anyhow::Error;

        fn run(&mut self) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct Boom;

    impl App for Boom {
        type Error = anyhow::Error;

        fn run(&mut self) -> anyhow::Result<()> {
            Err(anyhow::anyhow!("boom"))
        }
    }

    #[derive(Default)]
    struct Silent;

    impl App for Silent {
        type Error = String;

        fn run(&mut self) -> Result<(), String> {
            Err(String::new())
        }
    }

    #[derive(Default)]
    struct MultiLine;

    impl App for MultiLine {
        type Error = crate::OpifexError;

        fn run(&mut self) -> Result<(), crate::OpifexError> {
            Err(crate::OpifexError::TaskError {
                message: "first\nsecond".to_string(),
            })
        }
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
            Err(std::io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn success_writes_nothing() {
        let mut err = Vec::new();
        assert_eq!(run_app::<Succeeds>(&mut err), Outcome::Completed);
        assert!(err.is_empty());
    }

    #[test]
    fn failure_writes_message_and_newline() {
        let mut err = Vec::new();
        let outcome = run_app::<Boom>(&mut err);
        assert_eq!(outcome, Outcome::Failed("boom".to_string()));
        assert_eq!(err, b"boom\n");
        assert_eq!(outcome.exit_status(), 0);
    }

    #[test]
    fn empty_message_writes_only_newline() {
        let mut err = Vec::new();
        run_app::<Silent>(&mut err);
        assert_eq!(err, b"\n");
    }

    #[test]
    fn multi_line_message_gets_one_trailing_newline() {
        let mut err = Vec::new();
        run_app::<MultiLine>(&mut err);
        assert_eq!(
            String::from_utf8(err).unwrap(),
            "Build task failed: first\nsecond\n"
        );
    }

    #[test]
    fn unwritable_error_stream_still_succeeds() {
        let outcome = run_app::<Boom>(&mut BrokenPipe);
        assert_eq!(outcome.exit_status(), 0);
    }
}
