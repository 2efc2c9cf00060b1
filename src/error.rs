//! Exit codes.

use serde::Serialize;

/// Process exit codes.
///
/// Non-fatal per-file errors do not change the code; they are part of the
/// report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// The run completed.
    Success = 0,
    /// A fatal error stopped the run.
    GeneralError = 1,
    /// The run was interrupted by Ctrl+C.
    Interrupted = 130,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_values() {
        assert_eq!(ExitCode::Success.as_i32(), 0);
        assert_eq!(ExitCode::GeneralError.as_i32(), 1);
        assert_eq!(
            ExitCode::Interrupted.as_i32(),
            crate::signal::EXIT_CODE_INTERRUPTED
        );
    }
}
