#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,

    /// At least one scenario finished below `--min-success-rate`.
    SuccessThresholdFailed = 11,

    /// Bad flags, unreadable or invalid scenario files, unknown scenario names.
    InvalidInput = 30,

    /// IO failures and other errors raised while running.
    RuntimeError = 40,
}

impl ExitCode {
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    #[must_use]
    pub fn from_threshold(passed: bool) -> Self {
        if passed {
            Self::Success
        } else {
            Self::SuccessThresholdFailed
        }
    }
}
