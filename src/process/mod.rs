use std::fmt;

pub mod launcher;
pub mod signal;

pub use launcher::Launcher;

/// Shell process exit code when fork fails: with no child to contain the
/// failure, the shell itself terminates.
pub const EXIT_FORK_FAILED: i32 = 3;
/// Child exit code when a redirection target cannot be opened or wired up.
pub const EXIT_REDIRECT_FAILED: i32 = 2;
/// Child exit code when exec cannot replace the process image.
pub const EXIT_EXEC_FAILED: i32 = 1;

#[derive(Debug)]
pub enum ProcessError {
    Fork(String),
    Signal(String),
    InvalidArgument(String),
    Wait(String),
}

impl fmt::Display for ProcessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessError::Fork(msg) => write!(f, "fork failed: {}", msg),
            ProcessError::Signal(msg) => write!(f, "Signal error: {}", msg),
            ProcessError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            ProcessError::Wait(msg) => write!(f, "Wait error: {}", msg),
        }
    }
}
