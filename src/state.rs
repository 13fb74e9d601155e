use nix::sys::wait::WaitStatus;
use nix::unistd::Pid;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU8, Ordering};

const MODE_CHANGE_NONE: u8 = 0;
const MODE_CHANGE_ENTERED: u8 = 1;
const MODE_CHANGE_EXITED: u8 = 2;

/// Status of the most recently finished foreground or reaped background
/// child, as shown by the `status` builtin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LastStatus {
    Exited(i32),
    Signaled(i32),
}

impl fmt::Display for LastStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LastStatus::Exited(code) => write!(f, "exit code {}", code),
            LastStatus::Signaled(signal) => write!(f, "terminating signal {}", signal),
        }
    }
}

/// A pending foreground-only mode announcement, set by the SIGTSTP handler
/// and printed (once) by the prompt loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeChange {
    EnteredForegroundOnly,
    ExitedForegroundOnly,
}

impl fmt::Display for ModeChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModeChange::EnteredForegroundOnly => {
                write!(f, "Entering foreground-only mode (& is now ignored)")
            }
            ModeChange::ExitedForegroundOnly => write!(f, "Exiting foreground-only mode"),
        }
    }
}

/// Shell-wide state shared between the main loop and the signal handlers.
///
/// Every field is a single atomic so that handlers never need a lock:
/// `last_status` holds an exit code as-is and a terminating signal negated,
/// `foreground_pid` uses 0 as the "no foreground child" sentinel.
#[derive(Debug, Default)]
pub struct SharedState {
    last_status: AtomicI32,
    foreground_only: AtomicBool,
    pending_mode_change: AtomicU8,
    foreground_pid: AtomicI32,
}

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_status(&self) -> LastStatus {
        let raw = self.last_status.load(Ordering::SeqCst);
        if raw >= 0 {
            LastStatus::Exited(raw)
        } else {
            LastStatus::Signaled(-raw)
        }
    }

    /// Records a child's termination. Stopped/continued reports are not
    /// terminations and leave the last status alone.
    pub fn record_status(&self, status: WaitStatus) {
        match status {
            WaitStatus::Exited(_, code) => self.last_status.store(code, Ordering::SeqCst),
            WaitStatus::Signaled(_, signal, _) => {
                self.last_status.store(-(signal as i32), Ordering::SeqCst)
            }
            _ => {}
        }
    }

    pub fn foreground_only(&self) -> bool {
        self.foreground_only.load(Ordering::SeqCst)
    }

    /// Flips foreground-only mode and overwrites the pending announcement,
    /// so back-to-back toggles only ever announce the latest state.
    pub fn toggle_foreground_only(&self) {
        let was_on = self.foreground_only.fetch_xor(true, Ordering::SeqCst);
        let pending = if was_on {
            MODE_CHANGE_EXITED
        } else {
            MODE_CHANGE_ENTERED
        };
        self.pending_mode_change.store(pending, Ordering::SeqCst);
    }

    /// Consumes the pending announcement, if any. One call per prompt.
    pub fn take_mode_change(&self) -> Option<ModeChange> {
        match self
            .pending_mode_change
            .swap(MODE_CHANGE_NONE, Ordering::SeqCst)
        {
            MODE_CHANGE_ENTERED => Some(ModeChange::EnteredForegroundOnly),
            MODE_CHANGE_EXITED => Some(ModeChange::ExitedForegroundOnly),
            _ => None,
        }
    }

    pub fn set_foreground(&self, pid: Pid) {
        self.foreground_pid.store(pid.as_raw(), Ordering::SeqCst);
    }

    pub fn clear_foreground(&self) {
        self.foreground_pid.store(0, Ordering::SeqCst);
    }

    pub fn foreground(&self) -> Option<Pid> {
        match self.foreground_pid.load(Ordering::SeqCst) {
            0 => None,
            raw => Some(Pid::from_raw(raw)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::sys::signal::Signal;

    #[test]
    fn test_status_defaults_to_exit_zero() {
        let state = SharedState::new();
        assert_eq!(state.last_status(), LastStatus::Exited(0));
        assert_eq!(state.last_status().to_string(), "exit code 0");
    }

    #[test]
    fn test_status_records_exit_and_signal() {
        let state = SharedState::new();
        state.record_status(WaitStatus::Exited(Pid::from_raw(100), 1));
        assert_eq!(state.last_status(), LastStatus::Exited(1));

        state.record_status(WaitStatus::Signaled(
            Pid::from_raw(100),
            Signal::SIGTERM,
            false,
        ));
        assert_eq!(state.last_status(), LastStatus::Signaled(15));
        assert_eq!(state.last_status().to_string(), "terminating signal 15");
    }

    #[test]
    fn test_mode_toggle_announces_latest_only() {
        let state = SharedState::new();
        assert_eq!(state.take_mode_change(), None);

        state.toggle_foreground_only();
        assert!(state.foreground_only());

        // A second toggle before the prompt overwrites the announcement.
        state.toggle_foreground_only();
        assert!(!state.foreground_only());
        assert_eq!(
            state.take_mode_change(),
            Some(ModeChange::ExitedForegroundOnly)
        );
        assert_eq!(state.take_mode_change(), None);
    }

    #[test]
    fn test_foreground_pid_sentinel() {
        let state = SharedState::new();
        assert_eq!(state.foreground(), None);
        state.set_foreground(Pid::from_raw(321));
        assert_eq!(state.foreground(), Some(Pid::from_raw(321)));
        state.clear_foreground();
        assert_eq!(state.foreground(), None);
    }
}
