use crate::process::ProcessError;
use crate::state::SharedState;
use nix::sys::signal::{kill, Signal};
use nix::sys::wait::waitpid;
use signal_hook::consts::signal::{SIGINT, SIGTSTP};
use signal_hook::low_level;
use std::sync::Arc;

/// Registers the two shell signal handlers for the lifetime of the process.
/// Both close over the shared state; neither touches anything else, so every
/// operation they perform is async-signal-safe (kill, waitpid, atomics).
pub fn install_handlers(state: Arc<SharedState>) -> Result<(), ProcessError> {
    let interrupt_state = Arc::clone(&state);
    unsafe {
        low_level::register(SIGINT, move || handle_interrupt(&interrupt_state))
            .map_err(|e| ProcessError::Signal(e.to_string()))?;
        low_level::register(SIGTSTP, move || handle_stop_request(&state))
            .map_err(|e| ProcessError::Signal(e.to_string()))?;
    }
    Ok(())
}

/// SIGINT: terminate the foreground child, if any, and collect its status
/// right here so the launcher's own wait never races the report. The shell
/// itself is never terminated by this signal.
fn handle_interrupt(state: &SharedState) {
    if let Some(pid) = state.foreground() {
        let _ = kill(pid, Signal::SIGTERM);
        if let Ok(status) = waitpid(pid, None) {
            state.record_status(status);
        }
    }
}

/// SIGTSTP: flip foreground-only mode. No I/O here; the prompt loop prints
/// the announcement the next time it runs.
fn handle_stop_request(state: &SharedState) {
    state.toggle_foreground_only();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{LastStatus, ModeChange};
    use nix::sys::wait::WaitStatus;
    use nix::unistd::Pid;

    #[test]
    fn test_interrupt_without_foreground_child_is_absorbed() {
        let state = SharedState::new();
        state.record_status(WaitStatus::Exited(Pid::from_raw(1), 9));

        handle_interrupt(&state);

        assert_eq!(state.last_status(), LastStatus::Exited(9));
        assert_eq!(state.foreground(), None);
    }

    #[test]
    fn test_interrupt_terminates_foreground_child() {
        let child = std::process::Command::new("sleep")
            .arg("30")
            .spawn()
            .expect("failed to spawn child");
        let pid = Pid::from_raw(child.id() as i32);

        let state = SharedState::new();
        state.set_foreground(pid);

        handle_interrupt(&state);

        // The handler reaped the child itself and recorded the SIGTERM.
        assert_eq!(state.last_status(), LastStatus::Signaled(15));
        assert_eq!(
            waitpid(pid, None),
            Err(nix::errno::Errno::ECHILD),
            "child must already be reaped by the handler"
        );
        // Clearing the pid stays with the launcher, not the handler.
        assert_eq!(state.foreground(), Some(pid));
        state.clear_foreground();
    }

    #[test]
    fn test_stop_request_toggles_mode() {
        let state = SharedState::new();

        handle_stop_request(&state);
        assert!(state.foreground_only());
        assert_eq!(
            state.take_mode_change(),
            Some(ModeChange::EnteredForegroundOnly)
        );

        handle_stop_request(&state);
        assert!(!state.foreground_only());
        assert_eq!(
            state.take_mode_change(),
            Some(ModeChange::ExitedForegroundOnly)
        );
    }
}
