use crate::state::SharedState;
use nix::sys::signal::{kill, Signal};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;

/// Tracks the pids of live background children. Insertion order is
/// irrelevant; removal happens only inside the reap cycle.
#[derive(Debug, Default)]
pub struct JobRegistry {
    pids: Vec<Pid>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, pid: Pid) {
        self.pids.push(pid);
    }

    pub fn is_empty(&self) -> bool {
        self.pids.is_empty()
    }

    pub fn contains(&self, pid: Pid) -> bool {
        self.pids.contains(&pid)
    }

    /// Non-blocking check of every tracked pid, run once per prompt cycle.
    /// Finished children are removed, their status recorded, and one
    /// completion message printed each.
    pub fn reap_finished(&mut self, state: &SharedState) {
        self.pids.retain(|&pid| {
            match waitpid(pid, Some(WaitPidFlag::WNOHANG)) {
                Ok(WaitStatus::StillAlive) => true,
                Ok(status @ (WaitStatus::Exited(..) | WaitStatus::Signaled(..))) => {
                    state.record_status(status);
                    println!("background pid {} is done : {}", pid, state.last_status());
                    false
                }
                // Stopped or continued: still ours to track.
                Ok(_) => true,
                // ECHILD and friends: nothing left to wait for.
                Err(_) => false,
            }
        });
    }

    /// Best-effort termination request to every tracked child. Used by the
    /// `exit` builtin; no wait, no status collection.
    pub fn terminate_all(&self) {
        for &pid in &self.pids {
            let _ = kill(pid, Signal::SIGTERM);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::LastStatus;
    use nix::sys::wait::WaitStatus;
    use std::process::{Command, Stdio};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_reap_empty_registry_is_noop() {
        let state = SharedState::new();
        state.record_status(WaitStatus::Exited(Pid::from_raw(1), 7));

        let mut registry = JobRegistry::new();
        registry.reap_finished(&state);

        assert!(registry.is_empty());
        assert_eq!(state.last_status(), LastStatus::Exited(7));
    }

    #[test]
    fn test_reap_removes_finished_child() {
        let child = Command::new("true")
            .stdout(Stdio::null())
            .spawn()
            .expect("failed to spawn child");
        let pid = Pid::from_raw(child.id() as i32);

        let state = SharedState::new();
        let mut registry = JobRegistry::new();
        registry.add(pid);
        assert!(registry.contains(pid));

        // The child exits on its own; poll until the reaper notices.
        let mut waited = Duration::ZERO;
        while registry.contains(pid) {
            registry.reap_finished(&state);
            thread::sleep(Duration::from_millis(10));
            waited += Duration::from_millis(10);
            assert!(waited < Duration::from_secs(5), "child never reaped");
        }

        assert!(registry.is_empty());
        assert_eq!(state.last_status(), LastStatus::Exited(0));
    }

    #[test]
    fn test_reap_keeps_running_child() {
        let child = Command::new("sleep")
            .arg("30")
            .spawn()
            .expect("failed to spawn child");
        let pid = Pid::from_raw(child.id() as i32);

        let state = SharedState::new();
        let mut registry = JobRegistry::new();
        registry.add(pid);

        registry.reap_finished(&state);
        assert!(registry.contains(pid));
        assert_eq!(state.last_status(), LastStatus::Exited(0));

        registry.terminate_all();
        let mut waited = Duration::ZERO;
        while registry.contains(pid) {
            registry.reap_finished(&state);
            thread::sleep(Duration::from_millis(10));
            waited += Duration::from_millis(10);
            assert!(waited < Duration::from_secs(5), "child never reaped");
        }
        assert_eq!(state.last_status(), LastStatus::Signaled(15));
    }
}
