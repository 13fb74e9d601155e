use std::ffi::CString;
use std::process;
use std::sync::Arc;

use nix::errno::Errno;
use nix::fcntl::{open, OFlag};
use nix::sys::signal::{sigprocmask, SigSet, SigmaskHow, Signal};
use nix::sys::stat::Mode;
use nix::sys::wait::waitpid;
use nix::unistd::{dup2, execvp, fork, ForkResult, Pid};

use super::{ProcessError, EXIT_EXEC_FAILED, EXIT_REDIRECT_FAILED};
use crate::jobs::JobRegistry;
use crate::parser::Command;
use crate::state::SharedState;

const DEV_NULL: &str = "/dev/null";

/// Forks and execs external commands, deciding foreground/background
/// placement from the shared mode flags.
pub struct Launcher {
    state: Arc<SharedState>,
}

impl Launcher {
    pub fn new(state: Arc<SharedState>) -> Self {
        Launcher { state }
    }

    /// Runs a non-builtin command. Background placement honors the `&`
    /// request only while foreground-only mode is off; the launcher, not
    /// the parser, has the final say.
    ///
    /// Fork failure is the one error here that the caller must treat as
    /// fatal to the whole shell.
    pub fn launch(&self, command: &Command, jobs: &mut JobRegistry) -> Result<(), ProcessError> {
        let args = to_cstrings(&command.arguments)?;
        let program = args
            .first()
            .cloned()
            .ok_or_else(|| ProcessError::InvalidArgument("empty command".to_string()))?;

        // One consistent read; a SIGTSTP mid-launch takes effect next line.
        let background = command.backgrounded && !self.state.foreground_only();

        // SIGINT stays blocked from before fork until the child's pid is
        // published, so the interrupt handler can never fire while the
        // foreground pid is stale.
        let mut sigint = SigSet::empty();
        sigint.add(Signal::SIGINT);
        sigprocmask(SigmaskHow::SIG_BLOCK, Some(&sigint), None)
            .map_err(|e| ProcessError::Signal(e.to_string()))?;

        let fork_result = unsafe { fork() };
        match fork_result {
            Err(errno) => {
                let _ = sigprocmask(SigmaskHow::SIG_UNBLOCK, Some(&sigint), None);
                Err(ProcessError::Fork(errno.to_string()))
            }
            Ok(ForkResult::Child) => {
                // The blocked mask survives exec; the child must not start
                // its program with SIGINT masked off.
                let _ = sigprocmask(SigmaskHow::SIG_UNBLOCK, Some(&sigint), None);
                run_child(command, background, &program, &args)
            }
            Ok(ForkResult::Parent { child }) => {
                if background {
                    let _ = sigprocmask(SigmaskHow::SIG_UNBLOCK, Some(&sigint), None);
                    jobs.add(child);
                    println!("background pid is {}", child);
                    Ok(())
                } else {
                    self.state.set_foreground(child);
                    let _ = sigprocmask(SigmaskHow::SIG_UNBLOCK, Some(&sigint), None);
                    let result = self.wait_foreground(child);
                    self.state.clear_foreground();
                    result
                }
            }
        }
    }

    fn wait_foreground(&self, child: Pid) -> Result<(), ProcessError> {
        loop {
            match waitpid(child, None) {
                Ok(status) => {
                    self.state.record_status(status);
                    return Ok(());
                }
                Err(Errno::EINTR) => continue,
                // The interrupt handler reaped the child first and already
                // recorded its status.
                Err(Errno::ECHILD) => return Ok(()),
                Err(e) => return Err(ProcessError::Wait(e.to_string())),
            }
        }
    }
}

/// Child side of the fork: wire descriptors, then exec. Never returns to
/// the shell's code paths.
fn run_child(command: &Command, implicit_null: bool, program: &CString, args: &[CString]) -> ! {
    if let Err(message) = wire_redirections(command, implicit_null) {
        eprintln!("{}", message);
        process::exit(EXIT_REDIRECT_FAILED);
    }
    if let Err(e) = execvp(program, args) {
        eprintln!("{}: {}", command.arguments[0], e);
    }
    process::exit(EXIT_EXEC_FAILED)
}

/// Unmonitored background jobs get both standard streams pointed at the
/// null device first; explicit redirections are applied after and override.
fn wire_redirections(command: &Command, implicit_null: bool) -> Result<(), String> {
    if implicit_null {
        let dev_null = open(DEV_NULL, OFlag::O_RDWR, Mode::empty())
            .map_err(|e| format!("{}: {}", DEV_NULL, e))?;
        dup_onto(dev_null, libc::STDIN_FILENO)?;
        dup_onto(dev_null, libc::STDOUT_FILENO)?;
    }

    if let Some(path) = &command.input_redirect {
        let fd = open(path.as_str(), OFlag::O_RDONLY, Mode::empty())
            .map_err(|e| format!("cannot open {} for input: {}", path, e))?;
        dup_onto(fd, libc::STDIN_FILENO)?;
    }

    if let Some(path) = &command.output_redirect {
        let fd = open(
            path.as_str(),
            OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_TRUNC,
            Mode::from_bits_truncate(0o777),
        )
        .map_err(|e| format!("cannot open {} for output: {}", path, e))?;
        dup_onto(fd, libc::STDOUT_FILENO)?;
    }

    Ok(())
}

fn dup_onto(fd: i32, target: i32) -> Result<(), String> {
    dup2(fd, target)
        .map(|_| ())
        .map_err(|e| format!("dup2 failed: {}", e))
}

fn to_cstrings(arguments: &[String]) -> Result<Vec<CString>, ProcessError> {
    arguments
        .iter()
        .map(|arg| {
            CString::new(arg.as_str()).map_err(|_| {
                ProcessError::InvalidArgument(format!("argument contains NUL byte: {:?}", arg))
            })
        })
        .collect()
}
