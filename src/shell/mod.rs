use rustyline::config::Configurer;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::process;
use std::sync::Arc;

mod builtins;

use crate::{
    error::ShellError,
    flags::Flags,
    jobs::JobRegistry,
    parser,
    process::{signal, Launcher, ProcessError},
    state::SharedState,
};

enum Dispatch {
    Continue,
    Exit,
}

pub struct Shell {
    editor: DefaultEditor,
    state: Arc<SharedState>,
    jobs: JobRegistry,
    launcher: Launcher,
    flags: Flags,
    pid: u32,
}

impl Shell {
    pub fn new(flags: Flags) -> Result<Self, ShellError> {
        let mut editor = DefaultEditor::new()?;
        editor.set_auto_add_history(true);

        let state = Arc::new(SharedState::new());
        let launcher = Launcher::new(Arc::clone(&state));

        Ok(Shell {
            editor,
            state,
            jobs: JobRegistry::new(),
            launcher,
            flags,
            pid: process::id(),
        })
    }

    /// The control loop. Each iteration reaps finished background jobs,
    /// announces any pending mode change, prompts, and dispatches one line.
    pub fn run(&mut self) -> Result<(), ShellError> {
        signal::install_handlers(Arc::clone(&self.state))?;

        loop {
            self.jobs.reap_finished(&self.state);

            if let Some(change) = self.state.take_mode_change() {
                println!("{}", change);
            }

            match self.editor.readline(":") {
                Ok(line) => match self.dispatch(&line) {
                    Ok(Dispatch::Exit) => break,
                    Ok(Dispatch::Continue) => {}
                    Err(err) => self.report(err)?,
                },
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => break,
                Err(e) => {
                    if !self.flags.is_set("quiet") {
                        eprintln!("Error: {}", e);
                    }
                    continue;
                }
            }
        }

        // Leaving: every background child gets a termination request,
        // with no wait and no status collection.
        self.jobs.terminate_all();
        Ok(())
    }

    fn dispatch(&mut self, line: &str) -> Result<Dispatch, ShellError> {
        let command = parser::parse(line, self.pid)?;
        if command.is_blank() || command.is_comment() {
            return Ok(Dispatch::Continue);
        }

        match command.arguments[0].as_str() {
            "exit" => Ok(Dispatch::Exit),
            "status" => {
                println!("{}", self.state.last_status());
                Ok(Dispatch::Continue)
            }
            "cd" => {
                if let Err(err) = builtins::cd(&command.arguments[1..]) {
                    if !self.flags.is_set("quiet") {
                        eprintln!("{}", err);
                    }
                }
                Ok(Dispatch::Continue)
            }
            _ => {
                self.launcher.launch(&command, &mut self.jobs)?;
                Ok(Dispatch::Continue)
            }
        }
    }

    /// Failures confined to one command are reported and the loop goes on;
    /// a fork failure has no child to contain it and propagates as fatal.
    fn report(&self, err: ShellError) -> Result<(), ShellError> {
        if matches!(err, ShellError::Process(ProcessError::Fork(_))) {
            return Err(err);
        }
        if !self.flags.is_set("quiet") {
            eprintln!("{}", err);
        }
        Ok(())
    }
}
