use std::env;
use std::process;

use venule::error::ShellError;
use venule::flags::Flags;
use venule::process::{ProcessError, EXIT_FORK_FAILED};
use venule::shell::Shell;

fn main() {
    let mut flags = Flags::new();
    let args: Vec<String> = env::args().skip(1).collect();
    if let Err(err) = flags.parse(&args) {
        eprintln!("venule: {}", err);
        process::exit(1);
    }

    if flags.is_set("help") {
        flags.print_help();
        return;
    }

    if flags.is_set("version") {
        println!("venule {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    if let Err(err) = Shell::new(flags).and_then(|mut shell| shell.run()) {
        eprintln!("venule: {}", err);
        let code = match err {
            ShellError::Process(ProcessError::Fork(_)) => EXIT_FORK_FAILED,
            _ => 1,
        };
        process::exit(code);
    }
}
