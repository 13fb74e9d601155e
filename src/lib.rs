pub mod error;
pub mod flags;
pub mod jobs;
pub mod parser;
pub mod process;
pub mod shell;
pub mod state;
