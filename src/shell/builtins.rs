use crate::error::ShellError;
use std::env;
use std::path::PathBuf;

/// `cd` builtin: no argument means the home directory, one argument means
/// that path. Failure is reported by the caller and never fatal.
pub fn cd(arguments: &[String]) -> Result<(), ShellError> {
    let target = match arguments.first() {
        Some(path) => PathBuf::from(path),
        None => home_dir()?,
    };

    env::set_current_dir(&target)
        .map_err(|e| ShellError::ChangeDirectory(target.to_string_lossy().into_owned(), e))
}

fn home_dir() -> Result<PathBuf, ShellError> {
    env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .ok_or(ShellError::HomeDirNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    // cwd is process-global; one test exercises every case in sequence.
    #[test]
    fn test_cd_cases() {
        let original = env::current_dir().expect("no cwd");

        let temp_dir = env::temp_dir().canonicalize().expect("no temp dir");
        cd(&[temp_dir.to_string_lossy().into_owned()]).expect("cd to temp dir failed");
        assert_eq!(env::current_dir().expect("no cwd"), temp_dir);

        assert!(cd(&["/nonexistent/venule-no-such-dir".to_string()]).is_err());
        assert_eq!(env::current_dir().expect("no cwd"), temp_dir);

        cd(&[]).expect("cd home failed");
        assert_eq!(
            env::current_dir().expect("no cwd"),
            home_dir().expect("no home dir")
        );

        env::set_current_dir(original).expect("restore cwd failed");
    }
}
