use std::fmt;

/// One parsed input line. Redirection targets and the background flag are
/// stripped out of `arguments` during parsing and never reappear there.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Command {
    pub arguments: Vec<String>,
    pub input_redirect: Option<String>,
    pub output_redirect: Option<String>,
    pub backgrounded: bool,
}

impl Command {
    /// Blank or whitespace-only line: nothing was parsed.
    pub fn is_blank(&self) -> bool {
        self.arguments.is_empty()
    }

    /// Comment line: parsed, but the caller must suppress it.
    pub fn is_comment(&self) -> bool {
        self.arguments
            .first()
            .map(|arg| arg.starts_with('#'))
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    MissingRedirectTarget(char),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::MissingRedirectTarget(op) => {
                write!(f, "redirection operator '{}' has no target", op)
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// Parses one raw input line into a `Command`.
///
/// Tokens are whitespace-separated. Every occurrence of `$$` in a token is
/// replaced with `shell_pid` in decimal. A trailing lone `&` marks the
/// command backgrounded. Trailing `< path` / `> path` pairs are then
/// consumed right to left, at most one of each kind; the first token pair
/// that matches neither ends the scan, and everything to its left is a
/// positional argument. An `&` anywhere but last is a literal argument.
pub fn parse(line: &str, shell_pid: u32) -> Result<Command, ParseError> {
    let pid_string = shell_pid.to_string();
    let mut tokens: Vec<String> = line
        .split_whitespace()
        .map(|token| token.replace("$$", &pid_string))
        .collect();

    let mut command = Command::default();
    if tokens.is_empty() {
        return Ok(command);
    }

    // Comment lines parse as-is: the caller suppresses them, so no
    // background/redirection stripping or validation applies.
    if tokens[0].starts_with('#') {
        command.arguments = tokens;
        return Ok(command);
    }

    if tokens.last().map(String::as_str) == Some("&") {
        command.backgrounded = true;
        tokens.pop();
    }

    reject_dangling_operator(&tokens)?;

    while tokens.len() >= 2 {
        let operator = &tokens[tokens.len() - 2];
        match operator.as_str() {
            "<" if command.input_redirect.is_none() => {
                command.input_redirect = tokens.pop();
                tokens.pop();
            }
            ">" if command.output_redirect.is_none() => {
                command.output_redirect = tokens.pop();
                tokens.pop();
            }
            _ => break,
        }
    }

    reject_dangling_operator(&tokens)?;

    command.arguments = tokens;
    Ok(command)
}

// A redirection operator in final position has no filename to capture.
fn reject_dangling_operator(tokens: &[String]) -> Result<(), ParseError> {
    match tokens.last().map(String::as_str) {
        Some("<") => Err(ParseError::MissingRedirectTarget('<')),
        Some(">") => Err(ParseError::MissingRedirectTarget('>')),
        _ => Ok(()),
    }
}
