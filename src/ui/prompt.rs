// Operator prompts
//
// The installer only ever asks two kinds of question: a setting with its
// current value offered as the default, and the final go/no-go. The question
// text is written by the caller to the console transcript; prompters only
// read the reply, one line at a time, so piped input works the same as a
// terminal.

use std::io::{self, BufRead, StdinLock};

pub trait Prompter {
    /// Read the reply for a setting whose question has been printed.
    /// Returns the raw reply; an empty reply means "keep `current`".
    fn ask(&mut self, label: &str, current: &str) -> io::Result<String>;

    /// Read the go/no-go reply once the question has been printed.
    /// The reply is returned verbatim (without the line terminator).
    fn confirm(&mut self) -> io::Result<String>;
}

/// Reads one reply per line from `input`.
#[derive(Debug)]
pub struct LinePrompter<R> {
    input: R,
}

/// Replies read from the process's standard input.
pub type TerminalPrompter = LinePrompter<StdinLock<'static>>;

impl TerminalPrompter {
    pub fn stdin() -> Self {
        LinePrompter::new(io::stdin().lock())
    }
}

impl<R: BufRead> LinePrompter<R> {
    pub fn new(input: R) -> Self {
        LinePrompter { input }
    }

    /// `None` once the input is exhausted.
    fn read_reply(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(strip_line_terminator(&line).to_string()))
    }
}

impl<R: BufRead> Prompter for LinePrompter<R> {
    fn ask(&mut self, _label: &str, _current: &str) -> io::Result<String> {
        // Closed input must not be read as "keep current": the Tomcat home
        // would be asked for forever.
        self.read_reply()?.ok_or_else(|| {
            io::Error::new(io::ErrorKind::UnexpectedEof, "input closed before a reply")
        })
    }

    fn confirm(&mut self) -> io::Result<String> {
        // Closed input is an empty reply, which aborts.
        Ok(self.read_reply()?.unwrap_or_default())
    }
}

fn strip_line_terminator(line: &str) -> &str {
    line.strip_suffix('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .unwrap_or(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn strip_line_terminator_keeps_inner_whitespace() {
        assert_eq!(strip_line_terminator("  \n"), "  ");
        assert_eq!(strip_line_terminator("no\r\n"), "no");
        assert_eq!(strip_line_terminator(""), "");
        assert_eq!(strip_line_terminator("yes"), "yes");
    }

    #[test]
    fn replies_are_read_from_piped_input() {
        let mut prompter = LinePrompter::new(Cursor::new("n\npg\n\n/opt/tomcat\r\n \n"));

        assert_eq!(prompter.ask("Development mode?", "False").expect("reply"), "n");
        assert_eq!(prompter.ask("Database type", "pg").expect("reply"), "pg");
        assert_eq!(prompter.ask("Directory for SQL scripts", "").expect("reply"), "");
        assert_eq!(
            prompter.ask("Home directory for Tomcat", "").expect("reply"),
            "/opt/tomcat"
        );
        assert_eq!(prompter.confirm().expect("confirm"), " ");
    }

    #[test]
    fn closed_input_fails_a_setting_but_aborts_the_confirmation() {
        let mut prompter = LinePrompter::new(Cursor::new(""));

        let err = prompter.ask("Home directory for Tomcat", "").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
        assert!(!err.to_string().contains("Home directory for Tomcat"));
        assert_eq!(prompter.confirm().expect("confirm"), "");
    }
}
