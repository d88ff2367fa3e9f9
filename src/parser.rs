//! Hack VM parser: turns a source file into a stream of classified commands.
use crate::command::Command;
use crate::error::ParseError;

pub const COMMENT: &str = "//";

/// A forward-only cursor over the non-blank, non-comment lines of one VM
/// source file, classifying each into a [`Command`] as it is consumed.
///
/// This folds the textbook `advance`/`hasMoreCommands`/`commandType` protocol
/// into the standard `Iterator` trait: each call to `next()` skips blank and
/// comment-only lines (the old `advance`), reports exhaustion via `None` (the
/// old `hasMoreCommands`), and classifies the line it lands on (the old
/// `commandType`/`arg1`/`arg2`), yielding the 1-based source line alongside
/// the command for error reporting.
pub struct Parser<'s> {
    file_name: &'s str,
    lines: std::iter::Enumerate<std::str::Lines<'s>>,
}

impl<'s> Parser<'s> {
    pub fn new(file_name: &'s str, program: &'s str) -> Self {
        Parser {
            file_name,
            lines: program.lines().enumerate(),
        }
    }
}

impl<'s> Iterator for Parser<'s> {
    type Item = Result<(usize, Command<'s>), ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        for (row, line) in self.lines.by_ref() {
            let code_end = line.find(COMMENT).unwrap_or(line.len());
            let code = line[..code_end].trim();
            if code.is_empty() {
                continue;
            }

            let line_no = row + 1;
            return Some(
                Command::parse(code)
                    .map(|cmd| (line_no, cmd))
                    .map_err(|kind| ParseError::new(kind, self.file_name, line_no, code)),
            );
        }

        None
    }
}
