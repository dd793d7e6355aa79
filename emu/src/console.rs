use crate::error::Error;
use color_print::cprint;
use std::collections::VecDeque;
use std::io::{BufRead, Write};

/// Character I/O behind the print and read syscalls.
pub trait Console {
    fn write(&mut self, text: &str) -> Result<(), Error>;
    fn peek_char(&mut self) -> Result<Option<char>, Error>;
    fn next_char(&mut self) -> Result<Option<char>, Error>;

    fn read_char(&mut self) -> Result<char, Error> {
        self.next_char()?.ok_or(Error::EndOfInput)
    }

    /// Optionally signed decimal, after any whitespace. The rest of the line is consumed.
    fn read_int(&mut self) -> Result<i32, Error> {
        while self.peek_char()?.is_some_and(char::is_whitespace) {
            self.next_char()?;
        }
        let mut text = String::new();
        if self.peek_char()? == Some('-') {
            text.push('-');
            self.next_char()?;
        }
        while let Some(ch) = self.peek_char()?.filter(char::is_ascii_digit) {
            text.push(ch);
            self.next_char()?;
        }
        let value = match text.parse::<i64>() {
            Ok(value) => i32::try_from(value).map_err(|_| Error::IntRange(text))?,
            Err(_) if text.len() > 1 => return Err(Error::IntRange(text)),
            Err(_) if self.peek_char()?.is_none() => return Err(Error::EndOfInput),
            Err(_) => 0,
        };
        while let Some(ch) = self.next_char()? {
            if ch == '\n' {
                break;
            }
        }
        Ok(value)
    }
}

/// Process stdin/stdout, or any reader in place of stdin.
pub struct StdConsole {
    style: bool,
    input: Box<dyn BufRead>,
    pending: VecDeque<char>,
}

impl StdConsole {
    pub fn new(style: bool, input: Box<dyn BufRead>) -> Self {
        StdConsole {
            style,
            input,
            pending: VecDeque::new(),
        }
    }

    pub fn stdin(style: bool) -> Self {
        Self::new(style, Box::new(std::io::BufReader::new(std::io::stdin())))
    }

    fn fill(&mut self) -> Result<(), Error> {
        if self.pending.is_empty() {
            let mut line = String::new();
            self.input.read_line(&mut line)?;
            self.pending.extend(line.chars());
        }
        Ok(())
    }
}

impl Console for StdConsole {
    fn write(&mut self, text: &str) -> Result<(), Error> {
        match self.style {
            true => cprint!("<r,s>{}</>", text),
            false => print!("{}", text),
        }
        std::io::stdout().flush()?;
        Ok(())
    }

    fn peek_char(&mut self) -> Result<Option<char>, Error> {
        self.fill()?;
        Ok(self.pending.front().copied())
    }

    fn next_char(&mut self) -> Result<Option<char>, Error> {
        self.fill()?;
        Ok(self.pending.pop_front())
    }
}

/// In-memory console for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct BufferConsole {
    input: VecDeque<char>,
    pub output: String,
}

impl BufferConsole {
    pub fn new(input: &str) -> Self {
        BufferConsole {
            input: input.chars().collect(),
            output: String::new(),
        }
    }
}

impl Console for BufferConsole {
    fn write(&mut self, text: &str) -> Result<(), Error> {
        self.output.push_str(text);
        Ok(())
    }

    fn peek_char(&mut self) -> Result<Option<char>, Error> {
        Ok(self.input.front().copied())
    }

    fn next_char(&mut self) -> Result<Option<char>, Error> {
        Ok(self.input.pop_front())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_int() {
        let mut console = BufferConsole::new("  42 rest\n-7\nx");
        assert_eq!(console.read_int().unwrap(), 42);
        assert_eq!(console.read_int().unwrap(), -7);
        assert_eq!(console.read_char().unwrap(), 'x');
        assert!(matches!(console.read_int(), Err(Error::EndOfInput)));
    }

    #[test]
    fn test_read_int_range() {
        let mut console = BufferConsole::new("2147483647\n-2147483648\n2147483648\n");
        assert_eq!(console.read_int().unwrap(), i32::MAX);
        assert_eq!(console.read_int().unwrap(), i32::MIN);
        assert!(matches!(console.read_int(), Err(Error::IntRange(text)) if text == "2147483648"));

        let mut console = BufferConsole::new("99999999999999999999\n");
        assert!(matches!(console.read_int(), Err(Error::IntRange(_))));
    }

    #[test]
    fn test_std_console_reads_lines() {
        let mut console = StdConsole::new(false, Box::new("12\nab\n".as_bytes()));
        assert_eq!(console.read_int().unwrap(), 12);
        assert_eq!(console.read_char().unwrap(), 'a');
        assert_eq!(console.read_char().unwrap(), 'b');
    }
}
