use super::ast::{DeclId, NodeId};
use super::token::{Pos, Token, TokenKind};
use crate::error::{Diagnostic, Error, TokenInfo};
use std::collections::VecDeque;

pub struct Parser<I: Iterator<Item = Token>> {
    tokens: I,
    /// Pushback queue for lookahead
    buffer: VecDeque<Token>,
    /// Sequence number of `buffer[0]`
    index: usize,
    eof: Token,
    /// Index of the token the last syntax error was reported at
    last_error: Option<usize>,
    errors: Vec<Diagnostic>,
    next_node: u32,
    next_decl: u32,
}

impl<I: Iterator<Item = Token>> Parser<I> {
    pub fn new(tokens: I) -> Self {
        Parser {
            tokens,
            buffer: VecDeque::new(),
            index: 0,
            eof: Token::new(TokenKind::Eof, Pos::default()),
            last_error: None,
            errors: Vec::new(),
            next_node: 0,
            next_decl: 0,
        }
    }

    /// Record an error. A second syntax error at the same offending token is dropped.
    pub fn error(&mut self, err: Error) {
        let pos = match &err {
            Error::UnexpectedToken { found, .. } => {
                if self.last_error == Some(found.index) {
                    return;
                }
                self.last_error = Some(found.index);
                found.pos
            }
            _ => self.peek().pos,
        };
        self.errors.push(Diagnostic::new(pos, err));
    }

    /// Record an error that does not interrupt parsing.
    pub fn report(&mut self, pos: Pos, err: Error) {
        self.errors.push(Diagnostic::new(pos, err));
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn into_errors(self) -> Vec<Diagnostic> {
        self.errors
    }

    pub fn node_id(&mut self) -> NodeId {
        self.next_node += 1;
        NodeId(self.next_node)
    }

    pub fn decl_id(&mut self) -> DeclId {
        self.next_decl += 1;
        DeclId(self.next_decl)
    }

    /// Number of tokens consumed so far
    pub fn position(&self) -> usize {
        self.index
    }
}

impl<I: Iterator<Item = Token>> Parser<I> {
    /// Fill the queue up to `n` tokens ahead, dropping comments
    fn fill(&mut self, n: usize) {
        while self.buffer.len() <= n {
            match self.tokens.next() {
                Some(Token {
                    kind: TokenKind::Comment(_),
                    ..
                }) => continue,
                Some(token) => {
                    if token.kind == TokenKind::Eof {
                        self.eof = token.clone();
                    }
                    self.buffer.push_back(token);
                }
                None => self.buffer.push_back(self.eof.clone()),
            }
        }
    }

    /// Lookahead : Watch the token `n` ahead without consuming it
    pub fn lookahead(&mut self, n: usize) -> &Token {
        self.fill(n);
        &self.buffer[n]
    }

    /// Peek : Watch next token without consuming it
    pub fn peek(&mut self) -> &Token {
        self.lookahead(0)
    }

    /// Next : Consume next token and return it
    pub fn next(&mut self) -> Token {
        self.fill(0);
        match self.buffer.pop_front() {
            Some(token) => {
                if token.kind != TokenKind::Eof {
                    self.index += 1;
                }
                token
            }
            None => self.eof.clone(),
        }
    }

    /// Peek and check next token is match with condition
    pub fn check_if<F: Fn(&Token) -> bool>(&mut self, cond: F) -> bool {
        cond(self.peek())
    }

    /// Consume if next token is match with condition
    pub fn consume_if<F: Fn(&Token) -> bool>(&mut self, cond: F) -> Option<Token> {
        if self.check_if(cond) {
            Some(self.next())
        } else {
            None
        }
    }

    /// Consume until next token is match with condition or the input ends
    pub fn consume_until<F: Fn(&Token) -> bool>(&mut self, cond: F) {
        loop {
            let token = self.peek();
            if cond(token) || token.kind == TokenKind::Eof {
                return;
            }
            self.next();
        }
    }

    /// Next token must be match with condition
    pub fn expect_tobe<F: Fn(&Token) -> bool>(
        &mut self,
        cond: F,
        expected: &'static str,
    ) -> Result<Token, Error> {
        if self.check_if(cond) {
            Ok(self.next())
        } else {
            Err(self.unexpected(expected))
        }
    }

    pub fn unexpected(&mut self, expected: &'static str) -> Error {
        let index = self.index;
        Error::UnexpectedToken {
            expected,
            found: TokenInfo::new(self.peek(), index),
        }
    }
}

#[macro_export]
macro_rules! check {
    ($parser:expr, $kind:pat) => {
        $parser.check_if(|token| matches!(&token.kind, $kind))
    };
}

#[macro_export]
macro_rules! expect {
    ($parser:expr, $kind:pat) => {
        $parser.expect_tobe(|token| matches!(&token.kind, $kind), stringify!($kind))
    };
}

#[macro_export]
macro_rules! optional {
    ($parser:expr, $trigger:pat, $following:expr) => {
        if check!($parser, $trigger) {
            expect!($parser, $trigger)?;
            Some($following)
        } else {
            None
        }
    };
    ($parser:expr, $trigger:pat) => {
        $parser.consume_if(|token| matches!(&token.kind, $trigger))
    };
}

/// Parse repeated elements with optional delimiters
/// 3 args: { element } terminal (no delimiter)
/// 4 args: [ element { delimiter element } ] terminal (with delimiter)
#[macro_export]
macro_rules! repeat {
    ($parser:expr, $elem:expr, $terminal:pat) => {{
        let mut items = Vec::new();
        while !check!($parser, $terminal) {
            items.push($elem?);
        }
        items
    }};

    ($parser:expr, $elem:expr, $delimiter:pat, $terminal:pat) => {{
        let mut items = Vec::new();
        if !check!($parser, $terminal) {
            items.push($elem?);
            while check!($parser, $delimiter) {
                expect!($parser, $delimiter)?;
                items.push($elem?);
            }
        }
        items
    }};
}

/// Skip tokens until a synchronization point
#[macro_export]
macro_rules! recover {
    ($parser:expr, $kind:pat) => {
        $parser.consume_until(|token| matches!(&token.kind, $kind))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser(kinds: Vec<TokenKind>) -> Parser<std::vec::IntoIter<Token>> {
        let tokens = kinds
            .into_iter()
            .enumerate()
            .map(|(i, kind)| Token::new(kind, Pos::new(1, i + 1)))
            .collect::<Vec<_>>();
        Parser::new(tokens.into_iter())
    }

    #[test]
    fn test_error_once_per_token() {
        let mut parser = parser(vec![TokenKind::Plus, TokenKind::Semicolon, TokenKind::Eof]);
        let first = parser.unexpected("Semicolon");
        parser.error(first);
        let again = parser.unexpected("RParen");
        parser.error(again);
        assert_eq!(parser.error_count(), 1);

        parser.next();
        let next = parser.unexpected("Plus");
        parser.error(next);
        assert_eq!(parser.error_count(), 2);

        let errors = parser.into_errors();
        assert_eq!(errors[0].pos, Pos::new(1, 1));
        assert_eq!(errors[1].pos, Pos::new(1, 2));
    }

    #[test]
    fn test_report_is_not_deduplicated() {
        let mut parser = parser(vec![TokenKind::Eof]);
        parser.report(Pos::new(1, 1), Error::Internal("a".to_string()));
        parser.report(Pos::new(1, 1), Error::Internal("b".to_string()));
        assert_eq!(parser.error_count(), 2);
    }
}
