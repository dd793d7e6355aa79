use super::token::{Pos, Token, TokenKind};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::iter::Peekable;
use std::str::Chars;

static KEYWORDS: Lazy<HashMap<&'static str, TokenKind>> = Lazy::new(|| {
    HashMap::from([
        ("int", TokenKind::KwInt),
        ("char", TokenKind::KwChar),
        ("void", TokenKind::KwVoid),
        ("struct", TokenKind::KwStruct),
        ("if", TokenKind::KwIf),
        ("else", TokenKind::KwElse),
        ("while", TokenKind::KwWhile),
        ("return", TokenKind::KwReturn),
        ("sizeof", TokenKind::KwSizeof),
    ])
});

pub struct Lexer<'a> {
    iter: Peekable<Chars<'a>>,
    row: usize,
    col: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(code: &'a str) -> Self {
        Self {
            iter: code.chars().peekable(),
            row: 1,
            col: 1,
        }
    }
}

// ----------------------------------------------------------------------------
// Helpers
// ----------------------------------------------------------------------------

impl<'a> Lexer<'a> {
    fn peek_nth(&self, n: usize) -> Option<char> {
        self.iter.clone().nth(n)
    }

    fn consume(&mut self) -> Option<char> {
        let ch = self.iter.next()?;
        if ch == '\n' {
            self.row += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    fn consume_while<F: Fn(char) -> bool>(&mut self, cond: F) -> String {
        let mut lexeme = String::new();
        while let Some(ch) = self.peek_nth(0) {
            if !cond(ch) {
                break;
            }
            self.consume();
            lexeme.push(ch);
        }
        lexeme
    }

    fn pos(&self) -> Pos {
        Pos::new(self.row, self.col)
    }
}

// ----------------------------------------------------------------------------
// Lexer
// ----------------------------------------------------------------------------

impl<'a> Lexer<'a> {
    /// Tokenize the whole input. The last token is always `Eof`.
    pub fn parse(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        while let Some(ch0) = self.peek_nth(0) {
            // 0. Skip whitespaces
            if ch0.is_whitespace() {
                self.consume();
                continue;
            }

            let pos = self.pos();

            // 1. Comments and double character tokens
            if let Some(ch1) = self.peek_nth(1) {
                if ch0 == '/' && ch1 == '/' {
                    tokens.push(Token::new(self.parse_line_comment(), pos));
                    continue;
                }

                if ch0 == '/' && ch1 == '*' {
                    tokens.push(Token::new(self.parse_block_comment(), pos));
                    continue;
                }

                if let Some(kind) = double_char_token(ch0, ch1) {
                    self.consume();
                    self.consume();
                    tokens.push(Token::new(kind, pos));
                    continue;
                }
            }

            // 2. Single character token
            if let Some(kind) = single_char_token(ch0) {
                self.consume();
                tokens.push(Token::new(kind, pos));
                continue;
            }

            // 3. Number literal
            if ch0.is_ascii_digit() {
                tokens.push(Token::new(self.parse_number(), pos));
                continue;
            }

            // 4. Char literal
            if ch0 == '\'' {
                tokens.push(Token::new(self.parse_char(), pos));
                continue;
            }

            // 5. String literal
            if ch0 == '"' {
                tokens.push(Token::new(self.parse_text(), pos));
                continue;
            }

            // 6. Preprocessor line
            if ch0 == '#' {
                tokens.push(Token::new(self.parse_directive(), pos));
                continue;
            }

            // 7. Identifier or keyword
            if ch0.is_ascii_alphabetic() || ch0 == '_' {
                tokens.push(Token::new(self.parse_word(), pos));
                continue;
            }

            // Error
            self.consume();
            tokens.push(Token::new(TokenKind::Error(format!("{ch0}")), pos));
        }
        tokens.push(Token::new(TokenKind::Eof, self.pos()));
        tokens
    }

    // Comment: // hoge
    fn parse_line_comment(&mut self) -> TokenKind {
        self.consume();
        self.consume();
        let comment = self.consume_while(|ch| ch != '\n');
        TokenKind::Comment(comment.trim().to_string())
    }

    // Comment: /* hoge */
    fn parse_block_comment(&mut self) -> TokenKind {
        self.consume();
        self.consume();
        let mut comment = String::new();
        loop {
            match (self.peek_nth(0), self.peek_nth(1)) {
                (Some('*'), Some('/')) => {
                    self.consume();
                    self.consume();
                    return TokenKind::Comment(comment.trim().to_string());
                }
                (Some(_), _) => {
                    if let Some(ch) = self.consume() {
                        comment.push(ch);
                    }
                }
                (None, _) => return TokenKind::Error(format!("/*{comment}")),
            }
        }
    }

    fn parse_word(&mut self) -> TokenKind {
        let lexeme = self.consume_while(|ch| ch == '_' || ch.is_ascii_alphanumeric());
        match KEYWORDS.get(lexeme.as_str()) {
            Some(kind) => kind.clone(),
            None => TokenKind::Ident(lexeme),
        }
    }

    // Directive: #include
    fn parse_directive(&mut self) -> TokenKind {
        self.consume();
        let word = self.consume_while(|ch| ch.is_ascii_alphabetic());
        match word.as_str() {
            "include" => TokenKind::KwInclude,
            _ => TokenKind::Error(format!("#{word}")),
        }
    }

    // Char: 'a', '\n'
    fn parse_char(&mut self) -> TokenKind {
        self.consume();
        let value = match self.consume() {
            Some('\\') => self.consume().and_then(escape),
            Some('\'') | Some('\n') | None => None,
            Some(ch) => Some(ch),
        };
        match (value, self.peek_nth(0)) {
            (Some(ch), Some('\'')) => {
                self.consume();
                TokenKind::Char(ch)
            }
            (value, _) => {
                let rest = self.consume_while(|ch| ch != '\'' && ch != '\n');
                if self.peek_nth(0) == Some('\'') {
                    self.consume();
                }
                let head = value.map(String::from).unwrap_or_default();
                TokenKind::Error(format!("'{head}{rest}'"))
            }
        }
    }

    // Text: "hoge\nfuga"
    fn parse_text(&mut self) -> TokenKind {
        self.consume();
        let mut lexeme = String::new();
        let mut valid = true;
        loop {
            match self.consume() {
                Some('"') => break,
                Some('\\') => match self.consume().and_then(escape) {
                    Some(ch) => lexeme.push(ch),
                    None => valid = false,
                },
                Some('\n') | None => return TokenKind::Error(format!("\"{lexeme}")),
                Some(ch) => lexeme.push(ch),
            }
        }
        match valid {
            true => TokenKind::Text(lexeme),
            false => TokenKind::Error(format!("\"{lexeme}\"")),
        }
    }

    fn parse_number(&mut self) -> TokenKind {
        if self.peek_nth(0) == Some('0') && matches!(self.peek_nth(1), Some('x' | 'X')) {
            self.consume();
            self.consume();
            let digits = self.consume_while(|ch| ch.is_ascii_hexdigit());
            let lexeme = format!("0x{digits}");
            return match usize::from_str_radix(&digits, 16) {
                Ok(num) => TokenKind::Number(lexeme, num),
                Err(_) => TokenKind::Error(lexeme),
            };
        }
        let lexeme = self.consume_while(|ch| ch.is_ascii_digit());
        match lexeme.parse::<usize>() {
            Ok(num) => TokenKind::Number(lexeme, num),
            Err(_) => TokenKind::Error(lexeme),
        }
    }
}

fn escape(ch: char) -> Option<char> {
    match ch {
        'n' => Some('\n'),
        't' => Some('\t'),
        'r' => Some('\r'),
        '0' => Some('\0'),
        '\\' => Some('\\'),
        '\'' => Some('\''),
        '"' => Some('"'),
        _ => None,
    }
}

fn double_char_token(ch0: char, ch1: char) -> Option<TokenKind> {
    match (ch0, ch1) {
        ('=', '=') => Some(TokenKind::EqualEqual),
        ('!', '=') => Some(TokenKind::ExclEqual),
        ('<', '=') => Some(TokenKind::LAngleEqual),
        ('>', '=') => Some(TokenKind::RAngleEqual),
        ('&', '&') => Some(TokenKind::AmpAmp),
        ('|', '|') => Some(TokenKind::PipePipe),
        _ => None,
    }
}

fn single_char_token(ch: char) -> Option<TokenKind> {
    match ch {
        '=' => Some(TokenKind::Equal),
        '+' => Some(TokenKind::Plus),
        '-' => Some(TokenKind::Minus),
        '*' => Some(TokenKind::Star),
        '/' => Some(TokenKind::Slash),
        '%' => Some(TokenKind::Percent),
        '<' => Some(TokenKind::LAngle),
        '>' => Some(TokenKind::RAngle),
        ';' => Some(TokenKind::Semicolon),
        ',' => Some(TokenKind::Comma),
        '.' => Some(TokenKind::Period),
        '(' => Some(TokenKind::LParen),
        ')' => Some(TokenKind::RParen),
        '[' => Some(TokenKind::LBracket),
        ']' => Some(TokenKind::RBracket),
        '{' => Some(TokenKind::LCurly),
        '}' => Some(TokenKind::RCurly),
        _ => None,
    }
}
