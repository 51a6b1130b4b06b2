use std::collections::HashSet;
use std::mem;

use once_cell::sync::Lazy;

use crate::env::runtime::errors::Error;
use crate::env::runtime::tokens::{Token, TokenType};

// '.' and '/' are handled by their own dispatch arms before this set is consulted
static PUNCTUATION: Lazy<HashSet<char>> = Lazy::new(|| {
    "{}[]?:;+-*<>=|&^@~!$%".chars().collect()
});

fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_identifier_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    whitespace: String,
    file_path: String,
}

impl Lexer {
    pub fn new(code: &str, file_path: &str) -> Self {
        Lexer {
            chars: code.chars().collect(),
            pos: 0,
            line: 1,
            whitespace: String::new(),
            file_path: file_path.to_string(),
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, Error> {
        let mut tokens = Vec::new();

        while let Some(c) = self.peek(0) {
            match c {
                ' ' | '\t' => {
                    self.whitespace.push(c);
                    self.pos += 1;
                }
                '\r' => {
                    self.pos += 1;
                    if self.peek(0) == Some('\n') {
                        self.pos += 1;
                    }
                    self.line += 1;
                    self.whitespace.clear();
                }
                '\n' => {
                    self.pos += 1;
                    self.line += 1;
                    self.whitespace.clear();
                }
                '#' => {
                    let token = self.read_directive()?;
                    tokens.push(token);
                }
                '(' => tokens.push(self.read_single(TokenType::ParenLeft)),
                ')' => tokens.push(self.read_single(TokenType::ParenRight)),
                ',' => tokens.push(self.read_single(TokenType::Comma)),
                '\'' | '"' => {
                    let token = self.read_string(c)?;
                    tokens.push(token);
                }
                '.' => {
                    if self.peek(1) == Some('.') && self.peek(2) == Some('.') {
                        let line = self.line;
                        self.pos += 3;
                        tokens.push(self.finish(TokenType::MacroVarArgs, "...".to_string(), line));
                    } else {
                        tokens.push(self.read_single(TokenType::Punctuation));
                    }
                }
                '/' => {
                    if self.peek(1) == Some('/') {
                        self.skip_line_comment();
                    } else if self.peek(1) == Some('*') {
                        self.skip_block_comment()?;
                    } else {
                        tokens.push(self.read_single(TokenType::Punctuation));
                    }
                }
                c if PUNCTUATION.contains(&c) => {
                    tokens.push(self.read_single(TokenType::Punctuation));
                }
                c if c.is_ascii_digit() => {
                    let token = self.read_number();
                    tokens.push(token);
                }
                c if is_identifier_start(c) => {
                    let line = self.line;
                    let value = self.read_run(is_identifier_continue);
                    tokens.push(self.finish(TokenType::Identifier, value, line));
                }
                other => {
                    return Err(Error::at_line(
                        "UnexpectedTokenError",
                        &format!("Unexpected character '{}'", other),
                        &self.file_path,
                        self.line,
                    ));
                }
            }
        }

        Ok(tokens)
    }

    fn peek(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    // attaches the pending whitespace run to the token and resets it
    fn finish(&mut self, kind: TokenType, value: String, line: usize) -> Token {
        Token::new(kind, value, line, mem::take(&mut self.whitespace))
    }

    fn read_single(&mut self, kind: TokenType) -> Token {
        let line = self.line;
        let c = self.chars[self.pos];
        self.pos += 1;
        self.finish(kind, c.to_string(), line)
    }

    fn read_run(&mut self, keep: fn(char) -> bool) -> String {
        let mut value = String::new();
        while let Some(c) = self.peek(0) {
            if !keep(c) {
                break;
            }
            value.push(c);
            self.pos += 1;
        }
        value
    }

    fn read_directive(&mut self) -> Result<Token, Error> {
        let line = self.line;
        self.pos += 1; // '#'
        let mut value = String::from("#");

        match self.peek(0) {
            Some(c @ ('#' | '%' | '!')) => {
                self.pos += 1;
                value.push(c);
                match self.peek(0) {
                    Some(next) if is_identifier_start(next) => {}
                    Some(next) => {
                        return Err(Error::at_line(
                            "UnexpectedTokenError",
                            &format!("Expected an identifier after '{}', got '{}'", value, next),
                            &self.file_path,
                            line,
                        ));
                    }
                    None => {
                        return Err(Error::at_line(
                            "UnexpectedEndOfCodeError",
                            &format!("Expected an identifier after '{}'", value),
                            &self.file_path,
                            line,
                        ));
                    }
                }
                value.push_str(&self.read_run(is_identifier_continue));
                let kind = match c {
                    '#' => TokenType::Directive,
                    '%' => TokenType::MacroParameter,
                    _ => TokenType::MacroKeyword,
                };
                Ok(self.finish(kind, value, line))
            }
            Some('{') => {
                self.pos += 1;
                Ok(self.finish(TokenType::DirectiveCurlyLeft, "#{".to_string(), line))
            }
            Some('}') => {
                self.pos += 1;
                Ok(self.finish(TokenType::DirectiveCurlyRight, "#}".to_string(), line))
            }
            Some('@') => {
                self.pos += 1;
                Ok(self.finish(TokenType::MacroConcat, "#@".to_string(), line))
            }
            Some(next) if is_identifier_start(next) => {
                value.push_str(&self.read_run(is_identifier_continue));
                Ok(self.finish(TokenType::Macro, value, line))
            }
            Some(next) => Err(Error::at_line(
                "UnexpectedTokenError",
                &format!("Unexpected character '{}' after '#'", next),
                &self.file_path,
                line,
            )),
            None => Err(Error::at_line(
                "UnexpectedEndOfCodeError",
                "Expected an identifier after '#'",
                &self.file_path,
                line,
            )),
        }
    }

    // integer runs, "0x" hex runs and fractional forms like "1.5"
    fn read_number(&mut self) -> Token {
        let line = self.line;
        let mut value = String::new();

        if self.peek(0) == Some('0')
            && matches!(self.peek(1), Some('x') | Some('X'))
            && self.peek(2).map(|c| c.is_ascii_hexdigit()).unwrap_or(false)
        {
            value.push(self.chars[self.pos]);
            value.push(self.chars[self.pos + 1]);
            self.pos += 2;
            value.push_str(&self.read_run(|c| c.is_ascii_hexdigit()));
            return self.finish(TokenType::Number, value, line);
        }

        value.push_str(&self.read_run(|c| c.is_ascii_digit()));
        if self.peek(0) == Some('.') && self.peek(1).map(|c| c.is_ascii_digit()).unwrap_or(false) {
            value.push('.');
            self.pos += 1;
            value.push_str(&self.read_run(|c| c.is_ascii_digit()));
        }
        self.finish(TokenType::Number, value, line)
    }

    fn read_string(&mut self, quote: char) -> Result<Token, Error> {
        let line = self.line;
        let mut value = String::new();
        value.push(quote);
        self.pos += 1;

        // a quote only terminates when preceded by an even number of backslashes
        let mut escapes: usize = 0;
        loop {
            match self.peek(0) {
                None => {
                    return Err(Error::at_line(
                        "UnterminatedStringError",
                        "Unterminated string literal",
                        &self.file_path,
                        line,
                    ));
                }
                Some('\r') | Some('\n') => {
                    return Err(Error::at_line(
                        "UnexpectedEndOfLineError",
                        "Unexpected end of line inside string literal",
                        &self.file_path,
                        line,
                    ));
                }
                Some(c) => {
                    self.pos += 1;
                    value.push(c);
                    if c == '\\' {
                        escapes += 1;
                        continue;
                    }
                    if c == quote && escapes % 2 == 0 {
                        break;
                    }
                    escapes = 0;
                }
            }
        }

        Ok(self.finish(TokenType::String, value, line))
    }

    fn skip_line_comment(&mut self) {
        while let Some(c) = self.peek(0) {
            if c == '\r' || c == '\n' {
                break;
            }
            self.pos += 1;
        }
        self.whitespace.clear();
    }

    fn skip_block_comment(&mut self) -> Result<(), Error> {
        let line = self.line;
        self.pos += 2; // "/*"
        self.whitespace.clear();

        let mut depth = 1usize;
        loop {
            match self.peek(0) {
                None => {
                    return Err(Error::at_line(
                        "UnterminatedCommentError",
                        "Unterminated block comment",
                        &self.file_path,
                        line,
                    ));
                }
                Some('/') if self.peek(1) == Some('*') => {
                    self.pos += 2;
                    depth += 1;
                }
                Some('*') if self.peek(1) == Some('/') => {
                    self.pos += 2;
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                Some('\r') => {
                    self.pos += 1;
                    if self.peek(0) == Some('\n') {
                        self.pos += 1;
                    }
                    self.line += 1;
                }
                Some('\n') => {
                    self.pos += 1;
                    self.line += 1;
                }
                Some(_) => {
                    self.pos += 1;
                }
            }
        }
    }
}
