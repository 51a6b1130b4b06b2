use once_cell::sync::Lazy;
use std::collections::HashSet;

pub const VARIADIC_SENTINEL: &str = "...";

pub static MACRO_KEYWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from(["#!line", "#!vargc", "#!vargs", "#!vargsp"])
});

pub static VARIADIC_ONLY_KEYWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from(["#!vargc", "#!vargs", "#!vargsp"])
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    Identifier,
    String,
    Number,
    Punctuation,
    ParenLeft,
    ParenRight,
    Comma,
    Directive,
    DirectiveCurlyLeft,
    DirectiveCurlyRight,
    Macro,
    MacroVarArgs,
    MacroParameter,
    MacroConcat,
    MacroKeyword,
}

impl TokenType {
    pub fn is_preprocessor(self) -> bool {
        matches!(
            self,
            TokenType::Directive
                | TokenType::DirectiveCurlyLeft
                | TokenType::DirectiveCurlyRight
                | TokenType::Macro
                | TokenType::MacroVarArgs
                | TokenType::MacroParameter
                | TokenType::MacroConcat
                | TokenType::MacroKeyword
        )
    }

    pub fn is_macro_body_token(self) -> bool {
        !matches!(
            self,
            TokenType::Directive
                | TokenType::DirectiveCurlyLeft
                | TokenType::DirectiveCurlyRight
                | TokenType::MacroVarArgs
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenType,
    pub value: String,
    pub line: usize,
    pub whitespace_before: String,
}

impl Token {
    pub fn new(kind: TokenType, value: String, line: usize, whitespace_before: String) -> Self {
        Self {
            kind,
            value,
            line,
            whitespace_before,
        }
    }

    // valid only for TokenType::Macro, whose value always starts with '#'
    pub fn macro_name(&self) -> &str {
        &self.value[1..]
    }

    // valid only for TokenType::MacroParameter, whose value always starts with "#%"
    pub fn parameter_name(&self) -> &str {
        &self.value[2..]
    }

    pub fn rebound(&self, line: usize) -> Token {
        let mut token = self.clone();
        token.line = line;
        token
    }
}
