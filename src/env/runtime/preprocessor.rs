use std::collections::{HashMap, HashSet};

use crate::env::runtime::errors::Error;
use crate::env::runtime::internal_structs::Macro;
use crate::env::runtime::tokens::{Token, TokenType};

// Mutable token stream with an explicit integer cursor. Expansion rewrites the
// stream in place and seeks backwards, so freshly inserted tokens are walked
// again on the next iteration.
pub struct TokenStream {
    tokens: Vec<Token>,
    index: usize,
}

impl TokenStream {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, index: 0 }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn peek(&self, offset: isize) -> Option<&Token> {
        let position = self.index as isize + offset;
        if position < 0 {
            return None;
        }
        self.tokens.get(position as usize)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Token> {
        self.tokens.get_mut(index)
    }

    pub fn read(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.index).cloned();
        if token.is_some() {
            self.index += 1;
        }
        token
    }

    pub fn remove(&mut self, start: usize, count: usize) {
        self.tokens.drain(start..start + count);
    }

    pub fn insert(&mut self, start: usize, tokens: Vec<Token>) {
        self.tokens.splice(start..start, tokens);
    }

    pub fn seek(&mut self, index: usize) {
        self.index = index;
    }

    pub fn into_tokens(self) -> Vec<Token> {
        self.tokens
    }
}

pub struct Preprocessor<'a> {
    macros: &'a HashMap<String, Macro>,
    file_path: String,
}

impl<'a> Preprocessor<'a> {
    pub fn new(macros: &'a HashMap<String, Macro>, file_path: &str) -> Self {
        Self {
            macros,
            file_path: file_path.to_string(),
        }
    }

    pub fn process(&self, tokens: Vec<Token>) -> Result<Vec<Token>, Error> {
        self.validate_macros()?;
        let mut stream = TokenStream::new(tokens);
        self.expand(&mut stream)?;
        self.concatenate(&mut stream);
        Ok(stream.into_tokens())
    }

    // cross-file references resolve against the merged table here, and the
    // reference graph is proven acyclic before any expansion happens
    pub fn validate_macros(&self) -> Result<(), Error> {
        for mac in self.macros.values() {
            for token in &mac.body {
                match token.kind {
                    TokenType::Macro => {
                        let target = token.macro_name();
                        if target == mac.name {
                            return Err(Error::at_line(
                                "SyntaxError",
                                &format!("Macro '{}' cannot invoke itself", mac.name),
                                &self.file_path,
                                mac.line,
                            ));
                        }
                        if !self.macros.contains_key(target) {
                            return Err(Error::at_line(
                                "UndefinedMacroError",
                                &format!(
                                    "Macro '{}' referenced by '{}' is not defined",
                                    target, mac.name
                                ),
                                &self.file_path,
                                mac.line,
                            ));
                        }
                    }
                    TokenType::MacroParameter => {
                        if !mac.arguments.iter().any(|a| a == token.parameter_name()) {
                            return Err(Error::at_line(
                                "UndefinedMacroParameterError",
                                &format!(
                                    "Macro parameter '{}' is not declared by '{}'",
                                    token.value, mac.name
                                ),
                                &self.file_path,
                                mac.line,
                            ));
                        }
                    }
                    _ => {}
                }
            }
        }

        let mut names: Vec<&str> = self.macros.keys().map(String::as_str).collect();
        names.sort_unstable();
        for name in names {
            let mut visited = HashSet::new();
            let mut path = Vec::new();
            self.check_recursion(name, &mut visited, &mut path)?;
        }
        Ok(())
    }

    fn check_recursion<'s>(
        &'s self,
        name: &'s str,
        visited: &mut HashSet<&'s str>,
        path: &mut Vec<&'s str>,
    ) -> Result<(), Error> {
        let Some(mac) = self.macros.get(name) else {
            return Ok(());
        };
        visited.insert(name);
        path.push(name);

        let mut references: Vec<&str> = mac.macros.iter().map(String::as_str).collect();
        references.sort_unstable();
        for reference in references {
            if visited.contains(reference) {
                let cycle = path
                    .iter()
                    .map(|n| format!("'{}'", n))
                    .collect::<Vec<_>>()
                    .join(" -> ");
                return Err(Error::at_line(
                    "InfiniteMacroRecursionError",
                    &cycle,
                    &self.file_path,
                    mac.line,
                ));
            }
            self.check_recursion(reference, visited, path)?;
        }

        path.pop();
        visited.remove(name);
        Ok(())
    }

    fn expand(&self, stream: &mut TokenStream) -> Result<(), Error> {
        stream.seek(0);
        while let Some(token) = stream.read() {
            match token.kind {
                TokenType::Macro => self.expand_macro(stream, &token)?,
                TokenType::Directive => self.strip_directive(stream, &token)?,
                _ => {}
            }
        }
        Ok(())
    }

    fn expand_macro(&self, stream: &mut TokenStream, macro_token: &Token) -> Result<(), Error> {
        let start = stream.index() - 1;
        let line = macro_token.line;

        let mac = self.macros.get(macro_token.macro_name()).ok_or_else(|| {
            Error::at_line(
                "UndefinedMacroError",
                &format!("Macro '{}' is not defined", macro_token.macro_name()),
                &self.file_path,
                line,
            )
        })?;

        let args = self.collect_arguments(stream, mac, line)?;
        let mut body = self.materialize_body(mac, &args, line)?;
        if let Some(first) = body.first_mut() {
            first.whitespace_before = macro_token.whitespace_before.clone();
        }

        let consumed = stream.index() - start;
        stream.remove(start, consumed);
        stream.insert(start, body);
        stream.seek(start);
        Ok(())
    }

    // arguments split on commas at parenthesis depth one only
    fn collect_arguments(
        &self,
        stream: &mut TokenStream,
        mac: &Macro,
        line: usize,
    ) -> Result<Vec<Vec<Token>>, Error> {
        if mac.arguments.is_empty() {
            return Ok(Vec::new());
        }

        match stream.peek(0) {
            Some(t) if t.kind == TokenType::ParenLeft => {}
            _ => {
                if mac.fixed_argument_count() > 0 {
                    return Err(Error::at_line(
                        "SyntaxError",
                        &format!("Not enough arguments for macro '{}'", mac.name),
                        &self.file_path,
                        line,
                    ));
                }
                return Ok(Vec::new());
            }
        }
        stream.read(); // '('

        let mut depth = 1usize;
        let mut arg_index = 0usize;
        let mut args: Vec<Vec<Token>> = Vec::new();

        while depth > 0 {
            let Some(token) = stream.peek(0) else {
                return Err(Error::at_line(
                    "UnexpectedEndOfCodeError",
                    &format!("Unclosed argument list for macro '{}'", mac.name),
                    &self.file_path,
                    line,
                ));
            };
            match token.kind {
                TokenType::ParenLeft => depth += 1,
                TokenType::ParenRight => depth -= 1,
                _ => {}
            }
            if depth > 0 {
                let token = stream.read().expect("peeked token");
                if depth == 1 && token.kind == TokenType::Comma {
                    arg_index += 1;
                } else {
                    while args.len() <= arg_index {
                        args.push(Vec::new());
                    }
                    args[arg_index].push(token.rebound(line));
                }
            }
        }
        stream.read(); // ')'

        if args.len() < mac.fixed_argument_count() {
            return Err(Error::at_line(
                "SyntaxError",
                &format!("Not enough arguments for macro '{}'", mac.name),
                &self.file_path,
                line,
            ));
        }
        if args.len() > mac.fixed_argument_count() && !mac.is_variadic {
            return Err(Error::at_line(
                "SyntaxError",
                &format!("Too many arguments for macro '{}'", mac.name),
                &self.file_path,
                line,
            ));
        }
        Ok(args)
    }

    fn materialize_body(
        &self,
        mac: &Macro,
        args: &[Vec<Token>],
        line: usize,
    ) -> Result<Vec<Token>, Error> {
        let mut result = Vec::new();

        for token in &mac.body {
            match token.kind {
                TokenType::MacroParameter => {
                    let name = token.parameter_name();
                    let position =
                        mac.arguments.iter().position(|a| a == name).ok_or_else(|| {
                            Error::at_line(
                                "UndefinedMacroParameterError",
                                &format!(
                                    "Macro parameter '{}' is not declared by '{}'",
                                    token.value, mac.name
                                ),
                                &self.file_path,
                                line,
                            )
                        })?;
                    if let Some(tokens) = args.get(position) {
                        result.extend(tokens.iter().map(|t| t.rebound(line)));
                    }
                }
                TokenType::MacroKeyword => {
                    self.materialize_keyword(mac, token, args, line, &mut result)?;
                }
                kind if !kind.is_macro_body_token() => {
                    return Err(Error::at_line(
                        "UnexpectedTokenError",
                        &format!("'{}' is not allowed in a macro body", token.value),
                        &self.file_path,
                        line,
                    ));
                }
                _ => result.push(token.rebound(line)),
            }
        }

        Ok(result)
    }

    fn materialize_keyword(
        &self,
        mac: &Macro,
        keyword: &Token,
        args: &[Vec<Token>],
        line: usize,
        result: &mut Vec<Token>,
    ) -> Result<(), Error> {
        let fixed = mac.fixed_argument_count();

        match keyword.value.as_str() {
            "#!line" => {
                result.push(Token::new(
                    TokenType::Number,
                    line.to_string(),
                    line,
                    keyword.whitespace_before.clone(),
                ));
            }
            "#!vargc" => {
                let count = fixed as i64 - args.len() as i64;
                result.push(Token::new(
                    TokenType::Number,
                    count.to_string(),
                    line,
                    keyword.whitespace_before.clone(),
                ));
            }
            "#!vargs" | "#!vargsp" => {
                if args.len() <= fixed {
                    return Ok(());
                }
                let prepend = keyword.value == "#!vargsp";
                if prepend {
                    result.push(Token::new(
                        TokenType::Comma,
                        ",".to_string(),
                        line,
                        keyword.whitespace_before.clone(),
                    ));
                }
                for (offset, group) in args[fixed..].iter().enumerate() {
                    if offset > 0 {
                        result.push(Token::new(
                            TokenType::Comma,
                            ",".to_string(),
                            line,
                            String::new(),
                        ));
                    }
                    let mut group: Vec<Token> = group.iter().map(|t| t.rebound(line)).collect();
                    if offset == 0 {
                        if let Some(first) = group.first_mut() {
                            first.whitespace_before = if prepend {
                                " ".to_string()
                            } else {
                                keyword.whitespace_before.clone()
                            };
                        }
                    }
                    result.extend(group);
                }
            }
            other => {
                return Err(Error::at_line(
                    "SyntaxError",
                    &format!("Unknown macro keyword '{}'", other),
                    &self.file_path,
                    line,
                ));
            }
        }
        Ok(())
    }

    fn strip_directive(&self, stream: &mut TokenStream, directive: &Token) -> Result<(), Error> {
        let start = stream.index() - 1;

        match directive.value.as_str() {
            "##blcs" => {}
            "##use" => {
                stream.read(); // the file path string
            }
            "##define" => {
                let name = stream.read().ok_or_else(|| {
                    Error::at_line(
                        "UnexpectedEndOfCodeError",
                        "Expected a macro name after '##define'",
                        &self.file_path,
                        directive.line,
                    )
                })?;
                let mac = self.macros.get(&name.value).ok_or_else(|| {
                    Error::at_line(
                        "UndefinedMacroError",
                        &format!("Macro '{}' is not defined", name.value),
                        &self.file_path,
                        directive.line,
                    )
                })?;

                if !mac.arguments.is_empty() {
                    loop {
                        match stream.read() {
                            None => {
                                return Err(Error::at_line(
                                    "UnexpectedEndOfCodeError",
                                    "Unclosed macro argument list",
                                    &self.file_path,
                                    directive.line,
                                ));
                            }
                            Some(t) if t.kind == TokenType::ParenRight => break,
                            Some(_) => {}
                        }
                    }
                }

                if stream.peek(0).map(|t| t.kind) == Some(TokenType::DirectiveCurlyLeft) {
                    loop {
                        match stream.read() {
                            None => {
                                return Err(Error::at_line(
                                    "UnexpectedEndOfCodeError",
                                    &format!("Unclosed body for macro '{}'", name.value),
                                    &self.file_path,
                                    directive.line,
                                ));
                            }
                            Some(t) if t.kind == TokenType::DirectiveCurlyRight => break,
                            Some(_) => {}
                        }
                    }
                } else {
                    while let Some(t) = stream.peek(0) {
                        if t.line != directive.line {
                            break;
                        }
                        stream.read();
                    }
                }
            }
            other => {
                return Err(Error::at_line(
                    "SyntaxError",
                    &format!("Unknown directive '{}'", other),
                    &self.file_path,
                    directive.line,
                ));
            }
        }

        let consumed = stream.index() - start;
        stream.remove(start, consumed);
        stream.seek(start);
        Ok(())
    }

    // joins '#@' neighbours; strings sharing a quote merge into one literal
    fn concatenate(&self, stream: &mut TokenStream) {
        stream.seek(0);
        while let Some(token) = stream.read() {
            if token.kind != TokenType::MacroConcat {
                continue;
            }
            let at = stream.index() - 1;

            let merged = match (stream.peek(-2), stream.peek(0)) {
                (Some(left), Some(right))
                    if left.kind == TokenType::String
                        && right.kind == TokenType::String
                        && left.value.chars().next() == right.value.chars().next() =>
                {
                    let quote = left.value.chars().next().expect("strings are quoted");
                    Some(format!(
                        "{}{}{}{}",
                        quote,
                        strip_quotes(&left.value),
                        strip_quotes(&right.value),
                        quote
                    ))
                }
                _ => None,
            };

            match merged {
                Some(value) => {
                    if let Some(left) = stream.get_mut(at - 1) {
                        left.value = value;
                    }
                    stream.remove(at, 2);
                    stream.seek(at);
                }
                None => {
                    if let Some(right) = stream.get_mut(at + 1) {
                        right.whitespace_before.clear();
                    }
                    stream.remove(at, 1);
                    stream.seek(at);
                }
            }
        }
    }
}

fn strip_quotes(value: &str) -> &str {
    &value[1..value.len() - 1]
}
