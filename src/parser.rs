use std::collections::HashSet;

use crate::env::runtime::errors::Error;
use crate::env::runtime::internal_structs::{DirectiveData, Macro};
use crate::env::runtime::tokens::{
    Token, TokenType, MACRO_KEYWORDS, VARIADIC_ONLY_KEYWORDS, VARIADIC_SENTINEL,
};

pub struct Parser<'a> {
    tokens: &'a [Token],
    index: usize,
    file_path: String,
    data: DirectiveData,
    blcs_seen: bool,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token], file_path: &str) -> Self {
        Parser {
            tokens,
            index: 0,
            file_path: file_path.to_string(),
            data: DirectiveData::default(),
            blcs_seen: false,
        }
    }

    pub fn parse(mut self) -> Result<DirectiveData, Error> {
        while self.index < self.tokens.len() {
            let kind = self.tokens[self.index].kind;
            match kind {
                TokenType::Directive => self.parse_directive()?,
                kind if kind.is_preprocessor() && kind != TokenType::Macro => {
                    let token = &self.tokens[self.index];
                    return Err(Error::at_line(
                        "UnexpectedTokenError",
                        &format!("'{}' can only be used in a macro definition", token.value),
                        &self.file_path,
                        token.line,
                    ));
                }
                _ => self.index += 1,
            }
        }

        if !self.blcs_seen {
            return Err(Error::with_help(
                "SyntaxError",
                "Missing '##blcs' directive",
                "add '##blcs' on its own line at the top of the file",
                &self.file_path,
                0,
            ));
        }

        Ok(self.data)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.index)
    }

    fn parse_directive(&mut self) -> Result<(), Error> {
        let directive = self.tokens[self.index].clone();
        self.index += 1;

        if directive.value != "##blcs" && !self.blcs_seen {
            return Err(Error::at_line(
                "SyntaxError",
                "'##blcs' must be the first directive in the file",
                &self.file_path,
                directive.line,
            ));
        }

        match directive.value.as_str() {
            "##blcs" => {
                if self.blcs_seen {
                    return Err(Error::at_line(
                        "SyntaxError",
                        "Duplicate '##blcs' directive",
                        &self.file_path,
                        directive.line,
                    ));
                }
                if let Some(next) = self.peek() {
                    if next.line == directive.line {
                        return Err(Error::at_line(
                            "SyntaxError",
                            "'##blcs' must be the last token on its line",
                            &self.file_path,
                            directive.line,
                        ));
                    }
                }
                self.blcs_seen = true;
                Ok(())
            }
            "##define" => self.parse_define(&directive),
            "##use" => self.parse_use(&directive),
            other => Err(Error::at_line(
                "SyntaxError",
                &format!("Unknown directive '{}'", other),
                &self.file_path,
                directive.line,
            )),
        }
    }

    fn parse_use(&mut self, directive: &Token) -> Result<(), Error> {
        let path_token = match self.peek() {
            None => {
                return Err(Error::at_line(
                    "UnexpectedEndOfCodeError",
                    "Expected a file path after '##use'",
                    &self.file_path,
                    directive.line,
                ));
            }
            Some(t) if t.line != directive.line => {
                return Err(Error::at_line(
                    "UnexpectedEndOfLineError",
                    "Expected a file path after '##use'",
                    &self.file_path,
                    directive.line,
                ));
            }
            Some(t) if t.kind != TokenType::String => {
                return Err(Error::at_line(
                    "UnexpectedTokenError",
                    &format!("Expected a file path string after '##use', got '{}'", t.value),
                    &self.file_path,
                    t.line,
                ));
            }
            Some(t) => t.clone(),
        };
        self.index += 1;

        if let Some(next) = self.peek() {
            if next.line == directive.line {
                return Err(Error::at_line(
                    "UnexpectedTokenError",
                    "'##use' takes a single file path",
                    &self.file_path,
                    next.line,
                ));
            }
        }

        let path = &path_token.value[1..path_token.value.len() - 1];
        self.data.files.insert(path.to_string());
        Ok(())
    }

    fn parse_define(&mut self, directive: &Token) -> Result<(), Error> {
        let name_token = match self.peek() {
            None => {
                return Err(Error::at_line(
                    "UnexpectedEndOfCodeError",
                    "Expected a macro name after '##define'",
                    &self.file_path,
                    directive.line,
                ));
            }
            Some(t) if t.line != directive.line => {
                return Err(Error::at_line(
                    "UnexpectedEndOfLineError",
                    "Expected a macro name after '##define'",
                    &self.file_path,
                    directive.line,
                ));
            }
            Some(t) if t.kind != TokenType::Identifier => {
                return Err(Error::at_line(
                    "UnexpectedTokenError",
                    &format!("Expected a macro name after '##define', got '{}'", t.value),
                    &self.file_path,
                    t.line,
                ));
            }
            Some(t) => t.clone(),
        };
        self.index += 1;

        let name = name_token.value.clone();
        if self.data.macros.contains_key(&name) {
            return Err(Error::at_line(
                "MultipleDefinitionsError",
                &format!("Macro '{}' is already defined", name),
                &self.file_path,
                name_token.line,
            ));
        }

        let mut arguments: Vec<String> = Vec::new();
        if let Some(t) = self.peek() {
            if t.kind == TokenType::ParenLeft && t.line == directive.line {
                self.parse_define_args(directive, &mut arguments)?;
            }
        }
        let is_variadic = arguments.last().map(|a| a == VARIADIC_SENTINEL).unwrap_or(false);

        let mut brackets = false;
        if let Some(t) = self.peek() {
            if t.kind == TokenType::DirectiveCurlyLeft {
                if t.line > directive.line + 1 {
                    return Err(Error::at_line(
                        "SyntaxError",
                        "'#{' must open on the definition line or the line below it",
                        &self.file_path,
                        t.line,
                    ));
                }
                brackets = true;
                self.index += 1;
            }
        }

        let (mut body, referenced) =
            self.parse_define_body(directive, &name, &arguments, is_variadic, brackets)?;

        if !brackets && body.is_empty() {
            return Err(Error::at_line(
                "UnexpectedEndOfLineError",
                &format!("Macro '{}' has an empty body", name),
                &self.file_path,
                directive.line,
            ));
        }
        if let Some(first) = body.first() {
            if first.kind == TokenType::MacroConcat {
                return Err(Error::at_line(
                    "SyntaxError",
                    "'#@' is missing a left operand",
                    &self.file_path,
                    first.line,
                ));
            }
        }
        if let Some(last) = body.last() {
            if last.kind == TokenType::MacroConcat {
                return Err(Error::at_line(
                    "SyntaxError",
                    "'#@' is missing a right operand",
                    &self.file_path,
                    last.line,
                ));
            }
        }
        // the call site's own whitespace is restored at expansion time
        if let Some(first) = body.first_mut() {
            first.whitespace_before.clear();
        }

        self.data.macros.insert(
            name.clone(),
            Macro {
                name,
                line: directive.line,
                arguments,
                body,
                macros: referenced,
                is_variadic,
            },
        );
        Ok(())
    }

    fn parse_define_args(
        &mut self,
        directive: &Token,
        arguments: &mut Vec<String>,
    ) -> Result<(), Error> {
        let mut prev_line = self.tokens[self.index].line;
        self.index += 1; // '('

        loop {
            let argument = match self.peek() {
                None => {
                    return Err(Error::at_line(
                        "UnexpectedEndOfCodeError",
                        "Unclosed macro argument list",
                        &self.file_path,
                        directive.line,
                    ));
                }
                Some(t) => t.clone(),
            };
            if argument.line != prev_line {
                return Err(Error::at_line(
                    "UnexpectedEndOfLineError",
                    "Macro arguments must stay on the definition line",
                    &self.file_path,
                    prev_line,
                ));
            }
            match argument.kind {
                TokenType::Identifier | TokenType::MacroVarArgs => {}
                _ => {
                    return Err(Error::at_line(
                        "UnexpectedTokenError",
                        &format!("Expected an argument name, got '{}'", argument.value),
                        &self.file_path,
                        argument.line,
                    ));
                }
            }
            self.index += 1;
            arguments.push(argument.value.clone());
            prev_line = argument.line;

            let separator = match self.peek() {
                None => {
                    return Err(Error::at_line(
                        "UnexpectedEndOfCodeError",
                        "Unclosed macro argument list",
                        &self.file_path,
                        directive.line,
                    ));
                }
                Some(t) => t.clone(),
            };
            if separator.line != prev_line {
                return Err(Error::at_line(
                    "UnexpectedEndOfLineError",
                    "Macro arguments must stay on the definition line",
                    &self.file_path,
                    prev_line,
                ));
            }
            match separator.kind {
                TokenType::Comma => {
                    self.index += 1;
                    prev_line = separator.line;
                }
                TokenType::ParenRight => {
                    self.index += 1;
                    break;
                }
                _ => {
                    return Err(Error::at_line(
                        "UnexpectedTokenError",
                        &format!("Expected ',' or ')', got '{}'", separator.value),
                        &self.file_path,
                        separator.line,
                    ));
                }
            }
        }

        for (position, argument) in arguments.iter().enumerate() {
            if argument == VARIADIC_SENTINEL && position + 1 != arguments.len() {
                return Err(Error::at_line(
                    "SyntaxError",
                    "Variadic parameters must be last",
                    &self.file_path,
                    directive.line,
                ));
            }
        }
        Ok(())
    }

    fn parse_define_body(
        &mut self,
        directive: &Token,
        name: &str,
        arguments: &[String],
        is_variadic: bool,
        brackets: bool,
    ) -> Result<(Vec<Token>, HashSet<String>), Error> {
        let mut body = Vec::new();
        let mut referenced = HashSet::new();

        loop {
            let token = match self.peek() {
                None if brackets => {
                    return Err(Error::at_line(
                        "UnexpectedEndOfCodeError",
                        &format!("Unclosed body for macro '{}', expected '#}}'", name),
                        &self.file_path,
                        directive.line,
                    ));
                }
                None => break,
                Some(t) => t.clone(),
            };
            if brackets {
                if token.kind == TokenType::DirectiveCurlyRight {
                    self.index += 1;
                    break;
                }
            } else if token.line != directive.line {
                break;
            }
            self.index += 1;

            match token.kind {
                TokenType::Macro => {
                    if token.macro_name() == name {
                        return Err(Error::at_line(
                            "SyntaxError",
                            &format!("Macro '{}' cannot invoke itself", name),
                            &self.file_path,
                            token.line,
                        ));
                    }
                    referenced.insert(token.macro_name().to_string());
                }
                TokenType::MacroParameter => {
                    if !arguments.iter().any(|a| a == token.parameter_name()) {
                        return Err(Error::at_line(
                            "UndefinedMacroParameterError",
                            &format!(
                                "Macro parameter '{}' is not declared by '{}'",
                                token.value, name
                            ),
                            &self.file_path,
                            token.line,
                        ));
                    }
                }
                TokenType::MacroKeyword => {
                    if !MACRO_KEYWORDS.contains(token.value.as_str()) {
                        return Err(Error::at_line(
                            "SyntaxError",
                            &format!("Unknown macro keyword '{}'", token.value),
                            &self.file_path,
                            token.line,
                        ));
                    }
                    if VARIADIC_ONLY_KEYWORDS.contains(token.value.as_str()) && !is_variadic {
                        return Err(Error::at_line(
                            "SyntaxError",
                            &format!("'{}' is only valid in a variadic macro", token.value),
                            &self.file_path,
                            token.line,
                        ));
                    }
                }
                kind if !kind.is_macro_body_token() => {
                    return Err(Error::at_line(
                        "UnexpectedTokenError",
                        &format!("'{}' is not allowed in a macro body", token.value),
                        &self.file_path,
                        token.line,
                    ));
                }
                _ => {}
            }

            body.push(token);
        }

        Ok((body, referenced))
    }
}
