use blcs::{DirectiveData, Error, Lexer, Parser, TokenType};

fn parse(source: &str) -> Result<DirectiveData, Error> {
    let tokens = Lexer::new(source, "test.blcs").tokenize().expect("lexing failed");
    Parser::new(&tokens, "test.blcs").parse()
}

fn parse_ok(source: &str) -> DirectiveData {
    parse(source).expect("parsing failed")
}

fn parse_err(source: &str) -> Error {
    parse(source).expect_err("parsing should fail")
}

#[test]
fn blcs_alone_is_a_valid_file() {
    let data = parse_ok("##blcs\n");
    assert!(data.macros.is_empty());
    assert!(data.files.is_empty());
}

#[test]
fn missing_blcs_is_rejected() {
    let error = parse_err("echo(1);\n");
    assert_eq!(error.error_type(), "SyntaxError");
    assert!(error.msg().contains("##blcs"));
}

#[test]
fn blcs_must_come_before_other_directives() {
    let error = parse_err("##define MAX 9\n##blcs\n");
    assert_eq!(error.error_type(), "SyntaxError");
}

#[test]
fn blcs_must_be_alone_on_its_line() {
    let error = parse_err("##blcs echo(1);\n");
    assert_eq!(error.error_type(), "SyntaxError");
}

#[test]
fn duplicate_blcs_is_rejected() {
    let error = parse_err("##blcs\n##blcs\n");
    assert_eq!(error.error_type(), "SyntaxError");
}

#[test]
fn unknown_directives_are_rejected() {
    let error = parse_err("##blcs\n##import \"x\"\n");
    assert_eq!(error.error_type(), "SyntaxError");
    assert!(error.msg().contains("##import"));
}

#[test]
fn single_line_define() {
    let data = parse_ok("##blcs\n##define MAX 9\n");
    let mac = &data.macros["MAX"];
    assert_eq!(mac.name, "MAX");
    assert_eq!(mac.line, 2);
    assert!(mac.arguments.is_empty());
    assert!(!mac.is_variadic);
    assert_eq!(mac.body.len(), 1);
    assert_eq!(mac.body[0].value, "9");
    assert_eq!(mac.body[0].whitespace_before, "");
}

#[test]
fn single_line_body_runs_to_end_of_line() {
    let data = parse_ok("##blcs\n##define GREET echo(\"hi\");\nrest();\n");
    let mac = &data.macros["GREET"];
    let values: Vec<&str> = mac.body.iter().map(|t| t.value.as_str()).collect();
    assert_eq!(values, vec!["echo", "(", "\"hi\"", ")", ";"]);
}

#[test]
fn empty_single_line_body_is_rejected() {
    let error = parse_err("##blcs\n##define EMPTY\nx();\n");
    assert_eq!(error.error_type(), "UnexpectedEndOfLineError");
}

#[test]
fn bracketed_define_spans_lines() {
    let data = parse_ok("##blcs\n##define setup #{\n$a = 1;\n$b = 2;\n#}\n");
    let mac = &data.macros["setup"];
    assert_eq!(mac.body.len(), 10);
    assert_eq!(mac.body[0].value, "$");
    assert_eq!(mac.body[0].line, 3);
}

#[test]
fn bracket_may_open_on_the_next_line() {
    let data = parse_ok("##blcs\n##define setup\n#{\n$a = 1;\n#}\n");
    assert!(data.macros.contains_key("setup"));
}

#[test]
fn bracket_too_far_from_the_definition_is_rejected() {
    let error = parse_err("##blcs\n##define setup\n\n#{\n$a = 1;\n#}\n");
    assert_eq!(error.error_type(), "SyntaxError");
}

#[test]
fn empty_bracketed_body_is_allowed() {
    let data = parse_ok("##blcs\n##define NOTHING #{\n#}\n");
    assert!(data.macros["NOTHING"].body.is_empty());
}

#[test]
fn unclosed_bracketed_body_is_rejected() {
    let error = parse_err("##blcs\n##define setup #{\n$a = 1;\n");
    assert_eq!(error.error_type(), "UnexpectedEndOfCodeError");
}

#[test]
fn define_with_arguments() {
    let data = parse_ok("##blcs\n##define add(a, b) #%a + #%b\n");
    let mac = &data.macros["add"];
    assert_eq!(mac.arguments, vec!["a", "b"]);
    assert!(!mac.is_variadic);
    assert_eq!(mac.fixed_argument_count(), 2);
}

#[test]
fn variadic_define() {
    let data = parse_ok("##blcs\n##define err(code, ...) #%code\n");
    let mac = &data.macros["err"];
    assert_eq!(mac.arguments, vec!["code", "..."]);
    assert!(mac.is_variadic);
    assert_eq!(mac.fixed_argument_count(), 1);
}

#[test]
fn variadic_parameter_must_be_last() {
    let error = parse_err("##blcs\n##define err(..., code) #%code\n");
    assert_eq!(error.error_type(), "SyntaxError");
    assert!(error.msg().contains("last"));
}

#[test]
fn empty_argument_list_is_rejected() {
    let error = parse_err("##blcs\n##define f() 1\n");
    assert_eq!(error.error_type(), "UnexpectedTokenError");
}

#[test]
fn argument_list_must_stay_on_the_definition_line() {
    let error = parse_err("##blcs\n##define f(a,\nb) #%a\n");
    assert_eq!(error.error_type(), "UnexpectedEndOfLineError");
}

#[test]
fn unclosed_argument_list_is_rejected() {
    let error = parse_err("##blcs\n##define f(a");
    assert_eq!(error.error_type(), "UnexpectedEndOfCodeError");
}

#[test]
fn define_requires_an_identifier_name() {
    let error = parse_err("##blcs\n##define \"MAX\" 9\n");
    assert_eq!(error.error_type(), "UnexpectedTokenError");
}

#[test]
fn duplicate_definitions_in_one_file_are_rejected() {
    let error = parse_err("##blcs\n##define MAX 9\n##define MAX 10\n");
    assert_eq!(error.error_type(), "MultipleDefinitionsError");
}

#[test]
fn self_invocation_is_rejected() {
    let error = parse_err("##blcs\n##define LOOP #LOOP\n");
    assert_eq!(error.error_type(), "SyntaxError");
    assert!(error.msg().contains("LOOP"));
}

#[test]
fn referenced_macros_are_recorded() {
    let data = parse_ok("##blcs\n##define A #B #C\n");
    let mac = &data.macros["A"];
    assert!(mac.macros.contains("B"));
    assert!(mac.macros.contains("C"));
}

#[test]
fn undeclared_parameter_in_body_is_rejected() {
    let error = parse_err("##blcs\n##define f(a) #%b\n");
    assert_eq!(error.error_type(), "UndefinedMacroParameterError");
}

#[test]
fn unknown_macro_keyword_is_rejected() {
    let error = parse_err("##blcs\n##define f(a) #!bogus\n");
    assert_eq!(error.error_type(), "SyntaxError");
    assert!(error.msg().contains("#!bogus"));
}

#[test]
fn variadic_keywords_require_a_variadic_macro() {
    for keyword in ["#!vargs", "#!vargsp", "#!vargc"] {
        let error = parse_err(&format!("##blcs\n##define f(a) {}\n", keyword));
        assert_eq!(error.error_type(), "SyntaxError");
    }
}

#[test]
fn line_keyword_is_allowed_anywhere() {
    let data = parse_ok("##blcs\n##define here #!line\n");
    assert_eq!(data.macros["here"].body[0].kind, TokenType::MacroKeyword);
}

#[test]
fn directives_are_not_allowed_in_a_body() {
    let error = parse_err("##blcs\n##define f ##use \"x.blcs\"\n");
    assert_eq!(error.error_type(), "UnexpectedTokenError");
}

#[test]
fn varargs_token_is_not_allowed_in_a_body() {
    let error = parse_err("##blcs\n##define f(...) ...\n");
    assert_eq!(error.error_type(), "UnexpectedTokenError");
}

#[test]
fn body_may_not_begin_or_end_with_concat() {
    let error = parse_err("##blcs\n##define f #@ x\n");
    assert_eq!(error.error_type(), "SyntaxError");

    let error = parse_err("##blcs\n##define f x #@\n");
    assert_eq!(error.error_type(), "SyntaxError");
}

#[test]
fn preprocessor_tokens_outside_definitions_are_rejected() {
    for source in [
        "##blcs\n#%param\n",
        "##blcs\n#@\n",
        "##blcs\n#{\n",
        "##blcs\n#}\n",
        "##blcs\n#!line\n",
        "##blcs\n...\n",
    ] {
        let error = parse_err(source);
        assert_eq!(error.error_type(), "UnexpectedTokenError", "source: {:?}", source);
    }
}

#[test]
fn use_records_the_stripped_path() {
    let data = parse_ok("##blcs\n##use \"lib.blcs\"\n");
    assert!(data.files.contains("lib.blcs"));
}

#[test]
fn use_requires_a_string_on_the_same_line() {
    let error = parse_err("##blcs\n##use lib\n");
    assert_eq!(error.error_type(), "UnexpectedTokenError");

    let error = parse_err("##blcs\n##use\n\"lib.blcs\"\n");
    assert_eq!(error.error_type(), "UnexpectedEndOfLineError");
}

#[test]
fn use_takes_a_single_path() {
    let error = parse_err("##blcs\n##use \"a.blcs\" \"b.blcs\"\n");
    assert_eq!(error.error_type(), "UnexpectedTokenError");
}

#[test]
fn plain_code_and_invocations_pass_through() {
    let data = parse_ok("##blcs\nfunction f() { return #MAX; }\n");
    assert!(data.macros.is_empty());
}
