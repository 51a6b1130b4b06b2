use crate::env::runtime::tokens::Token;

pub const FILE_TOP_COMMENT: &str =
    "//--- GENERATED BY THE BLCS PREPROCESSOR, DO NOT EDIT DIRECTLY ---//";
pub const FILE_BOTTOM_COMMENT: &str = "//--- END OF GENERATED OUTPUT ---//";

// line gaps and leading whitespace are reconstructed purely from the token
// fields, so untouched source round-trips byte for byte
pub fn emit_tokens(tokens: &[Token]) -> String {
    let mut result = String::new();
    let mut line = 1usize;

    for token in tokens {
        for _ in 0..token.line.saturating_sub(line) {
            result.push('\n');
        }
        result.push_str(&token.whitespace_before);
        result.push_str(&token.value);
        line = token.line;
    }

    result
}
