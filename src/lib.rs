mod env {
    pub mod runtime {
        pub mod config;
        pub mod errors;
        pub mod fmt;
        pub mod internal_structs;
        pub mod modules;
        pub mod preprocessor;
        pub mod tokens;
        #[allow(dead_code)]
        pub mod utils;
    }
}

mod lexer;
mod parser;

pub use crate::env::runtime::config::{get_config, get_config_path, ColorScheme, Config};
pub use crate::env::runtime::errors::{Error, Location};
pub use crate::env::runtime::fmt::{emit_tokens, FILE_BOTTOM_COMMENT, FILE_TOP_COMMENT};
pub use crate::env::runtime::internal_structs::{DirectiveData, Macro, OutputFile};
pub use crate::env::runtime::modules::{collect_source_files, preprocess_entry, write_outputs};
pub use crate::env::runtime::preprocessor::{Preprocessor, TokenStream};
pub use crate::env::runtime::tokens::{Token, TokenType};
pub use crate::lexer::Lexer;
pub use crate::parser::Parser;

// single-buffer convenience: no '##use' resolution, the buffer's own macros
// are the whole table
pub fn preprocess_source(source: &str, origin: &str) -> Result<String, Error> {
    let tokens = Lexer::new(source, origin).tokenize()?;
    let data = Parser::new(&tokens, origin).parse()?;
    let preprocessor = Preprocessor::new(&data.macros, origin);
    let processed = preprocessor.process(tokens)?;
    Ok(emit_tokens(&processed))
}
