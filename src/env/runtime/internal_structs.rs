use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use crate::env::runtime::tokens::Token;

#[derive(Debug, Clone)]
pub struct Macro {
    pub name: String,
    pub line: usize,
    pub arguments: Vec<String>,
    pub body: Vec<Token>,
    pub macros: HashSet<String>, // macro names referenced by the body
    pub is_variadic: bool,
}

impl Macro {
    pub fn fixed_argument_count(&self) -> usize {
        self.arguments.len() - usize::from(self.is_variadic)
    }
}

#[derive(Debug, Default)]
pub struct DirectiveData {
    pub macros: HashMap<String, Macro>,
    pub files: HashSet<String>, // ##use paths, quotes stripped
}

#[derive(Debug, Clone)]
pub struct OutputFile {
    pub source_path: PathBuf,
    pub text: String,
}
