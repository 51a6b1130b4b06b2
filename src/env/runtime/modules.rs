use std::collections::{HashMap, HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};

use crate::env::runtime::config::Config;
use crate::env::runtime::errors::Error;
use crate::env::runtime::fmt::{emit_tokens, FILE_BOTTOM_COMMENT, FILE_TOP_COMMENT};
use crate::env::runtime::internal_structs::{Macro, OutputFile};
use crate::env::runtime::preprocessor::Preprocessor;
use crate::env::runtime::tokens::Token;
use crate::env::runtime::utils::{debug_log, fix_path, print_colored};

fn display_path(path: &Path) -> String {
    fix_path(path.display().to_string())
}

// recursive walk collecting source files in a stable order; unreadable
// directories are skipped
pub fn collect_source_files(dir: &Path, extension: &str, files: &mut Vec<PathBuf>) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return,
    };
    let mut paths: Vec<PathBuf> = entries.filter_map(Result::ok).map(|e| e.path()).collect();
    paths.sort();
    for path in paths {
        if path.is_dir() {
            collect_source_files(&path, extension, files);
        } else if path.extension().and_then(|e| e.to_str()) == Some(extension) {
            files.push(path);
        }
    }
}

// BFS across '##use' imports starting at the entry file. Imported paths are
// resolved against the entry file's directory, not the importing file's.
pub fn preprocess_entry(entry: &Path, config: &Config) -> Result<Vec<OutputFile>, Error> {
    let entry: PathBuf = if entry.is_absolute() {
        entry.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(entry)
    };
    let base_dir = entry
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    let mut queue: VecDeque<PathBuf> = VecDeque::new();
    queue.push_back(entry);
    let mut visited: HashSet<PathBuf> = HashSet::new();
    let mut merged_macros: HashMap<String, Macro> = HashMap::new();
    let mut parsed: Vec<(PathBuf, Vec<Token>)> = Vec::new();

    while let Some(path) = queue.pop_front() {
        let canonical = path.canonicalize().unwrap_or_else(|_| path.clone());
        if visited.contains(&canonical) {
            continue;
        }
        let display = display_path(&path);

        match path.extension().and_then(|e| e.to_str()) {
            Some(extension) if extension == config.source_extension => {}
            _ => {
                return Err(Error::new(
                    "FileExtensionError",
                    &format!(
                        "'{}' does not have the '.{}' extension",
                        display, config.source_extension
                    ),
                    &display,
                ));
            }
        }
        if !path.is_file() {
            return Err(Error::new(
                "FileNotFoundError",
                &format!("File '{}' does not exist", display),
                &display,
            ));
        }
        visited.insert(canonical);

        let source = fs::read_to_string(&path).map_err(|e| {
            Error::new(
                "IOError",
                &format!("Failed to read '{}': {}", display, e),
                &display,
            )
        })?;
        let tokens = crate::lexer::Lexer::new(&source, &display).tokenize()?;
        if config.debug_mode == "full" {
            debug_log(&format!("Tokens for {}: {:?}", display, tokens), config);
        }
        let data = crate::parser::Parser::new(&tokens, &display).parse()?;

        let mut files: Vec<String> = data.files.into_iter().collect();
        files.sort_unstable();
        for file in files {
            queue.push_back(base_dir.join(file));
        }

        for (name, mac) in data.macros {
            if merged_macros.contains_key(&name) {
                return Err(Error::at_line(
                    "MultipleDefinitionsError",
                    &format!("Macro '{}' is already defined", name),
                    &display,
                    mac.line,
                ));
            }
            merged_macros.insert(name, mac);
        }

        parsed.push((path, tokens));
    }

    let mut outputs = Vec::new();
    for (path, tokens) in parsed {
        let display = display_path(&path);
        let preprocessor = Preprocessor::new(&merged_macros, &display);
        let processed = preprocessor.process(tokens)?;
        debug_log(
            &format!("Processed {}: {} tokens", display, processed.len()),
            config,
        );
        outputs.push(OutputFile {
            source_path: path,
            text: emit_tokens(&processed),
        });
    }
    Ok(outputs)
}

pub fn write_outputs(outputs: &[OutputFile], config: &Config) -> Result<Vec<PathBuf>, Error> {
    let mut written = Vec::new();

    for output in outputs {
        if output.text.is_empty() && !config.output_empty {
            if config.warnings {
                print_colored(
                    &format!(
                        "Warning: skipped empty output for '{}'",
                        display_path(&output.source_path)
                    ),
                    &config.color_scheme.warning,
                    config.supports_color,
                );
            }
            continue;
        }
        let path = output.source_path.with_extension(&config.output_extension);
        let content = format!(
            "{}\n{}\n\n{}",
            FILE_TOP_COMMENT, output.text, FILE_BOTTOM_COMMENT
        );
        fs::write(&path, content).map_err(|e| {
            let display = display_path(&path);
            Error::new(
                "IOError",
                &format!("Failed to write '{}': {}", display, e),
                &display,
            )
        })?;
        written.push(path);
    }

    Ok(written)
}
