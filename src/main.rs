use std::collections::HashMap;
use std::env as std_env;
use std::path::{Path, PathBuf};
use std::process::exit;
use std::sync::mpsc;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::Local;
use colored::*;
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};

mod env {
    pub mod runtime {
        pub mod config;
        #[allow(dead_code)]
        pub mod errors;
        pub mod fmt;
        pub mod internal_structs;
        pub mod modules;
        #[allow(dead_code)]
        pub mod preprocessor;
        #[allow(dead_code)]
        pub mod tokens;
        #[allow(dead_code)]
        pub mod utils;
    }
}

mod lexer;
mod parser;

use crate::env::runtime::config::{get_config, Config};
use crate::env::runtime::errors::Error;
use crate::env::runtime::modules::{collect_source_files, preprocess_entry, write_outputs};
use crate::env::runtime::utils::{check_ansi, debug_log, fix_path, get_line_info, hex_to_ansi, supports_color};

const VERSION: &str = "1.2.0";

fn print_usage() {
    println!("usage: blcs <path> [-h] [-d] (-w | -X) [-q] [-e]");
}

fn print_help() {
    print_usage();
    println!();
    println!("  --help, -h           Show this help message");
    println!("  --directory, -d      Treat <path> as a directory of source files");
    println!("  --watch, -w          Watch <path> and reprocess on changes");
    println!("  --cli, -X            Preprocess <path> once and exit");
    println!("  --quiet, -q          Suppress debug and warning messages");
    println!("  --output-empty, -e   Write output files even when they are empty");
    println!("  --no-color           Disable colored output");
    println!("  --version, -v        Show version information");
}

fn handle_error(error: &Error, config: &Config, use_colors: bool) {
    let (file_name, line_number) = match error.location() {
        Some(loc) => (loc.file.as_str(), loc.line_number),
        None => ("<unknown>", 0),
    };
    let location = if line_number > 0 {
        format!("{}:{}", file_name, line_number)
    } else {
        file_name.to_string()
    };

    if !config.use_traceback {
        eprintln!(
            "{}{} -> {}: {}{}{}",
            hex_to_ansi(&config.color_scheme.exception, use_colors),
            location,
            error.error_type(),
            error.msg(),
            match error.help() {
                Some(help) if !help.is_empty() => format!(
                    "   {}({})",
                    hex_to_ansi(&config.color_scheme.help, use_colors),
                    help
                ),
                _ => "".to_string(),
            },
            hex_to_ansi("reset", use_colors)
        );
        return;
    }

    let mut trace = String::new();
    trace.push_str(&format!(
        "{}-> File '{}' got error:\n",
        hex_to_ansi(&config.color_scheme.exception, use_colors),
        location
    ));

    if line_number > 0 {
        if let Some(current_line) = get_line_info(file_name, line_number) {
            let indent = " ".repeat(line_number.to_string().len());
            let arrows = "^".repeat(current_line.trim_end().len().max(1));
            trace.push_str(&format!("\t{} | {}\n", line_number, current_line));
            trace.push_str(&format!("\t{} | {}\n", indent, arrows));
        }
    }

    trace.push_str(&format!("\t| {}: {}", error.error_type(), error.msg()));

    if let Some(help) = error.help() {
        if !help.is_empty() {
            trace.push_str(&format!(
                "\n\t| {}{}Help:{} {}",
                hex_to_ansi(&config.color_scheme.help, use_colors),
                check_ansi("\x1b[1m", &use_colors),
                check_ansi("\x1b[22m", &use_colors),
                help
            ));
        }
    }

    eprintln!("{}{}", trace, hex_to_ansi("reset", use_colors));
}

fn run_job(path: &Path, config: &Config, use_colors: bool) -> bool {
    debug_log(
        &format!("Preprocessing: {}", fix_path(path.display().to_string())),
        config,
    );

    match preprocess_entry(path, config).and_then(|outputs| write_outputs(&outputs, config)) {
        Ok(written) => {
            for output in &written {
                debug_log(
                    &format!("Wrote: {}", fix_path(output.display().to_string())),
                    config,
                );
            }
            true
        }
        Err(error) => {
            handle_error(&error, config, use_colors);
            false
        }
    }
}

fn epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn watch_mode(target: &Path, directory: bool, config: &Config, use_colors: bool) -> ! {
    let (tx, rx) = mpsc::channel();
    let mut watcher = match RecommendedWatcher::new(
        move |res: Result<notify::Event, notify::Error>| {
            if let Ok(event) = res {
                let _ = tx.send(event);
            }
        },
        notify::Config::default(),
    ) {
        Ok(watcher) => watcher,
        Err(error) => {
            eprintln!("Failed to create file watcher: {}", error);
            exit(1);
        }
    };

    let mode = if directory {
        RecursiveMode::Recursive
    } else {
        RecursiveMode::NonRecursive
    };
    if let Err(error) = watcher.watch(target, mode) {
        eprintln!(
            "Failed to watch '{}': {}",
            fix_path(target.display().to_string()),
            error
        );
        exit(1);
    }

    println!(
        "{} {}",
        format!("[{}]", Local::now().format("%H:%M:%S")).dimmed(),
        format!("watching {}", fix_path(target.display().to_string())).cyan()
    );

    // the notifier fires several events per change, so accepted events gate
    // out followers within the debounce window
    let mut last_accepted: HashMap<(PathBuf, &'static str), u64> = HashMap::new();

    for event in rx {
        let change_kind = match event.kind {
            EventKind::Create(_) => "create",
            EventKind::Modify(_) => "modify",
            _ => continue,
        };
        for path in event.paths {
            if path.extension().and_then(|e| e.to_str()) != Some(config.source_extension.as_str()) {
                continue;
            }
            if !directory && path != target {
                continue;
            }

            let now = epoch_ms();
            let key = (path.clone(), change_kind);
            if let Some(&last) = last_accepted.get(&key) {
                if now.saturating_sub(last) < config.debounce_ms {
                    continue;
                }
            }
            last_accepted.insert(key, now);

            println!(
                "{} {}",
                format!("[{}]", Local::now().format("%H:%M:%S")).dimmed(),
                format!("reprocessing {}", fix_path(path.display().to_string())).cyan()
            );
            run_job(&path, config, use_colors);
        }
    }

    exit(0)
}

fn main() {
    let args: Vec<String> = std_env::args().collect();
    let help_flag = args.contains(&"--help".to_string()) || args.contains(&"-h".to_string());
    let version_flag = args.contains(&"--version".to_string()) || args.contains(&"-v".to_string());
    let directory_flag = args.contains(&"--directory".to_string()) || args.contains(&"-d".to_string());
    let watch_flag = args.contains(&"--watch".to_string()) || args.contains(&"-w".to_string());
    let cli_flag = args.contains(&"--cli".to_string()) || args.contains(&"-X".to_string());
    let quiet_flag = args.contains(&"--quiet".to_string()) || args.contains(&"-q".to_string());
    let output_empty_flag =
        args.contains(&"--output-empty".to_string()) || args.contains(&"-e".to_string());
    let no_color_flag = args.contains(&"--no-color".to_string());

    if help_flag {
        print_help();
        exit(0);
    }
    if version_flag {
        println!("blcs {}", VERSION);
        exit(0);
    }
    if watch_flag && cli_flag {
        eprintln!("Error: --watch and --cli are mutually exclusive");
        print_usage();
        exit(1);
    }
    if !watch_flag && !cli_flag {
        eprintln!("Error: one of --watch or --cli is required");
        print_usage();
        exit(1);
    }

    let mut config = match get_config() {
        Ok(config) => config,
        Err(error) => {
            eprintln!("Warning: {} (using defaults)", error);
            Config::default()
        }
    };
    if quiet_flag {
        config.debug = false;
        config.warnings = false;
        config.use_traceback = false;
    }
    if output_empty_flag {
        config.output_empty = true;
    }
    if no_color_flag || !supports_color() {
        config.supports_color = false;
    }

    let use_colors = config.supports_color;

    let working_dir = std_env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let non_flag_args: Vec<String> = args
        .iter()
        .skip(1)
        .filter(|arg| !arg.starts_with('-'))
        .cloned()
        .collect();

    if non_flag_args.len() != 1 {
        print_usage();
        exit(1);
    }

    let mut target = PathBuf::from(&non_flag_args[0]);
    if target.is_relative() {
        target = working_dir.join(target);
    }
    if let Ok(canonical) = target.canonicalize() {
        target = canonical;
    }

    if directory_flag && !target.is_dir() {
        eprintln!(
            "Error: '{}' is not a directory",
            fix_path(target.display().to_string())
        );
        exit(1);
    }

    let targets: Vec<PathBuf> = if directory_flag {
        let mut files = Vec::new();
        collect_source_files(&target, &config.source_extension, &mut files);
        files
    } else {
        vec![target.clone()]
    };

    let mut all_ok = true;
    for path in &targets {
        all_ok &= run_job(path, &config, use_colors);
    }

    if cli_flag {
        exit(if all_ok { 0 } else { 1 });
    }

    watch_mode(&target, directory_flag, &config, use_colors);
}
