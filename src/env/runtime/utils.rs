use std::collections::HashMap;
use std::fs;
use std::io::IsTerminal;

use once_cell::sync::Lazy;

use crate::env::runtime::config::Config;

static COLOR_MAP: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert("black", "\x1b[30m");
    m.insert("red", "\x1b[31m");
    m.insert("green", "\x1b[32m");
    m.insert("yellow", "\x1b[33m");
    m.insert("blue", "\x1b[34m");
    m.insert("magenta", "\x1b[35m");
    m.insert("cyan", "\x1b[36m");
    m.insert("white", "\x1b[37m");
    m.insert("gray", "\x1b[90m");
    m.insert("bright_red", "\x1b[91m");
    m.insert("bright_green", "\x1b[92m");
    m.insert("bright_yellow", "\x1b[93m");
    m.insert("bright_blue", "\x1b[94m");
    m.insert("bright_magenta", "\x1b[95m");
    m.insert("bright_cyan", "\x1b[96m");
    m.insert("bright_white", "\x1b[97m");
    m.insert("reset", "\x1b[0m");
    m
});

pub fn hex_to_ansi(hex_color: &str, use_colors: bool) -> String {
    if !use_colors {
        return "".to_string();
    }

    if let Some(ansi) = COLOR_MAP.get(hex_color.to_lowercase().replace(' ', "_").as_str()) {
        return ansi.to_string();
    }

    let hex = if let Some(stripped) = hex_color.strip_prefix('#') {
        stripped
    } else if let Some(stripped) = hex_color.strip_prefix("0x") {
        stripped
    } else {
        hex_color
    };

    if hex.len() == 6 {
        let r = u8::from_str_radix(&hex[0..2], 16).unwrap_or(255);
        let g = u8::from_str_radix(&hex[2..4], 16).unwrap_or(255);
        let b = u8::from_str_radix(&hex[4..6], 16).unwrap_or(255);
        return format!("\x1b[38;2;{};{};{}m", r, g, b);
    }

    "\x1b[0m".to_string()
}

pub fn check_ansi<'a>(ansi: &'a str, use_colors: &bool) -> &'a str {
    if !*use_colors {
        &ansi[0..0]
    } else {
        ansi
    }
}

pub fn print_colored(message: &str, color: &str, use_colors: bool) {
    println!(
        "{}{}{}",
        hex_to_ansi(color, use_colors),
        message,
        hex_to_ansi("reset", use_colors)
    );
}

pub fn debug_log(message: &str, config: &Config) {
    if !config.debug {
        return;
    }
    let single_line_message = message
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
        .replace('\x1b', "\\e");
    print_colored(
        &format!("[DEBUG] {}", single_line_message),
        &config.color_scheme.debug,
        config.supports_color,
    );
}

pub fn supports_color() -> bool {
    let is_tty = std::io::stdout().is_terminal();
    let term = std::env::var("TERM").unwrap_or_default();

    is_tty && term != "dumb"
}

pub fn get_line_info(file_path: &str, line_number: usize) -> Option<String> {
    let source = match fs::read_to_string(file_path) {
        Ok(content) => content,
        Err(_) => return None,
    };
    source
        .lines()
        .nth(line_number.saturating_sub(1))
        .map(|s| s.to_string())
}

pub fn fix_path(raw_path: String) -> String {
    let path = raw_path.trim();
    if path.is_empty() {
        return String::new();
    }
    if path.starts_with('/') {
        return path.to_string().replace('\\', "/");
    }
    if let Some(stripped) = path.strip_prefix("./") {
        return stripped.to_string().replace('\\', "/");
    }
    if let Some(stripped) = path.strip_prefix(r"\\?\") {
        return stripped.to_string().replace('\\', "/");
    }
    path.replace('\\', "/")
}
