use std::fs;
use std::path::{Path, PathBuf};

use blcs::{
    collect_source_files, preprocess_entry, write_outputs, Config, FILE_BOTTOM_COMMENT,
    FILE_TOP_COMMENT,
};

fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("failed to create fixture directory");
    }
    fs::write(&path, content).expect("failed to write fixture");
    path
}

#[test]
fn cross_file_macros_expand() {
    let dir = tempfile::tempdir().expect("tempdir");
    let main = write_file(dir.path(), "main.blcs", "##blcs\n##use \"lib.blcs\"\n#GREET");
    write_file(dir.path(), "lib.blcs", "##blcs\n##define GREET \"hello\"");

    let outputs = preprocess_entry(&main, &Config::default()).expect("preprocessing failed");
    assert_eq!(outputs.len(), 2);
    assert_eq!(outputs[0].text, "\n\n\"hello\"");
    assert_eq!(outputs[1].text, "");
}

#[test]
fn outputs_carry_the_banner_comments() {
    let dir = tempfile::tempdir().expect("tempdir");
    let main = write_file(dir.path(), "main.blcs", "##blcs\n##use \"lib.blcs\"\n#GREET");
    write_file(dir.path(), "lib.blcs", "##blcs\n##define GREET \"hello\"");

    let config = Config::default();
    let outputs = preprocess_entry(&main, &config).expect("preprocessing failed");
    let written = write_outputs(&outputs, &config).expect("writing failed");

    assert_eq!(written, vec![dir.path().join("main.cs")]);
    let content = fs::read_to_string(dir.path().join("main.cs")).expect("missing output");
    assert_eq!(
        content,
        format!("{}\n\n\n\"hello\"\n\n{}", FILE_TOP_COMMENT, FILE_BOTTOM_COMMENT)
    );
    // empty outputs are suppressed by default
    assert!(!dir.path().join("lib.cs").exists());
}

#[test]
fn output_empty_writes_the_banner_shell() {
    let dir = tempfile::tempdir().expect("tempdir");
    let main = write_file(dir.path(), "main.blcs", "##blcs\n##use \"lib.blcs\"\n#GREET");
    write_file(dir.path(), "lib.blcs", "##blcs\n##define GREET \"hello\"");

    let mut config = Config::default();
    config.output_empty = true;
    let outputs = preprocess_entry(&main, &config).expect("preprocessing failed");
    write_outputs(&outputs, &config).expect("writing failed");

    let content = fs::read_to_string(dir.path().join("lib.cs")).expect("missing output");
    assert_eq!(
        content,
        format!("{}\n\n\n{}", FILE_TOP_COMMENT, FILE_BOTTOM_COMMENT)
    );
}

#[test]
fn use_paths_resolve_against_the_entry_directory() {
    let dir = tempfile::tempdir().expect("tempdir");
    let main = write_file(
        dir.path(),
        "main.blcs",
        "##blcs\n##use \"sub/lib.blcs\"\nx = #LIB + #UTIL;",
    );
    // lib.blcs lives in sub/ but its import still resolves from the top level
    write_file(
        dir.path(),
        "sub/lib.blcs",
        "##blcs\n##use \"util.blcs\"\n##define LIB 1",
    );
    write_file(dir.path(), "util.blcs", "##blcs\n##define UTIL 2");

    let outputs = preprocess_entry(&main, &Config::default()).expect("preprocessing failed");
    assert_eq!(outputs[0].text, "\n\nx = 1 + 2;");
}

#[test]
fn diamond_imports_are_parsed_once() {
    let dir = tempfile::tempdir().expect("tempdir");
    let main = write_file(
        dir.path(),
        "main.blcs",
        "##blcs\n##use \"a.blcs\"\n##use \"b.blcs\"\nx = #S;",
    );
    write_file(dir.path(), "a.blcs", "##blcs\n##use \"shared.blcs\"");
    write_file(dir.path(), "b.blcs", "##blcs\n##use \"shared.blcs\"");
    write_file(dir.path(), "shared.blcs", "##blcs\n##define S 7");

    let outputs = preprocess_entry(&main, &Config::default()).expect("preprocessing failed");
    assert_eq!(outputs.len(), 4);
    assert_eq!(outputs[0].text, "\n\n\nx = 7;");
}

#[test]
fn duplicate_macros_across_files_are_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let main = write_file(
        dir.path(),
        "main.blcs",
        "##blcs\n##use \"lib.blcs\"\n##define MAX 9\n",
    );
    write_file(dir.path(), "lib.blcs", "##blcs\n##define MAX 10\n");

    let error = preprocess_entry(&main, &Config::default()).expect_err("should fail");
    assert_eq!(error.error_type(), "MultipleDefinitionsError");
}

#[test]
fn cycles_across_files_are_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let main = write_file(
        dir.path(),
        "main.blcs",
        "##blcs\n##use \"lib.blcs\"\n##define A #B\n#A",
    );
    write_file(dir.path(), "lib.blcs", "##blcs\n##define B #A\n");

    let error = preprocess_entry(&main, &Config::default()).expect_err("should fail");
    assert_eq!(error.error_type(), "InfiniteMacroRecursionError");
    assert_eq!(error.msg(), "'A' -> 'B'");
}

#[test]
fn missing_imports_are_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let main = write_file(dir.path(), "main.blcs", "##blcs\n##use \"nope.blcs\"\n");

    let error = preprocess_entry(&main, &Config::default()).expect_err("should fail");
    assert_eq!(error.error_type(), "FileNotFoundError");
}

#[test]
fn wrong_extensions_are_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let entry = write_file(dir.path(), "main.txt", "##blcs\n");

    let error = preprocess_entry(&entry, &Config::default()).expect_err("should fail");
    assert_eq!(error.error_type(), "FileExtensionError");

    let main = write_file(dir.path(), "main.blcs", "##blcs\n##use \"other.txt\"\n");
    write_file(dir.path(), "other.txt", "##blcs\n");
    let error = preprocess_entry(&main, &Config::default()).expect_err("should fail");
    assert_eq!(error.error_type(), "FileExtensionError");
}

#[test]
fn undefined_cross_file_invocations_are_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let main = write_file(dir.path(), "main.blcs", "##blcs\nx = #MISSING;\n");

    let error = preprocess_entry(&main, &Config::default()).expect_err("should fail");
    assert_eq!(error.error_type(), "UndefinedMacroError");
}

#[test]
fn source_files_are_collected_recursively_in_order() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_file(dir.path(), "b.blcs", "##blcs\n");
    write_file(dir.path(), "a.blcs", "##blcs\n");
    write_file(dir.path(), "sub/c.blcs", "##blcs\n");
    write_file(dir.path(), "notes.txt", "not a source file");

    let mut files = Vec::new();
    collect_source_files(dir.path(), "blcs", &mut files);
    assert_eq!(
        files,
        vec![
            dir.path().join("a.blcs"),
            dir.path().join("b.blcs"),
            dir.path().join("sub/c.blcs"),
        ]
    );
}

#[test]
fn default_config_matches_the_shipped_format() {
    let config = Config::default();
    assert_eq!(config.source_extension, "blcs");
    assert_eq!(config.output_extension, "cs");
    assert_eq!(config.debounce_ms, 100);
    assert!(!config.output_empty);
}
