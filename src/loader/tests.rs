use std::fs;

use tempfile::TempDir;

use super::*;

#[test]
fn missing_path_is_an_error() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let missing = dir.path().join("does-not-exist");

    let result = load_folder(&missing);
    assert!(matches!(result, Err(RagError::NotFound(ref p)) if *p == missing));
}

#[test]
fn file_path_is_an_error() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let file = dir.path().join("page.html");
    fs::write(&file, "<p>hi</p>").expect("Failed to write file");

    assert!(matches!(load_folder(&file), Err(RagError::NotFound(_))));
}

#[test]
fn empty_directory_loads_nothing() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let contents = load_folder(dir.path()).expect("Failed to load folder");
    assert!(contents.is_empty());
}

#[test]
fn loads_all_regular_files() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    fs::write(dir.path().join("a.html"), "<h1>A</h1>").expect("Failed to write file");
    fs::write(dir.path().join("b.html"), "<h1>B</h1>").expect("Failed to write file");

    let mut contents = load_folder(dir.path()).expect("Failed to load folder");
    contents.sort();
    assert_eq!(contents, vec!["<h1>A</h1>", "<h1>B</h1>"]);
}

#[test]
fn non_utf8_files_are_skipped() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    fs::write(dir.path().join("good.html"), "<p>ok</p>").expect("Failed to write file");
    fs::write(dir.path().join("bad.bin"), [0xff, 0xfe, 0x00, 0x9f]).expect("Failed to write file");

    let contents = load_folder(dir.path()).expect("Failed to load folder");
    assert_eq!(contents, vec!["<p>ok</p>"]);
}

#[test]
fn subdirectories_are_not_recursed() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    fs::write(dir.path().join("top.html"), "top").expect("Failed to write file");
    let nested = dir.path().join("nested");
    fs::create_dir(&nested).expect("Failed to create subdir");
    fs::write(nested.join("inner.html"), "inner").expect("Failed to write file");

    let contents = load_folder(dir.path()).expect("Failed to load folder");
    assert_eq!(contents, vec!["top"]);
}
