//! Integration tests for the pdftoolkit CLI
//!
//! Each test writes a small document with the library, runs the binary on
//! it and checks the files and exit status it leaves behind.

use anyhow::Result;
use pdf_toolkit::{Dictionary, Document, Object, Stream};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::{tempdir, TempDir};

const JPEG_BYTES: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0xFF, 0xD9];

/// Test helper to get the CLI binary path
fn get_cli_path() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // Remove test binary name
    if path.ends_with("deps") {
        path.pop(); // Remove "deps" directory
    }
    path.push("pdftoolkit");
    #[cfg(windows)]
    path.set_extension("exe");
    path
}

fn setup_temp_dir() -> TempDir {
    tempdir().expect("Failed to create temp directory")
}

fn run_cli_command(args: &[&str]) -> Result<Output> {
    let output = Command::new(get_cli_path()).args(args).output()?;
    Ok(output)
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

/// One page per content string, font /F1 on every page and the JPEG
/// `/Im1` on the last one
fn build_document(contents: &[&str]) -> Document {
    let mut doc = Document::new();

    let mut font = Dictionary::new();
    font.set("Type", Object::Name("Font".to_string()));
    font.set("Subtype", Object::Name("Type1".to_string()));
    font.set("BaseFont", Object::Name("Helvetica".to_string()));
    let font_id = doc.add_object(font);

    let mut image_dict = Dictionary::new();
    image_dict.set("Type", Object::Name("XObject".to_string()));
    image_dict.set("Subtype", Object::Name("Image".to_string()));
    image_dict.set("Width", 2);
    image_dict.set("Height", 2);
    image_dict.set("ColorSpace", Object::Name("DeviceRGB".to_string()));
    image_dict.set("BitsPerComponent", 8);
    image_dict.set("Filter", Object::Name("DCTDecode".to_string()));
    let image_id = doc.add_object(Stream::new(image_dict, JPEG_BYTES.to_vec()));

    for (index, content) in contents.iter().enumerate() {
        let mut fonts = Dictionary::new();
        fonts.set("F1", font_id);
        let mut resources = Dictionary::new();
        resources.set("Font", fonts);
        if index + 1 == contents.len() {
            let mut xobjects = Dictionary::new();
            xobjects.set("Im1", image_id);
            resources.set("XObject", xobjects);
        }

        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.as_bytes().to_vec()));

        let mut page = Dictionary::new();
        page.set("Type", Object::Name("Page".to_string()));
        page.set(
            "MediaBox",
            Object::Array(vec![0.into(), 0.into(), 612.into(), 792.into()]),
        );
        page.set("Resources", resources);
        page.set("Contents", content_id);
        let page_id = doc.add_object(page);
        doc.append_page(page_id).unwrap();
    }

    doc
}

fn write_document(dir: &Path, name: &str, contents: &[&str]) -> PathBuf {
    let path = dir.join(name);
    let bytes = build_document(contents).save_to_bytes().unwrap();
    fs::write(&path, bytes).unwrap();
    path
}

fn assert_pdf_exists_and_valid(path: &Path) {
    assert!(path.exists(), "PDF file should exist: {}", path.display());
    let content = fs::read(path).expect("Failed to read PDF file");
    assert!(
        content.starts_with(b"%PDF-"),
        "File should start with PDF header"
    );
}

fn first_string_on_page(path: &Path, index: usize) -> String {
    let doc = Document::load(&fs::read(path).unwrap()).unwrap();
    let content = doc.page_contents(doc.page_ids()[index]).unwrap();
    let text = String::from_utf8_lossy(&content);
    let start = text.find('(').unwrap() + 1;
    let end = text[start..].find(')').unwrap() + start;
    text[start..end].to_string()
}

#[test]
fn test_cli_help() {
    let output = run_cli_command(&["--help"]).expect("CLI command should run");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in [
        "extract-tables",
        "extract-images",
        "split",
        "merge",
        "protect",
        "unprotect",
        "info",
    ] {
        assert!(stdout.contains(command), "help should list {command}");
    }
}

#[test]
fn test_cli_extract_tables_writes_csv() {
    let temp_dir = setup_temp_dir();
    let input = write_document(
        temp_dir.path(),
        "table.pdf",
        &["BT /F1 10 Tf 72 700 Td (Name) Tj 100 0 Td (Amount) Tj 0 -14 Td (1,200) Tj -100 0 Td (Widget) Tj ET"],
    );
    let csv_path = temp_dir.path().join("out.csv");

    let output = run_cli_command(&[
        "extract-tables",
        path_str(&input),
        "-o",
        path_str(&csv_path),
    ])
    .unwrap();

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let csv = fs::read_to_string(&csv_path).unwrap();
    assert_eq!(csv, "Name,Amount\r\nWidget,\"1,200\"\r\n");
}

#[test]
fn test_cli_extract_images() {
    let temp_dir = setup_temp_dir();
    let input = write_document(temp_dir.path(), "images.pdf", &["BT ET"]);
    let out_dir = temp_dir.path().join("images");

    let output = run_cli_command(&[
        "extract-images",
        path_str(&input),
        "-o",
        path_str(&out_dir),
    ])
    .unwrap();

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let image = fs::read(out_dir.join("image_1.jpg")).unwrap();
    assert_eq!(image, JPEG_BYTES);
}

#[test]
fn test_cli_split_and_merge() {
    let temp_dir = setup_temp_dir();
    let input = write_document(
        temp_dir.path(),
        "three.pdf",
        &[
            "BT /F1 12 Tf 72 720 Td (First) Tj ET",
            "BT /F1 12 Tf 72 720 Td (Second) Tj ET",
            "BT /F1 12 Tf 72 720 Td (Third) Tj ET",
        ],
    );
    let split_dir = temp_dir.path().join("pages");

    let output = run_cli_command(&["split", path_str(&input), "-o", path_str(&split_dir)]).unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let pages: Vec<PathBuf> = (1..=3)
        .map(|n| split_dir.join(format!("page_{n}.pdf")))
        .collect();
    for page in &pages {
        assert_pdf_exists_and_valid(page);
    }
    assert_eq!(first_string_on_page(&pages[1], 0), "Second");

    // Reversed order on the way back
    let merged = temp_dir.path().join("merged.pdf");
    let output = run_cli_command(&[
        "merge",
        path_str(&pages[2]),
        path_str(&pages[1]),
        path_str(&pages[0]),
        "-o",
        path_str(&merged),
    ])
    .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    assert_eq!(first_string_on_page(&merged, 0), "Third");
    assert_eq!(first_string_on_page(&merged, 1), "Second");
    assert_eq!(first_string_on_page(&merged, 2), "First");
}

#[test]
fn test_cli_split_several_inputs_prefixes_names() {
    let temp_dir = setup_temp_dir();
    let a = write_document(temp_dir.path(), "a.pdf", &["BT ET"]);
    let b = write_document(temp_dir.path(), "b.pdf", &["BT ET", "BT ET"]);
    let out_dir = temp_dir.path().join("out");

    let output = run_cli_command(&["split", path_str(&a), path_str(&b), "-o", path_str(&out_dir)])
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    assert_pdf_exists_and_valid(&out_dir.join("a_page_1.pdf"));
    assert_pdf_exists_and_valid(&out_dir.join("b_page_1.pdf"));
    assert_pdf_exists_and_valid(&out_dir.join("b_page_2.pdf"));
}

#[test]
fn test_cli_protect_and_unprotect() {
    let temp_dir = setup_temp_dir();
    let input = write_document(
        temp_dir.path(),
        "plain.pdf",
        &["BT /F1 12 Tf 72 720 Td (Secret) Tj ET"],
    );
    let locked = temp_dir.path().join("locked.pdf");
    let unlocked = temp_dir.path().join("unlocked.pdf");

    let output = run_cli_command(&[
        "protect",
        path_str(&input),
        "-o",
        path_str(&locked),
        "-p",
        "hunter2",
    ])
    .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_pdf_exists_and_valid(&locked);

    let output = run_cli_command(&[
        "unprotect",
        path_str(&locked),
        "-o",
        path_str(&unlocked),
        "-p",
        "hunter2",
    ])
    .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(first_string_on_page(&unlocked, 0), "Secret");
}

#[test]
fn test_cli_unprotect_wrong_password_exit_code() {
    let temp_dir = setup_temp_dir();
    let input = write_document(temp_dir.path(), "plain.pdf", &["BT ET"]);
    let locked = temp_dir.path().join("locked.pdf");

    let output = run_cli_command(&[
        "protect",
        path_str(&input),
        "-o",
        path_str(&locked),
        "-p",
        "right",
    ])
    .unwrap();
    assert!(output.status.success());

    let output = run_cli_command(&[
        "unprotect",
        path_str(&locked),
        "-o",
        path_str(&temp_dir.path().join("never.pdf")),
        "-p",
        "wrong",
    ])
    .unwrap();

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Wrong password"), "stderr: {stderr}");
    assert!(!temp_dir.path().join("never.pdf").exists());
}

#[test]
fn test_cli_info() {
    let temp_dir = setup_temp_dir();
    let input = write_document(temp_dir.path(), "info.pdf", &["BT ET", "BT ET"]);

    let output = run_cli_command(&["info", path_str(&input)]).unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Pages: 2"), "stdout: {stdout}");
    assert!(stdout.contains("Encryption: none"), "stdout: {stdout}");
}

#[test]
fn test_cli_missing_input_fails() {
    let temp_dir = setup_temp_dir();
    let output = run_cli_command(&[
        "split",
        path_str(&temp_dir.path().join("absent.pdf")),
        "-o",
        path_str(temp_dir.path()),
    ])
    .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to read"), "stderr: {stderr}");
}

#[test]
fn test_cli_rejects_garbage_input() {
    let temp_dir = setup_temp_dir();
    let input = temp_dir.path().join("garbage.pdf");
    fs::write(&input, b"this is not a pdf").unwrap();

    let output = run_cli_command(&["info", path_str(&input)]).unwrap();
    assert!(!output.status.success());
}
