use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

fn make_zip(path: &Path, members: &[(&str, &[u8])]) {
    let file = File::create(path).unwrap();
    let mut writer = zip::ZipWriter::new(file);
    let options = zip::write::FileOptions::default();
    for (name, data) in members {
        writer.start_file(*name, options).unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap();
}

fn zip_names(path: &Path) -> Vec<String> {
    let file = File::open(path).unwrap();
    let mut zip = zip::ZipArchive::new(file).unwrap();
    // `file_names()` iterates a HashMap with unstable order; read by index
    // so names come back in central-directory order.
    (0..zip.len())
        .map(|i| zip.by_index(i).unwrap().name().to_string())
        .collect()
}

fn make_gzip(path: &Path, data: &[u8]) {
    let file = File::create(path).unwrap();
    let mut encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap();
}

#[test]
fn delete_removes_matched_records_from_zip() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let archive = dir.path().join("stuff.zip");
    make_zip(
        &archive,
        &[
            ("a.txt", b"alpha"),
            ("b.txt", b"beta"),
            ("notes/c.txt", b"gamma"),
        ],
    );

    let mut cmd = Command::cargo_bin("nestarc")?;
    cmd.arg("delete").arg(&archive).arg("*.txt");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("deleting a.txt").and(predicate::str::contains("(100%)")));

    // Top-level .txt records gone; the nested one untouched.
    assert_eq!(zip_names(&archive), ["notes/c.txt"]);
    Ok(())
}

#[test]
fn delete_with_unmatched_pattern_mutates_nothing() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let archive = dir.path().join("stuff.zip");
    make_zip(&archive, &[("a.txt", b"alpha"), ("b.bin", b"beta")]);

    let mut cmd = Command::cargo_bin("nestarc")?;
    cmd.arg("delete").arg(&archive).arg("a.txt").arg("missing.*");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("missing.*"));

    assert_eq!(zip_names(&archive), ["a.txt", "b.bin"]);
    Ok(())
}

#[test]
fn delete_takes_maczip_header_along() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let archive = dir.path().join("mac.zip");
    make_zip(
        &archive,
        &[
            ("notes.txt", b"body"),
            ("__MACOSX/._notes.txt", b"finder info"),
            ("keep.bin", b"x"),
        ],
    );

    let mut cmd = Command::cargo_bin("nestarc")?;
    cmd.arg("delete").arg(&archive).arg("notes.txt");
    cmd.assert().success();

    assert_eq!(zip_names(&archive), ["keep.bin"]);
    Ok(())
}

#[test]
fn delete_from_gzip_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let gz = dir.path().join("notes.txt.gz");
    make_gzip(&gz, b"hello\r\n");

    let mut cmd = Command::cargo_bin("nestarc")?;
    cmd.arg("delete").arg(&gz).arg("notes.txt");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("read-only"));

    assert!(gz.exists());
    Ok(())
}

#[test]
fn delete_directory_tree_from_host_filesystem() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let sub = dir.path().join("sub");
    fs::create_dir(&sub)?;
    fs::write(sub.join("x.txt"), b"x")?;
    fs::write(sub.join("y.txt"), b"y")?;
    fs::write(dir.path().join("keep.txt"), b"k")?;

    let mut cmd = Command::cargo_bin("nestarc")?;
    cmd.arg("delete").arg(dir.path()).arg("sub");
    cmd.assert().success();

    assert!(!sub.exists(), "directory deleted after its children");
    assert!(dir.path().join("keep.txt").exists());
    Ok(())
}

#[test]
fn print_decodes_legacy_line_endings() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let archive = dir.path().join("texts.zip");
    make_zip(&archive, &[("hello.txt", b"AB\r\nCD\rEF\n")]);

    let mut cmd = Command::cargo_bin("nestarc")?;
    cmd.arg("print").arg(&archive).arg("hello.txt");
    cmd.assert().success().stdout("AB\nCD\nEF\n");
    Ok(())
}

#[test]
fn print_reaches_through_nested_zip_chain() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let inner = dir.path().join("inner.zip");
    make_zip(&inner, &[("deep.txt", b"hi\r")]);
    let outer = dir.path().join("outer.zip");
    make_zip(&outer, &[("inner.zip", &fs::read(&inner)?)]);

    let spec = format!("{}/inner.zip", outer.display());
    let mut cmd = Command::cargo_bin("nestarc")?;
    cmd.arg("print").arg(&spec).arg("deep.txt");
    cmd.assert().success().stdout("hi\n");
    Ok(())
}

#[test]
fn print_from_gzip_wrapper() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let gz = dir.path().join("notes.txt.gz");
    make_gzip(&gz, b"line one\rline two\r");

    let mut cmd = Command::cargo_bin("nestarc")?;
    cmd.arg("print").arg(&gz).arg("notes.txt");
    cmd.assert().success().stdout("line one\nline two\n");
    Ok(())
}

#[test]
fn print_skips_maczip_headers() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let archive = dir.path().join("mac.zip");
    make_zip(
        &archive,
        &[
            ("notes.txt", b"body\r"),
            ("__MACOSX/._notes.txt", b"\x00\x05\x16\x07binary junk"),
        ],
    );

    let mut cmd = Command::cargo_bin("nestarc")?;
    cmd.arg("print").arg(&archive).arg("*").arg("__MACOSX/*");
    cmd.assert().success().stdout("body\n");
    Ok(())
}

#[test]
fn show_info_dumps_chain_and_catalog() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let archive = dir.path().join("stuff.zip");
    make_zip(&archive, &[("a.txt", b"alpha"), ("docs/b.txt", b"beta")]);

    let mut cmd = Command::cargo_bin("nestarc")?;
    cmd.arg("debug-show-info").arg(&archive);
    cmd.assert().success().stdout(
        predicate::str::contains("stuff.zip (zip)")
            .and(predicate::str::contains("2 record(s)"))
            .and(predicate::str::contains("a.txt"))
            .and(predicate::str::contains("docs/b.txt")),
    );
    Ok(())
}

#[test]
fn wtree_depth_bounds_nested_listing() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let archive = dir.path().join("bundle.zip");
    make_zip(&archive, &[("member.txt", b"data")]);

    // Bounded depths never open plain files living inside a filesystem.
    let mut cmd = Command::cargo_bin("nestarc")?;
    cmd.arg("debug-wtree")
        .arg(dir.path())
        .arg("--depth")
        .arg("shallow");
    cmd.assert().success().stdout(
        predicate::str::contains("bundle.zip [zip]")
            .and(predicate::str::contains("member.txt").not()),
    );

    // Max opens everything.
    let mut cmd = Command::cargo_bin("nestarc")?;
    cmd.arg("debug-wtree")
        .arg(dir.path())
        .arg("--depth")
        .arg("max");
    cmd.assert().success().stdout(
        predicate::str::contains("bundle.zip [zip]").and(predicate::str::contains("member.txt")),
    );
    Ok(())
}

#[test]
fn empty_pattern_list_is_rejected_before_resolution() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("nestarc")?;
    cmd.arg("delete").arg("does-not-even-exist.zip");
    cmd.assert().failure();
    Ok(())
}
