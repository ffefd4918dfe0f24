//! Script file loading tests.

use std::fs;

use keyroll::dsl::{Compiler, ErrorKind};

#[test]
fn load_compiles_file_contents() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("song.txt");
    fs::write(
        &path,
        "# demo\n,SET verse a s d\n,BPM 100\n,TAG top\n{verse}\n,GOTO top 1\n",
    )
    .unwrap();

    let (doc, vars) = Compiler::load(&path).unwrap();
    assert_eq!(vars.get("verse"), Some("a s d"));
    assert_eq!(doc.tag("top"), Some(1));
    // BPM, TAG, a, WAIT, s, WAIT, d, GOTO
    assert_eq!(doc.len(), 8);
}

#[test]
fn load_handles_crlf_line_endings() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("crlf.txt");
    fs::write(&path, ",BPM 90\r\nab\r\n").unwrap();

    let (doc, _) = Compiler::load(&path).unwrap();
    assert_eq!(doc.listing(), "001: BPM: 90\n002: PLAY: [a], [b]\n");
}

#[test]
fn load_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Compiler::load(dir.path().join("absent.txt")).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Io);
}

#[test]
fn load_reports_compile_error_line() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.txt");
    fs::write(&path, "a\nb\n[cd\n").unwrap();

    let err = Compiler::load(&path).unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnclosedChord);
    assert_eq!(err.line, 3);
}
