//! Command-line behavior of the `tightgen` binary.

use std::fs;
use std::process::{Command, Output};

fn tightgen(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tightgen"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run tightgen")
}

#[test]
fn test_widths_to_stdout() {
    let output = tightgen(&["3"]);
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("Failed to decode stdout");
    assert_eq!(stdout.matches("#define TIGHTDB_TABLE_DEF_").count(), 3);
    assert!(stdout.contains("#define TIGHTDB_TABLE_3("));
}

#[test]
fn test_usage_errors_exit_non_zero_without_output() {
    for args in [&[][..], &["0"][..], &["many"][..]] {
        let output = tightgen(args);
        assert_eq!(output.status.code(), Some(2), "args {args:?}");
        assert!(output.stdout.is_empty());
        assert!(!output.stderr.is_empty());
    }
}

#[test]
fn test_declarations_to_file() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let header = dir.path().join("model.h");
    let out = dir.path().join("model_gen.h");
    fs::write(
        &header,
        "// model\nDEFINE_TABLE(Person, (String, Name), (Int, Age), (Bool, Hired))\n",
    )
    .expect("Failed to write header");

    let output = tightgen(&[
        "--declarations",
        header.to_str().expect("Failed to convert path"),
        "--output",
        out.to_str().expect("Failed to convert path"),
    ]);
    assert!(output.status.success());
    assert!(output.stdout.is_empty());

    let written = fs::read_to_string(&out).expect("Failed to read output");
    assert!(written.contains("@interface Person_QueryAccessor_Hired : OCXQueryAccessorBool\n"));
    assert!(written.contains("@interface Person_View : TableView\n"));
}

#[test]
fn test_unknown_type_writes_nothing() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let schema = dir.path().join("bad.xml");
    let out = dir.path().join("bad.h");
    fs::write(
        &schema,
        r#"<tables><table name="T"><column name="a" type="Varchar"/></table></tables>"#,
    )
    .expect("Failed to write schema");

    let output = tightgen(&[
        "--schema",
        schema.to_str().expect("Failed to convert path"),
        "-o",
        out.to_str().expect("Failed to convert path"),
    ]);
    assert!(!output.status.success());
    assert!(!out.exists());
    let stderr = String::from_utf8(output.stderr).expect("Failed to decode stderr");
    assert!(stderr.contains("Varchar"));
}
