use std::fs;
use std::io::Write;
use std::process::Command;

use karst::env::Environment;
use karst::eval;
use karst::parser;

#[test]
fn evaluates_a_script_loaded_from_disk() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("sum.kst");
    let mut file = fs::File::create(&path).expect("create script");
    writeln!(file, "let add = (a, b) => {{ a + b }}").expect("write script");
    writeln!(file, "let total = 0").expect("write script");
    writeln!(file, "each(range(1, 5), (n, i) => {{ total = add(total, n) }})").expect("write script");
    writeln!(file, "total").expect("write script");
    drop(file);

    let source = fs::read_to_string(&path).expect("read script");
    let report = parser::parse_program(&source);
    assert!(report.errors.is_empty(), "parse errors: {:?}", report.errors);

    let result = eval::eval_block(&report.program, &Environment::new()).expect("evaluation");
    assert_eq!(result.inspect(), "10");
}

#[test]
fn cli_prints_the_final_value() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("program.kst");
    fs::write(&path, "let x = 2 * (5 + 10)\nif (x > 20) { x }\n").expect("write script");

    let output = Command::new(env!("CARGO_BIN_EXE_karst"))
        .arg(&path)
        .output()
        .expect("run interpreter");
    assert!(output.status.success(), "stderr: {:?}", output.stderr);
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "?(30)");
}

#[test]
fn cli_reports_parse_faults_with_source_context() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("broken.kst");
    fs::write(&path, "let = 5\n").expect("write script");

    let output = Command::new(env!("CARGO_BIN_EXE_karst"))
        .arg(&path)
        .output()
        .expect("run interpreter");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Expected IDENT"), "stderr: {stderr}");
    assert!(stderr.contains("let = 5"), "stderr: {stderr}");
}

#[test]
fn cli_reports_runtime_faults() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("crash.kst");
    fs::write(&path, "let a = 5\na / 0\n").expect("write script");

    let output = Command::new(env!("CARGO_BIN_EXE_karst"))
        .arg(&path)
        .output()
        .expect("run interpreter");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("division by zero"), "stderr: {stderr}");
}

#[test]
fn cli_prints_the_canonical_ast() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("pretty.kst");
    fs::write(&path, "1 + 2 * 3\n").expect("write script");

    let output = Command::new(env!("CARGO_BIN_EXE_karst"))
        .arg(&path)
        .arg("--ast")
        .output()
        .expect("run interpreter");
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        "(1 + (2 * 3))"
    );
}
