//! Command-line behaviour of the `ucc` binary

use pretty_assertions::assert_eq;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("ucc-cli-{}-{}", name, std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn corpus(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/corpus").join(name)
}

fn ucc() -> Command {
    Command::new(env!("CARGO_BIN_EXE_ucc"))
}

#[test]
fn test_compile_and_run() {
    let dir = scratch_dir("run");
    let output_path = dir.join("sim04.ir");
    let output = ucc()
        .arg(corpus("sim04.c"))
        .arg("-o")
        .arg(&output_path)
        .arg("--run")
        .stdin(Stdio::null())
        .output()
        .unwrap();

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "Hello\nGood bye\n");
    let ir = fs::read_to_string(&output_path).unwrap();
    assert!(ir.contains("function i32 @main("), "{}", ir);
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_default_output_path() {
    let dir = scratch_dir("default");
    let input = dir.join("answer.c");
    fs::write(&input, "int main(void) { putint(42); return 0; }\n").unwrap();

    let status = ucc().arg(&input).status().unwrap();
    assert!(status.success());
    assert!(dir.join("answer.ir").exists());
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_run_reads_stdin() {
    let dir = scratch_dir("stdin");
    let input = dir.join("echo.c");
    fs::write(
        &input,
        "int main(void) { char s[16]; getstring(s); putstring(s); return 0; }\n",
    )
    .unwrap();

    let mut child = ucc()
        .arg(&input)
        .arg("--run")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .unwrap();
    child.stdin.take().unwrap().write_all(b"hello\n").unwrap();
    let output = child.wait_with_output().unwrap();

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "hello");
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_errors_exit_nonzero() {
    let dir = scratch_dir("error");
    let input = dir.join("bad.c");
    let output_path = dir.join("bad.ir");
    fs::write(&input, "int main(void) {\n  return y;\n}\n").unwrap();

    let output = ucc().arg(&input).arg("-o").arg(&output_path).output().unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("undeclared identifier"), "{}", stderr);
    assert!(stderr.contains("error: cannot compile"), "{}", stderr);
    assert!(!output_path.exists());
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_runtime_errors_exit_nonzero() {
    let dir = scratch_dir("trap");
    let input = dir.join("div.c");
    fs::write(&input, "int main(void) { int z; putint(1); return 1 / z; }\n").unwrap();

    let output = ucc().arg(&input).arg("--run").stdin(Stdio::null()).output().unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "1");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("program failed"), "{}", stderr);
    fs::remove_dir_all(&dir).ok();
}
