use gojs_core::error::Error;
use miette::Diagnostic;
use pretty_assertions::assert_eq;

/// Compares emitted code line by line.
pub fn assert_code(actual: &str, expected: &[&str]) {
    let actual: Vec<&str> = actual.lines().collect();
    assert_eq!(actual, expected);
}

pub fn assert_error_code(err: &Error, expected: &str) {
    assert_eq!(
        err.code().map(|code| code.to_string()).as_deref(),
        Some(expected),
        "unexpected diagnostic for {}",
        err
    );
}

pub fn count_lines(code: &str, line: &str) -> usize {
    code.lines().filter(|l| l.trim() == line).count()
}
