// src/toolchain/report.rs

//! Stylish (eslint-like) rendering of lint findings.

use std::path::Path;

use crate::toolchain::lint::LintFinding;

/// Render findings for one file. Empty input renders as an empty string.
///
/// ```text
/// src/app.js
///   2:7   warning  Expected '===' and instead saw '=='.  eqeqeq
///   10:1  warning  Trailing whitespace.                  trailing-whitespace
///
/// 2 problems
/// ```
pub fn stylish(path: &Path, findings: &[LintFinding]) -> String {
    if findings.is_empty() {
        return String::new();
    }

    let positions: Vec<String> = findings
        .iter()
        .map(|f| format!("{}:{}", f.line, f.column))
        .collect();
    let pos_width = positions.iter().map(String::len).max().unwrap_or(0);
    let msg_width = findings
        .iter()
        .map(|f| f.message.chars().count())
        .max()
        .unwrap_or(0);

    let mut out = format!("{}\n", path.display());
    for (f, pos) in findings.iter().zip(positions.iter()) {
        out.push_str(&format!(
            "  {pos:<pos_width$}  warning  {msg:<msg_width$}  {rule}\n",
            msg = f.message,
            rule = f.rule,
        ));
    }

    let n = findings.len();
    out.push_str(&format!(
        "\n{n} problem{}\n",
        if n == 1 { "" } else { "s" }
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(line: usize, column: usize, rule: &str, message: &str) -> LintFinding {
        LintFinding {
            line,
            column,
            rule: rule.to_string(),
            message: message.to_string(),
        }
    }

    #[test]
    fn empty_findings_render_nothing() {
        assert_eq!(stylish(Path::new("a.js"), &[]), "");
    }

    #[test]
    fn aligns_columns() {
        let out = stylish(
            Path::new("src/app.js"),
            &[
                finding(2, 7, "eqeqeq", "Expected '===' and instead saw '=='."),
                finding(10, 1, "trailing-whitespace", "Trailing whitespace."),
            ],
        );
        let expected = "src/app.js\n\
                        \x20 2:7   warning  Expected '===' and instead saw '=='.  eqeqeq\n\
                        \x20 10:1  warning  Trailing whitespace.                  trailing-whitespace\n\
                        \n2 problems\n";
        assert_eq!(out, expected);
    }

    #[test]
    fn singular_problem() {
        let out = stylish(Path::new("a.js"), &[finding(1, 1, "no-debugger", "x")]);
        assert!(out.ends_with("\n1 problem\n"));
    }
}
