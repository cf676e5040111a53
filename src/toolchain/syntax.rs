// src/toolchain/syntax.rs

//! Parsing front door for the builtin toolchain.
//!
//! Every builtin stage parses with `oxc_parser`; the first diagnostic is
//! turned into a [`PipelineError::Syntax`] with a 1-based position.

use std::path::Path;

use oxc_allocator::Allocator;
use oxc_ast::ast::Program;
use oxc_parser::Parser;
use oxc_span::SourceType;

use crate::errors::{PipelineError, Result};

/// Sources under `src` are ES modules.
pub fn module_source() -> SourceType {
    SourceType::mjs()
}

/// UMD bundles are classic scripts (`this` at the top level).
pub fn script_source() -> SourceType {
    SourceType::cjs()
}

/// Parse `source`, failing on the first diagnostic.
pub fn parse<'a>(
    allocator: &'a Allocator,
    path: &Path,
    source: &'a str,
    source_type: SourceType,
) -> Result<Program<'a>> {
    let ret = Parser::new(allocator, source, source_type).parse();

    if let Some(diag) = ret.errors.first() {
        let offset = diag
            .labels
            .as_ref()
            .and_then(|labels| labels.first())
            .map_or(0, |label| label.offset());
        let (line, column) = position(source, offset);
        return Err(PipelineError::Syntax {
            path: path.to_path_buf(),
            line,
            column,
            message: diag.message.to_string(),
        });
    }
    if ret.panicked {
        return Err(PipelineError::Syntax {
            path: path.to_path_buf(),
            line: 1,
            column: 1,
            message: "parser gave up on this file".to_string(),
        });
    }

    Ok(ret.program)
}

/// 1-based line and column (in chars) of a byte offset.
pub fn position(source: &str, offset: usize) -> (usize, usize) {
    let mut offset = offset.min(source.len());
    while !source.is_char_boundary(offset) {
        offset -= 1;
    }
    let before = &source[..offset];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    (line, before[line_start..].chars().count() + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(source: &str) -> Result<()> {
        let allocator = Allocator::default();
        parse(&allocator, Path::new("a.js"), source, module_source()).map(|_| ())
    }

    #[test]
    fn regex_after_control_heads_is_accepted() {
        for source in [
            "if (ok) /'/.test(s);\n",
            "while (x) /re/g.exec(s);\n",
            "for (;;) /a/.test(b);\n",
            "const r = a ? /x/ : /y/;\n",
            "const half = (a + b) / 2 / c;\n",
        ] {
            assert!(check(source).is_ok(), "{source}");
        }
    }

    #[test]
    fn errors_point_at_the_offending_token() {
        let err = check("const ok = 1;\nlet x = ;\n").unwrap_err();
        match err {
            PipelineError::Syntax { line, column, .. } => assert_eq!((line, column), (2, 9)),
            other => panic!("expected syntax error, got {other:?}"),
        }
    }

    #[test]
    fn unterminated_template_is_rejected() {
        assert!(matches!(
            check("const t = `open ${a}\n"),
            Err(PipelineError::Syntax { line: 1, .. })
        ));
    }

    #[test]
    fn position_counts_chars_not_bytes() {
        assert_eq!(position("é = 1;\nab", 0), (1, 1));
        assert_eq!(position("é = 1;\nab", "é = ".len()), (1, 5));
        assert_eq!(position("é = 1;\nab", "é = 1;\na".len()), (2, 2));
    }
}
