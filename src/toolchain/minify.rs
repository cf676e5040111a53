// src/toolchain/minify.rs

//! Minification with `oxc_minifier` and `oxc_codegen`.
//!
//! Compression is on; mangling stays off so bundle globals and stack traces
//! keep their names.

use std::path::Path;

use oxc_allocator::Allocator;
use oxc_codegen::{Codegen, CodegenOptions};
use oxc_minifier::{CompressOptions, Minifier, MinifierOptions};

use crate::errors::{PipelineError, Result};
use crate::toolchain::syntax;

/// Compress `code` (a classic script, e.g. a UMD bundle) and print it
/// without comments or layout whitespace.
pub fn minify(path: &Path, code: &str) -> Result<String> {
    let allocator = Allocator::default();
    let mut program = syntax::parse(&allocator, path, code, syntax::script_source()).map_err(
        |err| match err {
            PipelineError::Syntax {
                path,
                line,
                column,
                message,
            } => PipelineError::Minify(format!("{}:{line}:{column}: {message}", path.display())),
            other => other,
        },
    )?;

    let options = MinifierOptions {
        mangle: None,
        compress: Some(CompressOptions::default()),
    };
    let ret = Minifier::new(options).minify(&allocator, &mut program);

    let printed = Codegen::new()
        .with_options(CodegenOptions::minify())
        .with_scoping(ret.scoping)
        .build(&program);
    Ok(printed.code)
}
