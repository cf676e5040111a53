// src/toolchain/bundle.rs

//! Concatenating ES-module bundler with a UMD wrapper.
//!
//! Relative imports are resolved on the [`FileSystem`], inlined once each as
//! a scoped module function (dependencies first), and their bindings are
//! rewritten to property reads. Bare specifiers (`"lodash"`) become UMD
//! dependencies handed to the factory.
//!
//! Module syntax is located on the `oxc` AST; the rest of each file is
//! copied through by byte span.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use oxc_allocator::Allocator;
use oxc_ast::ast::{
    BindingIdentifier, ExportDefaultDeclaration, ExportDefaultDeclarationKind,
    ExportNamedDeclaration, ImportDeclarationSpecifier, Statement,
};
use oxc_ecmascript::BoundNames;
use oxc_span::{GetSpan, Span};
use tracing::debug;

use crate::banner;
use crate::errors::{PipelineError, Result};
use crate::fs::FileSystem;
use crate::toolchain::syntax;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Binding {
    Default(String),
    Namespace(String),
    Named { imported: String, local: String },
}

#[derive(Debug, Clone)]
enum EditKind {
    Text(String),
    Import {
        specifier: String,
        bindings: Vec<Binding>,
    },
}

#[derive(Debug, Clone)]
struct Edit {
    start: usize,
    end: usize,
    kind: EditKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ExportItem {
    /// `exports.exported = local;`
    Local { exported: String, local: String },
    /// `export { imported as exported } from '...'`; `imported == None`
    /// re-exports the whole namespace (`export * as ns from`).
    From {
        exported: String,
        specifier: String,
        imported: Option<String>,
    },
    /// `export * from '...'`
    Star { specifier: String },
}

#[derive(Debug, Default)]
struct ParsedModule {
    edits: Vec<Edit>,
    exports: Vec<ExportItem>,
    specifiers: Vec<String>,
}

impl ParsedModule {
    fn add_specifier(&mut self, specifier: &str) {
        if !self.specifiers.iter().any(|s| s == specifier) {
            self.specifiers.push(specifier.to_string());
        }
    }
}

#[derive(Debug, Clone)]
struct ModuleRef {
    var: String,
    external: bool,
}

/// Bundle `entry` (whose contents are `source`) into one UMD module that
/// registers itself as `global_name` in browsers.
pub fn bundle(
    fs: &dyn FileSystem,
    entry: &Path,
    source: &str,
    global_name: &str,
) -> Result<String> {
    let mut bundler = Bundler {
        fs,
        vars: HashMap::new(),
        stack: Vec::new(),
        chunks: Vec::new(),
        externals: Vec::new(),
    };

    let entry_code = bundler.visit(entry, source)?;

    debug!(
        entry = ?entry,
        modules = bundler.chunks.len() + 1,
        externals = ?bundler.externals,
        "bundled module graph"
    );

    let mut body = String::new();
    for chunk in bundler.chunks.iter() {
        body.push_str(chunk);
        body.push('\n');
    }
    body.push_str(&entry_code);

    Ok(umd(global_name, &bundler.externals, &body))
}

struct Bundler<'f> {
    fs: &'f dyn FileSystem,
    /// Module variable for every inlined dependency.
    vars: HashMap<PathBuf, String>,
    /// Modules currently being visited, for cycle detection.
    stack: Vec<PathBuf>,
    /// Wrapped dependency modules, dependencies before dependents.
    chunks: Vec<String>,
    externals: Vec<String>,
}

impl Bundler<'_> {
    fn visit(&mut self, path: &Path, source: &str) -> Result<String> {
        self.stack.push(path.to_path_buf());
        let parsed = parse_module(path, source)?;

        let mut refs = HashMap::new();
        for specifier in parsed.specifiers.iter() {
            let module_ref = if is_relative(specifier) {
                let dep = resolve(self.fs, path, specifier)?;
                if self.stack.contains(&dep) {
                    return Err(PipelineError::Resolve(format!(
                        "circular import: {:?} imports {:?}",
                        path, dep
                    )));
                }
                let var = match self.vars.get(&dep) {
                    Some(var) => var.clone(),
                    None => {
                        let dep_source = self.fs.read_to_string(&dep)?;
                        let code = self.visit(&dep, &dep_source)?;
                        let var = module_var(&dep, self.vars.len());
                        self.chunks.push(wrap_module(&var, &code));
                        self.vars.insert(dep, var.clone());
                        var
                    }
                };
                ModuleRef {
                    var,
                    external: false,
                }
            } else {
                if !self.externals.contains(specifier) {
                    self.externals.push(specifier.clone());
                }
                ModuleRef {
                    var: external_var(specifier),
                    external: true,
                }
            };
            refs.insert(specifier.clone(), module_ref);
        }

        self.stack.pop();
        Ok(render(source, &parsed, &refs))
    }
}

fn is_relative(specifier: &str) -> bool {
    specifier.starts_with("./") || specifier.starts_with("../")
}

/// Try `specifier`, `specifier.js` and `specifier/index.js` relative to the importer.
fn resolve(fs: &dyn FileSystem, importer: &Path, specifier: &str) -> Result<PathBuf> {
    let dir = importer.parent().unwrap_or_else(|| Path::new(""));
    let base = normalize(&dir.join(specifier));

    let mut with_ext = base.clone().into_os_string();
    with_ext.push(".js");

    let candidates = [base.clone(), PathBuf::from(with_ext), base.join("index.js")];
    candidates
        .into_iter()
        .find(|c| fs.is_file(c))
        .ok_or_else(|| {
            PipelineError::Resolve(format!(
                "cannot resolve '{}' imported from {:?}",
                specifier, importer
            ))
        })
}

/// Lexically fold `.` and `..` components.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

fn sanitize(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn module_var(path: &Path, index: usize) -> String {
    let stem = path
        .file_stem()
        .map(|s| sanitize(&s.to_string_lossy()))
        .unwrap_or_default();
    format!("__mod_{stem}_{index}")
}

fn external_var(specifier: &str) -> String {
    format!("__ext_{}", sanitize(specifier))
}

fn wrap_module(var: &str, code: &str) -> String {
    format!("var {var} = (function () {{\nvar exports = {{}};\n{code}\nreturn exports;\n}})();")
}

fn js_quote(s: &str) -> String {
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// `object.name`, or `object['name']` when `name` is not a plain identifier
/// (`export { x as 'kebab-name' }`).
fn member(object: &str, name: &str) -> String {
    let mut chars = name.chars();
    let plain = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
    if plain {
        format!("{object}.{name}")
    } else {
        format!("{object}[{}]", js_quote(name))
    }
}

fn umd(global_name: &str, externals: &[String], body: &str) -> String {
    let cjs: String = externals
        .iter()
        .map(|e| format!(", require({})", js_quote(e)))
        .collect();
    let amd: String = externals.iter().map(|e| format!(", {}", js_quote(e))).collect();
    let globals: String = externals
        .iter()
        .map(|e| format!(", global.{}", banner::global_name(e)))
        .collect();
    let params: String = externals
        .iter()
        .map(|e| format!(", {}", external_var(e)))
        .collect();

    format!(
        "(function (global, factory) {{\n\
         \x20 typeof exports === 'object' && typeof module !== 'undefined' ? factory(exports{cjs}) :\n\
         \x20 typeof define === 'function' && define.amd ? define(['exports'{amd}], factory) :\n\
         \x20 (global = typeof globalThis !== 'undefined' ? globalThis : global || self, factory(global.{global_name} = {{}}{globals}));\n\
         }})(this, (function (exports{params}) {{ 'use strict';\n\n{body}\n\n}}));\n"
    )
}

fn render(source: &str, parsed: &ParsedModule, refs: &HashMap<String, ModuleRef>) -> String {
    let mut out = String::with_capacity(source.len() + 64);
    let mut cursor = 0;

    for edit in parsed.edits.iter() {
        out.push_str(&source[cursor..edit.start]);
        match &edit.kind {
            EditKind::Text(text) => out.push_str(text),
            EditKind::Import {
                specifier,
                bindings,
            } => {
                if let Some(module_ref) = refs.get(specifier) {
                    out.push_str(&render_import(bindings, module_ref));
                }
            }
        }
        cursor = edit.end;
    }
    out.push_str(&source[cursor..]);

    for item in parsed.exports.iter() {
        out.push('\n');
        match item {
            ExportItem::Local { exported, local } => {
                out.push_str(&format!("{} = {local};", member("exports", exported)));
            }
            ExportItem::From {
                exported,
                specifier,
                imported,
            } => {
                let Some(module_ref) = refs.get(specifier) else {
                    continue;
                };
                match imported {
                    Some(name) => {
                        out.push_str(&format!(
                        "{} = {};",
                        member("exports", exported),
                        member(&module_ref.var, name)
                    ))
                    }
                    None => out.push_str(&format!(
                        "{} = {};",
                        member("exports", exported),
                        module_ref.var
                    )),
                }
            }
            ExportItem::Star { specifier } => {
                let Some(module_ref) = refs.get(specifier) else {
                    continue;
                };
                let m = &module_ref.var;
                out.push_str(&format!(
                    "for (var __k in {m}) if (__k !== 'default' && !Object.prototype.hasOwnProperty.call(exports, __k)) exports[__k] = {m}[__k];"
                ));
            }
        }
    }
    out
}

fn render_import(bindings: &[Binding], module_ref: &ModuleRef) -> String {
    if bindings.is_empty() {
        return String::new();
    }
    let m = &module_ref.var;
    let decls: Vec<String> = bindings
        .iter()
        .map(|b| match b {
            Binding::Default(local) if module_ref.external => {
                format!("{local} = ({m} && {m}.__esModule ? {m}.default : {m})")
            }
            Binding::Default(local) => format!("{local} = {m}.default"),
            Binding::Namespace(local) => format!("{local} = {m}"),
            Binding::Named { imported, local } => format!("{local} = {}", member(m, imported)),
        })
        .collect();
    format!("var {};", decls.join(", "))
}

/// Describe how to rewrite the top-level `import` / `export` statements of
/// `source`. Dynamic `import()` and nested code are left untouched.
fn parse_module(path: &Path, source: &str) -> Result<ParsedModule> {
    let allocator = Allocator::default();
    let program = syntax::parse(&allocator, path, source, syntax::module_source())?;

    let mut parsed = ParsedModule::default();
    for stmt in program.body.iter() {
        match stmt {
            Statement::ImportDeclaration(decl) => {
                let specifier = decl.source.value.to_string();
                let bindings = decl
                    .specifiers
                    .as_ref()
                    .map(|specifiers| specifiers.iter().map(binding).collect())
                    .unwrap_or_default();
                parsed.add_specifier(&specifier);
                parsed.edits.push(Edit {
                    start: decl.span.start as usize,
                    end: decl.span.end as usize,
                    kind: EditKind::Import {
                        specifier,
                        bindings,
                    },
                });
            }
            Statement::ExportNamedDeclaration(decl) => export_named(&mut parsed, decl),
            Statement::ExportDefaultDeclaration(decl) => export_default(&mut parsed, decl),
            Statement::ExportAllDeclaration(decl) => {
                let specifier = decl.source.value.to_string();
                parsed.add_specifier(&specifier);
                parsed.exports.push(match &decl.exported {
                    Some(name) => ExportItem::From {
                        exported: name.name().to_string(),
                        specifier,
                        imported: None,
                    },
                    None => ExportItem::Star { specifier },
                });
                strip(&mut parsed, decl.span);
            }
            _ => {}
        }
    }
    Ok(parsed)
}

fn binding(specifier: &ImportDeclarationSpecifier<'_>) -> Binding {
    match specifier {
        ImportDeclarationSpecifier::ImportSpecifier(s) => Binding::Named {
            imported: s.imported.name().to_string(),
            local: s.local.name.to_string(),
        },
        ImportDeclarationSpecifier::ImportDefaultSpecifier(s) => {
            Binding::Default(s.local.name.to_string())
        }
        ImportDeclarationSpecifier::ImportNamespaceSpecifier(s) => {
            Binding::Namespace(s.local.name.to_string())
        }
    }
}

fn export_named(parsed: &mut ParsedModule, decl: &ExportNamedDeclaration<'_>) {
    // `export const a = 1, { b } = o;` keeps the declaration and exports
    // every bound name.
    if let Some(declaration) = &decl.declaration {
        let mut names = Vec::new();
        declaration.bound_names(&mut |ident: &BindingIdentifier<'_>| {
            names.push(ident.name.to_string());
        });
        parsed.exports.extend(names.into_iter().map(|name| ExportItem::Local {
            exported: name.clone(),
            local: name,
        }));
        parsed.edits.push(replace(decl.span.start, declaration.span().start, ""));
        return;
    }

    match &decl.source {
        Some(source) => {
            let specifier = source.value.to_string();
            parsed.add_specifier(&specifier);
            for s in decl.specifiers.iter() {
                parsed.exports.push(ExportItem::From {
                    exported: s.exported.name().to_string(),
                    specifier: specifier.clone(),
                    imported: Some(s.local.name().to_string()),
                });
            }
        }
        None => {
            for s in decl.specifiers.iter() {
                parsed.exports.push(ExportItem::Local {
                    exported: s.exported.name().to_string(),
                    local: s.local.name().to_string(),
                });
            }
        }
    }
    strip(parsed, decl.span);
}

fn export_default(parsed: &mut ParsedModule, decl: &ExportDefaultDeclaration<'_>) {
    let body = &decl.declaration;
    let declared = match body {
        ExportDefaultDeclarationKind::FunctionDeclaration(f) => {
            Some(f.id.as_ref().map(|id| id.name.to_string()))
        }
        ExportDefaultDeclarationKind::ClassDeclaration(c) => {
            Some(c.id.as_ref().map(|id| id.name.to_string()))
        }
        _ => None,
    };
    let body_start = body.span().start;

    match declared {
        Some(Some(name)) => {
            parsed.edits.push(replace(decl.span.start, body_start, ""));
            parsed.exports.push(ExportItem::Local {
                exported: "default".to_string(),
                local: name,
            });
        }
        // Anonymous declarations become expressions and need a terminator.
        Some(None) => {
            parsed
                .edits
                .push(replace(decl.span.start, body_start, "exports.default = "));
            parsed.edits.push(replace(decl.span.end, decl.span.end, ";"));
        }
        None => {
            parsed
                .edits
                .push(replace(decl.span.start, body_start, "exports.default = "));
        }
    }
}

fn replace(start: u32, end: u32, text: &str) -> Edit {
    Edit {
        start: start as usize,
        end: end as usize,
        kind: EditKind::Text(text.to_string()),
    }
}

/// Delete the statement at `span` from the output.
fn strip(parsed: &mut ParsedModule, span: Span) {
    parsed.edits.push(replace(span.start, span.end, ""));
}
