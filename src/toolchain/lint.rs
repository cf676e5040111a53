// src/toolchain/lint.rs

//! AST linter with a small fixed rule set.
//!
//! Structural rules walk the `oxc` AST of the source module; whitespace
//! rules run on the raw text.

use std::path::Path;

use oxc_allocator::Allocator;
use oxc_ast::ast::{
    BinaryExpression, CallExpression, DebuggerStatement, Expression, VariableDeclaration,
    VariableDeclarationKind,
};
use oxc_ast_visit::{walk, Visit};
use oxc_span::GetSpan;
use oxc_syntax::operator::BinaryOperator;
use regex::Regex;

use crate::config::ConfigFile;
use crate::errors::Result;
use crate::toolchain::syntax;

/// Every rule the builtin linter knows, in reporting order.
pub const RULE_NAMES: &[&str] = &[
    "eqeqeq",
    "no-debugger",
    "no-eval",
    "no-var",
    "trailing-whitespace",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintFinding {
    pub line: usize,
    pub column: usize,
    pub rule: String,
    pub message: String,
}

impl LintFinding {
    fn new(line: usize, column: usize, rule: &str, message: impl Into<String>) -> Self {
        Self {
            line,
            column,
            rule: rule.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Linter {
    enabled: Vec<&'static str>,
    trailing: Regex,
}

impl Linter {
    /// All rules except those named in `disable`.
    pub fn new(disable: &[String]) -> anyhow::Result<Self> {
        let enabled = RULE_NAMES
            .iter()
            .copied()
            .filter(|rule| !disable.iter().any(|d| d == rule))
            .collect();
        Ok(Self {
            enabled,
            trailing: Regex::new(r"(?m)[ \t]+\r?$")?,
        })
    }

    /// `None` when `[lint] enabled = false`.
    pub fn from_config(cfg: &ConfigFile) -> anyhow::Result<Option<Self>> {
        let lint = cfg.lint();
        if !lint.enabled {
            return Ok(None);
        }
        Self::new(&lint.disable).map(Some)
    }

    pub fn is_enabled(&self, rule: &str) -> bool {
        self.enabled.contains(&rule)
    }

    /// Findings sorted by position. Unparsable input is a syntax error.
    pub fn lint(&self, path: &Path, code: &str) -> Result<Vec<LintFinding>> {
        let allocator = Allocator::default();
        let program = syntax::parse(&allocator, path, code, syntax::module_source())?;

        let mut rules = RuleVisitor {
            linter: self,
            code,
            findings: Vec::new(),
        };
        rules.visit_program(&program);
        let mut findings = rules.findings;

        if self.is_enabled("trailing-whitespace") {
            for m in self.trailing.find_iter(code) {
                let (line, column) = syntax::position(code, m.start());
                findings.push(LintFinding::new(
                    line,
                    column,
                    "trailing-whitespace",
                    "Trailing whitespace.",
                ));
            }
        }

        findings.sort_by(|a, b| (a.line, a.column).cmp(&(b.line, b.column)));
        Ok(findings)
    }
}

struct RuleVisitor<'l> {
    linter: &'l Linter,
    code: &'l str,
    findings: Vec<LintFinding>,
}

impl RuleVisitor<'_> {
    fn report(&mut self, rule: &str, offset: u32, message: impl Into<String>) {
        if self.linter.is_enabled(rule) {
            let (line, column) = syntax::position(self.code, offset as usize);
            self.findings.push(LintFinding::new(line, column, rule, message));
        }
    }
}

impl<'a> Visit<'a> for RuleVisitor<'_> {
    fn visit_binary_expression(&mut self, it: &BinaryExpression<'a>) {
        if matches!(it.operator, BinaryOperator::Equality | BinaryOperator::Inequality) {
            let op = it.operator.as_str();
            // Point at the operator, not the left operand.
            let gap = &self.code[it.left.span().end as usize..it.right.span().start as usize];
            let at = it.left.span().end + gap.find(op).unwrap_or(0) as u32;
            self.report("eqeqeq", at, format!("Expected '{op}=' and instead saw '{op}'."));
        }
        walk::walk_binary_expression(self, it);
    }

    fn visit_debugger_statement(&mut self, it: &DebuggerStatement) {
        self.report("no-debugger", it.span.start, "Unexpected 'debugger' statement.");
    }

    fn visit_call_expression(&mut self, it: &CallExpression<'a>) {
        if let Expression::Identifier(callee) = &it.callee
            && callee.name.as_str() == "eval"
        {
            self.report("no-eval", it.span.start, "eval can be harmful.");
        }
        walk::walk_call_expression(self, it);
    }

    fn visit_variable_declaration(&mut self, it: &VariableDeclaration<'a>) {
        if it.kind == VariableDeclarationKind::Var {
            self.report("no-var", it.span.start, "Unexpected var, use let or const instead.");
        }
        walk::walk_variable_declaration(self, it);
    }
}
