//! Free-variable collection for template expressions.
//!
//! The collector answers "which values must a person supply for these expressions?"
//! with a deliberately narrow walk: only names, binary and unary operations,
//! attribute bases and positional call arguments are followed. Callees, attribute
//! names, keyword arguments and every other expression shape contribute nothing.

use indexmap::IndexSet;
use log::debug;
use rustpython_parser::ast::{self, Expr};

use crate::context::ScanContext;
use crate::error::Result;
use crate::syntax::{self, expr, Node};

/// Collects the variable names referenced by expression sources.
#[derive(Debug, Default, Clone, Copy)]
pub struct VarNameCollector;

impl VarNameCollector {
    pub fn new() -> Self {
        Self
    }

    /// Collects from every source in order into `names`.
    pub fn collect_all<S: AsRef<str>>(
        &self,
        sources: &[S],
        names: &mut IndexSet<String>,
    ) -> Result<()> {
        for source in sources {
            self.collect(source.as_ref(), names)?;
        }
        Ok(())
    }

    /// Parses one expression source and adds the names it references to `names`.
    ///
    /// # Errors
    /// * `Error::ExpressionError` if `source` is not a valid expression
    pub fn collect(&self, source: &str, names: &mut IndexSet<String>) -> Result<()> {
        let expr = expr::parse(source)?;
        self.traverse(&expr, names);
        Ok(())
    }

    pub fn traverse(&self, expr: &Expr, names: &mut IndexSet<String>) {
        match expr {
            Expr::Name(ast::ExprName { id, .. }) => {
                names.insert(id.to_string());
            }
            Expr::BinOp(ast::ExprBinOp { left, right, .. }) => {
                self.traverse(left, names);
                self.traverse(right, names);
            }
            Expr::UnaryOp(ast::ExprUnaryOp { operand, .. }) => self.traverse(operand, names),
            Expr::Attribute(ast::ExprAttribute { value, .. }) => self.traverse(value, names),
            Expr::Call(ast::ExprCall { args, .. }) => {
                for arg in args {
                    self.traverse(arg, names);
                }
            }
            _ => {}
        }
    }
}

/// Feeds the expressions of template files into the scan context.
#[derive(Debug, Default, Clone, Copy)]
pub struct TemplateScanner {
    collector: VarNameCollector,
}

fn expression_sources(node: &Node, sources: &mut Vec<String>) {
    if let Node::Expression(expression) = node {
        sources.push(expression.code.source.clone());
    }
    for child in node.children() {
        expression_sources(child, sources);
    }
}

impl TemplateScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scans template source and returns the updated identifier set.
    ///
    /// Every expression source is appended to `expression_sources` in document
    /// order, then its names are merged into `identifiers`.
    ///
    /// # Errors
    /// * `Error::TemplateError` if the template does not parse
    pub fn scan<'c>(
        &self,
        text: &str,
        context: &'c mut ScanContext,
    ) -> Result<&'c IndexSet<String>> {
        let template = syntax::parse(text)?;
        let mut sources = Vec::new();
        for node in &template.nodes {
            expression_sources(node, &mut sources);
        }
        debug!("Found {} expressions", sources.len());

        let mut found = IndexSet::new();
        self.collector.collect_all(&sources, &mut found)?;
        context.identifiers.extend(found);
        context.expression_sources.extend(sources);
        Ok(&context.identifiers)
    }
}
