//! Translation of parsed templates into generator statements.
//!
//! Reusable definitions go to the `top` buffer and everything else to `bottom`,
//! so that definitions always precede the statements that use them.

use log::debug;

use crate::codegen::{concat, py_string, Block, Piece};
use crate::constants::{ASK_FUNCTION, CALLER_BODY, WRITER_NAME};
use crate::error::{Error, Result};
use rustpython_parser::ast;

use crate::syntax::expr;
use crate::syntax::template::{CallNamespaceTag, ControlLine, DefTag};
use crate::syntax::{Node, PythonCode, Template};

/// Buffer receiving emitted statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Top,
    Bottom,
}

/// Where the node being walked sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scope {
    pub target: Target,
    /// True while walking the code of a `${...}` expression.
    pub in_expression: bool,
}

impl Default for Scope {
    fn default() -> Self {
        Self {
            target: Target::Bottom,
            in_expression: false,
        }
    }
}

/// Statements produced for one template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    pub top: Block,
    pub bottom: Block,
}

impl Fragment {
    /// Top followed by bottom.
    pub fn into_block(self) -> Result<Block> {
        let mut block = self.top;
        block.append(&self.bottom)?;
        Ok(block)
    }
}

/// Walks a template and emits statements writing its output to the file handle.
#[derive(Debug)]
pub struct Walker {
    writer: String,
    fragment: Fragment,
    /// Names bound by enclosing definitions and loops; read directly, never prompted for.
    bound: Vec<Vec<String>>,
}

impl Default for Walker {
    fn default() -> Self {
        Self::new()
    }
}

impl Walker {
    pub fn new() -> Self {
        Self::with_writer(WRITER_NAME)
    }

    /// Uses `writer` as the name of the file handle written to.
    pub fn with_writer(writer: &str) -> Self {
        Self {
            writer: writer.to_string(),
            fragment: Fragment::default(),
            bound: Vec::new(),
        }
    }

    /// Translates `template`, consuming the walker.
    ///
    /// # Errors
    /// * `Error::UnbalancedBlockError` if control lines do not pair up
    /// * `Error::ExpressionError` if a control line or definition signature is malformed
    pub fn walk(mut self, template: &Template) -> Result<Fragment> {
        for node in &template.nodes {
            self.walk_node(node, Scope::default())?;
        }
        self.fragment.top.finish()?;
        self.fragment.bottom.finish()?;
        debug!(
            "Walked {} nodes into {} top and {} bottom ops",
            template.nodes.len(),
            self.fragment.top.ops().len(),
            self.fragment.bottom.ops().len()
        );
        Ok(self.fragment)
    }

    fn block(&mut self, scope: Scope) -> &mut Block {
        match scope.target {
            Target::Top => &mut self.fragment.top,
            Target::Bottom => &mut self.fragment.bottom,
        }
    }

    fn write_call(&self, argument: &str) -> String {
        format!("{}.write({argument})", self.writer)
    }

    fn walk_node(&mut self, node: &Node, scope: Scope) -> Result<()> {
        match node {
            Node::Text(text) => {
                if !text.content.is_empty() {
                    let stmt = self.write_call(&py_string(&text.content));
                    self.block(scope).line(stmt);
                }
                Ok(())
            }
            Node::Expression(expression) => self.walk_code(
                &expression.code,
                Scope {
                    in_expression: true,
                    ..scope
                },
            ),
            Node::Code(code) => self.walk_code(code, scope),
            Node::ControlLine(line) => self.walk_control_line(line, scope),
            Node::DefTag(tag) => self.walk_def(tag),
            Node::Comment(comment) => {
                for line in comment.text.split('\n') {
                    let stmt = self.write_call(&py_string(&format!("# {line}\n")));
                    self.block(scope).line(stmt);
                }
                Ok(())
            }
            Node::CallNamespaceTag(tag) => self.walk_namespace_call(tag, scope),
        }
    }

    fn walk_code(&mut self, code: &PythonCode, scope: Scope) -> Result<()> {
        if scope.in_expression {
            let stmt = if code.source.trim() == CALLER_BODY {
                "yield".to_string()
            } else {
                self.write_call(&concat(&self.splice(code)))
            };
            self.block(scope).line(stmt);
            return Ok(());
        }

        for line in dedent_code(&code.source) {
            self.block(scope).line(line);
        }
        Ok(())
    }

    /// Splits expression source into literal text and prompts for its undeclared names.
    fn splice(&self, code: &PythonCode) -> Vec<Piece> {
        let source = code.source.as_str();
        let mut pieces = Vec::new();
        let mut last = 0;
        for reference in &code.references {
            let name = reference.name.as_str();
            let value = if self.is_bound(name) {
                format!("str({name})")
            } else {
                format!("str({ASK_FUNCTION}({}))", py_string(name))
            };
            pieces.push(Piece::Literal(source[last..reference.span.start].to_string()));
            pieces.push(Piece::Expr(value));
            last = reference.span.end;
        }
        pieces.push(Piece::Literal(source[last..].to_string()));
        pieces
    }

    fn is_bound(&self, name: &str) -> bool {
        self.bound.iter().any(|frame| frame.iter().any(|n| n == name))
    }

    fn walk_control_line(&mut self, line: &ControlLine, scope: Scope) -> Result<()> {
        if line.is_end {
            self.block(scope).dedent()?;
            self.bound.pop();
        } else if !line.is_primary {
            let block = self.block(scope);
            block.dedent()?;
            block.line(line.text.clone());
            block.indent();
        } else {
            let frame = loop_targets(line)?;
            let block = self.block(scope);
            block.line(line.text.clone());
            block.indent();
            self.bound.push(frame);
        }
        Ok(())
    }

    fn walk_def(&mut self, tag: &DefTag) -> Result<()> {
        let scope = Scope {
            target: Target::Top,
            in_expression: false,
        };
        let signature = if tag.name.contains('(') {
            tag.name.clone()
        } else {
            format!("{}()", tag.name)
        };
        let params = def_params(&signature)?;

        let block = self.block(scope);
        if let Some(decorator) = &tag.decorator {
            block.line(format!("@{decorator}"));
        }
        block.line("@contextmanager");
        block.line(format!("def {signature}:"));
        block.indent();
        let depth = block.depth();

        self.bound.push(params);
        for node in &tag.nodes {
            self.walk_node(node, scope)?;
        }
        self.bound.pop();

        let block = self.block(scope);
        if block.depth() != depth {
            return Err(Error::UnbalancedBlockError(format!(
                "control block left open in definition '{}'",
                tag.name
            )));
        }
        block.dedent()?;
        block.blank();
        Ok(())
    }

    fn walk_namespace_call(&mut self, tag: &CallNamespaceTag, scope: Scope) -> Result<()> {
        let callee = match tag.namespace.as_str() {
            "self" => tag.defname.clone(),
            namespace => format!("{namespace}.{}", tag.defname),
        };
        let block = self.block(scope);
        block.line(format!("with {callee}():"));
        block.indent();
        for node in &tag.nodes {
            self.walk_node(node, scope)?;
        }
        self.block(scope).dedent()
    }
}

fn indentation(line: &str) -> &str {
    let width = line.len() - line.trim_start_matches(|c: char| c == ' ' || c == '\t').len();
    &line[..width]
}

/// Strips the common indentation of a code block and its blank edge lines.
///
/// Only spaces and tabs count as indentation.
fn dedent_code(source: &str) -> Vec<String> {
    let lines: Vec<&str> = source.lines().collect();
    let start = lines.iter().position(|l| !l.trim().is_empty());
    let end = lines.iter().rposition(|l| !l.trim().is_empty());
    let (Some(start), Some(end)) = (start, end) else {
        return Vec::new();
    };
    let lines = &lines[start..=end];
    let margin = lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| indentation(l))
        .reduce(|common, indent| {
            let shared = common
                .bytes()
                .zip(indent.bytes())
                .take_while(|(a, b)| a == b)
                .count();
            &common[..shared]
        })
        .unwrap_or("");
    lines
        .iter()
        .map(|l| {
            if l.trim().is_empty() {
                String::new()
            } else {
                l.strip_prefix(margin).unwrap_or(l).trim_end().to_string()
            }
        })
        .collect()
}

/// Names bound by a `for` control line.
fn loop_targets(line: &ControlLine) -> Result<Vec<String>> {
    if line.keyword != "for" {
        return Ok(Vec::new());
    }
    let header = line.text.trim_end().trim_end_matches(':');
    let suite = expr::parse_suite(&format!("{header}:\n    pass\n"))?;
    match suite.first() {
        Some(ast::Stmt::For(for_loop)) => Ok(expr::target_names(&for_loop.target)),
        _ => Err(Error::ExpressionError {
            source_text: line.text.clone(),
            message: "expected a for loop".to_string(),
        }),
    }
}

/// Parameter names of a definition signature such as `row(item, css='x')`.
fn def_params(signature: &str) -> Result<Vec<String>> {
    let suite = expr::parse_suite(&format!("def {signature}:\n    pass\n"))?;
    match suite.first() {
        Some(ast::Stmt::FunctionDef(def)) if suite.len() == 1 => {
            Ok(expr::parameter_names(&def.args))
        }
        _ => Err(Error::ExpressionError {
            source_text: signature.to_string(),
            message: "definition name must be a call signature".to_string(),
        }),
    }
}
