//! Building blocks for emitting Python source.

use cruet::Inflector;

use crate::error::{Error, Result};
use crate::syntax::expr;

const INDENT: &str = "    ";

/// One emission step of a [`Block`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Line(String),
    Indent,
    Dedent,
    Blank,
}

/// An append-only sequence of indented statements.
///
/// The block tracks its open indentation depth so that unbalanced input is
/// reported instead of producing misindented code. A nested block that receives
/// no statement renders as `pass`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Block {
    ops: Vec<Op>,
    depth: usize,
}

impl Block {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line(&mut self, line: impl Into<String>) {
        self.ops.push(Op::Line(line.into()));
    }

    pub fn indent(&mut self) {
        self.ops.push(Op::Indent);
        self.depth += 1;
    }

    /// Closes the innermost open level.
    ///
    /// # Errors
    /// * `Error::UnbalancedBlockError` if no level is open
    pub fn dedent(&mut self) -> Result<()> {
        if self.depth == 0 {
            return Err(Error::UnbalancedBlockError(
                "block closed more often than opened".to_string(),
            ));
        }
        self.ops.push(Op::Dedent);
        self.depth -= 1;
        Ok(())
    }

    pub fn blank(&mut self) {
        self.ops.push(Op::Blank);
    }

    /// Number of levels currently open.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Appends a closed block at the current depth.
    ///
    /// # Errors
    /// * `Error::UnbalancedBlockError` if `other` still has open levels
    pub fn append(&mut self, other: &Block) -> Result<()> {
        other.finish()?;
        self.ops.extend(other.ops.iter().cloned());
        Ok(())
    }

    /// Checks that every opened level has been closed.
    pub fn finish(&self) -> Result<()> {
        match self.depth {
            0 => Ok(()),
            n => Err(Error::UnbalancedBlockError(format!("{n} block(s) left open"))),
        }
    }

    /// Renders the block as source text, starting `base` levels deep.
    ///
    /// Every level, the outermost included, that ends up without a statement
    /// receives a `pass`.
    pub fn render(&self, base: usize) -> String {
        let mut out = String::new();
        // One flag per open level: has it received a statement yet?
        let mut filled = vec![false];
        for op in &self.ops {
            let level = base + filled.len() - 1;
            match op {
                Op::Line(line) => {
                    push_line(&mut out, level, line);
                    if let Some(top) = filled.last_mut() {
                        *top = true;
                    }
                }
                Op::Indent => filled.push(false),
                Op::Dedent => {
                    if filled.len() > 1 && filled.pop() == Some(false) {
                        push_line(&mut out, level, "pass");
                    }
                }
                Op::Blank => out.push('\n'),
            }
        }
        while let Some(was_filled) = filled.pop() {
            if !was_filled {
                push_line(&mut out, base + filled.len(), "pass");
            }
        }
        out
    }
}

fn push_line(out: &mut String, level: usize, line: &str) {
    for _ in 0..level {
        out.push_str(INDENT);
    }
    out.push_str(line);
    out.push('\n');
}

/// Quotes `value` as a single-quoted Python string literal.
pub fn py_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c if c.is_control() && (c as u32) <= 0xffff => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c if c.is_control() => out.push_str(&format!("\\U{:08x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// Part of a string concatenation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Piece {
    /// Text that is quoted on output.
    Literal(String),
    /// Python code evaluating to a string.
    Expr(String),
}

/// Joins pieces with ` + `, merging adjacent literals and dropping empty ones.
///
/// Nothing left yields `''`.
pub fn concat(pieces: &[Piece]) -> String {
    let mut merged: Vec<Piece> = Vec::new();
    for piece in pieces {
        match (merged.last_mut(), piece) {
            (_, Piece::Literal(text)) if text.is_empty() => {}
            (Some(Piece::Literal(prev)), Piece::Literal(text)) => prev.push_str(text),
            (_, piece) => merged.push(piece.clone()),
        }
    }
    if merged.is_empty() {
        return py_string("");
    }
    merged
        .iter()
        .map(|piece| match piece {
            Piece::Literal(text) => py_string(text),
            Piece::Expr(code) => code.clone(),
        })
        .collect::<Vec<_>>()
        .join(" + ")
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_') && !expr::is_keyword(name)
}

/// Turns a placeholder token into a usable Python variable name.
///
/// Valid identifiers are kept as they are; anything else is snake-cased and
/// stripped of remaining invalid characters.
pub fn python_identifier(token: &str) -> String {
    if is_identifier(token) {
        return token.to_string();
    }
    let snake: String = token
        .to_snake_case()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if is_identifier(&snake) {
        snake
    } else {
        format!("_{snake}")
    }
}
