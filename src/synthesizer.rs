//! Synthesis of standalone generator programs from scanned trees.
//!
//! A generated program asks for every collected variable once, then recreates the
//! mirrored tree under the output root given on its command line.

use std::io::Write;
use std::path::{Component, Path};

use indexmap::{IndexMap, IndexSet};
use log::debug;

use crate::codegen::{concat, py_string, python_identifier, Block, Piece};
use crate::config::{get_config, Config};
use crate::constants::{ASK_FUNCTION, TEMPLATE_SUFFIX, WRITER_NAME};
use crate::context::ScanContext;
use crate::error::{Error, Result};
use crate::ignore::parse_ignore_file;
use crate::names::{NamePart, NameScanner};
use crate::renderer::{MiniJinjaRenderer, TemplateRenderer};
use crate::scanner::{Entry, ScanReport, Scanner};
use crate::syntax::{self, expr};
use crate::walker::Walker;

/// Shell of every generated program; `body` is the indented body of `gen`.
const PROGRAM_TEMPLATE: &str = r#"# -*- coding:utf-8 -*-
import logging
import os
import sys
from contextlib import contextmanager

logger = logging.getLogger(__name__)
_answers = {}


def {{ ask }}(name, description=None, default=None):
    if name not in _answers:
        label = description or name
        if default is not None:
            label = '{} [{}]'.format(label, default)
        value = input('{}: '.format(label)).strip()
        if not value and default is not None:
            value = str(default)
        _answers[name] = value
    return _answers[name]


def gen(root):
{{ body }}


def main():
    logging.basicConfig(level=logging.INFO)
    if len(sys.argv) < 2:
        sys.stderr.write('usage: {} ROOT\n'.format(sys.argv[0]))
        sys.exit(2)
    gen(sys.argv[1])


if __name__ == '__main__':
    main()
"#;

/// Assembles the generator program for one scanned tree.
pub struct Synthesizer<'a> {
    config: &'a Config,
    names: NameScanner,
    renderer: Box<dyn TemplateRenderer>,
    /// Variable name to the Python variable it is bound to.
    bindings: IndexMap<String, String>,
}

/// Names the program itself uses at the level of `gen`.
const RESERVED_NAMES: [&str; 10] = [
    "root", "path", WRITER_NAME, ASK_FUNCTION, "gen", "logger", "logging", "os", "sys",
    "contextmanager",
];

fn is_reserved(name: &str) -> bool {
    RESERVED_NAMES.contains(&name) || expr::is_builtin(name)
}

fn bind_all(identifiers: &IndexSet<String>) -> IndexMap<String, String> {
    let mut taken = IndexSet::new();
    let mut bindings = IndexMap::new();
    for name in identifiers {
        let base = python_identifier(name);
        let mut binding = base.clone();
        let mut n = 2;
        while taken.contains(&binding) || is_reserved(&binding) {
            binding = format!("{base}_{n}");
            n += 1;
        }
        taken.insert(binding.clone());
        bindings.insert(name.clone(), binding);
    }
    bindings
}

impl<'a> Synthesizer<'a> {
    pub fn new(context: &ScanContext, config: &'a Config) -> Result<Self> {
        Ok(Self {
            config,
            names: NameScanner::new()?,
            renderer: Box::new(MiniJinjaRenderer::new()),
            bindings: bind_all(&context.identifiers),
        })
    }

    pub fn with_renderer(mut self, renderer: Box<dyn TemplateRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    /// Python variable bound to the value of `name`.
    pub fn binding(&self, name: &str) -> Option<&str> {
        self.bindings.get(name).map(String::as_str)
    }

    /// Writes the program recreating `root` to `out`.
    pub fn emit<W: Write>(&self, root: &Entry, out: &mut W) -> Result<()> {
        let program = self.program(root)?;
        out.write_all(program.as_bytes())?;
        Ok(())
    }

    /// Returns the program recreating `root`.
    ///
    /// # Errors
    /// * `Error::TemplateFileError` if a template of the tree fails to translate
    /// * `Error::MinijinjaError` if the program shell fails to render
    pub fn program(&self, root: &Entry) -> Result<String> {
        let mut body = Block::new();
        for (name, binding) in &self.bindings {
            body.line(format!("{binding} = {}", self.ask_call(name)));
        }
        if !self.bindings.is_empty() {
            body.blank();
        }
        self.emit_entry(root.path(), root, &mut body)?;
        body.finish()?;

        let context = serde_json::json!({
            "ask": ASK_FUNCTION,
            "body": body.render(1).trim_end_matches('\n'),
        });
        self.renderer.render(PROGRAM_TEMPLATE, &context)
    }

    fn ask_call(&self, name: &str) -> String {
        let mut args = vec![py_string(name)];
        if let Some(variable) = self.config.variable(name) {
            if let Some(description) = &variable.description {
                args.push(format!("description={}", py_string(description)));
            }
            if let Some(default) = variable.default_text() {
                args.push(format!("default={}", py_string(&default)));
            }
        }
        format!("{ASK_FUNCTION}({})", args.join(", "))
    }

    /// Python expression for the path of `path` below the output root.
    ///
    /// The scan root itself is `root`; anything below it is
    /// `os.path.join(root, <suffix>)`, with placeholder tokens replaced by their
    /// values and the template suffix removed.
    pub fn path_expression(&self, scan_root: &Path, path: &Path, is_template: bool) -> String {
        let relative = path.strip_prefix(scan_root).unwrap_or(path);
        let components: Vec<String> = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();
        if components.is_empty() {
            return "root".to_string();
        }

        let last = components.len() - 1;
        let mut pieces = Vec::new();
        for (i, component) in components.iter().enumerate() {
            if i > 0 {
                pieces.push(Piece::Literal("/".to_string()));
            }
            let name = match component.strip_suffix(TEMPLATE_SUFFIX) {
                Some(stripped) if is_template && i == last => stripped,
                _ => component.as_str(),
            };
            for part in self.names.split(name) {
                pieces.push(match part {
                    NamePart::Literal(text) => Piece::Literal(text.to_string()),
                    NamePart::Token(token) => match self.binding(token) {
                        Some(binding) => Piece::Expr(format!("str({binding})")),
                        None => Piece::Expr(format!("str({ASK_FUNCTION}({}))", py_string(token))),
                    },
                });
            }
        }
        format!("os.path.join(root, {})", concat(&pieces))
    }

    fn emit_entry(&self, scan_root: &Path, entry: &Entry, body: &mut Block) -> Result<()> {
        match entry {
            Entry::Directory { path, children, .. } => {
                debug!("Emitting directory {}", path.display());
                body.line(format!(
                    "path = {}",
                    self.path_expression(scan_root, path, false)
                ));
                body.line("if not os.path.exists(path):");
                body.indent();
                body.line("logger.info('create directory %s', path)");
                body.line("os.makedirs(path)");
                body.dedent()?;
                for child in children {
                    self.emit_entry(scan_root, child, body)?;
                }
            }
            Entry::File {
                path,
                content,
                is_template,
                ..
            } => {
                debug!("Emitting file {}", path.display());
                body.line(format!(
                    "path = {}",
                    self.path_expression(scan_root, path, *is_template)
                ));
                body.line("logger.info('write file %s', path)");
                body.line(format!(
                    "with open(path, 'w', encoding='utf-8') as {WRITER_NAME}:"
                ));
                body.indent();
                if *is_template {
                    body.append(&self.translate(path, content)?)?;
                } else if !content.is_empty() {
                    body.line(format!("{WRITER_NAME}.write({})", py_string(content)));
                }
                body.dedent()?;
            }
        }
        Ok(())
    }

    fn translate(&self, path: &Path, content: &str) -> Result<Block> {
        let wrap = |e: Error| Error::TemplateFileError {
            path: path.display().to_string(),
            source: Box::new(e),
        };
        let template = syntax::parse(content).map_err(wrap)?;
        Walker::with_writer(WRITER_NAME)
            .walk(&template)
            .and_then(|fragment| fragment.into_block())
            .map_err(wrap)
    }
}

/// Scans `root` and writes the generator program for it to `out`.
///
/// Reads the optional configuration and ignore file of `root` first.
///
/// # Returns
/// * `Result<ScanReport>` - What happened to every scanned path
pub fn generate_program<P: AsRef<Path>, W: Write>(root: P, out: &mut W) -> Result<ScanReport> {
    let root = root.as_ref();
    let config = get_config(root)?;
    let ignore = parse_ignore_file(root)?;

    let mut scanner = Scanner::new()?.with_ignore(ignore);
    scanner.scan(root)?;
    let (context, report) = scanner.into_parts();
    let tree = context.roots.last().ok_or_else(|| Error::ScanRootError {
        root: root.display().to_string(),
    })?;

    Synthesizer::new(&context, &config)?.emit(tree, out)?;
    Ok(report)
}
