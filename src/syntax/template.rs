//! Mako-style template syntax.
//!
//! Supported constructs:
//! - `${ expr }` expressions
//! - `<% code %>` and `<%! code %>` blocks
//! - `% if x:` / `% else:` / `% endif` control lines (`%%` escapes a literal `%`)
//! - `## comment` lines and `<%doc>...</%doc>` blocks
//! - `<%def name="f()" decorator="d">...</%def>` definitions
//! - `<%ns:name attr="v">...</%ns:name>` namespace calls (`self:` for local defs)

use indexmap::{IndexMap, IndexSet};
use regex::{Captures, Regex};

use super::expr;
use crate::error::{Error, Result};

const BLOCK_OPENERS: [&str; 5] = ["if", "for", "while", "try", "with"];
const BLOCK_CONTINUATIONS: [&str; 4] = ["else", "elif", "except", "finally"];

const OPEN_TAG_PATTERN: &str =
    r#"^<%(\w+)(?::([\w.-]+))?((?:\s+[\w-]+\s*=\s*(?:"[^"]*"|'[^']*'))*)\s*(/)?>"#;
const CLOSE_TAG_PATTERN: &str = r"^</%(\w+)(?::([\w.-]+))?\s*>";
const ATTRIBUTE_PATTERN: &str = r#"([\w-]+)\s*=\s*(?:"([^"]*)"|'([^']*)')"#;

/// Python source embedded in a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PythonCode {
    pub source: String,
    /// Names the code reads without binding them itself.
    pub undeclared: IndexSet<String>,
    /// Every read of an undeclared name, in source order.
    pub references: Vec<expr::Reference>,
}

impl PythonCode {
    /// Wraps the source of an expression and computes its undeclared identifiers.
    ///
    /// # Errors
    /// * `Error::ExpressionError` if `source` is not a valid expression
    pub fn expression(source: &str) -> Result<Self> {
        let parsed = expr::parse(source)?;
        Ok(Self {
            source: source.to_string(),
            undeclared: expr::free_names(&parsed),
            references: expr::references(source, &parsed),
        })
    }

    /// Wraps a block of statements; statements are not analyzed.
    pub fn block(source: &str) -> Self {
        Self {
            source: source.to_string(),
            undeclared: IndexSet::new(),
            references: Vec::new(),
        }
    }
}

/// Literal template text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Text {
    pub content: String,
}

/// `${ code | filters }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expression {
    pub code: PythonCode,
    /// Filter names after the top-level `|`, e.g. `h` and `trim` in `${x | h, trim}`.
    pub filters: Vec<String>,
}

/// A `%` line opening, continuing or closing a Python block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlLine {
    pub keyword: String,
    /// The line without its leading `%`, trimmed.
    pub text: String,
    /// False for `else`, `elif`, `except` and `finally`.
    pub is_primary: bool,
    /// True for `end*` lines.
    pub is_end: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefTag {
    /// Declared signature, e.g. `header(title)`.
    pub name: String,
    pub decorator: Option<String>,
    pub nodes: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallNamespaceTag {
    pub namespace: String,
    pub defname: String,
    pub attributes: IndexMap<String, String>,
    pub nodes: Vec<Node>,
}

impl CallNamespaceTag {
    /// The tag keyword as written, e.g. `self:header`.
    pub fn keyword(&self) -> String {
        format!("{}:{}", self.namespace, self.defname)
    }
}

/// A node of a parsed template. The set of kinds is closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Text(Text),
    Expression(Expression),
    Code(PythonCode),
    ControlLine(ControlLine),
    DefTag(DefTag),
    Comment(Comment),
    CallNamespaceTag(CallNamespaceTag),
}

impl Node {
    /// Child nodes of tags; leaves have none.
    pub fn children(&self) -> &[Node] {
        match self {
            Node::DefTag(tag) => &tag.nodes,
            Node::CallNamespaceTag(tag) => &tag.nodes,
            Node::Text(_)
            | Node::Expression(_)
            | Node::Code(_)
            | Node::ControlLine(_)
            | Node::Comment(_) => &[],
        }
    }
}

/// Root of a parsed template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Template {
    pub nodes: Vec<Node>,
}

/// Parses template source into a [`Template`].
///
/// # Errors
/// * `Error::TemplateError` with the 1-based line of the offending construct
pub fn parse(text: &str) -> Result<Template> {
    Lexer::new(text)?.run()
}

enum OpenTag {
    Def {
        name: String,
        decorator: Option<String>,
    },
    Namespace {
        namespace: String,
        defname: String,
        attributes: IndexMap<String, String>,
    },
}

impl OpenTag {
    fn label(&self) -> String {
        match self {
            OpenTag::Def { .. } => "def".to_string(),
            OpenTag::Namespace {
                namespace, defname, ..
            } => format!("{namespace}:{defname}"),
        }
    }

    fn into_node(self, nodes: Vec<Node>) -> Node {
        match self {
            OpenTag::Def { name, decorator } => Node::DefTag(DefTag {
                name,
                decorator,
                nodes,
            }),
            OpenTag::Namespace {
                namespace,
                defname,
                attributes,
            } => Node::CallNamespaceTag(CallNamespaceTag {
                namespace,
                defname,
                attributes,
                nodes,
            }),
        }
    }
}

struct Frame {
    tag: OpenTag,
    nodes: Vec<Node>,
    line: usize,
}

struct Lexer<'a> {
    text: &'a str,
    pos: usize,
    pending_text: String,
    stack: Vec<Frame>,
    root: Vec<Node>,
    open_tag: Regex,
    close_tag: Regex,
    attribute: Regex,
}

fn compile(pattern: &str) -> Result<Regex> {
    Ok(Regex::new(pattern)?)
}

fn find_expression_end(text: &str, start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut chars = text[start..].char_indices();
    while let Some((i, c)) = chars.next() {
        match (quote, c) {
            (Some(_), '\\') => {
                chars.next();
            }
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '{') => depth += 1,
            (None, '}') if depth == 0 => return Some(start + i),
            (None, '}') => depth -= 1,
            _ => {}
        }
    }
    None
}

/// Splits `code | f1, f2` at the first `|` outside brackets and string literals.
fn split_filters(source: &str) -> (&str, Vec<String>) {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut chars = source.char_indices();
    while let Some((i, c)) = chars.next() {
        match (quote, c) {
            (Some(_), '\\') => {
                chars.next();
            }
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '(' | '[' | '{') => depth += 1,
            (None, ')' | ']' | '}') => depth = depth.saturating_sub(1),
            (None, '|') if depth == 0 => {
                let filters = source[i + 1..]
                    .split(',')
                    .map(str::trim)
                    .filter(|f| !f.is_empty())
                    .map(str::to_string)
                    .collect();
                return (source[..i].trim_end(), filters);
            }
            _ => {}
        }
    }
    (source, Vec::new())
}

fn is_control_keyword(keyword: &str) -> bool {
    BLOCK_OPENERS.contains(&keyword)
        || BLOCK_CONTINUATIONS.contains(&keyword)
        || keyword
            .strip_prefix("end")
            .is_some_and(|opener| BLOCK_OPENERS.contains(&opener))
}

impl<'a> Lexer<'a> {
    fn new(text: &'a str) -> Result<Self> {
        Ok(Self {
            text,
            pos: 0,
            pending_text: String::new(),
            stack: Vec::new(),
            root: Vec::new(),
            open_tag: compile(OPEN_TAG_PATTERN)?,
            close_tag: compile(CLOSE_TAG_PATTERN)?,
            attribute: compile(ATTRIBUTE_PATTERN)?,
        })
    }

    fn line_at(&self, pos: usize) -> usize {
        self.text[..pos].matches('\n').count() + 1
    }

    fn error(&self, pos: usize, message: impl Into<String>) -> Error {
        Error::TemplateError {
            line: self.line_at(pos),
            message: message.into(),
        }
    }

    fn flush_text(&mut self) {
        if !self.pending_text.is_empty() {
            let content = std::mem::take(&mut self.pending_text);
            self.current_nodes().push(Node::Text(Text { content }));
        }
    }

    fn current_nodes(&mut self) -> &mut Vec<Node> {
        match self.stack.last_mut() {
            Some(frame) => &mut frame.nodes,
            None => &mut self.root,
        }
    }

    fn append(&mut self, node: Node) {
        self.flush_text();
        self.current_nodes().push(node);
    }

    fn end_of_line(&self) -> (usize, usize) {
        match self.text[self.pos..].find('\n') {
            Some(i) => (self.pos + i, self.pos + i + 1),
            None => (self.text.len(), self.text.len()),
        }
    }

    fn run(mut self) -> Result<Template> {
        while self.pos < self.text.len() {
            let at_line_start = self.pos == 0 || self.text[..self.pos].ends_with('\n');
            if at_line_start && self.match_line()? {
                continue;
            }

            let text = self.text;
            let rest = &text[self.pos..];
            if rest.starts_with("${") {
                self.match_expression()?;
            } else if rest.starts_with("<%doc>") {
                self.match_doc()?;
            } else if rest.starts_with("</%") {
                self.match_close_tag()?;
            } else if rest.starts_with("<%") {
                self.match_tag_or_code()?;
            } else if let Some(c) = rest.chars().next() {
                self.pending_text.push(c);
                self.pos += c.len_utf8();
            }
        }

        self.flush_text();
        if let Some(frame) = self.stack.last() {
            return Err(Error::TemplateError {
                line: frame.line,
                message: format!("unclosed tag <%{}>", frame.tag.label()),
            });
        }
        Ok(Template { nodes: self.root })
    }

    /// Handles line-oriented syntax; returns false when the line is ordinary content.
    fn match_line(&mut self) -> Result<bool> {
        let text = self.text;
        let (line_end, next_line) = self.end_of_line();
        let line = &text[self.pos..line_end];
        let trimmed = line.trim_start();
        let indent = line.len() - trimmed.len();

        if let Some(comment) = trimmed.strip_prefix("##") {
            self.append(Node::Comment(Comment {
                text: comment.trim().to_string(),
            }));
            self.pos = next_line;
            return Ok(true);
        }

        if trimmed.starts_with("%%") {
            self.pending_text.push_str(&line[..indent]);
            self.pending_text.push('%');
            self.pos += indent + 2;
            return Ok(true);
        }

        let Some(body) = trimmed.strip_prefix('%') else {
            return Ok(false);
        };
        let body = body.trim();
        let keyword: String = body
            .chars()
            .take_while(|c| c.is_alphanumeric() || *c == '_')
            .collect();
        if !is_control_keyword(&keyword) {
            return Err(self.error(self.pos, format!("invalid control line '% {body}'")));
        }

        let is_end = keyword.starts_with("end");
        let is_primary = !BLOCK_CONTINUATIONS.contains(&keyword.as_str());
        self.append(Node::ControlLine(ControlLine {
            text: body.to_string(),
            keyword,
            is_primary,
            is_end,
        }));
        self.pos = next_line;
        Ok(true)
    }

    fn match_expression(&mut self) -> Result<()> {
        let start = self.pos + 2;
        let Some(end) = find_expression_end(self.text, start) else {
            return Err(self.error(self.pos, "unterminated expression '${'"));
        };
        let text = self.text;
        let (source, filters) = split_filters(text[start..end].trim());
        if source.is_empty() {
            return Err(self.error(self.pos, "empty expression"));
        }
        let code = PythonCode::expression(source)
            .map_err(|e| self.error(self.pos, format!("invalid expression '{source}': {e}")))?;
        self.append(Node::Expression(Expression { code, filters }));
        self.pos = end + 1;
        Ok(())
    }

    fn match_doc(&mut self) -> Result<()> {
        let start = self.pos + "<%doc>".len();
        let Some(offset) = self.text[start..].find("</%doc>") else {
            return Err(self.error(self.pos, "unclosed tag <%doc>"));
        };
        let text = self.text[start..start + offset].trim_matches('\n').to_string();
        self.append(Node::Comment(Comment { text }));
        self.pos = start + offset + "</%doc>".len();
        Ok(())
    }

    fn attributes(&self, source: &str) -> IndexMap<String, String> {
        self.attribute
            .captures_iter(source)
            .map(|cap| {
                let value = cap.get(2).or_else(|| cap.get(3)).map_or("", |m| m.as_str());
                (cap[1].to_string(), value.to_string())
            })
            .collect()
    }

    fn read_open_tag(&self, cap: &Captures<'_>) -> Result<OpenTag> {
        let name = &cap[1];
        let attributes = self.attributes(cap.get(3).map_or("", |m| m.as_str()));

        if let Some(defname) = cap.get(2) {
            return Ok(OpenTag::Namespace {
                namespace: name.to_string(),
                defname: defname.as_str().to_string(),
                attributes,
            });
        }
        if name != "def" {
            return Err(self.error(self.pos, format!("unsupported tag <%{name}>")));
        }
        let Some(signature) = attributes.get("name") else {
            return Err(self.error(self.pos, "<%def> requires a 'name' attribute"));
        };
        Ok(OpenTag::Def {
            name: signature.clone(),
            decorator: attributes.get("decorator").cloned(),
        })
    }

    fn match_tag_or_code(&mut self) -> Result<()> {
        let text = self.text;
        let rest = &text[self.pos..];
        if let Some(cap) = self.open_tag.captures(rest) {
            let tag = self.read_open_tag(&cap)?;
            let width = cap[0].len();
            let self_closing = cap.get(4).is_some();

            if self_closing {
                self.append(tag.into_node(Vec::new()));
            } else {
                self.flush_text();
                let line = self.line_at(self.pos);
                self.stack.push(Frame {
                    tag,
                    nodes: Vec::new(),
                    line,
                });
            }
            self.pos += width;
            return Ok(());
        }

        let body = &rest[2..];
        if !(body.starts_with('!') || body.starts_with(char::is_whitespace)) {
            return Err(self.error(self.pos, "malformed tag"));
        }
        let start = self.pos + if body.starts_with('!') { 3 } else { 2 };
        let Some(offset) = text[start..].find("%>") else {
            return Err(self.error(self.pos, "unterminated code block '<%'"));
        };
        self.append(Node::Code(PythonCode::block(&text[start..start + offset])));
        self.pos = start + offset + 2;
        Ok(())
    }

    fn match_close_tag(&mut self) -> Result<()> {
        let text = self.text;
        let rest = &text[self.pos..];
        let Some(cap) = self.close_tag.captures(rest) else {
            return Err(self.error(self.pos, "malformed closing tag"));
        };
        let label = match cap.get(2) {
            Some(defname) => format!("{}:{}", &cap[1], defname.as_str()),
            None => cap[1].to_string(),
        };
        let width = cap[0].len();

        self.flush_text();
        let Some(frame) = self.stack.pop() else {
            return Err(self.error(self.pos, format!("unexpected closing tag </%{label}>")));
        };
        if frame.tag.label() != label {
            return Err(self.error(
                self.pos,
                format!(
                    "closing tag </%{label}> does not match <%{}>",
                    frame.tag.label()
                ),
            ));
        }
        self.append(frame.tag.into_node(frame.nodes));
        self.pos += width;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(content: &str) -> Node {
        Node::Text(Text {
            content: content.to_string(),
        })
    }

    #[test]
    fn test_parse_text_and_expressions() {
        let template = parse("Hello ${ name }!\n${two + three * 3}").unwrap();
        assert_eq!(template.nodes.len(), 4);
        assert_eq!(template.nodes[0], text("Hello "));
        let Node::Expression(expr) = &template.nodes[1] else {
            panic!("expected an expression");
        };
        assert_eq!(expr.code.source, "name");
        assert_eq!(template.nodes[2], text("!\n"));
        let Node::Expression(expr) = &template.nodes[3] else {
            panic!("expected an expression");
        };
        let undeclared: Vec<&str> = expr.code.undeclared.iter().map(|s| s.as_str()).collect();
        assert_eq!(undeclared, vec!["two", "three"]);
    }

    #[test]
    fn test_expression_with_nested_braces() {
        let template = parse(r#"${ {"a": "}"}[key] }"#).unwrap();
        let Node::Expression(expr) = &template.nodes[0] else {
            panic!("expected an expression");
        };
        assert_eq!(expr.code.source, r#"{"a": "}"}[key]"#);
    }

    #[test]
    fn test_expression_filters() {
        let template = parse("${name | h, trim}${ {'a': 1 | 2}[key] }${ 'x|y' }").unwrap();
        let expressions: Vec<&Expression> = template
            .nodes
            .iter()
            .filter_map(|n| match n {
                Node::Expression(e) => Some(e),
                _ => None,
            })
            .collect();
        assert_eq!(expressions[0].code.source, "name");
        assert_eq!(expressions[0].filters, vec!["h", "trim"]);
        let undeclared: Vec<&str> =
            expressions[0].code.undeclared.iter().map(|s| s.as_str()).collect();
        assert_eq!(undeclared, vec!["name"]);
        assert_eq!(expressions[1].code.source, "{'a': 1 | 2}[key]");
        assert!(expressions[1].filters.is_empty());
        assert_eq!(expressions[2].code.source, "'x|y'");
        assert!(expressions[2].filters.is_empty());
    }

    #[test]
    fn test_control_lines() {
        let template = parse("% if x:\na\n  % elif y:\nb\n% endif\n").unwrap();
        let lines: Vec<(&str, bool, bool)> = template
            .nodes
            .iter()
            .filter_map(|n| match n {
                Node::ControlLine(c) => Some((c.text.as_str(), c.is_primary, c.is_end)),
                _ => None,
            })
            .collect();
        assert_eq!(
            lines,
            vec![("if x:", true, false), ("elif y:", false, false), ("endif", true, true)]
        );
        assert_eq!(template.nodes[1], text("a\n"));
    }

    #[test]
    fn test_percent_escape() {
        let template = parse("%% done\n").unwrap();
        assert_eq!(template.nodes, vec![text("% done\n")]);
    }

    #[test]
    fn test_def_and_namespace_tags() {
        let source = r#"<%def name="box(title)" decorator="cached">[${caller.body()}]</%def><%self:box title="x">in</%self:box><%self:rule/>"#;
        let template = parse(source).unwrap();
        assert_eq!(template.nodes.len(), 3);

        let Node::DefTag(def) = &template.nodes[0] else {
            panic!("expected a def");
        };
        assert_eq!(def.name, "box(title)");
        assert_eq!(def.decorator.as_deref(), Some("cached"));
        assert_eq!(def.nodes.len(), 3);

        let Node::CallNamespaceTag(call) = &template.nodes[1] else {
            panic!("expected a namespace call");
        };
        assert_eq!(call.keyword(), "self:box");
        assert_eq!(call.attributes.get("title").map(String::as_str), Some("x"));
        assert_eq!(call.nodes, vec![text("in")]);

        assert!(matches!(&template.nodes[2], Node::CallNamespaceTag(t) if t.nodes.is_empty()));
    }

    #[test]
    fn test_comments_and_code() {
        let template = parse("## note\n<%doc>\nlong\n</%doc><% x = 1 %>").unwrap();
        assert_eq!(
            template.nodes,
            vec![
                Node::Comment(Comment {
                    text: "note".to_string()
                }),
                Node::Comment(Comment {
                    text: "long".to_string()
                }),
                Node::Code(PythonCode::block(" x = 1 ")),
            ]
        );
    }

    #[test]
    fn test_errors_report_lines() {
        let cases = [
            ("a\n${ 1 +", 2),
            ("a\nb\n<%def name=\"f()\">", 3),
            ("</%def>", 1),
            ("<%def name=\"f()\"></%self:f>", 1),
            ("x\n% switch y:", 2),
            ("<%include file=\"a\"/>", 1),
            ("<%def>x</%def>", 1),
            ("${ a b }", 1),
        ];
        for (source, expected) in cases {
            match parse(source) {
                Err(Error::TemplateError { line, .. }) => assert_eq!(line, expected, "{source}"),
                other => panic!("expected a template error for {source:?}, got {other:?}"),
            }
        }
    }
}
