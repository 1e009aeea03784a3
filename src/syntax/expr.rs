//! Python expression syntax used inside templates.
//!
//! Template expressions (`${ ... }`) are Python expressions parsed with
//! `rustpython-parser`. This module wraps the parser and answers which names an
//! expression reads, and where in its source they appear.

use std::ops::Range;

use indexmap::IndexSet;
use rustpython_parser::{ast, Parse};

use crate::error::{Error, Result};

const SOURCE_PATH: &str = "<template>";

const KEYWORDS: [&str; 35] = [
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
    "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise",
    "return", "try", "while", "with", "yield",
];

const BUILTINS: [&str; 58] = [
    "abs", "all", "any", "ascii", "bin", "bool", "bytearray", "bytes", "callable", "chr",
    "classmethod", "compile", "complex", "dict", "dir", "divmod", "enumerate", "eval",
    "exec", "filter", "float", "format", "frozenset", "getattr", "globals", "hasattr",
    "hash", "hex", "id", "input", "int", "isinstance", "issubclass", "iter", "len",
    "list", "locals", "map", "max", "min", "next", "object", "oct", "open", "ord", "pow",
    "print", "property", "range", "repr", "reversed", "round", "set", "sorted", "str",
    "sum", "tuple", "zip",
];

/// Returns true if `word` is a reserved Python keyword.
pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(&word)
}

/// Returns true if `word` names a Python builtin that never needs to be supplied.
pub fn is_builtin(word: &str) -> bool {
    BUILTINS.contains(&word)
}

/// One read of a free name, with its byte span in the expression source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub name: String,
    pub span: Range<usize>,
}

fn expression_error(source: &str, message: impl ToString) -> Error {
    Error::ExpressionError {
        source_text: source.to_string(),
        message: message.to_string(),
    }
}

/// Parses a single expression; surrounding whitespace is ignored.
///
/// Spans in the returned tree are relative to `source.trim_start()`.
///
/// # Errors
/// * `Error::ExpressionError` if `source` is empty or not an expression
pub fn parse(source: &str) -> Result<ast::Expr> {
    let trimmed = source.trim();
    if trimmed.is_empty() {
        return Err(expression_error(source, "empty expression"));
    }
    ast::Expr::parse(trimmed, SOURCE_PATH).map_err(|e| expression_error(source, e))
}

/// Parses Python statements such as a loop header or a function definition.
pub fn parse_suite(source: &str) -> Result<ast::Suite> {
    ast::Suite::parse(source, SOURCE_PATH).map_err(|e| expression_error(source, e))
}

/// Free name reads of an expression in source order.
///
/// Attribute names and keyword argument names are not reads. Lambda parameters,
/// comprehension targets and walrus targets are bound; builtins are left out.
/// Spans are relative to `source`, the text given to [`parse`].
pub fn references(source: &str, expr: &ast::Expr) -> Vec<Reference> {
    let offset = source.len() - source.trim_start().len();
    let mut found = Vec::new();
    visit(expr, &mut Vec::new(), &mut found);
    for reference in &mut found {
        reference.span = reference.span.start + offset..reference.span.end + offset;
    }
    found.sort_by_key(|r| r.span.start);
    found
}

/// The distinct free names of an expression, in order of first use.
pub fn free_names(expr: &ast::Expr) -> IndexSet<String> {
    let mut found = Vec::new();
    visit(expr, &mut Vec::new(), &mut found);
    found.into_iter().map(|r| r.name).collect()
}

/// Names bound by an assignment target such as `a`, `(a, b)` or `[a, *rest]`.
pub fn target_names(target: &ast::Expr) -> Vec<String> {
    let mut bound = Vec::new();
    bind_target(target, &mut bound);
    bound
}

/// Parameter names of a lambda or function signature.
pub fn parameter_names(arguments: &ast::Arguments) -> Vec<String> {
    let named = arguments
        .posonlyargs
        .iter()
        .chain(&arguments.args)
        .chain(&arguments.kwonlyargs)
        .map(|a| a.def.arg.to_string());
    let variadic = arguments
        .vararg
        .iter()
        .chain(&arguments.kwarg)
        .map(|a| a.arg.to_string());
    named.chain(variadic).collect()
}

fn bind_target(target: &ast::Expr, bound: &mut Vec<String>) {
    match target {
        ast::Expr::Name(name) => bound.push(name.id.to_string()),
        ast::Expr::Tuple(ast::ExprTuple { elts, .. })
        | ast::Expr::List(ast::ExprList { elts, .. }) => {
            elts.iter().for_each(|item| bind_target(item, bound))
        }
        ast::Expr::Starred(starred) => bind_target(&starred.value, bound),
        _ => {}
    }
}

fn visit_generators(
    generators: &[ast::Comprehension],
    bound: &mut Vec<String>,
    found: &mut Vec<Reference>,
) {
    for generator in generators {
        visit(&generator.iter, bound, found);
        bind_target(&generator.target, bound);
        generator.ifs.iter().for_each(|i| visit(i, bound, found));
    }
}

fn visit(expr: &ast::Expr, bound: &mut Vec<String>, found: &mut Vec<Reference>) {
    use ast::Expr;

    match expr {
        Expr::Name(name) => {
            let id = name.id.as_str();
            if !bound.iter().any(|b| b == id) && !is_builtin(id) {
                found.push(Reference {
                    name: id.to_string(),
                    span: usize::from(name.range.start())..usize::from(name.range.end()),
                });
            }
        }
        Expr::Constant(_) => {}
        Expr::BinOp(op) => {
            visit(&op.left, bound, found);
            visit(&op.right, bound, found);
        }
        Expr::UnaryOp(op) => visit(&op.operand, bound, found),
        Expr::BoolOp(op) => op.values.iter().for_each(|v| visit(v, bound, found)),
        Expr::Compare(cmp) => {
            visit(&cmp.left, bound, found);
            cmp.comparators.iter().for_each(|c| visit(c, bound, found));
        }
        Expr::Attribute(attr) => visit(&attr.value, bound, found),
        Expr::Subscript(sub) => {
            visit(&sub.value, bound, found);
            visit(&sub.slice, bound, found);
        }
        Expr::Slice(slice) => {
            for part in [&slice.lower, &slice.upper, &slice.step].into_iter().flatten() {
                visit(part, bound, found);
            }
        }
        Expr::Call(call) => {
            visit(&call.func, bound, found);
            call.args.iter().for_each(|a| visit(a, bound, found));
            call.keywords.iter().for_each(|k| visit(&k.value, bound, found));
        }
        Expr::Starred(starred) => visit(&starred.value, bound, found),
        Expr::IfExp(ifexp) => {
            visit(&ifexp.body, bound, found);
            visit(&ifexp.test, bound, found);
            visit(&ifexp.orelse, bound, found);
        }
        Expr::Lambda(lambda) => {
            let args = &lambda.args;
            for arg in args.posonlyargs.iter().chain(&args.args).chain(&args.kwonlyargs) {
                if let Some(default) = &arg.default {
                    visit(default, bound, found);
                }
            }
            let mark = bound.len();
            bound.extend(parameter_names(args));
            visit(&lambda.body, bound, found);
            bound.truncate(mark);
        }
        Expr::NamedExpr(named) => {
            visit(&named.value, bound, found);
            bind_target(&named.target, bound);
        }
        Expr::Tuple(ast::ExprTuple { elts, .. })
        | Expr::List(ast::ExprList { elts, .. })
        | Expr::Set(ast::ExprSet { elts, .. }) => elts.iter().for_each(|e| visit(e, bound, found)),
        Expr::Dict(dict) => {
            for (key, value) in dict.keys.iter().zip(&dict.values) {
                if let Some(key) = key {
                    visit(key, bound, found);
                }
                visit(value, bound, found);
            }
        }
        Expr::ListComp(ast::ExprListComp {
            elt, generators, ..
        })
        | Expr::SetComp(ast::ExprSetComp {
            elt, generators, ..
        })
        | Expr::GeneratorExp(ast::ExprGeneratorExp {
            elt, generators, ..
        }) => {
            let mark = bound.len();
            visit_generators(generators, bound, found);
            visit(elt, bound, found);
            bound.truncate(mark);
        }
        Expr::DictComp(comp) => {
            let mark = bound.len();
            visit_generators(&comp.generators, bound, found);
            visit(&comp.key, bound, found);
            visit(&comp.value, bound, found);
            bound.truncate(mark);
        }
        Expr::Await(ast::ExprAwait { value, .. })
        | Expr::YieldFrom(ast::ExprYieldFrom { value, .. }) => visit(value, bound, found),
        Expr::Yield(ast::ExprYield { value, .. }) => {
            if let Some(value) = value {
                visit(value, bound, found);
            }
        }
        Expr::FormattedValue(formatted) => {
            visit(&formatted.value, bound, found);
            if let Some(spec) = &formatted.format_spec {
                visit(spec, bound, found);
            }
        }
        Expr::JoinedStr(joined) => joined.values.iter().for_each(|v| visit(v, bound, found)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(src: &str) -> Vec<String> {
        free_names(&parse(src).unwrap()).into_iter().collect()
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse("").is_err());
        assert!(parse("   ").is_err());
        assert!(parse("a +").is_err());
        assert!(parse("f(a").is_err());
        assert!(parse("a b").is_err());
        assert!(matches!(parse("import"), Err(Error::ExpressionError { .. })));
    }

    #[test]
    fn test_free_names_binds_scopes() {
        assert_eq!(names("[x * k for x in xs if x > lo]"), vec!["xs", "lo", "k"]);
        assert_eq!(names("lambda a, b=d: a + b + c"), vec!["d", "c"]);
        assert_eq!(names("(n := size) + n"), vec!["size"]);
        assert_eq!(names("{k: v for k, v in pairs}"), vec!["pairs"]);
    }

    #[test]
    fn test_free_names_skips_attributes_keywords_and_builtins() {
        assert_eq!(names("obj.attr.other"), vec!["obj"]);
        assert_eq!(names("f(x, key=y)"), vec!["f", "x", "y"]);
        assert_eq!(names("str(len(items))"), vec!["items"]);
    }

    #[test]
    fn test_references_carry_source_spans() {
        let source = "  name.upper() + name + x.name";
        let refs = references(source, &parse(source).unwrap());
        let found: Vec<(&str, &str)> = refs
            .iter()
            .map(|r| (r.name.as_str(), &source[r.span.clone()]))
            .collect();
        assert_eq!(found, vec![("name", "name"), ("name", "name"), ("x", "x")]);
        assert_eq!(refs[0].span, 2..6);
    }

    #[test]
    fn test_target_and_parameter_names() {
        let suite = parse_suite("for a, (b, *c) in xs:\n    pass\n").unwrap();
        let ast::Stmt::For(for_loop) = &suite[0] else {
            panic!("expected a for loop");
        };
        assert_eq!(target_names(&for_loop.target), vec!["a", "b", "c"]);

        let suite = parse_suite("def row(item, css='x', *rest, **extra):\n    pass\n").unwrap();
        let ast::Stmt::FunctionDef(def) = &suite[0] else {
            panic!("expected a definition");
        };
        assert_eq!(parameter_names(&def.args), vec!["item", "css", "rest", "extra"]);
    }
}
