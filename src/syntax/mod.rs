//! Template and expression syntax.
//! Parses Mako-style template source into a closed node tree; embedded Python
//! expressions are parsed with `rustpython-parser`.

pub mod expr;
pub mod template;

pub use template::{parse, Node, PythonCode, Template};
