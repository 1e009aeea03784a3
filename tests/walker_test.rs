use filegen::codegen::Op;
use filegen::error::Error;
use filegen::syntax::parse;
use filegen::walker::{Fragment, Walker};

fn walk(source: &str) -> Fragment {
    Walker::new().walk(&parse(source).unwrap()).unwrap()
}

fn render(source: &str) -> String {
    walk(source).into_block().unwrap().render(0)
}

#[test]
fn test_text_and_expression() {
    assert_eq!(
        render("Hello ${name}!\n"),
        "wf.write('Hello ')\nwf.write(str(ask('name')))\nwf.write('!\\n')\n"
    );
}

#[test]
fn test_control_line_nesting() {
    let fragment = walk("% if x:\nyes\n% else:\nno\n% endif\nafter\n");
    assert_eq!(fragment.bottom.depth(), 0);
    assert_eq!(
        fragment.bottom.render(0),
        "if x:\n    wf.write('yes\\n')\nelse:\n    wf.write('no\\n')\nwf.write('after\\n')\n"
    );
}

#[test]
fn test_control_line_emits_indent_ops() {
    let fragment = walk("% for i in items:\n${i}\n% endfor\n");
    assert_eq!(
        fragment.bottom.ops(),
        [
            Op::Line("for i in items:".to_string()),
            Op::Indent,
            Op::Line("wf.write(str(i))".to_string()),
            Op::Line("wf.write('\\n')".to_string()),
            Op::Dedent,
        ]
    );
}

#[test]
fn test_definitions_precede_body() {
    let source = "before<%def name=\"header()\">H</%def>after<%self:header/>";
    assert_eq!(
        render(source),
        "@contextmanager\ndef header():\n    wf.write('H')\n\n\
         wf.write('before')\nwf.write('after')\nwith header():\n    pass\n"
    );
}

#[test]
fn test_definition_with_decorator_and_params() {
    let fragment = walk(r#"<%def name="row(item, css='x')" decorator="cached">${item}:${other}</%def>"#);
    assert!(fragment.bottom.is_empty());
    assert_eq!(
        fragment.top.render(0),
        "@cached\n@contextmanager\ndef row(item, css='x'):\n    wf.write(str(item))\n    \
         wf.write(':')\n    wf.write(str(ask('other')))\n\n"
    );
}

#[test]
fn test_caller_body_yields() {
    let source = "<%def name=\"wrap()\"><b>${caller.body()}</b></%def><%self:wrap>x</%self:wrap>";
    assert_eq!(
        render(source),
        "@contextmanager\ndef wrap():\n    wf.write('<b>')\n    yield\n    wf.write('</b>')\n\n\
         with wrap():\n    wf.write('x')\n"
    );
}

#[test]
fn test_splice_keeps_expression_text_literal() {
    assert_eq!(
        render("${two + three}"),
        "wf.write(str(ask('two')) + ' + ' + str(ask('three')))\n"
    );
    assert_eq!(
        render("${name.upper()}"),
        "wf.write(str(ask('name')) + '.upper()')\n"
    );
    // Attribute names and keyword names are not replaced.
    assert_eq!(
        render("${f(x, name=y).name}"),
        "wf.write(str(ask('f')) + '(' + str(ask('x')) + ', name=' + str(ask('y')) + ').name')\n"
    );
}

#[test]
fn test_code_block_dedented() {
    assert_eq!(
        render("<%\n    x = 1\n    if x:\n        y = 2\n%>"),
        "x = 1\nif x:\n    y = 2\n"
    );
}

#[test]
fn test_code_block_with_unicode_leading_space() {
    assert_eq!(
        render("<%\n x = 1\n\u{3000}y = 2\n%>"),
        " x = 1\n\u{3000}y = 2\n"
    );
    assert_eq!(render("<%\n\tx = 1\n\ty = 2\n%>"), "x = 1\ny = 2\n");
}

#[test]
fn test_expression_filters_are_not_prompted() {
    assert_eq!(render("${name | h}"), "wf.write(str(ask('name')))\n");
}

#[test]
fn test_comment_lines_are_written() {
    assert_eq!(render("## note\n"), "wf.write('# note\\n')\n");
    assert_eq!(
        render("<%doc>\nfirst\nsecond\n</%doc>"),
        "wf.write('# first\\n')\nwf.write('# second\\n')\n"
    );
}

#[test]
fn test_foreign_namespace_call() {
    assert_eq!(render("<%lib:card/>"), "with lib.card():\n    pass\n");
}

#[test]
fn test_custom_writer_name() {
    let template = parse("x").unwrap();
    let fragment = Walker::with_writer("out").walk(&template).unwrap();
    assert_eq!(fragment.bottom.render(0), "out.write('x')\n");
}

#[test]
fn test_unbalanced_control_lines() {
    let err = Walker::new().walk(&parse("% endif\n").unwrap()).unwrap_err();
    assert!(matches!(err, Error::UnbalancedBlockError(_)));

    let err = Walker::new().walk(&parse("% if x:\nopen\n").unwrap()).unwrap_err();
    assert!(matches!(err, Error::UnbalancedBlockError(_)));
}

#[test]
fn test_empty_template() {
    let fragment = walk("");
    assert!(fragment.top.is_empty());
    assert!(fragment.bottom.is_empty());
}
