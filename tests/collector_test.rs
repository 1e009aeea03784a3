use filegen::collector::{TemplateScanner, VarNameCollector};
use filegen::context::ScanContext;
use filegen::error::Error;
use indexmap::IndexSet;

fn sorted(names: &IndexSet<String>) -> Vec<&str> {
    let mut names: Vec<&str> = names.iter().map(String::as_str).collect();
    names.sort();
    names
}

#[test]
fn test_scan_template_identifiers() {
    let template = r#"
    <% two = 1 + 1%>
    ${two}
    ${two + 2}
    ${two + three * 3}
    ${not one}
    ${four("xxx", five)}
    "#;
    let mut context = ScanContext::new();
    let result = TemplateScanner::new().scan(template, &mut context).unwrap();

    assert_eq!(sorted(result), vec!["five", "one", "three", "two"]);
    assert_eq!(context.expression_sources.len(), 5);
    assert_eq!(context.expression_sources[4], r#"four("xxx", five)"#);
}

#[test]
fn test_rescan_is_idempotent() {
    let template = "${a.b} ${c(d, e=f)}";
    let scanner = TemplateScanner::new();
    let mut context = ScanContext::new();

    let first = scanner.scan(template, &mut context).unwrap().clone();
    let second = scanner.scan(template, &mut context).unwrap().clone();

    assert_eq!(first, second);
    assert_eq!(sorted(&first), vec!["a", "d"]);
    assert_eq!(context.expression_sources.len(), 4);
}

#[test]
fn test_expressions_inside_tags() {
    let template = r#"<%def name="row(item)">${label}</%def><%self:row>${inner}</%self:row>"#;
    let mut context = ScanContext::new();
    let result = TemplateScanner::new().scan(template, &mut context).unwrap();
    assert_eq!(sorted(result), vec!["inner", "label"]);
}

#[test]
fn test_only_five_shapes_contribute() {
    let collector = VarNameCollector::new();
    let cases = [
        ("x", vec!["x"]),
        ("-x", vec!["x"]),
        ("x * y", vec!["x", "y"]),
        ("x.attr.deeper", vec!["x"]),
        ("f(a, *rest, k=v)", vec!["a"]),
        ("a and b", vec![]),
        ("a < b", vec![]),
        ("a[b]", vec![]),
        ("[a, b]", vec![]),
        ("a if b else c", vec![]),
        ("lambda q: q + z", vec![]),
        ("'literal'", vec![]),
    ];
    for (source, expected) in cases {
        let mut names = IndexSet::new();
        collector.collect(source, &mut names).unwrap();
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        assert_eq!(names, expected, "collecting from {source}");
    }
}

#[test]
fn test_filters_are_not_identifiers() {
    let mut context = ScanContext::new();
    let result = TemplateScanner::new()
        .scan("${name | h}\n${ (a | b) | trim }\n", &mut context)
        .unwrap();
    assert_eq!(sorted(result), vec!["a", "b", "name"]);
    assert_eq!(context.expression_sources, vec!["name", "(a | b)"]);
}

#[test]
fn test_collect_all_keeps_first_seen_order() {
    let mut names = IndexSet::new();
    VarNameCollector::new()
        .collect_all(&["b + a", "c", "a"], &mut names)
        .unwrap();
    let names: Vec<&str> = names.iter().map(String::as_str).collect();
    assert_eq!(names, vec!["b", "a", "c"]);
}

#[test]
fn test_invalid_expression() {
    let mut names = IndexSet::new();
    let err = VarNameCollector::new().collect("a +", &mut names).unwrap_err();
    assert!(matches!(err, Error::ExpressionError { .. }));
}

#[test]
fn test_invalid_template() {
    let mut context = ScanContext::new();
    let err = TemplateScanner::new().scan("${ a", &mut context).unwrap_err();
    assert!(matches!(err, Error::TemplateError { line: 1, .. }));
}
