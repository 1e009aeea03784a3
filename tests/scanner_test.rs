use std::fs;
use std::path::Path;

use filegen::error::Error;
use filegen::ignore::parse_ignore_file;
use filegen::scanner::{is_template_file, Entry, Outcome, Scanner};
use tempfile::TempDir;

fn write(root: &Path, relative: &str, content: &[u8]) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn template_tree() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write(root, "+package+/__init__.py", b"");
    write(root, "+package+/+module+.py.tmpl", b"# ${greeting}, ${name}\n");
    write(root, "README.md", b"plain ${not_scanned}\n");
    temp_dir
}

#[test]
fn test_is_template_file() {
    assert!(is_template_file("main.py.tmpl"));
    assert!(!is_template_file("main.py"));
    assert!(!is_template_file("tmpl"));
}

#[test_log::test]
fn test_scan_collects_identifiers() {
    let temp_dir = template_tree();
    let mut scanner = Scanner::new().unwrap();
    scanner.scan(temp_dir.path()).unwrap();

    let identifiers: Vec<&str> = scanner
        .context()
        .identifiers
        .iter()
        .map(String::as_str)
        .collect();
    assert_eq!(identifiers, vec!["package", "module", "greeting", "name"]);
    assert_eq!(scanner.context().tokens_of("+module+.py.tmpl"), ["module"]);
    assert!(scanner.context().tokens_of("README.md").is_empty());
    assert_eq!(scanner.context().expression_sources, vec!["greeting", "name"]);
}

#[test]
fn test_scan_builds_mirror_tree() {
    let temp_dir = template_tree();
    let root = temp_dir.path();
    let mut scanner = Scanner::new().unwrap();
    let tree = scanner.scan(root).unwrap().clone();

    assert_eq!(tree.path(), root);
    let names: Vec<&str> = tree.children().iter().map(Entry::name).collect();
    assert_eq!(names, vec!["+package+", "README.md"]);

    let package = &tree.children()[0];
    let names: Vec<&str> = package.children().iter().map(Entry::name).collect();
    assert_eq!(names, vec!["+module+.py.tmpl", "__init__.py"]);
    match &package.children()[0] {
        Entry::File {
            content,
            is_template,
            ..
        } => {
            assert!(is_template);
            assert_eq!(content, "# ${greeting}, ${name}\n");
        }
        other => panic!("expected a file, got {other:?}"),
    }

    assert_eq!(scanner.context().roots.len(), 1);
    let report = scanner.report();
    assert_eq!(report.outcome_of(root), Some(&Outcome::Directory));
    assert_eq!(
        report.outcome_of(&root.join("+package+/+module+.py.tmpl")),
        Some(&Outcome::Template)
    );
    assert_eq!(report.outcome_of(&root.join("README.md")), Some(&Outcome::Plain));
}

#[test_log::test]
fn test_unreadable_file_is_skipped() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write(root, "binary.dat", &[0xff, 0xfe, 0x00, 0x81]);
    write(root, "ok.txt", b"ok");

    let mut scanner = Scanner::new().unwrap();
    let tree = scanner.scan(root).unwrap();
    let names: Vec<&str> = tree.children().iter().map(Entry::name).collect();
    assert_eq!(names, vec!["ok.txt"]);

    let skipped: Vec<&Path> = scanner.report().skipped().map(|(path, _)| path).collect();
    assert_eq!(skipped, vec![root.join("binary.dat").as_path()]);
}

#[test]
fn test_ignore_patterns() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write(root, ".filegenignore", b"*.pyc\n# comment\n\nbuild\n");
    write(root, "filegen.json", b"{}");
    write(root, "keep.py", b"");
    write(root, "drop.pyc", b"");
    write(root, "build/+x+.txt", b"");

    let ignore = parse_ignore_file(root).unwrap();
    let mut scanner = Scanner::new().unwrap().with_ignore(ignore);
    let tree = scanner.scan(root).unwrap();

    let names: Vec<&str> = tree.children().iter().map(Entry::name).collect();
    assert_eq!(names, vec!["keep.py"]);
    assert!(scanner.context().identifiers.is_empty());
    let report = scanner.report();
    assert_eq!(report.outcome_of(&root.join("drop.pyc")), Some(&Outcome::Ignored));
    assert_eq!(report.outcome_of(&root.join("build")), Some(&Outcome::Ignored));
    assert_eq!(report.outcome_of(&root.join("filegen.json")), Some(&Outcome::Ignored));
}

#[test]
fn test_root_name_is_not_tokenized() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("+project+");
    write(&root, "a.txt", b"");

    let mut scanner = Scanner::new().unwrap();
    scanner.scan(&root).unwrap();
    assert!(scanner.context().identifiers.is_empty());
}

#[test_log::test]
fn test_invalid_template_is_skipped() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write(root, "bad.txt.tmpl", b"line\n${ oops\n");
    write(root, "good.txt.tmpl", b"${x}\n");
    write(root, "inc.txt.tmpl", b"<%include file=\"a.txt\"/>\n");

    let mut scanner = Scanner::new().unwrap();
    let tree = scanner.scan(root).unwrap();
    let names: Vec<&str> = tree.children().iter().map(Entry::name).collect();
    assert_eq!(names, vec!["good.txt.tmpl"]);

    let context = scanner.context();
    assert_eq!(context.identifiers.iter().collect::<Vec<_>>(), vec!["x"]);

    let report = scanner.report();
    assert_eq!(report.outcome_of(&root.join("good.txt.tmpl")), Some(&Outcome::Template));
    match report.outcome_of(&root.join("bad.txt.tmpl")) {
        Some(Outcome::Skipped { reason }) => assert!(reason.contains("line 2")),
        other => panic!("expected a skipped outcome, got {other:?}"),
    }
    assert!(matches!(
        report.outcome_of(&root.join("inc.txt.tmpl")),
        Some(Outcome::Skipped { .. })
    ));
}

#[test]
fn test_root_must_be_directory() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "file.txt", b"");

    let mut scanner = Scanner::new().unwrap();
    let err = scanner.scan(temp_dir.path().join("file.txt")).unwrap_err();
    assert!(matches!(err, Error::ScanRootError { .. }));
    let err = scanner.scan(temp_dir.path().join("missing")).unwrap_err();
    assert!(matches!(err, Error::ScanRootError { .. }));
}

#[test]
fn test_report_serializes() {
    let temp_dir = template_tree();
    let mut scanner = Scanner::new().unwrap();
    scanner.scan(temp_dir.path()).unwrap();

    let json = serde_json::to_value(scanner.report()).unwrap();
    let entries = json["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 5);
    assert!(entries.iter().any(|e| e["outcome"] == "template"));
}
