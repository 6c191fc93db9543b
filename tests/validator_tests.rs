#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use box_build::annotations::Parser;
use box_build::model::{Handler, Severity};
use box_build::validator::{has_errors, validate_all};
use common::Fixture;

fn parse_one(source: &str) -> Vec<Handler> {
    let fx = Fixture::new();
    fx.write("handlers/pkg/pkg.go", source);
    let parsed = Parser::new(fx.root())
        .parse_directory(&fx.handlers_dir())
        .unwrap();
    assert!(parsed.errors.is_empty(), "{:?}", parsed.errors);
    parsed.handlers
}

#[test]
fn test_shop_fixture_is_clean() {
    let fx = Fixture::shop();
    let parsed = Parser::new(fx.root())
        .parse_directory(&fx.handlers_dir())
        .unwrap();
    let diagnostics = validate_all(&parsed.handlers);
    assert!(!has_errors(&diagnostics), "{diagnostics:?}");
}

#[test]
fn test_function_memory_tiers() {
    let rejected = parse_one(
        "package pkg\n\n// @box:function\n// @box:path GET /m\n// @box:memory 99MB\nfunc M() {}\n",
    );
    let diagnostics = validate_all(&rejected);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].severity, Severity::Error);
    assert_eq!(diagnostics[0].annotation, "@box:memory");

    let accepted = parse_one(
        "package pkg\n\n// @box:function\n// @box:path GET /m\n// @box:memory 256MB\nfunc M() {}\n",
    );
    assert!(validate_all(&accepted).is_empty());
}

#[test]
fn test_timeout_ceiling_depends_on_target() {
    let function = parse_one(
        "package pkg\n\n// @box:function\n// @box:path GET /t\n// @box:timeout 600s\nfunc T() {}\n",
    );
    let diagnostics = validate_all(&function);
    assert!(has_errors(&diagnostics));
    assert!(diagnostics[0].reason.contains("540"));

    let container = parse_one(
        "package pkg\n\n// @box:container\n// @box:path GET /t\n// @box:timeout 600s\nfunc T() {}\n",
    );
    assert!(!has_errors(&validate_all(&container)));
}

#[test]
fn test_duplicate_route_reported_once_on_later_handler() {
    let handlers = parse_one(
        r#"package pkg

// @box:function
// @box:path GET /x
func First() {}

// @box:container
// @box:path GET /x
func Second() {}
"#,
    );
    let diagnostics = validate_all(&handlers);

    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].handler, "Second");
    assert!(diagnostics[0].reason.contains("First"));
    assert!(diagnostics[0].is_error());
}

#[test]
fn test_all_diagnostics_are_collected() {
    let handlers = parse_one(
        r#"package pkg

// @box:function
// @box:path GET /a
// @box:memory 99MB
// @box:concurrency 5
// @box:timeout 2s
func A() {}

// @box:container
func B() {}
"#,
    );
    let diagnostics = validate_all(&handlers);

    let for_a: Vec<_> = diagnostics.iter().filter(|d| d.handler == "A").collect();
    assert_eq!(for_a.len(), 3);
    assert!(for_a.iter().any(|d| d.severity == Severity::Warning));
    assert!(diagnostics
        .iter()
        .any(|d| d.handler == "B" && d.annotation == "@box:path"));
}
