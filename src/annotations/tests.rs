#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Unit tests for the annotation parser

use super::*;
use crate::model::{AuthMode, DeploymentTarget, HttpMethod, RatePeriod};
use std::path::Path;
use std::time::Duration;

fn parse(source: &str) -> crate::model::ParsedAnnotations {
    Parser::new(".").parse_source(Path::new("handlers/accounts/accounts.go"), source)
}

#[test]
fn test_full_annotation_block_round_trips() {
    let source = r#"package accounts

import "net/http"

// CreateAccount creates a new account.
// @box:container service=accounts-api
// @box:path POST /accounts/{id}
// @box:auth required
// @box:cors origins=https://app.example.com,https://admin.example.com
// @box:ratelimit 100/minute
// @box:timeout 30s
// @box:memory 512MB
// @box:concurrency 80
func CreateAccount(w http.ResponseWriter, r *http.Request) {
}
"#;
    let parsed = parse(source);
    assert!(parsed.errors.is_empty(), "{:?}", parsed.errors);
    assert_eq!(parsed.handlers.len(), 1);

    let h = &parsed.handlers[0];
    assert_eq!(h.function_name, "CreateAccount");
    assert_eq!(h.package_name, "accounts");
    assert_eq!(h.package_path, "handlers/accounts");
    assert_eq!(h.line, 14);
    assert_eq!(h.target, Some(DeploymentTarget::Container));
    assert_eq!(h.service.as_deref(), Some("accounts-api"));
    let route = h.route.as_ref().unwrap();
    assert_eq!(route.method, HttpMethod::Post);
    assert_eq!(route.path, "/accounts/{id}");
    assert_eq!(h.auth, AuthMode::Required);
    assert_eq!(
        h.cors.as_ref().unwrap().allowed_origins,
        vec!["https://app.example.com", "https://admin.example.com"]
    );
    let rl = h.rate_limit.as_ref().unwrap();
    assert_eq!((rl.count, rl.period), (100, RatePeriod::Minute));
    assert_eq!(h.timeout, Some(Duration::from_secs(30)));
    assert_eq!(h.memory.as_deref(), Some("512MB"));
    assert_eq!(h.concurrency, Some(80));
}

#[test]
fn test_declaration_without_target_is_skipped() {
    let source = "package p\n\n// @box:path GET /x\nfunc A() {}\n\n// plain docs\nfunc B() {}\n";
    let parsed = parse(source);
    assert!(parsed.handlers.is_empty());
    assert!(parsed.errors.is_empty());
}

#[test]
fn test_non_adjacent_comment_is_not_attributed() {
    let source = "package p\n\n// @box:function\n// @box:path GET /x\n\nfunc A() {}\n";
    assert!(parse(source).handlers.is_empty());
}

#[test]
fn test_unknown_key_reported_with_line() {
    let source = "package p\n\n// @box:function\n// @box:path GET /x\n// @box:retries 3\nfunc A() {}\n";
    let parsed = parse(source);
    assert_eq!(parsed.handlers.len(), 1);
    assert_eq!(parsed.errors.len(), 1);
    let err = &parsed.errors[0];
    assert_eq!(err.line, 5);
    assert_eq!(err.annotation, "@box:retries 3");
    assert!(err.message.contains("Unknown annotation type: retries"));
}

#[test]
fn test_malformed_lines_do_not_abort_the_file() {
    let source = r#"package p

// @box:function
// @box:path FETCH /x
// @box:timeout soon
// @box:auth maybe
func A() {}

// @box:function
// @box:path GET /b
func B() {}
"#;
    let parsed = parse(source);
    assert_eq!(parsed.errors.len(), 3);
    assert_eq!(parsed.handlers.len(), 2);
    assert!(parsed.handlers[0].route.is_none());
    assert_eq!(parsed.handlers[1].function_name, "B");
}

#[test]
fn test_malformed_line_without_target_still_reported() {
    let source = "package p\n// @box:ratelimit lots\nfunc A() {}\n";
    let parsed = parse(source);
    assert!(parsed.handlers.is_empty());
    assert_eq!(parsed.errors.len(), 1);
}

#[test]
fn test_empty_key_is_invalid_format() {
    let source = "package p\n// @box:function\n// @box:\nfunc A() {}\n";
    let parsed = parse(source);
    assert!(parsed.errors[0].message.starts_with("Invalid annotation format"));
}

#[test]
fn test_missing_package_clause() {
    let parsed = parse("// @box:function\nfunc A() {}\n");
    assert!(parsed.handlers.is_empty());
    assert_eq!(parsed.errors.len(), 1);
    assert_eq!(parsed.errors[0].line, 0);
}

#[test]
fn test_auth_defaults_to_none() {
    let parsed = parse("package p\n// @box:function\n// @box:path GET /x\nfunc A() {}\n");
    assert_eq!(parsed.handlers[0].auth, AuthMode::None);
}
