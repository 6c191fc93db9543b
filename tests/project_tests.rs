#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use box_build::generator::{generate, run_build};
use common::{snapshot, Fixture};
use std::fs;

#[test]
fn test_generation_is_idempotent() {
    let fx = Fixture::shop();
    let mut config = fx.config();
    config.clean = true;

    run_build(&config).unwrap();
    let first = snapshot(&fx.output_dir());
    run_build(&config).unwrap();
    let second = snapshot(&fx.output_dir());

    assert!(!first.is_empty());
    assert_eq!(first, second);
}

#[test]
fn test_zero_handlers_leaves_empty_output_root() {
    let fx = Fixture::new();
    fs::create_dir_all(fx.handlers_dir()).unwrap();

    let report = run_build(&fx.config()).unwrap();

    assert!(report.handlers.is_empty());
    assert_eq!(report.summary.files, 0);
    assert!(fx.output_dir().is_dir());
    assert!(snapshot(&fx.output_dir()).is_empty());
}

#[test]
fn test_clean_removes_previous_output() {
    let fx = Fixture::shop();
    let mut config = fx.config();
    run_build(&config).unwrap();
    fs::write(fx.output_dir().join("stale.txt"), "old").unwrap();

    config.clean = true;
    run_build(&config).unwrap();

    assert!(!fx.output_dir().join("stale.txt").exists());
    assert!(fx.output_dir().join("gateway/openapi.yaml").exists());
}

#[test]
fn test_without_clean_existing_files_survive() {
    let fx = Fixture::shop();
    fs::create_dir_all(fx.output_dir()).unwrap();
    fs::write(fx.output_dir().join("keep.txt"), "mine").unwrap();

    run_build(&fx.config()).unwrap();

    assert_eq!(fs::read_to_string(fx.output_dir().join("keep.txt")).unwrap(), "mine");
}

#[test]
fn test_diagnostics_do_not_block_by_default() {
    let fx = Fixture::new();
    fx.write(
        "handlers/pkg/pkg.go",
        "package pkg\n\n// @box:function\n// @box:path GET /m\n// @box:memory 99MB\nfunc M() {}\n",
    );

    let report = run_build(&fx.config()).unwrap();

    assert_eq!(report.error_count(), 1);
    assert_eq!(report.summary.functions, 1);
    assert!(fx.output_dir().join("functions/m/main.go").exists());
}

#[test]
fn test_strict_mode_blocks_generation() {
    let fx = Fixture::new();
    fx.write(
        "handlers/pkg/pkg.go",
        "package pkg\n\n// @box:function\n// @box:path GET /m\n// @box:memory 99MB\nfunc M() {}\n",
    );
    let mut config = fx.config();
    config.strict = true;

    let err = run_build(&config).unwrap_err();

    assert!(err.to_string().contains("1 error(s)"));
    assert!(!fx.output_dir().exists());
}

#[test]
fn test_parse_errors_are_reported_not_fatal() {
    let fx = Fixture::shop();
    fx.write(
        "handlers/extra/extra.go",
        "package extra\n\n// @box:function\n// @box:path GET /e\n// @box:bogus\nfunc E() {}\n",
    );

    let report = run_build(&fx.config()).unwrap();

    assert_eq!(report.parse_errors.len(), 1);
    assert_eq!(report.parse_errors[0].line, 5);
    assert_eq!(report.summary.functions, 3);
}

#[test]
fn test_unwritable_output_fails_with_context() {
    let fx = Fixture::shop();
    let mut config = fx.config();
    let blocker = fx.root().join("blocker");
    fs::write(&blocker, "file").unwrap();
    config.output_dir = blocker.join("out");

    let err = generate(&config, &[]).unwrap_err();
    assert!(format!("{err:#}").contains("failed to create output directory"));
}

#[test]
fn test_oversized_annotation_values_still_generate() {
    let fx = Fixture::new();
    fx.write(
        "handlers/pkg/pkg.go",
        r#"package pkg

// @box:function
// @box:path GET /a
// @box:ratelimit 1000000000000000000/second
func A() {}

// @box:function
// @box:path GET /b
// @box:memory 18014398509481984GB
func B() {}
"#,
    );

    let report = run_build(&fx.config()).unwrap();

    assert_eq!(report.summary.functions, 2);
    let yaml = common::read(&fx.output_dir().join("functions/b/function.yaml"));
    assert!(yaml.contains("availableMemory: 256Mi"));
    let openapi = common::read(&fx.output_dir().join("gateway/openapi.yaml"));
    assert!(openapi.contains(&i64::MAX.to_string()));
}

#[test]
fn test_output_outside_project_root_is_rejected() {
    let fx = Fixture::shop();
    let elsewhere = tempfile::TempDir::new().unwrap();
    let mut config = fx.config();
    config.output_dir = elsewhere.path().join("out");

    let err = run_build(&config).unwrap_err();

    assert!(err.to_string().contains("must be inside the project root"));
    assert!(!config.output_dir.exists());
}
