#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

//! Shared fixtures: a throwaway Go module on disk.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use box_build::config::BuildConfig;
use tempfile::TempDir;
use walkdir::WalkDir;

pub const MODULE: &str = "github.com/acme/shop";
pub const PROJECT: &str = "acme-prod";

pub const ACCOUNTS_GO: &str = r#"package accounts

import "net/http"

// CreateAccount creates an account.
// @box:function
// @box:path POST /api/v1/accounts
// @box:auth required
// @box:ratelimit 100/minute
// @box:timeout 30s
// @box:memory 512MB
func CreateAccount(w http.ResponseWriter, r *http.Request) {}

// @box:function
// @box:path GET /api/v1/accounts/{id}
// @box:cors origins=https://app.acme.com
func GetAccount(w http.ResponseWriter, r *http.Request) {}
"#;

pub const USERS_GO: &str = r#"package users

import "net/http"

// @box:container
// @box:path GET /u
func ListUsers(w http.ResponseWriter, r *http.Request) {}

// @box:container
// @box:path POST /u
// @box:concurrency 200
func CreateUser(w http.ResponseWriter, r *http.Request) {}
"#;

/// A Go module with a `go.mod` and a `handlers/` tree.
pub struct Fixture {
    pub dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        let fixture = Fixture {
            dir: TempDir::new().unwrap(),
        };
        fixture.write("go.mod", &format!("module {MODULE}\n\ngo 1.22\n"));
        fixture
    }

    /// The standard two-package module used across tests.
    pub fn shop() -> Self {
        let fixture = Fixture::new();
        fixture.write("handlers/accounts/accounts.go", ACCOUNTS_GO);
        fixture.write("handlers/users/users.go", USERS_GO);
        fixture
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn handlers_dir(&self) -> PathBuf {
        self.root().join("handlers")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root().join("build")
    }

    pub fn write(&self, rel: &str, contents: &str) {
        let path = self.root().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    pub fn config(&self) -> BuildConfig {
        let mut config = BuildConfig::new(PROJECT, MODULE);
        config.project_root = self.root().to_path_buf();
        config.handlers_dir = self.handlers_dir();
        config.output_dir = self.output_dir();
        config
    }
}

/// Every file under `root`, keyed by `/`-separated relative path.
pub fn snapshot(root: &Path) -> BTreeMap<String, Vec<u8>> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .map(|e| e.unwrap())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let rel = e.path().strip_prefix(root).unwrap();
            let key = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/");
            (key, fs::read(e.path()).unwrap())
        })
        .collect()
}

pub fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_else(|e| panic!("read {}: {e}", path.display()))
}
