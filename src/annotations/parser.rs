use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::Context;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use super::builder::{split_annotation, AnnotationKey, HandlerBuilder};
use super::scanner::{self, Declaration};
use crate::model::{ParseError, ParsedAnnotations};

/// Directories never descended into.
const SKIPPED_DIRS: &[&str] = &["vendor", "node_modules", "testdata"];

/// Scans Go sources for `@box:` annotations.
///
/// `root` is the module root; package import paths are computed relative to
/// it.
#[derive(Debug, Clone)]
pub struct Parser {
    root: PathBuf,
}

impl Default for Parser {
    fn default() -> Self {
        Parser::new(".")
    }
}

impl Parser {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Parser { root: root.into() }
    }

    /// Recursively parse every Go file under `dir`.
    ///
    /// Unreadable files and walk failures below `dir` become [`ParseError`]s;
    /// only a failure to open `dir` itself is returned as `Err`.
    pub fn parse_directory(&self, dir: &Path) -> anyhow::Result<ParsedAnnotations> {
        let mut result = ParsedAnnotations::default();

        let walker = WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_skipped_dir(e));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) if err.depth() == 0 => {
                    return Err(err).with_context(|| {
                        format!("failed to walk handlers directory {}", dir.display())
                    });
                }
                Err(err) => {
                    let file_path = err.path().map(Path::to_path_buf).unwrap_or_default();
                    warn!(path = %file_path.display(), error = %err, "Skipping unreadable entry");
                    result.errors.push(ParseError {
                        file_path,
                        line: 0,
                        message: format!("Failed to read directory entry: {err}"),
                        annotation: String::new(),
                    });
                    continue;
                }
            };

            if !entry.file_type().is_file() || !is_handler_source(entry.path()) {
                continue;
            }

            match self.parse_file(entry.path()) {
                Ok(parsed) => result.merge(parsed),
                Err(err) => result.errors.push(ParseError {
                    file_path: entry.path().to_path_buf(),
                    line: 0,
                    message: format!("Failed to parse file: {err:#}"),
                    annotation: String::new(),
                }),
            }
        }

        debug!(
            dir = %dir.display(),
            handlers = result.handlers.len(),
            errors = result.errors.len(),
            "Parsed handlers directory"
        );
        Ok(result)
    }

    /// Parse a single file.
    pub fn parse_file(&self, path: &Path) -> anyhow::Result<ParsedAnnotations> {
        let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        let source = String::from_utf8(bytes)
            .with_context(|| format!("{} is not valid UTF-8", path.display()))?;
        Ok(self.parse_source(path, &source))
    }

    /// Parse already-loaded source text. `path` is recorded on handlers and
    /// errors and drives the package import path.
    pub fn parse_source(&self, path: &Path, source: &str) -> ParsedAnnotations {
        let mut result = ParsedAnnotations::default();

        let Some(package_name) = scanner::package_name(source) else {
            result.errors.push(ParseError {
                file_path: path.to_path_buf(),
                line: 0,
                message: "Failed to parse file: missing package clause".to_string(),
                annotation: String::new(),
            });
            return result;
        };
        let package_path = self.package_path(path);

        for decl in scanner::declarations(source) {
            let builder = build_declaration(&decl, path, &mut result.errors);
            if let Some(handler) =
                builder.build(&decl.name, package_name, &package_path, path.to_path_buf(), decl.line)
            {
                debug!(function = %handler.function_name, line = handler.line, "Found handler");
                result.handlers.push(handler);
            }
        }

        result
    }

    fn package_path(&self, file: &Path) -> String {
        let dir = file.parent().unwrap_or_else(|| Path::new(""));
        let relative = relative_to(dir, &self.root);
        relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// Run every `@box:` line of a declaration's comment block through a builder.
fn build_declaration(decl: &Declaration, path: &Path, errors: &mut Vec<ParseError>) -> HandlerBuilder {
    let mut builder = HandlerBuilder::new();
    for comment in &decl.comments {
        let Some(split) = split_annotation(&comment.text) else {
            continue;
        };
        let error = |message: String| ParseError {
            file_path: path.to_path_buf(),
            line: comment.line,
            message,
            annotation: comment.text.clone(),
        };
        let raw = match split {
            Ok(raw) => raw,
            Err(message) => {
                errors.push(error(message));
                continue;
            }
        };
        let Some(key) = AnnotationKey::parse(raw.key) else {
            errors.push(error(format!("Unknown annotation type: {}", raw.key)));
            continue;
        };
        if let Err(message) = builder.apply(key, raw.value) {
            errors.push(error(message));
        }
    }
    builder
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || SKIPPED_DIRS.contains(&&*name)
}

fn is_handler_source(path: &Path) -> bool {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    name.ends_with(".go") && !name.ends_with("_test.go")
}

fn relative_to(dir: &Path, root: &Path) -> PathBuf {
    if let Ok(rel) = dir.strip_prefix(root) {
        return rel.to_path_buf();
    }
    let root_is_cwd = root.components().all(|c| matches!(c, Component::CurDir));
    if root_is_cwd && dir.is_relative() {
        return dir.to_path_buf();
    }
    if let (Ok(d), Ok(r)) = (dir.canonicalize(), root.canonicalize()) {
        if let Ok(rel) = d.strip_prefix(&r) {
            return rel.to_path_buf();
        }
    }
    dir.to_path_buf()
}
