//! # Artifact Resolver
//!
//! Binds every file parameter of an [`UploadSpec`] to exactly one file under
//! a base directory. Patterns are ant-style: `?` and `*` stay inside one path
//! segment, `**` spans any number of directories, and a trailing `/` means
//! "everything below". Failures of all parameters are collected before the
//! caller gives up, so a build log shows every broken pattern at once.

use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};

use crate::upload_spec::{ParameterValue, UploadSpec};

/// A parameter ready to be placed into the multipart form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedField {
    Literal {
        key: String,
        value: String,
    },
    File {
        key: String,
        /// Pattern as written in the upload specification.
        pattern: String,
        path: PathBuf,
    },
}

impl ResolvedField {
    pub fn key(&self) -> &str {
        match self {
            Self::Literal { key, .. } | Self::File { key, .. } => key,
        }
    }

    /// Base name sent as the part's file name.
    pub fn file_name(&self) -> Option<String> {
        match self {
            Self::File { path, .. } => Some(file_name_of(path)),
            Self::Literal { .. } => None,
        }
    }
}

pub(crate) fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Why a file parameter could not be bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    NoMatch,
    MultipleMatches(usize),
    InvalidPattern(String),
}

/// A file parameter that did not resolve to exactly one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionFailure {
    pub key: String,
    pub pattern: String,
    pub kind: FailureKind,
}

impl std::fmt::Display for ResolutionFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            FailureKind::NoMatch => write!(f, "Pattern {} did not match any files", self.pattern),
            FailureKind::MultipleMatches(_) => {
                write!(f, "Pattern {} matched multiple files", self.pattern)
            }
            FailureKind::InvalidPattern(reason) => {
                write!(f, "Pattern {} is not a valid file pattern: {reason}", self.pattern)
            }
        }
    }
}

impl std::error::Error for ResolutionFailure {}

/// Resolve every parameter of `spec` against `base_dir`, keeping source order.
pub fn resolve_parameters(
    spec: &UploadSpec,
    base_dir: &Path,
) -> Result<Vec<ResolvedField>, Vec<ResolutionFailure>> {
    let mut fields = Vec::with_capacity(spec.len());
    let mut failures = Vec::new();

    for param in spec.parameters() {
        match &param.value {
            ParameterValue::Literal(value) => fields.push(ResolvedField::Literal {
                key: param.key.clone(),
                value: value.clone(),
            }),
            ParameterValue::File(pattern) => match resolve_single(base_dir, pattern) {
                Ok(path) => fields.push(ResolvedField::File {
                    key: param.key.clone(),
                    pattern: pattern.clone(),
                    path,
                }),
                Err(kind) => failures.push(ResolutionFailure {
                    key: param.key.clone(),
                    pattern: pattern.clone(),
                    kind,
                }),
            },
        }
    }

    if failures.is_empty() {
        Ok(fields)
    } else {
        Err(failures)
    }
}

/// Resolve one pattern, requiring exactly one matching file.
pub fn resolve_single(base_dir: &Path, pattern: &str) -> Result<PathBuf, FailureKind> {
    let mut matches = scan(base_dir, pattern)?;
    match matches.len() {
        0 => Err(FailureKind::NoMatch),
        1 => Ok(matches.remove(0)),
        n => Err(FailureKind::MultipleMatches(n)),
    }
}

/// All regular files under `base_dir` matching an ant-style pattern, sorted.
pub fn scan(base_dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, FailureKind> {
    let full = absolute_pattern(base_dir, pattern);
    let options = MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    };
    let paths = glob::glob_with(&full, options)
        .map_err(|e| FailureKind::InvalidPattern(e.msg.to_string()))?;

    let mut files = Vec::new();
    for entry in paths {
        match entry {
            Ok(path) if path.is_file() => files.push(path),
            Ok(_) => {}
            Err(e) => tracing::debug!(path = %e.path().display(), "skipping unreadable path: {e}"),
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

fn absolute_pattern(base_dir: &Path, pattern: &str) -> String {
    let translated = ant_to_glob(pattern);
    if Path::new(&translated).is_absolute() {
        return translated;
    }
    let relative = translated.trim_start_matches("./");
    let base = Pattern::escape(&base_dir.to_string_lossy());
    format!("{}/{}", base.trim_end_matches('/'), relative)
}

/// Rewrite an ant-style pattern into `glob` syntax.
///
/// Only `?`, `*` and `**` are wildcards. Brackets are literal, a `**` fused
/// into a segment acts as `*`, and a trailing `**` or `/` selects every file
/// below.
fn ant_to_glob(pattern: &str) -> String {
    let mut normalized = pattern.trim().replace('\\', "/");
    if normalized.ends_with('/') {
        normalized.push_str("**");
    }
    let mut glob = normalized
        .split('/')
        .map(ant_segment)
        .collect::<Vec<_>>()
        .join("/");
    if glob == "**" || glob.ends_with("/**") {
        glob.push_str("/*");
    }
    glob
}

fn ant_segment(segment: &str) -> String {
    if segment == "**" {
        return segment.to_string();
    }
    let mut out = String::with_capacity(segment.len());
    for c in segment.chars() {
        match c {
            '[' => out.push_str("[[]"),
            ']' => out.push_str("[]]"),
            '*' if out.ends_with('*') => {}
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, rel.as_bytes()).unwrap();
    }

    #[test]
    fn exact_path_resolves_to_that_file() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "build/output.jar");
        let found = resolve_single(dir.path(), "build/output.jar").unwrap();
        assert_eq!(found, dir.path().join("build/output.jar"));
    }

    #[test]
    fn zero_matches_is_no_match() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            resolve_single(dir.path(), "build/*.jar"),
            Err(FailureKind::NoMatch)
        );
    }

    #[test]
    fn two_matches_is_ambiguous() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "build/a.jar");
        touch(dir.path(), "build/b.jar");
        assert_eq!(
            resolve_single(dir.path(), "build/*.jar"),
            Err(FailureKind::MultipleMatches(2))
        );
    }

    #[test]
    fn single_star_does_not_cross_directories() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "build/nested/a.jar");
        assert_eq!(resolve_single(dir.path(), "build/*.jar"), Err(FailureKind::NoMatch));
    }

    #[test]
    fn double_star_spans_directories() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "build/deep/nested/app.war");
        let found = resolve_single(dir.path(), "**/*.war").unwrap();
        assert_eq!(found, dir.path().join("build/deep/nested/app.war"));
    }

    #[test]
    fn trailing_slash_matches_everything_below() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "dist/one/readme.txt");
        assert_eq!(scan(dir.path(), "dist/").unwrap().len(), 1);
    }

    #[test]
    fn directories_are_never_matched() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "build/lib.jar/inner.txt");
        assert_eq!(resolve_single(dir.path(), "build/*.jar"), Err(FailureKind::NoMatch));
    }

    #[test]
    fn backslashes_are_separators() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "build/output.jar");
        assert!(resolve_single(dir.path(), "build\\output.jar").is_ok());
    }

    #[test]
    fn trailing_double_star_matches_files_below() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "dist/sub/app.zip");
        let found = resolve_single(dir.path(), "dist/**").unwrap();
        assert_eq!(found, dir.path().join("dist/sub/app.zip"));
    }

    #[test]
    fn bare_double_star_matches_every_file() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a.txt");
        touch(dir.path(), "deep/b.txt");
        assert_eq!(scan(dir.path(), "**").unwrap().len(), 2);
    }

    #[test]
    fn brackets_are_literal() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "build/lib[1].jar");
        touch(dir.path(), "build/lib1.jar");
        let found = resolve_single(dir.path(), "build/lib[1].jar").unwrap();
        assert_eq!(found, dir.path().join("build/lib[1].jar"));
    }

    #[test]
    fn unbalanced_bracket_is_a_plain_name() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "build/[.jar");
        assert!(resolve_single(dir.path(), "build/[.jar").is_ok());
        assert_eq!(resolve_single(dir.path(), "build/].jar"), Err(FailureKind::NoMatch));
    }

    #[test]
    fn fused_double_star_stays_in_one_segment() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "build/app-1.0.jar");
        touch(dir.path(), "build/nested/app-2.0.jar");
        let found = resolve_single(dir.path(), "build/app**.jar").unwrap();
        assert_eq!(found, dir.path().join("build/app-1.0.jar"));
    }

    #[test]
    fn resolve_parameters_collects_every_failure() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a/x.jar");
        touch(dir.path(), "a/y.jar");
        let spec = UploadSpec::parse("one=@missing.pom\ntwo=@a/*.jar\nv=1").unwrap();
        let failures = resolve_parameters(&spec, dir.path()).unwrap_err();
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].to_string(), "Pattern missing.pom did not match any files");
        assert_eq!(failures[1].to_string(), "Pattern a/*.jar matched multiple files");
    }

    #[test]
    fn resolve_parameters_keeps_source_order() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "build/output.jar");
        let spec = UploadSpec::parse("file=@build/output.jar\nversion=1.0").unwrap();
        let fields = resolve_parameters(&spec, dir.path()).unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].key(), "file");
        assert_eq!(fields[0].file_name().as_deref(), Some("output.jar"));
        assert_eq!(
            fields[1],
            ResolvedField::Literal {
                key: "version".into(),
                value: "1.0".into()
            }
        );
    }
}
