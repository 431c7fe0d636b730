//! Path syntax: parsing, joining, normalization and relativization for both
//! configured [`crate::config::PathType`]s (spec §6.3), plus glob matching
//! (spec §6.5). Structured paths are produced here and then handed to
//! [`crate::lookup`].

mod glob;
mod unix;
mod windows;

use crate::config::PathType;
use crate::error::{FsError, FsResult};

pub use glob::GlobMatcher;

/// A parsed path: an optional root (absolute paths only) plus the sequence
/// of raw name components between separators, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPath {
    pub root: Option<String>,
    pub components: Vec<String>,
}

impl ParsedPath {
    pub fn is_absolute(&self) -> bool {
        self.root.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none() && self.components.is_empty()
    }
}

/// Parses `raw` according to `path_type` (spec §6.3).
pub fn parse(path_type: PathType, raw: &str) -> FsResult<ParsedPath> {
    match path_type {
        PathType::Unix => unix::parse(raw),
        PathType::Windows => windows::parse(raw),
    }
}

/// Renders a parsed path back to text using the canonical separator for
/// `path_type`.
pub fn render(path_type: PathType, path: &ParsedPath) -> String {
    match path_type {
        PathType::Unix => unix::render(path),
        PathType::Windows => windows::render(path),
    }
}

/// Appends `other`'s components onto `base`. If `other` is absolute it is
/// returned unchanged, matching the usual `resolve` semantics.
pub fn join(base: &ParsedPath, other: &ParsedPath) -> ParsedPath {
    if other.is_absolute() {
        return other.clone();
    }
    let mut components = base.components.clone();
    components.extend(other.components.iter().cloned());
    ParsedPath { root: base.root.clone(), components }
}

/// Resolves `.`/`..` components without touching the filesystem. A leading
/// `..` past the root is dropped for absolute paths and kept for relative
/// ones (matching `java.nio.file.Path::normalize`-style semantics).
pub fn normalize(path: &ParsedPath) -> ParsedPath {
    let mut out: Vec<String> = Vec::with_capacity(path.components.len());
    for component in &path.components {
        match component.as_str() {
            "." => {}
            ".." => match out.last() {
                Some(last) if last != ".." => {
                    out.pop();
                }
                _ if path.root.is_none() => out.push("..".to_string()),
                _ => {}
            },
            _ => out.push(component.clone()),
        }
    }
    ParsedPath { root: path.root.clone(), components: out }
}

/// Computes the relative path from `base` to `target`, both normalized
/// first. Fails with [`FsError::InvalidArgument`] if one is absolute and
/// the other is not, or their roots differ.
pub fn relativize(base: &ParsedPath, target: &ParsedPath) -> FsResult<ParsedPath> {
    if base.is_absolute() != target.is_absolute() {
        return Err(FsError::InvalidArgument("cannot relativize an absolute path against a relative one"));
    }
    if base.is_absolute() && base.root != target.root {
        return Err(FsError::InvalidArgument("cannot relativize paths with different roots"));
    }
    let base = normalize(base);
    let target = normalize(target);
    let common = base.components.iter().zip(target.components.iter()).take_while(|(a, b)| *a == *b).count();
    let mut components: Vec<String> = std::iter::repeat("..".to_string()).take(base.components.len() - common).collect();
    components.extend(target.components[common..].iter().cloned());
    Ok(ParsedPath { root: None, components })
}

/// True if `prefix`'s components are a prefix of `path`'s, and both share
/// the same root (or lack of one).
pub fn starts_with(path: &ParsedPath, prefix: &ParsedPath) -> bool {
    if path.root != prefix.root {
        return false;
    }
    path.components.len() >= prefix.components.len() && path.components[..prefix.components.len()] == prefix.components[..]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unix_join_and_normalize() {
        let base = parse(PathType::Unix, "/a/b").unwrap();
        let other = parse(PathType::Unix, "../c").unwrap();
        let joined = join(&base, &other);
        let normalized = normalize(&joined);
        assert_eq!(render(PathType::Unix, &normalized), "/a/c");
    }

    #[test]
    fn relativize_computes_updirs() {
        let base = parse(PathType::Unix, "/a/b/c").unwrap();
        let target = parse(PathType::Unix, "/a/x").unwrap();
        let rel = relativize(&base, &target).unwrap();
        assert_eq!(render(PathType::Unix, &rel), "../../x");
    }

    #[test]
    fn starts_with_checks_root_and_components() {
        let a = parse(PathType::Unix, "/a/b/c").unwrap();
        let b = parse(PathType::Unix, "/a/b").unwrap();
        assert!(starts_with(&a, &b));
        assert!(!starts_with(&b, &a));
    }
}
