//! Windows path syntax (spec §6.3): canonical separator `\`, also accepts
//! `/`; roots are either a drive-letter form (`C:\`) or a UNC form
//! (`\\host\share`); a fixed set of characters is reserved outside the
//! drive root; trailing spaces before a separator or at the end are
//! rejected; and the two legacy "drive-relative" and
//! "absolute-without-drive" forms are rejected rather than guessed at.

use super::ParsedPath;
use crate::error::{FsError, FsResult};

const RESERVED_CHARS: &[char] = &['<', '>', ':', '"', '|', '?', '*'];

pub fn parse(raw: &str) -> FsResult<ParsedPath> {
    let normalized: String = raw.chars().map(|c| if c == '/' { '\\' } else { c }).collect();

    if let Some(rest) = normalized.strip_prefix(r"\\") {
        let mut parts = rest.splitn(2, '\\');
        let host = parts.next().unwrap_or("");
        let share_and_tail = parts.next().unwrap_or("");
        if host.is_empty() {
            return Err(FsError::PathSyntaxInvalid { path: raw.to_string(), reason: "UNC path is missing a host" });
        }
        let mut tail_parts = share_and_tail.splitn(2, '\\');
        let share = tail_parts.next().unwrap_or("");
        if share.is_empty() {
            return Err(FsError::PathSyntaxInvalid { path: raw.to_string(), reason: "UNC path is missing a share name" });
        }
        let tail = tail_parts.next().unwrap_or("");
        let root = format!(r"\\{host}\{share}\");
        let components = split_components(raw, tail)?;
        return Ok(ParsedPath { root: Some(root), components });
    }

    let bytes = normalized.as_bytes();
    if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
        if bytes.len() < 3 || bytes[2] != b'\\' {
            return Err(FsError::PathSyntaxInvalid {
                path: raw.to_string(),
                reason: "drive-relative paths (`C:foo`) are not supported",
            });
        }
        let drive = &normalized[..1];
        let root = format!("{}:\\", drive.to_ascii_uppercase());
        let components = split_components(raw, &normalized[3..])?;
        return Ok(ParsedPath { root: Some(root), components });
    }

    if normalized.starts_with('\\') {
        return Err(FsError::PathSyntaxInvalid {
            path: raw.to_string(),
            reason: "absolute paths without a drive letter are not supported",
        });
    }

    let components = split_components(raw, &normalized)?;
    Ok(ParsedPath { root: None, components })
}

fn split_components(original: &str, rest: &str) -> FsResult<Vec<String>> {
    let mut out = Vec::new();
    for component in rest.split('\\').filter(|c| !c.is_empty()) {
        if component.chars().any(|c| RESERVED_CHARS.contains(&c)) {
            return Err(FsError::PathSyntaxInvalid { path: original.to_string(), reason: "path contains a reserved character" });
        }
        if component.ends_with(' ') {
            return Err(FsError::PathSyntaxInvalid { path: original.to_string(), reason: "trailing space before a separator or at the end" });
        }
        out.push(component.to_string());
    }
    Ok(out)
}

pub fn render(path: &ParsedPath) -> String {
    let body = path.components.join(r"\");
    match &path.root {
        Some(root) => format!("{root}{body}"),
        None => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drive_letter_root_is_uppercased_and_accepts_forward_slashes() {
        let parsed = parse("c:/a/b").unwrap();
        assert_eq!(parsed.root.as_deref(), Some(r"C:\"));
        assert_eq!(parsed.components, vec!["a", "b"]);
    }

    #[test]
    fn unc_root_captures_host_and_share() {
        let parsed = parse(r"\\server\share\dir").unwrap();
        assert_eq!(parsed.root.as_deref(), Some(r"\\server\share\"));
        assert_eq!(parsed.components, vec!["dir"]);
    }

    #[test]
    fn rejects_drive_relative_legacy_form() {
        assert!(parse("C:foo").is_err());
    }

    #[test]
    fn rejects_absolute_without_drive_legacy_form() {
        assert!(parse(r"\foo\bar").is_err());
    }

    #[test]
    fn rejects_reserved_characters() {
        assert!(parse(r"a\b?c").is_err());
    }

    #[test]
    fn rejects_trailing_space_before_separator() {
        assert!(parse("a \\b").is_err());
    }
}
