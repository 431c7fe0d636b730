//! Unix path syntax (spec §6.3): separator `/`, absolute iff the path
//! starts with it, NUL disallowed, the splitter drops empty components so
//! runs of separators collapse.

use super::ParsedPath;
use crate::error::{FsError, FsResult};

pub fn parse(raw: &str) -> FsResult<ParsedPath> {
    if raw.contains('\0') {
        return Err(FsError::PathSyntaxInvalid { path: raw.to_string(), reason: "NUL byte in path" });
    }
    let absolute = raw.starts_with('/');
    let components = raw.split('/').filter(|c| !c.is_empty()).map(|c| c.to_string()).collect();
    Ok(ParsedPath { root: if absolute { Some("/".to_string()) } else { None }, components })
}

pub fn render(path: &ParsedPath) -> String {
    let body = path.components.join("/");
    match &path.root {
        Some(root) => format!("{root}{body}"),
        None => body,
    }
}
