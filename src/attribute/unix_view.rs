//! `unix` view: a derived, read-only projection combining `basic`, `owner`
//! and `posix` into the fields a POSIX `stat` call would report (spec §6.2).
//!
//! Never reachable through the public `view:attr` boundary — see
//! [`super::AttributeService::require_public`] — but used internally to
//! answer `mode`/`ino`/`nlink` style questions other code in this crate
//! needs without duplicating the derivation logic.

use std::collections::BTreeMap;

use super::{AttributeProvider, AttributeValue, PosixPermissions};
use crate::arena::FileNode;
use crate::error::{FsError, FsResult};

pub struct UnixProvider;

const FIXED: &[&str] = &["uid", "gid", "ino", "nlink", "mode", "ctime", "rdev", "dev"];
const INHERITS: &[&str] = &["basic", "owner", "posix"];

impl AttributeProvider for UnixProvider {
    fn name(&self) -> &'static str {
        "unix"
    }

    fn inherits(&self) -> &'static [&'static str] {
        INHERITS
    }

    fn fixed_attributes(&self) -> &'static [&'static str] {
        FIXED
    }

    fn get(&self, node: &FileNode, attr: &str) -> Option<AttributeValue> {
        Some(match attr {
            "uid" => AttributeValue::Text(node.attributes.get("owner", "owner").and_then(|v| v.as_text().ok()).unwrap_or("").to_string()),
            "gid" => AttributeValue::Text(node.attributes.get("posix", "group").and_then(|v| v.as_text().ok()).unwrap_or("").to_string()),
            "ino" => AttributeValue::U64(node.id().as_u64()),
            "nlink" => AttributeValue::U64(node.link_count() as u64),
            "mode" => {
                let perms = node
                    .attributes
                    .get("posix", "permissions")
                    .and_then(|v| v.as_permissions().ok())
                    .unwrap_or(PosixPermissions::from_octal(0o644));
                let kind_bits: u16 = if node.is_directory() {
                    0o040000
                } else if node.is_symlink() {
                    0o120000
                } else {
                    0o100000
                };
                AttributeValue::U64((kind_bits | perms.octal()) as u64)
            }
            "ctime" => AttributeValue::Time(node.created()),
            "rdev" => AttributeValue::U64(0),
            "dev" => AttributeValue::U64(0),
            _ => return None,
        })
    }

    fn set(&self, _node: &mut FileNode, attr: &str, _value: AttributeValue, _creating: bool) -> FsResult<()> {
        Err(FsError::AttributeUnsettable { view: "unix".into(), attr: attr.into() })
    }

    fn read_all(&self, node: &FileNode) -> BTreeMap<String, AttributeValue> {
        FIXED.iter().filter_map(|&attr| self.get(node, attr).map(|v| (attr.to_string(), v))).collect()
    }
}
