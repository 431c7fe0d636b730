//! `posix` view: group ownership and the nine permission bits, layered on
//! `basic` and `owner` (spec §6.2).

use std::collections::BTreeMap;

use super::{AttributeProvider, AttributeValue, PosixPermissions};
use crate::arena::FileNode;
use crate::error::{FsError, FsResult};

pub struct PosixProvider;

const FIXED: &[&str] = &["group", "permissions"];
const INHERITS: &[&str] = &["basic", "owner"];

impl AttributeProvider for PosixProvider {
    fn name(&self) -> &'static str {
        "posix"
    }

    fn inherits(&self) -> &'static [&'static str] {
        INHERITS
    }

    fn fixed_attributes(&self) -> &'static [&'static str] {
        FIXED
    }

    fn default_values(&self, user_defaults: &BTreeMap<String, String>) -> FsResult<BTreeMap<String, AttributeValue>> {
        let mut out = BTreeMap::new();
        if let Some(group) = user_defaults.get("posix:group") {
            out.insert("group".to_string(), AttributeValue::Text(group.clone()));
        }
        if let Some(mode) = user_defaults.get("posix:permissions") {
            let perms = PosixPermissions::from_rwx_string(mode)?;
            out.insert("permissions".to_string(), AttributeValue::Permissions(perms));
        }
        Ok(out)
    }

    fn get(&self, node: &FileNode, attr: &str) -> Option<AttributeValue> {
        match attr {
            "group" => Some(node.attributes.get("posix", "group").cloned().unwrap_or_else(|| AttributeValue::Text(String::new()))),
            "permissions" => Some(
                node.attributes
                    .get("posix", "permissions")
                    .cloned()
                    .unwrap_or(AttributeValue::Permissions(PosixPermissions::from_octal(0o644))),
            ),
            _ => None,
        }
    }

    fn set(&self, node: &mut FileNode, attr: &str, value: AttributeValue, creating: bool) -> FsResult<()> {
        match attr {
            "group" => {
                if creating {
                    return Err(FsError::AttributeNotCreatable { view: "posix".into(), attr: attr.into() });
                }
                value.as_text().map_err(|_| FsError::AttributeInvalidType { view: "posix".into(), attr: attr.into() })?;
                node.attributes.set("posix", "group", value);
                Ok(())
            }
            "permissions" => {
                value.as_permissions().map_err(|_| FsError::AttributeInvalidType { view: "posix".into(), attr: attr.into() })?;
                node.attributes.set("posix", "permissions", value);
                Ok(())
            }
            _ => Err(FsError::AttributeUnsettable { view: "posix".into(), attr: attr.into() }),
        }
    }
}
