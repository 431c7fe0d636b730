//! `acl` view: a POSIX-style access control list, layered on `owner` (spec
//! §6.2).

use std::collections::BTreeMap;

use super::{AttributeProvider, AttributeValue};
use crate::arena::FileNode;
use crate::error::{FsError, FsResult};

pub struct AclProvider;

const FIXED: &[&str] = &["acl"];
const INHERITS: &[&str] = &["owner"];

impl AttributeProvider for AclProvider {
    fn name(&self) -> &'static str {
        "acl"
    }

    fn inherits(&self) -> &'static [&'static str] {
        INHERITS
    }

    fn fixed_attributes(&self) -> &'static [&'static str] {
        FIXED
    }

    fn get(&self, node: &FileNode, attr: &str) -> Option<AttributeValue> {
        if attr != "acl" {
            return None;
        }
        Some(node.attributes.get("acl", "acl").cloned().unwrap_or(AttributeValue::Acl(Vec::new())))
    }

    fn set(&self, node: &mut FileNode, attr: &str, value: AttributeValue, _creating: bool) -> FsResult<()> {
        if attr != "acl" {
            return Err(FsError::AttributeUnsettable { view: "acl".into(), attr: attr.into() });
        }
        value.as_acl().map_err(|_| FsError::AttributeInvalidType { view: "acl".into(), attr: attr.into() })?;
        node.attributes.set("acl", "acl", value);
        Ok(())
    }
}
