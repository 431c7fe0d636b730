//! `user` view: arbitrary caller-named byte-array attributes (spec §6.2).
//!
//! Unlike the other views, `user` has no fixed attribute set — any name is
//! accepted, so `supports` always answers true and `read_all` can only
//! report what has actually been stored.

use std::collections::BTreeMap;

use super::{AttributeProvider, AttributeValue};
use crate::arena::FileNode;
use crate::error::{FsError, FsResult};

pub struct UserProvider;

impl AttributeProvider for UserProvider {
    fn name(&self) -> &'static str {
        "user"
    }

    fn fixed_attributes(&self) -> &'static [&'static str] {
        &[]
    }

    fn supports(&self, _attr: &str) -> bool {
        true
    }

    fn get(&self, node: &FileNode, attr: &str) -> Option<AttributeValue> {
        node.attributes.get("user", attr).cloned()
    }

    fn set(&self, node: &mut FileNode, attr: &str, value: AttributeValue, _creating: bool) -> FsResult<()> {
        value.as_bytes().map_err(|_| FsError::AttributeInvalidType { view: "user".into(), attr: attr.into() })?;
        node.attributes.set("user", attr, value);
        Ok(())
    }

    fn read_all(&self, node: &FileNode) -> BTreeMap<String, AttributeValue> {
        node.attributes.view_entries("user")
    }
}
