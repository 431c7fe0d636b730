//! `dos` view: the four legacy boolean flags, layered on `basic` and
//! `owner` (spec §6.2).

use std::collections::BTreeMap;

use super::{AttributeProvider, AttributeValue};
use crate::arena::FileNode;
use crate::error::{FsError, FsResult};

pub struct DosProvider;

const FIXED: &[&str] = &["readonly", "hidden", "archive", "system"];
const INHERITS: &[&str] = &["basic", "owner"];

impl AttributeProvider for DosProvider {
    fn name(&self) -> &'static str {
        "dos"
    }

    fn inherits(&self) -> &'static [&'static str] {
        INHERITS
    }

    fn fixed_attributes(&self) -> &'static [&'static str] {
        FIXED
    }

    fn default_values(&self, user_defaults: &BTreeMap<String, String>) -> FsResult<BTreeMap<String, AttributeValue>> {
        let mut out = BTreeMap::new();
        for attr in FIXED {
            if let Some(value) = user_defaults.get(&format!("dos:{attr}")) {
                out.insert(attr.to_string(), AttributeValue::Bool(value == "true"));
            }
        }
        Ok(out)
    }

    fn get(&self, node: &FileNode, attr: &str) -> Option<AttributeValue> {
        if !FIXED.contains(&attr) {
            return None;
        }
        Some(node.attributes.get("dos", attr).cloned().unwrap_or(AttributeValue::Bool(false)))
    }

    fn set(&self, node: &mut FileNode, attr: &str, value: AttributeValue, _creating: bool) -> FsResult<()> {
        if !FIXED.contains(&attr) {
            return Err(FsError::AttributeUnsettable { view: "dos".into(), attr: attr.into() });
        }
        value.as_bool().map_err(|_| FsError::AttributeInvalidType { view: "dos".into(), attr: attr.into() })?;
        node.attributes.set("dos", attr, value);
        Ok(())
    }
}
