//! `owner` view: the file's owning principal, stored by name (spec §6.2).

use std::collections::BTreeMap;

use super::{AttributeProvider, AttributeValue};
use crate::arena::FileNode;
use crate::error::{FsError, FsResult};

pub struct OwnerProvider;

const FIXED: &[&str] = &["owner"];

impl AttributeProvider for OwnerProvider {
    fn name(&self) -> &'static str {
        "owner"
    }

    fn fixed_attributes(&self) -> &'static [&'static str] {
        FIXED
    }

    fn default_values(&self, user_defaults: &BTreeMap<String, String>) -> FsResult<BTreeMap<String, AttributeValue>> {
        let mut out = BTreeMap::new();
        if let Some(owner) = user_defaults.get("owner:owner") {
            out.insert("owner".to_string(), AttributeValue::Text(owner.clone()));
        }
        Ok(out)
    }

    fn get(&self, node: &FileNode, attr: &str) -> Option<AttributeValue> {
        if attr != "owner" {
            return None;
        }
        Some(node.attributes.get("owner", "owner").cloned().unwrap_or_else(|| AttributeValue::Text(String::new())))
    }

    fn set(&self, node: &mut FileNode, attr: &str, value: AttributeValue, creating: bool) -> FsResult<()> {
        if attr != "owner" {
            return Err(FsError::AttributeUnsettable { view: "owner".into(), attr: attr.into() });
        }
        if creating {
            return Err(FsError::AttributeNotCreatable { view: "owner".into(), attr: attr.into() });
        }
        value.as_text().map_err(|_| FsError::AttributeInvalidType { view: "owner".into(), attr: attr.into() })?;
        node.attributes.set("owner", "owner", value);
        Ok(())
    }
}
