//! `basic` view: the attributes every inode has regardless of kind (spec
//! §6.2).

use std::collections::BTreeMap;

use super::{AttributeProvider, AttributeValue};
use crate::arena::FileNode;
use crate::error::{FsError, FsResult};

pub struct BasicProvider;

const FIXED: &[&str] = &[
    "size",
    "fileKey",
    "isDirectory",
    "isRegularFile",
    "isSymbolicLink",
    "isOther",
    "creationTime",
    "lastAccessTime",
    "lastModifiedTime",
];

const WRITABLE_NOT_AT_CREATE: &[&str] = &["creationTime", "lastAccessTime", "lastModifiedTime"];

impl AttributeProvider for BasicProvider {
    fn name(&self) -> &'static str {
        "basic"
    }

    fn fixed_attributes(&self) -> &'static [&'static str] {
        FIXED
    }

    fn get(&self, node: &FileNode, attr: &str) -> Option<AttributeValue> {
        Some(match attr {
            "size" => AttributeValue::U64(node.as_regular().map(|f| f.size()).unwrap_or(0)),
            "fileKey" => AttributeValue::U64(node.id().as_u64()),
            "isDirectory" => AttributeValue::Bool(node.is_directory()),
            "isRegularFile" => AttributeValue::Bool(node.is_regular()),
            "isSymbolicLink" => AttributeValue::Bool(node.is_symlink()),
            "isOther" => AttributeValue::Bool(false),
            "creationTime" => AttributeValue::Time(node.created()),
            "lastAccessTime" => AttributeValue::Time(node.accessed()),
            "lastModifiedTime" => AttributeValue::Time(node.modified()),
            _ => return None,
        })
    }

    fn set(&self, node: &mut FileNode, attr: &str, value: AttributeValue, creating: bool) -> FsResult<()> {
        if !WRITABLE_NOT_AT_CREATE.contains(&attr) {
            return Err(FsError::AttributeUnsettable { view: "basic".into(), attr: attr.into() });
        }
        if creating {
            return Err(FsError::AttributeNotCreatable { view: "basic".into(), attr: attr.into() });
        }
        let time = match value {
            AttributeValue::Time(t) => t,
            _ => return Err(FsError::AttributeInvalidType { view: "basic".into(), attr: attr.into() }),
        };
        match node.data_mut() {
            crate::arena::FileData::Regular(file) => match attr {
                "creationTime" => file.set_created(time),
                "lastAccessTime" => file.set_accessed(time),
                "lastModifiedTime" => file.set_modified(time),
                _ => {}
            },
            _ => match attr {
                "creationTime" => node.set_created_field(time),
                "lastModifiedTime" | "lastAccessTime" => node.set_modified_field(time),
                _ => {}
            },
        }
        Ok(())
    }

    fn read_all(&self, node: &FileNode) -> BTreeMap<String, AttributeValue> {
        FIXED.iter().filter_map(|&attr| self.get(node, attr).map(|v| (attr.to_string(), v))).collect()
    }
}
