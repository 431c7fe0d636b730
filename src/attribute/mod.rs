//! `AttributeService`: the registry of attribute-view providers (spec
//! §4.E, §6.2) plus the value types and `view:attr` expression parser that
//! sit at the public API boundary.

mod acl;
mod basic;
mod dos;
mod owner;
mod posix;
mod unix_view;
mod user;

use std::collections::{BTreeMap, BTreeSet};

use crate::arena::FileNode;
use crate::error::{FsError, FsResult};
use crate::time::FileTime;

/// A single attribute's value, covering every type named in §6.2.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Bool(bool),
    U64(u64),
    Time(FileTime),
    Text(String),
    Bytes(Vec<u8>),
    Permissions(PosixPermissions),
    Acl(Vec<AclEntry>),
}

impl AttributeValue {
    pub fn as_bool(&self) -> FsResult<bool> {
        match self {
            AttributeValue::Bool(b) => Ok(*b),
            _ => Err(wrong_type()),
        }
    }

    pub fn as_text(&self) -> FsResult<&str> {
        match self {
            AttributeValue::Text(s) => Ok(s),
            _ => Err(wrong_type()),
        }
    }

    pub fn as_permissions(&self) -> FsResult<PosixPermissions> {
        match self {
            AttributeValue::Permissions(p) => Ok(*p),
            _ => Err(wrong_type()),
        }
    }

    pub fn as_acl(&self) -> FsResult<&[AclEntry]> {
        match self {
            AttributeValue::Acl(entries) => Ok(entries),
            _ => Err(wrong_type()),
        }
    }

    pub fn as_bytes(&self) -> FsResult<&[u8]> {
        match self {
            AttributeValue::Bytes(b) => Ok(b),
            _ => Err(wrong_type()),
        }
    }
}

fn wrong_type() -> FsError {
    FsError::AttributeInvalidType { view: String::new(), attr: String::new() }
}

/// The nine POSIX permission bits, packed owner/group/other × r/w/x,
/// matching the `rwxrw-r--` string form (spec §6.2 `posix:permissions`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PosixPermissions(pub u16);

const RWX_LETTERS: [char; 9] = ['r', 'w', 'x', 'r', 'w', 'x', 'r', 'w', 'x'];

impl PosixPermissions {
    pub fn from_octal(mode: u16) -> Self {
        PosixPermissions(mode & 0o777)
    }

    pub fn octal(self) -> u16 {
        self.0
    }

    pub fn from_rwx_string(s: &str) -> FsResult<Self> {
        let chars: Vec<char> = s.chars().collect();
        if chars.len() != 9 {
            return Err(FsError::AttributeInvalidType {
                view: "posix".into(),
                attr: "permissions".into(),
            });
        }
        let mut bits = 0u16;
        for (i, &c) in chars.iter().enumerate() {
            let expected_off = '-';
            let expected_on = RWX_LETTERS[i];
            if c == expected_on {
                bits |= 1 << (8 - i);
            } else if c != expected_off {
                return Err(FsError::AttributeInvalidType {
                    view: "posix".into(),
                    attr: "permissions".into(),
                });
            }
        }
        Ok(PosixPermissions(bits))
    }

    pub fn to_rwx_string(self) -> String {
        (0..9)
            .map(|i| if self.0 & (1 << (8 - i)) != 0 { RWX_LETTERS[i] } else { '-' })
            .collect()
    }
}

/// One entry in a POSIX-style access control list (spec §6.2 `acl:acl`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AclEntry {
    pub principal: String,
    pub allow: bool,
    pub permissions: String,
}

/// Per-inode `view_name -> attr_name -> value` storage, lazily
/// instantiated (spec §3 "Attribute table").
#[derive(Debug, Default, Clone)]
pub struct AttributeTable {
    views: BTreeMap<String, BTreeMap<String, AttributeValue>>,
}

impl AttributeTable {
    pub fn get(&self, view: &str, attr: &str) -> Option<&AttributeValue> {
        self.views.get(view)?.get(attr)
    }

    pub fn set(&mut self, view: &str, attr: &str, value: AttributeValue) {
        self.views.entry(view.to_string()).or_default().insert(attr.to_string(), value);
    }

    pub fn view_entries(&self, view: &str) -> BTreeMap<String, AttributeValue> {
        self.views.get(view).cloned().unwrap_or_default()
    }
}

/// Capability set a view provider implements (spec §4.E).
pub trait AttributeProvider: Send + Sync {
    fn name(&self) -> &'static str;

    fn inherits(&self) -> &'static [&'static str] {
        &[]
    }

    fn fixed_attributes(&self) -> &'static [&'static str];

    /// Validates and returns a caller-supplied `view:attr -> value` map to
    /// apply at creation time (spec §4.E `defaultValues`).
    fn default_values(&self, _user_defaults: &BTreeMap<String, String>) -> FsResult<BTreeMap<String, AttributeValue>> {
        Ok(BTreeMap::new())
    }

    fn supports(&self, attr: &str) -> bool {
        self.fixed_attributes().contains(&attr)
    }

    fn get(&self, node: &FileNode, attr: &str) -> Option<AttributeValue>;

    fn set(&self, node: &mut FileNode, attr: &str, value: AttributeValue, creating: bool) -> FsResult<()>;

    fn read_all(&self, node: &FileNode) -> BTreeMap<String, AttributeValue> {
        self.fixed_attributes()
            .iter()
            .filter_map(|&attr| self.get(node, attr).map(|v| (attr.to_string(), v)))
            .collect()
    }
}

/// Registry mapping view names to providers (spec §4.E).
///
/// `unix` is always registered internally (so `unix:mode` etc. can be
/// computed by other code in this crate) but is never reachable through
/// the view-name parsed at the public API boundary, matching its spec
/// description as a "derived pseudo-view... not reachable via the public
/// API".
pub struct AttributeService {
    providers: BTreeMap<&'static str, Box<dyn AttributeProvider>>,
    enabled: BTreeSet<String>,
}

pub const UNIX_VIEW_NAME: &str = "unix";

impl AttributeService {
    pub fn new(enabled_views: &BTreeSet<String>) -> Self {
        let mut providers: BTreeMap<&'static str, Box<dyn AttributeProvider>> = BTreeMap::new();
        providers.insert("basic", Box::new(basic::BasicProvider));
        providers.insert("owner", Box::new(owner::OwnerProvider));
        providers.insert("posix", Box::new(posix::PosixProvider));
        providers.insert("dos", Box::new(dos::DosProvider));
        providers.insert("acl", Box::new(acl::AclProvider));
        providers.insert("user", Box::new(user::UserProvider));
        providers.insert(UNIX_VIEW_NAME, Box::new(unix_view::UnixProvider));
        Self { providers, enabled: enabled_views.clone() }
    }

    fn provider(&self, view: &str) -> FsResult<&dyn AttributeProvider> {
        self.providers
            .get(view)
            .map(|b| b.as_ref())
            .ok_or_else(|| FsError::AttributeUnsupported { view: view.to_string(), attr: String::new() })
    }

    fn require_public(&self, view: &str) -> FsResult<()> {
        if view == UNIX_VIEW_NAME || !self.enabled.contains(view) {
            return Err(FsError::AttributeUnsupported { view: view.to_string(), attr: String::new() });
        }
        Ok(())
    }

    /// Resolves `get(view, attr)`: the view itself, then each inherited
    /// view in declaration order, first non-null wins (spec §4.E
    /// "Resolution").
    pub fn get(&self, node: &FileNode, view: &str, attr: &str) -> FsResult<AttributeValue> {
        self.require_public(view)?;
        let provider = self.provider(view)?;
        if let Some(value) = provider.get(node, attr) {
            return Ok(value);
        }
        for inherited in provider.inherits() {
            if let Some(value) = self.provider(inherited)?.get(node, attr) {
                return Ok(value);
            }
        }
        Err(FsError::AttributeUnsupported { view: view.to_string(), attr: attr.to_string() })
    }

    /// `set` requires a single view that `supports` the attribute (spec
    /// §4.E).
    pub fn set(&self, node: &mut FileNode, view: &str, attr: &str, value: AttributeValue, creating: bool) -> FsResult<()> {
        self.require_public(view)?;
        let provider = self.provider(view)?;
        if !provider.supports(attr) {
            return Err(FsError::AttributeUnsupported { view: view.to_string(), attr: attr.to_string() });
        }
        provider.set(node, attr, value, creating)
    }

    pub fn read_attributes(&self, node: &FileNode, view: &str) -> FsResult<BTreeMap<String, AttributeValue>> {
        self.require_public(view)?;
        let provider = self.provider(view)?;
        let mut all = provider.read_all(node);
        for inherited in provider.inherits() {
            for (k, v) in self.provider(inherited)?.read_all(node) {
                all.entry(k).or_insert(v);
            }
        }
        Ok(all)
    }

    /// Validates and merges `defaultAttributeValues` (per provider) with
    /// caller-supplied creation attributes, applying them to a freshly
    /// created node (spec §4.F `createFile`).
    pub fn apply_creation_attributes(
        &self,
        node: &mut FileNode,
        default_values: &BTreeMap<String, String>,
        explicit: &[(String, String, AttributeValue)],
    ) -> FsResult<()> {
        for view_name in self.enabled.clone() {
            let provider = self.provider(&view_name)?;
            let defaults = provider.default_values(default_values)?;
            for (attr, value) in defaults {
                provider.set(node, &attr, value, true)?;
            }
        }
        for (view, attr, value) in explicit {
            self.set(node, view, attr, value.clone(), true)?;
        }
        Ok(())
    }

    /// Parses a `view:attr` expression at the public boundary (spec §4.E
    /// "Parsing of attribute expressions"). Bare `"x"` means `"basic:x"`;
    /// `"view:*"` expands to every attribute of the view plus its
    /// inherited views; mixing `*` with names is rejected.
    pub fn parse_expression(&self, expr: &str) -> FsResult<(String, Vec<String>)> {
        let (view, rest) = match expr.split_once(':') {
            Some((v, r)) => (v.to_string(), r),
            None => ("basic".to_string(), expr),
        };
        self.require_public(&view)?;
        if rest == "*" {
            let provider = self.provider(&view)?;
            let mut attrs: Vec<String> = provider.fixed_attributes().iter().map(|s| s.to_string()).collect();
            for inherited in provider.inherits() {
                attrs.extend(self.provider(inherited)?.fixed_attributes().iter().map(|s| s.to_string()));
            }
            return Ok((view, attrs));
        }
        if rest.contains('*') {
            return Err(FsError::UnsupportedOption("cannot mix `*` with named attributes"));
        }
        Ok((view, rest.split(',').map(|s| s.to_string()).collect()))
    }
}
