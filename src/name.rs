//! Filename elements: a display form and a canonical (lookup) form, derived
//! from an input string by an ordered normalization list (spec §3 "Name",
//! §6.1 `nameDisplayNormalization` / `nameCanonicalNormalization`).

use std::fmt;
use std::hash::{Hash, Hasher};

use unicode_normalization::UnicodeNormalization;

/// One step of the ordered normalization list applied to a raw name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Normalization {
    Nfc,
    Nfd,
    CaseFoldAscii,
    CaseFoldUnicode,
}

/// The normalization list configured for one of the two name forms.
///
/// At most one of `{Nfc, Nfd}` and at most one of the two case-fold
/// variants may appear (spec §6.1 "Constraints"); `NONE` is represented by
/// an empty list.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct NormalizationList(pub Vec<Normalization>);

impl NormalizationList {
    pub fn none() -> Self {
        Self(Vec::new())
    }

    /// Validates the at-most-one-of-each-family constraint from §6.1.
    pub fn validate(&self) -> Result<(), &'static str> {
        let forms = self.0.iter().filter(|n| matches!(n, Normalization::Nfc | Normalization::Nfd)).count();
        let folds = self
            .0
            .iter()
            .filter(|n| matches!(n, Normalization::CaseFoldAscii | Normalization::CaseFoldUnicode))
            .count();
        if forms > 1 {
            return Err("at most one of NFC/NFD may be configured");
        }
        if folds > 1 {
            return Err("at most one of CASE_FOLD_ASCII/CASE_FOLD_UNICODE may be configured");
        }
        Ok(())
    }

    fn apply(&self, input: &str) -> String {
        let mut value = input.to_string();
        for step in &self.0 {
            value = match step {
                Normalization::Nfc => value.nfc().collect(),
                Normalization::Nfd => value.nfd().collect(),
                Normalization::CaseFoldAscii => value.to_ascii_lowercase(),
                Normalization::CaseFoldUnicode => value.to_lowercase(),
            };
        }
        value
    }
}

/// A single path component, distinguishing the string used for display from
/// the string used for directory-lookup equality.
#[derive(Debug, Clone)]
pub struct Name {
    display: String,
    canonical: String,
}

impl Name {
    /// Builds a `Name` from raw input, applying both normalization lists.
    pub fn new(raw: &str, display_norm: &NormalizationList, canonical_norm: &NormalizationList) -> Self {
        Name { display: display_norm.apply(raw), canonical: canonical_norm.apply(raw) }
    }

    /// Builds a `Name` whose display and canonical forms are both `raw`
    /// verbatim (used for the reserved `SELF`/`PARENT` singletons).
    fn reserved(raw: &str) -> Self {
        Name { display: raw.to_string(), canonical: raw.to_string() }
    }

    pub fn self_name() -> Self {
        Self::reserved(".")
    }

    pub fn parent_name() -> Self {
        Self::reserved("..")
    }

    pub fn is_self(&self) -> bool {
        self.canonical == "."
    }

    pub fn is_parent(&self) -> bool {
        self.canonical == ".."
    }

    pub fn is_reserved(&self) -> bool {
        self.is_self() || self.is_parent()
    }

    pub fn display(&self) -> &str {
        &self.display
    }

    pub fn canonical(&self) -> &str {
        &self.canonical
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}

impl Eq for Name {}

impl Hash for Name {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display)
    }
}

/// Orders names by display form.
pub fn by_display(a: &Name, b: &Name) -> std::cmp::Ordering {
    a.display.cmp(&b.display)
}

/// Orders names by canonical form.
pub fn by_canonical(a: &Name, b: &Name) -> std::cmp::Ordering {
    a.canonical.cmp(&b.canonical)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_names() {
        assert!(Name::self_name().is_self());
        assert!(Name::parent_name().is_parent());
        assert!(!Name::self_name().is_parent());
    }

    #[test]
    fn canonical_equality_ignores_case_when_folded() {
        let fold = NormalizationList(vec![Normalization::CaseFoldAscii]);
        let none = NormalizationList::none();
        let a = Name::new("Foo.txt", &none, &fold);
        let b = Name::new("foo.TXT", &none, &fold);
        assert_eq!(a, b);
        assert_ne!(a.display(), b.display());
    }

    #[test]
    fn validate_rejects_conflicting_forms() {
        let bad = NormalizationList(vec![Normalization::Nfc, Normalization::Nfd]);
        assert!(bad.validate().is_err());
    }

    #[test]
    fn nfc_and_nfd_forms_of_the_same_name_compare_equal_under_canonical_nfc() {
        let nfc = NormalizationList(vec![Normalization::Nfc]);
        let none = NormalizationList::none();
        // "e" + combining acute accent (NFD) vs the precomposed "é" (NFC).
        let decomposed = Name::new("e\u{0301}", &none, &nfc);
        let precomposed = Name::new("\u{00e9}", &none, &nfc);
        assert_eq!(decomposed, precomposed);
    }
}
