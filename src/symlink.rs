//! `SymbolicLink`: an inode holding an immutable target path value (spec
//! §3 "Inode variants", invariant 9).

/// A symbolic link's target, stored exactly as given at creation time and
/// never mutated afterwards.
#[derive(Debug, Clone)]
pub struct SymbolicLink {
    target: String,
}

impl SymbolicLink {
    pub fn new(target: impl Into<String>) -> Self {
        Self { target: target.into() }
    }

    pub fn target(&self) -> &str {
        &self.target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_is_preserved_verbatim() {
        let link = SymbolicLink::new("../other/path");
        assert_eq!(link.target(), "../other/path");
    }
}
