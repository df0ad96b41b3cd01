//! Directory-scoped capability options and their inheritance merge.
//!
//! Each configuration scope declares either an absolute reset (`None`), a
//! purely incremental change (`+flag` / `-flag` tokens only), or an absolute
//! flag set (at least one bare flag token). Merging runs top-down from
//! ancestor scope to descendant scope and is a pure function; the merged
//! value is immutable for the lifetime of the scope.

use std::ops::{BitAnd, BitOr, BitOrAssign, Not};

/// Capability bitset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OptionFlags(u32);

impl OptionFlags {
    pub const NONE: Self = Self(0);
    /// Forbid direct host-filesystem reads for request resources.
    pub const NO_HOST_FS: Self = Self(1 << 0);
    /// Route resource loads through the configured provider.
    pub const PROVIDER_FS: Self = Self(1 << 1);
    /// Expand XInclude elements before transforming.
    pub const XINCLUDES: Self = Self(1 << 2);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for OptionFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for OptionFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for OptionFlags {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl Not for OptionFlags {
    type Output = Self;
    fn not(self) -> Self {
        Self(!self.0)
    }
}

/// What one scope declares about its options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decl {
    /// The `None` keyword: discard all ancestor state, and keep descendants
    /// from seeing it either.
    Reset,
    /// Only `+flag` / `-flag` tokens; inherits and adjusts ancestor state.
    Incremental {
        added: OptionFlags,
        removed: OptionFlags,
    },
    /// At least one bare flag token; replaces ancestor state entirely.
    /// `added`/`removed` hold incremental tokens declared alongside.
    Absolute {
        flags: OptionFlags,
        added: OptionFlags,
        removed: OptionFlags,
    },
}

impl Default for Decl {
    fn default() -> Self {
        Decl::Incremental {
            added: OptionFlags::NONE,
            removed: OptionFlags::NONE,
        }
    }
}

/// Per-scope option state: the declaration plus an optional explicit
/// stylesheet identifier.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScopeOptions {
    pub decl: Decl,
    pub stylesheet: Option<String>,
}

impl ScopeOptions {
    pub fn new(decl: Decl) -> Self {
        Self {
            decl,
            stylesheet: None,
        }
    }

    pub fn with_stylesheet(mut self, id: impl Into<String>) -> Self {
        self.stylesheet = Some(id.into());
        self
    }

    /// The effective capability set of this (merged) scope.
    pub fn flags(&self) -> OptionFlags {
        match &self.decl {
            Decl::Reset => OptionFlags::NONE,
            Decl::Incremental { added, removed } => *added & !*removed,
            Decl::Absolute {
                flags,
                added,
                removed,
            } => (*flags | *added) & !*removed,
        }
    }

    /// Merges a descendant scope onto its ancestor.
    ///
    /// A reset child discards everything. An absolute child replaces the
    /// inherited state with its own. An incremental-only child folds its
    /// add/remove sets into the ancestor's; a removal always wins over a
    /// re-add, so `added` and `removed` stay disjoint after the merge.
    pub fn merge(parent: &ScopeOptions, child: &ScopeOptions) -> ScopeOptions {
        let decl = match &child.decl {
            Decl::Reset => Decl::Reset,
            Decl::Absolute { .. } => child.decl.clone(),
            Decl::Incremental {
                added: child_added,
                removed: child_removed,
            } => {
                let (parent_flags, parent_added, parent_removed) = match &parent.decl {
                    Decl::Reset => (OptionFlags::NONE, OptionFlags::NONE, OptionFlags::NONE),
                    Decl::Incremental { added, removed } => (OptionFlags::NONE, *added, *removed),
                    Decl::Absolute {
                        flags,
                        added,
                        removed,
                    } => (*flags, *added, *removed),
                };
                let removed = parent_removed | *child_removed;
                let added = (parent_added | *child_added) & !removed;
                if parent_flags.is_empty() {
                    Decl::Incremental { added, removed }
                } else {
                    Decl::Absolute {
                        flags: parent_flags,
                        added,
                        removed,
                    }
                }
            }
        };
        ScopeOptions {
            decl,
            stylesheet: child
                .stylesheet
                .clone()
                .or_else(|| parent.stylesheet.clone()),
        }
    }
}
