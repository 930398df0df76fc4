//! Module names and Haskell lexical shape helpers.

use std::fmt;

use smol_str::SmolStr;

/// A dotted Haskell module name such as `Data.List.NonEmpty`.
///
/// Stored as a single [`SmolStr`]; module names are short and compared
/// often, so the inline small-string representation pays off.
#[derive(Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ModuleName(SmolStr);

impl ModuleName {
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self(name.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ModuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ModuleName({})", self.0)
    }
}

impl fmt::Display for ModuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModuleName {
    fn from(name: &str) -> Self {
        Self(SmolStr::new(name))
    }
}

/// Split a written qualified reference into `(qualifier, base name)`.
///
/// `"M.lookup"` splits into `("M", "lookup")` and `"Data.Map.member"`
/// into `("Data.Map", "member")`. Returns `None` for unqualified names
/// and for the composition operator spelled bare (`"."`), whose left
/// side is not a module alias.
pub fn split_qualified(name: &str) -> Option<(&str, &str)> {
    let (qualifier, base) = name.rsplit_once('.')?;
    if base.is_empty() || qualifier.is_empty() {
        return None;
    }
    qualifier
        .chars()
        .next()
        .is_some_and(|c| c.is_uppercase())
        .then_some((qualifier, base))
}

/// Whether an identifier has data-constructor shape.
///
/// Haskell constructors start with an uppercase letter; operator
/// constructors start with a colon. Type constructors share the
/// uppercase shape and are deliberately not distinguished here.
pub fn is_constructor_like(name: &str) -> bool {
    match name.chars().next() {
        Some(c) if c.is_uppercase() => true,
        Some(':') => true,
        _ => false,
    }
}
