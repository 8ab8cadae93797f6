//! Symbols registered by index fragments and the per-page registry that owns them.
//!
//! A fragment registers one [Symbol] (the namespace, module or class it documents), attaches
//! its children kind by kind, and calls finish. Out-of-line fragments are additionally
//! indexed by name so that inheritance requests can find them later.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::NavError;

/// A leaf navigation entry: a method, member, class etc. listed in the sidebar.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChildRef {
    pub name: String,
    /// Root-relative link to the documentation page of this child
    pub link: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub inherited: bool,
    /// Style qualifiers such as `protected` or `static`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modifiers: Vec<String>,
}

impl ChildRef {
    pub fn new(name: impl Into<String>, link: impl Into<String>) -> ChildRef {
        ChildRef {
            name: name.into(),
            link: link.into(),
            ..Default::default()
        }
    }

    pub fn with_modifiers<I, S>(mut self, modifiers: I) -> ChildRef
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.modifiers = modifiers.into_iter().map(Into::into).collect();
        self
    }
}

/// Handle to a [Symbol] held by a [SymbolRegistry].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SymbolId(pub usize);

#[derive(Debug, Clone, Default)]
pub struct Symbol {
    pub name: Option<String>,
    // Kinds in first-declaration order. Re-declaring a kind replaces its list in place.
    children_by_kind: Vec<(String, Vec<ChildRef>)>,
    children: Vec<ChildRef>,
    finished: bool,
}

impl Symbol {
    pub fn new(name: Option<String>) -> Symbol {
        Symbol {
            name,
            ..Default::default()
        }
    }

    pub fn add_children(&mut self, kind: &str, children: Vec<ChildRef>) -> &mut Self {
        if let Some(entry) = self.children_by_kind.iter_mut().find(|(k, _)| k == kind) {
            entry.1 = children;
        } else {
            self.children_by_kind.push((kind.to_string(), children));
        }
        self
    }

    /// Flattens the per-kind lists into [Symbol::children]. Returns false, leaving the
    /// flattened list untouched, if the symbol was already finished.
    pub fn finish(&mut self) -> bool {
        if self.finished {
            return false;
        }
        self.children = self
            .children_by_kind
            .iter()
            .flat_map(|(_, list)| list.iter().cloned())
            .collect();
        self.finished = true;
        true
    }

    pub fn set_inherited(&mut self) {
        for child in self.children.iter_mut() {
            child.inherited = true;
        }
        for (_, list) in self.children_by_kind.iter_mut() {
            for child in list.iter_mut() {
                child.inherited = true;
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Flattened children. Empty until [Symbol::finish] runs.
    pub fn children(&self) -> &[ChildRef] {
        &self.children
    }

    pub fn children_by_kind(&self) -> &[(String, Vec<ChildRef>)] {
        &self.children_by_kind
    }

    pub fn kind(&self, kind: &str) -> Option<&[ChildRef]> {
        self.children_by_kind
            .iter()
            .find(|(k, _)| k == kind)
            .map(|(_, list)| list.as_slice())
    }
}

/// Every symbol registered during one page view.
///
/// Symbols live in an arena addressed by [SymbolId]; `by_name` only indexes the out-of-line
/// ones. The inline symbol describes the page itself and is never an inheritance target.
#[derive(Debug, Clone, Default)]
pub struct SymbolRegistry {
    symbols: Vec<Symbol>,
    by_name: BTreeMap<String, SymbolId>,
}

impl SymbolRegistry {
    /// Returns the handle and whether the symbol was added to the name index.
    pub fn register(&mut self, name: Option<&str>, is_inline: bool) -> (SymbolId, bool) {
        let id = SymbolId(self.symbols.len());
        self.symbols.push(Symbol::new(name.map(str::to_string)));
        match name {
            Some(name) if !is_inline && !name.is_empty() => {
                if let Some(previous) = self.by_name.insert(name.to_string(), id) {
                    tracing::debug!(
                        "[SymbolRegistry] {name:?} registered again, {previous:?} replaced by {id:?}"
                    );
                }
                (id, true)
            }
            _ => (id, false),
        }
    }

    pub fn get(&self, id: SymbolId) -> Result<&Symbol, NavError> {
        self.symbols.get(id.0).ok_or(NavError::UnknownSymbol(id.0))
    }

    pub fn get_mut(&mut self, id: SymbolId) -> Result<&mut Symbol, NavError> {
        self.symbols
            .get_mut(id.0)
            .ok_or(NavError::UnknownSymbol(id.0))
    }

    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.by_name.get(name).and_then(|id| self.symbols.get(id.0))
    }

    pub fn lookup_mut(&mut self, name: &str) -> Option<&mut Symbol> {
        let id = *self.by_name.get(name)?;
        self.symbols.get_mut(id.0)
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Out-of-line symbols in registration order. A symbol whose name was registered again
    /// later is skipped.
    pub fn named(&self) -> impl Iterator<Item = (&str, &Symbol)> + '_ {
        self.symbols.iter().enumerate().filter_map(|(idx, symbol)| {
            let name = symbol.name.as_deref()?;
            (self.by_name.get(name) == Some(&SymbolId(idx))).then_some((name, symbol))
        })
    }

    /// Number of symbols registered, inline ones included.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_inline_and_anonymous_symbols_are_not_indexed() {
        let mut reg = SymbolRegistry::default();
        let (_, indexed) = reg.register(Some("Page"), true);
        assert!(!indexed);
        let (_, indexed) = reg.register(None, false);
        assert!(!indexed);
        let (_, indexed) = reg.register(Some(""), false);
        assert!(!indexed);
        assert_eq!(reg.len(), 3);
        assert!(reg.lookup("Page").is_none());
        assert_eq!(reg.named().count(), 0);
    }

    #[test]
    fn test_last_registration_wins() {
        let mut reg = SymbolRegistry::default();
        let (first, _) = reg.register(Some("Stdio"), false);
        let (second, _) = reg.register(Some("Stdio"), false);
        assert_ne!(first, second);
        reg.get_mut(second)
            .unwrap()
            .add_children("class", vec![ChildRef::new("File", "Stdio/File.html")]);
        let found = reg.lookup("Stdio").unwrap();
        assert_eq!(found.kind("class").unwrap().len(), 1);
    }

    #[test]
    fn test_named_follows_registration_order() {
        let mut reg = SymbolRegistry::default();
        reg.register(Some("Stdio"), false);
        reg.register(Some("Array"), false);
        reg.register(Some("Page"), true);
        let (latest, _) = reg.register(Some("Stdio"), false);
        let named: Vec<&str> = reg.named().map(|(name, _)| name).collect();
        assert_eq!(named, vec!["Array", "Stdio"]);
        assert!(std::ptr::eq(
            reg.named().last().unwrap().1,
            reg.get(latest).unwrap()
        ));
    }

    #[test]
    fn test_add_children_overwrites_same_kind() {
        let mut sym = Symbol::new(Some("A".to_string()));
        sym.add_children("method", vec![ChildRef::new("a", "x"), ChildRef::new("b", "x")])
            .add_children("member", vec![ChildRef::new("m", "x")])
            .add_children("method", vec![ChildRef::new("c", "x")]);
        // "method" keeps its original position
        let kinds: Vec<&str> = sym
            .children_by_kind()
            .iter()
            .map(|(k, _)| k.as_str())
            .collect();
        assert_eq!(kinds, vec!["method", "member"]);
        assert!(sym.finish());
        let names: Vec<&str> = sym.children().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["c", "m"]);
    }

    #[test]
    fn test_finish_flattens_union_once() {
        let mut sym = Symbol::new(Some("A".to_string()));
        sym.add_children("member", vec![ChildRef::new("m1", "a"), ChildRef::new("m2", "a")]);
        sym.add_children("method", vec![ChildRef::new("f", "a")]);
        assert!(sym.children().is_empty());
        assert!(sym.finish());
        assert_eq!(sym.children().len(), 3);

        // Late additions do not leak into the flattened list
        sym.add_children("enum", vec![ChildRef::new("E", "a")]);
        assert!(!sym.finish());
        assert_eq!(sym.children().len(), 3);
    }

    #[test]
    fn test_set_inherited_marks_all_views() {
        let mut sym = Symbol::new(Some("A".to_string()));
        sym.add_children("method", vec![ChildRef::new("foo", "a.html")]);
        sym.finish();
        sym.set_inherited();
        assert!(sym.children().iter().all(|c| c.inherited));
        assert!(sym.kind("method").unwrap().iter().all(|c| c.inherited));
    }

    #[test]
    fn test_unknown_handle() {
        let reg = SymbolRegistry::default();
        assert_eq!(reg.get(SymbolId(4)).unwrap_err(), NavError::UnknownSymbol(4));
    }

    #[test]
    fn test_child_ref_json_shape() {
        let child: ChildRef =
            serde_json::from_str(r#"{"name":"create","link":"a.html","modifiers":["protected"]}"#)
                .unwrap();
        assert!(!child.inherited);
        assert_eq!(child.modifiers, vec!["protected".to_string()]);
        let json = serde_json::to_string(&ChildRef::new("x", "y")).unwrap();
        assert_eq!(json, r#"{"name":"x","link":"y"}"#);
    }
}
