use crate::symbol::SymbolRegistry;

/// Queue of "mark this symbol's children as inherited" requests whose target may not have
/// been loaded yet.
///
/// Fragments load in no particular order, so a request can arrive before, or after, the
/// fragment that defines its target. [InheritanceResolver::reevaluate] is cheap and
/// idempotent; the context calls it after every symbol finish and every fragment completion.
#[derive(Debug, Clone, Default)]
pub struct InheritanceResolver {
    pending: Vec<String>,
    targets: Vec<String>,
}

impl InheritanceResolver {
    pub fn request_inherit(&mut self, target: &str) {
        if !self.pending.iter().any(|p| p == target) {
            self.pending.push(target.to_string());
        }
    }

    /// Records inheritance edges announced alongside a fragment load. Bookkeeping only.
    pub fn add_inherit_targets<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.targets.extend(names.into_iter().map(Into::into));
    }

    /// Marks every pending target that is now registered and finished, and drops it from the
    /// queue. Returns the names resolved by this call, in request order.
    ///
    /// A registered but unfinished target stays pending: its children are not complete yet.
    pub fn reevaluate(&mut self, registry: &mut SymbolRegistry) -> Vec<String> {
        let mut resolved = Vec::new();
        self.pending.retain(|name| match registry
            .lookup_mut(name)
            .filter(|symbol| symbol.is_finished())
        {
            Some(symbol) => {
                symbol.set_inherited();
                resolved.push(name.clone());
                false
            }
            None => true,
        });
        if !resolved.is_empty() {
            tracing::debug!(
                "[InheritanceResolver] resolved {:?}, {} still pending",
                resolved,
                self.pending.len()
            );
        }
        resolved
    }

    pub fn pending(&self) -> &[String] {
        &self.pending
    }

    pub fn is_settled(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn inherit_targets(&self) -> &[String] {
        &self.targets
    }
}
