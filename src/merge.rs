use std::collections::BTreeMap;

use crate::symbol::ChildRef;

/// Merge two lists of children of the same kind. If a name exists in both `old` and `new` the
/// entry from `new` wins. The result holds one entry per name, ordered by byte-wise comparison
/// of the names.
///
/// Called once per kind for every symbol when the type buckets are materialized, so the
/// accumulated `old` side keeps growing; merging the same `new` list twice changes nothing.
#[tracing::instrument(level = "trace", skip_all, fields(old = old.len(), new = new.len()))]
pub fn merge_children(old: Vec<ChildRef>, new: &[ChildRef]) -> Vec<ChildRef> {
    let mut by_name: BTreeMap<String, ChildRef> = old
        .into_iter()
        .map(|child| (child.name.clone(), child))
        .collect();
    for child in new {
        by_name.insert(child.name.clone(), child.clone());
    }
    by_name.into_values().collect()
}
