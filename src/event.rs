use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// What a finished fragment load should trigger once the fragment has executed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionTag {
    /// The page's top-level index fragment. Runs the global finish-check.
    TopLevel,
    /// A fragment defining an inherited base symbol. Its children get marked inherited.
    Symbol(String),
}

/// Why a [crate::context::NavContext::load] call did not schedule a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// A valid session cache entry already covers this page.
    Cached,
    /// The resolved link was requested earlier in this page view.
    AlreadyLoaded,
}

/// Progress notifications emitted by [crate::context::NavContext] when an event sender is
/// attached. Observers get the same view of the aggregation the engine logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NavEvent {
    /// Name of an out-of-line symbol added to the lookup table
    SymbolRegistered(String),
    /// Symbol name (if any) whose children were flattened
    SymbolFinished(Option<String>),
    /// Pending inheritance target whose children are now marked
    InheritResolved(String),
    /// Resolved link, completion tag
    LoadRequested(String, Option<CompletionTag>),
    LoadSkipped(String, SkipReason),
    FragmentCompleted(String),
    /// Resolved link, failure message
    FragmentFailed(String, String),
    /// The sidebar is in place. `true` when it came from the session cache.
    Rendered(bool),
}

impl Display for NavEvent {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            NavEvent::SymbolRegistered(_) => write!(f, "SymbolRegistered"),
            NavEvent::SymbolFinished(_) => write!(f, "SymbolFinished"),
            NavEvent::InheritResolved(_) => write!(f, "InheritResolved"),
            NavEvent::LoadRequested(_, _) => write!(f, "LoadRequested"),
            NavEvent::LoadSkipped(_, _) => write!(f, "LoadSkipped"),
            NavEvent::FragmentCompleted(_) => write!(f, "FragmentCompleted"),
            NavEvent::FragmentFailed(_, _) => write!(f, "FragmentFailed"),
            NavEvent::Rendered(_) => write!(f, "Rendered"),
        }
    }
}
