//! Fragment loading.
//!
//! A fragment is one unit of index data: executing it registers a symbol with the
//! [NavContext], lists its children, and may ask for further fragments. How fragments are
//! obtained is the business of a [FragmentSource]; the engine only needs "fetch this link,
//! then let me execute what came back".
//!
//! ## Fragment format
//!
//! The bundled sources read [FragmentScript]s, a JSON array of registration calls:
//!
//! ```json
//! [
//!   { "register": { "name": "Stdio.File" } },
//!   { "add_children": { "kind": "method", "children": [
//!       { "name": "read", "link": "predef/Stdio/File.html" } ] } },
//!   "finish",
//!   { "load": { "link": "predef/Stdio/Stream/index.json", "tag": { "symbol": "Stdio.Stream" } } }
//! ]
//! ```
//!
//! ## Host-driven loading
//!
//! Without a source attached, scheduled loads are parked for the host to pick up with
//! [crate::context::NavContext::take_requests]. The host performs the load however it likes
//! (the browser build injects a script element) and reports back through
//! [crate::context::NavContext::fragment_completed].
use async_trait::async_trait;
use futures::{
    future::BoxFuture,
    stream::{FuturesUnordered, StreamExt},
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, BTreeSet, VecDeque},
    sync::Arc,
};

use crate::{
    context::NavContext, error::NavError, event::CompletionTag, symbol::ChildRef,
    symbol::SymbolId,
};

/// A scheduled fragment load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadRequest {
    /// Root-relative link as given to [NavContext::load]
    pub link: String,
    /// Link relative to the current page. This is what a browser would fetch, and the key
    /// loads are deduplicated by.
    pub resolved: String,
    pub tag: Option<CompletionTag>,
}

pub trait Fragment: Send {
    fn execute(&self, ctx: &mut NavContext) -> Result<(), NavError>;
}

#[async_trait]
pub trait FragmentSource: Send + Sync {
    async fn fetch(&self, request: &LoadRequest) -> Result<Box<dyn Fragment>, NavError>;
}

/// One registration call made by a fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FragmentCall {
    Register {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        inline: bool,
    },
    /// Applies to the most recently registered symbol of the script
    AddChildren {
        kind: String,
        children: Vec<ChildRef>,
    },
    /// Applies to the most recently registered symbol of the script
    Finish,
    RequestInherit {
        target: String,
    },
    Load {
        link: String,
        #[serde(default)]
        tag: Option<CompletionTag>,
        #[serde(default)]
        inherits: Vec<String>,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FragmentScript {
    pub calls: Vec<FragmentCall>,
}

impl FragmentScript {
    pub fn new(calls: Vec<FragmentCall>) -> FragmentScript {
        FragmentScript { calls }
    }

    pub fn from_json(json: &str) -> Result<FragmentScript, NavError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Script of a fragment defining `name` with the given children, finishing it afterwards.
    pub fn symbol(name: &str, kinds: Vec<(&str, Vec<ChildRef>)>) -> FragmentScript {
        let mut calls = vec![FragmentCall::Register {
            name: Some(name.to_string()),
            inline: false,
        }];
        calls.extend(kinds.into_iter().map(|(kind, children)| FragmentCall::AddChildren {
            kind: kind.to_string(),
            children,
        }));
        calls.push(FragmentCall::Finish);
        FragmentScript { calls }
    }

    pub fn with_call(mut self, call: FragmentCall) -> FragmentScript {
        self.calls.push(call);
        self
    }
}

impl Fragment for FragmentScript {
    fn execute(&self, ctx: &mut NavContext) -> Result<(), NavError> {
        let mut current: Option<SymbolId> = None;
        let symbol = |current: Option<SymbolId>, call: &str| {
            current.ok_or_else(|| {
                NavError::Fragment(format!("'{call}' called before any symbol was registered"))
            })
        };
        for call in self.calls.iter() {
            match call {
                FragmentCall::Register { name, inline } => {
                    current = Some(ctx.register(name.as_deref(), *inline));
                }
                FragmentCall::AddChildren { kind, children } => {
                    ctx.add_children(symbol(current, "add_children")?, kind, children.clone())?;
                }
                FragmentCall::Finish => {
                    ctx.finish(symbol(current, "finish")?)?;
                }
                FragmentCall::RequestInherit { target } => ctx.request_inherit(target),
                FragmentCall::Load {
                    link,
                    tag,
                    inherits,
                } => ctx.load(link, tag.clone(), inherits),
            }
        }
        Ok(())
    }
}

/// In-memory [FragmentSource] keyed by root-relative link. Clones share scripts and
/// statistics.
#[derive(Debug, Clone, Default)]
pub struct MemoryFragmentSource {
    scripts: Arc<RwLock<BTreeMap<String, FragmentScript>>>,
    fetches: Arc<RwLock<BTreeMap<String, usize>>>,
}

impl MemoryFragmentSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, link: &str, script: FragmentScript) -> &Self {
        self.scripts.write().insert(link.to_string(), script);
        self
    }

    /// Number of fetches attempted for `link`, found or not.
    pub fn fetch_count(&self, link: &str) -> usize {
        self.fetches.read().get(link).copied().unwrap_or(0)
    }

    pub fn total_fetches(&self) -> usize {
        self.fetches.read().values().sum()
    }
}

#[async_trait]
impl FragmentSource for MemoryFragmentSource {
    async fn fetch(&self, request: &LoadRequest) -> Result<Box<dyn Fragment>, NavError> {
        *self.fetches.write().entry(request.link.clone()).or_insert(0) += 1;
        let script = self.scripts.read().get(&request.link).cloned();
        match script {
            Some(script) => Ok(Box::new(script)),
            None => Err(NavError::NotFound(format!("no fragment at {:?}", request.link))),
        }
    }
}

/// Reads [FragmentScript] JSON files below a documentation root.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone)]
pub struct FsFragmentSource {
    root: std::path::PathBuf,
}

#[cfg(not(target_arch = "wasm32"))]
impl FsFragmentSource {
    pub fn new(root: impl Into<std::path::PathBuf>) -> Self {
        FsFragmentSource { root: root.into() }
    }
}

#[cfg(not(target_arch = "wasm32"))]
#[async_trait]
impl FragmentSource for FsFragmentSource {
    async fn fetch(&self, request: &LoadRequest) -> Result<Box<dyn Fragment>, NavError> {
        let path = self.root.join(request.link.trim_start_matches('/'));
        tracing::debug!("[FsFragmentSource] reading {:?}", path);
        let content = tokio::fs::read_to_string(&path).await?;
        Ok(Box::new(FragmentScript::from_json(&content)?))
    }
}

pub(crate) type Fetched = (LoadRequest, Result<Box<dyn Fragment>, NavError>);

/// Load bookkeeping: which links were requested, how many are still outstanding, and the
/// fetches currently in flight.
#[derive(Default)]
pub struct FragmentLoader {
    source: Option<Arc<dyn FragmentSource>>,
    loaded: BTreeSet<String>,
    in_progress: BTreeMap<String, LoadRequest>,
    in_flight: FuturesUnordered<BoxFuture<'static, Fetched>>,
    handoff: VecDeque<LoadRequest>,
}

impl FragmentLoader {
    pub fn new(source: Option<Arc<dyn FragmentSource>>) -> FragmentLoader {
        FragmentLoader {
            source,
            ..Default::default()
        }
    }

    /// Schedules `request` unless its resolved link was requested before. Returns whether a
    /// load was scheduled.
    pub fn request(&mut self, request: LoadRequest) -> bool {
        if !self.loaded.insert(request.resolved.clone()) {
            return false;
        }
        self.in_progress
            .insert(request.resolved.clone(), request.clone());
        match self.source.as_ref() {
            Some(source) => {
                let source = source.clone();
                self.in_flight.push(Box::pin(async move {
                    let res = source.fetch(&request).await;
                    (request, res)
                }));
            }
            None => self.handoff.push_back(request),
        }
        true
    }

    /// Waits for the next in-flight fetch, in whatever order they finish. None when nothing
    /// is in flight.
    pub(crate) async fn next_fetched(&mut self) -> Option<Fetched> {
        self.in_flight.next().await
    }

    /// Marks the load of `resolved` as complete, returning its request. Unknown or already
    /// completed links return None and leave the count untouched.
    pub fn complete(&mut self, resolved: &str) -> Option<LoadRequest> {
        self.in_progress.remove(resolved)
    }

    /// Loads parked for the host (no source attached).
    pub fn take_requests(&mut self) -> Vec<LoadRequest> {
        self.handoff.drain(..).collect()
    }

    pub fn outstanding(&self) -> usize {
        self.in_progress.len()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn is_loaded(&self, resolved: &str) -> bool {
        self.loaded.contains(resolved)
    }

    pub fn loaded(&self) -> &BTreeSet<String> {
        &self.loaded
    }
}

impl std::fmt::Debug for FragmentLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FragmentLoader")
            .field("has_source", &self.source.is_some())
            .field("loaded", &self.loaded)
            .field("outstanding", &self.outstanding())
            .field("in_flight", &self.in_flight.len())
            .field("handoff", &self.handoff)
            .finish()
    }
}
