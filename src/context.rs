//! The aggregation context: everything one page view knows about its navigation index.
//!
//! [NavContext] owns the symbol registry, the pending inheritance queue, load bookkeeping
//! and the session cache, and decides when the sidebar may be rendered. Three signals gate
//! rendering:
//!
//! 1. the DOM is ready ([NavContext::notify_dom_ready]),
//! 2. a global finish-check found no pending inheritance request, or the queue drained after
//!    a finish-check had to wait for it,
//! 3. no fragment load is outstanding.
//!
//! The gate is re-checked after every event that can flip one of them (DOM ready, each
//! fragment completion, each symbol finish) and fires at most once per context. Fragment
//! completions arrive in any order; the engine itself is single threaded and mutated only
//! through `&mut self`.
//!
//! ```rust
//! use refdoc_nav::{
//!     config::NavConfig,
//!     context::{NavContext, NavOutcome},
//!     event::CompletionTag,
//!     loader::{FragmentScript, MemoryFragmentSource},
//!     symbol::ChildRef,
//! };
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let source = MemoryFragmentSource::new();
//! source.insert(
//!     "predef/index.json",
//!     FragmentScript::symbol(
//!         "predef",
//!         vec![("method", vec![ChildRef::new("write", "predef/write.html")])],
//!     ),
//! );
//!
//! let mut ctx = NavContext::new(NavConfig::for_page("predef/Array.html"))
//!     .with_source(Arc::new(source));
//! ctx.load("predef/index.json", Some(CompletionTag::TopLevel), &[]);
//! ctx.notify_dom_ready();
//!
//! match ctx.run_until_idle().await {
//!     NavOutcome::Rendered(sidebar) => assert!(sidebar.body.contains("write()")),
//!     other => panic!("expected a sidebar, got {other:?}"),
//! }
//! # }
//! ```
use std::{collections::BTreeMap, sync::Arc};
use tokio::sync::mpsc::UnboundedSender;

use crate::{
    cache::{Clock, SessionCache, SessionStore, SystemClock},
    config::NavConfig,
    error::NavError,
    event::{CompletionTag, NavEvent, SkipReason},
    inherit::InheritanceResolver,
    loader::{FragmentLoader, FragmentSource, LoadRequest},
    merge::merge_children,
    paths::adjust_link,
    render::{NavTree, Sidebar},
    symbol::{ChildRef, Symbol, SymbolId, SymbolRegistry},
};

/// Where a page view stands once no more fetches are in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavOutcome {
    /// Aggregated from fragments in this page view
    Rendered(Sidebar),
    /// Taken verbatim from the session cache
    Cached(Sidebar),
    /// The gate never opened: a fragment failed or never arrived, an inheritance target was
    /// never defined, or the DOM is not ready yet.
    Pending {
        outstanding: usize,
        pending_inheritance: Vec<String>,
        dom_ready: bool,
    },
}

type DomReadyCallback = Box<dyn FnOnce() + Send>;

pub struct NavContext {
    config: NavConfig,
    registry: SymbolRegistry,
    resolver: InheritanceResolver,
    loader: FragmentLoader,
    cache: SessionCache,
    clock: Arc<dyn Clock>,
    tx: Option<UnboundedSender<NavEvent>>,
    dom_ready_queue: Vec<DomReadyCallback>,
    dom_ready: bool,
    all_registered: bool,
    // A finish-check found pending inheritance; it completes once the queue drains.
    finish_deferred: bool,
    rendered: bool,
    type_buckets: BTreeMap<String, Vec<ChildRef>>,
    tree: Option<NavTree>,
    sidebar: Option<Sidebar>,
}

impl NavContext {
    /// A context with no fragment source (host-driven loading), no session cache and the
    /// system clock.
    pub fn new(config: NavConfig) -> NavContext {
        NavContext {
            config,
            registry: SymbolRegistry::default(),
            resolver: InheritanceResolver::default(),
            loader: FragmentLoader::new(None),
            cache: SessionCache::disabled(),
            clock: Arc::new(SystemClock),
            tx: None,
            dom_ready_queue: Vec::new(),
            dom_ready: false,
            all_registered: false,
            finish_deferred: false,
            rendered: false,
            type_buckets: BTreeMap::new(),
            tree: None,
            sidebar: None,
        }
    }

    /// Fetch fragments through `source`. Must be attached before the first [NavContext::load].
    pub fn with_source(mut self, source: Arc<dyn FragmentSource>) -> Self {
        self.loader = FragmentLoader::new(Some(source));
        self
    }

    /// Cache the rendered sidebar in `store`. Ignored when the configuration disables caching.
    pub fn with_session_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        let store = self.config.cache_enabled.then_some(store);
        self.cache = SessionCache::new(
            store,
            self.config.current_link.as_deref(),
            &self.config.root_page,
            self.config.publish_time,
        );
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_event_sender(mut self, tx: UnboundedSender<NavEvent>) -> Self {
        self.tx = Some(tx);
        self
    }

    fn emit(&self, event: NavEvent) {
        if let Some(tx) = self.tx.as_ref() {
            if let Err(e) = tx.send(event).map_err(NavError::from) {
                tracing::debug!("[NavContext] {e}");
            }
        }
    }

    /// Registers a symbol. Inline symbols (the page's own) and anonymous ones are created but
    /// cannot be looked up by name.
    pub fn register(&mut self, name: Option<&str>, is_inline: bool) -> SymbolId {
        let (id, indexed) = self.registry.register(name, is_inline);
        tracing::debug!("[NavContext] register {name:?} inline={is_inline} -> {id:?}");
        if let (true, Some(name)) = (indexed, name) {
            self.emit(NavEvent::SymbolRegistered(name.to_string()));
        }
        id
    }

    pub fn add_children(
        &mut self,
        id: SymbolId,
        kind: &str,
        children: Vec<ChildRef>,
    ) -> Result<(), NavError> {
        self.registry.get_mut(id)?.add_children(kind, children);
        Ok(())
    }

    /// Flattens the symbol's children, then retries pending inheritance requests and the
    /// render gate.
    pub fn finish(&mut self, id: SymbolId) -> Result<(), NavError> {
        let symbol = self.registry.get_mut(id)?;
        if symbol.finish() {
            let name = symbol.name.clone();
            self.emit(NavEvent::SymbolFinished(name));
        } else {
            tracing::debug!(
                "[NavContext] {:?} ({id:?}) already finished, keeping its children",
                symbol.name
            );
        }
        self.reevaluate();
        self.maybe_render();
        Ok(())
    }

    /// Asks for every child of `target` to be marked inherited, now or once it is registered.
    pub fn request_inherit(&mut self, target: &str) {
        self.resolver.request_inherit(target);
        self.reevaluate();
        self.maybe_render();
    }

    pub fn add_inherit_targets(&mut self, names: &[String]) {
        self.resolver.add_inherit_targets(names.iter().cloned());
    }

    /// Applies every pending inheritance request whose target now exists. Completes a deferred
    /// finish-check once nothing is pending any more.
    pub fn reevaluate(&mut self) -> Vec<String> {
        let resolved = self.resolver.reevaluate(&mut self.registry);
        for name in resolved.iter() {
            self.emit(NavEvent::InheritResolved(name.clone()));
        }
        if self.finish_deferred && self.resolver.is_settled() {
            tracing::debug!("[NavContext] deferred finish-check completed");
            self.finish_deferred = false;
            self.all_registered = true;
        }
        resolved
    }

    /// Requests the fragment at root-relative `link`.
    ///
    /// Skipped entirely when a valid cached sidebar exists for this page, and a no-op when
    /// the resolved link was requested before.
    pub fn load(&mut self, link: &str, tag: Option<CompletionTag>, inherits: &[String]) {
        if self.cache.has_cache() {
            tracing::debug!("[NavContext] cached sidebar available, not loading {link:?}");
            self.emit(NavEvent::LoadSkipped(link.to_string(), SkipReason::Cached));
            return;
        }

        let resolved = adjust_link(self.config.page_link(), link);
        if self.loader.is_loaded(&resolved) {
            tracing::debug!("[NavContext] already loaded: {resolved:?}");
            self.emit(NavEvent::LoadSkipped(resolved, SkipReason::AlreadyLoaded));
            return;
        }

        if !inherits.is_empty() {
            self.add_inherit_targets(inherits);
        }
        tracing::debug!("[NavContext] load {resolved:?} tag={tag:?}");
        self.loader.request(LoadRequest {
            link: link.to_string(),
            resolved: resolved.clone(),
            tag: tag.clone(),
        });
        self.emit(NavEvent::LoadRequested(resolved, tag));
    }

    /// Loads waiting for the host to perform them. Only populated without a fragment source.
    pub fn take_requests(&mut self) -> Vec<LoadRequest> {
        self.loader.take_requests()
    }

    /// Reports that the fragment at `resolved` has been fetched and executed.
    pub fn fragment_completed(&mut self, resolved: &str) {
        let Some(request) = self.loader.complete(resolved) else {
            tracing::warn!("[NavContext] completion for {resolved:?}, which is not loading");
            return;
        };
        self.emit(NavEvent::FragmentCompleted(request.resolved.clone()));
        match request.tag {
            Some(CompletionTag::Symbol(name)) => {
                self.resolver.request_inherit(&name);
                self.reevaluate();
            }
            Some(CompletionTag::TopLevel) | None => self.sweep(),
        }
        self.maybe_render();
    }

    /// Global finish-check: once no inheritance request is pending, all fragments count as
    /// registered.
    pub fn finish_check(&mut self) {
        self.sweep();
        self.maybe_render();
    }

    fn sweep(&mut self) {
        self.reevaluate();
        if self.resolver.is_settled() {
            self.all_registered = true;
        } else {
            self.finish_deferred = true;
            tracing::debug!(
                "[NavContext] finish-check deferred, waiting on {:?}",
                self.resolver.pending()
            );
        }
    }

    /// Queues `callback` for DOM ready, or runs it right away if that already happened.
    pub fn on_dom_ready(&mut self, callback: impl FnOnce() + Send + 'static) {
        if self.dom_ready {
            callback();
        } else {
            self.dom_ready_queue.push(Box::new(callback));
        }
    }

    pub fn notify_dom_ready(&mut self) {
        if self.dom_ready {
            return;
        }
        self.dom_ready = true;
        for callback in std::mem::take(&mut self.dom_ready_queue) {
            callback();
        }

        if self.sidebar.is_none() && self.cache.has_cache() {
            if let Some(body) = self.cache.cached_body() {
                tracing::info!("[NavContext] using cached sidebar for {:?}", self.cache.key());
                self.sidebar = Some(Sidebar::new(body.to_string(), true));
                self.emit(NavEvent::Rendered(true));
            }
        }
        self.maybe_render();
    }

    /// The host painted the sidebar; drop its `init` state class.
    pub fn finish_paint(&mut self) {
        if let Some(sidebar) = self.sidebar.as_mut() {
            sidebar.initializing = false;
        }
    }

    pub fn is_ready(&self) -> bool {
        self.dom_ready
            && self.all_registered
            && self.resolver.is_settled()
            && self.loader.outstanding() == 0
    }

    fn maybe_render(&mut self) {
        tracing::trace!(
            "[NavContext] maybe_render all_registered={} dom_ready={} outstanding={} pending={}",
            self.all_registered,
            self.dom_ready,
            self.loader.outstanding(),
            self.resolver.pending().len()
        );
        // A sidebar restored from the cache stays in place.
        if !self.rendered && self.sidebar.is_none() && self.is_ready() {
            self.render();
        }
    }

    fn render(&mut self) {
        self.rendered = true;

        let mut buckets: BTreeMap<String, Vec<ChildRef>> = BTreeMap::new();
        for (_, symbol) in self.registry.named() {
            for (kind, children) in symbol.children_by_kind() {
                let merged = merge_children(buckets.remove(kind).unwrap_or_default(), children);
                buckets.insert(kind.clone(), merged);
            }
        }

        let tree = NavTree::build(&buckets, &self.config.categories, self.config.page_link());
        let body = tree.to_markup();
        if let Err(e) = self.cache.store(&body, self.clock.now_millis()) {
            tracing::warn!("[NavContext] could not cache sidebar: {e}");
        }
        tracing::info!(
            "[NavContext] rendered {} sections from {} symbols",
            tree.sections.len(),
            self.registry.named().count()
        );

        self.type_buckets = buckets;
        self.tree = Some(tree);
        self.sidebar = Some(Sidebar::new(body, false));
        self.emit(NavEvent::Rendered(false));
    }

    /// Completes one in-flight fetch: executes the fragment and records its completion.
    /// Returns false when nothing is in flight.
    ///
    /// A fragment that cannot be fetched or executed is logged and its load stays
    /// outstanding, so the sidebar will not render for this page view.
    pub async fn step(&mut self) -> bool {
        let Some((request, fetched)) = self.loader.next_fetched().await else {
            return false;
        };
        match fetched.and_then(|fragment| fragment.execute(self)) {
            Ok(()) => self.fragment_completed(&request.resolved),
            Err(e) => {
                tracing::warn!(
                    "[NavContext] fragment {:?} failed, navigation will not render: {e}",
                    request.resolved
                );
                self.emit(NavEvent::FragmentFailed(request.resolved, e.to_string()));
            }
        }
        true
    }

    /// Drives fetches until none are in flight.
    pub async fn run_until_idle(&mut self) -> NavOutcome {
        while self.step().await {}
        self.outcome()
    }

    pub fn outcome(&self) -> NavOutcome {
        match self.sidebar.as_ref() {
            Some(sidebar) if sidebar.from_cache => NavOutcome::Cached(sidebar.clone()),
            Some(sidebar) => NavOutcome::Rendered(sidebar.clone()),
            None => NavOutcome::Pending {
                outstanding: self.loader.outstanding(),
                pending_inheritance: self.resolver.pending().to_vec(),
                dom_ready: self.dom_ready,
            },
        }
    }

    pub fn config(&self) -> &NavConfig {
        &self.config
    }

    pub fn symbol(&self, id: SymbolId) -> Result<&Symbol, NavError> {
        self.registry.get(id)
    }

    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.registry.lookup(name)
    }

    pub fn registry(&self) -> &SymbolRegistry {
        &self.registry
    }

    pub fn pending_inheritance(&self) -> &[String] {
        self.resolver.pending()
    }

    pub fn inherit_targets(&self) -> &[String] {
        self.resolver.inherit_targets()
    }

    pub fn outstanding_loads(&self) -> usize {
        self.loader.outstanding()
    }

    pub fn is_loaded(&self, resolved: &str) -> bool {
        self.loader.is_loaded(resolved)
    }

    pub fn is_dom_ready(&self) -> bool {
        self.dom_ready
    }

    pub fn is_rendered(&self) -> bool {
        self.rendered
    }

    /// Merged children per kind. Empty until the sidebar is rendered.
    pub fn type_buckets(&self) -> &BTreeMap<String, Vec<ChildRef>> {
        &self.type_buckets
    }

    pub fn tree(&self) -> Option<&NavTree> {
        self.tree.as_ref()
    }

    pub fn sidebar(&self) -> Option<&Sidebar> {
        self.sidebar.as_ref()
    }

    pub fn cache(&self) -> &SessionCache {
        &self.cache
    }
}

impl std::fmt::Debug for NavContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NavContext")
            .field("page", &self.config.current_link)
            .field("symbols", &self.registry.len())
            .field("pending", &self.resolver.pending())
            .field("loader", &self.loader)
            .field("cache", &self.cache)
            .field("dom_ready", &self.dom_ready)
            .field("all_registered", &self.all_registered)
            .field("finish_deferred", &self.finish_deferred)
            .field("rendered", &self.rendered)
            .finish()
    }
}
