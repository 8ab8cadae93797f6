//! Browser bindings.
//!
//! In the browser the page injects fragment scripts itself, so [NavIndexWasm] wraps a
//! [NavContext] without a fragment source: fragment scripts call the registration methods
//! directly, the page drains `takeRequests()` to learn which scripts to inject, and reports each
//! finished script with `fragmentCompleted()`.
//!
//! ```javascript,ignore
//! import init, { NavIndexWasm } from './refdoc_nav.js';
//!
//! await init();
//! NavIndexWasm.initLogging();
//! const nav = new NavIndexWasm("predef/Stdio/File.html", 1700000000);
//!
//! // inside a fragment script
//! const id = nav.register("Stdio", false);
//! nav.addChildren(id, "class", [{ name: "File", link: "predef/Stdio/File.html" }]);
//! nav.finish(id);
//!
//! // page loader
//! nav.load("predef/Stdio/index.js", "top_level", []);
//! for (const req of nav.takeRequests()) {
//!     const script = document.createElement("script");
//!     script.src = req.resolved;
//!     script.onload = () => { nav.fragmentCompleted(req.resolved); paint(); };
//!     document.head.appendChild(script);
//! }
//! document.addEventListener("DOMContentLoaded", () => { nav.notifyDomReady(); paint(); });
//!
//! function paint() {
//!     const markup = nav.sidebarMarkup();
//!     if (markup) {
//!         document.getElementById("navbar").innerHTML = markup;
//!         requestAnimationFrame(() => nav.finishPaint());
//!     }
//! }
//! ```
//!
//! Values crossing into JavaScript go through `serde_wasm_bindgen`; `takeRequests()` returns an
//! Array of plain objects `{ link, resolved, tag }`.

use std::{cell::RefCell, sync::Arc};
use wasm_bindgen::prelude::*;
use web_sys::console;

use crate::{
    cache::SessionStore,
    config::NavConfig,
    context::NavContext,
    error::NavError,
    event::CompletionTag,
    paths::{absolute_href, adjust_link},
    symbol::{ChildRef, SymbolId},
};

/// `window.sessionStorage`, looked up on every access. Not used on `file://` pages, where
/// `location.hostname` is empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSessionStore;

impl WebSessionStore {
    fn storage() -> Result<web_sys::Storage, NavError> {
        web_sys::window()
            .ok_or_else(|| NavError::Cache("no window".to_string()))?
            .session_storage()
            .map_err(|e| NavError::Cache(format!("{e:?}")))?
            .ok_or_else(|| NavError::Cache("sessionStorage unavailable".to_string()))
    }
}

impl SessionStore for WebSessionStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, NavError> {
        WebSessionStore::storage()?
            .get_item(key)
            .map_err(|e| NavError::Cache(format!("{e:?}")))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), NavError> {
        WebSessionStore::storage()?
            .set_item(key, value)
            .map_err(|e| NavError::Cache(format!("{e:?}")))
    }

    fn remove_item(&self, key: &str) -> Result<(), NavError> {
        WebSessionStore::storage()?
            .remove_item(key)
            .map_err(|e| NavError::Cache(format!("{e:?}")))
    }
}

fn to_js(e: NavError) -> JsValue {
    let msg = format!("❌ {e}");
    console::error_1(&msg.clone().into());
    JsValue::from_str(&msg)
}

#[wasm_bindgen]
pub struct NavIndexWasm {
    inner: RefCell<NavContext>,
}

impl NavIndexWasm {
    fn with_config(config: NavConfig) -> NavIndexWasm {
        let hostname = web_sys::window()
            .and_then(|window| window.location().hostname().ok())
            .unwrap_or_default();
        let config = config.with_hostname(&hostname);
        let ctx = NavContext::new(config).with_session_store(Arc::new(WebSessionStore));
        NavIndexWasm {
            inner: RefCell::new(ctx),
        }
    }
}

#[wasm_bindgen]
impl NavIndexWasm {
    /// Route `tracing` output to the browser console. Safe to call more than once.
    #[wasm_bindgen(js_name = initLogging)]
    pub fn init_logging() {
        if tracing_wasm::try_set_as_global_default().is_err() {
            console::debug_1(&"tracing already initialized".into());
        }
    }

    /// `publish_time` is in seconds since the unix epoch.
    #[wasm_bindgen(constructor)]
    pub fn new(current_link: Option<String>, publish_time: f64) -> NavIndexWasm {
        let config = NavConfig {
            current_link,
            publish_time: publish_time as i64,
            ..Default::default()
        };
        NavIndexWasm::with_config(config)
    }

    /// Build from a TOML page configuration.
    #[wasm_bindgen(js_name = fromToml)]
    pub fn from_toml(config: &str) -> Result<NavIndexWasm, JsValue> {
        let config = NavConfig::from_toml_str(config).map_err(to_js)?;
        Ok(NavIndexWasm::with_config(config))
    }

    pub fn register(&self, name: Option<String>, inline: bool) -> usize {
        self.inner.borrow_mut().register(name.as_deref(), inline).0
    }

    /// `children` is an Array of `{ name, link, inherited?, modifiers? }`.
    #[wasm_bindgen(js_name = addChildren)]
    pub fn add_children(&self, id: usize, kind: &str, children: JsValue) -> Result<(), JsValue> {
        let children: Vec<ChildRef> =
            serde_wasm_bindgen::from_value(children).map_err(|e| to_js(e.into()))?;
        self.inner
            .borrow_mut()
            .add_children(SymbolId(id), kind, children)
            .map_err(to_js)
    }

    pub fn finish(&self, id: usize) -> Result<(), JsValue> {
        self.inner.borrow_mut().finish(SymbolId(id)).map_err(to_js)
    }

    #[wasm_bindgen(js_name = requestInherit)]
    pub fn request_inherit(&self, target: &str) {
        self.inner.borrow_mut().request_inherit(target);
    }

    /// `tag` is `undefined`, `"top_level"` or `{ symbol: "Name" }`.
    pub fn load(&self, link: &str, tag: JsValue, inherits: Vec<String>) -> Result<(), JsValue> {
        let tag: Option<CompletionTag> =
            serde_wasm_bindgen::from_value(tag).map_err(|e| to_js(e.into()))?;
        self.inner.borrow_mut().load(link, tag, &inherits);
        Ok(())
    }

    #[wasm_bindgen(js_name = takeRequests)]
    pub fn take_requests(&self) -> Result<JsValue, JsValue> {
        let requests = self.inner.borrow_mut().take_requests();
        serde_wasm_bindgen::to_value(&requests).map_err(|e| to_js(e.into()))
    }

    #[wasm_bindgen(js_name = fragmentCompleted)]
    pub fn fragment_completed(&self, resolved: &str) {
        self.inner.borrow_mut().fragment_completed(resolved);
    }

    #[wasm_bindgen(js_name = finishCheck)]
    pub fn finish_check(&self) {
        self.inner.borrow_mut().finish_check();
    }

    #[wasm_bindgen(js_name = notifyDomReady)]
    pub fn notify_dom_ready(&self) {
        self.inner.borrow_mut().notify_dom_ready();
    }

    #[wasm_bindgen(js_name = finishPaint)]
    pub fn finish_paint(&self) {
        self.inner.borrow_mut().finish_paint();
    }

    /// The sidebar wrapped in its container, once rendered or restored from the cache.
    #[wasm_bindgen(js_name = sidebarMarkup)]
    pub fn sidebar_markup(&self) -> Option<String> {
        self.inner.borrow().sidebar().map(|sidebar| sidebar.markup())
    }

    #[wasm_bindgen(js_name = isRendered)]
    pub fn is_rendered(&self) -> bool {
        self.inner.borrow().sidebar().is_some()
    }

    #[wasm_bindgen(js_name = adjustLink)]
    pub fn adjust_link(current: &str, link: &str) -> String {
        adjust_link(current, link)
    }

    #[wasm_bindgen(js_name = absoluteHref)]
    pub fn absolute_href(origin: &str, current: &str, link: &str) -> Result<String, JsValue> {
        absolute_href(origin, current, link).map_err(to_js)
    }
}
