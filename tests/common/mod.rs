//! Shared test utilities for integration tests.
//!
//! Import from integration test files as:
//! ```ignore
//! mod common;
//! ```

use std::path::PathBuf;
use tempfile::TempDir;

/// Initialize tracing for tests, respecting RUST_LOG env var.
#[allow(dead_code)]
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

/// Lay out a small documentation tree of JSON fragments:
///
/// - `predef/index.json`: the `predef` module, listing the `Stdio` module and a `write`
///   method, and loading `predef/Stdio/index.json`
/// - `predef/Stdio/index.json`: the `Stdio` module with classes `File` and `Buffer`
/// - `predef/Stdio/Stream.json`: `Stdio.Stream`, a base class of `File`
///
/// Returns the documentation root.
#[allow(dead_code)]
pub fn create_fragment_tree(temp_dir: &TempDir) -> PathBuf {
    let root = temp_dir.path().join("html");
    std::fs::create_dir_all(root.join("predef/Stdio")).unwrap();

    let predef = r#"[
  { "register": { "name": "predef" } },
  { "add_children": { "kind": "module", "children": [
      { "name": "Stdio", "link": "predef/Stdio.html" } ] } },
  { "add_children": { "kind": "method", "children": [
      { "name": "write", "link": "predef/write.html", "modifiers": ["static"] } ] } },
  "finish",
  { "load": { "link": "predef/Stdio/index.json" } }
]"#;
    std::fs::write(root.join("predef/index.json"), predef).unwrap();

    let stdio = r#"[
  { "register": { "name": "Stdio" } },
  { "add_children": { "kind": "class", "children": [
      { "name": "File", "link": "predef/Stdio/File.html" },
      { "name": "Buffer", "link": "predef/Stdio/Buffer.html" } ] } },
  "finish"
]"#;
    std::fs::write(root.join("predef/Stdio/index.json"), stdio).unwrap();

    let stream = r#"[
  { "register": { "name": "Stdio.Stream" } },
  { "add_children": { "kind": "method", "children": [
      { "name": "read", "link": "predef/Stdio/Stream.html" },
      { "name": "create", "link": "predef/Stdio/Stream.html", "modifiers": ["protected"] } ] } },
  "finish"
]"#;
    std::fs::write(root.join("predef/Stdio/Stream.json"), stream).unwrap();

    root
}
