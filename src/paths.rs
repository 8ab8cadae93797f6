//! Relative link arithmetic between the page being viewed and the fragment/child links
//! recorded in the index.
//!
//! Every link stored in a fragment is relative to the documentation root (for example
//! `predef/Stdio/File.html`), while the browser resolves hrefs and script sources against the
//! location of the current page. [adjust_link] bridges the two.
use url::Url;

use crate::error::NavError;

/// Returns the directory portion of `path`, i.e. everything before the last `/`.
///
/// A path without a separator, or whose only separator is the leading one, has no basedir.
pub fn basedir(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) if idx >= 1 => &path[..idx],
        _ => "",
    }
}

/// Check if `other` starts with `prefix`
pub fn has_prefix(prefix: &str, other: &str) -> bool {
    other.starts_with(prefix)
}

/// Rewrites the root-relative `link` so that it resolves correctly from `current`.
///
/// Walks up from the directory of `current` until reaching a directory that also contains
/// `link`, emitting one `../` per step, then appends `link` with that common directory
/// stripped. When `link` already lives under the directory of `current` no parent steps are
/// added.
///
/// ```
/// use refdoc_nav::paths::adjust_link;
///
/// assert_eq!(adjust_link("predef/Stdio/File.html", "predef/Stdio/Port.html"), "Port.html");
/// assert_eq!(adjust_link("predef/Stdio/File.html", "predef/Array.html"), "../Array.html");
/// assert_eq!(adjust_link("predef/Stdio/File.html", "index.js"), "../../index.js");
/// ```
#[tracing::instrument(level = "trace")]
pub fn adjust_link(current: &str, link: &str) -> String {
    let mut reldir = basedir(current);
    let mut dots = String::new();
    while !reldir.is_empty() && !has_prefix(&format!("{reldir}/"), link) {
        dots.push_str("../");
        reldir = basedir(reldir);
    }
    let tail = if reldir.is_empty() {
        link
    } else {
        &link[reldir.len() + 1..]
    };
    format!("{dots}{tail}")
}

/// Absolute URL of `link` as a browser would compute it from the href [adjust_link] emits on
/// page `current`. `origin` is the documentation root and should end with `/`.
pub fn absolute_href(origin: &str, current: &str, link: &str) -> Result<String, NavError> {
    let page = Url::parse(origin)?.join(current)?;
    Ok(page.join(&adjust_link(current, link))?.as_str().to_string())
}
