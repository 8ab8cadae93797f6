//! Sidebar rendering.
//!
//! [NavTree] is the structured form of the sidebar: one [NavSection] per configured category
//! that has children. [NavTree::to_markup] turns it into the HTML body the page inserts into
//! its navbar container, and that body is also what the session cache stores.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{config::Category, paths::adjust_link, symbol::ChildRef};

/// Children named like this are constructors; modifier styling is not applied to them.
const CONSTRUCTOR_NAME: &str = "create";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavEntry {
    /// Display text, the child name plus the category suffix
    pub text: String,
    /// Link relative to the current page. None for the entry describing the page itself.
    pub href: Option<String>,
    /// Entries defined by the symbol itself are bold, inherited ones are not.
    pub bold: bool,
    pub classes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavSection {
    pub kind: String,
    pub heading: String,
    pub entries: Vec<NavEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavTree {
    pub sections: Vec<NavSection>,
}

impl NavTree {
    /// Lays out `buckets` following the order of `categories`. Kinds without a category are
    /// not shown; categories with an empty bucket are skipped.
    pub fn build(
        buckets: &BTreeMap<String, Vec<ChildRef>>,
        categories: &[Category],
        current_link: &str,
    ) -> NavTree {
        let sections = categories
            .iter()
            .filter_map(|category| {
                let children = buckets.get(&category.kind).filter(|c| !c.is_empty())?;
                Some(NavSection {
                    kind: category.kind.clone(),
                    heading: category.heading.clone(),
                    entries: children
                        .iter()
                        .map(|child| nav_entry(child, &category.suffix, current_link))
                        .collect(),
                })
            })
            .collect();
        NavTree { sections }
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        for section in self.sections.iter() {
            out.push_str("<b class=\"heading\">");
            out.push_str(&escape_html(&section.heading));
            out.push_str("</b><div style=\"margin-left:0.5em\">");
            for entry in section.entries.iter() {
                out.push_str(&entry.to_markup());
            }
            out.push_str("</div>");
        }
        out
    }
}

fn nav_entry(child: &ChildRef, suffix: &str, current_link: &str) -> NavEntry {
    let classes = if child.name == CONSTRUCTOR_NAME {
        Vec::new()
    } else {
        child.modifiers.iter().map(|m| format!("mod-{m}")).collect()
    };
    NavEntry {
        text: format!("{}{}", child.name, suffix),
        href: (child.link != current_link).then(|| adjust_link(current_link, &child.link)),
        bold: !child.inherited,
        classes,
    }
}

impl NavEntry {
    /// Modifier classes go on the outermost element. A plain text entry (inherited, pointing at
    /// the current page) has no element to carry them.
    pub fn to_markup(&self) -> String {
        let text = escape_html(&self.text);
        let class_attr = if self.classes.is_empty() {
            String::new()
        } else {
            format!(" class=\"{}\"", escape_html(&self.classes.join(" ")))
        };
        match (&self.href, self.bold) {
            (Some(href), true) => format!(
                "<a href=\"{}\"{class_attr}><b>{text}</b></a>",
                escape_html(href)
            ),
            (Some(href), false) => format!("<a href=\"{}\"{class_attr}>{text}</a>", escape_html(href)),
            (None, true) => format!("<b{class_attr}>{text}</b>"),
            (None, false) => text,
        }
    }
}

/// The rendered sidebar as installed in the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sidebar {
    pub body: String,
    /// Set until the host reports the first paint; the `init` class keeps the sidebar hidden
    /// meanwhile.
    pub initializing: bool,
    pub from_cache: bool,
}

impl Sidebar {
    pub fn new(body: String, from_cache: bool) -> Sidebar {
        Sidebar {
            body,
            initializing: true,
            from_cache,
        }
    }

    pub fn markup(&self) -> String {
        let state = if self.initializing { " init" } else { "" };
        format!("<div class=\"sidebar{state}\">{}</div>", self.body)
    }
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
