use serde::{Deserialize, Serialize};
use std::{fs::read_to_string, path::Path};

use crate::error::NavError;

/// One sidebar section: children registered under `kind` are listed below `heading`, each
/// name followed by `suffix`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub kind: String,
    pub heading: String,
    #[serde(default)]
    pub suffix: String,
}

impl Category {
    pub fn new(kind: &str, heading: &str, suffix: &str) -> Category {
        Category {
            kind: kind.to_string(),
            heading: heading.to_string(),
            suffix: suffix.to_string(),
        }
    }
}

/// Sidebar sections in display order.
pub fn default_categories() -> Vec<Category> {
    vec![
        Category::new("module", "Modules", ""),
        Category::new("class", "Classes", ""),
        Category::new("enum", "Enums", ""),
        Category::new("directive", "Directives", ""),
        Category::new("method", "Methods", "()"),
        Category::new("operator", "Operators", "()"),
        Category::new("member", "Members", "()"),
        Category::new("namespace", "Namespaces", "::"),
        Category::new("appendix", "Appendices", ""),
    ]
}

fn default_root_page() -> String {
    "index.html".to_string()
}

fn default_true() -> bool {
    true
}

/// Per-page settings, normally emitted by the documentation generator next to the page.
///
/// ```toml
/// current_link = "predef/Stdio/File.html"
/// publish_time = 1700000000
///
/// [[categories]]
/// kind = "method"
/// heading = "Methods"
/// suffix = "()"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavConfig {
    /// Root-relative link of the page being viewed. Absent on pages without one of their own.
    #[serde(default)]
    pub current_link: Option<String>,
    /// When the documentation was generated, seconds since the unix epoch. Cached sidebars
    /// written before this instant are discarded.
    #[serde(default)]
    pub publish_time: i64,
    /// The start page, whose navigation is never cached.
    #[serde(default = "default_root_page")]
    pub root_page: String,
    /// Disable to ignore any attached session store, e.g. for pages opened from the file
    /// system.
    #[serde(default = "default_true")]
    pub cache_enabled: bool,
    #[serde(default = "default_categories")]
    pub categories: Vec<Category>,
}

impl Default for NavConfig {
    fn default() -> Self {
        NavConfig {
            current_link: None,
            publish_time: 0,
            root_page: default_root_page(),
            cache_enabled: true,
            categories: default_categories(),
        }
    }
}

impl NavConfig {
    pub fn for_page(link: &str) -> NavConfig {
        NavConfig {
            current_link: Some(link.to_string()),
            ..Default::default()
        }
    }

    /// Pages served without a host name (opened from the file system) never use the cache.
    pub fn with_hostname(mut self, hostname: &str) -> NavConfig {
        if hostname.is_empty() {
            self.cache_enabled = false;
        }
        self
    }

    pub fn from_toml_str(content: &str) -> Result<NavConfig, NavError> {
        let config: NavConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<NavConfig, NavError> {
        tracing::debug!("Reading navigation config from {:?}", path.as_ref());
        NavConfig::from_toml_str(&read_to_string(path)?)
    }

    pub fn to_toml_string(&self) -> Result<String, NavError> {
        Ok(toml::to_string(self)?)
    }

    /// The current page link, empty when the page has none.
    pub fn page_link(&self) -> &str {
        self.current_link.as_deref().unwrap_or("")
    }

    fn validate(&self) -> Result<(), NavError> {
        for (idx, category) in self.categories.iter().enumerate() {
            if category.kind.is_empty() {
                return Err(NavError::Config(format!(
                    "category #{idx} ({:?}) has an empty kind",
                    category.heading
                )));
            }
            if self.categories[..idx].iter().any(|c| c.kind == category.kind) {
                return Err(NavError::Config(format!(
                    "category kind {:?} is listed twice",
                    category.kind
                )));
            }
        }
        Ok(())
    }
}
