//! Declarative extraction rules.
//!
//! A rule describes how to reach the repeated items of one feed without any
//! site-specific control flow:
//!
//! 1. **anchor**: the first element of `tag` whose own string matches `text`
//! 2. **navigate**: from the anchor to the container (ancestor, next sibling, or the anchor itself)
//! 3. **harvest**: the container's descendants matching `selector`, minus the first `skip`
//! 4. **fields**: one sub-lookup per output field, relative to each harvested item
//!
//! Rules are plain data and deserialize from the YAML configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionRule {
    pub anchor: AnchorRule,
    pub navigate: Navigation,
    pub harvest: HarvestRule,
    pub fields: Vec<FieldRule>,
}

/// How an anchor's label text is compared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextMatch {
    /// The element's string equals `text` exactly.
    #[default]
    Exact,
    /// `text` is a regular expression searched for in the element's string.
    Pattern,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorRule {
    pub tag: String,
    pub text: String,
    #[serde(default, rename = "match")]
    pub text_match: TextMatch,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Navigation {
    /// Nearest ancestor element named `tag`, optionally carrying `class`.
    Ancestor {
        tag: String,
        #[serde(default)]
        class: Option<String>,
    },
    /// First following sibling element named `tag`.
    NextSibling { tag: String },
    /// The anchor is the container.
    Anchor,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvestRule {
    pub selector: String,
    /// Leading harvested nodes to discard (pinned or header items sharing the container).
    #[serde(default)]
    pub skip: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRule {
    pub name: String,
    /// Selector relative to the harvested item; `None` means the item itself.
    #[serde(default)]
    pub selector: Option<String>,
    /// Attribute to read; `None` reads the element's trimmed text.
    #[serde(default)]
    pub attr: Option<String>,
}

impl FieldRule {
    pub fn text(name: &str, selector: &str) -> Self {
        Self {
            name: name.to_string(),
            selector: Some(selector.to_string()),
            attr: None,
        }
    }

    pub fn attr(name: &str, selector: &str, attr: &str) -> Self {
        Self {
            name: name.to_string(),
            selector: Some(selector.to_string()),
            attr: Some(attr.to_string()),
        }
    }
}
