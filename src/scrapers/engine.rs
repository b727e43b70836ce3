//! Rule-driven structural extraction.
//!
//! An [`Extractor`] is an [`ExtractionRule`] with its selectors and patterns
//! compiled once. Running it over a document never fails: a missing anchor
//! or container yields an empty [`Extraction`] carrying an [`ExtractionGap`],
//! a missing field is left out of the record, and an item whose text and
//! link are both unrecoverable is dropped and counted.

use crate::error::ExtractError;
use crate::models::{fields, ExtractionGap, FeedKind, RawDocument, RawRecord};
use crate::scrapers::rule::{ExtractionRule, Navigation, TextMatch};
use itertools::Itertools;
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use tracing::{debug, instrument};

/// Records harvested from one document, with soft-failure counts.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Extraction {
    pub records: Vec<RawRecord>,
    pub gap: Option<ExtractionGap>,
    pub records_dropped: usize,
}

impl Extraction {
    fn gap(gap: ExtractionGap) -> Self {
        Self {
            gap: Some(gap),
            ..Self::default()
        }
    }
}

#[derive(Debug)]
enum AnchorText {
    Exact(String),
    Pattern(Regex),
}

impl AnchorText {
    fn matches(&self, s: &str) -> bool {
        match self {
            AnchorText::Exact(text) => s == text,
            AnchorText::Pattern(re) => re.is_match(s),
        }
    }
}

#[derive(Debug)]
struct CompiledField {
    name: String,
    selector: Option<Selector>,
    attr: Option<String>,
}

impl CompiledField {
    /// Raw value of this field within `item`, or `None` if the element or attribute is absent.
    fn read(&self, item: ElementRef<'_>) -> Option<String> {
        let target = match &self.selector {
            Some(selector) => item.select(selector).next()?,
            None => item,
        };
        match &self.attr {
            Some(attr) => target.value().attr(attr).map(str::to_string),
            None => Some(element_text(target)),
        }
    }
}

/// A compiled extraction rule for one feed.
#[derive(Debug)]
pub struct Extractor {
    kind: FeedKind,
    anchor_tag: Selector,
    anchor_text: AnchorText,
    navigate: Navigation,
    harvest: Selector,
    skip: usize,
    fields: Vec<CompiledField>,
}

fn parse_selector(selector: &str) -> Result<Selector, ExtractError> {
    Selector::parse(selector).map_err(|e| ExtractError::InvalidSelector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

impl Extractor {
    /// Compile `rule` for a feed of the given kind.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError`] if a selector or the anchor pattern does not parse.
    pub fn compile(kind: FeedKind, rule: &ExtractionRule) -> Result<Self, ExtractError> {
        let anchor_text = match rule.anchor.text_match {
            TextMatch::Exact => AnchorText::Exact(rule.anchor.text.clone()),
            TextMatch::Pattern => AnchorText::Pattern(Regex::new(&rule.anchor.text).map_err(
                |source| ExtractError::InvalidPattern {
                    pattern: rule.anchor.text.clone(),
                    source,
                },
            )?),
        };

        let fields = rule
            .fields
            .iter()
            .map(|field| {
                Ok(CompiledField {
                    name: field.name.clone(),
                    selector: field.selector.as_deref().map(parse_selector).transpose()?,
                    attr: field.attr.clone(),
                })
            })
            .collect::<Result<Vec<_>, ExtractError>>()?;

        Ok(Self {
            kind,
            anchor_tag: parse_selector(&rule.anchor.tag)?,
            anchor_text,
            navigate: rule.navigate.clone(),
            harvest: parse_selector(&rule.harvest.selector)?,
            skip: rule.harvest.skip,
            fields,
        })
    }

    pub fn kind(&self) -> FeedKind {
        self.kind
    }

    /// Parse `doc` and harvest its records.
    #[instrument(level = "debug", skip_all, fields(url = %doc.source_url, kind = ?self.kind))]
    pub fn extract(&self, doc: &RawDocument) -> Extraction {
        let html = Html::parse_document(&doc.body);
        self.extract_from(&html)
    }

    /// Harvest records from an already parsed document.
    pub fn extract_from(&self, html: &Html) -> Extraction {
        let Some(anchor) = self.locate(html) else {
            return Extraction::gap(ExtractionGap::AnchorNotFound);
        };
        let Some(container) = self.container(anchor) else {
            return Extraction::gap(ExtractionGap::ContainerNotFound);
        };

        let text_field = self.kind.text_field();
        let mut extraction = Extraction::default();

        for (index, item) in container.select(&self.harvest).skip(self.skip).enumerate() {
            let mut record = RawRecord::new();
            for field in &self.fields {
                match field.read(item) {
                    Some(value) => record.insert(&field.name, value),
                    None => debug!(index, field = %field.name, "Field not found in item"),
                }
            }

            if record.get(text_field).is_none() && record.get(fields::LINK).is_none() {
                debug!(index, "Item has neither text nor link; dropping");
                extraction.records_dropped += 1;
                continue;
            }
            extraction.records.push(record);
        }

        extraction
    }

    fn locate<'a>(&self, html: &'a Html) -> Option<ElementRef<'a>> {
        html.select(&self.anchor_tag).find(|el| {
            own_string(*el).is_some_and(|s| self.anchor_text.matches(&s))
        })
    }

    fn container<'a>(&self, anchor: ElementRef<'a>) -> Option<ElementRef<'a>> {
        match &self.navigate {
            Navigation::Ancestor { tag, class } => anchor
                .ancestors()
                .filter_map(ElementRef::wrap)
                .find(|el| {
                    el.value().name().eq_ignore_ascii_case(tag)
                        && class
                            .as_deref()
                            .is_none_or(|class| el.value().classes().any(|c| c == class))
                }),
            Navigation::NextSibling { tag } => anchor
                .next_siblings()
                .filter_map(ElementRef::wrap)
                .find(|el| el.value().name().eq_ignore_ascii_case(tag)),
            Navigation::Anchor => Some(anchor),
        }
    }
}

/// The element's "own string": its single text child, descending through
/// single-child element chains. Elements with several children have none.
fn own_string(el: ElementRef<'_>) -> Option<String> {
    let mut children = el.children();
    let only = children.next()?;
    if children.next().is_some() {
        return None;
    }
    match only.value() {
        Node::Text(text) => Some(String::from(&**text)),
        Node::Element(_) => ElementRef::wrap(only).and_then(own_string),
        _ => None,
    }
}

/// Trimmed text pieces of `el`, joined by single spaces.
fn element_text(el: ElementRef<'_>) -> String {
    el.text().map(str::trim).filter(|s| !s.is_empty()).join(" ")
}
