//! Site extractors for trending and most-popular news boxes.
//!
//! Extraction is split between a generic engine and per-site rule data:
//!
//! 1. **Locate**: find the anchor element by its label text
//! 2. **Navigate**: walk from the anchor to the container holding the items
//! 3. **Harvest**: enumerate the repeated item nodes inside the container
//! 4. **Fields**: read each output field with a nested lookup, leaving it out when absent
//!
//! # Supported Sources
//!
//! | Source | Module | Feeds | Notes |
//! |--------|--------|-------|-------|
//! | Tempo.co | [`tempo`] | `trending-articles`, `trending-topics` | First trending card is a pinned lead and is skipped |
//! | Kompas.com | [`kompas`] | `popular-articles` | Items carry a channel (category) label |
//!
//! Adding a site means supplying a new [`rule::ExtractionRule`] set, either in
//! a module like the ones above or in the YAML configuration.

pub mod engine;
pub mod kompas;
pub mod rule;
pub mod tempo;
