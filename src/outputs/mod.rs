//! Snapshot writers for a refresh round's [`Dashboard`](crate::report::Dashboard).
//!
//! # Submodules
//!
//! - [`json`]: Writes the dashboard as JSON for API consumption
//! - [`markdown`]: Renders the dashboard as a Markdown report
//!
//! # Output Structure
//!
//! ```text
//! json_output_dir/
//! └── 2025-05-06/
//!     ├── 08-00-00.json
//!     └── 08-05-00.json
//!
//! markdown_output_dir/
//! └── 2025-05-06/
//!     ├── 08-00-00.md
//!     └── 08-05-00.md
//! ```

pub mod json;
pub mod markdown;
