//! Abstract format model.
//!
//! - [`FormatAbstractData`]: what an element needs to satisfy a formatter
//! - [`FormatRange`]: a span of content plus its format state
//! - [`FormatMatrix`]: per-node formatter -> ranges map
//! - [`Formatter`]: the match/read/render contract

mod abstract_data;
mod formatter;
mod matrix;
mod range;

pub use abstract_data::FormatAbstractData;
pub use formatter::{
    Folded, Formatter, FormatterKind, FormatterRef, Priority, RenderContext, RenderMode,
    fold_formats,
};
pub use matrix::{Coverage, FormatMatrix};
pub use range::{FormatEffect, FormatRange};
