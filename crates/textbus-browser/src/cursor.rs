//! Browser implementation of caret measurement.
//!
//! Uses a collapsed DOM Range to find where the caret sits and the computed
//! style of the surrounding element for its height and colour.

use textbus_core::selection::cursor::parse_leading_float;
use textbus_core::{CursorPlatform, CursorRect, FontMetrics, NativePosition, PlatformError};

use crate::mirror::DomMirror;
use crate::selection::{containing_element, dom_position};

/// Font size assumed when the computed style cannot be read.
const DEFAULT_FONT_SIZE: f64 = 16.0;

/// Browser-based caret measurement. Rectangles are relative to the
/// mirror's host element.
pub struct BrowserCursor<'a> {
    mirror: &'a DomMirror,
}

impl<'a> BrowserCursor<'a> {
    pub fn new(mirror: &'a DomMirror) -> Self {
        Self { mirror }
    }
}

impl CursorPlatform for BrowserCursor<'_> {
    fn caret_rect(&self, pos: &NativePosition) -> Result<Option<CursorRect>, PlatformError> {
        let document = web_sys::window()
            .ok_or("no window")?
            .document()
            .ok_or("no document")?;
        let (node, offset) = dom_position(self.mirror, *pos)?;

        let range = document
            .create_range()
            .map_err(|e| format!("create_range failed: {:?}", e))?;
        range
            .set_start(&node, offset)
            .map_err(|e| format!("set_start failed: {:?}", e))?;
        range.collapse_with_to_start(true);

        let mut rect = range.get_bounding_client_rect();
        // Collapsed ranges next to a <br> report an empty box
        if rect.height() == 0.0 {
            if let Some(element) = containing_element(&node) {
                rect = element.get_bounding_client_rect();
            }
        }
        if rect.height() == 0.0 && rect.width() == 0.0 {
            tracing::trace!(target: "textbus::selection", ?pos, "caret position has no layout");
            return Ok(None);
        }

        let host = self.mirror.host().get_bounding_client_rect();
        Ok(Some(CursorRect::new(
            rect.x() - host.x(),
            rect.y() - host.y(),
            rect.width(),
            rect.height(),
        )))
    }

    fn font_metrics(&self, pos: &NativePosition) -> Result<FontMetrics, PlatformError> {
        let window = web_sys::window().ok_or("no window")?;
        let (node, _) = dom_position(self.mirror, *pos)?;
        let element = containing_element(&node).ok_or("position has no element")?;
        let style = window
            .get_computed_style(&element)
            .map_err(|e| format!("get_computed_style failed: {:?}", e))?
            .ok_or("no computed style")?;

        let property = |name: &str| {
            style
                .get_property_value(name)
                .map_err(|e| format!("get_property_value({name}) failed: {:?}", e))
        };
        let font_size = parse_leading_float(&property("font-size")?).unwrap_or(DEFAULT_FONT_SIZE);
        Ok(FontMetrics {
            font_size,
            line_height: property("line-height")?,
            color: property("color")?,
        })
    }
}
