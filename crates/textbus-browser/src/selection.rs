//! Browser implementation of the selection boundary.
//!
//! The DOM Selection API reports text offsets in UTF-16 code units; the core
//! counts characters. Element offsets are child indices in both, since the
//! mirror is a one-to-one copy.

use textbus_core::{NativePosition, NativeRange, PlatformError, SelectionSource};
use wasm_bindgen::JsCast;

use crate::mirror::DomMirror;

/// Character offset -> UTF-16 offset within `text`.
pub fn char_to_utf16(text: &str, char_offset: usize) -> usize {
    text.chars().take(char_offset).map(char::len_utf16).sum()
}

/// UTF-16 offset -> character offset within `text`. An offset inside a
/// surrogate pair rounds down.
pub fn utf16_to_char(text: &str, utf16_offset: usize) -> usize {
    let mut units = 0;
    for (index, c) in text.chars().enumerate() {
        units += c.len_utf16();
        if units > utf16_offset {
            return index;
        }
    }
    text.chars().count()
}

/// Live node and DOM offset for a core position.
pub(crate) fn dom_position(
    mirror: &DomMirror,
    pos: NativePosition,
) -> Result<(web_sys::Node, u32), PlatformError> {
    let node = mirror
        .node(pos.node)
        .ok_or_else(|| format!("node not mirrored: {:?}", pos.node))?;
    let offset = if node.node_type() == web_sys::Node::TEXT_NODE {
        let text = node.text_content().unwrap_or_default();
        char_to_utf16(&text, pos.offset)
    } else {
        pos.offset
    };
    Ok((node.clone(), offset as u32))
}

/// Core position for a live node and DOM offset. `None` outside the mirror.
pub(crate) fn native_position(
    mirror: &DomMirror,
    node: &web_sys::Node,
    offset: u32,
) -> Option<NativePosition> {
    let id = mirror.node_id(node)?;
    let offset = offset as usize;
    let offset = if node.node_type() == web_sys::Node::TEXT_NODE {
        let text = node.text_content().unwrap_or_default();
        utf16_to_char(&text, offset)
    } else {
        offset
    };
    Some(NativePosition::new(id, offset))
}

/// Reads and writes `window.getSelection()` against a [`DomMirror`].
pub struct BrowserSelection<'a> {
    mirror: &'a DomMirror,
}

impl<'a> BrowserSelection<'a> {
    pub fn new(mirror: &'a DomMirror) -> Self {
        Self { mirror }
    }
}

fn window_selection() -> Result<(web_sys::Document, web_sys::Selection), PlatformError> {
    let window = web_sys::window().ok_or("no window")?;
    let document = window.document().ok_or("no document")?;
    let selection = window
        .get_selection()
        .map_err(|e| format!("get_selection failed: {:?}", e))?
        .ok_or("no selection object")?;
    Ok((document, selection))
}

impl SelectionSource for BrowserSelection<'_> {
    fn native_ranges(&self) -> Result<Vec<NativeRange>, PlatformError> {
        let (_, selection) = window_selection()?;
        let mut ranges = Vec::new();
        for i in 0..selection.range_count() {
            let range = selection
                .get_range_at(i)
                .map_err(|e| format!("get_range_at failed: {:?}", e))?;
            let start_container = range
                .start_container()
                .map_err(|e| format!("start_container failed: {:?}", e))?;
            let start_offset = range
                .start_offset()
                .map_err(|e| format!("start_offset failed: {:?}", e))?;
            let end_container = range
                .end_container()
                .map_err(|e| format!("end_container failed: {:?}", e))?;
            let end_offset = range
                .end_offset()
                .map_err(|e| format!("end_offset failed: {:?}", e))?;

            let start = native_position(self.mirror, &start_container, start_offset);
            let end = native_position(self.mirror, &end_container, end_offset);
            match (start, end) {
                (Some(start), Some(end)) => ranges.push(NativeRange::new(start, end)),
                _ => tracing::trace!(
                    target: "textbus::selection",
                    start_node = %start_container.node_name(),
                    end_node = %end_container.node_name(),
                    "range outside the mirror"
                ),
            }
        }
        Ok(ranges)
    }

    fn apply_ranges(&self, ranges: &[NativeRange]) -> Result<(), PlatformError> {
        let (document, selection) = window_selection()?;
        selection
            .remove_all_ranges()
            .map_err(|e| format!("remove_all_ranges failed: {:?}", e))?;
        for range in ranges {
            let (start_node, start_offset) = dom_position(self.mirror, range.start)?;
            let (end_node, end_offset) = dom_position(self.mirror, range.end)?;
            let dom_range = document
                .create_range()
                .map_err(|e| format!("create_range failed: {:?}", e))?;
            dom_range
                .set_start(&start_node, start_offset)
                .map_err(|e| format!("set_start failed: {:?}", e))?;
            dom_range
                .set_end(&end_node, end_offset)
                .map_err(|e| format!("set_end failed: {:?}", e))?;
            selection
                .add_range(&dom_range)
                .map_err(|e| format!("add_range failed: {:?}", e))?;
        }
        Ok(())
    }
}

/// Nearest element at or above `node`.
pub(crate) fn containing_element(node: &web_sys::Node) -> Option<web_sys::Element> {
    match node.dyn_ref::<web_sys::Element>() {
        Some(element) => Some(element.clone()),
        None => node.parent_element(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf16_offsets() {
        let text = "a😀b";
        assert_eq!(char_to_utf16(text, 0), 0);
        assert_eq!(char_to_utf16(text, 2), 3);
        assert_eq!(char_to_utf16(text, 3), 4);

        assert_eq!(utf16_to_char(text, 1), 1);
        assert_eq!(utf16_to_char(text, 2), 1);
        assert_eq!(utf16_to_char(text, 3), 2);
        assert_eq!(utf16_to_char(text, 10), 3);
    }
}
