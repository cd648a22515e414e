//! Live DOM mirror of a core render.
//!
//! Every render replaces the host element's children with a fresh copy of
//! the core [`Dom`]. The mirror remembers which live node came from which
//! [`NodeId`] so native positions can be mapped in both directions.

use textbus_core::dom::{Dom, NodeKind};
use textbus_core::view::render::RenderOutput;
use textbus_core::{NodeId, PlatformError};

/// The host element and the live nodes built into it by the last sync.
pub struct DomMirror {
    host: web_sys::Element,
    nodes: Vec<(NodeId, web_sys::Node)>,
}

impl DomMirror {
    pub fn new(host: web_sys::Element) -> Self {
        Self {
            host,
            nodes: Vec::new(),
        }
    }

    pub fn host(&self) -> &web_sys::Element {
        &self.host
    }

    /// Replace the host's content with `output`.
    pub fn sync(&mut self, output: &RenderOutput) -> Result<(), PlatformError> {
        let document = self.host.owner_document().ok_or("host has no document")?;
        self.host.set_inner_html("");
        self.nodes.clear();
        self.nodes.push((output.host, self.host.clone().into()));

        for &child in output.dom.children(output.host) {
            let node = self.build(&document, &output.dom, child)?;
            self.host
                .append_child(&node)
                .map_err(|e| format!("append_child failed: {:?}", e))?;
        }
        tracing::debug!(target: "textbus::render", nodes = self.nodes.len(), "dom mirrored");
        Ok(())
    }

    fn build(
        &mut self,
        document: &web_sys::Document,
        dom: &Dom,
        id: NodeId,
    ) -> Result<web_sys::Node, PlatformError> {
        let node: web_sys::Node = match dom.kind(id) {
            NodeKind::Text(text) => document.create_text_node(text).into(),
            NodeKind::Element(data) => {
                let element = document
                    .create_element(data.tag())
                    .map_err(|e| format!("create_element failed: {:?}", e))?;
                for (name, value) in data.attributes() {
                    element
                        .set_attribute(name, value)
                        .map_err(|e| format!("set_attribute failed: {:?}", e))?;
                }
                let classes: Vec<&str> = data.classes().collect();
                if !classes.is_empty() {
                    element.set_class_name(&classes.join(" "));
                }
                let style = data
                    .styles()
                    .map(|(k, v)| format!("{k}: {v}"))
                    .collect::<Vec<_>>()
                    .join("; ");
                if !style.is_empty() {
                    element
                        .set_attribute("style", &style)
                        .map_err(|e| format!("set_attribute failed: {:?}", e))?;
                }
                element.into()
            }
            NodeKind::Fragment => document.create_document_fragment().into(),
        };

        for &child in dom.children(id) {
            let built = self.build(document, dom, child)?;
            node.append_child(&built)
                .map_err(|e| format!("append_child failed: {:?}", e))?;
        }
        self.nodes.push((id, node.clone()));
        Ok(node)
    }

    /// Live node built for `id`.
    pub fn node(&self, id: NodeId) -> Option<&web_sys::Node> {
        self.nodes.iter().find(|(n, _)| *n == id).map(|(_, node)| node)
    }

    /// Core node a live node was built from.
    pub fn node_id(&self, node: &web_sys::Node) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|(_, live)| live.is_same_node(Some(node)))
            .map(|(id, _)| *id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
