//! In-memory HTML document.
//!
//! Nodes live in an arena indexed by [`NodeId`]. The document keeps the
//! source text it was parsed from; serialization copies every untouched byte
//! from the source and only re-renders the content of elements whose text was
//! replaced, so a page comes back exactly as it went in apart from the
//! rewritten post times.

mod html;
pub mod selector;

use crate::error::Result;
use selector::{AttrCondition, Combinator, Compound, Part, Selector};
use std::collections::BTreeSet;
use std::ops::Range;

/// Index of a node in its document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Identifier of an element node, stable for the life of the document
pub type ElementId = NodeId;

#[derive(Debug, Clone)]
enum NodeKind {
    Document,
    Element(Element),
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone)]
struct Element {
    tag_name: String,
    attrs: Vec<(String, String)>,
    /// Source bytes between the start tag and the end tag, `None` for void elements
    inner: Option<Range<usize>>,
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
}

#[derive(Debug, Clone)]
pub struct Document {
    source: String,
    nodes: Vec<Node>,
    root: NodeId,
    rewritten: BTreeSet<NodeId>,
}

impl Document {
    /// Parse an HTML document.
    ///
    /// The tree builder is lenient the way browsers are about stray or
    /// missing end tags, but rejects input that ends inside a comment, a tag
    /// or a raw-text element such as `<script>`.
    pub fn parse(source: &str) -> Result<Self> {
        html::parse(source)
    }

    fn empty(source: &str) -> Self {
        let root = Node {
            parent: None,
            children: Vec::new(),
            kind: NodeKind::Document,
        };
        Self {
            source: source.to_string(),
            nodes: vec![root],
            root: NodeId(0),
            rewritten: BTreeSet::new(),
        }
    }

    fn create_node(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: Some(parent),
            children: Vec::new(),
            kind,
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    fn create_element(&mut self, parent: NodeId, tag_name: String, attrs: Vec<(String, String)>) -> NodeId {
        self.create_node(
            parent,
            NodeKind::Element(Element {
                tag_name,
                attrs,
                inner: None,
            }),
        )
    }

    fn create_text(&mut self, parent: NodeId, text: String) -> NodeId {
        self.create_node(parent, NodeKind::Text(text))
    }

    fn create_comment(&mut self, parent: NodeId, text: String) -> NodeId {
        self.create_node(parent, NodeKind::Comment(text))
    }

    fn set_inner_span(&mut self, node_id: NodeId, span: Range<usize>) {
        if let NodeKind::Element(element) = &mut self.nodes[node_id.0].kind {
            element.inner = Some(span);
        }
    }

    fn element(&self, node_id: NodeId) -> Option<&Element> {
        match &self.nodes.get(node_id.0)?.kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn is_element(&self, node_id: NodeId) -> bool {
        self.element(node_id).is_some()
    }

    /// Lowercased tag name of an element
    pub fn tag_name(&self, node_id: NodeId) -> Option<&str> {
        self.element(node_id).map(|element| element.tag_name.as_str())
    }

    pub fn attr(&self, node_id: NodeId, name: &str) -> Option<&str> {
        self.element(node_id)?
            .attrs
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn has_class(&self, node_id: NodeId, class_name: &str) -> bool {
        self.attr(node_id, "class")
            .is_some_and(|classes| classes.split_ascii_whitespace().any(|c| c == class_name))
    }

    pub fn parent(&self, node_id: NodeId) -> Option<NodeId> {
        self.nodes.get(node_id.0)?.parent
    }

    pub fn children(&self, node_id: NodeId) -> &[NodeId] {
        self.nodes
            .get(node_id.0)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    /// Every element reachable from the root, in document order.
    pub fn elements(&self) -> Vec<ElementId> {
        let mut out = Vec::new();
        self.collect_elements(self.root, &mut out);
        out
    }

    fn collect_elements(&self, node_id: NodeId, out: &mut Vec<ElementId>) {
        for child in &self.nodes[node_id.0].children {
            if self.is_element(*child) {
                out.push(*child);
            }
            self.collect_elements(*child, out);
        }
    }

    /// Elements matching `selector`, in document order.
    pub fn query_selector_all(&self, selector: &Selector) -> Vec<ElementId> {
        self.elements()
            .into_iter()
            .filter(|id| self.matches(*id, selector))
            .collect()
    }

    pub fn matches(&self, node_id: NodeId, selector: &Selector) -> bool {
        selector.groups().iter().any(|parts| self.matches_chain(node_id, parts))
    }

    fn matches_chain(&self, node_id: NodeId, parts: &[Part]) -> bool {
        let Some((last, rest)) = parts.split_last() else {
            return true;
        };
        if !self.matches_compound(node_id, &last.compound) {
            return false;
        }

        match last.combinator {
            None => true,
            Some(Combinator::Child) => self
                .parent(node_id)
                .is_some_and(|parent| self.is_element(parent) && self.matches_chain(parent, rest)),
            Some(Combinator::Descendant) => {
                let mut current = self.parent(node_id);
                while let Some(ancestor) = current {
                    if self.is_element(ancestor) && self.matches_chain(ancestor, rest) {
                        return true;
                    }
                    current = self.parent(ancestor);
                }
                false
            }
        }
    }

    fn matches_compound(&self, node_id: NodeId, compound: &Compound) -> bool {
        let Some(element) = self.element(node_id) else {
            return false;
        };

        if compound.tag.as_ref().is_some_and(|tag| *tag != element.tag_name) {
            return false;
        }
        if compound.id.as_deref().is_some_and(|id| self.attr(node_id, "id") != Some(id)) {
            return false;
        }
        if compound.classes.iter().any(|class_name| !self.has_class(node_id, class_name)) {
            return false;
        }
        compound.attrs.iter().all(|cond| match cond {
            AttrCondition::Exists { name } => self.attr(node_id, name).is_some(),
            AttrCondition::Eq { name, value } => self.attr(node_id, name) == Some(value.as_str()),
        })
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self, node_id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(node_id, &mut out);
        out
    }

    fn collect_text(&self, node_id: NodeId, out: &mut String) {
        let Some(node) = self.nodes.get(node_id.0) else {
            return;
        };
        match &node.kind {
            NodeKind::Text(text) => out.push_str(text),
            NodeKind::Comment(_) => {}
            NodeKind::Document | NodeKind::Element(_) => {
                for child in &node.children {
                    self.collect_text(*child, out);
                }
            }
        }
    }

    /// Replace all children of an element with a single text node.
    ///
    /// Returns `false` (and changes nothing) if `node_id` is not an element.
    pub fn set_text_content(&mut self, node_id: NodeId, value: &str) -> bool {
        if !self.is_element(node_id) {
            return false;
        }

        for child in std::mem::take(&mut self.nodes[node_id.0].children) {
            self.nodes[child.0].parent = None;
        }
        if !value.is_empty() {
            self.create_text(node_id, value.to_string());
        }
        self.rewritten.insert(node_id);
        true
    }

    /// Serialize the document back to HTML.
    pub fn to_html(&self) -> String {
        let mut spans: Vec<(Range<usize>, NodeId)> = self
            .rewritten
            .iter()
            .filter_map(|id| self.element(*id)?.inner.clone().map(|span| (span, *id)))
            .collect();
        spans.sort_by_key(|(span, _)| span.start);

        let mut out = String::with_capacity(self.source.len());
        let mut pos = 0usize;
        for (span, id) in spans {
            // Nested inside a span that was already re-rendered
            if span.start < pos {
                continue;
            }
            out.push_str(&self.source[pos..span.start]);
            self.serialize_children(id, &mut out);
            pos = span.end;
        }
        out.push_str(&self.source[pos..]);
        out
    }

    /// Serialize the current children of an element.
    pub fn inner_html(&self, node_id: NodeId) -> String {
        let mut out = String::new();
        self.serialize_children(node_id, &mut out);
        out
    }

    fn serialize_children(&self, node_id: NodeId, out: &mut String) {
        let raw = self.tag_name(node_id).is_some_and(html::is_literal_text_tag);
        for child in &self.nodes[node_id.0].children {
            self.serialize_node(*child, raw, out);
        }
    }

    fn serialize_node(&self, node_id: NodeId, raw_parent: bool, out: &mut String) {
        match &self.nodes[node_id.0].kind {
            NodeKind::Text(text) if raw_parent => out.push_str(text),
            NodeKind::Text(text) => html::escape_text_into(text, out),
            NodeKind::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
            NodeKind::Element(element) => {
                out.push('<');
                out.push_str(&element.tag_name);
                for (name, value) in &element.attrs {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    html::escape_attr_into(value, out);
                    out.push('"');
                }
                out.push('>');
                if !html::is_void_tag(&element.tag_name) {
                    self.serialize_children(node_id, out);
                    out.push_str("</");
                    out.push_str(&element.tag_name);
                    out.push('>');
                }
            }
            NodeKind::Document => self.serialize_children(node_id, out),
        }
    }
}
