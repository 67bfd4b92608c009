//! html5ever TreeSink that builds an [`HtmlTree`].

use super::tree::{Attr, HtmlTree, NodeId};
use html5ever::driver::ParseOpts;
use html5ever::parse_document;
use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::tree_builder::{ElementFlags, NodeOrText, QuirksMode, TreeSink};
use html5ever::{Attribute, QualName};
use std::borrow::Cow;
use std::cell::RefCell;
use std::rc::Rc;

/// Handle html5ever uses to refer to nodes.
///
/// Elements carry their own name so `elem_name` can hand out a reference
/// without borrowing through the `RefCell`.
#[derive(Debug, Clone)]
pub struct NodeHandle {
    id: NodeId,
    name: Option<Rc<QualName>>,
}

impl NodeHandle {
    fn plain(id: NodeId) -> Self {
        Self { id, name: None }
    }
}

/// TreeSink building an [`HtmlTree`].
///
/// html5ever's trait takes `&self` everywhere, so the tree lives in a
/// `RefCell`.
pub struct TreeBuilderSink {
    tree: RefCell<HtmlTree>,
    quirks_mode: RefCell<QuirksMode>,
}

impl Default for TreeBuilderSink {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeBuilderSink {
    pub fn new() -> Self {
        Self {
            tree: RefCell::new(HtmlTree::new()),
            quirks_mode: RefCell::new(QuirksMode::NoQuirks),
        }
    }

    pub fn into_tree(self) -> HtmlTree {
        self.tree.into_inner()
    }
}

fn attr_name(name: &QualName) -> String {
    match &name.prefix {
        Some(prefix) => format!("{}:{}", prefix, name.local),
        None => name.local.to_string(),
    }
}

fn convert_attrs(attrs: Vec<Attribute>) -> Vec<Attr> {
    attrs
        .into_iter()
        .map(|a| Attr::new(attr_name(&a.name), a.value.to_string()))
        .collect()
}

impl TreeSink for TreeBuilderSink {
    type Handle = NodeHandle;
    type Output = Self;
    type ElemName<'a>
        = &'a QualName
    where
        Self: 'a;

    fn finish(self) -> Self::Output {
        self
    }

    fn parse_error(&self, msg: Cow<'static, str>) {
        tracing::trace!("html parse error: {}", msg);
    }

    fn get_document(&self) -> Self::Handle {
        NodeHandle::plain(self.tree.borrow().document())
    }

    fn elem_name<'a>(&'a self, target: &'a Self::Handle) -> Self::ElemName<'a> {
        static EMPTY: QualName = QualName {
            prefix: None,
            ns: html5ever::ns!(),
            local: html5ever::local_name!(""),
        };
        target.name.as_deref().unwrap_or(&EMPTY)
    }

    fn create_element(
        &self,
        name: QualName,
        attrs: Vec<Attribute>,
        _flags: ElementFlags,
    ) -> Self::Handle {
        let id = self
            .tree
            .borrow_mut()
            .create_element(name.clone(), convert_attrs(attrs));
        NodeHandle {
            id,
            name: Some(Rc::new(name)),
        }
    }

    fn create_comment(&self, text: StrTendril) -> Self::Handle {
        NodeHandle::plain(self.tree.borrow_mut().create_comment(text.to_string()))
    }

    fn create_pi(&self, _target: StrTendril, data: StrTendril) -> Self::Handle {
        NodeHandle::plain(self.tree.borrow_mut().create_comment(data.to_string()))
    }

    fn append(&self, parent: &Self::Handle, child: NodeOrText<Self::Handle>) {
        let mut tree = self.tree.borrow_mut();
        match child {
            NodeOrText::AppendNode(node) => tree.append(parent.id, node.id),
            NodeOrText::AppendText(text) => tree.append_text(parent.id, &text),
        }
    }

    fn append_based_on_parent_node(
        &self,
        element: &Self::Handle,
        prev_element: &Self::Handle,
        child: NodeOrText<Self::Handle>,
    ) {
        let has_parent = self.tree.borrow().parent(element.id).is_some();
        if has_parent {
            self.append_before_sibling(element, child);
        } else {
            self.append(prev_element, child);
        }
    }

    fn append_doctype_to_document(
        &self,
        _name: StrTendril,
        _public_id: StrTendril,
        _system_id: StrTendril,
    ) {
        let mut tree = self.tree.borrow_mut();
        let doc = tree.document();
        let doctype = tree.create_doctype();
        tree.append(doc, doctype);
    }

    fn get_template_contents(&self, target: &Self::Handle) -> Self::Handle {
        // Template contents stay inline; templates never survive sanitizing.
        target.clone()
    }

    fn same_node(&self, x: &Self::Handle, y: &Self::Handle) -> bool {
        x.id == y.id
    }

    fn set_quirks_mode(&self, mode: QuirksMode) {
        *self.quirks_mode.borrow_mut() = mode;
    }

    fn append_before_sibling(&self, sibling: &Self::Handle, new_node: NodeOrText<Self::Handle>) {
        let mut tree = self.tree.borrow_mut();
        let node = match new_node {
            NodeOrText::AppendNode(node) => node.id,
            NodeOrText::AppendText(text) => tree.create_text(text.to_string()),
        };
        tree.insert_before(sibling.id, node);
    }

    fn add_attrs_if_missing(&self, target: &Self::Handle, attrs: Vec<Attribute>) {
        let mut tree = self.tree.borrow_mut();
        if let Some(existing) = tree.attrs_mut(target.id) {
            for attr in convert_attrs(attrs) {
                if !existing.iter().any(|a| a.name == attr.name) {
                    existing.push(attr);
                }
            }
        }
    }

    fn remove_from_parent(&self, target: &Self::Handle) {
        self.tree.borrow_mut().detach(target.id);
    }

    fn reparent_children(&self, node: &Self::Handle, new_parent: &Self::Handle) {
        self.tree
            .borrow_mut()
            .reparent_children(node.id, new_parent.id);
    }
}

/// Parse an HTML fragment as the content of `<body>`.
///
/// Returns the tree and the `body` node holding the fragment.
pub fn parse_fragment(html: &str) -> (HtmlTree, NodeId) {
    let wrapped = format!("<!DOCTYPE html><html><head></head><body>{html}</body></html>");
    let sink = parse_document(TreeBuilderSink::new(), ParseOpts::default())
        .from_utf8()
        .one(wrapped.as_bytes());
    let tree = sink.into_tree();
    let body = tree.body();
    (tree, body)
}
