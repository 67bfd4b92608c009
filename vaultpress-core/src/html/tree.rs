//! Arena-allocated HTML tree the post-processing passes operate on.

use html5ever::{ns, LocalName, Namespace, QualName};

/// Index of a node in the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

/// Attribute with its serialized name (`xlink:href` keeps its prefix)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attr {
    pub name: String,
    pub value: String,
}

impl Attr {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum NodeData {
    Document,
    Element { name: QualName, attrs: Vec<Attr> },
    Text(String),
    Comment(String),
    Doctype,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub data: NodeData,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// HTML tree with parent links and ordered children.
///
/// Detached nodes stay in the arena; they are simply unreachable from the
/// document.
#[derive(Debug, Clone)]
pub struct HtmlTree {
    nodes: Vec<Node>,
    document: NodeId,
}

impl Default for HtmlTree {
    fn default() -> Self {
        Self::new()
    }
}

impl HtmlTree {
    pub fn new() -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            document: NodeId(0),
        };
        tree.document = tree.alloc(NodeData::Document);
        tree
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            data,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    pub fn document(&self) -> NodeId {
        self.document
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn create_element(&mut self, name: QualName, attrs: Vec<Attr>) -> NodeId {
        self.alloc(NodeData::Element { name, attrs })
    }

    /// New element in the HTML namespace
    pub fn create_html_element(&mut self, local: &str, attrs: &[(&str, &str)]) -> NodeId {
        let name = QualName::new(None, ns!(html), LocalName::from(local));
        let attrs = attrs.iter().map(|(k, v)| Attr::new(*k, *v)).collect();
        self.create_element(name, attrs)
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.alloc(NodeData::Text(text.into()))
    }

    pub fn create_comment(&mut self, text: impl Into<String>) -> NodeId {
        self.alloc(NodeData::Comment(text.into()))
    }

    pub fn create_doctype(&mut self) -> NodeId {
        self.alloc(NodeData::Doctype)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Local tag name for elements
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].data {
            NodeData::Element { name, .. } => Some(&*name.local),
            _ => None,
        }
    }

    pub fn namespace(&self, id: NodeId) -> Option<&Namespace> {
        match &self.nodes[id.0].data {
            NodeData::Element { name, .. } => Some(&name.ns),
            _ => None,
        }
    }

    pub fn is_element(&self, id: NodeId, local: &str) -> bool {
        self.tag(id) == Some(local)
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].data {
            NodeData::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn attrs(&self, id: NodeId) -> &[Attr] {
        match &self.nodes[id.0].data {
            NodeData::Element { attrs, .. } => attrs.as_slice(),
            _ => &[],
        }
    }

    pub fn attrs_mut(&mut self, id: NodeId) -> Option<&mut Vec<Attr>> {
        match &mut self.nodes[id.0].data {
            NodeData::Element { attrs, .. } => Some(attrs),
            _ => None,
        }
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attrs(id)
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        let value = value.into();
        if let Some(attrs) = self.attrs_mut(id) {
            match attrs.iter_mut().find(|a| a.name == name) {
                Some(existing) => existing.value = value,
                None => attrs.push(Attr::new(name, value)),
            }
        }
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) {
        if let Some(attrs) = self.attrs_mut(id) {
            attrs.retain(|a| a.name != name);
        }
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.attr(id, "class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) {
        if self.has_class(id, class) {
            return;
        }
        let merged = match self.attr(id, "class") {
            Some(existing) if !existing.trim().is_empty() => format!("{} {}", existing.trim(), class),
            _ => class.to_string(),
        };
        self.set_attr(id, "class", merged);
    }

    /// Change an element's local name, keeping its namespace
    pub fn rename(&mut self, id: NodeId, local: &str) {
        if let NodeData::Element { name, .. } = &mut self.nodes[id.0].data {
            name.local = LocalName::from(local);
        }
    }

    /// Remove a node from its parent
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|c| *c != id);
        }
    }

    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Append text, merging with a trailing text node
    pub fn append_text(&mut self, parent: NodeId, text: &str) {
        if let Some(&last) = self.nodes[parent.0].children.last() {
            if let NodeData::Text(existing) = &mut self.nodes[last.0].data {
                existing.push_str(text);
                return;
            }
        }
        let node = self.create_text(text);
        self.append(parent, node);
    }

    /// Insert `child` immediately before `sibling`
    pub fn insert_before(&mut self, sibling: NodeId, child: NodeId) {
        let Some(parent) = self.nodes[sibling.0].parent else {
            return;
        };
        self.detach(child);
        let index = self.index_in_parent(parent, sibling);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.insert(index, child);
    }

    fn index_in_parent(&self, parent: NodeId, child: NodeId) -> usize {
        self.nodes[parent.0]
            .children
            .iter()
            .position(|c| *c == child)
            .unwrap_or(self.nodes[parent.0].children.len())
    }

    /// Move every child of `from` to the end of `to`
    pub fn reparent_children(&mut self, from: NodeId, to: NodeId) {
        let children = std::mem::take(&mut self.nodes[from.0].children);
        for child in children {
            self.nodes[child.0].parent = Some(to);
            self.nodes[to.0].children.push(child);
        }
    }

    /// Replace an element with its children
    pub fn unwrap(&mut self, id: NodeId) {
        let Some(parent) = self.nodes[id.0].parent else {
            return;
        };
        let index = self.index_in_parent(parent, id);
        if index >= self.nodes[parent.0].children.len() {
            return;
        }
        let children = std::mem::take(&mut self.nodes[id.0].children);
        for child in &children {
            self.nodes[child.0].parent = Some(parent);
        }
        let siblings = &mut self.nodes[parent.0].children;
        siblings.splice(index..=index, children);
        self.nodes[id.0].parent = None;
    }

    /// Put `wrapper` where `id` is and move `id` inside it
    pub fn wrap(&mut self, id: NodeId, wrapper: NodeId) {
        if self.nodes[id.0].parent.is_none() {
            return;
        }
        self.insert_before(id, wrapper);
        self.append(wrapper, id);
    }

    /// Closest ancestor (excluding `id`) matching `pred`
    pub fn ancestor_where(&self, id: NodeId, pred: impl Fn(NodeId) -> bool) -> Option<NodeId> {
        let mut current = self.parent(id);
        while let Some(node) = current {
            if pred(node) {
                return Some(node);
            }
            current = self.parent(node);
        }
        None
    }

    pub fn has_ancestor(&self, id: NodeId, local: &str) -> bool {
        self.ancestor_where(id, |n| self.is_element(n, local)).is_some()
    }

    /// Preorder traversal below `root` (excluding `root`), snapshotted
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(root).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    /// Elements named `local` below `root`, in document order
    pub fn elements_named(&self, root: NodeId, local: &str) -> Vec<NodeId> {
        self.descendants(root)
            .into_iter()
            .filter(|id| self.is_element(*id, local))
            .collect()
    }

    /// Concatenated text of every descendant text node
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        if let Some(text) = self.text(id) {
            out.push_str(text);
        }
        for node in self.descendants(id) {
            if let Some(text) = self.text(node) {
                out.push_str(text);
            }
        }
        out
    }

    /// First `body` element, or the document when there is none
    pub fn body(&self) -> NodeId {
        self.elements_named(self.document, "body")
            .first()
            .copied()
            .unwrap_or(self.document)
    }
}
