use std::collections::{BTreeMap, HashMap};

use crate::error::{Error, Result};
use crate::html::parse_html;

const STACK_RED_ZONE: usize = 64 * 1024;
const STACK_GROW_SIZE: usize = 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
enum NodeType {
    Document,
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    node_type: NodeType,
}

#[derive(Debug, Clone)]
struct Element {
    tag_name: String,
    attrs: BTreeMap<String, String>,
    value: String,
}

/// Arena document. Nodes are never freed; detached subtrees simply lose their
/// parent link and drop out of the id index.
#[derive(Debug, Clone)]
pub struct Dom {
    nodes: Vec<Node>,
    root: NodeId,
    id_index: HashMap<String, NodeId>,
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

impl Dom {
    pub fn new() -> Self {
        let root = Node {
            parent: None,
            children: Vec::new(),
            node_type: NodeType::Document,
        };
        Self {
            nodes: vec![root],
            root: NodeId(0),
            id_index: HashMap::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    fn create_node(&mut self, parent: Option<NodeId>, node_type: NodeType) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent,
            children: Vec::new(),
            node_type,
        });
        if let Some(parent_id) = parent {
            self.nodes[parent_id.0].children.push(id);
        }
        id
    }

    pub fn create_element(
        &mut self,
        parent: NodeId,
        tag_name: &str,
        attrs: BTreeMap<String, String>,
    ) -> NodeId {
        let value = attrs.get("value").cloned().unwrap_or_default();
        let element = Element {
            tag_name: tag_name.to_ascii_lowercase(),
            attrs,
            value,
        };
        let id = self.create_node(Some(parent), NodeType::Element(element));
        if self.is_connected(id) {
            if let Some(id_attr) = self.attr(id, "id").filter(|value| !value.is_empty()) {
                self.id_index.insert(id_attr, id);
            }
        }
        id
    }

    pub fn create_detached_element(&mut self, tag_name: &str) -> NodeId {
        let element = Element {
            tag_name: tag_name.to_ascii_lowercase(),
            attrs: BTreeMap::new(),
            value: String::new(),
        };
        self.create_node(None, NodeType::Element(element))
    }

    pub fn create_text(&mut self, parent: NodeId, text: &str) -> NodeId {
        self.create_node(Some(parent), NodeType::Text(text.to_string()))
    }

    fn element(&self, node_id: NodeId) -> Option<&Element> {
        match &self.nodes.get(node_id.0)?.node_type {
            NodeType::Element(element) => Some(element),
            _ => None,
        }
    }

    fn element_mut(&mut self, node_id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes.get_mut(node_id.0)?.node_type {
            NodeType::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn is_element(&self, node_id: NodeId) -> bool {
        self.element(node_id).is_some()
    }

    pub fn tag_name(&self, node_id: NodeId) -> Option<&str> {
        self.element(node_id).map(|e| e.tag_name.as_str())
    }

    pub fn parent(&self, node_id: NodeId) -> Option<NodeId> {
        self.nodes.get(node_id.0).and_then(|node| node.parent)
    }

    /// Element ancestor `depth` levels up. The document node does not count.
    pub fn ancestor(&self, node_id: NodeId, depth: usize) -> Option<NodeId> {
        let mut cursor = node_id;
        for _ in 0..depth {
            cursor = self.parent(cursor)?;
        }
        self.is_element(cursor).then_some(cursor)
    }

    pub fn children(&self, node_id: NodeId) -> &[NodeId] {
        self.nodes
            .get(node_id.0)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn by_id(&self, id: &str) -> Option<NodeId> {
        self.id_index.get(id).copied()
    }

    pub fn text_content(&self, node_id: NodeId) -> String {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || {
            match &self.nodes[node_id.0].node_type {
                NodeType::Document | NodeType::Element(_) => {
                    let mut out = String::new();
                    for child in &self.nodes[node_id.0].children {
                        out.push_str(&self.text_content(*child));
                    }
                    out
                }
                NodeType::Text(text) => text.clone(),
            }
        })
    }

    pub fn set_text_content(&mut self, node_id: NodeId, value: &str) -> Result<()> {
        if self.element(node_id).is_none() {
            return Err(Error::Dom("textContent target is not an element".into()));
        }
        self.detach_children(node_id);
        if !value.is_empty() {
            self.create_text(node_id, value);
        }
        self.rebuild_id_index();
        Ok(())
    }

    pub fn inner_html(&self, node_id: NodeId) -> Result<String> {
        if self.element(node_id).is_none() {
            return Err(Error::Dom("innerHTML target is not an element".into()));
        }
        let mut out = String::new();
        for child in &self.nodes[node_id.0].children {
            out.push_str(&self.dump_node(*child));
        }
        Ok(out)
    }

    pub fn set_inner_html(&mut self, node_id: NodeId, html: &str) -> Result<()> {
        if self.element(node_id).is_none() {
            return Err(Error::Dom("innerHTML target is not an element".into()));
        }

        let fragment = parse_html(html)?;
        self.detach_children(node_id);

        let children = fragment.nodes[fragment.root.0].children.clone();
        for child in children {
            self.clone_subtree_from_dom(&fragment, child, Some(node_id), false)?;
        }

        self.rebuild_id_index();
        Ok(())
    }

    fn detach_children(&mut self, node_id: NodeId) {
        let old_children = std::mem::take(&mut self.nodes[node_id.0].children);
        for child in old_children {
            self.nodes[child.0].parent = None;
        }
    }

    /// Copies `source_node` and its descendants from another document to the
    /// end of `parent`.
    pub fn import_subtree(
        &mut self,
        source: &Dom,
        source_node: NodeId,
        parent: NodeId,
        strip_ids: bool,
    ) -> Result<NodeId> {
        if !self.can_have_children(parent) {
            return Err(Error::Dom("import target cannot have children".into()));
        }
        let node = self.clone_subtree_from_dom(source, source_node, Some(parent), strip_ids)?;
        self.rebuild_id_index();
        Ok(node)
    }

    /// Copies a subtree of this document to the end of `parent`.
    pub fn copy_subtree(
        &mut self,
        node: NodeId,
        parent: NodeId,
        strip_ids: bool,
    ) -> Result<NodeId> {
        if !self.can_have_children(parent) {
            return Err(Error::Dom("copy target cannot have children".into()));
        }
        let copy = self.copy_subtree_within(node, parent, strip_ids)?;
        self.rebuild_id_index();
        Ok(copy)
    }

    fn copy_subtree_within(
        &mut self,
        node: NodeId,
        parent: NodeId,
        strip_ids: bool,
    ) -> Result<NodeId> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || {
            let node_type = match &self.nodes[node.0].node_type {
                NodeType::Document => {
                    return Err(Error::Dom("cannot copy a document node".into()));
                }
                NodeType::Element(element) => {
                    let mut element = element.clone();
                    if strip_ids {
                        element.attrs.remove("id");
                    }
                    NodeType::Element(element)
                }
                NodeType::Text(text) => NodeType::Text(text.clone()),
            };

            let copy = self.create_node(Some(parent), node_type);
            let children = self.nodes[node.0].children.clone();
            for child in children {
                self.copy_subtree_within(child, copy, strip_ids)?;
            }
            Ok(copy)
        })
    }

    /// With `strip_ids` the copies carry no `id` attributes, so they never
    /// shadow the originals in the id index.
    fn clone_subtree_from_dom(
        &mut self,
        source: &Dom,
        source_node: NodeId,
        parent: Option<NodeId>,
        strip_ids: bool,
    ) -> Result<NodeId> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || {
            let node_type = match &source.nodes[source_node.0].node_type {
                NodeType::Document => {
                    return Err(Error::Dom("cannot clone a document node".into()));
                }
                NodeType::Element(element) => {
                    let mut element = element.clone();
                    if strip_ids {
                        element.attrs.remove("id");
                    }
                    NodeType::Element(element)
                }
                NodeType::Text(text) => NodeType::Text(text.clone()),
            };

            let node = self.create_node(parent, node_type);
            for child in &source.nodes[source_node.0].children {
                self.clone_subtree_from_dom(source, *child, Some(node), strip_ids)?;
            }
            Ok(node)
        })
    }

    pub fn value(&self, node_id: NodeId) -> Result<String> {
        let element = self
            .element(node_id)
            .ok_or_else(|| Error::Dom("value target is not an element".into()))?;
        Ok(element.value.clone())
    }

    pub fn set_value(&mut self, node_id: NodeId, value: &str) -> Result<()> {
        let element = self
            .element_mut(node_id)
            .ok_or_else(|| Error::Dom("value target is not an element".into()))?;
        element.value = value.to_string();
        Ok(())
    }

    pub(crate) fn initialize_form_control_values(&mut self) {
        for node in self.all_element_nodes() {
            let is_textarea = self
                .tag_name(node)
                .map(|tag| tag.eq_ignore_ascii_case("textarea"))
                .unwrap_or(false);
            if is_textarea {
                let text = self.text_content(node);
                if let Some(element) = self.element_mut(node) {
                    element.value = text;
                }
            }
        }
    }

    pub fn attr(&self, node_id: NodeId, name: &str) -> Option<String> {
        self.element(node_id)
            .and_then(|e| e.attrs.get(&name.to_ascii_lowercase()).cloned())
    }

    pub fn set_attr(&mut self, node_id: NodeId, name: &str, value: &str) -> Result<()> {
        let lowered = name.to_ascii_lowercase();
        let connected = self.is_connected(node_id);
        let old = {
            let element = self
                .element_mut(node_id)
                .ok_or_else(|| Error::Dom("setAttribute target is not an element".into()))?;
            if lowered == "value" {
                element.value = value.to_string();
            }
            element.attrs.insert(lowered.clone(), value.to_string())
        };

        if lowered == "id" && connected {
            if let Some(old) = old {
                self.id_index.remove(&old);
            }
            if !value.is_empty() {
                self.id_index.insert(value.to_string(), node_id);
            }
        }
        Ok(())
    }

    pub fn remove_attr(&mut self, node_id: NodeId, name: &str) -> Result<()> {
        let lowered = name.to_ascii_lowercase();
        let connected = self.is_connected(node_id);
        let old = {
            let element = self
                .element_mut(node_id)
                .ok_or_else(|| Error::Dom("removeAttribute target is not an element".into()))?;
            if lowered == "value" {
                element.value.clear();
            }
            element.attrs.remove(&lowered)
        };

        if lowered == "id" && connected {
            if let Some(old) = old {
                self.id_index.remove(&old);
            }
        }
        Ok(())
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        if !self.can_have_children(parent) {
            return Err(Error::Dom("appendChild target cannot have children".into()));
        }
        if child == self.root || child == parent {
            return Err(Error::Dom("invalid appendChild node".into()));
        }
        if !self.is_valid_node(child) {
            return Err(Error::Dom("appendChild node is invalid".into()));
        }

        // Prevent cycles: parent must not be inside child's subtree.
        let mut cursor = Some(parent);
        while let Some(node) = cursor {
            if node == child {
                return Err(Error::Dom("appendChild would create a cycle".into()));
            }
            cursor = self.parent(node);
        }

        if let Some(old_parent) = self.parent(child) {
            self.nodes[old_parent.0].children.retain(|id| *id != child);
        }
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
        self.rebuild_id_index();
        Ok(())
    }

    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        if self.parent(child) != Some(parent) {
            return Err(Error::Dom("removeChild target is not a direct child".into()));
        }
        self.nodes[parent.0].children.retain(|id| *id != child);
        self.nodes[child.0].parent = None;
        self.rebuild_id_index();
        Ok(())
    }

    pub fn remove_node(&mut self, node: NodeId) -> Result<()> {
        if node == self.root {
            return Err(Error::Dom("cannot remove document root".into()));
        }
        let Some(parent) = self.parent(node) else {
            return Ok(());
        };
        self.remove_child(parent, node)
    }

    pub fn style_get(&self, node_id: NodeId, name: &str) -> Result<String> {
        let element = self
            .element(node_id)
            .ok_or_else(|| Error::Dom("style target is not an element".into()))?;
        let decls = parse_style_declarations(element.attrs.get("style").map(String::as_str));
        Ok(decls
            .iter()
            .find(|(prop, _)| prop == name)
            .map(|(_, value)| value.clone())
            .unwrap_or_default())
    }

    /// Sets one inline style declaration; an empty value removes it.
    pub fn style_set(&mut self, node_id: NodeId, name: &str, value: &str) -> Result<()> {
        let element = self
            .element_mut(node_id)
            .ok_or_else(|| Error::Dom("style target is not an element".into()))?;

        let mut decls = parse_style_declarations(element.attrs.get("style").map(String::as_str));
        if let Some(pos) = decls.iter().position(|(prop, _)| prop == name) {
            if value.is_empty() {
                decls.remove(pos);
            } else {
                decls[pos].1 = value.to_string();
            }
        } else if !value.is_empty() {
            decls.push((name.to_string(), value.to_string()));
        }

        if decls.is_empty() {
            element.attrs.remove("style");
        } else {
            element
                .attrs
                .insert("style".to_string(), serialize_style_declarations(&decls));
        }
        Ok(())
    }

    pub fn class_contains(&self, node_id: NodeId, class_name: &str) -> bool {
        self.element(node_id)
            .map(|element| has_class(element, class_name))
            .unwrap_or(false)
    }

    pub fn class_add(&mut self, node_id: NodeId, class_name: &str) -> Result<()> {
        let element = self
            .element_mut(node_id)
            .ok_or_else(|| Error::Dom("classList target is not an element".into()))?;
        let mut classes = class_tokens(element.attrs.get("class").map(String::as_str));
        if !classes.iter().any(|name| name == class_name) {
            classes.push(class_name.to_string());
        }
        set_class_attr(element, &classes);
        Ok(())
    }

    /// Connected elements carrying `class_name`, in document order.
    pub fn elements_by_class(&self, class_name: &str) -> Vec<NodeId> {
        self.all_element_nodes()
            .into_iter()
            .filter(|node| self.class_contains(*node, class_name))
            .collect()
    }

    /// `root` itself (when it matches) followed by matching descendants.
    pub fn elements_by_tag_from(&self, root: NodeId, tag: &str) -> Vec<NodeId> {
        let mut ids = Vec::new();
        self.collect_elements_dfs(root, &mut ids);
        ids.into_iter()
            .filter(|node| {
                self.tag_name(*node)
                    .map(|name| name.eq_ignore_ascii_case(tag))
                    .unwrap_or(false)
            })
            .collect()
    }

    pub fn first_by_tag(&self, tag: &str) -> Option<NodeId> {
        self.elements_by_tag_from(self.root, tag).into_iter().next()
    }

    pub fn first_by_attr(&self, name: &str, value: &str) -> Option<NodeId> {
        self.all_element_nodes()
            .into_iter()
            .find(|node| self.attr(*node, name).as_deref() == Some(value))
    }

    /// Nearest ancestor (starting at the parent) carrying any of the classes.
    pub fn closest_with_class(&self, node_id: NodeId, classes: &[&str]) -> Option<NodeId> {
        let mut cursor = self.parent(node_id);
        while let Some(current) = cursor {
            if classes.iter().any(|class| self.class_contains(current, class)) {
                return Some(current);
            }
            cursor = self.parent(current);
        }
        None
    }

    /// Text of the first `<title>` element, trimmed the way `document.title` is.
    pub fn title(&self) -> String {
        self.first_by_tag("title")
            .map(|node| self.text_content(node).trim().to_string())
            .unwrap_or_default()
    }

    pub fn set_title(&mut self, value: &str) -> Result<()> {
        let node = match self.first_by_tag("title") {
            Some(node) => node,
            None => {
                let parent = self.first_by_tag("head").unwrap_or(self.root);
                self.create_element(parent, "title", BTreeMap::new())
            }
        };
        self.set_text_content(node, value)
    }

    fn can_have_children(&self, node_id: NodeId) -> bool {
        matches!(
            self.nodes.get(node_id.0).map(|n| &n.node_type),
            Some(NodeType::Document | NodeType::Element(_))
        )
    }

    fn is_valid_node(&self, node_id: NodeId) -> bool {
        node_id.0 < self.nodes.len()
    }

    /// Arena size, detached nodes included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_connected(&self, node_id: NodeId) -> bool {
        let mut cursor = Some(node_id);
        while let Some(node) = cursor {
            if node == self.root {
                return true;
            }
            cursor = self.parent(node);
        }
        false
    }

    fn rebuild_id_index(&mut self) {
        let mut next = HashMap::new();
        let mut stack = vec![self.root];
        while let Some(node) = stack.pop() {
            if let NodeType::Element(element) = &self.nodes[node.0].node_type {
                if let Some(id) = element.attrs.get("id") {
                    if !id.is_empty() {
                        next.entry(id.clone()).or_insert(node);
                    }
                }
            }
            for child in self.nodes[node.0].children.iter().rev() {
                stack.push(*child);
            }
        }
        self.id_index = next;
    }

    fn collect_elements_dfs(&self, node_id: NodeId, out: &mut Vec<NodeId>) {
        let mut stack = vec![node_id];
        while let Some(node) = stack.pop() {
            if matches!(self.nodes[node.0].node_type, NodeType::Element(_)) {
                out.push(node);
            }
            for child in self.nodes[node.0].children.iter().rev() {
                stack.push(*child);
            }
        }
    }

    fn all_element_nodes(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_elements_dfs(self.root, &mut out);
        out
    }

    /// Serializes a node. Attributes come out in name order.
    pub fn dump_node(&self, node_id: NodeId) -> String {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || {
            match &self.nodes[node_id.0].node_type {
                NodeType::Document => {
                    let mut out = String::new();
                    for child in &self.nodes[node_id.0].children {
                        out.push_str(&self.dump_node(*child));
                    }
                    out
                }
                NodeType::Text(text) => {
                    let raw = self
                        .parent(node_id)
                        .and_then(|parent| self.tag_name(parent))
                        .map(|tag| matches!(tag, "script" | "style"))
                        .unwrap_or(false);
                    if raw {
                        text.clone()
                    } else {
                        escape_text(text)
                    }
                }
                NodeType::Element(element) => {
                    let mut out = String::new();
                    out.push('<');
                    out.push_str(&element.tag_name);
                    for (k, v) in &element.attrs {
                        out.push(' ');
                        out.push_str(k);
                        out.push_str("=\"");
                        out.push_str(&escape_attr(v));
                        out.push('"');
                    }
                    out.push('>');
                    if is_void_tag(&element.tag_name) {
                        return out;
                    }
                    for child in &self.nodes[node_id.0].children {
                        out.push_str(&self.dump_node(*child));
                    }
                    out.push_str("</");
                    out.push_str(&element.tag_name);
                    out.push('>');
                    out
                }
            }
        })
    }
}

pub(crate) fn is_void_tag(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

fn escape_text(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}

fn has_class(element: &Element, class_name: &str) -> bool {
    element
        .attrs
        .get("class")
        .map(|classes| classes.split_whitespace().any(|c| c == class_name))
        .unwrap_or(false)
}

fn class_tokens(class_attr: Option<&str>) -> Vec<String> {
    class_attr
        .map(|value| {
            value
                .split_whitespace()
                .map(ToOwned::to_owned)
                .collect::<Vec<_>>()
        })
        .unwrap_or_default()
}

fn set_class_attr(element: &mut Element, classes: &[String]) {
    if classes.is_empty() {
        element.attrs.remove("class");
    } else {
        element.attrs.insert("class".to_string(), classes.join(" "));
    }
}

fn parse_style_declarations(style_attr: Option<&str>) -> Vec<(String, String)> {
    let mut out = Vec::new();
    let Some(style_attr) = style_attr else {
        return out;
    };

    for decl in style_attr.split(';') {
        let decl = decl.trim();
        if decl.is_empty() {
            continue;
        }
        let Some((name, value)) = decl.split_once(':') else {
            continue;
        };
        let name = name.trim().to_ascii_lowercase();
        if name.is_empty() {
            continue;
        }
        let value = value.trim().to_string();
        if let Some(pos) = out.iter().position(|(existing, _)| existing == &name) {
            out[pos].1 = value;
        } else {
            out.push((name, value));
        }
    }

    out
}

fn serialize_style_declarations(decls: &[(String, String)]) -> String {
    let mut out = String::new();
    for (idx, (name, value)) in decls.iter().enumerate() {
        if idx > 0 {
            out.push(' ');
        }
        out.push_str(name);
        out.push_str(": ");
        out.push_str(value);
        out.push(';');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_index_follows_attach_and_detach() -> Result<()> {
        let mut dom = parse_html("<div id='box'></div>")?;
        let container = dom.by_id("box").ok_or_else(|| Error::ElementNotFound("box".into()))?;

        let child = dom.create_detached_element("span");
        dom.set_attr(child, "id", "inner")?;
        assert_eq!(dom.by_id("inner"), None);

        dom.append_child(container, child)?;
        assert_eq!(dom.by_id("inner"), Some(child));

        dom.remove_node(child)?;
        assert_eq!(dom.by_id("inner"), None);
        Ok(())
    }

    #[test]
    fn append_child_rejects_cycles() -> Result<()> {
        let mut dom = parse_html("<div id='outer'><div id='inner'></div></div>")?;
        let outer = dom.by_id("outer").ok_or_else(|| Error::ElementNotFound("outer".into()))?;
        let inner = dom.by_id("inner").ok_or_else(|| Error::ElementNotFound("inner".into()))?;

        let err = dom
            .append_child(inner, outer)
            .expect_err("cycle should be rejected");
        assert_eq!(err, Error::Dom("appendChild would create a cycle".into()));
        Ok(())
    }

    #[test]
    fn style_set_adds_updates_and_removes_declarations() -> Result<()> {
        let mut dom = parse_html("<div id='f' style='color: red'></div>")?;
        let node = dom.by_id("f").ok_or_else(|| Error::ElementNotFound("f".into()))?;

        dom.style_set(node, "display", "none")?;
        assert_eq!(dom.attr(node, "style").as_deref(), Some("color: red; display: none;"));
        assert_eq!(dom.style_get(node, "display")?, "none");

        dom.style_set(node, "display", "block")?;
        assert_eq!(dom.style_get(node, "display")?, "block");

        dom.style_set(node, "display", "")?;
        dom.style_set(node, "color", "")?;
        assert_eq!(dom.attr(node, "style"), None);
        Ok(())
    }

    #[test]
    fn inner_html_round_trips_markup_and_reindexes_ids() -> Result<()> {
        let mut dom = parse_html("<div id='host'></div>")?;
        let host = dom.by_id("host").ok_or_else(|| Error::ElementNotFound("host".into()))?;

        dom.set_inner_html(host, "<img id='full' src='/src/1.png'><b>a &amp; b</b>")?;
        assert!(dom.by_id("full").is_some());
        assert_eq!(
            dom.inner_html(host)?,
            "<img id=\"full\" src=\"/src/1.png\"><b>a &amp; b</b>"
        );

        dom.set_inner_html(host, "")?;
        assert_eq!(dom.by_id("full"), None);
        assert_eq!(dom.inner_html(host)?, "");
        Ok(())
    }

    #[test]
    fn ancestor_counts_element_levels() -> Result<()> {
        let dom = parse_html(
            "<div id='c'><table><tbody><tr><td class='reply' id='reply1'></td></tr></tbody></table></div>",
        )?;
        let reply = dom.by_id("reply1").ok_or_else(|| Error::ElementNotFound("reply1".into()))?;
        assert_eq!(dom.ancestor(reply, 4), dom.by_id("c"));
        assert_eq!(dom.ancestor(reply, 5), None);
        Ok(())
    }

    #[test]
    fn set_title_creates_title_element_when_missing() -> Result<()> {
        let mut dom = parse_html("<html><head></head><body></body></html>")?;
        assert_eq!(dom.title(), "");
        dom.set_title("Thread 12")?;
        assert_eq!(dom.title(), "Thread 12");
        dom.set_title("(3 new)")?;
        assert_eq!(dom.title(), "(3 new)");
        assert_eq!(dom.elements_by_tag_from(dom.root(), "title").len(), 1);
        Ok(())
    }

    #[test]
    fn clone_subtree_can_strip_ids() -> Result<()> {
        let source = parse_html("<div id='post5'><span id='inner'>hi</span></div>")?;
        let post = source.by_id("post5").ok_or_else(|| Error::ElementNotFound("post5".into()))?;

        let mut target = parse_html("<body></body>")?;
        let body = target
            .first_by_tag("body")
            .ok_or_else(|| Error::ElementNotFound("body".into()))?;
        let copy = target.import_subtree(&source, post, body, true)?;

        assert_eq!(target.by_id("post5"), None);
        assert_eq!(target.by_id("inner"), None);
        assert_eq!(target.text_content(copy), "hi");

        let kept = target.import_subtree(&source, post, body, false)?;
        assert_eq!(target.by_id("post5"), Some(kept));
        Ok(())
    }

    #[test]
    fn copy_subtree_within_one_document() -> Result<()> {
        let mut dom = parse_html(
            "<body><div id='post5'><b id='x'>hi</b></div><div id='host'></div></body>",
        )?;
        let post = dom.by_id("post5").ok_or_else(|| Error::ElementNotFound("post5".into()))?;
        let host = dom.by_id("host").ok_or_else(|| Error::ElementNotFound("host".into()))?;

        dom.copy_subtree(post, host, true)?;
        assert_eq!(dom.inner_html(host)?, "<div><b>hi</b></div>");
        assert_eq!(dom.by_id("x").map(|node| dom.parent(node)), Some(Some(post)));
        Ok(())
    }
}
