//! In-memory settings document model
//!
//! A [`SettingsDocument`] is a root element holding an ordered list of
//! [`Section`]s, each holding an ordered list of [`Entry`] values. The model
//! mirrors the layout of the file, so duplicate section names and duplicate
//! keys survive a load/save cycle. Lookups always return the first match in
//! document order.
//!
//! Anything the store does not interpret (comments, foreign elements, extra
//! attributes) is kept in place so hand edits are written back unchanged.

use serde::{Deserialize, Serialize};

/// Default name of the document root element
pub const DEFAULT_ROOT_ELEMENT: &str = "settings";

/// Element name used for every key/value entry
pub const ENTRY_ELEMENT: &str = "add";

/// Attribute holding an entry's key
pub const KEY_ATTRIBUTE: &str = "key";

/// Attribute holding an entry's value
pub const VALUE_ATTRIBUTE: &str = "value";

// =============================================================================
// Nodes and Attributes
// =============================================================================

/// A child of the root element or of a section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Node<T> {
    /// A section (under the root) or an entry (under a section)
    Item(T),
    /// Raw XML kept verbatim: comments, processing instructions, stray text
    /// and elements the store does not use
    Markup(String),
}

impl<T> Node<T> {
    /// The section or entry, if this node is one
    pub fn item(&self) -> Option<&T> {
        match self {
            Node::Item(item) => Some(item),
            Node::Markup(_) => None,
        }
    }

    fn item_mut(&mut self) -> Option<&mut T> {
        match self {
            Node::Item(item) => Some(item),
            Node::Markup(_) => None,
        }
    }
}

/// An attribute with its decoded value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

// =============================================================================
// Entry
// =============================================================================

/// A single `<add key=".." value=".."/>` element.
///
/// Both attributes are optional because hand-edited files may omit them.
/// Entries written through the store always carry both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub(crate) key: Option<String>,
    pub(crate) value: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub(crate) attributes: Vec<Attribute>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) content: Option<String>,
}

impl Entry {
    /// Create a complete entry
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::from_attributes(Some(key.into()), Some(value.into()))
    }

    /// Create an entry from possibly missing attributes
    pub fn from_attributes(key: Option<String>, value: Option<String>) -> Self {
        Self {
            key,
            value,
            attributes: Vec::new(),
            content: None,
        }
    }

    /// The `key` attribute, if present
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// The `value` attribute, if present
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Attributes other than `key` and `value`
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Raw XML nested inside the element, if any
    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    fn matches(&self, key: &str) -> bool {
        self.key.as_deref() == Some(key)
    }

    /// Key/value pair if the entry is readable (non-empty key, present value)
    fn pair(&self) -> Option<(String, String)> {
        match (self.key.as_deref(), self.value.as_deref()) {
            (Some(key), Some(value)) if !key.is_empty() => {
                Some((key.to_string(), value.to_string()))
            }
            _ => None,
        }
    }
}

// =============================================================================
// Section
// =============================================================================

/// A named child of the root element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub(crate) name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub(crate) attributes: Vec<Attribute>,
    pub(crate) children: Vec<Node<Entry>>,
}

impl Section {
    /// Create an empty section
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_entries(name, Vec::new())
    }

    /// Create a section with the given entries
    pub fn with_entries(name: impl Into<String>, entries: Vec<Entry>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: entries.into_iter().map(Node::Item).collect(),
        }
    }

    /// Section element name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attributes of the section element
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Entries and kept markup in document order
    pub fn children(&self) -> &[Node<Entry>] {
        &self.children
    }

    /// All entries in document order, including incomplete ones
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.children.iter().filter_map(Node::item)
    }

    /// Number of entries (including incomplete ones)
    pub fn len(&self) -> usize {
        self.entries().count()
    }

    /// True if the section has no entries
    pub fn is_empty(&self) -> bool {
        self.entries().next().is_none()
    }

    /// First entry whose key equals `key`
    pub fn find(&self, key: &str) -> Option<&Entry> {
        self.entries().find(|e| e.matches(key))
    }

    /// Readable key/value pairs in document order.
    ///
    /// Entries with an empty or missing key, or a missing value, are skipped.
    /// Duplicate keys are returned as-is.
    pub fn pairs(&self) -> Vec<(String, String)> {
        self.entries().filter_map(Entry::pair).collect()
    }

    /// Overwrite the first entry matching `key`, or append a new one.
    ///
    /// Returns `true` if a new entry was appended.
    pub fn upsert(&mut self, key: &str, value: &str) -> bool {
        let existing = self
            .children
            .iter_mut()
            .filter_map(Node::item_mut)
            .find(|e| e.matches(key));
        match existing {
            Some(entry) => {
                entry.value = Some(value.to_string());
                false
            }
            None => {
                self.children.push(Node::Item(Entry::new(key, value)));
                true
            }
        }
    }

    /// Remove the first entry matching `key`
    pub fn remove(&mut self, key: &str) -> Option<Entry> {
        let index = self
            .children
            .iter()
            .position(|n| n.item().is_some_and(|e| e.matches(key)))?;
        match self.children.remove(index) {
            Node::Item(entry) => Some(entry),
            Node::Markup(_) => None,
        }
    }
}

// =============================================================================
// Document
// =============================================================================

/// The whole settings file held in memory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsDocument {
    pub(crate) root: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub(crate) attributes: Vec<Attribute>,
    /// Markup before the root element (after the declaration)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub(crate) prolog: Vec<String>,
    pub(crate) children: Vec<Node<Section>>,
    /// Markup after the root element
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub(crate) epilog: Vec<String>,
}

impl Default for SettingsDocument {
    fn default() -> Self {
        Self::new(DEFAULT_ROOT_ELEMENT)
    }
}

impl SettingsDocument {
    /// Create an empty document with the given root element name
    pub fn new(root: impl Into<String>) -> Self {
        Self::with_sections(root, Vec::new())
    }

    /// Create a document from already-built sections
    pub fn with_sections(root: impl Into<String>, sections: Vec<Section>) -> Self {
        Self {
            root: root.into(),
            attributes: Vec::new(),
            prolog: Vec::new(),
            children: sections.into_iter().map(Node::Item).collect(),
            epilog: Vec::new(),
        }
    }

    /// Root element name
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Attributes of the root element
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Sections and kept markup in document order
    pub fn children(&self) -> &[Node<Section>] {
        &self.children
    }

    /// Comments and processing instructions before the root element
    pub fn prolog(&self) -> &[String] {
        &self.prolog
    }

    /// Comments and processing instructions after the root element
    pub fn epilog(&self) -> &[String] {
        &self.epilog
    }

    /// All sections in document order
    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        self.children.iter().filter_map(Node::item)
    }

    /// Section names in document order, duplicates included
    pub fn section_names(&self) -> Vec<String> {
        self.sections().map(|s| s.name.clone()).collect()
    }

    /// First section with the given name
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections().find(|s| s.name == name)
    }

    /// Mutable access to the first section with the given name
    pub fn section_mut(&mut self, name: &str) -> Option<&mut Section> {
        self.children
            .iter_mut()
            .filter_map(Node::item_mut)
            .find(|s| s.name == name)
    }

    /// First section with the given name, appending an empty one if missing
    pub fn section_or_insert(&mut self, name: &str) -> &mut Section {
        let index = match self.position(name) {
            Some(index) => index,
            None => {
                self.children.push(Node::Item(Section::new(name)));
                self.children.len() - 1
            }
        };
        match &mut self.children[index] {
            Node::Item(section) => section,
            Node::Markup(_) => unreachable!("position only matches sections"),
        }
    }

    /// Remove the first section with the given name
    pub fn remove_section(&mut self, name: &str) -> Option<Section> {
        let index = self.position(name)?;
        match self.children.remove(index) {
            Node::Item(section) => Some(section),
            Node::Markup(_) => None,
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.children
            .iter()
            .position(|n| n.item().is_some_and(|s| s.name == name))
    }
}
