//! The raw schema tree handed to the model builder.
//!
//! Elements live in a single arena and refer to each other by [`ElementId`];
//! the tree carries no resolved semantics, only what the schema documents
//! declared (plus a few flags the reader derives while parsing, such as
//! explicit-define detection and the mixed-content chain check).

/// Sentinel for `maxOccurs="unbounded"`.
pub const UNBOUNDED: u32 = 9999;

/// Index of an element inside a [`SchemaTree`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ElementId(usize);

/// Occurrence bounds of a particle.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Occurs {
    pub min: u32,
    pub max: u32,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum AttributeUse {
    #[default]
    Optional,
    Required,
}

/// An attribute declaration attached to an element.
#[derive(Clone, Debug, Default)]
pub struct SchemaAttribute {
    pub name: String,
    /// Declared type, or the restriction base for inline simple types.
    pub data_type: String,
    pub use_: AttributeUse,
    pub default: Option<String>,
    /// Enumeration facet values, in declaration order.
    pub values: Vec<String>,
    /// Member type names when the attribute's simple type is a union.
    pub union_of: Vec<String>,
    /// Raw `<appinfo>` payload, if any.
    pub appinfo: Option<String>,
}

impl SchemaAttribute {
    pub fn new(name: &str, data_type: &str) -> Self {
        Self {
            name: name.to_owned(),
            data_type: data_type.to_owned(),
            ..Default::default()
        }
    }
}

/// An element declaration (or element reference) in the schema tree.
#[derive(Clone, Debug)]
pub struct SchemaElement {
    pub name: String,
    /// Declared type; equals `name` for self-typed explicit defines.
    pub xsd_type: String,
    /// Extension or restriction base, namespace prefix stripped.
    pub base: Option<String>,
    /// Target namespace of the defining schema document.
    pub namespace: String,
    pub min_occurs: u32,
    pub max_occurs: u32,
    /// Whether the element carries a complex content model.
    pub is_complex: bool,
    pub is_abstract: bool,
    /// Declared directly under the schema root.
    pub top_level: bool,
    /// Declared with a `name` and neither `type` nor `ref`.
    pub explicit_define: bool,
    /// Set when the extension chain mixes mixed and element-only content.
    pub mixed_extension_error: bool,
    /// Raw `<appinfo>` payload, if any.
    pub appinfo: Option<String>,
    /// Enumeration facet values for elements of inline simple type.
    pub values: Vec<String>,
    /// Occurrence bounds of the enclosing `<choice>`, if the element is a
    /// choice alternative.
    pub choice: Option<Occurs>,
    pub attributes: Vec<SchemaAttribute>,
    pub children: Vec<ElementId>,
}

impl SchemaElement {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            xsd_type: name.to_owned(),
            base: None,
            namespace: String::new(),
            min_occurs: 1,
            max_occurs: 1,
            is_complex: false,
            is_abstract: false,
            top_level: false,
            explicit_define: false,
            mixed_extension_error: false,
            appinfo: None,
            values: Vec::new(),
            choice: None,
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }
}

/// A top-level `<simpleType>` definition.
#[derive(Clone, Debug, Default)]
pub struct SimpleType {
    pub name: String,
    /// Restriction base, absent for unions.
    pub base: Option<String>,
    pub values: Vec<String>,
    pub union_of: Vec<String>,
}

/// Arena of schema elements plus the top-level simple type definitions.
#[derive(Clone, Debug, Default)]
pub struct SchemaTree {
    elements: Vec<SchemaElement>,
    root: Option<ElementId>,
    simple_types: Vec<SimpleType>,
}

impl SchemaTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_element(&mut self, element: SchemaElement) -> ElementId {
        let id = ElementId(self.elements.len());
        self.elements.push(element);
        id
    }

    pub fn add_child(&mut self, parent: ElementId, child: ElementId) {
        self.elements[parent.0].children.push(child);
    }

    pub fn element(&self, id: ElementId) -> &SchemaElement {
        &self.elements[id.0]
    }

    pub fn element_mut(&mut self, id: ElementId) -> &mut SchemaElement {
        &mut self.elements[id.0]
    }

    pub fn set_root(&mut self, id: ElementId) {
        self.root = Some(id);
    }

    pub fn root(&self) -> Option<ElementId> {
        self.root
    }

    pub fn add_simple_type(&mut self, simple_type: SimpleType) {
        self.simple_types.push(simple_type);
    }

    pub fn simple_types(&self) -> &[SimpleType] {
        &self.simple_types
    }

    pub fn ids(&self) -> impl Iterator<Item = ElementId> {
        (0..self.elements.len()).map(ElementId)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arena_round_trip() {
        let mut tree = SchemaTree::new();
        let root = tree.add_element(SchemaElement::new("OME"));
        tree.set_root(root);
        let child = tree.add_element(SchemaElement::new("Image"));
        tree.add_child(root, child);

        assert_eq!(tree.root(), Some(root));
        assert_eq!(tree.element(root).children, vec![child]);
        assert_eq!(tree.element(child).name, "Image");
        assert_eq!(tree.element(child).xsd_type, "Image");
    }

    #[test]
    fn element_defaults() {
        let e = SchemaElement::new("Pixels");
        assert_eq!(e.min_occurs, 1);
        assert_eq!(e.max_occurs, 1);
        assert!(!e.explicit_define);
        assert!(e.choice.is_none());
    }
}
