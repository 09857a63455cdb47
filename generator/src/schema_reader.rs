//! Reads XSD schema documents into a [`SchemaTree`].
//!
//! The reader keeps only what the model builder needs: the element
//! hierarchy, attribute declarations, occurrence bounds, enumeration facets,
//! appinfo payloads and top-level simple types. While walking it derives the
//! flags the builder keys its decisions on: explicit-define detection,
//! choice membership and the mixed-content extension chain check.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::PathBuf;

use roxmltree::{Document, Node};
use thiserror::Error;
use tracing::debug;

use ome_xsd_model::{
    AttributeUse, ElementId, Occurs, SchemaAttribute, SchemaElement, SchemaTree, SimpleType,
    UNBOUNDED,
};

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: roxmltree::Error,
    },
}

/// Parses every schema file into one tree, in argument order.
pub fn read_schema_files(paths: &[PathBuf]) -> Result<SchemaTree, ReadError> {
    let mut reader = SchemaReader::new();
    for path in paths {
        let text = fs::read_to_string(path).map_err(|source| ReadError::Io {
            path: path.clone(),
            source,
        })?;
        let doc = Document::parse(&text).map_err(|source| ReadError::Parse {
            path: path.clone(),
            source,
        })?;
        reader.read_document(&doc, &text);
    }
    Ok(reader.finish())
}

/// Parses a single in-memory schema document.
#[cfg(test)]
pub fn read_schema_text(text: &str) -> Result<SchemaTree, roxmltree::Error> {
    let doc = Document::parse(text)?;
    let mut reader = SchemaReader::new();
    reader.read_document(&doc, text);
    Ok(reader.finish())
}

/// Per-document lookup context, borrowed from the parsed document.
struct DocContext<'a, 'input> {
    text: &'a str,
    target_namespace: String,
    complex_types: HashMap<String, Node<'a, 'input>>,
    top_elements: HashMap<String, Node<'a, 'input>>,
}

struct SchemaReader {
    tree: SchemaTree,
    root: ElementId,
    /// Type name to mixed-content flag, across all documents.
    mixed: HashMap<String, bool>,
    /// Type name to extension base, across all documents.
    bases: HashMap<String, String>,
}

impl SchemaReader {
    fn new() -> Self {
        let mut tree = SchemaTree::new();
        let root = tree.add_element(SchemaElement::new("(schema)"));
        tree.set_root(root);
        Self {
            tree,
            root,
            mixed: HashMap::new(),
            bases: HashMap::new(),
        }
    }

    fn read_document(&mut self, doc: &Document, text: &str) {
        let schema = doc.root_element();
        let mut ctx = DocContext {
            text,
            target_namespace: schema
                .attribute("targetNamespace")
                .unwrap_or_default()
                .to_owned(),
            complex_types: HashMap::new(),
            top_elements: HashMap::new(),
        };

        for child in schema.children().filter(Node::is_element) {
            match child.tag_name().name() {
                "complexType" => {
                    if let Some(name) = child.attribute("name") {
                        ctx.complex_types.insert(name.to_owned(), child);
                        self.record_type_info(name, child);
                    }
                }
                "element" => {
                    if let Some(name) = child.attribute("name") {
                        ctx.top_elements.insert(name.to_owned(), child);
                    }
                }
                "simpleType" => self.read_top_level_simple_type(child),
                other => debug!("skipping top-level {other}"),
            }
        }

        let top: Vec<Node> = schema
            .children()
            .filter(|n| n.is_element() && n.tag_name().name() == "element")
            .collect();
        for node in top {
            let id = self.read_element(&ctx, node, true, None);
            self.tree.add_child(self.root, id);
        }

        self.check_mixed_chains();
    }

    fn finish(self) -> SchemaTree {
        self.tree
    }

    /// Remembers the mixed flag and extension base of a complex type so the
    /// chain check can see across elements and documents.
    fn record_type_info(&mut self, name: &str, complex_type: Node) {
        let mixed = complex_type.attribute("mixed") == Some("true");
        self.mixed.insert(name.to_owned(), mixed);
        if let Some(base) = extension_base(complex_type) {
            self.bases.insert(name.to_owned(), base);
        }
    }

    fn read_element<'a, 'input>(
        &mut self,
        ctx: &DocContext<'a, 'input>,
        node: Node<'a, 'input>,
        top_level: bool,
        choice: Option<Occurs>,
    ) -> ElementId {
        let reference = node.attribute("ref").map(strip_prefix);
        let name = reference
            .or_else(|| node.attribute("name"))
            .unwrap_or_default();

        let mut element = SchemaElement::new(name);
        element.top_level = top_level;
        element.namespace = ctx.target_namespace.clone();
        element.choice = choice;
        element.min_occurs = parse_occurs(node.attribute("minOccurs"), 1);
        element.max_occurs = parse_occurs(node.attribute("maxOccurs"), 1);
        element.explicit_define = node.attribute("name").is_some()
            && node.attribute("type").is_none()
            && node.attribute("ref").is_none();

        // For references, the declaration to read content from is the
        // referenced top-level element.
        let decl = if reference.is_some() {
            ctx.top_elements.get(name).copied().unwrap_or(node)
        } else {
            node
        };

        if let Some(declared) = decl.attribute("type") {
            element.xsd_type = declared.to_owned();
        }
        element.appinfo = appinfo_fragment(ctx, decl).or_else(|| appinfo_fragment(ctx, node));

        if let Some(simple) = child_named(decl, "simpleType") {
            // Inline simple content: the restriction base becomes the type
            // and the enumeration facets become the value list.
            if let Some(restriction) = child_named(simple, "restriction") {
                if let Some(base) = restriction.attribute("base") {
                    element.xsd_type = base.to_owned();
                }
                element.values = enumeration_values(restriction);
            }
        }

        let complex_def = child_named(decl, "complexType").or_else(|| {
            let type_name = strip_prefix(&element.xsd_type);
            ctx.complex_types.get(type_name).copied()
        });

        let id = self.tree.add_element(element);

        if let Some(def) = complex_def {
            self.read_complex_type(ctx, id, name, def);
        }

        id
    }

    fn read_complex_type<'a, 'input>(
        &mut self,
        ctx: &DocContext<'a, 'input>,
        id: ElementId,
        name: &str,
        def: Node<'a, 'input>,
    ) {
        {
            let element = self.tree.element_mut(id);
            element.is_complex = true;
            element.is_abstract = def.attribute("abstract") == Some("true");
            if element.appinfo.is_none() {
                element.appinfo = appinfo_fragment(ctx, def);
            }
        }
        self.record_type_info(name, def);

        // Attributes can sit directly on the type or inside an extension.
        let mut content = def;
        for wrapper in ["complexContent", "simpleContent"] {
            if let Some(c) = child_named(def, wrapper) {
                if let Some(extension) = child_named(c, "extension") {
                    content = extension;
                    if let Some(base) = extension.attribute("base") {
                        self.tree.element_mut(id).base = Some(strip_prefix(base).to_owned());
                    }
                }
            }
        }

        let attributes: Vec<SchemaAttribute> = content
            .children()
            .filter(|n| n.is_element() && n.tag_name().name() == "attribute")
            .map(|n| read_attribute(ctx, n))
            .collect();
        self.tree.element_mut(id).attributes = attributes;

        for group in ["sequence", "all", "choice"] {
            if let Some(particle) = child_named(content, group) {
                self.read_particle(ctx, id, particle, None);
            }
        }
    }

    /// Walks a content model particle, attaching element children to `parent`.
    fn read_particle<'a, 'input>(
        &mut self,
        ctx: &DocContext<'a, 'input>,
        parent: ElementId,
        particle: Node<'a, 'input>,
        choice: Option<Occurs>,
    ) {
        let choice = if particle.tag_name().name() == "choice" {
            Some(Occurs {
                min: parse_occurs(particle.attribute("minOccurs"), 1),
                max: parse_occurs(particle.attribute("maxOccurs"), 1),
            })
        } else {
            choice
        };
        for child in particle.children().filter(Node::is_element) {
            match child.tag_name().name() {
                "element" => {
                    let id = self.read_element(ctx, child, false, choice);
                    self.tree.add_child(parent, id);
                }
                "sequence" | "choice" | "all" => {
                    self.read_particle(ctx, parent, child, choice);
                }
                "any" => debug!("skipping wildcard particle"),
                _ => {}
            }
        }
    }

    fn read_top_level_simple_type(&mut self, node: Node) {
        let Some(name) = node.attribute("name") else {
            return;
        };
        let mut simple_type = SimpleType {
            name: name.to_owned(),
            ..Default::default()
        };
        if let Some(restriction) = child_named(node, "restriction") {
            simple_type.base = restriction.attribute("base").map(str::to_owned);
            simple_type.values = enumeration_values(restriction);
        }
        if let Some(union) = child_named(node, "union") {
            simple_type.union_of = union
                .attribute("memberTypes")
                .unwrap_or_default()
                .split_whitespace()
                .map(str::to_owned)
                .collect();
        }
        self.tree.add_simple_type(simple_type);
    }

    /// Flags every element whose extension chain mixes mixed and
    /// element-only content; the builder skips those with an error.
    fn check_mixed_chains(&mut self) {
        let ids: Vec<ElementId> = self.tree.ids().collect();
        for id in ids {
            let (name, base) = {
                let e = self.tree.element(id);
                (e.name.clone(), e.base.clone())
            };
            let own = self.mixed.get(&name).copied().unwrap_or(false);
            let mut chain = base;
            let mut visited = HashSet::new();
            while let Some(b) = chain {
                if !visited.insert(b.clone()) {
                    break;
                }
                if let Some(&ancestor_mixed) = self.mixed.get(&b) {
                    if ancestor_mixed != own {
                        self.tree.element_mut(id).mixed_extension_error = true;
                        break;
                    }
                }
                chain = self.bases.get(&b).cloned();
            }
        }
    }
}

fn read_attribute<'a, 'input>(ctx: &DocContext<'a, 'input>, node: Node<'a, 'input>) -> SchemaAttribute {
    let name = node.attribute("name").unwrap_or_default();
    let mut attribute = SchemaAttribute::new(name, "xsd:string");
    if let Some(declared) = node.attribute("type") {
        attribute.data_type = declared.to_owned();
    }
    attribute.use_ = match node.attribute("use") {
        Some("required") => AttributeUse::Required,
        _ => AttributeUse::Optional,
    };
    attribute.default = node.attribute("default").map(str::to_owned);
    attribute.appinfo = appinfo_fragment(ctx, node);

    if let Some(simple) = child_named(node, "simpleType") {
        if let Some(restriction) = child_named(simple, "restriction") {
            if let Some(base) = restriction.attribute("base") {
                attribute.data_type = base.to_owned();
            }
            attribute.values = enumeration_values(restriction);
        }
        if let Some(union) = child_named(simple, "union") {
            attribute.union_of = union
                .attribute("memberTypes")
                .unwrap_or_default()
                .split_whitespace()
                .map(str::to_owned)
                .collect();
        }
    }
    attribute
}

fn child_named<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|n| n.is_element() && n.tag_name().name() == name)
}

fn enumeration_values(restriction: Node) -> Vec<String> {
    restriction
        .children()
        .filter(|n| n.is_element() && n.tag_name().name() == "enumeration")
        .filter_map(|n| n.attribute("value"))
        .map(str::to_owned)
        .collect()
}

fn extension_base(complex_type: Node) -> Option<String> {
    for wrapper in ["complexContent", "simpleContent"] {
        if let Some(content) = child_named(complex_type, wrapper) {
            if let Some(extension) = child_named(content, "extension") {
                return extension.attribute("base").map(|b| strip_prefix(b).to_owned());
            }
        }
    }
    None
}

/// The raw inner payload of an `<annotation><appinfo>` block, if present.
/// The payload keeps its source form; the model parses it lazily.
fn appinfo_fragment<'a, 'input>(ctx: &DocContext<'a, 'input>, node: Node<'a, 'input>) -> Option<String> {
    let annotation = child_named(node, "annotation")?;
    let appinfo = child_named(annotation, "appinfo")?;
    let payload = appinfo.children().find(Node::is_element)?;
    Some(ctx.text[payload.range()].to_owned())
}

fn strip_prefix(name: &str) -> &str {
    name.rsplit(':').next().unwrap_or(name)
}

fn parse_occurs(value: Option<&str>, default: u32) -> u32 {
    match value {
        None => default,
        Some("unbounded") => UNBOUNDED,
        Some(v) => v.parse().unwrap_or(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: &str = r#"
<xsd:schema xmlns:xsd="http://www.w3.org/2001/XMLSchema"
            targetNamespace="http://example.org/Schemas/OME">
  <xsd:element name="OME">
    <xsd:complexType>
      <xsd:sequence>
        <xsd:element ref="Image" minOccurs="0" maxOccurs="unbounded"/>
        <xsd:element name="Typed" type="ImageType" minOccurs="0"/>
      </xsd:sequence>
    </xsd:complexType>
  </xsd:element>
  <xsd:element name="Image">
    <xsd:annotation>
      <xsd:appinfo><xsdfu><plural>Images</plural></xsdfu></xsd:appinfo>
    </xsd:annotation>
    <xsd:complexType>
      <xsd:sequence>
        <xsd:element name="Kind" minOccurs="0">
          <xsd:simpleType>
            <xsd:restriction base="xsd:string">
              <xsd:enumeration value="Gas"/>
              <xsd:enumeration value="OTHER"/>
            </xsd:restriction>
          </xsd:simpleType>
        </xsd:element>
        <xsd:choice minOccurs="0" maxOccurs="unbounded">
          <xsd:element name="Rectangle" type="xsd:string"/>
          <xsd:element name="Ellipse" type="xsd:string"/>
        </xsd:choice>
      </xsd:sequence>
      <xsd:attribute name="ID" use="required" type="LSID"/>
      <xsd:attribute name="Fill" default="black" type="xsd:string"/>
    </xsd:complexType>
  </xsd:element>
  <xsd:complexType name="ImageType" mixed="true">
    <xsd:sequence/>
  </xsd:complexType>
  <xsd:element name="Derived">
    <xsd:complexType>
      <xsd:complexContent>
        <xsd:extension base="ImageType">
          <xsd:attribute name="Extra" type="xsd:string"/>
        </xsd:extension>
      </xsd:complexContent>
    </xsd:complexType>
  </xsd:element>
  <xsd:simpleType name="LSID">
    <xsd:restriction base="xsd:string"/>
  </xsd:simpleType>
  <xsd:simpleType name="Hex40">
    <xsd:union memberTypes="HexString LSID"/>
  </xsd:simpleType>
</xsd:schema>
"#;

    fn tree() -> SchemaTree {
        read_schema_text(SCHEMA).unwrap()
    }

    fn find(tree: &SchemaTree, name: &str) -> ElementId {
        tree.ids()
            .find(|&id| tree.element(id).name == name)
            .unwrap_or_else(|| panic!("{name} not in tree"))
    }

    #[test]
    fn explicit_define_detection() {
        let tree = tree();
        assert!(tree.element(find(&tree, "OME")).explicit_define);
        let image_top = tree
            .ids()
            .find(|&id| {
                let e = tree.element(id);
                e.name == "Image" && e.top_level
            })
            .unwrap();
        assert!(tree.element(image_top).explicit_define);
        // A typed element and a reference are not explicit defines.
        assert!(!tree.element(find(&tree, "Typed")).explicit_define);
        let image_ref = tree.element(find(&tree, "OME")).children[0];
        assert!(!tree.element(image_ref).explicit_define);
    }

    #[test]
    fn reference_resolves_target_content() {
        let tree = tree();
        let ome = find(&tree, "OME");
        let image_ref = tree.element(ome).children[0];
        let e = tree.element(image_ref);
        assert_eq!(e.name, "Image");
        assert_eq!(e.min_occurs, 0);
        assert_eq!(e.max_occurs, UNBOUNDED);
        assert!(e.is_complex);
        // Content and appinfo come from the referenced declaration.
        assert_eq!(e.attributes.len(), 2);
        assert!(e.appinfo.as_deref().unwrap().contains("Images"));
    }

    #[test]
    fn attribute_details() {
        let tree = tree();
        let image = find(&tree, "Image");
        let attrs = &tree.element(image).attributes;
        assert_eq!(attrs[0].name, "ID");
        assert_eq!(attrs[0].data_type, "LSID");
        assert_eq!(attrs[0].use_, AttributeUse::Required);
        assert_eq!(attrs[1].name, "Fill");
        assert_eq!(attrs[1].use_, AttributeUse::Optional);
        assert_eq!(attrs[1].default.as_deref(), Some("black"));
    }

    #[test]
    fn inline_simple_type_becomes_enumeration() {
        let tree = tree();
        let kind = find(&tree, "Kind");
        let e = tree.element(kind);
        assert_eq!(e.xsd_type, "xsd:string");
        assert_eq!(e.values, ["Gas", "OTHER"]);
        assert!(!e.is_complex);
    }

    #[test]
    fn choice_membership() {
        let tree = tree();
        let rectangle = tree.element(find(&tree, "Rectangle"));
        let occurs = rectangle.choice.unwrap();
        assert_eq!(occurs.min, 0);
        assert_eq!(occurs.max, UNBOUNDED);
        assert_eq!(rectangle.max_occurs, 1);
        assert!(tree.element(find(&tree, "Ellipse")).choice.is_some());
    }

    #[test]
    fn top_level_simple_types() {
        let tree = tree();
        let lsid = tree
            .simple_types()
            .iter()
            .find(|st| st.name == "LSID")
            .unwrap();
        assert_eq!(lsid.base.as_deref(), Some("xsd:string"));
        let hex = tree
            .simple_types()
            .iter()
            .find(|st| st.name == "Hex40")
            .unwrap();
        assert_eq!(hex.union_of, ["HexString", "LSID"]);
    }

    #[test]
    fn mixed_extension_chain_is_flagged() {
        let tree = tree();
        let derived = tree.element(find(&tree, "Derived"));
        assert_eq!(derived.base.as_deref(), Some("ImageType"));
        assert!(derived.mixed_extension_error);
        assert!(!tree.element(find(&tree, "Image")).mixed_extension_error);
    }

    #[test]
    fn namespace_is_carried() {
        let tree = tree();
        let image = tree.element(find(&tree, "Image"));
        assert_eq!(image.namespace, "http://example.org/Schemas/OME");
    }
}
