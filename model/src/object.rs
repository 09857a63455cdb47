//! Model objects: the types the generator will emit classes for.

use std::collections::HashSet;

use crate::appinfo::Appinfo;
use crate::error::ModelProcessingError;
use crate::model::OmeModel;
use crate::naming;
use crate::property::{ModelProperty, ReferenceDelegate};
use crate::schema::{ElementId, SchemaAttribute, SchemaTree};
use crate::xstypes::OrderedMap;

/// A schema element promoted to a generated type, carrying its properties in
/// declaration order.
#[derive(Clone, Debug)]
pub struct ModelObject {
    pub element: ElementId,
    pub name: String,
    pub xsd_type: String,
    /// Extension base, if the element's type derives from another.
    pub base: Option<String>,
    pub namespace: String,
    /// Name of the element this one was first encountered under.
    pub parent_name: Option<String>,
    pub properties: OrderedMap<ModelProperty>,
    pub appinfo: Appinfo,
}

impl ModelObject {
    pub fn from_element(tree: &SchemaTree, element: ElementId, parent: Option<ElementId>) -> Self {
        let e = tree.element(element);
        Self {
            element,
            name: e.name.clone(),
            xsd_type: e.xsd_type.clone(),
            base: e.base.clone(),
            namespace: e.namespace.clone(),
            parent_name: parent.map(|p| tree.element(p).name.clone()),
            properties: OrderedMap::new(),
            appinfo: Appinfo::parse(e.appinfo.as_deref()),
        }
    }

    pub fn add_attribute(&mut self, attribute: &SchemaAttribute) {
        let prop = ModelProperty::from_attribute(attribute, &self.name);
        self.properties.insert(attribute.name.clone(), prop);
    }

    pub fn add_element(&mut self, tree: &SchemaTree, child: ElementId) {
        let name = tree.element(child).name.clone();
        let prop = ModelProperty::from_element(tree, child, &self.name);
        self.properties.insert(name, prop);
    }

    pub fn add_reference(&mut self, reference: ReferenceDelegate) {
        let key = reference.name.clone();
        let prop = ModelProperty::from_reference(reference, &self.name);
        self.properties.insert(key, prop);
    }

    pub fn is_settings(&self) -> bool {
        self.name.ends_with("Settings")
    }

    pub fn is_abstract(&self, model: &OmeModel) -> bool {
        self.appinfo.is_abstract || model.tree().element(self.element).is_abstract
    }

    pub fn is_abstract_proprietary(&self, model: &OmeModel) -> bool {
        self.appinfo.is_abstract_proprietary
            || model.session().overrides.abstract_proprietary.contains(&self.name)
    }

    /// Whether the object is an annotation: named `Annotation` or derived
    /// from it through the base chain.
    pub fn is_annotation(&self, model: &OmeModel) -> bool {
        if self.name == "Annotation" {
            return true;
        }
        let mut visited = HashSet::new();
        let mut base = self.base.clone();
        while let Some(b) = base {
            if b == "Annotation" {
                return true;
            }
            if !visited.insert(b.clone()) {
                return false;
            }
            base = model.get_object_by_name(&b).and_then(|o| o.base.clone());
        }
        false
    }

    /// Whether the object is a reference type: based on `Reference`, or typed
    /// as another object that is.
    pub fn is_reference(&self, model: &OmeModel) -> bool {
        if self.base.as_deref() == Some("Reference") {
            return true;
        }
        if let Some(type_object) = model.get_object_by_name(&self.xsd_type) {
            if type_object.name != self.name && type_object.is_reference(model) {
                return true;
            }
        }
        false
    }

    pub fn is_annotated(&self, model: &OmeModel) -> bool {
        self.properties
            .values()
            .any(|p| p.name(model) == "AnnotationRef")
    }

    /// Whether the object has a non-unique `Name` property.
    pub fn is_named(&self, model: &OmeModel) -> bool {
        self.properties
            .values()
            .any(|p| p.name(model) == "Name" && !p.appinfo.is_unique)
    }

    pub fn is_described(&self, model: &OmeModel) -> bool {
        self.properties
            .values()
            .any(|p| p.name(model) == "Description")
    }

    pub fn is_global(&self, model: &OmeModel) -> bool {
        let global = self.appinfo.is_global;
        if self.is_reference(model) {
            let target = naming::strip_ref_suffix(&self.xsd_type);
            if let Some(referenced) = model.get_object_by_name(target) {
                if referenced.name == self.name {
                    return global;
                }
                return global || referenced.is_global(model);
            }
        }
        global
    }

    /// The base class emitted for this object: the language override for the
    /// declared base, the declared base itself, the element's distinct type
    /// name, or the language default.
    pub fn base_class(&self, model: &OmeModel) -> String {
        let lang = &model.session().lang;
        if let Some(base) = &self.base {
            if let Some(mapped) = lang.base_type(base) {
                return mapped.to_owned();
            }
            return base.clone();
        }
        if self.xsd_type != self.name {
            return self.xsd_type.clone();
        }
        lang.default_base_class().to_owned()
    }

    /// Properties inherited through the base chain, nearest base first.
    pub fn base_object_properties<'a>(&self, model: &'a OmeModel) -> Vec<&'a ModelProperty> {
        let mut props = Vec::new();
        let mut visited = HashSet::new();
        let mut base = self.base.clone();
        while let Some(b) = base {
            if !visited.insert(b.clone()) {
                break;
            }
            match model.get_object_by_name(&b) {
                Some(o) => {
                    props.extend(o.properties.values());
                    base = o.base.clone();
                }
                None => break,
            }
        }
        props
    }

    /// For reference objects, the resolved language type of their `ID`
    /// property.
    pub fn ref_node_name(&self, model: &OmeModel) -> Result<Option<String>, ModelProcessingError> {
        if self.base.as_deref() == Some("Reference") {
            if let Some(id_prop) = self.properties.get("ID") {
                return id_prop.lang_type(model).map(Some);
            }
        }
        Ok(None)
    }

    /// The instance variable stem other objects use when linking to this one.
    pub fn instance_variable_name(&self, _model: &OmeModel) -> Result<String, ModelProcessingError> {
        Ok(naming::lower_case_prefix(naming::strip_ref_suffix(&self.name)))
    }
}
