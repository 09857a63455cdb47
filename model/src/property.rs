//! Model properties and the type resolution logic behind them.
//!
//! A [`ModelProperty`] is one instance variable of a model object. It wraps a
//! [`Delegate`] naming the schema construct it came from and answers all
//! derived questions (language type, cardinality, naming) against the owning
//! [`OmeModel`], which is passed to each resolution method rather than stored.

use std::collections::HashSet;

use tracing::debug;

use crate::appinfo::Appinfo;
use crate::error::ModelProcessingError;
use crate::model::OmeModel;
use crate::naming;
use crate::schema::{AttributeUse, ElementId, SchemaAttribute, SchemaTree, UNBOUNDED};

/// A synthesized stand-in for properties that have no schema construct of
/// their own: forward references added for settings objects and injected back
/// references.
#[derive(Clone, Debug)]
pub struct ReferenceDelegate {
    pub name: String,
    pub data_type: String,
    pub plural: Option<String>,
    pub min_occurs: u32,
    pub max_occurs: u32,
    pub namespace: Option<String>,
}

impl ReferenceDelegate {
    /// A back reference to `data_type`. The name carries a marker so that
    /// synthesized properties never collide with declared ones.
    pub fn back_reference(data_type: &str, plural: Option<String>) -> Self {
        Self {
            name: format!("{data_type}_BackReference"),
            data_type: data_type.to_owned(),
            plural,
            min_occurs: 0,
            max_occurs: UNBOUNDED,
            namespace: None,
        }
    }

    /// A forward reference of exactly one, used for settings objects.
    pub fn settings_reference(ref_type: &str, namespace: &str) -> Self {
        Self {
            name: ref_type.to_owned(),
            data_type: ref_type.to_owned(),
            plural: None,
            min_occurs: 1,
            max_occurs: 1,
            namespace: Some(namespace.to_owned()),
        }
    }
}

/// The schema construct a property was built from.
#[derive(Clone, Debug)]
pub enum Delegate {
    Attribute(SchemaAttribute),
    Element(ElementId),
    Reference(ReferenceDelegate),
}

/// A single property of a model object.
#[derive(Clone, Debug)]
pub struct ModelProperty {
    pub delegate: Delegate,
    /// Name of the owning model object.
    pub parent: String,
    pub is_attribute: bool,
    pub is_back_reference: bool,
    /// Whether the element sits inside a `<choice>` group.
    pub is_choice: bool,
    /// `Owner.Property` composite for injected back references; keys the
    /// accessor name override table.
    pub key: Option<String>,
    pub appinfo: Appinfo,
}

impl ModelProperty {
    pub fn from_attribute(attribute: &SchemaAttribute, parent: &str) -> Self {
        let appinfo = Appinfo::parse(attribute.appinfo.as_deref());
        Self {
            delegate: Delegate::Attribute(attribute.clone()),
            parent: parent.to_owned(),
            is_attribute: true,
            is_back_reference: false,
            is_choice: false,
            key: None,
            appinfo,
        }
    }

    pub fn from_element(tree: &SchemaTree, element: ElementId, parent: &str) -> Self {
        let e = tree.element(element);
        let appinfo = Appinfo::parse(e.appinfo.as_deref());
        Self {
            delegate: Delegate::Element(element),
            parent: parent.to_owned(),
            is_attribute: false,
            is_back_reference: false,
            is_choice: e.choice.is_some(),
            key: None,
            appinfo,
        }
    }

    pub fn from_reference(reference: ReferenceDelegate, parent: &str) -> Self {
        Self {
            delegate: Delegate::Reference(reference),
            parent: parent.to_owned(),
            is_attribute: false,
            is_back_reference: true,
            is_choice: false,
            key: None,
            appinfo: Appinfo::default(),
        }
    }

    pub fn name<'a>(&'a self, model: &'a OmeModel) -> &'a str {
        match &self.delegate {
            Delegate::Attribute(a) => &a.name,
            Delegate::Element(id) => &model.tree().element(*id).name,
            Delegate::Reference(r) => &r.name,
        }
    }

    /// The property's declared XML Schema type.
    pub fn xsd_type<'a>(&'a self, model: &'a OmeModel) -> &'a str {
        match &self.delegate {
            Delegate::Attribute(a) => &a.data_type,
            Delegate::Element(id) => &model.tree().element(*id).xsd_type,
            Delegate::Reference(r) => &r.data_type,
        }
    }

    /// Upper bound of the property's cardinality. An enclosing choice group
    /// can widen what the element itself declares.
    pub fn max_occurs(&self, model: &OmeModel) -> u32 {
        match &self.delegate {
            Delegate::Attribute(_) => 1,
            Delegate::Element(id) => {
                let e = model.tree().element(*id);
                e.choice.map_or(1, |c| c.max).max(e.max_occurs)
            }
            Delegate::Reference(r) => r.max_occurs,
        }
    }

    pub fn min_occurs(&self, model: &OmeModel) -> u32 {
        match &self.delegate {
            Delegate::Attribute(a) => match a.use_ {
                AttributeUse::Optional => 0,
                AttributeUse::Required => 1,
            },
            Delegate::Element(id) => {
                let e = model.tree().element(*id);
                e.choice.map_or(e.min_occurs, |c| c.min)
            }
            Delegate::Reference(r) => r.min_occurs,
        }
    }

    pub fn possible_values<'a>(&'a self, model: &'a OmeModel) -> &'a [String] {
        match &self.delegate {
            Delegate::Attribute(a) => &a.values,
            Delegate::Element(id) => &model.tree().element(*id).values,
            Delegate::Reference(_) => &[],
        }
    }

    pub fn is_enumeration(&self, model: &OmeModel) -> bool {
        !self.possible_values(model).is_empty()
    }

    /// Default enumeration value: `OTHER` if present, the first value
    /// otherwise.
    pub fn default_value<'a>(&'a self, model: &'a OmeModel) -> Option<&'a str> {
        let values = self.possible_values(model);
        if values.iter().any(|v| v == "OTHER") {
            return Some("OTHER");
        }
        values.first().map(String::as_str)
    }

    /// Whether the property has a complex content model. Asking this of an
    /// attribute is a caller bug and fails.
    pub fn is_complex(&self, model: &OmeModel) -> Result<bool, ModelProcessingError> {
        match &self.delegate {
            Delegate::Attribute(a) => Err(ModelProcessingError::AttributeHasNoContentModel(
                a.name.clone(),
            )),
            Delegate::Element(id) => {
                let e = model.tree().element(*id);
                // The schema declares Description with complex content but it
                // is plain text in every consumer.
                if e.name == "Description" {
                    return Ok(false);
                }
                Ok(e.is_complex)
            }
            Delegate::Reference(_) => Ok(true),
        }
    }

    /// Resolves the target language type for the property.
    pub fn lang_type(&self, model: &OmeModel) -> Result<String, ModelProcessingError> {
        let xsd_type = self.xsd_type(model).to_owned();
        let name = self.name(model).to_owned();

        if self.is_enumeration(model) {
            // Enumerations become dedicated classes named after the property.
            // The schema's unspecific "Type" enumerations can only be told
            // apart by qualifying with the owning type.
            if name == "Type" {
                if xsd_type.ends_with("string") {
                    return Ok(format!("{}Type", self.parent));
                }
                return Ok(xsd_type);
            }
            return Ok(name);
        }

        let stripped = xsd_type.strip_prefix("OME:").unwrap_or(&xsd_type);
        if let Some(mapped) = model.session().lang.type_for(stripped) {
            return Ok(mapped.to_owned());
        }

        if self.is_back_reference {
            return Ok(naming::strip_ref_suffix(&xsd_type).to_owned());
        }
        if !self.is_attribute && self.is_complex(model)? {
            // Complex children name another model type, minus any Ref marker.
            return Ok(naming::strip_ref_suffix(&xsd_type).to_owned());
        }

        if let Some(resolved) = self.resolve_lang_type_from_simple_type(model, &xsd_type) {
            return Ok(resolved);
        }

        Err(ModelProcessingError::UnresolvableType {
            property: name,
            xsd_type,
        })
    }

    /// Chases a top-level simple type through restriction bases (and union
    /// members) until a language-mapped base is found.
    fn resolve_lang_type_from_simple_type(
        &self,
        model: &OmeModel,
        simple_type_name: &str,
    ) -> Option<String> {
        let lang = &model.session().lang;
        let mut name = simple_type_name.to_owned();
        let mut visited = HashSet::new();
        loop {
            if !visited.insert(name.clone()) {
                debug!("simple type chain for {simple_type_name} loops at {name}");
                return None;
            }
            let Some(simple_type) = model.get_top_level_simple_type(&name) else {
                debug!("no simple type found with name {name}");
                // The name may carry a namespace prefix (ex. OME:LSID).
                let namespaceless = name.rsplit(':').next().unwrap_or(&name);
                if namespaceless != name {
                    name = namespaceless.to_owned();
                    continue;
                }
                return None;
            };
            // A union is taken to unify simple types sharing one base; the
            // first member decides.
            let base = if let Some(first) = simple_type.union_of.first() {
                model.get_top_level_simple_type(first)?.base.clone()?
            } else {
                simple_type.base.clone()?
            };
            match lang.type_for(&base) {
                Some(mapped) => return Some(mapped.to_owned()),
                None => name = base,
            }
        }
    }

    /// Whether the property points at another model type by reference; a
    /// registry question, not a stored flag.
    pub fn is_reference(&self, model: &OmeModel) -> bool {
        model
            .get_object_by_name(self.xsd_type(model))
            .map_or(false, |o| o.is_reference(model))
    }

    /// Whether the property references an annotation type.
    pub fn is_annotation(&self, model: &OmeModel) -> bool {
        if !self.is_reference(model) {
            return false;
        }
        let target = naming::strip_ref_suffix(self.xsd_type(model));
        model
            .get_object_by_name(target)
            .map_or(false, |o| o.is_annotation(model))
    }

    pub fn is_primitive(&self, model: &OmeModel) -> Result<bool, ModelProcessingError> {
        let lang_type = self.lang_type(model)?;
        Ok(model.session().lang.is_primitive(&lang_type))
    }

    pub fn is_settings(&self, model: &OmeModel) -> bool {
        self.name(model).ends_with("Settings")
    }

    /// Many-to-many is a symmetric pairwise fact. A back reference takes it
    /// from the forward property on the referenced type, one hop, never
    /// recursing further.
    pub fn is_many_to_many(&self, model: &OmeModel) -> bool {
        if self.is_back_reference {
            if let Some(referenced) = model.get_object_by_name(self.xsd_type(model)) {
                let forward_type = format!("{}Ref", self.parent);
                for prop in referenced.properties.values() {
                    if prop.xsd_type(model) == forward_type {
                        return prop.appinfo.many_to_many;
                    }
                }
            }
        }
        self.appinfo.many_to_many
    }

    /// Whether the property's reachable target is marked global. A
    /// self-reference terminates with the property's own flag.
    pub fn is_global(&self, model: &OmeModel) -> bool {
        let global = self.appinfo.is_global;
        if self.is_back_reference {
            let target = naming::strip_back_reference(self.xsd_type(model));
            if let Some(referenced) = model.get_object_by_name(target) {
                if referenced.name == self.name(model) {
                    return global;
                }
                return global || referenced.is_global(model);
            }
        }
        if self.is_reference(model) {
            let target = naming::strip_ref_suffix(self.xsd_type(model));
            if let Some(referenced) = model.get_object_by_name(target) {
                if referenced.name == self.name(model) {
                    return global;
                }
                return global || referenced.is_global(model);
            }
        }
        global
    }

    /// The namespace the property belongs to: the referenced object's for
    /// references, the owning object's for attributes and back references,
    /// the element's own otherwise.
    pub fn namespace<'a>(&'a self, model: &'a OmeModel) -> &'a str {
        if self.is_reference(model) {
            let target = naming::strip_ref_suffix(self.xsd_type(model));
            if let Some(referenced) = model.get_object_by_name(target) {
                return &referenced.namespace;
            }
        }
        if let Delegate::Reference(r) = &self.delegate {
            if let Some(ns) = &r.namespace {
                return ns;
            }
        }
        if self.is_attribute || self.is_back_reference {
            return model
                .get_object_by_name(&self.parent)
                .map_or("", |o| o.namespace.as_str());
        }
        match &self.delegate {
            Delegate::Element(id) => &model.tree().element(*id).namespace,
            _ => "",
        }
    }

    /// The accessor method stem: the property name with reference markers
    /// stripped, or the capitalized override for renamed back references.
    pub fn method_name(&self, model: &OmeModel) -> String {
        if let Some(key) = &self.key {
            if let Some(name) = model.session().overrides.back_reference_name.get(key) {
                return capitalize(name);
            }
        }
        let name = self.name(model);
        naming::strip_back_reference(naming::strip_ref_suffix(name)).to_owned()
    }

    /// The name used for constructor and setter arguments.
    pub fn argument_name(&self, model: &OmeModel) -> String {
        naming::lower_case_prefix(naming::strip_ref_suffix(self.name(model)))
    }

    /// The instance variable name: pluralized for collections, suffixed with
    /// `Links` for many-to-many relationships.
    pub fn instance_variable_name(
        &self,
        model: &OmeModel,
    ) -> Result<String, ModelProcessingError> {
        let name = self.argument_name(model);

        if self.is_many_to_many(model) {
            let mut stem = name;
            if self.is_back_reference {
                if let Some(referenced) = model.get_object_by_name(self.xsd_type(model)) {
                    stem = referenced.instance_variable_name(model)?;
                }
                if let Some(key) = &self.key {
                    if let Some(overridden) =
                        model.session().overrides.back_reference_name.get(key)
                    {
                        stem = overridden.clone();
                    }
                }
            }
            return Ok(format!("{stem}Links"));
        }

        if self.max_occurs(model) > 1 {
            match &self.appinfo.plural {
                Some(plural) => return Ok(naming::lower_case_prefix(plural)),
                None => {
                    // Fall back to the plural hint on the referenced type;
                    // when there is no such type, keep the singular name.
                    if let Some(referenced) =
                        model.get_object_by_name(&self.method_name(model))
                    {
                        let plural = referenced.appinfo.plural.clone().ok_or_else(|| {
                            ModelProcessingError::MissingPlural(self.name(model).to_owned())
                        })?;
                        return Ok(naming::lower_case_prefix(&plural));
                    }
                }
            }
        }

        if self.is_back_reference {
            return Ok(naming::strip_back_reference(&name).to_owned());
        }
        Ok(name)
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
