//! The model registry and its two-pass construction.
//!
//! [`OmeModel::process`] walks the schema tree depth-first, promoting
//! qualifying elements to [`ModelObject`]s, then runs a reference
//! post-processing pass that synthesizes settings references and injects
//! back references so relationships can be navigated in both directions.

use std::collections::{HashMap, HashSet};

use tracing::{debug, error, info, warn};

use crate::config::GenerationSession;
use crate::error::ModelProcessingError;
use crate::naming;
use crate::object::ModelObject;
use crate::property::{ModelProperty, ReferenceDelegate};
use crate::schema::{ElementId, SchemaTree, SimpleType, UNBOUNDED};

/// A node in the inheritance report produced by [`OmeModel::resolve_parents`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParentNode {
    pub name: String,
    pub parents: Vec<ParentNode>,
}

/// The registry of model objects built from one schema tree.
pub struct OmeModel {
    tree: SchemaTree,
    session: GenerationSession,
    objects: Vec<ModelObject>,
    element_index: HashMap<ElementId, usize>,
    name_index: HashMap<String, usize>,
    /// Element name to the names of every element it appears under.
    parents: HashMap<String, Vec<String>>,
}

impl OmeModel {
    /// Builds the complete model from a schema tree.
    pub fn process(
        tree: SchemaTree,
        session: GenerationSession,
    ) -> Result<Self, ModelProcessingError> {
        let root = tree.root().ok_or(ModelProcessingError::MissingRoot)?;
        let elements = tree.element(root).children.clone();
        let mut model = Self {
            tree,
            session,
            objects: Vec::new(),
            element_index: HashMap::new(),
            name_index: HashMap::new(),
            parents: HashMap::new(),
        };
        model.process_tree(&elements, None)?;
        model.post_process_references();
        Ok(model)
    }

    pub fn tree(&self) -> &SchemaTree {
        &self.tree
    }

    pub fn session(&self) -> &GenerationSession {
        &self.session
    }

    /// Objects in registration order.
    pub fn objects(&self) -> impl Iterator<Item = &ModelObject> {
        self.objects.iter()
    }

    pub fn get_object(&self, element: ElementId) -> Option<&ModelObject> {
        self.element_index.get(&element).map(|&i| &self.objects[i])
    }

    pub fn get_object_by_name(&self, name: &str) -> Option<&ModelObject> {
        self.name_index.get(name).map(|&i| &self.objects[i])
    }

    pub fn get_top_level_simple_type(&self, name: &str) -> Option<&SimpleType> {
        // Linear scan; the schema declares a few dozen at most.
        self.tree.simple_types().iter().find(|st| st.name == name)
    }

    /// Names of the elements `name` appears under.
    pub fn parents_of(&self, name: &str) -> Option<&[String]> {
        self.parents.get(name).map(Vec::as_slice)
    }

    /// Registers an object. A second registration for the same element is
    /// fatal; a second object with an already-used name is dropped and the
    /// first kept.
    fn add_object(
        &mut self,
        element: ElementId,
        object: ModelObject,
    ) -> Result<Option<usize>, ModelProcessingError> {
        if self.element_index.contains_key(&element) {
            return Err(ModelProcessingError::DuplicateElement(object.name));
        }
        if self.name_index.contains_key(&object.name) {
            if self.session.overrides.explicit_define.contains(&object.name) {
                // Expected: these are declared under more than one parent.
                debug!(
                    "element {} redefined under a second parent, keeping the first",
                    object.name
                );
            } else {
                warn!(
                    "element {} has duplicate object with same name, skipping",
                    object.name
                );
            }
            return Ok(None);
        }
        let index = self.objects.len();
        self.element_index.insert(element, index);
        self.name_index.insert(object.name.clone(), index);
        self.objects.push(object);
        Ok(Some(index))
    }

    fn process_tree(
        &mut self,
        elements: &[ElementId],
        parent: Option<ElementId>,
    ) -> Result<(), ModelProcessingError> {
        for &element in elements {
            self.process_leaf(element, parent)?;
            let children = self.tree.element(element).children.clone();
            if !children.is_empty() {
                self.process_tree(&children, Some(element))?;
            }
        }
        Ok(())
    }

    /// Decides whether one element becomes a model object and attaches its
    /// properties if so. Parent linkage is recorded for every element,
    /// promoted or not.
    fn process_leaf(
        &mut self,
        element: ElementId,
        parent: Option<ElementId>,
    ) -> Result<(), ModelProcessingError> {
        let e = self.tree.element(element);
        let e_name = e.name.clone();
        let e_type = e.xsd_type.clone();
        let top_level = e.top_level;
        let explicit_define = e.explicit_define;
        let mixed_error = e.mixed_extension_error;
        let parent_name = parent.map(|p| self.tree.element(p).name.clone());
        debug!("process leaf {:?} -> {}", parent_name, e_name);

        if let Some(p) = &parent_name {
            self.parents.entry(e_name.clone()).or_default().push(p.clone());
        }

        let overridden = self.session.overrides.explicit_define.contains(&e_name);
        if !explicit_define && !overridden && !top_level {
            info!(
                "element {:?}.{} not an explicit define, skipping",
                parent_name, e_name
            );
            return Ok(());
        }
        if mixed_error {
            error!(
                "element {:?}.{} mixes mixed and element-only content in its extension chain, skipping",
                parent_name, e_name
            );
            return Ok(());
        }
        if e_type != e_name && !overridden {
            info!(
                "element {:?}.{} is not a concrete type ({} != {}), skipping",
                parent_name, e_name, e_type, e_name
            );
            return Ok(());
        }

        let object = ModelObject::from_element(&self.tree, element, parent);
        if let Some(index) = self.add_object(element, object)? {
            self.process_contents(element, index);
        }
        Ok(())
    }

    /// Attaches attribute and child element properties in declaration order;
    /// that order drives emitted constructor signatures.
    fn process_contents(&mut self, element: ElementId, index: usize) {
        let attributes = self.tree.element(element).attributes.clone();
        for attribute in &attributes {
            debug!(
                "adding attribute {} to {}",
                attribute.name, self.objects[index].name
            );
            self.objects[index].add_attribute(attribute);
        }
        let children = self.tree.element(element).children.clone();
        for child in children {
            self.objects[index].add_element(&self.tree, child);
        }
    }

    fn calculate_max_occurs(&self, prop: &ModelProperty) -> u32 {
        if prop.is_reference(self) {
            UNBOUNDED
        } else {
            1
        }
    }

    fn calculate_min_occurs(&self, prop: &ModelProperty) -> u32 {
        if prop.is_reference(self) || prop.is_settings(self) {
            0
        } else {
            1
        }
    }

    /// Second pass: synthesizes the reference properties the schema only
    /// implies by naming convention.
    fn post_process_references(&mut self) {
        // Every concrete settings object references exactly one instance of
        // its corresponding entity.
        for index in 0..self.objects.len() {
            let (name, namespace, skip) = {
                let o = &self.objects[index];
                (
                    o.name.clone(),
                    o.namespace.clone(),
                    !o.is_settings() || o.is_abstract(self),
                )
            };
            if skip {
                continue;
            }
            let ref_type = format!("{}Ref", name.replace("Settings", ""));
            let delegate = ReferenceDelegate::settings_reference(&ref_type, &namespace);
            self.objects[index].add_reference(delegate);
        }

        struct BackReference {
            data_type: String,
            property_name: String,
            plural: Option<String>,
            min_occurs: u32,
            max_occurs: u32,
            is_ordered: bool,
            is_parent_ordered: bool,
            is_child_ordered: bool,
            is_injected: bool,
        }

        // One candidate per qualifying forward property, grouped by the
        // referenced type.
        let mut references: HashMap<String, Vec<BackReference>> = HashMap::new();
        for o in &self.objects {
            for prop in o.properties.values() {
                let qualifies = prop.is_reference(self)
                    || (!prop.is_attribute
                        && (prop.max_occurs(self) > 1
                            || o.name == "OME"
                            || o.is_abstract_proprietary(self)));
                if !qualifies {
                    continue;
                }
                let target = naming::strip_ref_suffix(prop.xsd_type(self)).to_owned();
                let suppressed = self
                    .session
                    .overrides
                    .back_reference
                    .get(&target)
                    .map_or(false, |owners| owners.contains(&o.name));
                if suppressed {
                    continue;
                }
                references.entry(target).or_default().push(BackReference {
                    data_type: o.name.clone(),
                    property_name: prop.method_name(self),
                    plural: prop.appinfo.plural.clone(),
                    min_occurs: self.calculate_min_occurs(prop),
                    max_occurs: self.calculate_max_occurs(prop),
                    is_ordered: prop.appinfo.is_ordered,
                    is_parent_ordered: prop.appinfo.is_parent_ordered,
                    is_child_ordered: prop.appinfo.is_child_ordered,
                    is_injected: prop.appinfo.is_injected,
                });
            }
        }
        debug!("model references: {} targets", references.len());

        // Inject, keyed by owner and property so the name override tables
        // can find each pair.
        for index in 0..self.objects.len() {
            let name = self.objects[index].name.clone();
            let Some(refs) = references.remove(&name) else {
                continue;
            };
            for r in refs {
                let key = format!("{}.{}", r.data_type, r.property_name);
                let mut delegate = ReferenceDelegate::back_reference(&r.data_type, r.plural);
                delegate.min_occurs = r.min_occurs;
                delegate.max_occurs = r.max_occurs;
                let mut prop = ModelProperty::from_reference(delegate, &name);
                prop.key = Some(key.clone());
                prop.appinfo.is_ordered = r.is_ordered;
                prop.appinfo.is_parent_ordered = r.is_parent_ordered;
                prop.appinfo.is_child_ordered = r.is_child_ordered;
                prop.appinfo.is_injected = r.is_injected;
                self.objects[index].properties.insert(key, prop);
            }
        }
    }

    /// Resolves the inheritance parents of an element as a nested tree for
    /// reporting.
    pub fn resolve_parents(&self, element_name: &str) -> Vec<ParentNode> {
        let mut visited = HashSet::new();
        visited.insert(element_name.to_owned());
        self.resolve_parents_inner(element_name, &mut visited)
    }

    fn resolve_parents_inner(
        &self,
        name: &str,
        visited: &mut HashSet<String>,
    ) -> Vec<ParentNode> {
        let Some(parents) = self.parents.get(name) else {
            return Vec::new();
        };
        let mut nodes = Vec::new();
        for parent in parents {
            if !visited.insert(parent.clone()) {
                continue;
            }
            nodes.push(ParentNode {
                name: parent.clone(),
                parents: self.resolve_parents_inner(parent, visited),
            });
        }
        nodes
    }
}
