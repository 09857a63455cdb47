//! Parsing of the `<appinfo>` hints the schema annotates elements and
//! attributes with.

use roxmltree::Document;
use tracing::error;

/// Domain hints carried in an element or attribute's `<appinfo>` block.
///
/// These influence naming and relationship modelling but are advisory:
/// an absent or malformed block yields the all-default value and never
/// aborts a run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Appinfo {
    /// Collection name to use when the property is plural.
    pub plural: Option<String>,
    pub many_to_many: bool,
    pub is_ordered: bool,
    pub is_parent_ordered: bool,
    pub is_child_ordered: bool,
    pub is_unique: bool,
    pub is_immutable: bool,
    pub is_injected: bool,
    pub is_global: bool,
    pub is_abstract: bool,
    pub is_abstract_proprietary: bool,
}

impl Appinfo {
    /// Parses an appinfo XML fragment.
    pub fn parse(fragment: Option<&str>) -> Self {
        let Some(fragment) = fragment else {
            return Self::default();
        };
        let doc = match Document::parse(fragment) {
            Ok(doc) => doc,
            Err(e) => {
                error!("exception while parsing appinfo block {fragment:?}: {e}");
                return Self::default();
            }
        };
        // Hints count only as direct children of the wrapper element.
        let root = doc.root_element();
        let find = |tag: &str| {
            root.children()
                .find(|n| n.is_element() && n.tag_name().name() == tag)
        };
        Self {
            plural: find("plural").and_then(|n| n.text()).map(str::to_owned),
            many_to_many: find("manytomany").is_some(),
            is_ordered: find("ordered").is_some(),
            is_parent_ordered: find("parentordered").is_some(),
            is_child_ordered: find("childordered").is_some(),
            is_unique: find("unique").is_some(),
            is_immutable: find("immutable").is_some(),
            is_injected: find("injected").is_some(),
            is_global: find("global").is_some(),
            is_abstract: find("abstract").is_some(),
            is_abstract_proprietary: find("abstractproprietary").is_some(),
        }
    }
}
