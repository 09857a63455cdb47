//! Per-run generation configuration.
//!
//! The OME schema has a handful of known-irregular spots that the model
//! builder must special-case; those live in [`OverrideTables`] so a run can
//! amend them. [`GenerationSession`] bundles the tables with the schema
//! namespace prefix and the target [`LanguagePolicy`].

use std::collections::{HashMap, HashSet};

use lazy_static::lazy_static;

use crate::language::{Java, LanguagePolicy};

/// Default namespace prefix for XML Schema builtins.
pub const DEFAULT_NAMESPACE: &str = "xsd:";

lazy_static! {
    static ref EXPLICIT_DEFINE_OVERRIDE: HashSet<String> = {
        ["EmissionFilterRef", "ExcitationFilterRef"]
            .iter()
            .map(|s| (*s).to_owned())
            .collect()
    };
    static ref BACK_REFERENCE_OVERRIDE: HashMap<String, Vec<String>> = {
        let mut map = HashMap::new();
        map.insert("Annotation".to_owned(), vec!["Annotation".to_owned()]);
        map.insert("Event".to_owned(), vec!["Event".to_owned()]);
        map
    };
    static ref BACK_REFERENCE_NAME_OVERRIDE: HashMap<String, String> = {
        let mut map = HashMap::new();
        map.insert(
            "FilterSet.ExcitationFilter".to_owned(),
            "filterSetExcitationFilter".to_owned(),
        );
        map.insert(
            "FilterSet.EmissionFilter".to_owned(),
            "filterSetEmissionFilter".to_owned(),
        );
        map.insert(
            "LightPath.ExcitationFilter".to_owned(),
            "lightPathExcitationFilter".to_owned(),
        );
        map.insert(
            "LightPath.EmissionFilter".to_owned(),
            "lightPathEmissionFilter".to_owned(),
        );
        map
    };
    static ref METADATA_OBJECT_IGNORE: HashSet<String> = {
        ["BinData", "External"]
            .iter()
            .map(|s| (*s).to_owned())
            .collect()
    };
    static ref ABSTRACT_PROPRIETARY_OVERRIDE: HashSet<String> =
        ["Transform"].iter().map(|s| (*s).to_owned()).collect();
}

/// Override tables for the irregular corners of the schema.
#[derive(Clone, Debug)]
pub struct OverrideTables {
    /// Elements modelled as types even though they are not explicit defines.
    pub explicit_define: HashSet<String>,
    /// Back references to suppress, keyed by referenced type name, listing
    /// the owning types whose references must not generate one.
    pub back_reference: HashMap<String, Vec<String>>,
    /// Accessor name overrides for back reference pairs that would otherwise
    /// collide, keyed by `Owner.Property`.
    pub back_reference_name: HashMap<String, String>,
    /// Types excluded from metadata interface emission.
    pub metadata_object_ignore: HashSet<String>,
    /// Abstract types whose concrete storage is proprietary but whose
    /// properties are still generated.
    pub abstract_proprietary: HashSet<String>,
}

impl Default for OverrideTables {
    fn default() -> Self {
        Self {
            explicit_define: EXPLICIT_DEFINE_OVERRIDE.clone(),
            back_reference: BACK_REFERENCE_OVERRIDE.clone(),
            back_reference_name: BACK_REFERENCE_NAME_OVERRIDE.clone(),
            metadata_object_ignore: METADATA_OBJECT_IGNORE.clone(),
            abstract_proprietary: ABSTRACT_PROPRIETARY_OVERRIDE.clone(),
        }
    }
}

/// Everything one generation run needs to know: schema namespace prefix,
/// target language, override tables. Owned by the model; independent runs
/// never share state.
pub struct GenerationSession {
    pub namespace: String,
    pub lang: Box<dyn LanguagePolicy>,
    pub overrides: OverrideTables,
}

impl GenerationSession {
    pub fn new(namespace: impl Into<String>, lang: Box<dyn LanguagePolicy>) -> Self {
        Self {
            namespace: namespace.into(),
            lang,
            overrides: OverrideTables::default(),
        }
    }

    /// A session targeting Java with the default namespace prefix.
    pub fn java() -> Self {
        Self::new(DEFAULT_NAMESPACE, Box::new(Java::new(DEFAULT_NAMESPACE)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tables() {
        let overrides = OverrideTables::default();
        assert!(overrides.explicit_define.contains("EmissionFilterRef"));
        assert!(overrides.explicit_define.contains("ExcitationFilterRef"));
        assert_eq!(
            overrides.back_reference.get("Annotation"),
            Some(&vec!["Annotation".to_owned()])
        );
        assert_eq!(
            overrides
                .back_reference_name
                .get("LightPath.EmissionFilter")
                .map(String::as_str),
            Some("lightPathEmissionFilter")
        );
        assert!(overrides.metadata_object_ignore.contains("BinData"));
        assert!(overrides.abstract_proprietary.contains("Transform"));
    }

    #[test]
    fn java_session() {
        let session = GenerationSession::java();
        assert_eq!(session.namespace, "xsd:");
        assert_eq!(session.lang.name(), "Java");
    }
}
