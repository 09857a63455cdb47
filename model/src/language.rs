//! Target language policies.
//!
//! All language-specific knowledge (type maps, primitive sets, base class
//! defaults) sits behind [`LanguagePolicy`] so the resolver never branches on
//! which language it is generating for. Policies are built per run from the
//! schema namespace prefix.

use std::collections::HashMap;

/// Capability interface for a code generation target language.
pub trait LanguagePolicy {
    fn name(&self) -> &'static str;

    /// Maps an XSD type name to the language type used to represent it.
    fn type_for(&self, xsd_type: &str) -> Option<&str>;

    /// Maps an XSD type name to a language primitive, if one exists. This is
    /// the subset of [`LanguagePolicy::type_for`] without the model-specific
    /// substitutions.
    fn primitive_type_for(&self, xsd_type: &str) -> Option<&str>;

    /// Whether `lang_type` is one of the language's primitive types.
    fn is_primitive(&self, lang_type: &str) -> bool;

    /// Whether `lang_type` is a fundamental (non-class) type.
    fn is_fundamental(&self, lang_type: &str) -> bool;

    /// Base class override for schema bases that must not be subclassed
    /// directly.
    fn base_type(&self, base: &str) -> Option<&str>;

    fn default_base_class(&self) -> &'static str;

    fn package_separator(&self) -> &'static str;
}

/// The schema-local simple types with dedicated model classes, shared by all
/// target languages.
const MODEL_PRIMITIVES: &[(&str, &str)] = &[
    ("PositiveInt", "PositiveInteger"),
    ("NonNegativeInt", "NonNegativeInteger"),
    ("PositiveLong", "PositiveLong"),
    ("NonNegativeLong", "NonNegativeLong"),
    ("PositiveFloat", "PositiveFloat"),
    ("PercentFraction", "PercentFraction"),
    ("Color", "Color"),
    ("AffineTransform", "AffineTransform"),
    ("Text", "Text"),
];

fn build_primitive_map(
    namespace: &str,
    builtins: &[(&str, &'static str)],
) -> HashMap<String, &'static str> {
    let mut map = HashMap::new();
    for (suffix, lang) in builtins {
        map.insert(format!("{namespace}{suffix}"), *lang);
    }
    for (name, lang) in MODEL_PRIMITIVES {
        map.insert((*name).to_owned(), *lang);
    }
    map
}

/// Substitutions for schema names that do not follow the usual
/// name-equals-type convention.
fn add_model_substitutions(map: &mut HashMap<String, &'static str>, string_type: &'static str) {
    map.insert("MIMEtype".to_owned(), string_type);
    map.insert("Leader".to_owned(), "Experimenter");
    map.insert("Contact".to_owned(), "Experimenter");
    map.insert("Pump".to_owned(), "LightSource");
}

pub struct Java {
    type_map: HashMap<String, &'static str>,
    primitive_map: HashMap<String, &'static str>,
}

impl Java {
    pub const DEFAULT_BASE_CLASS: &'static str = "AbstractOMEModelObject";

    pub fn new(namespace: &str) -> Self {
        let primitive_map = build_primitive_map(
            namespace,
            &[
                ("boolean", "Boolean"),
                ("dateTime", "Timestamp"),
                ("string", "String"),
                ("integer", "Integer"),
                ("int", "Integer"),
                ("long", "Long"),
                ("float", "Double"),
                ("double", "Double"),
                ("anyURI", "String"),
                ("hexBinary", "String"),
            ],
        );
        let mut type_map = primitive_map.clone();
        add_model_substitutions(&mut type_map, "String");
        Self {
            type_map,
            primitive_map,
        }
    }
}

impl LanguagePolicy for Java {
    fn name(&self) -> &'static str {
        "Java"
    }

    fn type_for(&self, xsd_type: &str) -> Option<&str> {
        self.type_map.get(xsd_type).copied()
    }

    fn primitive_type_for(&self, xsd_type: &str) -> Option<&str> {
        self.primitive_map.get(xsd_type).copied()
    }

    fn is_primitive(&self, lang_type: &str) -> bool {
        self.primitive_map.values().any(|v| *v == lang_type)
    }

    fn is_fundamental(&self, _lang_type: &str) -> bool {
        // Primitives are modelled as wrapper classes.
        false
    }

    fn base_type(&self, base: &str) -> Option<&str> {
        // UUID carries structural attributes and cannot extend the plain
        // string hierarchy.
        (base == "UniversallyUniqueIdentifier").then_some(Self::DEFAULT_BASE_CLASS)
    }

    fn default_base_class(&self) -> &'static str {
        Self::DEFAULT_BASE_CLASS
    }

    fn package_separator(&self) -> &'static str {
        "."
    }
}

pub struct Cxx {
    type_map: HashMap<String, &'static str>,
    primitive_map: HashMap<String, &'static str>,
}

impl Cxx {
    pub const DEFAULT_BASE_CLASS: &'static str = "detail::OMEModelObject";

    const FUNDAMENTAL: &'static [&'static str] = &["bool", "int32_t", "int64_t", "double"];

    pub fn new(namespace: &str) -> Self {
        let primitive_map = build_primitive_map(
            namespace,
            &[
                ("boolean", "bool"),
                ("dateTime", "Timestamp"),
                ("string", "std::string"),
                ("integer", "int32_t"),
                ("int", "int32_t"),
                ("long", "int64_t"),
                ("float", "double"),
                ("double", "double"),
                ("anyURI", "std::string"),
                ("hexBinary", "std::string"),
            ],
        );
        let mut type_map = primitive_map.clone();
        add_model_substitutions(&mut type_map, "std::string");
        Self {
            type_map,
            primitive_map,
        }
    }
}

impl LanguagePolicy for Cxx {
    fn name(&self) -> &'static str {
        "C++"
    }

    fn type_for(&self, xsd_type: &str) -> Option<&str> {
        self.type_map.get(xsd_type).copied()
    }

    fn primitive_type_for(&self, xsd_type: &str) -> Option<&str> {
        self.primitive_map.get(xsd_type).copied()
    }

    fn is_primitive(&self, lang_type: &str) -> bool {
        self.primitive_map.values().any(|v| *v == lang_type)
    }

    fn is_fundamental(&self, lang_type: &str) -> bool {
        Self::FUNDAMENTAL.contains(&lang_type)
    }

    fn base_type(&self, base: &str) -> Option<&str> {
        (base == "UniversallyUniqueIdentifier").then_some(Self::DEFAULT_BASE_CLASS)
    }

    fn default_base_class(&self) -> &'static str {
        Self::DEFAULT_BASE_CLASS
    }

    fn package_separator(&self) -> &'static str {
        "::"
    }
}
