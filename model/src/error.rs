use thiserror::Error;

/// Raised when there is an error during model processing.
///
/// All variants are fatal for the generation run: a partially built model
/// graph cannot safely drive code emission.
#[derive(Debug, Error)]
pub enum ModelProcessingError {
    #[error("unable to find a language type for property {property} of type {xsd_type}")]
    UnresolvableType { property: String, xsd_type: String },

    #[error("element {0} has already been processed")]
    DuplicateElement(String),

    #[error("no model objects found; have you set the correct namespace?")]
    MissingRoot,

    #[error("property {0} is an attribute and has no content model")]
    AttributeHasNoContentModel(String),

    #[error("no plural hint available to name the {0} collection")]
    MissingPlural(String),
}
