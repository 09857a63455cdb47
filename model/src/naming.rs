//! Name manipulation helpers used when deriving accessor and variable names
//! from schema type names.

/// Removes a trailing `Ref` or `RefNode` marker from a reference type name.
/// Names without the marker pass through unchanged.
pub fn strip_ref_suffix(name: &str) -> &str {
    if let Some(stripped) = name.strip_suffix("RefNode") {
        stripped
    } else if let Some(stripped) = name.strip_suffix("Ref") {
        stripped
    } else {
        name
    }
}

/// Removes the `_BackReference` marker that distinguishes synthesized back
/// reference properties from declared ones.
pub fn strip_back_reference(name: &str) -> &str {
    name.strip_suffix("_BackReference").unwrap_or(name)
}

/// Lower-cases the leading word of a camel-case identifier.
///
/// The leading word is the longest run of upper-case letters and digits,
/// minus its final letter when that letter starts the next word
/// (`ROIRef` -> `roiRef`, `ID` -> `id`, `Name` -> `name`).
pub fn lower_case_prefix(name: &str) -> String {
    let prefix_len = prefix_length(name);
    let (prefix, rest) = name.split_at(prefix_len);
    format!("{}{}", prefix.to_lowercase(), rest)
}

fn prefix_length(name: &str) -> usize {
    let chars: Vec<char> = name.chars().collect();
    if chars.is_empty() {
        return 0;
    }
    if chars[0].is_lowercase() {
        return chars.iter().take_while(|c| c.is_lowercase()).count();
    }
    let run = chars
        .iter()
        .take_while(|c| c.is_uppercase() || c.is_ascii_digit())
        .count();
    if run == chars.len() || run <= 1 {
        run
    } else {
        // The last upper-case letter of the run begins the next word.
        run - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ref_suffixes() {
        assert_eq!(strip_ref_suffix("DetectorRef"), "Detector");
        assert_eq!(strip_ref_suffix("FilterRefNode"), "Filter");
        assert_eq!(strip_ref_suffix("Detector"), "Detector");
        assert_eq!(strip_ref_suffix("Reference"), "Reference");
    }

    #[test]
    fn back_reference_suffix() {
        assert_eq!(strip_back_reference("Image_BackReference"), "Image");
        assert_eq!(strip_back_reference("Image"), "Image");
    }

    #[test]
    fn prefix_lowering() {
        assert_eq!(lower_case_prefix("Name"), "name");
        assert_eq!(lower_case_prefix("ID"), "id");
        assert_eq!(lower_case_prefix("ROIRef"), "roiRef");
        assert_eq!(lower_case_prefix("AnnotationRef"), "annotationRef");
        assert_eq!(lower_case_prefix("lowercase"), "lowercase");
    }
}
