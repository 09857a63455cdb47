//! Emission backends.
//!
//! [`ModelEmitter`] is the seam actual code generators plug into; the
//! bundled [`ReportEmitter`] renders a plain-text summary of the resolved
//! model, which doubles as a quick way to inspect what a schema change does
//! to the generated types.

use std::io::Write;

use thiserror::Error;

use ome_xsd_model::{ModelProcessingError, ModelProperty, OmeModel, ParentNode, UNBOUNDED};

#[derive(Debug, Error)]
pub enum EmitError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Model(#[from] ModelProcessingError),
}

/// A consumer of the finished model.
pub trait ModelEmitter {
    fn emit(&mut self, model: &OmeModel, out: &mut dyn Write) -> Result<(), EmitError>;
}

/// Prints every generated type with its resolved properties, followed by the
/// containment hierarchy.
#[derive(Default)]
pub struct ReportEmitter;

impl ModelEmitter for ReportEmitter {
    fn emit(&mut self, model: &OmeModel, out: &mut dyn Write) -> Result<(), EmitError> {
        for object in model.objects() {
            let ignored = model
                .session()
                .overrides
                .metadata_object_ignore
                .contains(&object.name);
            writeln!(
                out,
                "{} extends {}{}",
                object.name,
                object.base_class(model),
                if ignored { " [no metadata interface]" } else { "" },
            )?;
            for prop in object.properties.values() {
                writeln!(out, "  {}", describe(model, prop)?)?;
            }
            writeln!(out)?;
        }

        writeln!(out, "Containment:")?;
        for object in model.objects() {
            let parents = model.resolve_parents(&object.name);
            if parents.is_empty() {
                continue;
            }
            writeln!(out, "{}", object.name)?;
            write_parents(out, &parents, 1)?;
        }
        Ok(())
    }
}

fn describe(model: &OmeModel, prop: &ModelProperty) -> Result<String, EmitError> {
    let kind = if prop.is_back_reference {
        "back reference"
    } else if prop.is_attribute {
        "attribute"
    } else if prop.is_reference(model) {
        "reference"
    } else {
        "element"
    };
    let max = match prop.max_occurs(model) {
        UNBOUNDED => "n".to_owned(),
        n => n.to_string(),
    };
    let mut line = format!(
        "{}: {} ({kind}, {}..{max})",
        prop.method_name(model),
        prop.lang_type(model)?,
        prop.min_occurs(model),
    );
    if prop.is_enumeration(model) {
        if let Some(default) = prop.default_value(model) {
            line.push_str(&format!(" [default {default}]"));
        }
    }
    Ok(line)
}

fn write_parents(out: &mut dyn Write, nodes: &[ParentNode], depth: usize) -> std::io::Result<()> {
    for node in nodes {
        writeln!(out, "{}+-- {}", "  ".repeat(depth), node.name)?;
        write_parents(out, &node.parents, depth + 1)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema_reader::read_schema_text;
    use ome_xsd_model::GenerationSession;

    const SCHEMA: &str = r#"
<xsd:schema xmlns:xsd="http://www.w3.org/2001/XMLSchema"
            targetNamespace="http://example.org/Schemas/OME">
  <xsd:element name="OME">
    <xsd:complexType>
      <xsd:sequence>
        <xsd:element ref="Project" minOccurs="0" maxOccurs="unbounded"/>
        <xsd:element ref="Dataset" minOccurs="0" maxOccurs="unbounded"/>
      </xsd:sequence>
    </xsd:complexType>
  </xsd:element>
  <xsd:element name="Project">
    <xsd:complexType>
      <xsd:sequence>
        <xsd:element name="DatasetRef" minOccurs="0" maxOccurs="unbounded">
          <xsd:complexType>
            <xsd:complexContent>
              <xsd:extension base="Reference">
                <xsd:attribute name="ID" use="required" type="LSID"/>
              </xsd:extension>
            </xsd:complexContent>
          </xsd:complexType>
        </xsd:element>
      </xsd:sequence>
      <xsd:attribute name="ID" use="required" type="LSID"/>
      <xsd:attribute name="Name" type="xsd:string"/>
    </xsd:complexType>
  </xsd:element>
  <xsd:element name="Dataset">
    <xsd:complexType>
      <xsd:attribute name="ID" use="required" type="LSID"/>
    </xsd:complexType>
  </xsd:element>
  <xsd:simpleType name="LSID">
    <xsd:restriction base="xsd:string"/>
  </xsd:simpleType>
</xsd:schema>
"#;

    #[test]
    fn end_to_end_report() {
        let tree = read_schema_text(SCHEMA).unwrap();
        let model = OmeModel::process(tree, GenerationSession::java()).unwrap();
        let mut out = Vec::new();
        ReportEmitter.emit(&model, &mut out).unwrap();
        let report = String::from_utf8(out).unwrap();

        assert!(report.contains("Project extends AbstractOMEModelObject"));
        assert!(report.contains("DatasetRef extends Reference"));
        assert!(report.contains("ID: String (attribute, 1..1)"));
        assert!(report.contains("Name: String (attribute, 0..1)"));
        // Forward reference and its injected inverse.
        assert!(report.contains("Dataset: Dataset (reference, 0..n)"));
        assert!(report.contains("Project: Project (back reference, 0..n)"));
        assert!(report.contains("Containment:"));
        assert!(report.contains("+-- OME"));
    }

    #[test]
    fn unresolvable_type_fails_emission() {
        let schema = r#"
<xsd:schema xmlns:xsd="http://www.w3.org/2001/XMLSchema">
  <xsd:element name="Thing">
    <xsd:complexType>
      <xsd:attribute name="Bad" type="NoSuchType"/>
    </xsd:complexType>
  </xsd:element>
</xsd:schema>
"#;
        let tree = read_schema_text(schema).unwrap();
        let model = OmeModel::process(tree, GenerationSession::java()).unwrap();
        let mut out = Vec::new();
        assert!(matches!(
            ReportEmitter.emit(&model, &mut out),
            Err(EmitError::Model(ModelProcessingError::UnresolvableType { .. }))
        ));
    }
}
