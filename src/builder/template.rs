//! Static build-file assets with `{{name}}` placeholders.

use std::collections::BTreeMap;

use thiserror::Error;

/// MSBuild targets file that writes the project's assembly name to a file.
///
/// Placeholders: `target` (target name), `output_property` (property holding
/// the output path).
pub const PROJECT_PROPERTIES_TARGETS: &str = include_str!("templates/GetProjectProperties.targets");

/// Name of the target defined by [`PROJECT_PROPERTIES_TARGETS`].
pub const PROJECT_PROPERTIES_TARGET: &str = "GetProjectProperties";

/// Property the probe passes the output path in.
pub const OUTPUT_PATH_PROPERTY: &str = "InfoOutputPath";

/// Misuse of a template asset.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("template has no placeholder `{0}`")]
    UnknownPlaceholder(String),

    #[error("template placeholder `{0}` was not filled")]
    MissingValue(String),

    #[error("unterminated placeholder at byte {0}")]
    Unterminated(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment<'a> {
    Text(&'a str),
    Placeholder(&'a str),
}

/// A parsed template.
#[derive(Debug, Clone)]
pub struct Template<'a> {
    segments: Vec<Segment<'a>>,
    values: BTreeMap<String, String>,
}

impl<'a> Template<'a> {
    /// Parse a template source.
    pub fn parse(source: &'a str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut rest = source;
        let mut offset = 0;

        while let Some(start) = rest.find("{{") {
            if start > 0 {
                segments.push(Segment::Text(&rest[..start]));
            }
            let after = &rest[start + 2..];
            let end = after
                .find("}}")
                .ok_or(TemplateError::Unterminated(offset + start))?;
            segments.push(Segment::Placeholder(after[..end].trim()));

            let consumed = start + 2 + end + 2;
            offset += consumed;
            rest = &rest[consumed..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Text(rest));
        }

        Ok(Template {
            segments,
            values: BTreeMap::new(),
        })
    }

    /// Names of all placeholders, in order of first appearance.
    pub fn placeholders(&self) -> Vec<&'a str> {
        let mut names: Vec<&'a str> = Vec::new();
        for segment in &self.segments {
            if let Segment::Placeholder(name) = segment {
                if !names.contains(name) {
                    names.push(name);
                }
            }
        }
        names
    }

    /// Fill a placeholder. The value is XML-escaped.
    pub fn set(mut self, name: &str, value: &str) -> Result<Self, TemplateError> {
        if !self.placeholders().iter().any(|p| *p == name) {
            return Err(TemplateError::UnknownPlaceholder(name.to_string()));
        }
        self.values.insert(name.to_string(), xml_escape(value));
        Ok(self)
    }

    /// Render. Every placeholder must be filled.
    pub fn render(&self) -> Result<String, TemplateError> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Placeholder(name) => {
                    let value = self
                        .values
                        .get(*name)
                        .ok_or_else(|| TemplateError::MissingValue(name.to_string()))?;
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }
}

/// Render the project-properties targets file.
pub fn project_properties_targets() -> Result<String, TemplateError> {
    Template::parse(PROJECT_PROPERTIES_TARGETS)?
        .set("target", PROJECT_PROPERTIES_TARGET)?
        .set("output_property", OUTPUT_PATH_PROPERTY)?
        .render()
}

/// Escape text for use in XML content and attribute values.
pub fn xml_escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}
