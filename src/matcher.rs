// Field reference heuristics - finds field names inside free-form expression text
//
// This is a substring heuristic, not an expression parser: a field name that
// happens to appear inside an unrelated string literal is a false positive, and
// a reference built dynamically (concat, variables) is missed.
use crate::error::AnalysisError;
use crate::naming::eq_ignore_case;
use regex::{RegexSet, RegexSetBuilder};

pub struct FieldReferenceMatcher {
    field: String,
    patterns: RegexSet,
}

impl FieldReferenceMatcher {
    pub fn new(field: &str) -> Result<Self, AnalysisError> {
        let field = field.trim();
        let escaped = regex::escape(field);
        let patterns = RegexSetBuilder::new([
            format!("'{}'", escaped),          // triggerBody()?['name'] / 'name'
            format!("/{}", escaped),           // body/name, $select paths
            format!(r"\({}\)", escaped),       // ($select=name)
            format!(r#"\["{}"\]"#, escaped),   // item["name"]
            format!(r"\['{}'\]", escaped),     // item['name']
        ])
        .case_insensitive(true)
        .build()?;

        Ok(Self {
            field: field.to_string(),
            patterns,
        })
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    /// True if `text` plausibly references the field.
    pub fn is_match(&self, text: &str) -> bool {
        !text.is_empty() && self.patterns.is_match(text)
    }

    /// Comma-separated attribute list containing the field as a whole token.
    pub fn in_attribute_list(&self, list: &str) -> bool {
        list.split(',')
            .any(|attr| eq_ignore_case(attr.trim(), &self.field))
    }
}
