//! Discovery of third-party names in activity-log sentences.
//!
//! Titles in the export read like "Jane commented on John's post." The
//! name after the verb belongs to someone who never consented to the
//! donation, so it is collected and added to that table's denylist.
//!
//! The sentence shapes live in a versioned template table. New phrasings
//! are added to the table; the matching code does not change.

use crate::error::{ExtractError, Result};
use crate::types::Table;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Bumped whenever the built-in template table changes
pub const TEMPLATE_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Language {
    English,
    Dutch,
}

/// (language, pattern, capture group holding the name)
const BUILTIN_TEMPLATES: &[(Language, &str, usize)] = &[
    (Language::English, r"commented on (.+?)['’]s (?:post|photo|video|comment|link|status|reel|album|note)\.", 1),
    (Language::English, r"replied to (.+?)['’]s (?:comment|post|photo|video)\.", 1),
    (Language::English, r"(?:likes|liked) (.+?)['’]s (?:post|photo|video|comment|link|status|reel|album)\.", 1),
    (Language::English, r"reacted to (.+?)['’]s (?:post|photo|video|comment|link|status|reel|album)\.", 1),
    (Language::English, r"shared (.+?)['’]s (?:post|photo|video|link|reel|album)\.", 1),
    (Language::English, r"wrote on (.+?)['’]s (?:timeline|wall)\.", 1),
    (Language::English, r"was tagged in (.+?)['’]s (?:post|photo|video)\.", 1),
    (Language::English, r"is now friends with (.+?)\.", 1),
    (Language::Dutch, r"heeft gereageerd op (.+?)['’]s (?:bericht|foto|video|opmerking|link)\.", 1),
    (Language::Dutch, r"reageerde op (.+?)['’]s (?:bericht|foto|video|opmerking|link|reel|album)\.", 1),
    (Language::Dutch, r"reageerde op (?:het|de) (?:bericht|foto|video|opmerking|link) van (.+?)\.", 1),
    (Language::Dutch, r"vindt (.+?)['’]s (?:bericht|foto|video|opmerking|link) leuk\.", 1),
    (Language::Dutch, r"vindt (?:het|de) (?:bericht|foto|video|opmerking|link) van (.+?) leuk\.", 1),
    (Language::Dutch, r"deelde (.+?)['’]s (?:bericht|foto|video|link|reel)\.", 1),
    (Language::Dutch, r"schreef op de tijdlijn van (.+?)\.", 1),
    (Language::Dutch, r"is nu bevriend met (.+?)\.", 1),
];

/// One sentence shape that embeds a third-party name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipientTemplate {
    pub language: Language,
    pub pattern: String,
    pub group: usize,
}

/// An ordered, versioned list of templates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipientTemplates {
    pub version: u32,
    pub templates: Vec<RecipientTemplate>,
}

impl RecipientTemplates {
    pub fn builtin() -> Self {
        RecipientTemplates {
            version: TEMPLATE_VERSION,
            templates: BUILTIN_TEMPLATES
                .iter()
                .map(|&(language, pattern, group)| RecipientTemplate {
                    language,
                    pattern: pattern.to_string(),
                    group,
                })
                .collect(),
        }
    }

    pub fn with_template(mut self, language: Language, pattern: impl Into<String>, group: usize) -> Self {
        self.templates.push(RecipientTemplate {
            language,
            pattern: pattern.into(),
            group,
        });
        self
    }
}

/// Compiled templates, tried in table order
#[derive(Debug, Clone)]
pub struct RecipientExtractor {
    version: u32,
    compiled: Vec<(Regex, usize)>,
}

static BUILTIN: Lazy<RecipientExtractor> = Lazy::new(|| {
    RecipientExtractor::new(&RecipientTemplates::builtin()).expect("built-in recipient templates compile")
});

impl RecipientExtractor {
    pub fn new(templates: &RecipientTemplates) -> Result<Self> {
        let mut compiled = Vec::with_capacity(templates.templates.len());
        for template in &templates.templates {
            let regex = Regex::new(&template.pattern).map_err(|source| ExtractError::PatternCompile {
                pattern: template.pattern.clone(),
                source,
            })?;
            if template.group == 0 || template.group >= regex.captures_len() {
                return Err(ExtractError::MissingCaptureGroup {
                    pattern: template.pattern.clone(),
                    group: template.group,
                });
            }
            compiled.push((regex, template.group));
        }
        Ok(RecipientExtractor {
            version: templates.version,
            compiled,
        })
    }

    /// The extractor for the built-in template table
    pub fn builtin() -> &'static RecipientExtractor {
        &BUILTIN
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// Every name captured from one sentence, template by template
    pub fn extract_from_text(&self, text: &str) -> Vec<String> {
        let mut names = Vec::new();
        for (regex, group) in &self.compiled {
            for caps in regex.captures_iter(text) {
                if let Some(m) = caps.get(*group) {
                    let name = m.as_str().trim();
                    if !name.is_empty() {
                        names.push(name.to_string());
                    }
                }
            }
        }
        names
    }

    /// Names found in the string cells of `column`, in row order, duplicates kept
    pub fn extract(&self, table: &Table, column: &str) -> Vec<String> {
        table
            .column_cells(column)
            .filter_map(Value::as_str)
            .flat_map(|text| self.extract_from_text(text))
            .collect()
    }
}

/// Run the built-in templates over one column
pub fn extract_recipients(table: &Table, column: &str) -> Vec<String> {
    RecipientExtractor::builtin().extract(table, column)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn titles(cells: &[Value]) -> Table {
        let mut table = Table::new("t", "T", &["Title"]);
        for cell in cells {
            table.push_row(vec![cell.clone()]).unwrap();
        }
        table
    }

    #[test]
    fn test_builtin_templates_compile() {
        let extractor = RecipientExtractor::builtin();
        assert_eq!(extractor.version(), TEMPLATE_VERSION);
        assert_eq!(extractor.compiled.len(), BUILTIN_TEMPLATES.len());
    }

    #[test]
    fn test_commented_on_post() {
        let table = titles(&[json!("John commented on Mary's post.")]);
        assert_eq!(extract_recipients(&table, "Title"), vec!["Mary"]);
    }

    #[test]
    fn test_dutch_phrasings() {
        let table = titles(&[
            json!("Jan reageerde op Piet's bericht."),
            json!("Jan vindt het bericht van Klaas de Vries leuk."),
            json!("Jan is nu bevriend met Anouk."),
        ]);
        assert_eq!(
            extract_recipients(&table, "Title"),
            vec!["Piet", "Klaas de Vries", "Anouk"]
        );
    }

    #[test]
    fn test_curly_apostrophe_and_full_names() {
        let table = titles(&[json!("Jane Doe reacted to Bob van Dam’s photo.")]);
        assert_eq!(extract_recipients(&table, "Title"), vec!["Bob van Dam"]);
    }

    #[test]
    fn test_duplicates_and_multiple_templates_are_kept() {
        let table = titles(&[
            json!("A commented on Mary's post."),
            json!("B commented on Mary's post."),
            json!("C liked Tom's photo. C shared Tom's video."),
        ]);
        assert_eq!(
            extract_recipients(&table, "Title"),
            vec!["Mary", "Mary", "Tom", "Tom"]
        );
    }

    #[test]
    fn test_non_matching_and_non_string_cells() {
        let table = titles(&[json!("Jane updated her status."), json!(42), json!(null)]);
        assert!(extract_recipients(&table, "Title").is_empty());
        assert!(extract_recipients(&table, "Missing").is_empty());
    }

    #[test]
    fn test_sentence_without_final_punctuation_yields_nothing() {
        let table = titles(&[
            json!("John commented on Mary's post"),
            json!("Jan reageerde op Piet's bericht"),
            json!("Jane is now friends with Sam"),
        ]);
        assert!(extract_recipients(&table, "Title").is_empty());
    }

    #[test]
    fn test_custom_template_table() {
        let templates = RecipientTemplates::builtin().with_template(
            Language::English,
            r"poked (.+?)\.",
            1,
        );
        let extractor = RecipientExtractor::new(&templates).unwrap();
        assert_eq!(extractor.extract_from_text("Jane poked Sam."), vec!["Sam"]);
    }

    #[test]
    fn test_invalid_templates_are_rejected() {
        let bad_pattern = RecipientTemplates { version: 2, templates: vec![] }
            .with_template(Language::English, r"commented on (.+?", 1);
        assert!(matches!(
            RecipientExtractor::new(&bad_pattern),
            Err(ExtractError::PatternCompile { .. })
        ));

        let bad_group = RecipientTemplates { version: 2, templates: vec![] }
            .with_template(Language::English, r"commented on (.+?)\.", 2);
        assert!(matches!(
            RecipientExtractor::new(&bad_group),
            Err(ExtractError::MissingCaptureGroup { group: 2, .. })
        ));
    }
}
