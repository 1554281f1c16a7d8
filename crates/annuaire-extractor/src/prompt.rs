//! Prompt construction for record extraction
//!
//! The field listing and the response schema are both derived from the
//! kind's static schema, so the model is asked for exactly the columns the
//! store has.

use annuaire_domain::{FieldDef, RecordKind};
use serde_json::{json, Map, Value};

/// Builds prompts for the LLM to extract records
pub struct PromptBuilder {
    kind: RecordKind,
    text: String,
}

impl PromptBuilder {
    /// Create a new prompt builder
    pub fn new(kind: RecordKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    /// Build the complete extraction prompt
    pub fn build(&self) -> String {
        let mut prompt = String::new();

        prompt.push_str(&format!(
            "Extract structured data for {} from the following text.\n\n",
            self.kind.label()
        ));
        prompt.push_str(EXTRACTION_RULES);
        prompt.push_str("\n\n");

        prompt.push_str("Fields (name: type):\n");
        for field in self.kind.fields() {
            prompt.push_str(&field_line(field));
        }
        prompt.push('\n');

        prompt.push_str("Text to analyze:\n");
        prompt.push_str("---\n");
        prompt.push_str(&self.text);
        prompt.push_str("\n---\n\n");

        prompt.push_str(OUTPUT_FORMAT_REMINDER);
        prompt
    }
}

fn field_line(field: &FieldDef) -> String {
    let marker = if field.required { ", required" } else { "" };
    format!("- {}: {}{}\n", field.name, field.ty.as_str(), marker)
}

/// JSON schema of the expected reply for a kind
///
/// `{"entries": [ {<field>: <type or null>, ...}, ... ]}`
pub fn response_schema(kind: RecordKind) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for field in kind.fields() {
        let ty = field.ty.json_type();
        let schema = if field.required {
            required.push(Value::String(field.name.to_string()));
            json!({ "type": ty })
        } else {
            json!({ "type": [ty, "null"] })
        };
        properties.insert(field.name.to_string(), schema);
    }

    json!({
        "type": "object",
        "properties": {
            "entries": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": properties,
                    "required": required,
                }
            }
        },
        "required": ["entries"],
    })
}

const EXTRACTION_RULES: &str = "Rules:
- Produce one entry per distinct person, organisation or event found in the text
- Use only the field names listed below; leave a field null when the text does not give it
- Never invent values and never fill the 'numero' identifier
- Dates as YYYY-MM-DD, times as HH:MM
- Booleans as true or false
- Numbers as JSON numbers, without units";

const OUTPUT_FORMAT_REMINDER: &str = r#"Output format (one JSON object, no additional text):
{"entries": [ { "<field>": <value or null>, ... } ]}

Return {"entries": []} when the text contains nothing to extract."#;
