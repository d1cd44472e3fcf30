//! Structured-output schemas for the extraction response.
//!
//! The same document is described twice: once in the lowercase JSON-Schema
//! dialect OpenRouter's `response_format` takes, and once in the uppercase
//! OpenAPI style Gemini's `responseSchema` expects. Field descriptions
//! double as instructions; the model reads them.

use serde_json::{json, Value};

/// Name reported to providers that label their response schemas.
pub const SCHEMA_NAME: &str = "characters";

/// Which optional per-character fields to request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchemaOptions {
    /// Ask for a prose description of each character.
    pub descriptions: bool,
    /// Ask for an image-generation prompt for each character.
    pub portraits: bool,
}

/// The schema in JSON-Schema form, for OpenRouter.
pub fn json_schema(options: SchemaOptions) -> Value {
    build(options, Flavor::JsonSchema)
}

/// The schema in OpenAPI form, for Gemini.
pub fn gemini_schema(options: SchemaOptions) -> Value {
    build(options, Flavor::Gemini)
}

#[derive(Clone, Copy)]
enum Flavor {
    JsonSchema,
    Gemini,
}

/// Gemini spells types in uppercase ("OBJECT"), JSON-Schema in lowercase.
fn ty(flavor: Flavor, name: &str) -> String {
    match flavor {
        Flavor::JsonSchema => name.to_string(),
        Flavor::Gemini => name.to_uppercase(),
    }
}

fn build(options: SchemaOptions, flavor: Flavor) -> Value {
    let mut character_properties = json!({
        "id": {
            "type": ty(flavor, "number"),
            "description": "Unique identifier for the character, consistent across iterations"
        },
        "common_name": {
            "type": ty(flavor, "string"),
            "description": "The most commonly used name for this character"
        },
        "names": {
            "type": ty(flavor, "array"),
            "description": "All names used to refer to this character in the text",
            "items": { "type": ty(flavor, "string") }
        },
        "main_character": {
            "type": ty(flavor, "boolean"),
            "description": "Whether this character is a main character in the story"
        }
    });
    let mut character_required = vec!["id", "common_name", "names", "main_character"];

    if options.descriptions {
        character_properties["description"] = json!({
            "type": ty(flavor, "string"),
            "description": "A concise description of the character's appearance, personality, and role"
        });
        character_required.push("description");
    }
    if options.portraits {
        character_properties["portrait_prompt"] = json!({
            "type": ty(flavor, "string"),
            "description": "A self-contained prompt for an image generator, portraying this character"
        });
        character_required.push("portrait_prompt");
    }

    json!({
        "type": ty(flavor, "object"),
        "properties": {
            "characters": {
                "type": ty(flavor, "array"),
                "description": "Every character that appears in the text",
                "items": {
                    "type": ty(flavor, "object"),
                    "properties": character_properties,
                    "required": character_required
                }
            },
            "relations": {
                "type": ty(flavor, "array"),
                "description": "Relationships between pairs of characters",
                "items": {
                    "type": ty(flavor, "object"),
                    "properties": {
                        "id1": {
                            "type": ty(flavor, "number"),
                            "description": "The id of the first character in the pair"
                        },
                        "id2": {
                            "type": ty(flavor, "number"),
                            "description": "The id of the second character in the pair"
                        },
                        "relation": {
                            "type": ty(flavor, "array"),
                            "description": "Labels describing the relationship, e.g. friend, enemy, family",
                            "items": { "type": ty(flavor, "string") }
                        },
                        "weight": {
                            "type": ty(flavor, "number"),
                            "description": "Strength of the relationship from 1 to 10"
                        },
                        "positivity": {
                            "type": ty(flavor, "number"),
                            "description": "How positive the relationship is, from -1 to 1"
                        }
                    },
                    "required": ["id1", "id2", "relation", "weight", "positivity"]
                }
            }
        },
        "required": ["characters", "relations"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_schema_uses_lowercase_types() {
        let schema = json_schema(SchemaOptions::default());
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["characters"]["type"], "array");
        assert_eq!(
            schema["properties"]["characters"]["items"]["properties"]["id"]["type"],
            "number"
        );
    }

    #[test]
    fn gemini_schema_uses_uppercase_types() {
        let schema = gemini_schema(SchemaOptions::default());
        assert_eq!(schema["type"], "OBJECT");
        assert_eq!(
            schema["properties"]["relations"]["items"]["properties"]["positivity"]["type"],
            "NUMBER"
        );
    }

    #[test]
    fn optional_fields_are_absent_by_default() {
        let schema = json_schema(SchemaOptions::default());
        let character = &schema["properties"]["characters"]["items"];
        assert!(character["properties"].get("description").is_none());
        assert!(character["properties"].get("portrait_prompt").is_none());
    }

    #[test]
    fn options_add_fields_and_requirements() {
        let schema = json_schema(SchemaOptions {
            descriptions: true,
            portraits: true,
        });
        let character = &schema["properties"]["characters"]["items"];
        assert!(character["properties"].get("description").is_some());
        assert!(character["properties"].get("portrait_prompt").is_some());

        let required: Vec<&str> = character["required"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(Value::as_str)
            .collect();
        assert!(required.contains(&"description"));
        assert!(required.contains(&"portrait_prompt"));
    }

    #[test]
    fn relation_schema_names_both_endpoints() {
        let schema = json_schema(SchemaOptions::default());
        let relation = &schema["properties"]["relations"]["items"];
        assert!(relation["properties"].get("id1").is_some());
        assert!(relation["properties"].get("id2").is_some());
        assert_eq!(
            relation["required"].as_array().unwrap().len(),
            5
        );
    }
}
