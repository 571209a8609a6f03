//! Validate tool call arguments against a tool's JSON Schema before running it.

use serde_json::Value;
use tracing::warn;

/// Validate arguments against a tool's JSON Schema.
///
/// Every violation is reported, each tagged with the offending instance
/// path, so the model can fix them all in one retry. A schema that does not
/// compile is logged and skipped.
pub fn validate_arguments(args: &Value, schema: &Value) -> Result<(), Vec<String>> {
    if !schema.is_object() {
        return Ok(());
    }
    let compiled = match jsonschema::JSONSchema::compile(schema) {
        Ok(compiled) => compiled,
        Err(err) => {
            warn!(error = %err, "invalid tool schema, skipping argument validation");
            return Ok(());
        }
    };

    let violations: Vec<String> = match compiled.validate(args) {
        Ok(()) => return Ok(()),
        Err(errors) => errors
            .map(|err| {
                let path = err.instance_path.to_string();
                if path.is_empty() {
                    err.to_string()
                } else {
                    format!("{err} at {path}")
                }
            })
            .collect(),
    };
    Err(violations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn widgets_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "colour": { "type": "string", "enum": ["red", "yellow", "green", "purple"] },
                "limit": { "type": "integer" },
            },
            "required": ["colour"],
        })
    }

    #[test]
    fn accepts_valid_arguments() {
        let args = json!({ "colour": "red", "limit": 2 });

        let result = validate_arguments(&args, &widgets_schema());

        assert!(result.is_ok());
    }

    #[test]
    fn rejects_array_where_object_expected() {
        let args = json!(["red"]);

        let violations = validate_arguments(&args, &widgets_schema()).unwrap_err();

        assert_eq!(violations.len(), 1);
        assert!(violations[0].contains("is not of type \"object\""));
    }

    #[test]
    fn reports_every_violation_at_once() {
        let schema = json!({
            "type": "object",
            "properties": {
                "path": { "type": "string" },
                "content": { "type": "string" },
                "append": { "type": "boolean" },
            },
            "required": ["path", "content"],
        });
        let args = json!({ "append": "yes" });

        let violations = validate_arguments(&args, &schema).unwrap_err();

        assert_eq!(violations.len(), 3);
        assert!(violations.iter().any(|v| v.contains("\"path\" is a required property")));
        assert!(violations.iter().any(|v| v.contains("\"content\" is a required property")));
        assert!(violations
            .iter()
            .any(|v| v.contains("\"boolean\"") && v.ends_with("at /append")));
    }

    #[test]
    fn rejects_value_outside_enum() {
        let args = json!({ "colour": "blue" });

        let violations = validate_arguments(&args, &widgets_schema()).unwrap_err();

        assert_eq!(violations.len(), 1);
        assert!(violations[0].contains("\"blue\""));
        assert!(violations[0].ends_with("at /colour"));
    }

    #[test]
    fn integer_rejects_fractional_numbers() {
        let args = json!({ "colour": "red", "limit": 1.5 });

        let violations = validate_arguments(&args, &widgets_schema()).unwrap_err();

        assert_eq!(violations.len(), 1);
        assert!(violations[0].contains("\"integer\""));
        assert!(violations[0].ends_with("at /limit"));
    }

    #[test]
    fn nested_items_and_bounds_are_enforced() {
        let schema = json!({
            "type": "object",
            "properties": {
                "paths": { "type": "array", "items": { "type": "string" }, "minItems": 1 },
                "options": {
                    "type": "object",
                    "properties": { "depth": { "type": "integer", "minimum": 0 } },
                    "required": ["depth"],
                },
            },
            "required": ["paths"],
        });

        let wrong_items = validate_arguments(&json!({ "paths": [1, "ok", 2] }), &schema).unwrap_err();
        assert_eq!(wrong_items.len(), 2);
        assert!(wrong_items.iter().any(|v| v.ends_with("at /paths/0")));
        assert!(wrong_items.iter().any(|v| v.ends_with("at /paths/2")));

        let empty = validate_arguments(&json!({ "paths": [] }), &schema).unwrap_err();
        assert_eq!(empty.len(), 1);
        assert!(empty[0].ends_with("at /paths"));

        let nested = validate_arguments(
            &json!({ "paths": ["src"], "options": { "depth": -1 } }),
            &schema,
        )
        .unwrap_err();
        assert_eq!(nested.len(), 1);
        assert!(nested[0].ends_with("at /options/depth"));

        assert!(validate_arguments(&json!({ "paths": ["src"], "options": { "depth": 2 } }), &schema).is_ok());
    }

    #[test]
    fn extra_fields_and_empty_schema_are_allowed() {
        assert!(validate_arguments(&json!({ "colour": "red", "extra": true }), &widgets_schema()).is_ok());
        assert!(validate_arguments(&json!({ "anything": 42 }), &json!({})).is_ok());
        assert!(validate_arguments(&Value::Null, &json!({})).is_ok());
    }

    #[test]
    fn uncompilable_schema_is_skipped() {
        let schema = json!({ "type": "not-a-real-type" });
        assert!(validate_arguments(&json!({ "colour": "red" }), &schema).is_ok());
    }
}
