//! Schema checks shared by the request and response validators
//!
//! No I/O. Values arriving as text (path segments, query strings, headers)
//! are coerced to the JSON type their schema declares before validation.

use std::collections::BTreeMap;

use serde_json::Value;

use apiassert_core::message::is_json_media_type;

use crate::error::ValidationFailed;
use crate::spec::deref;

/// Schema errors reported per failing check.
const MAX_ERRORS: usize = 5;

/// Validate `instance` against `schema`, returning the schema errors found.
///
/// `$ref`s inside the schema resolve against the document's `components`
/// (OpenAPI 3) or `definitions` (Swagger 2). OpenAPI 3.1 documents use
/// draft 2020-12; older ones draft 4, which OpenAPI 3.0 schemas derive from.
pub(crate) fn schema_errors(
    root: &Value,
    schema: &Value,
    instance: &Value,
    context: &str,
) -> Result<Vec<String>, ValidationFailed> {
    let wrapped = wrap_schema(root, schema);
    let validator = jsonschema::options()
        .with_draft(draft_for(root))
        .build(&wrapped)
        .map_err(|e| ValidationFailed::InvalidSchema {
            context: context.to_string(),
            message: e.to_string(),
        })?;
    Ok(validator
        .iter_errors(instance)
        .take(MAX_ERRORS)
        .map(|e| e.to_string())
        .collect())
}

fn draft_for(root: &Value) -> jsonschema::Draft {
    let is_31 = root
        .get("openapi")
        .and_then(Value::as_str)
        .is_some_and(|v| v.starts_with("3.1"));
    if is_31 {
        jsonschema::Draft::Draft202012
    } else {
        jsonschema::Draft::Draft4
    }
}

/// Self-contained copy of `schema`: reference targets attached, `nullable` applied.
fn wrap_schema(root: &Value, schema: &Value) -> Value {
    // Rewritten before attaching so a top-level `anyOf` keeps `components` at the root
    let mut wrapped = schema.clone();
    apply_nullable(&mut wrapped);
    if let Value::Object(obj) = &mut wrapped {
        for key in ["components", "definitions"] {
            if let Some(section) = root.get(key) {
                obj.entry(key).or_insert_with(|| {
                    let mut section = section.clone();
                    apply_nullable(&mut section);
                    section
                });
            }
        }
    }
    wrapped
}

/// OpenAPI 3.0 `nullable: true` → `null` added to `type` (and `enum`).
///
/// A nullable schema without `type` (`allOf`, `oneOf`, a `$ref` sibling) is
/// wrapped as `anyOf: [{type: null}, schema]`.
fn apply_nullable(value: &mut Value) {
    match value {
        Value::Object(obj) => {
            obj.values_mut().for_each(apply_nullable);
            if obj.get("nullable") != Some(&Value::Bool(true)) {
                return;
            }
            match obj.get_mut("type") {
                Some(ty @ Value::String(_)) => {
                    let t = ty.take();
                    *ty = serde_json::json!([t, "null"]);
                }
                Some(Value::Array(types)) => {
                    if !types.iter().any(|t| t == "null") {
                        types.push(Value::from("null"));
                    }
                }
                Some(_) => {}
                None => {
                    obj.remove("nullable");
                    let inner = Value::Object(std::mem::take(obj));
                    *value = serde_json::json!({"anyOf": [{"type": "null"}, inner]});
                    return;
                }
            }
            if let Some(Value::Array(variants)) = obj.get_mut("enum") {
                if !variants.contains(&Value::Null) {
                    variants.push(Value::Null);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(apply_nullable),
        _ => {}
    }
}

/// Coerce raw parameter values to the type `schema` declares.
///
/// A single value for an array schema is split on `,`; repeated values
/// (`?tag=a&tag=b`) become the array items.
pub(crate) fn coerce(values: &[&str], schema: &Value, root: &Value) -> Value {
    let schema = deref(root, schema).unwrap_or(schema);
    match primary_type(schema) {
        Some("array") => {
            let items = schema.get("items").unwrap_or(&Value::Null);
            let parts: Vec<&str> = match values {
                [single] => single.split(',').collect(),
                many => many.to_vec(),
            };
            Value::Array(parts.iter().map(|p| coerce_scalar(p, items, root)).collect())
        }
        _ => coerce_scalar(values.first().copied().unwrap_or(""), schema, root),
    }
}

fn coerce_scalar(raw: &str, schema: &Value, root: &Value) -> Value {
    let schema = deref(root, schema).unwrap_or(schema);
    let text = || Value::String(raw.to_string());
    match primary_type(schema) {
        Some("integer") => raw.parse::<i64>().map(Value::from).unwrap_or_else(|_| text()),
        Some("number") => raw
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(text),
        Some("boolean") => match raw {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => text(),
        },
        Some("null") if raw.is_empty() => Value::Null,
        _ => text(),
    }
}

/// First non-null `type` of a schema (`["integer", "null"]` → `integer`).
fn primary_type(schema: &Value) -> Option<&str> {
    match schema.get("type")? {
        Value::String(t) => Some(t.as_str()),
        Value::Array(types) => types
            .iter()
            .filter_map(Value::as_str)
            .find(|t| *t != "null"),
        _ => None,
    }
}

/// Declared entry for an actual media type: exact, then `type/*`, then `*/*`.
pub(crate) fn find_media<'a>(
    content: &'a BTreeMap<String, Option<Value>>,
    actual: &str,
) -> Option<&'a Option<Value>> {
    if let Some(entry) = content.get(actual) {
        return Some(entry);
    }
    let family = actual.split('/').next().unwrap_or("");
    content
        .get(&format!("{family}/*"))
        .or_else(|| content.get("*/*"))
}

/// Validate a body against the schema declared for its media type.
///
/// Only JSON bodies are checked structurally; other media types are
/// accepted once the media type itself matches.
pub(crate) fn check_body(
    root: &Value,
    media: &str,
    schema: Option<&Value>,
    body: &[u8],
    context: &str,
) -> Result<(), ValidationFailed> {
    let Some(schema) = schema else {
        return Ok(());
    };
    if !is_json_media_type(media) {
        return Ok(());
    }
    let instance: Value =
        serde_json::from_slice(body).map_err(|e| ValidationFailed::MalformedBody {
            context: context.to_string(),
            message: e.to_string(),
        })?;
    let errors = schema_errors(root, schema, &instance, context)?;
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationFailed::Body {
            context: context.to_string(),
            errors,
        })
    }
}
