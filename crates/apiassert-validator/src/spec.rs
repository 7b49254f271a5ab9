//! OpenAPI operation extraction: parameters, request bodies, responses

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::ValidationFailed;

/// Methods an OpenAPI path item may declare.
pub(crate) const METHODS: &[&str] = &[
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

/// `$ref` chains longer than this are treated as unresolvable.
const MAX_REF_DEPTH: u32 = 20;

/// Extracted API operation
#[derive(Debug, Clone)]
pub struct Operation {
    /// Upper-case method, e.g. "GET"
    pub method: String,
    /// Path template as declared, e.g. "/users/{id}"
    pub path: String,
    pub parameters: Vec<Parameter>,
    pub request_body: Option<RequestBody>,
    /// Declared responses in document order
    pub responses: Vec<(StatusKey, ResponseSpec)>,
    /// References that could not be resolved while extracting
    pub unresolved: Vec<String>,
}

impl Operation {
    /// "GET /users/{id}"
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} {}", self.method, self.path)
    }

    /// Response declared for `status`: exact code, then `NXX` range, then `default`.
    #[must_use]
    pub fn response_for(&self, status: u16) -> Option<&ResponseSpec> {
        let find = |wanted: StatusKey| {
            self.responses
                .iter()
                .find(|(key, _)| *key == wanted)
                .map(|(_, spec)| spec)
        };
        find(StatusKey::Exact(status))
            .or_else(|| find(StatusKey::Range(status / 100)))
            .or_else(|| find(StatusKey::Default))
    }

    #[must_use]
    pub fn declared_statuses(&self) -> Vec<String> {
        self.responses.iter().map(|(key, _)| key.to_string()).collect()
    }

    /// Fails on the first reference that could not be resolved at load time.
    pub(crate) fn ensure_resolved(&self) -> Result<(), ValidationFailed> {
        match self.unresolved.first() {
            Some(reference) => Err(ValidationFailed::UnresolvedReference {
                operation: self.label(),
                reference: reference.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: String,
    pub location: ParamLocation,
    pub schema: Value,
    pub required: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamLocation {
    Path,
    Query,
    Header,
    Cookie,
}

impl ParamLocation {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "path" => Some(Self::Path),
            "query" => Some(Self::Query),
            "header" => Some(Self::Header),
            "cookie" => Some(Self::Cookie),
            _ => None,
        }
    }
}

impl std::fmt::Display for ParamLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Path => "path",
            Self::Query => "query",
            Self::Header => "header",
            Self::Cookie => "cookie",
        })
    }
}

#[derive(Debug, Clone)]
pub struct RequestBody {
    pub required: bool,
    /// Media type → schema (if declared)
    pub content: BTreeMap<String, Option<Value>>,
}

#[derive(Debug, Clone, Default)]
pub struct ResponseSpec {
    /// Media type → schema (if declared)
    pub content: BTreeMap<String, Option<Value>>,
    pub headers: Vec<HeaderSpec>,
}

#[derive(Debug, Clone)]
pub struct HeaderSpec {
    pub name: String,
    pub schema: Option<Value>,
    pub required: bool,
}

/// Key of a `responses` entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKey {
    Exact(u16),
    /// `2XX` → `Range(2)`
    Range(u16),
    Default,
}

impl StatusKey {
    fn parse(key: &str) -> Option<Self> {
        if key == "default" {
            return Some(Self::Default);
        }
        if let Ok(code) = key.parse::<u16>() {
            return Some(Self::Exact(code));
        }
        let bytes = key.as_bytes();
        if bytes.len() == 3 && bytes[0].is_ascii_digit() && key[1..].eq_ignore_ascii_case("xx") {
            return Some(Self::Range(u16::from(bytes[0] - b'0')));
        }
        None
    }
}

impl std::fmt::Display for StatusKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exact(code) => write!(f, "{code}"),
            Self::Range(class) => write!(f, "{class}XX"),
            Self::Default => f.write_str("default"),
        }
    }
}

/// Follow a local `$ref` chain (`#/components/...`) to the referenced object.
///
/// Returns the unresolvable reference on failure. External references are
/// never resolved.
pub(crate) fn deref<'a>(root: &'a Value, value: &'a Value) -> Result<&'a Value, String> {
    let mut current = value;
    for _ in 0..MAX_REF_DEPTH {
        let Some(reference) = current.get("$ref").and_then(Value::as_str) else {
            return Ok(current);
        };
        current = reference
            .strip_prefix('#')
            .and_then(|pointer| root.pointer(pointer))
            .ok_or_else(|| reference.to_string())?;
    }
    Err(value
        .get("$ref")
        .and_then(Value::as_str)
        .unwrap_or("$ref")
        .to_string())
}

pub(crate) fn extract_operations(root: &Value) -> Vec<Operation> {
    let mut ops = Vec::new();

    let paths = match root.get("paths").and_then(|p| p.as_object()) {
        Some(p) => p,
        None => return ops,
    };

    for (path, path_item) in paths {
        let mut unresolved_item = Vec::new();
        let path_item = match deref(root, path_item) {
            Ok(item) => item,
            Err(reference) => {
                tracing::warn!(path = %path, reference = %reference, "unresolved path item");
                continue;
            }
        };
        let shared = collect_parameters(root, path_item.get("parameters"), &mut unresolved_item);

        for method in METHODS {
            let Some(operation) = path_item.get(*method) else {
                continue;
            };
            let mut unresolved = unresolved_item.clone();

            // Operation-level parameters override path-level ones by name + location
            let own = collect_parameters(root, operation.get("parameters"), &mut unresolved);
            let mut parameters: Vec<Parameter> = shared
                .iter()
                .filter(|p| {
                    !own.iter()
                        .any(|o| o.name == p.name && o.location == p.location)
                })
                .cloned()
                .collect();
            parameters.extend(own);

            // Swagger 2.0 bodies are `in: body` parameters
            let request_body = match operation.get("requestBody") {
                Some(rb) => parse_request_body(root, rb, &mut unresolved),
                None => swagger2_body(root, operation, path_item),
            };

            let mut responses = Vec::new();
            if let Some(obj) = operation.get("responses").and_then(|r| r.as_object()) {
                for (status_str, resp_obj) in obj {
                    let Some(key) = StatusKey::parse(status_str) else {
                        continue;
                    };
                    match deref(root, resp_obj) {
                        Ok(resp) => {
                            responses.push((key, parse_response(root, resp, &mut unresolved)));
                        }
                        Err(reference) => unresolved.push(reference),
                    }
                }
            }

            for reference in &unresolved {
                tracing::warn!(
                    operation = %format!("{} {path}", method.to_uppercase()),
                    reference = %reference,
                    "unresolved reference"
                );
            }

            ops.push(Operation {
                method: method.to_uppercase(),
                path: path.clone(),
                parameters,
                request_body,
                responses,
                unresolved,
            });
        }
    }

    ops
}

fn collect_parameters(
    root: &Value,
    source: Option<&Value>,
    unresolved: &mut Vec<String>,
) -> Vec<Parameter> {
    let mut params = Vec::new();
    for param in source.and_then(|s| s.as_array()).into_iter().flatten() {
        match deref(root, param) {
            Ok(p) => params.extend(parse_parameter(p)),
            Err(reference) => unresolved.push(reference),
        }
    }
    params
}

fn parse_parameter(param: &Value) -> Option<Parameter> {
    let name = param.get("name")?.as_str()?.to_string();
    let location = ParamLocation::parse(param.get("in")?.as_str()?)?;
    let schema = param
        .get("schema")
        .cloned()
        .or_else(|| swagger2_inline_schema(param))
        .unwrap_or(serde_json::json!({"type": "string"}));
    let required = location == ParamLocation::Path
        || param
            .get("required")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

    Some(Parameter {
        name,
        location,
        schema,
        required,
    })
}

/// Swagger 2.0 non-body parameters carry `type`/`format`/... inline.
fn swagger2_inline_schema(param: &Value) -> Option<Value> {
    let obj = param.as_object()?;
    obj.get("type")?;
    let schema: serde_json::Map<String, Value> = obj
        .iter()
        .filter(|(k, _)| !matches!(k.as_str(), "name" | "in" | "required" | "description"))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    Some(Value::Object(schema))
}

/// Dangling parameter refs were already recorded by `collect_parameters`.
fn swagger2_body(root: &Value, operation: &Value, path_item: &Value) -> Option<RequestBody> {
    let params = [operation.get("parameters"), path_item.get("parameters")];
    let body = params
        .iter()
        .flatten()
        .filter_map(|p| p.as_array())
        .flatten()
        .filter_map(|p| deref(root, p).ok())
        .find(|p| p.get("in").and_then(Value::as_str) == Some("body"))?;

    let consumes = operation
        .get("consumes")
        .or_else(|| root.get("consumes"))
        .and_then(|c| c.as_array())
        .map(|types| {
            types
                .iter()
                .filter_map(|t| t.as_str().map(str::to_string))
                .collect::<Vec<_>>()
        })
        .filter(|types| !types.is_empty())
        .unwrap_or_else(|| vec!["application/json".to_string()]);

    let schema = body.get("schema").cloned();
    Some(RequestBody {
        required: body.get("required").and_then(Value::as_bool).unwrap_or(false),
        content: consumes.into_iter().map(|t| (t, schema.clone())).collect(),
    })
}

fn parse_request_body(
    root: &Value,
    rb: &Value,
    unresolved: &mut Vec<String>,
) -> Option<RequestBody> {
    let rb = match deref(root, rb) {
        Ok(rb) => rb,
        Err(reference) => {
            unresolved.push(reference);
            return None;
        }
    };
    Some(RequestBody {
        required: rb.get("required").and_then(Value::as_bool).unwrap_or(false),
        content: parse_content(rb.get("content")),
    })
}

fn parse_response(root: &Value, resp: &Value, unresolved: &mut Vec<String>) -> ResponseSpec {
    let mut content = parse_content(resp.get("content"));

    // Swagger 2.0: a single `schema`, media types from `produces`
    if content.is_empty() {
        if let Some(schema) = resp.get("schema") {
            let produces = root
                .get("produces")
                .and_then(|p| p.as_array())
                .map(|types| {
                    types
                        .iter()
                        .filter_map(|t| t.as_str().map(str::to_string))
                        .collect::<Vec<_>>()
                })
                .filter(|types| !types.is_empty())
                .unwrap_or_else(|| vec!["application/json".to_string()]);
            for media in produces {
                content.insert(media, Some(schema.clone()));
            }
        }
    }

    let mut headers = Vec::new();
    if let Some(obj) = resp.get("headers").and_then(|h| h.as_object()) {
        for (name, header) in obj {
            match deref(root, header) {
                Ok(h) => headers.push(HeaderSpec {
                    name: name.clone(),
                    schema: h.get("schema").cloned().or_else(|| swagger2_inline_schema(h)),
                    required: h.get("required").and_then(Value::as_bool).unwrap_or(false),
                }),
                Err(reference) => unresolved.push(reference),
            }
        }
    }

    ResponseSpec { content, headers }
}

fn parse_content(content: Option<&Value>) -> BTreeMap<String, Option<Value>> {
    content
        .and_then(|c| c.as_object())
        .map(|obj| {
            obj.iter()
                .map(|(media, ct)| (media.to_ascii_lowercase(), ct.get("schema").cloned()))
                .collect()
        })
        .unwrap_or_default()
}

/// Match a concrete path against a template, segment by segment.
///
/// `{name}` captures non-empty text; literal text around placeholders
/// (`{id}.json`, `{name}.{ext}`) must match exactly. A placeholder followed by
/// more placeholders stops at the first occurrence of the next literal, the
/// last one extends to the segment's trailing literal. Returns captured
/// parameters on success.
pub(crate) fn match_path(template: &str, path: &str) -> Option<Vec<(String, String)>> {
    let tpl: Vec<&str> = template.split('/').collect();
    let concrete: Vec<&str> = path.split('/').collect();
    if tpl.len() != concrete.len() {
        return None;
    }

    let mut captures = Vec::new();
    for (t, c) in tpl.iter().zip(&concrete) {
        match_segment(t, c, &mut captures)?;
    }
    Some(captures)
}

fn match_segment(
    template: &str,
    segment: &str,
    captures: &mut Vec<(String, String)>,
) -> Option<()> {
    let (mut tpl, mut rest) = (template, segment);
    loop {
        let Some((open, close)) = placeholder(tpl) else {
            return (tpl == rest).then_some(());
        };
        rest = rest.strip_prefix(&tpl[..open])?;
        let name = &tpl[open + 1..close];
        tpl = &tpl[close + 1..];

        let end = match placeholder(tpl) {
            None => rest.len().checked_sub(tpl.len()).filter(|_| rest.ends_with(tpl))?,
            // `{a}{b}` has no literal to split on
            Some((0, _)) => return None,
            Some((next, _)) => rest.find(&tpl[..next])?,
        };
        if end == 0 {
            return None;
        }
        captures.push((name.to_string(), rest[..end].to_string()));
        rest = &rest[end..];
    }
}

/// Byte offsets of the first `{` and its closing `}`.
fn placeholder(template: &str) -> Option<(usize, usize)> {
    let open = template.find('{')?;
    let close = open + template[open..].find('}')?;
    Some((open, close))
}

/// Number of fully literal segments, used to prefer `/users/me` over `/users/{id}`.
pub(crate) fn literal_segments(template: &str) -> usize {
    template.split('/').filter(|s| !s.contains('{')).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extract_operations_from_spec() {
        let spec = json!({
            "openapi": "3.1.0",
            "info": {"title": "Test", "version": "1.0"},
            "paths": {
                "/health": {
                    "get": {
                        "responses": {"200": {"description": "OK"}}
                    }
                },
                "/users": {
                    "post": {
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "type": "object",
                                        "properties": {"name": {"type": "string"}},
                                        "required": ["name"]
                                    }
                                }
                            }
                        },
                        "responses": {"201": {}, "4XX": {}, "default": {}}
                    }
                },
                "/users/{user_id}": {
                    "parameters": [
                        {"name": "user_id", "in": "path", "schema": {"type": "integer"}}
                    ],
                    "get": {
                        "parameters": [
                            {"name": "fields", "in": "query", "schema": {"type": "string"}}
                        ],
                        "responses": {"200": {}, "404": {}}
                    },
                    "delete": {"responses": {"204": {}}}
                }
            }
        });

        let ops = extract_operations(&spec);
        assert_eq!(ops.len(), 4);

        let health = ops.iter().find(|o| o.path == "/health").unwrap();
        assert_eq!(health.method, "GET");
        assert!(health.parameters.is_empty());
        assert!(health.request_body.is_none());

        let create = ops.iter().find(|o| o.path == "/users").unwrap();
        assert_eq!(create.method, "POST");
        let body = create.request_body.as_ref().unwrap();
        assert!(body.required);
        assert!(body.content["application/json"].is_some());
        assert_eq!(create.declared_statuses(), vec!["201", "4XX", "default"]);

        let get_user = ops
            .iter()
            .find(|o| o.path == "/users/{user_id}" && o.method == "GET")
            .unwrap();
        assert_eq!(get_user.parameters.len(), 2);
        let id = &get_user.parameters[0];
        assert_eq!(id.name, "user_id");
        assert_eq!(id.location, ParamLocation::Path);
        assert!(id.required, "path parameters are always required");

        let delete_user = ops
            .iter()
            .find(|o| o.path == "/users/{user_id}" && o.method == "DELETE")
            .unwrap();
        assert_eq!(delete_user.parameters.len(), 1);
    }

    #[test]
    fn operation_parameter_overrides_path_level() {
        let spec = json!({
            "openapi": "3.0.0",
            "paths": {
                "/items": {
                    "parameters": [{"name": "q", "in": "query", "required": true}],
                    "get": {
                        "parameters": [{"name": "q", "in": "query", "required": false}],
                        "responses": {"200": {}}
                    }
                }
            }
        });
        let ops = extract_operations(&spec);
        assert_eq!(ops[0].parameters.len(), 1);
        assert!(!ops[0].parameters[0].required);
        assert_eq!(ops[0].parameters[0].schema, json!({"type": "string"}));
    }

    #[test]
    fn refs_resolved_for_parameters_bodies_responses() {
        let spec = json!({
            "openapi": "3.0.0",
            "paths": {
                "/users": {
                    "post": {
                        "parameters": [{"$ref": "#/components/parameters/Trace"}],
                        "requestBody": {"$ref": "#/components/requestBodies/NewUser"},
                        "responses": {"201": {"$ref": "#/components/responses/User"}}
                    }
                }
            },
            "components": {
                "parameters": {
                    "Trace": {"name": "X-Trace", "in": "header", "required": true}
                },
                "requestBodies": {
                    "NewUser": {"content": {"application/json": {"schema": {"type": "object"}}}}
                },
                "responses": {
                    "User": {
                        "headers": {"Location": {"required": true, "schema": {"type": "string"}}},
                        "content": {"application/json": {"schema": {"$ref": "#/components/schemas/User"}}}
                    }
                },
                "schemas": {"User": {"type": "object"}}
            }
        });
        let ops = extract_operations(&spec);
        let op = &ops[0];
        assert!(op.unresolved.is_empty());
        assert_eq!(op.parameters[0].name, "X-Trace");
        assert_eq!(op.parameters[0].location, ParamLocation::Header);
        assert!(op.request_body.is_some());
        let resp = op.response_for(201).unwrap();
        assert_eq!(resp.headers[0].name, "Location");
        assert!(resp.headers[0].required);
        // Schema refs stay in place for the validator to resolve
        assert_eq!(
            resp.content["application/json"],
            Some(json!({"$ref": "#/components/schemas/User"}))
        );
    }

    #[test]
    fn unresolved_refs_are_recorded() {
        let spec = json!({
            "openapi": "3.0.0",
            "paths": {
                "/users": {
                    "get": {
                        "parameters": [{"$ref": "#/components/parameters/Missing"}],
                        "responses": {"200": {"$ref": "other.yaml#/User"}}
                    }
                }
            }
        });
        let ops = extract_operations(&spec);
        assert_eq!(
            ops[0].unresolved,
            vec!["#/components/parameters/Missing", "other.yaml#/User"]
        );
    }

    #[test]
    fn circular_refs_terminate() {
        let root = json!({
            "components": {"a": {"$ref": "#/components/b"}, "b": {"$ref": "#/components/a"}}
        });
        let start = json!({"$ref": "#/components/a"});
        assert_eq!(deref(&root, &start).unwrap_err(), "#/components/a");
    }

    #[test]
    fn swagger2_operations() {
        let spec = json!({
            "swagger": "2.0",
            "produces": ["application/json"],
            "paths": {
                "/pets/{petId}": {
                    "put": {
                        "parameters": [
                            {"name": "petId", "in": "path", "required": true, "type": "integer", "format": "int64"},
                            {"name": "body", "in": "body", "required": true, "schema": {"type": "object"}}
                        ],
                        "responses": {"200": {"schema": {"type": "object"}}}
                    }
                }
            }
        });
        let ops = extract_operations(&spec);
        let op = &ops[0];
        assert_eq!(op.parameters.len(), 1);
        assert_eq!(
            op.parameters[0].schema,
            json!({"type": "integer", "format": "int64"})
        );
        let body = op.request_body.as_ref().unwrap();
        assert!(body.required);
        assert!(body.content.contains_key("application/json"));
        assert!(op.response_for(200).unwrap().content["application/json"].is_some());
    }

    #[test]
    fn response_lookup_order() {
        let spec = json!({
            "openapi": "3.0.0",
            "paths": {"/x": {"get": {"responses": {
                "200": {"description": "exact"},
                "2XX": {"content": {"text/plain": {}}},
                "default": {"content": {"application/problem+json": {}}}
            }}}}
        });
        let ops = extract_operations(&spec);
        let op = &ops[0];
        assert!(op.response_for(200).unwrap().content.is_empty());
        assert!(op.response_for(201).unwrap().content.contains_key("text/plain"));
        assert!(
            op.response_for(500)
                .unwrap()
                .content
                .contains_key("application/problem+json")
        );
    }

    #[test]
    fn response_lookup_without_default() {
        let spec = json!({
            "openapi": "3.0.0",
            "paths": {"/x": {"get": {"responses": {"200": {}}}}}
        });
        let ops = extract_operations(&spec);
        assert!(ops[0].response_for(404).is_none());
    }

    #[test]
    fn status_key_parsing() {
        assert_eq!(StatusKey::parse("200"), Some(StatusKey::Exact(200)));
        assert_eq!(StatusKey::parse("4XX"), Some(StatusKey::Range(4)));
        assert_eq!(StatusKey::parse("5xx"), Some(StatusKey::Range(5)));
        assert_eq!(StatusKey::parse("default"), Some(StatusKey::Default));
        assert_eq!(StatusKey::parse("x-extension"), None);
        assert_eq!(StatusKey::Range(2).to_string(), "2XX");
    }

    #[test]
    fn match_path_captures() {
        assert_eq!(
            match_path("/users/{id}", "/users/42"),
            Some(vec![("id".to_string(), "42".to_string())])
        );
        assert_eq!(match_path("/users", "/users"), Some(vec![]));
        assert_eq!(match_path("/users/{id}", "/users"), None);
        assert_eq!(match_path("/users/{id}", "/users/"), None);
        assert_eq!(match_path("/users/{id}", "/orders/42"), None);
        assert_eq!(
            match_path("/files/{name}.json", "/files/report.json"),
            Some(vec![("name".to_string(), "report".to_string())])
        );
        assert_eq!(match_path("/files/{name}.json", "/files/report.xml"), None);
    }

    #[test]
    fn match_path_splits_placeholders_in_one_segment() {
        assert_eq!(
            match_path("/files/{name}.{ext}", "/files/report.pdf"),
            Some(vec![
                ("name".to_string(), "report".to_string()),
                ("ext".to_string(), "pdf".to_string()),
            ])
        );
        assert_eq!(
            match_path("/v/{major}-{minor}.json", "/v/1-2.json"),
            Some(vec![
                ("major".to_string(), "1".to_string()),
                ("minor".to_string(), "2".to_string()),
            ])
        );
        // the last placeholder takes everything up to the trailing literal
        assert_eq!(
            match_path("/files/{name}.{ext}", "/files/archive.tar.gz"),
            Some(vec![
                ("name".to_string(), "archive".to_string()),
                ("ext".to_string(), "tar.gz".to_string()),
            ])
        );
        assert_eq!(match_path("/files/{name}.{ext}", "/files/report"), None);
        assert_eq!(match_path("/files/{name}.{ext}", "/files/report."), None);
        assert_eq!(match_path("/files/{name}.{ext}", "/files/.pdf"), None);
        assert_eq!(match_path("/files/{a}{b}", "/files/ab"), None);
    }

    #[test]
    fn literal_segment_count() {
        assert!(literal_segments("/users/me") > literal_segments("/users/{id}"));
    }
}
