//! Loaded OpenAPI / Swagger document

use std::path::Path;

use serde_json::Value;

use crate::error::ValidatorError;
use crate::spec::{Operation, extract_operations, literal_segments, match_path};

/// A parsed document with its operations extracted.
#[derive(Debug, Clone)]
pub struct SchemaDocument {
    root: Value,
    operations: Vec<Operation>,
    base_paths: Vec<String>,
}

/// Operation found for a concrete request path.
pub(crate) struct RequestMatch<'a> {
    pub(crate) operation: &'a Operation,
    pub(crate) path_params: Vec<(String, String)>,
}

/// Why no operation matched a concrete request.
pub(crate) enum LookupMiss {
    /// No declared path matches
    NoPath,
    /// A path matches, but not with this method
    NoMethod(String),
}

impl SchemaDocument {
    /// Build from an already parsed document.
    ///
    /// # Errors
    ///
    /// Returns error if the value is not an OpenAPI (3.x) or Swagger (2.0) document.
    pub fn from_value(root: Value) -> Result<Self, ValidatorError> {
        if !root.is_object() {
            return Err(ValidatorError::Parse("document is not an object".into()));
        }
        if root.get("openapi").is_none() && root.get("swagger").is_none() {
            return Err(ValidatorError::Parse(
                "missing `openapi` or `swagger` version field".into(),
            ));
        }
        let operations = extract_operations(&root);
        let base_paths = base_paths(&root);
        Ok(Self {
            root,
            operations,
            base_paths,
        })
    }

    /// Parse document text; format from extension, else sniffed.
    ///
    /// # Errors
    ///
    /// Returns error if the text is not valid JSON/YAML or not an OpenAPI document.
    pub fn parse(path: &Path, content: &str) -> Result<Self, ValidatorError> {
        Self::from_value(parse_spec(path, content)?)
    }

    /// Read and parse a document file.
    ///
    /// # Errors
    ///
    /// Returns [`ValidatorError::SchemaNotFound`] if the file does not exist,
    /// otherwise IO or parse errors.
    pub fn load(path: &Path) -> Result<Self, ValidatorError> {
        Self::parse(path, &read_document(path)?)
    }

    #[must_use]
    pub fn root(&self) -> &Value {
        &self.root
    }

    #[must_use]
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// `openapi` / `swagger` version string.
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.root
            .get("openapi")
            .or_else(|| self.root.get("swagger"))
            .and_then(Value::as_str)
    }

    /// Operation at exactly `template`, compared with `method` case-insensitively.
    #[must_use]
    pub fn find_operation(&self, template: &str, method: &str) -> Option<&Operation> {
        self.candidate_paths(template).find_map(|path| {
            self.operations
                .iter()
                .find(|op| op.path == path && op.method.eq_ignore_ascii_case(method))
        })
    }

    /// Operation whose template matches a concrete request path.
    ///
    /// The most literal template wins (`/users/me` over `/users/{id}`).
    pub(crate) fn match_request(
        &self,
        path: &str,
        method: &str,
    ) -> Result<RequestMatch<'_>, LookupMiss> {
        let mut path_matched = false;
        let mut best: Option<RequestMatch<'_>> = None;

        for candidate in self.candidate_paths(path) {
            for op in &self.operations {
                let Some(path_params) = match_path(&op.path, candidate) else {
                    continue;
                };
                path_matched = true;
                if !op.method.eq_ignore_ascii_case(method) {
                    continue;
                }
                let literal = literal_segments(&op.path);
                let better = best
                    .as_ref()
                    .is_none_or(|b| literal > literal_segments(&b.operation.path));
                if better {
                    best = Some(RequestMatch {
                        operation: op,
                        path_params,
                    });
                }
            }
        }

        match best {
            Some(m) => Ok(m),
            None if path_matched => Err(LookupMiss::NoMethod(method.to_ascii_lowercase())),
            None => Err(LookupMiss::NoPath),
        }
    }

    /// The path itself plus the path with each declared base path stripped.
    fn candidate_paths<'p>(&'p self, path: &'p str) -> impl Iterator<Item = &'p str> + 'p {
        std::iter::once(path).chain(self.base_paths.iter().filter_map(move |base| {
            path.strip_prefix(base.as_str())
                .filter(|rest| rest.starts_with('/'))
        }))
    }
}

/// Read a document, distinguishing a missing file from other IO failures.
pub(crate) fn read_document(path: &Path) -> Result<String, ValidatorError> {
    if !path.is_file() {
        return Err(ValidatorError::SchemaNotFound(path.to_path_buf()));
    }
    std::fs::read_to_string(path)
        .map_err(|e| ValidatorError::Io(format!("{}: {e}", path.display())))
}

/// Parse an OpenAPI spec from JSON or YAML.
///
/// Detection strategy: try extension first (`.yaml`/`.yml`), then fall back to
/// content sniffing (leading `{` → JSON, otherwise YAML).
pub(crate) fn parse_spec(path: &Path, content: &str) -> Result<Value, ValidatorError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "yaml" | "yml" => parse_yaml(content),
        "json" => parse_json(content),
        _ => {
            if content.trim_start().starts_with('{') {
                parse_json(content)
            } else {
                parse_yaml(content)
            }
        }
    }
}

pub(crate) fn parse_yaml(content: &str) -> Result<Value, ValidatorError> {
    serde_yml::from_str(content).map_err(|e| ValidatorError::Parse(format!("Invalid YAML: {e}")))
}

pub(crate) fn parse_json(content: &str) -> Result<Value, ValidatorError> {
    serde_json::from_str(content).map_err(|e| ValidatorError::Parse(format!("Invalid JSON: {e}")))
}

/// Path prefixes requests may carry in front of the declared paths.
///
/// OpenAPI 3: path component of each `servers[].url`; Swagger 2: `basePath`.
fn base_paths(root: &Value) -> Vec<String> {
    let mut bases: Vec<String> = root
        .get("servers")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|s| s.get("url").and_then(Value::as_str))
        .map(server_path)
        .collect();
    if let Some(base) = root.get("basePath").and_then(Value::as_str) {
        bases.push(base.to_string());
    }
    bases.retain(|b| !b.is_empty() && b != "/");
    for b in &mut bases {
        while b.ends_with('/') {
            b.pop();
        }
    }
    bases.sort();
    bases.dedup();
    bases
}

/// `"https://api.example.com/v1"` → `"/v1"`, `"/v1"` → `"/v1"`
fn server_path(url: &str) -> String {
    match url.split_once("://") {
        Some((_, rest)) => rest.find('/').map(|i| rest[i..].to_string()).unwrap_or_default(),
        None => url.to_string(),
    }
}
