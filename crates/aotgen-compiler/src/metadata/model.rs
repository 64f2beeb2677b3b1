//! Versioned module metadata documents.
//!
//! A sidecar `*.metadata.json` holds one document or an array of documents.
//! Each document carries a `version`; version 1 and 2 documents lack a
//! reliable `exports` list and are upgraded to version 3 on read.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Version written by the collector.
pub const METADATA_VERSION: u64 = 3;

/// Oldest version that still needs upgrading.
pub const VERSION_1: u64 = 1;

/// The fields shared by every metadata version.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataBody {
    /// Symbol name to descriptor.
    #[serde(default)]
    pub metadata: Map<String, Value>,

    /// Re-export descriptors (`{ "from": "./x", "export": [...] }`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exports: Option<Vec<Value>>,

    /// Module name this file must be imported as.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import_as: Option<String>,

    /// Marks a declaration file that only forwards to a flat module index.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flat_module_index_redirect: Option<bool>,

    /// Symbol name to the file it was originally declared in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origins: Option<Map<String, Value>>,
}

/// One metadata document, tagged by format generation.
#[derive(Debug, Clone, PartialEq)]
pub enum ModuleMetadata {
    V1(MetadataBody),
    V3(MetadataBody),
}

#[derive(Deserialize)]
struct RawDocument {
    #[serde(rename = "__symbolic")]
    symbolic: Option<String>,
    version: Option<u64>,
    #[serde(flatten)]
    body: MetadataBody,
}

impl ModuleMetadata {
    /// Decodes a single document.
    pub fn from_value(value: Value) -> Result<Self, String> {
        let raw: RawDocument = serde_json::from_value(value).map_err(|e| e.to_string())?;
        if let Some(symbolic) = raw.symbolic.as_deref() {
            if symbolic != "module" {
                return Err(format!("expected a module document, found '{}'", symbolic));
            }
        }
        match raw.version {
            Some(1) | Some(2) => Ok(Self::V1(raw.body)),
            Some(v) if v >= METADATA_VERSION => Ok(Self::V3(raw.body)),
            Some(v) => Err(format!("unsupported metadata version {}", v)),
            None => Err("metadata document has no version".to_string()),
        }
    }

    /// Encodes the document in its on-disk shape.
    pub fn to_value(&self) -> Value {
        let mut object = match serde_json::to_value(self.body()) {
            Ok(Value::Object(object)) => object,
            _ => Map::new(),
        };
        object.insert("__symbolic".to_string(), Value::from("module"));
        object.insert("version".to_string(), Value::from(self.version()));
        Value::Object(object)
    }

    pub fn version(&self) -> u64 {
        match self {
            Self::V1(_) => VERSION_1,
            Self::V3(_) => METADATA_VERSION,
        }
    }

    pub fn body(&self) -> &MetadataBody {
        match self {
            Self::V1(body) | Self::V3(body) => body,
        }
    }

    pub fn is_v3(&self) -> bool {
        matches!(self, Self::V3(_))
    }

    /// Non-empty `importAs`, if any.
    pub fn import_as(&self) -> Option<&str> {
        self.body().import_as.as_deref().filter(|s| !s.is_empty())
    }
}

/// Parses the text of a sidecar file into its documents, in file order.
pub fn parse_documents(text: &str) -> Result<Vec<ModuleMetadata>, String> {
    let value: Value = serde_json::from_str(text).map_err(|e| e.to_string())?;
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items.into_iter().map(ModuleMetadata::from_value).collect(),
        object @ Value::Object(_) => Ok(vec![ModuleMetadata::from_value(object)?]),
        other => Err(format!("expected an object or an array, found {}", other)),
    }
}

/// The document that wins when several versions coexist: v3, else the first.
pub fn preferred(documents: &[ModuleMetadata]) -> Option<&ModuleMetadata> {
    documents
        .iter()
        .find(|doc| doc.is_v3())
        .or_else(|| documents.first())
}

/// The `__symbolic` tag of a descriptor.
pub fn symbolic(value: &Value) -> Option<&str> {
    value.get("__symbolic").and_then(Value::as_str)
}

/// Placeholder the collector leaves for expressions it could not evaluate.
pub fn is_error_symbol(value: &Value) -> bool {
    symbolic(value) == Some("error")
}

/// Builds an error placeholder at a source position.
pub fn error_symbol(message: &str, line: usize, character: usize) -> Value {
    serde_json::json!({
        "__symbolic": "error",
        "message": message,
        "line": line,
        "character": character,
    })
}
