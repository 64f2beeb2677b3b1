//! Declaration discovery.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::diagnostic::CompilerError;
use crate::host::CompilerHost;
use crate::metadata::{is_error_symbol, preferred, symbolic};

/// Framework decorators that make a class a compilation input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DeclarationKind {
    Component,
    Directive,
    NgModule,
    Pipe,
    Injectable,
}

impl DeclarationKind {
    pub fn from_decorator(name: &str) -> Option<Self> {
        match name {
            "Component" => Some(Self::Component),
            "Directive" => Some(Self::Directive),
            "NgModule" => Some(Self::NgModule),
            "Pipe" => Some(Self::Pipe),
            "Injectable" => Some(Self::Injectable),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Component => "component",
            Self::Directive => "directive",
            Self::NgModule => "ngModule",
            Self::Pipe => "pipe",
            Self::Injectable => "injectable",
        }
    }
}

/// A decorated class.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Declaration {
    pub name: String,
    pub kind: DeclarationKind,
    /// First decorator argument, `null` when there is none.
    pub metadata: Value,
}

/// Everything the template compiler needs to know about one file.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzedFile {
    pub file_name: String,
    pub declarations: Vec<Declaration>,
    /// Loaded templates and stylesheets by resolved path.
    pub resources: BTreeMap<String, String>,
}

impl AnalyzedFile {
    fn empty(file_name: &str) -> Self {
        Self {
            file_name: file_name.to_string(),
            declarations: Vec::new(),
            resources: BTreeMap::new(),
        }
    }
}

/// Reads a file's metadata and collects its declarations.
///
/// A file without metadata has no declarations. Component templates and
/// stylesheets are loaded eagerly; a missing one is an error.
pub fn analyze_file(host: &mut CompilerHost, file_name: &str) -> Result<AnalyzedFile, CompilerError> {
    let documents = host.get_metadata_for(file_name)?;
    let Some(metadata) = preferred(&documents) else {
        warn!(file = file_name, "no metadata found, treating file as having no declarations");
        return Ok(AnalyzedFile::empty(file_name));
    };

    let mut analyzed = AnalyzedFile::empty(file_name);
    for (name, symbol) in &metadata.body().metadata {
        if is_error_symbol(symbol) {
            debug!(file = file_name, symbol = %name, "skipping symbol with collection error");
            continue;
        }
        if symbolic(symbol) != Some("class") {
            continue;
        }
        let Some((kind, argument)) = framework_decorator(symbol) else {
            continue;
        };

        if kind == DeclarationKind::Component {
            load_component_resources(host, file_name, &argument, &mut analyzed.resources)?;
        }
        analyzed.declarations.push(Declaration {
            name: name.clone(),
            kind,
            metadata: argument,
        });
    }

    Ok(analyzed)
}

fn framework_decorator(symbol: &Value) -> Option<(DeclarationKind, Value)> {
    symbol.get("decorators")?.as_array()?.iter().find_map(|decorator| {
        let expression = match symbolic(decorator) {
            Some("call") => decorator.get("expression")?,
            _ => decorator,
        };
        let kind = DeclarationKind::from_decorator(expression.get("name")?.as_str()?)?;
        let argument = decorator
            .get("arguments")
            .and_then(|arguments| arguments.get(0))
            .cloned()
            .unwrap_or(Value::Null);
        Some((kind, argument))
    })
}

fn load_component_resources(
    host: &CompilerHost,
    file_name: &str,
    argument: &Value,
    resources: &mut BTreeMap<String, String>,
) -> Result<(), CompilerError> {
    let template = argument.get("templateUrl").and_then(Value::as_str);
    let styles = argument
        .get("styleUrls")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str);

    for url in template.into_iter().chain(styles) {
        let path = host.resource_name_to_file_name(url, file_name);
        if resources.contains_key(&path) {
            continue;
        }
        let text = host.load_resource(&path)?;
        resources.insert(path, text);
    }
    Ok(())
}
