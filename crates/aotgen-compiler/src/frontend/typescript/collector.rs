//! Tree-sitter based metadata collector.

use std::collections::HashMap;

use serde_json::{json, Map, Value};
use tree_sitter::{Node, Parser};

use crate::diagnostic::CompilerError;
use crate::frontend::MetadataCollector;
use crate::metadata::{error_symbol, MetadataBody, ModuleMetadata};

/// Collects exported declarations of TypeScript sources and declaration files.
pub struct TypeScriptCollector {
    parser: Parser,
}

impl TypeScriptCollector {
    pub fn new() -> Result<Self, CompilerError> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into())
            .map_err(|_| CompilerError::ParserInitFailed)?;
        Ok(Self { parser })
    }
}

impl MetadataCollector for TypeScriptCollector {
    fn collect(&mut self, path: &str, source: &str) -> Result<Option<ModuleMetadata>, CompilerError> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| CompilerError::ParseFailed { path: path.to_string() })?;

        let mut visitor = Visitor::new(source);
        visitor.visit_program(tree.root_node());
        Ok(visitor.finish())
    }
}

/// Where an imported binding comes from.
#[derive(Debug, Clone)]
enum ImportBinding {
    Named { module: String, name: String },
    Default { module: String },
    Namespace { module: String },
}

struct Visitor<'a> {
    source: &'a str,
    imports: HashMap<String, ImportBinding>,
    locals: Map<String, Value>,
    /// (local name, exported name)
    exported: Vec<(String, String)>,
    exports: Vec<Value>,
}

impl<'a> Visitor<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            imports: HashMap::new(),
            locals: Map::new(),
            exported: Vec::new(),
            exports: Vec::new(),
        }
    }

    fn finish(self) -> Option<ModuleMetadata> {
        if self.exported.is_empty() && self.exports.is_empty() {
            return None;
        }

        let mut metadata = Map::new();
        for (local, exported_as) in &self.exported {
            let value = match self.locals.get(local) {
                Some(value) => value.clone(),
                None => match self.imports.get(local) {
                    Some(binding) => binding_reference(binding),
                    None => continue,
                },
            };
            metadata.insert(exported_as.clone(), value);
        }

        Some(ModuleMetadata::V3(MetadataBody {
            metadata,
            exports: (!self.exports.is_empty()).then_some(self.exports),
            ..MetadataBody::default()
        }))
    }

    fn node_text(&self, node: Node) -> &'a str {
        node.utf8_text(self.source.as_bytes()).unwrap_or("")
    }

    fn error_at(&self, node: Node, message: &str) -> Value {
        let position = node.start_position();
        error_symbol(message, position.row, position.column)
    }

    fn visit_program(&mut self, node: Node) {
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "import_statement" => self.visit_import(child),
                "export_statement" => self.visit_export(child),
                _ => {
                    self.visit_declaration(child, &[]);
                }
            }
        }
    }

    fn visit_import(&mut self, node: Node) {
        let Some(source) = node.child_by_field_name("source") else {
            return;
        };
        let module = self.extract_string_value(source);

        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if child.kind() != "import_clause" {
                continue;
            }
            let mut clause_cursor = child.walk();
            for binding in child.named_children(&mut clause_cursor) {
                match binding.kind() {
                    "identifier" => {
                        self.imports.insert(
                            self.node_text(binding).to_string(),
                            ImportBinding::Default { module: module.clone() },
                        );
                    }
                    "namespace_import" => {
                        let mut ns_cursor = binding.walk();
                        let local = binding
                            .named_children(&mut ns_cursor)
                            .find(|n| n.kind() == "identifier");
                        if let Some(local) = local {
                            self.imports.insert(
                                self.node_text(local).to_string(),
                                ImportBinding::Namespace { module: module.clone() },
                            );
                        }
                    }
                    "named_imports" => {
                        let mut spec_cursor = binding.walk();
                        for spec in binding.named_children(&mut spec_cursor) {
                            if spec.kind() != "import_specifier" {
                                continue;
                            }
                            let Some(name) = spec.child_by_field_name("name") else {
                                continue;
                            };
                            let name = self.node_text(name).to_string();
                            let local = spec
                                .child_by_field_name("alias")
                                .map(|alias| self.node_text(alias).to_string())
                                .unwrap_or_else(|| name.clone());
                            self.imports.insert(
                                local,
                                ImportBinding::Named { module: module.clone(), name },
                            );
                        }
                    }
                    _ => {}
                }
            }
        }
    }

    fn visit_export(&mut self, node: Node) {
        let decorators = self.decorators_of(node);

        if let Some(declaration) = node.child_by_field_name("declaration") {
            for name in self.visit_declaration(declaration, &decorators) {
                self.exported.push((name.clone(), name));
            }
            return;
        }

        let mut cursor = node.walk();
        let clause = node
            .named_children(&mut cursor)
            .find(|child| child.kind() == "export_clause");
        let specifiers = clause.map(|clause| self.export_specifiers(clause));

        match node.child_by_field_name("source") {
            Some(source) => {
                let module = self.extract_string_value(source);
                let mut entry = Map::new();
                entry.insert("from".to_string(), Value::from(module));
                if let Some(specifiers) = specifiers {
                    let names = specifiers
                        .into_iter()
                        .map(|(name, alias)| {
                            if name == alias {
                                Value::from(name)
                            } else {
                                json!({ "name": name, "as": alias })
                            }
                        })
                        .collect();
                    entry.insert("export".to_string(), Value::Array(names));
                }
                self.exports.push(Value::Object(entry));
            }
            None => {
                if let Some(specifiers) = specifiers {
                    self.exported.extend(specifiers);
                }
            }
        }
    }

    fn export_specifiers(&self, clause: Node) -> Vec<(String, String)> {
        let mut specifiers = Vec::new();
        let mut cursor = clause.walk();
        for spec in clause.named_children(&mut cursor) {
            if spec.kind() != "export_specifier" {
                continue;
            }
            let Some(name) = spec.child_by_field_name("name") else {
                continue;
            };
            let name = self.node_text(name).to_string();
            let alias = spec
                .child_by_field_name("alias")
                .map(|alias| self.node_text(alias).to_string())
                .unwrap_or_else(|| name.clone());
            specifiers.push((name, alias));
        }
        specifiers
    }

    /// Records a top-level declaration and returns the names it binds.
    fn visit_declaration(&mut self, node: Node, outer_decorators: &[Value]) -> Vec<String> {
        match node.kind() {
            "class_declaration" | "abstract_class_declaration" | "class" => {
                let Some(name) = node.child_by_field_name("name") else {
                    return Vec::new();
                };
                let name = self.node_text(name).to_string();

                let mut decorators = outer_decorators.to_vec();
                decorators.extend(self.decorators_of(node));

                let mut class = Map::new();
                class.insert("__symbolic".to_string(), Value::from("class"));
                if !decorators.is_empty() {
                    class.insert("decorators".to_string(), Value::Array(decorators));
                }
                self.locals.insert(name.clone(), Value::Object(class));
                vec![name]
            }
            "function_declaration" | "generator_function_declaration" | "function_signature" => {
                let Some(name) = node.child_by_field_name("name") else {
                    return Vec::new();
                };
                let name = self.node_text(name).to_string();
                self.locals.insert(name.clone(), json!({ "__symbolic": "function" }));
                vec![name]
            }
            "interface_declaration" => {
                let Some(name) = node.child_by_field_name("name") else {
                    return Vec::new();
                };
                let name = self.node_text(name).to_string();
                self.locals.insert(name.clone(), json!({ "__symbolic": "interface" }));
                vec![name]
            }
            "enum_declaration" => self.visit_enum(node),
            "lexical_declaration" | "variable_declaration" => self.visit_variables(node),
            "ambient_declaration" => {
                let mut names = Vec::new();
                let mut cursor = node.walk();
                let children: Vec<_> = node.named_children(&mut cursor).collect();
                for child in children {
                    names.extend(self.visit_declaration(child, outer_decorators));
                }
                names
            }
            _ => Vec::new(),
        }
    }

    fn visit_enum(&mut self, node: Node) -> Vec<String> {
        let Some(name) = node.child_by_field_name("name") else {
            return Vec::new();
        };
        let name = self.node_text(name).to_string();

        let mut members = Map::new();
        // `None` once auto-numbering has run past `i64::MAX`.
        let mut next_value: Option<i64> = Some(0);
        if let Some(body) = node.child_by_field_name("body") {
            let mut cursor = body.walk();
            for member in body.named_children(&mut cursor) {
                let (key, value) = match member.kind() {
                    "property_identifier" | "string" => (member, None),
                    "enum_assignment" => match member.child_by_field_name("name") {
                        Some(key) => (key, member.child_by_field_name("value")),
                        None => continue,
                    },
                    _ => continue,
                };
                let key = self.property_key(key);
                let value = match (value, next_value) {
                    (Some(value), _) => self.expression_value(value),
                    (None, Some(n)) => Value::from(n),
                    (None, None) => self.error_at(member, "Enum member value out of range"),
                };
                if let Some(n) = value.as_i64() {
                    next_value = n.checked_add(1);
                }
                members.insert(key, value);
            }
        }
        self.locals.insert(name.clone(), Value::Object(members));
        vec![name]
    }

    fn visit_variables(&mut self, node: Node) -> Vec<String> {
        let mut names = Vec::new();
        let mut cursor = node.walk();
        let declarators: Vec<_> = node
            .named_children(&mut cursor)
            .filter(|child| child.kind() == "variable_declarator")
            .collect();

        for declarator in declarators {
            let Some(name) = declarator.child_by_field_name("name") else {
                continue;
            };
            if name.kind() != "identifier" {
                continue;
            }
            let name = self.node_text(name).to_string();
            let value = match declarator.child_by_field_name("value") {
                Some(value) => self.expression_value(value),
                None => self.error_at(declarator, "Variable not initialized"),
            };
            self.locals.insert(name.clone(), value);
            names.push(name);
        }
        names
    }

    fn decorators_of(&self, node: Node) -> Vec<Value> {
        let mut cursor = node.walk();
        node.children(&mut cursor)
            .filter(|child| child.kind() == "decorator")
            .filter_map(|decorator| decorator.named_child(0))
            .map(|expression| self.expression_value(expression))
            .collect()
    }

    fn expression_value(&self, node: Node) -> Value {
        match node.kind() {
            "string" => Value::from(self.extract_string_value(node)),
            "template_string" => {
                let mut cursor = node.walk();
                let has_substitution = node
                    .named_children(&mut cursor)
                    .any(|child| child.kind() == "template_substitution");
                if has_substitution {
                    self.error_at(node, "Template substitutions are not supported")
                } else {
                    Value::from(self.extract_string_value(node))
                }
            }
            "number" => parse_number(self.node_text(node))
                .unwrap_or_else(|| self.error_at(node, "Invalid numeric literal")),
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            "null" | "undefined" => Value::Null,
            "array" => {
                let mut cursor = node.walk();
                let items = node
                    .named_children(&mut cursor)
                    .filter(|child| child.kind() != "comment")
                    .map(|child| self.expression_value(child))
                    .collect();
                Value::Array(items)
            }
            "object" => self.object_value(node),
            "identifier" | "member_expression" => self.reference_value(node),
            "call_expression" => {
                let function = node.child_by_field_name("function");
                let arguments = node.child_by_field_name("arguments");
                match function {
                    Some(function) => json!({
                        "__symbolic": "call",
                        "expression": self.reference_value(function),
                        "arguments": arguments.map(|a| self.arguments_value(a)).unwrap_or_default(),
                    }),
                    None => self.error_at(node, "Call without callee"),
                }
            }
            "new_expression" => match node.child_by_field_name("constructor") {
                Some(constructor) => json!({
                    "__symbolic": "new",
                    "expression": self.reference_value(constructor),
                    "arguments": node
                        .child_by_field_name("arguments")
                        .map(|a| self.arguments_value(a))
                        .unwrap_or_default(),
                }),
                None => self.error_at(node, "Constructor call without callee"),
            },
            "parenthesized_expression" | "as_expression" | "satisfies_expression"
            | "non_null_expression" => match node.named_child(0) {
                Some(inner) => self.expression_value(inner),
                None => self.error_at(node, "Empty expression"),
            },
            "unary_expression" => {
                let operator = node.child_by_field_name("operator").map(|op| self.node_text(op));
                let argument = node.child_by_field_name("argument").map(|arg| self.expression_value(arg));
                match (operator, argument) {
                    (Some("-"), Some(Value::Number(n))) => n
                        .as_i64()
                        .map(|i| Value::from(-i))
                        .or_else(|| n.as_f64().map(|f| Value::from(-f)))
                        .unwrap_or(Value::Null),
                    (Some("!"), Some(Value::Bool(b))) => Value::Bool(!b),
                    _ => self.error_at(node, "Expression form not supported"),
                }
            }
            "arrow_function" | "function_expression" | "function" => {
                self.error_at(node, "Lambda not supported")
            }
            _ => self.error_at(node, "Expression form not supported"),
        }
    }

    fn arguments_value(&self, node: Node) -> Vec<Value> {
        let mut cursor = node.walk();
        node.named_children(&mut cursor)
            .filter(|child| child.kind() != "comment")
            .map(|child| self.expression_value(child))
            .collect()
    }

    fn object_value(&self, node: Node) -> Value {
        let mut object = Map::new();
        let mut cursor = node.walk();
        for member in node.named_children(&mut cursor) {
            match member.kind() {
                "pair" => {
                    let (Some(key), Some(value)) =
                        (member.child_by_field_name("key"), member.child_by_field_name("value"))
                    else {
                        continue;
                    };
                    if key.kind() == "computed_property_name" {
                        continue;
                    }
                    object.insert(self.property_key(key), self.expression_value(value));
                }
                "shorthand_property_identifier" => {
                    let name = self.node_text(member).to_string();
                    object.insert(name.clone(), self.reference_to(&name));
                }
                _ => {}
            }
        }
        Value::Object(object)
    }

    fn property_key(&self, node: Node) -> String {
        match node.kind() {
            "string" => self.extract_string_value(node),
            _ => self.node_text(node).to_string(),
        }
    }

    fn reference_value(&self, node: Node) -> Value {
        match node.kind() {
            "identifier" => self.reference_to(self.node_text(node)),
            "member_expression" => {
                let object = node.child_by_field_name("object");
                let property = node
                    .child_by_field_name("property")
                    .map(|p| self.node_text(p).to_string())
                    .unwrap_or_default();
                if let Some(object) = object {
                    if object.kind() == "identifier" {
                        if let Some(ImportBinding::Namespace { module }) =
                            self.imports.get(self.node_text(object))
                        {
                            return json!({
                                "__symbolic": "reference",
                                "module": module,
                                "name": property,
                            });
                        }
                    }
                    return json!({
                        "__symbolic": "select",
                        "expression": self.expression_value(object),
                        "member": property,
                    });
                }
                self.error_at(node, "Member access without object")
            }
            _ => self.expression_value(node),
        }
    }

    fn reference_to(&self, name: &str) -> Value {
        match self.imports.get(name) {
            Some(binding) => binding_reference(binding),
            None => json!({ "__symbolic": "reference", "name": name }),
        }
    }

    fn extract_string_value(&self, node: Node) -> String {
        let text = self.node_text(node);
        let quoted = text.len() >= 2
            && ((text.starts_with('"') && text.ends_with('"'))
                || (text.starts_with('\'') && text.ends_with('\''))
                || (text.starts_with('`') && text.ends_with('`')));
        if quoted {
            unescape(&text[1..text.len() - 1])
        } else {
            text.to_string()
        }
    }
}

fn binding_reference(binding: &ImportBinding) -> Value {
    match binding {
        ImportBinding::Named { module, name } => json!({
            "__symbolic": "reference",
            "module": module,
            "name": name,
        }),
        ImportBinding::Default { module } => json!({
            "__symbolic": "reference",
            "module": module,
            "default": true,
        }),
        ImportBinding::Namespace { module } => json!({
            "__symbolic": "reference",
            "module": module,
        }),
    }
}

fn parse_number(text: &str) -> Option<Value> {
    let cleaned = text.replace('_', "");
    if let Ok(int) = cleaned.parse::<i64>() {
        return Some(Value::from(int));
    }
    if let Some(hex) = cleaned.strip_prefix("0x").or_else(|| cleaned.strip_prefix("0X")) {
        return i64::from_str_radix(hex, 16).ok().map(Value::from);
    }
    cleaned
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
