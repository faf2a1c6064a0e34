//! Load-time audit of schema documents.
//!
//! Every document reachable from the root through `$ref` is loaded and
//! checked before any instance is evaluated. A keyword outside the draft-07
//! vocabulary, a malformed keyword value, an invalid regular expression or
//! a dangling reference makes the schema unusable, so a contract never
//! loses an assertion without notice.

use std::collections::HashSet;

use camino::Utf8PathBuf;
use serde_json::Value;

use super::store::{SchemaStore, Scope};

const TYPE_NAMES: [&str; 7] = ["null", "boolean", "object", "array", "string", "number", "integer"];

/// Expected value of a keyword.
#[derive(Debug, Clone, Copy)]
enum Shape {
    /// Annotations and `const`: any value.
    Any,
    Reference,
    Schema,
    SchemaMap,
    PatternMap,
    SchemaList,
    SchemaOrList,
    Dependencies,
    Types,
    Values,
    Number,
    PositiveNumber,
    Count,
    Flag,
    Names,
    Pattern,
}

fn shape(keyword: &str) -> Option<Shape> {
    let found = match keyword {
        "$schema" | "$id" | "$comment" | "title" | "description" | "default" | "examples"
        | "readOnly" | "writeOnly" | "format" | "contentMediaType" | "contentEncoding"
        | "const" => Shape::Any,
        "$ref" => Shape::Reference,
        "not" | "if" | "then" | "else" | "additionalProperties" | "additionalItems"
        | "contains" | "propertyNames" => Shape::Schema,
        "definitions" | "properties" => Shape::SchemaMap,
        "patternProperties" => Shape::PatternMap,
        "allOf" | "anyOf" | "oneOf" => Shape::SchemaList,
        "items" => Shape::SchemaOrList,
        "dependencies" => Shape::Dependencies,
        "type" => Shape::Types,
        "enum" => Shape::Values,
        "minimum" | "maximum" | "exclusiveMinimum" | "exclusiveMaximum" => Shape::Number,
        "multipleOf" => Shape::PositiveNumber,
        "minLength" | "maxLength" | "minItems" | "maxItems" | "minProperties"
        | "maxProperties" => Shape::Count,
        "uniqueItems" => Shape::Flag,
        "required" => Shape::Names,
        "pattern" => Shape::Pattern,
        _ => return None,
    };
    Some(found)
}

/// Audits `root` and every document it references, loading them into
/// `store`.
///
/// Returns the first defect as `file#/json/pointer: message`.
pub(super) fn audit(store: &mut SchemaStore, root: &Scope) -> Result<(), String> {
    let mut pending = vec![root.clone()];
    let mut audited: HashSet<Utf8PathBuf> = HashSet::new();
    while let Some(scope) = pending.pop() {
        if !audited.insert(scope.file().to_path_buf()) {
            continue;
        }
        let mut auditor = Auditor {
            store: &mut *store,
            scope: &scope,
            pending: &mut pending,
        };
        auditor.schema(scope.document(), "")?;
    }
    Ok(())
}

struct Auditor<'a> {
    store: &'a mut SchemaStore,
    scope: &'a Scope,
    pending: &'a mut Vec<Scope>,
}

impl Auditor<'_> {
    fn defect(&self, pointer: &str, message: impl std::fmt::Display) -> String {
        format!("{}#{pointer}: {message}", self.scope.file())
    }

    fn schema(&mut self, schema: &Value, pointer: &str) -> Result<(), String> {
        let keywords = match schema {
            Value::Bool(_) => return Ok(()),
            Value::Object(keywords) => keywords,
            _ => return Err(self.defect(pointer, "a schema must be an object or a boolean")),
        };
        for (keyword, value) in keywords {
            let at = child(pointer, keyword);
            let Some(expected) = shape(keyword) else {
                return Err(self.defect(&at, format!("keyword '{keyword}' is not supported")));
            };
            self.keyword(expected, value, &at)?;
        }
        Ok(())
    }

    fn keyword(&mut self, expected: Shape, value: &Value, at: &str) -> Result<(), String> {
        match expected {
            Shape::Any => Ok(()),
            Shape::Reference => self.reference(value, at),
            Shape::Schema => self.schema(value, at),
            Shape::SchemaMap => self.schema_map(value, at, false),
            Shape::PatternMap => self.schema_map(value, at, true),
            Shape::SchemaList => self.schema_list(value, at),
            Shape::SchemaOrList if value.is_array() => self.schema_list(value, at),
            Shape::SchemaOrList => self.schema(value, at),
            Shape::Dependencies => self.dependencies(value, at),
            Shape::Types => self.types(value, at),
            Shape::Values => self.require(value.is_array(), at, "must be an array"),
            Shape::Number => self.require(value.is_number(), at, "must be a number"),
            Shape::PositiveNumber => self.require(
                value.as_f64().is_some_and(|number| number > 0.0),
                at,
                "must be a number greater than zero",
            ),
            Shape::Count => self.require(value.is_u64(), at, "must be a non-negative integer"),
            Shape::Flag => self.require(value.is_boolean(), at, "must be a boolean"),
            Shape::Names => self.require(is_name_list(value), at, "must be an array of strings"),
            Shape::Pattern => match value {
                Value::String(pattern) => self.pattern(pattern, at),
                _ => Err(self.defect(at, "must be a string")),
            },
        }
    }

    fn require(&self, holds: bool, at: &str, message: &str) -> Result<(), String> {
        if holds {
            Ok(())
        } else {
            Err(self.defect(at, message))
        }
    }

    fn reference(&mut self, value: &Value, at: &str) -> Result<(), String> {
        let Value::String(reference) = value else {
            return Err(self.defect(at, "must be a string"));
        };
        let resolved = self.store.resolve(self.scope, reference);
        let (target, pointer) = resolved.map_err(|message| {
            self.defect(at, format!("cannot resolve '{reference}': {message}"))
        })?;
        if target.document().pointer(&pointer).is_none() {
            return Err(self.defect(at, format!("reference '{reference}' points to nothing")));
        }
        if target.file() != self.scope.file() {
            self.pending.push(target);
        }
        Ok(())
    }

    fn pattern(&mut self, pattern: &str, at: &str) -> Result<(), String> {
        let compiled = self.store.compile(pattern).map(|_| ());
        compiled.map_err(|error| {
            self.defect(at, format!("invalid regex pattern {pattern}: {error}"))
        })
    }

    fn schema_map(&mut self, value: &Value, at: &str, patterns: bool) -> Result<(), String> {
        let Value::Object(members) = value else {
            return Err(self.defect(at, "must be an object"));
        };
        for (name, member) in members {
            let member_at = child(at, name);
            if patterns {
                self.pattern(name, &member_at)?;
            }
            self.schema(member, &member_at)?;
        }
        Ok(())
    }

    fn schema_list(&mut self, value: &Value, at: &str) -> Result<(), String> {
        let branches = match value {
            Value::Array(branches) if !branches.is_empty() => branches,
            _ => return Err(self.defect(at, "must be a non-empty array")),
        };
        for (index, branch) in branches.iter().enumerate() {
            self.schema(branch, &child(at, &index.to_string()))?;
        }
        Ok(())
    }

    fn dependencies(&mut self, value: &Value, at: &str) -> Result<(), String> {
        let Value::Object(members) = value else {
            return Err(self.defect(at, "must be an object"));
        };
        for (name, dependency) in members {
            let member_at = child(at, name);
            if dependency.is_array() {
                self.require(is_name_list(dependency), &member_at, "must be an array of strings")?;
            } else {
                self.schema(dependency, &member_at)?;
            }
        }
        Ok(())
    }

    fn types(&self, value: &Value, at: &str) -> Result<(), String> {
        let names: Vec<&Value> = match value {
            Value::String(_) => vec![value],
            Value::Array(names) => names.iter().collect(),
            _ => return Err(self.defect(at, "must be a type name or an array of type names")),
        };
        for name in names {
            let known = name.as_str().is_some_and(|text| TYPE_NAMES.contains(&text));
            if !known {
                return Err(self.defect(at, format!("unknown type {name}")));
            }
        }
        Ok(())
    }
}

fn is_name_list(value: &Value) -> bool {
    value
        .as_array()
        .is_some_and(|names| names.iter().all(Value::is_string))
}

/// Extends a JSON pointer by one escaped segment.
fn child(pointer: &str, segment: &str) -> String {
    format!("{pointer}/{}", segment.replace('~', "~0").replace('/', "~1"))
}
