//! Keyword evaluation for one validation pass.
//!
//! Covers the draft-07 assertion vocabulary. Schemas are audited before a
//! pass starts, so every keyword met here is one the pass evaluates.

use std::cmp::Ordering;

use serde_json::{Map, Number, Value};

use super::store::{SchemaStore, Scope};
use crate::error::Violation;

/// Upper bound on nested `$ref` hops, guarding against reference cycles.
const MAX_REF_DEPTH: usize = 64;

const UNDECLARED_PROPERTY: &str =
    "is not defined in the schema and the schema does not allow additional properties";

/// Accumulates violations while walking an instance against a schema.
pub(super) struct Pass {
    store: SchemaStore,
    violations: Vec<Violation>,
}

impl Pass {
    pub(super) const fn new(store: SchemaStore) -> Self {
        Self {
            store,
            violations: Vec::new(),
        }
    }

    /// Evaluates `instance` against the root document of `root`.
    pub(super) fn run(mut self, root: &Scope, instance: &Value) -> Vec<Violation> {
        self.check(root, root.document(), instance, "$", 0);
        self.violations
    }

    fn report(&mut self, path: &str, message: impl Into<String>) {
        self.violations.push(Violation::new(path, message));
    }

    fn check(&mut self, scope: &Scope, schema: &Value, instance: &Value, path: &str, depth: usize) {
        let keywords = match schema {
            Value::Bool(true) => return,
            Value::Bool(false) => {
                self.report(path, "no value is allowed here");
                return;
            }
            Value::Object(keywords) => keywords,
            _ => return,
        };

        if let Some(Value::String(reference)) = keywords.get("$ref") {
            // Siblings of `$ref` are ignored in draft-07.
            self.check_ref(scope, reference, instance, path, depth);
            return;
        }
        if let Some(expected) = keywords.get("type") {
            if !self.check_type(expected, instance, path) {
                // Remaining keywords would only restate the type mismatch.
                return;
            }
        }
        if let Some(Value::Array(options)) = keywords.get("enum") {
            if !options.contains(instance) {
                let listed: Vec<String> = options.iter().map(Value::to_string).collect();
                self.report(
                    path,
                    format!("does not have a value in the enumeration [{}]", listed.join(", ")),
                );
            }
        }
        if let Some(expected) = keywords.get("const") {
            if expected != instance {
                self.report(path, format!("must be the constant value {expected}"));
            }
        }
        self.check_combinators(scope, keywords, instance, path, depth);

        match instance {
            Value::Object(members) => {
                self.check_object(scope, keywords, instance, members, path, depth);
            }
            Value::Array(items) => self.check_array(scope, keywords, items, path, depth),
            Value::String(text) => self.check_string(keywords, text, path),
            Value::Number(number) => self.check_number(keywords, number, path),
            Value::Null | Value::Bool(_) => {}
        }
    }

    /// Returns `true` when `instance` satisfies `schema`, recording nothing.
    fn passes(
        &mut self,
        scope: &Scope,
        schema: &Value,
        instance: &Value,
        path: &str,
        depth: usize,
    ) -> bool {
        let recorded = self.violations.len();
        self.check(scope, schema, instance, path, depth);
        let passed = self.violations.len() == recorded;
        self.violations.truncate(recorded);
        passed
    }

    fn check_ref(
        &mut self,
        scope: &Scope,
        reference: &str,
        instance: &Value,
        path: &str,
        depth: usize,
    ) {
        if depth >= MAX_REF_DEPTH {
            self.report(path, format!("reference '{reference}' nests too deeply"));
            return;
        }
        let (target, pointer) = match self.store.resolve(scope, reference) {
            Ok(resolved) => resolved,
            Err(message) => {
                self.report(path, format!("cannot resolve reference '{reference}': {message}"));
                return;
            }
        };
        match target.document().pointer(&pointer) {
            Some(node) => self.check(&target, node, instance, path, depth + 1),
            None => self.report(path, format!("reference '{reference}' points to nothing")),
        }
    }

    /// Returns `false` when the instance has the wrong type.
    fn check_type(&mut self, expected: &Value, instance: &Value, path: &str) -> bool {
        let allowed: Vec<&str> = match expected {
            Value::String(name) => vec![name.as_str()],
            Value::Array(names) => names.iter().filter_map(Value::as_str).collect(),
            _ => return true,
        };
        if allowed.iter().any(|name| type_matches(name, instance)) {
            return true;
        }
        self.report(
            path,
            format!("{} found, {} expected", type_name(instance), allowed.join(" or ")),
        );
        false
    }

    fn check_combinators(
        &mut self,
        scope: &Scope,
        keywords: &Map<String, Value>,
        instance: &Value,
        path: &str,
        depth: usize,
    ) {
        if let Some(Value::Array(branches)) = keywords.get("allOf") {
            for branch in branches {
                self.check(scope, branch, instance, path, depth);
            }
        }
        if let Some(Value::Array(branches)) = keywords.get("anyOf") {
            let matched = branches
                .iter()
                .any(|branch| self.passes(scope, branch, instance, path, depth));
            if !matched {
                self.report(path, "does not match any of the allowed alternatives");
            }
        }
        if let Some(Value::Array(branches)) = keywords.get("oneOf") {
            let matched = branches
                .iter()
                .filter(|branch| self.passes(scope, branch, instance, path, depth))
                .count();
            if matched != 1 {
                self.report(
                    path,
                    format!("must be valid to one and only one schema, but {matched} are valid"),
                );
            }
        }
        if let Some(excluded) = keywords.get("not") {
            if self.passes(scope, excluded, instance, path, depth) {
                self.report(path, "must not be valid to the excluded schema");
            }
        }
        if let Some(condition) = keywords.get("if") {
            let branch = if self.passes(scope, condition, instance, path, depth) {
                keywords.get("then")
            } else {
                keywords.get("else")
            };
            if let Some(branch) = branch {
                self.check(scope, branch, instance, path, depth);
            }
        }
    }

    fn check_object(
        &mut self,
        scope: &Scope,
        keywords: &Map<String, Value>,
        instance: &Value,
        members: &Map<String, Value>,
        path: &str,
        depth: usize,
    ) {
        if let Some(Value::Array(required)) = keywords.get("required") {
            for name in required.iter().filter_map(Value::as_str) {
                if !members.contains_key(name) {
                    self.report(&member_path(path, name), "is missing but it is required");
                }
            }
        }
        if let Some(limit) = count(keywords, "minProperties") {
            if members.len() < limit {
                self.report(path, format!("must have at least {limit} properties"));
            }
        }
        if let Some(limit) = count(keywords, "maxProperties") {
            if members.len() > limit {
                self.report(path, format!("must have at most {limit} properties"));
            }
        }

        let properties = keywords.get("properties").and_then(Value::as_object);
        let patterns = keywords.get("patternProperties").and_then(Value::as_object);
        let additional = keywords.get("additionalProperties");
        for (name, value) in members {
            let child = member_path(path, name);
            let mut declared = false;
            if let Some(property) = properties.and_then(|known| known.get(name)) {
                declared = true;
                self.check(scope, property, value, &child, depth);
            }
            for (pattern, property) in patterns.into_iter().flatten() {
                if self.matches(pattern, name, &child) {
                    declared = true;
                    self.check(scope, property, value, &child, depth);
                }
            }
            if declared {
                continue;
            }
            match additional {
                Some(Value::Bool(false)) => self.report(&child, UNDECLARED_PROPERTY),
                Some(extra) => self.check(scope, extra, value, &child, depth),
                None => {}
            }
        }

        if let Some(names) = keywords.get("propertyNames") {
            for name in members.keys() {
                let key = Value::String(name.clone());
                let child = member_path(path, name);
                if !self.passes(scope, names, &key, &child, depth) {
                    self.report(&child, format!("property name '{name}' is not allowed"));
                }
            }
        }
        if let Some(Value::Object(dependencies)) = keywords.get("dependencies") {
            for (trigger, dependency) in dependencies {
                if members.contains_key(trigger) {
                    self.check_dependency(scope, trigger, dependency, instance, path, depth);
                }
            }
        }
    }

    fn check_dependency(
        &mut self,
        scope: &Scope,
        trigger: &str,
        dependency: &Value,
        instance: &Value,
        path: &str,
        depth: usize,
    ) {
        let Value::Array(names) = dependency else {
            self.check(scope, dependency, instance, path, depth);
            return;
        };
        for name in names.iter().filter_map(Value::as_str) {
            if instance.get(name).is_none() {
                self.report(
                    path,
                    format!("must have property '{name}' when property '{trigger}' is present"),
                );
            }
        }
    }

    fn check_array(
        &mut self,
        scope: &Scope,
        keywords: &Map<String, Value>,
        items: &[Value],
        path: &str,
        depth: usize,
    ) {
        if let Some(minimum) = count(keywords, "minItems") {
            if items.len() < minimum {
                let found = items.len();
                self.report(path, format!("expected at least {minimum} items but found {found}"));
            }
        }
        if let Some(maximum) = count(keywords, "maxItems") {
            if items.len() > maximum {
                let found = items.len();
                self.report(path, format!("must have at most {maximum} items but found {found}"));
            }
        }
        if keywords.get("uniqueItems") == Some(&Value::Bool(true)) && has_duplicates(items) {
            self.report(path, "must have only unique items in the array");
        }

        match keywords.get("items") {
            Some(Value::Array(positional)) => {
                let additional = keywords.get("additionalItems");
                for (index, item) in items.iter().enumerate() {
                    let schema = positional.get(index).or(additional);
                    if let Some(schema) = schema {
                        self.check(scope, schema, item, &format!("{path}[{index}]"), depth);
                    }
                }
            }
            Some(schema) => {
                for (index, item) in items.iter().enumerate() {
                    self.check(scope, schema, item, &format!("{path}[{index}]"), depth);
                }
            }
            None => {}
        }

        if let Some(wanted) = keywords.get("contains") {
            let found = items.iter().enumerate().any(|(index, item)| {
                self.passes(scope, wanted, item, &format!("{path}[{index}]"), depth)
            });
            if !found {
                self.report(path, "does not contain an item matching the required schema");
            }
        }
    }

    fn check_string(&mut self, keywords: &Map<String, Value>, text: &str, path: &str) {
        let length = text.chars().count();
        if let Some(limit) = count(keywords, "minLength") {
            if length < limit {
                self.report(path, format!("must be at least {limit} characters long"));
            }
        }
        if let Some(limit) = count(keywords, "maxLength") {
            if length > limit {
                self.report(path, format!("must be at most {limit} characters long"));
            }
        }
        if let Some(Value::String(pattern)) = keywords.get("pattern") {
            if !self.matches(pattern, text, path) {
                self.report(path, format!("does not match the regex pattern {pattern}"));
            }
        }
    }

    fn check_number(&mut self, keywords: &Map<String, Value>, number: &Number, path: &str) {
        if let Some((limit, Ordering::Less)) = bound(keywords, "minimum", number) {
            self.report(path, format!("must have a minimum value of {limit}"));
        }
        if let Some((limit, Ordering::Greater)) = bound(keywords, "maximum", number) {
            self.report(path, format!("must have a maximum value of {limit}"));
        }
        if let Some((limit, Ordering::Less | Ordering::Equal)) =
            bound(keywords, "exclusiveMinimum", number)
        {
            self.report(path, format!("must have an exclusive minimum value of {limit}"));
        }
        if let Some((limit, Ordering::Greater | Ordering::Equal)) =
            bound(keywords, "exclusiveMaximum", number)
        {
            self.report(path, format!("must have an exclusive maximum value of {limit}"));
        }
        if let Some(Value::Number(divisor)) = keywords.get("multipleOf") {
            if !is_multiple(number, divisor) {
                self.report(path, format!("must be multiple of {divisor}"));
            }
        }
    }

    /// Tests `text` against `pattern`; an uncompilable pattern is reported.
    fn matches(&mut self, pattern: &str, text: &str, path: &str) -> bool {
        match self.store.matches(pattern, text) {
            Ok(matched) => matched,
            Err(error) => {
                self.report(path, format!("invalid regex pattern {pattern}: {error}"));
                false
            }
        }
    }
}

fn member_path(parent: &str, name: &str) -> String {
    format!("{parent}.{name}")
}

fn count(keywords: &Map<String, Value>, name: &str) -> Option<usize> {
    let limit = keywords.get(name).and_then(Value::as_u64)?;
    Some(usize::try_from(limit).unwrap_or(usize::MAX))
}

fn has_duplicates(items: &[Value]) -> bool {
    items
        .iter()
        .enumerate()
        .any(|(index, item)| items.iter().skip(index + 1).any(|other| other == item))
}

/// Compares `number` with the limit stored under `name`, if any.
fn bound<'k>(
    keywords: &'k Map<String, Value>,
    name: &str,
    number: &Number,
) -> Option<(&'k Number, Ordering)> {
    match keywords.get(name) {
        Some(Value::Number(limit)) => compare(number, limit).map(|order| (limit, order)),
        _ => None,
    }
}

fn integer(number: &Number) -> Option<i128> {
    number
        .as_i64()
        .map(i128::from)
        .or_else(|| number.as_u64().map(i128::from))
}

fn compare(left: &Number, right: &Number) -> Option<Ordering> {
    match (integer(left), integer(right)) {
        (Some(lhs), Some(rhs)) => Some(lhs.cmp(&rhs)),
        _ => left.as_f64()?.partial_cmp(&right.as_f64()?),
    }
}

fn is_multiple(number: &Number, divisor: &Number) -> bool {
    match (integer(number), integer(divisor)) {
        (Some(value), Some(step)) => value.checked_rem(step) == Some(0),
        _ => match (number.as_f64(), divisor.as_f64()) {
            (Some(value), Some(step)) => float_multiple(value, step),
            _ => false,
        },
    }
}

#[expect(clippy::float_arithmetic, reason = "multipleOf is defined over real numbers")]
fn float_multiple(value: f64, step: f64) -> bool {
    let quotient = value / step;
    (quotient - quotient.round()).abs() <= f64::EPSILON * quotient.abs().max(1.0)
}

fn type_matches(name: &str, instance: &Value) -> bool {
    match name {
        "null" => instance.is_null(),
        "boolean" => instance.is_boolean(),
        "object" => instance.is_object(),
        "array" => instance.is_array(),
        "string" => instance.is_string(),
        "number" => instance.is_number(),
        "integer" => instance.is_i64() || instance.is_u64(),
        _ => false,
    }
}

fn type_name(instance: &Value) -> &'static str {
    match instance {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Object(_) => "object",
        Value::Array(_) => "array",
        Value::String(_) => "string",
        Value::Number(number) if number.is_f64() => "number",
        Value::Number(_) => "integer",
    }
}
