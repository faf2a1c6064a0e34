//! Loading and caching of schema documents addressed by `$ref`, and of the
//! regular expressions they declare.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use regex::Regex;
use serde_json::Value;

/// A loaded schema document together with the file it came from.
#[derive(Debug, Clone)]
pub(super) struct Scope {
    file: Utf8PathBuf,
    document: Arc<Value>,
}

impl Scope {
    pub(super) fn document(&self) -> &Value {
        &self.document
    }

    pub(super) fn file(&self) -> &Utf8Path {
        &self.file
    }

    fn directory(&self) -> &Utf8Path {
        self.file.parent().unwrap_or_else(|| Utf8Path::new(""))
    }
}

/// Schema documents loaded during one validation pass, keyed by path.
#[derive(Debug, Default)]
pub(super) struct SchemaStore {
    documents: HashMap<Utf8PathBuf, Arc<Value>>,
    patterns: HashMap<String, Regex>,
}

impl SchemaStore {
    /// Loads the schema at `path`, reusing an earlier load of the same file.
    pub(super) fn load(&mut self, path: &Utf8Path) -> Result<Scope, String> {
        let file = normalise(path);
        if let Some(document) = self.documents.get(&file) {
            return Ok(Scope {
                file,
                document: Arc::clone(document),
            });
        }
        let text = std::fs::read_to_string(&file).map_err(|error| format!("{file}: {error}"))?;
        let document: Value =
            serde_json::from_str(&text).map_err(|error| format!("{file}: {error}"))?;
        let document = Arc::new(document);
        self.documents.insert(file.clone(), Arc::clone(&document));
        Ok(Scope { file, document })
    }

    /// Resolves `reference` relative to `from`.
    ///
    /// Returns the scope holding the target and the JSON pointer inside it.
    /// A reference without a file part points into `from` itself.
    pub(super) fn resolve(
        &mut self,
        from: &Scope,
        reference: &str,
    ) -> Result<(Scope, String), String> {
        let (file_part, fragment) = reference.split_once('#').unwrap_or((reference, ""));
        let scope = if file_part.is_empty() {
            from.clone()
        } else {
            let target = Utf8Path::new(file_part);
            if target.is_absolute() {
                self.load(target)?
            } else {
                let joined = from.directory().join(target);
                self.load(&joined)?
            }
        };
        Ok((scope, fragment.to_owned()))
    }

    /// Compiles `pattern` once and caches it for later matches.
    pub(super) fn compile(&mut self, pattern: &str) -> Result<&Regex, regex::Error> {
        match self.patterns.entry(pattern.to_owned()) {
            Entry::Occupied(cached) => Ok(cached.into_mut()),
            Entry::Vacant(slot) => Ok(slot.insert(Regex::new(pattern)?)),
        }
    }

    /// Returns `true` when `pattern` matches anywhere in `text`.
    pub(super) fn matches(&mut self, pattern: &str, text: &str) -> Result<bool, regex::Error> {
        Ok(self.compile(pattern)?.is_match(text))
    }
}

/// Lexically normalises `path`, folding `.` and `..` components.
pub(super) fn normalise(path: &Utf8Path) -> Utf8PathBuf {
    let mut out = Utf8PathBuf::new();
    for component in path.components() {
        match component {
            Utf8Component::CurDir => {}
            Utf8Component::ParentDir => match out.components().next_back() {
                Some(Utf8Component::Normal(_)) => {
                    out.pop();
                }
                Some(Utf8Component::RootDir | Utf8Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::parent("/etc/telconf/config/../schema/schema.json", "/etc/telconf/schema/schema.json")]
    #[case::current("/etc/./schema.json", "/etc/schema.json")]
    #[case::leading_parent("../schema/schema.json", "../schema/schema.json")]
    #[case::stacked_parents("../../schema.json", "../../schema.json")]
    fn normalise_folds_dot_components(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalise(Utf8Path::new(input)), Utf8PathBuf::from(expected));
    }
}
