//! Node metadata and provenance merging
//!
//! Every node owns a string-keyed [`Metadata`] map. The provenance key
//! [`ORIGINAL_NAMES`] records which source layers a node was derived from and
//! must survive every rewrite.

use std::fmt;

use indexmap::IndexMap;

/// Provenance key
pub const ORIGINAL_NAMES: &str = "originalLayersNames";

/// Metadata value
#[derive(Debug, Clone, PartialEq)]
pub enum MetaValue {
    /// Free-form string
    Str(String),
    /// Integer
    Int(i64),
    /// Ordered name list
    Names(Vec<String>),
}

impl fmt::Display for MetaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetaValue::Str(s) => f.write_str(s),
            MetaValue::Int(v) => write!(f, "{}", v),
            MetaValue::Names(names) => f.write_str(&names.join(",")),
        }
    }
}

impl From<&str> for MetaValue {
    fn from(v: &str) -> Self {
        MetaValue::Str(v.to_string())
    }
}

impl From<i64> for MetaValue {
    fn from(v: i64) -> Self {
        MetaValue::Int(v)
    }
}

impl From<Vec<String>> for MetaValue {
    fn from(v: Vec<String>) -> Self {
        MetaValue::Names(v)
    }
}

/// Metadata map, insertion ordered
pub type Metadata = IndexMap<String, MetaValue>;

/// How metadata is combined when copied onto a node that already has some
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergePolicy {
    /// Overwrite plain keys, concatenate provenance
    #[default]
    Provenance,
    /// Overwrite every key, provenance included
    Overwrite,
    /// Only add keys the target does not have
    KeepExisting,
}

/// Concatenate provenance lists
///
/// The result starts with `label`, followed by the existing list (minus a
/// leading `label` already present), followed by `incoming`. Nothing is
/// dropped or deduplicated.
pub fn merge_provenance(label: &str, existing: &[String], incoming: &[String]) -> Vec<String> {
    let existing = match existing.first() {
        Some(first) if first == label => &existing[1..],
        _ => existing,
    };

    let mut merged = Vec::with_capacity(1 + existing.len() + incoming.len());
    merged.push(label.to_string());
    merged.extend(existing.iter().cloned());
    merged.extend(incoming.iter().cloned());
    merged
}

/// Merge `source` into `target` under `policy`
///
/// `label` is the target node's label; it heads the provenance list. The
/// provenance key is only written when `source` carries it.
pub fn merge_metadata(target: &mut Metadata, source: &Metadata, label: &str, policy: MergePolicy) {
    for (key, value) in source {
        match policy {
            MergePolicy::KeepExisting => {
                if !target.contains_key(key) {
                    target.insert(key.clone(), value.clone());
                }
            }
            MergePolicy::Overwrite => {
                target.insert(key.clone(), value.clone());
            }
            MergePolicy::Provenance if key == ORIGINAL_NAMES => {
                let incoming = names_of(value);
                let existing = target.get(ORIGINAL_NAMES).map(names_of).unwrap_or_default();
                let merged = merge_provenance(label, &existing, &incoming);
                target.insert(key.clone(), MetaValue::Names(merged));
            }
            MergePolicy::Provenance => {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}

pub(crate) fn names_of(value: &MetaValue) -> Vec<String> {
    match value {
        MetaValue::Names(names) => names.clone(),
        MetaValue::Str(s) => s
            .split(',')
            .filter(|part| !part.is_empty())
            .map(str::to_string)
            .collect(),
        MetaValue::Int(v) => vec![v.to_string()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_merge_provenance_prepends_label() {
        let merged = merge_provenance("Concat", &[], &names(&["concat_1"]));
        assert_eq!(merged, names(&["Concat", "concat_1"]));
    }

    #[test]
    fn test_merge_provenance_keeps_existing() {
        let merged = merge_provenance("n", &names(&["n", "a"]), &names(&["b", "c"]));
        assert_eq!(merged, names(&["n", "a", "b", "c"]));
    }

    #[test]
    fn test_merge_without_source_key() {
        let mut target = Metadata::new();
        target.insert("keep".to_string(), MetaValue::from(1i64));
        let mut source = Metadata::new();
        source.insert("other".to_string(), MetaValue::from("x"));

        merge_metadata(&mut target, &source, "n", MergePolicy::Provenance);
        assert!(!target.contains_key(ORIGINAL_NAMES));
        assert_eq!(target.get("other"), Some(&MetaValue::from("x")));
    }

    #[test]
    fn test_keep_existing_policy() {
        let mut target = Metadata::new();
        target.insert("k".to_string(), MetaValue::from("old"));
        let mut source = Metadata::new();
        source.insert("k".to_string(), MetaValue::from("new"));
        source.insert("j".to_string(), MetaValue::from("added"));

        merge_metadata(&mut target, &source, "n", MergePolicy::KeepExisting);
        assert_eq!(target.get("k"), Some(&MetaValue::from("old")));
        assert_eq!(target.get("j"), Some(&MetaValue::from("added")));
    }

    #[test]
    fn test_provenance_from_string_value() {
        let mut target = Metadata::new();
        let mut source = Metadata::new();
        source.insert(ORIGINAL_NAMES.to_string(), MetaValue::from("a,b"));

        merge_metadata(&mut target, &source, "n", MergePolicy::Provenance);
        assert_eq!(target[ORIGINAL_NAMES].to_string(), "n,a,b");
    }
}
