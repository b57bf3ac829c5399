//! Document and field value model.
//!
//! A document is a flat map of named, typed values. The value types are the ones the
//! application needs: text, numbers, timestamps and null. [`FieldValue::ServerTimestamp`]
//! is a write-only sentinel: stores replace it with the instant of the write before
//! persisting, so it never appears in a document that has been read back.

use crate::DocumentId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Named values of a single document.
pub type Fields = BTreeMap<String, FieldValue>;

/// A typed field value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Null,
    Text(String),
    Number(f64),
    Timestamp(DateTime<Utc>),
    /// Resolved to the write time by the store.
    ServerTimestamp,
}

impl FieldValue {
    /// Convenience constructor for optional timestamps.
    pub fn timestamp_or_null(value: Option<DateTime<Utc>>) -> Self {
        value.map_or(FieldValue::Null, FieldValue::Timestamp)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            FieldValue::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    fn type_rank(&self) -> u8 {
        match self {
            FieldValue::Null => 0,
            FieldValue::Number(_) => 1,
            FieldValue::Timestamp(_) | FieldValue::ServerTimestamp => 2,
            FieldValue::Text(_) => 3,
        }
    }

    /// Total order used by ordered listings.
    ///
    /// Values of different types order by type (null, number, timestamp, text). Text
    /// compares by UTF-8 bytes.
    pub fn cmp_for_ordering(&self, other: &FieldValue) -> Ordering {
        match (self, other) {
            (FieldValue::Number(a), FieldValue::Number(b)) => a.total_cmp(b),
            (FieldValue::Timestamp(a), FieldValue::Timestamp(b)) => a.cmp(b),
            (FieldValue::Text(a), FieldValue::Text(b)) => a.as_bytes().cmp(b.as_bytes()),
            _ => self.type_rank().cmp(&other.type_rank()),
        }
    }
}

/// A stored document: its identifier plus its fields.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub id: DocumentId,
    pub fields: Fields,
}

impl Document {
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(FieldValue::as_text)
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(FieldValue::as_number)
    }

    pub fn timestamp(&self, name: &str) -> Option<DateTime<Utc>> {
        self.get(name).and_then(FieldValue::as_timestamp)
    }
}

/// Replaces every [`FieldValue::ServerTimestamp`] with `now`.
pub fn resolve_server_timestamps(mut fields: Fields, now: DateTime<Utc>) -> Fields {
    for value in fields.values_mut() {
        if matches!(value, FieldValue::ServerTimestamp) {
            *value = FieldValue::Timestamp(now);
        }
    }
    fields
}

/// Keeps only documents that carry `field` and sorts them ascending by it.
///
/// Ties are broken by document id so the order is stable across calls.
pub fn order_documents(mut documents: Vec<Document>, field: &str) -> Vec<Document> {
    documents.retain(|doc| doc.fields.contains_key(field));
    documents.sort_by(|a, b| match (a.get(field), b.get(field)) {
        (Some(x), Some(y)) => x.cmp_for_ordering(y).then_with(|| a.id.cmp(&b.id)),
        _ => a.id.cmp(&b.id),
    });
    documents
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn doc(name: Option<FieldValue>) -> Document {
        let mut fields = Fields::new();
        if let Some(value) = name {
            fields.insert("nome".into(), value);
        }
        Document {
            id: DocumentId::new(),
            fields,
        }
    }

    #[test]
    fn text_orders_lexicographically_by_bytes() {
        let docs = vec![
            doc(Some(FieldValue::Text("bruno".into()))),
            doc(Some(FieldValue::Text("Zeca".into()))),
            doc(Some(FieldValue::Text("ana".into()))),
        ];

        let names: Vec<_> = order_documents(docs, "nome")
            .iter()
            .map(|d| d.text("nome").unwrap().to_string())
            .collect();

        assert_eq!(names, vec!["Zeca", "ana", "bruno"]);
    }

    #[test]
    fn documents_missing_the_field_are_excluded() {
        let docs = vec![doc(None), doc(Some(FieldValue::Text("ana".into())))];
        assert_eq!(order_documents(docs, "nome").len(), 1);
    }

    #[test]
    fn mixed_types_order_by_type_rank() {
        let ts = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let docs = vec![
            doc(Some(FieldValue::Text("a".into()))),
            doc(Some(FieldValue::Timestamp(ts))),
            doc(Some(FieldValue::Number(3.0))),
            doc(Some(FieldValue::Null)),
        ];

        let ordered = order_documents(docs, "nome");
        assert_eq!(ordered[0].get("nome"), Some(&FieldValue::Null));
        assert_eq!(ordered[1].number("nome"), Some(3.0));
        assert_eq!(ordered[2].timestamp("nome"), Some(ts));
        assert_eq!(ordered[3].text("nome"), Some("a"));
    }

    #[test]
    fn server_timestamps_are_resolved() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let mut fields = Fields::new();
        fields.insert("created_at".into(), FieldValue::ServerTimestamp);
        fields.insert("nome".into(), FieldValue::Text("ana".into()));

        let resolved = resolve_server_timestamps(fields, now);
        assert_eq!(resolved["created_at"], FieldValue::Timestamp(now));
        assert_eq!(resolved["nome"], FieldValue::Text("ana".into()));
    }

    #[test]
    fn field_values_serialise_with_type_tags() {
        let json = serde_json::to_string(&FieldValue::Number(72.5)).unwrap();
        assert_eq!(json, r#"{"type":"number","value":72.5}"#);
        let null = serde_json::to_string(&FieldValue::Null).unwrap();
        assert_eq!(null, r#"{"type":"null"}"#);
    }
}
