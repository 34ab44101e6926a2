//! Schema-less scraped records.
//!
//! A [`Record`] is an ordered map from field name to [`FieldValue`]. Records
//! of the same kind may carry different field sets; nothing is enforced
//! beyond "keys are unique".

use std::fmt;
use std::str::FromStr;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
    Absent,
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            FieldValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, FieldValue::Absent)
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(value: Vec<String>) -> Self {
        FieldValue::List(value)
    }
}

impl From<Option<String>> for FieldValue {
    fn from(value: Option<String>) -> Self {
        value.map(FieldValue::Text).unwrap_or(FieldValue::Absent)
    }
}

/// Ordered field map. Insertion order is kept; re-inserting a key replaces
/// the value at its original position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, FieldValue)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(FieldValue::as_text)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn remove(&mut self, key: &str) -> Option<FieldValue> {
        let idx = self.fields.iter().position(|(k, _)| k == key)?;
        Some(self.fields.remove(idx).1)
    }

    /// Merges `other` into `self`; same-named keys take the value from `other`.
    pub fn merge(&mut self, other: Record) {
        for (key, value) in other.fields {
            self.insert(key, value);
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

struct RecordVisitor;

impl<'de> Visitor<'de> for RecordVisitor {
    type Value = Record;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of field names to strings, string lists or null")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Record, A::Error> {
        let mut record = Record::new();
        while let Some((key, value)) = access.next_entry::<String, FieldValue>()? {
            record.insert(key, value);
        }
        Ok(record)
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(RecordVisitor)
    }
}

/// The three record kinds the site exposes. Each kind maps to one collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    News,
    Courses,
    Trainers,
}

impl RecordKind {
    pub const ALL: [RecordKind; 3] = [RecordKind::News, RecordKind::Courses, RecordKind::Trainers];

    pub fn collection(&self) -> &'static str {
        match self {
            RecordKind::News => "news",
            RecordKind::Courses => "courses",
            RecordKind::Trainers => "trainers",
        }
    }

    /// Key used for this kind's count in API responses.
    pub fn count_key(&self) -> &'static str {
        match self {
            RecordKind::News => "news_count",
            RecordKind::Courses => "courses_count",
            RecordKind::Trainers => "trainers_count",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.collection())
    }
}

impl FromStr for RecordKind {
    type Err = Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "news" => Ok(RecordKind::News),
            "courses" | "course" => Ok(RecordKind::Courses),
            "trainers" | "trainer" => Ok(RecordKind::Trainers),
            other => Err(Error::Config(format!("Unknown record kind: {}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_overwrites_in_place() {
        let mut record = Record::new();
        record.insert("Title", "card title");
        record.insert("Description", "short");
        record.insert("Title", "detail title");

        let keys: Vec<_> = record.keys().collect();
        assert_eq!(keys, vec!["Title", "Description"]);
        assert_eq!(record.get_text("Title"), Some("detail title"));
    }

    #[test]
    fn test_merge_overwrites_and_appends() {
        let mut summary: Record = [("Description", "card"), ("Course URL", "https://x/c/1")]
            .into_iter()
            .collect();
        let mut detail = Record::new();
        detail.insert("Description", "full description");
        detail.insert("Price", "$100");

        summary.merge(detail);
        assert_eq!(summary.len(), 3);
        assert_eq!(summary.get_text("Description"), Some("full description"));
        assert_eq!(summary.keys().last(), Some("Price"));
    }

    #[test]
    fn test_serialization_keeps_order_and_shapes() {
        let mut record = Record::new();
        record.insert("name", FieldValue::Absent);
        record.insert("experience", vec!["a".to_string(), "b".to_string()]);
        record.insert("education", "MA");

        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"name":null,"experience":["a","b"],"education":"MA"}"#);

        let back: Record = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!("news".parse::<RecordKind>().unwrap(), RecordKind::News);
        assert_eq!("Trainer".parse::<RecordKind>().unwrap(), RecordKind::Trainers);
        assert!("videos".parse::<RecordKind>().is_err());
        assert_eq!(RecordKind::Courses.to_string(), "courses");
    }
}
