use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use super::upload::PendingUpload;

/// One value in the desired state: either an existing record or a staged upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentEntry {
    Persisted(Uuid),
    Pending(PendingUpload),
}

impl AttachmentEntry {
    pub fn persisted_uuid(&self) -> Option<Uuid> {
        match self {
            AttachmentEntry::Persisted(uuid) => Some(*uuid),
            AttachmentEntry::Pending(_) => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, AttachmentEntry::Pending(_))
    }
}

/// Ordered key → entry mapping declared by the client.
///
/// Iteration order is the display order to persist. Keys of persisted entries
/// are always their uuid; keys of pending entries are whatever the form
/// assigned until the upload is turned into a record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredState {
    entries: Vec<(String, AttachmentEntry)>,
}

impl DesiredState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a state where every entry is an existing record, keyed by its uuid.
    pub fn from_persisted(uuids: impl IntoIterator<Item = Uuid>) -> Self {
        let mut state = Self::new();
        for uuid in uuids {
            state.push_persisted(uuid);
        }
        state
    }

    /// Normalize whatever the form layer hydrated.
    ///
    /// Objects map keys to uuid strings, arrays list uuid strings. Anything
    /// else yields an empty state. Values that are not uuids are dropped, and
    /// entries are re-keyed by their uuid.
    pub fn from_hydrated(value: &JsonValue) -> Self {
        let mut state = Self::new();
        match value {
            JsonValue::Object(map) => {
                for uuid in map
                    .values()
                    .filter_map(|v| v.as_str())
                    .filter_map(|s| Uuid::parse_str(s).ok())
                {
                    state.push_persisted(uuid);
                }
            }
            JsonValue::Array(items) => {
                for uuid in items
                    .iter()
                    .filter_map(|v| v.as_str())
                    .filter_map(|s| Uuid::parse_str(s).ok())
                {
                    state.push_persisted(uuid);
                }
            }
            _ => {}
        }
        state
    }

    pub fn push_persisted(&mut self, uuid: Uuid) {
        self.insert(uuid.to_string(), AttachmentEntry::Persisted(uuid));
    }

    pub fn push_pending(&mut self, key: impl Into<String>, upload: PendingUpload) {
        self.insert(key.into(), AttachmentEntry::Pending(upload));
    }

    /// Insert or replace an entry. Replacing keeps the existing position.
    pub fn insert(&mut self, key: String, entry: AttachmentEntry) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = entry,
            None => self.entries.push((key, entry)),
        }
    }

    /// Turn the pending entry at `key` into the record `uuid`, keeping its
    /// position. Returns false when there is no such pending entry.
    pub fn mark_persisted(&mut self, key: &str, uuid: Uuid) -> bool {
        match self
            .entries
            .iter_mut()
            .find(|(k, e)| k == key && e.is_pending())
        {
            Some(slot) => {
                *slot = (uuid.to_string(), AttachmentEntry::Persisted(uuid));
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<AttachmentEntry> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    pub fn get(&self, key: &str) -> Option<&AttachmentEntry> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, e)| e)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &AttachmentEntry)> {
        self.entries.iter().map(|(k, e)| (k.as_str(), e))
    }

    /// Pending uploads with their keys, in order.
    pub fn pending(&self) -> Vec<(String, PendingUpload)> {
        self.entries
            .iter()
            .filter_map(|(k, e)| match e {
                AttachmentEntry::Pending(upload) => Some((k.clone(), upload.clone())),
                AttachmentEntry::Persisted(_) => None,
            })
            .collect()
    }

    /// Uuids of persisted entries in display order.
    pub fn persisted_uuids(&self) -> Vec<Uuid> {
        self.entries
            .iter()
            .filter_map(|(_, e)| e.persisted_uuid())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize the way the form layer stores it: key → uuid, pending entries omitted.
    pub fn to_hydrated(&self) -> JsonValue {
        let map = self
            .entries
            .iter()
            .filter_map(|(k, e)| {
                e.persisted_uuid()
                    .map(|uuid| (k.clone(), JsonValue::String(uuid.to_string())))
            })
            .collect();
        JsonValue::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_persisted_keys_are_uuids() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let state = DesiredState::from_persisted([a, b]);

        let keys: Vec<&str> = state.keys().collect();
        assert_eq!(keys, vec![a.to_string(), b.to_string()]);
        assert_eq!(state.persisted_uuids(), vec![a, b]);
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut state = DesiredState::new();
        state.push_pending("upload-1", PendingUpload::new("tok"));
        state.push_persisted(a);

        state.insert("upload-1".to_string(), AttachmentEntry::Persisted(b));

        assert_eq!(state.len(), 2);
        assert_eq!(state.persisted_uuids(), vec![b, a]);
        assert!(state.pending().is_empty());
        assert!(state.contains_key("upload-1"));
    }

    #[test]
    fn test_mark_persisted_rekeys_in_place() {
        let a = Uuid::new_v4();
        let created = Uuid::new_v4();
        let mut state = DesiredState::new();
        state.push_pending("upload-1", PendingUpload::new("tok"));
        state.push_persisted(a);

        assert!(state.mark_persisted("upload-1", created));
        assert!(!state.mark_persisted("upload-1", created));

        let keys: Vec<&str> = state.keys().collect();
        assert_eq!(keys, vec![created.to_string(), a.to_string()]);
        assert_eq!(state.persisted_uuids(), vec![created, a]);
    }

    #[test]
    fn test_from_hydrated_non_collection_is_empty() {
        assert!(DesiredState::from_hydrated(&json!(null)).is_empty());
        assert!(DesiredState::from_hydrated(&json!("abc")).is_empty());
        assert!(DesiredState::from_hydrated(&json!(3)).is_empty());
    }

    #[test]
    fn test_from_hydrated_object_and_array() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        let state = DesiredState::from_hydrated(&json!({ a.to_string(): a.to_string() }));
        assert_eq!(state.persisted_uuids(), vec![a]);

        let state = DesiredState::from_hydrated(&json!([b.to_string(), "nope", a.to_string()]));
        assert_eq!(state.persisted_uuids(), vec![b, a]);
    }

    #[test]
    fn test_to_hydrated_skips_pending() {
        let a = Uuid::new_v4();
        let mut state = DesiredState::from_persisted([a]);
        state.push_pending("k", PendingUpload::new("tok"));

        let hydrated = state.to_hydrated();
        assert_eq!(hydrated, json!({ a.to_string(): a.to_string() }));
    }

    #[test]
    fn test_remove() {
        let a = Uuid::new_v4();
        let mut state = DesiredState::from_persisted([a]);
        assert_eq!(
            state.remove(&a.to_string()),
            Some(AttachmentEntry::Persisted(a))
        );
        assert!(state.is_empty());
        assert_eq!(state.remove("missing"), None);
    }
}
