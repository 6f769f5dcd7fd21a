use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Origin-local key/value storage. Keys keep insertion order so stored
/// state enumerates deterministically.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LocalStorage {
    entries: Vec<(String, String)>,
}

impl LocalStorage {
    pub fn get_item(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value.as_str())
    }

    pub fn set_item(&mut self, key: &str, value: &str) {
        if let Some(slot) = self
            .entries
            .iter_mut()
            .find(|(existing, _)| existing == key)
        {
            slot.1 = value.to_string();
        } else {
            self.entries.push((key.to_string(), value.to_string()));
        }
    }

    pub fn remove_item(&mut self, key: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(existing, _)| existing != key);
        self.entries.len() != before
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }
}

/// One stored feedback submission. The field names are the wire format of
/// the persisted JSON array and must stay stable for existing readers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackEntry {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub timestamp: String,
}

// Absent or corrupt stored data reads as the empty list; recovery happens
// here, never in front of the user.
pub(crate) fn read_entries(storage: &LocalStorage, key: &str) -> Vec<FeedbackEntry> {
    let Some(raw) = storage.get_item(key) else {
        return Vec::new();
    };
    serde_json::from_str(raw).unwrap_or_default()
}

pub(crate) fn append_entry(
    storage: &mut LocalStorage,
    key: &str,
    entry: FeedbackEntry,
) -> Result<usize> {
    let mut entries = read_entries(storage, key);
    entries.push(entry);
    let raw = serde_json::to_string(&entries).map_err(|err| Error::Storage(err.to_string()))?;
    storage.set_item(key, &raw);
    Ok(entries.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str) -> FeedbackEntry {
        FeedbackEntry {
            name: name.to_string(),
            email: format!("{name}@example.com"),
            subject: "subject".to_string(),
            message: "a message of fair length".to_string(),
            timestamp: "1970-01-01T00:00:00.000Z".to_string(),
        }
    }

    #[test]
    fn set_item_keeps_first_insertion_position() {
        let mut storage = LocalStorage::default();
        storage.set_item("a", "1");
        storage.set_item("b", "2");
        storage.set_item("a", "3");

        assert_eq!(storage.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(storage.get_item("a"), Some("3"));
        assert_eq!(storage.len(), 2);
    }

    #[test]
    fn remove_and_clear_empty_the_store() {
        let mut storage = LocalStorage::default();
        storage.set_item("a", "1");
        storage.set_item("b", "2");

        assert!(storage.remove_item("a"));
        assert!(!storage.remove_item("a"));
        assert_eq!(storage.get_item("a"), None);
        assert_eq!(storage.len(), 1);

        storage.clear();
        assert!(storage.is_empty());
    }

    #[test]
    fn corrupt_payload_reads_as_empty() {
        let mut storage = LocalStorage::default();
        storage.set_item("feedbackList", "{not json");
        assert!(read_entries(&storage, "feedbackList").is_empty());
    }

    #[test]
    fn append_recovers_from_corrupt_payload() -> Result<()> {
        let mut storage = LocalStorage::default();
        storage.set_item("feedbackList", "[[[[");
        append_entry(&mut storage, "feedbackList", entry("alice"))?;

        let entries = read_entries(&storage, "feedbackList");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "alice");
        Ok(())
    }

    #[test]
    fn append_preserves_existing_order() -> Result<()> {
        let mut storage = LocalStorage::default();
        append_entry(&mut storage, "feedbackList", entry("first"))?;
        append_entry(&mut storage, "feedbackList", entry("second"))?;

        let names: Vec<String> = read_entries(&storage, "feedbackList")
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["first".to_string(), "second".to_string()]);
        Ok(())
    }
}
