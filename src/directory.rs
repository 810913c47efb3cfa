//! Contact directory - alias-indexed recipient identity
//!
//! Single source of truth for who a message can be delivered to. Backed by
//! one JSON document ({contacts, aliases, settings}) written atomically;
//! invariants are re-derived on load instead of trusting the file.

use crate::config::Config;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;
use tracing::warn;

/// A known contact. Mutated only by full replacement of its fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactRecord {
    pub name: String,
    pub handle: String,
    pub role: String,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

/// Outcome of resolving a hint: a deliverable name/handle pair
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTarget {
    pub name: String,
    pub handle: String,
}

/// A contact with its id and every alias pointing at it
#[derive(Debug, Clone)]
pub struct ContactEntry {
    pub id: String,
    pub record: ContactRecord,
    pub aliases: Vec<String>,
}

/// On-disk document shape
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreDocument {
    #[serde(default)]
    contacts: HashMap<String, ContactRecord>,
    #[serde(default)]
    aliases: HashMap<String, String>,
    #[serde(default)]
    settings: serde_json::Map<String, serde_json::Value>,
}

/// In-memory view over the persisted contact store
pub struct ContactDirectory {
    store_path: PathBuf,
    contacts: HashMap<String, ContactRecord>,
    aliases: HashMap<String, String>,
    settings: serde_json::Map<String, serde_json::Value>,
}

/// Canonical contact id: lower-cased name, spaces replaced
pub fn contact_id_for(name: &str) -> String {
    name.to_lowercase().replace(' ', "_")
}

impl ContactDirectory {
    pub fn new(config: &Config) -> Self {
        Self {
            store_path: config.store_file.clone(),
            contacts: HashMap::new(),
            aliases: HashMap::new(),
            settings: serde_json::Map::new(),
        }
    }

    /// Load the store from disk. A missing file loads empty. Aliases whose
    /// target contact does not exist are dropped with a warning.
    pub fn load(&mut self) -> Result<usize> {
        if !self.store_path.exists() {
            self.contacts = HashMap::new();
            self.aliases = HashMap::new();
            self.settings = serde_json::Map::new();
            return Ok(0);
        }

        let content = fs::read_to_string(&self.store_path)?;
        let StoreDocument {
            contacts,
            mut aliases,
            settings,
        } = serde_json::from_str(&content)?;

        aliases.retain(|alias, target| {
            let keep = contacts.contains_key(target.as_str());
            if !keep {
                warn!(%alias, %target, "dropping alias with no matching contact");
            }
            keep
        });

        self.contacts = contacts;
        self.aliases = aliases;
        self.settings = settings;
        Ok(self.contacts.len())
    }

    /// Save the store to disk atomically
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.store_path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Write to temp file in same directory (for atomic rename)
        let parent = self.store_path.parent().unwrap_or(std::path::Path::new("."));
        let mut temp = NamedTempFile::new_in(parent)?;

        let doc = StoreDocument {
            contacts: self.contacts.clone(),
            aliases: self.aliases.clone(),
            settings: self.settings.clone(),
        };
        let json = serde_json::to_string_pretty(&doc)?;
        temp.write_all(json.as_bytes())?;
        temp.as_file().sync_all()?;

        temp.persist(&self.store_path).map_err(|e| Error::Io(e.error))?;

        Ok(())
    }

    /// Add a contact. The contact's lower-cased name and its id are always
    /// registered as aliases, plus each supplied alias (lower-cased).
    /// Rejects ids that already exist.
    pub fn create(
        &mut self,
        name: &str,
        handle: &str,
        role: &str,
        aliases: &[String],
        notes: &str,
    ) -> Result<String> {
        let contact_id = contact_id_for(name);
        if self.contacts.contains_key(&contact_id) {
            return Err(Error::DuplicateContact(contact_id));
        }

        self.contacts.insert(
            contact_id.clone(),
            ContactRecord {
                name: name.to_string(),
                handle: handle.to_string(),
                role: role.to_string(),
                notes: notes.to_string(),
                created_at: Utc::now(),
            },
        );

        self.aliases.insert(name.to_lowercase(), contact_id.clone());
        self.aliases.insert(contact_id.clone(), contact_id.clone());
        for alias in aliases {
            self.aliases.insert(alias.to_lowercase(), contact_id.clone());
        }

        self.save()?;
        Ok(contact_id)
    }

    /// Remove a contact and every alias pointing at it. Both changes land in
    /// a single atomic store write.
    pub fn delete(&mut self, contact_id: &str) -> Result<ContactRecord> {
        let removed = self
            .contacts
            .remove(contact_id)
            .ok_or_else(|| Error::ContactNotFound(contact_id.to_string()))?;

        self.aliases.retain(|_, target| target != contact_id);

        self.save()?;
        Ok(removed)
    }

    /// Resolve a recipient hint to a concrete target.
    ///
    /// A hint starting with `@` is a direct handle and bypasses the
    /// directory. Otherwise the alias index is consulted first, then an
    /// exact case-insensitive scan of contact names.
    pub fn resolve(&self, hint: Option<&str>) -> Option<ResolvedTarget> {
        let hint = hint?;
        if hint.trim().is_empty() {
            return None;
        }

        if hint.starts_with('@') {
            return Some(ResolvedTarget {
                name: hint.to_string(),
                handle: hint.to_string(),
            });
        }

        let key = hint.trim().to_lowercase();

        if let Some(contact_id) = self.aliases.get(&key) {
            if let Some(contact) = self.contacts.get(contact_id) {
                return Some(ResolvedTarget {
                    name: contact.name.clone(),
                    handle: contact.handle.clone(),
                });
            }
        }

        self.contacts
            .values()
            .find(|c| c.name.to_lowercase() == key)
            .map(|c| ResolvedTarget {
                name: c.name.clone(),
                handle: c.handle.clone(),
            })
    }

    /// Get a contact by id
    pub fn get(&self, contact_id: &str) -> Option<&ContactRecord> {
        self.contacts.get(contact_id)
    }

    /// Contact ids, sorted. This is the known-contacts list handed to the
    /// correction adapter.
    pub fn contact_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.contacts.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// All contacts with their aliases, sorted by id
    pub fn list(&self) -> Vec<ContactEntry> {
        let mut entries: Vec<ContactEntry> = self
            .contacts
            .iter()
            .map(|(id, record)| ContactEntry {
                id: id.clone(),
                record: record.clone(),
                aliases: self.aliases_for(id),
            })
            .collect();
        entries.sort_by(|a, b| a.id.cmp(&b.id));
        entries
    }

    /// Every alias mapping to the given contact id, sorted
    pub fn aliases_for(&self, contact_id: &str) -> Vec<String> {
        let mut aliases: Vec<String> = self
            .aliases
            .iter()
            .filter(|(_, target)| target.as_str() == contact_id)
            .map(|(alias, _)| alias.clone())
            .collect();
        aliases.sort();
        aliases
    }

    /// Opaque settings passthrough (delivery credentials live here)
    pub fn setting(&self, key: &str) -> Option<&serde_json::Value> {
        self.settings.get(key)
    }

    pub fn set_setting(&mut self, key: &str, value: serde_json::Value) -> Result<()> {
        self.settings.insert(key.to_string(), value);
        self.save()
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }
}
