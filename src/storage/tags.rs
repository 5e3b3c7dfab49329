//! Tag repository for JSON storage
//!
//! Manages loading and saving tags to tags.json

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::TallyError;
use crate::models::{Tag, TagId};

use super::file_io::{read_json, write_json_atomic};
use super::lock_error;

/// Serializable tag data structure
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct TagData {
    tags: Vec<Tag>,
}

/// Repository for tag persistence
pub struct TagRepository {
    path: PathBuf,
    data: RwLock<HashMap<TagId, Tag>>,
    /// Index: lowercase name -> tag_id
    by_name: RwLock<HashMap<String, TagId>>,
}

fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

impl TagRepository {
    /// Create a new tag repository
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
            by_name: RwLock::new(HashMap::new()),
        }
    }

    /// Load tags from disk
    pub fn load(&self) -> Result<(), TallyError> {
        let file_data: TagData = read_json(&self.path)?;

        let mut data = self.data.write().map_err(lock_error)?;
        let mut by_name = self.by_name.write().map_err(lock_error)?;

        data.clear();
        by_name.clear();

        for tag in file_data.tags {
            by_name.insert(normalize_name(&tag.name), tag.id);
            data.insert(tag.id, tag);
        }

        Ok(())
    }

    /// Save tags to disk
    pub fn save(&self) -> Result<(), TallyError> {
        let tags = self.get_all()?;
        write_json_atomic(&self.path, &TagData { tags })
    }

    /// Get a tag by ID
    pub fn get(&self, id: TagId) -> Result<Option<Tag>, TallyError> {
        let data = self.data.read().map_err(lock_error)?;
        Ok(data.get(&id).cloned())
    }

    /// Get all tags sorted by name
    pub fn get_all(&self) -> Result<Vec<Tag>, TallyError> {
        let data = self.data.read().map_err(lock_error)?;

        let mut tags: Vec<_> = data.values().cloned().collect();
        tags.sort_by_key(|t| t.name.to_lowercase());
        Ok(tags)
    }

    /// Get a tag by name (case-insensitive)
    pub fn get_by_name(&self, name: &str) -> Result<Option<Tag>, TallyError> {
        let data = self.data.read().map_err(lock_error)?;
        let by_name = self.by_name.read().map_err(lock_error)?;

        Ok(by_name
            .get(&normalize_name(name))
            .and_then(|id| data.get(id).cloned()))
    }

    /// Get or create a tag by name
    ///
    /// Returns the tag and whether it was created.
    pub fn get_or_create(&self, name: &str) -> Result<(Tag, bool), TallyError> {
        if let Some(tag) = self.get_by_name(name)? {
            return Ok((tag, false));
        }

        let tag = Tag::new(name);
        tag.validate()
            .map_err(|e| TallyError::Validation(e.to_string()))?;
        self.upsert(tag.clone())?;
        tracing::debug!(tag = %tag.name, "created tag");
        Ok((tag, true))
    }

    /// Insert or update a tag
    pub fn upsert(&self, tag: Tag) -> Result<(), TallyError> {
        let mut data = self.data.write().map_err(lock_error)?;
        let mut by_name = self.by_name.write().map_err(lock_error)?;

        if let Some(old) = data.get(&tag.id) {
            by_name.remove(&normalize_name(&old.name));
        }
        by_name.insert(normalize_name(&tag.name), tag.id);

        data.insert(tag.id, tag);
        Ok(())
    }

    /// Delete a tag
    pub fn delete(&self, id: TagId) -> Result<bool, TallyError> {
        let mut data = self.data.write().map_err(lock_error)?;
        let mut by_name = self.by_name.write().map_err(lock_error)?;

        match data.remove(&id) {
            Some(tag) => {
                by_name.remove(&normalize_name(&tag.name));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Count tags
    pub fn count(&self) -> Result<usize, TallyError> {
        let data = self.data.read().map_err(lock_error)?;
        Ok(data.len())
    }
}
