//! Tag service
//!
//! Tag management; deleting a tag detaches it from every transaction.

use crate::error::{TallyError, TallyResult};
use crate::models::{Tag, TagId};
use crate::storage::Storage;

/// Service for tag management
pub struct TagService<'a> {
    storage: &'a Storage,
}

/// A tag and how many transactions carry it
#[derive(Debug, Clone)]
pub struct TagUsage {
    pub tag: Tag,
    pub transaction_count: usize,
}

impl<'a> TagService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Create a tag; names are unique ignoring case
    pub fn create(&self, name: &str) -> TallyResult<Tag> {
        let name = name.trim();
        if self.storage.tags.get_by_name(name)?.is_some() {
            return Err(TallyError::Duplicate {
                entity_type: "Tag",
                identifier: name.to_string(),
            });
        }

        let (tag, _) = self.storage.tags.get_or_create(name)?;
        self.storage.tags.save()?;

        tracing::info!(id = %tag.id, name = %tag.name, "created tag");
        Ok(tag)
    }

    /// Find a tag by name (case-insensitive, optional leading `#`) or ID string
    pub fn find(&self, identifier: &str) -> TallyResult<Option<Tag>> {
        let identifier = identifier.trim();
        let name = identifier.strip_prefix('#').unwrap_or(identifier);
        if let Some(tag) = self.storage.tags.get_by_name(name)? {
            return Ok(Some(tag));
        }

        if let Ok(id) = identifier.parse::<TagId>() {
            return self.storage.tags.get(id);
        }

        Ok(self
            .storage
            .tags
            .get_all()?
            .into_iter()
            .find(|t| t.id.matches_prefix(identifier)))
    }

    /// Find a tag or fail with a not-found error
    pub fn resolve(&self, identifier: &str) -> TallyResult<Tag> {
        self.find(identifier)?
            .ok_or_else(|| TallyError::tag_not_found(identifier.trim()))
    }

    /// List all tags sorted by name
    pub fn list(&self) -> TallyResult<Vec<Tag>> {
        self.storage.tags.get_all()
    }

    /// Rename a tag
    pub fn rename(&self, id: TagId, new_name: &str) -> TallyResult<Tag> {
        let mut tag = self
            .storage
            .tags
            .get(id)?
            .ok_or_else(|| TallyError::tag_not_found(id.to_string()))?;

        let new_name = new_name.trim();
        if let Some(existing) = self.storage.tags.get_by_name(new_name)? {
            if existing.id != id {
                return Err(TallyError::Duplicate {
                    entity_type: "Tag",
                    identifier: new_name.to_string(),
                });
            }
        }

        tag.name = new_name.to_string();
        tag.validate()
            .map_err(|e| TallyError::Validation(e.to_string()))?;

        self.storage.tags.upsert(tag.clone())?;
        self.storage.tags.save()?;

        tracing::info!(id = %id, name = %tag.name, "renamed tag");
        Ok(tag)
    }

    /// Delete a tag and detach it from transactions
    ///
    /// Returns the number of transactions that carried the tag.
    pub fn delete(&self, id: TagId) -> TallyResult<usize> {
        let tag = self
            .storage
            .tags
            .get(id)?
            .ok_or_else(|| TallyError::tag_not_found(id.to_string()))?;

        let tagged = self.storage.transactions.get_by_tag(id)?;
        let detached = tagged.len();
        for mut txn in tagged {
            txn.remove_tag(id);
            self.storage.transactions.upsert(txn)?;
        }

        self.storage.tags.delete(id)?;
        self.storage.tags.save()?;
        if detached > 0 {
            self.storage.transactions.save()?;
        }

        tracing::info!(id = %id, name = %tag.name, detached, "deleted tag");
        Ok(detached)
    }

    /// Every tag with its transaction count, most used first
    pub fn usage_counts(&self) -> TallyResult<Vec<TagUsage>> {
        let mut usage = Vec::new();
        for tag in self.storage.tags.get_all()? {
            let transaction_count = self.storage.transactions.get_by_tag(tag.id)?.len();
            usage.push(TagUsage {
                tag,
                transaction_count,
            });
        }

        // Stable, so equal counts stay alphabetical
        usage.sort_by(|a, b| b.transaction_count.cmp(&a.transaction_count));
        Ok(usage)
    }
}
