//! Story persistence on top of a [`ContentStore`].
//!
//! All stories live as one JSON array under [`STORIES_NAMESPACE`]. Every
//! write is read-modify-write of that whole array.

use ink_core::{now_millis, EditorSession, Notice, RichTextEngine, Story, StoryId};
use log::{info, warn};
use serde_json::Value;

use crate::storage::{ContentStore, StoreError};

pub const STORIES_NAMESPACE: &str = "stories";

/// Sidebar length for [`StoryRepository::recent`].
pub const RECENT_LIMIT: usize = 10;

pub struct StoryRepository<S: ContentStore> {
    store: S,
}

impl<S: ContentStore> StoryRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    fn load_all(&self) -> Result<Vec<Story>, StoreError> {
        match self.store.get(STORIES_NAMESPACE)? {
            None => Ok(Vec::new()),
            Some(value) => {
                serde_json::from_value(value).map_err(|source| StoreError::Deserialization {
                    namespace: STORIES_NAMESPACE.to_string(),
                    source,
                })
            }
        }
    }

    fn write_all(&mut self, stories: &[Story]) -> Result<(), StoreError> {
        let value: Value =
            serde_json::to_value(stories).map_err(|source| StoreError::Serialization {
                namespace: STORIES_NAMESPACE.to_string(),
                source,
            })?;
        self.store.set(STORIES_NAMESPACE, value)
    }

    /// All stories, most recently updated first.
    pub fn list(&self) -> Result<Vec<Story>, StoreError> {
        let mut stories = self.load_all()?;
        stories.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(stories)
    }

    /// The `limit` most recently updated stories.
    pub fn recent(&self, limit: usize) -> Result<Vec<Story>, StoreError> {
        let mut stories = self.list()?;
        stories.truncate(limit);
        Ok(stories)
    }

    pub fn get(&self, id: &StoryId) -> Result<Option<Story>, StoreError> {
        Ok(self.load_all()?.into_iter().find(|s| &s.id == id))
    }

    /// Replace the story with the same id, or append it.
    pub fn upsert(&mut self, story: &Story) -> Result<(), StoreError> {
        let mut stories = self.load_all()?;
        match stories.iter_mut().find(|s| s.id == story.id) {
            Some(existing) => *existing = story.clone(),
            None => stories.push(story.clone()),
        }
        self.write_all(&stories)
    }

    /// Remove a story by id. Returns whether it existed.
    pub fn remove(&mut self, id: &StoryId) -> Result<bool, StoreError> {
        let mut stories = self.load_all()?;
        let before = stories.len();
        stories.retain(|s| &s.id != id);
        if stories.len() == before {
            return Ok(false);
        }
        self.write_all(&stories)?;
        Ok(true)
    }

    /// Save the session's story.
    ///
    /// The session is snapshotted and marked saved before the write; a
    /// failed write leaves it that way (the edits stay on screen and the
    /// user can retry) and queues an error notice.
    pub fn save<E: RichTextEngine>(
        &mut self,
        session: &mut EditorSession<E>,
    ) -> Result<Story, StoreError> {
        let story = session.prepare_save(now_millis());
        match self.upsert(&story) {
            Ok(()) => {
                info!("saved story {} ({} sheets)", story.id, story.sheets.len());
                session.push_notice(Notice::success("Story saved successfully!"));
                Ok(story)
            }
            Err(e) => {
                warn!("failed to save story {}: {e}", story.id);
                session.push_notice(
                    Notice::error("Failed to save story").with_description(e.to_string()),
                );
                Err(e)
            }
        }
    }

    /// Delete the session's story, if it has ever been saved.
    pub fn delete<E: RichTextEngine>(
        &mut self,
        session: &mut EditorSession<E>,
    ) -> Result<bool, StoreError> {
        let Some(id) = session.story_id().cloned() else {
            return Ok(false);
        };
        match self.remove(&id) {
            Ok(existed) => {
                info!("deleted story {id}");
                session.push_notice(
                    Notice::success("Story deleted")
                        .with_description("Your story has been deleted."),
                );
                Ok(existed)
            }
            Err(e) => {
                warn!("failed to delete story {id}: {e}");
                session.push_notice(Notice::error("Failed to delete story"));
                Err(e)
            }
        }
    }
}
