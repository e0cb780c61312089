//! In-process content store.
//!
//! Implements every collaborator trait over plain vectors so the ranking
//! pipeline runs without Postgres (local runs and integration tests).
//! Toggle kinds keep at most one fact per (user, item, kind) and the
//! denormalized `like_count` / `read_count` follow every write.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{
    ContentItem, InteractionCounts, InteractionFact, InteractionKind, ModerationAction,
    PublicationState,
};
use crate::services::ledger::{ContentStore, InterestProvider, ItemPredicate, VisibilityProvider};

#[derive(Default)]
pub struct InMemoryStore {
    items: RwLock<Vec<ContentItem>>,
    facts: RwLock<Vec<InteractionFact>>,
    staff: RwLock<HashSet<Uuid>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_item(&self, item: ContentItem) {
        self.items.write().await.push(item);
    }

    pub async fn add_staff(&self, user_id: Uuid) {
        self.staff.write().await.insert(user_id);
    }

    /// Author-side publish/approve flags, applied through the publication lifecycle.
    pub async fn set_publication(
        &self,
        item_id: Uuid,
        is_published: bool,
        is_approved: bool,
    ) -> Result<PublicationState> {
        let mut items = self.items.write().await;
        let item = find_mut(&mut items, item_id)?;
        item.status = item.status.transition(is_published, is_approved);
        item.is_approved = is_approved;
        Ok(item.status)
    }

    /// Moderator decision; the only way out of `Published` or `Rejected`.
    pub async fn moderate(
        &self,
        item_id: Uuid,
        action: ModerationAction,
    ) -> Result<PublicationState> {
        let mut items = self.items.write().await;
        let item = find_mut(&mut items, item_id)?;
        item.status = item.status.moderate(action);
        item.is_approved = action == ModerationAction::Approve;
        Ok(item.status)
    }

    /// Removes the item and every fact pointing at it.
    pub async fn delete_item(&self, item_id: Uuid) {
        self.items.write().await.retain(|item| item.id != item_id);
        self.facts.write().await.retain(|fact| fact.item_id != item_id);
    }

    /// Record an interaction at `at`. Returns whether a toggle kind is now
    /// active; append-only kinds always return `true`.
    pub async fn record(
        &self,
        user_id: Uuid,
        item_id: Uuid,
        kind: InteractionKind,
        at: DateTime<Utc>,
    ) -> Result<bool> {
        // lock order: items before facts
        let mut items = self.items.write().await;
        let item = find_mut(&mut items, item_id)?;
        let mut facts = self.facts.write().await;

        let existing = facts
            .iter()
            .position(|f| f.user_id == user_id && f.item_id == item_id && f.kind == kind);

        let active = match existing {
            Some(idx) if kind.is_toggle() => {
                facts.swap_remove(idx);
                false
            }
            _ => {
                facts.push(InteractionFact {
                    user_id,
                    item_id,
                    kind,
                    created_at: at,
                });
                true
            }
        };

        match kind {
            InteractionKind::Like => {
                item.like_count = (item.like_count + if active { 1 } else { -1 }).max(0);
            }
            InteractionKind::Read => item.read_count += 1,
            _ => {}
        }

        Ok(active)
    }
}

fn find_mut(items: &mut [ContentItem], item_id: Uuid) -> Result<&mut ContentItem> {
    items
        .iter_mut()
        .find(|item| item.id == item_id)
        .ok_or_else(|| AppError::NotFound(format!("post {}", item_id)))
}

#[async_trait]
impl ContentStore for InMemoryStore {
    async fn fetch_items(&self, predicate: &ItemPredicate) -> Result<Vec<ContentItem>> {
        Ok(self
            .items
            .read()
            .await
            .iter()
            .filter(|item| predicate.matches(item))
            .cloned()
            .collect())
    }

    async fn fetch_interaction_counts(
        &self,
        item_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, InteractionCounts>> {
        let wanted: HashSet<&Uuid> = item_ids.iter().collect();
        let mut counts: HashMap<Uuid, InteractionCounts> = HashMap::new();

        for fact in self.facts.read().await.iter() {
            if !wanted.contains(&fact.item_id) {
                continue;
            }
            let entry = counts.entry(fact.item_id).or_default();
            match fact.kind {
                InteractionKind::Like => entry.likes += 1,
                InteractionKind::Read => entry.reads += 1,
                InteractionKind::Comment => entry.comments += 1,
                InteractionKind::Favorite => entry.favorites += 1,
            }
        }

        Ok(counts)
    }
}

#[async_trait]
impl VisibilityProvider for InMemoryStore {
    async fn is_staff(&self, user_id: Uuid) -> Result<bool> {
        Ok(self.staff.read().await.contains(&user_id))
    }
}

const INTEREST_KINDS: [InteractionKind; 3] = [
    InteractionKind::Read,
    InteractionKind::Like,
    InteractionKind::Favorite,
];

#[async_trait]
impl InterestProvider for InMemoryStore {
    async fn interest_categories(&self, user_id: Uuid) -> Result<HashSet<String>> {
        let seen = self.seen_items(user_id).await?;
        Ok(self
            .items
            .read()
            .await
            .iter()
            .filter(|item| seen.contains(&item.id))
            .filter_map(|item| item.category.clone())
            .collect())
    }

    async fn seen_items(&self, user_id: Uuid) -> Result<HashSet<Uuid>> {
        Ok(self
            .facts
            .read()
            .await
            .iter()
            .filter(|f| f.user_id == user_id && INTEREST_KINDS.contains(&f.kind))
            .map(|f| f.item_id)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(category: &str) -> ContentItem {
        ContentItem {
            id: Uuid::new_v4(),
            author_id: Uuid::new_v4(),
            title: "Galata tower".into(),
            summary: String::new(),
            content: String::new(),
            location_name: Some("Istanbul".into()),
            latitude: None,
            longitude: None,
            status: PublicationState::Published,
            is_approved: true,
            category: Some(category.into()),
            tags: vec![],
            created_at: Utc::now(),
            like_count: 0,
            read_count: 0,
        }
    }

    #[tokio::test]
    async fn test_like_toggles_and_counter_follows() {
        let store = InMemoryStore::new();
        let post = item("historical");
        let post_id = post.id;
        store.insert_item(post).await;
        let user = Uuid::new_v4();

        assert!(store.record(user, post_id, InteractionKind::Like, Utc::now()).await.unwrap());
        assert!(!store.record(user, post_id, InteractionKind::Like, Utc::now()).await.unwrap());
        assert!(store.record(user, post_id, InteractionKind::Like, Utc::now()).await.unwrap());

        let counts = store.fetch_interaction_counts(&[post_id]).await.unwrap();
        assert_eq!(counts[&post_id].likes, 1);
        let items = store.fetch_items(&ItemPredicate::default()).await.unwrap();
        assert_eq!(items[0].like_count, 1);
    }

    #[tokio::test]
    async fn test_reads_and_comments_append() {
        let store = InMemoryStore::new();
        let post = item("food");
        let post_id = post.id;
        store.insert_item(post).await;
        let user = Uuid::new_v4();

        for _ in 0..3 {
            store.record(user, post_id, InteractionKind::Read, Utc::now()).await.unwrap();
            store.record(user, post_id, InteractionKind::Comment, Utc::now()).await.unwrap();
        }

        let counts = store.fetch_interaction_counts(&[post_id]).await.unwrap();
        assert_eq!(counts[&post_id], InteractionCounts::new(0, 3, 3, 0));
        let items = store.fetch_items(&ItemPredicate::default()).await.unwrap();
        assert_eq!(items[0].read_count, 3);
    }

    #[tokio::test]
    async fn test_interests_come_from_reads_likes_and_favorites() {
        let store = InMemoryStore::new();
        let read = item("nature");
        let commented = item("nightlife");
        let (read_id, commented_id) = (read.id, commented.id);
        store.insert_item(read).await;
        store.insert_item(commented).await;
        let user = Uuid::new_v4();

        store.record(user, read_id, InteractionKind::Read, Utc::now()).await.unwrap();
        store.record(user, commented_id, InteractionKind::Comment, Utc::now()).await.unwrap();

        let interests = store.interest_categories(user).await.unwrap();
        assert_eq!(interests, HashSet::from(["nature".to_string()]));
        assert!(store.interest_categories(Uuid::new_v4()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_item_is_not_found() {
        let store = InMemoryStore::new();
        let err = store
            .record(Uuid::new_v4(), Uuid::new_v4(), InteractionKind::Like, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_cascades_facts() {
        let store = InMemoryStore::new();
        let post = item("art");
        let post_id = post.id;
        store.insert_item(post).await;
        store
            .record(Uuid::new_v4(), post_id, InteractionKind::Like, Utc::now())
            .await
            .unwrap();

        store.delete_item(post_id).await;
        assert!(store.fetch_interaction_counts(&[post_id]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_publication_lifecycle_drives_visibility() {
        let store = InMemoryStore::new();
        let mut post = item("cultural");
        post.status = PublicationState::Draft;
        post.is_approved = false;
        let post_id = post.id;
        store.insert_item(post).await;
        let public = ItemPredicate::default();

        let state = store.set_publication(post_id, true, false).await.unwrap();
        assert_eq!(state, PublicationState::Pending);
        assert!(store.fetch_items(&public).await.unwrap().is_empty());

        let state = store.moderate(post_id, ModerationAction::Approve).await.unwrap();
        assert_eq!(state, PublicationState::Published);
        assert_eq!(store.fetch_items(&public).await.unwrap().len(), 1);

        // authors cannot unpublish on their own
        let state = store.set_publication(post_id, false, true).await.unwrap();
        assert_eq!(state, PublicationState::Published);

        let state = store.moderate(post_id, ModerationAction::Unpublish).await.unwrap();
        assert_eq!(state, PublicationState::Draft);
        assert!(store.fetch_items(&public).await.unwrap().is_empty());
    }
}
