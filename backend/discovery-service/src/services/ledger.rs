/// Collaborator seams of the ranking core
///
/// The core never writes. It reads content items and interaction counts
/// from a [`ContentStore`], staff flags from a [`VisibilityProvider`] and
/// interest signals from an [`InterestProvider`]. Each is fetched in bulk,
/// once per request.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{ContentItem, InteractionCounts};

/// Which non-public items a store may return alongside public ones
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HiddenScope {
    /// Only published and approved items
    #[default]
    None,
    /// Plus unpublished items written by this author
    AuthoredBy(Uuid),
    /// Everything (staff)
    All,
}

/// Part of the candidate filter that a store can evaluate itself.
/// Stores may over-fetch; the candidate filter re-checks every rule.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemPredicate {
    pub category: Option<String>,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
    pub hidden: HiddenScope,
}

impl ItemPredicate {
    pub fn matches(&self, item: &ContentItem) -> bool {
        if let Some(category) = &self.category {
            if item.category.as_deref() != Some(category.as_str()) {
                return false;
            }
        }
        if self.created_after.is_some_and(|after| item.created_at < after) {
            return false;
        }
        if self.created_before.is_some_and(|before| item.created_at > before) {
            return false;
        }

        item.is_publicly_visible()
            || match self.hidden {
                HiddenScope::None => false,
                HiddenScope::AuthoredBy(author) => item.author_id == author,
                HiddenScope::All => true,
            }
    }
}

#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn fetch_items(&self, predicate: &ItemPredicate) -> Result<Vec<ContentItem>>;

    /// Live counts for the given items. Items without facts may be absent.
    async fn fetch_interaction_counts(
        &self,
        item_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, InteractionCounts>>;
}

#[async_trait]
pub trait VisibilityProvider: Send + Sync {
    /// Unknown users are not staff.
    async fn is_staff(&self, user_id: Uuid) -> Result<bool>;

    fn owns(&self, user_id: Uuid, item: &ContentItem) -> bool {
        item.author_id == user_id
    }
}

#[async_trait]
pub trait InterestProvider: Send + Sync {
    /// Categories of items the user read, liked or favorited.
    async fn interest_categories(&self, user_id: Uuid) -> Result<HashSet<String>>;

    /// Items the user already read, liked or favorited.
    async fn seen_items(&self, user_id: Uuid) -> Result<HashSet<Uuid>>;
}

/// Read-only view over interaction counts for one request's candidate set
#[derive(Debug, Clone, Default)]
pub struct InteractionLedger {
    counts: HashMap<Uuid, InteractionCounts>,
}

impl InteractionLedger {
    /// Single bulk fetch for all `item_ids`.
    pub async fn load(store: &dyn ContentStore, item_ids: &[Uuid]) -> Result<Self> {
        if item_ids.is_empty() {
            return Ok(Self::default());
        }

        let counts = store.fetch_interaction_counts(item_ids).await?;
        Ok(Self { counts })
    }

    pub fn from_counts(counts: HashMap<Uuid, InteractionCounts>) -> Self {
        Self { counts }
    }

    /// Counts for `item_id`; missing entries read as zero.
    pub fn counts(&self, item_id: Uuid) -> InteractionCounts {
        self.counts
            .get(&item_id)
            .map(InteractionCounts::clamped)
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PublicationState;
    use chrono::Duration;

    fn item(status: PublicationState, approved: bool, author: Uuid) -> ContentItem {
        ContentItem {
            id: Uuid::new_v4(),
            author_id: author,
            title: "t".into(),
            summary: String::new(),
            content: String::new(),
            location_name: None,
            latitude: None,
            longitude: None,
            status,
            is_approved: approved,
            category: Some("nature".into()),
            tags: vec![],
            created_at: Utc::now(),
            like_count: 0,
            read_count: 0,
        }
    }

    #[test]
    fn test_predicate_hidden_scope() {
        let author = Uuid::new_v4();
        let draft = item(PublicationState::Draft, false, author);

        assert!(!ItemPredicate::default().matches(&draft));
        assert!(ItemPredicate {
            hidden: HiddenScope::AuthoredBy(author),
            ..Default::default()
        }
        .matches(&draft));
        assert!(!ItemPredicate {
            hidden: HiddenScope::AuthoredBy(Uuid::new_v4()),
            ..Default::default()
        }
        .matches(&draft));
        assert!(ItemPredicate {
            hidden: HiddenScope::All,
            ..Default::default()
        }
        .matches(&draft));
    }

    #[test]
    fn test_predicate_category_and_dates() {
        let post = item(PublicationState::Published, true, Uuid::new_v4());

        let other_category = ItemPredicate {
            category: Some("food".into()),
            ..Default::default()
        };
        assert!(!other_category.matches(&post));

        let future_only = ItemPredicate {
            created_after: Some(post.created_at + Duration::seconds(1)),
            ..Default::default()
        };
        assert!(!future_only.matches(&post));

        let inclusive = ItemPredicate {
            created_after: Some(post.created_at),
            created_before: Some(post.created_at),
            ..Default::default()
        };
        assert!(inclusive.matches(&post));
    }

    #[test]
    fn test_ledger_missing_counts_are_zero() {
        let id = Uuid::new_v4();
        let mut counts = HashMap::new();
        counts.insert(id, InteractionCounts::new(3, -2, 1, 0));
        let ledger = InteractionLedger::from_counts(counts);

        assert_eq!(ledger.counts(id), InteractionCounts::new(3, 0, 1, 0));
        assert_eq!(ledger.counts(Uuid::new_v4()), InteractionCounts::default());
        assert_eq!(ledger.len(), 1);
    }
}
