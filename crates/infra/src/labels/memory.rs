use std::collections::{BTreeMap, BTreeSet};
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use foodlabel_core::{DomainError, DomainResult, LabelId, UserId};

use super::{FoodLabel, LabelDraft, LabelPage, LabelQuery, LabelStore};

#[derive(Debug, Default)]
struct Inner {
    last_id: i64,
    rows: BTreeMap<LabelId, FoodLabel>,
}

/// In-memory catalog for tests/dev. Listing is ordered by id.
#[derive(Debug, Default)]
pub struct InMemoryLabelStore {
    inner: RwLock<Inner>,
}

impl InMemoryLabelStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> DomainError {
    DomainError::internal("label store lock poisoned")
}

impl LabelStore for InMemoryLabelStore {
    fn get(&self, id: LabelId) -> DomainResult<Option<FoodLabel>> {
        let inner = self.inner.read().map_err(|_| poisoned())?;
        Ok(inner.rows.get(&id).cloned())
    }

    fn list(&self, query: &LabelQuery) -> DomainResult<LabelPage> {
        let query = query.clone().normalized();
        let inner = self.inner.read().map_err(|_| poisoned())?;

        let matching: Vec<&FoodLabel> = inner.rows.values().filter(|l| query.matches(l)).collect();
        let total = matching.len() as u64;
        let skip = (query.page as usize - 1).saturating_mul(query.page_size as usize);
        let data = matching
            .into_iter()
            .skip(skip)
            .take(query.page_size as usize)
            .cloned()
            .collect();

        Ok(LabelPage::new(data, total, query.page, query.page_size))
    }

    fn create(&self, draft: LabelDraft, by: UserId, now: DateTime<Utc>) -> DomainResult<FoodLabel> {
        draft.validate()?;
        let mut inner = self.inner.write().map_err(|_| poisoned())?;
        inner.last_id += 1;
        let id = LabelId::new(inner.last_id)?;

        let label = FoodLabel {
            id,
            name: draft.name,
            description: draft.description,
            category: draft.category,
            image_url: draft.image_url,
            color: draft.color,
            is_active: true,
            created_at: now,
            modified_at: None,
            created_by: by,
            modified_by: None,
            translations: draft.translations,
        };
        inner.rows.insert(id, label.clone());
        Ok(label)
    }

    fn update(
        &self,
        id: LabelId,
        draft: LabelDraft,
        by: UserId,
        now: DateTime<Utc>,
    ) -> DomainResult<FoodLabel> {
        draft.validate()?;
        let mut inner = self.inner.write().map_err(|_| poisoned())?;
        let label = inner.rows.get_mut(&id).ok_or_else(DomainError::not_found)?;

        label.name = draft.name;
        label.description = draft.description;
        label.category = draft.category;
        label.image_url = draft.image_url;
        label.color = draft.color;
        if let Some(active) = draft.is_active {
            label.is_active = active;
        }
        label.translations = draft.translations;
        label.modified_at = Some(now);
        label.modified_by = Some(by);

        Ok(label.clone())
    }

    fn deactivate(&self, id: LabelId) -> DomainResult<()> {
        let mut inner = self.inner.write().map_err(|_| poisoned())?;
        let label = inner.rows.get_mut(&id).ok_or_else(DomainError::not_found)?;
        label.is_active = false;
        Ok(())
    }

    fn categories(&self) -> DomainResult<Vec<String>> {
        let inner = self.inner.read().map_err(|_| poisoned())?;
        let set: BTreeSet<String> = inner
            .rows
            .values()
            .filter_map(|l| l.category.as_deref())
            .filter(|c| !c.trim().is_empty())
            .map(str::to_string)
            .collect();
        Ok(set.into_iter().collect())
    }
}
