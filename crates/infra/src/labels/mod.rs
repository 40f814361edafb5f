//! Food-label catalog.
//!
//! Labels are never physically removed: deletion flips `is_active` off and
//! the listing hides inactive labels unless asked otherwise.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use foodlabel_core::{DomainError, DomainResult, Entity, LabelId, UserId};

mod memory;

pub use memory::InMemoryLabelStore;

pub const NAME_MAX: usize = 255;
pub const CATEGORY_MAX: usize = 100;
pub const IMAGE_URL_MAX: usize = 500;
pub const COLOR_MAX: usize = 7;
pub const LANGUAGE_CODE_MAX: usize = 10;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Translation {
    pub language_code: String,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodLabel {
    pub id: LabelId,
    pub name: String,
    pub description: String,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub color: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub modified_at: Option<DateTime<Utc>>,
    pub created_by: UserId,
    pub modified_by: Option<UserId>,
    #[serde(default)]
    pub translations: Vec<Translation>,
}

impl Entity for FoodLabel {
    type Id = LabelId;

    fn id(&self) -> LabelId {
        self.id
    }
}

/// Body of a create or update request.
///
/// `is_active` is ignored on create (new labels start active); on update a
/// missing value keeps the current state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelDraft {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub translations: Vec<Translation>,
}

fn check_len(field: &str, value: &str, max: usize) -> DomainResult<()> {
    if value.chars().count() > max {
        return Err(DomainError::validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(())
}

fn check_required(field: &str, value: &str) -> DomainResult<()> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(format!("{field} is required")));
    }
    Ok(())
}

impl LabelDraft {
    pub fn validate(&self) -> DomainResult<()> {
        check_required("name", &self.name)?;
        check_len("name", &self.name, NAME_MAX)?;
        check_required("description", &self.description)?;
        if let Some(category) = &self.category {
            check_len("category", category, CATEGORY_MAX)?;
        }
        if let Some(url) = &self.image_url {
            check_len("imageUrl", url, IMAGE_URL_MAX)?;
        }
        if let Some(color) = &self.color {
            check_len("color", color, COLOR_MAX)?;
        }
        for t in &self.translations {
            check_required("translation languageCode", &t.language_code)?;
            check_len("translation languageCode", &t.language_code, LANGUAGE_CODE_MAX)?;
            check_required("translation name", &t.name)?;
            check_len("translation name", &t.name, NAME_MAX)?;
            check_required("translation description", &t.description)?;
        }
        Ok(())
    }
}

/// Listing filters. Blank `category`/`search` mean "no filter".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelQuery {
    pub category: Option<String>,
    pub search: Option<String>,
    pub include_inactive: bool,
    pub page: u32,
    pub page_size: u32,
}

impl Default for LabelQuery {
    fn default() -> Self {
        Self {
            category: None,
            search: None,
            include_inactive: false,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl LabelQuery {
    /// Clamp paging to `page >= 1` and `1..=MAX_PAGE_SIZE`.
    pub fn normalized(mut self) -> Self {
        self.page = self.page.max(1);
        self.page_size = self.page_size.clamp(1, MAX_PAGE_SIZE);
        self.category = self.category.filter(|c| !c.trim().is_empty());
        self.search = self.search.filter(|s| !s.trim().is_empty());
        self
    }

    pub fn matches(&self, label: &FoodLabel) -> bool {
        if !self.include_inactive && !label.is_active {
            return false;
        }
        if let Some(category) = &self.category {
            if label.category.as_deref() != Some(category.as_str()) {
                return false;
            }
        }
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            return label.name.to_lowercase().contains(&needle)
                || label.description.to_lowercase().contains(&needle);
        }
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelPage {
    pub data: Vec<FoodLabel>,
    pub total_count: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u64,
}

impl LabelPage {
    pub fn new(data: Vec<FoodLabel>, total_count: u64, page: u32, page_size: u32) -> Self {
        let total_pages = total_count.div_ceil(u64::from(page_size.max(1)));
        Self {
            data,
            total_count,
            page,
            page_size,
            total_pages,
        }
    }
}

/// Catalog persistence.
pub trait LabelStore: Send + Sync {
    fn get(&self, id: LabelId) -> DomainResult<Option<FoodLabel>>;

    fn list(&self, query: &LabelQuery) -> DomainResult<LabelPage>;

    fn create(&self, draft: LabelDraft, by: UserId, now: DateTime<Utc>) -> DomainResult<FoodLabel>;

    /// Replace the editable fields and translations. `NotFound` for unknown ids.
    fn update(
        &self,
        id: LabelId,
        draft: LabelDraft,
        by: UserId,
        now: DateTime<Utc>,
    ) -> DomainResult<FoodLabel>;

    /// Soft delete. `NotFound` for unknown ids.
    fn deactivate(&self, id: LabelId) -> DomainResult<()>;

    /// Distinct non-blank categories, sorted.
    fn categories(&self) -> DomainResult<Vec<String>>;
}

impl<S> LabelStore for Arc<S>
where
    S: LabelStore + ?Sized,
{
    fn get(&self, id: LabelId) -> DomainResult<Option<FoodLabel>> {
        (**self).get(id)
    }

    fn list(&self, query: &LabelQuery) -> DomainResult<LabelPage> {
        (**self).list(query)
    }

    fn create(&self, draft: LabelDraft, by: UserId, now: DateTime<Utc>) -> DomainResult<FoodLabel> {
        (**self).create(draft, by, now)
    }

    fn update(
        &self,
        id: LabelId,
        draft: LabelDraft,
        by: UserId,
        now: DateTime<Utc>,
    ) -> DomainResult<FoodLabel> {
        (**self).update(id, draft, by, now)
    }

    fn deactivate(&self, id: LabelId) -> DomainResult<()> {
        (**self).deactivate(id)
    }

    fn categories(&self) -> DomainResult<Vec<String>> {
        (**self).categories()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(name: &str) -> LabelDraft {
        LabelDraft {
            name: name.to_string(),
            description: "desc".to_string(),
            ..LabelDraft::default()
        }
    }

    #[test]
    fn draft_requires_name_and_description() {
        assert!(draft("Salt").validate().is_ok());
        assert!(matches!(draft("  ").validate(), Err(DomainError::Validation(_))));

        let mut d = draft("Salt");
        d.description.clear();
        assert!(d.validate().is_err());
    }

    #[test]
    fn draft_enforces_field_lengths() {
        let mut d = draft("Salt");
        d.color = Some("#ff00ff0".to_string());
        assert!(d.validate().is_err());

        let mut d = draft("Salt");
        d.translations.push(Translation {
            language_code: "ar-SA-extended".to_string(),
            name: "ملح".to_string(),
            description: "x".to_string(),
        });
        assert!(d.validate().is_err());
    }

    #[test]
    fn query_normalization_clamps_paging_and_drops_blank_filters() {
        let q = LabelQuery {
            category: Some("  ".to_string()),
            search: Some(String::new()),
            include_inactive: false,
            page: 0,
            page_size: 10_000,
        }
        .normalized();
        assert_eq!(q.page, 1);
        assert_eq!(q.page_size, MAX_PAGE_SIZE);
        assert_eq!(q.category, None);
        assert_eq!(q.search, None);
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(LabelPage::new(vec![], 0, 1, 10).total_pages, 0);
        assert_eq!(LabelPage::new(vec![], 10, 1, 10).total_pages, 1);
        assert_eq!(LabelPage::new(vec![], 11, 1, 10).total_pages, 2);
    }
}
