//! Category filtering over an already-fetched story list.

use std::str::FromStr;

use serde::Serialize;

use crate::errors::DomainError;
use crate::models::{Story, StoryCategory};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(StoryCategory),
}

impl CategoryFilter {
    pub fn matches(&self, story: &Story) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(category) => story.category == *category,
        }
    }

    pub fn selected(&self) -> Option<StoryCategory> {
        match self {
            CategoryFilter::All => None,
            CategoryFilter::Only(category) => Some(*category),
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "all" | "All" => Ok(CategoryFilter::All),
            other => other.parse().map(CategoryFilter::Only),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCount {
    pub category: StoryCategory,
    pub label: &'static str,
    pub emoji: &'static str,
    pub count: usize,
}

/// One filtered page of the browse view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    pub selected: Option<StoryCategory>,
    pub total: usize,
    pub counts: Vec<CategoryCount>,
    pub stories: Vec<Story>,
}

impl Catalog {
    /// Counts are always over the full list, never the filtered one.
    pub fn build(stories: Vec<Story>, filter: CategoryFilter) -> Self {
        let counts = category_counts(&stories);
        let total = stories.len();
        let stories = stories.into_iter().filter(|s| filter.matches(s)).collect();
        Self {
            selected: filter.selected(),
            total,
            counts,
            stories,
        }
    }
}

/// Counts for all ten categories in display order, zeros included.
pub fn category_counts(stories: &[Story]) -> Vec<CategoryCount> {
    StoryCategory::ALL
        .into_iter()
        .map(|category| CategoryCount {
            category,
            label: category.label(),
            emoji: category.emoji(),
            count: stories.iter().filter(|s| s.category == category).count(),
        })
        .collect()
}
