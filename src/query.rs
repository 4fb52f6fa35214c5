//! Filters, orderings and aggregates over a snapshot of the catalog.
//!
//! Everything here is a pure function of `&[ClothingItem]`; [`WardrobeDb`]
//! loads the snapshot and live queries re-run these functions after each
//! committed write.
//!
//! [`WardrobeDb`]: crate::wardrobe_db::WardrobeDb

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::clothing_item::ClothingItem;
use crate::vocabulary::{ClothingCategory, ClothingStatus, ClothingType, Season};

/// Combined filter. Each `None` dimension matches everything; supplied
/// dimensions are ANDed.
///
/// ```rust
/// use wardrobe_core::query::ClothingFilter;
/// use wardrobe_core::vocabulary::{ClothingStatus, ClothingType};
///
/// let filter = ClothingFilter::default()
///     .clothing_type(ClothingType::Jeans)
///     .status(ClothingStatus::Available);
/// assert!(!filter.is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClothingFilter {
    #[serde(rename = "type")]
    pub clothing_type: Option<ClothingType>,
    pub color: Option<String>,
    pub season: Option<Season>,
    pub status: Option<ClothingStatus>,
    pub is_favorite: Option<bool>,
}

impl ClothingFilter {
    pub fn clothing_type(mut self, clothing_type: ClothingType) -> Self {
        self.clothing_type = Some(clothing_type);
        self
    }

    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn season(mut self, season: Season) -> Self {
        self.season = Some(season);
        self
    }

    pub fn status(mut self, status: ClothingStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn favorite(mut self, is_favorite: bool) -> Self {
        self.is_favorite = Some(is_favorite);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.clothing_type.is_none()
            && self.color.is_none()
            && self.season.is_none()
            && self.status.is_none()
            && self.is_favorite.is_none()
    }

    pub fn matches(&self, item: &ClothingItem) -> bool {
        self.clothing_type.map_or(true, |t| item.clothing_type == t)
            && self.color.as_deref().map_or(true, |c| item.has_color(c))
            && self.season.map_or(true, |s| item.is_suitable_for_season(s))
            && self.status.map_or(true, |s| item.status == s)
            && self.is_favorite.map_or(true, |f| item.is_favorite == f)
    }
}

/// Aggregate numbers shown on the statistics screen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogStatistics {
    pub total_count: usize,
    /// `None` when the catalog is empty.
    pub average_wear_count: Option<f64>,
    pub total_value: f64,
    pub count_by_type: BTreeMap<ClothingType, usize>,
    pub count_by_status: BTreeMap<ClothingStatus, usize>,
}

/// Name, byte-wise ascending, ties broken by id.
fn by_name(a: &ClothingItem, b: &ClothingItem) -> Ordering {
    a.name.cmp(&b.name).then(a.id.cmp(&b.id))
}

fn select(items: &[ClothingItem], keep: impl Fn(&ClothingItem) -> bool) -> Vec<ClothingItem> {
    let mut out: Vec<ClothingItem> = items.iter().filter(|i| keep(i)).cloned().collect();
    out.sort_by(by_name);
    out
}

pub fn all_by_name(items: &[ClothingItem]) -> Vec<ClothingItem> {
    select(items, |_| true)
}

/// Case-insensitive substring search over name and description. Results keep
/// storage order, which is insertion order.
pub fn search(items: &[ClothingItem], query: &str) -> Vec<ClothingItem> {
    let needle = query.to_lowercase();
    items
        .iter()
        .filter(|i| i.matches_search(&needle))
        .cloned()
        .collect()
}

pub fn by_type(items: &[ClothingItem], clothing_type: ClothingType) -> Vec<ClothingItem> {
    select(items, |i| i.clothing_type == clothing_type)
}

pub fn by_category(items: &[ClothingItem], category: ClothingCategory) -> Vec<ClothingItem> {
    select(items, |i| i.category() == category)
}

pub fn by_color(items: &[ClothingItem], color: &str) -> Vec<ClothingItem> {
    select(items, |i| i.has_color(color))
}

pub fn by_season(items: &[ClothingItem], season: Season) -> Vec<ClothingItem> {
    select(items, |i| i.is_suitable_for_season(season))
}

pub fn by_status(items: &[ClothingItem], status: ClothingStatus) -> Vec<ClothingItem> {
    select(items, |i| i.status == status)
}

pub fn favorites(items: &[ClothingItem]) -> Vec<ClothingItem> {
    select(items, |i| i.is_favorite)
}

pub fn filtered(items: &[ClothingItem], filter: &ClothingFilter) -> Vec<ClothingItem> {
    if filter.is_empty() {
        return all_by_name(items);
    }
    select(items, |i| filter.matches(i))
}

/// Items worn at least once, most worn first, at most `limit`.
pub fn most_worn(items: &[ClothingItem], limit: usize) -> Vec<ClothingItem> {
    let mut worn: Vec<ClothingItem> = items.iter().filter(|i| i.wear_count > 0).cloned().collect();
    worn.sort_by(|a, b| b.wear_count.cmp(&a.wear_count).then(a.id.cmp(&b.id)));
    worn.truncate(limit);
    worn
}

/// Items worn at most `max_wear_count` times, least worn first, then oldest
/// purchase first.
pub fn least_worn(items: &[ClothingItem], max_wear_count: u32) -> Vec<ClothingItem> {
    let mut rare: Vec<ClothingItem> = items
        .iter()
        .filter(|i| i.wear_count <= max_wear_count)
        .cloned()
        .collect();
    rare.sort_by(|a, b| {
        a.wear_count
            .cmp(&b.wear_count)
            .then(a.purchase_date.cmp(&b.purchase_date))
            .then(a.id.cmp(&b.id))
    });
    rare
}

/// Items with a last-worn date, most recent first, at most `limit`.
pub fn recently_worn(items: &[ClothingItem], limit: usize) -> Vec<ClothingItem> {
    let mut worn: Vec<ClothingItem> = items
        .iter()
        .filter(|i| i.last_worn_date.is_some())
        .cloned()
        .collect();
    worn.sort_by(|a, b| b.last_worn_date.cmp(&a.last_worn_date).then(a.id.cmp(&b.id)));
    worn.truncate(limit);
    worn
}

pub fn count_by_type(items: &[ClothingItem], clothing_type: ClothingType) -> usize {
    items.iter().filter(|i| i.clothing_type == clothing_type).count()
}

pub fn count_by_status(items: &[ClothingItem], status: ClothingStatus) -> usize {
    items.iter().filter(|i| i.status == status).count()
}

pub fn average_wear_count(items: &[ClothingItem]) -> Option<f64> {
    if items.is_empty() {
        return None;
    }
    let total: u64 = items.iter().map(|i| u64::from(i.wear_count)).sum();
    Some(total as f64 / items.len() as f64)
}

/// Sum of all positive prices.
pub fn total_value(items: &[ClothingItem]) -> f64 {
    items.iter().map(|i| i.price).filter(|p| *p > 0.0).sum()
}

pub fn statistics(items: &[ClothingItem]) -> CatalogStatistics {
    let mut stats = CatalogStatistics {
        total_count: items.len(),
        average_wear_count: average_wear_count(items),
        total_value: total_value(items),
        ..Default::default()
    };
    for item in items {
        *stats.count_by_type.entry(item.clothing_type).or_insert(0) += 1;
        *stats.count_by_status.entry(item.status).or_insert(0) += 1;
    }
    stats
}

fn distinct(values: impl Iterator<Item = String>) -> Vec<String> {
    values
        .filter(|v| !v.is_empty())
        .collect::<BTreeSet<String>>()
        .into_iter()
        .collect()
}

/// Distinct non-empty primary colours, sorted.
pub fn all_colors(items: &[ClothingItem]) -> Vec<String> {
    distinct(items.iter().map(|i| i.color.clone()))
}

pub fn all_brands(items: &[ClothingItem]) -> Vec<String> {
    distinct(items.iter().filter_map(|i| i.brand.clone()))
}

pub fn all_materials(items: &[ClothingItem]) -> Vec<String> {
    distinct(items.iter().filter_map(|i| i.material.clone()))
}
