//! UI-facing facade over [`ClothingRepository`].
//!
//! Screens talk to this type only. It forwards every call unchanged so that
//! screen lifetimes stay decoupled from the storage handle.

use crate::app_response::AppResponse;
use crate::clothing_item::ClothingItem;
use crate::live_query::LiveQuery;
use crate::query::{CatalogStatistics, ClothingFilter};
use crate::repository::ClothingRepository;
use crate::vocabulary::{ClothingCategory, ClothingStatus, ClothingType, Season};
use crate::write_pool::PendingWrite;

type Items = LiveQuery<Vec<ClothingItem>>;
type Outcome<T> = Result<T, AppResponse>;

#[derive(Debug)]
pub struct ClothingViewModel {
    repository: ClothingRepository,
}

impl ClothingViewModel {
    pub fn new(repository: ClothingRepository) -> Self {
        ClothingViewModel { repository }
    }

    pub fn all_clothing(&self) -> &Items {
        self.repository.all_clothing()
    }

    pub fn clothing_by_id(&self, id: u64) -> Outcome<LiveQuery<Option<ClothingItem>>> {
        self.repository.clothing_by_id(id)
    }

    pub fn search_clothing(&self, query: &str) -> Outcome<Items> {
        self.repository.search_clothing(query)
    }

    pub fn clothing_by_type(&self, clothing_type: ClothingType) -> Outcome<Items> {
        self.repository.clothing_by_type(clothing_type)
    }

    pub fn clothing_by_category(&self, category: ClothingCategory) -> Outcome<Items> {
        self.repository.clothing_by_category(category)
    }

    pub fn clothing_by_season(&self, season: Season) -> Outcome<Items> {
        self.repository.clothing_by_season(season)
    }

    pub fn clothing_by_color(&self, color: &str) -> Outcome<Items> {
        self.repository.clothing_by_color(color)
    }

    pub fn clothing_by_status(&self, status: ClothingStatus) -> Outcome<Items> {
        self.repository.clothing_by_status(status)
    }

    pub fn favorite_clothing(&self) -> Outcome<Items> {
        self.repository.favorite_clothing()
    }

    pub fn recently_worn_clothing(&self, limit: usize) -> Outcome<Items> {
        self.repository.recently_worn_clothing(limit)
    }

    pub fn most_worn_clothing(&self, limit: usize) -> Outcome<Items> {
        self.repository.most_worn_clothing(limit)
    }

    pub fn least_worn_clothing(&self, max_wear_count: u32) -> Outcome<Items> {
        self.repository.least_worn_clothing(max_wear_count)
    }

    pub fn filtered_clothing(&self, filter: ClothingFilter) -> Outcome<Items> {
        self.repository.filtered_clothing(filter)
    }

    pub fn total_count(&self) -> Outcome<LiveQuery<usize>> {
        self.repository.total_count()
    }

    pub fn count_by_type(&self, clothing_type: ClothingType) -> Outcome<LiveQuery<usize>> {
        self.repository.count_by_type(clothing_type)
    }

    pub fn count_by_status(&self, status: ClothingStatus) -> Outcome<LiveQuery<usize>> {
        self.repository.count_by_status(status)
    }

    pub fn average_wear_count(&self) -> Outcome<LiveQuery<Option<f64>>> {
        self.repository.average_wear_count()
    }

    pub fn total_value(&self) -> Outcome<LiveQuery<f64>> {
        self.repository.total_value()
    }

    pub fn statistics(&self) -> Outcome<LiveQuery<CatalogStatistics>> {
        self.repository.statistics()
    }

    pub fn all_colors(&self) -> Outcome<LiveQuery<Vec<String>>> {
        self.repository.all_colors()
    }

    pub fn all_brands(&self) -> Outcome<LiveQuery<Vec<String>>> {
        self.repository.all_brands()
    }

    pub fn all_materials(&self) -> Outcome<LiveQuery<Vec<String>>> {
        self.repository.all_materials()
    }

    pub fn insert(&self, item: ClothingItem) -> Outcome<PendingWrite<u64>> {
        self.repository.insert_clothing(item)
    }

    pub fn insert_all(&self, items: Vec<ClothingItem>) -> Outcome<PendingWrite<Vec<u64>>> {
        self.repository.insert_all_clothing(items)
    }

    pub fn update(&self, item: ClothingItem) -> Outcome<PendingWrite<bool>> {
        self.repository.update_clothing(item)
    }

    pub fn delete(&self, item: ClothingItem) -> PendingWrite<bool> {
        self.repository.delete_clothing(item)
    }

    pub fn delete_by_id(&self, id: u64) -> PendingWrite<bool> {
        self.repository.delete_clothing_by_id(id)
    }

    pub fn delete_all(&self) -> PendingWrite<()> {
        self.repository.delete_all_clothing()
    }

    pub fn increment_wear_count(&self, id: u64) -> PendingWrite<bool> {
        self.repository.increment_wear_count(id)
    }

    pub fn reset_wear_count(&self, id: u64) -> PendingWrite<bool> {
        self.repository.reset_wear_count(id)
    }

    pub fn update_favorite_status(&self, id: u64, is_favorite: bool) -> PendingWrite<bool> {
        self.repository.update_favorite_status(id, is_favorite)
    }

    pub fn update_status(&self, id: u64, status: ClothingStatus) -> PendingWrite<bool> {
        self.repository.update_status(id, status)
    }

    pub fn update_rating(&self, id: u64, rating: u8) -> Outcome<PendingWrite<bool>> {
        self.repository.update_rating(id, rating)
    }
}
