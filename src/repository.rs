//! Data access entry point for the view-model.
//!
//! Reads are forwarded to [`WardrobeDb`] as live queries. Writes are checked
//! here on the caller's thread, then queued on the [`WritePool`]; the caller
//! gets a [`PendingWrite`] back straight away.

use std::sync::Arc;

use chrono::Utc;

use crate::app_response::AppResponse;
use crate::clothing_item::{validate_rating, ClothingItem};
use crate::live_query::LiveQuery;
use crate::query::{CatalogStatistics, ClothingFilter};
use crate::vocabulary::{ClothingCategory, ClothingStatus, ClothingType, Season};
use crate::wardrobe_db::WardrobeDb;
use crate::write_pool::{PendingWrite, WritePool};

type Items = LiveQuery<Vec<ClothingItem>>;
type Outcome<T> = Result<T, AppResponse>;

#[derive(Debug)]
pub struct ClothingRepository {
    db: Arc<WardrobeDb>,
    pool: Arc<WritePool>,
    all_clothing: Items,
}

impl ClothingRepository {
    pub fn new(db: Arc<WardrobeDb>, pool: Arc<WritePool>) -> Outcome<Self> {
        let all_clothing = db.observe_all()?;
        Ok(ClothingRepository {
            db,
            pool,
            all_clothing,
        })
    }

    /// Long-lived subscription to the whole catalog, ordered by name.
    pub fn all_clothing(&self) -> &Items {
        &self.all_clothing
    }

    pub fn clothing_by_id(&self, id: u64) -> Outcome<LiveQuery<Option<ClothingItem>>> {
        self.db.observe_by_id(id)
    }

    pub fn search_clothing(&self, query: &str) -> Outcome<Items> {
        self.db.observe_search(query)
    }

    pub fn clothing_by_type(&self, clothing_type: ClothingType) -> Outcome<Items> {
        self.db.observe_by_type(clothing_type)
    }

    pub fn clothing_by_category(&self, category: ClothingCategory) -> Outcome<Items> {
        self.db.observe_by_category(category)
    }

    pub fn clothing_by_season(&self, season: Season) -> Outcome<Items> {
        self.db.observe_by_season(season)
    }

    pub fn clothing_by_color(&self, color: &str) -> Outcome<Items> {
        self.db.observe_by_color(color)
    }

    pub fn clothing_by_status(&self, status: ClothingStatus) -> Outcome<Items> {
        self.db.observe_by_status(status)
    }

    pub fn favorite_clothing(&self) -> Outcome<Items> {
        self.db.observe_favorites()
    }

    pub fn recently_worn_clothing(&self, limit: usize) -> Outcome<Items> {
        self.db.observe_recently_worn(limit)
    }

    pub fn most_worn_clothing(&self, limit: usize) -> Outcome<Items> {
        self.db.observe_most_worn(limit)
    }

    pub fn least_worn_clothing(&self, max_wear_count: u32) -> Outcome<Items> {
        self.db.observe_least_worn(max_wear_count)
    }

    pub fn filtered_clothing(&self, filter: ClothingFilter) -> Outcome<Items> {
        self.db.observe_filtered(filter)
    }

    pub fn total_count(&self) -> Outcome<LiveQuery<usize>> {
        self.db.observe_total_count()
    }

    pub fn count_by_type(&self, clothing_type: ClothingType) -> Outcome<LiveQuery<usize>> {
        self.db.observe_count_by_type(clothing_type)
    }

    pub fn count_by_status(&self, status: ClothingStatus) -> Outcome<LiveQuery<usize>> {
        self.db.observe_count_by_status(status)
    }

    pub fn average_wear_count(&self) -> Outcome<LiveQuery<Option<f64>>> {
        self.db.observe_average_wear_count()
    }

    pub fn total_value(&self) -> Outcome<LiveQuery<f64>> {
        self.db.observe_total_value()
    }

    pub fn statistics(&self) -> Outcome<LiveQuery<CatalogStatistics>> {
        self.db.observe_statistics()
    }

    pub fn all_colors(&self) -> Outcome<LiveQuery<Vec<String>>> {
        self.db.observe_all_colors()
    }

    pub fn all_brands(&self) -> Outcome<LiveQuery<Vec<String>>> {
        self.db.observe_all_brands()
    }

    pub fn all_materials(&self) -> Outcome<LiveQuery<Vec<String>>> {
        self.db.observe_all_materials()
    }

    // Writes. Validation failures are returned here and never queued.

    pub fn insert_clothing(&self, item: ClothingItem) -> Outcome<PendingWrite<u64>> {
        item.validate()?;
        Ok(self.pool.submit(move |db| db.insert(item)))
    }

    pub fn insert_all_clothing(&self, items: Vec<ClothingItem>) -> Outcome<PendingWrite<Vec<u64>>> {
        items.iter().try_for_each(ClothingItem::validate)?;
        Ok(self.pool.submit(move |db| db.insert_all(items)))
    }

    /// Resolves to `false` when no record has `item.id`.
    pub fn update_clothing(&self, item: ClothingItem) -> Outcome<PendingWrite<bool>> {
        item.validate()?;
        Ok(self.pool.submit(move |db| db.update(&item)))
    }

    pub fn delete_clothing(&self, item: ClothingItem) -> PendingWrite<bool> {
        self.pool.submit(move |db| db.delete(&item))
    }

    pub fn delete_clothing_by_id(&self, id: u64) -> PendingWrite<bool> {
        self.pool.submit(move |db| db.delete_by_id(id))
    }

    pub fn delete_all_clothing(&self) -> PendingWrite<()> {
        self.pool.submit(|db| db.delete_all())
    }

    /// The wear is stamped with the time the worker runs the write.
    pub fn increment_wear_count(&self, id: u64) -> PendingWrite<bool> {
        self.pool
            .submit(move |db| db.increment_wear_count(id, Utc::now()))
    }

    pub fn reset_wear_count(&self, id: u64) -> PendingWrite<bool> {
        self.pool.submit(move |db| db.reset_wear_count(id))
    }

    pub fn update_favorite_status(&self, id: u64, is_favorite: bool) -> PendingWrite<bool> {
        self.pool.submit(move |db| db.set_favorite(id, is_favorite))
    }

    pub fn update_status(&self, id: u64, status: ClothingStatus) -> PendingWrite<bool> {
        self.pool.submit(move |db| db.set_status(id, status))
    }

    pub fn update_rating(&self, id: u64, rating: u8) -> Outcome<PendingWrite<bool>> {
        validate_rating(rating)?;
        Ok(self.pool.submit(move |db| db.set_rating(id, rating)))
    }
}
