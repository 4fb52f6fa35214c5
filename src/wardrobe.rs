//! Composition root: builds the storage handle and write pool once and hands
//! them to repositories.

use std::sync::Arc;

use log::{info, warn};

use crate::app_response::AppResponse;
use crate::config::WardrobeConfig;
use crate::repository::ClothingRepository;
use crate::view_model::ClothingViewModel;
use crate::wardrobe_db::WardrobeDb;
use crate::write_pool::WritePool;

/// Owns the one database handle and write pool of a running app.
///
/// ```no_run
/// use wardrobe_core::{clothing_item::ClothingItem, vocabulary::ClothingType};
/// use wardrobe_core::{Wardrobe, WardrobeConfig};
///
/// let wardrobe = Wardrobe::open(WardrobeConfig::with_path("my_wardrobe"))?;
/// let vm = wardrobe.view_model()?;
///
/// let id = vm.insert(ClothingItem::new("Blue Jacket", ClothingType::Jacket, "blue"))?.wait()?;
/// vm.increment_wear_count(id).wait()?;
///
/// wardrobe.shutdown()?;
/// # Ok::<(), wardrobe_core::app_response::AppResponse>(())
/// ```
#[derive(Debug)]
pub struct Wardrobe {
    db: Arc<WardrobeDb>,
    pool: Arc<WritePool>,
}

impl Wardrobe {
    pub fn open(config: WardrobeConfig) -> Result<Self, AppResponse> {
        let db = Arc::new(WardrobeDb::open(&config)?);
        let pool = Arc::new(WritePool::new(config.worker_threads, Arc::clone(&db))?);
        info!("Wardrobe opened at {}", db.path().display());
        Ok(Wardrobe { db, pool })
    }

    pub fn db(&self) -> &Arc<WardrobeDb> {
        &self.db
    }

    pub fn repository(&self) -> Result<ClothingRepository, AppResponse> {
        ClothingRepository::new(Arc::clone(&self.db), Arc::clone(&self.pool))
    }

    pub fn view_model(&self) -> Result<ClothingViewModel, AppResponse> {
        Ok(ClothingViewModel::new(self.repository()?))
    }

    /// Finishes queued writes, then flushes and closes the database.
    /// Safe to call more than once.
    pub fn shutdown(&self) -> Result<(), AppResponse> {
        self.pool.shutdown();
        self.db.close_database()
    }
}

impl Drop for Wardrobe {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            warn!("Wardrobe shutdown on drop failed: {e}");
        }
    }
}
