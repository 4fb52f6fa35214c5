//! LMDB-backed clothing store.
//!
//! One environment directory holds two named databases:
//!
//! - `clothing_items`: big-endian `u64` id → JSON-encoded [`ClothingItem`]
//! - `meta`: bookkeeping, currently only the next id to assign
//!
//! Big-endian keys make a cursor walk return records in insertion order.
//! Every committed write is followed by a refresh of all live queries.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use lmdb::{Cursor, Database, DatabaseFlags, Environment, RwTransaction, Transaction, WriteFlags};
use log::{debug, info, warn};

use crate::app_response::AppResponse;
use crate::clothing_item::ClothingItem;
use crate::config::WardrobeConfig;
use crate::live_query::{ChangeHub, LiveQuery};
use crate::query::{self, CatalogStatistics, ClothingFilter};
use crate::vocabulary::{ClothingCategory, ClothingStatus, ClothingType, Season};

const ITEMS_DB: &str = "clothing_items";
const META_DB: &str = "meta";
const NEXT_ID_KEY: &[u8] = b"next_id";

type ItemsQuery = LiveQuery<Vec<ClothingItem>>;

pub struct WardrobeDb {
    env: Environment,
    items: Database,
    meta: Database,
    path: PathBuf,
    closed: AtomicBool,
    hub: Arc<ChangeHub>,
}

impl std::fmt::Debug for WardrobeDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WardrobeDb")
            .field("path", &self.path)
            .field("closed", &self.closed.load(Ordering::Acquire))
            .field("hub", &self.hub)
            .finish()
    }
}

fn item_key(id: u64) -> [u8; 8] {
    id.to_be_bytes()
}

fn load_item<T: Transaction>(
    txn: &T,
    db: Database,
    id: u64,
) -> Result<Option<ClothingItem>, AppResponse> {
    match txn.get(db, &item_key(id)) {
        Ok(bytes) => Ok(Some(serde_json::from_slice(bytes)?)),
        Err(lmdb::Error::NotFound) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

impl WardrobeDb {
    /// Opens (or creates) the environment described by `config`.
    pub fn open(config: &WardrobeConfig) -> Result<Self, AppResponse> {
        config.validate()?;
        let path = config.environment_dir();

        if path.exists() {
            info!("Opening existing wardrobe database at {}", path.display());
        } else {
            info!("Creating new wardrobe database at {}", path.display());
            std::fs::create_dir_all(&path)?;
        }

        let env = Environment::new()
            .set_max_dbs(2)
            .set_map_size(config.map_size)
            .open(&path)
            .map_err(|e| {
                warn!("Failed to open LMDB environment at {}: {e}", path.display());
                AppResponse::from(e)
            })?;
        let items = env.create_db(Some(ITEMS_DB), DatabaseFlags::empty())?;
        let meta = env.create_db(Some(META_DB), DatabaseFlags::empty())?;

        info!("✅ Wardrobe database ready");
        Ok(WardrobeDb {
            env,
            items,
            meta,
            path,
            closed: AtomicBool::new(false),
            hub: Arc::new(ChangeHub::default()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn ensure_open(&self) -> Result<(), AppResponse> {
        if self.is_closed() {
            return Err(AppResponse::DatabaseError("Database is closed".to_string()));
        }
        Ok(())
    }

    /// Runs `write` in one read-write transaction. When it reports a change
    /// the transaction is committed and live queries are refreshed; otherwise
    /// it is aborted.
    fn write<R>(
        &self,
        write: impl FnOnce(&mut RwTransaction<'_>) -> Result<(R, bool), AppResponse>,
    ) -> Result<R, AppResponse> {
        self.ensure_open()?;
        let mut txn = self.env.begin_rw_txn()?;
        let (result, changed) = write(&mut txn)?;
        if changed {
            txn.commit()?;
            self.hub.publish(|| self.read_all());
        } else {
            txn.abort();
        }
        Ok(result)
    }

    fn take_next_id(&self, txn: &mut RwTransaction<'_>) -> Result<u64, AppResponse> {
        let next = match txn.get(self.meta, &NEXT_ID_KEY) {
            Ok(bytes) => <[u8; 8]>::try_from(bytes)
                .map(u64::from_be_bytes)
                .map_err(|_| AppResponse::DatabaseError("Corrupted id counter".to_string()))?,
            Err(lmdb::Error::NotFound) => 1,
            Err(e) => return Err(e.into()),
        };
        txn.put(self.meta, &NEXT_ID_KEY, &(next + 1).to_be_bytes(), WriteFlags::empty())?;
        Ok(next)
    }

    fn put_item(&self, txn: &mut RwTransaction<'_>, item: &ClothingItem) -> Result<(), AppResponse> {
        let json = serde_json::to_vec(item)?;
        txn.put(self.items, &item_key(item.id), &json, WriteFlags::empty())?;
        Ok(())
    }

    /// Loads, mutates and stores one record. `Ok(false)` when `id` is absent.
    fn modify(&self, id: u64, change: impl FnOnce(&mut ClothingItem)) -> Result<bool, AppResponse> {
        self.write(|txn| match load_item(&*txn, self.items, id)? {
            Some(mut item) => {
                change(&mut item);
                self.put_item(txn, &item)?;
                Ok((true, true))
            }
            None => {
                debug!("No clothing item with id {id}; nothing updated");
                Ok((false, false))
            }
        })
    }

    // ---- reads -------------------------------------------------------------

    pub fn get_by_id(&self, id: u64) -> Result<Option<ClothingItem>, AppResponse> {
        self.ensure_open()?;
        let txn = self.env.begin_ro_txn()?;
        load_item(&txn, self.items, id)
    }

    /// Every record, in insertion order.
    pub fn read_all(&self) -> Result<Vec<ClothingItem>, AppResponse> {
        self.ensure_open()?;
        let txn = self.env.begin_ro_txn()?;
        let mut cursor = txn.open_ro_cursor(self.items)?;
        let mut items = Vec::new();
        for (_key, value) in cursor.iter() {
            items.push(serde_json::from_slice(value)?);
        }
        Ok(items)
    }

    // ---- writes ------------------------------------------------------------

    /// Stores `item` under a fresh id and returns that id. Any id already on
    /// `item` is ignored.
    pub fn insert(&self, mut item: ClothingItem) -> Result<u64, AppResponse> {
        let id = self.write(|txn| {
            item.id = self.take_next_id(txn)?;
            self.put_item(txn, &item)?;
            Ok((item.id, true))
        })?;
        debug!("Inserted clothing item {id} ({})", item.name);
        Ok(id)
    }

    /// Inserts all records in a single transaction.
    pub fn insert_all(&self, items: Vec<ClothingItem>) -> Result<Vec<u64>, AppResponse> {
        self.write(|txn| {
            let mut ids = Vec::with_capacity(items.len());
            for mut item in items {
                item.id = self.take_next_id(txn)?;
                self.put_item(txn, &item)?;
                ids.push(item.id);
            }
            let changed = !ids.is_empty();
            Ok((ids, changed))
        })
    }

    /// Replaces the stored record with the same id. `Ok(false)` when there is
    /// no such record.
    ///
    /// A wear count lower than the stored one is not applied: the stored
    /// count and last-worn date are kept. Only [`reset_wear_count`] lowers it.
    ///
    /// [`reset_wear_count`]: WardrobeDb::reset_wear_count
    pub fn update(&self, item: &ClothingItem) -> Result<bool, AppResponse> {
        self.write(|txn| {
            let Some(stored) = load_item(&*txn, self.items, item.id)? else {
                debug!("Update skipped: no clothing item with id {}", item.id);
                return Ok((false, false));
            };
            if item.wear_count < stored.wear_count {
                debug!(
                    "Update of item {} kept wear count {} over stale {}",
                    item.id, stored.wear_count, item.wear_count
                );
                let mut merged = item.clone();
                merged.wear_count = stored.wear_count;
                merged.last_worn_date = stored.last_worn_date;
                self.put_item(txn, &merged)?;
            } else {
                self.put_item(txn, item)?;
            }
            Ok((true, true))
        })
    }

    /// Deletes the stored record only if it equals `item` field for field.
    pub fn delete(&self, item: &ClothingItem) -> Result<bool, AppResponse> {
        self.write(|txn| match load_item(&*txn, self.items, item.id)? {
            Some(stored) if stored == *item => {
                txn.del(self.items, &item_key(item.id), None)?;
                Ok((true, true))
            }
            _ => Ok((false, false)),
        })
    }

    pub fn delete_by_id(&self, id: u64) -> Result<bool, AppResponse> {
        self.write(|txn| match txn.del(self.items, &item_key(id), None) {
            Ok(()) => Ok((true, true)),
            Err(lmdb::Error::NotFound) => Ok((false, false)),
            Err(e) => Err(e.into()),
        })
    }

    /// Removes every record. Ids are not reused afterwards.
    pub fn delete_all(&self) -> Result<(), AppResponse> {
        self.write(|txn| {
            txn.clear_db(self.items)?;
            Ok(((), true))
        })?;
        info!("All clothing items cleared");
        Ok(())
    }

    /// Adds one wear and stamps `worn_at` in the same transaction.
    pub fn increment_wear_count(&self, id: u64, worn_at: DateTime<Utc>) -> Result<bool, AppResponse> {
        self.modify(id, |item| item.mark_worn(worn_at))
    }

    /// The only way a wear count goes down.
    pub fn reset_wear_count(&self, id: u64) -> Result<bool, AppResponse> {
        self.modify(id, |item| {
            item.wear_count = 0;
            item.last_worn_date = None;
        })
    }

    pub fn set_favorite(&self, id: u64, is_favorite: bool) -> Result<bool, AppResponse> {
        self.modify(id, |item| item.is_favorite = is_favorite)
    }

    pub fn set_status(&self, id: u64, status: ClothingStatus) -> Result<bool, AppResponse> {
        self.modify(id, |item| item.status = status)
    }

    pub fn set_rating(&self, id: u64, rating: u8) -> Result<bool, AppResponse> {
        self.modify(id, |item| item.rating = rating)
    }

    // ---- live queries ------------------------------------------------------

    /// Subscribes to any value derived from the whole catalog.
    pub fn observe<T, F>(&self, derive: F) -> Result<LiveQuery<T>, AppResponse>
    where
        T: Clone + PartialEq + Send + 'static,
        F: Fn(&[ClothingItem]) -> T + Send + 'static,
    {
        self.ensure_open()?;
        ChangeHub::subscribe(&self.hub, || self.read_all(), derive)
    }

    pub fn live_query_count(&self) -> usize {
        self.hub.subscriber_count()
    }

    pub fn observe_by_id(&self, id: u64) -> Result<LiveQuery<Option<ClothingItem>>, AppResponse> {
        self.observe(move |items| items.iter().find(|item| item.id == id).cloned())
    }

    pub fn observe_all(&self) -> Result<ItemsQuery, AppResponse> {
        self.observe(query::all_by_name)
    }

    pub fn observe_search(&self, search: &str) -> Result<ItemsQuery, AppResponse> {
        let search = search.to_string();
        self.observe(move |items| query::search(items, &search))
    }

    pub fn observe_by_type(&self, clothing_type: ClothingType) -> Result<ItemsQuery, AppResponse> {
        self.observe(move |items| query::by_type(items, clothing_type))
    }

    pub fn observe_by_category(&self, category: ClothingCategory) -> Result<ItemsQuery, AppResponse> {
        self.observe(move |items| query::by_category(items, category))
    }

    pub fn observe_by_color(&self, color: &str) -> Result<ItemsQuery, AppResponse> {
        let color = color.to_string();
        self.observe(move |items| query::by_color(items, &color))
    }

    pub fn observe_by_season(&self, season: Season) -> Result<ItemsQuery, AppResponse> {
        self.observe(move |items| query::by_season(items, season))
    }

    pub fn observe_by_status(&self, status: ClothingStatus) -> Result<ItemsQuery, AppResponse> {
        self.observe(move |items| query::by_status(items, status))
    }

    pub fn observe_favorites(&self) -> Result<ItemsQuery, AppResponse> {
        self.observe(query::favorites)
    }

    pub fn observe_recently_worn(&self, limit: usize) -> Result<ItemsQuery, AppResponse> {
        self.observe(move |items| query::recently_worn(items, limit))
    }

    pub fn observe_most_worn(&self, limit: usize) -> Result<ItemsQuery, AppResponse> {
        self.observe(move |items| query::most_worn(items, limit))
    }

    pub fn observe_least_worn(&self, max_wear_count: u32) -> Result<ItemsQuery, AppResponse> {
        self.observe(move |items| query::least_worn(items, max_wear_count))
    }

    pub fn observe_filtered(&self, filter: ClothingFilter) -> Result<ItemsQuery, AppResponse> {
        self.observe(move |items| query::filtered(items, &filter))
    }

    pub fn observe_total_count(&self) -> Result<LiveQuery<usize>, AppResponse> {
        self.observe(|items| items.len())
    }

    pub fn observe_count_by_type(&self, clothing_type: ClothingType) -> Result<LiveQuery<usize>, AppResponse> {
        self.observe(move |items| query::count_by_type(items, clothing_type))
    }

    pub fn observe_count_by_status(&self, status: ClothingStatus) -> Result<LiveQuery<usize>, AppResponse> {
        self.observe(move |items| query::count_by_status(items, status))
    }

    pub fn observe_average_wear_count(&self) -> Result<LiveQuery<Option<f64>>, AppResponse> {
        self.observe(query::average_wear_count)
    }

    pub fn observe_total_value(&self) -> Result<LiveQuery<f64>, AppResponse> {
        self.observe(query::total_value)
    }

    pub fn observe_statistics(&self) -> Result<LiveQuery<CatalogStatistics>, AppResponse> {
        self.observe(query::statistics)
    }

    pub fn observe_all_colors(&self) -> Result<LiveQuery<Vec<String>>, AppResponse> {
        self.observe(query::all_colors)
    }

    pub fn observe_all_brands(&self) -> Result<LiveQuery<Vec<String>>, AppResponse> {
        self.observe(query::all_brands)
    }

    pub fn observe_all_materials(&self) -> Result<LiveQuery<Vec<String>>, AppResponse> {
        self.observe(query::all_materials)
    }

    // ---- lifecycle ---------------------------------------------------------

    /// Flushes to disk and refuses further operations. The environment itself
    /// is released when the last handle is dropped.
    pub fn close_database(&self) -> Result<(), AppResponse> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        self.hub.close();
        self.env.sync(true)?;
        info!("Wardrobe database at {} closed", self.path.display());
        Ok(())
    }
}
