//! # Test Suite for Wardrobe Core
//!
//! Unit tests for the vocabulary, record, query and config modules live next
//! to their code. This module covers everything that needs a real LMDB
//! environment.
//!
//! ## Test Categories
//!
//! ### 1. Storage Tests
//! - CRUD on [`WardrobeDb`], id assignment, single-field writes
//! - Reopening an existing environment
//!
//! ### 2. Live Query Tests
//! - Initial snapshot, push on change, no push when the result is unchanged
//! - Unsubscribe on drop, disconnect on close
//!
//! ### 3. Write Pool and View-Model Tests
//! - Completion handles, synchronous validation, failure reporting
//! - Concurrent writers, shutdown draining queued work
//!
//! ### 4. FFI Function Tests
//! - Every `extern "C"` function, success and error paths
//!
//! ## Running the Tests
//!
//! ```bash
//! cargo test
//! cargo test test_live_     # live query tests
//! cargo test test_ffi_      # FFI tests
//! ```
//!
//! Every test opens its own environment inside a [`tempfile::TempDir`], so
//! tests can run in parallel and leave nothing behind.

#[cfg(test)]
pub mod tests {
    use std::ffi::{CStr, CString};
    use std::os::raw::c_char;
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::{TimeZone, Utc};
    use log::info;
    use tempfile::TempDir;

    use crate::app_response::AppResponse;
    use crate::clothing_item::ClothingItem;
    use crate::config::WardrobeConfig;
    use crate::query::{CatalogStatistics, ClothingFilter};
    use crate::vocabulary::{ClothingCategory, ClothingStatus, ClothingType, Occasion, Season};
    use crate::wardrobe::Wardrobe;
    use crate::wardrobe_db::WardrobeDb;
    use crate::write_pool::WritePool;
    use crate::*;

    const WAIT: Duration = Duration::from_secs(5);

    fn temp_config(dir: &TempDir) -> WardrobeConfig {
        WardrobeConfig {
            db_path: dir.path().join("wardrobe"),
            map_size: 16 * 1024 * 1024,
            worker_threads: 4,
        }
    }

    fn open_db(dir: &TempDir) -> WardrobeDb {
        WardrobeDb::open(&temp_config(dir)).expect("open test database")
    }

    fn open_wardrobe(dir: &TempDir) -> Wardrobe {
        Wardrobe::open(temp_config(dir)).expect("open test wardrobe")
    }

    fn red_coat() -> ClothingItem {
        let mut coat = ClothingItem::new("Red Coat", ClothingType::Coat, "红色");
        coat.seasons = vec![Season::Winter];
        coat.occasions = vec![Occasion::Work, Occasion::Formal];
        coat.brand = Some("Uniqlo".to_string());
        coat.price = 399.0;
        coat.tags = vec!["warm".to_string(), "gift".to_string()];
        coat
    }

    fn jeans(name: &str, status: ClothingStatus) -> ClothingItem {
        let mut item = ClothingItem::new(name, ClothingType::Jeans, "blue");
        item.status = status;
        item.seasons = vec![Season::Spring, Season::Autumn];
        item
    }

    fn names(items: &[ClothingItem]) -> Vec<&str> {
        items.iter().map(|i| i.name.as_str()).collect()
    }

    // ---- 1. Storage ---------------------------------------------------------

    #[test]
    fn test_insert_then_get_returns_equal_record() {
        let dir = TempDir::new().unwrap();
        let db = open_db(&dir);

        let mut coat = red_coat();
        coat.description = Some("Long wool coat".to_string());
        coat.image_path = Some("/data/images/coat.jpg".to_string());
        coat.colors = vec!["black".to_string()];
        coat.material = Some("wool".to_string());
        coat.size = Some("M".to_string());
        coat.style = Some("classic".to_string());
        coat.location = Some("hall closet".to_string());
        coat.rating = 4;

        let id = db.insert(coat.clone()).unwrap();
        let stored = db.get_by_id(id).unwrap().expect("record exists");

        coat.id = id;
        assert_eq!(stored, coat);
    }

    #[test]
    fn test_ids_are_monotonic_and_never_reused() {
        let dir = TempDir::new().unwrap();
        let db = open_db(&dir);

        let first = db.insert(red_coat()).unwrap();
        let second = db.insert(jeans("A", ClothingStatus::Available)).unwrap();
        assert!(second > first);

        assert!(db.delete_by_id(second).unwrap());
        db.delete_all().unwrap();
        let third = db.insert(red_coat()).unwrap();
        assert!(third > second);
    }

    #[test]
    fn test_insert_ignores_caller_supplied_id() {
        let dir = TempDir::new().unwrap();
        let db = open_db(&dir);
        let mut coat = red_coat();
        coat.id = 999;
        let id = db.insert(coat).unwrap();
        assert_eq!(id, 1);
        assert!(db.get_by_id(999).unwrap().is_none());
    }

    #[test]
    fn test_insert_all_in_one_transaction() {
        let dir = TempDir::new().unwrap();
        let db = open_db(&dir);
        let ids = db
            .insert_all(vec![
                jeans("A", ClothingStatus::Available),
                jeans("B", ClothingStatus::Dirty),
                red_coat(),
            ])
            .unwrap();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(db.read_all().unwrap().len(), 3);
        assert!(db.insert_all(Vec::new()).unwrap().is_empty());
    }

    #[test]
    fn test_increment_wear_count_n_times() {
        let dir = TempDir::new().unwrap();
        let db = open_db(&dir);
        let id = db.insert(red_coat()).unwrap();

        let mut last = None;
        for day in 1..=5 {
            let worn_at = Utc.with_ymd_and_hms(2024, 1, day, 9, 30, 0).unwrap();
            assert!(db.increment_wear_count(id, worn_at).unwrap());
            last = Some(worn_at);
        }

        let item = db.get_by_id(id).unwrap().unwrap();
        assert_eq!(item.wear_count, 5);
        assert_eq!(item.last_worn_date, last);

        assert!(db.reset_wear_count(id).unwrap());
        let item = db.get_by_id(id).unwrap().unwrap();
        assert_eq!(item.wear_count, 0);
        assert!(item.last_worn_date.is_none());
    }

    #[test]
    fn test_single_field_updates() {
        let dir = TempDir::new().unwrap();
        let db = open_db(&dir);
        let id = db.insert(red_coat()).unwrap();

        assert!(db.set_favorite(id, true).unwrap());
        assert!(db.set_status(id, ClothingStatus::Washing).unwrap());
        assert!(db.set_rating(id, 3).unwrap());

        let item = db.get_by_id(id).unwrap().unwrap();
        assert!(item.is_favorite);
        assert_eq!(item.status, ClothingStatus::Washing);
        assert!(item.status.is_in_process());
        assert_eq!(item.rating, 3);
        assert_eq!(item.name, "Red Coat");
    }

    #[test]
    fn test_writes_on_missing_id_report_false() {
        let dir = TempDir::new().unwrap();
        let db = open_db(&dir);

        let mut ghost = red_coat();
        ghost.id = 42;
        assert!(!db.update(&ghost).unwrap());
        assert!(!db.delete_by_id(42).unwrap());
        assert!(!db.delete(&ghost).unwrap());
        assert!(!db.increment_wear_count(42, Utc::now()).unwrap());
        assert!(!db.set_favorite(42, true).unwrap());
        assert!(!db.set_status(42, ClothingStatus::Lost).unwrap());
        assert!(!db.set_rating(42, 1).unwrap());
        assert!(db.read_all().unwrap().is_empty());
    }

    #[test]
    fn test_update_replaces_every_field() {
        let dir = TempDir::new().unwrap();
        let db = open_db(&dir);
        let id = db.insert(red_coat()).unwrap();

        let mut edited = db.get_by_id(id).unwrap().unwrap();
        edited.name = "Burgundy Coat".to_string();
        edited.clothing_type = ClothingType::Blazer;
        edited.seasons = vec![Season::Autumn, Season::Winter];
        edited.tags.clear();
        assert!(db.update(&edited).unwrap());

        assert_eq!(db.get_by_id(id).unwrap().unwrap(), edited);
    }

    #[test]
    fn test_update_with_stale_copy_keeps_wear_history() {
        let dir = TempDir::new().unwrap();
        let db = open_db(&dir);
        let id = db.insert(red_coat()).unwrap();
        let stale = db.get_by_id(id).unwrap().unwrap();

        let worn_at = Utc.with_ymd_and_hms(2024, 2, 3, 8, 0, 0).unwrap();
        for _ in 0..3 {
            db.increment_wear_count(id, worn_at).unwrap();
        }

        let mut edited = stale;
        edited.name = "Renamed Coat".to_string();
        assert!(db.update(&edited).unwrap());

        let stored = db.get_by_id(id).unwrap().unwrap();
        assert_eq!(stored.name, "Renamed Coat");
        assert_eq!(stored.wear_count, 3);
        assert_eq!(stored.last_worn_date, Some(worn_at));

        let mut higher = stored.clone();
        higher.wear_count = 10;
        assert!(db.update(&higher).unwrap());
        assert_eq!(db.get_by_id(id).unwrap().unwrap().wear_count, 10);
    }

    #[test]
    fn test_delete_by_record_requires_equal_record() {
        let dir = TempDir::new().unwrap();
        let db = open_db(&dir);
        let id = db.insert(red_coat()).unwrap();
        let stored = db.get_by_id(id).unwrap().unwrap();

        let mut stale = stored.clone();
        stale.rating = 5;
        assert!(!db.delete(&stale).unwrap());
        assert!(db.get_by_id(id).unwrap().is_some());

        assert!(db.delete(&stored).unwrap());
        assert!(db.get_by_id(id).unwrap().is_none());
    }

    #[test]
    fn test_data_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let id = {
            let db = open_db(&dir);
            let id = db.insert(red_coat()).unwrap();
            db.close_database().unwrap();
            id
        };

        let db = open_db(&dir);
        let item = db.get_by_id(id).unwrap().expect("record survives reopen");
        assert_eq!(item.name, "Red Coat");
        assert_eq!(db.insert(jeans("B", ClothingStatus::Available)).unwrap(), id + 1);
        info!("Reopened database at {}", db.path().display());
    }

    #[test]
    fn test_closed_database_rejects_operations() {
        let dir = TempDir::new().unwrap();
        let db = open_db(&dir);
        db.close_database().unwrap();
        db.close_database().unwrap();

        assert!(db.is_closed());
        assert!(matches!(db.insert(red_coat()), Err(AppResponse::DatabaseError(_))));
        assert!(matches!(db.get_by_id(1), Err(AppResponse::DatabaseError(_))));
        assert!(db.observe_all().is_err());
    }

    #[test]
    fn test_unicode_values_round_trip() {
        let dir = TempDir::new().unwrap();
        let db = open_db(&dir);
        let mut item = ClothingItem::new("真丝衬衫 👔", ClothingType::Shirt, "米白色");
        item.description = Some("Ünïcödé 测试".to_string());
        let id = db.insert(item.clone()).unwrap();
        item.id = id;
        assert_eq!(db.get_by_id(id).unwrap().unwrap(), item);
    }

    // ---- 2. Live queries ----------------------------------------------------

    #[test]
    fn test_live_query_pushes_initial_snapshot_then_changes() {
        let dir = TempDir::new().unwrap();
        let db = open_db(&dir);
        let all = db.observe_all().unwrap();

        assert!(all.recv().unwrap().is_empty());

        let id = db.insert(red_coat()).unwrap();
        assert_eq!(names(&all.recv().unwrap()), vec!["Red Coat"]);

        db.insert(jeans("Blue Jeans", ClothingStatus::Available)).unwrap();
        assert_eq!(names(&all.recv().unwrap()), vec!["Blue Jeans", "Red Coat"]);

        db.delete_by_id(id).unwrap();
        assert_eq!(names(&all.recv().unwrap()), vec!["Blue Jeans"]);
        assert!(db.get_by_id(id).unwrap().is_none());
    }

    #[test]
    fn test_live_query_skips_unchanged_results() {
        let dir = TempDir::new().unwrap();
        let db = open_db(&dir);
        let coats = db.observe_by_type(ClothingType::Coat).unwrap();
        assert!(coats.recv().unwrap().is_empty());

        db.insert(jeans("Blue Jeans", ClothingStatus::Available)).unwrap();
        assert!(coats.try_recv().is_none());

        db.insert(red_coat()).unwrap();
        assert_eq!(coats.try_recv().map(|v| v.len()), Some(1));
    }

    #[test]
    fn test_live_query_no_op_write_does_not_push() {
        let dir = TempDir::new().unwrap();
        let db = open_db(&dir);
        let count = db.observe_total_count().unwrap();
        assert_eq!(count.recv().unwrap(), 0);

        assert!(!db.delete_by_id(7).unwrap());
        assert!(count.try_recv().is_none());
    }

    #[test]
    fn test_live_scalars_follow_writes() {
        let dir = TempDir::new().unwrap();
        let db = open_db(&dir);
        let total = db.observe_total_count().unwrap();
        let average = db.observe_average_wear_count().unwrap();
        let value = db.observe_total_value().unwrap();
        let dirty = db.observe_count_by_status(ClothingStatus::Dirty).unwrap();

        assert_eq!(total.recv().unwrap(), 0);
        assert_eq!(average.recv().unwrap(), None);
        assert_eq!(value.recv().unwrap(), 0.0);
        assert_eq!(dirty.recv().unwrap(), 0);

        let coat = db.insert(red_coat()).unwrap();
        db.insert(jeans("Dirty Jeans", ClothingStatus::Dirty)).unwrap();
        db.increment_wear_count(coat, Utc::now()).unwrap();
        db.increment_wear_count(coat, Utc::now()).unwrap();

        assert_eq!(total.latest(), Some(2));
        assert_eq!(average.latest(), Some(Some(1.0)));
        assert_eq!(value.latest(), Some(399.0));
        assert_eq!(dirty.latest(), Some(1));
    }

    #[test]
    fn test_live_query_drop_unsubscribes() {
        let dir = TempDir::new().unwrap();
        let db = open_db(&dir);
        let keep = db.observe_all().unwrap();
        {
            let _favorites = db.observe_favorites().unwrap();
            let _colors = db.observe_all_colors().unwrap();
            assert_eq!(db.live_query_count(), 3);
        }
        assert_eq!(db.live_query_count(), 1);
        drop(keep);
        assert_eq!(db.live_query_count(), 0);
    }

    #[test]
    fn test_live_query_disconnects_on_close() {
        let dir = TempDir::new().unwrap();
        let db = open_db(&dir);
        let all = db.observe_all().unwrap();
        all.recv().unwrap();

        db.close_database().unwrap();
        assert!(matches!(all.recv(), Err(AppResponse::DatabaseError(_))));
        assert_eq!(db.live_query_count(), 0);
    }

    #[test]
    fn test_live_recv_timeout_reports_close() {
        let dir = TempDir::new().unwrap();
        let db = open_db(&dir);
        let count = db.observe_total_count().unwrap();
        assert_eq!(count.recv_timeout(WAIT).unwrap(), Some(0));
        assert_eq!(count.recv_timeout(Duration::from_millis(50)).unwrap(), None);

        db.close_database().unwrap();
        assert!(matches!(
            count.recv_timeout(WAIT),
            Err(AppResponse::DatabaseError(_))
        ));
    }

    #[test]
    fn test_live_query_holds_only_newest_value() {
        let dir = TempDir::new().unwrap();
        let db = open_db(&dir);
        let all = db.observe_all().unwrap();
        assert_eq!(all.pending(), 1);

        for n in 0..100 {
            let id = db.insert(jeans(&format!("J{n:03}"), ClothingStatus::Available)).unwrap();
            db.increment_wear_count(id, Utc::now()).unwrap();
            assert!(all.pending() <= 1);
        }

        let newest = all.recv().unwrap();
        assert_eq!(newest.len(), 100);
        assert!(newest.iter().all(|item| item.wear_count == 1));
        assert_eq!(all.pending(), 0);
    }

    #[test]
    fn test_live_by_id_tracks_one_record() {
        let dir = TempDir::new().unwrap();
        let db = open_db(&dir);
        let id = db.insert(red_coat()).unwrap();
        let coat = db.observe_by_id(id).unwrap();
        assert_eq!(coat.recv().unwrap().map(|c| c.is_favorite), Some(false));

        db.insert(jeans("Other", ClothingStatus::Available)).unwrap();
        assert!(coat.try_recv().is_none());

        db.set_favorite(id, true).unwrap();
        assert_eq!(coat.recv().unwrap().map(|c| c.is_favorite), Some(true));

        db.delete_by_id(id).unwrap();
        assert_eq!(coat.recv().unwrap(), None);
    }

    // ---- 3. Write pool and view-model ---------------------------------------

    #[test]
    fn test_fresh_wardrobe_observes_empty_catalog() {
        let dir = TempDir::new().unwrap();
        let wardrobe = open_wardrobe(&dir);
        let vm = wardrobe.view_model().unwrap();

        assert!(vm.all_clothing().recv_timeout(WAIT).unwrap().unwrap().is_empty());
        assert!(vm.search_clothing("coat").unwrap().recv().unwrap().is_empty());
        assert_eq!(vm.clothing_by_id(1).unwrap().recv().unwrap(), None);
        assert_eq!(vm.statistics().unwrap().recv().unwrap(), CatalogStatistics::default());
        assert!(wardrobe.db().read_all().unwrap().is_empty());
    }

    #[test]
    fn test_season_scenario_through_view_model() {
        let dir = TempDir::new().unwrap();
        let wardrobe = open_wardrobe(&dir);
        let vm = wardrobe.view_model().unwrap();

        let winter = vm.clothing_by_season(Season::Winter).unwrap();
        let summer = vm.clothing_by_season(Season::Summer).unwrap();
        assert!(winter.recv().unwrap().is_empty());
        assert!(summer.recv().unwrap().is_empty());

        vm.insert(red_coat()).unwrap().wait().unwrap();

        assert_eq!(names(&winter.recv_timeout(WAIT).unwrap().unwrap()), vec!["Red Coat"]);
        assert!(summer.try_recv().is_none());
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let dir = TempDir::new().unwrap();
        let wardrobe = open_wardrobe(&dir);
        let vm = wardrobe.view_model().unwrap();

        vm.insert(ClothingItem::new("Blue Jacket", ClothingType::Jacket, "blue"))
            .unwrap()
            .wait()
            .unwrap();
        let mut scarf = ClothingItem::new("Scarf", ClothingType::Scarf, "grey");
        scarf.description = Some("Matches the JACKET".to_string());
        vm.insert(scarf).unwrap().wait().unwrap();
        vm.insert(red_coat()).unwrap().wait().unwrap();

        let hits = vm.search_clothing("jacket").unwrap().recv().unwrap();
        assert_eq!(names(&hits), vec!["Blue Jacket", "Scarf"]);
    }

    #[test]
    fn test_combined_filter_matches_hand_built_fixture() {
        let dir = TempDir::new().unwrap();
        let wardrobe = open_wardrobe(&dir);
        let vm = wardrobe.view_model().unwrap();

        let mut fav = jeans("Fav Jeans", ClothingStatus::Available);
        fav.is_favorite = true;
        vm.insert_all(vec![
            jeans("Clean Jeans", ClothingStatus::Available),
            jeans("Dirty Jeans", ClothingStatus::Dirty),
            fav,
            red_coat(),
        ])
        .unwrap()
        .wait()
        .unwrap();

        let everything = vm.filtered_clothing(ClothingFilter::default()).unwrap().recv().unwrap();
        assert_eq!(everything, vm.all_clothing().latest().unwrap());

        let filter = ClothingFilter::default()
            .clothing_type(ClothingType::Jeans)
            .status(ClothingStatus::Available);
        let hits = vm.filtered_clothing(filter).unwrap().recv().unwrap();
        assert_eq!(names(&hits), vec!["Clean Jeans", "Fav Jeans"]);

        let filter = ClothingFilter::default()
            .clothing_type(ClothingType::Jeans)
            .favorite(true)
            .season(Season::Autumn)
            .color("blue");
        assert_eq!(names(&vm.filtered_clothing(filter).unwrap().recv().unwrap()), vec!["Fav Jeans"]);

        let bottoms = vm.clothing_by_category(ClothingCategory::Bottom).unwrap().recv().unwrap();
        assert_eq!(bottoms.len(), 3);
    }

    #[test]
    fn test_view_model_update_never_lowers_wear_count() {
        let dir = TempDir::new().unwrap();
        let wardrobe = open_wardrobe(&dir);
        let vm = wardrobe.view_model().unwrap();
        let id = vm.insert(red_coat()).unwrap().wait().unwrap();
        let stale = wardrobe.db().get_by_id(id).unwrap().unwrap();

        for _ in 0..3 {
            assert!(vm.increment_wear_count(id).wait().unwrap());
        }
        assert!(vm.update(stale).unwrap().wait().unwrap());

        let stored = wardrobe.db().get_by_id(id).unwrap().unwrap();
        assert_eq!(stored.wear_count, 3);
        assert!(stored.last_worn_date.is_some());

        assert!(vm.reset_wear_count(id).wait().unwrap());
        assert_eq!(wardrobe.db().get_by_id(id).unwrap().unwrap().wear_count, 0);
    }

    #[test]
    fn test_unread_catalog_updates_do_not_pile_up() {
        let dir = TempDir::new().unwrap();
        let wardrobe = open_wardrobe(&dir);
        let vm = wardrobe.view_model().unwrap();

        for n in 0..50 {
            let id = vm.insert(jeans(&format!("J{n}"), ClothingStatus::Available)).unwrap().wait().unwrap();
            vm.increment_wear_count(id).wait().unwrap();
        }

        assert!(vm.all_clothing().pending() <= 1);
        assert_eq!(vm.all_clothing().latest().map(|all| all.len()), Some(50));
    }

    #[test]
    fn test_validation_errors_are_synchronous_and_never_stored() {
        let dir = TempDir::new().unwrap();
        let wardrobe = open_wardrobe(&dir);
        let vm = wardrobe.view_model().unwrap();
        let total = vm.total_count().unwrap();
        assert_eq!(total.recv().unwrap(), 0);

        let nameless = ClothingItem::new("", ClothingType::Hat, "black");
        let err = vm.insert(nameless).unwrap_err();
        assert!(matches!(err, AppResponse::ValidationError(_)));
        assert!(err.user_message("Add item").starts_with("Add item failed: Validation error"));

        let colorless = ClothingItem::new("Cap", ClothingType::Hat, " ");
        assert!(vm.insert(colorless).is_err());

        assert!(total.recv_timeout(Duration::from_millis(100)).unwrap().is_none());
        assert!(wardrobe.db().read_all().unwrap().is_empty());
    }

    #[test]
    fn test_rating_out_of_range_is_rejected() {
        let dir = TempDir::new().unwrap();
        let wardrobe = open_wardrobe(&dir);
        let vm = wardrobe.view_model().unwrap();
        let id = vm.insert(red_coat()).unwrap().wait().unwrap();

        assert!(matches!(vm.update_rating(id, 6), Err(AppResponse::ValidationError(_))));
        assert!(vm.update_rating(id, 5).unwrap().wait().unwrap());
        assert_eq!(wardrobe.db().get_by_id(id).unwrap().unwrap().rating, 5);

        assert!(vm.update_rating(id, 0).unwrap().wait().unwrap());
        assert_eq!(wardrobe.db().get_by_id(id).unwrap().unwrap().rating, 0);

        let mut edited = wardrobe.db().get_by_id(id).unwrap().unwrap();
        edited.rating = 9;
        assert!(vm.update(edited).is_err());
    }

    #[test]
    fn test_view_model_wear_tracking() {
        let dir = TempDir::new().unwrap();
        let wardrobe = open_wardrobe(&dir);
        let vm = wardrobe.view_model().unwrap();
        let id = vm.insert(red_coat()).unwrap().wait().unwrap();
        let other = vm.insert(jeans("Jeans", ClothingStatus::Available)).unwrap().wait().unwrap();
        let most_worn = vm.most_worn_clothing(5).unwrap();
        assert!(most_worn.recv().unwrap().is_empty());

        let before = Utc::now();
        for _ in 0..3 {
            assert!(vm.increment_wear_count(id).wait().unwrap());
        }
        let after = Utc::now();

        let item = wardrobe.db().get_by_id(id).unwrap().unwrap();
        assert_eq!(item.wear_count, 3);
        let worn = item.last_worn_date.expect("stamped");
        assert!(worn >= before && worn <= after);

        assert_eq!(most_worn.latest().unwrap()[0].id, id);

        let recent = vm.recently_worn_clothing(10).unwrap().recv().unwrap();
        assert_eq!(recent.len(), 1);
        let rarely = vm.least_worn_clothing(0).unwrap().recv().unwrap();
        assert_eq!(rarely.iter().map(|i| i.id).collect::<Vec<_>>(), vec![other]);

        assert!(vm.reset_wear_count(id).wait().unwrap());
        assert!(most_worn.recv_timeout(WAIT).unwrap().unwrap().is_empty());
    }

    #[test]
    fn test_view_model_status_favorite_and_delete() {
        let dir = TempDir::new().unwrap();
        let wardrobe = open_wardrobe(&dir);
        let vm = wardrobe.view_model().unwrap();
        let id = vm.insert(red_coat()).unwrap().wait().unwrap();

        let favorites = vm.favorite_clothing().unwrap();
        let dirty = vm.clothing_by_status(ClothingStatus::Dirty).unwrap();
        assert!(favorites.recv().unwrap().is_empty());
        assert!(dirty.recv().unwrap().is_empty());

        assert!(vm.update_favorite_status(id, true).wait().unwrap());
        assert!(vm.update_status(id, ClothingStatus::Dirty).wait().unwrap());
        assert_eq!(favorites.recv_timeout(WAIT).unwrap().unwrap().len(), 1);
        assert_eq!(dirty.recv_timeout(WAIT).unwrap().unwrap().len(), 1);

        let stored = wardrobe.db().get_by_id(id).unwrap().unwrap();
        assert!(vm.delete(stored).wait().unwrap());
        assert!(vm.all_clothing().latest().unwrap().is_empty());
        assert!(!vm.delete_by_id(id).wait().unwrap());

        let by_id = vm.clothing_by_id(id).unwrap();
        assert_eq!(by_id.recv().unwrap(), None);
    }

    #[test]
    fn test_option_lists_and_statistics() {
        let dir = TempDir::new().unwrap();
        let wardrobe = open_wardrobe(&dir);
        let vm = wardrobe.view_model().unwrap();
        let brands = vm.all_brands().unwrap();
        let stats = vm.statistics().unwrap();
        assert!(brands.recv().unwrap().is_empty());
        assert_eq!(stats.recv().unwrap(), CatalogStatistics::default());

        vm.insert(red_coat()).unwrap().wait().unwrap();
        let mut tee = ClothingItem::new("Tee", ClothingType::TShirt, "white");
        tee.brand = Some("Muji".to_string());
        tee.material = Some("cotton".to_string());
        vm.insert(tee).unwrap().wait().unwrap();

        assert_eq!(brands.latest().unwrap(), vec!["Muji", "Uniqlo"]);
        assert_eq!(vm.all_colors().unwrap().recv().unwrap(), vec!["white", "红色"]);
        assert_eq!(vm.all_materials().unwrap().recv().unwrap(), vec!["cotton"]);
        assert_eq!(vm.count_by_type(ClothingType::Coat).unwrap().recv().unwrap(), 1);

        let snapshot = stats.latest().unwrap();
        assert_eq!(snapshot.total_count, 2);
        assert_eq!(snapshot.total_value, 399.0);
        assert_eq!(snapshot.count_by_status[&ClothingStatus::Available], 2);
    }

    #[test]
    fn test_update_on_missing_id_resolves_false() {
        let dir = TempDir::new().unwrap();
        let wardrobe = open_wardrobe(&dir);
        let vm = wardrobe.view_model().unwrap();
        let mut ghost = red_coat();
        ghost.id = 77;
        assert!(!vm.update(ghost).unwrap().wait().unwrap());
        assert!(!vm.increment_wear_count(77).wait().unwrap());
    }

    #[test]
    fn test_concurrent_inserts_get_distinct_ids() {
        let dir = TempDir::new().unwrap();
        let wardrobe = open_wardrobe(&dir);
        let vm = wardrobe.view_model().unwrap();

        let mut ids: Vec<u64> = std::thread::scope(|scope| {
            let workers: Vec<_> = (0..8)
                .map(|t| {
                    let vm = &vm;
                    scope.spawn(move || {
                        (0..25)
                            .map(|n| {
                                let item = jeans(&format!("Jeans {t}-{n}"), ClothingStatus::Available);
                                vm.insert(item).unwrap().wait().unwrap()
                            })
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            workers.into_iter().flat_map(|w| w.join().unwrap()).collect()
        });

        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 200);
        assert_eq!(wardrobe.db().read_all().unwrap().len(), 200);
        assert_eq!(vm.all_clothing().latest().map(|all| all.len()), Some(200));
    }

    #[test]
    fn test_shutdown_drains_queued_writes() {
        let dir = TempDir::new().unwrap();
        let wardrobe = open_wardrobe(&dir);
        let vm = wardrobe.view_model().unwrap();

        let pending: Vec<_> = (0..50)
            .map(|n| vm.insert(jeans(&format!("J{n}"), ClothingStatus::Available)).unwrap())
            .collect();
        wardrobe.shutdown().unwrap();

        for p in pending {
            assert!(p.wait().is_ok());
        }

        let late = vm.insert(red_coat()).unwrap().wait();
        assert!(matches!(late, Err(AppResponse::DatabaseError(_))));

        drop(vm);
        drop(wardrobe);
        let db = open_db(&dir);
        assert_eq!(db.read_all().unwrap().len(), 50);
    }

    #[test]
    fn test_storage_errors_reach_the_caller() {
        let dir = TempDir::new().unwrap();
        let db = Arc::new(open_db(&dir));
        let pool = WritePool::new(2, Arc::clone(&db)).unwrap();

        db.close_database().unwrap();
        let err = pool.submit(|db| db.insert(red_coat())).wait().unwrap_err();
        assert_eq!(err, AppResponse::DatabaseError("Database is closed".to_string()));
        assert_eq!(err.user_message("Save"), "Save failed: Database error: Database is closed");
        pool.shutdown();
    }

    #[test]
    fn test_pending_write_polling() {
        let dir = TempDir::new().unwrap();
        let db = Arc::new(open_db(&dir));
        let pool = WritePool::new(1, Arc::clone(&db)).unwrap();
        assert_eq!(pool.size(), 1);

        let mut pending = pool.submit(|db| db.insert(red_coat()));
        let mut result = None;
        for _ in 0..500 {
            result = pending.try_take();
            if result.is_some() {
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(result, Some(Ok(1)));
        assert!(pending.try_take().is_none());

        let waited = pool.submit(|db| db.delete_by_id(1)).wait_timeout(WAIT);
        assert!(matches!(waited, Ok(Ok(true))));

        assert!(WritePool::new(0, db).is_err());
    }

    // ---- 4. FFI -------------------------------------------------------------

    fn take_response(ptr: *const c_char) -> AppResponse {
        assert!(!ptr.is_null(), "FFI call returned null");
        let json = unsafe { CStr::from_ptr(ptr) }.to_str().unwrap().to_string();
        wardrobe_free_string(ptr);
        serde_json::from_str(&json).expect("response is an AppResponse")
    }

    fn ok_payload<T: serde::de::DeserializeOwned>(response: AppResponse) -> T {
        match response {
            AppResponse::Ok(json) => serde_json::from_str(&json).unwrap(),
            other => panic!("expected Ok, got {other:?}"),
        }
    }

    fn ffi_open(dir: &TempDir) -> *mut WardrobeHandle {
        let name = CString::new(dir.path().join("ffi_test").to_str().unwrap()).unwrap();
        let handle = wardrobe_open(name.as_ptr());
        assert!(!handle.is_null());
        handle
    }

    #[test]
    fn test_ffi_open_rejects_bad_input() {
        assert!(wardrobe_open(std::ptr::null()).is_null());

        let invalid = [0xff_u8, 0xfe, 0x00];
        assert!(wardrobe_open(invalid.as_ptr() as *const c_char).is_null());

        let bad_config = CString::new(r#"{"worker_threads":0}"#).unwrap();
        assert!(wardrobe_open_with_config(bad_config.as_ptr()).is_null());
    }

    #[test]
    fn test_ffi_open_with_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("configured");
        let json = serde_json::json!({ "db_path": path, "worker_threads": 2 }).to_string();
        let config = CString::new(json).unwrap();
        let handle = wardrobe_open_with_config(config.as_ptr());
        assert!(!handle.is_null());
        assert!(take_response(wardrobe_close(handle)).is_ok());
        assert!(path.with_extension("lmdb").exists());
    }

    #[test]
    fn test_ffi_full_workflow() {
        let dir = TempDir::new().unwrap();
        let handle = ffi_open(&dir);

        let json = CString::new(
            r#"{"name":"Red Coat","type":"COAT","color":"红色","seasons":["WINTER"],
                "purchase_date":"2024-01-15T10:30:00Z","price":120.5}"#,
        )
        .unwrap();
        let id: u64 = ok_payload(take_response(wardrobe_insert(handle, json.as_ptr())));
        assert_eq!(id, 1);

        let item: ClothingItem = ok_payload(take_response(wardrobe_get_by_id(handle, id)));
        assert_eq!(item.name, "Red Coat");
        assert_eq!(item.status, ClothingStatus::Available);
        assert_eq!(item.wear_count, 0);

        assert!(take_response(wardrobe_increment_wear_count(handle, id)).is_ok());
        assert!(take_response(wardrobe_set_favorite(handle, id, true)).is_ok());
        let dirty = CString::new("DIRTY").unwrap();
        assert!(take_response(wardrobe_set_status(handle, id, dirty.as_ptr())).is_ok());
        assert!(take_response(wardrobe_set_rating(handle, id, 4)).is_ok());

        let query = CString::new("coat").unwrap();
        let hits: Vec<ClothingItem> = ok_payload(take_response(wardrobe_search(handle, query.as_ptr())));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].wear_count, 1);
        assert!(hits[0].is_favorite);
        assert_eq!(hits[0].status, ClothingStatus::Dirty);
        assert_eq!(hits[0].rating, 4);

        let filter = CString::new(r#"{"type":"COAT","status":"DIRTY"}"#).unwrap();
        let filtered: Vec<ClothingItem> = ok_payload(take_response(wardrobe_filter(handle, filter.as_ptr())));
        assert_eq!(filtered.len(), 1);

        let mut edited = hits[0].clone();
        edited.name = "Winter Coat".to_string();
        let edited_json = CString::new(serde_json::to_string(&edited).unwrap()).unwrap();
        assert!(take_response(wardrobe_update(handle, edited_json.as_ptr())).is_ok());

        let all: Vec<ClothingItem> = ok_payload(take_response(wardrobe_get_all(handle)));
        assert_eq!(all, vec![edited]);

        let stats: CatalogStatistics = ok_payload(take_response(wardrobe_statistics(handle)));
        assert_eq!(stats.total_count, 1);
        assert_eq!(stats.total_value, 120.5);

        assert!(take_response(wardrobe_delete_by_id(handle, id)).is_ok());
        assert!(matches!(
            take_response(wardrobe_get_by_id(handle, id)),
            AppResponse::NotFound(_)
        ));

        assert!(take_response(wardrobe_delete_all(handle)).is_ok());
        assert!(take_response(wardrobe_close(handle)).is_ok());
    }

    #[test]
    fn test_ffi_fresh_wardrobe_and_default_purchase_date() {
        let dir = TempDir::new().unwrap();
        let handle = ffi_open(&dir);

        let all: Vec<ClothingItem> = ok_payload(take_response(wardrobe_get_all(handle)));
        assert!(all.is_empty());

        let before = Utc::now();
        let json = CString::new(r#"{"name":"Blue Jacket","type":"JACKET","color":"blue"}"#).unwrap();
        let id: u64 = ok_payload(take_response(wardrobe_insert(handle, json.as_ptr())));

        let item: ClothingItem = ok_payload(take_response(wardrobe_get_by_id(handle, id)));
        assert!(item.purchase_date >= before);
        assert_eq!(item.status, ClothingStatus::Available);

        assert!(take_response(wardrobe_close(handle)).is_ok());
    }

    #[test]
    fn test_ffi_error_responses() {
        let dir = TempDir::new().unwrap();
        let handle = ffi_open(&dir);

        let not_json = CString::new("{not json").unwrap();
        assert!(matches!(
            take_response(wardrobe_insert(handle, not_json.as_ptr())),
            AppResponse::SerializationError(_)
        ));

        let unknown_type = CString::new(
            r#"{"name":"Cape","type":"CAPE","color":"black","purchase_date":"2024-01-15T10:30:00Z"}"#,
        )
        .unwrap();
        assert!(matches!(
            take_response(wardrobe_insert(handle, unknown_type.as_ptr())),
            AppResponse::SerializationError(_)
        ));

        let empty_name = CString::new(
            r#"{"name":"","type":"HAT","color":"black","purchase_date":"2024-01-15T10:30:00Z"}"#,
        )
        .unwrap();
        assert!(matches!(
            take_response(wardrobe_insert(handle, empty_name.as_ptr())),
            AppResponse::ValidationError(_)
        ));

        assert!(matches!(
            take_response(wardrobe_insert(handle, std::ptr::null())),
            AppResponse::BadRequest(_)
        ));
        assert!(matches!(
            take_response(wardrobe_delete_by_id(handle, 99)),
            AppResponse::NotFound(_)
        ));
        assert!(matches!(
            take_response(wardrobe_set_rating(handle, 1, 6)),
            AppResponse::ValidationError(_)
        ));

        let bad_status = CString::new("SOGGY").unwrap();
        assert!(matches!(
            take_response(wardrobe_set_status(handle, 1, bad_status.as_ptr())),
            AppResponse::ValidationError(_)
        ));

        assert!(take_response(wardrobe_close(handle)).is_ok());
    }

    #[test]
    fn test_ffi_null_handle() {
        let null = std::ptr::null_mut();
        assert!(matches!(take_response(wardrobe_get_all(null)), AppResponse::BadRequest(_)));
        assert!(matches!(take_response(wardrobe_get_by_id(null, 1)), AppResponse::BadRequest(_)));
        assert!(matches!(take_response(wardrobe_statistics(null)), AppResponse::BadRequest(_)));
        assert!(matches!(take_response(wardrobe_delete_all(null)), AppResponse::BadRequest(_)));
        assert!(matches!(take_response(wardrobe_close(null)), AppResponse::BadRequest(_)));
        wardrobe_free_string(std::ptr::null());
    }
}
