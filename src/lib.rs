//! # Wardrobe Core
//!
//! Local clothing catalog for mobile wardrobe apps. Items are stored in LMDB,
//! every listing and statistic is a live query that pushes a fresh result
//! after each write that changes it, and writes run on a small worker pool so
//! the UI thread never blocks.
//!
//! ## Layers
//!
//! - [`vocabulary`]: closed classification tables (type, category, status,
//!   season, occasion) with display labels
//! - [`clothing_item`]: the stored record and its validation rules
//! - [`wardrobe_db`]: LMDB persistence and live queries
//! - [`write_pool`]: fixed-size write workers and completion handles
//! - [`repository`] / [`view_model`]: the call surface used by screens
//! - [`Wardrobe`]: constructs and owns all of the above
//!
//! ## Quick Start
//!
//! ```no_run
//! use wardrobe_core::{Wardrobe, WardrobeConfig};
//! use wardrobe_core::clothing_item::ClothingItem;
//! use wardrobe_core::vocabulary::{ClothingType, Season};
//!
//! let wardrobe = Wardrobe::open(WardrobeConfig::with_path("wardrobe_database"))?;
//! let vm = wardrobe.view_model()?;
//!
//! let winter = vm.clothing_by_season(Season::Winter)?;
//! assert!(winter.recv()?.is_empty());
//!
//! let mut coat = ClothingItem::new("Red Coat", ClothingType::Coat, "红色");
//! coat.seasons = vec![Season::Winter];
//! vm.insert(coat)?.wait()?;
//!
//! assert_eq!(winter.recv()?.len(), 1);
//! # Ok::<(), wardrobe_core::app_response::AppResponse>(())
//! ```
//!
//! ## FFI Functions
//!
//! The host UI talks to the library through C-compatible functions. Every
//! function except [`wardrobe_open`] returns a JSON-encoded [`AppResponse`]
//! that must be released with [`wardrobe_free_string`].
//!
//! - [`wardrobe_open`] / [`wardrobe_open_with_config`] - open a wardrobe
//! - [`wardrobe_insert`], [`wardrobe_update`], [`wardrobe_delete_by_id`],
//!   [`wardrobe_delete_all`] - record writes
//! - [`wardrobe_increment_wear_count`], [`wardrobe_set_favorite`],
//!   [`wardrobe_set_status`], [`wardrobe_set_rating`] - single-field writes
//! - [`wardrobe_get_by_id`], [`wardrobe_get_all`], [`wardrobe_search`],
//!   [`wardrobe_filter`], [`wardrobe_statistics`] - reads
//! - [`wardrobe_close`] - flush, close and free the handle

pub mod app_response;
pub mod clothing_item;
pub mod config;
pub mod live_query;
pub mod query;
pub mod repository;
pub mod view_model;
pub mod vocabulary;
mod wardrobe;
pub mod wardrobe_db;
pub mod write_pool;
mod test;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use log::{info, warn};
use serde::Serialize;

pub use crate::app_response::AppResponse;
pub use crate::config::WardrobeConfig;
pub use crate::wardrobe::Wardrobe;

use crate::clothing_item::ClothingItem;
use crate::query::ClothingFilter;
use crate::view_model::ClothingViewModel;
use crate::vocabulary::ClothingStatus;

/// Opaque handle given to FFI callers.
pub struct WardrobeHandle {
    view_model: ClothingViewModel,
    wardrobe: Wardrobe,
}

fn open_handle(config: WardrobeConfig) -> *mut WardrobeHandle {
    let wardrobe = match Wardrobe::open(config) {
        Ok(w) => w,
        Err(e) => {
            warn!("❌ Failed to open wardrobe: {e}");
            return std::ptr::null_mut();
        }
    };
    match wardrobe.view_model() {
        Ok(view_model) => {
            info!("✅ Wardrobe handle created");
            Box::into_raw(Box::new(WardrobeHandle {
                view_model,
                wardrobe,
            }))
        }
        Err(e) => {
            warn!("❌ Failed to build view model: {e}");
            std::ptr::null_mut()
        }
    }
}

/// Opens (or creates) the wardrobe stored at `<name>.lmdb` with default
/// settings.
///
/// Returns a null pointer if `name` is null, not UTF-8, or the database
/// cannot be opened. The handle must be released with [`wardrobe_close`].
///
/// # Examples
///
/// ```no_run
/// use std::ffi::CString;
/// use wardrobe_core::{wardrobe_close, wardrobe_open};
///
/// let name = CString::new("my_wardrobe").unwrap();
/// let handle = wardrobe_open(name.as_ptr());
/// assert!(!handle.is_null());
/// wardrobe_close(handle);
/// ```
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn wardrobe_open(name: *const c_char) -> *mut WardrobeHandle {
    if name.is_null() {
        warn!("Null name pointer passed to wardrobe_open");
        return std::ptr::null_mut();
    }
    let name_str = match unsafe { CStr::from_ptr(name).to_str() } {
        Ok(s) => s,
        Err(e) => {
            warn!("Invalid UTF-8 in name parameter: {e}");
            return std::ptr::null_mut();
        }
    };
    open_handle(WardrobeConfig::with_path(name_str))
}

/// Opens a wardrobe from a JSON [`WardrobeConfig`], e.g.
/// `{"db_path":"/data/wardrobe","worker_threads":4}`.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn wardrobe_open_with_config(config_json: *const c_char) -> *mut WardrobeHandle {
    let json = match read_c_str(config_json) {
        Ok(s) => s,
        Err(e) => {
            warn!("Bad config pointer passed to wardrobe_open_with_config: {e}");
            return std::ptr::null_mut();
        }
    };
    match WardrobeConfig::from_json_str(&json) {
        Ok(config) => open_handle(config),
        Err(e) => {
            warn!("Invalid wardrobe config: {e}");
            std::ptr::null_mut()
        }
    }
}

/// Inserts a clothing item given as JSON. Responds with the new id.
///
/// ```json
/// {"name":"Red Coat","type":"COAT","color":"红色","seasons":["WINTER"],
///  "purchase_date":"2024-01-15T10:30:00Z"}
/// ```
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn wardrobe_insert(handle: *mut WardrobeHandle, json_ptr: *const c_char) -> *const c_char {
    let handle = match handle_ref(handle, "wardrobe_insert") {
        Ok(h) => h,
        Err(err) => return err,
    };
    let item: ClothingItem = match parse_json_arg(json_ptr, "JSON") {
        Ok(item) => item,
        Err(err) => return err,
    };
    let result = handle.view_model.insert(item).and_then(|pending| pending.wait());
    json_response(result)
}

/// Replaces the record whose id matches the JSON item.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn wardrobe_update(handle: *mut WardrobeHandle, json_ptr: *const c_char) -> *const c_char {
    let handle = match handle_ref(handle, "wardrobe_update") {
        Ok(h) => h,
        Err(err) => return err,
    };
    let item: ClothingItem = match parse_json_arg(json_ptr, "JSON") {
        Ok(item) => item,
        Err(err) => return err,
    };
    let id = item.id;
    let result = handle.view_model.update(item).and_then(|pending| pending.wait());
    write_response(result, id, "updated")
}

#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn wardrobe_get_by_id(handle: *mut WardrobeHandle, id: u64) -> *const c_char {
    let handle = match handle_ref(handle, "wardrobe_get_by_id") {
        Ok(h) => h,
        Err(err) => return err,
    };
    match handle.view_model.clothing_by_id(id).and_then(|live| live.recv()) {
        Ok(Some(item)) => json_response(Ok(item)),
        Ok(None) => response_to_c_string(&AppResponse::NotFound(format!(
            "No clothing item found with id: {id}"
        ))),
        Err(e) => response_to_c_string(&e),
    }
}

/// All items, ordered by name.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn wardrobe_get_all(handle: *mut WardrobeHandle) -> *const c_char {
    let handle = match handle_ref(handle, "wardrobe_get_all") {
        Ok(h) => h,
        Err(err) => return err,
    };
    let fresh = handle.view_model.filtered_clothing(ClothingFilter::default());
    json_response(fresh.and_then(|live| live.recv()))
}

#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn wardrobe_search(handle: *mut WardrobeHandle, query_ptr: *const c_char) -> *const c_char {
    let handle = match handle_ref(handle, "wardrobe_search") {
        Ok(h) => h,
        Err(err) => return err,
    };
    let query = match c_ptr_to_string(query_ptr, "query") {
        Ok(q) => q,
        Err(err) => return err,
    };
    json_response(handle.view_model.search_clothing(&query).and_then(|live| live.recv()))
}

/// Combined filter, e.g. `{"type":"JEANS","status":"AVAILABLE"}`. Omitted keys
/// do not constrain the result.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn wardrobe_filter(handle: *mut WardrobeHandle, filter_ptr: *const c_char) -> *const c_char {
    let handle = match handle_ref(handle, "wardrobe_filter") {
        Ok(h) => h,
        Err(err) => return err,
    };
    let filter: ClothingFilter = match parse_json_arg(filter_ptr, "filter") {
        Ok(f) => f,
        Err(err) => return err,
    };
    json_response(handle.view_model.filtered_clothing(filter).and_then(|live| live.recv()))
}

#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn wardrobe_statistics(handle: *mut WardrobeHandle) -> *const c_char {
    let handle = match handle_ref(handle, "wardrobe_statistics") {
        Ok(h) => h,
        Err(err) => return err,
    };
    json_response(handle.view_model.statistics().and_then(|live| live.recv()))
}

#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn wardrobe_delete_by_id(handle: *mut WardrobeHandle, id: u64) -> *const c_char {
    let handle = match handle_ref(handle, "wardrobe_delete_by_id") {
        Ok(h) => h,
        Err(err) => return err,
    };
    write_response(handle.view_model.delete_by_id(id).wait(), id, "deleted")
}

#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn wardrobe_delete_all(handle: *mut WardrobeHandle) -> *const c_char {
    let handle = match handle_ref(handle, "wardrobe_delete_all") {
        Ok(h) => h,
        Err(err) => return err,
    };
    match handle.view_model.delete_all().wait() {
        Ok(()) => response_to_c_string(&AppResponse::success("All clothing items cleared successfully")),
        Err(e) => response_to_c_string(&e),
    }
}

#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn wardrobe_increment_wear_count(handle: *mut WardrobeHandle, id: u64) -> *const c_char {
    let handle = match handle_ref(handle, "wardrobe_increment_wear_count") {
        Ok(h) => h,
        Err(err) => return err,
    };
    write_response(handle.view_model.increment_wear_count(id).wait(), id, "marked as worn")
}

#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn wardrobe_set_favorite(handle: *mut WardrobeHandle, id: u64, is_favorite: bool) -> *const c_char {
    let handle = match handle_ref(handle, "wardrobe_set_favorite") {
        Ok(h) => h,
        Err(err) => return err,
    };
    let result = handle.view_model.update_favorite_status(id, is_favorite).wait();
    write_response(result, id, "favorite updated")
}

/// `status_ptr` is a symbolic status name such as `"DIRTY"`.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn wardrobe_set_status(handle: *mut WardrobeHandle, id: u64, status_ptr: *const c_char) -> *const c_char {
    let handle = match handle_ref(handle, "wardrobe_set_status") {
        Ok(h) => h,
        Err(err) => return err,
    };
    let status_str = match c_ptr_to_string(status_ptr, "status") {
        Ok(s) => s,
        Err(err) => return err,
    };
    let status: ClothingStatus = match status_str.parse() {
        Ok(s) => s,
        Err(e) => return response_to_c_string(&e),
    };
    write_response(handle.view_model.update_status(id, status).wait(), id, "status updated")
}

/// Ratings outside `0..=5` are rejected with a `ValidationError`.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn wardrobe_set_rating(handle: *mut WardrobeHandle, id: u64, rating: u8) -> *const c_char {
    let handle = match handle_ref(handle, "wardrobe_set_rating") {
        Ok(h) => h,
        Err(err) => return err,
    };
    let result = handle.view_model.update_rating(id, rating).and_then(|pending| pending.wait());
    write_response(result, id, "rating updated")
}

/// Waits for queued writes, flushes the database and frees the handle.
/// The pointer must not be used afterwards.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn wardrobe_close(handle: *mut WardrobeHandle) -> *const c_char {
    if handle.is_null() {
        let error = AppResponse::BadRequest("Null handle passed to wardrobe_close".to_string());
        return response_to_c_string(&error);
    }
    let handle = unsafe { Box::from_raw(handle) };
    let result = handle.wardrobe.shutdown();
    drop(handle);
    match result {
        Ok(()) => response_to_c_string(&AppResponse::success("Wardrobe closed successfully")),
        Err(e) => response_to_c_string(&e),
    }
}

/// Releases a string returned by any other `wardrobe_*` function.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn wardrobe_free_string(ptr: *const c_char) {
    if ptr.is_null() {
        return;
    }
    drop(unsafe { CString::from_raw(ptr as *mut c_char) });
}

/// Converts an [`AppResponse`] into a C string owned by the caller.
///
/// Returns a null pointer if serialization or C string creation fails.
fn response_to_c_string(response: &AppResponse) -> *const c_char {
    let json = match serde_json::to_string(response) {
        Ok(j) => j,
        Err(e) => {
            warn!("Error serializing response: {e}");
            return std::ptr::null();
        }
    };

    match CString::new(json) {
        Ok(c_str) => c_str.into_raw(),
        Err(e) => {
            warn!("Error creating CString: {e}");
            std::ptr::null()
        }
    }
}

/// Wraps a successful value as `Ok(<json>)`, or the error as is.
fn json_response<T: Serialize>(result: Result<T, AppResponse>) -> *const c_char {
    let response = match result.and_then(|value| Ok(serde_json::to_string(&value)?)) {
        Ok(json) => AppResponse::Ok(json),
        Err(e) => e,
    };
    response_to_c_string(&response)
}

/// Maps a single-record write outcome; `false` means the id was unknown.
fn write_response(result: Result<bool, AppResponse>, id: u64, done: &str) -> *const c_char {
    let response = match result {
        Ok(true) => AppResponse::success(format!("Clothing item {id} {done}")),
        Ok(false) => AppResponse::NotFound(format!("No clothing item found with id: {id}")),
        Err(e) => e,
    };
    response_to_c_string(&response)
}

fn handle_ref<'a>(handle: *mut WardrobeHandle, caller: &str) -> Result<&'a WardrobeHandle, *const c_char> {
    match unsafe { handle.as_ref() } {
        Some(h) => Ok(h),
        None => {
            let error = AppResponse::BadRequest(format!("Null handle passed to {caller}"));
            Err(response_to_c_string(&error))
        }
    }
}

fn read_c_str(ptr: *const c_char) -> Result<String, String> {
    if ptr.is_null() {
        return Err("null pointer".to_string());
    }
    unsafe { CStr::from_ptr(ptr) }
        .to_str()
        .map(str::to_string)
        .map_err(|e| format!("invalid UTF-8: {e}"))
}

/// Converts a C string pointer to a Rust `String`, or to a ready-made
/// `BadRequest` response naming `field_name`.
fn c_ptr_to_string(ptr: *const c_char, field_name: &str) -> Result<String, *const c_char> {
    if ptr.is_null() {
        let error = AppResponse::BadRequest(format!("Null {field_name} pointer"));
        return Err(response_to_c_string(&error));
    }

    match unsafe { CStr::from_ptr(ptr).to_str() } {
        Ok(s) => Ok(s.to_string()),
        Err(e) => {
            let error = AppResponse::BadRequest(format!("Invalid UTF-8 in {field_name}: {e}"));
            Err(response_to_c_string(&error))
        }
    }
}

fn parse_json_arg<T: serde::de::DeserializeOwned>(ptr: *const c_char, field_name: &str) -> Result<T, *const c_char> {
    let json = c_ptr_to_string(ptr, field_name)?;
    serde_json::from_str(&json).map_err(|e| {
        let error = AppResponse::SerializationError(format!("Invalid {field_name}: {e}"));
        response_to_c_string(&error)
    })
}
