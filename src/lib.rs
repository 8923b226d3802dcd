//! # Portal Store Core
//!
//! Local persistence for the HR portal front end: likes and comments on
//! employee birthday cards (one partition per calendar year), the vacation
//! balance and request repositories with their change notifications, the
//! signed-in user record, and the "upcoming birthdays this month" filter.
//!
//! ## Layout
//!
//! - [`storage_medium`] - key/value media: LMDB on disk, or in memory
//! - [`record_store`] - year-partitioned JSON collections over a medium
//! - [`like_ledger`] / [`comment_ledger`] - the birthday social feature
//! - [`change_bus`] / [`domain_repository`] - collections other screens watch
//! - [`identity`] - the current session record
//! - [`birthday_filter`] - pure eligibility filter for the dashboard tile
//! - [`birthday_feed`] - the calls the birthday card makes
//!
//! ## Quick Start
//!
//! ```rust
//! use portal_store_core::portal_config::PortalConfig;
//! use portal_store_core::portal_state::PortalState;
//!
//! let state = PortalState::in_memory(PortalConfig::default());
//! state.likes.add_like("1042", "2077", 2026)?;
//! state.likes.add_like("1042", "2077", 2026)?;
//! assert_eq!(state.likes.count_likes("1042", 2026), 1);
//! # Ok::<(), portal_store_core::app_response::AppResponse>(())
//! ```
//!
//! ## FFI Functions
//!
//! The host shell drives the store through C-compatible functions that take
//! and return JSON strings. Every returned string is a serialized
//! [`AppResponse`](app_response::AppResponse) and must be released with
//! [`free_response`].
//!
//! - [`create_portal_store`] - open the store from a JSON config
//! - [`get_likes`] / [`toggle_like`]
//! - [`get_comments`] / [`add_comment`] / [`remove_comment`]
//! - [`eligible_birthdays`]
//! - [`close_portal_store`]

pub mod app_response;
pub mod birthday_feed;
pub mod birthday_filter;
pub mod change_bus;
pub mod comment_ledger;
pub mod domain_repository;
pub mod identity;
pub mod like_ledger;
pub mod notifier;
pub mod portal_config;
pub mod portal_model;
pub mod portal_state;
pub mod record_store;
pub mod storage_medium;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use chrono::{Datelike, NaiveDate, Utc};
use log::{info, warn};
use serde::Serialize;

use crate::app_response::AppResponse;
use crate::portal_config::PortalConfig;
use crate::portal_model::{Employee, NewComment};
use crate::portal_state::PortalState;

/// Opens the portal store described by a JSON [`PortalConfig`].
///
/// Missing config fields take their defaults, so `"{}"` opens
/// `portal_store.lmdb` in the working directory. Returns null on failure.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn create_portal_store(config_json: *const c_char) -> *mut PortalState {
    let json = match c_ptr_to_str(config_json) {
        Some(json) => json,
        None => {
            warn!("Null or non UTF-8 config passed to create_portal_store");
            return std::ptr::null_mut();
        }
    };

    let config = match PortalConfig::from_json(json) {
        Ok(config) => config,
        Err(e) => {
            warn!("Invalid portal config: {}", e);
            return std::ptr::null_mut();
        }
    };

    info!("Opening portal store at: {}", config.storage_path);
    match PortalState::init(config) {
        Ok(state) => Box::into_raw(Box::new(state)),
        Err(e) => {
            warn!("Failed to open portal store: {}", e);
            std::ptr::null_mut()
        }
    }
}

/// Likes on a subject for `year` (`0` means the current year).
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn get_likes(state: *mut PortalState, subject_id: *const c_char, year: i32) -> *const c_char {
    let state = match state_ref(state) {
        Ok(state) => state,
        Err(err) => return err,
    };
    let subject_id = match c_ptr_to_string(subject_id, "subject_id") {
        Ok(s) => s,
        Err(err) => return err,
    };

    let likes = state.likes.get_likes(&subject_id, resolve_year(year));
    json_response(&likes)
}

/// Flips the author's like. The response payload is `true` when the like
/// is now set.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn toggle_like(
    state: *mut PortalState,
    subject_id: *const c_char,
    author_id: *const c_char,
    year: i32,
) -> *const c_char {
    let state = match state_ref(state) {
        Ok(state) => state,
        Err(err) => return err,
    };
    let subject_id = match c_ptr_to_string(subject_id, "subject_id") {
        Ok(s) => s,
        Err(err) => return err,
    };
    let author_id = match c_ptr_to_string(author_id, "author_id") {
        Ok(s) => s,
        Err(err) => return err,
    };

    match state.likes.toggle_like(&subject_id, &author_id, resolve_year(year)) {
        Ok(liked) => json_response(&liked),
        Err(e) => response_to_c_string(&e),
    }
}

/// Comments on a subject for `year`, newest first.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn get_comments(state: *mut PortalState, subject_id: *const c_char, year: i32) -> *const c_char {
    let state = match state_ref(state) {
        Ok(state) => state,
        Err(err) => return err,
    };
    let subject_id = match c_ptr_to_string(subject_id, "subject_id") {
        Ok(s) => s,
        Err(err) => return err,
    };

    let comments = state.comments.get_comments(&subject_id, resolve_year(year));
    json_response(&comments)
}

/// Adds a comment from a JSON [`NewComment`]; returns the stored comment.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn add_comment(state: *mut PortalState, json_ptr: *const c_char, year: i32) -> *const c_char {
    let state = match state_ref(state) {
        Ok(state) => state,
        Err(err) => return err,
    };
    let json = match c_ptr_to_string(json_ptr, "JSON") {
        Ok(s) => s,
        Err(err) => return err,
    };

    let input: NewComment = match serde_json::from_str(&json) {
        Ok(input) => input,
        Err(e) => {
            let error = AppResponse::SerializationError(format!("Invalid JSON: {e}"));
            return response_to_c_string(&error);
        }
    };

    match state.comments.add_comment(input, resolve_year(year)) {
        Ok(comment) => json_response(&comment),
        Err(e) => response_to_c_string(&e),
    }
}

#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn remove_comment(
    state: *mut PortalState,
    comment_id: *const c_char,
    author_id: *const c_char,
    year: i32,
) -> *const c_char {
    let state = match state_ref(state) {
        Ok(state) => state,
        Err(err) => return err,
    };
    let comment_id = match c_ptr_to_string(comment_id, "comment_id") {
        Ok(s) => s,
        Err(err) => return err,
    };
    let author_id = match c_ptr_to_string(author_id, "author_id") {
        Ok(s) => s,
        Err(err) => return err,
    };

    match state.comments.remove_comment(&comment_id, &author_id, resolve_year(year)) {
        Ok(()) => response_to_c_string(&AppResponse::success("Comment deleted successfully")),
        Err(e) => response_to_c_string(&e),
    }
}

/// Filters a JSON array of [`Employee`] rows down to this month's upcoming
/// birthdays. `today` is `YYYY-MM-DD`, or null for the current date.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn eligible_birthdays(employees_json: *const c_char, today: *const c_char) -> *const c_char {
    let json = match c_ptr_to_string(employees_json, "employees") {
        Ok(s) => s,
        Err(err) => return err,
    };

    let today = if today.is_null() {
        Utc::now().date_naive()
    } else {
        let raw = match c_ptr_to_string(today, "today") {
            Ok(s) => s,
            Err(err) => return err,
        };
        match NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d") {
            Ok(date) => date,
            Err(e) => {
                let error = AppResponse::BadRequest(format!("Invalid date '{raw}': {e}"));
                return response_to_c_string(&error);
            }
        }
    };

    let employees: Vec<Employee> = match serde_json::from_str(&json) {
        Ok(rows) => rows,
        Err(e) => {
            let error = AppResponse::SerializationError(format!("Invalid employees JSON: {e}"));
            return response_to_c_string(&error);
        }
    };

    json_response(&birthday_filter::eligible_birthdays(&employees, today))
}

/// Releases the store. The pointer must not be used afterwards.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn close_portal_store(state: *mut PortalState) -> *const c_char {
    if state.is_null() {
        let error = AppResponse::BadRequest("Null state pointer passed to close_portal_store".to_string());
        return response_to_c_string(&error);
    }

    let state = unsafe { Box::from_raw(state) };
    info!("Closing portal store at: {}", state.config.storage_path);
    match state.close() {
        Ok(()) => response_to_c_string(&AppResponse::success("Portal store closed successfully")),
        Err(e) => response_to_c_string(&e),
    }
}

/// Frees a string returned by any function of this library.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn free_response(ptr: *const c_char) {
    if ptr.is_null() {
        return;
    }
    unsafe {
        drop(CString::from_raw(ptr as *mut c_char));
    }
}

fn resolve_year(year: i32) -> i32 {
    if year > 0 {
        year
    } else {
        Utc::now().year()
    }
}

fn state_ref<'a>(state: *mut PortalState) -> Result<&'a PortalState, *const c_char> {
    match unsafe { state.as_ref() } {
        Some(state) => Ok(state),
        None => Err(response_to_c_string(&AppResponse::BadRequest(
            "Null state pointer".to_string(),
        ))),
    }
}

fn json_response<T: Serialize + ?Sized>(value: &T) -> *const c_char {
    match serde_json::to_string(value) {
        Ok(json) => response_to_c_string(&AppResponse::Ok(json)),
        Err(e) => {
            let error = AppResponse::SerializationError(format!("Failed to serialize result: {e}"));
            response_to_c_string(&error)
        }
    }
}

/// Serializes an [`AppResponse`] into a heap C string owned by the caller.
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

fn c_ptr_to_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr).to_str().ok() }
}

/// Converts a C string argument, or returns a ready-made `BadRequest`
/// response naming `field_name`.
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
