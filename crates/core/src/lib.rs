//! Trattoria Core - Shared domain types library.
//!
//! This crate provides the pure building blocks used by every Trattoria
//! component:
//! - `api` - HTTP backend for the catalogue, accounts, and delivery addresses
//! - `cli` - Command-line tools for migrations and account management
//!
//! # Architecture
//!
//! The core crate contains only types, traits, and pure functions - no I/O, no
//! database access, no HTTP. Everything here is deterministic and can be
//! tested without a runtime.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, emails, prices, and ratings
//! - [`slug`] - Canonical slug derivation for catalogue items
//! - [`patch`] - Tri-state field patches and the partial-update merge engine
//! - [`page`] - Pagination bounds and page-count math

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod page;
pub mod patch;
pub mod slug;
pub mod types;

pub use page::{Page, PageRequest, total_pages};
pub use patch::{Merge, MergeError, Patch, PatchSet, merge};
pub use slug::{SLUG_FALLBACK, slugify, with_suffix};
pub use types::*;
