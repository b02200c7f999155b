//! Selector based stores.
//!
//! A [`Store`] is a read-only collection that can be searched
//! with a [`Selector`]. Items are handed out as shared
//! [`Arc`][alloc::sync::Arc]s rather than copies.
//!
//! ```
//! use kestrel_store::{CollectionStore, Store};
//!
//! let store: CollectionStore<u32> = (1..=10).collect();
//! let even = store.get_matches(&|n: &u32| n % 2 == 0)?;
//! assert_eq!(even.len(), 5);
//! # Ok::<(), kestrel_store::StoreError>(())
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![cfg_attr(not(any(test, doctest, feature = "std")), no_std)]
#![forbid(unsafe_code)]
#![warn(missing_docs)]

extern crate alloc;

pub mod pkix;
mod selector;
mod store;

pub use selector::*;
pub use store::*;
