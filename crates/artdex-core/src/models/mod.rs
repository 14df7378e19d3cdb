//! Data models for the artdex catalog.
//!
//! These types are the shape of `artlist.json` and of scan results; field
//! names match the on-disk document exactly.

mod artwork;

pub use artwork::*;
