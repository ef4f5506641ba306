//! Localization
//!
//! Stores never build user-facing text themselves; they pass a message key
//! (and a count or named parameters) to a [`Localizer`].

mod catalog;
pub mod keys;

pub use catalog::{Catalog, CatalogError};

/// Localized message lookup
pub trait Localizer: Send + Sync {
    /// Message for `key` with `{name}` placeholders replaced from `params`
    fn t(&self, key: &str, params: &[(&str, &str)]) -> String;

    /// Message for `key` pluralized on `count`
    fn tc(&self, key: &str, count: usize) -> String;
}
