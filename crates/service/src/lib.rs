//! Service layer for the extended info store.
//! - Keeps business rules independent of the HTTP framework.
//! - Reuses entity definitions and validation from the `models` crate.
//! - Storage, caching and host lookups sit behind traits with in-memory mocks.

pub mod directory;
pub mod errors;
pub mod extended_info;
pub mod listing;
pub mod metrics;
pub mod page;
pub mod pagination;
pub mod reconcile;
pub mod routing;
#[cfg(test)]
pub mod test_support;
