//! Page selection for management listings.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// 1-based page index
    pub page: u32,
    pub per_page: u32,
}

impl Pagination {
    pub const MAX_PER_PAGE: u32 = 100;

    /// Clamp to sane values: page 0 becomes 1, per_page within `1..=MAX_PER_PAGE`.
    pub fn normalize(self) -> Self {
        Self { page: self.page.max(1), per_page: self.per_page.clamp(1, Self::MAX_PER_PAGE) }
    }

    /// Slice of `items` on this page; empty past the end.
    pub fn apply<T>(self, items: Vec<T>) -> Vec<T> {
        let p = self.normalize();
        let skip = (p.page as usize - 1).saturating_mul(p.per_page as usize);
        items.into_iter().skip(skip).take(p.per_page as usize).collect()
    }
}

impl Default for Pagination {
    fn default() -> Self { Self { page: 1, per_page: 20 } }
}

#[cfg(test)]
mod tests {
    use super::Pagination;

    #[test]
    fn normalize_clamps_zero_to_defaults() {
        let p = Pagination { page: 0, per_page: 0 }.normalize();
        assert_eq!(p, Pagination { page: 1, per_page: 1 });
    }

    #[test]
    fn normalize_clamps_upper_bound() {
        let p = Pagination { page: 5, per_page: 1000 }.normalize();
        assert_eq!(p, Pagination { page: 5, per_page: 100 });
    }

    #[test]
    fn apply_slices_pages() {
        let items: Vec<u32> = (1..=7).collect();
        assert_eq!(Pagination { page: 1, per_page: 3 }.apply(items.clone()), vec![1, 2, 3]);
        assert_eq!(Pagination { page: 3, per_page: 3 }.apply(items.clone()), vec![7]);
        assert!(Pagination { page: 4, per_page: 3 }.apply(items).is_empty());
    }
}
