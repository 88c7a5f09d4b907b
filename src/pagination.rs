//! Page arithmetic for the list endpoints

use std::ops::Range;

/// Splits `count` rows into pages of `per_page`
#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    count: usize,
    per_page: usize,
}

impl Paginator {
    pub fn new(count: usize, per_page: usize) -> Self {
        Self {
            count,
            per_page: per_page.max(1),
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Number of pages; an empty list still has one (empty) page
    pub fn num_pages(&self) -> usize {
        self.count.div_ceil(self.per_page).max(1)
    }

    /// Resolves the raw `page` query value to a valid page number
    ///
    /// Missing or non-numeric values give page 1, numbers outside
    /// `1..=num_pages` give the last page.
    pub fn resolve_page(&self, raw: Option<&str>) -> usize {
        let Some(number) = raw.and_then(|raw| raw.trim().parse::<i64>().ok()) else {
            return 1;
        };

        let last = self.num_pages();
        if number < 1 || number as u64 > last as u64 {
            last
        } else {
            number as usize
        }
    }

    /// Row offsets covered by `page`
    pub fn bounds(&self, page: usize) -> Range<usize> {
        let start = (page.saturating_sub(1) * self.per_page).min(self.count);
        let end = (start + self.per_page).min(self.count);
        start..end
    }
}
