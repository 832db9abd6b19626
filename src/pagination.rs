//! Page tracking for paged API listings
//!
//! When the total item count is unknown, the tracker advances optimistically
//! and callers confirm the end of the listing from an empty result.

/// Default page size used when none is configured
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Current page, page size and optional total for a paged listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: u32,
    page_size: u32,
    total: Option<u64>,
}

impl Pagination {
    pub fn new(page_size: u32, total: Option<u64>) -> Self {
        Self {
            page: 1,
            page_size: page_size.max(1),
            total,
        }
    }

    /// Current 1-based page
    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn total(&self) -> Option<u64> {
        self.total
    }

    /// Number of pages, when the total is known
    pub fn total_pages(&self) -> Option<u32> {
        self.total.map(|total| {
            let pages = total.div_ceil(u64::from(self.page_size));
            u32::try_from(pages).unwrap_or(u32::MAX)
        })
    }

    /// Jump to `page`; pages below 1 clamp to 1
    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    /// Change the page size and go back to the first page
    pub fn set_page_size(&mut self, page_size: u32) {
        self.page_size = page_size.max(1);
        self.reset();
    }

    pub fn set_total(&mut self, total: Option<u64>) {
        self.total = total;
    }

    pub fn reset(&mut self) {
        self.page = 1;
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        match self.total_pages() {
            Some(pages) => self.page < pages,
            None => true,
        }
    }

    /// Advance one page if the known total allows it, or unconditionally if it is unknown
    pub fn next(&mut self) {
        if self.has_next() {
            self.page = self.page.saturating_add(1);
        }
    }

    /// Advance one page only if the caller says there is more
    pub fn next_with_hint(&mut self, has_next: bool) {
        if has_next {
            self.page = self.page.saturating_add(1);
        }
    }

    pub fn prev(&mut self) {
        if self.has_prev() {
            self.page -= 1;
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE, None)
    }
}
