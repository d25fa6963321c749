//! Offset pagination

use serde::Serialize;

/// Default number of rows per page
pub const PAGE_SIZE: u32 = 20;

/// Effective page of a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Page {
    /// One-based page index, always within `1..=num_pages`
    pub page: u64,
    pub num_pages: u64,
    pub offset: u64,
    pub limit: u32,
}

/// Clamp `requested_page` into the pages available for `total_rows`.
///
/// There is always at least one page, even for an empty table. Out-of-range
/// requests are moved to the nearest valid page.
pub fn paginate(total_rows: u64, requested_page: i64, page_size: u32) -> Page {
    let page_size = page_size.max(1);
    let num_pages = total_rows.div_ceil(page_size as u64).max(1);
    let page = requested_page.clamp(1, num_pages.min(i64::MAX as u64) as i64) as u64;

    Page {
        page,
        num_pages,
        offset: (page - 1) * page_size as u64,
        limit: page_size,
    }
}
