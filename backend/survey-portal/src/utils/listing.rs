//! Search, filter and pagination for admin tables.

use serde::{Deserialize, Serialize};

pub const PAGE_SIZES: [usize; 4] = [10, 25, 50, 100];
pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
    /// 1-based.
    pub page: Option<usize>,
    pub page_size: Option<usize>,
    pub company_id: Option<String>,
    pub survey_id: Option<String>,
    pub question_id: Option<String>,
}

impl ListQuery {
    /// Lowercased, trimmed search text; `None` when blank.
    pub fn needle(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
    }

    /// Unsupported sizes fall back to the default.
    pub fn page_size(&self) -> usize {
        self.page_size
            .filter(|size| PAGE_SIZES.contains(size))
            .unwrap_or(DEFAULT_PAGE_SIZE)
    }

    pub fn company_filter(&self) -> Option<&str> {
        non_empty(self.company_id.as_deref())
    }

    pub fn survey_filter(&self) -> Option<&str> {
        non_empty(self.survey_id.as_deref())
    }

    pub fn question_filter(&self) -> Option<&str> {
        non_empty(self.question_id.as_deref())
    }

    pub fn paginate<T>(&self, items: Vec<T>) -> Page<T> {
        paginate(items, self.page.unwrap_or(1), self.page_size())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
    pub page_count: usize,
    /// 1-based index of the first row shown, 0 when there are no rows.
    pub showing_from: usize,
    pub showing_to: usize,
}

/// Slices one page out of `items`. Out-of-range pages clamp to the last page.
pub fn paginate<T>(items: Vec<T>, page: usize, page_size: usize) -> Page<T> {
    let page_size = page_size.max(1);
    let total = items.len();
    let page_count = total.div_ceil(page_size).max(1);
    let page = page.clamp(1, page_count);

    let start = (page - 1) * page_size;
    let showing_to = total.min(start + page_size);
    let showing_from = if total == 0 { 0 } else { start + 1 };

    let items = items.into_iter().skip(start).take(page_size).collect();

    Page {
        items,
        total,
        page,
        page_size,
        page_count,
        showing_from,
        showing_to,
    }
}

/// Any field contains the (already lowercased) needle.
pub fn any_field_contains(fields: &[&str], needle: &str) -> bool {
    fields.iter().any(|f| f.to_lowercase().contains(needle))
}

/// The space-joined row contains the needle, so matches may span columns.
pub fn row_contains(fields: &[&str], needle: &str) -> bool {
    fields.join(" ").to_lowercase().contains(needle)
}
