use serde::Serialize;
use shelf_http::AppError;

/// Requested page does not exist.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("page {requested} is out of range (1..={num_pages})")]
pub struct InvalidPage {
    pub requested: u64,
    pub num_pages: u64,
}

impl From<InvalidPage> for AppError {
    fn from(err: InvalidPage) -> Self {
        AppError::not_found(format!("Invalid page: {err}"))
    }
}

/// Splits `total` items into pages of `per_page`.
///
/// An empty list still has one (empty) first page.
#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    total: u64,
    per_page: u64,
}

impl Paginator {
    pub fn new(total: u64, per_page: u64) -> Self {
        Self {
            total,
            per_page: per_page.max(1),
        }
    }

    pub fn num_pages(&self) -> u64 {
        if self.total == 0 {
            1
        } else {
            self.total.div_ceil(self.per_page)
        }
    }

    /// Resolve a 1-based page number.
    pub fn page(&self, number: u64) -> Result<Page, InvalidPage> {
        let num_pages = self.num_pages();
        if number == 0 || number > num_pages {
            return Err(InvalidPage {
                requested: number,
                num_pages,
            });
        }

        let start = (number - 1) * self.per_page;
        let end = (start + self.per_page).min(self.total);

        Ok(Page {
            number,
            per_page: self.per_page,
            total: self.total,
            num_pages,
            start,
            end,
        })
    }
}

/// One resolved page: its bounds plus the metadata clients render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: u64,
    pub per_page: u64,
    pub total: u64,
    pub num_pages: u64,
    start: u64,
    end: u64,
}

impl Page {
    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    /// Row offset for database queries.
    pub fn offset(&self) -> u64 {
        self.start
    }

    /// Number of items on this page.
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cut this page out of an in-memory list of `total` items.
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = usize::try_from(self.start).unwrap_or(usize::MAX).min(items.len());
        let end = usize::try_from(self.end).unwrap_or(usize::MAX).min(items.len());
        &items[start..end]
    }

    pub fn meta(&self) -> PageMeta {
        PageMeta {
            number: self.number,
            per_page: self.per_page,
            total: self.total,
            num_pages: self.num_pages,
            has_previous: self.has_previous(),
            has_next: self.has_next(),
        }
    }
}

/// Serialized page metadata.
#[derive(Debug, Clone, Serialize)]
pub struct PageMeta {
    pub number: u64,
    pub per_page: u64,
    pub total: u64,
    pub num_pages: u64,
    pub has_previous: bool,
    pub has_next: bool,
}
