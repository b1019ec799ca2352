use async_trait::async_trait;

use crate::models::{Article, CatalogItem};
use crate::repository::{RepoError, Repository};

/// Page
///
/// A bounded slice of an ordered record collection plus its pagination
/// metadata.
///
/// Invariants: `items.len() <= page_size`; `number` is in
/// `[1, total_pages]` whenever `total_pages > 0`; an empty collection yields
/// `total_pages == 0` with an empty item sequence and `number == 1`.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-indexed page number actually served.
    pub number: u32,
    /// Ceiling of total record count over page size.
    pub total_pages: u32,
}

/// PageLink
///
/// One entry of the renderable pagination-control descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLink {
    pub number: u32,
    pub href: String,
    pub current: bool,
}

/// RecordSource
///
/// The seam that lets one paginator serve two unrelated record kinds. A
/// source only knows how to count its collection and fetch a contiguous
/// slice of it in stable id order.
#[async_trait]
pub trait RecordSource: Send + Sync {
    type Record: Send;

    async fn total(&self) -> Result<i64, RepoError>;
    async fn slice(&self, limit: i64, offset: i64) -> Result<Vec<Self::Record>, RepoError>;
}

/// CatalogSource
///
/// Adapts the repository's catalog-item listing, optionally restricted to a
/// single category code.
pub struct CatalogSource<'a> {
    pub repo: &'a dyn Repository,
    pub category: Option<i32>,
}

#[async_trait]
impl<'a> RecordSource for CatalogSource<'a> {
    type Record = CatalogItem;

    async fn total(&self) -> Result<i64, RepoError> {
        self.repo.count_items(self.category).await
    }

    async fn slice(&self, limit: i64, offset: i64) -> Result<Vec<CatalogItem>, RepoError> {
        self.repo.list_items(self.category, limit, offset).await
    }
}

/// NewsSource
///
/// Adapts the repository's article listing.
pub struct NewsSource<'a> {
    pub repo: &'a dyn Repository,
}

#[async_trait]
impl<'a> RecordSource for NewsSource<'a> {
    type Record = Article;

    async fn total(&self) -> Result<i64, RepoError> {
        self.repo.count_articles().await
    }

    async fn slice(&self, limit: i64, offset: i64) -> Result<Vec<Article>, RepoError> {
        self.repo.list_articles(limit, offset).await
    }
}

/// Paginator
///
/// Slices an ordered record collection into fixed-size pages for whichever
/// record kind the source serves.
pub struct Paginator<S> {
    page_size: i64,
    source: S,
}

impl<S: RecordSource> Paginator<S> {
    /// `page_size` must be positive; listing page sizes come from the
    /// validated configuration.
    pub fn new(page_size: i64, source: S) -> Self {
        debug_assert!(page_size > 0);
        Self { page_size, source }
    }

    /// page
    ///
    /// Fetches the requested page. Out-of-range page numbers clamp to the
    /// nearest valid page: 0 becomes 1, anything past the end becomes the
    /// last page. A filter with no matches yields the empty page, never an
    /// error.
    pub async fn page(&self, requested: u32) -> Result<Page<S::Record>, RepoError> {
        let total = self.source.total().await?;
        let total_pages = total_pages(total, self.page_size);

        if total_pages == 0 {
            return Ok(Page {
                items: Vec::new(),
                number: 1,
                total_pages: 0,
            });
        }

        let number = requested.clamp(1, total_pages);
        let offset = (i64::from(number) - 1) * self.page_size;
        let items = self.source.slice(self.page_size, offset).await?;

        Ok(Page {
            items,
            number,
            total_pages,
        })
    }
}

/// Ceiling division of the record count by the page size.
pub fn total_pages(total: i64, page_size: i64) -> u32 {
    if total <= 0 {
        0
    } else {
        ((total + page_size - 1) / page_size) as u32
    }
}

/// controls
///
/// Builds the renderable pagination descriptor for a served page: one link
/// per page of the same query, with the current page marked.
pub fn controls<T>(page: &Page<T>, base: &str) -> Vec<PageLink> {
    (1..=page.total_pages)
        .map(|number| PageLink {
            number,
            href: format!("{base}?page={number}"),
            current: number == page.number,
        })
        .collect()
}
