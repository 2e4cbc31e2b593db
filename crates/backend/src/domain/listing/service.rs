use serde::{Deserialize, Serialize};

use contracts::domain::common::ValidationError;
use contracts::domain::listing::aggregate::{CarListing, ListingId, ListingPatch, NewListing};
use contracts::enums::listing_status::ListingStatus;

use super::repository::{ListingQuery, ListingRepository, SortBy, SortDir};
use crate::error::CatalogError;

/// Hard ceiling on one search page; keeps a single request's work bounded
pub const MAX_PAGE_SIZE: u64 = 100;
pub const DEFAULT_PAGE_SIZE: u64 = 20;

/// Recognized search options. Unknown parameters are rejected at
/// deserialization rather than ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchRequest {
    pub make: Option<String>,
    pub model: Option<String>,
    pub q: Option<String>,
    pub status: Option<ListingStatus>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_year: Option<i32>,
    pub max_year: Option<i32>,
    pub sort_by: Option<SortBy>,
    pub sort_dir: Option<SortDir>,
    #[serde(default)]
    pub page: u64,
    #[serde(default = "default_page_size")]
    pub page_size: u64,
}

fn default_page_size() -> u64 {
    DEFAULT_PAGE_SIZE
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self {
            make: None,
            model: None,
            q: None,
            status: None,
            min_price: None,
            max_price: None,
            min_year: None,
            max_year: None,
            sort_by: None,
            sort_dir: None,
            page: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// One page of search results plus pagination metadata
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub items: Vec<CarListing>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
    pub total_pages: u64,
}

/// The gatekeeper of catalog business rules; every external operation on
/// listings passes through here, never through the repository directly.
#[derive(Clone)]
pub struct CatalogService {
    repository: ListingRepository,
}

impl CatalogService {
    pub fn new(repository: ListingRepository) -> Self {
        Self { repository }
    }

    /// Validate a draft and persist it
    pub async fn add_listing(&self, draft: NewListing) -> Result<CarListing, CatalogError> {
        draft.validate()?;
        self.repository.create(draft).await
    }

    pub async fn get_listing(&self, id: ListingId) -> Result<CarListing, CatalogError> {
        self.repository.get(id).await
    }

    /// Validate only the fields present in the patch, then apply it
    pub async fn update_listing(
        &self,
        id: ListingId,
        patch: ListingPatch,
    ) -> Result<CarListing, CatalogError> {
        if patch.is_empty() {
            return Err(
                ValidationError::new("body", "at least one updatable field is required").into(),
            );
        }
        patch.validate()?;
        self.repository.update(id, patch).await
    }

    /// Take the listing off the market. Marking a sold listing again is a
    /// no-op that still returns the listing.
    pub async fn mark_sold(&self, id: ListingId) -> Result<CarListing, CatalogError> {
        self.repository.mark_sold(id).await
    }

    pub async fn remove_listing(&self, id: ListingId) -> Result<(), CatalogError> {
        self.repository.delete(id).await
    }

    /// Run a catalog search: clamp the page size, translate page/page_size
    /// into the storage window, and return the page with its totals.
    pub async fn search(&self, request: SearchRequest) -> Result<SearchResult, CatalogError> {
        let page_size = request.page_size.clamp(1, MAX_PAGE_SIZE);
        let offset = request.page.saturating_mul(page_size);

        // Unsorted searches list newest first, the storefront default
        let sort_by = request.sort_by.unwrap_or_default();
        let sort_dir = request.sort_dir.unwrap_or(match request.sort_by {
            None => SortDir::Desc,
            Some(_) => SortDir::Asc,
        });

        let query = ListingQuery {
            make: request.make,
            model: request.model,
            q: request.q,
            status: request.status,
            min_price: request.min_price,
            max_price: request.max_price,
            min_year: request.min_year,
            max_year: request.max_year,
            sort_by,
            sort_dir,
            limit: page_size,
            offset,
        };
        let (items, total) = self.repository.search(&query).await?;

        let total_pages = (total + page_size - 1) / page_size;
        Ok(SearchResult {
            items,
            total,
            page: request.page,
            page_size,
            total_pages,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db;

    fn draft(make: &str, model: &str, year: i32, price: f64) -> NewListing {
        NewListing {
            make: make.into(),
            model: model.into(),
            year,
            price,
            mileage: None,
            description: None,
        }
    }

    async fn service() -> CatalogService {
        CatalogService::new(ListingRepository::new(db::in_memory().await))
    }

    #[tokio::test]
    async fn add_then_get_returns_equal_listing() {
        let service = service().await;
        let created = service
            .add_listing(draft("Toyota", "Corolla", 2020, 15000.0))
            .await
            .unwrap();

        let fetched = service.get_listing(created.id).await.unwrap();
        assert_eq!(fetched.make, created.make);
        assert_eq!(fetched.price, created.price);
        assert_eq!(fetched.metadata.created_at, fetched.metadata.updated_at);
    }

    #[tokio::test]
    async fn rejected_input_is_not_persisted() {
        let service = service().await;
        let err = service
            .add_listing(draft("Toyota", "Corolla", 2020, -1.0))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Validation(_)));

        let result = service.search(SearchRequest::default()).await.unwrap();
        assert_eq!(result.total, 0);
        assert!(result.items.is_empty());
    }

    #[tokio::test]
    async fn empty_patch_is_rejected() {
        let service = service().await;
        let created = service
            .add_listing(draft("Toyota", "Corolla", 2020, 15000.0))
            .await
            .unwrap();

        let err = service
            .update_listing(created.id, ListingPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Validation(_)));
    }

    #[tokio::test]
    async fn invalid_patch_field_is_rejected() {
        let service = service().await;
        let created = service
            .add_listing(draft("Toyota", "Corolla", 2020, 15000.0))
            .await
            .unwrap();

        let err = service
            .update_listing(
                created.id,
                ListingPatch {
                    mileage: Some(-10),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Validation(_)));

        // the failed update must not have touched the row
        let fetched = service.get_listing(created.id).await.unwrap();
        assert_eq!(fetched.mileage, None);
        assert_eq!(fetched.metadata.updated_at, created.metadata.updated_at);
    }

    #[tokio::test]
    async fn remove_twice_reports_not_found() {
        let service = service().await;
        let created = service
            .add_listing(draft("Honda", "Civic", 2019, 18000.0))
            .await
            .unwrap();

        service.remove_listing(created.id).await.unwrap();
        let err = service.remove_listing(created.id).await.unwrap_err();
        assert!(matches!(err, CatalogError::NotFound(_)));
    }

    #[tokio::test]
    async fn search_clamps_page_size() {
        let service = service().await;
        let result = service
            .search(SearchRequest {
                page_size: 10_000,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(result.page_size, MAX_PAGE_SIZE);
    }

    #[tokio::test]
    async fn search_pagination_metadata_adds_up() {
        let service = service().await;
        for i in 0..5 {
            service
                .add_listing(draft("Toyota", &format!("Model{i}"), 2020, 1000.0 + i as f64))
                .await
                .unwrap();
        }

        let mut seen = std::collections::HashSet::new();
        for page in 0..3 {
            let result = service
                .search(SearchRequest {
                    page,
                    page_size: 2,
                    sort_by: Some(SortBy::Price),
                    ..Default::default()
                })
                .await
                .unwrap();
            assert_eq!(result.total, 5);
            assert_eq!(result.total_pages, 3);
            assert_eq!(result.page, page);
            for item in result.items {
                assert!(seen.insert(item.id));
            }
        }
        assert_eq!(seen.len(), 5);
    }

    #[tokio::test]
    async fn sold_listings_are_filterable_but_not_hidden() {
        let service = service().await;
        let first = service
            .add_listing(draft("Toyota", "Corolla", 2020, 15000.0))
            .await
            .unwrap();
        service
            .add_listing(draft("Honda", "Civic", 2019, 18000.0))
            .await
            .unwrap();

        let sold = service.mark_sold(first.id).await.unwrap();
        assert_eq!(sold.status, ListingStatus::Sold);

        // marking again keeps it sold
        let again = service.mark_sold(first.id).await.unwrap();
        assert_eq!(again.status, ListingStatus::Sold);

        let everything = service.search(SearchRequest::default()).await.unwrap();
        assert_eq!(everything.total, 2);

        let sold_only = service
            .search(SearchRequest {
                status: Some(ListingStatus::Sold),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(sold_only.total, 1);
        assert_eq!(sold_only.items[0].id, first.id);
    }
}
