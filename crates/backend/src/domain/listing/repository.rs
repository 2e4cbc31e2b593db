use chrono::Utc;
use contracts::domain::common::{AggregateId, EntityMetadata};
use contracts::domain::listing::aggregate::{CarListing, ListingId, ListingPatch, NewListing};
use contracts::enums::listing_status::ListingStatus;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sea_orm::entity::prelude::*;
use sea_orm::sea_query::{Condition, Expr};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

use crate::error::CatalogError;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "listing")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub price: f64,
    pub mileage: Option<i64>,
    pub description: Option<String>,
    pub status: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for CarListing {
    fn from(m: Model) -> Self {
        let metadata = EntityMetadata {
            created_at: m.created_at,
            updated_at: m.updated_at,
        };
        let uuid = Uuid::parse_str(&m.id).unwrap_or_else(|_| Uuid::new_v4());

        CarListing {
            id: ListingId::new(uuid),
            make: m.make,
            model: m.model,
            year: m.year,
            price: m.price,
            mileage: m.mileage,
            description: m.description,
            status: ListingStatus::from_code(&m.status).unwrap_or(ListingStatus::Active),
            metadata,
        }
    }
}

/// Sort key for catalog queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    Price,
    Year,
    Mileage,
    #[default]
    CreatedAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDir {
    Asc,
    #[default]
    Desc,
}

/// Filter, sort and page window of one catalog query
#[derive(Debug, Clone)]
pub struct ListingQuery {
    pub make: Option<String>,
    pub model: Option<String>,
    pub q: Option<String>,
    pub status: Option<ListingStatus>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_year: Option<i32>,
    pub max_year: Option<i32>,
    pub sort_by: SortBy,
    pub sort_dir: SortDir,
    pub limit: u64,
    pub offset: u64,
}

impl Default for ListingQuery {
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
            sort_by: SortBy::default(),
            sort_dir: SortDir::default(),
            limit: 50,
            offset: 0,
        }
    }
}

/// All access to the listing table goes through here. The connection is
/// injected once at startup; tests construct their own against an in-memory
/// database.
#[derive(Clone)]
pub struct ListingRepository {
    conn: DatabaseConnection,
}

impl ListingRepository {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Assign identity and timestamps, persist, return the stored listing.
    /// Constraints are re-checked here; no write path may bypass them.
    pub async fn create(&self, draft: NewListing) -> Result<CarListing, CatalogError> {
        draft.validate()?;
        let listing = CarListing::new_for_insert(ListingId::new_v4(), draft);
        let active = ActiveModel {
            id: Set(listing.to_string_id()),
            make: Set(listing.make.clone()),
            model: Set(listing.model.clone()),
            year: Set(listing.year),
            price: Set(listing.price),
            mileage: Set(listing.mileage),
            description: Set(listing.description.clone()),
            status: Set(listing.status.code().to_string()),
            created_at: Set(listing.metadata.created_at),
            updated_at: Set(listing.metadata.updated_at),
        };
        active.insert(&self.conn).await?;
        Ok(listing)
    }

    pub async fn get(&self, id: ListingId) -> Result<CarListing, CatalogError> {
        let result = Entity::find_by_id(id.as_string()).one(&self.conn).await?;
        result
            .map(Into::into)
            .ok_or(CatalogError::NotFound(id.value()))
    }

    /// Apply only the supplied fields in a single UPDATE; the mutation is
    /// all-or-nothing and always refreshes `updated_at`.
    pub async fn update(
        &self,
        id: ListingId,
        patch: ListingPatch,
    ) -> Result<CarListing, CatalogError> {
        let mut update =
            Entity::update_many().col_expr(Column::UpdatedAt, Expr::value(Utc::now()));
        if let Some(make) = patch.make {
            update = update.col_expr(Column::Make, Expr::value(make));
        }
        if let Some(model) = patch.model {
            update = update.col_expr(Column::Model, Expr::value(model));
        }
        if let Some(year) = patch.year {
            update = update.col_expr(Column::Year, Expr::value(year));
        }
        if let Some(price) = patch.price {
            update = update.col_expr(Column::Price, Expr::value(price));
        }
        if let Some(mileage) = patch.mileage {
            update = update.col_expr(Column::Mileage, Expr::value(mileage));
        }
        if let Some(description) = patch.description {
            update = update.col_expr(Column::Description, Expr::value(description));
        }

        let result = update
            .filter(Column::Id.eq(id.as_string()))
            .exec(&self.conn)
            .await?;
        if result.rows_affected == 0 {
            return Err(CatalogError::NotFound(id.value()));
        }
        self.get(id).await
    }

    pub async fn mark_sold(&self, id: ListingId) -> Result<CarListing, CatalogError> {
        let result = Entity::update_many()
            .col_expr(Column::Status, Expr::value(ListingStatus::Sold.code()))
            .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(Column::Id.eq(id.as_string()))
            .exec(&self.conn)
            .await?;
        if result.rows_affected == 0 {
            return Err(CatalogError::NotFound(id.value()));
        }
        self.get(id).await
    }

    /// Hard delete. Deleting an absent row reports `NotFound`, the second
    /// delete of the same id included.
    pub async fn delete(&self, id: ListingId) -> Result<(), CatalogError> {
        let result = Entity::delete_by_id(id.as_string())
            .exec(&self.conn)
            .await?;
        if result.rows_affected == 0 {
            return Err(CatalogError::NotFound(id.value()));
        }
        Ok(())
    }

    /// Filtered, sorted page of listings plus the total match count over the
    /// same filter.
    pub async fn search(
        &self,
        query: &ListingQuery,
    ) -> Result<(Vec<CarListing>, u64), CatalogError> {
        let condition = build_condition(query);

        let total = Entity::find()
            .filter(condition.clone())
            .count(&self.conn)
            .await?;

        let mut find = Entity::find().filter(condition);
        find = match (query.sort_by, query.sort_dir) {
            (SortBy::Price, SortDir::Asc) => find.order_by_asc(Column::Price),
            (SortBy::Price, SortDir::Desc) => find.order_by_desc(Column::Price),
            (SortBy::Year, SortDir::Asc) => find.order_by_asc(Column::Year),
            (SortBy::Year, SortDir::Desc) => find.order_by_desc(Column::Year),
            (SortBy::Mileage, SortDir::Asc) => find.order_by_asc(Column::Mileage),
            (SortBy::Mileage, SortDir::Desc) => find.order_by_desc(Column::Mileage),
            (SortBy::CreatedAt, SortDir::Asc) => find.order_by_asc(Column::CreatedAt),
            (SortBy::CreatedAt, SortDir::Desc) => find.order_by_desc(Column::CreatedAt),
        };

        let items: Vec<CarListing> = find
            .limit(query.limit)
            .offset(query.offset)
            .all(&self.conn)
            .await?
            .into_iter()
            .map(Into::into)
            .collect();

        Ok((items, total))
    }
}

fn build_condition(query: &ListingQuery) -> Condition {
    let mut condition = Condition::all();
    if let Some(make) = &query.make {
        // LIKE without wildcards: case-insensitive equality in SQLite
        condition = condition.add(Column::Make.like(make));
    }
    if let Some(model) = &query.model {
        condition = condition.add(Column::Model.like(model));
    }
    if let Some(status) = query.status {
        condition = condition.add(Column::Status.eq(status.code()));
    }
    if let Some(min_price) = query.min_price {
        condition = condition.add(Column::Price.gte(min_price));
    }
    if let Some(max_price) = query.max_price {
        condition = condition.add(Column::Price.lte(max_price));
    }
    if let Some(min_year) = query.min_year {
        condition = condition.add(Column::Year.gte(min_year));
    }
    if let Some(max_year) = query.max_year {
        condition = condition.add(Column::Year.lte(max_year));
    }
    if let Some(q) = &query.q {
        condition = condition.add(
            Condition::any()
                .add(Column::Make.contains(q))
                .add(Column::Model.contains(q))
                .add(Column::Description.contains(q)),
        );
    }
    condition
}
