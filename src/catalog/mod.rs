//! Catalog reads shared by the books and reviews modules: the newest list,
//! the rating ranking, and page resolution.

pub mod pagination;
pub mod ranking;

use std::collections::HashMap;

use sea_orm::sea_query::{Expr, Func, SimpleExpr};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, FromQueryResult, QueryFilter, QueryOrder,
    QuerySelect,
};

use crate::entity::{book, review};

pub use pagination::{InvalidPage, Page, PageMeta, Paginator};
pub use ranking::{average, rank, RankedBook, Rating};

#[derive(Debug, FromQueryResult)]
struct RatingRow {
    book_id: i32,
    avg_rating: Option<f64>,
    review_count: i64,
}

/// Every book, newest first.
pub async fn newest<C: ConnectionTrait>(db: &C) -> Result<Vec<book::Model>, DbErr> {
    book::Entity::find()
        .order_by_desc(book::Column::Id)
        .all(db)
        .await
}

/// Average rate and review count per reviewed book.
pub async fn ratings<C: ConnectionTrait>(db: &C) -> Result<HashMap<i32, Rating>, DbErr> {
    let rows = review::Entity::find()
        .select_only()
        .column(review::Column::BookId)
        .column_as(
            SimpleExpr::from(Func::avg(Expr::col(review::Column::Rate))),
            "avg_rating",
        )
        .column_as(
            SimpleExpr::from(Func::count(Expr::col(review::Column::Id))),
            "review_count",
        )
        .group_by(review::Column::BookId)
        .into_model::<RatingRow>()
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .filter_map(|row| {
            row.avg_rating.map(|avg| {
                (
                    row.book_id,
                    Rating {
                        avg,
                        count: row.review_count,
                    },
                )
            })
        })
        .collect())
}

/// Every book ordered for the ranking list.
pub async fn ranking<C: ConnectionTrait>(db: &C) -> Result<Vec<RankedBook>, DbErr> {
    let books = book::Entity::find().all(db).await?;
    let ratings = ratings(db).await?;
    Ok(rank(books, &ratings))
}

/// Reviews of one book, newest first.
pub async fn reviews_for<C: ConnectionTrait>(
    db: &C,
    book_id: i32,
) -> Result<Vec<review::Model>, DbErr> {
    review::Entity::find()
        .filter(review::Column::BookId.eq(book_id))
        .order_by_desc(review::Column::Id)
        .all(db)
        .await
}
