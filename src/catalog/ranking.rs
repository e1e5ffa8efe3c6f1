use std::cmp::Ordering;
use std::collections::HashMap;

use crate::entity::book;

/// A book with its aggregated review score.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedBook {
    pub book: book::Model,
    /// Mean review rate; `None` when the book has no reviews
    pub avg_rating: Option<f64>,
    pub review_count: i64,
}

/// Aggregate of one book's reviews.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rating {
    pub avg: f64,
    pub count: i64,
}

/// Mean of a set of rates, `None` for an empty set.
pub fn average(rates: &[i32]) -> Option<f64> {
    if rates.is_empty() {
        return None;
    }
    let sum: i64 = rates.iter().map(|&r| i64::from(r)).sum();
    Some(sum as f64 / rates.len() as f64)
}

/// Attach ratings to books and order them for the ranking list.
pub fn rank(books: Vec<book::Model>, ratings: &HashMap<i32, Rating>) -> Vec<RankedBook> {
    let mut ranked: Vec<RankedBook> = books
        .into_iter()
        .map(|book| {
            let rating = ratings.get(&book.id);
            RankedBook {
                avg_rating: rating.map(|r| r.avg),
                review_count: rating.map_or(0, |r| r.count),
                book,
            }
        })
        .collect();
    ranked.sort_by(ranking_order);
    ranked
}

/// Highest average first; unrated books after every rated one; ties newest first.
pub fn ranking_order(a: &RankedBook, b: &RankedBook) -> Ordering {
    let by_rating = match (a.avg_rating, b.avg_rating) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_rating.then_with(|| b.book.id.cmp(&a.book.id))
}
