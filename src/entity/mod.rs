//! SeaORM entities for the three tables the modules migrate.

pub mod book;
pub mod review;
pub mod user;

pub use book::Category;
