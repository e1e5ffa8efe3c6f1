use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use shelf_authz::Owned;

/// Shelf section a book is filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[sea_orm(string_value = "business")]
    Business,
    #[sea_orm(string_value = "life")]
    Life,
    #[sea_orm(string_value = "other")]
    Other,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Business, Category::Life, Category::Other];

    /// Parse the stored/submitted value (`business`, `life`, `other`).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "business" => Some(Category::Business),
            "life" => Some(Category::Life),
            "other" => Some(Category::Other),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Business => "business",
            Category::Life => "life",
            Category::Other => "other",
        }
    }

    /// Human-readable label for display.
    pub fn label(self) -> &'static str {
        match self {
            Category::Business => "Business",
            Category::Life => "Life",
            Category::Other => "Other",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "books")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub text: String,
    /// Path relative to the media root
    pub thumbnail: Option<String>,
    pub category: Category,
    pub user_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(has_many = "super::review::Entity")]
    Review,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::review::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Review.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Owned for Model {
    fn owner_id(&self) -> i32 {
        self.user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_round_trip_through_their_names() {
        for category in Category::ALL {
            assert_eq!(Category::parse(category.as_str()), Some(category));
        }
        assert_eq!(Category::parse("fiction"), None);
        assert_eq!(Category::Life.label(), "Life");
    }
}
