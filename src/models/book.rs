use sea_orm::entity::prelude::*;
use sea_orm::{NotSet, Set};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "books")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Natural key. Unique, compared case-insensitively (COLLATE NOCASE).
    #[sea_orm(unique)]
    pub title: String,
    pub author: Option<String>,
    pub genre: Option<String>,
    pub publisher: Option<String>,
    pub year: Option<i32>,
    pub isbn: Option<String>,
    /// Free-text location name, not a foreign key to `locations`.
    pub default_location: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::copy::Entity")]
    Copies,
}

impl Related<super::copy::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Copies.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

// DTO for API responses and catalog input
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Book {
    pub id: Option<i32>,
    pub title: String,
    pub author: Option<String>,
    pub genre: Option<String>,
    pub publisher: Option<String>,
    pub year: Option<i32>,
    pub isbn: Option<String>,
    pub default_location: Option<String>,
    pub notes: Option<String>,
}

impl From<Model> for Book {
    fn from(model: Model) -> Self {
        Self {
            id: Some(model.id),
            title: model.title,
            author: model.author,
            genre: model.genre,
            publisher: model.publisher,
            year: model.year,
            isbn: model.isbn,
            default_location: model.default_location,
            notes: model.notes,
        }
    }
}

impl From<Book> for ActiveModel {
    fn from(book: Book) -> Self {
        Self {
            id: book.id.map_or(NotSet, Set),
            title: Set(book.title),
            author: Set(book.author),
            genre: Set(book.genre),
            publisher: Set(book.publisher),
            year: Set(book.year),
            isbn: Set(book.isbn),
            default_location: Set(book.default_location),
            notes: Set(book.notes),
            created_at: NotSet,
            updated_at: NotSet,
        }
    }
}
