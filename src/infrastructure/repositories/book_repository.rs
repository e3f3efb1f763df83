//! SeaORM implementation of BookRepository

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};

use crate::domain::errors::{optional, required};
use crate::domain::{BookFilter, BookRepository, DomainError};
use crate::models::Book;
use crate::models::book::{ActiveModel, Column, Entity as BookEntity};
use crate::models::copy::{Column as CopyColumn, Entity as CopyEntity};

/// SeaORM-based implementation of BookRepository
pub struct SeaOrmBookRepository {
    db: DatabaseConnection,
}

impl SeaOrmBookRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

/// Trim text fields and enforce the required title.
fn normalize(book: Book) -> Result<Book, DomainError> {
    Ok(Book {
        id: book.id,
        title: required("title", &book.title)?,
        author: optional(book.author),
        genre: optional(book.genre),
        publisher: optional(book.publisher),
        year: book.year,
        isbn: optional(book.isbn),
        default_location: optional(book.default_location),
        notes: optional(book.notes),
    })
}

fn duplicate_title(e: DomainError, title: &str) -> DomainError {
    match e {
        DomainError::DuplicateKey(_) => {
            DomainError::DuplicateKey(format!("a book titled '{}' already exists", title))
        }
        other => other,
    }
}

#[async_trait]
impl BookRepository for SeaOrmBookRepository {
    async fn find_all(&self, filter: BookFilter) -> Result<Vec<Book>, DomainError> {
        let mut query = BookEntity::find();

        if let Some(genre) = filter.genre.filter(|g| !g.is_empty()) {
            query = query.filter(Column::Genre.eq(genre));
        }

        if let Some(location) = filter.default_location.filter(|l| !l.is_empty()) {
            query = query.filter(Column::DefaultLocation.eq(location));
        }

        let books = query.order_by_asc(Column::Title).all(&self.db).await?;
        Ok(books.into_iter().map(Book::from).collect())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Book>, DomainError> {
        let book = BookEntity::find_by_id(id).one(&self.db).await?;
        Ok(book.map(Book::from))
    }

    async fn find_by_title(&self, title: &str) -> Result<Option<Book>, DomainError> {
        // Column collation is NOCASE, so equality is case-insensitive
        let book = BookEntity::find()
            .filter(Column::Title.eq(title.trim()))
            .one(&self.db)
            .await?;
        Ok(book.map(Book::from))
    }

    async fn create(&self, book: Book) -> Result<Book, DomainError> {
        let book = normalize(book)?;
        let now = chrono::Utc::now().to_rfc3339();
        let title = book.title.clone();

        let mut new_book: ActiveModel = Book { id: None, ..book }.into();
        new_book.created_at = Set(now.clone());
        new_book.updated_at = Set(now);

        let result = new_book
            .insert(&self.db)
            .await
            .map_err(|e| duplicate_title(e.into(), &title))?;

        tracing::info!("Book '{}' added to catalog (id {})", result.title, result.id);
        Ok(Book::from(result))
    }

    async fn update(&self, id: i32, book: Book) -> Result<Book, DomainError> {
        let book = normalize(book)?;
        let existing = BookEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Book {}", id)))?;

        let title = book.title.clone();
        let mut active: ActiveModel = existing.into();
        active.title = Set(book.title);
        active.author = Set(book.author);
        active.genre = Set(book.genre);
        active.publisher = Set(book.publisher);
        active.year = Set(book.year);
        active.isbn = Set(book.isbn);
        active.default_location = Set(book.default_location);
        active.notes = Set(book.notes);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let result = active
            .update(&self.db)
            .await
            .map_err(|e| duplicate_title(e.into(), &title))?;
        Ok(Book::from(result))
    }

    async fn delete(&self, id: i32) -> Result<(), DomainError> {
        let txn = self.db.begin().await?;

        let book = BookEntity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Book {}", id)))?;

        let copies = CopyEntity::find()
            .filter(CopyColumn::BookId.eq(id))
            .count(&txn)
            .await?;
        if copies > 0 {
            tracing::warn!(
                "Refusing to delete book '{}': {} copies reference it",
                book.title,
                copies
            );
            return Err(DomainError::ReferentialIntegrity(format!(
                "book '{}' still has {} cop{}",
                book.title,
                copies,
                if copies == 1 { "y" } else { "ies" }
            )));
        }

        BookEntity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        tracing::info!("Book '{}' deleted", book.title);
        Ok(())
    }
}
