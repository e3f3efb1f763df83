//! Reporting Service - read-only queries over the store
//!
//! Nothing here mutates state.

use chrono::NaiveDate;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::domain::{CopyDto, DomainError};
use crate::infrastructure::repositories::copy_repository::open_copy_ids;
use crate::models::Book;
use crate::models::book::{self, Entity as BookEntity};
use crate::models::copy::{self, CopyStatus, Entity as CopyEntity};
use crate::services::circulation_service::{self, TransactionDetails};

/// Label used for books without a genre
pub const NO_GENRE: &str = "(none)";

/// Where one copy of a search hit currently is
#[derive(Debug, Clone, Serialize)]
pub struct CopyLocation {
    pub copy_id: i32,
    pub accession_no: String,
    pub current_location: Option<String>,
    pub status: CopyStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub book: Book,
    pub copies: Vec<CopyLocation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenreCount {
    pub genre: String,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub as_of: NaiveDate,
    pub total_books: u64,
    pub total_copies: u64,
    pub issued_copies: u64,
    pub genres: Vec<GenreCount>,
    pub overdue: Vec<TransactionDetails>,
}

/// What is assigned to, and what currently sits at, one location
#[derive(Debug, Clone, Serialize)]
pub struct LocationContents {
    pub location_id: String,
    /// Books whose default location is this one
    pub books: Vec<Book>,
    /// Copies whose current location is this one
    pub copies: Vec<CopyDto>,
}

#[derive(Debug, FromQueryResult)]
struct GenreRow {
    genre: Option<String>,
    count: i64,
}

fn matches(haystack: Option<&str>, needle: &str) -> bool {
    haystack
        .map(|h| h.to_lowercase().contains(needle))
        .unwrap_or(false)
}

/// Case-insensitive substring search over title and author.
/// Each hit carries its copies' current locations. A blank query matches nothing.
pub async fn search(db: &DatabaseConnection, q: &str) -> Result<Vec<SearchHit>, DomainError> {
    let needle = q.trim().to_lowercase();
    if needle.is_empty() {
        return Ok(Vec::new());
    }

    let books: Vec<book::Model> = BookEntity::find()
        .order_by_asc(book::Column::Title)
        .all(db)
        .await?
        .into_iter()
        .filter(|b| matches(Some(&b.title), &needle) || matches(b.author.as_deref(), &needle))
        .collect();

    tracing::debug!("Search '{}' matched {} books", q, books.len());
    if books.is_empty() {
        return Ok(Vec::new());
    }

    let book_ids: Vec<i32> = books.iter().map(|b| b.id).collect();
    let copies = CopyEntity::find()
        .filter(copy::Column::BookId.is_in(book_ids))
        .order_by_asc(copy::Column::AccessionNo)
        .all(db)
        .await?;
    let copy_ids: Vec<i32> = copies.iter().map(|c| c.id).collect();
    let open = if copy_ids.is_empty() {
        Default::default()
    } else {
        open_copy_ids(db, &copy_ids).await?
    };

    let mut by_book: HashMap<i32, Vec<CopyLocation>> = HashMap::new();
    for c in copies {
        by_book.entry(c.book_id).or_default().push(CopyLocation {
            copy_id: c.id,
            status: CopyStatus::from_open(open.contains(&c.id)),
            accession_no: c.accession_no,
            current_location: c.current_location,
        });
    }

    Ok(books
        .into_iter()
        .map(|b| SearchHit {
            copies: by_book.remove(&b.id).unwrap_or_default(),
            book: Book::from(b),
        })
        .collect())
}

/// Book count per genre, blank and missing genres folded into `(none)`,
/// largest first.
pub async fn genre_distribution(db: &DatabaseConnection) -> Result<Vec<GenreCount>, DomainError> {
    let rows = BookEntity::find()
        .select_only()
        .column(book::Column::Genre)
        .column_as(book::Column::Id.count(), "count")
        .group_by(book::Column::Genre)
        .into_model::<GenreRow>()
        .all(db)
        .await?;

    Ok(fold_genres(
        rows.into_iter().map(|r| (r.genre, r.count.max(0) as u64)),
    ))
}

fn fold_genres(rows: impl Iterator<Item = (Option<String>, u64)>) -> Vec<GenreCount> {
    let mut folded: BTreeMap<String, u64> = BTreeMap::new();
    for (genre, count) in rows {
        let genre = genre
            .map(|g| g.trim().to_string())
            .filter(|g| !g.is_empty())
            .unwrap_or_else(|| NO_GENRE.to_string());
        *folded.entry(genre).or_default() += count;
    }

    let mut genres: Vec<GenreCount> = folded
        .into_iter()
        .map(|(genre, count)| GenreCount { genre, count })
        .collect();
    genres.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.genre.cmp(&b.genre)));
    genres
}

/// Aggregate counts plus the overdue list as of `as_of`
pub async fn dashboard(db: &DatabaseConnection, as_of: NaiveDate) -> Result<Dashboard, DomainError> {
    let total_books = BookEntity::find().count(db).await?;
    let total_copies = CopyEntity::find().count(db).await?;
    let issued_copies = circulation_service::count_open(db).await?;
    let genres = genre_distribution(db).await?;
    let overdue = circulation_service::overdue_transactions(db, as_of).await?;

    Ok(Dashboard {
        as_of,
        total_books,
        total_copies,
        issued_copies,
        genres,
        overdue,
    })
}

/// Books assigned to and copies currently at a location (case-insensitive).
/// The location does not have to exist in the `locations` table.
pub async fn location_contents(
    db: &DatabaseConnection,
    location_id: &str,
) -> Result<LocationContents, DomainError> {
    let location_id = location_id.trim();

    let books = BookEntity::find()
        .filter(book::Column::DefaultLocation.eq(location_id))
        .order_by_asc(book::Column::Title)
        .all(db)
        .await?;

    let copies_with_books = CopyEntity::find()
        .filter(copy::Column::CurrentLocation.eq(location_id))
        .find_also_related(BookEntity)
        .all(db)
        .await?;
    let copy_ids: Vec<i32> = copies_with_books.iter().map(|(c, _)| c.id).collect();
    let open = if copy_ids.is_empty() {
        Default::default()
    } else {
        open_copy_ids(db, &copy_ids).await?
    };

    let mut copies: Vec<CopyDto> = copies_with_books
        .into_iter()
        .map(|(c, b)| CopyDto {
            id: c.id,
            book_id: c.book_id,
            status: CopyStatus::from_open(open.contains(&c.id)),
            accession_no: c.accession_no,
            condition: c.condition,
            acquisition_date: c.acquisition_date,
            purchase_price: c.purchase_price,
            current_location: c.current_location,
            book_title: b.map(|b| b.title),
        })
        .collect();
    copies.sort_by(|a, b| a.book_title.cmp(&b.book_title));

    Ok(LocationContents {
        location_id: location_id.to_string(),
        books: books.into_iter().map(Book::from).collect(),
        copies,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genres_fold_blank_into_none_and_sort_by_count() {
        let rows = vec![
            (Some("SciFi".to_string()), 3),
            (None, 1),
            (Some("".to_string()), 1),
            (Some("Fantasy".to_string()), 3),
            (Some("History".to_string()), 1),
        ];
        let genres = fold_genres(rows.into_iter());
        assert_eq!(
            genres,
            vec![
                GenreCount { genre: "Fantasy".into(), count: 3 },
                GenreCount { genre: "SciFi".into(), count: 3 },
                GenreCount { genre: NO_GENRE.into(), count: 2 },
                GenreCount { genre: "History".into(), count: 1 },
            ]
        );
    }

    #[test]
    fn matches_is_case_insensitive() {
        assert!(matches(Some("Frank Herbert"), "herb"));
        assert!(!matches(None, "herb"));
        assert!(!matches(Some("Dune"), "dunes"));
    }
}
