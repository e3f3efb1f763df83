//! CSV Service - merge import and export of the book catalog

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::Serialize;
use std::collections::HashMap;

use crate::domain::DomainError;
use crate::import;
use crate::infrastructure::repositories::copy_repository::open_copy_ids;
use crate::models::book::{self, Entity as BookEntity};
use crate::models::copy::Entity as CopyEntity;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
}

/// Header written even when the catalog is empty
pub const EXPORT_HEADERS: [&str; 6] = [
    "Title",
    "Author",
    "Genre",
    "Default_Location",
    "Copies",
    "Issued",
];

#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    #[serde(rename = "Title")]
    title: &'a str,
    #[serde(rename = "Author")]
    author: &'a str,
    #[serde(rename = "Genre")]
    genre: &'a str,
    #[serde(rename = "Default_Location")]
    default_location: &'a str,
    #[serde(rename = "Copies")]
    copies: usize,
    #[serde(rename = "Issued")]
    issued: usize,
}

/// Merge a books CSV into the catalog.
///
/// New titles are inserted; a title already present (case-insensitive)
/// has its author, genre and default location replaced by the row's
/// values. The whole file is applied in one DB transaction.
pub async fn import_books(
    db: &DatabaseConnection,
    content: &[u8],
) -> Result<ImportSummary, DomainError> {
    let parsed = import::parse_books_csv(content).map_err(DomainError::Import)?;
    let mut summary = ImportSummary {
        skipped: parsed.skipped,
        ..Default::default()
    };

    let txn = db.begin().await?;

    for row in parsed.books {
        let now = chrono::Utc::now().to_rfc3339();
        let existing = BookEntity::find()
            .filter(book::Column::Title.eq(row.title.as_str()))
            .one(&txn)
            .await?;

        match existing {
            Some(found) => {
                let mut active: book::ActiveModel = found.into();
                active.author = Set(row.author);
                active.genre = Set(row.genre);
                active.default_location = Set(row.default_location);
                active.updated_at = Set(now);
                active.update(&txn).await?;
                summary.updated += 1;
            }
            None => {
                let new_book = book::ActiveModel {
                    title: Set(row.title),
                    author: Set(row.author),
                    genre: Set(row.genre),
                    default_location: Set(row.default_location),
                    created_at: Set(now.clone()),
                    updated_at: Set(now),
                    ..Default::default()
                };
                new_book.insert(&txn).await?;
                summary.created += 1;
            }
        }
    }

    txn.commit().await?;

    tracing::info!(
        "CSV import: {} created, {} updated, {} skipped",
        summary.created,
        summary.updated,
        summary.skipped
    );
    Ok(summary)
}

/// Export the catalog as CSV ordered by title, with copy and issued counts.
pub async fn export_books(db: &DatabaseConnection) -> Result<String, DomainError> {
    let books = BookEntity::find()
        .order_by_asc(book::Column::Title)
        .all(db)
        .await?;
    let copies = CopyEntity::find().all(db).await?;
    let open = open_copy_ids(db, &[]).await?;

    let mut counts: HashMap<i32, (usize, usize)> = HashMap::new();
    for copy in &copies {
        let entry = counts.entry(copy.book_id).or_default();
        entry.0 += 1;
        if open.contains(&copy.id) {
            entry.1 += 1;
        }
    }

    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    wtr.write_record(EXPORT_HEADERS)
        .map_err(|e| DomainError::Database(format!("CSV write error: {}", e)))?;
    for b in &books {
        let (copies, issued) = counts.get(&b.id).copied().unwrap_or_default();
        wtr.serialize(ExportRow {
            title: &b.title,
            author: b.author.as_deref().unwrap_or_default(),
            genre: b.genre.as_deref().unwrap_or_default(),
            default_location: b.default_location.as_deref().unwrap_or_default(),
            copies,
            issued,
        })
        .map_err(|e| DomainError::Database(format!("CSV write error: {}", e)))?;
    }

    let bytes = wtr
        .into_inner()
        .map_err(|e| DomainError::Database(format!("CSV write error: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| DomainError::Database(format!("CSV encoding error: {}", e)))
}
