use chrono::{Duration, Local};

use crate::domain::{CreateCopyInput, DomainError};
use crate::infrastructure::AppState;
use crate::models::{Book, MemberDto};
use crate::services::circulation_service;

/// Populate an empty catalog with a few books, copies, members and one loan.
/// Does nothing when books already exist.
pub async fn seed_demo_data(state: &AppState) -> Result<(), DomainError> {
    if !state.book_repo.find_all(Default::default()).await?.is_empty() {
        tracing::info!("Catalog not empty, skipping demo data");
        return Ok(());
    }

    let books = vec![
        ("Dune", "Frank Herbert", "SciFi", "Compartment 1"),
        ("Foundation", "Isaac Asimov", "SciFi", "Compartment 1"),
        ("The Hobbit", "J.R.R. Tolkien", "Fantasy", "Compartment 2"),
        ("Emma", "Jane Austen", "Classics", "Compartment 3"),
    ];

    let mut first_copy = None;
    for (i, (title, author, genre, location)) in books.into_iter().enumerate() {
        let book = state
            .book_repo
            .create(Book {
                title: title.to_owned(),
                author: Some(author.to_owned()),
                genre: Some(genre.to_owned()),
                default_location: Some(location.to_owned()),
                ..Default::default()
            })
            .await?;

        let copy = state
            .copy_repo
            .create(CreateCopyInput {
                book_id: book.id.unwrap_or_default(),
                accession_no: format!("ACC{:03}", i + 1),
                condition: Some("good".to_owned()),
                ..Default::default()
            })
            .await?;
        first_copy.get_or_insert(copy.id);
    }

    let alice = state
        .member_repo
        .create(MemberDto {
            name: "Alice".to_owned(),
            email: Some("alice@example.org".to_owned()),
            ..Default::default()
        })
        .await?;
    state
        .member_repo
        .create(MemberDto {
            name: "Bob".to_owned(),
            ..Default::default()
        })
        .await?;

    if let (Some(copy_id), Some(member_id)) = (first_copy, alice.id) {
        let today = Local::now().date_naive();
        circulation_service::issue(
            state.db(),
            copy_id,
            member_id,
            today,
            Some(today + Duration::days(14)),
        )
        .await?;
    }

    Ok(())
}
