use chrono::NaiveDate;
use libdesk::db;
use libdesk::domain::{BookFilter, CopyDto, CreateCopyInput, DomainError, UpdateCopyInput};
use libdesk::infrastructure::AppState;
use libdesk::models::copy::CopyStatus;
use libdesk::models::transaction;
use libdesk::models::{Book, MemberDto};
use libdesk::services::circulation_service::{self, TransactionFilter};
use libdesk::services::{csv_service, report_service};
use sea_orm::{ActiveModelTrait, Set};

// Helper to create a fresh in-memory store
async fn setup_state() -> AppState {
    let db = db::init_db("sqlite::memory:")
        .await
        .expect("Failed to init DB");
    AppState::new(db)
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

async fn create_book(state: &AppState, title: &str, author: &str, genre: Option<&str>) -> i32 {
    state
        .book_repo
        .create(Book {
            title: title.to_string(),
            author: Some(author.to_string()),
            genre: genre.map(str::to_string),
            default_location: Some("Compartment 5".to_string()),
            ..Default::default()
        })
        .await
        .expect("Failed to create book")
        .id
        .expect("book id")
}

async fn create_copy(state: &AppState, book_id: i32, accession_no: &str) -> i32 {
    state
        .copy_repo
        .create(CreateCopyInput {
            book_id,
            accession_no: accession_no.to_string(),
            ..Default::default()
        })
        .await
        .expect("Failed to create copy")
        .id
}

async fn create_member(state: &AppState, name: &str) -> i32 {
    state
        .member_repo
        .create(MemberDto {
            name: name.to_string(),
            ..Default::default()
        })
        .await
        .expect("Failed to create member")
        .id
        .expect("member id")
}

#[tokio::test]
async fn test_duplicate_title_is_rejected_case_insensitively() {
    let state = setup_state().await;
    create_book(&state, "Dune", "Frank Herbert", Some("SciFi")).await;

    let err = state
        .book_repo
        .create(Book {
            title: "dune".to_string(),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::DuplicateKey(_)), "got {:?}", err);

    let books = state.book_repo.find_all(BookFilter::default()).await.unwrap();
    assert_eq!(books.len(), 1);
}

#[tokio::test]
async fn test_blank_title_is_a_validation_error() {
    let state = setup_state().await;
    let err = state
        .book_repo
        .create(Book {
            title: "   ".to_string(),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_copy_requires_existing_book_and_unique_accession() {
    let state = setup_state().await;
    let book_id = create_book(&state, "Dune", "Frank Herbert", None).await;
    create_copy(&state, book_id, "ACC001").await;

    let err = state
        .copy_repo
        .create(CreateCopyInput {
            book_id,
            accession_no: "ACC001".to_string(),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::DuplicateKey(_)), "got {:?}", err);

    let err = state
        .copy_repo
        .create(CreateCopyInput {
            book_id: 999,
            accession_no: "ACC002".to_string(),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::ForeignKeyViolation(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_new_copy_starts_at_book_default_location() {
    let state = setup_state().await;
    let book_id = create_book(&state, "Dune", "Frank Herbert", None).await;
    let copy_id = create_copy(&state, book_id, "ACC001").await;

    let copy: CopyDto = state.copy_repo.find_by_id(copy_id).await.unwrap().unwrap();
    assert_eq!(copy.current_location.as_deref(), Some("Compartment 5"));
    assert_eq!(copy.status, CopyStatus::Available);
    assert_eq!(copy.book_title.as_deref(), Some("Dune"));

    let moved = state
        .copy_repo
        .update(
            copy_id,
            UpdateCopyInput {
                current_location: Some(Some("Compartment 9".to_string())),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(moved.current_location.as_deref(), Some("Compartment 9"));
    assert_eq!(moved.accession_no, "ACC001");
}

#[tokio::test]
async fn test_book_with_copies_cannot_be_deleted() {
    let state = setup_state().await;
    let book_id = create_book(&state, "Dune", "Frank Herbert", None).await;
    let copy_id = create_copy(&state, book_id, "ACC001").await;

    let err = state.book_repo.delete(book_id).await.unwrap_err();
    assert!(matches!(err, DomainError::ReferentialIntegrity(_)), "got {:?}", err);
    assert!(state.book_repo.find_by_id(book_id).await.unwrap().is_some());

    state.copy_repo.delete(copy_id).await.unwrap();
    state.book_repo.delete(book_id).await.unwrap();
    assert!(state.book_repo.find_by_id(book_id).await.unwrap().is_none());

    let err = state.book_repo.delete(book_id).await.unwrap_err();
    assert!(matches!(err, DomainError::NotFound(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_issue_return_and_overdue_flow() {
    let state = setup_state().await;
    let db = state.db();
    let book_id = create_book(&state, "Dune", "Frank Herbert", Some("SciFi")).await;
    let copy_id = create_copy(&state, book_id, "ACC001").await;
    let alice = create_member(&state, "Alice").await;
    let bob = create_member(&state, "Bob").await;

    let tx = circulation_service::issue(
        db,
        copy_id,
        alice,
        date(2024, 1, 1),
        Some(date(2024, 1, 15)),
    )
    .await
    .unwrap();
    assert!(tx.is_open());
    assert_eq!(
        circulation_service::copy_status(db, copy_id).await.unwrap(),
        CopyStatus::Issued
    );

    // Second issue of the same copy is rejected and changes nothing
    let err = circulation_service::issue(db, copy_id, bob, date(2024, 1, 2), None)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::AlreadyIssued(_)), "got {:?}", err);
    assert_eq!(circulation_service::count_open(db).await.unwrap(), 1);

    let overdue = circulation_service::overdue_transactions(db, date(2024, 1, 20))
        .await
        .unwrap();
    assert_eq!(overdue.len(), 1);
    assert_eq!(overdue[0].member_name, "Alice");
    assert_eq!(overdue[0].book_title, "Dune");
    assert!(overdue[0].overdue);

    // Due date itself is not overdue
    let on_due = circulation_service::overdue_transactions(db, date(2024, 1, 15))
        .await
        .unwrap();
    assert!(on_due.is_empty());

    let returned = circulation_service::return_copy(db, "ACC001", date(2024, 1, 18))
        .await
        .unwrap();
    assert_eq!(returned.id, tx.id);
    assert_eq!(returned.return_date, Some(date(2024, 1, 18)));
    assert_eq!(
        circulation_service::copy_status(db, copy_id).await.unwrap(),
        CopyStatus::Available
    );

    let overdue = circulation_service::overdue_transactions(db, date(2024, 1, 20))
        .await
        .unwrap();
    assert!(overdue.is_empty());

    // Copy is free again
    circulation_service::issue(db, copy_id, bob, date(2024, 1, 20), None)
        .await
        .unwrap();
    let history = circulation_service::list_transactions(
        db,
        TransactionFilter {
            copy_id: Some(copy_id),
            ..Default::default()
        },
        date(2024, 1, 20),
    )
    .await
    .unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].member_name, "Bob");
    assert!(history[0].return_date.is_none());
}

#[tokio::test]
async fn test_return_errors() {
    let state = setup_state().await;
    let db = state.db();
    let book_id = create_book(&state, "Dune", "Frank Herbert", None).await;
    let copy_id = create_copy(&state, book_id, "ACC001").await;
    let alice = create_member(&state, "Alice").await;

    let err = circulation_service::return_copy(db, "ACC001", date(2024, 1, 2))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::NotIssued(_)), "got {:?}", err);

    let err = circulation_service::return_copy(db, "NOPE", date(2024, 1, 2))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound(_)), "got {:?}", err);

    let tx = circulation_service::issue(db, copy_id, alice, date(2024, 1, 10), None)
        .await
        .unwrap();

    let err = circulation_service::return_transaction(db, tx.id, date(2024, 1, 9))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)), "got {:?}", err);

    circulation_service::return_transaction(db, tx.id, date(2024, 1, 10))
        .await
        .unwrap();
    let err = circulation_service::return_transaction(db, tx.id, date(2024, 1, 11))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::NotIssued(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_issue_requires_existing_copy_and_member() {
    let state = setup_state().await;
    let db = state.db();
    let book_id = create_book(&state, "Dune", "Frank Herbert", None).await;
    let copy_id = create_copy(&state, book_id, "ACC001").await;
    let alice = create_member(&state, "Alice").await;

    let err = circulation_service::issue(db, copy_id, 999, date(2024, 1, 1), None)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::ForeignKeyViolation(_)), "got {:?}", err);

    let err = circulation_service::issue_by_accession(db, "ACC404", alice, date(2024, 1, 1), None)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::ForeignKeyViolation(_)), "got {:?}", err);

    let err = circulation_service::issue(
        db,
        copy_id,
        alice,
        date(2024, 1, 10),
        Some(date(2024, 1, 1)),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)), "got {:?}", err);
    assert_eq!(circulation_service::count_open(db).await.unwrap(), 0);
}

#[tokio::test]
async fn test_member_with_history_cannot_be_deleted() {
    let state = setup_state().await;
    let book_id = create_book(&state, "Dune", "Frank Herbert", None).await;
    let copy_id = create_copy(&state, book_id, "ACC001").await;
    let alice = create_member(&state, "Alice").await;
    let carol = create_member(&state, "Carol").await;

    circulation_service::issue(state.db(), copy_id, alice, date(2024, 1, 1), None)
        .await
        .unwrap();

    let err = state.member_repo.delete(alice).await.unwrap_err();
    assert!(matches!(err, DomainError::ReferentialIntegrity(_)), "got {:?}", err);
    let err = state.copy_repo.delete(copy_id).await.unwrap_err();
    assert!(matches!(err, DomainError::ReferentialIntegrity(_)), "got {:?}", err);

    state.member_repo.delete(carol).await.unwrap();
    let members = state.member_repo.find_all().await.unwrap();
    assert_eq!(members.len(), 1);
}

#[tokio::test]
async fn test_locations_defaults_are_idempotent() {
    let state = setup_state().await;

    assert_eq!(state.location_repo.ensure_defaults(5).await.unwrap(), 5);
    assert_eq!(state.location_repo.ensure_defaults(5).await.unwrap(), 0);
    assert_eq!(state.location_repo.ensure_defaults(7).await.unwrap(), 2);

    let found = state
        .location_repo
        .find_by_location_id("compartment 3")
        .await
        .unwrap();
    assert_eq!(found.map(|l| l.location_id), Some("Compartment 3".to_string()));

    let err = state
        .location_repo
        .create("COMPARTMENT 1".to_string(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::DuplicateKey(_)), "got {:?}", err);
    assert_eq!(state.location_repo.find_all().await.unwrap().len(), 7);
}

#[tokio::test]
async fn test_search_matches_title_and_author() {
    let state = setup_state().await;
    let dune = create_book(&state, "Dune", "Frank Herbert", Some("SciFi")).await;
    create_book(&state, "Emma", "Jane Austen", Some("Classics")).await;
    create_copy(&state, dune, "ACC001").await;

    let hits = report_service::search(state.db(), "HERB").await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].book.title, "Dune");
    assert_eq!(hits[0].copies.len(), 1);
    assert_eq!(
        hits[0].copies[0].current_location.as_deref(),
        Some("Compartment 5")
    );

    let hits = report_service::search(state.db(), "emm").await.unwrap();
    assert_eq!(hits.len(), 1);
    assert!(hits[0].copies.is_empty());

    assert!(report_service::search(state.db(), "  ").await.unwrap().is_empty());
    assert!(report_service::search(state.db(), "zzz").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_dashboard_counts() {
    let state = setup_state().await;
    let db = state.db();
    let dune = create_book(&state, "Dune", "Frank Herbert", Some("SciFi")).await;
    create_book(&state, "Foundation", "Isaac Asimov", Some("SciFi")).await;
    create_book(&state, "Untitled", "Anon", None).await;
    let copy_id = create_copy(&state, dune, "ACC001").await;
    create_copy(&state, dune, "ACC002").await;
    let alice = create_member(&state, "Alice").await;
    circulation_service::issue(db, copy_id, alice, date(2024, 1, 1), Some(date(2024, 1, 15)))
        .await
        .unwrap();

    let dashboard = report_service::dashboard(db, date(2024, 2, 1)).await.unwrap();
    assert_eq!(dashboard.total_books, 3);
    assert_eq!(dashboard.total_copies, 2);
    assert_eq!(dashboard.issued_copies, 1);
    assert_eq!(dashboard.genres[0].genre, "SciFi");
    assert_eq!(dashboard.genres[0].count, 2);
    assert!(
        dashboard
            .genres
            .iter()
            .any(|g| g.genre == report_service::NO_GENRE && g.count == 1)
    );
    assert_eq!(dashboard.overdue.len(), 1);

    let early = report_service::dashboard(db, date(2024, 1, 10)).await.unwrap();
    assert!(early.overdue.is_empty());
}

#[tokio::test]
async fn test_location_contents() {
    let state = setup_state().await;
    let dune = create_book(&state, "Dune", "Frank Herbert", None).await;
    let copy_id = create_copy(&state, dune, "ACC001").await;
    create_copy(&state, dune, "ACC002").await;
    state
        .copy_repo
        .update(
            copy_id,
            UpdateCopyInput {
                current_location: Some(Some("Compartment 9".to_string())),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let home = report_service::location_contents(state.db(), "compartment 5")
        .await
        .unwrap();
    assert_eq!(home.books.len(), 1);
    assert_eq!(home.copies.len(), 1);
    assert_eq!(home.copies[0].accession_no, "ACC002");

    let away = report_service::location_contents(state.db(), "Compartment 9")
        .await
        .unwrap();
    assert!(away.books.is_empty());
    assert_eq!(away.copies.len(), 1);
}

#[tokio::test]
async fn test_csv_import_merges_on_title() {
    let state = setup_state().await;
    let db = state.db();
    create_book(&state, "Dune", "Unknown", None).await;

    let csv = b"Title,Author,Genre,Default_Location\n\
        dune,Frank Herbert,SciFi,Compartment 1\n\
        Emma,Jane Austen,Classics,Compartment 3\n\
        ,Nobody,,\n";

    let summary = csv_service::import_books(db, csv).await.unwrap();
    assert_eq!(summary.created, 1);
    assert_eq!(summary.updated, 1);
    assert_eq!(summary.skipped, 1);

    let dune = state.book_repo.find_by_title("Dune").await.unwrap().unwrap();
    assert_eq!(dune.title, "Dune");
    assert_eq!(dune.author.as_deref(), Some("Frank Herbert"));
    assert_eq!(dune.default_location.as_deref(), Some("Compartment 1"));

    // Importing the same file again only updates
    let summary = csv_service::import_books(db, csv).await.unwrap();
    assert_eq!(summary.created, 0);
    assert_eq!(summary.updated, 2);
    assert_eq!(
        state.book_repo.find_all(BookFilter::default()).await.unwrap().len(),
        2
    );
}

#[tokio::test]
async fn test_csv_import_without_title_column_fails() {
    let state = setup_state().await;
    let err = csv_service::import_books(state.db(), b"Name,Author\nDune,Herbert\n")
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Import(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_csv_export() {
    let state = setup_state().await;
    let empty = csv_service::export_books(state.db()).await.unwrap();
    assert_eq!(
        empty.trim_end(),
        "Title,Author,Genre,Default_Location,Copies,Issued"
    );

    let dune = create_book(&state, "Dune", "Frank Herbert", Some("SciFi")).await;
    create_book(&state, "Ash", "Someone", None).await;
    let copy_id = create_copy(&state, dune, "ACC001").await;
    create_copy(&state, dune, "ACC002").await;
    let alice = create_member(&state, "Alice").await;
    circulation_service::issue(state.db(), copy_id, alice, date(2024, 1, 1), None)
        .await
        .unwrap();

    let exported = csv_service::export_books(state.db()).await.unwrap();
    let lines: Vec<&str> = exported.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[1], "Ash,Someone,,Compartment 5,0,0");
    assert_eq!(lines[2], "Dune,Frank Herbert,SciFi,Compartment 5,2,1");
}

#[tokio::test]
async fn test_second_open_row_for_a_copy_violates_unique_index() {
    let state = setup_state().await;
    let book_id = create_book(&state, "Dune", "Frank Herbert", None).await;
    let copy_id = create_copy(&state, book_id, "ACC001").await;
    let alice = create_member(&state, "Alice").await;
    let bob = create_member(&state, "Bob").await;

    circulation_service::issue(state.db(), copy_id, alice, date(2024, 1, 1), None)
        .await
        .unwrap();

    // Bypass the service check and write the row directly
    let now = chrono::Utc::now().to_rfc3339();
    let second = transaction::ActiveModel {
        copy_id: Set(copy_id),
        member_id: Set(bob),
        issue_date: Set(date(2024, 1, 2)),
        due_date: Set(None),
        return_date: Set(None),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    };
    let err = DomainError::from(second.insert(state.db()).await.unwrap_err());
    assert!(matches!(err, DomainError::DuplicateKey(_)), "got {:?}", err);
    assert_eq!(circulation_service::count_open(state.db()).await.unwrap(), 1);

    // Closed rows do not count against the index
    let now = chrono::Utc::now().to_rfc3339();
    let closed = transaction::ActiveModel {
        copy_id: Set(copy_id),
        member_id: Set(bob),
        issue_date: Set(date(2023, 12, 1)),
        due_date: Set(None),
        return_date: Set(Some(date(2023, 12, 10))),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    };
    closed.insert(state.db()).await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_issues_leave_one_open_transaction() {
    let path = std::env::temp_dir().join(format!(
        "libdesk_concurrent_{}_{}.db",
        std::process::id(),
        chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
    ));
    let url = format!("sqlite://{}?mode=rwc", path.display());
    let state = AppState::new(db::init_db(&url).await.expect("Failed to init DB"));

    let book_id = create_book(&state, "Dune", "Frank Herbert", None).await;
    let copy_id = create_copy(&state, book_id, "ACC001").await;
    let mut members = Vec::new();
    for i in 0..8 {
        members.push(create_member(&state, &format!("Member {}", i)).await);
    }

    let mut handles = Vec::new();
    for member_id in members {
        let db = state.db().clone();
        handles.push(tokio::spawn(async move {
            circulation_service::issue(&db, copy_id, member_id, date(2024, 1, 1), None).await
        }));
    }

    let mut issued = 0;
    for handle in handles {
        match handle.await.expect("issue task panicked") {
            Ok(_) => issued += 1,
            Err(DomainError::AlreadyIssued(_)) => {}
            // Writers that lose the SQLite lock race are also turned away
            Err(DomainError::Database(msg)) if msg.contains("locked") => {}
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }

    assert_eq!(issued, 1);
    assert_eq!(circulation_service::count_open(state.db()).await.unwrap(), 1);

    drop(state);
    let _ = std::fs::remove_file(&path);
}
