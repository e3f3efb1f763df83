//! Repository trait definitions
//!
//! These traits define the contract for data access.
//! Implementations live in the infrastructure layer.

use async_trait::async_trait;
use chrono::NaiveDate;

use super::DomainError;
use crate::models::book::Book;
use crate::models::copy::CopyStatus;
use crate::models::member::MemberDto;

/// Filter criteria for book listings
#[derive(Debug, Default, Clone)]
pub struct BookFilter {
    pub genre: Option<String>,
    pub default_location: Option<String>,
}

/// Repository trait for Book entity
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// Find all books matching the filter, ordered by title
    async fn find_all(&self, filter: BookFilter) -> Result<Vec<Book>, DomainError>;

    /// Find a single book by ID
    async fn find_by_id(&self, id: i32) -> Result<Option<Book>, DomainError>;

    /// Find a book by title (case-insensitive)
    async fn find_by_title(&self, title: &str) -> Result<Option<Book>, DomainError>;

    /// Create a new book. A title already in the catalog is a `DuplicateKey`.
    async fn create(&self, book: Book) -> Result<Book, DomainError>;

    /// Update an existing book
    async fn update(&self, id: i32, book: Book) -> Result<Book, DomainError>;

    /// Delete a book. Fails with `ReferentialIntegrity` while copies reference it.
    async fn delete(&self, id: i32) -> Result<(), DomainError>;
}

/// Copy data for API responses
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CopyDto {
    pub id: i32,
    pub book_id: i32,
    pub accession_no: String,
    pub condition: Option<String>,
    pub acquisition_date: Option<NaiveDate>,
    pub purchase_price: Option<f64>,
    pub current_location: Option<String>,
    pub status: CopyStatus,
    pub book_title: Option<String>,
}

/// Input for creating a copy
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct CreateCopyInput {
    pub book_id: i32,
    pub accession_no: String,
    pub condition: Option<String>,
    pub acquisition_date: Option<NaiveDate>,
    pub purchase_price: Option<f64>,
    /// Falls back to the book's default location when absent
    pub current_location: Option<String>,
}

/// Input for updating a copy
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct UpdateCopyInput {
    pub accession_no: Option<String>,
    pub condition: Option<Option<String>>,
    pub acquisition_date: Option<Option<NaiveDate>>,
    pub purchase_price: Option<Option<f64>>,
    pub current_location: Option<Option<String>>,
}

/// Repository trait for Copy entity
#[async_trait]
pub trait CopyRepository: Send + Sync {
    /// Find all copies with book titles
    async fn find_all(&self) -> Result<Vec<CopyDto>, DomainError>;

    /// Find a copy by ID
    async fn find_by_id(&self, id: i32) -> Result<Option<CopyDto>, DomainError>;

    /// Find a copy by accession number
    async fn find_by_accession(&self, accession_no: &str) -> Result<Option<CopyDto>, DomainError>;

    /// Find copies for a specific book
    async fn find_by_book_id(&self, book_id: i32) -> Result<Vec<CopyDto>, DomainError>;

    /// Create a new copy
    async fn create(&self, input: CreateCopyInput) -> Result<CopyDto, DomainError>;

    /// Update a copy
    async fn update(&self, id: i32, input: UpdateCopyInput) -> Result<CopyDto, DomainError>;

    /// Delete a copy. Fails with `ReferentialIntegrity` if it has transaction history.
    async fn delete(&self, id: i32) -> Result<(), DomainError>;
}

/// Repository trait for Member entity
#[async_trait]
pub trait MemberRepository: Send + Sync {
    /// Find all members ordered by name
    async fn find_all(&self) -> Result<Vec<MemberDto>, DomainError>;

    async fn find_by_id(&self, id: i32) -> Result<Option<MemberDto>, DomainError>;

    async fn create(&self, member: MemberDto) -> Result<MemberDto, DomainError>;

    async fn update(&self, id: i32, member: MemberDto) -> Result<MemberDto, DomainError>;

    /// Delete a member. Fails with `ReferentialIntegrity` if they have transactions.
    async fn delete(&self, id: i32) -> Result<(), DomainError>;
}

/// Location data for API responses
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Location {
    pub id: i32,
    pub location_id: String,
    pub description: Option<String>,
}

/// Repository trait for Location entity
#[async_trait]
pub trait LocationRepository: Send + Sync {
    async fn find_all(&self) -> Result<Vec<Location>, DomainError>;

    /// Find a location by its identifier (case-insensitive)
    async fn find_by_location_id(&self, location_id: &str)
    -> Result<Option<Location>, DomainError>;

    async fn create(
        &self,
        location_id: String,
        description: Option<String>,
    ) -> Result<Location, DomainError>;

    /// Create `Compartment 1..=slots` where missing. Returns how many were added.
    async fn ensure_defaults(&self, slots: u32) -> Result<usize, DomainError>;
}
