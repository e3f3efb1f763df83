//! Application state containing repositories and shared resources

use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::domain::{BookRepository, CopyRepository, LocationRepository, MemberRepository};
use crate::infrastructure::{
    SeaOrmBookRepository, SeaOrmCopyRepository, SeaOrmLocationRepository, SeaOrmMemberRepository,
};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Store handle for the multi-table services
    db: DatabaseConnection,
    pub book_repo: Arc<dyn BookRepository>,
    pub copy_repo: Arc<dyn CopyRepository>,
    pub member_repo: Arc<dyn MemberRepository>,
    pub location_repo: Arc<dyn LocationRepository>,
}

impl AppState {
    /// Create a new AppState with all repositories initialized
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            book_repo: Arc::new(SeaOrmBookRepository::new(db.clone())),
            copy_repo: Arc::new(SeaOrmCopyRepository::new(db.clone())),
            member_repo: Arc::new(SeaOrmMemberRepository::new(db.clone())),
            location_repo: Arc::new(SeaOrmLocationRepository::new(db.clone())),
            db,
        }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}
