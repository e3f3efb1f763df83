use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "copies")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub book_id: i32,
    /// Accession number stamped on the physical copy. Unique.
    #[sea_orm(unique)]
    pub accession_no: String,
    pub condition: Option<String>,
    pub acquisition_date: Option<Date>,
    pub purchase_price: Option<f64>,
    /// Where the copy is right now. Starts as the book's default location
    /// and may diverge once the copy is moved.
    pub current_location: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::book::Entity",
        from = "Column::BookId",
        to = "super::book::Column::Id",
        on_update = "NoAction",
        on_delete = "Restrict"
    )]
    Book,
    #[sea_orm(has_many = "super::transaction::Entity")]
    Transactions,
}

impl Related<super::book::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Book.def()
    }
}

impl Related<super::transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Circulation state of a physical copy, derived from its open transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CopyStatus {
    Available,
    Issued,
}

impl CopyStatus {
    pub fn from_open(has_open_transaction: bool) -> Self {
        if has_open_transaction {
            CopyStatus::Issued
        } else {
            CopyStatus::Available
        }
    }
}
