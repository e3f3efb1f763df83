use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One issue of one copy to one member. `return_date` stays NULL while the
/// copy is out; a copy has at most one such open row.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub copy_id: i32,
    pub member_id: i32,
    pub issue_date: Date,
    pub due_date: Option<Date>,
    pub return_date: Option<Date>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::copy::Entity",
        from = "Column::CopyId",
        to = "super::copy::Column::Id",
        on_update = "NoAction",
        on_delete = "Restrict"
    )]
    Copy,
    #[sea_orm(
        belongs_to = "super::member::Entity",
        from = "Column::MemberId",
        to = "super::member::Column::Id",
        on_update = "NoAction",
        on_delete = "Restrict"
    )]
    Member,
}

impl Related<super::copy::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Copy.def()
    }
}

impl Related<super::member::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Member.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn is_open(&self) -> bool {
        self.return_date.is_none()
    }

    /// Open and past its due date as of `as_of`. Never stored.
    pub fn is_overdue(&self, as_of: Date) -> bool {
        is_overdue(self.return_date, self.due_date, as_of)
    }
}

pub fn is_overdue(return_date: Option<Date>, due_date: Option<Date>, as_of: Date) -> bool {
    match (return_date, due_date) {
        (None, Some(due)) => due < as_of,
        _ => false,
    }
}
