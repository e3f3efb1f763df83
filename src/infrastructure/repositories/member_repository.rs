//! SeaORM implementation of MemberRepository

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};

use crate::domain::errors::{optional, required};
use crate::domain::{DomainError, MemberRepository};
use crate::models::MemberDto;
use crate::models::member::{ActiveModel, Column, Entity as MemberEntity};
use crate::models::transaction::{Column as TxColumn, Entity as TxEntity};

pub struct SeaOrmMemberRepository {
    db: DatabaseConnection,
}

impl SeaOrmMemberRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MemberRepository for SeaOrmMemberRepository {
    async fn find_all(&self) -> Result<Vec<MemberDto>, DomainError> {
        let members = MemberEntity::find()
            .order_by_asc(Column::Name)
            .all(&self.db)
            .await?;
        Ok(members.into_iter().map(MemberDto::from).collect())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<MemberDto>, DomainError> {
        let member = MemberEntity::find_by_id(id).one(&self.db).await?;
        Ok(member.map(MemberDto::from))
    }

    async fn create(&self, member: MemberDto) -> Result<MemberDto, DomainError> {
        let now = chrono::Utc::now().to_rfc3339();

        let new_member = ActiveModel {
            name: Set(required("name", &member.name)?),
            phone: Set(optional(member.phone)),
            email: Set(optional(member.email)),
            notes: Set(optional(member.notes)),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let saved = new_member.insert(&self.db).await?;
        tracing::info!("Member '{}' registered (id {})", saved.name, saved.id);
        Ok(MemberDto::from(saved))
    }

    async fn update(&self, id: i32, member: MemberDto) -> Result<MemberDto, DomainError> {
        let name = required("name", &member.name)?;
        let existing = MemberEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Member {}", id)))?;

        let mut active: ActiveModel = existing.into();
        active.name = Set(name);
        active.phone = Set(optional(member.phone));
        active.email = Set(optional(member.email));
        active.notes = Set(optional(member.notes));
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let model = active.update(&self.db).await?;
        Ok(MemberDto::from(model))
    }

    async fn delete(&self, id: i32) -> Result<(), DomainError> {
        let txn = self.db.begin().await?;

        let member = MemberEntity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Member {}", id)))?;

        let history = TxEntity::find()
            .filter(TxColumn::MemberId.eq(id))
            .count(&txn)
            .await?;
        if history > 0 {
            return Err(DomainError::ReferentialIntegrity(format!(
                "member '{}' has {} transaction record(s)",
                member.name, history
            )));
        }

        MemberEntity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;
        Ok(())
    }
}
