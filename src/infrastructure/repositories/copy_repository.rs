//! SeaORM implementation of CopyRepository

use std::collections::HashSet;

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};

use crate::domain::errors::{optional, required};
use crate::domain::{CopyDto, CopyRepository, CreateCopyInput, DomainError, UpdateCopyInput};
use crate::models::book::Entity as BookEntity;
use crate::models::copy::{ActiveModel, Column, CopyStatus, Entity as CopyEntity, Model};
use crate::models::transaction::{Column as TxColumn, Entity as TxEntity};

/// SeaORM-based implementation of CopyRepository
pub struct SeaOrmCopyRepository {
    db: DatabaseConnection,
}

impl SeaOrmCopyRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

/// IDs of the given copies that currently have an open transaction.
/// An empty `copy_ids` slice means "all copies".
pub async fn open_copy_ids<C: ConnectionTrait>(
    conn: &C,
    copy_ids: &[i32],
) -> Result<HashSet<i32>, DomainError> {
    let mut query = TxEntity::find().filter(TxColumn::ReturnDate.is_null());
    if !copy_ids.is_empty() {
        query = query.filter(TxColumn::CopyId.is_in(copy_ids.to_vec()));
    }
    let open = query.all(conn).await?;
    Ok(open.into_iter().map(|tx| tx.copy_id).collect())
}

fn to_copy(copy: Model, book_title: Option<String>, open: &HashSet<i32>) -> CopyDto {
    CopyDto {
        id: copy.id,
        book_id: copy.book_id,
        status: CopyStatus::from_open(open.contains(&copy.id)),
        accession_no: copy.accession_no,
        condition: copy.condition,
        acquisition_date: copy.acquisition_date,
        purchase_price: copy.purchase_price,
        current_location: copy.current_location,
        book_title,
    }
}

fn duplicate_accession(e: DomainError, accession_no: &str) -> DomainError {
    match e {
        DomainError::DuplicateKey(_) => DomainError::DuplicateKey(format!(
            "accession number '{}' is already in use",
            accession_no
        )),
        other => other,
    }
}

#[async_trait]
impl CopyRepository for SeaOrmCopyRepository {
    async fn find_all(&self) -> Result<Vec<CopyDto>, DomainError> {
        let copies_with_books = CopyEntity::find()
            .find_also_related(BookEntity)
            .order_by_asc(Column::AccessionNo)
            .all(&self.db)
            .await?;
        let open = open_copy_ids(&self.db, &[]).await?;

        let mut copies: Vec<CopyDto> = copies_with_books
            .into_iter()
            .map(|(copy, book)| to_copy(copy, book.map(|b| b.title), &open))
            .collect();
        copies.sort_by(|a, b| a.book_title.cmp(&b.book_title));
        Ok(copies)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<CopyDto>, DomainError> {
        let result = CopyEntity::find_by_id(id)
            .find_also_related(BookEntity)
            .one(&self.db)
            .await?;

        match result {
            Some((copy, book)) => {
                let open = open_copy_ids(&self.db, &[copy.id]).await?;
                Ok(Some(to_copy(copy, book.map(|b| b.title), &open)))
            }
            None => Ok(None),
        }
    }

    async fn find_by_accession(&self, accession_no: &str) -> Result<Option<CopyDto>, DomainError> {
        let result = CopyEntity::find()
            .filter(Column::AccessionNo.eq(accession_no.trim()))
            .find_also_related(BookEntity)
            .one(&self.db)
            .await?;

        match result {
            Some((copy, book)) => {
                let open = open_copy_ids(&self.db, &[copy.id]).await?;
                Ok(Some(to_copy(copy, book.map(|b| b.title), &open)))
            }
            None => Ok(None),
        }
    }

    async fn find_by_book_id(&self, book_id: i32) -> Result<Vec<CopyDto>, DomainError> {
        let copies = CopyEntity::find()
            .filter(Column::BookId.eq(book_id))
            .order_by_asc(Column::AccessionNo)
            .all(&self.db)
            .await?;
        let ids: Vec<i32> = copies.iter().map(|c| c.id).collect();
        let open = if ids.is_empty() {
            HashSet::new()
        } else {
            open_copy_ids(&self.db, &ids).await?
        };

        Ok(copies
            .into_iter()
            .map(|copy| to_copy(copy, None, &open))
            .collect())
    }

    async fn create(&self, input: CreateCopyInput) -> Result<CopyDto, DomainError> {
        let accession_no = required("accession number", &input.accession_no)?;

        let book = BookEntity::find_by_id(input.book_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| {
                DomainError::ForeignKeyViolation(format!("book {} does not exist", input.book_id))
            })?;

        let current_location =
            optional(input.current_location).or_else(|| book.default_location.clone());
        let now = chrono::Utc::now().to_rfc3339();

        let new_copy = ActiveModel {
            book_id: Set(book.id),
            accession_no: Set(accession_no.clone()),
            condition: Set(optional(input.condition)),
            acquisition_date: Set(input.acquisition_date),
            purchase_price: Set(input.purchase_price),
            current_location: Set(current_location),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = new_copy
            .insert(&self.db)
            .await
            .map_err(|e| duplicate_accession(e.into(), &accession_no))?;

        tracing::info!(
            "Copy {} of '{}' registered at {:?}",
            result.accession_no,
            book.title,
            result.current_location
        );
        Ok(to_copy(result, Some(book.title), &HashSet::new()))
    }

    async fn update(&self, id: i32, input: UpdateCopyInput) -> Result<CopyDto, DomainError> {
        let existing = CopyEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Copy {}", id)))?;

        let mut active: ActiveModel = existing.into();
        let mut accession_for_error = String::new();

        if let Some(accession_no) = input.accession_no {
            let accession_no = required("accession number", &accession_no)?;
            accession_for_error = accession_no.clone();
            active.accession_no = Set(accession_no);
        }
        if let Some(condition) = input.condition {
            active.condition = Set(optional(condition));
        }
        if let Some(date) = input.acquisition_date {
            active.acquisition_date = Set(date);
        }
        if let Some(price) = input.purchase_price {
            active.purchase_price = Set(price);
        }
        if let Some(location) = input.current_location {
            active.current_location = Set(optional(location));
        }
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let result = active
            .update(&self.db)
            .await
            .map_err(|e| duplicate_accession(e.into(), &accession_for_error))?;

        let book_title = BookEntity::find_by_id(result.book_id)
            .one(&self.db)
            .await?
            .map(|b| b.title);
        let open = open_copy_ids(&self.db, &[result.id]).await?;
        Ok(to_copy(result, book_title, &open))
    }

    async fn delete(&self, id: i32) -> Result<(), DomainError> {
        let txn = self.db.begin().await?;

        let copy = CopyEntity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Copy {}", id)))?;

        let history = TxEntity::find()
            .filter(TxColumn::CopyId.eq(id))
            .count(&txn)
            .await?;
        if history > 0 {
            return Err(DomainError::ReferentialIntegrity(format!(
                "copy {} has {} transaction record(s)",
                copy.accession_no, history
            )));
        }

        CopyEntity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        tracing::info!("Copy {} deleted", copy.accession_no);
        Ok(())
    }
}
