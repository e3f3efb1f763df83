//! Circulation Service - issue/return lifecycle of physical copies
//!
//! A copy is Available while it has no open transaction and Issued while it
//! has exactly one. Every transition runs inside a single DB transaction.

use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::Serialize;
use std::collections::HashMap;

use crate::domain::DomainError;
use crate::models::book::Entity as Book;
use crate::models::copy::{self, CopyStatus, Entity as CopyEntity};
use crate::models::member::Entity as Member;
use crate::models::transaction::{self, Entity as Transaction};

/// Transaction enriched with copy, book and member names
#[derive(Debug, Clone, Serialize)]
pub struct TransactionDetails {
    pub id: i32,
    pub copy_id: i32,
    pub member_id: i32,
    pub issue_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub return_date: Option<NaiveDate>,
    pub accession_no: String,
    pub book_title: String,
    pub member_name: String,
    pub overdue: bool,
}

/// Filter parameters for listing transactions
#[derive(Debug, Default, Clone)]
pub struct TransactionFilter {
    /// `Some(true)` for open only, `Some(false)` for returned only
    pub open: Option<bool>,
    pub member_id: Option<i32>,
    pub copy_id: Option<i32>,
}

/// Issue a copy to a member.
///
/// Fails with `ForeignKeyViolation` if the copy or member does not exist and
/// with `AlreadyIssued` if the copy has an open transaction. State is left
/// unchanged on every failure.
pub async fn issue(
    db: &DatabaseConnection,
    copy_id: i32,
    member_id: i32,
    issue_date: NaiveDate,
    due_date: Option<NaiveDate>,
) -> Result<transaction::Model, DomainError> {
    if let Some(due) = due_date {
        if due < issue_date {
            return Err(DomainError::Validation(format!(
                "due date {} is before issue date {}",
                due, issue_date
            )));
        }
    }

    let txn = db.begin().await?;

    let copy = CopyEntity::find_by_id(copy_id)
        .one(&txn)
        .await?
        .ok_or_else(|| {
            DomainError::ForeignKeyViolation(format!("copy {} does not exist", copy_id))
        })?;

    let member = Member::find_by_id(member_id)
        .one(&txn)
        .await?
        .ok_or_else(|| {
            DomainError::ForeignKeyViolation(format!("member {} does not exist", member_id))
        })?;

    if let Some(open) = find_open(&txn, copy.id).await? {
        tracing::warn!(
            "Issue of {} to '{}' rejected: already out on transaction {}",
            copy.accession_no,
            member.name,
            open.id
        );
        return Err(already_issued(&copy.accession_no));
    }

    let now = chrono::Utc::now().to_rfc3339();
    let new_tx = transaction::ActiveModel {
        copy_id: Set(copy.id),
        member_id: Set(member.id),
        issue_date: Set(issue_date),
        due_date: Set(due_date),
        return_date: Set(None),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    };

    // The partial unique index backs the check above
    let saved = new_tx
        .insert(&txn)
        .await
        .map_err(|e| match DomainError::from(e) {
            DomainError::DuplicateKey(_) => already_issued(&copy.accession_no),
            other => other,
        })?;

    txn.commit().await?;

    tracing::info!(
        "Copy {} issued to '{}' (transaction {}, due {:?})",
        copy.accession_no,
        member.name,
        saved.id,
        saved.due_date
    );
    Ok(saved)
}

/// Issue a copy identified by its accession number.
pub async fn issue_by_accession(
    db: &DatabaseConnection,
    accession_no: &str,
    member_id: i32,
    issue_date: NaiveDate,
    due_date: Option<NaiveDate>,
) -> Result<transaction::Model, DomainError> {
    let copy = find_copy_by_accession(db, accession_no)
        .await?
        .ok_or_else(|| {
            DomainError::ForeignKeyViolation(format!(
                "copy with accession number '{}' does not exist",
                accession_no.trim()
            ))
        })?;

    issue(db, copy.id, member_id, issue_date, due_date).await
}

/// Close an open transaction. The copy becomes Available.
pub async fn return_transaction(
    db: &DatabaseConnection,
    transaction_id: i32,
    return_date: NaiveDate,
) -> Result<transaction::Model, DomainError> {
    let txn = db.begin().await?;

    let tx = Transaction::find_by_id(transaction_id)
        .one(&txn)
        .await?
        .ok_or_else(|| DomainError::NotFound(format!("Transaction {}", transaction_id)))?;

    if let Some(returned) = tx.return_date {
        return Err(DomainError::NotIssued(format!(
            "transaction {} was already returned on {}",
            tx.id, returned
        )));
    }

    if return_date < tx.issue_date {
        return Err(DomainError::Validation(format!(
            "return date {} is before issue date {}",
            return_date, tx.issue_date
        )));
    }

    let mut active: transaction::ActiveModel = tx.into();
    active.return_date = Set(Some(return_date));
    active.updated_at = Set(chrono::Utc::now().to_rfc3339());
    let updated = active.update(&txn).await?;

    txn.commit().await?;

    tracing::info!(
        "Transaction {} closed on {} (copy {})",
        updated.id,
        return_date,
        updated.copy_id
    );
    Ok(updated)
}

/// Return a copy identified by its accession number.
///
/// Fails with `NotIssued` when the copy is Available.
pub async fn return_copy(
    db: &DatabaseConnection,
    accession_no: &str,
    return_date: NaiveDate,
) -> Result<transaction::Model, DomainError> {
    let copy = find_copy_by_accession(db, accession_no)
        .await?
        .ok_or_else(|| DomainError::NotFound(format!("Copy '{}'", accession_no.trim())))?;

    let open = find_open(db, copy.id).await?.ok_or_else(|| {
        tracing::warn!("Return of {} rejected: copy is not issued", copy.accession_no);
        DomainError::NotIssued(format!("copy {} is not issued", copy.accession_no))
    })?;

    return_transaction(db, open.id, return_date).await
}

/// Current circulation state of a copy
pub async fn copy_status(db: &DatabaseConnection, copy_id: i32) -> Result<CopyStatus, DomainError> {
    CopyEntity::find_by_id(copy_id)
        .one(db)
        .await?
        .ok_or_else(|| DomainError::NotFound(format!("Copy {}", copy_id)))?;

    Ok(CopyStatus::from_open(find_open(db, copy_id).await?.is_some()))
}

/// List transactions, newest first, with related names
pub async fn list_transactions(
    db: &DatabaseConnection,
    filter: TransactionFilter,
    as_of: NaiveDate,
) -> Result<Vec<TransactionDetails>, DomainError> {
    let mut condition = Condition::all();

    match filter.open {
        Some(true) => condition = condition.add(transaction::Column::ReturnDate.is_null()),
        Some(false) => condition = condition.add(transaction::Column::ReturnDate.is_not_null()),
        None => {}
    }

    if let Some(member_id) = filter.member_id {
        condition = condition.add(transaction::Column::MemberId.eq(member_id));
    }

    if let Some(copy_id) = filter.copy_id {
        condition = condition.add(transaction::Column::CopyId.eq(copy_id));
    }

    let txs = Transaction::find()
        .filter(condition)
        .order_by_desc(transaction::Column::IssueDate)
        .order_by_desc(transaction::Column::Id)
        .all(db)
        .await?;

    with_details(db, txs, as_of).await
}

/// Open transactions whose due date is earlier than `as_of`
pub async fn overdue_transactions(
    db: &DatabaseConnection,
    as_of: NaiveDate,
) -> Result<Vec<TransactionDetails>, DomainError> {
    let txs = Transaction::find()
        .filter(transaction::Column::ReturnDate.is_null())
        .filter(transaction::Column::DueDate.is_not_null())
        .filter(transaction::Column::DueDate.lt(as_of))
        .order_by_asc(transaction::Column::DueDate)
        .all(db)
        .await?;

    with_details(db, txs, as_of).await
}

/// Number of copies currently out
pub async fn count_open(db: &DatabaseConnection) -> Result<u64, DomainError> {
    let count = Transaction::find()
        .filter(transaction::Column::ReturnDate.is_null())
        .count(db)
        .await?;
    Ok(count)
}

fn already_issued(accession_no: &str) -> DomainError {
    DomainError::AlreadyIssued(format!("copy {} is already issued", accession_no))
}

async fn find_open<C: ConnectionTrait>(
    conn: &C,
    copy_id: i32,
) -> Result<Option<transaction::Model>, DomainError> {
    let open = Transaction::find()
        .filter(transaction::Column::CopyId.eq(copy_id))
        .filter(transaction::Column::ReturnDate.is_null())
        .one(conn)
        .await?;
    Ok(open)
}

async fn find_copy_by_accession(
    db: &DatabaseConnection,
    accession_no: &str,
) -> Result<Option<copy::Model>, DomainError> {
    let copy = CopyEntity::find()
        .filter(copy::Column::AccessionNo.eq(accession_no.trim()))
        .one(db)
        .await?;
    Ok(copy)
}

async fn with_details(
    db: &DatabaseConnection,
    txs: Vec<transaction::Model>,
    as_of: NaiveDate,
) -> Result<Vec<TransactionDetails>, DomainError> {
    if txs.is_empty() {
        return Ok(Vec::new());
    }

    let copy_ids: Vec<i32> = txs.iter().map(|t| t.copy_id).collect();
    let member_ids: Vec<i32> = txs.iter().map(|t| t.member_id).collect();

    let mut copy_map: HashMap<i32, (String, String)> = HashMap::new();
    let copies_with_books = CopyEntity::find()
        .filter(copy::Column::Id.is_in(copy_ids))
        .find_also_related(Book)
        .all(db)
        .await?;
    for (copy, book) in copies_with_books {
        let title = book
            .map(|b| b.title)
            .unwrap_or_else(|| "Unknown".to_string());
        copy_map.insert(copy.id, (copy.accession_no, title));
    }

    let member_map: HashMap<i32, String> = Member::find()
        .filter(crate::models::member::Column::Id.is_in(member_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|m| (m.id, m.name))
        .collect();

    Ok(txs
        .into_iter()
        .map(|tx| {
            let (accession_no, book_title) = copy_map
                .get(&tx.copy_id)
                .cloned()
                .unwrap_or_else(|| ("Unknown".to_string(), "Unknown".to_string()));
            let member_name = member_map
                .get(&tx.member_id)
                .cloned()
                .unwrap_or_else(|| "Unknown".to_string());

            TransactionDetails {
                overdue: tx.is_overdue(as_of),
                id: tx.id,
                copy_id: tx.copy_id,
                member_id: tx.member_id,
                issue_date: tx.issue_date,
                due_date: tx.due_date,
                return_date: tx.return_date,
                accession_no,
                book_title,
                member_name,
            }
        })
        .collect())
}
