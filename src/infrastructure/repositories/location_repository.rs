//! SeaORM implementation of LocationRepository

use std::collections::HashSet;

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::domain::errors::{optional, required};
use crate::domain::{DomainError, Location, LocationRepository};
use crate::models::location::{ActiveModel, Column, Entity as LocationEntity, Model};

pub struct SeaOrmLocationRepository {
    db: DatabaseConnection,
}

impl SeaOrmLocationRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

impl From<Model> for Location {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            location_id: model.location_id,
            description: model.description,
        }
    }
}

/// Name of the n-th auto-created compartment.
pub fn compartment_name(slot: u32) -> String {
    format!("Compartment {}", slot)
}

#[async_trait]
impl LocationRepository for SeaOrmLocationRepository {
    async fn find_all(&self) -> Result<Vec<Location>, DomainError> {
        let locations = LocationEntity::find()
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await?;
        Ok(locations.into_iter().map(Location::from).collect())
    }

    async fn find_by_location_id(
        &self,
        location_id: &str,
    ) -> Result<Option<Location>, DomainError> {
        let location = LocationEntity::find()
            .filter(Column::LocationId.eq(location_id.trim()))
            .one(&self.db)
            .await?;
        Ok(location.map(Location::from))
    }

    async fn create(
        &self,
        location_id: String,
        description: Option<String>,
    ) -> Result<Location, DomainError> {
        let location_id = required("location id", &location_id)?;

        let new_location = ActiveModel {
            location_id: Set(location_id.clone()),
            description: Set(optional(description)),
            ..Default::default()
        };

        let saved = new_location.insert(&self.db).await.map_err(|e| {
            match DomainError::from(e) {
                DomainError::DuplicateKey(_) => DomainError::DuplicateKey(format!(
                    "location '{}' already exists",
                    location_id
                )),
                other => other,
            }
        })?;
        Ok(Location::from(saved))
    }

    async fn ensure_defaults(&self, slots: u32) -> Result<usize, DomainError> {
        let existing: HashSet<String> = LocationEntity::find()
            .all(&self.db)
            .await?
            .into_iter()
            .map(|l| l.location_id.to_lowercase())
            .collect();

        let missing: Vec<ActiveModel> = (1..=slots)
            .filter(|slot| !existing.contains(&compartment_name(*slot).to_lowercase()))
            .map(|slot| ActiveModel {
                location_id: Set(compartment_name(slot)),
                description: Set(Some(format!("Auto-created slot {}", slot))),
                ..Default::default()
            })
            .collect();

        let added = missing.len();
        if added > 0 {
            LocationEntity::insert_many(missing).exec(&self.db).await?;
            tracing::info!("Created {} default locations", added);
        }
        Ok(added)
    }
}
