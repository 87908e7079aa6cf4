use async_trait::async_trait;
use models::{extended_info, InstanceKind};
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::extended_info::domain::InfoRecord;
use crate::extended_info::repository::ExtendedInfoRepository;

/// SeaORM-backed repository implementation.
pub struct SeaOrmExtendedInfoRepository {
    pub db: DatabaseConnection,
}

fn to_records(rows: Vec<extended_info::Model>) -> Result<Vec<InfoRecord>, ServiceError> {
    rows.into_iter().map(|m| InfoRecord::try_from(m).map_err(ServiceError::from)).collect()
}

#[async_trait]
impl ExtendedInfoRepository for SeaOrmExtendedInfoRepository {
    async fn find(&self, instance: InstanceKind, context_instance_id: i64) -> Result<Option<InfoRecord>, ServiceError> {
        let row = extended_info::find_by_target(&self.db, instance, context_instance_id).await?;
        Ok(row.map(InfoRecord::try_from).transpose()?)
    }

    async fn upsert(&self, instance: InstanceKind, context_instance_id: i64, vars_json: &str) -> Result<InfoRecord, ServiceError> {
        let row = extended_info::upsert(&self.db, instance, context_instance_id, vars_json).await?;
        Ok(InfoRecord::try_from(row)?)
    }

    async fn delete(&self, instance: InstanceKind, context_instance_id: i64) -> Result<bool, ServiceError> {
        Ok(extended_info::delete_by_target(&self.db, instance, context_instance_id).await?)
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<bool, ServiceError> {
        Ok(extended_info::delete_by_id(&self.db, id).await?)
    }

    async fn list_by_instance(&self, instance: InstanceKind) -> Result<Vec<InfoRecord>, ServiceError> {
        to_records(extended_info::list_by_instance(&self.db, instance).await?)
    }

    async fn list_all(&self) -> Result<Vec<InfoRecord>, ServiceError> {
        to_records(extended_info::list_all(&self.db).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::get_db;

    #[tokio::test]
    async fn seaorm_repository_roundtrip() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await else { return Ok(()) };
        let repo = SeaOrmExtendedInfoRepository { db };

        let cat = models::course_category::create(&repo.db, "Repo Category").await?;
        let saved = repo.upsert(InstanceKind::Category, cat.id, r#"{"x":"1"}"#).await?;
        assert_eq!(saved.instance, InstanceKind::Category);

        let found = repo.find(InstanceKind::Category, cat.id).await?.unwrap();
        assert_eq!(found.id, saved.id);
        assert!(repo.list_by_instance(InstanceKind::Category).await?.iter().any(|r| r.id == saved.id));

        assert!(repo.delete_by_id(saved.id).await?);
        assert!(repo.find(InstanceKind::Category, cat.id).await?.is_none());
        Ok(())
    }
}
