use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::resume::{Resume, ResumeRow};
use crate::schema::validate_resume;
use crate::store::{ResumeStore, StoreError};

/// PostgreSQL-backed store. The full document lives in a JSONB column; the
/// columns beside it exist for listing and ownership queries.
#[derive(Clone)]
pub struct PgResumeStore {
    pool: PgPool,
}

impl PgResumeStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResumeStore for PgResumeStore {
    async fn fetch(&self, id: Uuid) -> Result<Option<Resume>, StoreError> {
        let row = sqlx::query_as::<_, ResumeRow>("SELECT * FROM resumes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        validate_resume(&row.document).map(Some).map_err(|errors| {
            warn!("Stored resume {id} failed validation: {errors}");
            StoreError::Corrupt { id, errors }
        })
    }

    async fn update(&self, id: Uuid, resume: &Resume) -> Result<(), StoreError> {
        let now = Utc::now();
        let document = document_for_storage(resume, now)?;

        let result = sqlx::query(
            r#"
            UPDATE resumes
            SET name = $3, target_role = $4, is_base_resume = $5, document = $6, updated_at = $7
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(resume.user_id)
        .bind(&resume.name)
        .bind(&resume.target_role)
        .bind(resume.is_base_resume)
        .bind(&document)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }

        info!("Saved resume {id} for user {}", resume.user_id);
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM resumes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }

        info!("Deleted resume {id}");
        Ok(())
    }
}

/// Serializes the document with its `updated_at` stamped to the write time,
/// so the JSONB copy agrees with the indexed column.
fn document_for_storage(resume: &Resume, now: DateTime<Utc>) -> Result<Value, StoreError> {
    let mut stamped = resume.clone();
    stamped.updated_at = now;
    Ok(serde_json::to_value(&stamped)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resume::fixtures::blank_resume;
    use chrono::TimeZone;

    #[test]
    fn test_document_for_storage_stamps_updated_at_only() {
        let resume = blank_resume();
        let now = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        let document = document_for_storage(&resume, now).unwrap();

        let stored = validate_resume(&document).unwrap();
        assert_eq!(stored.updated_at, now);
        assert_eq!(stored.created_at, resume.created_at);
        assert_eq!(stored.id, resume.id);
    }
}
