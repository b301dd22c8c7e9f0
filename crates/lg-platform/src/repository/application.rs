//! SQLite application repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use sqlx::sqlite::SqliteRow;

use lg_common::AttendanceMode;

use crate::domain::Application;
use crate::error::{PlatformError, Result};
use crate::repository::{
    ApplicationFilter, ApplicationSortField, ApplicationStore, SortOrder, StatusCount,
};

pub struct SqliteApplicationStore {
    pool: SqlitePool,
}

impl SqliteApplicationStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS applications (
                id TEXT PRIMARY KEY,
                full_name TEXT NOT NULL,
                mobile_number TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                current_city TEXT NOT NULL,
                nationality TEXT NOT NULL,
                uae_resident INTEGER NOT NULL,
                caregiving_experience TEXT NOT NULL,
                willing_to_work INTEGER NOT NULL,
                willing_to_drive INTEGER NOT NULL,
                accepts_timeframe INTEGER NOT NULL,
                seeks_permanent_relocation INTEGER NOT NULL,
                understands_info_only INTEGER NOT NULL,
                accepts_financial_costs INTEGER NOT NULL,
                attendance_mode TEXT NOT NULL,
                selected_session TEXT NOT NULL,
                acknowledged_accuracy INTEGER NOT NULL,
                status TEXT NOT NULL,
                tags TEXT NOT NULL,
                review_notes TEXT,
                reviewed_at BIGINT,
                created_at BIGINT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_applications_status ON applications(status);
            CREATE INDEX IF NOT EXISTS idx_applications_created ON applications(created_at);
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    fn row_to_application(row: &SqliteRow) -> Result<Application> {
        let created_at_ts: i64 = row.get("created_at");
        let created_at = DateTime::from_timestamp_millis(created_at_ts)
            .ok_or_else(|| PlatformError::internal("Invalid created_at timestamp"))?;

        let reviewed_at = row
            .get::<Option<i64>, _>("reviewed_at")
            .and_then(DateTime::from_timestamp_millis);

        let attendance_mode: AttendanceMode = row
            .get::<String, _>("attendance_mode")
            .parse()
            .map_err(PlatformError::internal)?;

        Ok(Application {
            id: row.get("id"),
            full_name: row.get("full_name"),
            mobile_number: row.get("mobile_number"),
            email: row.get("email"),
            current_city: row.get("current_city"),
            nationality: row.get("nationality"),
            uae_resident: row.get("uae_resident"),
            caregiving_experience: serde_json::from_str(row.get("caregiving_experience"))?,
            willing_to_work: row.get("willing_to_work"),
            willing_to_drive: row.get("willing_to_drive"),
            accepts_timeframe: row.get("accepts_timeframe"),
            seeks_permanent_relocation: row.get("seeks_permanent_relocation"),
            understands_info_only: row.get("understands_info_only"),
            accepts_financial_costs: row.get("accepts_financial_costs"),
            attendance_mode,
            selected_session: row.get("selected_session"),
            acknowledged_accuracy: row.get("acknowledged_accuracy"),
            status: row.get("status"),
            tags: serde_json::from_str(row.get("tags"))?,
            review_notes: row.get("review_notes"),
            reviewed_at,
            created_at,
        })
    }

    fn push_filter(qb: &mut QueryBuilder<'_, Sqlite>, filter: &ApplicationFilter) {
        if let Some(status) = &filter.status {
            qb.push(" AND status = ").push_bind(status.clone());
        }
        if let Some(mode) = filter.attendance_mode {
            qb.push(" AND attendance_mode = ").push_bind(mode.as_str());
        }
        if let Some(session) = &filter.selected_session {
            qb.push(" AND selected_session = ").push_bind(session.clone());
        }
        if let Some(from) = filter.date_from {
            qb.push(" AND created_at >= ").push_bind(from.timestamp_millis());
        }
        if let Some(to) = filter.date_to {
            qb.push(" AND created_at <= ").push_bind(to.timestamp_millis());
        }
        if let Some(search) = &filter.search {
            let pattern = format!("%{}%", search.to_lowercase());
            qb.push(" AND (LOWER(full_name) LIKE ")
                .push_bind(pattern.clone())
                .push(" OR LOWER(email) LIKE ")
                .push_bind(pattern.clone())
                .push(" OR mobile_number LIKE ")
                .push_bind(pattern)
                .push(")");
        }
        if let Some(tag) = &filter.tag {
            // Tags are stored as a JSON array; match the quoted element
            qb.push(" AND tags LIKE ").push_bind(format!("%\"{tag}\"%"));
        }
    }

    fn sort_column(sort: ApplicationSortField) -> &'static str {
        match sort {
            ApplicationSortField::CreatedAt => "created_at",
            ApplicationSortField::FullName => "full_name",
            ApplicationSortField::Status => "status",
        }
    }
}

#[async_trait]
impl ApplicationStore for SqliteApplicationStore {
    async fn insert(&self, application: &Application) -> Result<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO applications (
                id, full_name, mobile_number, email, current_city, nationality,
                uae_resident, caregiving_experience, willing_to_work, willing_to_drive,
                accepts_timeframe, seeks_permanent_relocation, understands_info_only,
                accepts_financial_costs, attendance_mode, selected_session,
                acknowledged_accuracy, status, tags, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&application.id)
        .bind(&application.full_name)
        .bind(&application.mobile_number)
        .bind(&application.email)
        .bind(&application.current_city)
        .bind(&application.nationality)
        .bind(application.uae_resident)
        .bind(serde_json::to_string(&application.caregiving_experience)?)
        .bind(application.willing_to_work)
        .bind(application.willing_to_drive)
        .bind(application.accepts_timeframe)
        .bind(application.seeks_permanent_relocation)
        .bind(application.understands_info_only)
        .bind(application.accepts_financial_costs)
        .bind(application.attendance_mode.as_str())
        .bind(&application.selected_session)
        .bind(application.acknowledged_accuracy)
        .bind(&application.status)
        .bind(serde_json::to_string(&application.tags)?)
        .bind(application.created_at.timestamp_millis())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) => {
                let is_unique = e
                    .as_database_error()
                    .map(|d| d.is_unique_violation())
                    .unwrap_or(false);
                if is_unique {
                    Err(PlatformError::duplicate("Application", "email", &application.email))
                } else {
                    Err(e.into())
                }
            }
        }
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Application>> {
        let row = sqlx::query("SELECT * FROM applications WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_application).transpose()
    }

    async fn email_exists(&self, email: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM applications WHERE email = ?")
            .bind(email.to_lowercase())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    async fn update_status(
        &self,
        id: &str,
        status: &str,
        note: Option<&str>,
        reviewed_at: DateTime<Utc>,
    ) -> Result<()> {
        let result = match note {
            Some(note) => {
                sqlx::query(
                    "UPDATE applications SET status = ?, review_notes = ?, reviewed_at = ? WHERE id = ?",
                )
                .bind(status)
                .bind(note)
                .bind(reviewed_at.timestamp_millis())
                .bind(id)
                .execute(&self.pool)
                .await?
            }
            None => {
                sqlx::query("UPDATE applications SET status = ?, reviewed_at = ? WHERE id = ?")
                    .bind(status)
                    .bind(reviewed_at.timestamp_millis())
                    .bind(id)
                    .execute(&self.pool)
                    .await?
            }
        };

        if result.rows_affected() == 0 {
            return Err(PlatformError::not_found("Application", id));
        }
        Ok(())
    }

    async fn mark_reviewed(
        &self,
        id: &str,
        note: Option<&str>,
        reviewed_at: DateTime<Utc>,
    ) -> Result<()> {
        let result =
            sqlx::query("UPDATE applications SET review_notes = ?, reviewed_at = ? WHERE id = ?")
                .bind(note)
                .bind(reviewed_at.timestamp_millis())
                .bind(id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(PlatformError::not_found("Application", id));
        }
        Ok(())
    }

    async fn find_page(
        &self,
        filter: &ApplicationFilter,
        sort: ApplicationSortField,
        order: SortOrder,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<Application>, i64)> {
        let mut count_qb: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) AS count FROM applications WHERE 1=1");
        Self::push_filter(&mut count_qb, filter);
        let total: i64 = count_qb
            .build()
            .fetch_one(&self.pool)
            .await?
            .get("count");

        let mut qb: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new("SELECT * FROM applications WHERE 1=1");
        Self::push_filter(&mut qb, filter);
        qb.push(" ORDER BY ")
            .push(Self::sort_column(sort))
            .push(match order {
                SortOrder::Asc => " ASC",
                SortOrder::Desc => " DESC",
            });
        let offset = (page.max(1) - 1) as i64 * limit as i64;
        qb.push(" LIMIT ")
            .push_bind(limit as i64)
            .push(" OFFSET ")
            .push_bind(offset);

        let rows = qb.build().fetch_all(&self.pool).await?;
        let applications = rows
            .iter()
            .map(Self::row_to_application)
            .collect::<Result<Vec<_>>>()?;
        Ok((applications, total))
    }

    async fn count_total(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM applications")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("count"))
    }

    async fn count_by_status(&self) -> Result<Vec<StatusCount>> {
        let rows = sqlx::query(
            "SELECT status, COUNT(*) AS count FROM applications GROUP BY status ORDER BY count DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| StatusCount {
                status: row.get("status"),
                count: row.get("count"),
            })
            .collect())
    }
}
