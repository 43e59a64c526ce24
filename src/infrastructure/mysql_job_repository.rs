//! MySQL-backed job repository
//!
//! Records land in `ems_jobs`, one row per `job_id`. Re-harvesting a listing
//! updates its row in place through `ON DUPLICATE KEY UPDATE`.

use async_trait::async_trait;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::Row;
use tracing::{debug, info};

use crate::domain::{JobRepository, RepositoryError, StandardizedRecord};
use crate::infrastructure::config::DatabaseConfig;

const CREATE_JOBS_TABLE_SQL: &str = r"
    CREATE TABLE IF NOT EXISTS ems_jobs (
        id BIGINT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY,
        job_id VARCHAR(128) NOT NULL,
        job_name VARCHAR(255),
        company_name VARCHAR(255),
        city VARCHAR(64),
        district VARCHAR(64),
        salary_raw VARCHAR(64),
        salary_min INT UNSIGNED NOT NULL DEFAULT 0,
        salary_max INT UNSIGNED NOT NULL DEFAULT 0,
        salary_avg INT UNSIGNED NOT NULL DEFAULT 0,
        salary_months INT UNSIGNED NOT NULL DEFAULT 12,
        experience_raw VARCHAR(64),
        exp_min INT UNSIGNED NOT NULL DEFAULT 0,
        exp_max INT UNSIGNED NOT NULL DEFAULT 0,
        education VARCHAR(64),
        skills_tags TEXT,
        job_desc TEXT,
        detail_url VARCHAR(255) NOT NULL,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP,
        UNIQUE KEY uk_ems_jobs_job_id (job_id)
    ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4
";

const UPSERT_JOB_SQL: &str = r"
    INSERT INTO ems_jobs (
        job_id, job_name, company_name, city, district,
        salary_raw, salary_min, salary_max, salary_avg, salary_months,
        experience_raw, exp_min, exp_max,
        education, skills_tags, job_desc, detail_url
    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
    ON DUPLICATE KEY UPDATE
        job_name = VALUES(job_name),
        company_name = VALUES(company_name),
        city = VALUES(city),
        district = VALUES(district),
        salary_raw = VALUES(salary_raw),
        salary_min = VALUES(salary_min),
        salary_max = VALUES(salary_max),
        salary_avg = VALUES(salary_avg),
        salary_months = VALUES(salary_months),
        experience_raw = VALUES(experience_raw),
        exp_min = VALUES(exp_min),
        exp_max = VALUES(exp_max),
        education = VALUES(education),
        skills_tags = VALUES(skills_tags),
        job_desc = VALUES(job_desc),
        detail_url = VALUES(detail_url)
";

const SELECT_JOBS_SQL: &str = r"
    SELECT job_id, job_name, company_name, city, district,
           salary_raw, salary_min, salary_max, salary_avg, salary_months,
           experience_raw, exp_min, exp_max,
           education, skills_tags, job_desc, detail_url
    FROM ems_jobs
    ORDER BY id
";

/// Skill tags column value; non-ASCII tags are stored unescaped
pub fn encode_skills(skills: &[String]) -> Result<String, RepositoryError> {
    Ok(serde_json::to_string(skills)?)
}

pub fn decode_skills(stored: Option<&str>) -> Result<Vec<String>, RepositoryError> {
    match stored.map(str::trim) {
        None | Some("") => Ok(Vec::new()),
        Some(json) => Ok(serde_json::from_str(json)?),
    }
}

#[derive(Clone)]
pub struct MySqlJobRepository {
    pool: MySqlPool,
}

impl MySqlJobRepository {
    pub const fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub async fn connect(config: &DatabaseConfig) -> Result<Self, RepositoryError> {
        let pool = MySqlPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await?;
        info!("Connected to MySQL (max {} connections)", config.max_connections);
        Ok(Self::new(pool))
    }

    pub const fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    /// Create `ems_jobs` if it does not exist yet
    pub async fn migrate(&self) -> Result<(), RepositoryError> {
        sqlx::query(CREATE_JOBS_TABLE_SQL).execute(&self.pool).await?;
        debug!("ems_jobs table ready");
        Ok(())
    }
}

fn record_from_row(row: &MySqlRow) -> Result<StandardizedRecord, RepositoryError> {
    let skills: Option<String> = row.try_get("skills_tags")?;
    let job_desc: Option<String> = row.try_get("job_desc")?;

    Ok(StandardizedRecord {
        job_id: row.try_get("job_id")?,
        job_name: row.try_get("job_name")?,
        company_name: row.try_get("company_name")?,
        city: row.try_get("city")?,
        district: row.try_get("district")?,
        salary_raw: row.try_get("salary_raw")?,
        salary_min: row.try_get("salary_min")?,
        salary_max: row.try_get("salary_max")?,
        salary_avg: row.try_get("salary_avg")?,
        salary_months: row.try_get("salary_months")?,
        experience_raw: row.try_get("experience_raw")?,
        exp_min: row.try_get("exp_min")?,
        exp_max: row.try_get("exp_max")?,
        education: row.try_get("education")?,
        skills_tags: decode_skills(skills.as_deref())?,
        job_desc: job_desc.unwrap_or_default(),
        detail_url: row.try_get("detail_url")?,
    })
}

#[async_trait]
impl JobRepository for MySqlJobRepository {
    /// The whole batch is written in one transaction; any failure rolls it back.
    async fn upsert_batch(&self, records: &[StandardizedRecord]) -> Result<u64, RepositoryError> {
        if records.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        for record in records {
            sqlx::query(UPSERT_JOB_SQL)
                .bind(&record.job_id)
                .bind(&record.job_name)
                .bind(&record.company_name)
                .bind(&record.city)
                .bind(&record.district)
                .bind(&record.salary_raw)
                .bind(record.salary_min)
                .bind(record.salary_max)
                .bind(record.salary_avg)
                .bind(record.salary_months)
                .bind(&record.experience_raw)
                .bind(record.exp_min)
                .bind(record.exp_max)
                .bind(&record.education)
                .bind(encode_skills(&record.skills_tags)?)
                .bind(&record.job_desc)
                .bind(&record.detail_url)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        info!("Inserted/Updated {} jobs", records.len());
        Ok(records.len() as u64)
    }

    async fn find_all(&self) -> Result<Vec<StandardizedRecord>, RepositoryError> {
        let rows = sqlx::query(SELECT_JOBS_SQL).fetch_all(&self.pool).await?;
        rows.iter().map(record_from_row).collect()
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM ems_jobs")
            .fetch_one(&self.pool)
            .await?;
        u64::try_from(total).map_err(|_| RepositoryError::OutOfRange { column: "COUNT(*)" })
    }
}
