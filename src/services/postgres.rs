use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::collections::HashSet;
use std::time::Duration;

use crate::core::store::{StoreError, SwipeStore};
use crate::models::{Match, MatchInsert, NewSwipe, Swipe, SwipeAction, UserPair};

/// PostgreSQL-backed swipe store.
///
/// The `swipes_pair_key` and `matches_pair_key` unique constraints are the
/// authoritative duplicate guards; a unique violation on insert surfaces as
/// `StoreError::Conflict`.
pub struct PostgresSwipeStore {
    pool: PgPool,
}

impl PostgresSwipeStore {
    /// Connect and run pending migrations
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, StoreError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }

    /// Wrap an existing pool; migrations are the caller's concern
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn db_id(id: u64) -> Result<i64, StoreError> {
    i64::try_from(id).map_err(|_| StoreError::InvalidInput(format!("id {} out of range", id)))
}

fn app_id(id: i64) -> Result<u64, StoreError> {
    u64::try_from(id).map_err(|_| StoreError::InvalidInput(format!("stored id {} is negative", id)))
}

fn db_limit(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

fn map_insert_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            let constraint = db_err.constraint().unwrap_or("unique").to_string();
            return StoreError::Conflict(constraint);
        }
    }
    StoreError::SqlxError(err)
}

fn swipe_from_row(row: &PgRow) -> Result<Swipe, StoreError> {
    let action: String = row.try_get("action")?;
    Ok(Swipe {
        id: app_id(row.try_get("id")?)?,
        swiper_user_id: app_id(row.try_get("swiper_user_id")?)?,
        swiped_profile_user_id: app_id(row.try_get("swiped_profile_user_id")?)?,
        action: action
            .parse::<SwipeAction>()
            .map_err(|e| StoreError::InvalidInput(e.to_string()))?,
        created_at: row.try_get("created_at")?,
    })
}

fn match_from_row(row: &PgRow) -> Result<Match, StoreError> {
    Ok(Match {
        id: app_id(row.try_get("id")?)?,
        user_one_id: app_id(row.try_get("user_one_id")?)?,
        user_two_id: app_id(row.try_get("user_two_id")?)?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl SwipeStore for PostgresSwipeStore {
    async fn find_swipe(&self, swiper: u64, swiped: u64) -> Result<Option<Swipe>, StoreError> {
        let query = r#"
            SELECT id, swiper_user_id, swiped_profile_user_id, action, created_at
            FROM swipes
            WHERE swiper_user_id = $1 AND swiped_profile_user_id = $2
        "#;

        let row = sqlx::query(query)
            .bind(db_id(swiper)?)
            .bind(db_id(swiped)?)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(swipe_from_row).transpose()
    }

    async fn count_swipes_since(&self, swiper: u64, since: DateTime<Utc>) -> Result<u64, StoreError> {
        let query = r#"
            SELECT COUNT(*) AS recent
            FROM swipes
            WHERE swiper_user_id = $1 AND created_at > $2
        "#;

        let row = sqlx::query(query)
            .bind(db_id(swiper)?)
            .bind(since)
            .fetch_one(&self.pool)
            .await?;

        app_id(row.try_get("recent")?)
    }

    async fn insert_swipe(&self, swipe: NewSwipe) -> Result<Swipe, StoreError> {
        let query = r#"
            INSERT INTO swipes (swiper_user_id, swiped_profile_user_id, action, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, swiper_user_id, swiped_profile_user_id, action, created_at
        "#;

        let row = sqlx::query(query)
            .bind(db_id(swipe.swiper_user_id)?)
            .bind(db_id(swipe.swiped_profile_user_id)?)
            .bind(swipe.action.as_str())
            .bind(swipe.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(map_insert_error)?;

        let stored = swipe_from_row(&row)?;
        tracing::debug!(
            "Inserted swipe {}: {} -> {} ({})",
            stored.id,
            stored.swiper_user_id,
            stored.swiped_profile_user_id,
            stored.action
        );
        Ok(stored)
    }

    async fn insert_swipe_within_limit(
        &self,
        swipe: NewSwipe,
        since: DateTime<Utc>,
        max_swipes: u64,
    ) -> Result<Swipe, StoreError> {
        let swiper = db_id(swipe.swiper_user_id)?;
        let swiped = db_id(swipe.swiped_profile_user_id)?;

        let mut tx = self.pool.begin().await?;

        // Serialises writers for one swiper until commit or rollback
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(swiper)
            .execute(&mut *tx)
            .await?;

        let window = r#"
            SELECT COUNT(*) FILTER (WHERE created_at > $2) AS recent,
                   COUNT(*) FILTER (WHERE swiped_profile_user_id = $3) AS existing
            FROM swipes
            WHERE swiper_user_id = $1
        "#;

        let row = sqlx::query(window)
            .bind(swiper)
            .bind(since)
            .bind(swiped)
            .fetch_one(&mut *tx)
            .await?;

        if app_id(row.try_get("existing")?)? > 0 {
            return Err(StoreError::Conflict("swipes_pair_key".to_string()));
        }
        let recent = app_id(row.try_get("recent")?)?;
        if recent >= max_swipes {
            return Err(StoreError::LimitExceeded(format!(
                "user {} has {} swipes since {}",
                swipe.swiper_user_id, recent, since
            )));
        }

        let insert = r#"
            INSERT INTO swipes (swiper_user_id, swiped_profile_user_id, action, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, swiper_user_id, swiped_profile_user_id, action, created_at
        "#;

        let row = sqlx::query(insert)
            .bind(swiper)
            .bind(swiped)
            .bind(swipe.action.as_str())
            .bind(swipe.created_at)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_insert_error)?;
        let stored = swipe_from_row(&row)?;

        tx.commit().await?;

        tracing::debug!(
            "Inserted swipe {}: {} -> {} ({} in window before it)",
            stored.id,
            stored.swiper_user_id,
            stored.swiped_profile_user_id,
            recent
        );
        Ok(stored)
    }

    async fn swiped_user_ids(&self, swiper: u64) -> Result<HashSet<u64>, StoreError> {
        let query = r#"
            SELECT swiped_profile_user_id
            FROM swipes
            WHERE swiper_user_id = $1
        "#;

        let rows = sqlx::query(query).bind(db_id(swiper)?).fetch_all(&self.pool).await?;

        let ids = rows
            .iter()
            .map(|row| app_id(row.try_get("swiped_profile_user_id")?))
            .collect::<Result<HashSet<u64>, StoreError>>()?;

        tracing::debug!("User {} has swiped {} profiles", swiper, ids.len());
        Ok(ids)
    }

    async fn list_swipes(
        &self,
        swiper: u64,
        action: Option<SwipeAction>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Swipe>, StoreError> {
        let query = r#"
            SELECT id, swiper_user_id, swiped_profile_user_id, action, created_at
            FROM swipes
            WHERE swiper_user_id = $1
              AND ($2::VARCHAR IS NULL OR action = $2)
            ORDER BY id ASC
            LIMIT $3 OFFSET $4
        "#;

        let rows = sqlx::query(query)
            .bind(db_id(swiper)?)
            .bind(action.map(|a| a.as_str()))
            .bind(db_limit(limit))
            .bind(db_limit(offset))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(swipe_from_row).collect()
    }

    async fn insert_match(&self, pair: UserPair, created_at: DateTime<Utc>) -> Result<MatchInsert, StoreError> {
        let insert = r#"
            INSERT INTO matches (user_one_id, user_two_id, created_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_one_id, user_two_id) DO NOTHING
            RETURNING id, user_one_id, user_two_id, created_at
        "#;

        let inserted = sqlx::query(insert)
            .bind(db_id(pair.user_one())?)
            .bind(db_id(pair.user_two())?)
            .bind(created_at)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(row) = inserted {
            return Ok(MatchInsert::Created(match_from_row(&row)?));
        }

        // Lost the race or already matched earlier
        match self.find_match(pair).await? {
            Some(existing) => Ok(MatchInsert::Existing(existing)),
            None => Err(StoreError::Unavailable(format!(
                "match {}-{} neither inserted nor found",
                pair.user_one(),
                pair.user_two()
            ))),
        }
    }

    async fn find_match(&self, pair: UserPair) -> Result<Option<Match>, StoreError> {
        let query = r#"
            SELECT id, user_one_id, user_two_id, created_at
            FROM matches
            WHERE user_one_id = $1 AND user_two_id = $2
        "#;

        let row = sqlx::query(query)
            .bind(db_id(pair.user_one())?)
            .bind(db_id(pair.user_two())?)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(match_from_row).transpose()
    }

    async fn list_matches(&self, user_id: u64) -> Result<Vec<Match>, StoreError> {
        let query = r#"
            SELECT id, user_one_id, user_two_id, created_at
            FROM matches
            WHERE user_one_id = $1 OR user_two_id = $1
            ORDER BY id ASC
        "#;

        let rows = sqlx::query(query).bind(db_id(user_id)?).fetch_all(&self.pool).await?;
        rows.iter().map(match_from_row).collect()
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}
