use async_trait::async_trait;
use sqlx::postgres::{PgArguments, PgPoolOptions, PgRow};
use sqlx::query::{Query, QueryAs};
use sqlx::{FromRow, PgPool, Postgres};

use super::{DocumentCollection, StoreError};
use crate::entities::{Feedback, FeedbackReceiver, Token};
use crate::filter::{DocumentFilter, FilterValue, FilterWhere};

/// A record type persisted in its own Postgres table.
pub trait PgRecord: for<'r> FromRow<'r, PgRow> + Send + Sync + Unpin {
    const TABLE: &'static str;
    const INSERT: &'static str;

    fn bind_insert<'q>(
        &self,
        query: Query<'q, Postgres, PgArguments>,
    ) -> Query<'q, Postgres, PgArguments>;
}

impl PgRecord for FeedbackReceiver {
    const TABLE: &'static str = "feedback_receivers";
    const INSERT: &'static str =
        "INSERT INTO feedback_receivers (id, name, description, created_at) VALUES ($1, $2, $3, $4)";

    fn bind_insert<'q>(
        &self,
        query: Query<'q, Postgres, PgArguments>,
    ) -> Query<'q, Postgres, PgArguments> {
        query
            .bind(self.id)
            .bind(self.name.clone())
            .bind(self.description.clone())
            .bind(self.created_at)
    }
}

impl PgRecord for Token {
    const TABLE: &'static str = "tokens";
    const INSERT: &'static str =
        "INSERT INTO tokens (id, feedback_receiver_id, created_at, expiry_time, time_used) VALUES ($1, $2, $3, $4, $5)";

    fn bind_insert<'q>(
        &self,
        query: Query<'q, Postgres, PgArguments>,
    ) -> Query<'q, Postgres, PgArguments> {
        query
            .bind(self.id)
            .bind(self.feedback_receiver_id)
            .bind(self.created_at)
            .bind(self.expiry_time)
            .bind(self.time_used)
    }
}

impl PgRecord for Feedback {
    const TABLE: &'static str = "feedbacks";
    const INSERT: &'static str =
        "INSERT INTO feedbacks (id, feedback_receiver_id, rating, description, created_at) VALUES ($1, $2, $3, $4, $5)";

    fn bind_insert<'q>(
        &self,
        query: Query<'q, Postgres, PgArguments>,
    ) -> Query<'q, Postgres, PgArguments> {
        query
            .bind(self.id)
            .bind(self.feedback_receiver_id)
            .bind(self.rating)
            .bind(self.description.clone())
            .bind(self.created_at)
    }
}

/// Postgres-backed collection for one record type.
pub struct PgCollection<T> {
    pool: PgPool,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> PgCollection<T> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _phantom: std::marker::PhantomData,
        }
    }
}

#[async_trait]
impl<T: PgRecord> DocumentCollection<T> for PgCollection<T> {
    async fn insert_one(&self, record: &T) -> Result<(), StoreError> {
        record
            .bind_insert(sqlx::query(T::INSERT))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert_many(&self, records: &[T]) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        for record in records {
            record
                .bind_insert(sqlx::query(T::INSERT))
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn find(
        &self,
        filter: &DocumentFilter,
        skip: Option<i64>,
        limit: Option<i64>,
    ) -> Result<Vec<T>, StoreError> {
        let (clause, params) = FilterWhere::generate(filter, 0)?;

        let mut sql = format!("SELECT * FROM \"{}\"", T::TABLE);
        if !clause.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clause);
        }
        if let Some(l) = limit {
            sql.push_str(&format!(" LIMIT {}", l));
        }
        if let Some(s) = skip {
            sql.push_str(&format!(" OFFSET {}", s));
        }

        let mut query = sqlx::query_as::<_, T>(&sql);
        for value in params {
            query = bind_value_as(query, value);
        }
        Ok(query.fetch_all(&self.pool).await?)
    }

    async fn delete_many(&self, filter: &DocumentFilter) -> Result<u64, StoreError> {
        let (clause, params) = FilterWhere::generate(filter, 0)?;

        let mut sql = format!("DELETE FROM \"{}\"", T::TABLE);
        if !clause.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clause);
        }

        let mut query = sqlx::query(&sql);
        for value in params {
            query = bind_value(query, value);
        }
        Ok(query.execute(&self.pool).await?.rows_affected())
    }

    async fn update_one(
        &self,
        filter: &DocumentFilter,
        field: &'static str,
        value: FilterValue,
    ) -> Result<u64, StoreError> {
        let (clause, params) = FilterWhere::generate(filter, 1)?;
        if clause.is_empty() {
            return Err(StoreError::Backend(
                "update_one requires a non-empty filter".to_string(),
            ));
        }
        FilterWhere::validate_column(field)?;

        let sql = format!(
            "UPDATE \"{}\" SET \"{}\" = $1 WHERE {}",
            T::TABLE,
            field,
            clause
        );
        let mut query = bind_value(sqlx::query(&sql), value);
        for param in params {
            query = bind_value(query, param);
        }
        Ok(query.execute(&self.pool).await?.rows_affected())
    }
}

fn bind_value<'q>(
    query: Query<'q, Postgres, PgArguments>,
    value: FilterValue,
) -> Query<'q, Postgres, PgArguments> {
    match value {
        FilterValue::Uuid(v) => query.bind(v),
        FilterValue::UuidSet(v) => query.bind(v),
        FilterValue::Timestamp(v) => query.bind(v),
        FilterValue::Int(v) => query.bind(v),
        FilterValue::Text(v) => query.bind(v),
    }
}

fn bind_value_as<'q, O>(
    query: QueryAs<'q, Postgres, O, PgArguments>,
    value: FilterValue,
) -> QueryAs<'q, Postgres, O, PgArguments> {
    match value {
        FilterValue::Uuid(v) => query.bind(v),
        FilterValue::UuidSet(v) => query.bind(v),
        FilterValue::Timestamp(v) => query.bind(v),
        FilterValue::Int(v) => query.bind(v),
        FilterValue::Text(v) => query.bind(v),
    }
}

/// Opens the connection pool used by all collections.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool, StoreError> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Creates the three collection tables if they are missing. Kept as plain DDL
/// so a fresh database works without a separate migration step.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), StoreError> {
    let statements = [
        "CREATE TABLE IF NOT EXISTS feedback_receivers (
            id UUID PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL
        )",
        "CREATE TABLE IF NOT EXISTS tokens (
            id UUID PRIMARY KEY,
            feedback_receiver_id UUID NOT NULL,
            created_at TIMESTAMPTZ NOT NULL,
            expiry_time TIMESTAMPTZ,
            time_used TIMESTAMPTZ
        )",
        "CREATE INDEX IF NOT EXISTS tokens_receiver_idx ON tokens (feedback_receiver_id)",
        "CREATE TABLE IF NOT EXISTS feedbacks (
            id UUID PRIMARY KEY,
            feedback_receiver_id UUID NOT NULL,
            rating SMALLINT NOT NULL,
            description TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL
        )",
        "CREATE INDEX IF NOT EXISTS feedbacks_receiver_idx ON feedbacks (feedback_receiver_id)",
    ];
    for statement in statements {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}
