//! Generic document table: one row per aggregate.

use std::marker::PhantomData;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::Version;
use domain::{Aggregate, Page, Repository, RepositoryError, RepositoryResult};
use serde::{Serialize, de::DeserializeOwned};
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{PgPool, Postgres, Row};

use crate::error::{db_error, write_error};

type PgQuery<'q> = Query<'q, Postgres, PgArguments>;

/// A scalar column value written alongside the document.
#[derive(Debug, Clone)]
pub enum Column {
    Text(Option<String>),
    Int(i64),
    Float(f64),
    Bool(bool),
    Time(Option<DateTime<Utc>>),
}

impl Column {
    pub fn text(value: impl Into<String>) -> Self {
        Column::Text(Some(value.into()))
    }

    pub fn time(value: DateTime<Utc>) -> Self {
        Column::Time(Some(value))
    }

    fn bind(self, query: PgQuery<'_>) -> PgQuery<'_> {
        match self {
            Column::Text(v) => query.bind(v),
            Column::Int(v) => query.bind(v),
            Column::Float(v) => query.bind(v),
            Column::Bool(v) => query.bind(v),
            Column::Time(v) => query.bind(v),
        }
    }
}

/// An aggregate stored as a JSONB document plus lookup columns.
pub trait Document: Aggregate + Serialize + DeserializeOwned {
    const TABLE: &'static str;

    /// Lookup columns, in a fixed order.
    fn columns(&self) -> Vec<(&'static str, Column)>;
}

/// Decodes a `version, document` row.
pub(crate) fn decode<A: Document>(row: &PgRow) -> RepositoryResult<A> {
    let version: i64 = row.try_get("version").map_err(db_error)?;
    let document: serde_json::Value = row.try_get("document").map_err(db_error)?;
    let mut aggregate: A = serde_json::from_value(document)?;
    aggregate.set_version(Version::new(version));
    Ok(aggregate)
}

/// PostgreSQL repository for any [`Document`].
pub struct PgStore<A> {
    pool: PgPool,
    _aggregate: PhantomData<fn() -> A>,
}

impl<A> Clone for PgStore<A> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            _aggregate: PhantomData,
        }
    }
}

impl<A> std::fmt::Debug for PgStore<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgStore").finish_non_exhaustive()
    }
}

impl<A: Document> PgStore<A> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _aggregate: PhantomData,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub(crate) fn select(&self) -> Select {
        Select::new(A::TABLE)
    }

    async fn stored_version(&self, id: &A::Id) -> RepositoryResult<Option<Version>> {
        let sql = format!("SELECT version FROM {} WHERE id = $1", A::TABLE);
        let row = sqlx::query(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;
        row.map(|r| r.try_get::<i64, _>(0).map(Version::new))
            .transpose()
            .map_err(db_error)
    }
}

#[async_trait]
impl<A: Document> Repository<A> for PgStore<A> {
    async fn insert(&self, aggregate: &A) -> RepositoryResult<Version> {
        let document = serde_json::to_value(aggregate)?;
        let columns = aggregate.columns();

        let names: String = columns.iter().map(|(n, _)| format!(", {n}")).collect();
        let placeholders: String = (0..columns.len()).map(|i| format!(", ${}", i + 4)).collect();
        let sql = format!(
            "INSERT INTO {} (id, version, document{names}) VALUES ($1, $2, $3{placeholders})",
            A::TABLE
        );

        let mut query = sqlx::query(&sql)
            .bind(aggregate.id().to_string())
            .bind(Version::first().as_i64())
            .bind(document);
        for (_, value) in columns {
            query = value.bind(query);
        }
        query
            .execute(&self.pool)
            .await
            .map_err(|e| write_error(e, A::aggregate_type(), aggregate.id()))?;

        tracing::debug!(table = A::TABLE, id = %aggregate.id(), "row inserted");
        Ok(Version::first())
    }

    async fn get(&self, id: &A::Id) -> RepositoryResult<A> {
        let sql = format!("SELECT version, document FROM {} WHERE id = $1", A::TABLE);
        let row = sqlx::query(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
            .ok_or_else(|| RepositoryError::not_found(A::aggregate_type(), id))?;
        decode(&row)
    }

    async fn update(&self, aggregate: &A) -> RepositoryResult<Version> {
        let document = serde_json::to_value(aggregate)?;
        let columns = aggregate.columns();

        let sets: String = columns
            .iter()
            .enumerate()
            .map(|(i, (n, _))| format!(", {n} = ${}", i + 4))
            .collect();
        let sql = format!(
            "UPDATE {} SET version = version + 1, document = $3{sets} \
             WHERE id = $1 AND version = $2",
            A::TABLE
        );

        let mut query = sqlx::query(&sql)
            .bind(aggregate.id().to_string())
            .bind(aggregate.version().as_i64())
            .bind(document);
        for (_, value) in columns {
            query = value.bind(query);
        }
        let result = query
            .execute(&self.pool)
            .await
            .map_err(|e| write_error(e, A::aggregate_type(), aggregate.id()))?;

        if result.rows_affected() == 0 {
            return match self.stored_version(aggregate.id()).await? {
                None => Err(RepositoryError::not_found(
                    A::aggregate_type(),
                    aggregate.id(),
                )),
                Some(actual) => Err(RepositoryError::Conflict {
                    entity: A::aggregate_type(),
                    id: aggregate.id().to_string(),
                    expected: aggregate.version(),
                    actual,
                }),
            };
        }
        Ok(aggregate.version().next())
    }

    async fn delete(&self, id: &A::Id) -> RepositoryResult<()> {
        let sql = format!("DELETE FROM {} WHERE id = $1", A::TABLE);
        let result = sqlx::query(&sql)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::not_found(A::aggregate_type(), id));
        }
        Ok(())
    }
}

/// Small `SELECT` builder over a document table.
///
/// Conditions use `{}` where their bound value goes.
#[derive(Debug)]
pub(crate) struct Select {
    table: &'static str,
    conditions: Vec<String>,
    params: Vec<Column>,
    order_by: Option<&'static str>,
}

impl Select {
    fn new(table: &'static str) -> Self {
        Self {
            table,
            conditions: Vec::new(),
            params: Vec::new(),
            order_by: None,
        }
    }

    pub fn filter(mut self, condition: &str, value: Column) -> Self {
        self.params.push(value);
        let placeholder = format!("${}", self.params.len());
        self.conditions.push(condition.replace("{}", &placeholder));
        self
    }

    pub fn filter_opt<T>(
        self,
        condition: &str,
        value: Option<T>,
        to_column: impl FnOnce(T) -> Column,
    ) -> Self {
        match value {
            Some(v) => self.filter(condition, to_column(v)),
            None => self,
        }
    }

    /// A condition without a bound value.
    pub fn condition(mut self, condition: &'static str) -> Self {
        self.conditions.push(condition.to_string());
        self
    }

    pub fn order_by(mut self, order_by: &'static str) -> Self {
        self.order_by = Some(order_by);
        self
    }

    fn where_clause(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.conditions.join(" AND "))
        }
    }

    fn sql(&self, suffix: &str) -> String {
        let order = self
            .order_by
            .map(|o| format!(" ORDER BY {o}"))
            .unwrap_or_default();
        format!(
            "SELECT version, document FROM {}{}{order}{suffix}",
            self.table,
            self.where_clause()
        )
    }

    fn bound<'q>(sql: &'q str, params: &[Column]) -> PgQuery<'q> {
        params
            .iter()
            .cloned()
            .fold(sqlx::query(sql), |query, value| value.bind(query))
    }

    pub async fn fetch_all<A: Document>(self, pool: &PgPool) -> RepositoryResult<Vec<A>> {
        let sql = self.sql("");
        let rows = Self::bound(&sql, &self.params)
            .fetch_all(pool)
            .await
            .map_err(db_error)?;
        rows.iter().map(decode::<A>).collect()
    }

    pub async fn fetch_optional<A: Document>(self, pool: &PgPool) -> RepositoryResult<Option<A>> {
        let sql = self.sql(" LIMIT 1");
        let row = Self::bound(&sql, &self.params)
            .fetch_optional(pool)
            .await
            .map_err(db_error)?;
        row.as_ref().map(decode::<A>).transpose()
    }

    pub async fn fetch_page<A: Document>(
        self,
        pool: &PgPool,
        offset: usize,
        limit: usize,
    ) -> RepositoryResult<Page<A>> {
        let count_sql = format!("SELECT COUNT(*) FROM {}{}", self.table, self.where_clause());
        let total: i64 = Self::bound(&count_sql, &self.params)
            .fetch_one(pool)
            .await
            .and_then(|row| row.try_get(0))
            .map_err(db_error)?;

        let n = self.params.len();
        let sql = self.sql(&format!(" LIMIT ${} OFFSET ${}", n + 1, n + 2));
        let rows = Self::bound(&sql, &self.params)
            .bind(limit as i64)
            .bind(offset as i64)
            .fetch_all(pool)
            .await
            .map_err(db_error)?;

        Ok(Page {
            items: rows.iter().map(decode::<A>).collect::<RepositoryResult<_>>()?,
            total: total as usize,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_numbers_placeholders_in_order() {
        let select = Select::new("orders")
            .filter("status = {}", Column::text("PAID"))
            .filter_opt("customer_id = {}", None::<String>, Column::text)
            .filter("created_at >= {}", Column::time(Utc::now()))
            .condition("table_id IS NOT NULL")
            .order_by("created_at DESC");

        assert_eq!(
            select.sql(""),
            "SELECT version, document FROM orders WHERE status = $1 AND created_at >= $2 \
             AND table_id IS NOT NULL ORDER BY created_at DESC"
        );
    }

    #[test]
    fn select_without_conditions() {
        assert_eq!(
            Select::new("menus").sql(" LIMIT 1"),
            "SELECT version, document FROM menus LIMIT 1"
        );
    }
}
