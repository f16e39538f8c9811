//! PostgreSQL ledger backend.
//!
//! The table is range-partitioned by emission timestamp, one partition per
//! UTC month, with the write-time constraints of the wire schema enforced
//! by CHECK clauses. Rows are inserted exactly once; no UPDATE or DELETE
//! statement exists in this module.

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row;

use certus_types::Verdict;

use crate::error::{LedgerError, LedgerResult};
use crate::model::VerdictRow;
use crate::traits::{LedgerAnalytics, QueryWindow, VerdictStore};

const SELECT_COLUMNS: &str = "timestamp, id, trace_id, decision, reason, agent_id, \
     maturity_level, action_verb, action_resource, action_domain, action_parameters, \
     semantic_ontology_match, semantic_maturity_authorized, semantic_coverage, \
     validator_results, total_latency_ms, certifiable, signature, metadata";

/// Postgres-backed verdict store.
#[derive(Clone)]
pub struct PostgresVerdictStore {
    pool: PgPool,
}

impl PostgresVerdictStore {
    /// Connect and initialize the schema.
    pub async fn connect(database_url: &str) -> LedgerResult<Self> {
        Self::connect_with_options(database_url, 10, 5).await
    }

    /// Connect with explicit pool parameters.
    pub async fn connect_with_options(
        database_url: &str,
        max_connections: u32,
        connect_timeout_secs: u64,
    ) -> LedgerResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(std::time::Duration::from_secs(connect_timeout_secs))
            .connect(database_url)
            .await
            .map_err(|e| LedgerError::Backend(format!("failed to connect postgres: {e}")))?;
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    /// Create adapter from an existing pool.
    pub async fn from_pool(pool: PgPool) -> LedgerResult<Self> {
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn init_schema(&self) -> LedgerResult<()> {
        let ddl = [
            "CREATE SEQUENCE IF NOT EXISTS certus_verdicts_id_seq",
            r#"
            CREATE TABLE IF NOT EXISTS certus_verdicts (
                timestamp TIMESTAMPTZ NOT NULL,
                id BIGINT NOT NULL DEFAULT nextval('certus_verdicts_id_seq'),
                trace_id TEXT NOT NULL,
                decision TEXT NOT NULL CHECK (decision IN ('ALLOW', 'DENY', 'ESCALATE')),
                reason TEXT NOT NULL,
                agent_id TEXT,
                maturity_level INT NOT NULL CHECK (maturity_level BETWEEN 1 AND 5),
                action_verb TEXT NOT NULL,
                action_resource TEXT NOT NULL,
                action_domain TEXT NOT NULL,
                action_parameters JSONB NOT NULL,
                semantic_ontology_match BOOLEAN NOT NULL,
                semantic_maturity_authorized BOOLEAN NOT NULL,
                semantic_coverage DOUBLE PRECISION NOT NULL
                    CHECK (semantic_coverage >= 0 AND semantic_coverage <= 1),
                validator_results JSONB NOT NULL,
                total_latency_ms DOUBLE PRECISION NOT NULL CHECK (total_latency_ms >= 0),
                certifiable BOOLEAN NOT NULL,
                signature TEXT,
                metadata JSONB,
                PRIMARY KEY (timestamp, id)
            ) PARTITION BY RANGE (timestamp)
            "#,
            "CREATE INDEX IF NOT EXISTS certus_verdicts_trace_idx \
                 ON certus_verdicts (trace_id)",
            "CREATE INDEX IF NOT EXISTS certus_verdicts_decision_idx \
                 ON certus_verdicts (decision, timestamp)",
        ];

        for stmt in ddl {
            sqlx::query(stmt)
                .execute(&self.pool)
                .await
                .map_err(|e| LedgerError::Backend(format!("schema init failed: {e}")))?;
        }
        Ok(())
    }

    /// Make sure the monthly partition covering `at` exists. Idempotent.
    async fn ensure_partition(&self, at: DateTime<Utc>) -> LedgerResult<()> {
        let (year, month) = (at.year(), at.month());
        let (next_year, next_month) = if month == 12 {
            (year + 1, 1)
        } else {
            (year, month + 1)
        };
        let stmt = format!(
            "CREATE TABLE IF NOT EXISTS certus_verdicts_{year}_{month:02} \
             PARTITION OF certus_verdicts \
             FOR VALUES FROM ('{year}-{month:02}-01') TO ('{next_year}-{next_month:02}-01')"
        );
        sqlx::query(&stmt)
            .execute(&self.pool)
            .await
            .map_err(|e| LedgerError::Backend(format!("partition creation failed: {e}")))?;
        Ok(())
    }
}

#[async_trait]
impl VerdictStore for PostgresVerdictStore {
    async fn append(&self, verdict: &Verdict) -> LedgerResult<()> {
        let row = VerdictRow::from_verdict(verdict)?;
        self.ensure_partition(row.timestamp).await?;

        sqlx::query(
            r#"
            INSERT INTO certus_verdicts (
                timestamp, trace_id, decision, reason, agent_id, maturity_level,
                action_verb, action_resource, action_domain, action_parameters,
                semantic_ontology_match, semantic_maturity_authorized, semantic_coverage,
                validator_results, total_latency_ms, certifiable, signature, metadata
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                $11, $12, $13, $14, $15, $16, $17, $18
            )
            "#,
        )
        .bind(row.timestamp)
        .bind(&row.trace_id)
        .bind(&row.decision)
        .bind(&row.reason)
        .bind(&row.agent_id)
        .bind(row.maturity_level)
        .bind(&row.action_verb)
        .bind(&row.action_resource)
        .bind(&row.action_domain)
        .bind(&row.action_parameters)
        .bind(row.semantic_ontology_match)
        .bind(row.semantic_maturity_authorized)
        .bind(row.semantic_coverage)
        .bind(&row.validator_results)
        .bind(row.total_latency_ms)
        .bind(row.certifiable)
        .bind(&row.signature)
        .bind(&row.metadata)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_conflict)?;

        Ok(())
    }

    async fn list(&self, window: QueryWindow) -> LedgerResult<Vec<VerdictRow>> {
        let query = format!(
            "SELECT {SELECT_COLUMNS} FROM certus_verdicts \
             ORDER BY timestamp DESC, id DESC {}",
            if window.limit == 0 {
                "OFFSET $1".to_string()
            } else {
                "LIMIT $2 OFFSET $1".to_string()
            }
        );

        let rows = if window.limit == 0 {
            sqlx::query(&query)
                .bind(to_i64(window.offset)?)
                .fetch_all(&self.pool)
                .await
        } else {
            sqlx::query(&query)
                .bind(to_i64(window.offset)?)
                .bind(to_i64(window.limit)?)
                .fetch_all(&self.pool)
                .await
        }
        .map_err(|e| LedgerError::Backend(e.to_string()))?;

        rows.into_iter().map(row_to_record).collect()
    }

    async fn find_by_trace(&self, trace_id: &str) -> LedgerResult<Option<VerdictRow>> {
        let row = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM certus_verdicts WHERE trace_id = $1 \
             ORDER BY timestamp DESC LIMIT 1"
        ))
        .bind(trace_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| LedgerError::Backend(e.to_string()))?;

        row.map(row_to_record).transpose()
    }

    async fn analytics(&self, since: Option<DateTime<Utc>>) -> LedgerResult<LedgerAnalytics> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE decision = 'ALLOW') AS allowed,
                COUNT(*) FILTER (WHERE decision = 'DENY') AS denied,
                COUNT(*) FILTER (WHERE decision = 'ESCALATE') AS escalated,
                COALESCE(AVG(total_latency_ms), 0) AS avg_latency_ms,
                COALESCE(
                    PERCENTILE_CONT(0.95) WITHIN GROUP (ORDER BY total_latency_ms), 0
                ) AS p95_latency_ms,
                COALESCE(MAX(total_latency_ms), 0) AS max_latency_ms,
                COUNT(*) FILTER (WHERE certifiable) AS certifiable
            FROM certus_verdicts
            WHERE ($1::TIMESTAMPTZ IS NULL OR timestamp >= $1)
            "#,
        )
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| LedgerError::Backend(e.to_string()))?;

        let total: i64 = row.try_get("total").map_err(backend)?;
        let allowed: i64 = row.try_get("allowed").map_err(backend)?;
        let denied: i64 = row.try_get("denied").map_err(backend)?;
        let escalated: i64 = row.try_get("escalated").map_err(backend)?;
        let certifiable: i64 = row.try_get("certifiable").map_err(backend)?;
        let avg_latency_ms: f64 = row.try_get("avg_latency_ms").map_err(backend)?;
        let p95_latency_ms: f64 = row.try_get("p95_latency_ms").map_err(backend)?;
        let max_latency_ms: f64 = row.try_get("max_latency_ms").map_err(backend)?;

        let rate = |n: i64| {
            if total > 0 {
                n as f64 / total as f64
            } else {
                0.0
            }
        };

        Ok(LedgerAnalytics {
            total: total as u64,
            allowed: allowed as u64,
            denied: denied as u64,
            escalated: escalated as u64,
            deny_rate: rate(denied),
            escalate_rate: rate(escalated),
            avg_latency_ms,
            p95_latency_ms,
            max_latency_ms,
            certifiable_rate: rate(certifiable),
        })
    }
}

fn backend(e: sqlx::Error) -> LedgerError {
    LedgerError::Backend(e.to_string())
}

fn row_to_record(row: sqlx::postgres::PgRow) -> LedgerResult<VerdictRow> {
    Ok(VerdictRow {
        timestamp: row.try_get("timestamp").map_err(backend)?,
        id: row.try_get("id").map_err(backend)?,
        trace_id: row.try_get("trace_id").map_err(backend)?,
        decision: row.try_get("decision").map_err(backend)?,
        reason: row.try_get("reason").map_err(backend)?,
        agent_id: row.try_get("agent_id").map_err(backend)?,
        maturity_level: row.try_get("maturity_level").map_err(backend)?,
        action_verb: row.try_get("action_verb").map_err(backend)?,
        action_resource: row.try_get("action_resource").map_err(backend)?,
        action_domain: row.try_get("action_domain").map_err(backend)?,
        action_parameters: row.try_get("action_parameters").map_err(backend)?,
        semantic_ontology_match: row.try_get("semantic_ontology_match").map_err(backend)?,
        semantic_maturity_authorized: row
            .try_get("semantic_maturity_authorized")
            .map_err(backend)?,
        semantic_coverage: row.try_get("semantic_coverage").map_err(backend)?,
        validator_results: row.try_get("validator_results").map_err(backend)?,
        total_latency_ms: row.try_get("total_latency_ms").map_err(backend)?,
        certifiable: row.try_get("certifiable").map_err(backend)?,
        signature: row.try_get("signature").map_err(backend)?,
        metadata: row.try_get("metadata").map_err(backend)?,
    })
}

fn map_sqlx_conflict(err: sqlx::Error) -> LedgerError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some("23505") {
            return LedgerError::Conflict(db_err.message().to_string());
        }
    }
    LedgerError::Backend(err.to_string())
}

fn to_i64(value: usize) -> LedgerResult<i64> {
    i64::try_from(value)
        .map_err(|_| LedgerError::InvalidInput("window value too large".to_string()))
}
