//! Postgres-backed entity store.
//!
//! 256-bit integers are stored as `NUMERIC(78, 0)` and read back through a
//! `::text` cast, so no precision is lost in either direction.

use anyhow::{Context, Result};
use async_trait::async_trait;
use govindex_world::{Address, Bytes, Proposal, Vote, U256};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use crate::store::EntityStore;

const PROPOSAL_COLUMNS: &str = r#"
    id, proposal_id::text AS proposal_id, proposer, description,
    targets, calldatas, signatures, "values",
    vote_start::text AS vote_start, vote_end::text AS vote_end,
    created_at_block, created_at,
    votes_for::text AS votes_for, votes_against::text AS votes_against,
    votes_abstains::text AS votes_abstains, quorum::text AS quorum,
    is_canceled, is_executed, is_queued, eta_seconds::text AS eta_seconds
"#;

const VOTE_COLUMNS: &str = r#"
    id, proposal_id::text AS proposal_id, voter, support,
    weight::text AS weight, reason, block_number, "timestamp"
"#;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .context("connecting to Postgres")?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run the embedded SQL migrations (entities and memo cache).
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Store migrations applied");
        Ok(())
    }
}

#[async_trait]
impl EntityStore for PgStore {
    async fn get_proposal(&self, id: &str) -> Result<Option<Proposal>> {
        let sql = format!("SELECT {PROPOSAL_COLUMNS} FROM proposals WHERE id = $1");
        let row = sqlx::query_as::<_, ProposalRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Proposal::try_from).transpose()
    }

    async fn set_proposal(&self, p: Proposal) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO proposals
                (id, proposal_id, proposer, description, targets, calldatas, signatures, "values",
                 vote_start, vote_end, created_at_block, created_at,
                 votes_for, votes_against, votes_abstains, quorum,
                 is_canceled, is_executed, is_queued, eta_seconds)
            VALUES ($1, $2::numeric, $3, $4, $5, $6, $7, $8,
                    $9::numeric, $10::numeric, $11, $12,
                    $13::numeric, $14::numeric, $15::numeric, $16::numeric,
                    $17, $18, $19, $20::numeric)
            ON CONFLICT (id) DO UPDATE SET
                proposal_id = EXCLUDED.proposal_id,
                proposer = EXCLUDED.proposer,
                description = EXCLUDED.description,
                targets = EXCLUDED.targets,
                calldatas = EXCLUDED.calldatas,
                signatures = EXCLUDED.signatures,
                "values" = EXCLUDED."values",
                vote_start = EXCLUDED.vote_start,
                vote_end = EXCLUDED.vote_end,
                created_at_block = EXCLUDED.created_at_block,
                created_at = EXCLUDED.created_at,
                votes_for = EXCLUDED.votes_for,
                votes_against = EXCLUDED.votes_against,
                votes_abstains = EXCLUDED.votes_abstains,
                quorum = EXCLUDED.quorum,
                is_canceled = EXCLUDED.is_canceled,
                is_executed = EXCLUDED.is_executed,
                is_queued = EXCLUDED.is_queued,
                eta_seconds = EXCLUDED.eta_seconds
            "#,
        )
        .bind(&p.id)
        .bind(p.proposal_id.to_string())
        .bind(p.proposer.to_string())
        .bind(&p.description)
        .bind(serde_json::to_value(&p.targets)?)
        .bind(serde_json::to_value(&p.calldatas)?)
        .bind(serde_json::to_value(&p.signatures)?)
        .bind(serde_json::to_value(&p.values)?)
        .bind(p.vote_start.to_string())
        .bind(p.vote_end.to_string())
        .bind(to_i64(p.created_at_block)?)
        .bind(to_i64(p.created_at)?)
        .bind(p.votes_for.to_string())
        .bind(p.votes_against.to_string())
        .bind(p.votes_abstains.to_string())
        .bind(p.quorum.to_string())
        .bind(p.is_canceled)
        .bind(p.is_executed)
        .bind(p.is_queued)
        .bind(p.eta_seconds.map(|eta| eta.to_string()))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_vote(&self, id: &str) -> Result<Option<Vote>> {
        let sql = format!("SELECT {VOTE_COLUMNS} FROM votes WHERE id = $1");
        let row = sqlx::query_as::<_, VoteRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Vote::try_from).transpose()
    }

    async fn set_vote(&self, v: Vote) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO votes (id, proposal_id, voter, support, weight, reason, block_number, "timestamp")
            VALUES ($1, $2::numeric, $3, $4, $5::numeric, $6, $7, $8)
            ON CONFLICT (id) DO UPDATE SET
                proposal_id = EXCLUDED.proposal_id,
                voter = EXCLUDED.voter,
                support = EXCLUDED.support,
                weight = EXCLUDED.weight,
                reason = EXCLUDED.reason,
                block_number = EXCLUDED.block_number,
                "timestamp" = EXCLUDED."timestamp"
            "#,
        )
        .bind(&v.id)
        .bind(v.proposal_id.to_string())
        .bind(v.voter.to_string())
        .bind(i16::from(v.support))
        .bind(v.weight.to_string())
        .bind(&v.reason)
        .bind(to_i64(v.block_number)?)
        .bind(to_i64(v.timestamp)?)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn proposals(&self) -> Result<Vec<Proposal>> {
        let sql = format!(
            "SELECT {PROPOSAL_COLUMNS} FROM proposals ORDER BY created_at_block ASC, proposal_id ASC"
        );
        sqlx::query_as::<_, ProposalRow>(&sql)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Proposal::try_from)
            .collect()
    }

    async fn votes(&self) -> Result<Vec<Vote>> {
        let sql = format!("SELECT {VOTE_COLUMNS} FROM votes ORDER BY block_number ASC, id ASC");
        sqlx::query_as::<_, VoteRow>(&sql)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Vote::try_from)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

#[derive(sqlx::FromRow)]
struct ProposalRow {
    id: String,
    proposal_id: String,
    proposer: String,
    description: String,
    targets: serde_json::Value,
    calldatas: serde_json::Value,
    signatures: serde_json::Value,
    values: serde_json::Value,
    vote_start: String,
    vote_end: String,
    created_at_block: i64,
    created_at: i64,
    votes_for: String,
    votes_against: String,
    votes_abstains: String,
    quorum: String,
    is_canceled: bool,
    is_executed: bool,
    is_queued: bool,
    eta_seconds: Option<String>,
}

impl TryFrom<ProposalRow> for Proposal {
    type Error = anyhow::Error;

    fn try_from(row: ProposalRow) -> Result<Self> {
        Ok(Proposal {
            id: row.id,
            proposal_id: parse_u256(&row.proposal_id)?,
            proposer: parse_address(&row.proposer)?,
            description: row.description,
            targets: serde_json::from_value::<Vec<Address>>(row.targets)?,
            calldatas: serde_json::from_value::<Vec<Bytes>>(row.calldatas)?,
            signatures: serde_json::from_value(row.signatures)?,
            values: serde_json::from_value::<Vec<U256>>(row.values)?,
            vote_start: parse_u256(&row.vote_start)?,
            vote_end: parse_u256(&row.vote_end)?,
            created_at_block: to_u64(row.created_at_block)?,
            created_at: to_u64(row.created_at)?,
            votes_for: parse_u256(&row.votes_for)?,
            votes_against: parse_u256(&row.votes_against)?,
            votes_abstains: parse_u256(&row.votes_abstains)?,
            quorum: parse_u256(&row.quorum)?,
            is_canceled: row.is_canceled,
            is_executed: row.is_executed,
            is_queued: row.is_queued,
            eta_seconds: row.eta_seconds.as_deref().map(parse_u256).transpose()?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct VoteRow {
    id: String,
    proposal_id: String,
    voter: String,
    support: i16,
    weight: String,
    reason: String,
    block_number: i64,
    timestamp: i64,
}

impl TryFrom<VoteRow> for Vote {
    type Error = anyhow::Error;

    fn try_from(row: VoteRow) -> Result<Self> {
        Ok(Vote {
            id: row.id,
            proposal_id: parse_u256(&row.proposal_id)?,
            voter: parse_address(&row.voter)?,
            support: u8::try_from(row.support).context("support out of range")?,
            weight: parse_u256(&row.weight)?,
            reason: row.reason,
            block_number: to_u64(row.block_number)?,
            timestamp: to_u64(row.timestamp)?,
        })
    }
}

fn parse_u256(s: &str) -> Result<U256> {
    s.parse::<U256>()
        .with_context(|| format!("invalid uint256 column value {s:?}"))
}

fn parse_address(s: &str) -> Result<Address> {
    s.parse::<Address>()
        .with_context(|| format!("invalid address column value {s:?}"))
}

fn to_i64(v: u64) -> Result<i64> {
    i64::try_from(v).with_context(|| format!("{v} does not fit BIGINT"))
}

fn to_u64(v: i64) -> Result<u64> {
    u64::try_from(v).with_context(|| format!("negative value {v} in unsigned column"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_text_round_trips_full_width() {
        let max = U256::MAX;
        assert_eq!(parse_u256(&max.to_string()).unwrap(), max);
    }

    #[test]
    fn malformed_numeric_is_an_error() {
        assert!(parse_u256("12.5").is_err());
    }

    #[test]
    fn negative_bigint_is_rejected() {
        assert!(to_u64(-1).is_err());
    }
}
