//! Projection tests: handlers against an in-memory store and scripted quorum
//! sources. No network, no database.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use governor_client::RpcError;
use govindex_core::{MemoryMemoStore, QuorumEffect, QuorumKey, QuorumReader, QuorumSource, RateLimiter};
use govindex_engine::Outcome;
use govindex_indexer::{engine, IndexStats, IndexerDeps};
use govindex_store::{EntityStore, MemoryStore};
use govindex_world::{
    Address, Bytes, GovernorEvent, GovernorLog, ProposalCanceled, ProposalCreated,
    ProposalExecuted, ProposalQueued, VoteCast, VoteCastWithParams, U256,
};
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

/// Fixed quorum for every key; records the keys it was asked for.
struct FixedQuorum {
    value: U256,
    calls: AtomicU32,
    keys: Mutex<Vec<QuorumKey>>,
}

impl FixedQuorum {
    fn new(value: u64) -> Arc<Self> {
        Arc::new(Self {
            value: U256::from(value),
            calls: AtomicU32::new(0),
            keys: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl QuorumSource for FixedQuorum {
    async fn quorum(&self, key: &QuorumKey) -> U256 {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.keys.lock().unwrap().push(key.clone());
        self.value
    }
}

/// A node that is always down.
struct DownReader;

#[async_trait]
impl QuorumReader for DownReader {
    async fn read_quorum(&self, _: Address, _: U256) -> governor_client::Result<U256> {
        Err(RpcError::Network("connection refused".into()))
    }
}

// ---------------------------------------------------------------------------
// Warning capture
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Fields(BTreeMap<String, String>);

impl Visit for Fields {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.insert(field.name().to_string(), value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.0.insert(field.name().to_string(), format!("{value:?}"));
    }
}

/// Records every WARN event with its own fields merged over its spans' fields.
#[derive(Clone, Default)]
struct WarnCapture(Arc<Mutex<Vec<BTreeMap<String, String>>>>);

impl WarnCapture {
    fn install() -> (Self, tracing::subscriber::DefaultGuard) {
        let capture = Self::default();
        let subscriber = tracing_subscriber::registry().with(capture.clone());
        (capture, tracing::subscriber::set_default(subscriber))
    }

    fn warnings(&self) -> Vec<BTreeMap<String, String>> {
        self.0.lock().unwrap().clone()
    }
}

impl<S> Layer<S> for WarnCapture
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let mut fields = Fields::default();
        attrs.record(&mut fields);
        if let Some(span) = ctx.span(id) {
            span.extensions_mut().insert(fields);
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        if *event.metadata().level() != Level::WARN {
            return;
        }
        let mut fields = Fields::default();
        if let Some(scope) = ctx.event_scope(event) {
            for span in scope.from_root() {
                if let Some(span_fields) = span.extensions().get::<Fields>() {
                    fields.0.extend(span_fields.0.clone());
                }
            }
        }
        event.record(&mut fields);
        self.0.lock().unwrap().push(fields.0);
    }
}

// ---------------------------------------------------------------------------
// Event builders
// ---------------------------------------------------------------------------

const GOVERNOR: u8 = 0x11;

fn voter(n: u8) -> Address {
    Address::repeat_byte(n)
}

fn log(block: u64, log_index: u64, event: GovernorEvent) -> GovernorLog {
    GovernorLog {
        src_address: Address::repeat_byte(GOVERNOR),
        block_number: block,
        block_timestamp: 1_690_000_000 + block * 12,
        log_index,
        transaction_hash: None,
        event,
    }
}

fn created(id: u64, vote_start: u64) -> GovernorLog {
    log(
        90,
        0,
        GovernorEvent::ProposalCreated(ProposalCreated {
            proposal_id: U256::from(id),
            proposer: Address::repeat_byte(0xaa),
            targets: vec![Address::repeat_byte(0x01)],
            values: vec![U256::ZERO],
            signatures: vec![String::new()],
            calldatas: vec![Bytes::from(vec![0xa9, 0x05, 0x9c, 0xbb])],
            vote_start: U256::from(vote_start),
            vote_end: U256::from(vote_start + 100),
            description: "Fund the grants program".into(),
        }),
    )
}

fn vote(id: u64, who: u8, support: u8, weight: u64, log_index: u64) -> GovernorLog {
    log(
        110,
        log_index,
        GovernorEvent::VoteCast(VoteCast {
            voter: voter(who),
            proposal_id: U256::from(id),
            support,
            weight: U256::from(weight),
            reason: String::new(),
        }),
    )
}

fn vote_with_params(id: u64, who: u8, support: u8, weight: u64, log_index: u64) -> GovernorLog {
    log(
        111,
        log_index,
        GovernorEvent::VoteCastWithParams(VoteCastWithParams {
            voter: voter(who),
            proposal_id: U256::from(id),
            support,
            weight: U256::from(weight),
            reason: "see forum thread".into(),
            params: Bytes::from(vec![0x01]),
        }),
    )
}

fn queued(id: u64, eta: u64) -> GovernorLog {
    log(
        300,
        0,
        GovernorEvent::ProposalQueued(ProposalQueued {
            proposal_id: U256::from(id),
            eta_seconds: U256::from(eta),
        }),
    )
}

fn canceled(id: u64) -> GovernorLog {
    log(
        301,
        0,
        GovernorEvent::ProposalCanceled(ProposalCanceled {
            proposal_id: U256::from(id),
        }),
    )
}

fn executed(id: u64) -> GovernorLog {
    log(
        302,
        0,
        GovernorEvent::ProposalExecuted(ProposalExecuted {
            proposal_id: U256::from(id),
        }),
    )
}

fn deps_with(quorum: Arc<dyn QuorumSource>) -> (IndexerDeps, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    (IndexerDeps::new(store.clone(), quorum), store)
}

async fn run_all(deps: &IndexerDeps, logs: Vec<GovernorLog>) -> Vec<Outcome> {
    let engine = engine();
    let mut stats = IndexStats::default();
    let mut outcomes = Vec::new();
    for l in logs {
        outcomes.push(engine.dispatch(l, &mut stats, deps).await.unwrap());
    }
    outcomes
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn creation_zeroes_tallies_and_stores_quorum() {
    let quorum = FixedQuorum::new(5000);
    let (deps, store) = deps_with(quorum.clone());

    run_all(&deps, vec![created(42, 100)]).await;

    let p = store.get_proposal("42").await.unwrap().unwrap();
    assert_eq!(p.quorum, U256::from(5000u64));
    assert_eq!(p.votes_for, U256::ZERO);
    assert_eq!(p.votes_against, U256::ZERO);
    assert_eq!(p.votes_abstains, U256::ZERO);
    assert!(!p.is_canceled && !p.is_executed && !p.is_queued);
    assert_eq!(p.eta_seconds, None);
    assert_eq!(p.created_at_block, 90);

    let keys = quorum.keys.lock().unwrap();
    assert_eq!(
        *keys,
        vec![QuorumKey {
            vote_start: U256::from(100u64),
            governor_address: Address::repeat_byte(GOVERNOR),
        }]
    );
}

#[tokio::test]
async fn end_to_end_scenario() {
    let (deps, store) = deps_with(FixedQuorum::new(5000));
    let (capture, _guard) = WarnCapture::install();

    let outcomes = run_all(
        &deps,
        vec![
            created(42, 100),
            vote(42, 0x21, 1, 300, 4),
            vote(42, 0x22, 0, 120, 5),
            queued(42, 1_700_000_000),
        ],
    )
    .await;
    assert!(outcomes.iter().all(|o| *o == Outcome::Applied));
    assert!(capture.warnings().is_empty());

    let p = store.get_proposal("42").await.unwrap().unwrap();
    assert_eq!(p.votes_for, U256::from(300u64));
    assert_eq!(p.votes_against, U256::from(120u64));
    assert_eq!(p.votes_abstains, U256::ZERO);
    assert_eq!(p.quorum, U256::from(5000u64));
    assert!(p.is_queued);
    assert_eq!(p.eta_seconds, Some(U256::from(1_700_000_000u64)));
    assert!(!p.is_canceled);
    assert!(!p.is_executed);

    assert_eq!(store.vote_count().await, 2);
    let first = store
        .get_vote(&format!("42-{}-4", voter(0x21)))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first.support, 1);
    assert_eq!(first.weight, U256::from(300u64));
    assert_eq!(first.block_number, 110);
    assert!(store
        .get_vote(&format!("42-{}-5", voter(0x22)))
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn each_support_value_hits_only_its_tally() {
    let (deps, store) = deps_with(FixedQuorum::new(0));

    run_all(
        &deps,
        vec![
            created(1, 10),
            vote(1, 0x21, 2, 7, 0),
            vote_with_params(1, 0x22, 2, 3, 1),
            vote(1, 0x23, 0, 11, 2),
        ],
    )
    .await;

    let p = store.get_proposal("1").await.unwrap().unwrap();
    assert_eq!(p.votes_abstains, U256::from(10u64));
    assert_eq!(p.votes_against, U256::from(11u64));
    assert_eq!(p.votes_for, U256::ZERO);
}

#[tokio::test]
async fn vote_with_params_records_reason() {
    let (deps, store) = deps_with(FixedQuorum::new(0));

    run_all(&deps, vec![created(1, 10), vote_with_params(1, 0x21, 1, 50, 9)]).await;

    let v = store
        .get_vote(&format!("1-{}-9", voter(0x21)))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(v.reason, "see forum thread");
    assert_eq!(v.weight, U256::from(50u64));
}

#[tokio::test]
async fn redelivered_vote_counts_twice() {
    let (deps, store) = deps_with(FixedQuorum::new(0));

    run_all(
        &deps,
        vec![created(1, 10), vote(1, 0x21, 1, 100, 3), vote(1, 0x21, 1, 100, 3)],
    )
    .await;

    let p = store.get_proposal("1").await.unwrap().unwrap();
    assert_eq!(p.votes_for, U256::from(200u64));
    // Same key: the vote record is overwritten, not duplicated.
    assert_eq!(store.vote_count().await, 1);
}

#[tokio::test]
async fn same_voter_twice_in_one_transaction_keeps_both_votes() {
    let (deps, store) = deps_with(FixedQuorum::new(0));

    run_all(
        &deps,
        vec![created(1, 10), vote(1, 0x21, 1, 5, 3), vote(1, 0x21, 1, 5, 4)],
    )
    .await;

    assert_eq!(store.vote_count().await, 2);
}

#[tokio::test]
async fn events_for_unknown_proposal_leave_store_unchanged() {
    let (deps, store) = deps_with(FixedQuorum::new(0));
    let (capture, _guard) = WarnCapture::install();

    let outcomes = run_all(
        &deps,
        vec![
            vote(7, 0x21, 1, 100, 0),
            vote_with_params(7, 0x22, 0, 1, 1),
            canceled(7),
            executed(7),
            queued(7, 1),
        ],
    )
    .await;

    assert!(outcomes.iter().all(|o| *o == Outcome::Skipped));
    assert_eq!(store.proposal_count().await, 0);
    assert_eq!(store.vote_count().await, 0);

    // One warning per dropped event, naming the proposal and the handler.
    let warnings = capture.warnings();
    assert_eq!(warnings.len(), 5);
    assert!(warnings
        .iter()
        .all(|w| w.get("proposal_id").map(String::as_str) == Some("7")));
    let handlers: Vec<&str> = warnings
        .iter()
        .filter_map(|w| w.get("handler").map(String::as_str))
        .collect();
    assert_eq!(
        handlers,
        vec![
            "VoteCast",
            "VoteCastWithParams",
            "ProposalCanceled",
            "ProposalExecuted",
            "ProposalQueued"
        ]
    );
}

#[tokio::test]
async fn unknown_support_records_vote_without_tallying() {
    let (deps, store) = deps_with(FixedQuorum::new(0));
    let (capture, _guard) = WarnCapture::install();

    let outcomes = run_all(&deps, vec![created(1, 10), vote(1, 0x21, 3, 100, 0)]).await;
    assert_eq!(outcomes[1], Outcome::Applied);

    let warnings = capture.warnings();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].get("support").map(String::as_str), Some("3"));
    assert_eq!(warnings[0].get("proposal_id").map(String::as_str), Some("1"));

    let p = store.get_proposal("1").await.unwrap().unwrap();
    assert_eq!(p.total_votes(), U256::ZERO);
    let v = store
        .get_vote(&format!("1-{}-0", voter(0x21)))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(v.support, 3);
}

#[tokio::test]
async fn lifecycle_flags_are_independent_and_sticky() {
    let (deps, store) = deps_with(FixedQuorum::new(0));

    run_all(
        &deps,
        vec![
            created(1, 10),
            canceled(1),
            queued(1, 1_700_000_000),
            canceled(1),
            queued(1, 1_700_000_500),
        ],
    )
    .await;

    let p = store.get_proposal("1").await.unwrap().unwrap();
    assert!(p.is_canceled);
    assert!(p.is_queued);
    assert!(!p.is_executed);
    assert_eq!(p.eta_seconds, Some(U256::from(1_700_000_500u64)));

    run_all(&deps, vec![executed(1)]).await;
    let p = store.get_proposal("1").await.unwrap().unwrap();
    assert!(p.is_canceled && p.is_queued && p.is_executed);
}

#[tokio::test]
async fn duplicate_creation_overwrites() {
    let (deps, store) = deps_with(FixedQuorum::new(9));

    run_all(&deps, vec![created(1, 10), vote(1, 0x21, 1, 100, 0), created(1, 10)]).await;

    let p = store.get_proposal("1").await.unwrap().unwrap();
    assert_eq!(p.votes_for, U256::ZERO);
    assert_eq!(p.quorum, U256::from(9u64));
}

#[tokio::test]
async fn remote_failure_still_persists_proposal_with_zero_quorum() {
    let quorum = Arc::new(QuorumEffect::compose(
        DownReader,
        Arc::new(RateLimiter::per_second(10)),
        Arc::new(MemoryMemoStore::new()),
    ));
    let (deps, store) = deps_with(quorum);
    let (capture, _guard) = WarnCapture::install();

    let outcomes = run_all(&deps, vec![created(42, 100)]).await;
    assert_eq!(outcomes, vec![Outcome::Applied]);

    let p = store.get_proposal("42").await.unwrap().unwrap();
    assert_eq!(p.quorum, U256::ZERO);

    let warnings = capture.warnings();
    assert_eq!(warnings.len(), 1);
    let w = &warnings[0];
    assert_eq!(w.get("vote_start").map(String::as_str), Some("100"));
    assert_eq!(
        w.get("governor"),
        Some(&Address::repeat_byte(GOVERNOR).to_string())
    );
    assert_eq!(w.get("proposal_id").map(String::as_str), Some("42"));
    assert_eq!(w.get("handler").map(String::as_str), Some("ProposalCreated"));
}

#[tokio::test]
async fn run_counts_by_type() {
    let (deps, _store) = deps_with(FixedQuorum::new(0));
    let engine = engine();
    let mut stats = IndexStats::default();

    let events = futures::stream::iter(vec![
        created(1, 10),
        vote(1, 0x21, 1, 1, 0),
        vote(2, 0x21, 1, 1, 1),
        executed(1),
    ]);
    let summary = engine.run(events, &mut stats, &deps).await.unwrap();

    assert_eq!(summary.dispatched, 4);
    assert_eq!(summary.applied, 3);
    assert_eq!(summary.skipped, 1);
    assert_eq!(stats.count("VoteCast"), 2);
    assert_eq!(stats.count("ProposalCreated"), 1);
    assert_eq!(stats.count("ProposalQueued"), 0);
    assert_eq!(stats.last_block, Some(302));
}
