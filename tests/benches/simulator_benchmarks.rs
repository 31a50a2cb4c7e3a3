//! # Tangle-Sim Benchmarks
//!
//! | Area | Operation |
//! |------|-----------|
//! | Codec | decode an Issue frame, encode a snapshot response |
//! | Settlement | issue into a ledger of N transactions, 5 000 faucet payouts |
//! | Ancestry | approval weight of genesis |
//! | Registry | execute through a handle |

use criterion::{
    black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput,
};
use primitive_types::H256;
use rand::Rng;
use std::time::Duration;
use tangle_simulator::algorithms::approval_weight;
use tangle_simulator::{
    codec, FundsRequest, IssueRequest, Operation, Outcome, Session, SimulatorConfig,
    SimulatorRegistry, TangleSimulatorApi, Transfer,
};

fn config() -> SimulatorConfig {
    SimulatorConfig {
        confirmation_threshold: 3,
        max_parents: 4,
        ..SimulatorConfig::default()
    }
}

/// Session with `payouts` faucet payouts, one milestone after each.
fn populated_session(payouts: u64) -> Session {
    let mut session = Session::new(config()).unwrap();
    for i in 0..payouts {
        session
            .apply(Operation::RequestFunds(FundsRequest {
                address: H256::from_low_u64_be(i % 16 + 1),
                amount: 10,
            }))
            .unwrap();
        session.apply(Operation::Advance { milestones: 1 }).unwrap();
    }
    session
}

// ============================================================================
// CODEC
// ============================================================================

fn bench_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec");

    let issue = Operation::Issue(IssueRequest {
        parents: (0..8).map(H256::from_low_u64_be).collect(),
        transfers: vec![
            Transfer::new(H256::from_low_u64_be(1), -50),
            Transfer::new(H256::from_low_u64_be(2), 50),
        ],
        nonce: 7,
    });
    let frame = codec::encode_request(&issue).unwrap();
    group.throughput(Throughput::Bytes(frame.len() as u64));
    group.bench_function("decode_issue", |b| {
        b.iter(|| black_box(codec::decode_request(black_box(&frame)).is_ok()))
    });

    let session = populated_session(200);
    let snapshot = Outcome::Snapshot(session.snapshot());
    group.bench_function("encode_snapshot_400", |b| {
        b.iter(|| black_box(codec::encode_outcome(&snapshot).len()))
    });

    let mut garbage = vec![0u8; 256];
    rand::thread_rng().fill(&mut garbage[..]);
    group.bench_function("reject_garbage", |b| {
        b.iter(|| black_box(codec::decode_request(&garbage).is_err()))
    });

    group.finish();
}

// ============================================================================
// SETTLEMENT
// ============================================================================

fn bench_settlement(c: &mut Criterion) {
    let mut group = c.benchmark_group("settlement");
    group.measurement_time(Duration::from_secs(10));

    for payouts in [10u64, 100, 500] {
        group.bench_with_input(
            BenchmarkId::new("issue_and_settle", payouts * 2),
            &payouts,
            |b, &payouts| {
                b.iter_batched(
                    || populated_session(payouts),
                    |mut session| {
                        black_box(session.apply(Operation::RequestFunds(FundsRequest {
                            address: H256::from_low_u64_be(99),
                            amount: 1,
                        })))
                    },
                    BatchSize::LargeInput,
                )
            },
        );
    }

    group.sample_size(10);
    group.bench_function("faucet_payouts_5000", |b| {
        b.iter(|| {
            let mut session = Session::new(SimulatorConfig::default()).unwrap();
            for i in 0..5_000u64 {
                session
                    .apply(Operation::RequestFunds(FundsRequest {
                        address: H256::from_low_u64_be(i % 16 + 1),
                        amount: 1,
                    }))
                    .unwrap();
            }
            black_box(session.ledger().len())
        })
    });

    group.finish();
}

// ============================================================================
// ANCESTRY
// ============================================================================

fn bench_ancestry(c: &mut Criterion) {
    let mut group = c.benchmark_group("ancestry");

    for payouts in [10u64, 100, 500] {
        let session = populated_session(payouts);
        let genesis = session.ledger().genesis_id();
        group.throughput(Throughput::Elements(session.ledger().len() as u64));
        group.bench_with_input(
            BenchmarkId::new("genesis_weight", session.ledger().len()),
            &session,
            |b, session| {
                b.iter(|| black_box(approval_weight(session.ledger(), &genesis, session.config())))
            },
        );
    }

    group.finish();
}

// ============================================================================
// REGISTRY
// ============================================================================

fn bench_registry(c: &mut Criterion) {
    let mut group = c.benchmark_group("registry");

    let registry = SimulatorRegistry::default();
    let handle = registry.create().unwrap();
    let request = codec::encode_request(&Operation::Snapshot).unwrap();

    group.bench_function("execute_snapshot", |b| {
        b.iter(|| {
            let response = registry.execute(handle, &request);
            let len = response.len();
            registry.release_response_buffer(response).unwrap();
            black_box(len)
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_codec,
    bench_settlement,
    bench_ancestry,
    bench_registry,
);

criterion_main!(benches);
