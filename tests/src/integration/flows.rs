//! # Registry Flows
//!
//! End-to-end flows through the handle registry and the wire codec:
//!
//! 1. Handles are isolated from each other
//! 2. Identical request streams produce identical ledgers
//! 3. Distinct handles run in parallel from separate threads
//! 4. Double-spends settle to exactly one survivor
//! 5. Lifecycle misuse is reported, never fatal

#[cfg(test)]
mod tests {
    use crate::fixtures::{address, test_config, Harness};
    use parking_lot::Mutex;
    use primitive_types::H256;
    use std::sync::{Arc, Barrier};
    use std::thread;
    use tangle_simulator::codec::payloads::{
        ErrorCategory, ErrorCode, RejectionPayload, SnapshotPayload,
    };
    use tangle_simulator::{RegistryConfig, SimulatorConfig, SimulatorRegistry, TransactionStatus};

    // =========================================================================
    // FIXTURES
    // =========================================================================

    fn shared_registry() -> Arc<SimulatorRegistry> {
        Arc::new(SimulatorRegistry::new(RegistryConfig {
            simulator: test_config(),
            ..RegistryConfig::default()
        }))
    }

    /// Payout, a spend chain and a double-spend, then settle.
    fn run_script(harness: &Harness) -> SnapshotPayload {
        let alice = address(1);
        let bob = address(2);
        let carol = address(3);

        let payout = harness.funded(alice, 500);
        let to_bob = harness.spend(&[payout], alice, bob, 200, 0).unwrap();
        let to_bob = H256(to_bob.transaction_id);
        harness.spend(&[to_bob], bob, carol, 150, 0).unwrap();
        harness.spend(&[to_bob], bob, carol, 150, 1).unwrap();
        harness.advance(4).unwrap();
        harness.snapshot()
    }

    fn status_of(snapshot: &SnapshotPayload, id: H256) -> TransactionStatus {
        snapshot
            .transactions
            .iter()
            .find(|tx| tx.id == id.0)
            .map(|tx| tx.status)
            .expect("transaction in snapshot")
    }

    // =========================================================================
    // ISOLATION & DETERMINISM
    // =========================================================================

    #[test]
    fn test_handles_do_not_share_state() {
        let registry = shared_registry();
        let first = Harness::attach(registry.clone(), 3);
        let second = Harness::attach(registry.clone(), 3);

        let payout = first.request_funds(address(1), 10).unwrap();
        let payout = H256(payout.transaction_id);

        assert!(first.transaction(payout).is_some());
        assert!(second.transaction(payout).is_none());
        assert_eq!(second.snapshot().transactions.len(), 1);
        assert_eq!(second.balance(address(1)).pending_delta, 0);
    }

    #[test]
    fn test_same_requests_same_ledger() {
        let registry = shared_registry();
        let first = Harness::attach(registry.clone(), 3);
        let second = Harness::attach(registry.clone(), 3);

        assert_eq!(first.genesis, second.genesis);
        assert_eq!(run_script(&first), run_script(&second));
    }

    #[test]
    fn test_separate_registries_agree() {
        let first = Harness::new();
        let second = Harness::new();
        assert_eq!(run_script(&first), run_script(&second));
    }

    // =========================================================================
    // CONCURRENCY
    // =========================================================================

    #[test]
    fn test_parallel_handles() {
        const THREADS: usize = 8;
        let registry = shared_registry();
        let barrier = Arc::new(Barrier::new(THREADS));
        let snapshots = Arc::new(Mutex::new(Vec::new()));

        let workers: Vec<_> = (0..THREADS)
            .map(|_| {
                let registry = registry.clone();
                let barrier = barrier.clone();
                let snapshots = snapshots.clone();
                thread::spawn(move || {
                    let harness = Harness::attach(registry, 3);
                    barrier.wait();
                    let snapshot = run_script(&harness);
                    snapshots.lock().push(snapshot);
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        let snapshots = snapshots.lock();
        assert_eq!(snapshots.len(), THREADS);
        assert!(snapshots.windows(2).all(|pair| pair[0] == pair[1]));
        // Every harness destroyed its handle on drop
        assert!(registry.is_empty());
        assert_eq!(registry.outstanding_buffers(), 0);
    }

    #[test]
    fn test_destroy_while_others_run() {
        let registry = shared_registry();
        let survivor = Harness::attach(registry.clone(), 3);
        let doomed = Harness::attach(registry.clone(), 3);
        let doomed_handle = doomed.handle;

        let worker = thread::spawn(move || {
            for nonce in 0..20 {
                survivor
                    .spend(&[survivor.genesis], survivor.faucet, address(9), 1, nonce)
                    .unwrap();
            }
            survivor.snapshot()
        });
        registry.destroy(doomed_handle).unwrap();
        drop(doomed);

        let snapshot = worker.join().unwrap();
        assert_eq!(snapshot.transactions.len(), 21);
        assert!(!registry.contains(doomed_handle));
    }

    // =========================================================================
    // SETTLEMENT
    // =========================================================================

    #[test]
    fn test_double_spend_single_survivor() {
        let harness = Harness::new();
        let alice = address(1);
        let payout = harness.funded(alice, 100);

        let a = harness.spend(&[payout], alice, address(2), 80, 0).unwrap();
        let b = harness.spend(&[payout], alice, address(3), 80, 0).unwrap();
        let (a, b) = (H256(a.transaction_id), H256(b.transaction_id));
        harness.advance(3).unwrap();

        let snapshot = harness.snapshot();
        let statuses = [status_of(&snapshot, a), status_of(&snapshot, b)];
        assert!(statuses.contains(&TransactionStatus::Confirmed));
        assert!(statuses.contains(&TransactionStatus::Rejected));

        let (winner, loser) = if statuses[0] == TransactionStatus::Confirmed {
            (a, b)
        } else {
            (b, a)
        };
        assert_eq!(
            harness.transaction(loser).unwrap().rejection,
            Some(RejectionPayload::DoubleSpend { winner: winner.0 })
        );
        assert_eq!(harness.balance(alice).confirmed, 20);
    }

    #[test]
    fn test_heavier_branch_wins() {
        let harness = Harness::new();
        let alice = address(1);
        let payout = harness.funded(alice, 100);

        let a = harness.spend(&[payout], alice, address(2), 60, 0).unwrap();
        let a = H256(a.transaction_id);
        // Two approvers give `a` more weight before the conflicting spend arrives
        harness.spend(&[a], address(2), address(4), 10, 0).unwrap();
        harness.spend(&[a], address(2), address(5), 10, 0).unwrap();

        let b = harness.spend(&[payout], alice, address(3), 60, 0).unwrap();
        assert_eq!(b.status, TransactionStatus::Rejected);
        assert_eq!(
            harness.transaction(H256(b.transaction_id)).unwrap().rejection,
            Some(RejectionPayload::DoubleSpend { winner: a.0 })
        );
        assert_eq!(harness.balance(address(3)).pending_delta, 0);
    }

    #[test]
    fn test_spend_on_rejected_branch_refused() {
        let harness = Harness::new();
        let alice = address(1);
        let payout = harness.funded(alice, 100);

        let a = harness.spend(&[payout], alice, address(2), 80, 0).unwrap();
        let a = H256(a.transaction_id);
        harness.spend(&[a], address(2), address(4), 1, 0).unwrap();
        let b = harness.spend(&[payout], alice, address(3), 80, 0).unwrap();
        assert_eq!(b.status, TransactionStatus::Rejected);

        let refused = harness.spend(&[H256(b.transaction_id)], address(3), address(5), 10, 0);
        assert_eq!(refused.unwrap_err(), ErrorCode::ParentRejected);
    }

    #[test]
    fn test_pending_balance_visible_before_confirmation() {
        let harness = Harness::new();
        harness.request_funds(address(7), 42).unwrap();

        let balance = harness.balance(address(7));
        assert_eq!(balance.confirmed, 0);
        assert_eq!(balance.pending_delta, 42);

        harness.advance(3).unwrap();
        let balance = harness.balance(address(7));
        assert_eq!(balance.confirmed, 42);
        assert_eq!(balance.pending_delta, 0);
    }

    // =========================================================================
    // LIFECYCLE & LIMITS
    // =========================================================================

    #[test]
    fn test_advance_is_all_or_nothing() {
        let harness = Harness::with_config(SimulatorConfig {
            max_transactions: 4,
            ..test_config()
        });
        harness.request_funds(address(1), 5).unwrap();
        let before = harness.snapshot();

        let envelope = harness.call(&tangle_simulator::Operation::Advance { milestones: 3 });
        let error = envelope.error.unwrap();
        assert_eq!(error.category, ErrorCategory::Allocation);
        assert_eq!(error.code, ErrorCode::AllocationFailed);
        assert_eq!(harness.snapshot(), before);

        harness.advance(2).unwrap();
        assert_eq!(harness.snapshot().transactions.len(), 4);
    }

    #[test]
    fn test_session_limit_and_reuse() {
        let registry = Arc::new(SimulatorRegistry::new(RegistryConfig {
            max_sessions: 2,
            simulator: test_config(),
        }));
        let first = Harness::attach(registry.clone(), 3);
        let _second = Harness::attach(registry.clone(), 3);
        assert!(registry.create().is_err());

        let old_handle = first.handle;
        drop(first);
        let third = Harness::attach(registry.clone(), 3);
        assert_ne!(third.handle, old_handle);
    }

    #[test]
    fn test_calls_after_destroy_are_errors() {
        let registry = shared_registry();
        let harness = Harness::attach(registry.clone(), 3);
        registry.destroy(harness.handle).unwrap();

        let envelope = harness.call(&tangle_simulator::Operation::Snapshot);
        let error = envelope.error.unwrap();
        assert_eq!(error.category, ErrorCategory::Lifecycle);
        assert_eq!(error.code, ErrorCode::InvalidHandle);
        assert_eq!(registry.outstanding_buffers(), 0);
    }
}
