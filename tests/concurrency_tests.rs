use rand::Rng;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use wallet_ledger::application::payment::PaymentService;
use wallet_ledger::application::wallets::WalletService;
use wallet_ledger::config::ProcessingConfig;
use wallet_ledger::domain::ledger::OperationKind;
use wallet_ledger::domain::ports::{LedgerStore, SharedLedgerStore, SharedWalletStore};
use wallet_ledger::domain::wallet::{Amount, Balance};
use wallet_ledger::error::WalletError;
use wallet_ledger::infrastructure::in_memory::InMemoryStore;

mod common;
use common::LockstepStore;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_two_racing_deposits_both_land() {
    let store = InMemoryStore::new();
    let id = common::funded_wallet(&store, dec!(100.00)).await;
    let lockstep = Arc::new(LockstepStore::new(store.clone(), 2));
    let service = Arc::new(PaymentService::new(
        lockstep.clone(),
        ProcessingConfig { max_retries: 1 },
    ));

    let amount = Amount::new(dec!(50.00)).unwrap();
    let handles: Vec<_> = (0..2)
        .map(|_| {
            let service = service.clone();
            tokio::spawn(async move {
                service
                    .process(id, OperationKind::Deposit, amount, 1)
                    .await
                    .unwrap()
            })
        })
        .collect();

    let mut attempts = Vec::new();
    for handle in handles {
        attempts.push(handle.await.unwrap().attempts);
    }
    attempts.sort();

    assert_eq!(attempts, vec![1, 2]);
    assert_eq!(lockstep.conflicts.load(Ordering::SeqCst), 1);

    let balance = WalletService::new(Arc::new(store.clone()))
        .get_balance(id)
        .await
        .unwrap()
        .balance;
    assert_eq!(balance, Balance::new(dec!(200.00)).unwrap());
    // funding entry plus the two deposits
    assert_eq!(common::ledger_len(&store, id).await, 3);
}

/// Fires random deposits and withdrawals at one wallet and checks that the
/// final balance and the ledger account for every committed operation.
async fn assert_random_interleavings_lose_no_updates(
    wallets: SharedWalletStore,
    ledger: SharedLedgerStore,
) {
    const TASKS: usize = 64;

    let ops: Vec<(OperationKind, Decimal)> = {
        let mut rng = rand::thread_rng();
        (0..TASKS)
            .map(|_| {
                let kind = if rng.gen_bool(0.5) {
                    OperationKind::Deposit
                } else {
                    OperationKind::Withdraw
                };
                (kind, Decimal::new(rng.gen_range(1..=5000), 2))
            })
            .collect()
    };

    let initial = dec!(100.00);
    let id = common::funded_wallet(wallets.as_ref(), initial).await;
    // Each conflict means some other task committed, so TASKS retries always suffice.
    let service = Arc::new(PaymentService::new(
        wallets.clone(),
        ProcessingConfig {
            max_retries: TASKS as u32,
        },
    ));

    let handles: Vec<_> = ops
        .iter()
        .map(|&(kind, value)| {
            let service = service.clone();
            tokio::spawn(async move {
                let result = service
                    .process(id, kind, Amount::new(value).unwrap(), TASKS as u32)
                    .await;
                (kind, value, result)
            })
        })
        .collect();

    let mut expected = initial;
    let mut committed = 0;
    for handle in handles {
        let (kind, value, result) = handle.await.unwrap();
        match result {
            Ok(_) => {
                committed += 1;
                match kind {
                    OperationKind::Deposit => expected += value,
                    OperationKind::Withdraw => expected -= value,
                }
            }
            Err(WalletError::InsufficientFunds { .. }) => {
                assert_eq!(kind, OperationKind::Withdraw);
            }
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    let balance = WalletService::new(wallets)
        .get_balance(id)
        .await
        .unwrap()
        .balance;
    assert_eq!(balance.value(), expected);

    // Replaying the ledger in append order never dips below zero.
    let entries = ledger.entries(id).await.unwrap();
    assert_eq!(entries.len(), committed + 1);
    let mut running = Decimal::ZERO;
    for entry in &entries {
        match entry.kind() {
            OperationKind::Deposit => running += entry.amount().value(),
            OperationKind::Withdraw => running -= entry.amount().value(),
        }
        assert!(running >= Decimal::ZERO);
    }
    assert_eq!(running, expected);
    assert!(entries.windows(2).all(|w| w[0].created_at() <= w[1].created_at()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_random_interleavings_lose_no_updates() {
    let store = InMemoryStore::new();
    assert_random_interleavings_lose_no_updates(Arc::new(store.clone()), Arc::new(store)).await;
}

#[cfg(feature = "storage-rocksdb")]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_random_interleavings_lose_no_updates_rocksdb() {
    use wallet_ledger::infrastructure::rocksdb::RocksDBStore;

    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(RocksDBStore::open(dir.path()).unwrap());
    assert_random_interleavings_lose_no_updates(store.clone(), store).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_withdrawals_never_overdraw() {
    let store = InMemoryStore::new();
    let id = common::funded_wallet(&store, dec!(100.00)).await;
    let service = Arc::new(PaymentService::new(
        Arc::new(store.clone()),
        ProcessingConfig { max_retries: 32 },
    ));

    let amount = Amount::new(dec!(30.00)).unwrap();
    let handles: Vec<_> = (0..10)
        .map(|_| {
            let service = service.clone();
            tokio::spawn(async move {
                service
                    .process(id, OperationKind::Withdraw, amount, 32)
                    .await
            })
        })
        .collect();

    let mut succeeded = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => succeeded += 1,
            Err(WalletError::InsufficientFunds { .. }) => {}
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    assert_eq!(succeeded, 3);
    let balance = WalletService::new(Arc::new(store.clone()))
        .get_balance(id)
        .await
        .unwrap()
        .balance;
    assert_eq!(balance, Balance::new(dec!(10.00)).unwrap());
    assert_eq!(common::ledger_len(&store, id).await, 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_different_wallets_do_not_conflict() {
    let store = InMemoryStore::new();
    let ids = [
        common::funded_wallet(&store, Decimal::ZERO).await,
        common::funded_wallet(&store, Decimal::ZERO).await,
    ];
    let lockstep = Arc::new(LockstepStore::new(store.clone(), 2));
    let service = Arc::new(PaymentService::new(
        lockstep.clone(),
        ProcessingConfig { max_retries: 0 },
    ));

    let handles: Vec<_> = ids
        .into_iter()
        .map(|id| {
            let service = service.clone();
            tokio::spawn(async move {
                service
                    .process(id, OperationKind::Deposit, Amount::new(dec!(1)).unwrap(), 0)
                    .await
                    .unwrap()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap().attempts, 1);
    }
    assert_eq!(lockstep.conflicts.load(Ordering::SeqCst), 0);
}
