use criterion::{black_box, criterion_group, criterion_main, Criterion};
use knotcheck_core::model::{History, RegisterMop, Txn, TxnId, TxnStatus};
use knotcheck_core::{analyze_register, AnalysisOptions, ConsistencyModel};

/// Builds a register-workload history with `n_txns` transactions across
/// `n_keys` keys, each transaction reading then writing one key, which
/// produces a long `wr`/`ww` chain per key and therefore one large SCC.
fn build_history(n_txns: u64, n_keys: u64) -> History<RegisterMop<String, u64>> {
    let mut txns = Vec::with_capacity(n_txns as usize);
    for i in 0..n_txns {
        let key = format!("k{}", i % n_keys);
        let prev_value = i / n_keys;
        let mops = vec![
            RegisterMop::Read { key: key.clone(), value: if i < n_keys { None } else { Some(prev_value) } },
            RegisterMop::Write { key, value: prev_value + 1 },
        ];
        txns.push(Txn::new(TxnId(i), i, TxnStatus::Ok, mops, i as i64, i as i64 + 1));
    }
    History::new(txns).expect("well-formed synthetic history")
}

fn bench_anomaly_search(c: &mut Criterion) {
    let small = build_history(30, 5);
    let medium = build_history(120, 8);
    let large = build_history(400, 12);

    let mut group = c.benchmark_group("anomaly_search");

    for (name, history) in [("small", &small), ("medium", &medium), ("large", &large)] {
        group.bench_function(format!("strict_serializable_{name}"), |b| {
            let options = AnalysisOptions::new().with_models([ConsistencyModel::StrictSerializable]);
            b.iter(|| analyze_register(black_box(history), black_box(&options)));
        });

        group.bench_function(format!("snapshot_isolation_{name}"), |b| {
            let options = AnalysisOptions::new().with_models([ConsistencyModel::SnapshotIsolation]);
            b.iter(|| analyze_register(black_box(history), black_box(&options)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_anomaly_search);
criterion_main!(benches);
