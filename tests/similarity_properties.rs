use std::sync::Arc;

use approx::assert_relative_eq;
use sparse_cosine::{
    cosine_similarity, BufferPool, CsrMatrix, HostBackend, ParallelBackend, PooledBackend, SimilarityConfig,
    SimilarityEngine, SimilarityError,
};

const EPS: f64 = 1e-9;

/// tiny deterministic PRNG (xorshift32)
struct Rng(u32);
impl Rng {
    fn next_u32(&mut self) -> u32 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.0 = x;
        x
    }
}

/// TF-IDF 風の非負の疎行列 (約 density の割合で非ゼロ)
fn random_matrix(rng: &mut Rng, rows: usize, cols: usize, density: u32) -> CsrMatrix<f64> {
    let mut m = CsrMatrix::new(cols);
    for _ in 0..rows {
        let mut entries = Vec::new();
        for col in 0..cols {
            if rng.next_u32() % 100 < density {
                entries.push((col, (rng.next_u32() % 1000 + 1) as f64 / 100.0));
            }
        }
        m.push_row(entries).unwrap();
    }
    m
}

#[test]
fn self_comparison_has_unit_diagonal() {
    let mut rng = Rng(0x1234_5678);
    let sparse = random_matrix(&mut rng, 40, 200, 10);
    // 対角に1つ足して全ゼロ行を避ける
    let mut x = CsrMatrix::new(sparse.cols());
    for (i, row) in sparse.iter_rows().enumerate() {
        let mut entries: Vec<(usize, f64)> = row.raw_iter().map(|(c, v)| (c, *v)).collect();
        entries.push((i, 1.0));
        x.push_row(entries).unwrap();
    }
    let s = cosine_similarity(&x, &x).unwrap();
    for i in 0..x.rows() {
        assert_relative_eq!(s.get(i, i).unwrap(), 1.0, epsilon = EPS);
    }
}

#[test]
fn non_negative_inputs_stay_in_unit_range() {
    let mut rng = Rng(42);
    let q = random_matrix(&mut rng, 30, 120, 15);
    let t = random_matrix(&mut rng, 50, 120, 15);
    let s = cosine_similarity(&q, &t).unwrap();
    assert!(s.as_slice().iter().all(|v| (0.0..=1.0).contains(v)));
}

#[test]
fn output_shape_is_query_by_target() {
    let mut rng = Rng(7);
    let q = random_matrix(&mut rng, 3, 16, 50);
    let t = random_matrix(&mut rng, 11, 16, 50);
    let s = cosine_similarity(&q, &t).unwrap();
    assert_eq!(s.shape(), (3, 11));
    assert_eq!(s.as_slice().len(), 33);
}

#[test]
fn column_mismatch_is_rejected() {
    let q = CsrMatrix::from_dense(&[[1.0, 0.0, 1.0]]).unwrap();
    let t = CsrMatrix::from_dense(&[[1.0, 0.0, 1.0, 0.0]]).unwrap();
    assert!(matches!(
        cosine_similarity(&q, &t),
        Err(SimilarityError::DimensionMismatch { query_cols: 3, target_cols: 4 })
    ));
}

#[test]
fn zero_query_row_scores_zero_everywhere() {
    let mut rng = Rng(99);
    let mut q = random_matrix(&mut rng, 5, 64, 30);
    q.push_row(Vec::new()).unwrap();
    let t = random_matrix(&mut rng, 9, 64, 30);
    let s = cosine_similarity(&q, &t).unwrap();
    assert!(s.row(5).unwrap().iter().all(|v| *v == 0.0));
    assert!(s.as_slice().iter().all(|v| !v.is_nan()));
}

#[test]
fn address_trigram_scenario() {
    let q = CsrMatrix::from_dense(&[[1.0, 1.0, 0.0]]).unwrap();
    let t = CsrMatrix::from_dense(&[[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0]]).unwrap();
    let s = cosine_similarity(&q, &t).unwrap();
    let row = s.row(0).unwrap();
    assert_relative_eq!(row[0], 0.707, epsilon = 1e-3);
    assert_relative_eq!(row[1], 0.707, epsilon = 1e-3);
    assert_relative_eq!(row[2], 1.0, epsilon = EPS);
}

#[test]
fn row_scaling_does_not_change_scores() {
    let mut rng = Rng(2024);
    let q = random_matrix(&mut rng, 6, 50, 25);
    let t = random_matrix(&mut rng, 8, 50, 25);
    let before = cosine_similarity(&q, &t).unwrap();

    for factors in [[37.5, 0.01], [1e-170, 1e170], [1e-300, 1e300]] {
        let mut scaled = q.clone();
        scaled.scale_row(2, factors[0]).unwrap();
        scaled.scale_row(4, factors[1]).unwrap();
        let after = cosine_similarity(&scaled, &t).unwrap();
        for (a, b) in before.as_slice().iter().zip(after.as_slice()) {
            assert_relative_eq!(*a, *b, epsilon = EPS);
        }

        // ターゲット側を拡大・縮小しても同じ
        let mut scaled = t.clone();
        scaled.scale_row(1, factors[0]).unwrap();
        scaled.scale_row(7, factors[1]).unwrap();
        let after = cosine_similarity(&q, &scaled).unwrap();
        for (a, b) in before.as_slice().iter().zip(after.as_slice()) {
            assert_relative_eq!(*a, *b, epsilon = EPS);
        }
    }
}

#[test]
fn finite_inputs_never_produce_nan() {
    let mut rng = Rng(0x0bad_cafe);
    // random_matrix の値は 0.01..=10 なので f64::MAX / 16 でも有限
    let magnitudes = [1.0, 1e-300, 1e300, f64::MAX / 16.0, f64::MIN_POSITIVE, 5e-324];
    let q = random_matrix(&mut rng, 12, 40, 30);
    let t = random_matrix(&mut rng, 9, 40, 30);
    for &m in &magnitudes {
        let mut q = q.clone();
        let mut t = t.clone();
        for row in (0..q.rows()).step_by(2) {
            q.scale_row(row, m).unwrap();
        }
        for row in (1..t.rows()).step_by(3) {
            t.scale_row(row, -m).unwrap();
        }
        let s = cosine_similarity(&q, &t).unwrap();
        assert!(s.as_slice().iter().all(|v| v.is_finite() && (-1.0..=1.0).contains(v)), "magnitude {m:e}");
    }
}

#[test]
fn backends_agree() {
    let mut rng = Rng(0xdead_beef);
    let q = random_matrix(&mut rng, 64, 300, 5);
    let t = random_matrix(&mut rng, 97, 300, 5);

    let pool = BufferPool::new(16 << 20);
    let host = SimilarityEngine::new(HostBackend).cosine_similarity(&q, &t).unwrap();
    let parallel = SimilarityEngine::new(ParallelBackend::with_threads(3).unwrap())
        .cosine_similarity(&q, &t)
        .unwrap();
    let pooled = SimilarityEngine::new(PooledBackend::new(ParallelBackend::new(), Arc::clone(&pool)))
        .cosine_similarity(&q, &t)
        .unwrap();

    for ((h, p), d) in host.as_slice().iter().zip(parallel.as_slice()).zip(pooled.as_slice()) {
        assert_relative_eq!(*h, *p, epsilon = EPS);
        assert_relative_eq!(*h, *d, epsilon = EPS);
    }
    assert_eq!(pool.in_use(), 0);
}

#[test]
fn repeated_pooled_calls_do_not_leak_budget() {
    let mut rng = Rng(5);
    let q = random_matrix(&mut rng, 10, 40, 20);
    let t = random_matrix(&mut rng, 10, 40, 20);
    let config = SimilarityConfig::from_json_str(r#"{"backend":"pooled","pool_limit_bytes":65536}"#).unwrap();
    let engine = config.build().unwrap();
    for _ in 0..100 {
        engine.cosine_similarity(&q, &t).unwrap();
    }
    let wrong = CsrMatrix::<f64>::new(41);
    for _ in 0..10 {
        assert!(engine.cosine_similarity(&q, &wrong).is_err());
    }
    match engine.backend() {
        sparse_cosine::AnyBackend::PooledHost(b) => assert_eq!(b.pool().in_use(), 0),
        other => panic!("unexpected backend {other:?}"),
    }
}

#[test]
fn f32_weights_match_f64() {
    let q64 = CsrMatrix::from_dense(&[[0.25f64, 0.0, 0.5, 1.0], [0.0, 2.0, 0.0, 0.0]]).unwrap();
    let t64 = CsrMatrix::from_dense(&[[1.0f64, 1.0, 0.0, 0.0], [0.5, 0.0, 0.5, 0.5]]).unwrap();
    let q32 = CsrMatrix::from_dense(&[[0.25f32, 0.0, 0.5, 1.0], [0.0, 2.0, 0.0, 0.0]]).unwrap();
    let t32 = CsrMatrix::from_dense(&[[1.0f32, 1.0, 0.0, 0.0], [0.5, 0.0, 0.5, 0.5]]).unwrap();
    let a = cosine_similarity(&q64, &t64).unwrap();
    let b = cosine_similarity(&q32, &t32).unwrap();
    for (x, y) in a.as_slice().iter().zip(b.as_slice()) {
        assert_relative_eq!(*x, *y, epsilon = 1e-6);
    }
}
