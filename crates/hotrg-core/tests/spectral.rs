use approx::assert_relative_eq;
use hotrg_core::{solve_environment, FaerBackend, Matrix, SpectralError, TruncationParams};
use num_complex::Complex64;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// `X X^H` for a random n×k matrix `X`; positive semidefinite of rank k.
fn random_environment(rng: &mut ChaCha8Rng, n: usize, k: usize) -> Matrix<f64> {
    let x = Matrix::from_fn(n, k, |_, _| rng.gen_range(-1.0..1.0));
    x.matmul(&x.conj_transpose())
}

#[test]
fn test_lossless_truncation_full_rank() {
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let env = random_environment(&mut rng, 6, 6);
    let params = TruncationParams::new().with_max_rank(6);
    let res = solve_environment(&FaerBackend, &env, &params).unwrap();

    assert_eq!(res.error, 0.0);
    assert_eq!(res.projector.shape(), (6, 6));
    assert!(res.projector.has_orthonormal_columns(1e-10));

    // P diag(λ) P^H reproduces the environment
    let diag = Matrix::from_fn(6, 6, |i, j| if i == j { res.eigenvalues[i] } else { 0.0 });
    let rebuilt = res.projector.matmul(&diag).matmul(&res.projector.conj_transpose());
    assert!(rebuilt.max_abs_diff(&env) < 1e-10);
}

#[test]
fn test_projector_width_is_min_of_chi_and_kept() {
    let mut rng = ChaCha8Rng::seed_from_u64(2);
    let env = random_environment(&mut rng, 6, 3);

    let res = solve_environment(&FaerBackend, &env, &TruncationParams::new().with_max_rank(2)).unwrap();
    assert_eq!(res.kept, 3);
    assert_eq!(res.rank(), 2);
    assert!(res.error > 0.0);
    assert!(res.projector.has_orthonormal_columns(1e-10));

    let res = solve_environment(&FaerBackend, &env, &TruncationParams::new().with_max_rank(5)).unwrap();
    assert_eq!(res.rank(), 3);
    assert_eq!(res.error, 0.0);
}

#[test]
fn test_error_non_increasing_in_chi() {
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let env = random_environment(&mut rng, 8, 8);
    let errors: Vec<f64> = (1..=8)
        .map(|chi| {
            solve_environment(&FaerBackend, &env, &TruncationParams::new().with_max_rank(chi))
                .unwrap()
                .error
        })
        .collect();
    for w in errors.windows(2) {
        assert!(w[1] <= w[0] + 1e-14, "errors {:?} must not increase", errors);
    }
    assert_eq!(errors[7], 0.0);
}

#[test]
fn test_eigenvalues_descending() {
    let mut rng = ChaCha8Rng::seed_from_u64(4);
    let env = random_environment(&mut rng, 5, 5);
    let res = solve_environment(&FaerBackend, &env, &TruncationParams::new()).unwrap();
    for w in res.eigenvalues.windows(2) {
        assert!(w[0] >= w[1]);
    }
}

#[test]
fn test_threshold_controls_kept_count() {
    let env = Matrix::from_vec(2, 2, vec![1.0, 0.0, 0.0, 0.4]);
    let params = TruncationParams::new().with_max_rank(2).with_threshold(0.5);
    let res = solve_environment(&FaerBackend, &env, &params).unwrap();
    assert_eq!(res.kept, 1);
    assert_eq!(res.rank(), 1);
    assert_eq!(res.error, 0.0);

    let bad = TruncationParams::new().with_threshold(f64::NAN);
    assert!(matches!(
        solve_environment(&FaerBackend, &env, &bad),
        Err(SpectralError::InvalidThreshold(_))
    ));
}

#[test]
fn test_tiny_spectrum_gives_empty_projector() {
    let env = Matrix::from_fn(3, 3, |i, j| if i == j { 1e-12 } else { 0.0 });
    let res = solve_environment(&FaerBackend, &env, &TruncationParams::new().with_max_rank(2)).unwrap();
    assert_eq!(res.projector.shape(), (3, 0));
    assert_eq!(res.error, 0.0);
}

#[test]
fn test_complex_hermitian_environment() {
    let mut rng = ChaCha8Rng::seed_from_u64(5);
    let x = Matrix::from_fn(4, 4, |_, _| {
        Complex64::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0))
    });
    let env = x.matmul(&x.conj_transpose());
    let res = solve_environment(&FaerBackend, &env, &TruncationParams::new().with_max_rank(3)).unwrap();
    assert_eq!(res.projector.shape(), (4, 3));
    assert!(res.projector.has_orthonormal_columns(1e-10));

    let total: f64 = res.eigenvalues.iter().sum();
    let top: f64 = res.eigenvalues[..3].iter().sum();
    assert_relative_eq!(res.error, 1.0 - top / total, epsilon = 1e-12);
}
