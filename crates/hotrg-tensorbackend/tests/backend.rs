use approx::assert_relative_eq;
use hotrg_tensorbackend::{gemm, FaerBackend, NumericBackend};
use num_complex::Complex64;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn random_hermitian(rng: &mut ChaCha8Rng, n: usize) -> Vec<Complex64> {
    let raw: Vec<Complex64> = (0..n * n)
        .map(|_| Complex64::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0)))
        .collect();
    let mut h = vec![Complex64::new(0.0, 0.0); n * n];
    for i in 0..n {
        for j in 0..n {
            h[i * n + j] = raw[i * n + j] + raw[j * n + i].conj();
        }
    }
    h
}

#[test]
fn test_eigh_random_hermitian_reconstruction() {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let n = 6;
    let h = random_hermitian(&mut rng, n);
    let res = FaerBackend.eigh(&h, n).unwrap();

    for w in res.eigenvalues.windows(2) {
        assert!(w[0] <= w[1], "eigenvalues must be ascending");
    }

    for i in 0..n {
        for j in 0..n {
            let mut acc = Complex64::new(0.0, 0.0);
            for l in 0..n {
                acc += res.eigenvectors[i * n + l] * res.eigenvalues[l] * res.eigenvectors[j * n + l].conj();
            }
            assert_relative_eq!(acc.re, h[i * n + j].re, epsilon = 1e-10);
            assert_relative_eq!(acc.im, h[i * n + j].im, epsilon = 1e-10);
        }
    }
}

#[test]
fn test_eigh_eigenvectors_orthonormal() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let n = 5;
    let raw: Vec<f64> = (0..n * n).map(|_| rng.gen_range(-1.0..1.0)).collect();
    let mut sym = vec![0.0; n * n];
    for i in 0..n {
        for j in 0..n {
            sym[i * n + j] = raw[i * n + j] + raw[j * n + i];
        }
    }
    let res = FaerBackend.eigh(&sym, n).unwrap();

    // V^T V = I
    let mut vt = vec![0.0; n * n];
    for i in 0..n {
        for j in 0..n {
            vt[j * n + i] = res.eigenvectors[i * n + j];
        }
    }
    let gram = gemm(&vt, &res.eigenvectors, n, n, n);
    for i in 0..n {
        for j in 0..n {
            let expected = if i == j { 1.0 } else { 0.0 };
            assert_relative_eq!(gram[i * n + j], expected, epsilon = 1e-10);
        }
    }
}

#[test]
fn test_svd_random_tall_matrix() {
    let mut rng = ChaCha8Rng::seed_from_u64(1234);
    let (m, n) = (7, 4);
    let a: Vec<f64> = (0..m * n).map(|_| rng.gen_range(-1.0..1.0)).collect();
    let res = FaerBackend.svd(&a, m, n).unwrap();

    assert_eq!(res.rank(), 4);
    assert_eq!(res.u.len(), m * 4);
    assert_eq!(res.vt.len(), 4 * n);
    for w in res.s.windows(2) {
        assert!(w[0] >= w[1], "singular values must be descending");
    }

    for i in 0..m {
        for j in 0..n {
            let mut acc = 0.0;
            for l in 0..4 {
                acc += res.u[i * 4 + l] * res.s[l] * res.vt[l * n + j];
            }
            assert_relative_eq!(acc, a[i * n + j], epsilon = 1e-10);
        }
    }
}

#[test]
fn test_svd_complex_wide_matrix() {
    let mut rng = ChaCha8Rng::seed_from_u64(99);
    let (m, n) = (3, 5);
    let a: Vec<Complex64> = (0..m * n)
        .map(|_| Complex64::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0)))
        .collect();
    let res = FaerBackend.svd(&a, m, n).unwrap();
    assert_eq!(res.rank(), 3);

    for i in 0..m {
        for j in 0..n {
            let mut acc = Complex64::new(0.0, 0.0);
            for l in 0..3 {
                acc += res.u[i * 3 + l] * res.s[l] * res.vt[l * n + j];
            }
            assert_relative_eq!(acc.re, a[i * n + j].re, epsilon = 1e-10);
            assert_relative_eq!(acc.im, a[i * n + j].im, epsilon = 1e-10);
        }
    }
}
