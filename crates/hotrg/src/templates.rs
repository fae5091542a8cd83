//! Fixed contraction templates for the four HOTRG directions.
//!
//! Every direction has two templates:
//!
//! - an *environment* template, contracting two stacked copies of a tensor
//!   with their conjugates over every leg except the two legs on the
//!   direction's side, which yields the Hermitian matrix the projector is
//!   fitted to;
//! - a *projector* template, merging two stacked tensors and compressing the
//!   two leg pairs perpendicular to the stacking with a projector and its
//!   conjugate transpose.
//!
//! For a horizontal direction (`l`, `r`) tensor `A` sits above `B`, joined
//! by `A.d`-`B.u`. For a vertical direction (`u`, `d`) `A` sits left of `B`,
//! joined by `A.r`-`B.l`.

use hotrg_core::{ContractionPlan, DenseScalar, DenseTensor, Matrix, TensorError};

use crate::direction::{Axis, Direction};
use crate::error::{HotrgError, Result};
use crate::square::{SquareTensor, SQUARE_LEGS};

// Open legs of the environment template: rows, then columns.
const ENV_ROWS: [&str; 2] = ["row_a", "row_b"];
const ENV_COLS: [&str; 2] = ["col_a", "col_b"];

/// The leg of `A` joined to `B` and the leg of `B` joined to `A`.
fn stacking(axis: Axis) -> (&'static str, &'static str) {
    match axis {
        Axis::Horizontal => ("d", "u"),
        Axis::Vertical => ("r", "l"),
    }
}

/// Leg labels of the reshaped projector tensors: the leg attached to `A`,
/// the leg attached to `B`, and the compressed output leg.
fn projector_legs(axis: Axis) -> [&'static str; 3] {
    match axis {
        Axis::Horizontal => ["u", "d", "o"],
        Axis::Vertical => ["l", "r", "o"],
    }
}

fn environment_plan(direction: Direction) -> std::result::Result<ContractionPlan, TensorError> {
    let (a_join, b_join) = stacking(direction.axis());
    let side = direction.label();
    let other = direction.opposite().label();
    // Legs parallel to the stacking: the outer legs of the pair
    let (a_outer, b_outer) = (b_join, a_join);

    ContractionPlan::builder()
        .tensor("A", &SQUARE_LEGS)
        .tensor("B", &SQUARE_LEGS)
        .tensor("Ac", &SQUARE_LEGS)
        .tensor("Bc", &SQUARE_LEGS)
        .link(("A", a_join), ("B", b_join))
        .link(("Ac", a_join), ("Bc", b_join))
        .link(("A", a_outer), ("Ac", a_outer))
        .link(("B", b_outer), ("Bc", b_outer))
        .link(("A", other), ("Ac", other))
        .link(("B", other), ("Bc", other))
        .open(("A", side), ENV_ROWS[0])
        .open(("B", side), ENV_ROWS[1])
        .open(("Ac", side), ENV_COLS[0])
        .open(("Bc", side), ENV_COLS[1])
        .build()
}

fn projector_plan(direction: Direction) -> std::result::Result<ContractionPlan, TensorError> {
    let axis = direction.axis();
    let (a_join, b_join) = stacking(axis);
    let [p_a, p_b, p_out] = projector_legs(axis);
    let (a_outer, b_outer) = (b_join, a_join);

    // "P" compresses the forward side, "Pc" the backward side
    let (forward, backward) = match axis {
        Axis::Horizontal => (Direction::Left, Direction::Right),
        Axis::Vertical => (Direction::Up, Direction::Down),
    };
    let (fwd_slot, bwd_slot) = if direction.is_forward() {
        ("P", "Pc")
    } else {
        ("Pc", "P")
    };

    let mut builder = ContractionPlan::builder()
        .tensor("A", &SQUARE_LEGS)
        .tensor("B", &SQUARE_LEGS)
        .tensor("P", &[p_a, p_b, p_out])
        .tensor("Pc", &[p_out, p_a, p_b])
        .link(("A", a_join), ("B", b_join))
        .link((fwd_slot, p_a), ("A", forward.label()))
        .link((fwd_slot, p_b), ("B", forward.label()))
        .link((bwd_slot, p_a), ("A", backward.label()))
        .link((bwd_slot, p_b), ("B", backward.label()));

    // Output legs in u, d, l, r order
    builder = match axis {
        Axis::Horizontal => builder
            .open(("A", a_outer), "u")
            .open(("B", b_outer), "d")
            .open((fwd_slot, p_out), "l")
            .open((bwd_slot, p_out), "r"),
        Axis::Vertical => builder
            .open((fwd_slot, p_out), "u")
            .open((bwd_slot, p_out), "d")
            .open(("A", a_outer), "l")
            .open(("B", b_outer), "r"),
    };
    builder.build()
}

/// Environment and projector templates for every direction.
#[derive(Debug, Clone)]
pub struct DirectionalTemplates {
    environment: Vec<ContractionPlan>,
    projector: Vec<ContractionPlan>,
}

impl DirectionalTemplates {
    /// Build all eight templates.
    pub fn new() -> Result<Self> {
        let environment = Direction::ALL
            .iter()
            .map(|&d| environment_plan(d))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let projector = Direction::ALL
            .iter()
            .map(|&d| projector_plan(d))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self {
            environment,
            projector,
        })
    }

    /// Environment matrix of `tensor` for `direction`.
    ///
    /// The row index combines the `direction` legs of the two stacked
    /// copies as `first · χ + second`; the column index is the same pair on
    /// the conjugate copies. The result is Hermitian and positive
    /// semidefinite.
    pub fn build_environment<T: DenseScalar>(
        &self,
        direction: Direction,
        tensor: &SquareTensor<T>,
    ) -> Result<Matrix<T>> {
        let a = tensor.tensor();
        let conj = a.conj();
        let env = self.environment[direction.index()].contract(&[
            ("A", a),
            ("B", a),
            ("Ac", &conj),
            ("Bc", &conj),
        ])?;
        Ok(env.to_matrix(&ENV_ROWS, &ENV_COLS)?)
    }

    /// Merge `a` and `b` along `direction`'s axis, compressing the leg pairs
    /// on both sides with `projector` and its conjugate transpose.
    ///
    /// `projector` is `χ_a χ_b × out`, where `χ_a`, `χ_b` are the
    /// dimensions of the compressed legs of `a` and `b`.
    pub fn apply_projector<T: DenseScalar>(
        &self,
        direction: Direction,
        projector: &Matrix<T>,
        a: &SquareTensor<T>,
        b: &SquareTensor<T>,
    ) -> Result<DenseTensor<T>> {
        let axis = direction.axis();
        let (chi_a, chi_b) = match axis {
            Axis::Horizontal => (a.horizontal_dim(), b.horizontal_dim()),
            Axis::Vertical => (a.vertical_dim(), b.vertical_dim()),
        };
        if projector.rows() != chi_a * chi_b {
            return Err(HotrgError::DimensionMismatch {
                expected: vec![chi_a * chi_b],
                got: vec![projector.rows()],
            });
        }
        let out = projector.cols();
        let [p_a, p_b, p_out] = projector_legs(axis);

        let p = DenseTensor::new(&[p_a, p_b, p_out], &[chi_a, chi_b, out], projector.as_slice().to_vec())?;
        let pc = DenseTensor::new(
            &[p_out, p_a, p_b],
            &[out, chi_a, chi_b],
            projector.conj_transpose().into_vec(),
        )?;

        let merged = self.projector[direction.index()].contract(&[
            ("A", a.tensor()),
            ("B", b.tensor()),
            ("P", &p),
            ("Pc", &pc),
        ])?;
        Ok(merged)
    }
}
