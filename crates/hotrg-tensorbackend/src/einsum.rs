//! ID-based einsum over dense storages.
//!
//! Every axis of every operand carries an integer ID. An ID shared by two
//! operands is summed over; an ID carried by a single operand must appear in
//! the output. Hyperedges (an ID on three or more operands) and repeated IDs
//! inside one operand are rejected.
//!
//! The pairwise contraction order comes from omeco's greedy optimizer; each
//! pair is then contracted with GEMM.
//!
//! ## Usage
//!
//! ```
//! use hotrg_tensorbackend::einsum::{einsum, EinsumOperand};
//! use hotrg_tensorbackend::DenseStorage;
//!
//! let a = DenseStorage::from_vec_with_shape(vec![1.0, 2.0, 3.0, 4.0], &[2, 2]);
//! let b = DenseStorage::from_vec_with_shape(vec![5.0, 6.0, 7.0, 8.0], &[2, 2]);
//! let operands = [
//!     EinsumOperand { ids: &[0, 1], storage: &a },
//!     EinsumOperand { ids: &[1, 2], storage: &b },
//! ];
//! let c = einsum(&operands, &[0, 2]).unwrap();
//! assert_eq!(c.dims(), vec![2, 2]);
//! assert_eq!(c.as_slice(), &[19.0, 22.0, 43.0, 50.0]);
//! ```

use anyhow::Result;
use omeco::{CodeOptimizer, EinCode, GreedyMethod, NestedEinsum};
use std::collections::{HashMap, HashSet};

use crate::storage::{DenseScalar, DenseStorage};

/// Input for einsum operation.
#[derive(Debug, Clone, Copy)]
pub struct EinsumOperand<'a, T> {
    /// Axis IDs for this operand, one per axis of `storage`.
    pub ids: &'a [usize],
    pub storage: &'a DenseStorage<T>,
}

/// A contraction step specifying which two operands to contract.
///
/// Operands are numbered in creation order: the inputs take `0..n`, and
/// step `s` produces operand `n + s`. Every operand is consumed exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContractionStep {
    /// Index of first operand to contract
    pub left: usize,
    /// Index of second operand to contract
    pub right: usize,
}

/// Pairwise contraction order for the given network.
///
/// Uses omeco's greedy method; falls back to left-to-right order if the
/// optimizer gives no complete binary tree.
pub fn contraction_order(
    input_ids: &[Vec<usize>],
    output_ids: &[usize],
    sizes: &HashMap<usize, usize>,
) -> Result<Vec<ContractionStep>> {
    let n = input_ids.len();
    if n <= 1 {
        return Ok(Vec::new());
    }

    let code = EinCode::new(input_ids.to_vec(), output_ids.to_vec());
    if let Some(nested) = GreedyMethod::default().optimize(&code, sizes) {
        let mut steps = Vec::with_capacity(n - 1);
        if nested_to_steps(&nested, n, &mut steps).is_ok() && steps.len() == n - 1 {
            return Ok(steps);
        }
    }

    let mut steps = vec![ContractionStep { left: 0, right: 1 }];
    for i in 2..n {
        steps.push(ContractionStep {
            left: n + i - 2,
            right: i,
        });
    }
    Ok(steps)
}

/// Flatten a binary contraction tree into steps in post-order.
fn nested_to_steps(
    nested: &NestedEinsum<usize>,
    n_inputs: usize,
    steps: &mut Vec<ContractionStep>,
) -> Result<usize> {
    match nested {
        NestedEinsum::Leaf { tensor_index } => Ok(*tensor_index),
        NestedEinsum::Node { args, .. } => {
            anyhow::ensure!(
                args.len() == 2,
                "Only binary contraction trees are supported, got {} children",
                args.len()
            );
            let left = nested_to_steps(&args[0], n_inputs, steps)?;
            let right = nested_to_steps(&args[1], n_inputs, steps)?;
            steps.push(ContractionStep { left, right });
            Ok(n_inputs + steps.len() - 1)
        }
    }
}

/// IDs that survive contracting two operands: free IDs of `a`, then of `b`.
fn pair_output_ids(a: &[usize], b: &[usize]) -> Vec<usize> {
    a.iter()
        .filter(|id| !b.contains(id))
        .chain(b.iter().filter(|id| !a.contains(id)))
        .copied()
        .collect()
}

/// Perform einsum contraction on dense storages.
///
/// # Arguments
///
/// * `operands` - Slice of operands, each with axis IDs and storage
/// * `output_ids` - Axis IDs for the output tensor, in output order
///
/// # Returns
///
/// The contracted storage with axes in `output_ids` order. A scalar result
/// has rank 0 and a single element.
///
/// # Errors
///
/// Returns an error if the operand shapes are inconsistent, an ID appears on
/// more than two operands or twice on one operand, or the output IDs do not
/// match exactly the uncontracted IDs.
pub fn einsum<T: DenseScalar>(
    operands: &[EinsumOperand<'_, T>],
    output_ids: &[usize],
) -> Result<DenseStorage<T>> {
    anyhow::ensure!(!operands.is_empty(), "einsum requires at least one operand");

    // Build sizes map and count occurrences
    let mut sizes: HashMap<usize, usize> = HashMap::new();
    let mut counts: HashMap<usize, usize> = HashMap::new();
    for (pos, op) in operands.iter().enumerate() {
        let dims = op.storage.dims();
        anyhow::ensure!(
            op.ids.len() == dims.len(),
            "Operand {} has {} ids but rank {}",
            pos,
            op.ids.len(),
            dims.len()
        );
        let mut seen = HashSet::new();
        for (&id, &dim) in op.ids.iter().zip(dims.iter()) {
            anyhow::ensure!(seen.insert(id), "Operand {} repeats axis id {}", pos, id);
            let prev = *sizes.entry(id).or_insert(dim);
            anyhow::ensure!(
                prev == dim,
                "Axis id {} has inconsistent dimensions {} and {}",
                id,
                prev,
                dim
            );
            *counts.entry(id).or_insert(0) += 1;
        }
    }

    let output_set: HashSet<usize> = output_ids.iter().copied().collect();
    anyhow::ensure!(
        output_set.len() == output_ids.len(),
        "Output ids {:?} contain duplicates",
        output_ids
    );
    for (&id, &count) in &counts {
        anyhow::ensure!(count <= 2, "Axis id {} appears on {} operands", id, count);
        if count == 1 {
            anyhow::ensure!(output_set.contains(&id), "Open axis id {} missing from output", id);
        } else {
            anyhow::ensure!(!output_set.contains(&id), "Contracted axis id {} requested in output", id);
        }
    }
    for id in output_ids {
        anyhow::ensure!(counts.contains_key(id), "Output id {} not found in operands", id);
    }

    let input_ids: Vec<Vec<usize>> = operands.iter().map(|op| op.ids.to_vec()).collect();
    let steps = contraction_order(&input_ids, output_ids, &sizes)?;

    // Operand slots in creation order; each is taken exactly once
    let mut slots: Vec<Option<(Vec<usize>, DenseStorage<T>)>> = operands
        .iter()
        .map(|op| Some((op.ids.to_vec(), op.storage.clone())))
        .collect();

    for step in &steps {
        let (ids_a, lhs) = take_slot(&mut slots, step.left)?;
        let (ids_b, rhs) = take_slot(&mut slots, step.right)?;

        let mut axes_a = Vec::new();
        let mut axes_b = Vec::new();
        for (pa, id) in ids_a.iter().enumerate() {
            if let Some(pb) = ids_b.iter().position(|x| x == id) {
                axes_a.push(pa);
                axes_b.push(pb);
            }
        }

        let result = lhs.contract(&axes_a, &rhs, &axes_b);
        slots.push(Some((pair_output_ids(&ids_a, &ids_b), result)));
    }

    let last = slots.len() - 1;
    let (ids, result) = take_slot(&mut slots, last)?;
    let perm = output_ids
        .iter()
        .map(|id| {
            ids.iter()
                .position(|x| x == id)
                .ok_or_else(|| anyhow::anyhow!("Output id {} lost during contraction", id))
        })
        .collect::<Result<Vec<usize>>>()?;
    Ok(result.permute(&perm))
}

fn take_slot<T>(
    slots: &mut [Option<(Vec<usize>, DenseStorage<T>)>],
    idx: usize,
) -> Result<(Vec<usize>, DenseStorage<T>)> {
    slots
        .get_mut(idx)
        .and_then(Option::take)
        .ok_or_else(|| anyhow::anyhow!("Contraction step uses operand {} twice or out of range", idx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn storage(data: Vec<f64>, dims: &[usize]) -> DenseStorage<f64> {
        DenseStorage::from_vec_with_shape(data, dims)
    }

    #[test]
    fn test_contraction_order_avoids_outer_product() {
        // ij, kl, jk -> il : contracting 0 with 1 first would be an outer product
        let input_ids = vec![vec![0, 1], vec![2, 3], vec![1, 2]];
        let sizes: HashMap<usize, usize> = [(0, 4), (1, 4), (2, 4), (3, 4)].into_iter().collect();
        let steps = contraction_order(&input_ids, &[0, 3], &sizes).unwrap();
        assert_eq!(steps.len(), 2);
        let first = [steps[0].left, steps[0].right];
        assert!(!(first.contains(&0) && first.contains(&1)));
        // The final step consumes the first intermediate
        assert!(steps[1].left == 3 || steps[1].right == 3);
    }

    #[test]
    fn test_contraction_order_single_operand() {
        let sizes: HashMap<usize, usize> = [(0, 2)].into_iter().collect();
        assert!(contraction_order(&[vec![0]], &[0], &sizes).unwrap().is_empty());
    }

    #[test]
    fn test_single_operand_permutes() {
        let a = storage(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]);
        let ops = [EinsumOperand { ids: &[7, 9], storage: &a }];
        let out = einsum(&ops, &[9, 7]).unwrap();
        assert_eq!(out.dims(), vec![3, 2]);
        assert_eq!(out.as_slice(), &[1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
    }

    #[test]
    fn test_full_contraction_to_scalar() {
        let a = storage(vec![1.0, 2.0, 3.0], &[3]);
        let b = storage(vec![4.0, 5.0, 6.0], &[3]);
        let ops = [
            EinsumOperand { ids: &[0], storage: &a },
            EinsumOperand { ids: &[0], storage: &b },
        ];
        let out = einsum(&ops, &[]).unwrap();
        assert_eq!(out.rank(), 0);
        assert_relative_eq!(out.as_slice()[0], 32.0, epsilon = 1e-12);
    }

    #[test]
    fn test_matrix_chain() {
        // (A B C)[i, l]
        let a = storage(vec![1.0, 0.0, 0.0, 2.0], &[2, 2]);
        let b = storage(vec![0.0, 1.0, 1.0, 0.0], &[2, 2]);
        let c = storage(vec![3.0, 0.0, 0.0, 4.0], &[2, 2]);
        let ops = [
            EinsumOperand { ids: &[0, 1], storage: &a },
            EinsumOperand { ids: &[1, 2], storage: &b },
            EinsumOperand { ids: &[2, 3], storage: &c },
        ];
        let out = einsum(&ops, &[0, 3]).unwrap();
        assert_eq!(out.dims(), vec![2, 2]);
        assert_eq!(out.as_slice(), &[0.0, 4.0, 6.0, 0.0]);
    }

    #[test]
    fn test_output_order_is_respected() {
        // A[i, j] B[j, k] -> C[k, i]
        let a = storage(vec![1.0, 2.0, 3.0, 4.0], &[2, 2]);
        let b = storage(vec![5.0, 6.0, 7.0, 8.0], &[2, 2]);
        let ops = [
            EinsumOperand { ids: &[0, 1], storage: &a },
            EinsumOperand { ids: &[1, 2], storage: &b },
        ];
        let out = einsum(&ops, &[2, 0]).unwrap();
        assert_eq!(out.as_slice(), &[19.0, 43.0, 22.0, 50.0]);
    }

    #[test]
    fn test_rejects_hyperedge() {
        let a = storage(vec![1.0, 2.0], &[2]);
        let ops = [
            EinsumOperand { ids: &[0], storage: &a },
            EinsumOperand { ids: &[0], storage: &a },
            EinsumOperand { ids: &[0], storage: &a },
        ];
        assert!(einsum(&ops, &[]).is_err());
    }

    #[test]
    fn test_rejects_missing_open_id() {
        let a = storage(vec![1.0, 2.0, 3.0, 4.0], &[2, 2]);
        let ops = [EinsumOperand { ids: &[0, 1], storage: &a }];
        assert!(einsum(&ops, &[0]).is_err());
    }

    #[test]
    fn test_rejects_inconsistent_dims() {
        let a = storage(vec![1.0, 2.0], &[2]);
        let b = storage(vec![1.0, 2.0, 3.0], &[3]);
        let ops = [
            EinsumOperand { ids: &[0], storage: &a },
            EinsumOperand { ids: &[0], storage: &b },
        ];
        assert!(einsum(&ops, &[]).is_err());
    }
}
