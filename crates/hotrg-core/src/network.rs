//! Fixed-wiring contraction of a small set of named tensors.
//!
//! A [`ContractionPlan`] describes a tensor network once: which named slots
//! exist, which legs of which slots are joined, and which legs stay open and
//! become the output's legs (in a fixed order, under new names). The plan is
//! then contracted any number of times with concrete tensors bound to the
//! slots.
//!
//! # Example
//!
//! ```
//! use hotrg_core::{ContractionPlan, DenseTensor};
//!
//! // Matrix product: C[i, k] = A[i, j] B[j, k]
//! let plan = ContractionPlan::builder()
//!     .tensor("A", &["i", "j"])
//!     .tensor("B", &["j", "k"])
//!     .link(("A", "j"), ("B", "j"))
//!     .open(("A", "i"), "row")
//!     .open(("B", "k"), "col")
//!     .build()
//!     .unwrap();
//!
//! let a = DenseTensor::new(&["i", "j"], &[2, 2], vec![1.0, 2.0, 3.0, 4.0]).unwrap();
//! let b = DenseTensor::new(&["j", "k"], &[2, 2], vec![5.0, 6.0, 7.0, 8.0]).unwrap();
//! let c = plan.contract(&[("A", &a), ("B", &b)]).unwrap();
//! assert_eq!(c.labels(), &["row", "col"]);
//! assert_eq!(c.as_slice(), &[19.0, 22.0, 43.0, 50.0]);
//! ```

use hotrg_tensorbackend::{einsum, DenseScalar, EinsumOperand};
use std::collections::{HashMap, HashSet};

use crate::tensor::{DenseTensor, TensorError};

#[derive(Debug, Clone)]
struct PlanSlot {
    name: String,
    legs: Vec<String>,
}

/// A reusable wiring template over named tensors.
#[derive(Debug, Clone)]
pub struct ContractionPlan {
    slots: Vec<PlanSlot>,
    /// Axis id of each `(slot, leg)`.
    ids: HashMap<(usize, String), usize>,
    output_ids: Vec<usize>,
    output_labels: Vec<String>,
}

/// Builder for [`ContractionPlan`].
///
/// Errors are collected and reported by [`build`](Self::build).
#[derive(Debug, Default)]
pub struct ContractionPlanBuilder {
    slots: Vec<PlanSlot>,
    links: Vec<((String, String), (String, String))>,
    opens: Vec<((String, String), String)>,
}

impl ContractionPlanBuilder {
    /// Declare a slot with its leg labels.
    #[must_use]
    pub fn tensor(mut self, name: &str, legs: &[&str]) -> Self {
        self.slots.push(PlanSlot {
            name: name.to_string(),
            legs: legs.iter().map(|l| l.to_string()).collect(),
        });
        self
    }

    /// Join two legs; they are summed over.
    #[must_use]
    pub fn link(mut self, a: (&str, &str), b: (&str, &str)) -> Self {
        self.links.push((
            (a.0.to_string(), a.1.to_string()),
            (b.0.to_string(), b.1.to_string()),
        ));
        self
    }

    /// Keep a leg open; it becomes the next output leg, named `output_label`.
    #[must_use]
    pub fn open(mut self, leg: (&str, &str), output_label: &str) -> Self {
        self.opens
            .push(((leg.0.to_string(), leg.1.to_string()), output_label.to_string()));
        self
    }

    /// Validate the wiring and assign axis ids.
    ///
    /// Every leg of every slot must be used exactly once, either in a link or
    /// as an open leg.
    pub fn build(self) -> Result<ContractionPlan, TensorError> {
        let mut slot_index: HashMap<&str, usize> = HashMap::new();
        for (i, slot) in self.slots.iter().enumerate() {
            if slot_index.insert(slot.name.as_str(), i).is_some() {
                return Err(TensorError::InvalidPlan(format!(
                    "slot {:?} declared twice",
                    slot.name
                )));
            }
            let unique: HashSet<&String> = slot.legs.iter().collect();
            if unique.len() != slot.legs.len() {
                return Err(TensorError::InvalidPlan(format!(
                    "slot {:?} repeats a leg label",
                    slot.name
                )));
            }
        }

        let resolve = |slot: &str, leg: &str| -> Result<(usize, String), TensorError> {
            let &i = slot_index
                .get(slot)
                .ok_or_else(|| TensorError::InvalidPlan(format!("unknown slot {:?}", slot)))?;
            if !self.slots[i].legs.iter().any(|l| l == leg) {
                return Err(TensorError::InvalidPlan(format!(
                    "slot {:?} has no leg {:?}",
                    slot, leg
                )));
            }
            Ok((i, leg.to_string()))
        };

        let mut ids: HashMap<(usize, String), usize> = HashMap::new();
        let mut next_id = 0usize;
        let mut assign = |key: (usize, String), id: usize| -> Result<(), TensorError> {
            if ids.insert(key.clone(), id).is_some() {
                return Err(TensorError::InvalidPlan(format!(
                    "leg {:?} of slot #{} is wired twice",
                    key.1, key.0
                )));
            }
            Ok(())
        };

        for ((sa, la), (sb, lb)) in &self.links {
            let ka = resolve(sa, la)?;
            let kb = resolve(sb, lb)?;
            assign(ka, next_id)?;
            assign(kb, next_id)?;
            next_id += 1;
        }

        let mut output_ids = Vec::with_capacity(self.opens.len());
        let mut output_labels = Vec::with_capacity(self.opens.len());
        for ((slot, leg), label) in &self.opens {
            let key = resolve(slot, leg)?;
            assign(key, next_id)?;
            if output_labels.contains(label) {
                return Err(TensorError::InvalidPlan(format!(
                    "output label {:?} used twice",
                    label
                )));
            }
            output_ids.push(next_id);
            output_labels.push(label.clone());
            next_id += 1;
        }

        for (i, slot) in self.slots.iter().enumerate() {
            for leg in &slot.legs {
                if !ids.contains_key(&(i, leg.clone())) {
                    return Err(TensorError::InvalidPlan(format!(
                        "leg {:?} of slot {:?} is neither linked nor open",
                        leg, slot.name
                    )));
                }
            }
        }

        Ok(ContractionPlan {
            slots: self.slots,
            ids,
            output_ids,
            output_labels,
        })
    }
}

impl ContractionPlan {
    pub fn builder() -> ContractionPlanBuilder {
        ContractionPlanBuilder::default()
    }

    /// Output leg labels, in output order.
    pub fn output_labels(&self) -> &[String] {
        &self.output_labels
    }

    /// Slot names, in declaration order.
    pub fn slot_names(&self) -> Vec<&str> {
        self.slots.iter().map(|s| s.name.as_str()).collect()
    }

    /// Contract the network with one tensor bound to every slot.
    ///
    /// Tensors are matched to slot legs by label, so their leg order is
    /// irrelevant.
    ///
    /// # Errors
    /// Returns `TensorError` if a slot is unbound or bound twice, a tensor's
    /// labels differ from its slot's legs, or joined legs have different
    /// dimensions.
    pub fn contract<T: DenseScalar>(
        &self,
        tensors: &[(&str, &DenseTensor<T>)],
    ) -> Result<DenseTensor<T>, TensorError> {
        if tensors.len() != self.slots.len() {
            return Err(TensorError::InvalidPlan(format!(
                "plan has {} slots but {} tensors were bound",
                self.slots.len(),
                tensors.len()
            )));
        }

        let mut bound: Vec<Option<&DenseTensor<T>>> = vec![None; self.slots.len()];
        for &(name, tensor) in tensors {
            let i = self
                .slots
                .iter()
                .position(|s| s.name == name)
                .ok_or_else(|| TensorError::InvalidPlan(format!("unknown slot {:?}", name)))?;
            if bound[i].replace(tensor).is_some() {
                return Err(TensorError::InvalidPlan(format!("slot {:?} bound twice", name)));
            }
        }

        let mut operand_ids: Vec<Vec<usize>> = Vec::with_capacity(self.slots.len());
        let mut operand_tensors: Vec<&DenseTensor<T>> = Vec::with_capacity(self.slots.len());
        for (i, slot) in self.slots.iter().enumerate() {
            let tensor = bound[i]
                .ok_or_else(|| TensorError::InvalidPlan(format!("slot {:?} is unbound", slot.name)))?;
            if tensor.rank() != slot.legs.len() || !tensor.has_labels(&slot.legs) {
                return Err(TensorError::InvalidPlan(format!(
                    "slot {:?} expects legs {:?}, got {:?}",
                    slot.name,
                    slot.legs,
                    tensor.labels()
                )));
            }
            let ids = tensor
                .labels()
                .iter()
                .map(|label| self.ids[&(i, label.clone())])
                .collect();
            operand_ids.push(ids);
            operand_tensors.push(tensor);
        }

        let operands: Vec<EinsumOperand<'_, T>> = operand_ids
            .iter()
            .zip(operand_tensors)
            .map(|(ids, tensor)| EinsumOperand {
                ids,
                storage: tensor.storage(),
            })
            .collect();

        let storage = einsum(&operands, &self.output_ids)?;
        DenseTensor::from_storage(&self.output_labels, storage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_rejects_dangling_leg() {
        let res = ContractionPlan::builder()
            .tensor("A", &["i", "j"])
            .open(("A", "i"), "i")
            .build();
        assert!(matches!(res, Err(TensorError::InvalidPlan(_))));
    }

    #[test]
    fn test_build_rejects_double_wiring() {
        let res = ContractionPlan::builder()
            .tensor("A", &["i"])
            .tensor("B", &["i"])
            .link(("A", "i"), ("B", "i"))
            .open(("A", "i"), "out")
            .build();
        assert!(res.is_err());
    }

    #[test]
    fn test_build_rejects_unknown_slot() {
        let res = ContractionPlan::builder()
            .tensor("A", &["i"])
            .open(("B", "i"), "out")
            .build();
        assert!(res.is_err());
    }

    #[test]
    fn test_contract_ignores_leg_order() {
        let plan = ContractionPlan::builder()
            .tensor("A", &["i", "j"])
            .tensor("B", &["j", "k"])
            .link(("A", "j"), ("B", "j"))
            .open(("A", "i"), "i")
            .open(("B", "k"), "k")
            .build()
            .unwrap();
        let a = DenseTensor::new(&["i", "j"], &[2, 3], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let b = DenseTensor::new(&["j", "k"], &[3, 1], vec![1.0, 1.0, 1.0]).unwrap();
        let expected = plan.contract(&[("A", &a), ("B", &b)]).unwrap();

        let a_t = a.permute(&["j", "i"]).unwrap();
        let got = plan.contract(&[("B", &b), ("A", &a_t)]).unwrap();
        assert_eq!(got, expected);
        assert_eq!(got.as_slice(), &[6.0, 15.0]);
    }

    #[test]
    fn test_contract_rejects_wrong_labels() {
        let plan = ContractionPlan::builder()
            .tensor("A", &["i"])
            .open(("A", "i"), "i")
            .build()
            .unwrap();
        let wrong = DenseTensor::new(&["x"], &[2], vec![1.0, 2.0]).unwrap();
        assert!(plan.contract(&[("A", &wrong)]).is_err());
        assert!(plan.contract::<f64>(&[]).is_err());
    }

    #[test]
    fn test_contract_rejects_dimension_mismatch() {
        let plan = ContractionPlan::builder()
            .tensor("A", &["i"])
            .tensor("B", &["i"])
            .link(("A", "i"), ("B", "i"))
            .build()
            .unwrap();
        let a = DenseTensor::new(&["i"], &[2], vec![1.0, 2.0]).unwrap();
        let b = DenseTensor::new(&["i"], &[3], vec![1.0, 2.0, 3.0]).unwrap();
        assert!(matches!(
            plan.contract(&[("A", &a), ("B", &b)]),
            Err(TensorError::ContractionError(_))
        ));
    }
}
