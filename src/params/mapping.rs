//! params::mapping: masked parameters ⇄ flat optimizer vectors.
//!
//! Purpose
//! -------
//! Translate the masked entries of a slice of per-partition [`NamedParams`]
//! into the flat `Array1<f64>` an optimizer works on, and write optimizer
//! candidates back into parameter structures.
//!
//! Key behaviors
//! -------------
//! - [`ParamsMapping::new`] records the masked layout once; every later
//!   `flatten`/`unflatten` call uses the same ordering.
//! - `unflatten` only writes masked entries. Unmasked entries keep whatever
//!   value the target already holds.
//!
//! Invariants & assumptions
//! ------------------------
//! - Layout order: partition ascending, then float names ascending, then int
//!   names ascending, then entry index.
//! - Int entries travel as `f64` and are rounded to the nearest integer on
//!   the way back.
//!
//! Testing notes
//! -------------
//! - Unit tests cover the flatten/unflatten bijection on masked entries and
//!   the untouched-unmasked guarantee.
use ndarray::Array1;

use crate::params::{
    errors::{ParamError, ParamResult},
    named::NamedParams,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParamKind {
    Float,
    Int,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Slot {
    partition: usize,
    kind: ParamKind,
    name: String,
    index: usize,
}

/// Frozen layout of the masked entries across a set of partitions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamsMapping {
    slots: Vec<Slot>,
    partitions: usize,
}

impl ParamsMapping {
    /// Build the layout from the masks currently held by `params`.
    ///
    /// # Errors
    /// Propagates [`NamedParams::validate`] failures for any partition.
    pub fn new(params: &[NamedParams]) -> ParamResult<Self> {
        let mut slots = Vec::new();
        for (partition, p) in params.iter().enumerate() {
            p.validate()?;
            for (name, mask) in &p.float_params_mask {
                slots.extend(mask.iter().enumerate().filter(|(_, &m)| m).map(|(index, _)| Slot {
                    partition,
                    kind: ParamKind::Float,
                    name: name.clone(),
                    index,
                }));
            }
            for (name, mask) in &p.int_params_mask {
                slots.extend(mask.iter().enumerate().filter(|(_, &m)| m).map(|(index, _)| Slot {
                    partition,
                    kind: ParamKind::Int,
                    name: name.clone(),
                    index,
                }));
            }
        }
        Ok(Self { slots, partitions: params.len() })
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Read the masked entries of `params` into a flat vector.
    ///
    /// # Errors
    /// - [`ParamError::PartitionCountMismatch`] if `params` has a different
    ///   number of partitions than the layout.
    /// - `Missing*Param` if a name recorded in the layout is absent.
    pub fn flatten(&self, params: &[NamedParams]) -> ParamResult<Array1<f64>> {
        self.check_partitions(params.len())?;
        let mut theta = Array1::zeros(self.slots.len());
        for (value, slot) in theta.iter_mut().zip(&self.slots) {
            let p = &params[slot.partition];
            *value = match slot.kind {
                ParamKind::Float => p.float(&slot.name)?[slot.index],
                ParamKind::Int => p.int(&slot.name)?[slot.index] as f64,
            };
        }
        Ok(theta)
    }

    /// Write `theta` into the masked entries of `params`.
    ///
    /// # Errors
    /// - [`ParamError::ThetaLengthMismatch`] if `theta` does not match the layout.
    /// - [`ParamError::PartitionCountMismatch`] as for [`ParamsMapping::flatten`].
    pub fn unflatten(&self, theta: &Array1<f64>, params: &mut [NamedParams]) -> ParamResult<()> {
        if theta.len() != self.slots.len() {
            return Err(ParamError::ThetaLengthMismatch {
                expected: self.slots.len(),
                actual: theta.len(),
            });
        }
        self.check_partitions(params.len())?;
        for (&value, slot) in theta.iter().zip(&self.slots) {
            let p = &mut params[slot.partition];
            match slot.kind {
                ParamKind::Float => {
                    let values = p.float_params.get_mut(&slot.name).ok_or_else(|| {
                        ParamError::MissingFloatParam { name: slot.name.clone() }
                    })?;
                    values[slot.index] = value;
                }
                ParamKind::Int => {
                    let values = p
                        .int_params
                        .get_mut(&slot.name)
                        .ok_or_else(|| ParamError::MissingIntParam { name: slot.name.clone() })?;
                    values[slot.index] = value.round() as i64;
                }
            }
        }
        Ok(())
    }

    fn check_partitions(&self, actual: usize) -> ParamResult<()> {
        if actual != self.partitions {
            return Err(ParamError::PartitionCountMismatch { expected: self.partitions, actual });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // Layout ordering, the masked-entry bijection, and length checks.
    // -------------------------------------------------------------------------

    fn two_partitions() -> Vec<NamedParams> {
        let mut first = NamedParams::new()
            .with_float("b", vec![1.0, 2.0, 3.0])
            .with_float("a", vec![10.0])
            .with_int("k", vec![4, 5]);
        first.set_float_mask("b", vec![true, false, true]).unwrap();
        first.set_float_mask("a", vec![true]).unwrap();
        first.set_int_mask("k", vec![false, true]).unwrap();
        let second = NamedParams::new().with_optimised_float("c", vec![-1.0]);
        vec![first, second]
    }

    #[test]
    // Purpose
    // -------
    // Flattening walks partitions, then sorted float names, then int names.
    fn flatten_follows_sorted_layout() {
        // Arrange
        let params = two_partitions();
        let mapping = ParamsMapping::new(&params).unwrap();

        // Act
        let theta = mapping.flatten(&params).unwrap();

        // Assert
        assert_eq!(theta, array![10.0, 1.0, 3.0, 5.0, -1.0]);
    }

    #[test]
    // Purpose
    // -------
    // `unflatten(flatten(p), copy_of(p))` reproduces masked entries exactly and
    // leaves unmasked entries untouched.
    //
    // Given
    // -----
    // - A target copy whose unmasked entries were changed after flattening.
    //
    // Expect
    // ------
    // - Masked entries equal the source; unmasked entries keep the target's values.
    fn unflatten_inverts_flatten_on_masked_entries_only() {
        // Arrange
        let source = two_partitions();
        let mapping = ParamsMapping::new(&source).unwrap();
        let theta = mapping.flatten(&source).unwrap();
        let mut target = source.clone();
        target[0].float_params.insert("b".to_string(), vec![0.0, 99.0, 0.0]);
        target[0].int_params.insert("k".to_string(), vec![77, 0]);

        // Act
        mapping.unflatten(&theta, &mut target).unwrap();

        // Assert
        assert_eq!(target[0].float("b").unwrap(), &[1.0, 99.0, 3.0]);
        assert_eq!(target[0].int("k").unwrap(), &[77, 5]);
        assert_eq!(target[1], source[1]);
    }

    #[test]
    // Purpose
    // -------
    // Int entries are rounded when written back.
    fn unflatten_rounds_int_entries() {
        let mut params = two_partitions();
        let mapping = ParamsMapping::new(&params).unwrap();

        mapping.unflatten(&array![0.0, 0.0, 0.0, 6.6, 0.0], &mut params).unwrap();

        assert_eq!(params[0].int("k").unwrap(), &[4, 7]);
    }

    #[test]
    // Purpose
    // -------
    // Vectors of the wrong length are rejected before anything is written.
    fn unflatten_rejects_wrong_length() {
        let mut params = two_partitions();
        let before = params.clone();
        let mapping = ParamsMapping::new(&params).unwrap();

        let err = mapping.unflatten(&array![1.0], &mut params);

        assert_eq!(err, Err(ParamError::ThetaLengthMismatch { expected: 5, actual: 1 }));
        assert_eq!(params, before);
    }
}
