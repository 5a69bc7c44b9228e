//! Named, maskable parameter collections owned by each partition.
//!
//! A [`NamedParams`] value holds float- and int-valued parameter arrays keyed
//! by name, each with an optional boolean mask of the same length. Masked
//! entries (`true`) are the ones an optimizer is allowed to move; everything
//! else is carried through untouched.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::params::errors::{ParamError, ParamResult};

/// Float and int parameter arrays for one partition, plus optimisation masks.
///
/// Names are stored in `BTreeMap`s so every traversal (flattening, logging,
/// serialization) sees them in the same sorted order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NamedParams {
    #[serde(default)]
    pub float_params: BTreeMap<String, Vec<f64>>,
    #[serde(default)]
    pub int_params: BTreeMap<String, Vec<i64>>,
    #[serde(default)]
    pub float_params_mask: BTreeMap<String, Vec<bool>>,
    #[serde(default)]
    pub int_params_mask: BTreeMap<String, Vec<bool>>,
}

impl NamedParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert of an unmasked float parameter.
    pub fn with_float(mut self, name: &str, values: Vec<f64>) -> Self {
        self.float_params.insert(name.to_string(), values);
        self
    }

    /// Builder-style insert of an unmasked int parameter.
    pub fn with_int(mut self, name: &str, values: Vec<i64>) -> Self {
        self.int_params.insert(name.to_string(), values);
        self
    }

    /// Builder-style insert of a float parameter whose every entry is optimised.
    pub fn with_optimised_float(mut self, name: &str, values: Vec<f64>) -> Self {
        self.float_params_mask.insert(name.to_string(), vec![true; values.len()]);
        self.float_params.insert(name.to_string(), values);
        self
    }

    /// Set the float mask for `name`.
    ///
    /// # Errors
    /// - [`ParamError::MaskWithoutValues`] if `name` has no float values.
    /// - [`ParamError::MaskShapeMismatch`] if the lengths differ.
    pub fn set_float_mask(&mut self, name: &str, mask: Vec<bool>) -> ParamResult<()> {
        let values = self
            .float_params
            .get(name)
            .ok_or_else(|| ParamError::MaskWithoutValues { name: name.to_string() })?;
        check_mask(name, values.len(), mask.len())?;
        self.float_params_mask.insert(name.to_string(), mask);
        Ok(())
    }

    /// Set the int mask for `name`.
    ///
    /// # Errors
    /// Same as [`NamedParams::set_float_mask`], against the int group.
    pub fn set_int_mask(&mut self, name: &str, mask: Vec<bool>) -> ParamResult<()> {
        let values = self
            .int_params
            .get(name)
            .ok_or_else(|| ParamError::MaskWithoutValues { name: name.to_string() })?;
        check_mask(name, values.len(), mask.len())?;
        self.int_params_mask.insert(name.to_string(), mask);
        Ok(())
    }

    pub fn set_float(&mut self, name: &str, values: Vec<f64>) {
        self.float_params.insert(name.to_string(), values);
    }

    /// Look up a float parameter array.
    ///
    /// # Errors
    /// [`ParamError::MissingFloatParam`] if `name` is not defined.
    pub fn float(&self, name: &str) -> ParamResult<&[f64]> {
        self.float_params
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| ParamError::MissingFloatParam { name: name.to_string() })
    }

    /// First entry of a float parameter, for scalar-valued settings.
    pub fn float_scalar(&self, name: &str) -> ParamResult<f64> {
        self.float(name)?
            .first()
            .copied()
            .ok_or_else(|| ParamError::EmptyParam { name: name.to_string() })
    }

    /// Look up an int parameter array.
    ///
    /// # Errors
    /// [`ParamError::MissingIntParam`] if `name` is not defined.
    pub fn int(&self, name: &str) -> ParamResult<&[i64]> {
        self.int_params
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| ParamError::MissingIntParam { name: name.to_string() })
    }

    /// First entry of an int parameter.
    pub fn int_scalar(&self, name: &str) -> ParamResult<i64> {
        self.int(name)?
            .first()
            .copied()
            .ok_or_else(|| ParamError::EmptyParam { name: name.to_string() })
    }

    /// Check every mask against its values.
    ///
    /// # Errors
    /// - [`ParamError::MaskWithoutValues`] when a mask names an unknown parameter.
    /// - [`ParamError::MaskShapeMismatch`] when lengths differ.
    pub fn validate(&self) -> ParamResult<()> {
        for (name, mask) in &self.float_params_mask {
            let values = self
                .float_params
                .get(name)
                .ok_or_else(|| ParamError::MaskWithoutValues { name: name.clone() })?;
            check_mask(name, values.len(), mask.len())?;
        }
        for (name, mask) in &self.int_params_mask {
            let values = self
                .int_params
                .get(name)
                .ok_or_else(|| ParamError::MaskWithoutValues { name: name.clone() })?;
            check_mask(name, values.len(), mask.len())?;
        }
        Ok(())
    }

    /// Number of entries marked for optimisation across both groups.
    pub fn masked_len(&self) -> usize {
        let count = |masks: &BTreeMap<String, Vec<bool>>| -> usize {
            masks.values().map(|m| m.iter().filter(|&&b| b).count()).sum()
        };
        count(&self.float_params_mask) + count(&self.int_params_mask)
    }
}

fn check_mask(name: &str, values: usize, mask: usize) -> ParamResult<()> {
    if values != mask {
        return Err(ParamError::MaskShapeMismatch { name: name.to_string(), values, mask });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // Lookup errors, mask validation and masked-entry counting.
    // Flattening lives in `mapping`.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Missing names must surface as errors instead of default values.
    fn lookups_of_unknown_names_fail() {
        // Arrange
        let params = NamedParams::new().with_float("a", vec![1.0]);

        // Act / Assert
        assert_eq!(params.float_scalar("a"), Ok(1.0));
        assert_eq!(
            params.float("b"),
            Err(ParamError::MissingFloatParam { name: "b".to_string() })
        );
        assert_eq!(params.int("c"), Err(ParamError::MissingIntParam { name: "c".to_string() }));
    }

    #[test]
    // Purpose
    // -------
    // A scalar lookup on an empty array reports `EmptyParam`.
    fn scalar_lookup_of_empty_array_fails() {
        let params = NamedParams::new().with_int("refit_steps", vec![]);

        assert_eq!(
            params.int_scalar("refit_steps"),
            Err(ParamError::EmptyParam { name: "refit_steps".to_string() })
        );
    }

    #[test]
    // Purpose
    // -------
    // Masks must match the shape of the values they describe.
    //
    // Given
    // -----
    // - A float param of length 2 and an int param of length 1.
    //
    // Expect
    // ------
    // - Wrong-length and dangling masks are rejected; a correct mask is counted.
    fn masks_are_shape_checked() {
        // Arrange
        let mut params = NamedParams::new().with_float("x", vec![1.0, 2.0]).with_int("k", vec![3]);

        // Act
        let bad = params.set_float_mask("x", vec![true]);
        let dangling = params.set_int_mask("missing", vec![true]);
        params.set_float_mask("x", vec![true, false]).unwrap();
        params.set_int_mask("k", vec![true]).unwrap();

        // Assert
        assert_eq!(
            bad,
            Err(ParamError::MaskShapeMismatch { name: "x".to_string(), values: 2, mask: 1 })
        );
        assert_eq!(dangling, Err(ParamError::MaskWithoutValues { name: "missing".to_string() }));
        assert_eq!(params.masked_len(), 2);
        assert!(params.validate().is_ok());
    }

    #[test]
    // Purpose
    // -------
    // `validate` catches masks that were inserted directly into the maps
    // (e.g. by deserialization).
    fn validate_rejects_inconsistent_deserialized_masks() {
        let json = r#"{"float_params": {"x": [1.0]}, "float_params_mask": {"x": [true, true]}}"#;
        let params: NamedParams = serde_json::from_str(json).unwrap();

        assert_eq!(
            params.validate(),
            Err(ParamError::MaskShapeMismatch { name: "x".to_string(), values: 1, mask: 2 })
        );
    }
}
