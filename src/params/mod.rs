//! params: per-partition named parameters and their optimizer mapping.
//!
//! Purpose
//! -------
//! Hold the named float/int parameter arrays that every partition carries,
//! together with the boolean masks that decide which entries an optimizer
//! may move, and translate the masked subset to and from flat vectors.
//!
//! Key behaviors
//! -------------
//! - [`NamedParams`] stores values and masks in sorted maps and exposes
//!   checked lookups (`float`, `int`, `float_scalar`, ...).
//! - [`ParamsMapping`] freezes the masked layout and provides `flatten` /
//!   `unflatten` across a slice of partitions.
//!
//! Invariants & assumptions
//! ------------------------
//! - Mask shape equals value shape per name ([`NamedParams::validate`]).
//! - Unmasked entries are never written by the mapping.
//!
//! Downstream usage
//! ----------------
//! - The filter reads kernel parameters through the checked lookups.
//! - The optimizer wrapper flattens previous parameters into its starting
//!   point and unflattens every trial candidate into a fresh copy.
pub mod errors;
pub mod mapping;
pub mod named;

pub use self::errors::{ParamError, ParamResult};
pub use self::mapping::ParamsMapping;
pub use self::named::NamedParams;
