//! Host module tree
//!
//! A [`Module`] tree stands in for the model being quantized. Only modules
//! carrying an [`AutoQuantState`](crate::trace::AutoQuantState) take part in
//! fusion discovery; [`Module::named_modules`] yields them together with their
//! FQNs in pre-order.

pub mod tree;

pub use tree::{Module, NamedModules};
