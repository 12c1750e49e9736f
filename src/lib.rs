extern crate fnv;
extern crate log_domain;
extern crate num_traits;
extern crate rand;
#[macro_use]
extern crate serde_derive;
extern crate thiserror;

pub mod align;
pub mod error;
pub mod fst;
pub mod hmm;
pub mod model;
pub mod prons;

pub use crate::error::AlignError;
