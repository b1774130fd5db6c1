//! Auth material and the composer that turns it into per-request headers.

pub mod composer;
pub mod signer;
pub mod token;

pub use composer::*;
pub use signer::*;
pub use token::*;

pub use crate::error::BoxError;
