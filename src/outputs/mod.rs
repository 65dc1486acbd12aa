//! Output generation for the digest.
//!
//! # Submodules
//!
//! - [`html`]: Renders the digest email body
//! - [`json`]: Archives the digest as JSON for later inspection

pub mod html;
pub mod json;
