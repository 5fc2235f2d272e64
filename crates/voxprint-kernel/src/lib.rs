//! voxprint kernel.
//!
//! The leaf crate of the voxprint command engine:
//!
//! - **[`lexicon`]** -- static phrase tables, word-number mappings, canonical
//!   setting values and the confidence constants every parser stage scores
//!   against.  Pure data.
//! - **[`router`]** -- keyword-group router: phrase matching over a single
//!   [`aho_corasick`] automaton plus [`regex`] patterns with named captures,
//!   scored into a confidence in `[0, 1]`.
//! - **[`error`]** -- kernel error types via [`thiserror`].
//!
//! Everything here is synchronous and `Send + Sync` once built.

pub mod error;
pub mod lexicon;
pub mod router;

pub use error::{KernelError, Result};
pub use router::{KeywordRouter, RouteMatch, contains_phrase, first_phrase, keyword_confidence};
