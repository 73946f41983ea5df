//! Oxima Core - Terms, Sorts, and Models for the Oxima optimization engine
//!
//! This crate provides the foundational types the optimization engine is
//! built on:
//! - Hash-consed terms with cheap [`TermId`] handles
//! - A small sort system (`Bool`, `Int`, `Real`, `BitVec`)
//! - Models with bottom-up evaluation over the supported fragment
//! - The shared error type
//!
//! # Examples
//!
//! ## Creating Terms
//!
//! ```
//! use oxima_core::ast::TermManager;
//!
//! let mut tm = TermManager::new();
//!
//! // Boolean terms
//! let p = tm.mk_var("p", tm.sorts.bool_sort);
//! let q = tm.mk_var("q", tm.sorts.bool_sort);
//! let or_pq = tm.mk_or(vec![p, q]);
//! assert_eq!(or_pq, tm.mk_or(vec![p, q]));
//!
//! // Integer terms
//! let x = tm.mk_var("x", tm.sorts.int_sort);
//! let five = tm.mk_int(5);
//! let ge = tm.mk_ge(x, five);
//! assert!(tm.get(ge).is_some());
//! ```
//!
//! ## Evaluating under a Model
//!
//! ```
//! use oxima_core::ast::TermManager;
//! use oxima_core::model::Model;
//!
//! let mut tm = TermManager::new();
//! let x = tm.mk_var("x", tm.sorts.int_sort);
//! let three = tm.mk_int(3);
//! let sum = tm.mk_add(vec![x, three]);
//!
//! let mut model = Model::new();
//! let four = tm.mk_int(4);
//! model.insert(x, four);
//!
//! let seven = tm.mk_int(7);
//! assert_eq!(model.eval(sum, &mut tm), Some(seven));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod ast;
pub mod error;
pub mod model;
pub mod sort;

pub use ast::{Term, TermId, TermKind, TermManager};
pub use error::{OximaError, Result};
pub use model::Model;
pub use sort::{SortId, SortKind, SortTable};
