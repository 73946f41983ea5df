//! Oxima Opt - MaxSAT and multi-objective optimization over an
//! incremental SMT solver
//!
//! This crate organizes a bounded optimization search on top of any
//! solver implementing the [`BaseSolver`] contract (incremental
//! assertion, check-sat under assumptions, models, unsat cores):
//!
//! - Weighted partial MaxSAT by two engines: core-guided refinement
//!   with global at-most-k strengthening ([`core_maxsat`]) and
//!   Fu & Malik with per-core blocking variables ([`fu_malik`])
//! - Single-term maximization/minimization of arithmetic and
//!   bit-vector objectives ([`optsmt`])
//! - Lexicographic, box, and Pareto (guided improvement) disciplines
//!   over ordered objective lists ([`context`], [`pareto`])
//! - Monotone lower/upper bounds in the extended-rational field
//!   throughout ([`inf_eps`])
//!
//! Objectives and hard constraints are declared on a [`Context`] with
//! push/pop scoping; engine state is rebuilt on every
//! [`Context::optimize`] call.
//!
//! # Examples
//!
//! ## Extended-rational bounds
//!
//! ```
//! use num_rational::BigRational;
//! use oxima_opt::InfEps;
//!
//! let five = InfEps::from(5);
//! let above = InfEps::strictly_above(BigRational::from_integer(5.into()));
//! assert!(five < above);
//! assert!(above < InfEps::infinite());
//! assert!(above.is_finite());
//! ```
//!
//! ## Cardinality encodings
//!
//! ```
//! use oxima_core::ast::TermManager;
//! use oxima_opt::cardinality;
//!
//! let mut tm = TermManager::new();
//! let xs: Vec<_> = (0..4)
//!     .map(|i| tm.mk_var(&format!("x{i}"), tm.sorts.bool_sort))
//!     .collect();
//! let amo = cardinality::at_most_one(&mut tm, &xs);
//! let amk = cardinality::at_most_k(&mut tm, &xs, 2);
//! assert_ne!(amo, amk);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod cardinality;
pub mod context;
pub mod core_maxsat;
pub mod fu_malik;
pub mod inf_eps;
pub mod maxsat;
pub mod optsmt;
pub mod pareto;
pub mod solver;

pub use context::{Context, Objective, OptConfig, Priority};
pub use core_maxsat::{CoreMaxSat, CoreMaxSatStats};
pub use fu_malik::{FuMalik, FuMalikStats};
pub use inf_eps::InfEps;
pub use maxsat::{MaxSatEngineKind, MaxSmt};
pub use optsmt::{OptEngineKind, OptSmt, OptSmtStats};
pub use pareto::{FrontierPoint, GiaPareto};
pub use solver::{BaseSolver, SolverResult};
