#![forbid(unsafe_code)]
#![allow(unused_parens)]

//! Pattern matching over symbolic heaps for a separation-logic shape
//! analyser. Given a heap (a conjunction of points-to facts and list
//! segments, plus the pure substitution the analyser has committed to)
//! and a pattern with free logical variables, the matcher decides
//! whether the heap entails an instance of the pattern, handing back a
//! witnessing substitution and the part of the heap the pattern did not
//! consume. On top of that sit the pieces abstraction needs : deciding
//! α-equivalence of list-segment parameter bodies, finding a partial
//! isomorphism between two sub-heaps, and synthesising a fresh
//! parameter body out of such an isomorphism.
//!
//! The matcher is a pure function over immutable values; the only
//! process-wide pieces are the fresh-identifier serial, the `abs_struct`
//! tuning knob, and (under the `tracing` feature) the decision log.

pub mod errors;
pub mod config;
pub mod ident;
pub mod expr;
pub mod subst;
pub mod hprop;
pub mod iter;
pub mod unify;
pub mod matcher;
pub mod iso;
pub mod para;
pub mod tracing;

pub use crate::ident::{ Ident, IdentKind, Fieldname, Pvar, Typ, fresh_primed };
pub use crate::expr::{ Expr, InnerExpr, ConstVal, Unop, Binop };
pub use crate::subst::{ Subst, sub_empty, sub_of_list };
pub use crate::hprop::{ StrExp, Inst, Hpred, HPat, Hpara, HparaDll, LsegKind, Prop,
                        prop_from_sigma, sigma_lift_to_pe, hpred_lift_to_pe,
                        sigma_remove_hpred, hpara_instantiate, hpara_dll_instantiate };
pub use crate::iter::PropIter;
pub use crate::matcher::{ MatchCond, prop_match_with_impl, hpara_match, hpara_dll_match };
pub use crate::iso::{ FieldMode, Corres, hpara_iso, hpara_dll_iso,
                      find_partial_iso, find_partial_iso_from_two_sigmas };
pub use crate::para::{ hpara_create, hpara_dll_create };
