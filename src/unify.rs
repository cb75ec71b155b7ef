use crate::ident::{ Ident, Fieldname };
use crate::expr::{ Expr, InnerExpr::* };
use crate::subst::Subst;
use crate::hprop::{ StrExp, HPat, Hpred, LsegKind, Prop };
use crate::matcher::MatchCond;
use crate::config;
use crate::errors;

/// One-sided matching of `e2` (the pattern side, whose primed variables
/// drawn from `vars` may be bound) against `e1` (the concrete side).
/// On success the returned substitution extends `sub` with bindings for
/// exactly the variables removed from `vars`, and applying it to `e2`
/// yields `e1` syntactically.
///
/// Matching is syntactic : operators are not normalised for
/// commutativity, cast types are ignored as hints, and a concrete-side
/// variable never matches structure on the pattern side.
pub fn exp_match(e1 : &Expr, sub : &Subst, vars : &[Ident], e2 : &Expr)
        -> Option<(Subst, Vec<Ident>)> {
    let check_equal = |sub : &Subst, vars : &[Ident]| {
        let e2_inst = sub.apply(e2);
        match e1 == &e2_inst {
            true => Some((sub.clone(), vars.to_vec())),
            false => None
        }
    };
    match (e1.as_ref(), e2.as_ref()) {
        (_, Var { id : id2, .. }) if id2.is_primed() && vars.contains(id2) => {
            let vars_new = vars.iter().filter(|id| *id != id2).cloned().collect();
            // fatal if id2 is already bound; vars and the domain of sub
            // must be disjoint
            let sub_new = sub.extend(id2.clone(), e1.clone());
            Some((sub_new, vars_new))
        },
        (_, Var {..}) => check_equal(sub, vars),
        (Var {..}, _) => None,
        (Const {..}, _) | (_, Const {..}) => check_equal(sub, vars),
        (Sizeof {..}, _) | (_, Sizeof {..}) => check_equal(sub, vars),
        // casts are only a hint
        (Cast { operand : op1, .. }, Cast { operand : op2, .. }) => {
            exp_match(op1, sub, vars, op2)
        },
        (UnOp { op : o1, operand : op1, .. }, UnOp { op : o2, operand : op2, .. }) if o1 == o2 => {
            exp_match(op1, sub, vars, op2)
        },
        (BinOp { op : b1, lhs : x1, rhs : y1, .. },
         BinOp { op : b2, lhs : x2, rhs : y2, .. }) if b1 == b2 => {
            match exp_match(x1, sub, vars, x2) {
                None => None,
                Some((sub_new, vars_new)) => exp_match(y1, &sub_new, &vars_new, y2)
            }
        },
        (Lvar {..}, _) | (_, Lvar {..}) => check_equal(sub, vars),
        (Lfield { base : b1, fld : f1, .. },
         Lfield { base : b2, fld : f2, .. }) if f1 == f2 => {
            exp_match(b1, sub, vars, b2)
        },
        (Lindex { base : b1, index : i1, .. },
         Lindex { base : b2, index : i2, .. }) => {
            match exp_match(b1, sub, vars, b2) {
                None => None,
                Some((sub_new, vars_new)) => exp_match(i1, &sub_new, &vars_new, i2)
            }
        },
        _ => None
    }
}

/// Elementwise fold of `exp_match` over two lists. The lists come from
/// predicates that were already checked to have the same arity, so a
/// length mismatch here is a caller bug.
pub fn exp_list_match(es1 : &[Expr], sub : &Subst, vars : &[Ident], es2 : &[Expr])
        -> Option<(Subst, Vec<Ident>)> {
    if es1.len() != es2.len() {
        errors::err_list_len(line!(), es1.len(), es2.len())
    }
    let mut acc = (sub.clone(), vars.to_vec());
    for (e1, e2) in es1.iter().zip(es2) {
        acc = exp_match(e1, &acc.0, &acc.1, e2)?;
    }
    Some(acc)
}

/// Matching of structured values, dispatching on the constructors.
/// Note that this does not model the analyser's occasional forgetting
/// of record fields beyond what `fsel_match` grants under `abs_struct`;
/// that gap is known and left as is.
pub fn strexp_match(se1 : &StrExp, sub : &Subst, vars : &[Ident], se2 : &StrExp)
        -> Option<(Subst, Vec<Ident>)> {
    match (se1, se2) {
        (StrExp::Atom { expr : e1, .. }, StrExp::Atom { expr : e2, .. }) => {
            exp_match(e1, sub, vars, e2)
        },
        (StrExp::Record { fields : fsel1, .. }, StrExp::Record { fields : fsel2, .. }) => {
            fsel_match(fsel1, sub, vars, fsel2)
        },
        (StrExp::Array { size : size1, cells : isel1, .. },
         StrExp::Array { size : size2, cells : isel2, .. }) => {
            match exp_match(size1, sub, vars, size2) {
                None => None,
                Some((sub_new, vars_new)) => isel_match(isel1, &sub_new, &vars_new, isel2)
            }
        },
        _ => None
    }
}

/// Positional merge of two sorted field lists. When `abs_struct` is
/// positive, fields present only on the concrete side are dropped
/// rather than failing the match. This can lose a great deal of
/// information; abstraction opts into it knowingly.
pub fn fsel_match(fsel1 : &[(Fieldname, StrExp)], sub : &Subst, vars : &[Ident],
                  fsel2 : &[(Fieldname, StrExp)]) -> Option<(Subst, Vec<Ident>)> {
    match (fsel1, fsel2) {
        ([], []) => Some((sub.clone(), vars.to_vec())),
        ([], _) => None,
        (_, []) => {
            match config::abs_struct() > 0 {
                true => Some((sub.clone(), vars.to_vec())),
                false => None
            }
        },
        ([(fld1, se1), fsel1_rest @ ..], [(fld2, se2), fsel2_rest @ ..]) => {
            match fld1.cmp(fld2) {
                std::cmp::Ordering::Equal => {
                    match strexp_match(se1, sub, vars, se2) {
                        None => None,
                        Some((sub_new, vars_new)) => {
                            fsel_match(fsel1_rest, &sub_new, &vars_new, fsel2_rest)
                        }
                    }
                },
                std::cmp::Ordering::Less if config::abs_struct() > 0 => {
                    fsel_match(fsel1_rest, sub, vars, fsel2)
                },
                _ => None
            }
        }
    }
}

/// Lock-step walk over two array-cell lists. Indices are never unified :
/// after applying the substitution, a pattern index must be ground (no
/// variable of `vars` left in it, on pain of a fatal error) and equal to
/// the concrete index syntactically.
pub fn isel_match(isel1 : &[(Expr, StrExp)], sub : &Subst, vars : &[Ident],
                  isel2 : &[(Expr, StrExp)]) -> Option<(Subst, Vec<Ident>)> {
    match (isel1, isel2) {
        ([], []) => Some((sub.clone(), vars.to_vec())),
        ([], _) | (_, []) => None,
        ([(idx1, se1), isel1_rest @ ..], [(idx2, se2), isel2_rest @ ..]) => {
            let idx2_inst = sub.apply(idx2);
            if vars.iter().any(|id| idx2_inst.ident_in(id)) {
                errors::err_isel_sanity(line!(), &idx2_inst)
            }
            if idx1 != &idx2_inst {
                return None
            }
            match strexp_match(se1, sub, vars, se2) {
                None => None,
                Some((sub_new, vars_new)) => isel_match(isel1_rest, &sub_new, &vars_new, isel2_rest)
            }
        }
    }
}

/// Resolves a pattern against a heap whose spatial part is empty : every
/// remaining entry must be allowed to collapse (flag on, possibly-empty
/// segment, start side already instantiated, and the two ends unifiable).
/// Points-to entries and non-empty segments can never be discharged by
/// nothing.
pub fn instantiate_to_emp(p : &Prop, condition : MatchCond, sub : Subst, vars : Vec<Ident>,
                          hpats : &[HPat]) -> Option<(Subst, Prop)> {
    let (hpat, hpats_rest) = match hpats.split_first() {
        None => {
            return match condition(p, &sub) {
                true => Some((sub, p.clone())),
                false => None
            }
        },
        Some(split) => split
    };
    if !hpat.flag {
        return None
    }
    match &hpat.hpred {
        Hpred::PointsTo {..}
        | Hpred::Lseg { kind : LsegKind::NE, .. }
        | Hpred::Dllseg { kind : LsegKind::NE, .. } => None,
        Hpred::Lseg { start, end, .. } => {
            let fully_instantiated = !vars.iter().any(|id| start.ident_in(id));
            if !fully_instantiated {
                return None
            }
            let start_inst = sub.apply(start);
            match exp_match(&start_inst, &sub, &vars, end) {
                None => None,
                Some((sub_new, vars_leftover)) => {
                    instantiate_to_emp(p, condition, sub_new, vars_leftover, hpats_rest)
                }
            }
        },
        Hpred::Dllseg { in_fwd, out_bwd, out_fwd, in_bwd, .. } => {
            let fully_instantiated =
                !vars.iter().any(|id| in_fwd.ident_in(id) || out_bwd.ident_in(id));
            if !fully_instantiated {
                return None
            }
            let in_fwd_inst = sub.apply(in_fwd);
            let out_bwd_inst = sub.apply(out_bwd);
            match exp_list_match(&[in_fwd_inst, out_bwd_inst], &sub, &vars,
                                 &[out_fwd.clone(), in_bwd.clone()]) {
                None => None,
                Some((sub_new, vars_leftover)) => {
                    instantiate_to_emp(p, condition, sub_new, vars_leftover, hpats_rest)
                }
            }
        }
    }
}
