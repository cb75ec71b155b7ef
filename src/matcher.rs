use hashbrown::HashSet;

use crate::ident::{ Ident, fresh_primed, fresh_primed_like };
use crate::expr::{ Expr, mk_var };
use crate::subst::{ Subst, sub_empty, sub_of_list };
use crate::hprop::{ Hpred, HPat, Hpara, HparaDll, LsegKind, Prop, prop_from_sigma,
                    mk_hpat, sigma_sub, hpara_instantiate, hpara_dll_instantiate };
use crate::iter::PropIter;
use crate::unify::{ exp_match, exp_list_match, strexp_match, instantiate_to_emp };
use crate::tracing::{ self, Step };
use crate::errors;

/// The side condition a caller may use to prune candidate matches : it
/// sees the leftover heap and the substitution about to be returned and
/// votes yes or no. It must be total; a condition that needs to fail
/// should just return false.
pub type MatchCond<'a> = &'a dyn Fn(&Prop, &Subst) -> bool;

/// Renames every leftover free variable to a fresh primed identifier
/// and joins that renaming into the substitution, so existentials the
/// pattern never pinned down cannot escape into the caller's result.
fn sub_extend_with_ren(sub : &Subst, vars_leftover : &[Ident]) -> Subst {
    let mut renaming = sub_empty();
    for id in vars_leftover {
        renaming = renaming.extend(id.clone(), mk_var(fresh_primed()));
    }
    sub.join(&renaming)
}

/// The root of the matcher. Tries the pattern's head predicate against
/// successive predicates of the heap, and once one fits, recursively
/// discharges the rest of the pattern against the rest of the heap.
/// Backtracking is Dijkstra-style and has exactly two branches : if
/// "consume the focus and continue" fails, "advance the iterator and
/// try again".
///
/// The interesting dispatch is on the pattern head. A points-to head can
/// only be discharged by a focused points-to. A segment head has two
/// extra ways out when its flag allows implication : collapse against
/// nothing (possibly-empty kinds only) or unfold one cell of its own
/// parameter body and keep matching. Unfolded conjuncts always carry the
/// implication flag themselves.
pub fn iter_match_with_impl(iter : &PropIter, condition : MatchCond, sub : &Subst,
                            vars : &[Ident], hpat : &HPat, hpats : &[HPat])
        -> Option<(Subst, Prop)> {
    // deep patterns over deep heaps recurse hard; grow the stack instead
    // of overflowing it
    stacker::maybe_grow(64 * 1024, 1024 * 1024, || {
        iter_match_core(iter, condition, sub, vars, hpat, hpats)
    })
}

fn iter_match_core(iter : &PropIter, condition : MatchCond, sub : &Subst,
                   vars : &[Ident], hpat : &HPat, hpats : &[HPat])
        -> Option<(Subst, Prop)> {
    let do_next = |iter_cur : &PropIter| {
        match iter_cur.next() {
            None => None,
            Some(iter_next) => {
                tracing::record(Step::Backtrack);
                iter_match_with_impl(&iter_next, condition, sub, vars, hpat, hpats)
            }
        }
    };
    let do_empty_hpats = |iter_cur : &PropIter| {
        let (sub_new, vars_leftover) = iter_cur.state();
        let sub_res = sub_extend_with_ren(sub_new, vars_leftover);
        let p_leftover = iter_cur.remove_curr_then_to_prop();
        tracing::record(Step::Commit { leftover : p_leftover.sigma.len() });
        match condition(&p_leftover, &sub_res) {
            true => Some((sub_res, p_leftover)),
            false => None
        }
    };
    let do_nonempty_hpats = |iter_cur : &PropIter| {
        let (sub_new, vars_leftover) = iter_cur.state();
        let (hpat_next, hpats_rest) = match hpats.split_first() {
            None => unreachable!("do_nonempty_hpats on an empty pattern tail"),
            Some(split) => split
        };
        let p_rest = iter_cur.remove_curr_then_to_prop();
        prop_match_with_impl_sub(&p_rest, condition, sub_new.clone(), vars_leftover.clone(),
                                 hpat_next, hpats_rest)
    };

    match &hpat.hpred {
        Hpred::PointsTo { root : lexp2, sval : strexp2, typ : te2 } => {
            let filter = |hpred1 : &Hpred| {
                match hpred1 {
                    // no unification on the type expression; it must
                    // already be the same
                    Hpred::PointsTo { root : lexp1, sval : strexp1, typ : te1 } if te1 == te2 => {
                        match exp_match(lexp1, sub, vars, lexp2) {
                            None => None,
                            Some((sub_new, vars_leftover)) => {
                                strexp_match(strexp1, &sub_new, &vars_leftover, strexp2)
                            }
                        }
                    },
                    _ => None
                }
            };
            match (iter.find(&filter), hpats.is_empty()) {
                (None, _) => None,
                (Some(iter_cur), true) => do_empty_hpats(&iter_cur),
                (Some(iter_cur), false) => {
                    do_nonempty_hpats(&iter_cur).or_else(|| do_next(&iter_cur))
                }
            }
        },

        Hpred::Lseg { kind : k2, para : para2, start : e_start2, end : e_end2,
                      shared : es_shared2 } => {
            let filter = |hpred1 : &Hpred| {
                match hpred1 {
                    Hpred::Lseg { kind : k1, para : para1, start : e_start1, end : e_end1,
                                  shared : es_shared1 } => {
                        if !(k1.subsumed_by(*k2) && hpara_match(true, para1, para2)) {
                            return None
                        }
                        let mut es1 = vec![e_start1.clone(), e_end1.clone()];
                        es1.extend(es_shared1.iter().cloned());
                        let mut es2 = vec![e_start2.clone(), e_end2.clone()];
                        es2.extend(es_shared2.iter().cloned());
                        exp_list_match(&es1, sub, vars, &es2)
                    },
                    _ => None
                }
            };
            // the branch where the pattern's segment collapses to the
            // empty list; its start must already be determined
            let do_emp_lseg = || {
                let fully_instantiated_start2 = !vars.iter().any(|id| e_start2.ident_in(id));
                if !fully_instantiated_start2 {
                    return None
                }
                let e_start2_inst = sub.apply(e_start2);
                match (exp_match(&e_start2_inst, sub, vars, e_end2), hpats.split_first()) {
                    (None, _) => None,
                    (Some((sub_new, vars_leftover)), None) => {
                        let sub_res = sub_extend_with_ren(&sub_new, &vars_leftover);
                        let p_leftover = iter.to_prop();
                        tracing::record(Step::EmptyCollapse);
                        match condition(&p_leftover, &sub_res) {
                            true => Some((sub_res, p_leftover)),
                            false => None
                        }
                    },
                    (Some((sub_new, vars_leftover)), Some((hpat_next, hpats_rest))) => {
                        tracing::record(Step::EmptyCollapse);
                        let p = iter.to_prop();
                        prop_match_with_impl_sub(&p, condition, sub_new, vars_leftover,
                                                 hpat_next, hpats_rest)
                    }
                }
            };
            let do_para_lseg = || {
                let (para2_exist_vars, para2_inst) =
                    hpara_instantiate(para2, e_start2, e_end2, es_shared2);
                tracing::record(Step::Unfold { fresh_evars : para2_exist_vars.len() });
                // unfolded conjuncts always allow implication-style
                // discharge, whatever the head's flag said
                let mut para2_pats : Vec<HPat> =
                    para2_inst.into_iter().map(|hpred| mk_hpat(hpred, true)).collect();
                if para2_pats.is_empty() {
                    errors::err_empty_para_body(line!())
                }
                let para2_hpat = para2_pats.remove(0);
                let mut new_hpats = para2_pats;
                new_hpats.extend(hpats.iter().cloned());
                let mut vars_leftover = vars.to_vec();
                vars_leftover.extend(para2_exist_vars.iter().cloned());
                match iter_match_with_impl(iter, condition, sub, &vars_leftover,
                                           &para2_hpat, &new_hpats) {
                    None => None,
                    Some((sub_res, p_leftover)) => {
                        // the body's own existentials stay local
                        let sub_res = sub_res.filter(|id| !para2_exist_vars.contains(id));
                        Some((sub_res, p_leftover))
                    }
                }
            };
            match (iter.find(&filter), hpats.is_empty()) {
                (None, _) => {
                    if !hpat.flag {
                        None
                    } else if *k2 == LsegKind::NE {
                        // non-empty segments cannot collapse to nothing
                        do_para_lseg()
                    } else {
                        do_emp_lseg().or_else(do_para_lseg)
                    }
                },
                (Some(iter_cur), true) => do_empty_hpats(&iter_cur),
                (Some(iter_cur), false) => {
                    do_nonempty_hpats(&iter_cur).or_else(|| do_next(&iter_cur))
                }
            }
        },

        Hpred::Dllseg { kind : k2, para : para2, in_fwd : in_fwd2, out_bwd : out_bwd2,
                        out_fwd : out_fwd2, in_bwd : in_bwd2, shared : es_shared2 } => {
            let filter = |hpred1 : &Hpred| {
                match hpred1 {
                    Hpred::Dllseg { kind : k1, para : para1, in_fwd : in_fwd1,
                                    out_bwd : out_bwd1, out_fwd : out_fwd1, in_bwd : in_bwd1,
                                    shared : es_shared1 } => {
                        if !(k1.subsumed_by(*k2) && hpara_dll_match(true, para1, para2)) {
                            return None
                        }
                        let mut es1 = vec![in_fwd1.clone(), out_bwd1.clone(),
                                           out_fwd1.clone(), in_bwd1.clone()];
                        es1.extend(es_shared1.iter().cloned());
                        let mut es2 = vec![in_fwd2.clone(), out_bwd2.clone(),
                                           out_fwd2.clone(), in_bwd2.clone()];
                        es2.extend(es_shared2.iter().cloned());
                        exp_list_match(&es1, sub, vars, &es2)
                    },
                    _ => None
                }
            };
            let do_emp_dllseg = || {
                let fully_instantiated =
                    !vars.iter().any(|id| in_fwd2.ident_in(id) || out_bwd2.ident_in(id));
                if !fully_instantiated {
                    return None
                }
                let in_fwd2_inst = sub.apply(in_fwd2);
                let out_bwd2_inst = sub.apply(out_bwd2);
                let ends_match = exp_list_match(&[in_fwd2_inst, out_bwd2_inst], sub, vars,
                                                &[out_fwd2.clone(), in_bwd2.clone()]);
                match (ends_match, hpats.split_first()) {
                    (None, _) => None,
                    (Some((sub_new, vars_leftover)), None) => {
                        let sub_res = sub_extend_with_ren(&sub_new, &vars_leftover);
                        let p_leftover = iter.to_prop();
                        tracing::record(Step::EmptyCollapse);
                        match condition(&p_leftover, &sub_res) {
                            true => Some((sub_res, p_leftover)),
                            false => None
                        }
                    },
                    (Some((sub_new, vars_leftover)), Some((hpat_next, hpats_rest))) => {
                        tracing::record(Step::EmptyCollapse);
                        let p = iter.to_prop();
                        prop_match_with_impl_sub(&p, condition, sub_new, vars_leftover,
                                                 hpat_next, hpats_rest)
                    }
                }
            };
            let do_para_dllseg = || {
                let fully_instantiated_in_fwd2 = !vars.iter().any(|id| in_fwd2.ident_in(id));
                if !fully_instantiated_in_fwd2 {
                    return None
                }
                let in_fwd2_inst = sub.apply(in_fwd2);
                match exp_match(&in_fwd2_inst, sub, vars, in_bwd2) {
                    None => None,
                    Some((sub_new, vars_leftover)) => {
                        let (para2_exist_vars, para2_inst) =
                            hpara_dll_instantiate(para2, in_fwd2, out_bwd2, out_fwd2, es_shared2);
                        tracing::record(Step::Unfold { fresh_evars : para2_exist_vars.len() });
                        let mut para2_pats : Vec<HPat> =
                            para2_inst.into_iter().map(|hpred| mk_hpat(hpred, true)).collect();
                        if para2_pats.is_empty() {
                            errors::err_empty_para_body(line!())
                        }
                        let para2_hpat = para2_pats.remove(0);
                        let mut new_hpats = para2_pats;
                        new_hpats.extend(hpats.iter().cloned());
                        let mut vars_leftover2 = vars_leftover;
                        vars_leftover2.extend(para2_exist_vars.iter().cloned());
                        match iter_match_with_impl(iter, condition, &sub_new, &vars_leftover2,
                                                   &para2_hpat, &new_hpats) {
                            None => None,
                            Some((sub_res, p_leftover)) => {
                                let sub_res = sub_res.filter(|id| !para2_exist_vars.contains(id));
                                Some((sub_res, p_leftover))
                            }
                        }
                    }
                }
            };
            match (iter.find(&filter), hpats.is_empty()) {
                (None, _) => {
                    if !hpat.flag {
                        None
                    } else if *k2 == LsegKind::NE {
                        do_para_dllseg()
                    } else {
                        do_emp_dllseg().or_else(do_para_dllseg)
                    }
                },
                (Some(iter_cur), true) => do_empty_hpats(&iter_cur),
                (Some(iter_cur), false) => {
                    do_nonempty_hpats(&iter_cur).or_else(|| do_next(&iter_cur))
                }
            }
        }
    }
}

/// Internal entry that threads a starting substitution. A heap with no
/// spatial part short-circuits into the empty-heap instantiator.
pub(crate) fn prop_match_with_impl_sub(p : &Prop, condition : MatchCond, sub : Subst,
                                       vars : Vec<Ident>, hpat : &HPat, hpats : &[HPat])
        -> Option<(Subst, Prop)> {
    match PropIter::create(p) {
        None => {
            let mut pats = Vec::with_capacity(1 + hpats.len());
            pats.push(hpat.clone());
            pats.extend(hpats.iter().cloned());
            instantiate_to_emp(p, condition, sub, vars, &pats)
        },
        Some(iter) => iter_match_with_impl(&iter, condition, &sub, &vars, hpat, hpats)
    }
}

/// Decides whether the heap entails an instance of the pattern
/// `hpat :: hpats` with free variables `vars`. On success the returned
/// substitution is closed over `vars` and the prop is the part of the
/// heap the pattern did not consume. Duplicates in `vars` are a caller
/// bug and fatal.
pub fn prop_match_with_impl(p : &Prop, condition : MatchCond, vars : Vec<Ident>,
                            hpat : &HPat, hpats : &[HPat]) -> Option<(Subst, Prop)> {
    let mut seen = HashSet::with_capacity(vars.len());
    for id in vars.iter() {
        if !seen.insert(id.clone()) {
            errors::err_dup_fv(line!(), id)
        }
    }
    prop_match_with_impl_sub(p, condition, sub_empty(), vars, hpat, hpats)
}

/// The common core deciding whether two inductive-predicate bodies are
/// α-equivalent. Renames `ids2` to `ids1` pointwise and the existentials
/// to fresh variables, then hands the two bodies to ordinary matching.
/// Equivalence is only granted when the leftover heap comes back empty.
fn hpara_common_match_with_impl(impl_ok : bool, ids1 : &[Ident], sigma1 : &[Hpred],
                                eids2 : &[Ident], ids2 : &[Ident], sigma2 : &[Hpred]) -> bool {
    if ids1.len() != ids2.len() {
        return false
    }
    let mut bindings : Vec<(Ident, Expr)> = ids2.iter()
        .zip(ids1)
        .map(|(id2, id1)| (id2.clone(), mk_var(id1.clone())))
        .collect();
    let eids_fresh : Vec<Ident> = eids2.iter().map(fresh_primed_like).collect();
    bindings.extend(eids2.iter()
        .zip(eids_fresh.iter())
        .map(|(id2, id_fresh)| (id2.clone(), mk_var(id_fresh.clone()))));
    let renaming = sub_of_list(bindings);
    let sigma2_ren = sigma_sub(&renaming, sigma2);

    let mut pats : Vec<HPat> = sigma2_ren.into_iter()
                                         .map(|hpred| mk_hpat(hpred, impl_ok))
                                         .collect();
    if pats.is_empty() {
        errors::err_empty_para_body(line!())
    }
    let hpat2 = pats.remove(0);
    let p1 = prop_from_sigma(sigma1.to_vec());
    let trivial_condition = |_ : &Prop, _ : &Subst| true;
    match prop_match_with_impl_sub(&p1, &trivial_condition, sub_empty(), eids_fresh,
                                   &hpat2, &pats) {
        None => false,
        Some((_, p1_leftover)) => p1_leftover.is_emp()
    }
}

/// α-equivalence of two singly-linked parameters, up to renaming of the
/// root, next, and shared formals and refreshing of the existentials.
/// With `impl_ok` the bodies may also relate by implication.
pub fn hpara_match(impl_ok : bool, para1 : &Hpara, para2 : &Hpara) -> bool {
    let mut ids1 = vec![para1.root.clone(), para1.next.clone()];
    ids1.extend(para1.svars.iter().cloned());
    let mut ids2 = vec![para2.root.clone(), para2.next.clone()];
    ids2.extend(para2.svars.iter().cloned());
    hpara_common_match_with_impl(impl_ok, &ids1, &para1.body, &para2.evars, &ids2, &para2.body)
}

/// Doubly-linked analogue of `hpara_match`.
pub fn hpara_dll_match(impl_ok : bool, para1 : &HparaDll, para2 : &HparaDll) -> bool {
    let mut ids1 = vec![para1.cell.clone(), para1.blink.clone(), para1.flink.clone()];
    ids1.extend(para1.svars.iter().cloned());
    let mut ids2 = vec![para2.cell.clone(), para2.blink.clone(), para2.flink.clone()];
    ids2.extend(para2.svars.iter().cloned());
    hpara_common_match_with_impl(impl_ok, &ids1, &para1.body, &para2.evars, &ids2, &para2.body)
}

#[cfg(test)]
mod matcher_tests {
    use super::*;
    use crate::ident::{ mk_plain, mk_primed, mk_field, mk_typ };
    use crate::expr::{ mk_var, mk_int, mk_sizeof };
    use crate::hprop::{ mk_pointsto, mk_lseg, mk_atom, mk_record };
    use crate::hprop::hprop_test_support::{ node_typ_exp, simple_para, simple_para_dll };
    use crate::hprop::mk_dllseg;

    fn always(_ : &Prop, _ : &Subst) -> bool {
        true
    }

    fn int_cell(name : &str, v : i64) -> Hpred {
        mk_pointsto(mk_var(mk_plain(name, 0)), mk_atom(mk_int(v)), mk_sizeof(mk_typ("int")))
    }

    #[test]
    fn points_to_binds_the_value() {
        let x = mk_var(mk_plain("x", 0));
        let v = mk_primed("v", 0);
        let tau = mk_sizeof(mk_typ("int"));
        let p = prop_from_sigma(vec![mk_pointsto(x.clone(), mk_atom(mk_int(7)), tau.clone())]);
        let pat = mk_hpat(mk_pointsto(x, mk_atom(mk_var(v.clone())), tau), false);
        let (sub, leftover) = prop_match_with_impl(&p, &always, vec![v.clone()], &pat, &[]).unwrap();
        assert_eq!(sub.lookup(&v), Some(&mk_int(7)));
        assert!(leftover.is_emp());
    }

    #[test]
    fn type_expressions_never_unify() {
        let x = mk_var(mk_plain("x", 0));
        let p = prop_from_sigma(vec![
            mk_pointsto(x.clone(), mk_atom(mk_int(7)), mk_sizeof(mk_typ("int")))]);
        let pat = mk_hpat(
            mk_pointsto(x, mk_atom(mk_int(7)), mk_sizeof(mk_typ("long"))), false);
        assert!(prop_match_with_impl(&p, &always, vec![], &pat, &[]).is_none());
    }

    #[test]
    fn kind_subsumption_is_respected() {
        let a = mk_var(mk_plain("a", 0));
        let b = mk_var(mk_plain("b", 0));
        // a possibly-empty focus never discharges a non-empty pattern
        let p_pe = prop_from_sigma(vec![
            mk_lseg(LsegKind::PE, simple_para(), a.clone(), b.clone(), vec![])]);
        let pat_ne = mk_hpat(
            mk_lseg(LsegKind::NE, simple_para(), a.clone(), b.clone(), vec![]), true);
        assert!(prop_match_with_impl(&p_pe, &always, vec![], &pat_ne, &[]).is_none());
        // a non-empty focus discharges a possibly-empty pattern
        let p_ne = prop_from_sigma(vec![
            mk_lseg(LsegKind::NE, simple_para(), a.clone(), b.clone(), vec![])]);
        let pat_pe = mk_hpat(
            mk_lseg(LsegKind::PE, simple_para(), a, b, vec![]), true);
        let (sub, leftover) = prop_match_with_impl(&p_ne, &always, vec![], &pat_pe, &[]).unwrap();
        assert!(sub.is_empty());
        assert!(leftover.is_emp());
    }

    #[test]
    fn pattern_segment_unfolds_into_a_cell() {
        // heap : x |-> { next: y } ; pattern : lseg_ne(x, y), by unfolding
        let x = mk_var(mk_plain("x", 0));
        let y = mk_var(mk_plain("y", 0));
        let cell = mk_pointsto(
            x.clone(),
            mk_record(vec![(mk_field("next"), mk_atom(y.clone()))]),
            node_typ_exp());
        let p = prop_from_sigma(vec![cell]);
        let pat = mk_hpat(mk_lseg(LsegKind::NE, simple_para(), x, y, vec![]), true);
        let (sub, leftover) = prop_match_with_impl(&p, &always, vec![], &pat, &[]).unwrap();
        assert!(sub.is_empty());
        assert!(leftover.is_emp());
    }

    #[test]
    fn unfold_existentials_stay_local() {
        // the parameter stores its next pointer in an existential, so
        // unfolding binds a fresh variable; that binding must not leak
        // into the caller's substitution
        let root = mk_primed("root", 2000);
        let next = mk_primed("next", 2001);
        let stored = mk_primed("stored", 2002);
        let para = Hpara {
            root : root.clone(),
            next : next.clone(),
            svars : vec![],
            evars : vec![stored.clone()],
            body : vec![mk_pointsto(
                mk_var(root),
                mk_record(vec![(mk_field("next"), mk_atom(mk_var(stored)))]),
                node_typ_exp())],
        };
        let x = mk_var(mk_plain("x", 0));
        let y = mk_var(mk_plain("y", 0));
        let z = mk_var(mk_plain("z", 0));
        let cell = mk_pointsto(
            x.clone(),
            mk_record(vec![(mk_field("next"), mk_atom(z))]),
            node_typ_exp());
        let p = prop_from_sigma(vec![cell]);
        let pat = mk_hpat(mk_lseg(LsegKind::NE, para, x, y, vec![]), true);
        let (sub, leftover) = prop_match_with_impl(&p, &always, vec![], &pat, &[]).unwrap();
        assert!(sub.is_empty());
        assert!(leftover.is_emp());
    }

    #[test]
    fn unfolding_needs_the_implication_flag() {
        let x = mk_var(mk_plain("x", 0));
        let y = mk_var(mk_plain("y", 0));
        let cell = mk_pointsto(
            x.clone(),
            mk_record(vec![(mk_field("next"), mk_atom(y.clone()))]),
            node_typ_exp());
        let p = prop_from_sigma(vec![cell]);
        let pat = mk_hpat(mk_lseg(LsegKind::NE, simple_para(), x, y, vec![]), false);
        assert!(prop_match_with_impl(&p, &always, vec![], &pat, &[]).is_none());
    }

    #[test]
    fn empty_heap_collapses_a_pe_pattern() {
        // the whole pattern dissolves against the empty heap
        let a = mk_var(mk_plain("a", 0));
        let p = prop_from_sigma(vec![]);
        let pat = mk_hpat(
            mk_lseg(LsegKind::PE, simple_para(), a.clone(), a, vec![]), true);
        let (sub, leftover) = prop_match_with_impl(&p, &always, vec![], &pat, &[]).unwrap();
        assert!(sub.is_empty());
        assert!(leftover.is_emp());
    }

    #[test]
    fn backtracking_skips_a_first_focus_that_strands_the_tail() {
        // two candidate cells for the head pattern; only the second
        // leaves the heap that the tail pattern needs
        let v = mk_primed("v", 0);
        let tau = mk_sizeof(mk_typ("int"));
        let p = prop_from_sigma(vec![int_cell("a", 1), int_cell("b", 1)]);
        let head = mk_hpat(
            mk_pointsto(mk_var(v.clone()), mk_atom(mk_int(1)), tau.clone()), false);
        let tail = mk_hpat(int_cell("a", 1), false);
        let (sub, leftover) =
            prop_match_with_impl(&p, &always, vec![v.clone()], &head, &[tail]).unwrap();
        assert_eq!(sub.lookup(&v), Some(&mk_var(mk_plain("b", 0))));
        assert!(leftover.is_emp());
    }

    #[test]
    fn side_condition_can_veto_a_match() {
        let x = mk_var(mk_plain("x", 0));
        let tau = mk_sizeof(mk_typ("int"));
        let p = prop_from_sigma(vec![mk_pointsto(x.clone(), mk_atom(mk_int(7)), tau.clone())]);
        let pat = mk_hpat(mk_pointsto(x, mk_atom(mk_int(7)), tau), false);
        let never = |_ : &Prop, _ : &Subst| false;
        assert!(prop_match_with_impl(&p, &never, vec![], &pat, &[]).is_none());
    }

    #[test]
    fn leftover_heap_is_what_the_pattern_skipped() {
        let p = prop_from_sigma(vec![int_cell("a", 1), int_cell("b", 2)]);
        let pat = mk_hpat(int_cell("b", 2), false);
        let (sub, leftover) = prop_match_with_impl(&p, &always, vec![], &pat, &[]).unwrap();
        assert!(sub.is_empty());
        assert_eq!(leftover.sigma, vec![int_cell("a", 1)]);
    }

    #[test]
    fn leftover_free_variables_are_renamed_away() {
        // the pattern binds v but never uses w; w must come back bound
        // to something fresh rather than dangling in the result
        let x = mk_var(mk_plain("x", 0));
        let v = mk_primed("v", 0);
        let w = mk_primed("w", 1);
        let tau = mk_sizeof(mk_typ("int"));
        let p = prop_from_sigma(vec![mk_pointsto(x.clone(), mk_atom(mk_int(7)), tau.clone())]);
        let pat = mk_hpat(mk_pointsto(x, mk_atom(mk_var(v.clone())), tau), false);
        let (sub, _) =
            prop_match_with_impl(&p, &always, vec![v.clone(), w.clone()], &pat, &[]).unwrap();
        assert_eq!(sub.lookup(&v), Some(&mk_int(7)));
        match sub.lookup(&w) {
            Some(e) => assert!(e.is_var() && e.has_primed()),
            None => panic!("leftover variable escaped the result")
        }
    }

    #[test]
    fn hpara_match_is_alpha_equivalence() {
        // structurally the same cell shape built from different stamps
        let mk = |base : u64| {
            let root = mk_primed("r", base);
            let next = mk_primed("n", base + 1);
            let body = vec![mk_pointsto(
                mk_var(root.clone()),
                mk_record(vec![(mk_field("next"), mk_atom(mk_var(next.clone())))]),
                node_typ_exp())];
            Hpara { root, next, svars : vec![], evars : vec![], body }
        };
        assert!(hpara_match(false, &mk(0), &mk(100)));
        assert!(hpara_match(true, &mk(0), &mk(100)));
    }

    #[test]
    fn dll_pattern_matches_equal_focus() {
        let para = simple_para_dll();
        let es : Vec<Expr> = ["i", "p", "q", "j"].iter()
            .map(|s| mk_var(mk_plain(s, 0)))
            .collect();
        let seg = mk_dllseg(LsegKind::NE, para.clone(),
                            es[0].clone(), es[1].clone(), es[2].clone(), es[3].clone(), vec![]);
        let p = prop_from_sigma(vec![seg]);
        let pat = mk_hpat(
            mk_dllseg(LsegKind::PE, para,
                      es[0].clone(), es[1].clone(), es[2].clone(), es[3].clone(), vec![]),
            true);
        let (sub, leftover) = prop_match_with_impl(&p, &always, vec![], &pat, &[]).unwrap();
        assert!(sub.is_empty());
        assert!(leftover.is_emp());
    }

    #[test]
    fn dll_pattern_unfolds_into_a_cell() {
        // heap : c |-> { blink: p, flink: q } matches dllseg_ne(c, p, q, c)
        let c = mk_var(mk_plain("c", 0));
        let pp = mk_var(mk_plain("p", 0));
        let q = mk_var(mk_plain("q", 0));
        let cell = mk_pointsto(
            c.clone(),
            mk_record(vec![
                (mk_field("blink"), mk_atom(pp.clone())),
                (mk_field("flink"), mk_atom(q.clone()))]),
            node_typ_exp());
        let p = prop_from_sigma(vec![cell]);
        let pat = mk_hpat(
            mk_dllseg(LsegKind::NE, simple_para_dll(), c.clone(), pp, q, c, vec![]),
            true);
        let (sub, leftover) = prop_match_with_impl(&p, &always, vec![], &pat, &[]).unwrap();
        assert!(sub.is_empty());
        assert!(leftover.is_emp());
    }
}
