use std::collections::VecDeque;

use crate::expr::Expr;
use crate::hprop::{ Hpred, Hpara, HparaDll, StrExp, sigma_remove_hpred };
use crate::matcher::{ hpara_match, hpara_dll_match };

/// How tolerant record comparison is while computing an isomorphism.
/// `Exact` requires the two field sets to coincide; the forgetting modes
/// allow the named side to carry extra fields, which are then simply not
/// part of the isomorphism.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldMode {
    Exact,
    LFieldForget,
    RFieldForget,
}

/// Bidirectional α-equivalence of two list parameters; used to decide
/// whether two segments can be treated as the same shape.
pub fn hpara_iso(para1 : &Hpara, para2 : &Hpara) -> bool {
    hpara_match(false, para1, para2) && hpara_match(false, para2, para1)
}

pub fn hpara_dll_iso(para1 : &HparaDll, para2 : &HparaDll) -> bool {
    hpara_dll_match(false, para1, para2) && hpara_dll_match(false, para2, para1)
}

/// A correspondence : the bijection-in-progress on expressions relating
/// two sub-heaps.
pub type Corres = Vec<(Expr, Expr)>;

/// Whether the pair is already accounted for : either it is present in
/// the correspondence, or neither side appears anywhere and the two
/// expressions are syntactically equal.
fn corres_related(corres : &Corres, e1 : &Expr, e2 : &Expr) -> bool {
    let mut hits = corres.iter().filter(|(e1_c, e2_c)| e1_c == e1 || e2_c == e2);
    match hits.next() {
        None => e1 == e2,
        Some((e1_c, e2_c)) => e1_c == e1 && e2_c == e2 && hits.next().is_none()
    }
}

/// Whether the pair may be added : neither side is spoken for yet, and
/// the two expressions differ (equal ones are handled by relatedness).
fn corres_extensible(corres : &Corres, e1 : &Expr, e2 : &Expr) -> bool {
    let spoken_for = corres.iter().any(|(e1_c, e2_c)| e1_c == e1 || e2_c == e2);
    !spoken_for && e1 != e2
}

/// Adds the pair at the front if it is not already present. `None` when
/// either side is committed to a different partner.
fn corres_extend_front(e1 : &Expr, e2 : &Expr, mut corres : Corres) -> Option<Corres> {
    // None : no hit yet. Some(true) : exactly the pair itself.
    // Some(false) : one side committed elsewhere.
    let mut seen : Option<bool> = None;
    for (e1_c, e2_c) in corres.iter() {
        if e1_c == e1 || e2_c == e2 {
            match seen {
                None => seen = Some(e1_c == e1 && e2_c == e2),
                Some(_) => return None
            }
        }
    }
    match seen {
        None => {
            corres.insert(0, (e1.clone(), e2.clone()));
            Some(corres)
        },
        Some(true) => Some(corres),
        Some(false) => None
    }
}

/// Walks two structured values in step and emits the pairs of atoms that
/// must correspond for the values to be isomorphic. Records are merged
/// positionally under `mode`; arrays must agree on size and cardinality.
pub(crate) fn generate_todos_from_strexp(mode : FieldMode, todos : Vec<(Expr, Expr)>,
                                         se1 : &StrExp, se2 : &StrExp)
        -> Option<Vec<(Expr, Expr)>> {
    match (se1, se2) {
        (StrExp::Atom { expr : e1, .. }, StrExp::Atom { expr : e2, .. }) => {
            let mut new_todos = todos;
            new_todos.push((e1.clone(), e2.clone()));
            Some(new_todos)
        },
        (StrExp::Record { fields : fsel1, .. }, StrExp::Record { fields : fsel2, .. }) => {
            generate_todos_from_fsel(mode, todos, fsel1, fsel2)
        },
        (StrExp::Array { size : size1, cells : isel1, .. },
         StrExp::Array { size : size2, cells : isel2, .. }) => {
            if size1 != size2 {
                return None
            }
            generate_todos_from_isel(todos, isel1, isel2)
        },
        _ => None
    }
}

fn generate_todos_from_fsel(mode : FieldMode, todos : Vec<(Expr, Expr)>,
                            fsel1 : &[(crate::ident::Fieldname, StrExp)],
                            fsel2 : &[(crate::ident::Fieldname, StrExp)])
        -> Option<Vec<(Expr, Expr)>> {
    match (fsel1, fsel2) {
        ([], []) => Some(todos),
        ([], _) => {
            match mode == FieldMode::RFieldForget {
                true => Some(todos),
                false => None
            }
        },
        (_, []) => {
            match mode == FieldMode::LFieldForget {
                true => Some(todos),
                false => None
            }
        },
        ([(fld1, se1), fsel1_rest @ ..], [(fld2, se2), fsel2_rest @ ..]) => {
            match fld1.cmp(fld2) {
                std::cmp::Ordering::Equal => {
                    let todos_new = generate_todos_from_strexp(mode, todos, se1, se2)?;
                    generate_todos_from_fsel(mode, todos_new, fsel1_rest, fsel2_rest)
                },
                std::cmp::Ordering::Less if mode == FieldMode::LFieldForget => {
                    generate_todos_from_fsel(mode, todos, fsel1_rest, fsel2)
                },
                std::cmp::Ordering::Greater if mode == FieldMode::RFieldForget => {
                    generate_todos_from_fsel(mode, todos, fsel1, fsel2_rest)
                },
                _ => None
            }
        }
    }
}

fn generate_todos_from_isel(todos : Vec<(Expr, Expr)>,
                            isel1 : &[(Expr, StrExp)], isel2 : &[(Expr, StrExp)])
        -> Option<Vec<(Expr, Expr)>> {
    match (isel1, isel2) {
        ([], []) => Some(todos),
        ([(idx1, se1), isel1_rest @ ..], [(idx2, se2), isel2_rest @ ..]) => {
            if idx1 != idx2 {
                return None
            }
            let todos_new = generate_todos_from_strexp(FieldMode::Exact, todos, se1, se2)?;
            generate_todos_from_isel(todos_new, isel1_rest, isel2_rest)
        },
        _ => None
    }
}

/// The engine behind both isomorphism finders. Processes required
/// correspondences one at a time; a pair that is neither already related
/// nor freshly extensible sinks the whole search. When both sides carry
/// a rooted predicate the predicates must agree in shape, and their
/// sub-expressions become new obligations. Termination comes from the
/// remaining heap handed to `update` only ever shrinking.
fn generic_find_partial_iso<T>(
        mode : FieldMode,
        update : &mut dyn FnMut(&Expr, &Expr, T) -> (Option<Hpred>, Option<Hpred>, T),
        corres_init : Corres,
        todos_init : Vec<(Expr, Expr)>,
        sigma_todo_init : T)
        -> Option<(Corres, Vec<Hpred>, Vec<Hpred>, T)> {
    let mut corres = corres_init;
    let mut sigma1 : Vec<Hpred> = Vec::new();
    let mut sigma2 : Vec<Hpred> = Vec::new();
    let mut todos : VecDeque<(Expr, Expr)> = todos_init.into_iter().collect();
    let mut sigma_todo = sigma_todo_init;

    let commit = |e1 : &Expr, e2 : &Expr, corres : Corres| {
        match corres_extend_front(e1, e2, corres) {
            Some(new_corres) => new_corres,
            None => unreachable!("correspondence rejected a pair it just accepted")
        }
    };

    while let Some((e1, e2)) = todos.pop_front() {
        if corres_related(&corres, &e1, &e2) {
            corres = commit(&e1, &e2, corres);
            continue
        }
        if !corres_extensible(&corres, &e1, &e2) {
            return None
        }
        let (hpredo1, hpredo2, sigma_todo_new) = update(&e1, &e2, sigma_todo);
        sigma_todo = sigma_todo_new;
        match (hpredo1, hpredo2) {
            (None, None) => {
                corres = commit(&e1, &e2, corres);
            },
            (None, Some(_)) | (Some(_), None) => return None,
            (Some(Hpred::PointsTo { sval : se1, typ : te1, root : root1 }),
             Some(Hpred::PointsTo { sval : se2, typ : te2, root : root2 })) => {
                if te1 != te2 {
                    return None
                }
                let todos_new = generate_todos_from_strexp(mode, Vec::new(), &se1, &se2)?;
                corres = commit(&e1, &e2, corres);
                sigma1.push(Hpred::PointsTo { root : root1, sval : se1, typ : te1 });
                sigma2.push(Hpred::PointsTo { root : root2, sval : se2, typ : te2 });
                for pair in todos_new.into_iter().rev() {
                    todos.push_front(pair);
                }
            },
            (Some(Hpred::Lseg { kind : k1, para : para1, start : start1, end : end1,
                                shared : shared1 }),
             Some(Hpred::Lseg { kind : k2, para : para2, start : start2, end : end2,
                                shared : shared2 })) => {
                if k1 != k2 || !hpara_iso(&para1, &para2) || shared1.len() != shared2.len() {
                    return None
                }
                corres = commit(&e1, &e2, corres);
                let mut todos_new = vec![(start1.clone(), start2.clone()),
                                         (end1.clone(), end2.clone())];
                todos_new.extend(shared1.iter().cloned().zip(shared2.iter().cloned()));
                sigma1.push(Hpred::Lseg { kind : k1, para : para1, start : start1,
                                          end : end1, shared : shared1 });
                sigma2.push(Hpred::Lseg { kind : k2, para : para2, start : start2,
                                          end : end2, shared : shared2 });
                for pair in todos_new.into_iter().rev() {
                    todos.push_front(pair);
                }
            },
            (Some(Hpred::Dllseg { kind : k1, para : para1, in_fwd : in_fwd1,
                                  out_bwd : out_bwd1, out_fwd : out_fwd1, in_bwd : in_bwd1,
                                  shared : shared1 }),
             Some(Hpred::Dllseg { kind : k2, para : para2, in_fwd : in_fwd2,
                                  out_bwd : out_bwd2, out_fwd : out_fwd2, in_bwd : in_bwd2,
                                  shared : shared2 })) => {
                if k1 != k2 || !hpara_dll_iso(&para1, &para2) || shared1.len() != shared2.len() {
                    return None
                }
                corres = commit(&e1, &e2, corres);
                let mut todos_new = vec![(in_fwd1.clone(), in_fwd2.clone()),
                                         (out_bwd1.clone(), out_bwd2.clone()),
                                         (out_fwd1.clone(), out_fwd2.clone()),
                                         (in_bwd1.clone(), in_bwd2.clone())];
                todos_new.extend(shared1.iter().cloned().zip(shared2.iter().cloned()));
                sigma1.push(Hpred::Dllseg { kind : k1, para : para1, in_fwd : in_fwd1,
                                            out_bwd : out_bwd1, out_fwd : out_fwd1,
                                            in_bwd : in_bwd1, shared : shared1 });
                sigma2.push(Hpred::Dllseg { kind : k2, para : para2, in_fwd : in_fwd2,
                                            out_bwd : out_bwd2, out_fwd : out_fwd2,
                                            in_bwd : in_bwd2, shared : shared2 });
                for pair in todos_new.into_iter().rev() {
                    todos.push_front(pair);
                }
            },
            // a segment can never correspond to a points-to
            _ => return None
        }
    }
    Some((corres, sigma1, sigma2, sigma_todo))
}

/// Finds two disjoint sub-heaps of `sigma` related by a bijection seeded
/// with `todos`. Returns the completed correspondence, the two sub-heaps
/// in discovery order, and the untouched remainder of the heap.
pub fn find_partial_iso(eq : &dyn Fn(&Expr, &Expr) -> bool, corres : Corres,
                        todos : Vec<(Expr, Expr)>, sigma : &[Hpred])
        -> Option<(Corres, Vec<Hpred>, Vec<Hpred>, Vec<Hpred>)> {
    let mut update = |e1 : &Expr, e2 : &Expr, sigma0 : Vec<Hpred>| {
        let (hpredo1, sigma_no_e1) = sigma_remove_hpred(eq, &sigma0, e1);
        let (hpredo2, sigma_no_e12) = sigma_remove_hpred(eq, &sigma_no_e1, e2);
        (hpredo1, hpredo2, sigma_no_e12)
    };
    generic_find_partial_iso(FieldMode::Exact, &mut update, corres, todos, sigma.to_vec())
}

/// Two-heap variant : the first component of each pair is looked up in
/// `sigma1`, the second in `sigma2`. `mode` controls record tolerance.
pub fn find_partial_iso_from_two_sigmas(mode : FieldMode, eq : &dyn Fn(&Expr, &Expr) -> bool,
                                        corres : Corres, todos : Vec<(Expr, Expr)>,
                                        sigma1 : &[Hpred], sigma2 : &[Hpred])
        -> Option<(Corres, Vec<Hpred>, Vec<Hpred>, (Vec<Hpred>, Vec<Hpred>))> {
    let mut update = |e1 : &Expr, e2 : &Expr, todo : (Vec<Hpred>, Vec<Hpred>)| {
        let (todo1, todo2) = todo;
        let (hpredo1, todo1_rest) = sigma_remove_hpred(eq, &todo1, e1);
        let (hpredo2, todo2_rest) = sigma_remove_hpred(eq, &todo2, e2);
        (hpredo1, hpredo2, (todo1_rest, todo2_rest))
    };
    generic_find_partial_iso(mode, &mut update, corres, todos,
                             (sigma1.to_vec(), sigma2.to_vec()))
}

#[cfg(test)]
mod iso_tests {
    use super::*;
    use crate::ident::{ mk_plain, mk_field };
    use crate::expr::{ Expr, mk_var, mk_int };
    use crate::hprop::{ mk_pointsto, mk_lseg, mk_atom, mk_record, LsegKind };
    use crate::hprop::hprop_test_support::{ node_typ_exp, simple_para };

    fn exp_eq(e1 : &Expr, e2 : &Expr) -> bool {
        e1 == e2
    }

    fn next_cell(name : &str, next_to : &str) -> Hpred {
        mk_pointsto(
            mk_var(mk_plain(name, 0)),
            mk_record(vec![(mk_field("next"), mk_atom(mk_var(mk_plain(next_to, 0))))]),
            node_typ_exp())
    }

    #[test]
    fn hpara_iso_is_reflexive() {
        let para = simple_para();
        assert!(hpara_iso(&para, &para));
    }

    #[test]
    fn two_swapped_cells_are_isomorphic() {
        let a = mk_var(mk_plain("a", 0));
        let b = mk_var(mk_plain("b", 0));
        let sigma = vec![next_cell("a", "b"), next_cell("b", "a")];
        let (corres, sigma1, sigma2, leftover) =
            find_partial_iso(&exp_eq, vec![], vec![(a.clone(), b.clone())], &sigma).unwrap();
        assert!(corres.contains(&(a, b)));
        assert_eq!(sigma1, vec![next_cell("a", "b")]);
        assert_eq!(sigma2, vec![next_cell("b", "a")]);
        assert!(leftover.is_empty());
    }

    #[test]
    fn coverage_splits_the_heap_into_three_disjoint_parts() {
        let a = mk_var(mk_plain("a", 0));
        let b = mk_var(mk_plain("b", 0));
        let sigma = vec![next_cell("a", "n"), next_cell("b", "n"), next_cell("z", "z")];
        let (_, sigma1, sigma2, leftover) =
            find_partial_iso(&exp_eq, vec![], vec![(a, b)], &sigma).unwrap();
        assert_eq!(sigma1.len(), sigma2.len());
        // the three parts together are exactly the input heap
        let mut reassembled = sigma1.clone();
        reassembled.extend(sigma2.clone());
        reassembled.extend(leftover);
        for hpred in sigma.iter() {
            assert_eq!(reassembled.iter().filter(|h| *h == hpred).count(), 1);
        }
        assert_eq!(reassembled.len(), sigma.len());
        // and no rooted predicate is claimed by both sides
        for hpred in sigma1.iter() {
            assert!(!sigma2.contains(hpred));
        }
    }

    #[test]
    fn conflicting_partners_sink_the_search() {
        // a must correspond to both b and z; no bijection does that
        let a = mk_var(mk_plain("a", 0));
        let b = mk_var(mk_plain("b", 0));
        let z = mk_var(mk_plain("z", 0));
        let sigma = vec![next_cell("a", "a"), next_cell("b", "z")];
        let got = find_partial_iso(&exp_eq, vec![],
                                   vec![(a.clone(), b), (a, z)], &sigma);
        assert!(got.is_none());
    }

    #[test]
    fn field_modes_gate_record_todos() {
        let wide = mk_record(vec![
            (mk_field("f"), mk_atom(mk_int(1))),
            (mk_field("g"), mk_atom(mk_int(2)))]);
        let narrow = mk_record(vec![(mk_field("f"), mk_atom(mk_int(3)))]);
        assert!(generate_todos_from_strexp(FieldMode::Exact, vec![], &wide, &narrow).is_none());
        let todos =
            generate_todos_from_strexp(FieldMode::LFieldForget, vec![], &wide, &narrow).unwrap();
        assert_eq!(todos, vec![(mk_int(1), mk_int(3))]);
        // the forgetting side matters
        assert!(generate_todos_from_strexp(FieldMode::RFieldForget, vec![], &wide, &narrow).is_none());
        let todos_flipped =
            generate_todos_from_strexp(FieldMode::RFieldForget, vec![], &narrow, &wide).unwrap();
        assert_eq!(todos_flipped, vec![(mk_int(3), mk_int(1))]);
    }

    #[test]
    fn segments_correspond_through_their_arguments() {
        let sigma = vec![
            mk_lseg(LsegKind::NE, simple_para(),
                    mk_var(mk_plain("a", 0)), mk_var(mk_plain("c", 0)), vec![]),
            mk_lseg(LsegKind::NE, simple_para(),
                    mk_var(mk_plain("b", 0)), mk_var(mk_plain("c", 0)), vec![])];
        let a = mk_var(mk_plain("a", 0));
        let b = mk_var(mk_plain("b", 0));
        let (corres, sigma1, sigma2, leftover) =
            find_partial_iso(&exp_eq, vec![], vec![(a.clone(), b.clone())], &sigma).unwrap();
        assert!(corres.contains(&(a, b)));
        assert_eq!(sigma1.len(), 1);
        assert_eq!(sigma2.len(), 1);
        assert!(leftover.is_empty());
    }

    #[test]
    fn two_sigma_variant_keeps_the_remainders_apart() {
        let a = mk_var(mk_plain("a", 0));
        let b = mk_var(mk_plain("b", 0));
        let sigma1 = vec![next_cell("a", "n"), next_cell("x", "x")];
        let sigma2 = vec![next_cell("b", "n")];
        let (corres, iso1, iso2, (rest1, rest2)) =
            find_partial_iso_from_two_sigmas(FieldMode::Exact, &exp_eq, vec![],
                                             vec![(a.clone(), b.clone())],
                                             &sigma1, &sigma2).unwrap();
        assert!(corres.contains(&(a, b)));
        assert_eq!(iso1, vec![next_cell("a", "n")]);
        assert_eq!(iso2, vec![next_cell("b", "n")]);
        assert_eq!(rest1, vec![next_cell("x", "x")]);
        assert!(rest2.is_empty());
    }
}
