use hashbrown::HashMap;

use crate::ident::{ Ident, fresh_primed };
use crate::expr::{ Expr, InnerExpr, mk_var };
use crate::hprop::{ Hpred, Hpara, HparaDll, sigma_lift_to_pe, sigma_replace_exp };
use crate::errors;

/// What `generic_para_create` fabricates from a correspondence : the
/// expression-to-formal renaming, the partition of the new formals into
/// shared and existential, the shared source expressions (the actuals a
/// use site must supply), and the rewritten body.
struct ParaPieces {
    renaming : Vec<(Expr, Ident)>,
    ids_shared : Vec<Ident>,
    ids_exists : Vec<Ident>,
    es_shared : Vec<Expr>,
    body : Vec<Hpred>,
}

/// Builds a canonical parameter body out of one half of an isomorphism.
/// Every corresponding pair that is not just the same constant twice
/// gets a fresh primed formal; pairs outside the root/next positions
/// split into shared formals (the two sides agreed) and existential
/// formals (they did not). The body is the PE-lifted source sub-heap
/// with each named expression swapped for its formal.
fn generic_para_create(corres : &[(Expr, Expr)], sigma1 : &[Hpred], elist1 : &[Expr])
        -> ParaPieces {
    let not_same_consts = |e1 : &Expr, e2 : &Expr| {
        match (e1.as_ref(), e2.as_ref()) {
            (InnerExpr::Const { val : c1, .. }, InnerExpr::Const { val : c2, .. }) => c1 != c2,
            _ => true
        }
    };
    let corres_ids : Vec<((Expr, Expr), Ident)> = corres.iter()
        .filter(|(e1, e2)| not_same_consts(e1, e2))
        .map(|pair| (pair.clone(), fresh_primed()))
        .collect();

    let mut ids_shared = Vec::new();
    let mut ids_exists = Vec::new();
    let mut es_shared = Vec::new();
    for ((e1, e2), id) in corres_ids.iter() {
        if elist1.contains(e1) {
            continue
        }
        if e1 == e2 {
            ids_shared.push(id.clone());
            es_shared.push(e1.clone());
        } else {
            ids_exists.push(id.clone());
        }
    }

    let renaming : Vec<(Expr, Ident)> = corres_ids.into_iter()
        .map(|((e1, _), id)| (e1, id))
        .collect();
    let renaming_exps : Vec<(Expr, Expr)> = renaming.iter()
        .map(|(e1, id)| (e1.clone(), mk_var(id.clone())))
        .collect();
    let body = sigma_replace_exp(&renaming_exps, &sigma_lift_to_pe(sigma1));

    ParaPieces { renaming, ids_shared, ids_exists, es_shared, body }
}

fn id_table(renaming : &[(Expr, Ident)]) -> HashMap<Expr, Ident> {
    renaming.iter().cloned().collect()
}

/// Synthesises a singly-linked parameter whose root and next formals
/// stand for `root1` and `next1`. Returns the parameter together with
/// the shared source expressions to pass as actuals wherever it is used.
/// The correspondence must have assigned formals to `root1` and `next1`;
/// anything else is a caller bug.
pub fn hpara_create(corres : &[(Expr, Expr)], sigma1 : &[Hpred],
                    root1 : &Expr, next1 : &Expr) -> (Hpara, Vec<Expr>) {
    let pieces = generic_para_create(corres, sigma1, &[root1.clone(), next1.clone()]);
    let table = id_table(&pieces.renaming);
    let get_id = |e : &Expr| {
        match table.get(e) {
            Some(id) => id.clone(),
            None => errors::err_para_renaming(line!(), e)
        }
    };
    let para = Hpara {
        root : get_id(root1),
        next : get_id(next1),
        svars : pieces.ids_shared,
        evars : pieces.ids_exists,
        body : pieces.body,
    };
    (para, pieces.es_shared)
}

/// Doubly-linked analogue : the cell, back-link, and forward-link
/// formals stand for `cell1`, `blink1`, and `flink1`.
pub fn hpara_dll_create(corres : &[(Expr, Expr)], sigma1 : &[Hpred],
                        cell1 : &Expr, blink1 : &Expr, flink1 : &Expr)
        -> (HparaDll, Vec<Expr>) {
    let pieces = generic_para_create(
        corres, sigma1, &[cell1.clone(), blink1.clone(), flink1.clone()]);
    let table = id_table(&pieces.renaming);
    let get_id = |e : &Expr| {
        match table.get(e) {
            Some(id) => id.clone(),
            None => errors::err_para_renaming(line!(), e)
        }
    };
    let para = HparaDll {
        cell : get_id(cell1),
        blink : get_id(blink1),
        flink : get_id(flink1),
        svars : pieces.ids_shared,
        evars : pieces.ids_exists,
        body : pieces.body,
    };
    (para, pieces.es_shared)
}

#[cfg(test)]
mod para_tests {
    use super::*;
    use crate::ident::{ mk_plain, mk_field };
    use crate::expr::mk_var;
    use crate::hprop::{ mk_pointsto, mk_atom, mk_record, hpara_instantiate, hpara_dll_instantiate,
                        sigma_lift_to_pe };
    use crate::hprop::hprop_test_support::node_typ_exp;
    use crate::iso::find_partial_iso;

    fn exp_eq(e1 : &Expr, e2 : &Expr) -> bool {
        e1 == e2
    }

    #[test]
    fn created_para_reinstantiates_to_its_source() {
        // two isomorphic cells that also share a lock pointer :
        //   a |-> { lock: s, next: n1 }    b |-> { lock: s, next: n2 }
        let a = mk_var(mk_plain("a", 0));
        let b = mk_var(mk_plain("b", 0));
        let s = mk_var(mk_plain("s", 0));
        let n1 = mk_var(mk_plain("n1", 0));
        let n2 = mk_var(mk_plain("n2", 0));
        let cell = |root : &Expr, next : &Expr| mk_pointsto(
            root.clone(),
            mk_record(vec![
                (mk_field("lock"), mk_atom(s.clone())),
                (mk_field("next"), mk_atom(next.clone()))]),
            node_typ_exp());
        let sigma = vec![cell(&a, &n1), cell(&b, &n2)];
        let (corres, sigma1, _, _) =
            find_partial_iso(&exp_eq, vec![], vec![(a.clone(), b.clone())], &sigma).unwrap();

        let (para, es_shared) = hpara_create(&corres, &sigma1, &a, &n1);
        assert_eq!(es_shared, vec![s]);
        assert_eq!(para.svars.len(), 1);
        assert!(para.evars.is_empty());

        // substituting the original root, next, and shared actuals back
        // into the body must recover the source sub-heap, lifted to PE
        let (fresh_evars, body_inst) = hpara_instantiate(&para, &a, &n1, &es_shared);
        assert!(fresh_evars.is_empty());
        assert_eq!(body_inst, sigma_lift_to_pe(&sigma1));
    }

    #[test]
    fn corresponding_non_shared_values_become_existentials() {
        // the stored values differ between the two cells, so the value
        // position turns into an existential formal
        let a = mk_var(mk_plain("a", 0));
        let b = mk_var(mk_plain("b", 0));
        let v1 = mk_var(mk_plain("v1", 0));
        let v2 = mk_var(mk_plain("v2", 0));
        let n1 = mk_var(mk_plain("n1", 0));
        let n2 = mk_var(mk_plain("n2", 0));
        let cell = |root : &Expr, val : &Expr, next : &Expr| mk_pointsto(
            root.clone(),
            mk_record(vec![
                (mk_field("next"), mk_atom(next.clone())),
                (mk_field("val"), mk_atom(val.clone()))]),
            node_typ_exp());
        let sigma = vec![cell(&a, &v1, &n1), cell(&b, &v2, &n2)];
        let (corres, sigma1, _, _) =
            find_partial_iso(&exp_eq, vec![], vec![(a.clone(), b.clone())], &sigma).unwrap();
        let (para, es_shared) = hpara_create(&corres, &sigma1, &a, &n1);
        assert!(es_shared.is_empty());
        assert!(para.svars.is_empty());
        assert_eq!(para.evars.len(), 1);
        // instantiating refreshes the existential but keeps the shape
        let (fresh_evars, body_inst) = hpara_instantiate(&para, &a, &n1, &[]);
        assert_eq!(fresh_evars.len(), 1);
        let expected = vec![cell(&a, &mk_var(fresh_evars[0].clone()), &n1)];
        assert_eq!(body_inst, expected);
    }

    #[test]
    fn dll_create_names_all_three_links() {
        let c1 = mk_var(mk_plain("c1", 0));
        let c2 = mk_var(mk_plain("c2", 0));
        let p1 = mk_var(mk_plain("p1", 0));
        let p2 = mk_var(mk_plain("p2", 0));
        let f1 = mk_var(mk_plain("f1", 0));
        let f2 = mk_var(mk_plain("f2", 0));
        let cell = |root : &Expr, blink : &Expr, flink : &Expr| mk_pointsto(
            root.clone(),
            mk_record(vec![
                (mk_field("blink"), mk_atom(blink.clone())),
                (mk_field("flink"), mk_atom(flink.clone()))]),
            node_typ_exp());
        let sigma = vec![cell(&c1, &p1, &f1), cell(&c2, &p2, &f2)];
        let (corres, sigma1, _, _) =
            find_partial_iso(&exp_eq, vec![], vec![(c1.clone(), c2.clone())], &sigma).unwrap();
        let (para, es_shared) = hpara_dll_create(&corres, &sigma1, &c1, &p1, &f1);
        assert!(es_shared.is_empty());
        let (fresh_evars, body_inst) = hpara_dll_instantiate(&para, &c1, &p1, &f1, &[]);
        assert!(fresh_evars.is_empty());
        assert_eq!(body_inst, sigma_lift_to_pe(&sigma1));
    }
}
