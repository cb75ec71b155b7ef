use std::collections::VecDeque;

use crate::ident::Ident;
use crate::subst::Subst;
use crate::hprop::{ Prop, Hpred };
use crate::errors;

/// A zipper over the spatial conjunction of a prop. The matcher walks
/// the heap one focused predicate at a time, and when a filter accepts
/// the focus the filter's payload (the substitution and free-variable
/// set it produced) is parked on the iterator so the continuation can
/// pick it up. Iterators are persistent values : advancing or removing
/// builds a new one, which is what makes the two-branch backtracking in
/// the matcher a matter of keeping the old copy around.
#[derive(Clone)]
pub struct PropIter {
    sub : Subst,
    older : Vec<Hpred>,
    curr : Hpred,
    state : Option<(Subst, Vec<Ident>)>,
    newer : VecDeque<Hpred>,
}

impl PropIter {
    /// Focuses on the first spatial predicate. An empty spatial part has
    /// nothing to focus on.
    pub fn create(p : &Prop) -> Option<PropIter> {
        let mut newer : VecDeque<Hpred> = p.sigma.iter().cloned().collect();
        let curr = newer.pop_front()?;
        Some(PropIter {
            sub : p.sub.clone(),
            older : Vec::new(),
            curr,
            state : None,
            newer,
        })
    }

    /// Advances the focus one position, dropping any parked state.
    pub fn next(&self) -> Option<PropIter> {
        let mut iter = self.clone();
        let new_curr = iter.newer.pop_front()?;
        iter.older.push(std::mem::replace(&mut iter.curr, new_curr));
        iter.state = None;
        Some(iter)
    }

    pub fn current(&self) -> &Hpred {
        &self.curr
    }

    /// The filter payload parked by `find`. Asking for it on a focus no
    /// filter ever accepted is a caller bug.
    pub fn state(&self) -> &(Subst, Vec<Ident>) {
        match &self.state {
            Some(st) => st,
            None => errors::err_missing_state(line!())
        }
    }

    /// Advances from the current focus to the first one the filter
    /// accepts, parking the filter's payload on the result.
    pub fn find(&self, filter : &dyn Fn(&Hpred) -> Option<(Subst, Vec<Ident>)>)
            -> Option<PropIter> {
        let mut iter = self.clone();
        loop {
            match filter(&iter.curr) {
                Some(st) => {
                    iter.state = Some(st);
                    return Some(iter)
                },
                None => {
                    iter = iter.next()?;
                }
            }
        }
    }

    /// Reifies back to a prop with the focused predicate dropped.
    pub fn remove_curr_then_to_prop(&self) -> Prop {
        let mut sigma = self.older.clone();
        sigma.extend(self.newer.iter().cloned());
        Prop { sub : self.sub.clone(), sigma }
    }

    /// Reifies back to a prop, focus included.
    pub fn to_prop(&self) -> Prop {
        let mut sigma = self.older.clone();
        sigma.push(self.curr.clone());
        sigma.extend(self.newer.iter().cloned());
        Prop { sub : self.sub.clone(), sigma }
    }
}

#[cfg(test)]
mod iter_tests {
    use super::*;
    use crate::ident::{ mk_plain, mk_typ };
    use crate::expr::{ Expr, mk_var, mk_int, mk_sizeof };
    use crate::hprop::{ mk_pointsto, mk_atom, prop_from_sigma };
    use crate::subst::sub_empty;

    fn cell(name : &str, v : i64) -> Hpred {
        mk_pointsto(mk_var(mk_plain(name, 0)), mk_atom(mk_int(v)), mk_sizeof(mk_typ("int")))
    }

    #[test]
    fn create_demands_a_nonempty_spatial_part() {
        assert!(PropIter::create(&prop_from_sigma(vec![])).is_none());
        let p = prop_from_sigma(vec![cell("a", 1)]);
        let iter = PropIter::create(&p).unwrap();
        assert_eq!(iter.current(), &cell("a", 1));
        assert!(iter.next().is_none());
    }

    #[test]
    fn find_parks_state_and_remove_drops_focus() {
        let p = prop_from_sigma(vec![cell("a", 1), cell("b", 2), cell("c", 3)]);
        let iter = PropIter::create(&p).unwrap();
        let want_b = |hpred : &Hpred| {
            let b : Expr = mk_var(mk_plain("b", 0));
            if hpred.root() == &b { Some((sub_empty(), vec![])) } else { None }
        };
        let found = iter.find(&want_b).unwrap();
        assert_eq!(found.current(), &cell("b", 2));
        assert_eq!(found.state(), &(sub_empty(), vec![]));
        let leftover = found.remove_curr_then_to_prop();
        assert_eq!(leftover.sigma, vec![cell("a", 1), cell("c", 3)]);
        assert_eq!(found.to_prop().sigma, p.sigma);
    }
}
