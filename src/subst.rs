use indexmap::IndexMap;

use crate::ident::Ident;
use crate::expr::{ Expr, InnerExpr::*, mk_cast, mk_unop, mk_binop, mk_lfield, mk_lindex };
use crate::errors;

/// A substitution : a finite map from primed identifiers to expressions.
/// Backed by an insertion-ordered map so that joining, filtering, and
/// printing a substitution are all deterministic.
///
/// Bindings are write-once. Asking to rebind an identifier is treated as
/// a caller bug (it means a free-variable set contained a duplicate) and
/// goes through the fatal path rather than being papered over.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Subst {
    map : IndexMap<Ident, Expr>,
}

pub fn sub_empty() -> Subst {
    Subst { map : IndexMap::new() }
}

/// Build a substitution from a binding list. Duplicate identifiers in
/// the list are a contract violation.
pub fn sub_of_list(bindings : Vec<(Ident, Expr)>) -> Subst {
    let mut sub = sub_empty();
    for (id, e) in bindings {
        sub = sub.extend(id, e);
    }
    sub
}

impl Subst {
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn lookup(&self, id : &Ident) -> Option<&Expr> {
        self.map.get(id)
    }

    pub fn domain(&self) -> Vec<Ident> {
        self.map.keys().cloned().collect()
    }

    pub fn bindings(&self) -> impl Iterator<Item = (&Ident, &Expr)> {
        self.map.iter()
    }

    /// Extend with one binding. Only primed identifiers may enter the
    /// domain, and an identifier may enter it once.
    pub fn extend(&self, id : Ident, e : Expr) -> Subst {
        if !id.is_primed() {
            errors::err_nonprimed_key(line!(), &id)
        }
        if self.map.contains_key(&id) {
            errors::err_rebound_ident(line!(), &id)
        }
        let mut new_map = self.map.clone();
        new_map.insert(id, e);
        Subst { map : new_map }
    }

    /// Union of two substitutions with disjoint domains; a collision is
    /// a contract violation.
    pub fn join(&self, other : &Subst) -> Subst {
        let mut new_map = self.map.clone();
        for (id, e) in other.map.iter() {
            if new_map.contains_key(id) {
                errors::err_join_collision(line!(), id)
            }
            new_map.insert(id.clone(), e.clone());
        }
        Subst { map : new_map }
    }

    /// Keep only the bindings whose identifier passes `pred`.
    pub fn filter(&self, pred : impl Fn(&Ident) -> bool) -> Subst {
        let mut new_map = IndexMap::new();
        for (id, e) in self.map.iter() {
            if pred(id) {
                new_map.insert(id.clone(), e.clone());
            }
        }
        Subst { map : new_map }
    }

    /// Apply the substitution to an expression, replacing every bound
    /// variable occurrence with its image. The primed cache gives an
    /// early out on ground terms, which most heap expressions are.
    pub fn apply(&self, e : &Expr) -> Expr {
        if self.is_empty() || !e.has_primed() {
            return e.clone()
        }
        match e.as_ref() {
            Var { id, .. } => {
                match self.map.get(id) {
                    Some(e_image) => e_image.clone(),
                    None => e.clone()
                }
            },
            Const {..} | Sizeof {..} | Lvar {..} => e.clone(),
            Cast { typ, operand, .. } => mk_cast(typ.clone(), self.apply(operand)),
            UnOp { op, operand, typ, .. } => mk_unop(*op, self.apply(operand), typ.clone()),
            BinOp { op, lhs, rhs, .. } => mk_binop(*op, self.apply(lhs), self.apply(rhs)),
            Lfield { base, fld, typ, .. } => mk_lfield(self.apply(base), fld.clone(), typ.clone()),
            Lindex { base, index, .. } => mk_lindex(self.apply(base), self.apply(index)),
        }
    }
}

impl std::fmt::Debug for Subst {
    fn fmt(&self, f : &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "[")?;
        for (pos, (id, e)) in self.map.iter().enumerate() {
            if pos > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{:?} |-> {:?}", id, e)?;
        }
        write!(f, "]")
    }
}
