use std::sync::Arc;
use std::hash::{ Hash, Hasher };

use fxhash::hash64;

use crate::ident::{ Ident, Pvar, Fieldname, Typ };

use InnerExpr::*;

/// Hashes are calculated from structure as terms are built, so the
/// constructors whose payloads could be mistaken for one another need
/// something to keep their digests apart. Primes, in a (probably futile)
/// attempt to reduce the likelihood of collisions, since expressions
/// spend a lot of time as hash-map keys.
pub const CAST_HASH   : u64 = 402653189;
pub const UNOP_HASH   : u64 = 1610612741;
pub const BINOP_HASH  : u64 = 786433;
pub const FIELD_HASH  : u64 = 53687091;
pub const INDEX_HASH  : u64 = 805306457;

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unop {
    Neg,
    BNot,
    LNot,
}

/// Binary operators. The matcher never normalises these (no
/// commutativity, no constant folding); two operator trees align only
/// if they are written the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Binop {
    PlusA,
    MinusA,
    Mult,
    Div,
    Mod,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
    LAnd,
    LOr,
    BAnd,
    BOr,
    BXor,
}

/// Constant values.
#[derive(Clone, PartialEq, PartialOrd, Ord, Eq, Hash)]
pub enum ConstVal {
    Int(i64),
    Str(Arc<str>),
}

impl std::fmt::Debug for ConstVal {
    fn fmt(&self, f : &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ConstVal::Int(n) => write!(f, "{}", n),
            ConstVal::Str(s) => write!(f, "{:?}", s)
        }
    }
}

/// Arc wrapper around `InnerExpr`. See InnerExpr's docs.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Expr(Arc<InnerExpr>);

/// The expression algebra the matcher works over. Every node carries an
/// `ExprCache` computed when the node is made; nodes are otherwise
/// immutable, so the cache stays valid for the life of the term.
#[derive(Clone, PartialEq, Eq)]
pub enum InnerExpr {
    Var    { cache : ExprCache, id : Ident },
    Const  { cache : ExprCache, val : ConstVal },
    Sizeof { cache : ExprCache, typ : Typ },
    Cast   { cache : ExprCache, typ : Typ, operand : Expr },
    UnOp   { cache : ExprCache, op : Unop, operand : Expr, typ : Option<Typ> },
    BinOp  { cache : ExprCache, op : Binop, lhs : Expr, rhs : Expr },
    Lvar   { cache : ExprCache, pv : Pvar },
    Lfield { cache : ExprCache, base : Expr, fld : Fieldname, typ : Typ },
    Lindex { cache : ExprCache, base : Expr, index : Expr },
}

/// Caches an expression's hash digest and whether the subtree mentions
/// any primed identifier. The digest exists so hash-keyed collections
/// never rehash a whole tree; `has_primed` is the cheap first half of
/// every "is this fully instantiated" question the matcher asks : a term
/// with no primed variables at all certainly mentions none of the
/// pattern's free variables.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct ExprCache {
    pub digest : u64,
    pub has_primed : bool,
}

impl ExprCache {
    pub fn mk(digest : u64, has_primed : bool) -> Self {
        ExprCache {
            digest,
            has_primed,
        }
    }
}

impl std::fmt::Debug for ExprCache {
    fn fmt(&self, _f : &mut std::fmt::Formatter) -> std::fmt::Result {
        Ok(())
    }
}

pub fn mk_var(id : Ident) -> Expr {
    let digest = hash64(&id);
    let has_primed = id.is_primed();
    Var { cache : ExprCache::mk(digest, has_primed), id }.into()
}

pub fn mk_int(n : i64) -> Expr {
    mk_const(ConstVal::Int(n))
}

pub fn mk_const(val : ConstVal) -> Expr {
    let digest = hash64(&val);
    Const { cache : ExprCache::mk(digest, false), val }.into()
}

pub fn mk_sizeof(typ : Typ) -> Expr {
    let digest = hash64(&typ);
    Sizeof { cache : ExprCache::mk(digest, false), typ }.into()
}

pub fn mk_cast(typ : Typ, operand : Expr) -> Expr {
    let digest = hash64(&(CAST_HASH, &typ, operand.get_digest()));
    let has_primed = operand.has_primed();
    Cast { cache : ExprCache::mk(digest, has_primed), typ, operand }.into()
}

pub fn mk_unop(op : Unop, operand : Expr, typ : Option<Typ>) -> Expr {
    let digest = hash64(&(UNOP_HASH, op, operand.get_digest(), &typ));
    let has_primed = operand.has_primed();
    UnOp { cache : ExprCache::mk(digest, has_primed), op, operand, typ }.into()
}

pub fn mk_binop(op : Binop, lhs : Expr, rhs : Expr) -> Expr {
    let digest = hash64(&(BINOP_HASH, op, lhs.get_digest(), rhs.get_digest()));
    let has_primed = lhs.has_primed() || rhs.has_primed();
    BinOp { cache : ExprCache::mk(digest, has_primed), op, lhs, rhs }.into()
}

pub fn mk_lvar(pv : Pvar) -> Expr {
    let digest = hash64(&pv);
    Lvar { cache : ExprCache::mk(digest, false), pv }.into()
}

pub fn mk_lfield(base : Expr, fld : Fieldname, typ : Typ) -> Expr {
    let digest = hash64(&(FIELD_HASH, base.get_digest(), &fld, &typ));
    let has_primed = base.has_primed();
    Lfield { cache : ExprCache::mk(digest, has_primed), base, fld, typ }.into()
}

pub fn mk_lindex(base : Expr, index : Expr) -> Expr {
    let digest = hash64(&(INDEX_HASH, base.get_digest(), index.get_digest()));
    let has_primed = base.has_primed() || index.has_primed();
    Lindex { cache : ExprCache::mk(digest, has_primed), base, index }.into()
}

impl Expr {
    pub fn get_digest(&self) -> u64 {
        self.as_ref().get_cache().digest
    }

    pub fn has_primed(&self) -> bool {
        self.as_ref().get_cache().has_primed
    }

    pub fn is_var(&self) -> bool {
        match self.as_ref() {
            Var {..} => true,
            _ => false
        }
    }

    /// Whether `id` occurs anywhere in this term as a variable.
    /// The primed cache lets us skip whole subtrees when looking for
    /// a primed identifier, which is the only kind the matcher ever
    /// asks about on a hot path.
    pub fn ident_in(&self, id : &Ident) -> bool {
        if id.is_primed() && !self.has_primed() {
            return false
        }
        let mut todos = vec![self];
        while let Some(elem) = todos.pop() {
            match elem.as_ref() {
                Var { id : id1, .. } => {
                    if id1 == id {
                        return true
                    }
                },
                Const {..} | Sizeof {..} | Lvar {..} => (),
                Cast { operand, .. } | UnOp { operand, .. } => {
                    todos.push(operand);
                },
                BinOp { lhs, rhs, .. } => {
                    todos.push(lhs);
                    todos.push(rhs);
                },
                Lfield { base, .. } => {
                    todos.push(base);
                },
                Lindex { base, index, .. } => {
                    todos.push(base);
                    todos.push(index);
                }
            }
        }
        false
    }

    /// Collect every variable identifier occurring in the term, in
    /// left-to-right traversal order, into `acc`.
    pub fn fav_add(&self, acc : &mut Vec<Ident>) {
        match self.as_ref() {
            Var { id, .. } => {
                if !acc.contains(id) {
                    acc.push(id.clone())
                }
            },
            Const {..} | Sizeof {..} | Lvar {..} => (),
            Cast { operand, .. } | UnOp { operand, .. } => operand.fav_add(acc),
            BinOp { lhs, rhs, .. } => {
                lhs.fav_add(acc);
                rhs.fav_add(acc);
            },
            Lfield { base, .. } => base.fav_add(acc),
            Lindex { base, index, .. } => {
                base.fav_add(acc);
                index.fav_add(acc);
            }
        }
    }

    /// Node-wise replacement : wherever a subterm is equal to some
    /// left-hand side in `pairs`, the corresponding right-hand side is
    /// grafted in without descending further. Used by parameter
    /// synthesis to swap concrete roots for fresh formals.
    pub fn replace(&self, pairs : &[(Expr, Expr)]) -> Expr {
        if let Some((_, rhs)) = pairs.iter().find(|(lhs, _)| lhs == self) {
            return rhs.clone()
        }
        match self.as_ref() {
            Var {..} | Const {..} | Sizeof {..} | Lvar {..} => self.clone(),
            Cast { typ, operand, .. } => mk_cast(typ.clone(), operand.replace(pairs)),
            UnOp { op, operand, typ, .. } => mk_unop(*op, operand.replace(pairs), typ.clone()),
            BinOp { op, lhs, rhs, .. } => mk_binop(*op, lhs.replace(pairs), rhs.replace(pairs)),
            Lfield { base, fld, typ, .. } => mk_lfield(base.replace(pairs), fld.clone(), typ.clone()),
            Lindex { base, index, .. } => mk_lindex(base.replace(pairs), index.replace(pairs)),
        }
    }
}

impl InnerExpr {
    pub fn get_cache(&self) -> ExprCache {
        match self {
            | Var    { cache, .. }
            | Const  { cache, .. }
            | Sizeof { cache, .. }
            | Cast   { cache, .. }
            | UnOp   { cache, .. }
            | BinOp  { cache, .. }
            | Lvar   { cache, .. }
            | Lfield { cache, .. }
            | Lindex { cache, .. } => *cache
        }
    }
}

impl Hash for InnerExpr {
    fn hash<H : Hasher>(&self, state : &mut H) {
        self.get_cache().digest.hash(state);
    }
}

impl std::convert::AsRef<InnerExpr> for Expr {
    fn as_ref(&self) -> &InnerExpr {
        match self {
            Expr(arc) => arc.as_ref()
        }
    }
}

impl From<InnerExpr> for Expr {
    fn from(x : InnerExpr) -> Expr {
        Expr(Arc::new(x))
    }
}

impl From<Arc<InnerExpr>> for Expr {
    fn from(x : Arc<InnerExpr>) -> Expr {
        Expr(x)
    }
}

impl std::fmt::Debug for Expr {
    fn fmt(&self, f : &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:?}", self.as_ref())
    }
}

impl std::fmt::Debug for InnerExpr {
    fn fmt(&self, f : &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Var { id, .. } => write!(f, "{:?}", id),
            Const { val, .. } => write!(f, "{:?}", val),
            Sizeof { typ, .. } => write!(f, "sizeof({:?})", typ),
            Cast { typ, operand, .. } => write!(f, "({:?}){:?}", typ, operand),
            UnOp { op, operand, .. } => write!(f, "{:?}({:?})", op, operand),
            BinOp { op, lhs, rhs, .. } => write!(f, "({:?} {:?} {:?})", lhs, op, rhs),
            Lvar { pv, .. } => write!(f, "{:?}", pv),
            Lfield { base, fld, .. } => write!(f, "{:?}.{:?}", base, fld),
            Lindex { base, index, .. } => write!(f, "{:?}[{:?}]", base, index),
        }
    }
}

#[cfg(test)]
mod expr_tests {
    use super::*;
    use crate::ident::{ mk_plain, mk_primed, mk_typ };

    #[test]
    fn primed_cache_tracks_subterms() {
        let ground = mk_binop(Binop::PlusA, mk_int(1), mk_var(mk_plain("x", 0)));
        assert!(!ground.has_primed());

        let open_ = mk_lfield(mk_var(mk_primed("y", 7)), crate::ident::mk_field("next"), mk_typ("node"));
        assert!(open_.has_primed());
    }

    #[test]
    fn ident_in_sees_through_structure() {
        let y = mk_primed("y", 7);
        let e = mk_cast(mk_typ("node"), mk_lindex(mk_var(mk_plain("a", 0)), mk_var(y.clone())));
        assert!(e.ident_in(&y));
        assert!(!e.ident_in(&mk_primed("y", 8)));
    }

    #[test]
    fn replace_is_node_wise() {
        let x = mk_var(mk_plain("x", 0));
        let w = mk_var(mk_primed("w", 1));
        let e = mk_binop(Binop::PlusA, x.clone(), mk_int(2));
        let replaced = e.replace(&[(x.clone(), w.clone())]);
        assert_eq!(replaced, mk_binop(Binop::PlusA, w, mk_int(2)));
        // a pair whose lhs is the whole term wins before recursion
        let swallowed = e.replace(&[(e.clone(), x.clone())]);
        assert_eq!(swallowed, x);
    }
}
