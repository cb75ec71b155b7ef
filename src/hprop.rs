use crate::ident::{ Ident, Fieldname, fresh_primed_like };
use crate::expr::Expr;
use crate::subst::{ Subst, sub_empty };
use crate::errors;

use StrExp::*;
use Hpred::*;

/// Provenance metadata attached to structured values by the analyser
/// (where a value came from : an allocation, a heap lookup, a store).
/// The matcher carries it around untouched and never compares it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Inst {
    None,
    Alloc,
    Lookup,
    Update,
}

/// A structured value : what a points-to predicate says is stored at a
/// location. Record fields are kept sorted by the total field order and
/// array cells by their index expression; the positional merges in the
/// unifier and the isomorphism finder both assume it.
#[derive(Clone, PartialEq, Eq)]
pub enum StrExp {
    Atom { expr : Expr, inst : Inst },
    Record { fields : Vec<(Fieldname, StrExp)>, inst : Inst },
    Array { size : Expr, cells : Vec<(Expr, StrExp)>, inst : Inst },
}

pub fn mk_atom(expr : Expr) -> StrExp {
    Atom { expr, inst : Inst::None }
}

/// Builds a record value, sorting the fields into the canonical order.
pub fn mk_record(mut fields : Vec<(Fieldname, StrExp)>) -> StrExp {
    fields.sort_by(|(f1, _), (f2, _)| f1.cmp(f2));
    Record { fields, inst : Inst::None }
}

/// Builds an array value. Cells must already be ordered by index; the
/// matcher walks them positionally.
pub fn mk_array(size : Expr, cells : Vec<(Expr, StrExp)>) -> StrExp {
    Array { size, cells, inst : Inst::None }
}

impl StrExp {
    pub fn sub(&self, sub : &Subst) -> StrExp {
        match self {
            Atom { expr, inst } => Atom { expr : sub.apply(expr), inst : *inst },
            Record { fields, inst } => {
                let new_fields = fields.iter()
                                       .map(|(f, se)| (f.clone(), se.sub(sub)))
                                       .collect();
                Record { fields : new_fields, inst : *inst }
            },
            Array { size, cells, inst } => {
                let new_cells = cells.iter()
                                     .map(|(idx, se)| (sub.apply(idx), se.sub(sub)))
                                     .collect();
                Array { size : sub.apply(size), cells : new_cells, inst : *inst }
            }
        }
    }

    pub fn replace(&self, pairs : &[(Expr, Expr)]) -> StrExp {
        match self {
            Atom { expr, inst } => Atom { expr : expr.replace(pairs), inst : *inst },
            Record { fields, inst } => {
                let new_fields = fields.iter()
                                       .map(|(f, se)| (f.clone(), se.replace(pairs)))
                                       .collect();
                Record { fields : new_fields, inst : *inst }
            },
            Array { size, cells, inst } => {
                let new_cells = cells.iter()
                                     .map(|(idx, se)| (idx.replace(pairs), se.replace(pairs)))
                                     .collect();
                Array { size : size.replace(pairs), cells : new_cells, inst : *inst }
            }
        }
    }
}

/// The two flavours of list segment. `NE` stands for at least one cell;
/// `PE` also admits the empty segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LsegKind {
    NE,
    PE,
}

impl LsegKind {
    /// Whether a focused predicate of kind `self` discharges a pattern
    /// of kind `pat`. A possibly-empty segment promises less than a
    /// non-empty one, so `PE` never discharges `NE`.
    pub fn subsumed_by(self, pat : LsegKind) -> bool {
        match (self, pat) {
            (LsegKind::NE, _) => true,
            (LsegKind::PE, LsegKind::PE) => true,
            (LsegKind::PE, LsegKind::NE) => false
        }
    }
}

/// The shape of one cell of a singly-linked list : a spatial body over a
/// root formal, a next formal, shared outside formals, and local
/// existentials. Parameters are closed; substitution never reaches into
/// a body except through `instantiate`.
#[derive(Clone, PartialEq, Eq)]
pub struct Hpara {
    pub root : Ident,
    pub next : Ident,
    pub svars : Vec<Ident>,
    pub evars : Vec<Ident>,
    pub body : Vec<Hpred>,
}

/// Doubly-linked variant, with one cell formal and the two link formals.
#[derive(Clone, PartialEq, Eq)]
pub struct HparaDll {
    pub cell : Ident,
    pub blink : Ident,
    pub flink : Ident,
    pub svars : Vec<Ident>,
    pub evars : Vec<Ident>,
    pub body : Vec<Hpred>,
}

/// A spatial predicate : the things a symbolic heap is a conjunction of.
#[derive(Clone, PartialEq, Eq)]
pub enum Hpred {
    PointsTo { root : Expr, sval : StrExp, typ : Expr },
    Lseg { kind : LsegKind, para : Hpara, start : Expr, end : Expr, shared : Vec<Expr> },
    Dllseg { kind : LsegKind, para : HparaDll,
             in_fwd : Expr, out_bwd : Expr, out_fwd : Expr, in_bwd : Expr,
             shared : Vec<Expr> },
}

pub fn mk_pointsto(root : Expr, sval : StrExp, typ : Expr) -> Hpred {
    PointsTo { root, sval, typ }
}

pub fn mk_lseg(kind : LsegKind, para : Hpara, start : Expr, end : Expr, shared : Vec<Expr>) -> Hpred {
    Lseg { kind, para, start, end, shared }
}

pub fn mk_dllseg(kind : LsegKind, para : HparaDll,
                 in_fwd : Expr, out_bwd : Expr, out_fwd : Expr, in_bwd : Expr,
                 shared : Vec<Expr>) -> Hpred {
    Dllseg { kind, para, in_fwd, out_bwd, out_fwd, in_bwd, shared }
}

impl Hpred {
    /// The root location of the predicate; unique per well-formed heap.
    pub fn root(&self) -> &Expr {
        match self {
            PointsTo { root, .. } => root,
            Lseg { start, .. } => start,
            Dllseg { in_fwd, .. } => in_fwd
        }
    }

    /// Substitution stops at parameters; their bodies are closed under
    /// their own formals, so only the argument expressions are touched.
    pub fn sub(&self, sub : &Subst) -> Hpred {
        match self {
            PointsTo { root, sval, typ } => {
                PointsTo { root : sub.apply(root), sval : sval.sub(sub), typ : sub.apply(typ) }
            },
            Lseg { kind, para, start, end, shared } => {
                let new_shared = shared.iter().map(|e| sub.apply(e)).collect();
                Lseg { kind : *kind, para : para.clone(),
                       start : sub.apply(start), end : sub.apply(end), shared : new_shared }
            },
            Dllseg { kind, para, in_fwd, out_bwd, out_fwd, in_bwd, shared } => {
                let new_shared = shared.iter().map(|e| sub.apply(e)).collect();
                Dllseg { kind : *kind, para : para.clone(),
                         in_fwd : sub.apply(in_fwd), out_bwd : sub.apply(out_bwd),
                         out_fwd : sub.apply(out_fwd), in_bwd : sub.apply(in_bwd),
                         shared : new_shared }
            }
        }
    }

    pub fn replace(&self, pairs : &[(Expr, Expr)]) -> Hpred {
        match self {
            PointsTo { root, sval, typ } => {
                PointsTo { root : root.replace(pairs), sval : sval.replace(pairs), typ : typ.replace(pairs) }
            },
            Lseg { kind, para, start, end, shared } => {
                let new_shared = shared.iter().map(|e| e.replace(pairs)).collect();
                Lseg { kind : *kind, para : para.clone(),
                       start : start.replace(pairs), end : end.replace(pairs), shared : new_shared }
            },
            Dllseg { kind, para, in_fwd, out_bwd, out_fwd, in_bwd, shared } => {
                let new_shared = shared.iter().map(|e| e.replace(pairs)).collect();
                Dllseg { kind : *kind, para : para.clone(),
                         in_fwd : in_fwd.replace(pairs), out_bwd : out_bwd.replace(pairs),
                         out_fwd : out_fwd.replace(pairs), in_bwd : in_bwd.replace(pairs),
                         shared : new_shared }
            }
        }
    }
}

/// Rewrites a segment predicate to the possibly-empty kind. Points-to
/// facts pass through untouched.
pub fn hpred_lift_to_pe(hpred : &Hpred) -> Hpred {
    match hpred {
        Lseg { para, start, end, shared, .. } => {
            Lseg { kind : LsegKind::PE, para : para.clone(),
                   start : start.clone(), end : end.clone(), shared : shared.clone() }
        },
        Dllseg { para, in_fwd, out_bwd, out_fwd, in_bwd, shared, .. } => {
            Dllseg { kind : LsegKind::PE, para : para.clone(),
                     in_fwd : in_fwd.clone(), out_bwd : out_bwd.clone(),
                     out_fwd : out_fwd.clone(), in_bwd : in_bwd.clone(),
                     shared : shared.clone() }
        },
        PointsTo {..} => hpred.clone()
    }
}

pub fn sigma_lift_to_pe(sigma : &[Hpred]) -> Vec<Hpred> {
    sigma.iter().map(hpred_lift_to_pe).collect()
}

pub fn sigma_sub(sub : &Subst, sigma : &[Hpred]) -> Vec<Hpred> {
    sigma.iter().map(|hpred| hpred.sub(sub)).collect()
}

pub fn sigma_replace_exp(pairs : &[(Expr, Expr)], sigma : &[Hpred]) -> Vec<Hpred> {
    sigma.iter().map(|hpred| hpred.replace(pairs)).collect()
}

/// Extracts the predicate rooted at `e` (under the given root equality)
/// from `sigma`, returning it together with the remainder. Finding two
/// is a violation of the unique-roots invariant and fatal.
pub fn sigma_remove_hpred(eq : &dyn Fn(&Expr, &Expr) -> bool,
                          sigma : &[Hpred],
                          e : &Expr) -> (Option<Hpred>, Vec<Hpred>) {
    let mut matched : Vec<&Hpred> = Vec::new();
    let mut rest = Vec::new();
    for hpred in sigma {
        if eq(hpred.root(), e) {
            matched.push(hpred);
        } else {
            rest.push(hpred.clone());
        }
    }
    match matched.as_slice() {
        [] => (None, sigma.to_vec()),
        [hpred_e] => (Some((*hpred_e).clone()), rest),
        _ => errors::err_dup_root(line!(), e)
    }
}

/// Instantiates a list-segment parameter body : the root and next
/// formals become the given expressions, shared formals the actuals,
/// and each local existential a fresh primed variable. Returns the
/// fresh existentials alongside the instantiated conjuncts.
pub fn hpara_instantiate(para : &Hpara, e_start : &Expr, e_end : &Expr, elist : &[Expr])
        -> (Vec<Ident>, Vec<Hpred>) {
    if para.svars.len() != elist.len() {
        errors::err_para_arity(line!(), para.svars.len(), elist.len())
    }
    let mut sub = sub_empty();
    sub = sub.extend(para.root.clone(), e_start.clone());
    sub = sub.extend(para.next.clone(), e_end.clone());
    for (svar, actual) in para.svars.iter().zip(elist) {
        sub = sub.extend(svar.clone(), actual.clone());
    }
    let ids_evars : Vec<Ident> = para.evars.iter().map(fresh_primed_like).collect();
    for (evar, fresh) in para.evars.iter().zip(ids_evars.iter()) {
        sub = sub.extend(evar.clone(), crate::expr::mk_var(fresh.clone()));
    }
    (ids_evars, sigma_sub(&sub, &para.body))
}

/// Doubly-linked analogue : cell, back link, and forward link formals
/// become the given expressions.
pub fn hpara_dll_instantiate(para : &HparaDll, e_cell : &Expr, e_blink : &Expr, e_flink : &Expr,
                             elist : &[Expr]) -> (Vec<Ident>, Vec<Hpred>) {
    if para.svars.len() != elist.len() {
        errors::err_para_arity(line!(), para.svars.len(), elist.len())
    }
    let mut sub = sub_empty();
    sub = sub.extend(para.cell.clone(), e_cell.clone());
    sub = sub.extend(para.blink.clone(), e_blink.clone());
    sub = sub.extend(para.flink.clone(), e_flink.clone());
    for (svar, actual) in para.svars.iter().zip(elist) {
        sub = sub.extend(svar.clone(), actual.clone());
    }
    let ids_evars : Vec<Ident> = para.evars.iter().map(fresh_primed_like).collect();
    for (evar, fresh) in para.evars.iter().zip(ids_evars.iter()) {
        sub = sub.extend(evar.clone(), crate::expr::mk_var(fresh.clone()));
    }
    (ids_evars, sigma_sub(&sub, &para.body))
}

/// One entry of a pattern : the predicate to discharge plus whether
/// implication-style discharge is allowed for it. With the flag off the
/// entry must be matched by an equal focused predicate; with it on, a
/// possibly-empty segment may also collapse against nothing, and any
/// segment may unfold into its parameter body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HPat {
    pub hpred : Hpred,
    pub flag : bool,
}

pub fn mk_hpat(hpred : Hpred, flag : bool) -> HPat {
    HPat { hpred, flag }
}

/// A normalised symbolic heap : the spatial conjunction together with
/// the pure substitution the analyser has already committed to. The
/// matcher only ever reads `sigma`; `sub` rides along so leftovers keep
/// their pure part.
#[derive(Clone, PartialEq, Eq)]
pub struct Prop {
    pub sub : Subst,
    pub sigma : Vec<Hpred>,
}

pub fn prop_from_sigma(sigma : Vec<Hpred>) -> Prop {
    Prop { sub : sub_empty(), sigma }
}

impl Prop {
    pub fn is_emp(&self) -> bool {
        self.sigma.is_empty()
    }
}

impl std::fmt::Debug for Prop {
    fn fmt(&self, f : &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:?} ; {:?}", self.sub, self.sigma)
    }
}

impl std::fmt::Debug for StrExp {
    fn fmt(&self, f : &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Atom { expr, .. } => write!(f, "{:?}", expr),
            Record { fields, .. } => {
                write!(f, "{{")?;
                for (pos, (fld, se)) in fields.iter().enumerate() {
                    if pos > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{:?}: {:?}", fld, se)?;
                }
                write!(f, "}}")
            },
            Array { size, cells, .. } => {
                write!(f, "[|{:?}|", size)?;
                for (idx, se) in cells.iter() {
                    write!(f, " {:?}: {:?}", idx, se)?;
                }
                write!(f, "]")
            }
        }
    }
}

impl std::fmt::Debug for Hpred {
    fn fmt(&self, f : &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            PointsTo { root, sval, typ } => write!(f, "{:?} |-> {:?} : {:?}", root, sval, typ),
            Lseg { kind, start, end, shared, .. } => {
                write!(f, "lseg_{}({:?}, {:?}, {:?})",
                       match kind { LsegKind::NE => "ne", LsegKind::PE => "pe" },
                       start, end, shared)
            },
            Dllseg { kind, in_fwd, out_bwd, out_fwd, in_bwd, shared, .. } => {
                write!(f, "dllseg_{}({:?}, {:?}, {:?}, {:?}, {:?})",
                       match kind { LsegKind::NE => "ne", LsegKind::PE => "pe" },
                       in_fwd, out_bwd, out_fwd, in_bwd, shared)
            }
        }
    }
}

impl std::fmt::Debug for Hpara {
    fn fmt(&self, f : &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "para({:?}, {:?}, sv {:?}, ev {:?}). {:?}",
               self.root, self.next, self.svars, self.evars, self.body)
    }
}

impl std::fmt::Debug for HparaDll {
    fn fmt(&self, f : &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "para_dll({:?}, {:?}, {:?}, sv {:?}, ev {:?}). {:?}",
               self.cell, self.blink, self.flink, self.svars, self.evars, self.body)
    }
}
