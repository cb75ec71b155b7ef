use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering::Relaxed;

use IdentKind::*;

/// Globally visible incrementing counter for fresh primed identifiers.
/// Lazy man's way of creating fresh names across threads. Two primed
/// identifiers produced by `fresh_primed` are never equal within one
/// process, which is all the matcher relies on when it renames leftover
/// existentials or unfolds a list-segment body.
pub static IDENT_SERIAL : AtomicU64 = AtomicU64::new(0);

/// Identifier kinds. `Primed` marks a logical (existential) variable;
/// those are the only identifiers the unifier is allowed to bind.
/// `Plain` identifiers name ordinary program values and only ever match
/// themselves.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Ord, Eq, Hash)]
pub enum IdentKind {
    Plain,
    Primed,
}

/// An identifier; a base name plus a disambiguating stamp, tagged with
/// its kind. The stamp is what actually distinguishes the fresh primed
/// variables drawn from `IDENT_SERIAL`; the base name is just for
/// readability of printed heaps.
#[derive(Clone, PartialEq, PartialOrd, Ord, Eq, Hash)]
pub struct Ident {
    pub kind : IdentKind,
    pub name : Arc<str>,
    pub stamp : u64,
}

pub fn mk_plain(name : &str, stamp : u64) -> Ident {
    Ident { kind : Plain, name : Arc::from(name), stamp }
}

pub fn mk_primed(name : &str, stamp : u64) -> Ident {
    Ident { kind : Primed, name : Arc::from(name), stamp }
}

/// The next primed identifier off the global serial. The base name used
/// here is the conventional one for matcher-generated temporaries.
pub fn fresh_primed() -> Ident {
    let stamp = IDENT_SERIAL.fetch_add(1, Relaxed);
    mk_primed("tmp", stamp)
}

/// A fresh primed identifier that keeps the base name of the identifier
/// it replaces; used when unfolding a parameter body so that the printed
/// heap still hints at where each existential came from.
pub fn fresh_primed_like(old : &Ident) -> Ident {
    let stamp = IDENT_SERIAL.fetch_add(1, Relaxed);
    Ident { kind : Primed, name : old.name.clone(), stamp }
}

impl Ident {
    pub fn is_primed(&self) -> bool {
        match self.kind {
            Primed => true,
            Plain => false
        }
    }
}

impl std::fmt::Debug for Ident {
    fn fmt(&self, f : &mut std::fmt::Formatter) -> std::fmt::Result {
        match self.kind {
            Primed => write!(f, "{}'{}", self.name, self.stamp),
            Plain => write!(f, "{}${}", self.name, self.stamp)
        }
    }
}

/// Field names, totally ordered so that record layouts can be kept
/// sorted and merged positionally while matching.
#[derive(Clone, PartialEq, PartialOrd, Ord, Eq, Hash)]
pub struct Fieldname(Arc<str>);

pub fn mk_field(name : &str) -> Fieldname {
    Fieldname(Arc::from(name))
}

impl std::fmt::Debug for Fieldname {
    fn fmt(&self, f : &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Program variables. These denote stack locations, so they are only
/// ever compared for syntactic equality; the unifier never binds one.
#[derive(Clone, PartialEq, PartialOrd, Ord, Eq, Hash)]
pub struct Pvar(Arc<str>);

pub fn mk_pvar(name : &str) -> Pvar {
    Pvar(Arc::from(name))
}

impl std::fmt::Debug for Pvar {
    fn fmt(&self, f : &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "&{}", self.0)
    }
}

/// Nominal type tokens. The matcher treats types as opaque hints and
/// compares them syntactically, so a name is all that is carried.
#[derive(Clone, PartialEq, PartialOrd, Ord, Eq, Hash)]
pub struct Typ(Arc<str>);

pub fn mk_typ(name : &str) -> Typ {
    Typ(Arc::from(name))
}

impl std::fmt::Debug for Typ {
    fn fmt(&self, f : &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
