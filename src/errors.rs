use std::fmt::Debug;

/// All of the functions in here handle contract violations : situations
/// that can only be reached when a caller hands the matcher ill-formed
/// inputs (duplicate variables in a free-variable set, heaps with two
/// predicates rooted at the same location, parameter bodies with no
/// conjuncts, and so on). Ordinary match failures are never routed here;
/// those are just `None` values that the backtracking search consumes.
/// A contract violation prints a diagnostic naming the offender and then
/// aborts loudly. There is no recovery path.


pub fn err_rebound_ident<T : Debug>(loc : u32, id : &T) -> ! {
    eprintln!("subst line {}; tried to extend a substitution at an identifier that is already bound. The free-variable set passed to the matcher most likely contains a duplicate. Identifier was {:?}\n", loc, id);
    panic!("contract violation : rebound identifier")
}

pub fn err_nonprimed_key<T : Debug>(loc : u32, id : &T) -> ! {
    eprintln!("subst line {}; substitution domains may only contain primed identifiers, but a caller tried to bind {:?}\n", loc, id);
    panic!("contract violation : non-primed identifier in substitution domain")
}

pub fn err_join_collision<T : Debug>(loc : u32, id : &T) -> ! {
    eprintln!("subst line {}; the two substitutions being joined both bind {:?}; joined substitutions must have disjoint domains\n", loc, id);
    panic!("contract violation : substitution join collision")
}

pub fn err_list_len(loc : u32, len1 : usize, len2 : usize) -> ! {
    eprintln!("unify line {}; expression lists being matched elementwise must have equal lengths, but got {} and {}\n", loc, len1, len2);
    panic!("contract violation : mismatched list lengths")
}

pub fn err_para_arity(loc : u32, num_formals : usize, num_actuals : usize) -> ! {
    eprintln!("hprop line {}; a list-segment parameter with {} shared formals was instantiated with {} actuals\n", loc, num_formals, num_actuals);
    panic!("contract violation : parameter arity mismatch")
}

pub fn err_empty_para_body(loc : u32) -> ! {
    eprintln!("matcher line {}; the body of a list-segment parameter must contain at least one spatial conjunct, but an empty body was found\n", loc);
    panic!("contract violation : empty parameter body")
}

pub fn err_dup_root<T : Debug>(loc : u32, e : &T) -> ! {
    eprintln!("hprop line {}; a heap may contain at most one predicate rooted at a given location, but two were rooted at {:?}\n", loc, e);
    panic!("contract violation : duplicate root in heap")
}

pub fn err_isel_sanity<T : Debug>(loc : u32, idx : &T) -> ! {
    eprintln!("unify line {}; while matching array cells, the instantiated pattern index {:?} still mentions a variable of the free-variable set. Indices must be ground by the time cells are compared\n", loc, idx);
    panic!("contract violation : non-ground array index")
}

pub fn err_dup_fv<T : Debug>(loc : u32, id : &T) -> ! {
    eprintln!("matcher line {}; the free-variable set passed to the matcher contains {:?} twice\n", loc, id);
    panic!("contract violation : duplicate in free-variable set")
}

pub fn err_missing_state(loc : u32) -> ! {
    eprintln!("iter line {}; asked for the filter state of an iterator whose focus was never accepted by a filter\n", loc);
    panic!("contract violation : missing iterator state")
}

pub fn err_para_renaming<T : Debug>(loc : u32, e : &T) -> ! {
    eprintln!("para line {}; parameter synthesis needed a fresh identifier for {:?}, but the correspondence never assigned one\n", loc, e);
    panic!("contract violation : expression missing from synthesis renaming")
}
