use once_cell::sync::Lazy;
use parking_lot::RwLock;

/// The one tuning knob the matcher reads. `abs_struct` controls how
/// tolerant record matching is allowed to be :
///```pseudo
/// 0   records must line up field for field
/// > 0 the left record may carry fields the pattern never mentions,
///     and those fields are silently dropped while matching
///```
/// The nonzero levels lose information (a match can succeed against a
/// record that stores more than the pattern claims), and that loss is
/// deliberate; abstraction uses it to collapse shapes that differ only
/// in fields it has decided not to track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tunables {
    pub abs_struct : i32,
}

pub static TUNABLES : Lazy<RwLock<Tunables>> = Lazy::new(|| {
    RwLock::new(Tunables { abs_struct : 0 })
});

pub fn abs_struct() -> i32 {
    TUNABLES.read().abs_struct
}

pub fn set_abs_struct(level : i32) {
    TUNABLES.write().abs_struct = level;
}
