pub mod context;
pub mod eval;
pub mod eval_cache;
pub mod ordering;
pub mod pesto;
pub mod picker;
pub mod search;
pub mod see;
pub mod tt;
