//! Name normalisation applied to titles and person names before they are
//! compared against graph labels or stored.

pub mod names;

pub use names::clean_name;
