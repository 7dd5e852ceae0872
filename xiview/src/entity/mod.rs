mod builder;
mod crosslink;
mod index;
mod meta;
mod peptide_match;
mod protein;
mod selection;
mod store;

pub use builder::*;
pub use crosslink::*;
pub use index::*;
pub use meta::*;
pub use peptide_match::*;
pub use protein::*;
pub use selection::*;
pub use store::*;
