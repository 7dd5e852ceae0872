mod bucket;
mod evaluator;
mod result;

pub use bucket::*;
pub use evaluator::*;
pub use result::*;
