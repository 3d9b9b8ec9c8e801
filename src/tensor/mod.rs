mod dense;
mod error;
mod numeric;
mod utils;

pub use dense::*;
pub use error::*;
pub use numeric::*;
pub use utils::{increment_index, IndexIterator};
