pub mod condition;
pub mod item;
pub mod loan;
pub mod requestor;

pub use condition::*;
pub use item::*;
pub use loan::*;
pub use requestor::*;
