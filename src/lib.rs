pub mod prelude {
    pub use super::common::prelude::*;
    pub use super::offline::prelude::*;
    pub use super::runtime::prelude::*;
}

pub mod common;
pub mod offline;
pub mod runtime;
