pub mod prelude {
    pub use super::limits;
    pub use super::time::{Tick, VTime};
    pub use super::task::*;
    pub use super::taskset_serde::prelude::*;
}

pub mod limits;
pub mod time;
pub mod task;
pub mod taskset_serde;
