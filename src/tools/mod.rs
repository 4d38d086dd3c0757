pub mod info;
pub mod rebuild;
pub mod search;

pub use info::*;
pub use rebuild::*;
pub use search::*;
