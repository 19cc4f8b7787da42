pub mod karlin;
pub mod search_space;
pub mod tables;

pub use karlin::*;
pub use search_space::*;
pub use tables::KarlinParams;
