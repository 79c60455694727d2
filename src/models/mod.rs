pub mod generation;
pub mod request;

pub use generation::*;
pub use request::*;
