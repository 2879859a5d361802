pub mod errors;
pub mod interpreter;
pub mod keywords;

pub use errors::*;
pub use interpreter::*;
pub use keywords::*;
