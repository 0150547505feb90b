// export modules
pub mod exchange;
pub mod signing;
pub mod trading;
pub mod validation;

pub use exchange::*;
pub use trading::*;
pub use validation::*;
