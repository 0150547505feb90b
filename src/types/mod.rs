// export modules
pub mod api;
pub mod settings;
pub mod trading;

pub use api::*;
pub use settings::*;
pub use trading::*;
