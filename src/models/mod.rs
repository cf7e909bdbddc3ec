// Domain models

pub mod level;
pub mod progress;
pub mod user;
pub mod validation;

pub use level::*;
pub use progress::*;
pub use user::*;
pub use validation::*;
