pub mod app;
pub mod database;
pub mod levels;
pub mod logging;

pub use app::*;
pub use database::*;
pub use levels::*;
pub use logging::*;
