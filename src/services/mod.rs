// Business logic services

pub mod clock;
pub mod progress_service;
pub mod questionnaire;
pub mod routine_catalog;

pub use clock::{Clock, FixedClock, SystemClock};
pub use progress_service::{NotificationUpdate, ProgressService, Registration, WeeklyReport};
pub use routine_catalog::{CatalogExercise, Routine, RoutineCatalog};
