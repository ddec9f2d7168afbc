pub mod error;
#[cfg(test)]
pub mod memory;
pub mod model;
pub mod repo;
pub mod services;
pub mod validation;

pub use error::UserError;
pub use model::User;
pub use repo::{PgUserDb, UserDb};
pub use services::UserService;
pub use validation::UserValidator;
