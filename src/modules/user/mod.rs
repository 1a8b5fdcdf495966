pub mod controller;
pub mod domain;
pub mod repository;

pub use controller::UserController;
pub use domain::{CreateUserRequest, UpdateUserRequest, User};
pub use repository::{DocumentUserRepository, UserRepository};
