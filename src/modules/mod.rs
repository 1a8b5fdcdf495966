pub mod data;
pub mod health;
pub mod user;

use crate::prelude::*;
use data::DataController;
use user::{DocumentUserRepository, UserController, UserRepository};

/// Root application module
///
/// Expects the [`Database`](crate::infrastructure::Database) handle to be
/// registered already; binds the user repository and registers every
/// controller.
pub struct AppModule;

impl Module for AppModule {
    fn register(container: &mut Container) -> Result<()> {
        let repository = DocumentUserRepository::inject(container)?;
        container
            .register(repository)
            .bind::<dyn UserRepository, DocumentUserRepository, _>(|repo| {
                repo as Arc<dyn UserRepository>
            });

        let users = UserController::inject(container)?;
        container.register(users);

        let data = DataController::inject(container)?;
        container.register(data);

        tracing::debug!(services = container.len(), "AppModule registered");
        Ok(())
    }
}
