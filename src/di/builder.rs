use crate::di::Container;
use std::sync::Arc;

/// Builder for the application container
///
/// Registers infrastructure that has no container dependencies of its own;
/// modules then register the rest on the built container.
///
/// # Example
/// ```
/// use data_api::di::ContainerBuilder;
///
/// struct Settings { verbose: bool }
///
/// let container = ContainerBuilder::new()
///     .register(Settings { verbose: true })
///     .build();
/// assert!(container.resolve::<Settings>().unwrap().verbose);
/// ```
#[derive(Default)]
pub struct ContainerBuilder {
    container: Container,
}

impl ContainerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T: 'static + Send + Sync>(mut self, instance: T) -> Self {
        self.container.register(instance);
        self
    }

    /// Bind a trait to a concrete implementation
    ///
    /// The implementation may be registered before or after the binding.
    pub fn bind<Trait, Impl, F>(mut self, caster: F) -> Self
    where
        Trait: ?Sized + 'static + Send + Sync,
        Impl: 'static + Send + Sync,
        F: Fn(Arc<Impl>) -> Arc<Trait> + 'static + Send + Sync,
    {
        self.container.bind::<Trait, Impl, F>(caster);
        self
    }

    pub fn build(self) -> Container {
        self.container
    }
}
