use crate::error::{DataApiError, Result};
use dashmap::DashMap;
use std::any::{Any, TypeId};
use std::sync::Arc;

type Instance = Arc<dyn Any + Send + Sync>;

/// Turns an erased implementation into an erased `Arc<dyn Trait>`.
type Caster = Arc<dyn Fn(Instance) -> Option<Instance> + Send + Sync>;

#[derive(Clone)]
struct Binding {
    implementation: TypeId,
    cast: Caster,
}

/// Thread-safe registry of shared services.
///
/// Services are stored once as `Arc<T>` and handed out by type. Trait objects
/// are resolved through a binding from `dyn Trait` to a registered
/// implementation.
#[derive(Clone, Default)]
pub struct Container {
    instances: DashMap<TypeId, Instance>,
    bindings: DashMap<TypeId, Binding>,
}

impl Container {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T: 'static + Send + Sync>(&mut self, instance: T) -> &mut Self {
        self.instances
            .insert(TypeId::of::<T>(), Arc::new(instance) as Instance);
        self
    }

    pub fn bind<Trait, Impl, F>(&mut self, caster: F) -> &mut Self
    where
        Trait: ?Sized + 'static + Send + Sync,
        Impl: 'static + Send + Sync,
        F: Fn(Arc<Impl>) -> Arc<Trait> + 'static + Send + Sync,
    {
        let cast: Caster = Arc::new(move |instance: Instance| {
            let concrete = instance.downcast::<Impl>().ok()?;
            Some(Arc::new(caster(concrete)) as Instance)
        });

        self.bindings.insert(
            TypeId::of::<Trait>(),
            Binding {
                implementation: TypeId::of::<Impl>(),
                cast,
            },
        );
        self
    }

    pub fn resolve<T: 'static + Send + Sync>(&self) -> Result<Arc<T>> {
        let instance = self
            .instances
            .get(&TypeId::of::<T>())
            .map(|entry| entry.value().clone())
            .ok_or_else(|| DataApiError::DependencyNotFound {
                type_name: std::any::type_name::<T>().to_string(),
            })?;

        instance
            .downcast::<T>()
            .map_err(|_| DataApiError::DowncastFailed {
                type_name: std::any::type_name::<T>().to_string(),
            })
    }

    pub fn resolve_trait<T: ?Sized + 'static + Send + Sync>(&self) -> Result<Arc<T>> {
        let type_name = std::any::type_name::<T>();

        let binding = self
            .bindings
            .get(&TypeId::of::<T>())
            .map(|entry| entry.value().clone())
            .ok_or_else(|| DataApiError::DependencyNotFound {
                type_name: format!("No binding for '{}'", type_name),
            })?;

        let instance = self
            .instances
            .get(&binding.implementation)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| DataApiError::DependencyNotFound {
                type_name: format!("Implementation for '{}' not registered", type_name),
            })?;

        let wrapper = (binding.cast)(instance)
            .and_then(|cast| cast.downcast::<Arc<T>>().ok())
            .ok_or_else(|| DataApiError::DowncastFailed {
                type_name: type_name.to_string(),
            })?;

        Ok(wrapper.as_ref().clone())
    }

    pub fn contains<T: 'static>(&self) -> bool {
        let type_id = TypeId::of::<T>();
        self.instances.contains_key(&type_id) || self.bindings.contains_key(&type_id)
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter {
        value: i32,
    }

    trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }

    struct English;

    impl Greeter for English {
        fn greet(&self) -> String {
            "hello".to_string()
        }
    }

    #[test]
    fn test_register_and_resolve() {
        let mut container = Container::new();
        container.register(Counter { value: 42 });
        let counter = container.resolve::<Counter>().unwrap();
        assert_eq!(counter.value, 42);
        assert!(container.contains::<Counter>());
    }

    #[test]
    fn test_resolve_bound_trait() {
        let mut container = Container::new();
        container
            .register(English)
            .bind::<dyn Greeter, English, _>(|g| g as Arc<dyn Greeter>);
        let greeter = container.resolve_trait::<dyn Greeter>().unwrap();
        assert_eq!(greeter.greet(), "hello");
    }

    #[test]
    fn test_missing_dependency_is_reported() {
        let container = Container::new();
        let err = container.resolve::<Counter>().err().unwrap();
        assert!(matches!(err, DataApiError::DependencyNotFound { .. }));
    }

    #[test]
    fn test_binding_without_implementation() {
        let mut container = Container::new();
        container.bind::<dyn Greeter, English, _>(|g| g as Arc<dyn Greeter>);
        let err = container.resolve_trait::<dyn Greeter>().err().unwrap();
        assert!(err.to_string().contains("not registered"));
    }
}
