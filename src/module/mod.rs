use crate::di::Container;
use crate::error::Result;

/// A unit of registration: adds its providers and controllers to the
/// container, in dependency order.
///
/// # Example
/// ```
/// use data_api::di::Container;
/// use data_api::module::Module;
///
/// struct Greeting(&'static str);
/// struct GreetingModule;
///
/// impl Module for GreetingModule {
///     fn register(container: &mut Container) -> data_api::Result<()> {
///         container.register(Greeting("hello"));
///         Ok(())
///     }
/// }
///
/// let mut container = Container::new();
/// GreetingModule::register(&mut container).unwrap();
/// assert_eq!(container.resolve::<Greeting>().unwrap().0, "hello");
/// ```
pub trait Module {
    fn register(container: &mut Container) -> Result<()>;
}
