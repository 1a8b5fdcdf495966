use crate::di::Container;
use crate::error::Result;

/// Types that build themselves from services already in the container.
///
/// # Example
/// ```
/// use data_api::di::{Container, Injectable};
/// use std::sync::Arc;
///
/// struct Clock;
///
/// struct Scheduler {
///     clock: Arc<Clock>,
/// }
///
/// impl Injectable for Scheduler {
///     fn inject(container: &Container) -> data_api::Result<Self> {
///         Ok(Self { clock: container.resolve::<Clock>()? })
///     }
/// }
///
/// let mut container = Container::new();
/// container.register(Clock);
/// assert!(Scheduler::inject(&container).is_ok());
/// ```
pub trait Injectable: Sized + Send + Sync + 'static {
    /// # Errors
    /// Returns an error if any required dependency is not registered.
    fn inject(container: &Container) -> Result<Self>;
}
