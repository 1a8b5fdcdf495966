use std::sync::Arc;

use crate::di::{Container, HasContainer};

/// Router state: the shared container every handler resolves from.
#[derive(Clone)]
pub struct AppState {
    pub container: Arc<Container>,
}

impl AppState {
    pub fn new(container: Arc<Container>) -> Self {
        Self { container }
    }
}

impl HasContainer for AppState {
    fn container(&self) -> &Container {
        &self.container
    }
}
