// Controllers: named collections of handlers addressed as (controller, method)

use crate::handler::Handler;
use crate::logging::debug;
use std::collections::HashMap;

/// A controller and its actions.
///
/// Routes refer to controller actions by name, either with a
/// `["Controller", "method"]` pair or with a bare method name inside a
/// controller group.
#[derive(Debug, Clone)]
pub struct Controller {
    name: String,
    actions: HashMap<String, Handler>,
}

impl Controller {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            actions: HashMap::new(),
        }
    }

    /// Add an action. A repeated method name replaces the earlier handler.
    pub fn action(mut self, method: impl Into<String>, handler: Handler) -> Self {
        self.actions.insert(method.into(), handler);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get_action(&self, method: &str) -> Option<&Handler> {
        self.actions.get(method)
    }
}

/// Controllers known to a router, by name.
#[derive(Debug, Clone, Default)]
pub struct ControllerRegistry {
    controllers: HashMap<String, Controller>,
}

impl ControllerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, controller: Controller) {
        debug!(
            controller = controller.name(),
            actions = controller.actions.len(),
            "Controller registered"
        );
        self.controllers.insert(controller.name.clone(), controller);
    }

    pub fn resolve(&self, controller: &str, method: &str) -> Option<&Handler> {
        self.controllers
            .get(controller)
            .and_then(|c| c.get_action(method))
    }

    pub fn contains(&self, controller: &str) -> bool {
        self.controllers.contains_key(controller)
    }

    pub fn clear(&mut self) {
        self.controllers.clear();
    }
}
