//! The route table: route name to handler and render strategy.
//!
//! A [`HandlerRegistry`] is assembled once with [`HandlerRegistry::builder`], or from a
//! [`Controller`] that declares all of its routes, and is read-only afterwards.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::RegistryError;
use crate::handler::RouteHandler;
use crate::param::ParamSpec;
use crate::render::RenderStrategy;
use crate::router::is_routable;

/// An application object exposing a set of routes.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use listener_web::{Controller, HandlerRegistry, HandlerRegistryBuilder, HandlerResult, JsonRender, handler_fn};
///
/// struct Calculator {
///     offset: i64,
/// }
///
/// impl Controller for Calculator {
///     fn register(self: Arc<Self>, routes: HandlerRegistryBuilder) -> HandlerRegistryBuilder {
///         routes.route(
///             "Add",
///             JsonRender::get(),
///             handler_fn(
///                 move |a: i64, b: i64| {
///                     let this = Arc::clone(&self);
///                     async move { HandlerResult::Ok(a + b + this.offset) }
///                 },
///                 &["a", "b"],
///             ),
///         )
///     }
/// }
///
/// let registry = HandlerRegistry::from_controller(Calculator { offset: 0 }).unwrap();
/// assert!(registry.resolve("Add").is_some());
/// ```
pub trait Controller: Send + Sync + 'static {
    fn register(self: Arc<Self>, routes: HandlerRegistryBuilder) -> HandlerRegistryBuilder;
}

/// A resolved route: its parameters, handler and render strategy.
pub struct RouteEntry {
    name: String,
    params: Vec<ParamSpec>,
    handler: Box<dyn RouteHandler>,
    renderer: Box<dyn RenderStrategy>,
}

impl RouteEntry {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    pub fn handler(&self) -> &dyn RouteHandler {
        self.handler.as_ref()
    }

    pub fn renderer(&self) -> &dyn RenderStrategy {
        self.renderer.as_ref()
    }
}

impl fmt::Debug for RouteEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteEntry").field("name", &self.name).field("params", &self.params).finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub struct HandlerRegistry {
    routes: HashMap<String, RouteEntry>,
}

impl HandlerRegistry {
    pub fn builder() -> HandlerRegistryBuilder {
        HandlerRegistryBuilder::new()
    }

    /// Builds a registry from the routes `controller` declares.
    pub fn from_controller<C: Controller>(controller: C) -> Result<Self, RegistryError> {
        Arc::new(controller).register(Self::builder()).build()
    }

    /// Looks up a route by its exact, case-sensitive name.
    pub fn resolve(&self, name: &str) -> Option<&RouteEntry> {
        self.routes.get(name)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(String::as_str)
    }
}

struct RouteBuilder {
    handler: Box<dyn RouteHandler>,
    renderer: Box<dyn RenderStrategy>,
}

pub struct HandlerRegistryBuilder {
    data: HashMap<String, RouteBuilder>,
}

impl HandlerRegistryBuilder {
    fn new() -> Self {
        Self { data: HashMap::new() }
    }

    /// Registers `handler` under `name`. A later registration of the same name replaces
    /// the earlier one.
    pub fn route<R, H>(mut self, name: impl Into<String>, renderer: R, handler: H) -> Self
    where
        R: RenderStrategy + 'static,
        H: RouteHandler + 'static,
    {
        let name = name.into();
        let route = RouteBuilder { handler: Box::new(handler), renderer: Box::new(renderer) };
        if self.data.insert(name.clone(), route).is_some() {
            warn!(route = %name, "route registered more than once, the last registration wins");
        }
        self
    }

    /// Validates every route and builds the registry.
    pub fn build(self) -> Result<HandlerRegistry, RegistryError> {
        let mut routes = HashMap::with_capacity(self.data.len());

        for (name, route) in self.data {
            if !is_routable(&name) {
                return Err(RegistryError::InvalidRouteName { name });
            }

            let names = route.handler.param_names();
            let kinds = route.handler.param_kinds();
            if names.len() != kinds.len() {
                return Err(RegistryError::ParameterMismatch { name, declared: names.len(), expected: kinds.len() });
            }

            let params = names
                .iter()
                .copied()
                .zip(kinds)
                .map(|(param_name, (kind, nullable))| ParamSpec::new(param_name, kind, nullable))
                .collect();

            debug!(route = %name, "route registered");
            let entry = RouteEntry { name: name.clone(), params, handler: route.handler, renderer: route.renderer };
            routes.insert(name, entry);
        }

        Ok(HandlerRegistry { routes })
    }
}

impl fmt::Debug for HandlerRegistryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistryBuilder").field("routes", &self.data.keys().collect::<Vec<_>>()).finish()
    }
}
