//! Type-erased handler descriptors.
//!
//! Any async function whose arguments implement [`FromParam`](crate::param::FromParam) and
//! whose output implements [`IntoModel`] becomes a [`RouteHandler`] through [`handler_fn`],
//! which also records the parameter names the binder looks up.

use std::marker::PhantomData;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::DispatchError;
use crate::fn_trait::FnTrait;
use crate::param::{FromParams, ParamKind, ParamValue};

/// The value a handler produces, handed to the route's render strategy.
pub type Model = serde_json::Value;

/// Convenience result type for handler functions.
pub type HandlerResult<T> = Result<T, DispatchError>;

#[async_trait]
pub trait RouteHandler: Send + Sync {
    /// Parameter names in declaration order.
    fn param_names(&self) -> &[&'static str];

    /// Kind and nullability of each argument, in declaration order.
    fn param_kinds(&self) -> Vec<(ParamKind, bool)>;

    /// Invokes the handler with one bound value per parameter.
    async fn invoke(&self, args: Vec<ParamValue>) -> Result<Model, DispatchError>;
}

/// Converts a handler's output into a [`Model`].
pub trait IntoModel: Send {
    fn into_model(self) -> Result<Model, DispatchError>;
}

impl<T, E> IntoModel for Result<T, E>
where
    T: Serialize + Send,
    E: Into<DispatchError> + Send,
{
    fn into_model(self) -> Result<Model, DispatchError> {
        let value = self.map_err(Into::<DispatchError>::into)?;
        serde_json::to_value(value).map_err(DispatchError::internal)
    }
}

/// a `FnTrait` holder which represents any async Fn with named parameters
pub struct FnHandler<F, Args> {
    f: F,
    names: Vec<&'static str>,
    _phantom: PhantomData<fn(Args)>,
}

impl<F, Args> FnHandler<F, Args>
where
    F: FnTrait<Args>,
{
    fn new(f: F, names: &[&'static str]) -> Self {
        Self { f, names: names.to_vec(), _phantom: PhantomData }
    }
}

/// Wraps `f` as a handler whose arguments are bound from the request keys `names`.
///
/// The names are matched to the arguments by position; a count mismatch is reported when
/// the registry is built.
pub fn handler_fn<F, Args>(f: F, names: &[&'static str]) -> FnHandler<F, Args>
where
    F: FnTrait<Args>,
{
    FnHandler::new(f, names)
}

impl<F, Args> std::fmt::Debug for FnHandler<F, Args> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnHandler").field("names", &self.names).finish_non_exhaustive()
    }
}

#[async_trait]
impl<F, Args> RouteHandler for FnHandler<F, Args>
where
    F: FnTrait<Args>,
    F::Output: IntoModel,
    Args: FromParams,
{
    fn param_names(&self) -> &[&'static str] {
        &self.names
    }

    fn param_kinds(&self) -> Vec<(ParamKind, bool)> {
        Args::kinds()
    }

    async fn invoke(&self, args: Vec<ParamValue>) -> Result<Model, DispatchError> {
        let Some(args) = Args::from_params(args) else {
            return Err(DispatchError::internal("bound values do not match the handler signature"));
        };
        self.f.call(args).await.into_model()
    }
}
