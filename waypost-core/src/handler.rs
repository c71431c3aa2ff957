// Handler descriptors and call-time parameter binding
//
// A handler is an async function over a name-keyed argument map. Its
// parameter list (name, declared type, position) is declared once when the
// handler is built, so binding at call time never inspects the function.
//
// Binding rules, applied per declared parameter in declaration order:
// - declared type is `HttpRequest` → a fresh request for this call
// - the route has a bound parameter with the same name → that value
// - otherwise the parameter is left out of the map

use crate::{Error, HttpRequest, HttpResponse};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Future returned by a handler invocation
pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<HttpResponse, Error>> + Send>>;

type HandlerFn = Arc<dyn Fn(Arguments) -> HandlerFuture + Send + Sync>;

/// Values bound to a route by name, supplied by the caller or by discovery.
pub type BindParameters = HashMap<String, Value>;

/// One declared handler parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub type_id: TypeId,
    pub type_name: &'static str,
    pub position: usize,
}

impl Parameter {
    /// Whether this parameter receives the injected request.
    pub fn is_request(&self) -> bool {
        self.type_id == TypeId::of::<HttpRequest>()
    }
}

/// A callable route target plus its declared parameter list.
///
/// ```
/// use waypost_core::{Error, Handler, HttpResponse};
///
/// let show_user = Handler::new(|args| async move {
///     let id: u64 = args.get("id")?;
///     Ok::<_, Error>(HttpResponse::text(format!("user {}", id)))
/// })
/// .request("req")
/// .param::<u64>("id");
///
/// assert_eq!(show_user.parameters().len(), 2);
/// ```
#[derive(Clone)]
pub struct Handler {
    f: HandlerFn,
    params: Vec<Parameter>,
}

impl Handler {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(Arguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<HttpResponse, Error>> + Send + 'static,
    {
        Self {
            f: Arc::new(move |args| -> HandlerFuture { Box::pin(f(args)) }),
            params: Vec::new(),
        }
    }

    /// Declare the next parameter with its type.
    pub fn param<T: 'static>(mut self, name: impl Into<String>) -> Self {
        let position = self.params.len();
        self.params.push(Parameter {
            name: name.into(),
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            position,
        });
        self
    }

    /// Declare the next parameter as the injected request.
    pub fn request(self, name: impl Into<String>) -> Self {
        self.param::<HttpRequest>(name)
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.params
    }

    /// Build the argument map for one call.
    pub fn bind(&self, bound: &BindParameters, request: &HttpRequest) -> Arguments {
        let mut values = HashMap::with_capacity(self.params.len());

        for param in &self.params {
            if param.is_request() {
                values.insert(param.name.clone(), Argument::Request(request.clone()));
                continue;
            }

            if let Some(value) = bound.get(&param.name) {
                values.insert(param.name.clone(), Argument::Value(value.clone()));
            }
        }

        Arguments { values }
    }

    /// Invoke the handler. Errors come back exactly as the handler produced them.
    pub fn invoke(&self, args: Arguments) -> HandlerFuture {
        (self.f)(args)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// A bound argument
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    Request(HttpRequest),
    Value(Value),
}

/// Name-keyed arguments handed to a handler.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    values: HashMap<String, Argument>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, argument: Argument) {
        self.values.insert(name.into(), argument);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The injected request bound to `name`.
    pub fn request(&self, name: &str) -> Option<&HttpRequest> {
        match self.values.get(name) {
            Some(Argument::Request(req)) => Some(req),
            _ => None,
        }
    }

    /// The raw bound value for `name`.
    pub fn value(&self, name: &str) -> Option<&Value> {
        match self.values.get(name) {
            Some(Argument::Value(value)) => Some(value),
            _ => None,
        }
    }

    /// Deserialize the bound value for `name`.
    ///
    /// Path captures arrive as strings, so a string that does not deserialize
    /// directly is retried as a JSON literal (`"42"` → `42`).
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Result<T, Error> {
        let value = self
            .value(name)
            .ok_or_else(|| Error::MissingArgument(name.to_string()))?;

        match serde_json::from_value::<T>(value.clone()) {
            Ok(v) => Ok(v),
            Err(e) => match value {
                Value::String(s) => serde_json::from_str(s)
                    .map_err(|_| Error::Deserialization(format!("argument {}: {}", name, e))),
                _ => Err(Error::Deserialization(format!("argument {}: {}", name, e))),
            },
        }
    }

    /// Like [`Arguments::get`], but an unbound parameter yields `None`.
    pub fn get_opt<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, Error> {
        if self.value(name).is_none() {
            return Ok(None);
        }
        self.get(name).map(Some)
    }
}
