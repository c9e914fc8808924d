//! Endpoint registration and lookup.
//!
//! Handlers are registered on a [`RegistryBuilder`] during start-up and frozen
//! into an [`EndpointRegistry`]. User-originated and service-originated
//! requests are served from two independent tables, so the same path may be
//! registered once in each.

mod descriptor;
mod invocation;

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::future::Future;

use thiserror::Error;
use uuid::Uuid;

use cryptic_wire::EndpointPath;

pub use self::descriptor::{EndpointDescriptor, ParameterMismatch, ValueKind};
pub(crate) use self::invocation::BoxedHandler;
pub use self::invocation::{HandlerResult, Invocation};

/// Which table an endpoint belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Requests relayed from an end user.
    User,
    /// Requests from another microservice.
    Service,
}

impl fmt::Display for Origin {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::User => "user",
            Self::Service => "service",
        })
    }
}

/// Errors raised while registering endpoints.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// The path is already registered in the same table.
    #[error("{origin} endpoint {path} is already registered")]
    Duplicate {
        /// Table the path was registered in.
        origin: Origin,
        /// Conflicting path.
        path: EndpointPath,
    },
    /// The key and kind lists have different lengths.
    #[error("{origin} endpoint {path} declares {keys} keys but {kinds} kinds")]
    DescriptorArity {
        /// Table the path was registered in.
        origin: Origin,
        /// Offending path.
        path: EndpointPath,
        /// Number of required keys.
        keys: usize,
        /// Number of required kinds.
        kinds: usize,
    },
}

/// A registered handler with its descriptor.
pub(crate) struct Endpoint<C> {
    descriptor: EndpointDescriptor,
    handler: BoxedHandler<C>,
}

impl<C> Endpoint<C> {
    pub(crate) const fn descriptor(&self) -> &EndpointDescriptor {
        &self.descriptor
    }

    pub(crate) fn handler(&self) -> BoxedHandler<C> {
        self.handler.clone()
    }
}

struct EndpointTable<C> {
    origin: Origin,
    endpoints: HashMap<EndpointPath, Endpoint<C>>,
}

impl<C> EndpointTable<C> {
    fn new(origin: Origin) -> Self {
        Self {
            origin,
            endpoints: HashMap::new(),
        }
    }

    fn insert(
        &mut self,
        path: EndpointPath,
        keys: &[&str],
        kinds: &[ValueKind],
        handler: BoxedHandler<C>,
    ) -> Result<(), RegistryError> {
        let Some(descriptor) = EndpointDescriptor::new(keys, kinds) else {
            return Err(RegistryError::DescriptorArity {
                origin: self.origin,
                path,
                keys: keys.len(),
                kinds: kinds.len(),
            });
        };
        match self.endpoints.entry(path) {
            Entry::Occupied(entry) => Err(RegistryError::Duplicate {
                origin: self.origin,
                path: entry.key().clone(),
            }),
            Entry::Vacant(entry) => {
                entry.insert(Endpoint {
                    descriptor,
                    handler,
                });
                Ok(())
            }
        }
    }
}

/// Mutable registry used while the service is being assembled.
pub struct RegistryBuilder {
    user: EndpointTable<Uuid>,
    service: EndpointTable<String>,
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RegistryBuilder {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("RegistryBuilder")
            .field("user", &self.user.endpoints.keys().collect::<Vec<_>>())
            .field("service", &self.service.endpoints.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl RegistryBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            user: EndpointTable::new(Origin::User),
            service: EndpointTable::new(Origin::Service),
        }
    }

    /// Registers a handler for requests relayed from end users.
    ///
    /// `keys` and `kinds` are paired positionally; every key must be present
    /// with exactly its kind before the handler runs.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Duplicate`] when `path` is already registered
    /// for users and [`RegistryError::DescriptorArity`] when `keys` and
    /// `kinds` differ in length.
    pub fn register_user_endpoint<F, Fut>(
        &mut self,
        path: impl Into<EndpointPath>,
        keys: &[&str],
        kinds: &[ValueKind],
        handler: F,
    ) -> Result<&mut Self, RegistryError>
    where
        F: Fn(Invocation<Uuid>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.user
            .insert(path.into(), keys, kinds, invocation::boxed(handler))?;
        Ok(self)
    }

    /// Registers a handler for requests from other microservices.
    ///
    /// # Errors
    ///
    /// As for [`RegistryBuilder::register_user_endpoint`], against the
    /// service table.
    pub fn register_service_endpoint<F, Fut>(
        &mut self,
        path: impl Into<EndpointPath>,
        keys: &[&str],
        kinds: &[ValueKind],
        handler: F,
    ) -> Result<&mut Self, RegistryError>
    where
        F: Fn(Invocation<String>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.service
            .insert(path.into(), keys, kinds, invocation::boxed(handler))?;
        Ok(self)
    }

    /// Freezes the registrations.
    #[must_use]
    pub fn build(self) -> EndpointRegistry {
        EndpointRegistry {
            user: self.user.endpoints,
            service: self.service.endpoints,
        }
    }
}

/// Immutable path to handler tables shared by every dispatch task.
pub struct EndpointRegistry {
    user: HashMap<EndpointPath, Endpoint<Uuid>>,
    service: HashMap<EndpointPath, Endpoint<String>>,
}

impl fmt::Debug for EndpointRegistry {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("EndpointRegistry")
            .field("user", &self.user.keys().collect::<Vec<_>>())
            .field("service", &self.service.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl EndpointRegistry {
    pub(crate) fn user_endpoint(&self, path: &EndpointPath) -> Option<&Endpoint<Uuid>> {
        self.user.get(path)
    }

    pub(crate) fn service_endpoint(&self, path: &EndpointPath) -> Option<&Endpoint<String>> {
        self.service.get(path)
    }

    /// Descriptor of a user endpoint.
    #[must_use]
    pub fn user_descriptor(&self, path: &EndpointPath) -> Option<&EndpointDescriptor> {
        self.user.get(path).map(Endpoint::descriptor)
    }

    /// Descriptor of a service endpoint.
    #[must_use]
    pub fn service_descriptor(&self, path: &EndpointPath) -> Option<&EndpointDescriptor> {
        self.service.get(path).map(Endpoint::descriptor)
    }

    /// Number of user endpoints.
    #[must_use]
    pub fn user_len(&self) -> usize {
        self.user.len()
    }

    /// Number of service endpoints.
    #[must_use]
    pub fn service_len(&self) -> usize {
        self.service.len()
    }
}
