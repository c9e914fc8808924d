//! Test suites for the service runtime.

mod dispatch_behaviour;
pub(crate) mod support;
