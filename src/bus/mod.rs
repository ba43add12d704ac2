//! Control-plane bus collaborator: unit resolution and property reads.
//!
//! The dashboard only needs two query primitives from the service manager:
//! resolve a unit name to an addressable object, and read one string property
//! from that object. [`ControlBus`] is the seam; [`busctl::BusctlBus`] is the
//! production implementation and tests substitute a scripted fake.

#![allow(missing_docs)]

pub mod busctl;
pub mod fetcher;
pub mod pool;

use std::fmt;

use crate::core::errors::Result;

/// Well-known bus name of the service manager.
pub const MANAGER_DESTINATION: &str = "org.freedesktop.systemd1";
/// Object path of the service manager itself.
pub const MANAGER_PATH: &str = "/org/freedesktop/systemd1";
/// Interface carrying `LoadUnit`.
pub const MANAGER_INTERFACE: &str = "org.freedesktop.systemd1.Manager";
/// Status interface every unit object implements.
pub const UNIT_INTERFACE: &str = "org.freedesktop.systemd1.Unit";

/// Opaque reference to a resolved unit object (a bus object path).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnitObject(String);

impl UnitObject {
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UnitObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Request/response access to the service manager.
///
/// Implementations must be shareable across fetch workers.
pub trait ControlBus: Send + Sync {
    /// Check that the bus is reachable. Called once at startup.
    fn ping(&self) -> Result<()>;

    /// Resolve a full unit name (`nginx.service`) to its object reference.
    fn resolve_unit(&self, unit_name: &str) -> Result<UnitObject>;

    /// Read one string-typed property from `object` on `interface`.
    fn get_property(&self, object: &UnitObject, interface: &str, property: &str)
    -> Result<String>;
}
