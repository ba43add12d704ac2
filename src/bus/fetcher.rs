//! BusStateFetcher: one unit's four status properties per refresh round.

#![allow(missing_docs)]

use std::sync::Arc;

use crate::bus::{ControlBus, UNIT_INTERFACE};
use crate::core::errors::Result;
use crate::core::units::{StateCategory, Unit, UnitSnapshot};

/// Reads a [`UnitSnapshot`] over the control bus.
///
/// The unit object is resolved once per call and reused for the four property
/// reads. Any failing round trip fails the whole snapshot; the caller renders
/// it as a per-unit fetch error and retries next round.
#[derive(Clone)]
pub struct BusStateFetcher {
    bus: Arc<dyn ControlBus>,
}

impl BusStateFetcher {
    #[must_use]
    pub fn new(bus: Arc<dyn ControlBus>) -> Self {
        Self { bus }
    }

    pub fn fetch(&self, unit: &Unit) -> Result<UnitSnapshot> {
        let object = self.bus.resolve_unit(&unit.query_name)?;
        let read = |category: StateCategory| {
            self.bus
                .get_property(&object, UNIT_INTERFACE, category.property())
        };

        Ok(UnitSnapshot {
            load_state: read(StateCategory::LoadState)?,
            active_state: read(StateCategory::ActiveState)?,
            sub_state: read(StateCategory::SubState)?,
            unit_file_state: read(StateCategory::UnitFileState)?,
        })
    }
}

impl std::fmt::Debug for BusStateFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BusStateFetcher").finish_non_exhaustive()
    }
}
