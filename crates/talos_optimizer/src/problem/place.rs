use crate::define_index_newtype;

use super::location::Location;

define_index_newtype!(HubIdx, Hub);

/// A worker's home base. Hubs carry no tasks and no arrival window.
#[derive(Debug, Clone, PartialEq)]
pub struct Hub {
    external_id: String,
    location: Option<Location>,
}

impl Hub {
    pub fn new(external_id: String, location: Option<Location>) -> Self {
        Hub {
            external_id,
            location,
        }
    }

    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    pub fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }
}

/// Handle to a visitable place. Two references compare equal exactly when
/// they name the same hub or the same job, regardless of coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaceRef {
    Hub(HubIdx),
    Job(super::job::JobIdx),
}

impl PlaceRef {
    pub fn is_hub(&self) -> bool {
        matches!(self, PlaceRef::Hub(_))
    }
}
