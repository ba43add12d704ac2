//! Monitored units and the per-round status snapshot fetched for each one.

use serde::{Deserialize, Serialize};

/// Suffix appended to every short service name before it is used as a bus key.
pub const DEFAULT_SERVICE_SUFFIX: &str = ".service";

/// A monitored service. Built once at startup, immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    /// Short name as given on the command line (rendered as the block title).
    pub name: String,
    /// Name used as the bus query key (`name` + service suffix).
    pub query_name: String,
}

impl Unit {
    /// Build a unit from a short service name and the configured suffix.
    #[must_use]
    pub fn new(name: impl Into<String>, suffix: &str) -> Self {
        let name = name.into();
        let query_name = format!("{name}{suffix}");
        Self { name, query_name }
    }

    /// Build the unit list in argument order.
    #[must_use]
    pub fn from_names<I, S>(names: I, suffix: &str) -> Vec<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        names.into_iter().map(|n| Self::new(n, suffix)).collect()
    }
}

/// The four status axes reported for a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateCategory {
    LoadState,
    ActiveState,
    SubState,
    UnitFileState,
}

impl StateCategory {
    /// All categories in render order.
    pub const ALL: [Self; 4] = [
        Self::LoadState,
        Self::ActiveState,
        Self::SubState,
        Self::UnitFileState,
    ];

    /// Bus property name for this category.
    #[must_use]
    pub const fn property(self) -> &'static str {
        match self {
            Self::LoadState => "LoadState",
            Self::ActiveState => "ActiveState",
            Self::SubState => "SubState",
            Self::UnitFileState => "UnitFileState",
        }
    }

    /// Label written in front of the value (`"LoadState: "`).
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::LoadState => "LoadState: ",
            Self::ActiveState => "ActiveState: ",
            Self::SubState => "SubState: ",
            Self::UnitFileState => "UnitFileState: ",
        }
    }
}

/// The four property values fetched for one unit in one refresh round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitSnapshot {
    pub load_state: String,
    pub active_state: String,
    pub sub_state: String,
    pub unit_file_state: String,
}

impl UnitSnapshot {
    /// Value for one category.
    #[must_use]
    pub fn get(&self, category: StateCategory) -> &str {
        match category {
            StateCategory::LoadState => &self.load_state,
            StateCategory::ActiveState => &self.active_state,
            StateCategory::SubState => &self.sub_state,
            StateCategory::UnitFileState => &self.unit_file_state,
        }
    }

    /// `(category, value)` pairs in render order.
    pub fn fields(&self) -> impl Iterator<Item = (StateCategory, &str)> {
        StateCategory::ALL.into_iter().map(|c| (c, self.get(c)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_name_appends_suffix() {
        let unit = Unit::new("nginx", DEFAULT_SERVICE_SUFFIX);
        assert_eq!(unit.name, "nginx");
        assert_eq!(unit.query_name, "nginx.service");
    }

    #[test]
    fn from_names_keeps_argument_order() {
        let units = Unit::from_names(["b", "a", "c"], ".service");
        let names: Vec<&str> = units.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, ["b", "a", "c"]);
    }

    #[test]
    fn snapshot_fields_follow_render_order() {
        let snap = UnitSnapshot {
            load_state: "loaded".into(),
            active_state: "active".into(),
            sub_state: "running".into(),
            unit_file_state: "enabled".into(),
        };
        let fields: Vec<(StateCategory, &str)> = snap.fields().collect();
        assert_eq!(
            fields,
            [
                (StateCategory::LoadState, "loaded"),
                (StateCategory::ActiveState, "active"),
                (StateCategory::SubState, "running"),
                (StateCategory::UnitFileState, "enabled"),
            ]
        );
    }

    #[test]
    fn labels_match_property_names() {
        for category in StateCategory::ALL {
            assert_eq!(category.label(), format!("{}: ", category.property()));
        }
    }
}
