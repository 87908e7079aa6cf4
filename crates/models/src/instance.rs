use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

/// Context instance id meaning "no specific instance" (dashboard, category index, front page).
pub const NO_INSTANCE: i64 = -1;

/// Kind of entity extended info attaches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceKind {
    Category,
    Course,
    Module,
    Dashboard,
}

impl InstanceKind {
    pub const ALL: [InstanceKind; 4] = [Self::Category, Self::Course, Self::Module, Self::Dashboard];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Category => "category",
            Self::Course => "course",
            Self::Module => "module",
            Self::Dashboard => "dashboard",
        }
    }

    /// Whether targets of this kind are rows of a host table that can disappear.
    pub fn has_backing_table(self) -> bool {
        !matches!(self, Self::Dashboard)
    }

    /// Check a context instance id against the rules for this kind.
    pub fn validate_context_instance_id(self, id: i64) -> Result<(), ModelError> {
        let ok = match self {
            Self::Dashboard => id == NO_INSTANCE,
            Self::Module => id > 0,
            Self::Category | Self::Course => id == NO_INSTANCE || id > 0,
        };
        if ok {
            Ok(())
        } else {
            Err(ModelError::Validation(format!("invalid contextinstanceid {id} for {self}")))
        }
    }
}

impl fmt::Display for InstanceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InstanceKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "category" => Ok(Self::Category),
            "course" => Ok(Self::Course),
            "module" => Ok(Self::Module),
            "dashboard" => Ok(Self::Dashboard),
            other => Err(ModelError::Validation(format!("unknown instance `{other}`"))),
        }
    }
}
