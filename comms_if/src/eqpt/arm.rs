//! # Arm Equipment Commands

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fmt,
    ops::{Index, IndexMut},
    str::FromStr,
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// The number of controllable joints on the arm.
pub const NUM_JOINTS: usize = 2;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// IDs of all joints available on the arm.
///
/// The declaration order is the order in which joints appear in an [`AngleCommand`], on the wire,
/// and in which the arm actuates them.
#[derive(Serialize, Deserialize, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Copy, Clone)]
pub enum JointId {
    /// Shoulder joint
    #[serde(rename = "axe_0")]
    Axe0,

    /// Elbow joint
    #[serde(rename = "axe_1")]
    Axe1,
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// One target angle per joint, delivered as a unit.
///
/// Units: degrees
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AngleCommand {
    angles_deg: [i32; NUM_JOINTS],
}

/// Errors produced when building an [`AngleCommand`] from loose values.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum AngleCommandError {
    #[error("Expected {expected} angles, found {0}", expected = NUM_JOINTS)]
    WrongCount(usize),

    #[error("Could not parse \"{0}\" as an integer angle")]
    InvalidAngle(String),

    #[error("No angle given for joint {0}")]
    MissingJoint(JointId),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl JointId {
    /// All joints in actuation order.
    pub const ALL: [JointId; NUM_JOINTS] = [JointId::Axe0, JointId::Axe1];

    /// Position of this joint inside an [`AngleCommand`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Get the joint at the given command position.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Look up a joint by its name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|j| j.name() == name)
    }

    /// Name of the joint as used in parameter files and JSON payloads.
    pub fn name(self) -> &'static str {
        match self {
            JointId::Axe0 => "axe_0",
            JointId::Axe1 => "axe_1",
        }
    }
}

impl fmt::Display for JointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl AngleCommand {
    /// Create a new command from angles given in [`JointId::ALL`] order.
    pub fn new(angles_deg: [i32; NUM_JOINTS]) -> Self {
        Self { angles_deg }
    }

    /// Raw angles in [`JointId::ALL`] order.
    pub fn angles_deg(&self) -> [i32; NUM_JOINTS] {
        self.angles_deg
    }

    /// Iterate over `(joint, angle)` pairs in actuation order.
    pub fn iter(&self) -> impl Iterator<Item = (JointId, i32)> + '_ {
        JointId::ALL.iter().map(move |&j| (j, self[j]))
    }

    /// Build a command from a joint keyed map. Every joint must be present.
    pub fn from_map(map: &BTreeMap<JointId, i32>) -> Result<Self, AngleCommandError> {
        let mut cmd = Self::default();

        for joint in JointId::ALL.iter() {
            cmd[*joint] = *map
                .get(joint)
                .ok_or(AngleCommandError::MissingJoint(*joint))?;
        }

        Ok(cmd)
    }

    /// Convert the command into a joint keyed map.
    pub fn to_map(&self) -> BTreeMap<JointId, i32> {
        self.iter().collect()
    }
}

impl Index<JointId> for AngleCommand {
    type Output = i32;

    fn index(&self, joint: JointId) -> &i32 {
        &self.angles_deg[joint.index()]
    }
}

impl IndexMut<JointId> for AngleCommand {
    fn index_mut(&mut self, joint: JointId) -> &mut i32 {
        &mut self.angles_deg[joint.index()]
    }
}

impl fmt::Display for AngleCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (joint, angle) in self.iter() {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}°", joint, angle)?;
            first = false;
        }
        Ok(())
    }
}

/// Parse a whitespace separated list of angles, e.g. `"120 200"`.
impl FromStr for AngleCommand {
    type Err = AngleCommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split_whitespace().collect();

        if parts.len() != NUM_JOINTS {
            return Err(AngleCommandError::WrongCount(parts.len()));
        }

        let mut angles_deg = [0i32; NUM_JOINTS];
        for (angle, part) in angles_deg.iter_mut().zip(parts) {
            *angle = part
                .parse()
                .map_err(|_| AngleCommandError::InvalidAngle(part.to_string()))?;
        }

        Ok(Self::new(angles_deg))
    }
}
