use std::fmt::{Display, Formatter};
use std::str::FromStr;
use serde::{Deserialize, Serialize};

///Models the priority of a unit of work.
///
/// This normally ought to be chosen by the top level application, since only the application knows which
/// results a consumer is waiting on.  Libraries ought to be careful to expose the choice to their callers,
/// potentially a good way up the stack.
///
/// The variants are ordered from least to most urgent, but that ordering is for humans.  Nothing in this
/// workspace compares priorities; a priority only selects which completion queue receives a result.
#[non_exhaustive]
#[derive(Copy,Clone,Debug,PartialEq,Eq,Hash,Serialize,Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    ///Background work.  Nobody is actively waiting on the result.
    Low,
    ///Work some consumer will want soon, but not urgently.
    Medium,
    ///The user is actively blocked waiting for the result.
    High,
}

impl Priority {
    ///Every declared priority, in index order.
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    ///Number of declared priorities.  Tables keyed by [Priority::index] have exactly this many slots.
    pub const COUNT: usize = Self::ALL.len();

    ///A dense, stable index for this priority, suitable for table lookup.
    ///
    /// `Low` is 0 and each more urgent level is the next integer.
    #[inline] pub const fn index(self) -> usize {
        match self {
            Priority::Low => 0,
            Priority::Medium => 1,
            Priority::High => 2,
        }
    }

    ///The inverse of [Priority::index].
    pub const fn from_index(index: usize) -> Option<Priority> {
        match index {
            0 => Some(Priority::Low),
            1 => Some(Priority::Medium),
            2 => Some(Priority::High),
            _ => None,
        }
    }

    ///The lowercase name used by [Display], [FromStr] and serde.
    pub const fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl Display for Priority {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug,Clone,PartialEq,Eq,thiserror::Error)]
#[error("unknown priority {0:?}, expected one of low, medium, high")]
pub struct ParsePriorityError(String);

impl FromStr for Priority {
    type Err = ParsePriorityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Priority::ALL.iter()
            .copied()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParsePriorityError(s.to_owned()))
    }
}
