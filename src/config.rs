use priority::Priority;
use serde::{Deserialize, Serialize};
use crate::error::{Error, Result};

/**
Configuration for a [crate::PriorityCompletionService].

```toml
levels = ["low", "high"]
default_priority = "low"
```

Omitted fields take their [Default] values: every priority declared, and `low` as the default priority.
*/
#[derive(Debug,Clone,PartialEq,Eq,Serialize,Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    ///Priorities that get a completion queue.  Duplicates are ignored.
    pub levels: Vec<Priority>,
    ///Priority used by the `submit`/`take`/`poll` forms that do not name one.  Must be in `levels`.
    pub default_priority: Priority,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            levels: Priority::ALL.to_vec(),
            default_priority: Priority::Low,
        }
    }
}

impl ServiceConfig {
    pub fn with_levels(mut self, levels: impl IntoIterator<Item = Priority>) -> Self {
        self.levels = levels.into_iter().collect();
        self
    }

    pub fn with_default_priority(mut self, priority: Priority) -> Self {
        self.default_priority = priority;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.levels.is_empty() {
            return Err(Error::InvalidArgument("at least one priority level must be declared"));
        }
        if !self.levels.contains(&self.default_priority) {
            return Err(Error::InvalidPriority(self.default_priority));
        }
        Ok(())
    }
}
