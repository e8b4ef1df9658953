use std::fmt;

/// How far an order transaction got. Used to report where a rolled-back
/// mutation stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LifecycleStage {
    Started,
    ItemsPrepared,
    Persisted,
    Committed,
    RolledBack,
}

impl LifecycleStage {
    /// Moves forward to `next`; the stage never goes backwards and nothing
    /// follows a terminal stage.
    pub fn advance(&mut self, next: LifecycleStage) {
        if self.is_terminal() || next <= *self {
            return;
        }
        *self = next;
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, LifecycleStage::Committed | LifecycleStage::RolledBack)
    }
}

impl fmt::Display for LifecycleStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleStage::Started => "started",
            LifecycleStage::ItemsPrepared => "items_prepared",
            LifecycleStage::Persisted => "persisted",
            LifecycleStage::Committed => "committed",
            LifecycleStage::RolledBack => "rolled_back",
        };
        f.write_str(name)
    }
}
