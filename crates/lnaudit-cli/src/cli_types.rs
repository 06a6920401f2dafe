use clap::ValueEnum;

use lnaudit_core::RotationOrder;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CliRotationOrder {
    HigherIsNewer,
    LowerIsNewer,
}

impl From<CliRotationOrder> for RotationOrder {
    fn from(value: CliRotationOrder) -> Self {
        match value {
            CliRotationOrder::HigherIsNewer => RotationOrder::HigherIsNewer,
            CliRotationOrder::LowerIsNewer => RotationOrder::LowerIsNewer,
        }
    }
}
