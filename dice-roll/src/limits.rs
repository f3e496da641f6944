/// Bounds of the values a roll can produce, per result element.
pub trait DiceLimits {
    fn min(&self) -> i64;
    fn max(&self) -> i64;
}

use crate::dice_types::*;

impl DiceLimits for DiceNotation {
    fn min(&self) -> i64 {
        if self.total {
            i64::from(self.count)
        } else {
            1
        }
    }

    fn max(&self) -> i64 {
        if self.total {
            i64::from(self.count) * i64::from(self.sides)
        } else {
            i64::from(self.sides)
        }
    }
}
