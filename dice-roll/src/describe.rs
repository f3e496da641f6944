/*
Copyright 2021 Robin Marchart

   Licensed under the Apache License, Version 2.0 (the "License");
   you may not use this file except in compliance with the License.
   You may obtain a copy of the License at

       http://www.apache.org/licenses/LICENSE-2.0

   Unless required by applicable law or agreed to in writing, software
   distributed under the License is distributed on an "AS IS" BASIS,
   WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
   See the License for the specific language governing permissions and
   limitations under the License.
*/

use crate::{
    dice_types::{DiceDelta, Expanded, RollValue},
    mode::GameMode,
};

pub const SUCCESS: &str = "S ✅";
pub const FAILURE: &str = "F 🛇";
pub const ARROW: &str = "⤳";

/// Notation that marks a percentile roll.
const PERCENTILE: &str = "d100";

fn status(passed: bool) -> &'static str {
    if passed {
        SUCCESS
    } else {
        FAILURE
    }
}

fn describe_comparison(delta: &DiceDelta, mode: GameMode) -> String {
    let degrees = mode == GameMode::Realistic && delta.expression.contains(PERCENTILE);
    (0..delta.len())
        .map(|i| {
            let outcome = if degrees {
                match delta.deltas[i] / 10 {
                    0 => status(delta.predicates[i]).to_string(),
                    n => format!("{} {}°", status(delta.predicates[i]), n),
                }
            } else {
                format!("{} by {}", status(delta.predicates[i]), delta.deltas[i])
            };
            format!(
                "{:4} {} {:<4} {} {}",
                delta.rolls[i], delta.operator, delta.targets[i], ARROW, outcome
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Renders an evaluation result for chat.
pub fn describe(result: &RollValue, mode: GameMode) -> String {
    let description = match result {
        RollValue::Scalar(n) => n.to_string(),
        RollValue::ResultSet(list) => list
            .values
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(", "),
        RollValue::ComparisonSet(delta) => describe_comparison(delta, mode),
        RollValue::Equality(matches) => matches
            .iter()
            .map(|m| status(*m))
            .collect::<Vec<_>>()
            .join(", "),
    };
    if description.is_empty() {
        "0".to_string()
    } else {
        description
    }
}

/// Lists the faces behind every dice token, e.g. `2d6 ⤳ [3, 5], 1d20t ⤳ [7] = 7`.
pub fn describe_rolls(expanded: &[Expanded]) -> String {
    expanded
        .iter()
        .filter_map(|token| match token {
            Expanded::Dice(list) if list.total => Some(format!(
                "{} {} {:?} = {}",
                list.notation,
                ARROW,
                list.values,
                list.sum()
            )),
            Expanded::Dice(list) => Some(format!("{} {} {:?}", list.notation, ARROW, list.values)),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join(", ")
}
