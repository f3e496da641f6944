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

use crate::dice_types::DiceNotation;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// Ruleset profile of a server. Decides what `r` rolls and how comparisons are reported.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum GameMode {
    Default,
    /// Percentile system, reports degrees of success.
    Realistic,
    D20,
    Alt,
}

impl GameMode {
    pub const ALL: [GameMode; 4] = [
        GameMode::Default,
        GameMode::Realistic,
        GameMode::D20,
        GameMode::Alt,
    ];

    pub fn name(self) -> &'static str {
        match self {
            GameMode::Default => "DEFAULT",
            GameMode::Realistic => "RT",
            GameMode::D20 => "DND",
            GameMode::Alt => "AW",
        }
    }

    /// What the shorthand `r` expands to.
    pub fn default_dice(self) -> DiceNotation {
        let sides = match self {
            GameMode::Default | GameMode::Alt => 6,
            GameMode::Realistic => 100,
            GameMode::D20 => 20,
        };
        DiceNotation {
            count: 1,
            sides,
            total: false,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            GameMode::Default => "Default die is 1d6",
            GameMode::Realistic => "Default die is 1d100; reports DoS/DoF",
            GameMode::D20 => "Default die is 1d20",
            GameMode::Alt => "Default die is 1d6",
        }
    }
}

impl Default for GameMode {
    fn default() -> Self {
        GameMode::Default
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
#[error("unknown game mode `{0}`")]
pub struct UnknownGameMode(pub String);

impl FromStr for GameMode {
    type Err = UnknownGameMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DEFAULT" => Ok(GameMode::Default),
            "RT" | "REALISTIC" => Ok(GameMode::Realistic),
            "DND" | "D20" => Ok(GameMode::D20),
            "AW" | "ALT" => Ok(GameMode::Alt),
            _ => Err(UnknownGameMode(s.to_owned())),
        }
    }
}
