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

//! Dice expressions as typed in chat: `2d10 + $STR - 3 <= 15 # sneak attack`.
//!
//! A request runs through [`lexer::tokenize`], [`expand::expand`], [`eval::evaluate`] and
//! finally [`describe::describe`]. [`roll_expression`] chains all of them.

pub mod describe;
pub mod dice_types;
pub mod error;
pub mod eval;
pub mod expand;
pub mod lexer;
pub mod limits;
pub mod mode;
pub mod parser;

pub use describe::{describe, describe_rolls, ARROW, FAILURE, SUCCESS};
pub use dice_types::{DiceDelta, DiceNotation, Expanded, Operator, RollList, RollValue, Token};
pub use error::{Result, RollError};
pub use eval::evaluate;
pub use expand::{expand, Binding, DieRoller, MAX_DICE_PER_ROLL};
pub use lexer::{split_filter, tokenize, RequestWords};
pub use mode::GameMode;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[cfg(feature = "logging")]
use log::debug;

/// Everything a single roll produced.
#[derive(Debug, PartialEq, Eq, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RollOutcome {
    pub tokens: Vec<Token>,
    pub tag: String,
    pub expanded: Vec<Expanded>,
    /// The rolled expression, dice shown by notation.
    pub expression: String,
    pub result: RollValue,
}

impl RollOutcome {
    /// The request as lexed, without its tag. Replaying it rolls the same dice again.
    pub fn raw_request(&self) -> String {
        self.tokens
            .iter()
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn describe(&self, mode: GameMode) -> String {
        describe::describe(&self.result, mode)
    }

    pub fn describe_rolls(&self) -> String {
        describe::describe_rolls(&self.expanded)
    }
}

/// Lexes, expands and evaluates one roll request.
pub fn roll_expression<W, V, R>(
    request: &W,
    mode: GameMode,
    variables: &HashMap<String, V>,
    require_tag: bool,
    roller: &mut R,
) -> Result<RollOutcome>
where
    W: RequestWords + ?Sized,
    V: Binding,
    R: DieRoller + ?Sized,
{
    let (tokens, tag) = tokenize(request);
    if require_tag && tag.is_empty() {
        return Err(RollError::RequireTagMissing);
    }
    let expanded = expand(&tokens, mode, variables, roller)?;
    let (result, expression) = evaluate(&expanded)?;
    #[cfg(feature = "logging")]
    {
        debug!("rolled {} as {} => {:?}", &tag, &expression, &result);
    }
    Ok(RollOutcome {
        tokens,
        tag,
        expanded,
        expression,
        result,
    })
}
