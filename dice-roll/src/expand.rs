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
    dice_types::{DiceNotation, Expanded, RollList, Token},
    error::{Result, RollError},
    mode::GameMode,
    parser::parse_notation,
};
use rand::{
    distributions::{Distribution, Uniform},
    Rng,
};
use std::collections::HashMap;

#[cfg(feature = "logging")]
use log::debug;

/// Upper bound on the dice a single notation token may request.
pub const MAX_DICE_PER_ROLL: u32 = 69;

pub const VARIABLE_MARKER: char = '$';

pub const MODE_SHORTHAND: &str = "r";

/// Source of die faces. One call per die, in request order.
pub trait DieRoller {
    fn roll_die(&mut self, sides: u32) -> i64;
}

impl<R: Rng + ?Sized> DieRoller for R {
    fn roll_die(&mut self, sides: u32) -> i64 {
        Uniform::new_inclusive(1, i64::from(sides)).sample(self)
    }
}

/// A value a roll variable may be bound to.
pub trait Binding {
    fn as_integer(&self) -> Option<i64>;
}

impl Binding for i64 {
    fn as_integer(&self) -> Option<i64> {
        Some(*self)
    }
}

impl Binding for i32 {
    fn as_integer(&self) -> Option<i64> {
        Some(i64::from(*self))
    }
}

impl Binding for str {
    fn as_integer(&self) -> Option<i64> {
        self.trim().parse().ok()
    }
}

impl Binding for String {
    fn as_integer(&self) -> Option<i64> {
        self.as_str().as_integer()
    }
}

impl<B: Binding + ?Sized> Binding for &B {
    fn as_integer(&self) -> Option<i64> {
        (**self).as_integer()
    }
}

fn resolve_variable<V: Binding>(word: &str, variables: &HashMap<String, V>) -> Result<i64> {
    let name = word.trim_matches(VARIABLE_MARKER);
    match variables.get(name) {
        Some(value) => value
            .as_integer()
            .ok_or_else(|| RollError::NonIntegerVariable(name.to_owned())),
        None => Err(RollError::UndefinedVariable(name.to_owned())),
    }
}

/// Rolls every die of `notation`.
pub fn roll_notation<R: DieRoller + ?Sized>(
    notation: DiceNotation,
    roller: &mut R,
) -> Result<RollList> {
    if notation.count > MAX_DICE_PER_ROLL {
        return Err(RollError::TooManyDice {
            requested: notation.count,
        });
    }
    let values = (0..notation.count)
        .map(|_| roller.roll_die(notation.sides))
        .collect();
    Ok(RollList {
        notation: notation.to_string(),
        values,
        total: notation.total,
    })
}

fn expand_word<R: DieRoller + ?Sized, V: Binding>(
    word: &str,
    mode: GameMode,
    variables: &HashMap<String, V>,
    roller: &mut R,
) -> Result<Expanded> {
    if word.starts_with(VARIABLE_MARKER) {
        return resolve_variable(word, variables).map(Expanded::Number);
    }
    let notation = if word == MODE_SHORTHAND {
        mode.default_dice()
    } else {
        parse_notation(word).ok_or_else(|| RollError::MalformedDiceNotation(word.to_owned()))?
    };
    roll_notation(notation, roller).map(Expanded::Dice)
}

/// Resolves variables and the mode shorthand, then rolls every dice token left to right.
pub fn expand<R: DieRoller + ?Sized, V: Binding>(
    tokens: &[Token],
    mode: GameMode,
    variables: &HashMap<String, V>,
    roller: &mut R,
) -> Result<Vec<Expanded>> {
    let mut expanded = Vec::with_capacity(tokens.len());
    for token in tokens {
        match token {
            Token::Number(n) => expanded.push(Expanded::Number(*n)),
            Token::Operator(op) => expanded.push(Expanded::Operator(*op)),
            Token::Raw(word) => expanded.push(expand_word(word, mode, variables, roller)?),
            Token::Tag(_) => {}
        }
    }
    #[cfg(feature = "logging")]
    {
        debug!("expanded {:?} to {:?}", tokens, &expanded);
    }
    Ok(expanded)
}

#[cfg(test)]
pub(crate) use sequence::SequenceRoller;
