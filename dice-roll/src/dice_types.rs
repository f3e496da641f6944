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

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Operator {
    Add,
    Sub,
    LessEq,
    Less,
    GreaterEq,
    Greater,
    Equal,
    Open,
    Close,
    ZipAdd,
    ZipSub,
    Concat,
}

impl Operator {
    /// Every recognized operator, longest symbol first so `<` never swallows `<=`.
    pub const ALL: [Operator; 12] = [
        Operator::LessEq,
        Operator::GreaterEq,
        Operator::Equal,
        Operator::ZipAdd,
        Operator::ZipSub,
        Operator::Add,
        Operator::Sub,
        Operator::Less,
        Operator::Greater,
        Operator::Open,
        Operator::Close,
        Operator::Concat,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::LessEq => "<=",
            Operator::Less => "<",
            Operator::GreaterEq => ">=",
            Operator::Greater => ">",
            Operator::Equal => "==",
            Operator::Open => "(",
            Operator::Close => ")",
            Operator::ZipAdd => ".+",
            Operator::ZipSub => ".-",
            Operator::Concat => "|",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Operator> {
        Operator::ALL
            .iter()
            .copied()
            .find(|op| op.symbol() == symbol)
    }

    /// Finds the operator at the very start of `input`.
    pub fn prefix_of(input: &str) -> Option<Operator> {
        Operator::ALL
            .iter()
            .copied()
            .find(|op| input.starts_with(op.symbol()))
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            Operator::LessEq | Operator::Less | Operator::GreaterEq | Operator::Greater
        )
    }

    pub fn is_grouping(self) -> bool {
        matches!(self, Operator::Open | Operator::Close)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// One lexical unit of a roll request.
#[derive(Debug, PartialEq, Eq, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Token {
    Number(i64),
    Operator(Operator),
    /// Variable reference, dice notation or the mode shorthand `r`. Validated by the expander.
    Raw(String),
    Tag(String),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(n) => write!(f, "{}", n),
            Token::Operator(op) => write!(f, "{}", op),
            Token::Raw(word) => f.write_str(word),
            Token::Tag(tag) => write!(f, "# {}", tag),
        }
    }
}

/// `NdM[t]`
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DiceNotation {
    pub count: u32,
    pub sides: u32,
    pub total: bool,
}

impl fmt::Display for DiceNotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}d{}{}",
            self.count,
            self.sides,
            if self.total { "t" } else { "" }
        )
    }
}

/// The faces rolled for one dice token, tagged with the notation that produced them.
#[derive(Debug, PartialEq, Eq, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RollList {
    pub notation: String,
    pub values: Vec<i64>,
    /// Set for `t` rolls, which evaluate to the sum of their faces.
    pub total: bool,
}

impl RollList {
    pub fn sum(&self) -> i64 {
        self.values.iter().sum()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A token after variable resolution and rolling.
#[derive(Debug, PartialEq, Eq, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Expanded {
    Number(i64),
    Operator(Operator),
    Dice(RollList),
}

impl fmt::Display for Expanded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expanded::Number(n) => write!(f, "{}", n),
            Expanded::Operator(op) => write!(f, "{}", op),
            Expanded::Dice(list) => f.write_str(&list.notation),
        }
    }
}

/// Outcome of comparing every element of a roll against its target.
///
/// `rolls`, `targets`, `deltas` and `predicates` always have the same length.
#[derive(Debug, PartialEq, Eq, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DiceDelta {
    pub operator: Operator,
    pub rolls: Vec<i64>,
    pub targets: Vec<i64>,
    pub deltas: Vec<i64>,
    pub predicates: Vec<bool>,
    /// Canonical expression of the whole roll this comparison belongs to.
    pub expression: String,
}

impl DiceDelta {
    pub fn len(&self) -> usize {
        self.rolls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rolls.is_empty()
    }

    pub fn successes(&self) -> usize {
        self.predicates.iter().filter(|p| **p).count()
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RollValue {
    Scalar(i64),
    ResultSet(RollList),
    ComparisonSet(DiceDelta),
    /// `==` only reports whether each element matched.
    Equality(Vec<bool>),
}

impl fmt::Display for RollValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RollValue::Scalar(n) => write!(f, "{}", n),
            RollValue::ResultSet(list) => write!(f, "{:?}", list.values),
            RollValue::ComparisonSet(delta) => write!(f, "{:?}", delta.predicates),
            RollValue::Equality(matches) => write!(f, "{:?}", matches),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_table() {
        for op in Operator::ALL.iter() {
            assert_eq!(Operator::from_symbol(op.symbol()), Some(*op));
        }
        assert_eq!(Operator::prefix_of("<=3"), Some(Operator::LessEq));
        assert_eq!(Operator::prefix_of("<3"), Some(Operator::Less));
        assert_eq!(Operator::prefix_of(".-1"), Some(Operator::ZipSub));
        assert_eq!(Operator::prefix_of("d6"), None);
        assert_eq!(Operator::from_symbol("="), None);
    }

    #[test]
    fn test_notation_display() {
        let notation = DiceNotation {
            count: 3,
            sides: 6,
            total: true,
        };
        assert_eq!(notation.to_string(), "3d6t");
    }
}
