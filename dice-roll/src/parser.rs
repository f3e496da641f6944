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

use nom::{
    branch::alt,
    bytes::complete::tag_no_case,
    character::complete::digit1,
    combinator::{all_consuming, map, map_res, opt, success, verify},
    error::context,
    sequence::{preceded, tuple},
    IResult,
};

pub fn parse_dice_digit(input: &str) -> IResult<&str, &str> {
    tag_no_case("d")(input)
}

pub fn parse_u32(input: &str) -> IResult<&str, u32> {
    context(
        "Failed to parse integer between 1 and 4294967295 inclusive",
        verify(
            map_res(digit1, |s: &str| s.parse::<u32>()),
            |value: &u32| value > &0,
        ),
    )(input)
}

/// Die count. Counts past `u32::MAX` saturate, the dice ceiling rejects them later.
pub fn parse_count(input: &str) -> IResult<&str, u32> {
    verify(
        map(digit1, |s: &str| s.parse::<u32>().unwrap_or(u32::MAX)),
        |value: &u32| value > &0,
    )(input)
}

pub fn parse_total(input: &str) -> IResult<&str, bool> {
    map(opt(tag_no_case("t")), |t| t.is_some())(input)
}

pub fn parse_dice(input: &str) -> IResult<&str, DiceNotation> {
    map(
        tuple((
            alt((parse_count, success(1))),
            preceded(parse_dice_digit, parse_u32),
            parse_total,
        )),
        |(count, sides, total)| DiceNotation {
            count,
            sides,
            total,
        },
    )(input)
}

/// Parses a whole word as dice notation, `None` if anything is left over.
pub fn parse_notation(word: &str) -> Option<DiceNotation> {
    all_consuming(parse_dice)(word)
        .ok()
        .map(|(_, notation)| notation)
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn test_parse_dice_digit() {
        assert_eq!(parse_dice_digit("d"), Ok(("", "d")));
        assert_eq!(parse_dice_digit("D"), Ok(("", "D")));
        assert_eq!(parse_dice_digit("dd"), Ok(("d", "d")));
        assert!(parse_dice_digit("w").is_err());
        assert!(parse_dice_digit("%").is_err());
        assert!(parse_dice_digit("").is_err());
    }

    #[test]
    fn test_parse_u32() {
        assert_eq!(parse_u32("1"), Ok(("", 1)));
        assert_eq!(parse_u32("6969"), Ok(("", 6969)));
        assert_eq!(parse_u32("4294967295"), Ok(("", 4294967295)));
        assert!(parse_u32("4294967296").is_err());
        assert!(parse_u32("-1").is_err());
        assert!(parse_u32("").is_err());
        assert!(parse_u32("0").is_err());
    }

    #[test]
    fn test_parse_total() {
        assert_eq!(parse_total("t"), Ok(("", true)));
        assert_eq!(parse_total("T"), Ok(("", true)));
        assert_eq!(parse_total(""), Ok(("", false)));
        assert_eq!(parse_total("x"), Ok(("x", false)));
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("12d6"), Ok(("d6", 12)));
        assert_eq!(parse_count("5000000000d6"), Ok(("d6", u32::MAX)));
        assert!(parse_count("0d6").is_err());
        assert!(parse_count("d6").is_err());
    }

    #[test]
    fn test_parse_dice() {
        assert_eq!(
            parse_dice("d20"),
            Ok((
                "",
                DiceNotation {
                    count: 1,
                    sides: 20,
                    total: false
                }
            ))
        );
        assert_eq!(
            parse_dice("3D6t"),
            Ok((
                "",
                DiceNotation {
                    count: 3,
                    sides: 6,
                    total: true
                }
            ))
        );
        assert_eq!(
            parse_dice("2d10k"),
            Ok((
                "k",
                DiceNotation {
                    count: 2,
                    sides: 10,
                    total: false
                }
            ))
        );
        assert!(parse_dice("d").is_err());
        assert!(parse_dice("0d6").is_err());
        assert!(parse_dice("").is_err());
    }

    #[test]
    fn test_parse_notation() {
        assert_eq!(
            parse_notation("69d69"),
            Some(DiceNotation {
                count: 69,
                sides: 69,
                total: false
            })
        );
        assert_eq!(parse_notation("2d10k"), None);
        assert_eq!(parse_notation("d0"), None);
        assert_eq!(parse_notation("fireball"), None);
        assert_eq!(parse_notation("1d6 "), None);
    }
}
