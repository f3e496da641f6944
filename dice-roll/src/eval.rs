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
    dice_types::{DiceDelta, Expanded, Operator, RollList, RollValue},
    error::{Result, RollError},
};

#[cfg(feature = "logging")]
use log::debug;

/// Space-joined display form of the expanded tokens, dice shown by notation.
pub fn canonical_expression(tokens: &[Expanded]) -> String {
    tokens
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Evaluates the expanded tokens strictly left to right, parentheses nesting.
pub fn evaluate(tokens: &[Expanded]) -> Result<(RollValue, String)> {
    let expression = canonical_expression(tokens);
    if tokens.is_empty() {
        return Err(RollError::parse_error("there is nothing to roll"));
    }
    let mut position = 0;
    let mut result = evaluate_group(tokens, &mut position, 0)?;
    if let RollValue::ComparisonSet(delta) = &mut result {
        delta.expression = expression.clone();
    }
    #[cfg(feature = "logging")]
    {
        debug!("evaluated {} to {:?}", &expression, &result);
    }
    Ok((result, expression))
}

fn evaluate_group(tokens: &[Expanded], position: &mut usize, depth: usize) -> Result<RollValue> {
    let mut acc = operand(tokens, position, depth)?;
    loop {
        match tokens.get(*position) {
            None if depth > 0 => {
                return Err(RollError::parse_error("a `(` is never closed"));
            }
            None => return Ok(acc),
            Some(Expanded::Operator(Operator::Close)) if depth > 0 => {
                *position += 1;
                return Ok(acc);
            }
            Some(Expanded::Operator(Operator::Close)) => {
                return Err(RollError::parse_error("found a `)` without its `(`"));
            }
            Some(Expanded::Operator(Operator::Open)) => {
                return Err(RollError::parse_error(
                    "expected an operator before `(`",
                ));
            }
            Some(Expanded::Operator(op)) => {
                let op = *op;
                *position += 1;
                let rhs = operand(tokens, position, depth)?;
                acc = apply(op, acc, rhs)?;
            }
            Some(value) => {
                return Err(RollError::parse_error(format!(
                    "expected an operator before `{}`",
                    value
                )));
            }
        }
    }
}

fn operand(tokens: &[Expanded], position: &mut usize, depth: usize) -> Result<RollValue> {
    let token = tokens
        .get(*position)
        .ok_or_else(|| RollError::parse_error("the roll ends where a value was expected"))?;
    *position += 1;
    match token {
        Expanded::Number(n) => Ok(RollValue::Scalar(*n)),
        Expanded::Dice(list) if list.total => Ok(RollValue::Scalar(
            list.values
                .iter()
                .try_fold(0i64, |acc, v| acc.checked_add(*v))
                .ok_or(RollError::Overflow)?,
        )),
        Expanded::Dice(list) => Ok(RollValue::ResultSet(list.clone())),
        Expanded::Operator(Operator::Open) => evaluate_group(tokens, position, depth + 1),
        Expanded::Operator(op) => Err(RollError::parse_error(format!(
            "found `{}` where a value was expected",
            op
        ))),
    }
}

/// Elements and display label of an arithmetic operand.
fn elements(value: &RollValue, op: Operator) -> Result<(Vec<i64>, String)> {
    match value {
        RollValue::Scalar(n) => Ok((vec![*n], n.to_string())),
        RollValue::ResultSet(list) => Ok((list.values.clone(), list.notation.clone())),
        RollValue::ComparisonSet(_) | RollValue::Equality(_) => {
            Err(RollError::parse_error(format!(
                "`{}` can't take a comparison as operand, wrap the target in parentheses like `d100 <= (40 + 5)`",
                op
            )))
        }
    }
}

/// Pairs up elements, broadcasting a single element across the other side.
fn pair_up(op: Operator, lhs: &[i64], rhs: &[i64]) -> Result<Vec<(i64, i64)>> {
    if lhs.len() == rhs.len() {
        Ok(lhs.iter().copied().zip(rhs.iter().copied()).collect())
    } else if rhs.len() == 1 {
        Ok(lhs.iter().map(|l| (*l, rhs[0])).collect())
    } else if lhs.len() == 1 {
        Ok(rhs.iter().map(|r| (lhs[0], *r)).collect())
    } else {
        Err(RollError::parse_error(format!(
            "`{}` needs operands of the same size, got {} and {} values",
            op,
            lhs.len(),
            rhs.len()
        )))
    }
}

fn arithmetic(op: Operator, l: i64, r: i64) -> Result<i64> {
    match op {
        Operator::Add | Operator::ZipAdd => l.checked_add(r),
        _ => l.checked_sub(r),
    }
    .ok_or(RollError::Overflow)
}

fn margin(op: Operator, l: i64, r: i64, passed: bool) -> Result<i64> {
    let distance = l
        .checked_sub(r)
        .and_then(i64::checked_abs)
        .ok_or(RollError::Overflow)?;
    match op {
        Operator::Less | Operator::Greater if !passed => {
            distance.checked_add(1).ok_or(RollError::Overflow)
        }
        _ => Ok(distance),
    }
}

fn predicate(op: Operator, l: i64, r: i64) -> bool {
    match op {
        Operator::LessEq => l <= r,
        Operator::Less => l < r,
        Operator::GreaterEq => l >= r,
        Operator::Greater => l > r,
        _ => l == r,
    }
}

fn apply(op: Operator, lhs: RollValue, rhs: RollValue) -> Result<RollValue> {
    let (left, left_label) = elements(&lhs, op)?;
    let (right, right_label) = elements(&rhs, op)?;
    match op {
        Operator::Add | Operator::Sub | Operator::ZipAdd | Operator::ZipSub => {
            if matches!(op, Operator::ZipAdd | Operator::ZipSub) && left.len() != right.len() {
                return Err(RollError::parse_error(format!(
                    "`{}` adds element by element and needs operands of the same size, got {} and {} values",
                    op,
                    left.len(),
                    right.len()
                )));
            }
            if let (RollValue::Scalar(l), RollValue::Scalar(r)) = (&lhs, &rhs) {
                return arithmetic(op, *l, *r).map(RollValue::Scalar);
            }
            let values = pair_up(op, &left, &right)?
                .into_iter()
                .map(|(l, r)| arithmetic(op, l, r))
                .collect::<Result<Vec<_>>>()?;
            Ok(RollValue::ResultSet(RollList {
                notation: format!("{} {} {}", left_label, op, right_label),
                values,
                total: false,
            }))
        }
        Operator::Concat => {
            let mut values = left;
            values.extend(right);
            Ok(RollValue::ResultSet(RollList {
                notation: format!("{} {} {}", left_label, op, right_label),
                values,
                total: false,
            }))
        }
        Operator::Equal => Ok(RollValue::Equality(
            pair_up(op, &left, &right)?
                .into_iter()
                .map(|(l, r)| l == r)
                .collect(),
        )),
        _ if op.is_comparison() => {
            let pairs = pair_up(op, &left, &right)?;
            let mut delta = DiceDelta {
                operator: op,
                rolls: Vec::with_capacity(pairs.len()),
                targets: Vec::with_capacity(pairs.len()),
                deltas: Vec::with_capacity(pairs.len()),
                predicates: Vec::with_capacity(pairs.len()),
                expression: String::new(),
            };
            for (l, r) in pairs {
                let passed = predicate(op, l, r);
                delta.rolls.push(l);
                delta.targets.push(r);
                delta.deltas.push(margin(op, l, r, passed)?);
                delta.predicates.push(passed);
            }
            Ok(RollValue::ComparisonSet(delta))
        }
        _ => Err(RollError::parse_error(format!(
            "`{}` is not an operator I can apply",
            op
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice_types::Operator::*;

    fn num(n: i64) -> Expanded {
        Expanded::Number(n)
    }

    fn op(o: Operator) -> Expanded {
        Expanded::Operator(o)
    }

    fn dice(notation: &str, values: Vec<i64>) -> Expanded {
        Expanded::Dice(RollList {
            notation: notation.to_string(),
            values,
            total: false,
        })
    }

    fn comparison(tokens: &[Expanded]) -> DiceDelta {
        match evaluate(tokens) {
            Ok((RollValue::ComparisonSet(delta), _)) => delta,
            other => panic!("expected a comparison, got {:?}", other),
        }
    }

    #[test]
    fn test_strict_margin() {
        let passed = comparison(&[num(5), op(Greater), num(3)]);
        assert_eq!(passed.predicates, vec![true]);
        assert_eq!(passed.deltas, vec![2]);
        let failed = comparison(&[num(3), op(Greater), num(5)]);
        assert_eq!(failed.predicates, vec![false]);
        assert_eq!(failed.deltas, vec![3]);
        let failed = comparison(&[num(7), op(Less), num(7)]);
        assert_eq!(failed.deltas, vec![1]);
    }

    #[test]
    fn test_inclusive_margin() {
        let failed = comparison(&[num(3), op(GreaterEq), num(5)]);
        assert_eq!(failed.predicates, vec![false]);
        assert_eq!(failed.deltas, vec![2]);
        let passed = comparison(&[num(5), op(LessEq), num(5)]);
        assert_eq!(passed.predicates, vec![true]);
        assert_eq!(passed.deltas, vec![0]);
    }

    #[test]
    fn test_pool_comparison() {
        let tokens = [dice("3d100", vec![12, 50, 97]), op(LessEq), num(45)];
        let delta = comparison(&tokens);
        assert_eq!(delta.rolls, vec![12, 50, 97]);
        assert_eq!(delta.targets, vec![45, 45, 45]);
        assert_eq!(delta.deltas, vec![33, 5, 52]);
        assert_eq!(delta.predicates, vec![true, false, false]);
        assert_eq!(delta.successes(), 1);
        assert_eq!(delta.expression, "3d100 <= 45");
    }

    #[test]
    fn test_left_to_right() {
        let (value, expression) = evaluate(&[num(10), op(Sub), num(3), op(Add), num(2)]).unwrap();
        assert_eq!(value, RollValue::Scalar(9));
        assert_eq!(expression, "10 - 3 + 2");
        let (value, _) = evaluate(&[
            num(10),
            op(Sub),
            op(Open),
            num(3),
            op(Add),
            num(2),
            op(Close),
        ])
        .unwrap();
        assert_eq!(value, RollValue::Scalar(5));
    }

    #[test]
    fn test_broadcast_and_zip() {
        let (value, _) = evaluate(&[dice("2d6", vec![1, 6]), op(Add), num(2)]).unwrap();
        assert_eq!(
            value,
            RollValue::ResultSet(RollList {
                notation: "2d6 + 2".to_string(),
                values: vec![3, 8],
                total: false
            })
        );
        let (value, _) = evaluate(&[
            dice("2d6", vec![1, 6]),
            op(ZipSub),
            dice("2d4", vec![4, 2]),
        ])
        .unwrap();
        match value {
            RollValue::ResultSet(list) => assert_eq!(list.values, vec![-3, 4]),
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            evaluate(&[dice("2d6", vec![1, 6]), op(ZipAdd), num(1)]),
            Err(RollError::ParseError(_))
        ));
        assert!(matches!(
            evaluate(&[dice("2d6", vec![1, 6]), op(Add), dice("3d6", vec![1, 2, 3])]),
            Err(RollError::ParseError(_))
        ));
    }

    #[test]
    fn test_concat_and_equality() {
        let (value, _) = evaluate(&[
            dice("2d6", vec![1, 6]),
            op(Concat),
            dice("1d8", vec![8]),
        ])
        .unwrap();
        match value {
            RollValue::ResultSet(list) => {
                assert_eq!(list.values, vec![1, 6, 8]);
                assert_eq!(list.notation, "2d6 | 1d8");
            }
            other => panic!("unexpected {:?}", other),
        }
        let (value, _) = evaluate(&[dice("3d6", vec![1, 6, 6]), op(Equal), num(6)]).unwrap();
        assert_eq!(value, RollValue::Equality(vec![false, true, true]));
    }

    #[test]
    fn test_total_roll() {
        let summed = Expanded::Dice(RollList {
            notation: "3d6t".to_string(),
            values: vec![2, 3, 4],
            total: true,
        });
        let (value, expression) = evaluate(&[summed, op(Add), num(1)]).unwrap();
        assert_eq!(value, RollValue::Scalar(10));
        assert_eq!(expression, "3d6t + 1");
    }

    #[test]
    fn test_parse_errors() {
        let malformed: Vec<Vec<Expanded>> = vec![
            vec![],
            vec![op(Add), num(1)],
            vec![num(1), op(Add)],
            vec![num(1), num(2)],
            vec![op(Open), num(1)],
            vec![num(1), op(Close)],
            vec![num(1), op(Open), num(2), op(Close)],
            vec![num(1), op(Less), num(2), op(Add), num(3)],
        ];
        for tokens in malformed.iter() {
            assert!(
                matches!(evaluate(tokens), Err(RollError::ParseError(_))),
                "{:?}",
                tokens
            );
        }
        let delta = comparison(&[
            dice("1d100", vec![40]),
            op(LessEq),
            op(Open),
            num(40),
            op(Add),
            num(5),
            op(Close),
        ]);
        assert_eq!(delta.targets, vec![45]);
    }

    #[test]
    fn test_overflow() {
        assert_eq!(
            evaluate(&[num(i64::MAX), op(Add), num(1)]),
            Err(RollError::Overflow)
        );
    }
}
