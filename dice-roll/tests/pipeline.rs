use rand::{rngs::StdRng, SeedableRng};
use std::collections::HashMap;
use zardoz_dice::{roll_expression, GameMode, RollError, RollValue, MAX_DICE_PER_ROLL};

fn stats() -> HashMap<String, i64> {
    let mut vars = HashMap::new();
    vars.insert("STR".to_string(), 15);
    vars.insert("WS".to_string(), 42);
    vars
}

#[test]
fn independent_rolls_with_equal_seeds_agree() {
    let request = "2d10 + $STR - 3 <= 15 # sneak attack";
    let first = roll_expression(
        request,
        GameMode::Default,
        &stats(),
        false,
        &mut StdRng::seed_from_u64(42),
    )
    .unwrap();
    let second = roll_expression(
        request,
        GameMode::Default,
        &stats(),
        false,
        &mut StdRng::seed_from_u64(42),
    )
    .unwrap();
    assert_eq!(first, second);
    assert_eq!(first.tag, "sneak attack");
    match &first.result {
        RollValue::ComparisonSet(delta) => {
            assert_eq!(delta.len(), 2);
            assert_eq!(delta.expression, "2d10 + 15 - 3 <= 15");
            for (roll, passed) in delta.rolls.iter().zip(delta.predicates.iter()) {
                assert!((13..=22).contains(roll));
                assert_eq!(*passed, *roll <= 15);
            }
        }
        other => panic!("expected a comparison, got {:?}", other),
    }
}

#[test]
fn pre_split_words_roll_like_a_string() {
    let words = vec!["3d6", "|", "d8", "#", "damage"];
    let joined = roll_expression(
        "3d6|d8#damage",
        GameMode::Default,
        &stats(),
        false,
        &mut StdRng::seed_from_u64(9),
    )
    .unwrap();
    let split = roll_expression(
        &words,
        GameMode::Default,
        &stats(),
        false,
        &mut StdRng::seed_from_u64(9),
    )
    .unwrap();
    assert_eq!(joined, split);
    match joined.result {
        RollValue::ResultSet(list) => assert_eq!(list.len(), 4),
        other => panic!("expected a result set, got {:?}", other),
    }
}

#[test]
fn failures_carry_a_printable_cause() {
    let mut rng = StdRng::seed_from_u64(1);
    let too_many = format!("{}d6", MAX_DICE_PER_ROLL + 1);
    let err = roll_expression(
        too_many.as_str(),
        GameMode::Default,
        &stats(),
        false,
        &mut rng,
    )
    .unwrap_err();
    assert_eq!(err, RollError::TooManyDice { requested: 70 });
    assert!(err.to_string().contains("69"));

    let err = roll_expression("$DEX + 1", GameMode::Default, &stats(), false, &mut rng)
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Sorry bruh, that variable isn't defined: `DEX`"
    );

    let err = roll_expression("d20 + + 2", GameMode::Default, &stats(), false, &mut rng)
        .unwrap_err();
    assert!(matches!(err, RollError::ParseError(_)));
}
