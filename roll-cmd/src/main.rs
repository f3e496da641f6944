use clap::Parser;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use rand_xoshiro::Xoshiro256PlusPlus;
use std::{collections::HashMap, error::Error, path::PathBuf};
use thiserror::Error;
use zardoz_dice::{
    limits::DiceLimits, parser::parse_notation, roll_expression, Expanded, GameMode, RollOutcome,
    RollValue, ARROW,
};

/// Rolls a dice expression offline, optionally collecting histograms.
#[derive(Parser, Debug)]
#[command(name = "roll-cmd")]
struct Args {
    /// Expression as typed in chat, e.g. `2d10 + $STR <= 15`
    expression: String,
    /// How often to roll
    #[arg(short = 'n', long, default_value_t = 1)]
    count: u32,
    #[arg(short, long, default_value = "DEFAULT")]
    mode: GameMode,
    /// Variable binding, `NAME=VALUE`. May be repeated.
    #[arg(long = "var", value_parser = parse_binding)]
    vars: Vec<(String, i64)>,
    /// Seed for reproducible rolls
    #[arg(short, long)]
    seed: Option<u64>,
    /// Directory to write `rolls.npy` and `throws.npy` to
    #[arg(long)]
    histogram: Option<PathBuf>,
    /// Print every roll, not only a summary
    #[arg(short, long)]
    verbose: bool,
}

fn parse_binding(arg: &str) -> Result<(String, i64), String> {
    let (name, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got `{}`", arg))?;
    let value = value
        .trim()
        .parse()
        .map_err(|e| format!("bad value for {}: {}", name, e))?;
    Ok((name.trim().to_uppercase(), value))
}

/// The numbers a roll contributes to the result histogram.
fn observations(result: &RollValue) -> Vec<i64> {
    match result {
        RollValue::Scalar(n) => vec![*n],
        RollValue::ResultSet(list) => list.values.clone(),
        RollValue::ComparisonSet(delta) => vec![delta.successes() as i64],
        RollValue::Equality(matches) => vec![matches.iter().filter(|m| **m).count() as i64],
    }
}

fn faces(outcome: &RollOutcome) -> impl Iterator<Item = i64> + '_ {
    outcome.expanded.iter().flat_map(|e| match e {
        Expanded::Dice(list) => list.values.clone(),
        _ => Vec::new(),
    })
}

/// `(min, max)` of a single face of any die in the expression.
fn face_limits(outcome: &RollOutcome) -> Option<(i64, i64)> {
    outcome
        .expanded
        .iter()
        .filter_map(|e| match e {
            Expanded::Dice(list) => parse_notation(&list.notation),
            _ => None,
        })
        .map(|mut notation| {
            notation.total = false;
            (notation.min(), notation.max())
        })
        .reduce(|(min1, max1), (min2, max2)| (min1.min(min2), max1.max(max2)))
}

/// Most bins a histogram may have.
const MAX_BINS: i64 = 1 << 20;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("values from {min} to {max} need more than {} histogram bins", MAX_BINS)]
struct HistogramTooWide {
    min: i64,
    max: i64,
}

/// Counts of every value in `min..=max`, prefixed by `min`.
fn histogram(values: &[i64], bounds: Option<(i64, i64)>) -> Result<Vec<i64>, HistogramTooWide> {
    let observed = values.iter().fold(bounds, |bounds, v| match bounds {
        Some((min, max)) => Some((min.min(*v), max.max(*v))),
        None => Some((*v, *v)),
    });
    let (min, max) = match observed {
        Some(bounds) => bounds,
        None => return Ok(Vec::new()),
    };
    let width = max
        .checked_sub(min)
        .filter(|width| *width < MAX_BINS)
        .ok_or(HistogramTooWide { min, max })?;
    let mut counts = vec![0; width as usize + 2];
    counts[0] = min;
    for v in values {
        counts[(v - min) as usize + 1] += 1;
    }
    Ok(counts)
}

fn main() -> Result<(), Box<dyn Error>> {
    pretty_env_logger::init();
    let args = Args::parse();
    let variables: HashMap<String, i64> = args.vars.into_iter().collect();
    let mut master_rng = match args.seed {
        Some(seed) => ChaCha20Rng::seed_from_u64(seed),
        None => ChaCha20Rng::from_entropy(),
    };

    let mut results = Vec::new();
    let mut throws = Vec::new();
    let mut limits = None;
    let mut last = None;
    for _ in 0..args.count {
        let mut seed: <Xoshiro256PlusPlus as SeedableRng>::Seed = Default::default();
        master_rng.fill(&mut seed);
        let mut rng = Xoshiro256PlusPlus::from_seed(seed);
        let outcome = roll_expression(&args.expression, args.mode, &variables, false, &mut rng)?;
        if args.verbose {
            println!(
                "{} {} {}",
                outcome.describe_rolls(),
                ARROW,
                outcome.describe(args.mode)
            );
        }
        if args.histogram.is_some() {
            results.extend(observations(&outcome.result));
            throws.extend(faces(&outcome));
            limits = limits.or_else(|| face_limits(&outcome));
        }
        last = Some(outcome);
    }
    match last {
        Some(outcome) if !args.verbose => {
            println!("{}", outcome.expression);
            println!("{}", outcome.describe(args.mode));
        }
        _ => {}
    }

    if let Some(dir) = args.histogram {
        npy::to_file(dir.join("rolls.npy"), histogram(&results, None)?)?;
        npy::to_file(dir.join("throws.npy"), histogram(&throws, limits)?)?;
        log::info!("wrote histograms of {} rolls to {}", args.count, dir.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_binding() {
        assert_eq!(parse_binding("str=3"), Ok(("STR".to_string(), 3)));
        assert_eq!(parse_binding("WS = -2"), Ok(("WS".to_string(), -2)));
        assert!(parse_binding("WS").is_err());
        assert!(parse_binding("WS=x").is_err());
    }

    #[test]
    fn test_histogram() {
        assert_eq!(histogram(&[], None), Ok(Vec::new()));
        assert_eq!(histogram(&[2, 3, 3], None), Ok(vec![2, 1, 2]));
        assert_eq!(histogram(&[2, 3, 3], Some((1, 4))), Ok(vec![1, 0, 1, 2, 0]));
        assert_eq!(
            histogram(&[i64::MIN, i64::MAX], None),
            Err(HistogramTooWide {
                min: i64::MIN,
                max: i64::MAX
            })
        );
        assert!(histogram(&[0, MAX_BINS], None).is_err());
        assert_eq!(
            histogram(&[0, MAX_BINS - 1], None).map(|h| h.len()),
            Ok(MAX_BINS as usize + 1)
        );
    }

    #[test]
    fn test_face_limits() {
        let vars: HashMap<String, i64> = HashMap::new();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(3);
        let outcome =
            roll_expression("3d6t + 1d8", GameMode::Default, &vars, false, &mut rng).unwrap();
        assert_eq!(face_limits(&outcome), Some((1, 8)));
        assert_eq!(faces(&outcome).count(), 4);
        let outcome = roll_expression("4", GameMode::Default, &vars, false, &mut rng).unwrap();
        assert_eq!(face_limits(&outcome), None);
    }
}
