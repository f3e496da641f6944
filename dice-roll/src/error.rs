use crate::expand::MAX_DICE_PER_ROLL;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RollError>;

/// Why a roll request was rejected. The message is meant to be shown to the requester as is.
#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum RollError {
    #[error("`{0}` is not a number, operator, variable or dice I know")]
    MalformedDiceNotation(String),
    #[error("Sorry bruh, that variable isn't defined: `{0}`")]
    UndefinedVariable(String),
    #[error("Variable `{0}` does not hold an integer")]
    NonIntegerVariable(String),
    #[error("{requested} dice? Chill out, the limit is {max}", max = MAX_DICE_PER_ROLL)]
    TooManyDice { requested: u32 },
    #[error("Your syntax was scintillating, but I couldn't parse it: {0}")]
    ParseError(String),
    #[error("Add a tag, it's the polite thing to do.")]
    RequireTagMissing,
    #[error("That number got too big for me")]
    Overflow,
}

impl RollError {
    pub fn parse_error(msg: impl ToString) -> Self {
        Self::ParseError(msg.to_string())
    }
}
