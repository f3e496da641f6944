use nom::{
    branch::alt,
    bytes::complete::{tag, take_till1, take_while1},
    character::complete::{char, digit1, multispace0, multispace1, satisfy},
    combinator::{eof, map, map_res, opt, recognize, rest, success, verify},
    multi::many1,
    sequence::{delimited, pair, preceded, separated_pair, terminated, tuple},
    IResult,
};
use unicode_categories::UnicodeCategories;

/// Rolls listed by `history` when no count is given.
pub const DEFAULT_HISTORY_LENGTH: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VarCommand {
    List,
    Get(String),
    Set(String, i64),
    Delete(String),
}

/// A command addressed to the bot. Member targets are user ids taken from mentions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    About,
    Roll(String),
    Quiet(String),
    Secret {
        target: Option<String>,
        request: String,
    },
    Reroll {
        target: Option<String>,
        args: String,
    },
    History {
        target: Option<String>,
        max: u32,
    },
    Mode,
    ModeList,
    SetMode(String),
    Var(VarCommand),
    UserVar(VarCommand),
    TableList,
    TableGet {
        slug: String,
        value: Option<String>,
    },
    TableShow(String),
    Sample {
        k: i64,
        n: i64,
        args: String,
    },
    SetCommandPrefix(String),
    GetCommandPrefix,
}

fn chars_set(input: &str) -> IResult<&str, char> {
    satisfy(|c| !(c == '$' || c.is_separator() || c.is_other()))(input)
}

/// One whitespace delimited word out of `words`, ignoring case.
fn keyword<'a>(words: &'static [&'static str]) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    verify(take_till1(|c: char| c.is_whitespace()), move |word: &str| {
        words.iter().any(|k| k.eq_ignore_ascii_case(word))
    })
}

fn word(input: &str) -> IResult<&str, String> {
    map(take_till1(|c: char| c.is_whitespace()), str::to_string)(input)
}

/// Everything left, trimmed. Possibly empty.
fn remainder(input: &str) -> IResult<&str, String> {
    map(rest, |s: &str| s.trim().to_string())(input)
}

fn request(input: &str) -> IResult<&str, String> {
    verify(remainder, |s: &String| !s.is_empty())(input)
}

fn signed(input: &str) -> IResult<&str, i64> {
    map_res(
        recognize(pair(opt(alt((char('-'), char('+')))), digit1)),
        |s: &str| s.parse::<i64>(),
    )(input)
}

fn mention(input: &str) -> IResult<&str, String> {
    map(
        delimited(pair(tag("<@"), opt(char('!'))), digit1, char('>')),
        str::to_string,
    )(input)
}

fn target(input: &str) -> IResult<&str, Option<String>> {
    preceded(multispace0, opt(terminated(mention, multispace0)))(input)
}

fn var_name(input: &str) -> IResult<&str, String> {
    map(
        preceded(
            opt(char('$')),
            take_while1(|c: char| c.is_alphanumeric() || c == '_'),
        ),
        str::to_string,
    )(input)
}

fn parse_var_command(input: &str) -> IResult<&str, VarCommand> {
    preceded(
        multispace0,
        alt((
            map(keyword(&["list", "l"]), |_| VarCommand::List),
            map(
                preceded(pair(keyword(&["get", "g"]), multispace1), var_name),
                VarCommand::Get,
            ),
            map(
                preceded(
                    pair(keyword(&["set", "s"]), multispace1),
                    separated_pair(var_name, multispace1, signed),
                ),
                |(name, value)| VarCommand::Set(name, value),
            ),
            map(
                preceded(pair(keyword(&["del", "delete", "rm"]), multispace1), var_name),
                VarCommand::Delete,
            ),
            map(eof, |_| VarCommand::List),
        )),
    )(input)
}

fn parse_help(input: &str) -> IResult<&str, Command> {
    map(keyword(&["help", "h"]), |_| Command::Help)(input)
}

fn parse_about(input: &str) -> IResult<&str, Command> {
    map(keyword(&["about", "info"]), |_| Command::About)(input)
}

fn parse_rolls(input: &str) -> IResult<&str, Command> {
    alt((
        preceded(
            pair(keyword(&["r", "roll"]), multispace0),
            map(request, Command::Roll),
        ),
        preceded(
            pair(keyword(&["q", "quiet"]), multispace0),
            map(request, Command::Quiet),
        ),
        preceded(
            keyword(&["s", "secret"]),
            map(pair(target, request), |(target, request)| {
                Command::Secret { target, request }
            }),
        ),
        preceded(
            keyword(&["rr", "reroll"]),
            map(pair(target, remainder), |(target, args)| Command::Reroll {
                target,
                args,
            }),
        ),
    ))(input)
}

fn parse_history(input: &str) -> IResult<&str, Command> {
    preceded(
        keyword(&["hist", "history"]),
        map(
            pair(target, opt(map_res(digit1, |s: &str| s.parse::<u32>()))),
            |(target, max)| Command::History {
                target,
                max: max.unwrap_or(DEFAULT_HISTORY_LENGTH),
            },
        ),
    )(input)
}

fn parse_mode(input: &str) -> IResult<&str, Command> {
    preceded(
        pair(keyword(&["mode"]), multispace0),
        alt((
            map(keyword(&["list", "l"]), |_| Command::ModeList),
            map(
                preceded(pair(keyword(&["set", "s"]), multispace1), word),
                Command::SetMode,
            ),
            success(Command::Mode),
        )),
    )(input)
}

fn parse_vars(input: &str) -> IResult<&str, Command> {
    alt((
        preceded(keyword(&["var", "v"]), map(parse_var_command, Command::Var)),
        preceded(
            keyword(&["uvar", "uv"]),
            map(parse_var_command, Command::UserVar),
        ),
    ))(input)
}

fn parse_table(input: &str) -> IResult<&str, Command> {
    preceded(
        pair(keyword(&["table", "tables"]), multispace0),
        alt((
            map(
                preceded(
                    pair(keyword(&["get", "g"]), multispace1),
                    pair(word, preceded(multispace0, remainder)),
                ),
                |(slug, value)| Command::TableGet {
                    slug,
                    value: Some(value).filter(|v| !v.is_empty()),
                },
            ),
            map(
                preceded(pair(keyword(&["show"]), multispace1), word),
                Command::TableShow,
            ),
            map(alt((keyword(&["list", "l", "get", "g"]), eof)), |_| {
                Command::TableList
            }),
        )),
    )(input)
}

fn parse_sample(input: &str) -> IResult<&str, Command> {
    preceded(
        pair(keyword(&["sample"]), multispace1),
        map(
            tuple((signed, preceded(multispace1, signed), remainder)),
            |(k, n, args)| Command::Sample { k, n, args },
        ),
    )(input)
}

fn parse_command_prefix(input: &str) -> IResult<&str, Command> {
    preceded(
        pair(
            keyword(&["cp", "command_prefix", "command-prefix"]),
            multispace0,
        ),
        alt((
            map(keyword(&["get", "g"]), |_| Command::GetCommandPrefix),
            map(
                preceded(
                    pair(keyword(&["set", "s"]), multispace1),
                    recognize(many1(chars_set)),
                ),
                |s| Command::SetCommandPrefix(s.to_owned()),
            ),
        )),
    )(input)
}

fn parse_command<'a>(input: &'a str, prefix: &str) -> IResult<&'a str, Command> {
    preceded(
        tag(prefix),
        alt((
            delimited(
                multispace0,
                alt((
                    parse_help,
                    parse_about,
                    parse_rolls,
                    parse_history,
                    parse_mode,
                    parse_vars,
                    parse_table,
                    parse_sample,
                    parse_command_prefix,
                )),
                pair(multispace0, eof),
            ),
            success(Command::Help),
        )),
    )(input)
}

/// `None` if `message` is not addressed to the bot. Unparseable commands become `Help`.
pub fn parse(message: &str, prefix: &str) -> Option<Command> {
    parse_command(message.trim(), prefix).ok().map(|(_, c)| c)
}

pub fn parse_logging(message: &str, prefix: &str) -> Option<Command> {
    let command = parse(message, prefix);
    if let Some(command) = &command {
        log::info!("{:?}", command);
    }
    command
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rolls() {
        assert_eq!(
            parse("/z r 2d10 + $STR - 3 <= 15 # sneak attack", "/z"),
            Some(Command::Roll(
                "2d10 + $STR - 3 <= 15 # sneak attack".to_string()
            ))
        );
        assert_eq!(
            parse("/zroll d20", "/z"),
            Some(Command::Roll("d20".to_string()))
        );
        assert_eq!(
            parse("/z Q 3d6", "/z"),
            Some(Command::Quiet("3d6".to_string()))
        );
        assert_eq!(
            parse("/z s <@!1234> d100 <= 40 # dodge", "/z"),
            Some(Command::Secret {
                target: Some("1234".to_string()),
                request: "d100 <= 40 # dodge".to_string()
            })
        );
        assert_eq!(
            parse("/z secret d6 # hidden", "/z"),
            Some(Command::Secret {
                target: None,
                request: "d6 # hidden".to_string()
            })
        );
        assert_eq!(
            parse("/z rr", "/z"),
            Some(Command::Reroll {
                target: None,
                args: String::new()
            })
        );
        assert_eq!(
            parse("/z reroll <@42> # again", "/z"),
            Some(Command::Reroll {
                target: Some("42".to_string()),
                args: "# again".to_string()
            })
        );
        assert_eq!(parse("/z r", "/z"), Some(Command::Help));
    }

    #[test]
    fn test_parse_history() {
        assert_eq!(
            parse("/z hist", "/z"),
            Some(Command::History {
                target: None,
                max: DEFAULT_HISTORY_LENGTH
            })
        );
        assert_eq!(
            parse("/z history <@7> 12", "/z"),
            Some(Command::History {
                target: Some("7".to_string()),
                max: 12
            })
        );
        assert_eq!(
            parse("/z hist 3", "/z"),
            Some(Command::History {
                target: None,
                max: 3
            })
        );
    }

    #[test]
    fn test_parse_mode() {
        assert_eq!(parse("/z mode", "/z"), Some(Command::Mode));
        assert_eq!(parse("/z mode list", "/z"), Some(Command::ModeList));
        assert_eq!(
            parse("/z mode set rt", "/z"),
            Some(Command::SetMode("rt".to_string()))
        );
        assert_eq!(parse("/z mode set", "/z"), Some(Command::Help));
    }

    #[test]
    fn test_parse_vars() {
        assert_eq!(parse("/z var", "/z"), Some(Command::Var(VarCommand::List)));
        assert_eq!(
            parse("/z var list", "/z"),
            Some(Command::Var(VarCommand::List))
        );
        assert_eq!(
            parse("/z var set STR -3", "/z"),
            Some(Command::Var(VarCommand::Set("STR".to_string(), -3)))
        );
        assert_eq!(
            parse("/z uvar set $WS 42", "/z"),
            Some(Command::UserVar(VarCommand::Set("WS".to_string(), 42)))
        );
        assert_eq!(
            parse("/z uvar get WS", "/z"),
            Some(Command::UserVar(VarCommand::Get("WS".to_string())))
        );
        assert_eq!(
            parse("/z var del STR", "/z"),
            Some(Command::Var(VarCommand::Delete("STR".to_string())))
        );
        assert_eq!(parse("/z var set STR high", "/z"), Some(Command::Help));
    }

    #[test]
    fn test_parse_tables_and_sample() {
        assert_eq!(parse("/z table", "/z"), Some(Command::TableList));
        assert_eq!(parse("/z table get", "/z"), Some(Command::TableList));
        assert_eq!(
            parse("/z table get perils", "/z"),
            Some(Command::TableGet {
                slug: "perils".to_string(),
                value: None
            })
        );
        assert_eq!(
            parse("/z table get perils 2d50", "/z"),
            Some(Command::TableGet {
                slug: "perils".to_string(),
                value: Some("2d50".to_string())
            })
        );
        assert_eq!(
            parse("/z table show perils", "/z"),
            Some(Command::TableShow("perils".to_string()))
        );
        assert_eq!(
            parse("/z sample 3 10 # loot", "/z"),
            Some(Command::Sample {
                k: 3,
                n: 10,
                args: "# loot".to_string()
            })
        );
        assert_eq!(
            parse("/z sample 0 -4", "/z"),
            Some(Command::Sample {
                k: 0,
                n: -4,
                args: String::new()
            })
        );
    }

    #[test]
    fn test_parse_command() {
        assert_eq!(parse("hello there", "/z"), None);
        assert_eq!(parse("/z", "/z"), Some(Command::Help));
        assert_eq!(parse("/z nonsense", "/z"), Some(Command::Help));
        assert_eq!(parse("/z about", "/z"), Some(Command::About));
        assert_eq!(
            parse("!cp set !", "!"),
            Some(Command::SetCommandPrefix("!".to_string()))
        );
        assert_eq!(parse("ü cp get", "ü"), Some(Command::GetCommandPrefix));
    }

    #[test]
    fn test_chars_set() {
        assert_eq!(chars_set("ä"), Ok(("", 'ä')));
        assert_eq!(chars_set(":"), Ok(("", ':')));
        assert_eq!(chars_set("%"), Ok(("", '%')));
        assert_eq!(chars_set("✅"), Ok(("", '✅')));
    }
}
