use serenity::{client::Context, model::channel::Message};

const ROLL_COMMANDS: &str = "
`roll [expr]`, `r [expr]` => roll `[expr]`, e.g. `2d10 + $STR - 3 <= 15 # sneak attack`
`quiet [expr]`, `q [expr]` => only show the result
`secret [@user] [expr]`, `s [@user] [expr]` => send the result by DM, to you or `[@user]`
`reroll [@user] [# tag]`, `rr [@user] [# tag]` => repeat your (or `[@user]`'s) last roll, optionally with a new tag
`hist [@user] [n]`, `history [@user] [n]` => the last `[n]` rolls
`sample [k] [N]` => draw `[k]` distinct values from 1 to `[N]`
";

const ROLL_SYNTAX: &str = "
`NdM` rolls N dice with M sides, `NdMt` sums them right away. `r` is the die of the current mode.
`+`, `-` apply to every die. `.+`, `.-` go element by element and need operands of the same size.
`<`, `<=`, `>`, `>=`, `==` compare each die. `$NAME` is replaced by a variable.
";

pub(crate) async fn help(context: &Context, message: &Message, prefix: String) {
    if let Err(err) = message.channel_id.send_message(context, |m| {
                m.reference_message((message.channel_id, message.id))
                    .allowed_mentions(|mentions|mentions.empty_users())
                 .embed(|e|{
                     e.title("Command Syntax")
                      .description(format!("
All commands start with `{}`, followed by whitespace.
Anything after a `#` in a roll is its tag.
", prefix)).field("Privileged Commands", "
Some commands require server administrator rights. They are prefixed with \\* in this overview.
", false)
                      .field(
                          "General",
                          "
`help`, `h` => show this help text
`about`, `info` => version and invite link
",
                          false
                      ).field(
                          "Roll",
                          ROLL_COMMANDS,
                          false
                      ).field(
                          "Roll Syntax",
                          ROLL_SYNTAX,
                          false
                      ).field(
                          "Mode",
                          "
`mode` => show the current mode
`mode list`, `mode l` => list modes
\\* `mode set [mode]`, `mode s [mode]` => switch mode
",
                          false
                      ).field(
                          "Variables",
                          "
`var`, `v` => server variables. `uvar`, `uv` => your own, which take precedence.
Both accept `list`, `get [NAME]`, `set [NAME] [value]` and `del [NAME]`.
",
                          false
                      ).field(
                          "Tables",
                          "
`table list`, `tables` => list tables
`table get [table] [roll]` => look up `[roll]` (or roll the table's die)
`table show [table]` => print the whole table
",
                          false
                      ).field(
                          "Command Prefix",
                          "
\\* `cp set [prefix]`, `cp s [prefix]` => change the command prefix
`cp get`, `cp g` => show the command prefix
",
                          false
                      )
                 })
            }).await {
                log::warn!("Unable to reply to message {}: {}",message.id,err)
            }
}
