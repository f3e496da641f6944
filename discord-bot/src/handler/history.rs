use bot_utils::RollRecord;
use zardoz_dice::ARROW;

fn history_line(record: &RollRecord) -> String {
    let mut line = format!(
        "{} @ <t:{}:f>: `{:20}` {} `{}`",
        record.display_name(),
        record.time,
        record.roll,
        ARROW,
        record.result
    );
    if !record.tag.is_empty() {
        line.push_str(&format!(" # {}", record.tag));
    }
    line
}

pub(crate) fn history_message(records: &[RollRecord]) -> String {
    let lines: Vec<String> = records.iter().map(history_line).collect();
    format!("**Roll :game_die: History**:\n{}", lines.join("\n"))
}

pub(crate) fn no_history_message(member: &str) -> String {
    format!("Ope, no roll history for <@{}>.", member)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(nick: Option<&str>, tag: &str) -> RollRecord {
        RollRecord {
            id: 1,
            client_id: "{}".to_string(),
            member_id: "42".to_string(),
            member_nick: nick.map(str::to_string),
            member_name: "kai".to_string(),
            roll: "d100 <= $WS".to_string(),
            tag: tag.to_string(),
            result: "1d100 <= 45".to_string(),
            time: 1_614_000_000,
        }
    }

    #[test]
    fn test_history_message() {
        let records = vec![record(Some("Brother Kai"), "parry"), record(None, "")];
        assert_eq!(
            history_message(&records),
            format!(
                "**Roll :game_die: History**:\n\
                 Brother Kai @ <t:1614000000:f>: `d100 <= $WS         ` {0} `1d100 <= 45` # parry\n\
                 kai @ <t:1614000000:f>: `d100 <= $WS         ` {0} `1d100 <= 45`",
                ARROW
            )
        );
        assert_eq!(no_history_message("42"), "Ope, no roll history for <@42>.");
    }
}
