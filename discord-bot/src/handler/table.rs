use bot_utils::tables::{RollTable, TableError, TableRoll, PAGE_LIMIT};
use serenity::{client::Context, model::channel::Message};
use std::sync::Arc;
use zardoz_dice::ARROW;

pub(crate) fn list_message(tables: &[Arc<RollTable>]) -> String {
    let mut text = "**Available Tables:**\n".to_string();
    for table in tables {
        text.push_str(&format!("`{:15}` {}\n", table.slug, table.title()));
    }
    text
}

pub(crate) fn roll_message(table: &RollTable, result: &TableRoll) -> String {
    let rolled = match &result.die {
        Some(die) => format!("{} {} {}", die, ARROW, result.value),
        None => result.value.to_string(),
    };
    let mut text = format!("**Roll:** {}\n**Table:** {}\n", rolled, table.title());
    if let Some(name) = &result.name {
        text.push_str(&format!("**Name:** {}\n", name));
    }
    text.push_str(&format!("**Effect:** {}", result.effect));
    text
}

pub(crate) fn error_message(err: &TableError) -> String {
    match err {
        TableError::UnknownTable(_) => err.to_string(),
        _ => "Bad table value. Perils be upon ye.".to_string(),
    }
}

/// Sends the whole table, one embed per page.
pub(crate) async fn show(context: &Context, message: &Message, table: &RollTable) {
    let title = table.title();
    for page in table.pages(PAGE_LIMIT) {
        if let Err(err) = message
            .channel_id
            .send_message(context, |m| {
                m.embed(|e| e.title(&title).description(page))
            })
            .await
        {
            log::warn!("Unable to show table {}: {}", table.slug, err);
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crits() -> RollTable {
        RollTable {
            slug: "crits".to_string(),
            full_name: "Critical Hits".to_string(),
            game: "Dark Heresy".to_string(),
            book: "Core Rulebook".to_string(),
            die: "1d10".to_string(),
            rolls: Vec::new(),
        }
    }

    #[test]
    fn test_list_message() {
        let tables = vec![Arc::new(crits())];
        assert_eq!(
            list_message(&tables),
            "**Available Tables:**\n`crits          ` Critical Hits (Dark Heresy, Core Rulebook)\n"
        );
    }

    #[test]
    fn test_roll_message() {
        let rolled = TableRoll {
            die: Some("1d10".to_string()),
            value: 7,
            name: Some("Ouch".to_string()),
            effect: "Lose an arm.".to_string(),
        };
        assert_eq!(
            roll_message(&crits(), &rolled),
            format!(
                "**Roll:** 1d10 {} 7\n**Table:** Critical Hits (Dark Heresy, Core Rulebook)\n**Name:** Ouch\n**Effect:** Lose an arm.",
                ARROW
            )
        );
        let fixed = TableRoll {
            die: None,
            value: 3,
            name: None,
            effect: "Stunned.".to_string(),
        };
        assert!(roll_message(&crits(), &fixed).starts_with("**Roll:** 3\n"));
    }

    #[test]
    fn test_error_message() {
        assert_eq!(
            error_message(&TableError::UnknownTable("foo".to_string())),
            "foo is not a valid table."
        );
        assert_eq!(
            error_message(&TableError::NoEntry(200)),
            "Bad table value. Perils be upon ye."
        );
    }
}
