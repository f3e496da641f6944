pub(crate) fn list_message(variables: &[(String, i64)]) -> String {
    if variables.is_empty() {
        "**No variables set.**".to_string()
    } else {
        variables
            .iter()
            .map(|(name, value)| format!("**{}**: {}", name, value))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

pub(crate) fn get_message(name: &str, value: Option<i64>) -> String {
    match value {
        Some(value) => set_message(name, value),
        None => format!("**{}** is not defined.", name),
    }
}

pub(crate) fn set_message(name: &str, value: i64) -> String {
    format!("**{}** = {}", name, value)
}

pub(crate) fn delete_message(name: &str, deleted: bool) -> String {
    if deleted {
        format!("**{}** deleted", name)
    } else {
        get_message(name, None)
    }
}
