use zardoz_dice::GameMode;

pub(crate) fn mode_message(mode: GameMode) -> String {
    format!("**Mode:**: {}\n*{}*", mode, mode.description())
}

pub(crate) fn mode_list_message() -> String {
    GameMode::ALL
        .iter()
        .map(|mode| format!("{}: {}", mode, mode.description()))
        .collect::<Vec<_>>()
        .join("\n")
}

pub(crate) fn set_mode_message(mode: GameMode) -> String {
    format!("**Set Mode:** {}", mode)
}

pub(crate) fn unknown_mode_message(name: &str) -> String {
    format!("{} is not a valid mode.", name)
}
