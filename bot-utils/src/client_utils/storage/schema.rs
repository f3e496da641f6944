table! {
    client_config (id) {
        id -> Text,
        command_prefix -> Text,
        game_mode -> Text,
    }
}

table! {
    variables (client_id, member_id, name) {
        client_id -> Text,
        member_id -> Text,
        name -> Text,
        value -> BigInt,
        set_by -> Text,
    }
}

table! {
    rolls (id) {
        id -> Integer,
        client_id -> Text,
        member_id -> Text,
        member_nick -> Nullable<Text>,
        member_name -> Text,
        roll -> Text,
        tag -> Text,
        result -> Text,
        time -> BigInt,
    }
}

pub(crate) const CREATE_TABLES: &str = "
CREATE TABLE IF NOT EXISTS client_config (
    id TEXT PRIMARY KEY NOT NULL,
    command_prefix TEXT NOT NULL,
    game_mode TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS variables (
    client_id TEXT NOT NULL,
    member_id TEXT NOT NULL,
    name TEXT NOT NULL,
    value BIGINT NOT NULL,
    set_by TEXT NOT NULL,
    PRIMARY KEY (client_id, member_id, name)
);
CREATE TABLE IF NOT EXISTS rolls (
    id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
    client_id TEXT NOT NULL,
    member_id TEXT NOT NULL,
    member_nick TEXT,
    member_name TEXT NOT NULL,
    roll TEXT NOT NULL,
    tag TEXT NOT NULL,
    result TEXT NOT NULL,
    time BIGINT NOT NULL
);
CREATE INDEX IF NOT EXISTS rolls_by_member ON rolls (client_id, member_id);
";
