// Kept in sync with the SQL under `migrations/` by hand.

diesel::table! {
    players (id) {
        id -> BigInt,
        display_name -> Nullable<Text>,
        username -> Nullable<Text>,
        locale -> Nullable<Text>,
        is_premium -> Bool,
        registered_at -> Timestamp,
        last_seen_at -> Timestamp,
        session_count -> BigInt,
    }
}

diesel::table! {
    session_log (id) {
        id -> BigInt,
        player_id -> BigInt,
        started_at -> Timestamp,
    }
}

diesel::table! {
    game_saves (player_id) {
        player_id -> BigInt,
        blob -> Text,
        version_tag -> Text,
        saved_at -> Timestamp,
        backup_count -> BigInt,
    }
}

diesel::table! {
    player_statistics (player_id) {
        player_id -> BigInt,
        total_playtime_hours -> Double,
        total_resources -> Double,
        highest_combo -> BigInt,
        total_clicks -> BigInt,
        buildings_built -> BigInt,
        skills_learned -> BigInt,
        raids_completed -> BigInt,
        achievements_unlocked -> BigInt,
        last_updated -> Timestamp,
    }
}

diesel::table! {
    leaderboard_entries (player_id, category) {
        player_id -> BigInt,
        category -> Text,
        score -> Double,
        rank -> BigInt,
        updated_at -> Timestamp,
    }
}

diesel::joinable!(session_log -> players (player_id));
diesel::joinable!(game_saves -> players (player_id));
diesel::joinable!(player_statistics -> players (player_id));
diesel::joinable!(leaderboard_entries -> players (player_id));

diesel::allow_tables_to_appear_in_same_query!(
    game_saves,
    leaderboard_entries,
    player_statistics,
    players,
    session_log,
);
