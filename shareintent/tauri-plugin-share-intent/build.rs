const COMMANDS: &[&str] = &[
    "get_share_intent",
    "reset_share_intent",
    "has_share_intent",
    "notify_url",
];

fn main() {
    // Native share modules (Kotlin activity listener, Swift share extension)
    // are generated into the host app project, not shipped with this crate.
    tauri_plugin::Builder::new(COMMANDS).build();
}
