use std::{env, env::VarError};

/// There's no real CLI for the server. Any argument prints the help text and the current configuration.
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    // PGW_GATEWAY_SECRET_KEY is left out on purpose
    const DISPLAY_ENVS: [&str; 12] = [
        "RUST_LOG",
        "PGW_DATABASE_URL",
        "PGW_MAX_DB_CONNECTIONS",
        "PGW_CURRENCIES",
        "PGW_GATEWAY_URL",
        "PGW_GATEWAY_SHOP_ID",
        "PGW_GATEWAY_TIMEOUT",
        "PGW_TRACKING_TTL",
        "PGW_POLL_UNIT",
        "PGW_FETCH_TIMEOUT",
        "PGW_SWEEP_INTERVAL",
        "PGW_INGEST_QUEUE_SIZE",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
