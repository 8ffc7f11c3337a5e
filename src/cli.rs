use clap::{Arg, ArgAction, ArgMatches, Command};
use pantry_client::{CancellationToken, Config, PantryClient, UpdatedInfo};
use serde_json::{Map, Value};
use std::io::Read;

pub fn build_cli() -> Command {
    let basket_arg = || {
        Arg::new("basket")
            .required(true)
            .num_args(1)
            .help("Basket name")
    };
    let file_arg = || {
        Arg::new("file")
            .long("file")
            .short('f')
            .num_args(1)
            .help("Read the JSON object from this file instead of stdin")
    };
    Command::new("pantry")
        .about("Command-line client for the Pantry JSON storage service")
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .num_args(1)
                .global(true)
                .help("Override RUST_LOG level (e.g., info, debug)"),
        )
        .arg(
            Arg::new("version")
                .long("version")
                .help("Print version and exit")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("api-url")
                .long("api-url")
                .num_args(1)
                .global(true)
                .help("Override PANTRY_API_URL"),
        )
        .arg(
            Arg::new("no-rate-limit")
                .long("no-rate-limit")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Send requests without client-side throttling"),
        )
        .arg(
            Arg::new("strict")
                .long("strict")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Fail on undecodable responses instead of returning defaults"),
        )
        .subcommand(Command::new("details").about("Show pantry details"))
        .subcommand(
            Command::new("update-details")
                .about("Update pantry name and description")
                .arg(Arg::new("name").long("name").required(true).num_args(1))
                .arg(
                    Arg::new("description")
                        .long("description")
                        .required(true)
                        .num_args(1),
                ),
        )
        .subcommand(
            Command::new("put")
                .about("Create or replace a basket")
                .arg(basket_arg())
                .arg(file_arg()),
        )
        .subcommand(
            Command::new("patch")
                .about("Merge a JSON object into a basket")
                .arg(basket_arg())
                .arg(file_arg()),
        )
        .subcommand(Command::new("get").about("Print basket content").arg(basket_arg()))
        .subcommand(
            Command::new("delete")
                .about("Delete a basket and all of its data")
                .arg(basket_arg()),
        )
        .subcommand(
            Command::new("has")
                .about("Check whether a basket exists")
                .arg(basket_arg()),
        )
}

pub fn init_logging(level: Option<&str>) {
    // Explicit level wins, then RUST_LOG, then warn (stdout carries command output).
    let env = env_logger::Env::default().default_filter_or(level.unwrap_or("warn"));
    let mut builder = env_logger::Builder::from_env(env);
    if let Some(lvl) = level {
        builder.parse_filters(lvl);
    }
    builder.init();
}

pub fn config_from(matches: &ArgMatches) -> anyhow::Result<Config> {
    let mut cfg = Config::from_env()?;
    if let Some(url) = matches.get_one::<String>("api-url") {
        cfg = cfg.with_api_url(url.clone());
    }
    if matches.get_flag("no-rate-limit") {
        cfg = cfg.unthrottled();
    }
    if matches.get_flag("strict") {
        cfg = cfg.strict();
    }
    Ok(cfg)
}

fn read_object(matches: &ArgMatches) -> anyhow::Result<Map<String, Value>> {
    let raw = match matches.get_one::<String>("file") {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut s = String::new();
            std::io::stdin().read_to_string(&mut s)?;
            s
        }
    };
    match serde_json::from_str::<Value>(&raw)? {
        Value::Object(map) => Ok(map),
        other => anyhow::bail!("basket content must be a JSON object, got {}", kind(&other)),
    }
}

fn kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn basket(matches: &ArgMatches) -> &str {
    matches
        .get_one::<String>("basket")
        .map(String::as_str)
        .unwrap_or_default()
}

/// Runs one subcommand and returns what should be printed on stdout.
pub async fn run(
    client: &PantryClient,
    matches: &ArgMatches,
    cancel: &CancellationToken,
) -> anyhow::Result<String> {
    let out = match matches.subcommand() {
        Some(("details", _)) => serde_json::to_string_pretty(&client.get_details(cancel).await?)?,
        Some(("update-details", m)) => {
            let info = UpdatedInfo {
                name: m.get_one::<String>("name").cloned().unwrap_or_default(),
                description: m
                    .get_one::<String>("description")
                    .cloned()
                    .unwrap_or_default(),
            };
            serde_json::to_string_pretty(&client.update_details(&info, cancel).await?)?
        }
        Some(("put", m)) => {
            let data = read_object(m)?;
            client
                .create_or_replace_basket_json(basket(m), &data, cancel)
                .await?
                .to_string()
        }
        Some(("patch", m)) => {
            let data = read_object(m)?;
            let merged = client
                .update_basket_content_json(basket(m), &data, cancel)
                .await?;
            serde_json::to_string_pretty(&merged)?
        }
        Some(("get", m)) => {
            let content: Value = client.get_basket_content(basket(m), cancel).await?;
            serde_json::to_string_pretty(&content)?
        }
        Some(("delete", m)) => client.delete_basket(basket(m), cancel).await?.to_string(),
        Some(("has", m)) => client.has_basket(basket(m), cancel).await?.to_string(),
        _ => anyhow::bail!("no subcommand given; see --help"),
    };
    Ok(out)
}
