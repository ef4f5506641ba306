//! BMC Console CLI
//!
//! Entry point for the `bmc-console` command-line tool. Every invocation
//! opens its own session: commands that need one log in first and log out
//! when done.

use bmc_console::batch::{BatchSummary, ToastKind};
use bmc_console::client::{HttpConfig, HttpTransport};
use bmc_console::config::{ConsoleSettings, EffectiveConfig};
use bmc_console::i18n::Catalog;
use bmc_console::logging::{init_logging, LoggingConfig};
use bmc_console::session::{
    CookieSessionMarkers, FileProfileCache, MemoryProfileCache, ProfileCache,
};
use bmc_console::stores::{AccountSettings, NewUser, UserUpdate};
use bmc_console::{BatchExecutor, BmcConsole, StoreContext};
use clap::{Args, Parser, Subcommand};
use redfish_protocol::paths;
use serde::Serialize;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "bmc-console")]
#[command(about = "Redfish BMC session, event log and user management", version)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalArgs {
    /// Path to config file (default: ~/.config/bmc-console/config.toml)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// BMC address, e.g. https://10.0.0.5
    #[arg(long, env = "BMC_URL", global = true)]
    base_url: Option<String>,

    /// Accept any BMC certificate
    #[arg(long, global = true)]
    insecure: bool,

    /// Simultaneous batch requests (0 = unbounded)
    #[arg(long, global = true)]
    max_in_flight: Option<u64>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    #[arg(long, short = 'u', env = "BMC_USERNAME", global = true)]
    username: Option<String>,

    #[arg(long, short = 'p', env = "BMC_PASSWORD", hide_env_values = true, global = true)]
    password: Option<String>,

    /// One-time password for accounts with TOTP enabled
    #[arg(long, env = "BMC_OTP", hide_env_values = true, global = true)]
    otp: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the login page details (no login needed)
    Info,

    /// Check credentials and remember the username
    Login,

    /// End the session and forget the cached profile
    Logout,

    /// Event log commands
    Logs {
        #[command(subcommand)]
        action: LogsCommands,
    },

    /// User account commands
    Users {
        #[command(subcommand)]
        action: UsersCommands,
    },

    /// Multi-factor authentication commands
    Mfa {
        #[command(subcommand)]
        action: MfaCommands,
    },

    /// Print the effective configuration
    Config,
}

#[derive(Subcommand)]
enum LogsCommands {
    /// List event log and CE log entries
    List {
        /// Only the CE log
        #[arg(long)]
        ce: bool,
    },

    /// Health status and high-priority entries
    Status,

    /// Mark entries resolved
    Resolve {
        #[arg(required = true)]
        uris: Vec<String>,
    },

    /// Mark entries unresolved
    Unresolve {
        #[arg(required = true)]
        uris: Vec<String>,
    },

    /// Resolve or unresolve one entry
    SetStatus {
        uri: String,

        /// Mark unresolved instead of resolved
        #[arg(long)]
        unresolved: bool,
    },

    /// Delete entries
    Delete {
        #[arg(required = true)]
        uris: Vec<String>,
    },

    /// Clear the whole event log
    Clear,

    /// Print the PEL attachment of an entry
    Download { uri: String },
}

#[derive(Subcommand)]
enum UsersCommands {
    /// List accounts
    List,

    /// List assignable roles
    Roles,

    /// Create an account
    Create {
        username: String,

        #[arg(long)]
        new_password: String,

        #[arg(long, default_value = "ReadOnly")]
        role: String,

        /// Create the account disabled
        #[arg(long)]
        disabled: bool,

        /// Exempt the account from TOTP
        #[arg(long)]
        mfa_bypass: bool,
    },

    /// Edit an account
    Update {
        username: String,

        #[arg(long)]
        new_name: Option<String>,

        #[arg(long)]
        new_password: Option<String>,

        #[arg(long)]
        role: Option<String>,

        #[arg(long, conflicts_with = "disable")]
        enable: bool,

        #[arg(long)]
        disable: bool,

        #[arg(long)]
        unlock: bool,
    },

    /// Delete accounts
    Delete {
        #[arg(required = true)]
        usernames: Vec<String>,
    },

    /// Enable accounts
    Enable {
        #[arg(required = true)]
        usernames: Vec<String>,
    },

    /// Disable accounts
    Disable {
        #[arg(required = true)]
        usernames: Vec<String>,
    },

    /// Show or change the lockout settings
    Settings {
        #[arg(long)]
        lockout_threshold: Option<u64>,

        /// Seconds
        #[arg(long)]
        lockout_duration: Option<u64>,
    },
}

#[derive(Subcommand)]
enum MfaCommands {
    /// Enable TOTP for every account
    Enable,

    /// Disable TOTP for every account
    Disable,

    /// Generate a TOTP secret for the logged-in account
    GenerateKey,

    /// Confirm TOTP registration with a code from the authenticator
    Verify { code: String },

    /// Clear the TOTP secret of an account
    ClearKey { username: String },

    /// Exempt an account from TOTP
    Bypass {
        username: String,

        /// Stop exempting the account
        #[arg(long)]
        off: bool,
    },

    /// Whether the logged-in account is exempt from TOTP
    Status,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(&cli.global) {
        Ok(c) => c,
        Err(e) => fail(&format!("Error loading config: {}", e)),
    };
    let settings = config.settings();

    let json_logs = settings.logging_json || cli.global.json_logs;
    init_logging(&LoggingConfig::default().with_json(json_logs));

    if let Commands::Config = cli.command {
        match config.to_json() {
            Ok(json) => println!("{}", json),
            Err(e) => fail(&format!("Error serializing output: {}", e)),
        }
        return;
    }

    let console = match build_console(&settings) {
        Ok(c) => c,
        Err(e) => fail(&e),
    };

    let ok = match cli.command {
        Commands::Info => run_info(&console, cli.global.json).await,
        Commands::Login => run_login(&console, &cli.global).await,
        Commands::Logout => run_logout(&console).await,
        Commands::Logs { action } => {
            login(&console, &cli.global).await;
            let ok = run_logs(&console, action, cli.global.json).await;
            logout(&console).await;
            ok
        }
        Commands::Users { action } => {
            login(&console, &cli.global).await;
            let actor = cli.global.username.clone().unwrap_or_default();
            let ok = run_users(&console, action, &actor, cli.global.json).await;
            logout(&console).await;
            ok
        }
        Commands::Mfa { action } => {
            login(&console, &cli.global).await;
            let username = cli.global.username.clone().unwrap_or_default();
            let ok = run_mfa(&console, action, &username, cli.global.json).await;
            logout(&console).await;
            ok
        }
        Commands::Config => true,
    };

    if !ok {
        process::exit(1);
    }
}

fn fail(message: &str) -> ! {
    eprintln!("{}", message);
    process::exit(1);
}

fn load_config(global: &GlobalArgs) -> Result<EffectiveConfig, String> {
    let path = global
        .config
        .clone()
        .or_else(EffectiveConfig::default_user_config_path);

    let mut overrides = serde_json::Map::new();
    if let Some(ref url) = global.base_url {
        overrides.insert("base_url".to_string(), serde_json::json!(url));
    }
    if global.insecure {
        overrides.insert("verify_tls".to_string(), serde_json::json!(false));
    }
    if let Some(max) = global.max_in_flight {
        overrides.insert("batch".to_string(), serde_json::json!({ "max_in_flight": max }));
    }
    if global.json_logs {
        overrides.insert("logging".to_string(), serde_json::json!({ "json": true }));
    }

    let cli = (!overrides.is_empty()).then_some(serde_json::Value::Object(overrides));
    EffectiveConfig::build(path.as_deref(), cli).map_err(|e| e.to_string())
}

fn build_console(settings: &ConsoleSettings) -> Result<BmcConsole, String> {
    let transport = HttpTransport::new(&HttpConfig {
        base_url: settings.base_url.clone(),
        connect_timeout_seconds: settings.connect_timeout_seconds,
        request_timeout_seconds: settings.request_timeout_seconds,
        verify_tls: settings.verify_tls,
    })
    .map_err(|e| format!("Error creating HTTP client: {}", e))?;

    let markers = CookieSessionMarkers::new(transport.cookie_jar(), transport.base_url().clone());

    let profile: Arc<dyn ProfileCache> = match settings
        .profile_path
        .clone()
        .or_else(FileProfileCache::default_path)
    {
        Some(path) => Arc::new(FileProfileCache::new(path)),
        None => Arc::new(MemoryProfileCache::new()),
    };

    let mut catalog = Catalog::english();
    if let Some(ref path) = settings.locale_file {
        let overlay = Catalog::load(path).map_err(|e| format!("Error loading messages: {}", e))?;
        catalog.merge(overlay);
    }

    let ctx = StoreContext::new(Arc::new(transport), Arc::new(markers), profile, Arc::new(catalog))
        .with_executor(BatchExecutor::with_max_in_flight(settings.batch_max_in_flight));
    Ok(BmcConsole::new(ctx))
}

async fn login(console: &BmcConsole, global: &GlobalArgs) {
    let Some(ref username) = global.username else {
        fail("A username is required (--username or BMC_USERNAME)");
    };
    let password = global.password.as_deref().unwrap_or_default();
    let otp = global.otp.as_deref().unwrap_or_default();

    if let Err(e) = console.auth.login(username, password, otp).await {
        fail(&e.to_string());
    }
    if console.auth.generate_otp_required() {
        eprintln!(
            "A TOTP secret must be generated for this account: run `bmc-console mfa generate-key`."
        );
    }
}

async fn logout(console: &BmcConsole) {
    if let Err(e) = console.auth.logout().await {
        eprintln!("Error logging out: {}", e);
    }
}

fn print_json<T: Serialize>(value: &T) -> bool {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{}", json);
            true
        }
        Err(e) => {
            eprintln!("Error serializing output: {}", e);
            false
        }
    }
}

/// Print a single-operation result; false on failure
fn report<E: std::fmt::Display>(result: Result<String, E>, json_output: bool) -> bool {
    match result {
        Ok(message) if json_output => {
            print_json(&serde_json::json!({ "type": "success", "message": message }))
        }
        Ok(message) => {
            println!("{}", message);
            true
        }
        Err(e) => {
            if json_output {
                print_json(&serde_json::json!({ "type": "error", "message": e.to_string() }));
            } else {
                eprintln!("{}", e);
            }
            false
        }
    }
}

/// Print a batch summary; false when any item failed
fn report_summary(summary: &BatchSummary, json_output: bool) -> bool {
    if json_output {
        print_json(summary);
    } else {
        for message in &summary.messages {
            match message.kind {
                ToastKind::Success => println!("{}", message.message),
                ToastKind::Error => eprintln!("{}", message.message),
            }
        }
    }
    !summary.has_errors()
}

async fn run_info(console: &BmcConsole, json_output: bool) -> bool {
    let Some(details) = console.auth.load_login_page_details().await else {
        eprintln!("Could not read the service root");
        return false;
    };
    if json_output {
        return print_json(&details);
    }
    if let Some(date_time) = details.date_time {
        println!("Date/time:  {}", date_time);
    }
    if let Some(ref model) = details.model {
        println!("Model:      {}", model);
    }
    if let Some(ref serial) = details.serial {
        println!("Serial:     {}", serial);
    }
    println!("ACF window: {}", if details.acf_window_active { "active" } else { "inactive" });
    let totp = if console.auth.global_mfa_enabled() { "enabled" } else { "disabled" };
    println!("TOTP:       {}", totp);
    true
}

async fn run_login(console: &BmcConsole, global: &GlobalArgs) -> bool {
    login(console, global).await;
    let username = global.username.as_deref().unwrap_or_default();
    println!("Logged in as {}", username);
    if console.auth.check_password_change_required(username).await == Some(true) {
        println!("The password of this account must be changed.");
    }
    true
}

async fn run_logout(console: &BmcConsole) -> bool {
    match console.auth.logout().await {
        Ok(()) => {
            println!("Logged out");
            true
        }
        Err(e) => {
            eprintln!("Error logging out: {}", e);
            false
        }
    }
}

async fn run_logs(console: &BmcConsole, action: LogsCommands, json_output: bool) -> bool {
    let store = &console.event_log;
    match action {
        LogsCommands::List { ce } => {
            if let Err(e) = store.refresh().await {
                eprintln!("Error loading logs: {}", e);
                return false;
            }
            let entries = if ce { store.ce_logs() } else { store.all_events() };
            if json_output {
                return print_json(&entries);
            }
            for entry in entries {
                println!(
                    "{:<10} {:<9} {:<11} {:<25} {}",
                    entry.id,
                    entry.severity.as_deref().unwrap_or("-"),
                    entry.filter_by_status,
                    entry.date.map(|d| d.to_rfc3339()).unwrap_or_default(),
                    entry.description.as_deref().unwrap_or_default(),
                );
            }
            true
        }
        LogsCommands::Status => {
            if let Err(e) = store.refresh().await {
                eprintln!("Error loading logs: {}", e);
                return false;
            }
            let health = store.health_status();
            let high_priority = store.high_priority_events();
            if json_output {
                return print_json(&serde_json::json!({
                    "health": health,
                    "high_priority_events": high_priority,
                }));
            }
            println!("Health: {}", health);
            println!("High-priority entries: {}", high_priority.len());
            true
        }
        LogsCommands::Resolve { uris } => {
            report_summary(&store.resolve_event_logs(entry_uris(uris)).await, json_output)
        }
        LogsCommands::Unresolve { uris } => {
            report_summary(&store.unresolve_event_logs(entry_uris(uris)).await, json_output)
        }
        LogsCommands::SetStatus { uri, unresolved } => report(
            store
                .update_event_log_status(&entry_uri(uri), !unresolved)
                .await,
            json_output,
        ),
        LogsCommands::Delete { uris } => {
            report_summary(&store.delete_event_logs(entry_uris(uris)).await, json_output)
        }
        LogsCommands::Clear => {
            let count = match store.fetch_event_logs().await {
                Ok(()) => store.state().event_logs.len(),
                Err(_) => 0,
            };
            report(
                store
                    .delete_all_event_logs(count)
                    .await
                    .map(|_| "Event log cleared.".to_string()),
                json_output,
            )
        }
        LogsCommands::Download { uri } => match store.download_log_data(&entry_uri(uri)).await {
            Ok(Some(pel)) => {
                println!("{}", pel);
                true
            }
            Ok(None) => {
                eprintln!("The entry has no PEL attachment");
                false
            }
            Err(e) => {
                eprintln!("{}", e);
                false
            }
        },
    }
}

/// Bare entry IDs refer to the event log
fn entry_uri(id_or_uri: String) -> String {
    if id_or_uri.starts_with('/') {
        id_or_uri
    } else {
        format!("{}/{}", paths::EVENT_LOG_ENTRIES, id_or_uri)
    }
}

fn entry_uris(ids: Vec<String>) -> Vec<String> {
    ids.into_iter().map(entry_uri).collect()
}

async fn run_users(
    console: &BmcConsole,
    action: UsersCommands,
    actor: &str,
    json_output: bool,
) -> bool {
    let store = &console.users;
    match action {
        UsersCommands::List => {
            if let Err(e) = store.get_users().await {
                eprintln!("{}", e);
                return false;
            }
            let users = store.all_users();
            if json_output {
                return print_json(&users);
            }
            for user in users {
                let bypass = user.mfa_bypass.as_ref().is_some_and(|b| b.is_bypassed());
                println!(
                    "{:<16} {:<20} {:<8} {:<6} {}",
                    user.user_name,
                    user.role_id,
                    if user.enabled { "enabled" } else { "disabled" },
                    if user.locked { "locked" } else { "" },
                    if bypass { "mfa-bypass" } else { "" },
                );
            }
            true
        }
        UsersCommands::Roles => {
            if let Err(e) = store.get_account_roles().await {
                eprintln!("Error loading roles: {}", e);
                return false;
            }
            let roles = store.filtered_account_roles();
            if json_output {
                return print_json(&roles);
            }
            for role in roles {
                println!("{}", role);
            }
            true
        }
        UsersCommands::Create {
            username,
            new_password,
            role,
            disabled,
            mfa_bypass,
        } => {
            let user = NewUser {
                username: username.clone(),
                password: new_password,
                privilege: role,
                status: !disabled,
            };
            let created = report(store.create_user(&user).await, json_output);
            if created && mfa_bypass {
                if let Err(e) = store.update_mfa_bypass_new_user(&username, true).await {
                    eprintln!("{}", e);
                    return false;
                }
            }
            created
        }
        UsersCommands::Update {
            username,
            new_name,
            new_password,
            role,
            enable,
            disable,
            unlock,
        } => {
            if let Err(e) = store.get_users().await {
                eprintln!("{}", e);
                return false;
            }
            let users = store.all_users();
            if !users.iter().any(|u| u.user_name == username) {
                eprintln!("No such user: {}", username);
                return false;
            }
            let actor_role = users
                .iter()
                .find(|u| u.user_name == actor)
                .map(|u| u.role_id.clone())
                .unwrap_or_default();
            let update = UserUpdate {
                original_username: username,
                username: new_name,
                password: new_password,
                privilege: role,
                status: (enable || disable).then_some(enable),
                locked: unlock.then_some(false),
            };
            report(
                store
                    .update_user_from_user_management(&update, &actor_role)
                    .await,
                json_output,
            )
        }
        UsersCommands::Delete { mut usernames } => {
            if usernames.len() == 1 {
                let username = usernames.remove(0);
                report(store.delete_user(&username).await, json_output)
            } else {
                report_summary(&store.delete_users(usernames).await, json_output)
            }
        }
        UsersCommands::Enable { usernames } => {
            report_summary(&store.enable_users(usernames).await, json_output)
        }
        UsersCommands::Disable { usernames } => {
            report_summary(&store.disable_users(usernames).await, json_output)
        }
        UsersCommands::Settings {
            lockout_threshold,
            lockout_duration,
        } => {
            if lockout_threshold.is_some() || lockout_duration.is_some() {
                let settings = AccountSettings {
                    lockout_duration,
                    lockout_threshold,
                };
                return report(store.save_account_settings(settings).await, json_output);
            }
            if let Err(e) = store.get_account_settings().await {
                eprintln!("{}", e);
                return false;
            }
            let settings = store.account_settings();
            let requirements = store.password_requirements();
            if json_output {
                return print_json(&serde_json::json!({
                    "account_settings": settings,
                    "password_requirements": requirements,
                    "global_mfa_enabled": store.global_mfa_enabled(),
                }));
            }
            let show = |v: Option<u64>| v.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string());
            println!("Lockout threshold: {}", show(settings.lockout_threshold));
            println!("Lockout duration:  {}", show(settings.lockout_duration));
            println!(
                "Password length:   {}..{}",
                show(requirements.min_length.map(u64::from)),
                show(requirements.max_length.map(u64::from)),
            );
            true
        }
    }
}

async fn run_mfa(
    console: &BmcConsole,
    action: MfaCommands,
    username: &str,
    json_output: bool,
) -> bool {
    let store = &console.users;
    match action {
        MfaCommands::Enable => report(store.update_global_mfa(true).await, json_output),
        MfaCommands::Disable => report(store.update_global_mfa(false).await, json_output),
        MfaCommands::GenerateKey => report(store.generate_secret_key().await, json_output),
        MfaCommands::Verify { code } => {
            report(store.verify_register_totp(&code).await, json_output)
        }
        MfaCommands::ClearKey { username } => report(
            store
                .clear_set_secret_key(&paths::account(&username))
                .await,
            json_output,
        ),
        MfaCommands::Bypass { username, off } => report(
            store
                .update_mfa_bypass(&paths::account(&username), !off)
                .await,
            json_output,
        ),
        MfaCommands::Status => {
            match store
                .check_current_user_mfa_bypassed(&paths::account(username))
                .await
            {
                Ok(bypassed) if json_output => {
                    print_json(&serde_json::json!({ "mfa_bypassed": bypassed }))
                }
                Ok(bypassed) => {
                    println!("{}", if bypassed { "bypassed" } else { "required" });
                    true
                }
                Err(e) => {
                    eprintln!("{}", e);
                    false
                }
            }
        }
    }
}
