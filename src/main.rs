use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

use mosaic::api::{display_date, Gateway, HttpGateway, RecordId};
use mosaic::app::App;
use mosaic::config::Config;
use mosaic::flows::activation::group_thousands;
use mosaic::flows::audience::{QUERY, SEGMENT_NAME};
use mosaic::flows::login::{sign_out, EMAIL, PASSWORD};
use mosaic::flows::signup::CONFIRM_PASSWORD;
use mosaic::flows::{
    AskForm, AudienceFlow, HistoryView, LoginForm, SignupForm, SnapshotForm, SourceDirectory,
};
use mosaic::logging;
use mosaic::store::SessionStore;

#[derive(Parser)]
#[command(name = "mosaic")]
#[command(about = "Terminal client for the iNitro customer data platform")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file path
    #[arg(short, long)]
    config: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Save a login on this machine
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,

        /// Keep the login across sessions
        #[arg(short, long)]
        remember: bool,
    },

    /// Create an account on this machine and sign in
    Signup {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,

        /// Repeat the password
        #[arg(long)]
        confirm: String,
    },

    /// Forget the saved login
    Logout,

    /// Manage connected data sources
    Sources {
        #[command(subcommand)]
        action: SourcesAction,
    },

    /// Build and list audience segments
    Segments {
        #[command(subcommand)]
        action: SegmentsAction,
    },

    /// Ask a question about your data in plain English
    Ask {
        question: String,

        /// Print only the result rows as JSON
        #[arg(long)]
        json: bool,
    },

    /// Split a question into segments and run each one
    Run {
        query: String,

        /// Print the raw response as JSON
        #[arg(long)]
        json: bool,
    },

    /// Activations finalized from this machine
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },

    /// Inspect or write the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum SourcesAction {
    /// List connected sources
    List,
    /// Delete a source by id
    Delete { id: String },
}

#[derive(Subcommand)]
enum SegmentsAction {
    /// List saved segments
    List,
    /// Generate SQL and a count without saving
    Preview {
        /// Natural-language criteria
        query: String,

        /// Segment name; generated when omitted
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Preview, then save the segment
    Save {
        query: String,

        #[arg(short, long)]
        name: Option<String>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
    /// Write the effective configuration to the user config file
    Init {
        /// Write here instead of ~/.config/mosaic/config.toml
        #[arg(short, long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Subcommand)]
enum HistoryAction {
    List,
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first (needed for logging setup)
    let config = Config::load(cli.config.as_deref())?;

    // No subcommand launches the TUI, which owns the terminal
    let is_tui_mode = cli.command.is_none();
    let logging_handle = logging::init_logging(&config, is_tui_mode, cli.debug)?;

    let mut store = SessionStore::open(&config.state_path());

    match cli.command {
        Some(Commands::Login {
            email,
            password,
            remember,
        }) => cmd_login(&mut store, &email, &password, remember)?,
        Some(Commands::Signup {
            email,
            password,
            confirm,
        }) => cmd_signup(&mut store, &email, &password, &confirm)?,
        Some(Commands::Logout) => {
            sign_out(&mut store)?;
            println!("Signed out");
        }
        Some(Commands::Sources { action }) => {
            let gateway = gateway(&config, &store)?;
            match action {
                SourcesAction::List => cmd_sources_list(gateway.as_ref(), &mut store).await?,
                SourcesAction::Delete { id } => {
                    cmd_sources_delete(gateway.as_ref(), &mut store, &id).await?;
                }
            }
        }
        Some(Commands::Segments { action }) => {
            let gateway = gateway(&config, &store)?;
            match action {
                SegmentsAction::List => cmd_segments_list(gateway.as_ref()).await?,
                SegmentsAction::Preview { query, name } => {
                    cmd_segments_build(gateway.as_ref(), &query, name, false).await?;
                }
                SegmentsAction::Save { query, name } => {
                    cmd_segments_build(gateway.as_ref(), &query, name, true).await?;
                }
            }
        }
        Some(Commands::Ask { question, json }) => {
            let gateway = gateway(&config, &store)?;
            cmd_ask(gateway.as_ref(), question, json).await?;
        }
        Some(Commands::Run { query, json }) => {
            let gateway = gateway(&config, &store)?;
            cmd_run(gateway.as_ref(), query, json).await?;
        }
        Some(Commands::History { action }) => match action {
            HistoryAction::List => cmd_history_list(&store),
            HistoryAction::Clear => {
                HistoryView::load(&store).clear(&mut store)?;
                println!("Activation history cleared");
            }
        },
        Some(Commands::Config { action }) => cmd_config(&config, action)?,
        None => run_tui(config, logging_handle.log_file_path).await?,
    }

    Ok(())
}

async fn run_tui(config: Config, log_file_path: Option<PathBuf>) -> Result<()> {
    let mut app = App::new(config).await?;
    let result = app.run().await;

    // Print log file path on exit if logs were written
    if let Some(log_path) = log_file_path {
        if let Ok(metadata) = log_path.metadata() {
            if metadata.len() > 0 {
                eprintln!("Session log: {}", log_path.display());
            }
        }
    }

    result
}

/// Backend client for data commands; warns when no login is saved
fn gateway(config: &Config, store: &SessionStore) -> Result<Arc<dyn Gateway>> {
    if !store.is_authenticated() {
        warn!("not signed in; run `mosaic login` first");
    }
    let gateway = HttpGateway::from_config(&config.api).context("Failed to build HTTP client")?;
    Ok(Arc::new(gateway))
}

fn cmd_login(store: &mut SessionStore, email: &str, password: &str, remember: bool) -> Result<()> {
    let mut form = LoginForm::new();
    form.wizard_mut().set_field(EMAIL.name, email);
    form.wizard_mut().set_field(PASSWORD.name, password);
    if remember {
        form.toggle_remember_me();
    }

    if !form.submit(store) {
        let mut reasons: Vec<String> = form
            .wizard()
            .field_errors()
            .map(ToString::to_string)
            .collect();
        reasons.extend(form.wizard().error().map(str::to_string));
        bail!("Login failed: {}", reasons.join("; "));
    }
    println!("Signed in as {}", email.trim());
    Ok(())
}

fn cmd_signup(store: &mut SessionStore, email: &str, password: &str, confirm: &str) -> Result<()> {
    let mut form = SignupForm::new();
    form.wizard_mut().set_field(EMAIL.name, email);
    form.wizard_mut().set_field(PASSWORD.name, password);
    form.wizard_mut().set_field(CONFIRM_PASSWORD.name, confirm);

    if !form.submit(store) {
        let mut reasons: Vec<String> = form
            .wizard()
            .field_errors()
            .map(ToString::to_string)
            .collect();
        reasons.extend(form.wizard().error().map(str::to_string));
        bail!("Signup failed: {}", reasons.join("; "));
    }
    println!("Account created for {}", email.trim());
    println!("Next: run `mosaic` and connect a data source");
    Ok(())
}

async fn cmd_sources_list(gateway: &dyn Gateway, store: &mut SessionStore) -> Result<()> {
    let mut directory = SourceDirectory::from_store(store);
    directory
        .refresh(gateway, store)
        .await
        .context("Failed to fetch sources")?;

    if directory.is_empty() {
        println!("No sources connected");
        return Ok(());
    }

    println!("Sources ({})", directory.len());
    println!("{}", "─".repeat(72));
    for source in directory.sources() {
        println!(
            "{:>6}  {:<30} {:<16} {}",
            source.id.to_string(),
            source.name,
            source.source_type,
            display_date(&source.created_at)
        );
    }
    Ok(())
}

async fn cmd_sources_delete(gateway: &dyn Gateway, store: &mut SessionStore, id: &str) -> Result<()> {
    let mut directory = SourceDirectory::from_store(store);
    let id = RecordId::from(id);
    directory
        .delete(gateway, store, &id)
        .await
        .with_context(|| format!("Failed to delete source {id}"))?;
    println!("Deleted source {id}");
    Ok(())
}

async fn cmd_segments_list(gateway: &dyn Gateway) -> Result<()> {
    let mut flow = AudienceFlow::new();
    flow.refresh(gateway)
        .await
        .context("Failed to fetch segments")?;

    if flow.entries().is_empty() {
        println!("No segments saved");
        return Ok(());
    }

    println!("Segments ({})", flow.entries().len());
    println!("{}", "─".repeat(72));
    for entry in flow.entries() {
        let segment = entry.record();
        println!(
            "{:>6}  {:<30} {:>10}  {}",
            segment.id.to_string(),
            segment.name,
            group_thousands(segment.count),
            segment.description
        );
    }
    Ok(())
}

async fn cmd_segments_build(
    gateway: &dyn Gateway,
    query: &str,
    name: Option<String>,
    save: bool,
) -> Result<()> {
    let mut flow = AudienceFlow::new();
    flow.open_builder();
    let Some(builder) = flow.builder_mut() else {
        bail!("Segment builder unavailable");
    };
    builder.wizard_mut().set_field(QUERY.name, query);
    if let Some(name) = name {
        builder.wizard_mut().set_field(SEGMENT_NAME.name, name);
    }

    if !builder.run_preview(gateway).await {
        let reason = builder
            .wizard()
            .error()
            .map(str::to_string)
            .or_else(|| builder.wizard().field_errors().next().map(ToString::to_string))
            .unwrap_or_else(|| "preview failed".to_string());
        bail!("{reason}");
    }

    if let Some(preview) = builder.preview() {
        println!("{} ({} people)", preview.name, group_thousands(preview.count));
        if !preview.description.is_empty() {
            println!("{}", preview.description);
        }
        println!();
        println!("{}", preview.generated_sql);
    }

    if !save {
        return Ok(());
    }
    if !flow.save_segment(gateway).await {
        let reason = flow
            .builder()
            .and_then(|b| b.wizard().error())
            .unwrap_or("save failed")
            .to_string();
        bail!("{reason}");
    }
    if let Some(saved) = flow.selected_segments().first() {
        println!();
        println!("Saved segment {} as id {}", saved.name, saved.id);
    }
    Ok(())
}

async fn cmd_ask(gateway: &dyn Gateway, question: String, json: bool) -> Result<()> {
    let mut form = AskForm::new();
    form.question = question;
    if !form.submit(gateway).await {
        bail!("{}", form.error().unwrap_or("Failed to fetch data"));
    }

    if !json {
        if let Some(answer) = form.answer() {
            println!("{}", answer.query);
            println!();
        }
    }
    println!("{}", form.results_text().unwrap_or_default());
    Ok(())
}

async fn cmd_run(gateway: &dyn Gateway, query: String, json: bool) -> Result<()> {
    let mut form = SnapshotForm::new();
    form.query = query;
    if !form.submit(gateway).await {
        bail!("{}", form.error().unwrap_or("Please enter a query"));
    }
    let Some(response) = form.response() else {
        return Ok(());
    };

    if json {
        let text =
            serde_json::to_string_pretty(response).context("Failed to serialize response")?;
        println!("{text}");
        return Ok(());
    }

    for (index, segment) in response.segments.iter().enumerate() {
        println!("Segment {}", index + 1);
        println!("{}", segment.query);
        match &segment.error {
            Some(error) => println!("error: {error}"),
            None => println!(
                "{}",
                serde_json::to_string_pretty(&segment.results).unwrap_or_default()
            ),
        }
        println!();
    }
    Ok(())
}

fn cmd_config(config: &Config, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let text =
                toml::to_string_pretty(config).context("Failed to serialize config to TOML")?;
            print!("{text}");
        }
        ConfigAction::Init { path, force } => {
            let path = match path {
                Some(path) => path,
                None => Config::user_config_path()
                    .context("No user config directory on this platform")?,
            };
            if path.exists() && !force {
                bail!("{} already exists (use --force to overwrite)", path.display());
            }
            config.save_to(&path)?;
            println!("Wrote {}", path.display());
        }
    }
    Ok(())
}

fn cmd_history_list(store: &SessionStore) {
    let view = HistoryView::load(store);
    if view.is_empty() {
        println!("No activations yet");
        return;
    }

    println!("Activations ({})", view.records().len());
    println!("{}", "─".repeat(72));
    for record in view.records() {
        println!(
            "{}  {:<36} {:<14} {:>10}  {}",
            display_date(&record.created_at),
            record.audience,
            record.channel,
            group_thousands(record.count),
            record.scheduled_for
        );
    }
}
