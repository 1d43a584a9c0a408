mod cache;
mod config;
mod export;
mod form;
mod install_prompt;
mod logging;
mod models;
mod ui;

use std::io;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use tokio::sync::oneshot::{self, error::TryRecvError};
use tracing::{debug, info, warn};
use tui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};

use crate::cache::{AssetCache, CacheError, HttpFetcher, InstallReport, Manifest, ResponseSource};
use crate::config::Config;
use crate::export::MemoGenerator;
use crate::form::InvoiceForm;
use crate::install_prompt::{InstallPrompt, PromptChoice, PromptState};
use crate::ui::memo_form::{render_memo_form, handle_input, MemoAction, MemoFormState};

#[derive(Parser)]
#[command(name = "pest-memo", about = "Cash memo form for a pest-control service")]
struct Cli {
    #[command(subcommand)]
    command: Option<CliCommand>,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Open the memo form (default)
    Form,
    /// Fetch the offline assets into the cache and list them
    Precache,
    /// Install the cache, then answer each path cache-first
    Fetch {
        #[arg(required = true)]
        paths: Vec<String>,
    },
    /// Export a memo with the default row without opening the form
    Print,
}

type InstallResult = Result<InstallReport, CacheError>;

// Main application state
struct AppState {
    form_state: MemoFormState,
    install_prompt: InstallPrompt,
    generator: MemoGenerator,
    cache_install: Option<oneshot::Receiver<InstallResult>>,
}

impl AppState {
    fn new(generator: MemoGenerator, cache_install: oneshot::Receiver<InstallResult>) -> Self {
        Self {
            form_state: MemoFormState::new(InvoiceForm::new(Local::now().date_naive())),
            install_prompt: InstallPrompt::new(),
            generator,
            cache_install: Some(cache_install),
        }
    }
}

fn build_cache(config: &Config) -> Result<(AssetCache, HttpFetcher)> {
    let cache = AssetCache::new(config.cache_name.clone(), config.asset_origin(), Manifest::default())
        .context("Invalid asset origin")?;
    let fetcher = HttpFetcher::new(Duration::from_secs(config.request_timeout_secs))
        .context("Failed to build HTTP client")?;
    Ok((cache, fetcher))
}

/// Install the asset cache in the background, reporting the outcome once.
fn register_asset_cache(cache: AssetCache, fetcher: HttpFetcher) -> oneshot::Receiver<InstallResult> {
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        let result = cache.install(&fetcher).await;
        let _ = tx.send(result);
    });
    rx
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config::init()?;
    let command = cli.command.unwrap_or(CliCommand::Form);

    init_logging(&command, &config);
    debug!(?config, "configuration loaded");

    match command {
        CliCommand::Form => run_form(config).await,
        CliCommand::Precache => precache(&config).await,
        CliCommand::Fetch { paths } => fetch_paths(&config, &paths).await,
        CliCommand::Print => {
            let generator = MemoGenerator::new(&config.output_dir)?;
            let exported = generator.export_or_print(&InvoiceForm::new(Local::now().date_naive()))?;
            println!("{}", exported.markdown.display());
            println!("{}", exported.pdf.display());
            Ok(())
        }
    }
}

// The form owns the terminal, so it logs to a file
fn logs_to_file(command: &CliCommand) -> bool {
    matches!(command, CliCommand::Form)
}

fn init_logging(command: &CliCommand, config: &Config) {
    if !logs_to_file(command) {
        logging::init_stderr_logging();
        return;
    }

    let log_dir = config.log_dir.clone().unwrap_or_else(logging::default_log_dir);
    if let Err(e) = logging::init_file_logging(&log_dir) {
        eprintln!("Logging disabled: {:#}", e);
    }
}

async fn precache(config: &Config) -> Result<()> {
    let (cache, fetcher) = build_cache(config)?;
    let listed = cache.manifest().paths().len();
    let report = cache.install(&fetcher).await?;

    println!(
        "Cache {} holds {} assets ({} listed):",
        report.cache_name,
        report.urls.len(),
        listed
    );
    for key in cache.storage().keys(cache.name()).await {
        println!("  {}", key);
    }
    Ok(())
}

async fn fetch_paths(config: &Config, paths: &[String]) -> Result<()> {
    let (cache, fetcher) = build_cache(config)?;

    // A failed install only means everything goes to the network
    if let Err(e) = cache.install(&fetcher).await {
        warn!("continuing without offline cache: {}", e);
    }
    let state = cache.state().await;
    info!(cache = cache.name(), ?state, "asset cache ready");

    for path in paths {
        let request = cache.request_for(path)?;
        let (response, source) = cache.respond(&request, &fetcher).await?;
        let source = match source {
            ResponseSource::Cache => "cache",
            ResponseSource::Network => "network",
        };
        println!(
            "{:<8} {} {:>8} {:<24} {}",
            source,
            response.status,
            response.body.len(),
            response.content_type.as_deref().unwrap_or("-"),
            response.url
        );
    }
    Ok(())
}

async fn run_form(config: Config) -> Result<()> {
    let generator = MemoGenerator::new(&config.output_dir)?;
    let (cache, fetcher) = build_cache(&config)?;
    let cache_install = register_asset_cache(cache, fetcher);

    // Setup terminal
    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app_state = AppState::new(generator, cache_install);

    let result = run_app(&mut terminal, &mut app_state).await;

    // Restore terminal
    terminal::disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = &result {
        println!("Error: {:#}", err);
    }
    result
}

async fn run_app<B: Backend>(terminal: &mut Terminal<B>, app_state: &mut AppState) -> Result<()> {
    loop {
        poll_cache_install(app_state);

        terminal.draw(|f| {
            render_memo_form(f, &mut app_state.form_state, &app_state.install_prompt);
        })?;

        let action = handle_input(&mut app_state.form_state).await?;
        if let Some(action) = action {
            if handle_action(app_state, action) {
                break;
            }
        }
    }

    Ok(())
}

fn poll_cache_install(app_state: &mut AppState) {
    let Some(rx) = app_state.cache_install.as_mut() else {
        return;
    };

    match rx.try_recv() {
        Err(TryRecvError::Empty) => return,
        Ok(Ok(report)) => {
            info!(assets = report.urls.len(), "offline assets ready");
            app_state.install_prompt.offer();
        }
        Ok(Err(e)) => {
            warn!("offline cache unavailable, using the network: {}", e);
        }
        Err(TryRecvError::Closed) => {
            warn!("offline cache install task ended without a result");
        }
    }
    app_state.cache_install = None;
}

// Returns true when the app should quit
fn handle_action(app_state: &mut AppState, action: MemoAction) -> bool {
    match action {
        MemoAction::Quit => return true,
        MemoAction::Export => {
            match app_state.generator.export_or_print(app_state.form_state.form()) {
                Ok(exported) => app_state
                    .form_state
                    .set_status(format!("Memo saved to {}", exported.pdf.display())),
                Err(e) => {
                    warn!("memo export failed: {:#}", e);
                    app_state.form_state.show_notice(format!("Export failed: {}", e));
                }
            }
        }
        MemoAction::OpenInstallPrompt => {
            if app_state.install_prompt.state() == PromptState::Pending {
                app_state.form_state.ask_install();
            }
        }
        MemoAction::AnswerInstall(choice) => {
            if app_state.install_prompt.answer(choice) == Some(PromptChoice::Accepted) {
                app_state.form_state.set_status("Pest Control Memo is available offline");
            }
        }
        MemoAction::DismissBanner => app_state.install_prompt.dismiss(),
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_form_logs_to_a_file() {
        assert!(logs_to_file(&CliCommand::Form));
        assert!(!logs_to_file(&CliCommand::Precache));
        assert!(!logs_to_file(&CliCommand::Print));
        assert!(!logs_to_file(&CliCommand::Fetch {
            paths: vec!["/index.html".to_string()],
        }));
    }

    #[test]
    fn missing_subcommand_opens_the_form() {
        let cli = Cli::try_parse_from(["pest-memo"]).unwrap();
        assert!(cli.command.is_none());

        let cli = Cli::try_parse_from(["pest-memo", "fetch", "/main.js"]).unwrap();
        assert!(matches!(cli.command, Some(CliCommand::Fetch { ref paths }) if paths == &["/main.js"]));
    }
}
