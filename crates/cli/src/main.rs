use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use orca_api::OrchestratorClient;
use orca_engine::{InstanceView, Navigator, ViewServices, ViewSettings, is_in_flight, to_detail_view};
use orca_util::config::default_config_path;
use orca_util::{OrcaConfig, redact_secret};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod render;

/// Inspect and act on orchestrator workflow instances.
#[derive(Parser, Debug)]
#[command(name = "orca", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Work with a single workflow instance
    #[command(subcommand)]
    Instance(InstanceCommand),
    /// Print the effective configuration (token redacted)
    Config,
}

#[derive(Subcommand, Debug)]
enum InstanceCommand {
    /// Show the details of an instance
    Show {
        instance_id: String,
        /// Print the raw record and details as JSON
        #[arg(long)]
        json: bool,
    },
    /// Follow an instance until it completes, aborts or fails
    Watch {
        instance_id: String,
        /// Delay between refreshes; defaults to the configured interval
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        interval_ms: Option<u64>,
    },
    /// Abort a running or failed instance
    Abort {
        instance_id: String,
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
    /// Print the page that re-runs the instance's workflow with the same inputs
    Rerun { instance_id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = OrcaConfig::load().context("failed to load configuration")?;

    match cli.command {
        Command::Config => print_config(&config),
        Command::Instance(command) => run_instance(command, &config).await,
    }
}

/// Logs go to stderr so stdout stays usable in pipelines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

/// Prints navigation targets as absolute URLs for the user to open.
struct PrintNavigator {
    base_url: String,
}

impl Navigator for PrintNavigator {
    fn navigate(&self, url: &str) {
        println!("{}{url}", self.base_url.trim_end_matches('/'));
    }
}

fn build_view(instance_id: String, config: &OrcaConfig, poll_interval: Duration) -> Result<InstanceView> {
    let client = Arc::new(OrchestratorClient::from_config(config)?);
    let services = ViewServices {
        instances: client.clone(),
        permissions: client,
        navigator: Arc::new(PrintNavigator {
            base_url: config.base_url.clone(),
        }),
    };
    let settings = ViewSettings {
        poll_interval,
        execute_route: config.execute_route.clone(),
    };
    Ok(InstanceView::new(Some(instance_id), services, settings))
}

/// Runs one fetch cycle and stops polling. Fails when nothing was loaded.
async fn load_once(view: &InstanceView) -> Result<()> {
    view.start();
    wait_until_loaded(view).await?;
    view.stop();

    let state = view.state();
    match (state.value, state.error) {
        (Some(_), _) => Ok(()),
        (None, Some(error)) => Err(anyhow!(error.message)),
        (None, None) => bail!("no instance returned"),
    }
}

async fn wait_until_loaded(view: &InstanceView) -> Result<()> {
    view.subscribe()
        .wait_for(|state| !state.loading)
        .await
        .context("poller shut down before loading finished")?;
    Ok(())
}

async fn run_instance(command: InstanceCommand, config: &OrcaConfig) -> Result<()> {
    match command {
        InstanceCommand::Show { instance_id, json } => show(instance_id, json, config).await,
        InstanceCommand::Watch {
            instance_id,
            interval_ms,
        } => {
            let interval = interval_ms.map(Duration::from_millis).unwrap_or_else(|| config.poll_interval());
            watch(instance_id, interval, config).await
        }
        InstanceCommand::Abort { instance_id, yes } => abort(instance_id, yes, config).await,
        InstanceCommand::Rerun { instance_id } => rerun(instance_id, config).await,
    }
}

async fn show(instance_id: String, json: bool, config: &OrcaConfig) -> Result<()> {
    let view = build_view(instance_id, config, config.poll_interval())?;
    load_once(&view).await?;
    let assessed = view.state().value.context("no instance returned")?;
    let details = to_detail_view(&assessed.instance);
    let variables = view.variables();

    if json {
        let out = serde_json::json!({
            "details": details,
            "variables": variables,
            "record": assessed,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    print!(
        "{}",
        render::details_block(
            &details,
            assessed.instance.error.as_ref(),
            assessed.assessed_by.as_ref().map(|assessment| assessment.id.as_str()),
            variables.as_ref(),
        )
    );
    Ok(())
}

async fn watch(instance_id: String, interval: Duration, config: &OrcaConfig) -> Result<()> {
    let view = build_view(instance_id, config, interval)?;
    if let Some(title) = view.title() {
        println!("Watching {title} every {}ms (Ctrl-C to stop)", interval.as_millis());
    }
    let mut updates = view.subscribe();
    view.start();

    loop {
        tokio::select! {
            changed = updates.changed() => {
                changed.context("poller shut down")?;
                let state = updates.borrow_and_update().clone();
                let details = state.value.as_ref().map(|assessed| to_detail_view(&assessed.instance));
                println!("{}", render::watch_line(&state, details.as_ref()));
                if state.loading {
                    continue;
                }
                match (&state.value, &state.error) {
                    (None, Some(error)) => bail!("{}", error.message),
                    (None, None) => bail!("no instance returned"),
                    (Some(assessed), _) if !is_in_flight(assessed.instance.state) => {
                        info!(instance_id = %assessed.instance.id, "instance settled");
                        break;
                    }
                    _ => {}
                }
            }
            _ = tokio::signal::ctrl_c() => {
                debug!("interrupted");
                break;
            }
        }
    }

    view.stop();
    Ok(())
}

async fn abort(instance_id: String, yes: bool, config: &OrcaConfig) -> Result<()> {
    let mut view = build_view(instance_id.clone(), config, config.poll_interval())?;
    load_once(&view).await?;
    view.refresh_permission().await;

    let affordances = view.affordances();
    let status = view.details().and_then(|details| details.state);
    if !affordances.abort_visible {
        bail!(
            "instance {instance_id} is {}; only active or failed instances can be aborted",
            status.map(|status| status.to_string()).unwrap_or_else(|| "in an unknown state".into())
        );
    }
    if !affordances.abort_enabled {
        bail!("not permitted to abort instance {instance_id}");
    }

    view.toggle_abort_confirmation();
    let title = view.title().unwrap_or_else(|| instance_id.clone());
    if !yes && !confirm(format!("Abort workflow instance {instance_id} of {title}?")).await? {
        view.toggle_abort_confirmation();
        println!("Abort cancelled");
        return Ok(());
    }

    view.confirm_abort().await;
    if let Some(alert) = view.alert() {
        bail!("{}: {}", alert.title, alert.text());
    }

    wait_until_loaded(&view).await?;
    view.stop();
    let status = view.details().and_then(|details| details.state);
    println!(
        "Instance {instance_id} is now {}",
        status.map(|status| status.to_string()).unwrap_or_else(|| "unknown".into())
    );
    Ok(())
}

async fn rerun(instance_id: String, config: &OrcaConfig) -> Result<()> {
    let mut view = build_view(instance_id.clone(), config, config.poll_interval())?;
    load_once(&view).await?;
    view.refresh_permission().await;

    if !view.affordances().rerun_enabled {
        if view.permission().allowed {
            bail!("instance {instance_id} has not finished; only completed, aborted or failed instances can be re-run");
        }
        bail!("not permitted to re-run instance {instance_id}");
    }
    view.rerun().context("no instance loaded")?;
    Ok(())
}

async fn confirm(prompt: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || -> Result<bool> {
        print!("{prompt} [y/N] ");
        io::stdout().flush()?;
        let mut answer = String::new();
        io::stdin().read_line(&mut answer)?;
        Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
    })
    .await?
}

fn print_config(config: &OrcaConfig) -> Result<()> {
    let out = serde_json::json!({
        "config_path": default_config_path().display().to_string(),
        "base_url": config.base_url,
        "token": redact_secret(config.token.as_deref()),
        "poll_interval_ms": config.poll_interval_ms,
        "execute_route": config.execute_route,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
