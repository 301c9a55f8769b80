mod analytics;
mod escape_hatch;
mod grabber;
mod state_machine;
mod view;

use analytics::{AnalyticsHook, LogHook};
use anyhow::{Context, Result};
use clap::Parser;
use escape_hatch::EscapeHatch;
use nazoru_core::client::{HttpPredictor, Predictor};
use nazoru_core::config::Config;
use nazoru_core::keymap::KeyDecoder;
use nazoru_core::protocol::{PredictError, Prediction};
use state_machine::{Action, StateMachine};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::time::{self, Interval, MissedTickBehavior};
use tracing::{error, info, warn};
use view::{TerminalView, View};

#[derive(Parser)]
#[command(name = "nazorud", about = "Keystroke-timing capture daemon for the nazoru kiosk")]
struct Cli {
    /// Config file (default: $XDG_CONFIG_HOME/nazoru/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Override the prediction endpoint
    #[arg(long)]
    endpoint: Option<String>,
    /// Grab keyboards exclusively
    #[arg(long)]
    grab: bool,
}

/// Prediction outcome tagged with the session that asked for it.
type Outcome = (u64, Result<Prediction, PredictError>);

/// Everything the state machine's actions are applied to.
struct Runtime<V: View> {
    view: V,
    poll_timer: Option<Interval>,
    poll_period: Duration,
    predictor: Arc<dyn Predictor>,
    outcome_tx: mpsc::UnboundedSender<Outcome>,
    analytics: Option<Box<dyn AnalyticsHook>>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("nazorud=info".parse()?),
        )
        .init();

    info!("nazorud starting");

    let config = load_config(&cli)?;
    info!(
        endpoint = %config.predict.endpoint,
        wait_ms = config.session.wait_ms,
        refresh_ms = config.refresh.timeout_ms,
        "config loaded"
    );

    let keyboards = grabber::find_keyboards().context("finding keyboards")?;
    if keyboards.is_empty() {
        anyhow::bail!("no keyboards found, check permissions (group 'input' or udev rules)");
    }

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let grab = config.input.grab;
    for (idx, path) in keyboards.iter().enumerate() {
        let tx = event_tx.clone();
        let path = path.clone();
        tokio::spawn(async move {
            if let Err(e) = grabber::read_device(path.clone(), idx, grab, tx).await {
                error!(path = %path.display(), error = %e, "reader task failed");
            }
        });
    }
    drop(event_tx); // Channel closes when all readers exit

    let (outcome_tx, mut outcome_rx) = mpsc::unbounded_channel::<Outcome>();
    let analytics: Option<Box<dyn AnalyticsHook>> = if config.analytics.enabled {
        Some(Box::new(LogHook))
    } else {
        None
    };
    let mut runtime = Runtime {
        view: TerminalView::new(std::io::stdout()),
        poll_timer: None,
        poll_period: config.session.poll_interval(),
        predictor: Arc::new(HttpPredictor::new(
            config.predict.endpoint.clone(),
            config.predict.timeout(),
        )),
        outcome_tx,
        analytics,
    };
    if let Err(e) = runtime.view.reset() {
        warn!(error = %e, "view error");
    }

    let mut machine = StateMachine::new(&config);
    let mut decoders: Vec<KeyDecoder> = keyboards.iter().map(|_| KeyDecoder::new()).collect();
    let mut hatch = EscapeHatch::new();

    let mut refresh = time::interval(config.refresh.poll_interval());
    refresh.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        let actions = tokio::select! {
            dev_event = event_rx.recv() => {
                let Some(dev_event) = dev_event else {
                    warn!("all keyboards are gone");
                    break;
                };
                if grab && dev_event.is_press() && hatch.observe(dev_event.code, Instant::now()) {
                    info!("panic key combo detected (Backspace, Escape, Enter), exiting");
                    break;
                }
                let key = decoders
                    .get_mut(dev_event.device_idx)
                    .and_then(|d| d.decode(dev_event.code, dev_event.value));
                match key {
                    Some(key) => machine.process_key(&key, Instant::now()),
                    None => Vec::new(),
                }
            }
            _ = next_poll(&mut runtime.poll_timer) => machine.check_poll(Instant::now()),
            _ = refresh.tick() => machine.check_refresh(Instant::now()),
            Some((session, outcome)) = outcome_rx.recv() => machine.prediction_done(session, outcome),
            _ = &mut ctrl_c => {
                info!("interrupted");
                break;
            }
        };
        process_actions(&mut runtime, actions);
    }

    println!();
    info!("nazorud shutting down");
    Ok(())
}

/// Load the config file, apply command-line overrides, then validate once.
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load().context("loading config")?,
    };
    if let Some(endpoint) = &cli.endpoint {
        config.predict.endpoint.clone_from(endpoint);
    }
    config.input.grab |= cli.grab;
    config.validate().context("validating config")?;
    Ok(config)
}

/// Resolves on the next poll tick, or never when polling is off.
async fn next_poll(timer: &mut Option<Interval>) {
    match timer {
        Some(timer) => {
            timer.tick().await;
        }
        None => std::future::pending().await,
    }
}

fn process_actions<V: View>(runtime: &mut Runtime<V>, actions: Vec<Action>) {
    for action in actions {
        match action {
            Action::StartPolling => {
                let period = runtime.poll_period;
                let mut timer = time::interval_at(time::Instant::now() + period, period);
                timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
                runtime.poll_timer = Some(timer);
            }
            Action::StopPolling => {
                runtime.poll_timer = None;
            }
            Action::Predict { session, events } => {
                let predictor = Arc::clone(&runtime.predictor);
                let tx = runtime.outcome_tx.clone();
                tokio::task::spawn_blocking(move || {
                    let outcome = predictor.predict(&events);
                    let _ = tx.send((session, outcome));
                });
            }
            Action::Analytics(event) => {
                analytics::emit(runtime.analytics.as_deref(), &event);
            }
            other => {
                if matches!(other, Action::Reload) {
                    runtime.poll_timer = None;
                }
                if let Err(e) = view::apply(&mut runtime.view, &other) {
                    warn!(error = %e, "view error");
                }
            }
        }
    }
}
