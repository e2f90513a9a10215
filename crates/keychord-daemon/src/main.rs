//! keychord daemon
//!
//! Listens on a keyboard and runs the configured chord bindings.

mod actions;
mod device;
mod timer;
mod translate;

use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context, Result};
use clap::Parser;
use evdev::InputEventKind;
use keychord::{Controller, LocalInput, Settings};
use keychord_config::Config;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{reload, EnvFilter, Registry};

use crate::actions::Output;
use crate::timer::TokioTimer;
use crate::translate::{KeyTranslator, Transition};

#[derive(Parser, Debug)]
#[command(name = "keychordd")]
#[command(about = "Chord shortcut daemon for evdev keyboards")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "~/.config/keychord/config.kdl")]
    config: String,

    /// Keyboard to listen on: device path, name or vendor:product
    /// (overrides the config setting)
    #[arg(short, long)]
    device: Option<String>,

    /// Print each match to stdout as a JSON line
    #[arg(long)]
    json: bool,

    /// List input devices and exit
    #[arg(long)]
    list_devices: bool,

    /// Validate the configuration file and exit
    #[arg(long)]
    check: bool,
}

type FilterHandle = reload::Handle<EnvFilter, Registry>;

/// Install the subscriber. `RUST_LOG` wins; otherwise the level starts at
/// info and is replaced by the configured one once the config is loaded.
fn init_tracing() -> Option<FilterHandle> {
    let from_env = EnvFilter::try_from_default_env().ok();
    let overridable = from_env.is_none();
    let (filter, handle) =
        reload::Layer::new(from_env.unwrap_or_else(|| EnvFilter::new("info")));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    overridable.then_some(handle)
}

fn apply_log_level(handle: Option<&FilterHandle>, config: &Config) -> Result<()> {
    if let Some(handle) = handle {
        handle
            .reload(EnvFilter::new(config.global.log_level.as_filter()))
            .context("Failed to apply configured log level")?;
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let filter = init_tracing();
    let args = Args::parse();

    if args.list_devices {
        device::print_devices(&device::enumerate_devices()?);
        return Ok(());
    }

    // Expand tilde in config path
    let config_path: PathBuf = shellexpand::tilde(&args.config).into_owned().into();

    tracing::info!("Loading configuration from {}", config_path.display());

    let config = keychord_config::parse_config(&config_path)
        .with_context(|| format!("Invalid configuration in {}", config_path.display()))?;
    apply_log_level(filter.as_ref(), &config)?;

    tracing::info!(
        "Loaded configuration with {} binding(s)",
        config.bindings.len()
    );

    if args.check {
        println!("Configuration is valid!");
        println!("  Idle timeout: {} ms", config.global.idle_timeout_ms);
        println!("  Bindings: {}", config.bindings.len());
        for binding in &config.bindings {
            println!(
                "    - {} [{}]{}",
                binding.label(),
                binding.keys.join(", "),
                if binding.clear_stack { " (clears stack)" } else { "" }
            );
        }
        return Ok(());
    }

    // The controller and its timer are single-threaded, so everything runs
    // on one LocalSet.
    tokio::task::LocalSet::new()
        .run_until(run(config, args))
        .await
}

async fn run(config: Config, args: Args) -> Result<()> {
    let selector = args.device.as_deref().or(config.global.device.as_deref());
    let (info, device) = device::open_keyboard(selector)?;

    tracing::info!(
        "Listening on {} ({}, {})",
        info.name,
        info.path.display(),
        info.vendor_product()
    );

    let input = Rc::new(LocalInput::new());
    let settings = Settings::default()
        .with_idle_timeout(config.global.idle_timeout())
        .with_debug(config.global.debug);
    let controller = Controller::new(settings, input.clone(), Rc::new(TokioTimer::new()));

    let output = Output { json: args.json };
    let count = actions::register_bindings(&controller, &config.bindings, output);
    tracing::info!("Registered {} binding(s)", count);

    if config.global.debug {
        controller.subscribe_combinations(|combination| {
            tracing::debug!("Held keys: [{}]", combination);
        });
    }

    controller.enable();

    let mut events = device
        .into_event_stream()
        .with_context(|| format!("Failed to read events from {}", info.path.display()))?;
    let mut translator = KeyTranslator::new();

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            event = events.next_event() => {
                let event = event.context("Failed to read input event")?;
                let InputEventKind::Key(key) = event.kind() else {
                    continue;
                };

                match translator.translate(key, event.value()) {
                    Some(Transition::Press(event)) => input.press(&event),
                    Some(Transition::Release(event)) => input.release(&event),
                    None => {}
                }
            }
            result = &mut shutdown => {
                result.context("Failed to listen for ctrl-c")?;
                tracing::info!("Shutting down...");
                break;
            }
        }
    }

    controller.dispose();
    Ok(())
}
