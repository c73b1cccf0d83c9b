//! circuitsim demo
//!
//! Builds a small graph: an oscillator feeding a container that scales and
//! filters the signal, a windowed min/max on the container's output, and a
//! sink logging everything to a file.

use std::path::{Path, PathBuf};

use circuitsim::prelude::*;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "circuitsim")]
#[command(about = "Run the circuitsim demo graph and log its channels")]
struct Cli {
    /// Timestep in seconds (overrides the config file)
    #[arg(long)]
    dt: Option<f64>,

    /// Number of steps to run (overrides the config duration)
    #[arg(long)]
    steps: Option<u64>,

    /// JSON settings file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Sink destination
    #[arg(long, default_value = "circuitsim.log")]
    output: PathBuf,
}

fn build(machine: &mut Machine, output: &Path) -> Result<()> {
    let dt = machine.dt();

    // 1 Hz, unit amplitude
    let osc = machine.add_oscillator()?;
    machine.set_external_input(osc, 0, 1.0)?;
    machine.set_external_input(osc, 1, 1.0)?;

    let shaper = machine.add_container()?;
    machine.add_boundary_channel(shaper, Direction::Input)?;
    machine.add_boundary_channel(shaper, Direction::Output)?;
    machine.set_eager(shaper, true)?;
    {
        let mut inner = machine.inside(shaper)?;
        let gain = inner.add_gain(2.0)?;
        let lowpass = inner.add_lowpass(5.0, 0.707, 1.0)?;
        let m = inner.machine();
        m.set_eager(gain, true)?;
        m.connect_boundary_input(shaper, 0, gain, 0)?;
        m.connect(gain, 0, lowpass, 0)?;
        m.connect_boundary_output(lowpass, 0, shaper, 0)?;
    }
    machine.connect(osc, 0, shaper, 0)?;

    let window = ((1.0 / dt).round() as usize).max(1);
    let minmax = machine.add_minmax(window)?;
    machine.connect(shaper, 0, minmax, 0)?;

    let sink = machine.add_sink(output, 1)?;
    machine.track_channel(sink, ChannelId::TIME)?;
    machine.track_output(sink, osc, 0)?;
    machine.track_output(sink, shaper, 0)?;
    machine.track_output(sink, minmax, 2)?;

    Ok(())
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "circuitsim=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut settings = match &cli.config {
        Some(path) => match Settings::load(path) {
            Ok(settings) => settings,
            Err(e) => {
                error!("Failed to load settings: {}", e);
                std::process::exit(1);
            }
        },
        None => Settings {
            duration: Some(2.0),
            ..Settings::default()
        },
    };
    if let Some(dt) = cli.dt {
        settings.dt = dt;
    }

    let mut machine = match Machine::with_settings(settings.clone()) {
        Ok(machine) => machine,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = build(&mut machine, &cli.output) {
        error!("Failed to build the demo graph: {}", e);
        std::process::exit(1);
    }
    info!(
        circuits = machine.num_circuits(),
        channels = machine.num_channels(),
        "graph built"
    );

    let steps = cli.steps.unwrap_or_else(|| settings.steps());
    if let Err(e) = machine.run(steps) {
        error!("Run failed: {}", e);
        std::process::exit(1);
    }

    machine.shutdown();
    info!(
        "Simulated {:.3} s in {} steps, log written to {}",
        machine.time(),
        machine.steps(),
        cli.output.display()
    );
}
