//! junction — smallest end-to-end run of the rail_mutex zone arbiter.
//!
//! Six trains share a mainline/branch crossing, a two-track yard, and a
//! level crossing freight ignores.  Logs go to stderr (`RUST_LOG`, default
//! `info`); hard enters, failed enters, conflicts and tick summaries go to
//! `output/junction/*.csv`.
//!
//! ```bash
//! RUST_LOG=mz_arbiter=debug cargo run -p junction -- [config.json]
//! ```
//!
//! The optional argument is a JSON `SimConfig`; missing fields keep their
//! defaults.

mod track;

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use mz_arbiter::ConflictEvent;
use mz_core::{AgentId, Tick, ZoneId};
use mz_output::{CsvWriter, OutputWriter, SimOutputObserver};
use mz_sim::{EnterEvent, SimBuilder, SimConfig, SimObserver, TickSummary, TracingObserver};

// ── Constants ─────────────────────────────────────────────────────────────────

const OUTPUT_DIR:   &str = "output/junction";
const TOTAL_TICKS:  u64  = 120;
const LOG_INTERVAL: u64  = 10;

// ── Observer fan-out ──────────────────────────────────────────────────────────

/// Forwards every hook to the CSV writer and to the log.
struct DemoObserver<W: OutputWriter> {
    output: SimOutputObserver<W>,
    log:    TracingObserver,
}

impl<W: OutputWriter> SimObserver for DemoObserver<W> {
    fn on_tick_start(&mut self, tick: Tick) {
        self.output.on_tick_start(tick);
        self.log.on_tick_start(tick);
    }

    fn on_enter(&mut self, tick: Tick, event: &EnterEvent) {
        self.output.on_enter(tick, event);
        self.log.on_enter(tick, event);
    }

    fn on_conflict(&mut self, tick: Tick, event: &ConflictEvent) {
        self.output.on_conflict(tick, event);
        self.log.on_conflict(tick, event);
    }

    fn on_indicator(&mut self, tick: Tick, zones: &[ZoneId], on: bool) {
        self.output.on_indicator(tick, zones, on);
        self.log.on_indicator(tick, zones, on);
    }

    fn on_train_finished(&mut self, tick: Tick, train: AgentId) {
        self.output.on_train_finished(tick, train);
        self.log.on_train_finished(tick, train);
    }

    fn on_tick_end(&mut self, tick: Tick, summary: &TickSummary) {
        self.output.on_tick_end(tick, summary);
        self.log.on_tick_end(tick, summary);
    }

    fn on_sim_end(&mut self, final_tick: Tick) {
        self.output.on_sim_end(final_tick);
        self.log.on_sim_end(final_tick);
    }
}

// ── Setup ─────────────────────────────────────────────────────────────────────

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn load_config(path: &Path) -> Result<SimConfig> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing {}", path.display()))
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    init_logging();

    // 1. Config: from the command line, or the built-in defaults.
    let config = match std::env::args().nth(1) {
        Some(path) => load_config(Path::new(&path))?,
        None => SimConfig { total_ticks: TOTAL_TICKS, ..SimConfig::default() },
    };
    info!(
        ticks = config.total_ticks,
        seed = config.seed,
        shuffle = config.shuffle_agents,
        fairness_window = config.arbiter.fairness_window_ticks,
        idle_release = config.arbiter.idle_release_ticks,
        "config",
    );

    // 2. Build sim.
    let mut sim = SimBuilder::new(config)
        .zones(track::zones())
        .trains(track::trains())
        .build()?;
    info!(zones = sim.registry.zone_count(), slots = sim.registry.slot_count(), "track built");

    // 3. Set up output.
    std::fs::create_dir_all(OUTPUT_DIR)?;
    let writer = CsvWriter::new(Path::new(OUTPUT_DIR))?;
    let mut obs = DemoObserver {
        output: SimOutputObserver::new(writer).hard_only(),
        log:    TracingObserver::new(LOG_INTERVAL),
    };

    // 4. Run.
    let t0 = Instant::now();
    sim.run(&mut obs)?;
    let elapsed = t0.elapsed();

    if let Some(e) = obs.output.take_error() {
        eprintln!("output error: {e}");
    }

    // 5. Summary.
    println!("Simulation complete in {:.3} s ({} ticks)", elapsed.as_secs_f64(), sim.tick.0);
    println!();
    println!("{:<8} {:<12} {:<8} {:<10}", "Train", "Tags", "Waited", "Finished");
    println!("{}", "-".repeat(40));
    for train in sim.world.trains() {
        let finished = match train.finished_at {
            Some(tick) => tick.to_string(),
            None       => format!("{:?}", train.state).to_lowercase(),
        };
        println!(
            "{:<8} {:<12} {:<8} {:<10}",
            train.id.0,
            train.tags.join(","),
            train.waited,
            finished,
        );
    }

    // 6. Sessions still held when the run stopped.
    let reports: Vec<_> = sim
        .registry
        .slots()
        .flat_map(|slot| {
            slot.sessions()
                .filter_map(|session| slot.report(session.agent(), &sim.world))
                .collect::<Vec<_>>()
        })
        .collect();
    if !reports.is_empty() {
        println!();
        println!("Open sessions:");
        for report in reports {
            println!("{report}");
        }
    }

    Ok(())
}
