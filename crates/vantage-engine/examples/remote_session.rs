//! Vantage RemoteSession: a paced simulation driven by scripted control
//! requests, with every outbound message printed as a JSON line.
//!
//! Demonstrates:
//!   1. Building a `VizConfig` from command-line flags or a JSON file
//!   2. Installing a `fmt` layer and a `LogBridge` layer side by side
//!   3. Registering entity converters for snapshots
//!   4. Playing, fast-forwarding, pausing, stepping and resetting a run
//!   5. Graceful shutdown and the final driver and pump counters
//!
//! Run with:
//!   cargo run --example remote_session -- --broadcast-frequency 4
//!
//! Human-readable logs go to stderr; the JSON lines an observer would
//! receive go to stdout.

use std::error::Error;
use std::f64::consts::TAU;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::Parser;
use serde_json::json;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use vantage_core::{ArenaGeometry, Entity, SimulationEngine, Vec3};
use vantage_engine::{
    ChannelBroadcaster, CompletionPolicy, ConverterRegistry, LogBridge, RemoteSession,
    SessionConfig, VizConfig,
};

// ─── Command line ───────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "remote-session")]
#[command(about = "Drive an orbiting-bodies simulation through a remote session", long_about = None)]
struct Args {
    /// JSON file with `port`, `broadcast_frequency` and `ff_draw_frames_every`
    #[arg(long)]
    config: Option<PathBuf>,

    /// Port handed to the transport
    #[arg(long, default_value = "3000")]
    port: u16,

    /// Snapshots forwarded per second, 1 to 10
    #[arg(long, default_value = "10")]
    broadcast_frequency: u16,

    /// Engine steps per cycle while fast-forwarding
    #[arg(long, default_value = "2")]
    ff_draw_frames_every: u16,

    /// Number of orbiting bodies
    #[arg(short, long, default_value = "3")]
    bodies: usize,

    /// Ticks until the run is finished
    #[arg(long, default_value = "400")]
    max_steps: u64,

    /// Stop the driver once the run is finished
    #[arg(long)]
    exit_on_done: bool,
}

impl Args {
    fn viz_config(&self) -> Result<VizConfig, Box<dyn Error>> {
        let viz = match &self.config {
            Some(path) => VizConfig::from_json_str(&std::fs::read_to_string(path)?)?,
            None => VizConfig {
                port: self.port,
                broadcast_frequency: self.broadcast_frequency,
                ff_draw_frames_every: self.ff_draw_frames_every,
            },
        };
        viz.validate()?;
        Ok(viz)
    }
}

// ─── Engine: bodies on circular orbits ──────────────────────────

struct Body {
    id: String,
    radius: f64,
    angle: f64,
    angular_speed: f64,
}

impl Body {
    fn position(&self) -> Vec3 {
        Vec3::new(
            self.radius * self.angle.cos(),
            self.radius * self.angle.sin(),
            0.0,
        )
    }
}

impl Entity for Body {
    fn type_tag(&self) -> &str {
        "foot-bot"
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

struct OrbitEngine {
    bodies: Vec<Body>,
    steps: u64,
    max_steps: u64,
}

impl OrbitEngine {
    const TICK_SECS: f64 = 0.05;

    fn new(count: usize, max_steps: u64) -> Self {
        let mut engine = Self {
            bodies: Vec::with_capacity(count),
            steps: 0,
            max_steps,
        };
        for i in 0..count {
            engine.bodies.push(Body {
                id: format!("fb{i}"),
                radius: 0.5 + i as f64 * 0.4,
                angle: 0.0,
                angular_speed: TAU / (4.0 + i as f64 * 2.0),
            });
        }
        engine.reset();
        engine
    }
}

impl SimulationEngine for OrbitEngine {
    fn step(&mut self) {
        for body in &mut self.bodies {
            body.angle = (body.angle + body.angular_speed * Self::TICK_SECS) % TAU;
        }
        self.steps += 1;
    }

    fn post_experiment(&mut self) {
        info!(steps = self.steps, "all orbits recorded");
    }

    fn is_finished(&self) -> bool {
        self.steps >= self.max_steps
    }

    fn reset(&mut self) {
        let count = self.bodies.len().max(1) as f64;
        for (i, body) in self.bodies.iter_mut().enumerate() {
            body.angle = TAU * i as f64 / count;
        }
        self.steps = 0;
    }

    fn clock_tick_secs(&self) -> f64 {
        Self::TICK_SECS
    }

    fn steps(&self) -> u64 {
        self.steps
    }

    fn arena(&self) -> ArenaGeometry {
        ArenaGeometry {
            size: Vec3::new(5.0, 5.0, 1.0),
            center: Vec3::new(0.0, 0.0, 0.5),
        }
    }

    fn entities(&self) -> Vec<&dyn Entity> {
        self.bodies.iter().map(|b| b as &dyn Entity).collect()
    }
}

// ─── Main ───────────────────────────────────────────────────────

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let bridge = LogBridge::new();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(bridge.layer())
        .init();

    let config = SessionConfig {
        completion: if args.exit_on_done {
            CompletionPolicy::Exit
        } else {
            CompletionPolicy::Rearm
        },
        ..SessionConfig::from_viz(args.viz_config()?)
    };

    let mut converters = ConverterRegistry::new();
    converters.register("foot-bot", |body: &Body| {
        let p = body.position();
        json!({
            "type": "foot-bot",
            "id": body.id,
            "position": { "x": p.x, "y": p.y, "z": p.z },
            "orientation": body.angle,
        })
    });

    let (broadcaster, outbound) = ChannelBroadcaster::new();
    let printer = thread::Builder::new()
        .name("printer".into())
        .spawn(move || {
            for message in outbound.iter() {
                println!("{}", message.to_json());
            }
        })?;

    let mut session = RemoteSession::builder(config)
        .converters(converters)
        .log_bridge(&bridge)
        .spawn(
            OrbitEngine::new(args.bodies, args.max_steps),
            Arc::new(broadcaster),
        )?;

    session.play()?;
    thread::sleep(Duration::from_millis(600));
    session.fast_forward()?;
    thread::sleep(Duration::from_millis(400));
    session.pause()?;
    for _ in 0..3 {
        session.step()?;
    }
    if let Err(err) = session.pause() {
        info!(%err, "pause refused as expected");
    }
    session.reset()?;
    session.fast_forward()?;
    while session.is_driver_running() && session.phase().is_running() {
        thread::sleep(Duration::from_millis(50));
    }

    info!(
        retained = session.recent_snapshots().len(),
        published = session.snapshots_published(),
        "snapshot history"
    );
    let report = session.shutdown();
    info!(
        total_ms = report.total_ms,
        driver = ?report.driver,
        pump = ?report.pump,
        "session finished"
    );
    drop(session);
    let _ = printer.join();
    Ok(())
}
