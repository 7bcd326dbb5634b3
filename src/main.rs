// src/main.rs
//
// Thin harness around the bridgebot library.
// All of the real logic lives in the lib crate (transport, decision,
// env, etc). The harness connects to a running bridge plugin, drives
// episodes with a built-in policy, and prints run statistics.

use std::path::Path;
use std::sync::Arc;

use clap::{ArgAction, Parser, ValueEnum};

use bridgebot::{
    Config, CyclePolicy, FileSink, GameEnv, HeuristicPolicy, MetricsSink, NoopSink, Policy,
    PromMetrics, StatsMetrics, StepSink, TcpBridgeClient,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PolicyChoice {
    /// Eat when low, fight when a target is visible, patrol otherwise.
    Heuristic,
    /// Cycle through the whole action space.
    Cycle,
}

/// Command-line arguments for the bridgebot binary.
#[derive(Parser, Debug)]
#[command(name = "bridgebot")]
struct Cli {
    /// Bridge endpoint (host:port). Overrides BRIDGEBOT_ENDPOINT.
    #[arg(long)]
    endpoint: Option<String>,

    /// Steps per episode.
    #[arg(long, default_value_t = 100)]
    steps: u64,

    /// Number of episodes to run.
    #[arg(long, default_value_t = 1)]
    episodes: u64,

    /// Built-in policy driving the episodes.
    #[arg(long, value_enum, default_value_t = PolicyChoice::Heuristic)]
    policy: PolicyChoice,

    /// Optional JSONL path for the per-step log.
    #[arg(long)]
    log_jsonl: Option<String>,

    /// Increase verbosity (-v prints the Prometheus dump at exit).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

/// Build the step sink as a trait object so we can choose between
/// FileSink and NoopSink at runtime.
fn build_sink(log_jsonl: Option<&str>) -> Box<dyn StepSink> {
    if let Some(path) = log_jsonl {
        match FileSink::create(Path::new(path)) {
            Ok(s) => Box::new(s),
            Err(err) => {
                eprintln!("Failed to create log file ({path}), falling back to NoopSink: {err}");
                Box::new(NoopSink)
            }
        }
    } else {
        Box::new(NoopSink)
    }
}

fn build_policy(choice: PolicyChoice, cfg: &Config) -> Box<dyn Policy> {
    match choice {
        PolicyChoice::Heuristic => Box::new(HeuristicPolicy::new(cfg.decision.clone())),
        PolicyChoice::Cycle => Box::new(CyclePolicy::new()),
    }
}

/// Fans every recording out to both aggregate sinks.
struct TeeMetrics {
    stats: Arc<StatsMetrics>,
    prom: Arc<PromMetrics>,
}

impl MetricsSink for TeeMetrics {
    fn record_observation_latency(&self, ms: f64) {
        self.stats.record_observation_latency(ms);
        self.prom.record_observation_latency(ms);
    }

    fn record_action_latency(&self, ms: f64) {
        self.stats.record_action_latency(ms);
        self.prom.record_action_latency(ms);
    }

    fn record_error(&self, kind: &str, message: &str) {
        self.stats.record_error(kind, message);
        self.prom.record_error(kind, message);
    }

    fn record_connection_failure(&self) {
        self.stats.record_connection_failure();
        self.prom.record_connection_failure();
    }
}

fn main() {
    let cli = Cli::parse();

    let mut cfg = Config::from_env();
    if let Some(endpoint) = &cli.endpoint {
        cfg.transport.endpoint = endpoint.clone();
    }

    println!(
        "bridgebot {} | endpoint={} policy={:?} episodes={} steps={}",
        cfg.version, cfg.transport.endpoint, cli.policy, cli.episodes, cli.steps
    );

    let stats = Arc::new(StatsMetrics::new());
    let prom = Arc::new(PromMetrics::new());
    let metrics: Arc<dyn MetricsSink> = Arc::new(TeeMetrics {
        stats: Arc::clone(&stats),
        prom: Arc::clone(&prom),
    });

    let transport = TcpBridgeClient::new(cfg.transport.clone(), metrics);
    let sink = build_sink(cli.log_jsonl.as_deref());
    let mut policy = build_policy(cli.policy, &cfg);
    let mut env = GameEnv::new(cfg, transport).with_sink(sink);

    for episode in 1..=cli.episodes {
        let (mut observation, _info) = env.reset();

        let mut steps_taken = 0;
        for _ in 0..cli.steps {
            let action = policy.select(&observation);
            let result = env.step(action.index());
            observation = result.observation;
            steps_taken += 1;

            if result.terminated {
                println!("episode {episode}: terminated at step {steps_taken}");
                break;
            }
        }

        println!(
            "episode {episode}: {} steps, cumulative reward {:.3}, connected={}",
            steps_taken,
            env.cumulative_reward(),
            env.is_connected()
        );
    }

    env.close();

    let summary = stats.summary();
    println!(
        "observation latency: n={} mean={:.1}ms min={:.1}ms max={:.1}ms",
        summary.observation_ms.n(),
        summary.observation_ms.mean(),
        summary.observation_ms.min(),
        summary.observation_ms.max()
    );
    println!(
        "action latency: n={} mean={:.1}ms min={:.1}ms max={:.1}ms",
        summary.action_ms.n(),
        summary.action_ms.mean(),
        summary.action_ms.min(),
        summary.action_ms.max()
    );
    println!(
        "errors={} connection_failures={}",
        summary.errors, summary.connection_failures
    );
    if let Some((kind, message)) = &summary.last_error {
        println!("last error [{kind}]: {message}");
    }

    if cli.verbose > 0 {
        println!("{}", prom.render());
    }
}
