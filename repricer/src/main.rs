//! Command-line entry point: train or evaluate the repricing agent.
use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use repricer::session::{self, DrlParams};
use repricer_core::TrainerConfig;
use repricer_market_env::MarketEnvConfig;

#[derive(Parser)]
#[command(name = "repricer", about = "DQN-based repricing of second-hand listings")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Train an agent against the market simulation.
    Train(TrainArgs),

    /// Evaluate a trained agent.
    Eval(EvalArgs),
}

#[derive(Args)]
struct MarketArgs {
    /// Path of the category-statistics JSON file; the built-in table is used
    /// when absent or unreadable.
    #[arg(long)]
    stats_path: Option<String>,

    /// Episode length in decision points.
    #[arg(long, default_value_t = 30)]
    env_max_steps: usize,

    /// Steepness of the price-to-sale-probability sigmoid.
    #[arg(long, default_value_t = 0.7)]
    price_sensitivity: f64,

    /// Scale of the price deviation's effect on days-to-sell.
    #[arg(long, default_value_t = 0.3)]
    time_sensitivity: f64,

    /// Scale of the market-response jitter.
    #[arg(long, default_value_t = 0.1)]
    market_volatility: f64,

    /// Lower bound of the price-adjustment range.
    #[arg(long, default_value_t = -0.3, allow_hyphen_values = true)]
    adjustment_min: f64,

    /// Upper bound of the price-adjustment range.
    #[arg(long, default_value_t = 0.3)]
    adjustment_max: f64,

    /// Number of discrete price adjustments.
    #[arg(long, default_value_t = 10)]
    adjustment_steps: usize,

    /// Weight of the profit term of the reward.
    #[arg(long, default_value_t = 0.7)]
    profit_weight: f64,

    /// Weight of the time-penalty term of the reward.
    #[arg(long, default_value_t = 0.3)]
    time_weight: f64,
}

impl MarketArgs {
    fn to_config(&self) -> MarketEnvConfig {
        let mut config = MarketEnvConfig::default()
            .max_steps(self.env_max_steps)
            .price_sensitivity(self.price_sensitivity)
            .time_sensitivity(self.time_sensitivity)
            .market_volatility(self.market_volatility)
            .price_adjustment_range(self.adjustment_min, self.adjustment_max)
            .price_adjustment_steps(self.adjustment_steps)
            .profit_weight(self.profit_weight)
            .time_weight(self.time_weight);
        if let Some(stats_path) = &self.stats_path {
            config = config.stats_path(stats_path);
        }
        config
    }
}

#[derive(Args)]
struct AgentArgs {
    /// Width of the Q-network's hidden layers.
    #[arg(long, default_value_t = 128)]
    hidden_size: i64,

    /// Capacity of the replay buffer.
    #[arg(long, default_value_t = 10000)]
    buffer_size: usize,

    /// Batch size of learning updates.
    #[arg(long, default_value_t = 64)]
    batch_size: usize,

    /// Discount factor.
    #[arg(long, default_value_t = 0.99)]
    gamma: f64,

    /// Soft-update coefficient of the target network.
    #[arg(long, default_value_t = 1e-3)]
    tau: f64,

    /// Learning rate of the Adam optimizer.
    #[arg(long, default_value_t = 1e-3)]
    learning_rate: f64,

    /// Environment steps between learning updates.
    #[arg(long, default_value_t = 4)]
    update_every: usize,

    /// Initial exploration rate.
    #[arg(long, default_value_t = 1.0)]
    epsilon_start: f64,

    /// Lower bound of the exploration rate.
    #[arg(long, default_value_t = 0.01)]
    epsilon_min: f64,

    /// Multiplicative decay of the exploration rate per learning update.
    #[arg(long, default_value_t = 0.995)]
    epsilon_decay: f64,

    /// Seed of the agent's and the replay buffer's random streams.
    #[arg(long, default_value_t = 42)]
    agent_seed: u64,
}

impl AgentArgs {
    fn to_params(&self) -> DrlParams {
        DrlParams {
            hidden_size: self.hidden_size,
            buffer_size: self.buffer_size,
            batch_size: self.batch_size,
            gamma: self.gamma,
            tau: self.tau,
            learning_rate: self.learning_rate,
            update_every: self.update_every,
            epsilon_start: self.epsilon_start,
            epsilon_min: self.epsilon_min,
            epsilon_decay: self.epsilon_decay,
            seed: self.agent_seed,
        }
    }
}

#[derive(Args)]
struct TrainArgs {
    /// Number of training episodes.
    #[arg(long, default_value_t = 1000)]
    episodes: usize,

    /// Optional per-episode step cap on top of the environment bound.
    #[arg(long)]
    max_steps: Option<usize>,

    /// Interval of checkpoints, in episodes.
    #[arg(long, default_value_t = 100)]
    save_freq: usize,

    /// Interval of evaluations during training, in episodes.
    #[arg(long)]
    eval_interval: Option<usize>,

    /// Episodes per evaluation.
    #[arg(long, default_value_t = 10)]
    eval_episodes: usize,

    /// Directory where checkpoints are written.
    #[arg(long, default_value = "models")]
    model_dir: String,

    /// Seed of the training environment.
    #[arg(long, default_value_t = 0)]
    seed: i64,

    #[command(flatten)]
    market: MarketArgs,

    #[command(flatten)]
    agent: AgentArgs,
}

#[derive(Args)]
struct EvalArgs {
    /// Number of evaluation episodes.
    #[arg(long, default_value_t = 100)]
    episodes: usize,

    /// Checkpoint directory to restore the agent from.
    #[arg(long, default_value = "models/final")]
    model_dir: String,

    /// Seed of the evaluation environment.
    #[arg(long, default_value_t = 0)]
    seed: i64,

    #[command(flatten)]
    market: MarketArgs,

    #[command(flatten)]
    agent: AgentArgs,
}

fn main() -> Result<()> {
    env_logger::init();

    match Cli::parse().command {
        Command::Train(args) => {
            let trainer_config = TrainerConfig::default()
                .episodes(args.episodes)
                .max_steps(args.max_steps)
                .save_freq(args.save_freq)
                .eval_interval(args.eval_interval)
                .model_dir(args.model_dir)
                .seed(args.seed);
            let summary = session::train(
                &args.market.to_config(),
                &args.agent.to_params(),
                trainer_config,
                args.eval_episodes,
            )?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::Eval(args) => {
            let summary = session::evaluate(
                &args.market.to_config(),
                &args.agent.to_params(),
                &args.model_dir,
                args.episodes,
                args.seed,
            )?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }

    Ok(())
}
