//! Checkpoint round-trip and dimension-validation tests.
use repricer::session::{dqn_config, probe_dims, DrlParams};
use repricer::MarketDqn;
use repricer_core::{Agent, Configurable, Env, Policy};
use repricer_market_env::{MarketAct, MarketEnv, MarketEnvConfig, MarketObs};
use tempdir::TempDir;

/// A battery of observations from reseeded episodes.
fn obs_battery(env_config: &MarketEnvConfig, n: usize) -> Vec<MarketObs> {
    let mut env = MarketEnv::build(env_config, 123).unwrap();
    let mut battery = Vec::new();
    for i in 0..n {
        battery.push(env.reset_with_index(i).unwrap());
        let (step, _) = env.step(&MarketAct((i % 10) as i64));
        battery.push(step.obs);
    }
    battery
}

#[test]
fn round_trip_reproduces_greedy_actions() {
    let env_config = MarketEnvConfig::default();
    let (in_dim, out_dim) = probe_dims(&env_config).unwrap();
    let params = DrlParams {
        hidden_size: 16,
        ..Default::default()
    };
    let config = dqn_config(in_dim, out_dim, &params);

    let mut saved = MarketDqn::build(config.clone());
    saved.eval();
    let dir = TempDir::new("repricer_ckpt").unwrap();
    saved.save_params(dir.path()).unwrap();

    // A freshly built agent has its own random weights until the load.
    let mut restored = MarketDqn::build(config);
    restored.eval();
    restored.load_params(dir.path()).unwrap();

    for obs in obs_battery(&env_config, 10) {
        assert_eq!(saved.sample(&obs), restored.sample(&obs));
    }
}

#[test]
fn architecture_mismatch_keeps_current_parameters() {
    let env_config = MarketEnvConfig::default();
    let (in_dim, out_dim) = probe_dims(&env_config).unwrap();
    let small = dqn_config(
        in_dim,
        out_dim,
        &DrlParams {
            hidden_size: 8,
            ..Default::default()
        },
    );
    let large = dqn_config(
        in_dim,
        out_dim,
        &DrlParams {
            hidden_size: 32,
            ..Default::default()
        },
    );

    let saved = MarketDqn::build(small);
    let dir = TempDir::new("repricer_ckpt").unwrap();
    saved.save_params(dir.path()).unwrap();

    let mut agent = MarketDqn::build(large);
    agent.eval();
    let battery = obs_battery(&env_config, 5);
    let before: Vec<MarketAct> = battery.iter().map(|o| agent.sample(o)).collect();

    // The load is refused without an error and without touching parameters.
    agent.load_params(dir.path()).unwrap();
    let after: Vec<MarketAct> = battery.iter().map(|o| agent.sample(o)).collect();
    assert_eq!(before, after);
}
