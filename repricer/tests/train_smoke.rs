//! End-to-end training smoke test on a tiny configuration.
use repricer::session::{self, DrlParams};
use repricer_core::TrainerConfig;
use repricer_market_env::MarketEnvConfig;
use tempdir::TempDir;

#[test]
fn tiny_training_run_completes_and_checkpoints() {
    let dir = TempDir::new("repricer_train").unwrap();
    let model_dir = dir.path().join("models");
    let model_dir_str = model_dir.to_str().unwrap().to_string();

    let env_config = MarketEnvConfig::default().max_steps(5);
    let params = DrlParams {
        hidden_size: 8,
        buffer_size: 64,
        batch_size: 4,
        update_every: 1,
        ..Default::default()
    };
    let trainer_config = TrainerConfig::default()
        .episodes(3)
        .save_freq(2)
        .log_interval(1)
        .model_dir(model_dir_str.clone())
        .seed(1);

    let summary = session::train(&env_config, &params, trainer_config, 1).unwrap();

    assert_eq!(summary.episodes, 3);
    assert_eq!(summary.completed_episodes, 3);
    assert!(summary.avg_return.is_finite());
    assert!(summary.min_return <= summary.avg_return);
    assert!(summary.avg_return <= summary.max_return);
    // 15 environment steps with update_every = 1 leaves room for several
    // learning updates, so exploration must have decayed.
    assert!(summary.final_epsilon.unwrap() < 1.0);

    let final_dir = model_dir.join("final");
    assert_eq!(summary.model_path.unwrap(), format!("{}/final", model_dir_str));
    assert!(final_dir.join("qnet.safetensors").exists());
    assert!(final_dir.join("qnet_tgt.safetensors").exists());
    assert!(final_dir.join("meta.yaml").exists());
    assert!(model_dir.join("episode_2").join("meta.yaml").exists());

    // The checkpoint restores into a fresh evaluation session.
    let eval = session::evaluate(&env_config, &params, &final_dir, 2, 7).unwrap();
    assert_eq!(eval.episodes, 2);
    assert!(eval.avg_return.is_finite());
}
