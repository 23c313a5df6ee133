//! Integration tests for the experiment.
//!
//! A tiny end-to-end run on synthetic trails: both phases of every fold
//! train, the metrics stay finite and the weight file can be read back.

use candle_core::Device;
use data_loader::{DataIndex, Rating};
use models::{ITEM_EMBEDDING, ItemEmbedder};
use std::path::PathBuf;
use trainer::{Experiment, Phase, PhaseModels, PhaseObserver, PhaseRecord, TrainingConfig};

const USERS: u32 = 40;
const MOVIES: u32 = 15;
const RATINGS_PER_USER: u32 = 12;

fn create_test_index() -> DataIndex {
    let mut ratings = Vec::new();
    for user in 1..=USERS {
        for step in 0..RATINGS_PER_USER {
            // Raw movie ids are sparse, as in the real data
            let movie = ((user * 7 + step * 3) % MOVIES) * 10 + 1;
            ratings.push(Rating {
                user_id: user,
                movie_id: movie,
                rating: ((user + step) % 5 + 1) as f32,
                timestamp: 1_000_000 + i64::from(step) * 60,
            });
        }
    }
    DataIndex::from_ratings(ratings, 5.0).unwrap()
}

fn tiny_config() -> TrainingConfig {
    TrainingConfig {
        seq_len: 5,
        dim: 4,
        folds: 2,
        epochs: 2,
        pretrain_batch: 64,
        finetune_batch: 8,
        head_width: 8,
        lstm_layers: 1,
        seed: 7,
        ..Default::default()
    }
}

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir()
        .join(format!("rnn_cf_test_{}", std::process::id()))
        .join(name)
}

#[test]
fn test_end_to_end_run() {
    let index = create_test_index();
    let config = tiny_config();
    let experiment = Experiment::new(config.clone()).unwrap().with_device(Device::Cpu);

    let outcome = experiment.run(&index).unwrap();

    // fold x epoch x phase, in order
    assert_eq!(outcome.history.len(), config.folds * config.epochs * 2);
    let order: Vec<(usize, usize, Phase)> = outcome
        .history
        .iter()
        .map(|r| (r.fold, r.epoch, r.phase))
        .collect();
    assert_eq!(order[0], (0, 0, Phase::Pretrain));
    assert_eq!(order[1], (0, 0, Phase::Finetune));
    assert_eq!(order[7], (1, 1, Phase::Finetune));

    for record in &outcome.history {
        let train = record.report.train.expect("every phase trains");
        assert!(train.is_finite(), "{}: {}", record.report.name, train);
        if let Some(valid) = record.report.valid {
            assert!(valid.is_finite());
            assert_eq!(record.phase, Phase::Finetune);
        }
    }
    assert!(outcome.final_validation().is_some());

    // The last fold's sequence model is what gets saved
    let weights = temp_path("weights.safetensors");
    outcome.save_weights(&weights).unwrap();
    let tensors = candle_core::safetensors::load(&weights, &Device::Cpu).unwrap();
    assert_eq!(
        tensors[ITEM_EMBEDDING].dims(),
        &[index.movies().len(), config.dim]
    );
    assert!(tensors.contains_key("rnn.mask.weight"));
    assert!(!tensors.contains_key("user_emb.weight"));

    let history = temp_path("history.json");
    outcome.save_history(&history).unwrap();
    let parsed: Vec<PhaseRecord> =
        serde_json::from_reader(std::fs::File::open(&history).unwrap()).unwrap();
    assert_eq!(parsed.len(), outcome.history.len());
    for (read, written) in parsed.iter().zip(&outcome.history) {
        assert_eq!(read.report.name, written.report.name);
        assert_eq!(read.phase, written.phase);
    }

    let _ = std::fs::remove_dir_all(weights.parent().unwrap());
}

#[test]
fn test_same_seed_same_history() {
    let index = create_test_index();
    let config = TrainingConfig { epochs: 1, ..tiny_config() };

    let run = || {
        Experiment::new(config.clone())
            .unwrap()
            .with_device(Device::Cpu)
            .run(&index)
            .unwrap()
    };
    let first = run();
    let second = run();

    let steps = |records: &[PhaseRecord]| -> Vec<(usize, usize)> {
        records
            .iter()
            .map(|r| (r.report.train_steps, r.report.valid_steps))
            .collect()
    };
    assert_eq!(steps(&first.history), steps(&second.history));
}

// Records the item table both models hold when each phase starts
#[derive(Default)]
struct TransferCheck {
    tables: Vec<(usize, usize, Phase, Vec<Vec<f32>>)>,
    finished: usize,
}

impl PhaseObserver for TransferCheck {
    fn before_phase(
        &mut self,
        fold: usize,
        epoch: usize,
        phase: Phase,
        models: PhaseModels<'_>,
    ) -> anyhow::Result<()> {
        let cross_filter = models.cross_filter.item_embeddings().embeddings().to_vec2::<f32>()?;
        let link_net = models.link_net.item_embeddings().embeddings().to_vec2::<f32>()?;
        assert_eq!(
            cross_filter, link_net,
            "fold {fold} epoch {epoch}: item tables differ before {phase}"
        );
        self.tables.push((fold, epoch, phase, link_net));
        Ok(())
    }

    fn after_phase(&mut self, _record: &PhaseRecord) {
        self.finished += 1;
    }
}

#[test]
fn test_item_embeddings_transferred_each_phase() {
    let index = create_test_index();
    let config = tiny_config();
    let experiment = Experiment::new(config.clone()).unwrap().with_device(Device::Cpu);

    let mut check = TransferCheck::default();
    let outcome = experiment.run_with(&index, &mut check).unwrap();

    let phases = config.folds * config.epochs * 2;
    assert_eq!(check.tables.len(), phases);
    assert_eq!(check.finished, phases);
    assert_eq!(outcome.history.len(), phases);

    // Pretraining moves the table, and fine-tuning starts from the moved one
    for pair in check.tables.chunks(2) {
        let (fold, epoch, first, before_pretrain) = &pair[0];
        let (_, _, second, before_finetune) = &pair[1];
        assert_eq!((*first, *second), (Phase::Pretrain, Phase::Finetune));
        assert_eq!(before_pretrain.len(), index.movies().len());
        assert_ne!(
            before_pretrain, before_finetune,
            "fold {fold} epoch {epoch}: pretraining left the item table untouched"
        );
    }
}

#[test]
fn test_invalid_config_rejected() {
    let config = TrainingConfig { folds: 1, ..tiny_config() };
    assert!(Experiment::new(config).is_err());
}

#[test]
fn test_no_long_trails_fails() {
    let index = create_test_index();
    // Windows need 31 ratings, users only have 12
    let config = TrainingConfig { seq_len: 30, ..tiny_config() };
    let experiment = Experiment::new(config).unwrap().with_device(Device::Cpu);
    assert!(experiment.run(&index).is_err());
}
