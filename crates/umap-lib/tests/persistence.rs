use ndarray::Array2;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use umap::{load_model_json, save_model_json, Initialization, Umap, UmapConfig};

fn sample_data(n: usize, dim: usize, seed: u64) -> Array2<f32> {
    let mut rng = SmallRng::seed_from_u64(seed);
    Array2::from_shape_fn((n, dim), |_| rng.gen_range(-2.0_f32..2.0))
}

fn fitted_model() -> umap::UmapModel {
    let cfg = UmapConfig {
        n_neighbors: 5,
        init: Initialization::Random,
        ..UmapConfig::default()
    };
    Umap::new(cfg)
        .expect("valid config")
        .fit(&sample_data(40, 4, 42), None)
        .expect("fit succeeds")
}

#[test]
fn test_model_json_round_trip() {
    let model = fitted_model();
    let path = std::env::temp_dir().join("umap_model_round_trip.json");
    save_model_json(&model, &path).expect("save succeeds");
    let restored = load_model_json(&path).expect("load succeeds");
    std::fs::remove_file(&path).ok();

    assert_eq!(restored.embedding(), model.embedding());
    assert_eq!(restored.config().n_neighbors, model.config().n_neighbors);
    assert_eq!(restored.config().metric.name(), model.config().metric.name());
}

#[test]
fn test_restored_model_transforms_identically() {
    let model = fitted_model();
    let path = std::env::temp_dir().join("umap_model_transform_check.json");
    save_model_json(&model, &path).expect("save succeeds");
    let restored = load_model_json(&path).expect("load succeeds");
    std::fs::remove_file(&path).ok();

    let queries = sample_data(6, 4, 7);
    let a = model.transform(&queries).expect("transform");
    let b = restored.transform(&queries).expect("transform after reload");
    assert_eq!(a, b, "persistence must not perturb transform results");
}
