//! Error Handling Example
//!
//! Shows every way a filter can refuse a request and what it means.
//!
//! ## What You'll Learn
//!
//! - Model validation at construction
//! - Measurement validation at ingestion
//! - Querying indices that slid out of the window
//! - Singular innovation covariance
//!
//! ## Running the Example
//!
//! ```bash
//! cargo run --example 02_error_handling
//! ```

use hindsight_core::{
    FilterConfig, FilterError, InitialConditions, KalmanFilter, LinearModel, Matrix, Vector,
};

fn scalar_model(output: f64, shaping: f64) -> LinearModel {
    LinearModel::new(
        Matrix::from_element(1, 1, 0.9),
        Matrix::zeros(1, 1),
        Matrix::from_element(1, 1, output),
        Matrix::zeros(1, 1),
        Matrix::from_element(1, 1, shaping),
        Matrix::from_element(1, 1, 1.0),
        Matrix::from_element(1, 1, 0.1),
        Matrix::from_element(1, 1, 0.01),
        Vector::zeros(1),
    )
}

fn scalar_initial() -> InitialConditions {
    InitialConditions::new(
        Matrix::from_element(1, 1, 1.0),
        Vector::zeros(1),
        Some(Vector::from_element(1, 0.5)),
    )
}

fn report(label: &str, err: &FilterError) {
    println!("  {}: {}", label, err);
}

fn main() {
    println!("Hindsight Error Handling Example");
    println!("================================\n");

    // 1. Non-conformant model
    println!("1. Construction");
    let mut model = scalar_model(1.0, 1.0);
    model.transition = Matrix::identity(2, 2);
    match KalmanFilter::new(model, scalar_initial()) {
        Ok(_) => println!("  unexpected success"),
        Err(err) => report("bad transition", &err),
    }

    let config = FilterConfig::default().with_history_capacity(0);
    match KalmanFilter::with_config(scalar_model(1.0, 1.0), scalar_initial(), config) {
        Ok(_) => println!("  unexpected success"),
        Err(err) => report("zero capacity", &err),
    }

    // 2. Wrong measurement length
    println!("\n2. Ingestion");
    let config = FilterConfig::default().with_history_capacity(4);
    let mut kf = match KalmanFilter::with_config(scalar_model(1.0, 1.0), scalar_initial(), config) {
        Ok(kf) => kf,
        Err(err) => return report("construction", &err),
    };
    if let Err(err) = kf.ingest(Some(Vector::zeros(3))) {
        report("3-element reading", &err);
    }
    println!("  current index unchanged: {}", kf.current_index());

    // 3. Evicted index
    println!("\n3. Window");
    for k in 1..=10 {
        if let Err(err) = kf.ingest(Some(Vector::from_element(1, 0.5 * 0.9f64.powi(k)))) {
            return report("ingest", &err);
        }
    }
    println!("  oldest retained index: {}", kf.oldest_index());
    match kf.a_posteriori_state_estimate(2) {
        Ok(_) => println!("  unexpected success"),
        Err(err) => report("query k=2", &err),
    }
    match kf.a_posteriori_state_estimate(kf.oldest_index()) {
        Ok(state) => println!("  query k={}: x⁺ = {:.5}", kf.oldest_index(), state[0]),
        Err(err) => report("query oldest", &err),
    }

    // 4. Nothing observable and no measurement noise: C·P·Cᵗ + H·R·Hᵗ = 0
    println!("\n4. Singular innovation covariance");
    let mut blind = match KalmanFilter::new(scalar_model(0.0, 0.0), scalar_initial()) {
        Ok(kf) => kf,
        Err(err) => return report("construction", &err),
    };
    match blind.kalman_gain(0) {
        Ok(_) => println!("  unexpected success"),
        Err(err) => report("gain k=0", &err),
    }
    let cached = blind.record(0).and_then(|record| record.kalman_gain()).is_some();
    println!("  gain cached after failure: {}", cached);
}
