//! Planar Tracking Example
//!
//! This example follows an object moving in the plane from noisy position
//! readings, some of which never arrive, and then looks back at earlier
//! estimates without recomputing them.
//!
//! ## What You'll Learn
//!
//! - Describing a system with A, B, C, D, H, G, R, Q and a constant input
//! - Ingesting measurements, including missing ones
//! - Querying estimates at any retained time index
//! - Predicting past the last measurement
//!
//! ## Running the Example
//!
//! ```bash
//! cargo run --example 01_tracking
//! ```

use hindsight_core::{
    FilterConfig, FilterResult, InitialConditions, KalmanFilter, LinearModel, Matrix, Vector,
};

fn main() -> FilterResult<()> {
    println!("Hindsight Planar Tracking Example");
    println!("=================================\n");

    // State: [x, y, vy, vx], dt = 0.1 s
    // Input: constant acceleration on y
    #[rustfmt::skip]
    let transition = Matrix::from_row_slice(4, 4, &[
        1.0, 0.0, 0.0, 0.1,
        0.0, 1.0, 0.1, 0.0,
        0.0, 0.0, 1.0, 0.0,
        0.0, 0.0, 0.0, 1.0,
    ]);
    let model = LinearModel::new(
        transition,
        Matrix::from_row_slice(4, 1, &[0.0, 0.005, 0.1, 0.0]), // B
        Matrix::from_row_slice(2, 4, &[1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0]), // C
        Matrix::zeros(2, 1),                                    // D
        Matrix::identity(2, 2),                                 // H
        Matrix::from_diagonal(&Vector::from_vec(vec![0.2, 0.2, 0.1, 0.1])), // G
        Matrix::from_diagonal(&Vector::from_vec(vec![0.5, 0.5])),           // R
        Matrix::from_diagonal(&Vector::from_vec(vec![0.2, 0.2, 0.1, 0.1])), // Q
        Vector::from_vec(vec![-0.5]),                           // u
    );

    let initial = InitialConditions::new(
        Matrix::identity(4, 4),
        Vector::from_vec(vec![300.0, 200.0, 20.0, 20.0]),
        Some(Vector::from_vec(vec![300.0, 200.0])),
    );

    let mut kf = KalmanFilter::with_config(
        model,
        initial,
        FilterConfig::default().with_history_capacity(50),
    )?;

    // Simulated readings; every seventh one is lost
    println!("Ingesting 40 readings:");
    for k in 1..=40 {
        let t = k as f64 * 0.1;
        let noise = ((k * 37) % 11) as f64 * 0.1 - 0.5;
        let reading = if k % 7 == 0 {
            None
        } else {
            Some(Vector::from_vec(vec![
                300.0 + 20.0 * t + noise,
                200.0 + 20.0 * t - 0.25 * t * t - noise,
            ]))
        };

        if reading.is_none() {
            println!("  k={:2}: (missing)", k);
        }
        kf.ingest(reading)?;
    }
    println!("  current index: {}\n", kf.current_index());

    println!("Estimates:");
    println!("  {:>3}  {:>9}  {:>9}  {:>8}  {:>8}", "k", "x", "y", "var(x)", "gain");
    for k in (0..=40).step_by(5) {
        let state = kf.a_posteriori_state_estimate(k)?;
        let covariance = kf.a_posteriori_error_covariance(k)?;
        let gain = kf.kalman_gain(k)?;
        println!(
            "  {:3}  {:9.3}  {:9.3}  {:8.4}  {:8.4}",
            k,
            state[0],
            state[1],
            covariance[(0, 0)],
            gain[(0, 0)]
        );
    }

    // Everything up to index 40 is now cached
    println!("\nMissing reading at k=14:");
    println!("  innovation: {:?}", kf.innovation(14)?);
    let prior = kf.a_priori_state_estimate(14)?;
    let posterior = kf.a_posteriori_state_estimate(14)?;
    println!("  x⁺ == x⁻: {}", prior == posterior);

    println!("\nPrediction beyond the last reading:");
    for k in [41, 45, 50] {
        let state = kf.a_posteriori_state_estimate(k)?;
        let covariance = kf.a_posteriori_error_covariance(k)?;
        println!(
            "  k={:2}: x={:9.3} y={:9.3} var(x)={:.4}",
            k,
            state[0],
            state[1],
            covariance[(0, 0)]
        );
    }

    Ok(())
}
