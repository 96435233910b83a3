//! Simple test harness for the box-office service.
//!
//! Trains on a corpus and predicts the sample request end to end.
//! Usage: `server [corpus.csv]` (default `data/box_office.csv`).

use anyhow::{Context, Result};
use tracing::info;

use data_loader::{Field, RawMovieRecord};
use pipeline::TrainingConfig;
use server::BoxOfficeService;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter("info,server=debug,pipeline=debug")
        .init();

    info!("Starting box-office service test harness");

    let corpus = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "data/box_office.csv".to_string());
    let service = BoxOfficeService::new(TrainingConfig::default());
    let pipeline = service
        .retrain(&corpus)
        .await
        .with_context(|| format!("Failed to train on {corpus}"))?;

    info!(
        "Selected {} trees (test R² {:.3})",
        pipeline.report().n_estimators,
        pipeline.report().test_r2
    );
    for (column, importance) in pipeline.top_importances(5) {
        info!("   {column}: {importance:.3}");
    }

    let request = RawMovieRecord::new()
        .with(Field::Title, "Clannad")
        .with(Field::Category, "爱情,校园")
        .with(Field::Country, "日本")
        .with(Field::Year, "2007")
        .with(Field::Month, "9")
        .with(Field::Day, "15")
        .with(Field::Length, "120")
        .with(Field::Rating, "9.9")
        .with(Field::RatingCount, "1234567")
        .with(Field::WishCount, "1234567")
        .with(Field::FirstDayBox, "11111111")
        .with(Field::FirstWeekBox, "22222222");

    let prediction = service.predict(&request).await?;
    info!("Predicted cumulative box office for Clannad: {:.0}", prediction.value);
    for warning in &prediction.warnings {
        info!("   {warning}");
    }

    Ok(())
}
