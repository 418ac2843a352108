use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;

use review_risk_dashboard::dataset::DEFAULT_DATASET_PATH;
use review_risk_dashboard::{
    render_seeded, DatasetCache, FilterRequest, RenderOptions, Section, TopicLabels, ViewModel,
};

/// Print the review risk dashboard for one filter selection.
#[derive(Debug, Parser)]
#[command(name = "report")]
struct Cli {
    /// Processed review CSV.
    #[arg(default_value = DEFAULT_DATASET_PATH)]
    dataset: PathBuf,
    /// First review day to include (YYYY-MM-DD).
    #[arg(long)]
    from: Option<NaiveDate>,
    /// Last review day to include (YYYY-MM-DD).
    #[arg(long)]
    to: Option<NaiveDate>,
    /// Experience theme, or "All".
    #[arg(long)]
    topic: Option<String>,
    /// Listing id, or "All".
    #[arg(long)]
    listing: Option<String>,
    /// Seed for the negative review sample.
    #[arg(long, default_value_t = RenderOptions::default().sample_seed)]
    seed: u64,
    /// Emit the view model as JSON.
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();

    let cli = Cli::parse();

    let mut cache = DatasetCache::new(&cli.dataset, TopicLabels::default());
    let dataset = cache
        .get()
        .with_context(|| format!("loading {}", cli.dataset.display()))?;

    let request = FilterRequest {
        start_date: cli.from,
        end_date: cli.to,
        topic: cli.topic,
        listing: cli.listing,
    };
    let filter = request.resolve(&dataset)?;
    let options = RenderOptions {
        sample_seed: cli.seed,
        ..Default::default()
    };

    let view = render_seeded(&dataset, &filter, &options);
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        print_view(&view);
    }

    Ok(())
}

fn rate(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A".to_string(), |rate| format!("{rate:.1}%"))
}

fn print_view(view: &ViewModel) {
    println!("=== Key Experience Themes ===");
    for theme in &view.themes {
        println!("{:>3}  {}", theme.topic, theme.label);
    }

    println!("=== Filters ===");
    match view.applied_filter.date_range {
        Some(range) => println!("Dates: {} to {}", range.start(), range.end()),
        None => println!("Dates: all"),
    }
    println!("Theme: {}", view.applied_filter.topic);
    println!("Listing: {}", view.applied_filter.listing);

    println!("=== Key Metrics ===");
    println!("Total reviews: {}", view.kpis.count);
    println!("Non-Positive rate: {}", rate(view.kpis.non_positive_rate));
    println!("Positive rate: {}", rate(view.kpis.positive_rate));
    println!("Unique listings: {}", view.kpis.unique_listings);

    println!("=== Guest Sentiment Distribution ===");
    for share in &view.sentiment_distribution {
        println!("{:<14} {:>5.1}%", share.sentiment, share.percent);
    }

    println!("=== Non-Positive Experience Trend ===");
    match &view.trend {
        Section::Data { items } => {
            for point in items {
                println!(
                    "{}  {:>6.1}%  ({} reviews)",
                    point.month.format("%Y-%m"),
                    point.non_positive_fraction * 100.0,
                    point.reviews
                );
            }
        }
        Section::Empty { notice } => println!("{notice}"),
    }

    println!("=== Topic-wise Risk Breakdown ===");
    match &view.topic_risk {
        Section::Data { items } => {
            for row in items {
                println!(
                    "{:<36} Positive {:>6.2}%  Non-Positive {:>6.2}%",
                    row.topic_label.as_deref().unwrap_or("(unlabeled)"),
                    row.positive * 100.0,
                    row.non_positive * 100.0
                );
            }
        }
        Section::Empty { notice } => println!("{notice}"),
    }

    println!("=== High-Risk Listings ===");
    for risk in &view.high_risk_listings {
        println!("{:<12} {} non-positive reviews", risk.listing_id, risk.non_positive_reviews);
    }

    println!("=== Negative Customer Feedback ===");
    match &view.negative_feedback {
        Section::Data { items } => {
            for review in items {
                println!("> Listing {}", review.listing_id);
                println!("> \"{}\"", review.comments);
                println!(
                    "> Theme: {}",
                    review.topic_label.as_deref().unwrap_or("(unlabeled)")
                );
            }
        }
        Section::Empty { notice } => println!("{notice}"),
    }
    println!("==========================");
}

