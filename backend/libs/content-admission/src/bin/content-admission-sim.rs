//! Replays a conversation from stdin through the introduction engine.
//!
//! Each line is either a user utterance or a command:
//!   `:feedback <sentiment> [text]`  react to the last introduced item
//!   `:wait <minutes>`               advance the simulated clock
//!   `:stats`                        print the engagement records touched so far
//!
//! Usage: `content-admission-sim [user_id] < conversation.txt`

use anyhow::{bail, Context, Result};
use chrono::{Duration, Utc};
use content_admission::{
    Catalog, CatalogItem, Category, Config, InMemoryEngagementStore, IntroductionEngine,
    RngSource,
};
use std::collections::BTreeSet;
use std::env;
use std::io::{self, BufRead};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const CATALOG_PATH_VAR: &str = "CONTENT_ADMISSION_CATALOG_PATH";

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let config = Config::from_env().context("failed to load content admission config")?;
    let catalog = load_catalog()?;
    let user_id = env::args().nth(1).unwrap_or_else(|| "demo-user".to_string());

    info!(user_id = %user_id, catalog_items = catalog.len(), "Starting simulation");

    let engine = IntroductionEngine::from_config(
        config,
        Arc::new(InMemoryEngagementStore::new()),
        Arc::new(RngSource::from_entropy()),
    );

    let mut now = Utc::now();
    let mut last_item: Option<CatalogItem> = None;
    let mut touched: BTreeSet<Category> = BTreeSet::new();

    for line in io::stdin().lock().lines() {
        let line = line.context("failed to read stdin")?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(command) = line.strip_prefix(':') {
            let mut parts = command.splitn(3, ' ');
            match (parts.next(), parts.next(), parts.next()) {
                (Some("feedback"), Some(sentiment), text) => {
                    let Some(item) = &last_item else {
                        warn!("Feedback without a previously introduced item");
                        continue;
                    };
                    let sentiment: f64 = sentiment
                        .parse()
                        .with_context(|| format!("invalid sentiment {:?}", sentiment))?;
                    let outcome =
                        engine.record_feedback(&user_id, item, Some(sentiment), text, now)?;
                    println!(
                        "  [feedback] {} -> score {:.3}",
                        item.category, outcome.record.engagement_score
                    );
                }
                (Some("wait"), Some(minutes), None) => {
                    let minutes: i64 = minutes
                        .parse()
                        .with_context(|| format!("invalid minutes {:?}", minutes))?;
                    now += Duration::minutes(minutes);
                    println!("  [clock] +{}m", minutes);
                }
                (Some("stats"), None, None) => {
                    for category in &touched {
                        let probability =
                            engine.controller().probability_for(&user_id, category)?;
                        if let Some(record) = engine.controller().snapshot(&user_id, category)? {
                            println!(
                                "  [stats] {}: score {:.3}, p {:.3}, shown {}, feedback {}",
                                category,
                                record.engagement_score,
                                probability,
                                record.shown_count,
                                record.feedback_count
                            );
                        }
                    }
                }
                _ => bail!("unknown command {:?}", line),
            }
            continue;
        }

        println!("> {}", line);
        touched.extend(engine.detector().detect(line));

        match engine.suggest(&user_id, line, &catalog, now)? {
            Some(intro) => {
                engine.record_shown(&user_id, &intro.item, now)?;
                println!(
                    "  [introduce] {} / {} (p={:.2})",
                    intro.category, intro.item.title, intro.probability
                );
                last_item = Some(intro.item);
            }
            None => println!("  [no introduction]"),
        }
    }

    Ok(())
}

fn load_catalog() -> Result<Catalog> {
    let Ok(path) = env::var(CATALOG_PATH_VAR) else {
        return Ok(demo_catalog());
    };

    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read catalog {}", path))?;
    let items: Vec<CatalogItem> =
        serde_json::from_str(&raw).with_context(|| format!("failed to parse catalog {}", path))?;

    info!(path = %path, items = items.len(), "Catalog loaded");
    Ok(Catalog::from_items(items))
}

fn demo_catalog() -> Catalog {
    let items = [
        ("sports", "sports-1", "Greatest last-over finishes"),
        ("sports", "sports-2", "Stadium vlog: final day"),
        ("sports", "sports-3", "Fielding drills with the pros"),
        ("business", "business-1", "How founders raise a seed round"),
        ("business", "business-2", "Reading a balance sheet in ten minutes"),
        ("podcast", "podcast-1", "Long-form chat with a chess grandmaster"),
        ("podcast", "podcast-2", "Mindset and discipline, episode 212"),
    ];

    Catalog::from_items(
        items
            .iter()
            .map(|(category, id, title)| CatalogItem::new(*id, Category::new(category), *title)),
    )
}
