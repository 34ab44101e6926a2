use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use clap::Subcommand;
use ji_core::{Error, RecordKind, Result};
use tracing::{error, info};

use crate::export::export_records;
use crate::manager::{RefreshOutcome, ScraperManager};
use crate::scrapers::kind_for_cli_name;

/// A duration written as `500ms`, `30s`, `2m`, `1h15m30s` or `1d`. A bare
/// number is read as seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HumanDuration(pub Duration);

impl FromStr for HumanDuration {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let overflow = || format!("Duration is too long: {}", s);
        let mut total_millis = 0u64;
        let mut current_number = String::new();
        let mut has_unit = false;
        let mut chars = s.trim().chars().peekable();

        while let Some(c) = chars.next() {
            if c.is_ascii_digit() {
                current_number.push(c);
                continue;
            }
            if c.is_whitespace() {
                continue;
            }
            if current_number.is_empty() {
                return Err(format!("Unit '{}' must follow a number", c));
            }
            let num = current_number.parse::<u64>().map_err(|_| overflow())?;
            let unit_millis = match c {
                'm' if chars.peek() == Some(&'s') => {
                    chars.next();
                    1
                }
                's' => 1_000,
                'm' => 60_000,
                'h' => 3_600_000,
                'd' => 86_400_000,
                _ => return Err(format!("Invalid duration unit: {}", c)),
            };
            total_millis = num
                .checked_mul(unit_millis)
                .and_then(|millis| total_millis.checked_add(millis))
                .ok_or_else(overflow)?;
            current_number.clear();
            has_unit = true;
        }

        if !current_number.is_empty() {
            total_millis = current_number
                .parse::<u64>()
                .ok()
                .and_then(|num| num.checked_mul(1_000))
                .and_then(|millis| total_millis.checked_add(millis))
                .ok_or_else(overflow)?;
            has_unit = true;
        }

        if !has_unit {
            return Err("Duration must include a number".to_string());
        }

        Ok(HumanDuration(Duration::from_millis(total_millis)))
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum ScraperCommands {
    /// Scrape one kind (news, courses, trainers) or all of them into the store
    Scrape {
        /// Kind to scrape. If not specified, refreshes every collection.
        #[arg(required = false)]
        kind: Option<String>,
        /// Also write the scraped records to this JSON file (single kind only)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Repeat the scrape with this interval (e.g. 1h, 30m, 1h15m30s)
        #[arg(long)]
        interval: Option<HumanDuration>,
    },
    /// List the pipelines with their listing URL and pagination
    List,
}

pub async fn handle_command(command: ScraperCommands, manager: &ScraperManager) -> Result<()> {
    match command {
        ScraperCommands::Scrape { kind, output, interval } => {
            let kind = kind.as_deref().map(kind_for_cli_name).transpose()?;
            if kind.is_none() && output.is_some() {
                return Err(Error::Config("--output needs a single kind to scrape".to_string()));
            }

            match interval {
                Some(HumanDuration(interval)) => {
                    info!("Running in periodic mode with {:?} interval", interval);
                    loop {
                        info!("Starting scrape cycle");
                        if let Err(e) = scrape_once(manager, kind, output.as_deref()).await {
                            error!("Error during scrape: {}", e);
                        }
                        info!("Waiting {:?} before next scrape", interval);
                        tokio::time::sleep(interval).await;
                    }
                }
                None => scrape_once(manager, kind, output.as_deref()).await,
            }
        }
        ScraperCommands::List => {
            println!("Available pipelines:");
            for pipeline in manager.list_pipelines() {
                println!("  {}", pipeline);
            }
            Ok(())
        }
    }
}

async fn scrape_once(manager: &ScraperManager, kind: Option<RecordKind>, output: Option<&Path>) -> Result<()> {
    let Some(kind) = kind else {
        let outcome = manager.refresh_all().await;
        print_outcome(&outcome);
        return match outcome.error {
            Some(e) => Err(Error::Scraping(e)),
            None => Ok(()),
        };
    };

    let run = manager.run_kind(kind).await?;
    println!("{}: {} records", kind, run.accumulator.len());
    if let Some(path) = output {
        export_records(path, run.accumulator.records()).await?;
        println!("Exported to {}", path.display());
    }
    Ok(())
}

fn print_outcome(outcome: &RefreshOutcome) {
    for (kind, count) in &outcome.counts {
        println!("{}: {} records", kind, count);
    }
    if let Some(e) = &outcome.error {
        eprintln!("Refresh stopped: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::walker::tests::MockFetcher;
    use clap::Parser;
    use ji_core::SiteConfig;
    use ji_storage::MemoryStorage;
    use std::sync::Arc;

    #[derive(Parser, Debug)]
    struct TestCli {
        #[command(subcommand)]
        command: ScraperCommands,
    }

    #[test]
    fn test_human_duration() {
        let parse = |s: &str| s.parse::<HumanDuration>().map(|d| d.0);
        assert_eq!(parse("500ms"), Ok(Duration::from_millis(500)));
        assert_eq!(parse("2s"), Ok(Duration::from_secs(2)));
        assert_eq!(parse("1h15m30s"), Ok(Duration::from_secs(4530)));
        assert_eq!(parse("1m 500ms"), Ok(Duration::from_millis(60_500)));
        assert_eq!(parse("45"), Ok(Duration::from_secs(45)));
        assert_eq!(parse("1d"), Ok(Duration::from_secs(86_400)));
        assert!(parse("").is_err());
        assert!(parse("ms").is_err());
        assert!(parse("3w").is_err());
    }

    #[test]
    fn test_human_duration_overflow_is_an_error() {
        let parse = |s: &str| s.parse::<HumanDuration>();
        assert!(parse("999999999999999d").unwrap_err().contains("too long"));
        assert!(parse("18446744073709551615s").unwrap_err().contains("too long"));
        assert!(parse("99999999999999999999").unwrap_err().contains("too long"));
        assert!(parse("18446744073709551615ms 1ms").is_err());
        assert_eq!(parse("213503982334d").map(|d| d.0.as_secs() / 86_400), Ok(213_503_982_334));
    }

    #[test]
    fn test_parse_scrape_command() {
        let cli = TestCli::parse_from(["ji", "scrape", "news", "--output", "news.json", "--interval", "30m"]);
        match cli.command {
            ScraperCommands::Scrape { kind, output, interval } => {
                assert_eq!(kind.as_deref(), Some("news"));
                assert_eq!(output, Some(PathBuf::from("news.json")));
                assert_eq!(interval, Some(HumanDuration(Duration::from_secs(1800))));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    async fn manager(fetcher: MockFetcher) -> ScraperManager {
        let mut config = SiteConfig {
            base_url: "http://site.test".to_string(),
            ..SiteConfig::default()
        };
        for kind in RecordKind::ALL {
            config.pipeline_mut(kind).item_delay_ms = 0;
            config.pipeline_mut(kind).page_delay_ms = 0;
        }
        let storage = Arc::new(MemoryStorage::new().await.unwrap());
        ScraperManager::with_fetcher(storage, Arc::new(fetcher), config)
    }

    #[tokio::test]
    async fn test_scrape_single_kind_with_export() {
        let fetcher = MockFetcher::default().with_page(
            "http://site.test/en/trainers?page=1",
            r#"<div class="trainer-box"><h4 class="header">Jane Doe</h4></div>"#,
        );
        let manager = manager(fetcher).await;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trainers.json");

        let command = ScraperCommands::Scrape {
            kind: Some("trainer".to_string()),
            output: Some(path.clone()),
            interval: None,
        };
        handle_command(command, &manager).await.unwrap();

        let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["total_articles"], 1);
        assert_eq!(value["articles"][0]["name"], "Jane Doe");
        assert_eq!(manager.records(RecordKind::Trainers).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_export_requires_single_kind() {
        let manager = manager(MockFetcher::default()).await;
        let command = ScraperCommands::Scrape {
            kind: None,
            output: Some(PathBuf::from("all.json")),
            interval: None,
        };
        assert!(matches!(handle_command(command, &manager).await, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_unknown_kind() {
        let manager = manager(MockFetcher::default()).await;
        let command = ScraperCommands::Scrape {
            kind: Some("videos".to_string()),
            output: None,
            interval: None,
        };
        assert!(handle_command(command, &manager).await.is_err());
    }
}
