use anyhow::Result;
use eancompleter::{
    dataset::{csv_file::UTF8_BOM, write_dataset_path, CsvSource, DataSource},
    enrich::{EnrichConfig, Enricher},
    search::{SearchHit, SearchProvider, SearchResult},
    ProviderError,
};
use std::io::Write;
use tempfile::NamedTempFile;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn init_test_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,eancompleter=debug")),
        )
        .with_test_writer()
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// Answers from a fixed catalogue keyed by SKU prefix of the query.
struct CatalogueProvider;

impl SearchProvider for CatalogueProvider {
    async fn search(&self, query: &str) -> Result<SearchResult, ProviderError> {
        let hits = match query.split_whitespace().next() {
            Some("HD-100") => vec![
                SearchHit::new("HDMI 2m", "Cod produs HD-100", "https://shop.example/hd-100"),
                SearchHit::new(
                    "Cablu HDMI 2m",
                    "EAN: 4006381333931 • livrare rapidă",
                    "https://market.example/p/4006381333931",
                ),
            ],
            Some("LMP-7") => vec![SearchHit::new(
                "Lampă",
                "barcode 59012341234571 (bundle)",
                "https://x.example",
            )],
            Some("TIMEOUT") => return Err(ProviderError::Timeout),
            _ => Vec::new(),
        };
        Ok(SearchResult::new(hits))
    }
}

const INPUT: &str = "SKU,Name,\"GTIN, UPC, EAN, or ISBN\",Price\n\
HD-100,Cablu HDMI 2m,,19.90\n\
SW-2,Priză smart,5901234123457,49.00\n\
LMP-7,Lampă birou,,120\n\
TIMEOUT,Router,,300\n";

#[tokio::test(start_paused = true)]
async fn test_csv_round_trip_through_enrichment() -> Result<()> {
    init_test_logging();

    let mut input = NamedTempFile::new()?;
    input.write_all(INPUT.as_bytes())?;
    let dataset = CsvSource::open(input.path())?.load()?;

    let enricher = Enricher::new(CatalogueProvider, EnrichConfig::default());
    let outcome = enricher.run(dataset).await?;

    assert_eq!(outcome.stats.queries_issued, 3);
    assert_eq!(outcome.stats.hits, 1);
    assert_eq!(outcome.stats.misses, 2);
    assert_eq!(outcome.stats.provider_errors, 1);
    assert_eq!(outcome.preview.len(), 1);
    assert_eq!(outcome.preview[0].sku, "HD-100");
    assert_eq!(outcome.preview[0].name, "Cablu HDMI 2m");
    assert_eq!(outcome.preview[0].code, "4006381333931");

    let output = NamedTempFile::new()?;
    write_dataset_path(output.path(), &outcome.dataset, b',')?;
    let bytes = std::fs::read(output.path())?;
    assert!(bytes.starts_with(UTF8_BOM));

    let text = String::from_utf8(bytes[UTF8_BOM.len()..].to_vec())?;
    let lines: Vec<&str> = text.lines().collect();
    let expected: Vec<&str> = INPUT.lines().collect();
    assert_eq!(lines.len(), expected.len());
    assert_eq!(lines[0], expected[0]);
    assert_eq!(lines[1], "HD-100,Cablu HDMI 2m,4006381333931,19.90");
    // untouched rows are byte-identical
    assert_eq!(lines[2], expected[2]);
    assert_eq!(lines[3], expected[3]);
    assert_eq!(lines[4], expected[4]);

    // feeding the output back in changes nothing more
    let reloaded = CsvSource::open(output.path())?.load()?;
    assert_eq!(reloaded, outcome.dataset);
    let again = enricher.run(reloaded).await?;
    assert_eq!(again.stats.queries_issued, 2);
    assert_eq!(again.stats.hits, 0);
    assert_eq!(again.dataset, outcome.dataset);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_exact_header_required() -> Result<()> {
    let dataset = CsvSource::new("SKU,EAN\nA,\n".as_bytes()).load()?;
    let enricher = Enricher::new(CatalogueProvider, EnrichConfig::default());
    let err = enricher.run(dataset).await.unwrap_err();
    assert_eq!(err.to_string(), "missing exact column: GTIN, UPC, EAN, or ISBN");
    Ok(())
}
