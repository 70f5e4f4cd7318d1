// =============================================================================
// Ticker universe
// =============================================================================
//
// A universe is a CSV listing with a `Symbol` column (one row per listed
// security, e.g. a NASDAQ screener export).  Other columns are ignored.
// =============================================================================

use anyhow::{anyhow, Context, Result};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, info};

const SYMBOL_COLUMN: &str = "Symbol";

/// Extract tickers from the `Symbol` column, upper-cased, in file order.
/// Blank cells and duplicates are skipped.
pub fn parse_universe_csv(text: &str) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader.headers().context("universe CSV has no header row")?.clone();
    let col = headers
        .iter()
        .position(|h| h.trim() == SYMBOL_COLUMN)
        .ok_or_else(|| anyhow!("universe CSV has no '{SYMBOL_COLUMN}' column"))?;

    let mut tickers: Vec<String> = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("universe CSV row {}", row + 1))?;
        let Some(symbol) = record.get(col).map(|s| s.trim().to_uppercase()) else {
            continue;
        };
        if symbol.is_empty() || tickers.contains(&symbol) {
            continue;
        }
        tickers.push(symbol);
    }

    debug!(count = tickers.len(), "universe parsed");
    Ok(tickers)
}

/// Download and parse a universe CSV.
pub async fn fetch_universe(client: &reqwest::Client, url: &str) -> Result<Vec<String>> {
    let text = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("universe request to {url} failed"))?
        .error_for_status()
        .context("universe request rejected")?
        .text()
        .await
        .context("universe body unreadable")?;

    let tickers = parse_universe_csv(&text)?;
    info!(url, count = tickers.len(), "universe loaded");
    Ok(tickers)
}

/// Shuffle in place with the caller's RNG.
pub fn shuffle_tickers<R: Rng + ?Sized>(tickers: &mut [String], rng: &mut R) {
    tickers.shuffle(rng);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const LISTING: &str = "\
Symbol,Name,Last Sale
amc,AMC Entertainment,$4.10
BB,BlackBerry,$2.95
 nok ,Nokia,$3.40
,Blank,$0
BB,BlackBerry dup,$2.95
";

    #[test]
    fn reads_symbol_column() {
        let tickers = parse_universe_csv(LISTING).unwrap();
        assert_eq!(tickers, vec!["AMC", "BB", "NOK"]);
    }

    #[test]
    fn symbol_column_need_not_be_first() {
        let csv = "Name,Symbol\nFord,f\nCarnival,CCL\n";
        assert_eq!(parse_universe_csv(csv).unwrap(), vec!["F", "CCL"]);
    }

    #[test]
    fn missing_symbol_column_is_an_error() {
        let err = parse_universe_csv("Ticker,Name\nF,Ford\n").unwrap_err();
        assert!(err.to_string().contains("Symbol"));
    }

    #[test]
    fn shuffle_is_a_permutation() {
        let original: Vec<String> = (0..20).map(|i| format!("T{i}")).collect();
        let mut shuffled = original.clone();
        shuffle_tickers(&mut shuffled, &mut StdRng::seed_from_u64(7));

        let mut sorted = shuffled.clone();
        sorted.sort();
        let mut expected = original.clone();
        expected.sort();
        assert_eq!(sorted, expected);
    }

    #[test]
    fn seeded_shuffle_is_reproducible() {
        let base: Vec<String> = (0..10).map(|i| format!("T{i}")).collect();
        let mut a = base.clone();
        let mut b = base;
        shuffle_tickers(&mut a, &mut StdRng::seed_from_u64(42));
        shuffle_tickers(&mut b, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }
}
