use crate::config::ProviderConfig;
use crate::model::{PriceBar, PriceHistory, ProviderError, TickerInfo, TickerSymbol};
use crate::provider::MarketData;

use chrono::{DateTime, Utc};
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// quoteSummary modules merged into one info map, earlier modules win on key clashes.
const INFO_MODULES: [&str; 5] = [
    "price",
    "summaryProfile",
    "summaryDetail",
    "defaultKeyStatistics",
    "financialData",
];

/// First epoch second the chart endpoint accepts (1900-01-01). Asking for
/// `range=max` instead makes Yahoo coarsen daily bars to months or quarters.
const FIRST_EPOCH: i64 = -2_208_994_789;

const DAILY: &str = "1d";

/// Error code Yahoo answers with once a session crumb stops being accepted.
const UNAUTHORIZED: &str = "Unauthorized";

pub struct YahooClient {
    client: Client,
    base_url: Url,
    cookie_url: String,
    crumb: Mutex<Option<String>>,
}

impl YahooClient {
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .cookie_store(true)
            .build()?;

        let base_url = Url::parse(&config.base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| ProviderError::InvalidUrl(config.base_url.clone()))?;

        Ok(Self {
            client,
            base_url,
            cookie_url: config.cookie_url.clone(),
            crumb: Mutex::new(None),
        })
    }

    /// Appends `segments` to the base URL, percent-encoding each one whole.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ProviderError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ProviderError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn info_url(&self, symbol: &TickerSymbol) -> Result<Url, ProviderError> {
        self.endpoint(&["v10", "finance", "quoteSummary", symbol.as_str()])
    }

    fn chart_url(&self, symbol: &TickerSymbol) -> Result<Url, ProviderError> {
        self.endpoint(&["v8", "finance", "chart", symbol.as_str()])
    }

    /// The session crumb quoteSummary requires; fetched once and kept until rejected.
    async fn crumb(&self) -> Result<String, ProviderError> {
        let mut cached = self.crumb.lock().await;
        if let Some(crumb) = cached.as_ref() {
            return Ok(crumb.clone());
        }

        // Only the Set-Cookie matters here, the status is usually 404.
        let _ = self.client.get(&self.cookie_url).send().await?;

        let url = self.endpoint(&["v1", "test", "getcrumb"])?;
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!("Crumb request failed [{}]", status);
            return Err(ProviderError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        let crumb = response.text().await?.trim().to_string();
        if crumb.is_empty() {
            return Err(ProviderError::Decode("empty crumb".into()));
        }
        debug!("Obtained session crumb");
        Ok(cached.insert(crumb).clone())
    }

    async fn forget_crumb(&self) {
        self.crumb.lock().await.take();
    }

    async fn get_json(&self, url: &Url, query: &[(&str, &str)]) -> Result<Value, ProviderError> {
        debug!("GET {}", url);
        let response = self.client.get(url.clone()).query(query).send().await?;
        let status = response.status();
        let body = response.text().await?;

        // Yahoo reports unknown symbols as JSON errors on non-2xx responses.
        match serde_json::from_str::<Value>(&body) {
            Ok(value) => Ok(value),
            Err(e) if status.is_success() => Err(ProviderError::Decode(e.to_string())),
            Err(_) => {
                warn!("Provider responded [{}] for {}", status, url);
                Err(ProviderError::Status {
                    status: status.as_u16(),
                    url: url.to_string(),
                })
            }
        }
    }
}

/// Daily bars from the first available session up to `now`.
fn history_query(now: i64) -> Vec<(&'static str, String)> {
    vec![
        ("period1", FIRST_EPOCH.to_string()),
        ("period2", now.to_string()),
        ("interval", DAILY.to_string()),
        ("events", "div,splits".to_string()),
    ]
}

#[async_trait::async_trait]
impl MarketData for YahooClient {
    async fn fetch_info(&self, symbol: &TickerSymbol) -> Result<TickerInfo, ProviderError> {
        let crumb = self.crumb().await?;
        let modules = INFO_MODULES.join(",");
        let url = self.info_url(symbol)?;
        let body = self
            .get_json(&url, &[("modules", modules.as_str()), ("crumb", crumb.as_str())])
            .await?;

        let info = parse_quote_summary(symbol, &body);
        if let Err(ProviderError::Api { code, description }) = &info {
            if code == UNAUTHORIZED {
                warn!("Session crumb rejected ({}), a new one is fetched next time", description);
                self.forget_crumb().await;
            }
        }
        info
    }

    async fn fetch_history(&self, symbol: &TickerSymbol) -> Result<PriceHistory, ProviderError> {
        let url = self.chart_url(symbol)?;
        let query = history_query(Utc::now().timestamp());
        let query: Vec<(&str, &str)> = query.iter().map(|(k, v)| (*k, v.as_str())).collect();
        let body = self.get_json(&url, &query).await?;
        parse_chart(symbol, body)
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: String,
    description: String,
}

impl From<ApiErrorBody> for ProviderError {
    fn from(body: ApiErrorBody) -> Self {
        ProviderError::Api {
            code: body.code,
            description: body.description,
        }
    }
}

/// Flattens the quoteSummary modules into a single field map.
pub fn parse_quote_summary(symbol: &TickerSymbol, body: &Value) -> Result<TickerInfo, ProviderError> {
    let Some(summary) = body.get("quoteSummary") else {
        // Session failures arrive in a bare `finance` envelope instead.
        if let Some(error) = body.pointer("/finance/error").filter(|e| !e.is_null()) {
            let error: ApiErrorBody = serde_json::from_value(error.clone())
                .map_err(|e| ProviderError::Decode(e.to_string()))?;
            return Err(error.into());
        }
        return Err(ProviderError::Decode("missing quoteSummary".into()));
    };

    if let Some(error) = summary.get("error").filter(|e| !e.is_null()) {
        let error: ApiErrorBody = serde_json::from_value(error.clone())
            .map_err(|e| ProviderError::Decode(e.to_string()))?;
        return Err(error.into());
    }

    let result = summary
        .get("result")
        .and_then(Value::as_array)
        .and_then(|r| r.first())
        .and_then(Value::as_object)
        .ok_or_else(|| ProviderError::NoData(symbol.to_string()))?;

    let mut fields = BTreeMap::new();
    for module in INFO_MODULES {
        let Some(Value::Object(entries)) = result.get(module) else {
            continue;
        };
        for (key, value) in entries {
            if let Some(value) = flatten_value(value) {
                fields.entry(key.clone()).or_insert(value);
            }
        }
    }

    if fields.is_empty() {
        return Err(ProviderError::NoData(symbol.to_string()));
    }
    Ok(TickerInfo::new(fields))
}

/// `{raw, fmt}` pairs collapse to `raw`; empty objects and nulls count as absent.
fn flatten_value(value: &Value) -> Option<Value> {
    match value {
        Value::Null | Value::Array(_) => None,
        Value::Object(map) => map.get("raw").filter(|raw| !raw.is_null()).cloned(),
        scalar => Some(scalar.clone()),
    }
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartResponse,
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    result: Option<Vec<ChartResult>>,
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Default, Deserialize)]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i64,
    #[serde(default, rename = "dataGranularity")]
    data_granularity: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
}

/// Zips the parallel chart arrays into bars, skipping rows without open or close.
pub fn parse_chart(symbol: &TickerSymbol, body: Value) -> Result<PriceHistory, ProviderError> {
    let envelope: ChartEnvelope =
        serde_json::from_value(body).map_err(|e| ProviderError::Decode(e.to_string()))?;

    if let Some(error) = envelope.chart.error {
        return Err(error.into());
    }

    let Some(data) = envelope.chart.result.and_then(|r| r.into_iter().next()) else {
        return Err(ProviderError::NoData(symbol.to_string()));
    };
    if let Some(granularity) = data.meta.data_granularity.as_deref() {
        if granularity != DAILY {
            return Err(ProviderError::Decode(format!(
                "expected {DAILY} bars for {symbol}, got {granularity}"
            )));
        }
    }
    let Some(quote) = data.indicators.quote.first() else {
        return Err(ProviderError::NoData(symbol.to_string()));
    };

    let at = |values: &[Option<f64>], i: usize| values.get(i).copied().flatten();
    let bars: Vec<PriceBar> = data
        .timestamp
        .iter()
        .enumerate()
        .filter_map(|(i, ts)| {
            let date = DateTime::from_timestamp(ts + data.meta.gmtoffset, 0)?.date_naive();
            Some(PriceBar {
                date,
                open: at(&quote.open, i)?,
                close: at(&quote.close, i)?,
            })
        })
        .collect();

    if bars.is_empty() {
        return Err(ProviderError::NoData(symbol.to_string()));
    }
    debug!("Parsed {} bars for {}", bars.len(), symbol);
    Ok(PriceHistory::new(bars))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FIELD_DIVIDEND_YIELD, FIELD_LONG_NAME, FIELD_MARKET_CAP, FIELD_PEG_RATIO};
    use chrono::NaiveDate;
    use serde_json::json;

    fn aapl() -> TickerSymbol {
        TickerSymbol::new("AAPL")
    }

    #[test]
    fn quote_summary_modules_are_flattened() {
        let body = json!({
            "quoteSummary": {
                "result": [{
                    "price": {
                        "longName": "Apple Inc.",
                        "marketCap": { "raw": 2950000000000u64, "fmt": "2.95T" }
                    },
                    "summaryProfile": { "industry": "Consumer Electronics", "country": "United States" },
                    "summaryDetail": {
                        "dividendYield": { "raw": 0.0051, "fmt": "0.51%" },
                        "marketCap": { "raw": 1, "fmt": "1" }
                    },
                    "defaultKeyStatistics": { "pegRatio": {}, "sharesOutstanding": null }
                }],
                "error": null
            }
        });

        let info = parse_quote_summary(&aapl(), &body).unwrap();
        assert_eq!(info.display(FIELD_LONG_NAME).unwrap(), "Apple Inc.");
        assert_eq!(info.number(FIELD_MARKET_CAP).unwrap(), 2950000000000.0);
        assert_eq!(info.number(FIELD_DIVIDEND_YIELD).unwrap(), 0.0051);
        assert!(info.get(FIELD_PEG_RATIO).is_err());
        assert!(info.get("sharesOutstanding").is_err());
    }

    #[test]
    fn quote_summary_error_is_reported() {
        let body = json!({
            "quoteSummary": {
                "result": null,
                "error": { "code": "Not Found", "description": "Quote not found for symbol: ZZZZINVALID" }
            }
        });
        let err = parse_quote_summary(&TickerSymbol::new("ZZZZINVALID"), &body).unwrap_err();
        assert!(matches!(err, ProviderError::Api { ref code, .. } if code == "Not Found"));
    }

    #[test]
    fn empty_quote_summary_is_no_data() {
        let body = json!({ "quoteSummary": { "result": [], "error": null } });
        assert!(matches!(
            parse_quote_summary(&aapl(), &body),
            Err(ProviderError::NoData(_))
        ));
    }

    #[test]
    fn chart_rows_with_gaps_are_skipped() {
        let body = json!({
            "chart": {
                "result": [{
                    "meta": { "gmtoffset": -14400 },
                    "timestamp": [1704205800, 1704292200, 1704378600],
                    "indicators": {
                        "quote": [{
                            "open": [187.15, null, 182.15],
                            "high": [188.44, 185.88, 183.08],
                            "low": [183.89, 183.43, 180.88],
                            "close": [185.64, 184.25, 181.91],
                            "volume": [82488700, 58414500, null]
                        }],
                        "adjclose": [{ "adjclose": [185.0, 183.6, 181.3] }]
                    }
                }],
                "error": null
            }
        });

        let history = parse_chart(&aapl(), body).unwrap();
        assert_eq!(history.bars.len(), 2);
        assert_eq!(history.bars[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(history.bars[1].date, NaiveDate::from_ymd_opt(2024, 1, 4).unwrap());
        assert_eq!(history.closes(), vec![185.64, 181.91]);
        assert_eq!(history.opens(), vec![187.15, 182.15]);
    }

    #[test]
    fn chart_error_is_reported() {
        let body = json!({
            "chart": {
                "result": null,
                "error": { "code": "Not Found", "description": "No data found, symbol may be delisted" }
            }
        });
        assert!(matches!(
            parse_chart(&aapl(), body),
            Err(ProviderError::Api { .. })
        ));
    }

    #[test]
    fn chart_without_rows_is_no_data() {
        let body = json!({
            "chart": {
                "result": [{ "meta": {}, "indicators": { "quote": [{}] } }],
                "error": null
            }
        });
        assert!(matches!(parse_chart(&aapl(), body), Err(ProviderError::NoData(_))));
    }

    #[test]
    fn client_builds_from_default_config() {
        let client = YahooClient::new(&ProviderConfig::default()).unwrap();
        assert_eq!(
            client.chart_url(&aapl()).unwrap().as_str(),
            "https://query2.finance.yahoo.com/v8/finance/chart/AAPL"
        );
    }

    #[test]
    fn symbol_stays_one_path_segment() {
        let client = YahooClient::new(&ProviderConfig::default()).unwrap();
        let url = client.info_url(&TickerSymbol::new("BRK/B?x#y")).unwrap();
        assert_eq!(
            url.as_str(),
            "https://query2.finance.yahoo.com/v10/finance/quoteSummary/BRK%2FB%3Fx%23y"
        );
        assert!(url.query().is_none());
    }

    #[test]
    fn relative_base_url_is_rejected() {
        let config = ProviderConfig {
            base_url: "query2.finance.yahoo.com".into(),
            ..ProviderConfig::default()
        };
        assert!(matches!(YahooClient::new(&config), Err(ProviderError::InvalidUrl(_))));
    }

    #[test]
    fn history_query_asks_for_daily_bars_by_period() {
        let query = history_query(1_700_000_000);
        let get = |key: &str| query.iter().find(|(k, _)| *k == key).map(|(_, v)| v.as_str());
        assert_eq!(get("range"), None);
        assert_eq!(get("period1"), Some("-2208994789"));
        assert_eq!(get("period2"), Some("1700000000"));
        assert_eq!(get("interval"), Some("1d"));
    }

    #[test]
    fn coarse_chart_is_rejected() {
        let body = json!({
            "chart": {
                "result": [{
                    "meta": { "gmtoffset": 0, "dataGranularity": "3mo" },
                    "timestamp": [1672531200, 1680307200, 1688169600, 1696118400],
                    "indicators": {
                        "quote": [{
                            "open": [100.0, 110.0, 121.0, 133.1],
                            "close": [100.0, 110.0, 121.0, 133.1]
                        }]
                    }
                }],
                "error": null
            }
        });
        assert!(matches!(parse_chart(&aapl(), body), Err(ProviderError::Decode(_))));
    }

    #[test]
    fn rejected_crumb_is_an_api_error() {
        let body = json!({
            "finance": {
                "result": null,
                "error": { "code": "Unauthorized", "description": "Invalid Crumb" }
            }
        });
        let err = parse_quote_summary(&aapl(), &body).unwrap_err();
        assert!(matches!(err, ProviderError::Api { ref code, .. } if code == "Unauthorized"));
    }

    mod http {
        use super::*;
        use std::sync::Arc;
        use std::sync::Mutex as StdMutex;
        use std::sync::atomic::{AtomicUsize, Ordering};
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::{TcpListener, TcpStream};

        type Route = dyn Fn(&str) -> (u16, String) + Send + Sync;

        /// Canned HTTP/1.1 server; records every request target it sees.
        struct StubServer {
            base: String,
            hits: Arc<StdMutex<Vec<String>>>,
        }

        impl StubServer {
            async fn start(route: impl Fn(&str) -> (u16, String) + Send + Sync + 'static) -> Self {
                let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
                let base = format!("http://{}", listener.local_addr().unwrap());
                let hits = Arc::new(StdMutex::new(Vec::new()));
                let route: Arc<Route> = Arc::new(route);

                let seen = hits.clone();
                tokio::spawn(async move {
                    while let Ok((stream, _)) = listener.accept().await {
                        let route = route.clone();
                        let seen = seen.clone();
                        tokio::spawn(async move { serve(stream, route, seen).await });
                    }
                });
                Self { base, hits }
            }

            fn client(&self) -> YahooClient {
                let config = ProviderConfig {
                    base_url: self.base.clone(),
                    cookie_url: format!("{}/cookie", self.base),
                    timeout_seconds: 5,
                    ..ProviderConfig::default()
                };
                YahooClient::new(&config).unwrap()
            }

            fn hits(&self, prefix: &str) -> Vec<String> {
                self.hits
                    .lock()
                    .unwrap()
                    .iter()
                    .filter(|target| target.starts_with(prefix))
                    .cloned()
                    .collect()
            }
        }

        async fn serve(mut stream: TcpStream, route: Arc<Route>, seen: Arc<StdMutex<Vec<String>>>) {
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                match stream.read(&mut buf).await {
                    Ok(0) | Err(_) => return,
                    Ok(n) => request.extend_from_slice(&buf[..n]),
                }
            }
            let request = String::from_utf8_lossy(&request);
            let target = request.split_whitespace().nth(1).unwrap_or("/").to_string();
            seen.lock().unwrap().push(target.clone());

            let (status, body) = route(&target);
            let response = format!(
                "HTTP/1.1 {status} Stub\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
        }

        fn quote_body() -> String {
            json!({
                "quoteSummary": {
                    "result": [{ "price": { "longName": "Apple Inc." } }],
                    "error": null
                }
            })
            .to_string()
        }

        fn yahoo_routes(target: &str) -> (u16, String) {
            if target.starts_with("/cookie") {
                (404, String::new())
            } else if target.starts_with("/v1/test/getcrumb") {
                (200, "crumb-1".into())
            } else if target.starts_with("/v10/finance/quoteSummary/AAPL") {
                (200, quote_body())
            } else {
                (404, "{}".into())
            }
        }

        #[tokio::test]
        async fn crumb_is_fetched_once_per_client() {
            let server = StubServer::start(yahoo_routes).await;
            let client = server.client();

            for _ in 0..2 {
                let info = client.fetch_info(&aapl()).await.unwrap();
                assert_eq!(info.display(FIELD_LONG_NAME).unwrap(), "Apple Inc.");
            }

            assert_eq!(server.hits("/v1/test/getcrumb").len(), 1);
            let summaries = server.hits("/v10/finance/quoteSummary/AAPL");
            assert_eq!(summaries.len(), 2);
            assert!(summaries.iter().all(|t| t.contains("crumb=crumb-1")));
        }

        #[tokio::test]
        async fn error_page_becomes_status_error() {
            let server = StubServer::start(|target: &str| {
                if target.starts_with("/v8/finance/chart/") {
                    (503, "<html>try later</html>".into())
                } else {
                    (404, String::new())
                }
            })
            .await;

            let err = server.client().fetch_history(&aapl()).await.unwrap_err();
            assert!(matches!(err, ProviderError::Status { status: 503, .. }));
        }

        #[tokio::test]
        async fn success_without_json_is_decode_error() {
            let server = StubServer::start(|_: &str| (200, "not json".into())).await;

            let err = server.client().fetch_history(&aapl()).await.unwrap_err();
            assert!(matches!(err, ProviderError::Decode(_)));
        }

        #[tokio::test]
        async fn history_request_uses_daily_periods() {
            let server = StubServer::start(|_: &str| (404, "{}".into())).await;
            let _ = server.client().fetch_history(&aapl()).await;

            let targets = server.hits("/v8/finance/chart/AAPL");
            assert_eq!(targets.len(), 1);
            assert!(targets[0].contains("period1=-2208994789"));
            assert!(targets[0].contains("interval=1d"));
            assert!(!targets[0].contains("range="));
        }

        #[tokio::test]
        async fn rejected_crumb_is_fetched_again() {
            let crumbs = Arc::new(AtomicUsize::new(0));
            let issued = crumbs.clone();
            let server = StubServer::start(move |target: &str| {
                if target.starts_with("/v1/test/getcrumb") {
                    let n = issued.fetch_add(1, Ordering::SeqCst) + 1;
                    (200, format!("crumb-{n}"))
                } else if target.contains("crumb=crumb-1") {
                    let body = json!({
                        "finance": {
                            "result": null,
                            "error": { "code": "Unauthorized", "description": "Invalid Crumb" }
                        }
                    });
                    (401, body.to_string())
                } else if target.starts_with("/v10/finance/quoteSummary/AAPL") {
                    (200, quote_body())
                } else {
                    (404, String::new())
                }
            })
            .await;
            let client = server.client();

            let first = client.fetch_info(&aapl()).await.unwrap_err();
            assert!(matches!(first, ProviderError::Api { ref code, .. } if code == "Unauthorized"));

            let info = client.fetch_info(&aapl()).await.unwrap();
            assert_eq!(info.display(FIELD_LONG_NAME).unwrap(), "Apple Inc.");
            assert_eq!(crumbs.load(Ordering::SeqCst), 2);
        }
    }
}
