use crate::source::VideoSource;
use async_trait::async_trait;
use insight_core::{BiliApiError, CoreError, CrawlSettings, SearchResult, StreamId};
use regex::Regex;
use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, ORIGIN, PRAGMA, REFERER,
};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Deserializer};
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, error, info, warn};

const BILIBILI_HOME: &str = "https://www.bilibili.com";
const SEARCH_ENDPOINT: &str = "https://api.bilibili.com/x/web-interface/search/type";
const PAGE_LIST_ENDPOINT: &str = "https://api.bilibili.com/x/player/pagelist";
const COMMENT_ENDPOINT: &str = "https://api.bilibili.com/x/v1/dm/list.so";

/// Status Bilibili answers with when it decides the caller is a bot.
pub const BLOCKED_STATUS: u16 = 412;

#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    pub code: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
    pub data: Option<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchData {
    #[serde(default, deserialize_with = "null_as_default")]
    pub result: Vec<SearchItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchItem {
    #[serde(default, deserialize_with = "null_as_default")]
    pub bvid: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_count")]
    pub play: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub video_review: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PageEntry {
    #[serde(default, deserialize_with = "null_as_default")]
    pub cid: u64,
}

/// Fields the API sends as `null` instead of leaving them out.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Counters arrive as numbers, numeric strings, or placeholders like "--".
fn lenient_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_u64().unwrap_or(0),
        serde_json::Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    })
}

fn highlight_markup() -> &'static Regex {
    static MARKUP: OnceLock<Regex> = OnceLock::new();
    MARKUP.get_or_init(|| Regex::new(r"</?em[^>]*>").expect("highlight pattern is valid"))
}

/// Search titles wrap matched keywords in `<em class="keyword">`.
pub fn clean_title(raw: &str) -> String {
    highlight_markup().replace_all(raw, "").trim().to_string()
}

impl From<SearchItem> for SearchResult {
    fn from(item: SearchItem) -> Self {
        Self {
            video_id: item.bvid,
            title: clean_title(&item.title),
            view_count: item.play,
            comment_count: item.video_review,
        }
    }
}

fn invalid_response(what: &str, err: serde_json::Error) -> CoreError {
    CoreError::BiliApi(BiliApiError::InvalidResponse {
        details: format!("{}: {}", what, err),
    })
}

/// Decode one search page. An empty `result` list is a valid last page.
pub fn parse_search_payload(body: &str) -> Result<Vec<SearchResult>, CoreError> {
    let envelope: ApiEnvelope<SearchData> =
        serde_json::from_str(body).map_err(|e| invalid_response("search payload", e))?;

    if envelope.code != 0 {
        return Err(CoreError::BiliApi(BiliApiError::ApiCode {
            code: envelope.code,
            message: envelope.message,
        }));
    }

    Ok(envelope
        .data
        .map(|data| data.result)
        .unwrap_or_default()
        .into_iter()
        .filter(|item| !item.bvid.is_empty())
        .map(SearchResult::from)
        .collect())
}

/// Decode the page list of a video; the first page carries its stream id.
pub fn parse_page_list(body: &str) -> Result<Option<StreamId>, CoreError> {
    let envelope: ApiEnvelope<Vec<PageEntry>> =
        serde_json::from_str(body).map_err(|e| invalid_response("page list", e))?;

    if envelope.code != 0 {
        return Err(CoreError::BiliApi(BiliApiError::ApiCode {
            code: envelope.code,
            message: envelope.message,
        }));
    }

    Ok(envelope
        .data
        .and_then(|pages| pages.into_iter().next())
        .and_then(|page| StreamId::from_raw(page.cid)))
}

/// Search page URL a browser would be on while issuing the search call.
pub fn search_referer(keyword: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(keyword.as_bytes()).collect();
    format!("{}/search?keyword={}", BILIBILI_HOME, encoded)
}

#[derive(Debug, Clone)]
pub struct Endpoints {
    pub home: String,
    pub search: String,
    pub page_list: String,
    pub comments: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            home: BILIBILI_HOME.to_string(),
            search: SEARCH_ENDPOINT.to_string(),
            page_list: PAGE_LIST_ENDPOINT.to_string(),
            comments: COMMENT_ENDPOINT.to_string(),
        }
    }
}

fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json, text/plain, */*"));
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static("zh-CN,zh;q=0.9,en;q=0.8,en-GB;q=0.7,en-US;q=0.6"),
    );
    headers.insert(ORIGIN, HeaderValue::from_static(BILIBILI_HOME));
    headers.insert(REFERER, HeaderValue::from_static("https://www.bilibili.com/"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert("sec-fetch-dest", HeaderValue::from_static("empty"));
    headers.insert("sec-fetch-mode", HeaderValue::from_static("cors"));
    headers.insert("sec-fetch-site", HeaderValue::from_static("same-site"));
    headers
}

#[derive(Debug)]
pub struct BiliApiClient {
    http_client: Client,
    endpoints: Endpoints,
    user_agent: String,
}

impl BiliApiClient {
    pub fn new(settings: &CrawlSettings) -> Result<Self, CoreError> {
        Self::with_endpoints(settings, Endpoints::default())
    }

    pub fn with_endpoints(
        settings: &CrawlSettings,
        endpoints: Endpoints,
    ) -> Result<Self, CoreError> {
        let http_client = Client::builder()
            .user_agent(&settings.user_agent)
            .default_headers(default_headers())
            .cookie_store(true)
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()?;

        Ok(Self {
            http_client,
            endpoints,
            user_agent: settings.user_agent.clone(),
        })
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Visit the home page once so the cookie store holds the session
    /// cookies the API expects. Failure is logged and ignored.
    pub async fn init_session(&self) {
        info!("Initializing session against {}", self.endpoints.home);
        match self.http_client.get(&self.endpoints.home).send().await {
            Ok(response) if response.status().is_success() => {
                info!("Session initialized");
            }
            Ok(response) => {
                warn!("Session warm-up returned status {}", response.status());
            }
            Err(e) => {
                warn!("Session warm-up failed: {}", e);
            }
        }
    }

    async fn get_text(
        &self,
        url: &str,
        query: &[(&str, String)],
        referer: Option<&str>,
    ) -> Result<String, CoreError> {
        let mut request_builder = self.http_client.get(url).query(query);
        if let Some(referer) = referer {
            request_builder = request_builder.header(REFERER, referer);
        }

        debug!("GET {} {:?}", url, query);
        let response = request_builder.send().await.map_err(|e| {
            error!("Network error for {}: {}", url, e);
            if e.is_timeout() {
                CoreError::BiliApi(BiliApiError::RequestTimeout)
            } else {
                CoreError::Network(e)
            }
        })?;

        let status = response.status();
        if status.as_u16() == BLOCKED_STATUS {
            return Err(CoreError::BiliApi(BiliApiError::Blocked {
                status_code: status.as_u16(),
                endpoint: url.to_string(),
            }));
        }
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            warn!(
                "Request to {} failed with status {}: {}",
                url,
                status,
                body.chars().take(200).collect::<String>()
            );
            return Err(CoreError::BiliApi(BiliApiError::HttpStatus {
                status_code: status.as_u16(),
                endpoint: url.to_string(),
            }));
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Err(CoreError::BiliApi(BiliApiError::EmptyResponse {
                endpoint: url.to_string(),
            }));
        }
        Ok(body)
    }
}

#[async_trait]
impl VideoSource for BiliApiClient {
    async fn search_page(
        &self,
        keyword: &str,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<SearchResult>, CoreError> {
        let query = [
            ("search_type", "video".to_string()),
            ("keyword", keyword.to_string()),
            ("page", page.to_string()),
            ("pagesize", page_size.to_string()),
            ("order", "totalrank".to_string()),
        ];
        let referer = search_referer(keyword);
        let body = self
            .get_text(&self.endpoints.search, &query, Some(&referer))
            .await?;

        parse_search_payload(&body).map_err(|e| {
            debug!(
                "Search response head: {}",
                body.chars().take(500).collect::<String>()
            );
            e
        })
    }

    async fn stream_id(&self, video_id: &str) -> Result<Option<StreamId>, CoreError> {
        let query = [("bvid", video_id.to_string())];
        let body = self.get_text(&self.endpoints.page_list, &query, None).await?;
        parse_page_list(&body)
    }

    async fn comment_document(&self, stream_id: StreamId) -> Result<String, CoreError> {
        let query = [("oid", stream_id.to_string())];
        self.get_text(&self.endpoints.comments, &query, None).await
    }

    async fn warm_up(&self) {
        self.init_session().await;
    }
}
