//! Gemini API 공통 모듈
//!
//! 임베딩과 답변 생성이 공유하는 API 키 로드, Rate Limiter,
//! 429/네트워크 오류 재시도 로직을 제공합니다.
//!
//! source: https://ai.google.dev/gemini-api/docs

use std::time::{Duration, Instant};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::sync::Mutex;

/// Gemini API 기본 URL
pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// 호출 간 최소 딜레이 (1000ms = 60 RPM 준수)
const MIN_DELAY_MS: u64 = 1000;
/// 429 에러 시 최대 재시도 횟수
const MAX_RETRIES: u32 = 3;
/// 재시도 시 초기 백오프 (ms)
const INITIAL_BACKOFF_MS: u64 = 2000;
/// Rate limit 윈도우
const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(60);

// ============================================================================
// Errors
// ============================================================================

/// Gemini API 호출 오류
#[derive(Debug, thiserror::Error)]
pub enum GeminiError {
    /// 429 - 재시도 후에도 실패
    #[error("Rate limit exceeded (429) after {0} retries")]
    RateLimited(u32),

    /// API가 오류 응답 반환
    #[error("Gemini API error ({status}): {message}")]
    Api { status: String, message: String },

    /// 네트워크 오류
    #[error("Failed to send request: {0}")]
    Transport(#[from] reqwest::Error),

    /// 응답 파싱 실패
    #[error("Failed to parse response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Gemini API 에러 응답
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
    #[serde(default)]
    status: String,
}

// ============================================================================
// Rate Limiter
// ============================================================================

/// Rate Limiter with minimum delay between requests
#[derive(Debug)]
pub struct RateLimiter {
    requests: Vec<Instant>,
    max_requests: u32,
    window: Duration,
    min_delay: Duration,
    last_request: Option<Instant>,
}

impl RateLimiter {
    /// 분당 요청 수로 생성
    pub fn per_minute(max_requests: u32) -> Self {
        Self::new(max_requests, RATE_LIMIT_WINDOW, Duration::from_millis(MIN_DELAY_MS))
    }

    pub fn new(max_requests: u32, window: Duration, min_delay: Duration) -> Self {
        Self {
            requests: Vec::new(),
            max_requests,
            window,
            min_delay,
            last_request: None,
        }
    }

    /// 요청 가능 여부 확인 및 대기
    pub async fn acquire(&mut self) {
        // 1. 최소 딜레이 적용 (버스트 방지)
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < self.min_delay {
                let wait_time = self.min_delay - elapsed;
                tracing::debug!("Min delay: waiting {:?}", wait_time);
                tokio::time::sleep(wait_time).await;
            }
        }

        let now = Instant::now();

        // 2. 윈도우 밖의 오래된 요청 제거
        self.requests.retain(|&t| now.duration_since(t) < self.window);

        // 3. Rate limit 초과 시 대기
        if self.requests.len() >= self.max_requests as usize {
            if let Some(&oldest) = self.requests.first() {
                let wait_time = self.window.saturating_sub(now.duration_since(oldest));
                if !wait_time.is_zero() {
                    tracing::debug!("Rate limit reached, waiting {:?}", wait_time);
                    tokio::time::sleep(wait_time).await;
                }
                let now = Instant::now();
                self.requests.retain(|&t| now.duration_since(t) < self.window);
            }
        }

        // 4. 현재 요청 기록
        let now = Instant::now();
        self.requests.push(now);
        self.last_request = Some(now);
    }

    /// 윈도우 내 요청 수
    pub fn in_flight(&self) -> usize {
        self.requests.len()
    }
}

// ============================================================================
// Client
// ============================================================================

/// Gemini REST 호출기 (재시도 + Rate limit 포함)
#[derive(Debug)]
pub struct GeminiClient {
    api_key: String,
    client: reqwest::Client,
    rate_limiter: Mutex<RateLimiter>,
}

impl GeminiClient {
    /// 타임아웃과 분당 요청 수로 생성
    pub fn new(api_key: String, timeout: Duration, requests_per_minute: u32) -> anyhow::Result<Self> {
        use anyhow::Context;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            api_key,
            client,
            rate_limiter: Mutex::new(RateLimiter::per_minute(requests_per_minute)),
        })
    }

    /// `models/{model}:{method}` 엔드포인트로 POST
    ///
    /// 429와 네트워크 오류는 지수 백오프로 재시도하고, 그 외 오류는 즉시 반환합니다.
    pub async fn post<Req, Resp>(&self, model: &str, method: &str, body: &Req) -> Result<Resp, GeminiError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let url = endpoint(model, method);
        let mut last_error: Option<GeminiError> = None;

        for attempt in 0..=MAX_RETRIES {
            {
                let mut limiter = self.rate_limiter.lock().await;
                limiter.acquire().await;
            }

            // API 키는 URL이 아닌 헤더로 전송
            let response = match self
                .client
                .post(&url)
                .header("x-goog-api-key", &self.api_key)
                .json(body)
                .send()
                .await
            {
                Ok(resp) => resp,
                Err(e) => {
                    last_error = Some(GeminiError::Transport(e));
                    if attempt < MAX_RETRIES {
                        let backoff = backoff_for(attempt);
                        tracing::warn!(
                            "Request to {} failed, retrying in {:?} (attempt {}/{})",
                            method,
                            backoff,
                            attempt + 1,
                            MAX_RETRIES
                        );
                        tokio::time::sleep(backoff).await;
                        continue;
                    }
                    break;
                }
            };

            let status = response.status();
            let text = response.text().await?;

            if status.is_success() {
                return Ok(serde_json::from_str(&text)?);
            }

            if status.as_u16() == 429 {
                last_error = Some(GeminiError::RateLimited(MAX_RETRIES));
                if attempt < MAX_RETRIES {
                    let backoff = backoff_for(attempt);
                    tracing::warn!(
                        "Rate limit hit (429), backing off {:?} (attempt {}/{})",
                        backoff,
                        attempt + 1,
                        MAX_RETRIES
                    );
                    tokio::time::sleep(backoff).await;
                    continue;
                }
                break;
            }

            return Err(api_error(status, &text));
        }

        Err(last_error.unwrap_or(GeminiError::RateLimited(MAX_RETRIES)))
    }
}

fn endpoint(model: &str, method: &str) -> String {
    let model = model.strip_prefix("models/").unwrap_or(model);
    format!("{}/{}:{}", GEMINI_API_BASE, model, method)
}

fn backoff_for(attempt: u32) -> Duration {
    Duration::from_millis(INITIAL_BACKOFF_MS * 2u64.pow(attempt))
}

fn api_error(status: reqwest::StatusCode, body: &str) -> GeminiError {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => GeminiError::Api {
            status: if parsed.error.status.is_empty() {
                status.to_string()
            } else {
                parsed.error.status
            },
            message: parsed.error.message,
        },
        Err(_) => GeminiError::Api {
            status: status.to_string(),
            message: body.to_string(),
        },
    }
}

// ============================================================================
// API Key Management
// ============================================================================

/// API 키 로드 (환경변수에서)
///
/// 우선순위:
/// 1. `GEMINI_API_KEY` 환경변수
/// 2. `GOOGLE_AI_API_KEY` 환경변수
pub fn get_api_key() -> anyhow::Result<String> {
    for var in ["GEMINI_API_KEY", "GOOGLE_AI_API_KEY"] {
        if let Ok(key) = std::env::var(var) {
            if !key.is_empty() {
                tracing::debug!("Using API key from {}", var);
                return Ok(key);
            }
        }
    }

    anyhow::bail!(
        "API key not found. Set GEMINI_API_KEY or GOOGLE_AI_API_KEY environment variable.\n\
         Get your API key at: https://aistudio.google.com/app/apikey"
    )
}

/// API 키 존재 여부 확인
pub fn has_api_key() -> bool {
    ["GEMINI_API_KEY", "GOOGLE_AI_API_KEY"]
        .iter()
        .any(|var| std::env::var(var).map(|k| !k.is_empty()).unwrap_or(false))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_strips_models_prefix() {
        assert_eq!(
            endpoint("models/gemini-1.5-flash", "generateContent"),
            format!("{}/gemini-1.5-flash:generateContent", GEMINI_API_BASE)
        );
        assert_eq!(
            endpoint("gemini-embedding-001", "embedContent"),
            format!("{}/gemini-embedding-001:embedContent", GEMINI_API_BASE)
        );
    }

    #[test]
    fn test_backoff_doubles() {
        assert_eq!(backoff_for(0), Duration::from_millis(2000));
        assert_eq!(backoff_for(1), Duration::from_millis(4000));
        assert_eq!(backoff_for(2), Duration::from_millis(8000));
    }

    #[test]
    fn test_api_error_parses_body() {
        let body = r#"{"error":{"code":400,"message":"API key not valid","status":"INVALID_ARGUMENT"}}"#;
        let err = api_error(reqwest::StatusCode::BAD_REQUEST, body);
        assert_eq!(
            err.to_string(),
            "Gemini API error (INVALID_ARGUMENT): API key not valid"
        );

        let err = api_error(reqwest::StatusCode::BAD_GATEWAY, "upstream down");
        assert!(err.to_string().contains("upstream down"));
    }

    #[tokio::test]
    async fn test_rate_limiter_records_requests() {
        let mut limiter = RateLimiter::new(10, Duration::from_secs(60), Duration::ZERO);
        limiter.acquire().await;
        limiter.acquire().await;
        assert_eq!(limiter.in_flight(), 2);
    }

    #[tokio::test]
    async fn test_rate_limiter_drops_expired_requests() {
        let mut limiter = RateLimiter::new(1, Duration::from_millis(20), Duration::ZERO);
        limiter.acquire().await;
        limiter.acquire().await;
        assert_eq!(limiter.in_flight(), 1);
    }
}
