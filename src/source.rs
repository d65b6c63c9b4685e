use std::time::Duration;

use serde::Deserialize;

use crate::app::ShardSnapshot;
use crate::error::FetchError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InfoResponse {
    #[serde(default)]
    shard_infos: Vec<ShardSnapshot>,
}

// One request/response cycle against the node
pub trait SampleSource: Send + 'static {
    fn fetch(&self) -> Result<Vec<ShardSnapshot>, FetchError>;

    fn describe(&self) -> String;
}

pub fn decode_info(body: &str) -> Result<Vec<ShardSnapshot>, FetchError> {
    serde_json::from_str::<InfoResponse>(body)
        .map(|resp| resp.shard_infos)
        .map_err(|source| FetchError::Decode {
            body: body.to_string(),
            source,
        })
}

pub struct HttpSource {
    url: String,
    http: reqwest::blocking::Client,
}

impl HttpSource {
    pub fn new(url: String, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self { url, http })
    }
}

impl SampleSource for HttpSource {
    fn fetch(&self) -> Result<Vec<ShardSnapshot>, FetchError> {
        let transport = |source: reqwest::Error| FetchError::Transport {
            url: self.url.clone(),
            source,
        };

        let resp = self.http.get(&self.url).send().map_err(transport)?;
        let status = resp.status();
        let body = resp.text().map_err(transport)?;

        if !status.is_success() {
            return Err(FetchError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
                body,
            });
        }

        decode_info(&body)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}
