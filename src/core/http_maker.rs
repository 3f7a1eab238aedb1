use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;

use crate::core::capability::{EnergySensor, RequestMaker};

/// 绑定单个目标url的http请求器, 能耗读数委托给传感器
pub struct HttpRequestMaker {
    client: Client,
    url: String,
    energy: Arc<dyn EnergySensor>,
}

impl HttpRequestMaker {
    pub fn new(url: &str, energy: Arc<dyn EnergySensor>) -> anyhow::Result<Self> {
        // user-agent带上系统信息
        let info = os_info::get();
        let user_agent = format!(
            "{} {} ({}; {})",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION"),
            info.os_type(),
            info.version()
        );
        let client = Client::builder()
            .user_agent(user_agent)
            .build()
            .context("构建http客户端失败")?;
        Ok(HttpRequestMaker {
            client,
            url: url.to_string(),
            energy,
        })
    }
}

#[async_trait]
impl RequestMaker for HttpRequestMaker {
    async fn make_request(&self) -> anyhow::Result<Duration> {
        let start = Instant::now();
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .context("发送请求失败")?;
        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("请求返回非成功状态码: {}", status);
        }
        // 读完响应体才算一次完整请求
        response.bytes().await.context("读取响应体失败")?;
        Ok(start.elapsed())
    }

    fn energy_micro_joules(&self) -> anyhow::Result<u64> {
        self.energy.energy_micro_joules()
    }
}
