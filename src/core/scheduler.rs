use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use indicatif::ProgressBar;
use tokio::io::AsyncWriteExt;
use tokio::sync::{watch, Mutex, Semaphore};
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep, Instant};

use crate::core::aggregator::SampleSet;
use crate::core::capability::RequestMaker;
use crate::models::run_config::RunConfig;

/// 每个worker的发压节奏
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimingPolicy {
    /// 上一次请求完成后再等一个周期, 服务端变慢时自然降速
    FixedDelay,
    /// 按固定节拍触发, 错过的节拍立刻补发, 考验服务端能否扛住指定到达率
    FixedRate,
}

impl TimingPolicy {
    pub fn label(&self) -> &'static str {
        match self {
            TimingPolicy::FixedDelay => "delay-rate",
            TimingPolicy::FixedRate => "fixed-rate",
        }
    }
}

/// 所有worker共享的结果文件句柄, 单行写入靠锁串行化
pub type SharedWriter = Arc<Mutex<tokio::fs::File>>;

/// 速率调度器: 启动number_of_clients个逻辑客户端,
/// 在同一个时限内按所选节奏发压, 到点后两段式停止
pub struct RateScheduler {
    policy: TimingPolicy,
    show_progress: bool,
}

impl RateScheduler {
    pub fn new(policy: TimingPolicy) -> Self {
        RateScheduler {
            policy,
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, on: bool) -> Self {
        self.show_progress = on;
        self
    }

    /// 驱动一轮压测。任何一次请求失败都会拉停所有worker并让整轮失败。
    pub async fn drive(
        &self,
        config: &RunConfig,
        maker: Arc<dyn RequestMaker>,
        samples: Arc<SampleSet>,
        writer: Option<SharedWriter>,
    ) -> anyhow::Result<()> {
        let period = config.period();
        // 时限只算一次, 所有worker读同一个值
        let deadline = Instant::now() + config.test_duration;
        // 执行位上限: 逻辑客户端多于执行位时共享执行位轮转
        let permits = Arc::new(Semaphore::new(config.pool_size()));
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let stop_tx = Arc::new(stop_tx);

        let mut handles: Vec<JoinHandle<anyhow::Result<()>>> = Vec::new();
        for _ in 0..config.number_of_clients {
            let worker = ClientWorker {
                maker: maker.clone(),
                samples: samples.clone(),
                writer: writer.clone(),
                permits: permits.clone(),
                stop_tx: stop_tx.clone(),
                deadline,
                period,
            };
            let handle = match self.policy {
                TimingPolicy::FixedDelay => tokio::spawn(worker.run_fixed_delay()),
                TimingPolicy::FixedRate => tokio::spawn(worker.run_fixed_rate()),
            };
            handles.push(handle);
        }

        self.wait_out(config.test_duration, deadline, &mut stop_rx)
            .await;
        // 第一阶段: 取消后续tick, 在途请求不受影响。重复发送无副作用
        let _ = stop_tx.send(true);
        // 第二阶段: 等所有worker join, 在途请求收尾; 没有在途请求的worker直接退出
        let mut first_err = None;
        for outcome in futures::future::join_all(handles).await {
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    first_err.get_or_insert(e);
                }
                Err(e) => {
                    first_err.get_or_insert(anyhow::Error::new(e).context("worker任务异常退出"));
                }
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// 睡满整个压测时长; 有worker报错提前拉停时立即醒来
    async fn wait_out(
        &self,
        test_duration: Duration,
        deadline: Instant,
        stop_rx: &mut watch::Receiver<bool>,
    ) {
        if !self.show_progress {
            tokio::select! {
                _ = sleep(test_duration) => {}
                _ = stop_rx.changed() => {}
            }
            return;
        }
        let pb = ProgressBar::new(100);
        let mut ticker = interval(Duration::from_millis(300));
        while Instant::now() < deadline && !*stop_rx.borrow() {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = stop_rx.changed() => break,
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            let done = 100.0 - remaining.as_secs_f64() / test_duration.as_secs_f64() * 100.0;
            pb.set_position(done as u64);
        }
        pb.finish_and_clear();
    }
}

/// 一个逻辑客户端: 串行发起请求, 同一客户端绝不会有两个在途请求
struct ClientWorker {
    maker: Arc<dyn RequestMaker>,
    samples: Arc<SampleSet>,
    writer: Option<SharedWriter>,
    permits: Arc<Semaphore>,
    stop_tx: Arc<watch::Sender<bool>>,
    deadline: Instant,
    period: Duration,
}

impl ClientWorker {
    async fn run_fixed_delay(self) -> anyhow::Result<()> {
        let mut stop_rx = self.stop_tx.subscribe();
        loop {
            if *stop_rx.borrow() {
                return Ok(());
            }
            if let Err(e) = self.attempt().await {
                // 单次失败拉停整轮
                let _ = self.stop_tx.send(true);
                return Err(e);
            }
            // 下一个tick从本次完成时刻起算一个周期
            tokio::select! {
                _ = sleep(self.period) => {}
                _ = stop_rx.changed() => return Ok(()),
            }
        }
    }

    async fn run_fixed_rate(self) -> anyhow::Result<()> {
        let mut stop_rx = self.stop_tx.subscribe();
        // 默认Burst行为: 请求拖过周期时, 错过的tick立即连发
        let mut ticker = interval(self.period);
        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = stop_rx.changed() => return Ok(()),
            }
            if *stop_rx.borrow() {
                return Ok(());
            }
            if let Err(e) = self.attempt().await {
                let _ = self.stop_tx.send(true);
                return Err(e);
            }
        }
    }

    /// 单次请求。发起前过了时限就什么都不做;
    /// 完成晚于时限的样本不计入统计, 只体现在墙钟成本里
    async fn attempt(&self) -> anyhow::Result<()> {
        if Instant::now() > self.deadline {
            return Ok(());
        }
        let _slot = self.permits.acquire().await.context("获取执行位失败")?;
        // 排队等执行位期间可能已过时限, 拿到后再查一次才算真正发起
        if Instant::now() > self.deadline {
            return Ok(());
        }
        let latency = self
            .maker
            .make_request()
            .await
            .context("请求失败, 终止本轮压测")?;
        if Instant::now() <= self.deadline {
            self.samples.push(latency);
            if let Some(writer) = &self.writer {
                let line = format!("{}\n", latency.as_millis());
                writer
                    .lock()
                    .await
                    .write_all(line.as_bytes())
                    .await
                    .context("写入延迟样本失败")?;
            }
        }
        Ok(())
    }
}
