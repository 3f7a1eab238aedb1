use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tokio::io::AsyncWriteExt;

use crate::core::aggregator::ResultsAggregator;
use crate::core::baseline::BaselineMeasurement;
use crate::core::capability::{CpuSensor, EnergySensor, RequestMaker, ServerProcess};
use crate::core::output;
use crate::core::report;
use crate::core::scheduler::{RateScheduler, TimingPolicy};
use crate::core::sleep_guard::KeepAwake;
use crate::models::result::Results;
use crate::models::run_config::RunConfig;

/// 按被测进程构造一个新的请求器, 每轮压测都重新构造
pub type MakerFactory =
    Box<dyn Fn(&dyn ServerProcess) -> anyhow::Result<Arc<dyn RequestMaker>> + Send + Sync>;

/// 压测编排器: 管理基线、进程生命周期、调度器和统计器,
/// 保证所有退出路径都停进程、关文件
pub struct Benchmark {
    variations: Vec<Box<dyn ServerProcess>>,
    database: Option<Box<dyn ServerProcess>>,
    maker_factory: MakerFactory,
    cpu: Box<dyn CpuSensor>,
    energy: Arc<dyn EnergySensor>,
    baseline: BaselineMeasurement,
    policy: TimingPolicy,
    write_results: bool,
    show_progress: bool,
    prevent_sleep: bool,
    base_folder: PathBuf,
}

impl Benchmark {
    pub fn new(
        policy: TimingPolicy,
        energy: Arc<dyn EnergySensor>,
        cpu: Box<dyn CpuSensor>,
        baseline: BaselineMeasurement,
        maker_factory: MakerFactory,
    ) -> Self {
        Benchmark {
            variations: Vec::new(),
            database: None,
            maker_factory,
            cpu,
            energy,
            baseline,
            policy,
            write_results: false,
            show_progress: false,
            prevent_sleep: false,
            base_folder: output::base_folder(policy.label()),
        }
    }

    pub fn register(mut self, process: Box<dyn ServerProcess>) -> Self {
        self.variations.push(process);
        self
    }

    pub fn with_database(mut self, process: Box<dyn ServerProcess>) -> Self {
        self.database = Some(process);
        self
    }

    pub fn write_results(mut self, on: bool) -> Self {
        self.write_results = on;
        self
    }

    pub fn show_progress(mut self, on: bool) -> Self {
        self.show_progress = on;
        self
    }

    pub fn prevent_sleep(mut self, on: bool) -> Self {
        self.prevent_sleep = on;
        self
    }

    pub fn base_folder(mut self, folder: PathBuf) -> Self {
        self.base_folder = folder;
        self
    }

    /// 跑一个场景, 目标按名字在已注册的进程里找
    pub async fn run(&mut self, config: &RunConfig) -> anyhow::Result<Results> {
        let idx = self
            .variations
            .iter()
            .position(|p| p.name() == config.target_name)
            .with_context(|| format!("未注册的目标: {}", config.target_name))?;
        self.run_process(idx, config).await
    }

    async fn run_process(&mut self, idx: usize, config: &RunConfig) -> anyhow::Result<Results> {
        let baseline = self.baseline.measure(self.energy.as_ref()).await?;
        let _keep_awake = KeepAwake::new(self.prevent_sleep);
        let process = &self.variations[idx];
        println!(
            "开始压测 {}: {}个客户端, 每秒{:.2}请求, 持续{}秒, 预期请求数{:.2}",
            process.name(),
            config.number_of_clients,
            config.requests_per_second,
            config.test_duration.as_secs(),
            config.expected_requests()
        );
        // raii guard保证任何退出路径都停掉两个进程
        let _database_guard = match &self.database {
            Some(db) => Some(db.start().context("启动数据库进程失败")?),
            None => None,
        };
        let _process_guard = process
            .start()
            .with_context(|| format!("启动目标进程失败: {}", process.name()))?;
        let writer = if self.write_results {
            Some(output::open_sample_writer(&self.base_folder, config).await?)
        } else {
            None
        };
        let maker = (self.maker_factory)(process.as_ref())?;
        let aggregator = ResultsAggregator::begin(process.name(), maker.as_ref(), self.cpu.as_ref())?;
        let samples = aggregator.samples();

        let scheduler = RateScheduler::new(self.policy).with_progress(self.show_progress);
        let drive_result = scheduler
            .drive(config, maker.clone(), samples, writer.clone())
            .await;

        // 成功失败都先落盘; 压测本身失败时不让flush错误盖掉原始错误
        if let Some(writer) = &writer {
            let flushed = writer.lock().await.flush().await;
            if drive_result.is_ok() {
                flushed.context("刷新结果文件失败")?;
            }
        }
        drive_result?;

        let results = aggregator
            .finish(maker.as_ref(), self.cpu.as_ref())?
            .subtract_baseline(&baseline);
        println!("完成 {}: {}", config.target_name, results);
        Ok(results)
    }

    /// 批量场景, 严格串行: 每个场景独占全部执行位和资源预算。
    /// 任何场景失败都中止整个批次, 不跳过
    pub async fn run_all(
        &mut self,
        scenarios: &[RunConfig],
    ) -> anyhow::Result<HashMap<String, Results>> {
        self.baseline.measure(self.energy.as_ref()).await?;
        let mut all = HashMap::new();
        for config in scenarios {
            let results = self.run(config).await?;
            all.insert(results.name.clone(), results);
        }
        Ok(all)
    }

    /// 批量场景加汇总报告, 报告按执行顺序排列
    pub async fn run_all_write_results(
        &mut self,
        scenarios: &[RunConfig],
    ) -> anyhow::Result<String> {
        let mut ordered = Vec::new();
        for config in scenarios {
            ordered.push(self.run(config).await?);
        }
        let report = report::combined_report(&ordered);
        if self.write_results {
            tokio::fs::create_dir_all(&self.base_folder)
                .await
                .with_context(|| format!("创建结果目录失败: {}", self.base_folder.display()))?;
            tokio::fs::write(self.base_folder.join("report.txt"), &report)
                .await
                .context("写入汇总报告失败")?;
        }
        Ok(report)
    }
}
