use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;

use watt_bench_engine::core::baseline::BaselineMeasurement;
use watt_bench_engine::core::capability::{EnergySensor, RequestMaker};
use watt_bench_engine::core::execute::Benchmark;
use watt_bench_engine::core::http_maker::HttpRequestMaker;
use watt_bench_engine::core::process::NullServerProcess;
use watt_bench_engine::core::rapl::{ProcStatCpuSensor, RaplSensor};
use watt_bench_engine::core::scheduler::TimingPolicy;
use watt_bench_engine::core::show_result_with_table::show_result_with_table;
use watt_bench_engine::models::args::Args;
use watt_bench_engine::models::run_config::RunConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let policy = match args.policy.as_str() {
        "delay" => TimingPolicy::FixedDelay,
        "rate" => TimingPolicy::FixedRate,
        other => anyhow::bail!("未知的调度策略: {other}"),
    };
    let energy: Arc<dyn EnergySensor> = Arc::new(RaplSensor::new());
    let baseline = if args.no_baseline {
        BaselineMeasurement::disabled()
    } else {
        BaselineMeasurement::new(Duration::from_secs(args.baseline_secs))
    };
    let url = args.url.clone();
    let energy_for_maker = energy.clone();
    let mut bench = Benchmark::new(
        policy,
        energy,
        Box::new(ProcStatCpuSensor::new()),
        baseline,
        Box::new(move |_process| {
            let maker = HttpRequestMaker::new(&url, energy_for_maker.clone())?;
            Ok(Arc::new(maker) as Arc<dyn RequestMaker>)
        }),
    )
    .write_results(args.write_results)
    .show_progress(true)
    .prevent_sleep(args.prevent_sleep);

    if let Some(path) = args.scenarios {
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("读取场景文件失败: {path}"))?;
        let scenarios: Vec<RunConfig> = serde_json::from_str(&raw).context("解析场景文件失败")?;
        // 批量模式假定目标都在外部运行, 按名字注册占位进程
        let mut seen = HashSet::new();
        for config in &scenarios {
            if seen.insert(config.target_name.clone()) {
                bench = bench.register(Box::new(NullServerProcess::new(&config.target_name)));
            }
        }
        let report = bench.run_all_write_results(&scenarios).await?;
        println!("{report}");
    } else {
        bench = bench.register(Box::new(NullServerProcess::new(&args.name)));
        let config = RunConfig::new(
            &args.name,
            Duration::from_secs(args.duration_secs),
            args.clients,
            args.rate,
        );
        let results = bench.run(&config).await?;
        show_result_with_table(&results);
    }
    Ok(())
}
