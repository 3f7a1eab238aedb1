mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{FakeEnergySensor, FakeMaker};
use watt_bench_engine::core::aggregator::SampleSet;
use watt_bench_engine::core::scheduler::{RateScheduler, TimingPolicy};
use watt_bench_engine::models::run_config::RunConfig;

fn maker(latency_ms: u64) -> Arc<FakeMaker> {
    let energy = FakeEnergySensor::with_readings(&[0]);
    Arc::new(FakeMaker::new(Duration::from_millis(latency_ms), energy))
}

fn gaps_ms(starts: &[tokio::time::Instant]) -> Vec<u128> {
    starts
        .windows(2)
        .map(|pair| (pair[1] - pair[0]).as_millis())
        .collect()
}

#[tokio::test(start_paused = true)]
async fn fixed_delay_spaces_attempts_by_latency_plus_period() {
    // 单客户端, 延迟100ms, 周期250ms: 相邻发起间隔应为350ms
    let maker = maker(100);
    let samples = SampleSet::new();
    let config = RunConfig::new("echo", Duration::from_secs(3), 1, 4.0);
    RateScheduler::new(TimingPolicy::FixedDelay)
        .drive(&config, maker.clone(), samples.clone(), None)
        .await
        .unwrap();
    let starts = maker.starts.lock().clone();
    assert!(starts.len() >= 2, "发起次数太少: {}", starts.len());
    for gap in gaps_ms(&starts) {
        assert!((350..=360).contains(&gap), "间隔异常: {gap}ms");
    }
}

#[tokio::test(start_paused = true)]
async fn fixed_rate_spaces_attempts_by_period_when_fast() {
    // 延迟100ms小于周期250ms: 发起间隔就是周期
    let maker = maker(100);
    let samples = SampleSet::new();
    let config = RunConfig::new("echo", Duration::from_secs(3), 1, 4.0);
    RateScheduler::new(TimingPolicy::FixedRate)
        .drive(&config, maker.clone(), samples.clone(), None)
        .await
        .unwrap();
    let starts = maker.starts.lock().clone();
    assert!(starts.len() >= 2);
    for gap in gaps_ms(&starts) {
        assert!((250..=260).contains(&gap), "间隔异常: {gap}ms");
    }
}

#[tokio::test(start_paused = true)]
async fn fixed_rate_goes_back_to_back_when_slow() {
    // 延迟300ms超过周期250ms: 错过的tick立即补发, 间隔退化为延迟本身
    let maker = maker(300);
    let samples = SampleSet::new();
    let config = RunConfig::new("echo", Duration::from_secs(3), 1, 4.0);
    RateScheduler::new(TimingPolicy::FixedRate)
        .drive(&config, maker.clone(), samples.clone(), None)
        .await
        .unwrap();
    let starts = maker.starts.lock().clone();
    assert!(starts.len() >= 2);
    for gap in gaps_ms(&starts) {
        assert!((300..=310).contains(&gap), "间隔异常: {gap}ms");
    }
}

#[tokio::test(start_paused = true)]
async fn sample_completing_after_deadline_is_discarded() {
    // 请求在时限内发起但完成在时限外: 不计入样本
    let maker = maker(700);
    let samples = SampleSet::new();
    let config = RunConfig::new("echo", Duration::from_millis(500), 1, 2.0);
    RateScheduler::new(TimingPolicy::FixedDelay)
        .drive(&config, maker.clone(), samples.clone(), None)
        .await
        .unwrap();
    assert_eq!(maker.calls(), 1);
    assert_eq!(samples.len(), 0);
}

#[tokio::test(start_paused = true)]
async fn no_appends_after_shutdown_completes() {
    let maker = maker(10);
    let samples = SampleSet::new();
    let config = RunConfig::new("echo", Duration::from_secs(2), 2, 2.0);
    RateScheduler::new(TimingPolicy::FixedDelay)
        .drive(&config, maker.clone(), samples.clone(), None)
        .await
        .unwrap();
    let len_after_join = samples.len();
    assert!(len_after_join > 0);
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(samples.len(), len_after_join);
}

#[tokio::test(start_paused = true)]
async fn pool_cap_serializes_excess_clients() {
    // 4个客户端但执行位只有 min(4, 4×0.25)=1: 同一时刻最多一个在途请求
    let maker = maker(100);
    let samples = SampleSet::new();
    let config = RunConfig::new("echo", Duration::from_secs(1), 4, 0.25);
    assert_eq!(config.pool_size(), 1);
    RateScheduler::new(TimingPolicy::FixedDelay)
        .drive(&config, maker.clone(), samples.clone(), None)
        .await
        .unwrap();
    let starts = maker.starts.lock().clone();
    assert_eq!(starts.len(), 4);
    for gap in gaps_ms(&starts) {
        assert!(gap >= 100, "在途请求重叠: 间隔{gap}ms");
    }
    assert_eq!(samples.len(), 4);
}

#[tokio::test(start_paused = true)]
async fn contended_slot_does_not_issue_after_deadline() {
    // 2个客户端共享 min(2, 2×0.5)=1 个执行位, 延迟600ms, 时限500ms:
    // 排队的客户端拿到执行位时已过时限, 不允许再发起新请求
    let maker = maker(600);
    let samples = SampleSet::new();
    let config = RunConfig::new("echo", Duration::from_millis(500), 2, 0.5);
    assert_eq!(config.pool_size(), 1);
    RateScheduler::new(TimingPolicy::FixedDelay)
        .drive(&config, maker.clone(), samples.clone(), None)
        .await
        .unwrap();
    let starts = maker.starts.lock().clone();
    assert_eq!(starts.len(), 1, "时限后仍有新请求发起: {starts:?}");
    // 唯一一次请求完成于600ms, 晚于时限, 也不计入样本
    assert_eq!(samples.len(), 0);
}

#[tokio::test(start_paused = true)]
async fn single_request_failure_aborts_every_worker() {
    let energy = FakeEnergySensor::with_readings(&[0]);
    let maker =
        Arc::new(FakeMaker::new(Duration::from_millis(10), energy).failing_on(3));
    let samples = SampleSet::new();
    let config = RunConfig::new("echo", Duration::from_secs(5), 2, 2.0);
    let result = RateScheduler::new(TimingPolicy::FixedDelay)
        .drive(&config, maker.clone(), samples.clone(), None)
        .await;
    let err = result.unwrap_err();
    assert!(format!("{err:#}").contains("注定失败"), "错误没有透传: {err:#}");
    // 整轮提前中止, 远少于跑满5秒的请求量
    assert!(maker.calls() < 8, "失败后没有拉停: {}次调用", maker.calls());
}
