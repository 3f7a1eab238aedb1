use prettytable::{format, row, Table};

use crate::core::report::latency_stats;
use crate::models::result::Results;

pub fn show_result_with_table(results: &Results) {
    let stats = latency_stats(results);
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_NO_BORDER_LINE_SEPARATOR);

    table.add_row(row!["指标", "值"]);
    table.add_row(row!["场景", results.name.clone()]);
    table.add_row(row!["样本数", format!("{}", results.latencies.len())]);
    table.add_row(row!["实际RPS", format!("{:.3}", results.realized_rps())]);
    table.add_row(row!["中位延迟", format!("{} ms", stats.median)]);
    table.add_row(row!["95%延迟", format!("{} ms", stats.p95)]);
    table.add_row(row!["99%延迟", format!("{} ms", stats.p99)]);
    table.add_row(row!["最大延迟", format!("{} ms", stats.max)]);
    table.add_row(row!["最小延迟", format!("{} ms", stats.min)]);
    table.add_row(row![
        "净能耗",
        format!("{} µJ", results.total_energy_micro_joules)
    ]);
    table.add_row(row![
        "总时长",
        format!("{:.2} s", results.total_duration.as_secs_f64())
    ]);
    table.add_row(row!["CPU占用", format!("{:.2} %", results.cpu_delta * 100.0)]);
    println!("压测结果:");
    table.printstd();
}
