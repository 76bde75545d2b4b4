use std::time::Duration;

use tracing::info;

/// 打印整个运行的耗时
pub fn display_elapsed_time(duration: Duration) {
    let total_ms = duration.as_millis();

    if total_ms >= 60_000 {
        let mins = total_ms / 60_000;
        let secs = (total_ms % 60_000) / 1000;
        info!("运行完成，耗时: {}分{}秒", mins, secs);
    } else if total_ms >= 1000 {
        info!("运行完成，耗时: {}.{:03}秒", total_ms / 1000, total_ms % 1000);
    } else {
        info!("运行完成，耗时: {}毫秒", total_ms);
    }
}
