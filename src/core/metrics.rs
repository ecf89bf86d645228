//! 服务指标注册表
//!
//! 计数器和直方图以标签为键存放在 `DashMap` 中，按 Prometheus 文本格式输出。
//! 标签按键排序以保证输出顺序稳定，直方图桶以微秒为单位。

use dashmap::DashMap;
use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

type LabelKey = Vec<(String, String)>;

fn label_key(labels: &[(&str, &str)]) -> LabelKey {
    let mut key: LabelKey = labels
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    key.sort();
    key
}

fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

fn render_labels(key: &LabelKey) -> String {
    key.iter()
        .map(|(k, v)| format!("{}=\"{}\"", k, escape_label(v)))
        .collect::<Vec<_>>()
        .join(",")
}

/// 带标签的计数器
#[derive(Default)]
pub struct CounterVec {
    map: DashMap<LabelKey, AtomicU64>,
}

impl CounterVec {
    pub fn inc(&self, labels: &[(&str, &str)]) {
        self.map
            .entry(label_key(labels))
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(1, Ordering::Relaxed);
    }

    /// 读取某组标签的当前值，不存在时为 0
    pub fn get(&self, labels: &[(&str, &str)]) -> u64 {
        self.map
            .get(&label_key(labels))
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    fn render(&self, name: &str, help: &str, out: &mut String) {
        let _ = writeln!(out, "# HELP {} {}", name, help);
        let _ = writeln!(out, "# TYPE {} counter", name);
        for entry in self.map.iter() {
            let _ = writeln!(
                out,
                "{}{{{}}} {}",
                name,
                render_labels(entry.key()),
                entry.value().load(Ordering::Relaxed)
            );
        }
    }
}

// 100us, 500us, 1ms, 5ms, 10ms, 50ms, 100ms, 500ms, 1s
const BUCKETS_MICROS: [u64; 9] = [
    100, 500, 1_000, 5_000, 10_000, 50_000, 100_000, 500_000, 1_000_000,
];

#[derive(Default)]
struct AtomicHistogram {
    count: AtomicU64,
    sum: AtomicU64,
    buckets: [AtomicU64; 9],
}

/// 带标签的耗时直方图（微秒）
#[derive(Default)]
pub struct HistogramVec {
    map: DashMap<LabelKey, AtomicHistogram>,
}

impl HistogramVec {
    pub fn observe(&self, labels: &[(&str, &str)], duration: Duration) {
        let hist = self
            .map
            .entry(label_key(labels))
            .or_insert_with(AtomicHistogram::default);
        let micros = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);

        hist.count.fetch_add(1, Ordering::Relaxed);
        hist.sum.fetch_add(micros, Ordering::Relaxed);

        // 累积桶：所有上界不小于观测值的桶都加一
        for (i, &le) in BUCKETS_MICROS.iter().enumerate() {
            if micros <= le {
                hist.buckets[i].fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    fn render(&self, name: &str, help: &str, out: &mut String) {
        let _ = writeln!(out, "# HELP {} {}", name, help);
        let _ = writeln!(out, "# TYPE {} histogram", name);
        for entry in self.map.iter() {
            let labels = render_labels(entry.key());
            let hist = entry.value();
            let prefix = if labels.is_empty() {
                String::new()
            } else {
                format!("{},", labels)
            };

            for (i, &le) in BUCKETS_MICROS.iter().enumerate() {
                let _ = writeln!(
                    out,
                    "{}_bucket{{{}le=\"{}\"}} {}",
                    name,
                    prefix,
                    le,
                    hist.buckets[i].load(Ordering::Relaxed)
                );
            }
            let count = hist.count.load(Ordering::Relaxed);
            let _ = writeln!(out, "{}_bucket{{{}le=\"+Inf\"}} {}", name, prefix, count);
            let _ = writeln!(
                out,
                "{}_sum{{{}}} {}",
                name,
                labels,
                hist.sum.load(Ordering::Relaxed)
            );
            let _ = writeln!(out, "{}_count{{{}}} {}", name, labels, count);
        }
    }
}

/// 产品服务的全部指标
#[derive(Default)]
pub struct ServiceMetrics {
    pub requests: CounterVec,
    pub request_duration: HistogramVec,
    pub rate_limited: CounterVec,
}

impl ServiceMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一次完成的请求
    pub fn record_request(&self, method: &str, endpoint: &str, status: u16, elapsed: Duration) {
        let status = status.to_string();
        self.requests.inc(&[
            ("method", method),
            ("endpoint", endpoint),
            ("status", &status),
        ]);
        self.request_duration
            .observe(&[("method", method), ("endpoint", endpoint)], elapsed);
    }

    pub fn record_rate_limited(&self, endpoint: &str) {
        self.rate_limited.inc(&[("endpoint", endpoint)]);
    }

    /// 以 Prometheus 文本格式输出，`product_count` 为当前目录大小
    pub fn render(&self, product_count: usize) -> String {
        let mut out = String::new();
        self.requests.render(
            "product_service_requests_total",
            "Total requests",
            &mut out,
        );
        self.request_duration.render(
            "product_service_request_duration_micros",
            "Request latency in microseconds",
            &mut out,
        );
        self.rate_limited.render(
            "product_service_rate_limited_total",
            "Requests rejected by the rate limiter",
            &mut out,
        );
        let _ = writeln!(
            out,
            "# HELP product_service_products Products currently in the catalog"
        );
        let _ = writeln!(out, "# TYPE product_service_products gauge");
        let _ = writeln!(out, "product_service_products {}", product_count);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_labels_are_order_independent() {
        let counter = CounterVec::default();
        counter.inc(&[("method", "GET"), ("endpoint", "/products")]);
        counter.inc(&[("endpoint", "/products"), ("method", "GET")]);
        assert_eq!(
            counter.get(&[("method", "GET"), ("endpoint", "/products")]),
            2
        );
        assert_eq!(counter.get(&[("method", "POST")]), 0);
    }

    #[test]
    fn test_histogram_buckets_are_cumulative() {
        let metrics = ServiceMetrics::new();
        metrics.record_request("GET", "/health", 200, Duration::from_micros(700));

        let text = metrics.render(0);
        assert!(text.contains(
            "product_service_request_duration_micros_bucket{endpoint=\"/health\",method=\"GET\",le=\"500\"} 0"
        ));
        assert!(text.contains(
            "product_service_request_duration_micros_bucket{endpoint=\"/health\",method=\"GET\",le=\"1000\"} 1"
        ));
        assert!(text.contains(
            "product_service_request_duration_micros_bucket{endpoint=\"/health\",method=\"GET\",le=\"+Inf\"} 1"
        ));
    }

    #[test]
    fn test_render_includes_request_counter_and_gauge() {
        let metrics = ServiceMetrics::new();
        metrics.record_request("POST", "/products", 201, Duration::from_millis(1));
        metrics.record_rate_limited("/products");

        let text = metrics.render(7);
        assert!(text.contains(
            "product_service_requests_total{endpoint=\"/products\",method=\"POST\",status=\"201\"} 1"
        ));
        assert!(text.contains("product_service_rate_limited_total{endpoint=\"/products\"} 1"));
        assert!(text.contains("product_service_products 7"));
    }

    #[test]
    fn test_escape_label() {
        assert_eq!(escape_label("a\"b\\c\n"), "a\\\"b\\\\c\\n");
    }
}
