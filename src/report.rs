use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Time unit emitted by Google Benchmark for a single entry.
///
/// An unrecognized unit fails deserialization of the whole report, which
/// surfaces as a fatal parse error in the runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Ns,
    Us,
    Ms,
    S,
}

impl TimeUnit {
    /// Multiplier converting a value in this unit to milliseconds.
    pub fn to_ms_factor(self) -> f64 {
        match self {
            TimeUnit::Ns => 1e-6,
            TimeUnit::Us => 1e-3,
            TimeUnit::Ms => 1.0,
            TimeUnit::S => 1e3,
        }
    }
}

/// One named timing observation from the benchmark executable.
///
/// Names follow the `"<library> (<format>)"` convention; entries that do
/// not are dropped during normalization. Fields beyond the three we read
/// are kept verbatim so the persisted report stays complete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkRecord {
    pub name: String,
    pub real_time: f64,
    pub time_unit: TimeUnit,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Full report as emitted by `<executable> --benchmark_format=json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkReport {
    #[serde(default)]
    pub context: Map<String, Value>,
    #[serde(default)]
    pub benchmarks: Vec<BenchmarkRecord>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_typical_report() {
        let raw = r#"{
            "context": {
                "date": "2024-05-01T10:00:00",
                "host_name": "buildbox",
                "executable": "./fpcap_benchmark",
                "num_cpus": 16
            },
            "benchmarks": [
                {
                    "name": "fpcap (pcap)",
                    "run_type": "iteration",
                    "iterations": 100,
                    "real_time": 1.5,
                    "cpu_time": 1.4,
                    "time_unit": "ms"
                }
            ]
        }"#;

        let report: BenchmarkReport = serde_json::from_str(raw).unwrap();
        assert_eq!(report.benchmarks.len(), 1);
        let record = &report.benchmarks[0];
        assert_eq!(record.name, "fpcap (pcap)");
        assert_eq!(record.real_time, 1.5);
        assert_eq!(record.time_unit, TimeUnit::Ms);
        assert_eq!(record.extra["iterations"], 100);
        assert_eq!(report.context["num_cpus"], 16);
    }

    #[test]
    fn unknown_time_unit_is_a_parse_error() {
        let raw = r#"{
            "benchmarks": [
                {"name": "fpcap (pcap)", "real_time": 1.0, "time_unit": "fortnights"}
            ]
        }"#;
        assert!(serde_json::from_str::<BenchmarkReport>(raw).is_err());
    }

    #[test]
    fn reserializing_keeps_unknown_fields() {
        let raw = r#"{
            "context": {"num_cpus": 8},
            "benchmarks": [
                {"name": "libpcap (pcap)", "real_time": 2.0, "time_unit": "ms", "iterations": 50}
            ],
            "some_vendor_field": true
        }"#;

        let report: BenchmarkReport = serde_json::from_str(raw).unwrap();
        let round_tripped: Value = serde_json::from_str(&serde_json::to_string(&report).unwrap()).unwrap();
        assert_eq!(round_tripped["some_vendor_field"], true);
        assert_eq!(round_tripped["benchmarks"][0]["iterations"], 50);
    }

    #[test]
    fn unit_factors_are_exact() {
        assert_eq!(TimeUnit::Ns.to_ms_factor(), 1e-6);
        assert_eq!(TimeUnit::Us.to_ms_factor(), 1e-3);
        assert_eq!(TimeUnit::Ms.to_ms_factor(), 1.0);
        assert_eq!(TimeUnit::S.to_ms_factor(), 1e3);
    }
}
