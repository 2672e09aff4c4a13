// End-to-end checks for LogLineLayer: events emitted through tracing must come
// out as Cloud Logging JSON lines on the configured writer.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use gcplogs::{Config, LogLineLayer, TimeFormat};
use serde_json::Value;
use tracing::{debug, error, info, trace, warn};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{layer::SubscriberExt, Registry};

/// In-memory sink shared between the layer and the test.
#[derive(Clone, Default)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    fn lines(&self) -> Vec<Value> {
        let bytes = self.0.lock().unwrap().clone();
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for SharedBuf {
    type Writer = SharedBuf;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn capture(config: Config, emit: impl FnOnce()) -> Vec<Value> {
    let buf = SharedBuf::default();
    let layer = LogLineLayer::new(config).with_writer(buf.clone());
    let subscriber = Registry::default().with(layer);
    tracing::subscriber::with_default(subscriber, emit);
    buf.lines()
}

#[test]
fn test_log_line_layer_basic() {
    let lines = capture(Config::default(), || {
        trace!("This is a trace log");
        debug!("This is a debug log");
        info!("This is an info log");
        warn!("This is a warning log");
        error!("This is an error log");
    });

    let severities: Vec<_> = lines.iter().map(|l| l["severity"].as_str().unwrap()).collect();
    assert_eq!(severities, ["DEBUG", "DEBUG", "INFO", "WARNING", "ERROR"]);
    assert_eq!(lines[2]["message"], "This is an info log");

    for line in &lines {
        let time = line["time"].as_str().expect("default format writes \"time\"");
        assert_eq!(time.len(), 30, "fixed-width RFC3339: {time}");
        assert!(time.ends_with('Z'));
        assert!(line.get("logging.googleapis.com/trace").is_none());
    }
}

#[test]
fn test_log_line_layer_trace_and_field() {
    let config = Config {
        project_id: Some("projectid".into()),
        time_format: TimeFormat::None,
        numeric_coercion: false,
    };
    let lines = capture(config, || {
        info!(trace = "traceid/spanid;o=1", example_key = 42, "message");
        info!(trace = "invalid", "no trace");
    });

    assert_eq!(
        lines[0],
        serde_json::json!({
            "severity": "INFO",
            "message": "message",
            "logging.googleapis.com/trace": "projects/projectid/traces/traceid",
            "logging.googleapis.com/spanId": "spanid",
            "example_key": 42,
        })
    );
    assert_eq!(lines[1], serde_json::json!({"severity": "INFO", "message": "no trace"}));
}

#[test]
fn test_log_line_layer_without_project_ignores_trace() {
    let config = Config {
        time_format: TimeFormat::None,
        ..Config::default()
    };
    let lines = capture(config, || warn!(trace = "traceid/spanid", "x"));
    assert_eq!(lines[0], serde_json::json!({"severity": "WARNING", "message": "x"}));
}

#[test]
fn test_log_line_layer_skips_reserved_field_names() {
    let lines = capture(
        Config {
            time_format: TimeFormat::TimestampSplit,
            ..Config::default()
        },
        || {
            error!(severity = 3, "disk");
            info!(timestampSeconds = 7, example_key = 42, "t");
        },
    );

    assert_eq!(lines[0]["severity"], "ERROR");
    // a duplicate key would win on parse and replace the values checked here
    let allowed = ["severity", "message", "timestampSeconds", "timestampNanos"];
    let first = lines[0].as_object().unwrap();
    assert!(first.keys().all(|k| allowed.contains(&k.as_str())), "{}", lines[0]);

    assert!(lines[1]["timestampSeconds"].as_i64().unwrap() > 1_500_000_000);
    assert_eq!(lines[1]["example_key"], 42);
}

#[test]
fn test_log_line_layer_time_formats() {
    let split = capture(
        Config {
            time_format: TimeFormat::TimestampSplit,
            ..Config::default()
        },
        || info!("split"),
    );
    assert!(split[0]["timestampSeconds"].as_i64().unwrap() > 1_500_000_000);
    assert!(split[0].get("time").is_none());

    let structured = capture(
        Config {
            time_format: TimeFormat::TimestampStruct,
            ..Config::default()
        },
        || info!("struct"),
    );
    assert!(structured[0]["timestamp"]["seconds"].as_i64().unwrap() > 1_500_000_000);

    let coerced = capture(
        Config {
            time_format: TimeFormat::TimeUnixNanos,
            numeric_coercion: true,
            ..Config::default()
        },
        || info!("float"),
    );
    assert!(coerced[0]["time"].is_f64(), "time must be a bare number: {}", coerced[0]);
}

#[test]
fn test_config_from_json() {
    let config = Config::from_json(
        r#"{"project_id":"p","time_format":"timestamp_split","numeric_coercion":true}"#,
    )
    .unwrap();
    assert_eq!(
        config,
        Config {
            project_id: Some("p".into()),
            time_format: TimeFormat::TimestampSplit,
            numeric_coercion: true,
        }
    );

    assert_eq!(Config::from_json("{}").unwrap(), Config::default());
    assert_eq!(Config::default().time_format, TimeFormat::Rfc3339Cached);
    assert!(Config::from_json(r#"{"time_format":"sundial"}"#).is_err());
}
