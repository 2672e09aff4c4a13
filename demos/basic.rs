// A basic example demonstrating how to use the gcplogs crate to write
// Cloud Logging JSON lines, directly and through tracing.
use std::io;

use gcplogs::{
    write_line, write_line_numeric_coercion, Config, Instant, LogLine, LogLineLayer, Severity,
    Timestamp, Tracer,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, Registry};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Replace with your actual GCP project ID
    let project_id = "your-gcp-project-id";
    let tracer = Tracer::new(project_id);
    let trace = tracer.trace_name("105445aa7843bc8bf206b120001000/0;o=1");

    // Lines built by hand, one per timestamp representation
    let mut stderr = io::stderr().lock();
    let now = Instant::now();
    let mut line = LogLine::new(Severity::Debug, "debug with timestamp struct field")
        .with_timestamp(Timestamp::structured(now));
    line.trace = trace.clone();
    write_line(&mut stderr, &line)?;

    line.severity = Severity::Info;
    line.message = "info with time unix.nanos float".into();
    line.timestamp = Some(Timestamp::time_unix_nanos(now));
    write_line_numeric_coercion(&mut stderr, &line)?;

    line.severity = Severity::Warning;
    line.message = "warning with timestampSeconds/timestampNanos".into();
    line.timestamp = Some(Timestamp::split(now));
    write_line(&mut stderr, &line)?;

    line.severity = Severity::Error;
    line.message = "error with time in RFC3339".into();
    line.timestamp = Some(Timestamp::time_rfc3339(now));
    write_line(&mut stderr, &line)?;
    drop(stderr);

    // The same lines through tracing
    let config = Config {
        project_id: Some(project_id.to_string()),
        ..Config::default()
    };
    let subscriber = Registry::default().with(LogLineLayer::new(config));
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Hello from gcplogs!");
    warn!(trace = "105445aa7843bc8bf206b120001000/0;o=1", example_key = 42, "This is a traced warning.");

    Ok(())
}
