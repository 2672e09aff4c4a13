// Trace header parsing and trace name composition.

use gcplogs::{TraceContext, Tracer};

#[test]
fn test_tracer_trace_name() {
    let tests = [
        ("", None),
        ("invalid", None),
        ("/0;o=1", None),
        (
            "105445aa7843bc8bf206b120001000/0;o=1",
            Some("projects/test_id/traces/105445aa7843bc8bf206b120001000"),
        ),
        ("traceid/spanid", Some("projects/test_id/traces/traceid")),
    ];

    let tracer = Tracer::new("test_id");
    let zero_tracer = Tracer::default();
    for (input, expected) in tests {
        assert_eq!(
            tracer.trace_name(input).as_deref(),
            expected,
            "trace_name({input:?})"
        );
        assert_eq!(
            zero_tracer.trace_name(input),
            None,
            "an empty project id must never produce a trace"
        );
    }
}

#[test]
fn test_trace_context_parse() {
    let context = TraceContext::parse("105445aa7843bc8bf206b120001000/123;o=1").unwrap();
    assert_eq!(context.trace_id, "105445aa7843bc8bf206b120001000");
    assert_eq!(context.span_id, Some("123"));
    assert!(context.sampled);

    let context = TraceContext::parse("abc/456;o=0").unwrap();
    assert_eq!(context.span_id, Some("456"));
    assert!(!context.sampled);

    let context = TraceContext::parse("abc/").unwrap();
    assert_eq!(context.trace_id, "abc");
    assert_eq!(context.span_id, None);
    assert!(!context.sampled);

    assert_eq!(TraceContext::parse("no-slash"), None);
}
