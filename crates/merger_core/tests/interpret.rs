use merger_core::{interpret, Phase, RemoteStatus, UiStep};

fn status(json: &str) -> RemoteStatus {
    serde_json::from_str(json).expect("valid status payload")
}

#[test]
fn extracting_and_starting_share_a_fixed_percent() {
    for phase in ["starting", "extracting"] {
        let snapshot = interpret(&RemoteStatus::new(phase), 3).unwrap();
        assert_eq!(snapshot.percent, 30);
        assert_eq!(snapshot.ui_step, UiStep::Process);
    }
}

#[test]
fn converting_without_percent_uses_default_and_payload_counters() {
    let snapshot = interpret(
        &status(r#"{"status":"converting","converted":1,"total_files":3}"#),
        9,
    )
    .unwrap();
    assert_eq!(snapshot.percent, 35);
    assert!(snapshot.message.contains("1/3"), "{}", snapshot.message);
}

#[test]
fn converting_reported_percent_wins_and_expected_count_fills_total() {
    let snapshot = interpret(
        &status(r#"{"status":"converting","progress_percent":47.6,"converted":2}"#),
        5,
    )
    .unwrap();
    assert_eq!(snapshot.percent, 48);
    assert!(snapshot.message.contains("2/5"), "{}", snapshot.message);
}

#[test]
fn counters_are_omitted_when_no_total_is_known() {
    let snapshot = interpret(&RemoteStatus::new("converting"), 0).unwrap();
    assert_eq!(snapshot.message, "Converting files...");
}

#[test]
fn zero_total_in_payload_falls_back_to_expected_count() {
    let snapshot = interpret(
        &status(r#"{"status":"converting","converted":1,"total_files":0}"#),
        3,
    )
    .unwrap();
    assert_eq!(snapshot.message, "Converting files (1/3)...");
}

#[test]
fn processing_derives_percent_from_counters() {
    let snapshot = interpret(
        &status(r#"{"status":"processing","processed":2,"total":4}"#),
        4,
    )
    .unwrap();
    assert_eq!(snapshot.percent, 60);
    assert!(snapshot.message.contains("2/4"));
}

#[test]
fn processing_falls_back_to_fifty_without_counters() {
    let snapshot = interpret(&status(r#"{"status":"processing","processed":2}"#), 4).unwrap();
    assert_eq!(snapshot.percent, 50);

    let zero_total = interpret(
        &status(r#"{"status":"processing","processed":0,"total":0}"#),
        4,
    )
    .unwrap();
    assert_eq!(zero_total.percent, 50);
}

#[test]
fn processing_percent_is_clamped_for_malformed_counters() {
    let snapshot = interpret(
        &status(r#"{"status":"processing","processed":30,"total":2}"#),
        2,
    )
    .unwrap();
    assert_eq!(snapshot.percent, 100);

    let reported = interpret(
        &status(r#"{"status":"processing","progress_percent":250}"#),
        2,
    )
    .unwrap();
    assert_eq!(reported.percent, 100);
}

#[test]
fn late_phases_have_fixed_percents() {
    let expected = [
        ("merging_complete", 80, UiStep::Process),
        ("converting_to_pdf", 85, UiStep::Process),
        ("pdf_conversion_complete", 95, UiStep::Process),
        ("complete", 100, UiStep::Complete),
    ];
    for (phase, percent, step) in expected {
        let snapshot = interpret(&RemoteStatus::new(phase), 1).unwrap();
        assert_eq!((snapshot.percent, snapshot.ui_step), (percent, step), "{phase}");
    }
}

#[test]
fn error_phase_reports_zero_with_message() {
    let snapshot = interpret(&status(r#"{"status":"error","error":"bad zip"}"#), 1).unwrap();
    assert_eq!(snapshot.percent, 0);
    assert_eq!(snapshot.ui_step, UiStep::Error);
    assert_eq!(snapshot.message, "bad zip");
}

#[test]
fn unrecognized_phase_yields_nothing() {
    let payload = status(r#"{"status":"defragmenting","progress_percent":10}"#);
    assert_eq!(payload.phase, Phase::Unrecognized("defragmenting".to_string()));
    assert_eq!(interpret(&payload, 1), None);
}

#[test]
fn interpret_is_pure() {
    let payload = status(r#"{"status":"processing","processed":3,"total":7,"extra":"ignored"}"#);
    assert_eq!(interpret(&payload, 7), interpret(&payload, 7));
}

#[test]
fn well_formed_sequence_is_non_decreasing_and_ends_at_100() {
    let sequence = [
        r#"{"status":"starting"}"#,
        r#"{"status":"extracting"}"#,
        r#"{"status":"converting","converted":1,"total_files":3}"#,
        r#"{"status":"converting","progress_percent":38,"converted":2,"total_files":3}"#,
        r#"{"status":"processing","processed":0,"total":3}"#,
        r#"{"status":"processing","processed":2,"total":3}"#,
        r#"{"status":"processing","processed":3,"total":3}"#,
        r#"{"status":"merging_complete"}"#,
        r#"{"status":"converting_to_pdf"}"#,
        r#"{"status":"pdf_conversion_complete"}"#,
        r#"{"status":"complete","processed_files":3,"failed_files":0}"#,
    ];
    let percents: Vec<u8> = sequence
        .iter()
        .map(|raw| interpret(&status(raw), 3).unwrap().percent)
        .collect();

    assert!(percents.windows(2).all(|pair| pair[0] <= pair[1]), "{percents:?}");
    assert_eq!(percents.last(), Some(&100));
}
