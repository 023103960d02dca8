use serde_json::json;
use zkcheckin::core::detector::{detect, initial_label};
use zkcheckin::core::normalizer::{normalize, positional_labels, sequence_labels};
use zkcheckin::models::label::Direction::{In, Out};
use zkcheckin::models::label::{Direction, Label};
use zkcheckin::models::punch::Punch;

mod common;
use common::{punch, raw, ts};

fn directions(punches: &[Punch]) -> Vec<Option<Direction>> {
    punches.iter().map(|p| p.direction()).collect()
}

#[test]
fn four_punches_alternate_in_input_order() {
    // input deliberately not chronological
    let mut punches = vec![
        punch("E1", "2025-06-01 13:30:00", Label::Unresolved),
        punch("E1", "2025-06-01 09:00:00", Label::Unresolved),
        punch("E1", "2025-06-01 18:00:00", Label::Unresolved),
        punch("E1", "2025-06-01 13:00:00", Label::Unresolved),
    ];

    let report = normalize(&mut punches);

    // 09:00 IN, 13:00 OUT, 13:30 IN, 18:00 OUT, reported at input positions
    assert_eq!(
        directions(&punches),
        vec![Some(In), Some(In), Some(Out), Some(Out)]
    );
    assert!(punches.iter().all(|p| p.sequence_adjusted()));
    assert_eq!(report.groups, 1);
    assert_eq!(report.adjusted, 4);
    assert_eq!(report.skipped, 0);
}

#[test]
fn three_punches_end_out_out() {
    let mut punches = vec![
        punch("E1", "2025-06-01 09:00:00", Label::Guessed(In)),
        punch("E1", "2025-06-01 12:00:00", Label::Guessed(In)),
        punch("E1", "2025-06-01 17:00:00", Label::Guessed(In)),
    ];
    normalize(&mut punches);
    assert_eq!(directions(&punches), vec![Some(In), Some(Out), Some(Out)]);
}

#[test]
fn single_check_out_record_becomes_in() {
    let record = raw(json!({
        "emp_code": "E1",
        "punch_time": "2025-06-01 18:00:00",
        "punch_state_display": "Check Out"
    }));
    assert_eq!(detect(&record), Out);

    let mut punches = vec![
        Punch::new(
            Some("E1".into()),
            Some(ts("2025-06-01 18:00:00")),
            "Main Gate",
            record.clone(),
        )
        .with_label(initial_label(&record)),
    ];
    assert_eq!(punches[0].label, Label::Guessed(Out));

    normalize(&mut punches);
    assert_eq!(punches[0].label, Label::Sequenced(In));
}

#[test]
fn pair_is_always_in_out() {
    let mut punches = vec![
        punch("E1", "2025-06-01 09:00:00", Label::Authoritative(Out)),
        punch("E1", "2025-06-01 17:00:00", Label::Authoritative(In)),
    ];
    normalize(&mut punches);
    assert_eq!(directions(&punches), vec![Some(In), Some(Out)]);
}

#[test]
fn authoritative_interior_label_is_kept_and_reseeds() {
    let mut punches = vec![
        punch("E1", "2025-06-01 09:00:00", Label::Guessed(Out)),
        punch("E1", "2025-06-01 10:00:00", Label::Authoritative(In)),
        punch("E1", "2025-06-01 11:00:00", Label::Guessed(In)),
        punch("E1", "2025-06-01 12:00:00", Label::Guessed(In)),
    ];
    let report = normalize(&mut punches);

    assert_eq!(
        directions(&punches),
        vec![Some(In), Some(In), Some(Out), Some(Out)]
    );
    assert_eq!(punches[1].label, Label::Authoritative(In));
    assert!(!punches[1].sequence_adjusted());
    assert_eq!(report.kept, 1);
    assert_eq!(report.adjusted, 3);
}

#[test]
fn guessed_interior_label_is_overridden() {
    let mut punches = vec![
        punch("E1", "2025-06-01 09:00:00", Label::Guessed(In)),
        punch("E1", "2025-06-01 10:00:00", Label::Guessed(In)),
        punch("E1", "2025-06-01 11:00:00", Label::Guessed(In)),
    ];
    normalize(&mut punches);
    assert_eq!(punches[1].label, Label::Sequenced(Out));
}

#[test]
fn groups_split_by_employee_and_day() {
    let mut punches = vec![
        punch("E1", "2025-06-01 09:00:00", Label::Unresolved),
        punch("E2", "2025-06-01 09:05:00", Label::Unresolved),
        punch("E1", "2025-06-01 17:00:00", Label::Unresolved),
        punch("E1", "2025-06-02 08:00:00", Label::Unresolved),
    ];
    let report = normalize(&mut punches);

    assert_eq!(report.groups, 3);
    assert_eq!(
        directions(&punches),
        vec![Some(In), Some(In), Some(Out), Some(In)]
    );
}

#[test]
fn equal_timestamps_keep_input_order() {
    let mut punches = vec![
        punch("E1", "2025-06-01 09:00:00", Label::Unresolved),
        punch("E1", "2025-06-01 09:00:00", Label::Unresolved),
    ];
    normalize(&mut punches);
    assert_eq!(directions(&punches), vec![Some(In), Some(Out)]);
}

#[test]
fn incomplete_punches_are_skipped_and_left_unlabelled() {
    let mut punches = vec![
        punch("E1", "2025-06-01 09:00:00", Label::Unresolved),
        Punch::new(None, Some(ts("2025-06-01 10:00:00")), "Main Gate", raw(json!({}))),
        Punch::new(Some("E1".into()), None, "Main Gate", raw(json!({}))),
        punch("E1", "2025-06-01 17:00:00", Label::Unresolved),
    ];
    let report = normalize(&mut punches);

    assert_eq!(report.skipped, 2);
    assert_eq!(punches[1].label, Label::Unresolved);
    assert_eq!(punches[2].label, Label::Unresolved);
    assert_eq!(punches[0].direction(), Some(In));
    assert_eq!(punches[3].direction(), Some(Out));
}

#[test]
fn positional_labels_for_sizes() {
    assert!(positional_labels(0).is_empty());
    assert_eq!(positional_labels(1), vec![In]);
    assert_eq!(positional_labels(2), vec![In, Out]);
    assert_eq!(positional_labels(5), vec![In, Out, In, Out, Out]);
    assert_eq!(positional_labels(6), vec![In, Out, In, Out, In, Out]);
}

#[test]
fn pinned_positions_hold_from_three_punches() {
    assert_eq!(sequence_labels(3, |_| Some(Out)), vec![Out, Out, Out]);
    assert_eq!(
        sequence_labels(4, |i| if i == 0 { Some(Out) } else { None }),
        vec![Out, In, Out, Out]
    );
    // pairs and singles ignore pins
    assert_eq!(sequence_labels(2, |_| Some(Out)), vec![In, Out]);
    assert_eq!(sequence_labels(1, |_| Some(Out)), vec![In]);
}

#[test]
fn authoritative_first_and_last_are_kept() {
    let mut punches = vec![
        punch("E1", "2025-06-01 09:00:00", Label::Authoritative(Out)),
        punch("E1", "2025-06-01 10:00:00", Label::Unresolved),
        punch("E1", "2025-06-01 11:00:00", Label::Authoritative(In)),
    ];
    let report = normalize(&mut punches);

    assert_eq!(punches[0].label, Label::Authoritative(Out));
    assert_eq!(punches[1].label, Label::Sequenced(In));
    assert_eq!(punches[2].label, Label::Authoritative(In));
    assert_eq!(report.kept, 2);
    assert_eq!(report.adjusted, 1);
}
