use chrono::NaiveDate;
use gesta_core::record::parse_batch;
use gesta_core::store::{Booking, BookingStatus};
use gesta_core::{
    run_batch, CapacityStore, DecisionStatus, FacilityName, InMemoryBookingStore, IssueKind,
    ProtocolKey, SchedulingContext, YamlCapacityStore, YearPolicy,
};
use std::io::Write;

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

const CAPACITY: &str = r#"- facility: Salvalus
  weekday: 9
  saturday: 7
- facility: Cruzeiro
  weekday: 3
  saturday: 1
"#;

const BATCH: &str = r#"- id: "A"
  facility: Salvalus
  dum_status: Sim - Confiável
  dum_date: 01/01/2025
  diagnosis: DMG em uso de insulina
  observations: primeira gestação
- id: "B"
  facility: Cruzeiro
  dum_status: Incerta
  usg_date: 2025-02-10
  usg_ga: 8s 2d
  diagnosis: Gestação gemelar dicoriônica, DMG
- id: "C"
  facility: Cruzeiro
  dum_status: Não
  usg_date: 10/6/1900
- id: "D"
  facility: CRUZEIRO
  usg_date: 10/02/2025
  usg_weeks: 8 sem
  usg_days: "2"
  diagnosis: gemelar
"#;

// 2025-06-02 is a Monday.
fn context() -> SchedulingContext {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(CAPACITY.as_bytes()).expect("write");
    let run_date = ymd(2025, 6, 2);
    SchedulingContext::load(
        &YamlCapacityStore::new(file.path()),
        run_date,
        YearPolicy::for_run_date(run_date),
    )
    .expect("context")
}

fn salvalus_full_on(date: NaiveDate) -> InMemoryBookingStore {
    let mut store = InMemoryBookingStore::default();
    let salvalus = FacilityName::new("Salvalus").expect("valid");
    for i in 0..9 {
        store.push(Booking::scheduled(format!("old-{i}"), salvalus.clone(), date));
    }
    let mut rejected = Booking::scheduled("old-r", salvalus, ymd(2025, 9, 25));
    rejected.status = BookingStatus::Rejected;
    store.push(rejected);
    store
}

#[test]
fn batch_runs_end_to_end() {
    let ctx = context();
    let records = parse_batch(BATCH).expect("batch");
    let mut store = salvalus_full_on(ymd(2025, 9, 24));

    let report = run_batch(&ctx, &records, &mut store);
    assert_eq!(report.run_date, ymd(2025, 6, 2));
    assert_eq!(report.outcomes.len(), 4);

    // Diabetes with insulin targets 38 weeks: 2025-09-24, which is full.
    let a = &report.outcomes[0];
    assert_eq!(a.protocol, ProtocolKey::DmgInsulina);
    assert_eq!(a.ideal_date, Some(ymd(2025, 9, 24)));
    let decision = a.decision.as_ref().expect("decision");
    assert_eq!(decision.status(), DecisionStatus::Rescheduled);
    assert_eq!(decision.resolved_date(), Some(ymd(2025, 9, 25)));

    // Twins beat diabetes; the ultrasound puts 36 weeks on Saturday 2025-08-23.
    let b = &report.outcomes[1];
    assert_eq!(b.protocol, ProtocolKey::Gemelar);
    assert_eq!(b.ga_today.expect("ga").to_string(), "24s 2d");
    let decision = b.decision.as_ref().expect("decision");
    assert_eq!(decision.status(), DecisionStatus::Accepted);
    assert_eq!(decision.resolved_date(), Some(ymd(2025, 8, 23)));

    let c = &report.outcomes[2];
    assert!(c.decision.is_none());
    assert!(c.has_issue(IssueKind::Validation));

    // Same target as B; Saturday now full, Sunday skipped.
    let d = &report.outcomes[3];
    let decision = d.decision.as_ref().expect("decision");
    assert_eq!(decision.status(), DecisionStatus::Rescheduled);
    assert_eq!(decision.resolved_date(), Some(ymd(2025, 8, 25)));

    assert_eq!(report.summary.total, 4);
    assert_eq!(report.summary.accepted, 1);
    assert_eq!(report.summary.rescheduled, 2);
    assert_eq!(report.summary.unscheduled, 1);
    assert_eq!(report.summary.by_protocol.get("gemelar"), Some(&2));
}

#[test]
fn recorded_bookings_keep_prior_observations() {
    let ctx = context();
    let records = parse_batch(BATCH).expect("batch");
    let mut store = salvalus_full_on(ymd(2025, 9, 24));
    run_batch(&ctx, &records, &mut store);

    let a = store.find("A").expect("booking for A");
    assert_eq!(a.status, BookingStatus::Scheduled);
    assert_eq!(a.date, Some(ymd(2025, 9, 25)));
    assert!(a.observations.starts_with("primeira gestação | Diabetes com insulina"));
    assert!(store.find("C").is_none());
}

#[test]
fn shipped_capacity_table_loads() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config/capacity.yaml");
    let capacities = YamlCapacityStore::new(path).list_capacities().expect("capacity table");
    assert_eq!(capacities.len(), 4);
    assert!(capacities.iter().any(|c| c.facility.key() == "notrecare"));
}

#[test]
fn shipped_demo_batch_parses() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos/batch.yaml");
    let records = gesta_core::record::read_batch_file(&path).expect("demo batch");
    assert_eq!(records.len(), 3);
}
