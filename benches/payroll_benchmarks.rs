//! Performance benchmarks for the attendance payroll engine.
//!
//! This benchmark suite covers the hot paths:
//! - Totals derivation for a single snapshot
//! - Approving a day through the review service
//! - Generating a month of 31 settled days
//! - Fetching a record over HTTP
//!
//! Run with: `cargo bench`
//! HTML reports are generated in `target/criterion/`

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;

use criterion::{BatchSize, BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use attendance_payroll::aggregation::MonthlyPayrollAggregator;
use attendance_payroll::api::{AppState, create_router};
use attendance_payroll::attendance::AttendanceService;
use attendance_payroll::calculation::compute_totals;
use attendance_payroll::config::{EngineConfig, PayrollPolicy};
use attendance_payroll::models::{
    Assignment, AssignmentStatus, PayTemplate, PayrollInputs, ReviewContext, ShiftWindow,
};
use attendance_payroll::notify::TracingNotifier;
use attendance_payroll::review::{PendingEdits, ReviewService};
use attendance_payroll::store::MemoryStore;

use axum::{body::Body, http::Request};
use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use tower::ServiceExt;
use uuid::Uuid;

fn decimal(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn create_assignment() -> Assignment {
    Assignment {
        id: Uuid::new_v4(),
        worker_id: "wrk_bench_001".to_string(),
        job_id: "site_bench".to_string(),
        pay_template: PayTemplate {
            daily_wage: decimal("700"),
            bata: decimal("50"),
            overtime_hourly_rate: decimal("90"),
            pf_rate: decimal("0.12"),
            esi_rate: decimal("0.0075"),
        },
        shift: ShiftWindow {
            start: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
        },
        status: AssignmentStatus::Active,
    }
}

struct Services {
    attendance: AttendanceService,
    review: ReviewService,
    payrolls: MonthlyPayrollAggregator,
}

fn create_services() -> Services {
    let store = Arc::new(MemoryStore::new());
    let notifier = Arc::new(TracingNotifier);
    let attendance =
        AttendanceService::new(store.clone(), notifier.clone(), PayrollPolicy::default());
    let review = ReviewService::new(
        attendance.clone(),
        Arc::new(PendingEdits::new(std::time::Duration::from_secs(1800), 10_000)),
    );
    let payrolls = MonthlyPayrollAggregator::new(store, notifier);
    Services {
        attendance,
        review,
        payrolls,
    }
}

/// Drives one day of an assignment to `PENDING_VERIFICATION` and returns its id.
fn pending_day(services: &Services, assignment: &Assignment, date: NaiveDate) -> Uuid {
    let record = services
        .attendance
        .check_in_on(assignment.id, date, date.and_hms_opt(9, 0, 0).unwrap())
        .unwrap();
    services
        .attendance
        .check_out(record.id, date.and_hms_opt(18, 30, 0).unwrap())
        .unwrap();
    services
        .attendance
        .submit_proof(record.id, "proof/bench".to_string(), BTreeMap::new())
        .unwrap();
    record.id
}

fn bench_compute_totals(c: &mut Criterion) {
    let inputs = PayrollInputs {
        base_pay: decimal("700"),
        daily_pay: decimal("700"),
        overtime_pay: decimal("135"),
        bata: decimal("50"),
        pf_deduction: decimal("84"),
        esi_deduction: decimal("6.64"),
        advance_deduction: decimal("100"),
    };

    c.bench_function("compute_totals", |b| {
        b.iter(|| compute_totals(black_box(inputs)).unwrap())
    });
}

fn bench_approve_day(c: &mut Criterion) {
    let ctx = ReviewContext::new("rev_bench", "sess_bench");
    let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();

    c.bench_function("approve_day", |b| {
        b.iter_batched(
            || {
                let services = create_services();
                let assignment = services
                    .attendance
                    .register_assignment(create_assignment())
                    .unwrap();
                let record_id = pending_day(&services, &assignment, date);
                (services, record_id)
            },
            |(services, record_id)| {
                let approved = services.review.approve(&ctx, record_id, None).unwrap();
                black_box(approved)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_generate_month(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate_month");

    for days in [10u32, 31] {
        let services = create_services();
        let assignment = services
            .attendance
            .register_assignment(create_assignment())
            .unwrap();
        let ctx = ReviewContext::new("rev_bench", "sess_bench");
        for day in 1..=days {
            let date = NaiveDate::from_ymd_opt(2026, 3, day).unwrap();
            let record_id = pending_day(&services, &assignment, date);
            services.review.approve(&ctx, record_id, None).unwrap();
        }

        group.throughput(Throughput::Elements(days as u64));
        group.bench_with_input(BenchmarkId::from_parameter(days), &days, |b, _| {
            b.iter(|| {
                let payroll = services
                    .payrolls
                    .generate(assignment.id, &assignment.worker_id, 2026, 3)
                    .unwrap();
                black_box(payroll)
            })
        });
    }

    group.finish();
}

fn bench_http_get_record(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let state = AppState::in_memory(&EngineConfig::default());
    let assignment = state
        .attendance()
        .register_assignment(create_assignment())
        .unwrap();
    let record = state
        .attendance()
        .materialize(assignment.id, NaiveDate::from_ymd_opt(2026, 3, 2).unwrap())
        .unwrap();
    let router = create_router(state);
    let uri = format!("/attendance/{}", record.id);

    c.bench_function("http_get_record", |b| {
        b.to_async(&rt).iter(|| async {
            let router = router.clone();
            let response = router
                .oneshot(Request::builder().uri(uri.as_str()).body(Body::empty()).unwrap())
                .await
                .unwrap();
            black_box(response)
        })
    });
}

criterion_group!(
    benches,
    bench_compute_totals,
    bench_approve_day,
    bench_generate_month,
    bench_http_get_record
);
criterion_main!(benches);
