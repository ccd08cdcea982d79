//! Invoice submission integration tests for invoicing-service.

mod common;

use std::collections::HashSet;
use std::thread;

use billing_service::models::{InvoiceStatus, ListWorkEntriesFilter};
use billing_service::services::WorkEntryRepository;
use common::{scope, submission, TestContext, EAST_PROJECT_ID, NORTH_PROJECT_ID};
use invoicing_service::models::AdditionalLineItem;
use rust_decimal_macros::dec;

fn statuses(ctx: &TestContext) -> Vec<(String, InvoiceStatus)> {
    ctx.db
        .list_work_entries(&ListWorkEntriesFilter::default())
        .unwrap()
        .into_iter()
        .map(|e| (e.id, e.invoice_status))
        .collect()
}

#[test]
fn only_selected_entries_change_status() {
    let ctx = TestContext::new();
    let a = ctx.record(NORTH_PROJECT_ID, "2026-09-02", dec!(120));
    let b = ctx.record(NORTH_PROJECT_ID, "2026-09-03", dec!(80));
    let c = ctx.record(NORTH_PROJECT_ID, "2026-09-04", dec!(40));
    let other = ctx.record(EAST_PROJECT_ID, "2026-09-04", dec!(40));

    let invoice = ctx
        .service
        .submit_invoice(submission(
            "INV-2026-001",
            scope(Some(NORTH_PROJECT_ID), "2026-09-01", "2026-09-30"),
            &[&a, &b],
        ))
        .unwrap();

    assert_eq!(invoice.total, dec!(500.00));
    assert_eq!(invoice.notes.as_deref(), Some("Net 30"));
    assert_eq!(ctx.entry(&a.id).invoice_status, InvoiceStatus::Invoiced);
    assert_eq!(ctx.entry(&b.id).invoice_status, InvoiceStatus::Invoiced);
    assert_eq!(ctx.entry(&c.id).invoice_status, InvoiceStatus::NotInvoiced);
    assert_eq!(ctx.entry(&other.id).invoice_status, InvoiceStatus::NotInvoiced);
}

#[test]
fn empty_invoice_number_mutates_nothing() {
    let ctx = TestContext::new();
    let a = ctx.record(NORTH_PROJECT_ID, "2026-09-02", dec!(120));
    let before = statuses(&ctx);

    let mut input = submission(
        "",
        scope(Some(NORTH_PROJECT_ID), "2026-09-01", "2026-09-30"),
        &[&a],
    );
    input.additional_line_items = vec![AdditionalLineItem::new("Permit", dec!(1), dec!(90))];

    let err = ctx.service.submit_invoice(input).unwrap_err();
    assert!(err.is_validation());
    assert_eq!(statuses(&ctx), before);
    assert!(ctx.service.invoices().list_invoices(None).unwrap().is_empty());
}

#[test]
fn all_projects_scope_prices_each_entry_with_its_project() {
    let ctx = TestContext::new();
    let north = ctx.record(NORTH_PROJECT_ID, "2026-09-02", dec!(120));
    let east = ctx.record(EAST_PROJECT_ID, "2026-09-02", dec!(100));

    let invoice = ctx
        .service
        .submit_invoice(submission(
            "INV-ALL-1",
            scope(None, "2026-09-01", "2026-09-30"),
            &[&north, &east],
        ))
        .unwrap();

    assert_eq!(invoice.work_subtotal, dec!(600.00));
    let prices: Vec<_> = invoice.line_items.iter().map(|l| l.unit_price).collect();
    assert!(prices.contains(&dec!(2.50)));
    assert!(prices.contains(&dec!(3.00)));
}

#[test]
fn duplicate_invoice_number_is_a_conflict() {
    let ctx = TestContext::new();
    let a = ctx.record(NORTH_PROJECT_ID, "2026-09-02", dec!(10));
    let b = ctx.record(NORTH_PROJECT_ID, "2026-09-03", dec!(10));
    let period = scope(Some(NORTH_PROJECT_ID), "2026-09-01", "2026-09-30");

    ctx.service
        .submit_invoice(submission("INV-9", period.clone(), &[&a]))
        .unwrap();
    let err = ctx
        .service
        .submit_invoice(submission("INV-9", period, &[&b]))
        .unwrap_err();

    assert_eq!(err.kind(), "conflict");
    assert_eq!(ctx.entry(&b.id).invoice_status, InvoiceStatus::NotInvoiced);
}

#[test]
fn already_invoiced_selection_is_rejected() {
    let ctx = TestContext::new();
    let a = ctx.record(NORTH_PROJECT_ID, "2026-09-02", dec!(10));
    let period = scope(Some(NORTH_PROJECT_ID), "2026-09-01", "2026-09-30");

    ctx.service
        .submit_invoice(submission("INV-10", period.clone(), &[&a]))
        .unwrap();
    let err = ctx
        .service
        .submit_invoice(submission("INV-11", period, &[&a]))
        .unwrap_err();

    assert!(err.is_validation());
    assert!(ctx
        .service
        .invoices()
        .get_invoice_by_number("INV-11")
        .unwrap()
        .is_none());
}

#[test]
fn overlapping_submissions_never_double_invoice() {
    let ctx = TestContext::new();
    let entries: Vec<_> = (1..=12)
        .map(|day| ctx.record(NORTH_PROJECT_ID, &format!("2026-09-{day:02}"), dec!(10)))
        .collect();
    let period = scope(Some(NORTH_PROJECT_ID), "2026-09-01", "2026-09-30");

    let results: Vec<_> = thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|n| {
                // Each submission overlaps its neighbours.
                let picked: Vec<_> = entries.iter().skip(n).take(6).collect();
                let input = submission(&format!("INV-C-{n}"), period.clone(), &picked);
                let service = ctx.service.clone();
                s.spawn(move || service.submit_invoice(input))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let mut seen = HashSet::new();
    for invoice in results.into_iter().flatten() {
        for id in invoice.work_entry_ids {
            assert!(seen.insert(id), "work entry invoiced twice");
        }
    }
    for entry in &entries {
        let status = ctx.entry(&entry.id).invoice_status;
        assert_eq!(status == InvoiceStatus::Invoiced, seen.contains(&entry.id));
    }
}

#[test]
fn oversized_line_item_does_not_block_later_submissions() {
    let ctx = TestContext::new();
    let a = ctx.record(NORTH_PROJECT_ID, "2026-09-02", dec!(120));
    let period = scope(Some(NORTH_PROJECT_ID), "2026-09-01", "2026-09-30");
    let huge = rust_decimal::Decimal::from(1_000_000_000_000_000i64);

    let mut input = submission("INV-H-1", period.clone(), &[&a]);
    input.additional_line_items = vec![AdditionalLineItem::new("Huge", huge, huge)];
    assert!(ctx.service.submit_invoice(input).unwrap_err().is_validation());
    assert_eq!(ctx.entry(&a.id).invoice_status, InvoiceStatus::NotInvoiced);

    let invoice = ctx
        .service
        .submit_invoice(submission("INV-H-1", period, &[&a]))
        .unwrap();
    assert_eq!(invoice.total, dec!(300.00));
}

#[test]
fn invoiced_entries_cannot_be_moved_back() {
    let ctx = TestContext::new();
    let a = ctx.record(NORTH_PROJECT_ID, "2026-09-02", dec!(10));
    ctx.service
        .submit_invoice(submission(
            "INV-B-1",
            scope(Some(NORTH_PROJECT_ID), "2026-09-01", "2026-09-30"),
            &[&a],
        ))
        .unwrap();
    ctx.service.mark_paid(&a.id).unwrap();

    let err = ctx
        .db
        .transition_work_entries(&[a.id.clone()], InvoiceStatus::Paid, InvoiceStatus::NotInvoiced)
        .unwrap_err();
    assert!(err.is_validation());
    assert_eq!(ctx.entry(&a.id).invoice_status, InvoiceStatus::Paid);
}
