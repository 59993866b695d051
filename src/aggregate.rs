use crate::models::{AggregateSnapshot, ContractRecord, ContractStatus, MonthBucket, RiskLevel};
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;

/// Summary counts for KPI cards. Records with an unrecognized status count
/// toward the total only.
pub fn snapshot(contracts: &[ContractRecord]) -> AggregateSnapshot {
    let mut aggregate = AggregateSnapshot {
        total: contracts.len(),
        ..AggregateSnapshot::default()
    };
    for contract in contracts {
        match contract.status {
            ContractStatus::Active => aggregate.active += 1,
            ContractStatus::RenewalDue => aggregate.renewal_due += 1,
            ContractStatus::Expired => aggregate.expired += 1,
            ContractStatus::Unknown => {}
        }
        if contract.risk == RiskLevel::High {
            aggregate.high_risk += 1;
        }
    }
    aggregate
}

/// One bucket per distinct expiry year-month, chronologically ascending.
/// Records without an expiry are skipped.
pub fn expiry_by_month(contracts: &[ContractRecord]) -> Vec<MonthBucket> {
    series(contracts.iter().filter_map(|contract| contract.expiry))
}

/// Same grouping keyed by upload date; records that arrived without one on
/// the wire are skipped.
pub fn uploads_by_month(contracts: &[ContractRecord]) -> Vec<MonthBucket> {
    series(
        contracts
            .iter()
            .filter_map(|contract| contract.uploaded_on.map(|at| at.date_naive())),
    )
}

/// Fixed calendar window for charts that need a stable axis: exactly `months`
/// buckets ending at `end`'s month, zero-filled where no record expires.
pub fn expiry_by_month_window(
    contracts: &[ContractRecord],
    end: NaiveDate,
    months: u32,
) -> Vec<MonthBucket> {
    let mut keys = Vec::with_capacity(months as usize);
    let mut year = end.year();
    let mut month = end.month();
    for _ in 0..months {
        keys.push((year, month));
        (year, month) = previous_month(year, month);
    }
    keys.reverse();

    let mut counts: BTreeMap<(i32, u32), u64> = keys.iter().map(|key| (*key, 0)).collect();
    for expiry in contracts.iter().filter_map(|contract| contract.expiry) {
        if let Some(count) = counts.get_mut(&(expiry.year(), expiry.month())) {
            *count += 1;
        }
    }

    keys.into_iter()
        .map(|(year, month)| MonthBucket {
            month: month_key(year, month),
            count: counts[&(year, month)],
        })
        .collect()
}

fn series(dates: impl Iterator<Item = NaiveDate>) -> Vec<MonthBucket> {
    let mut buckets: BTreeMap<(i32, u32), u64> = BTreeMap::new();
    for date in dates {
        *buckets.entry((date.year(), date.month())).or_insert(0) += 1;
    }
    buckets
        .into_iter()
        .map(|((year, month), count)| MonthBucket {
            month: month_key(year, month),
            count,
        })
        .collect()
}

fn month_key(year: i32, month: u32) -> String {
    format!("{year:04}-{month:02}")
}

fn previous_month(year: i32, month: u32) -> (i32, u32) {
    if month == 1 {
        (year - 1, 12)
    } else {
        (year, month - 1)
    }
}
