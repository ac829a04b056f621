use std::collections::HashMap;

use crate::models::{CalculationRow, PlanningRow, StoreAggregate, WeekAggregate};

/// Gross margin as a percentage of sales. No sales means 0%.
pub fn gm_percent(gm_dollars: f64, sales_dollars: f64) -> f64 {
    if sales_dollars == 0.0 {
        0.0
    } else {
        gm_dollars / sales_dollars * 100.0
    }
}

/// Annotate every calculation row with its own GM %. One output row per input row.
pub fn planning_rows(rows: Vec<CalculationRow>) -> Vec<PlanningRow> {
    rows.into_iter()
        .map(|row| PlanningRow {
            gm_percent: gm_percent(row.gm_amount(), row.sales_amount()),
            row,
        })
        .collect()
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct Accumulator {
    gm_dollars: f64,
    sales_dollars: f64,
}

/// Roll SKU-level rows up to one aggregate per (store, week).
///
/// Dollars are summed first and the percentage is taken from the sums. Rows
/// without a store or week are skipped. Stores, and weeks within a store, come
/// out in the order they were first seen.
pub fn aggregate_by_store_week(rows: &[CalculationRow]) -> Vec<StoreAggregate> {
    let mut order: Vec<(String, Vec<String>)> = Vec::new();
    let mut store_index: HashMap<String, usize> = HashMap::new();
    let mut totals: HashMap<(String, String), Accumulator> = HashMap::new();

    for row in rows {
        let (Some(store), Some(week)) = (
            row.store.as_ref().filter(|v| v.is_truthy()),
            row.week.as_ref().filter(|v| v.is_truthy()),
        ) else {
            continue;
        };
        let (store, week) = (store.label(), week.label());

        let idx = *store_index.entry(store.clone()).or_insert_with(|| {
            order.push((store.clone(), Vec::new()));
            order.len() - 1
        });

        let acc = totals
            .entry((store, week.clone()))
            .or_insert_with(|| {
                order[idx].1.push(week);
                Accumulator::default()
            });
        acc.gm_dollars += row.gm_amount();
        acc.sales_dollars += row.sales_amount();
    }

    order
        .into_iter()
        .map(|(store, weeks)| {
            let weeks = weeks
                .into_iter()
                .map(|week| {
                    let acc = totals[&(store.clone(), week.clone())];
                    WeekAggregate {
                        gm_dollars: acc.gm_dollars,
                        gm_percent: gm_percent(acc.gm_dollars, acc.sales_dollars),
                        week,
                    }
                })
                .collect();
            StoreAggregate { store, weeks }
        })
        .collect()
}
