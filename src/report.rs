use crate::calendar::{month_range, shift_weeks, week_label, week_range};
use crate::models::{ChartPoint, Load, MonthlyChart, WeeklyReport, WeeklySummary};
use chrono::NaiveDate;

pub fn summarize(loads: &[Load]) -> WeeklySummary {
    let mut summary = WeeklySummary {
        total_loads: loads.len(),
        ..WeeklySummary::default()
    };

    for load in loads {
        summary.total_miles = summary.total_miles.saturating_add(u64::from(load.total_miles));
        summary.total_revenue += load.rate.unwrap_or(0.0);
        summary.total_fuel += load.fuel_cost.unwrap_or(0.0);
    }

    summary.net_profit = summary.total_revenue - summary.total_fuel;
    summary.avg_per_mile = if summary.total_miles > 0 {
        summary.total_revenue / summary.total_miles as f64
    } else {
        0.0
    };
    summary
}

/// Builds the report for the week containing `date`. `loads` is expected to
/// already be limited to that week; anything outside it is dropped.
pub fn build_weekly_report(date: NaiveDate, mut loads: Vec<Load>) -> WeeklyReport {
    let range = week_range(date);
    loads.retain(|load| range.contains(load.pickup_date));
    loads.sort_by_key(|load| load.pickup_date);

    WeeklyReport {
        label: week_label(&range),
        prev_week: shift_weeks(range.start, -1),
        next_week: shift_weeks(range.start, 1),
        summary: summarize(&loads),
        range,
        loads,
    }
}

pub fn mileage_series(loads: &[Load]) -> Vec<ChartPoint> {
    loads
        .iter()
        .enumerate()
        .map(|(index, load)| ChartPoint {
            label: format!("Load #{}", index + 1),
            date: load.pickup_date,
            empty_miles: load.empty_miles.unwrap_or(0),
            loaded_miles: load.loaded_miles.unwrap_or(0),
            total_miles: load.total_miles,
        })
        .collect()
}

pub fn build_monthly_chart(date: NaiveDate, mut loads: Vec<Load>) -> MonthlyChart {
    let range = month_range(date);
    loads.retain(|load| range.contains(load.pickup_date));
    loads.sort_by_key(|load| load.pickup_date);

    MonthlyChart {
        label: range.start.format("%B %Y").to_string(),
        points: mileage_series(&loads),
        range,
    }
}
