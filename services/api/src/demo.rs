use std::sync::Arc;
use std::time::Duration;

use chrono::{Datelike, Utc};
use clap::Args;

use sales_bonus::error::AppError;
use sales_bonus::workflows::bonus::{
    BonusComputation, BonusPools, BonusWorkflowService, EmployeeId, ExternalHrClient, HrStoreError,
    InMemoryComputationCache, OrderEvaluationRecord, SocialPerformanceRecord,
};

use crate::infra::InMemoryRecordsStore;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Employee to run the demo for
    #[arg(long, default_value = "90001")]
    pub(crate) employee_id: String,
    /// Bonus year (defaults to the current year)
    #[arg(long)]
    pub(crate) year: Option<i32>,
    /// Print the full computation payload after every step
    #[arg(long)]
    pub(crate) verbose: bool,
}

/// HR client double for the demo: prints what would be pushed instead of
/// calling a live tenant.
struct ConsoleHrClient;

impl ExternalHrClient for ConsoleHrClient {
    fn store_total_bonus(
        &self,
        employee_id: &EmployeeId,
        year: i32,
        total_bonus_eur: f64,
    ) -> Result<(), HrStoreError> {
        println!(
            "  [orangehrm] store employee={} year={year} total={total_bonus_eur:.2} EUR",
            employee_id.as_str()
        );
        Ok(())
    }
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        employee_id,
        year,
        verbose,
    } = args;

    let year = year.unwrap_or_else(|| Utc::now().year());
    let employee = EmployeeId(employee_id);

    let store = Arc::new(InMemoryRecordsStore::default());
    seed_demo_records(&store, &employee, year);

    let service = BonusWorkflowService::new(
        store,
        Arc::new(ConsoleHrClient),
        Arc::new(InMemoryComputationCache::new()),
        BonusPools::default(),
        Duration::from_secs(60),
    );

    println!(
        "Sales bonus workflow demo (employee {}, year {year})",
        employee.as_str()
    );

    let computed = step(
        "compute",
        service.compute(&employee, year, "hr.demo"),
        verbose,
    );
    println!(
        "  social {:.2} + orders {:.2} = total {:.2} EUR",
        computed.social_total_eur, computed.orders_total_eur, computed.total_bonus_eur
    );

    service
        .add_remark(&employee, year, "ceo.demo", "CEO", "Looks reasonable.")
        .map_err(workflow_failed)?;

    step(
        "ceo approval",
        service.approve_ceo(&employee, year, "ceo.demo"),
        verbose,
    );
    step(
        "hr approval + orangehrm store",
        service.approve_hr_and_store(&employee, year, "hr.demo"),
        verbose,
    );
    step("release", service.release(&employee, year), verbose);
    let confirmed = step(
        "salesman confirmation",
        service.confirm(&employee, year, &employee),
        verbose,
    );

    println!(
        "Final status: {} with {} remark(s)",
        confirmed.status,
        confirmed.remarks.len()
    );
    Ok(())
}

fn step<E: std::fmt::Display>(
    name: &str,
    result: Result<BonusComputation, E>,
    verbose: bool,
) -> BonusComputation {
    match result {
        Ok(computation) => {
            println!("- {name}: {}", computation.status);
            if verbose {
                match serde_json::to_string_pretty(&computation) {
                    Ok(json) => println!("{json}"),
                    Err(err) => println!("  payload unavailable: {err}"),
                }
            }
            computation
        }
        Err(err) => {
            eprintln!("- {name} failed: {err}");
            std::process::exit(1);
        }
    }
}

fn workflow_failed<E: std::fmt::Display>(err: E) -> AppError {
    AppError::Io(std::io::Error::new(
        std::io::ErrorKind::Other,
        err.to_string(),
    ))
}

fn seed_demo_records(store: &InMemoryRecordsStore, employee: &EmployeeId, year: i32) {
    for (key, name, target, actual, weight) in [
        ("leadership", "Leadership Competence", 4.0, 4.0, 0.25),
        ("openness", "Openness to Employee", 4.0, 3.0, 0.25),
        ("social_behaviour", "Social Behaviour to Employee", 4.0, 4.0, 0.25),
        ("communication", "Communication Skills", 4.0, 2.0, 0.25),
    ] {
        store.put_social_record(SocialPerformanceRecord {
            employee_id: employee.clone(),
            year,
            criterion_key: key.to_string(),
            criterion_name: name.to_string(),
            target_value: target,
            actual_value: actual,
            weight,
            supervisor_rating: 4,
            peer_rating: 5,
            computed_bonus_eur: 0.0,
            remark: String::new(),
        });
    }

    for (order_id, product, client, ranking, closing, items, revenue) in [
        ("ORD-0001", "HooverClean Premium", "Telekom AG", 1, 1.0, 8, 9_200.0),
        ("ORD-0002", "HooverClean Basic", "Stadtwerke Mitte", 3, 0.7, 3, 2_400.0),
        ("ORD-0003", "HooverGo", "Kiosk am Eck", 5, 0.4, 1, 350.0),
    ] {
        store.put_order_record(OrderEvaluationRecord {
            employee_id: employee.clone(),
            year,
            order_id: order_id.to_string(),
            product_name: product.to_string(),
            client_name: client.to_string(),
            client_ranking: ranking,
            closing_probability: closing,
            items_count: items,
            revenue_eur: revenue,
            computed_bonus_eur: 0.0,
            remark: String::new(),
        });
    }
}
