//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `pocketbook_core` linkage.
//! - Exercise one in-memory list round-trip with deterministic output.

use pocketbook_core::{
    open_db_in_memory, AggregateOp, ColumnKind, ListService, SqliteListRepository,
    SqliteRowRepository,
};
use std::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("pocketbook_core ping={}", pocketbook_core::ping());
    println!("pocketbook_core version={}", pocketbook_core::core_version());

    match list_demo() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("list demo failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn list_demo() -> Result<(), Box<dyn Error>> {
    let conn = open_db_in_memory()?;
    let service = ListService::new(
        SqliteListRepository::try_new(&conn)?,
        SqliteRowRepository::try_new(&conn)?,
    );

    let list = service.create_list("Groceries")?;
    let item = service.add_column(list.id, "Item", ColumnKind::Text)?;
    let amount = service.add_column(list.id, "Amount", ColumnKind::Number)?;

    for (name, value) in [("Bread", "3.50"), ("Milk", "1.25"), ("Coupon", "n/a")] {
        service.add_row_with_cells(list.id, [(item.id, name), (amount.id, value)])?;
    }

    for op in AggregateOp::ALL {
        match service.compute_aggregate(list.id, amount.id, op)? {
            Some(result) => println!(
                "list demo {}={} over {} rows",
                op.as_str(),
                result.value,
                result.sample_count
            ),
            None => println!("list demo {}=n/a", op.as_str()),
        }
    }

    Ok(())
}
