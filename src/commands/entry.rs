//! Handlers for the expense, income, utilities, split and summary commands.

use crate::args::{AddExpenseArgs, AddIncomeArgs, SetUtilitiesArgs, UpdateExpenseArgs};
use crate::commands::Out;
use crate::model::{month_summary, ExpensePatch, MonthKey, NewExpense, NewIncome, UtilityReadings};
use crate::split::{compute_split, TENANT_CAP};
use crate::sync::SyncEngine;
use crate::Result;

pub fn add_expense(engine: &mut SyncEngine, month: MonthKey, args: &AddExpenseArgs) -> Result<Out> {
    let date = args
        .date()
        .map(str::to_string)
        .unwrap_or_else(|| month.first_day());
    let expense = engine.add_expense(
        month,
        NewExpense {
            date,
            description: args.description().to_string(),
            category: args.category(),
            cost: args.cost(),
        },
    )?;
    Ok(Out::new(
        format!(
            "Added {} expense '{}' ({}) to {month}, id {}",
            expense.category,
            expense.description,
            expense.cost,
            expense.id()
        ),
        serde_json::to_value(&expense)?,
    ))
}

pub fn delete_expense(engine: &mut SyncEngine, month: MonthKey, id: &str) -> Result<Out> {
    let deleted = engine.delete_expense(month, id)?;
    Ok(Out::new_message(if deleted {
        format!("Deleted expense {id} from {month}")
    } else {
        format!("No expense with id {id} in {month}; nothing to do")
    }))
}

pub fn update_expense(
    engine: &mut SyncEngine,
    month: MonthKey,
    args: &UpdateExpenseArgs,
) -> Result<Out> {
    let patch = ExpensePatch {
        date: args.date().map(str::to_string),
        description: args.description().map(str::to_string),
        category: args.category(),
        cost: args.cost(),
    };
    let updated = engine.update_expense(month, args.id(), patch)?;
    Ok(Out::new_message(if updated {
        format!("Updated expense {} in {month}", args.id())
    } else {
        format!("No expense with id {} in {month}; nothing to do", args.id())
    }))
}

pub fn list_expenses(engine: &SyncEngine, month: MonthKey) -> Result<Out> {
    let ledger = engine.ledger();
    let expenses = ledger
        .month(month)
        .map(|record| record.expenses.clone())
        .unwrap_or_default();

    if expenses.is_empty() {
        return Ok(Out::new_message(format!("No expenses in {month}")));
    }

    let mut lines = vec![format!("Expenses for {month}:")];
    for expense in &expenses {
        lines.push(format!(
            "  {}  {}  {:>12}  {}  [{}]",
            expense.id(),
            expense.date,
            expense.cost.to_string(),
            expense.description,
            expense.category
        ));
    }
    let total: crate::model::Amount = expenses.iter().map(|e| e.cost).sum();
    lines.push(format!("  Total: {total}"));
    Ok(Out::new(lines.join("\n"), serde_json::to_value(&expenses)?))
}

pub fn add_income(engine: &mut SyncEngine, month: MonthKey, args: &AddIncomeArgs) -> Result<Out> {
    let date = args
        .date()
        .map(str::to_string)
        .unwrap_or_else(|| month.first_day());
    let income = engine.add_income(
        month,
        NewIncome {
            date,
            description: args.description().to_string(),
            amount: args.amount(),
        },
    )?;
    Ok(Out::new(
        format!(
            "Added income '{}' ({}) to {month}, id {}",
            income.description,
            income.amount,
            income.id()
        ),
        serde_json::to_value(&income)?,
    ))
}

pub fn delete_income(engine: &mut SyncEngine, month: MonthKey, id: &str) -> Result<Out> {
    let deleted = engine.delete_income(month, id)?;
    Ok(Out::new_message(if deleted {
        format!("Deleted income entry {id} from {month}")
    } else {
        format!("No income entry with id {id} in {month}; nothing to do")
    }))
}

pub fn list_incomes(engine: &SyncEngine, month: MonthKey) -> Result<Out> {
    let ledger = engine.ledger();
    let incomes = ledger
        .month(month)
        .map(|record| record.incomes.clone())
        .unwrap_or_default();

    if incomes.is_empty() {
        return Ok(Out::new_message(format!("No income recorded in {month}")));
    }

    let mut lines = vec![format!("Income for {month}:")];
    for income in &incomes {
        lines.push(format!(
            "  {}  {}  {:>12}  {}",
            income.id(),
            income.date,
            income.amount.to_string(),
            income.description
        ));
    }
    let total: crate::model::Amount = incomes.iter().map(|i| i.amount).sum();
    lines.push(format!("  Total: {total}"));
    Ok(Out::new(lines.join("\n"), serde_json::to_value(&incomes)?))
}

pub fn set_utilities(
    engine: &mut SyncEngine,
    month: MonthKey,
    args: &SetUtilitiesArgs,
) -> Result<Out> {
    let readings = UtilityReadings {
        water: args.water(),
        elec_base: args.elec_base(),
        elec_main: args.elec_main(),
        gas: args.gas(),
        internet: args.internet(),
    };
    engine.set_utilities(month, readings.clone())?;

    let total = compute_split(Some(&readings))
        .map(|split| split.total)
        .unwrap_or_default();
    Ok(Out::new(
        format!("Saved utility readings for {month}; total bill {total}"),
        serde_json::to_value(&readings)?,
    ))
}

pub fn show_utilities(engine: &SyncEngine, month: MonthKey) -> Result<Out> {
    let ledger = engine.ledger();
    let readings = ledger
        .month(month)
        .map(|record| record.utilities.clone())
        .unwrap_or_default();

    if readings.is_empty() {
        return Ok(Out::new_message(format!(
            "No utility bills entered for {month}"
        )));
    }

    let amount = |value: Option<crate::model::Amount>| value.unwrap_or_default().to_string();
    let lines = vec![
        format!("Utility bills for {month}:"),
        format!("  Water (Full House)      {:>12}", amount(readings.water)),
        format!("  Electricity (Basement)  {:>12}", amount(readings.elec_base)),
        format!("  Electricity (Main)      {:>12}", amount(readings.elec_main)),
        format!("  Gas (Full House)        {:>12}", amount(readings.gas)),
        format!("  Internet                {:>12}", amount(readings.internet)),
    ];
    Ok(Out::new(lines.join("\n"), serde_json::to_value(&readings)?))
}

pub fn show_split(engine: &SyncEngine, month: MonthKey) -> Result<Out> {
    let ledger = engine.ledger();
    let readings = ledger.month(month).map(|record| &record.utilities);
    let split = match compute_split(readings) {
        Some(split) if split.total.is_positive() => split,
        _ => {
            return Ok(Out::new_message(format!(
                "No utility bills entered for {month}"
            )))
        }
    };

    let mut lines = vec![
        format!("Utility split for {month}:"),
        format!("  Total bill                     {:>12}", split.total.to_string()),
        String::new(),
        format!("  Tenant water share (40%)       {:>12}", split.tenant.water.to_string()),
        format!("  Tenant electricity (basement)  {:>12}", split.tenant.elec.to_string()),
        format!("  Tenant gas share (40%)         {:>12}", split.tenant.gas.to_string()),
        format!("  Tenant calculated share        {:>12}", split.tenant.calc.to_string()),
        format!("  Cap                            {:>12}", format!("${TENANT_CAP}")),
    ];
    if split.tenant.is_over {
        lines.push(format!(
            "  Tenant pays (overage)          {:>12}",
            split.tenant.overage.to_string()
        ));
    } else {
        lines.push("  Tenant pays                           $0.00 (under the cap)".to_string());
    }
    lines.push(String::new());
    lines.push(format!(
        "  Landlord pays (full bill)      {:>12}",
        split.landlord.total_bill.to_string()
    ));
    lines.push(format!(
        "  Tenant reimburses              {:>12}",
        split.landlord.tenant_reimbursement.to_string()
    ));
    lines.push(format!(
        "  Landlord net cost              {:>12}",
        split.landlord.net_cost.to_string()
    ));

    Ok(Out::new(lines.join("\n"), serde_json::to_value(&split)?))
}

pub fn show_summary(engine: &SyncEngine, month: MonthKey) -> Result<Out> {
    let ledger = engine.ledger();
    let record = ledger.month(month).cloned().unwrap_or_default();
    let summary = month_summary(&record);

    let lines = vec![
        format!("Summary for {month}:"),
        format!("  Total income            {:>12}", summary.total_income.to_string()),
        format!("  Total expenses          {:>12}", summary.total_expenses.to_string()),
        format!("  Tenant utility overage  {:>12}", summary.tenant_overage.to_string()),
        format!("  Total outflow           {:>12}", summary.total_outflow.to_string()),
        format!("  Net savings             {:>12}", summary.net_savings.to_string()),
    ];
    Ok(Out::new(lines.join("\n"), serde_json::to_value(&summary)?))
}
