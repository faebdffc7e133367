//! Expense and revenue-goal query builders.

use sea_query::{Alias, Asterisk, Expr, Func, OnConflict, Order, Query, SqliteQueryBuilder};

use super::tables::{Expenses, FinanceGoals};
use super::{Built, BuiltListQuery, page_window};
use crate::ExpenseListQuery;

/// Column order must match `expense_from_row()` in the server.
fn columns(q: &mut sea_query::SelectStatement) -> &mut sea_query::SelectStatement {
    q.column(Expenses::Id)
        .column(Expenses::Description)
        .column(Expenses::AmountCents)
        .column(Expenses::Category)
        .column(Expenses::SpentOn)
        .column(Expenses::CreatedAt)
}

pub fn insert_expense(
    id: &str,
    craftsman_id: &str,
    description: &str,
    amount_cents: i64,
    category: &str,
    spent_on: &str,
) -> Built {
    Query::insert()
        .into_table(Expenses::Table)
        .columns([
            Expenses::Id,
            Expenses::CraftsmanId,
            Expenses::Description,
            Expenses::AmountCents,
            Expenses::Category,
            Expenses::SpentOn,
        ])
        .values_panic([
            id.into(),
            craftsman_id.into(),
            description.into(),
            amount_cents.into(),
            category.into(),
            spent_on.into(),
        ])
        .build(SqliteQueryBuilder)
}

pub fn get_expense(craftsman_id: &str, id: &str) -> Built {
    let mut q = Query::select().to_owned();
    columns(&mut q);
    q.from(Expenses::Table)
        .and_where(Expr::col(Expenses::CraftsmanId).eq(craftsman_id))
        .and_where(Expr::col(Expenses::Id).eq(id))
        .build(SqliteQueryBuilder)
}

pub fn list_expenses(craftsman_id: &str, q: &ExpenseListQuery) -> BuiltListQuery {
    let (per_page, offset) = page_window(q.page, q.per_page);

    let mut count_q = Query::select()
        .expr_as(Func::count(Expr::col(Asterisk)), Alias::new("count"))
        .from(Expenses::Table)
        .to_owned();
    let mut select_q = Query::select().to_owned();
    columns(&mut select_q);
    select_q.from(Expenses::Table);

    let scope = Expr::col(Expenses::CraftsmanId).eq(craftsman_id);
    count_q.and_where(scope.clone());
    select_q.and_where(scope);

    if let Some(year) = q.year {
        let cond = Expr::col(Expenses::SpentOn).like(format!("{year}-%"));
        count_q.and_where(cond.clone());
        select_q.and_where(cond);
    }

    if let Some(ref category) = q.category {
        let cond = Expr::col(Expenses::Category).eq(category.as_str());
        count_q.and_where(cond.clone());
        select_q.and_where(cond);
    }

    select_q
        .order_by(Expenses::SpentOn, Order::Desc)
        .limit(per_page as u64)
        .offset(offset as u64);

    BuiltListQuery {
        count_query: count_q.build(SqliteQueryBuilder),
        select_query: select_q.build(SqliteQueryBuilder),
        page: q.page,
        per_page,
    }
}

pub fn update_expense(
    craftsman_id: &str,
    id: &str,
    description: &str,
    amount_cents: i64,
    category: &str,
    spent_on: &str,
) -> Built {
    Query::update()
        .table(Expenses::Table)
        .values([
            (Expenses::Description, description.into()),
            (Expenses::AmountCents, amount_cents.into()),
            (Expenses::Category, category.into()),
            (Expenses::SpentOn, spent_on.into()),
        ])
        .and_where(Expr::col(Expenses::CraftsmanId).eq(craftsman_id))
        .and_where(Expr::col(Expenses::Id).eq(id))
        .build(SqliteQueryBuilder)
}

pub fn delete_expense(craftsman_id: &str, id: &str) -> Built {
    Query::delete()
        .from_table(Expenses::Table)
        .and_where(Expr::col(Expenses::CraftsmanId).eq(craftsman_id))
        .and_where(Expr::col(Expenses::Id).eq(id))
        .build(SqliteQueryBuilder)
}

/// SUM of expenses for a year.
pub fn expenses_for_year(craftsman_id: &str, year: i32) -> Built {
    Query::select()
        .expr(Func::sum(Expr::col(Expenses::AmountCents)))
        .from(Expenses::Table)
        .and_where(Expr::col(Expenses::CraftsmanId).eq(craftsman_id))
        .and_where(Expr::col(Expenses::SpentOn).like(format!("{year}-%")))
        .build(SqliteQueryBuilder)
}

/// Upsert the revenue goal for a year.
pub fn upsert_goal(craftsman_id: &str, year: i32, target_cents: i64, updated_at: &str) -> Built {
    Query::insert()
        .into_table(FinanceGoals::Table)
        .columns([
            FinanceGoals::CraftsmanId,
            FinanceGoals::Year,
            FinanceGoals::TargetCents,
            FinanceGoals::UpdatedAt,
        ])
        .values_panic([
            craftsman_id.into(),
            year.into(),
            target_cents.into(),
            updated_at.into(),
        ])
        .on_conflict(
            OnConflict::columns([FinanceGoals::CraftsmanId, FinanceGoals::Year])
                .update_columns([FinanceGoals::TargetCents, FinanceGoals::UpdatedAt])
                .to_owned(),
        )
        .build(SqliteQueryBuilder)
}

/// SELECT the goal target for a year.
pub fn get_goal(craftsman_id: &str, year: i32) -> Built {
    Query::select()
        .column(FinanceGoals::TargetCents)
        .from(FinanceGoals::Table)
        .and_where(Expr::col(FinanceGoals::CraftsmanId).eq(craftsman_id))
        .and_where(Expr::col(FinanceGoals::Year).eq(year))
        .build(SqliteQueryBuilder)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn goal_upsert_is_a_conflict_update() {
        let (sql, values) = upsert_goal("c-1", 2026, 12_000_000, "2026-02-01 10:00:00");
        assert!(sql.contains("ON CONFLICT"));
        assert_eq!(values.0.len(), 4);
    }

    #[test]
    fn year_filter_uses_date_prefix() {
        let (sql, _) = expenses_for_year("c-1", 2026);
        assert!(sql.contains("LIKE"));
    }
}
