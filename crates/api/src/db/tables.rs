//! Compile-time–checked column identifiers for all tables.

use sea_query::Iden;

#[derive(Iden)]
pub enum Craftsmen {
    Table,
    Id,
    CompanyName,
    ApiKey,
    ContactName,
    Email,
    Phone,
    Address,
    VatExempt,
    CreatedAt,
}

#[derive(Iden)]
pub enum Customers {
    Table,
    Id,
    CraftsmanId,
    Name,
    Email,
    Phone,
    Address,
    Notes,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
pub enum Appointments {
    Table,
    Id,
    CraftsmanId,
    CustomerId,
    Title,
    StartsAt,
    EndsAt,
    Location,
    Notes,
    Status,
    PriceCents,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
pub enum Materials {
    Table,
    Id,
    CraftsmanId,
    Name,
    Unit,
    UnitPriceCents,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
pub enum Invoices {
    Table,
    Id,
    CraftsmanId,
    CustomerId,
    AppointmentId,
    InvoiceNumber,
    DocYear,
    DocSeq,
    ServiceAmountCents,
    MaterialsTotalCents,
    TaxCents,
    TotalCents,
    TaxTreatment,
    Status,
    IssueDate,
    DueDate,
    PaidAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
pub enum InvoiceLines {
    Table,
    Id,
    InvoiceId,
    Name,
    QuantityThousandths,
    Unit,
    UnitPriceCents,
    Position,
}

#[derive(Iden)]
pub enum Quotes {
    Table,
    Id,
    CraftsmanId,
    CustomerId,
    QuoteNumber,
    DocYear,
    DocSeq,
    ServiceAmountCents,
    MaterialsTotalCents,
    TaxCents,
    TotalCents,
    TaxTreatment,
    Status,
    IssueDate,
    ValidUntil,
    InvoiceId,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
pub enum QuoteLines {
    Table,
    Id,
    QuoteId,
    Name,
    QuantityThousandths,
    Unit,
    UnitPriceCents,
    Position,
}

#[derive(Iden)]
pub enum Notes {
    Table,
    Id,
    CraftsmanId,
    CustomerId,
    Title,
    Body,
    Tags,
    Pinned,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
pub enum TimeEntries {
    Table,
    Id,
    CraftsmanId,
    CustomerId,
    AppointmentId,
    Description,
    StartedAt,
    EndedAt,
    DurationSeconds,
    CreatedAt,
}

#[derive(Iden)]
pub enum Expenses {
    Table,
    Id,
    CraftsmanId,
    Description,
    AmountCents,
    Category,
    SpentOn,
    CreatedAt,
}

#[derive(Iden)]
pub enum FinanceGoals {
    Table,
    CraftsmanId,
    Year,
    TargetCents,
    UpdatedAt,
}
