//! Concept catalog
//!
//! A fixed classification of well-known US-GAAP concept names into
//! statement families. Bulk discovery walks this table in order.

use std::fmt;
use std::str::FromStr;

/// Financial statement a concept is reported on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementFamily {
    /// Income statement
    Income,
    /// Balance sheet
    Balance,
    /// Cash flow statement
    CashFlow,
    /// Anything else (share counts)
    Other,
}

impl StatementFamily {
    /// All families in catalog order
    pub const ALL: [StatementFamily; 4] = [
        StatementFamily::Income,
        StatementFamily::Balance,
        StatementFamily::CashFlow,
        StatementFamily::Other,
    ];

    /// Canonical lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            StatementFamily::Income => "income",
            StatementFamily::Balance => "balance",
            StatementFamily::CashFlow => "cash_flow",
            StatementFamily::Other => "other",
        }
    }

    /// Parse a family from a user-facing name
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "income" => Some(StatementFamily::Income),
            "balance" => Some(StatementFamily::Balance),
            "cash" | "cash_flow" | "cashflow" => Some(StatementFamily::CashFlow),
            "other" | "shares" => Some(StatementFamily::Other),
            _ => None,
        }
    }
}

impl fmt::Display for StatementFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatementFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Unknown statement type: {}", s))
    }
}

/// One catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConceptSpec {
    /// Concept name without namespace prefix
    pub name: &'static str,
    /// Statement family the concept belongs to
    pub family: StatementFamily,
}

const fn spec(name: &'static str, family: StatementFamily) -> ConceptSpec {
    ConceptSpec { name, family }
}

use StatementFamily::{Balance, CashFlow, Income, Other};

/// The full concept table, grouped by family
pub const CONCEPT_CATALOG: &[ConceptSpec] = &[
    // Income statement
    spec("Revenues", Income),
    spec("RevenueFromContractWithCustomerExcludingAssessedTax", Income),
    spec("CostOfRevenue", Income),
    spec("CostOfGoodsAndServicesSold", Income),
    spec("GrossProfit", Income),
    spec("OperatingExpenses", Income),
    spec("OperatingIncomeLoss", Income),
    spec("NonoperatingIncomeExpense", Income),
    spec("InterestExpense", Income),
    spec(
        "IncomeLossFromContinuingOperationsBeforeIncomeTaxesExtraordinaryItemsNoncontrollingInterest",
        Income,
    ),
    spec("IncomeTaxExpenseBenefit", Income),
    spec("NetIncomeLoss", Income),
    spec("EarningsPerShareBasic", Income),
    spec("EarningsPerShareDiluted", Income),
    // Balance sheet
    spec("Assets", Balance),
    spec("AssetsCurrent", Balance),
    spec("CashAndCashEquivalentsAtCarryingValue", Balance),
    spec("AccountsReceivableNetCurrent", Balance),
    spec("InventoryNet", Balance),
    spec("AssetsNoncurrent", Balance),
    spec("PropertyPlantAndEquipmentNet", Balance),
    spec("Goodwill", Balance),
    spec("IntangibleAssetsNetExcludingGoodwill", Balance),
    spec("Liabilities", Balance),
    spec("LiabilitiesCurrent", Balance),
    spec("AccountsPayableCurrent", Balance),
    spec("LiabilitiesNoncurrent", Balance),
    spec("LongTermDebtNoncurrent", Balance),
    spec("StockholdersEquity", Balance),
    spec("CommonStockValue", Balance),
    spec("RetainedEarningsAccumulatedDeficit", Balance),
    // Cash flow statement
    spec("NetCashProvidedByUsedInOperatingActivities", CashFlow),
    spec("NetCashProvidedByUsedInInvestingActivities", CashFlow),
    spec("NetCashProvidedByUsedInFinancingActivities", CashFlow),
    spec("CashAndCashEquivalentsPeriodIncreaseDecrease", CashFlow),
    spec("DepreciationDepletionAndAmortization", CashFlow),
    spec("PaymentsToAcquirePropertyPlantAndEquipment", CashFlow),
    spec("PaymentsOfDividends", CashFlow),
    spec("ProceedsFromIssuanceOfDebt", CashFlow),
    spec("RepaymentsOfDebt", CashFlow),
    // Share counts
    spec("CommonStockSharesOutstanding", Other),
    spec("CommonStockSharesIssued", Other),
];

/// Concept names belonging to one family, in catalog order
pub fn concepts_for(family: StatementFamily) -> Vec<&'static str> {
    CONCEPT_CATALOG
        .iter()
        .filter(|c| c.family == family)
        .map(|c| c.name)
        .collect()
}

/// Family of a catalogued concept (exact name)
pub fn family_of(name: &str) -> Option<StatementFamily> {
    CONCEPT_CATALOG
        .iter()
        .find(|c| c.name == name)
        .map(|c| c.family)
}

/// Every catalogued concept name, in catalog order
pub fn all_concepts() -> Vec<&'static str> {
    CONCEPT_CATALOG.iter().map(|c| c.name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_family_sizes() {
        assert_eq!(CONCEPT_CATALOG.len(), 42);
        assert_eq!(concepts_for(Income).len(), 14);
        assert_eq!(concepts_for(Balance).len(), 17);
        assert_eq!(concepts_for(CashFlow).len(), 9);
        assert_eq!(concepts_for(Other).len(), 2);
    }

    #[test]
    fn test_names_are_unique() {
        let names: HashSet<_> = CONCEPT_CATALOG.iter().map(|c| c.name).collect();
        assert_eq!(names.len(), CONCEPT_CATALOG.len());
    }

    #[test]
    fn test_family_of() {
        assert_eq!(family_of("NetIncomeLoss"), Some(Income));
        assert_eq!(family_of("Goodwill"), Some(Balance));
        assert_eq!(family_of("CommonStockSharesIssued"), Some(Other));
        assert_eq!(family_of("netincomeloss"), None);
        assert_eq!(family_of("NotAConcept"), None);
    }

    #[test]
    fn test_statement_family_parse() {
        assert_eq!("income".parse::<StatementFamily>(), Ok(Income));
        assert_eq!("Balance".parse::<StatementFamily>(), Ok(Balance));
        assert_eq!("cash".parse::<StatementFamily>(), Ok(CashFlow));
        assert_eq!("cash_flow".parse::<StatementFamily>(), Ok(CashFlow));
        assert_eq!("cashflow".parse::<StatementFamily>(), Ok(CashFlow));
        assert_eq!("shares".parse::<StatementFamily>(), Ok(Other));
        assert!("equity".parse::<StatementFamily>().is_err());
    }

    #[test]
    fn test_as_str_round_trips() {
        for family in StatementFamily::ALL {
            assert_eq!(StatementFamily::parse(family.as_str()), Some(family));
        }
    }
}
