//! Exportable tables and the allow-list that bounds them.
//!
//! Table names arrive as strings (CLI flags, JSON bodies) and are converted
//! into the closed [`ExportTable`] enum at the edge. Anything that does not
//! parse, or parses but is not on the configured [`AllowList`], is rejected
//! with [`ExportError::InvalidTable`] before a row source is consulted.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString, IntoStaticStr};

use crate::error_handling::ExportError;

/// A table that can be exported.
///
/// Variants are declared in dependency order: reference tables first, then the
/// tables that point at them. "All tables" exports follow this order so a
/// restore can replay the artifact top to bottom.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    EnumIter,
    EnumString,
    AsRefStr,
    IntoStaticStr,
    Display,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ExportTable {
    GasTypeCategories,
    GasTypes,
    CylinderSizes,
    DryIcePackaging,
    DryIceProductTypes,
    TaskTypes,
    TimeOffTypes,
    AppSettings,
    Customers,
    Products,
    Orders,
    GasCylinderOrders,
    DryIceOrders,
}

impl ExportTable {
    /// Parses a wire-level table name.
    pub fn parse(name: &str) -> Result<Self, ExportError> {
        ExportTable::from_str(name.trim()).map_err(|_| ExportError::InvalidTable(name.to_string()))
    }

    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    /// Column used by date and year filters, if the table has one.
    pub fn date_column(&self) -> Option<&'static str> {
        match self {
            ExportTable::Orders => Some("delivery_date"),
            ExportTable::GasCylinderOrders | ExportTable::DryIceOrders => Some("scheduled_date"),
            _ => None,
        }
    }

    /// Whether the table carries a production `location` column.
    pub fn has_location(&self) -> bool {
        matches!(self, ExportTable::GasCylinderOrders)
    }

    /// Columns giving a stable row order, so consecutive pages never overlap.
    pub fn order_columns(&self) -> &'static [&'static str] {
        match self {
            ExportTable::Orders => &["delivery_date", "id"],
            ExportTable::GasCylinderOrders | ExportTable::DryIceOrders => {
                &["scheduled_date", "id"]
            }
            _ => &["id"],
        }
    }

    /// Columns of the PlanningSOL schema for this table, in schema order.
    ///
    /// Row sources that can introspect the live schema prefer that; this list
    /// is the fallback for backends that cannot describe an empty table.
    pub fn known_columns(&self) -> &'static [&'static str] {
        match self {
            ExportTable::GasTypeCategories => &[
                "id",
                "name",
                "description",
                "is_active",
                "sort_order",
                "created_at",
                "updated_at",
            ],
            ExportTable::GasTypes => &[
                "id",
                "name",
                "description",
                "color",
                "category_id",
                "is_active",
                "sort_order",
                "created_at",
                "updated_at",
            ],
            ExportTable::CylinderSizes => &[
                "id",
                "name",
                "description",
                "capacity_liters",
                "is_active",
                "sort_order",
                "created_at",
                "updated_at",
            ],
            ExportTable::DryIcePackaging => &[
                "id",
                "name",
                "description",
                "capacity_kg",
                "is_active",
                "sort_order",
                "created_at",
                "updated_at",
            ],
            ExportTable::DryIceProductTypes => &[
                "id",
                "name",
                "description",
                "is_active",
                "sort_order",
                "created_at",
                "updated_at",
            ],
            ExportTable::TaskTypes => &[
                "id",
                "name",
                "description",
                "color",
                "parent_id",
                "is_active",
                "sort_order",
                "created_at",
                "updated_at",
            ],
            ExportTable::TimeOffTypes => &[
                "id",
                "name",
                "description",
                "color",
                "is_active",
                "created_at",
                "updated_at",
            ],
            ExportTable::AppSettings => &[
                "id",
                "key",
                "value",
                "description",
                "created_at",
                "updated_at",
            ],
            ExportTable::Customers => &[
                "id",
                "name",
                "contact_person",
                "email",
                "phone",
                "address",
                "notes",
                "is_active",
                "created_at",
                "updated_at",
            ],
            ExportTable::Products => &[
                "id",
                "article_code",
                "name",
                "description",
                "category",
                "size_liters",
                "is_active",
                "sort_order",
                "created_at",
                "updated_at",
            ],
            ExportTable::Orders => &[
                "id",
                "order_number",
                "customer_id",
                "customer_name",
                "delivery_date",
                "status",
                "notes",
                "created_by",
                "created_at",
                "updated_at",
            ],
            ExportTable::GasCylinderOrders => &[
                "id",
                "order_number",
                "customer_id",
                "customer_name",
                "gas_type",
                "gas_type_id",
                "gas_grade",
                "cylinder_size",
                "cylinder_count",
                "pressure",
                "scheduled_date",
                "status",
                "location",
                "notes",
                "created_by",
                "created_at",
                "updated_at",
            ],
            ExportTable::DryIceOrders => &[
                "id",
                "order_number",
                "customer_id",
                "customer_name",
                "product_type",
                "product_type_id",
                "packaging_id",
                "quantity_kg",
                "box_count",
                "container_has_wheels",
                "scheduled_date",
                "status",
                "is_recurring",
                "recurrence_end_date",
                "parent_order_id",
                "assigned_to",
                "notes",
                "created_by",
                "created_at",
                "updated_at",
            ],
        }
    }
}

/// The set of tables a deployment permits to be exported.
///
/// Ordered and free of duplicates. Built from configuration and injected into
/// the exporter; callers never widen it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowList {
    tables: Vec<ExportTable>,
}

impl AllowList {
    /// Every known table, in dependency order.
    pub fn all() -> Self {
        Self {
            tables: ExportTable::iter().collect(),
        }
    }

    /// An allow-list of the given tables, normalized to dependency order.
    pub fn new(tables: impl IntoIterator<Item = ExportTable>) -> Self {
        let mut tables: Vec<ExportTable> = tables.into_iter().collect();
        tables.sort();
        tables.dedup();
        Self { tables }
    }

    /// Parses configured table names. An empty list means every table.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self, ExportError> {
        if names.is_empty() {
            return Ok(Self::all());
        }
        let tables = names
            .iter()
            .map(|name| ExportTable::parse(name.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(tables))
    }

    pub fn contains(&self, table: ExportTable) -> bool {
        self.tables.contains(&table)
    }

    pub fn tables(&self) -> &[ExportTable] {
        &self.tables
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl Default for AllowList {
    fn default() -> Self {
        Self::all()
    }
}

/// Which tables a request asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableSelection {
    /// Every allow-listed table, in allow-list order.
    All,
    /// The named tables, in the order supplied.
    Only(Vec<ExportTable>),
}

impl TableSelection {
    /// Converts wire-level names. No names means every allow-listed table.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self, ExportError> {
        if names.is_empty() {
            return Ok(TableSelection::All);
        }
        let mut tables = Vec::with_capacity(names.len());
        for name in names {
            let table = ExportTable::parse(name.as_ref())?;
            if !tables.contains(&table) {
                tables.push(table);
            }
        }
        Ok(TableSelection::Only(tables))
    }

    /// Resolves the selection against an allow-list.
    ///
    /// Fails on the first table outside the allow-list.
    pub fn resolve(&self, allow_list: &AllowList) -> Result<Vec<ExportTable>, ExportError> {
        match self {
            TableSelection::All => Ok(allow_list.tables().to_vec()),
            TableSelection::Only(tables) => {
                if let Some(denied) = tables.iter().find(|t| !allow_list.contains(**t)) {
                    return Err(ExportError::InvalidTable(denied.to_string()));
                }
                Ok(tables.clone())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_table() {
        assert_eq!(
            ExportTable::parse("customers").unwrap(),
            ExportTable::Customers
        );
        assert_eq!(
            ExportTable::parse(" gas_cylinder_orders ").unwrap(),
            ExportTable::GasCylinderOrders
        );
        assert_eq!(ExportTable::DryIceOrders.as_str(), "dry_ice_orders");
        assert_eq!(ExportTable::DryIceOrders.to_string(), "dry_ice_orders");
    }

    #[test]
    fn test_parse_unknown_table_is_invalid() {
        match ExportTable::parse("user_roles") {
            Err(ExportError::InvalidTable(name)) => assert_eq!(name, "user_roles"),
            other => panic!("expected InvalidTable, got {:?}", other),
        }
        assert!(ExportTable::parse("customers; DROP TABLE customers").is_err());
        assert!(ExportTable::parse("").is_err());
    }

    #[test]
    fn test_allow_list_normalizes_order_and_duplicates() {
        let list = AllowList::new([
            ExportTable::DryIceOrders,
            ExportTable::Customers,
            ExportTable::DryIceOrders,
        ]);
        assert_eq!(
            list.tables(),
            &[ExportTable::Customers, ExportTable::DryIceOrders]
        );
    }

    #[test]
    fn test_allow_list_from_names() {
        let list = AllowList::from_names(&["customers", "orders"]).unwrap();
        assert!(list.contains(ExportTable::Customers));
        assert!(!list.contains(ExportTable::AppSettings));

        let empty: [&str; 0] = [];
        assert_eq!(AllowList::from_names(&empty).unwrap(), AllowList::all());
        assert!(AllowList::from_names(&["profiles"]).is_err());
    }

    #[test]
    fn test_selection_keeps_supplied_order() {
        let selection = TableSelection::from_names(&["dry_ice_orders", "customers"]).unwrap();
        let tables = selection.resolve(&AllowList::all()).unwrap();
        assert_eq!(tables, vec![ExportTable::DryIceOrders, ExportTable::Customers]);
    }

    #[test]
    fn test_selection_all_follows_allow_list() {
        let list = AllowList::new([ExportTable::GasCylinderOrders, ExportTable::GasTypes]);
        let tables = TableSelection::All.resolve(&list).unwrap();
        assert_eq!(
            tables,
            vec![ExportTable::GasTypes, ExportTable::GasCylinderOrders]
        );
    }

    #[test]
    fn test_selection_outside_allow_list_is_rejected() {
        let list = AllowList::new([ExportTable::Customers]);
        let selection = TableSelection::from_names(&["customers", "app_settings"]).unwrap();
        match selection.resolve(&list) {
            Err(ExportError::InvalidTable(name)) => assert_eq!(name, "app_settings"),
            other => panic!("expected InvalidTable, got {:?}", other),
        }
    }

    #[test]
    fn test_dated_tables_order_by_their_date() {
        for table in ExportTable::iter() {
            if let Some(date) = table.date_column() {
                assert_eq!(table.order_columns()[0], date);
                assert!(table.known_columns().contains(&date));
            }
            assert!(table.known_columns().contains(&"id"));
        }
        assert!(ExportTable::GasCylinderOrders
            .known_columns()
            .contains(&"location"));
    }
}
