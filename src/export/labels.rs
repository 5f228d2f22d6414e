//! Display labels for enumerated codes and column headers.
//!
//! Exports meant for people show "Voltooid" instead of `completed`. Fixed
//! enumerations use static mappings; a code without a mapping is written
//! verbatim so rows added after the mapping was last touched still export
//! losslessly. Gas types are managed in the database, so their names come
//! from [`LabelLookups`] loaded at export time.

use std::collections::HashMap;

use serde_json::Value;

use crate::source::Row;

use super::tables::ExportTable;

/// Label for an enumerated value, if one is known.
pub fn value_label(table: ExportTable, column: &str, value: &str) -> Option<&'static str> {
    match (column, table) {
        (
            "status",
            ExportTable::Orders | ExportTable::GasCylinderOrders | ExportTable::DryIceOrders,
        ) => order_status_label(value),
        ("location", ExportTable::GasCylinderOrders) => location_label(value),
        ("gas_grade", ExportTable::GasCylinderOrders) => gas_grade_label(value),
        ("gas_type", ExportTable::GasCylinderOrders) => gas_type_label(value),
        ("product_type", ExportTable::DryIceOrders) => dry_ice_product_label(value),
        _ => None,
    }
}

fn order_status_label(value: &str) -> Option<&'static str> {
    match value {
        "pending" => Some("Gepland"),
        "in_progress" => Some("Bezig"),
        "completed" => Some("Voltooid"),
        "cancelled" => Some("Geannuleerd"),
        _ => None,
    }
}

fn location_label(value: &str) -> Option<&'static str> {
    match value {
        "sol_emmen" => Some("SOL Emmen"),
        "sol_tilburg" => Some("SOL Tilburg"),
        _ => None,
    }
}

fn gas_grade_label(value: &str) -> Option<&'static str> {
    match value {
        "medical" => Some("Medicinaal"),
        "technical" => Some("Technisch"),
        _ => None,
    }
}

fn gas_type_label(value: &str) -> Option<&'static str> {
    match value {
        "co2" => Some("CO2"),
        "nitrogen" => Some("Stikstof"),
        "argon" => Some("Argon"),
        "acetylene" => Some("Acetyleen"),
        "oxygen" => Some("Zuurstof"),
        "helium" => Some("Helium"),
        "other" => Some("Overig"),
        _ => None,
    }
}

fn dry_ice_product_label(value: &str) -> Option<&'static str> {
    match value {
        "blocks" => Some("Blokken"),
        "pellets" => Some("Pellets"),
        "sticks" => Some("Sticks"),
        _ => None,
    }
}

/// Names read from lookup tables when an export starts.
#[derive(Debug, Clone, Default)]
pub struct LabelLookups {
    gas_types: HashMap<i64, String>,
}

impl LabelLookups {
    /// Whether labelled exports of `table` resolve names through a lookup table.
    pub fn needed_for(table: ExportTable) -> bool {
        matches!(table, ExportTable::GasCylinderOrders)
    }

    /// Adds `gas_types` rows by their `id` and `name` columns.
    pub fn add_gas_types(&mut self, rows: &[Row]) {
        for row in rows {
            let id = row.get("id").and_then(as_id);
            if let (Some(id), Some(Value::String(name))) = (id, row.get("name")) {
                self.gas_types.insert(id, name.clone());
            }
        }
    }

    pub fn gas_type_name(&self, id: i64) -> Option<&str> {
        self.gas_types.get(&id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.gas_types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gas_types.is_empty()
    }
}

/// Ids arrive as numbers from both backends, or as strings from hand-edited data.
fn as_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// The gas type name a cylinder order's `gas_type_id` points at.
fn referenced_gas_type(table: ExportTable, row: &Row, lookups: &LabelLookups) -> Option<String> {
    if table != ExportTable::GasCylinderOrders {
        return None;
    }
    let id = row.get("gas_type_id").and_then(as_id)?;
    lookups.gas_type_name(id).map(str::to_string)
}

/// Human-readable header for a column, if one is known.
pub fn column_display_name(column: &str) -> Option<&'static str> {
    let name = match column {
        "order_number" => "Ordernummer",
        "customer_name" => "Klant",
        "gas_type" => "Gastype",
        "gas_grade" => "Kwaliteit",
        "cylinder_size" => "Cilindergrootte",
        "cylinder_count" => "Aantal Cilinders",
        "pressure" => "Druk (bar)",
        "scheduled_date" => "Datum",
        "delivery_date" => "Leverdatum",
        "status" => "Status",
        "location" => "Locatie",
        "notes" => "Opmerkingen",
        "product_type" => "Producttype",
        "quantity_kg" => "Hoeveelheid (kg)",
        "box_count" => "Aantal dozen",
        "container_has_wheels" => "Container met wielen",
        "is_recurring" => "Terugkerend",
        "recurrence_end_date" => "Einddatum herhaling",
        "name" => "Naam",
        "description" => "Omschrijving",
        "contact_person" => "Contactpersoon",
        "email" => "E-mail",
        "phone" => "Telefoon",
        "address" => "Adres",
        "article_code" => "Artikelcode",
        "category" => "Categorie",
        "is_active" => "Actief",
        "sort_order" => "Volgorde",
        "created_at" => "Aangemaakt op",
        "updated_at" => "Bijgewerkt op",
        _ => return None,
    };
    Some(name)
}

/// Header text for a column: its display name when labels are on, else the raw name.
pub fn header_for(column: &str, labels: bool) -> &str {
    if labels {
        column_display_name(column).unwrap_or(column)
    } else {
        column
    }
}

/// Replaces known codes in `rows` with their labels. Returns how many values changed.
///
/// A gas cylinder order's `gas_type` shows the name its `gas_type_id` points
/// at, falling back to the label of the legacy code.
pub fn translate_rows(table: ExportTable, rows: &mut [Row], lookups: &LabelLookups) -> usize {
    let mut translated = 0;
    for row in rows.iter_mut() {
        let gas_type_name = referenced_gas_type(table, row, lookups);
        for (column, value) in row.iter_mut() {
            if let (Some(name), "gas_type") = (&gas_type_name, column.as_str()) {
                *value = Value::String(name.clone());
                translated += 1;
                continue;
            }
            let Value::String(code) = value else {
                continue;
            };
            if let Some(label) = value_label(table, column, code) {
                *value = Value::String(label.to_string());
                translated += 1;
            }
        }
    }
    translated
}
