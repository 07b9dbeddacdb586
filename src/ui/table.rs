use tabled::{settings::Style, Table, Tabled};

use crate::record::DermatologistRecord;

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Tabled)]
struct RecordRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "City")]
    city: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Specialties")]
    specialties: String,
}

pub struct TableBuilder {
    rows: Vec<TableRow>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    pub fn add_row(&mut self, label: &str, value: &str) {
        self.rows.push(TableRow {
            metric: label.to_string(),
            value: value.to_string(),
        });
    }

    pub fn build(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }

        Table::new(&self.rows).with(Style::rounded()).to_string()
    }
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn stats_table(stats: &[(&str, &str)]) -> String {
    let mut builder = TableBuilder::new();
    for (label, value) in stats {
        builder.add_row(label, value);
    }
    builder.build()
}

pub fn records_table(records: &[DermatologistRecord]) -> String {
    let rows: Vec<RecordRow> = records
        .iter()
        .map(|r| RecordRow {
            id: r.id,
            name: r.name.clone(),
            city: r.city.clone(),
            status: r.status.clone(),
            specialties: r.specialties.clone().unwrap_or_default(),
        })
        .collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::seed_records;

    #[test]
    fn test_empty_stats_table() {
        assert!(TableBuilder::new().build().is_empty());
    }

    #[test]
    fn test_records_table_lists_every_row() {
        let table = records_table(&seed_records());
        assert!(table.contains("Specialties"));
        assert!(table.contains("Dr. David Brown"));
        assert!(table.contains("Psoriasis, Skin Cancer"));
    }
}
