use crate::model::{
    CHANGE_FIELD, COMPANY_FIELD, FieldLabel, FieldMap, MarketError, MarketRecord, MarketTable,
};
use crate::utils::parse_number;
use std::collections::HashSet;
use tracing::warn;

/// Indexes enriched rows by company and orders them by `Change`, ascending.
pub fn normalize_all(enriched: Vec<FieldMap>) -> Result<MarketTable, MarketError> {
    let mut seen = HashSet::new();
    let mut records = Vec::with_capacity(enriched.len());

    for fields in enriched {
        let record = normalize_record(fields)?;
        if !seen.insert(record.company.clone()) {
            return Err(MarketError::DuplicateCompany(record.company));
        }
        records.push(record);
    }

    // Stable, so equal changes keep table order.
    records.sort_by(|a, b| a.change.total_cmp(&b.change));
    Ok(MarketTable { records })
}

fn normalize_record(fields: FieldMap) -> Result<MarketRecord, MarketError> {
    for column in [COMPANY_FIELD, CHANGE_FIELD] {
        if !fields.contains(column) {
            return Err(MarketError::MissingColumn(column.to_string()));
        }
    }

    let company = fields
        .get(COMPANY_FIELD)
        .ok_or_else(|| MarketError::MissingColumn(format!("{} (empty)", COMPANY_FIELD)))?
        .to_string();
    let raw_change = fields.get(CHANGE_FIELD).unwrap_or_default().to_string();
    let change = parse_number(&raw_change)
        .filter(|c| c.is_finite())
        .ok_or_else(|| MarketError::InvalidChange {
            company: company.clone(),
            value: raw_change.clone(),
        })?;

    let entries = fields.into_entries();
    let mut fields: Vec<(FieldLabel, Option<String>)> = Vec::with_capacity(entries.len());
    let mut company_taken = false;
    let mut change_taken = false;
    let mut suffix = 2;

    for (label, value) in &entries {
        if !company_taken && label == COMPANY_FIELD {
            company_taken = true;
            continue;
        }
        if label == CHANGE_FIELD {
            if !change_taken {
                change_taken = true;
                continue;
            }
            // "Change" is reserved for the numeric value in the stored record.
            let renamed = loop {
                let candidate = format!("{}_{}", CHANGE_FIELD, suffix);
                suffix += 1;
                if !entries.iter().any(|(l, _)| *l == candidate) {
                    break candidate;
                }
            };
            warn!("{}: extra {} column stored as {}", company, CHANGE_FIELD, renamed);
            fields.push((renamed, value.clone()));
            continue;
        }
        fields.push((label.clone(), value.clone()));
    }

    Ok(MarketRecord { company, change, fields })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(name: &str, change: Option<&str>) -> FieldMap {
        let header = vec!["Company Name".to_string(), "Link".to_string(), "Change".to_string()];
        let mut map = FieldMap::from_row(
            &header,
            &vec![Some(name.into()), Some(format!("/{}", name)), change.map(String::from)],
        );
        map.set("symbol", Some(name.to_uppercase()));
        map
    }

    #[test]
    fn test_sorted_ascending_by_change() {
        let table = normalize_all(vec![
            fields("a", Some("1.5")),
            fields("b", Some("-2.0")),
            fields("c", Some("0")),
        ])
        .unwrap();

        let order: Vec<&str> = table.records.iter().map(|r| r.company.as_str()).collect();
        assert_eq!(order, vec!["b", "c", "a"]);
        assert_eq!(table.records[0].change, -2.0);
    }

    #[test]
    fn test_company_and_change_leave_field_list() {
        let table = normalize_all(vec![fields("acme", Some("1"))]).unwrap();
        let record = table.get("acme").unwrap();
        let labels: Vec<&str> = record.fields.iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(labels, vec!["Link", "symbol"]);
        assert_eq!(record.get("Link"), Some("/acme"));
    }

    #[test]
    fn test_duplicate_company_rejected() {
        let err = normalize_all(vec![fields("x", Some("1")), fields("x", Some("2"))]);
        assert!(matches!(err, Err(MarketError::DuplicateCompany(c)) if c == "x"));
    }

    #[test]
    fn test_non_numeric_change_rejected() {
        for bad in [Some("--"), None, Some("NaN")] {
            let err = normalize_all(vec![fields("x", bad)]);
            assert!(matches!(err, Err(MarketError::InvalidChange { .. })), "{:?}", bad);
        }
    }

    #[test]
    fn test_repeated_change_column_renamed_and_round_trips() {
        let header: Vec<String> = ["Company Name", "Link", "Change", "Change"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let map = FieldMap::from_row(
            &header,
            &vec![
                Some("Acme".into()),
                Some("/x".into()),
                Some("1.5".into()),
                Some("2.1%".into()),
            ],
        );

        let table = normalize_all(vec![map]).unwrap();
        let record = table.get("Acme").unwrap();
        assert_eq!(record.change, 1.5);
        assert_eq!(record.get("Change"), None);
        assert_eq!(record.get("Change_2"), Some("2.1%"));

        let json = serde_json::to_string(&table).unwrap();
        let back: MarketTable = serde_json::from_str(&json).unwrap();
        assert_eq!(back, table);
        assert_eq!(back.get("Acme").unwrap().get("Change_2"), Some("2.1%"));
    }

    #[test]
    fn test_renamed_change_skips_taken_label() {
        let header: Vec<String> = ["Company Name", "Change", "Change_2", "Change"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let map = FieldMap::from_row(
            &header,
            &vec![Some("Acme".into()), Some("1".into()), Some("a".into()), Some("b".into())],
        );
        let table = normalize_all(vec![map]).unwrap();
        let record = table.get("Acme").unwrap();
        assert_eq!(record.get("Change_2"), Some("a"));
        assert_eq!(record.get("Change_3"), Some("b"));
    }

    #[test]
    fn test_missing_change_column() {
        let header = vec!["Company Name".to_string(), "Link".to_string()];
        let map = FieldMap::from_row(&header, &vec![Some("x".into()), Some("/x".into())]);
        assert!(matches!(
            normalize_all(vec![map]),
            Err(MarketError::MissingColumn(c)) if c == "Change"
        ));
    }
}
