// src/common/query_parser.rs

use chrono::{DateTime, NaiveDate, NaiveDateTime};

// Helpers tolerantes: entrada ruim vira "sem filtro", nunca erro.

/// "Norte, Sul,,Leste" -> ["Norte", "Sul", "Leste"]
pub fn parse_list_param(value: Option<&str>) -> Vec<String> {
    value
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Retorna `None` para vazio, lixo, NaN ou infinito. O chamador escolhe o padrão.
pub fn parse_number(value: Option<&str>) -> Option<f64> {
    let raw = value?.trim();
    if raw.is_empty() {
        return None;
    }
    raw.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Aceita `YYYY-MM-DD` ou um timestamp completo (só a parte da data é usada).
pub fn parse_date(value: Option<&str>) -> Option<NaiveDate> {
    let raw = value?.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.date_naive());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|ts| ts.date())
}

/// String vazia conta como ausente.
pub fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_param_splits_trims_and_drops_empties() {
        assert_eq!(
            parse_list_param(Some(" North, South ,,East ")),
            vec!["North", "South", "East"]
        );
        assert!(parse_list_param(Some("")).is_empty());
        assert!(parse_list_param(Some(" , ,")).is_empty());
        assert!(parse_list_param(None).is_empty());
    }

    #[test]
    fn number_falls_back_on_garbage() {
        assert_eq!(parse_number(Some("42")), Some(42.0));
        assert_eq!(parse_number(Some(" 30.5 ")), Some(30.5));
        assert_eq!(parse_number(Some("abc")), None);
        assert_eq!(parse_number(Some("")), None);
        assert_eq!(parse_number(Some("NaN")), None);
        assert_eq!(parse_number(Some("inf")), None);
        assert_eq!(parse_number(None), None);
    }

    #[test]
    fn date_accepts_plain_and_timestamp_forms() {
        let expected = NaiveDate::from_ymd_opt(2023, 3, 15);
        assert_eq!(parse_date(Some("2023-03-15")), expected);
        assert_eq!(parse_date(Some("2023-03-15T10:20:00Z")), expected);
        assert_eq!(parse_date(Some("2023-03-15T10:20:00")), expected);
        assert_eq!(parse_date(Some("2023-02-30")), None);
        assert_eq!(parse_date(Some("yesterday")), None);
        assert_eq!(parse_date(Some("")), None);
    }

    #[test]
    fn empty_search_is_absent() {
        assert_eq!(non_empty(Some("")), None);
        assert_eq!(non_empty(Some("ana")), Some("ana".to_string()));
        assert_eq!(non_empty(None), None);
    }
}
