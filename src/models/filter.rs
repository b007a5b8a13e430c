// src/models/filter.rs

use chrono::NaiveDate;
use utoipa::IntoParams;

use crate::common::query_parser::{non_empty, parse_date, parse_list_param, parse_number};

// Parâmetros crus da query string, exatamente como o frontend manda.
// Tudo é String opcional: a validação é permissiva e acontece em `FilterCriteria::from_params`.
#[derive(Debug, Default, IntoParams)]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct SalesQueryParams {
    /// Busca por nome do cliente (sem diferenciar maiúsculas) ou telefone
    pub search: Option<String>,
    /// Lista separada por vírgula
    pub regions: Option<String>,
    pub genders: Option<String>,
    pub product_categories: Option<String>,
    pub tags: Option<String>,
    pub payment_methods: Option<String>,
    pub age_min: Option<String>,
    pub age_max: Option<String>,
    /// YYYY-MM-DD
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    /// date | quantity | customerName
    pub sort_by: Option<String>,
    /// asc | desc
    pub sort_order: Option<String>,
    pub page: Option<String>,
}

impl SalesQueryParams {
    /// Monta a partir dos pares crus da URL. Nunca falha: chave desconhecida é ignorada,
    /// chave de lista repetida acumula (`?tags=a&tags=b` == `?tags=a,b`), escalar repetido fica com o último.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut params = Self::default();

        for (key, value) in pairs {
            let (slot, is_list) = match key.as_str() {
                "search" => (&mut params.search, false),
                "regions" => (&mut params.regions, true),
                "genders" => (&mut params.genders, true),
                "productCategories" => (&mut params.product_categories, true),
                "tags" => (&mut params.tags, true),
                "paymentMethods" => (&mut params.payment_methods, true),
                "ageMin" => (&mut params.age_min, false),
                "ageMax" => (&mut params.age_max, false),
                "dateFrom" => (&mut params.date_from, false),
                "dateTo" => (&mut params.date_to, false),
                "sortBy" => (&mut params.sort_by, false),
                "sortOrder" => (&mut params.sort_order, false),
                "page" => (&mut params.page, false),
                _ => continue,
            };

            match slot {
                Some(existing) if is_list => {
                    existing.push(',');
                    existing.push_str(&value);
                }
                _ => *slot = Some(value),
            }
        }

        params
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Date,
    Quantity,
    CustomerName,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub field: SortField,
    pub order: SortOrder,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self {
            field: SortField::Date,
            order: SortOrder::Desc,
        }
    }
}

impl SortSpec {
    /// Campo desconhecido cai no padrão (data, mais recente primeiro), ignorando a ordem pedida.
    pub fn resolve(sort_by: Option<&str>, sort_order: Option<&str>) -> Self {
        let order = match sort_order {
            Some(o) if o.eq_ignore_ascii_case("asc") => SortOrder::Asc,
            _ => SortOrder::Desc,
        };

        let field = match sort_by.filter(|s| !s.is_empty()) {
            None | Some("date") => SortField::Date,
            Some("quantity") => SortField::Quantity,
            Some("customerName") => SortField::CustomerName,
            Some(_) => return Self::default(),
        };

        Self { field, order }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterCriteria {
    pub search: Option<String>,
    pub regions: Vec<String>,
    pub genders: Vec<String>,
    pub product_categories: Vec<String>,
    pub tags: Vec<String>,
    pub payment_methods: Vec<String>,
    pub age_min: Option<i32>,
    pub age_max: Option<i32>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub sort: SortSpec,
    /// Página pedida (>= 1). O clamp para o total de páginas acontece depois da contagem.
    pub page: i64,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            search: None,
            regions: Vec::new(),
            genders: Vec::new(),
            product_categories: Vec::new(),
            tags: Vec::new(),
            payment_methods: Vec::new(),
            age_min: None,
            age_max: None,
            date_from: None,
            date_to: None,
            sort: SortSpec::default(),
            page: 1,
        }
    }
}

impl FilterCriteria {
    pub fn from_params(params: &SalesQueryParams) -> Self {
        // Idades são inteiras: arredondar os limites para dentro não muda o resultado.
        let age_min = parse_number(params.age_min.as_deref()).map(|n| to_i32(n.ceil()));
        let age_max = parse_number(params.age_max.as_deref()).map(|n| to_i32(n.floor()));

        let page = parse_number(params.page.as_deref())
            .map(|n| n.trunc())
            .filter(|n| *n >= 1.0)
            .map(|n| n.min(i64::MAX as f64) as i64)
            .unwrap_or(1);

        Self {
            search: non_empty(params.search.as_deref()),
            regions: parse_list_param(params.regions.as_deref()),
            genders: parse_list_param(params.genders.as_deref()),
            product_categories: parse_list_param(params.product_categories.as_deref()),
            tags: parse_list_param(params.tags.as_deref()),
            payment_methods: parse_list_param(params.payment_methods.as_deref()),
            age_min,
            age_max,
            date_from: parse_date(params.date_from.as_deref()),
            date_to: parse_date(params.date_to.as_deref()),
            sort: SortSpec::resolve(params.sort_by.as_deref(), params.sort_order.as_deref()),
            page,
        }
    }
}

fn to_i32(n: f64) -> i32 {
    n.clamp(i32::MIN as f64, i32::MAX as f64) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> SalesQueryParams {
        SalesQueryParams::default()
    }

    #[test]
    fn empty_params_produce_defaults() {
        let criteria = FilterCriteria::from_params(&params());
        assert_eq!(criteria, FilterCriteria::default());
    }

    #[test]
    fn multi_select_params_are_split() {
        let criteria = FilterCriteria::from_params(&SalesQueryParams {
            regions: Some("North, South".into()),
            tags: Some("sale,,organic ".into()),
            ..params()
        });
        assert_eq!(criteria.regions, vec!["North", "South"]);
        assert_eq!(criteria.tags, vec!["sale", "organic"]);
        assert!(criteria.genders.is_empty());
    }

    #[test]
    fn malformed_numbers_and_dates_mean_no_filter() {
        let criteria = FilterCriteria::from_params(&SalesQueryParams {
            age_min: Some("abc".into()),
            age_max: Some("".into()),
            date_from: Some("not-a-date".into()),
            page: Some("two".into()),
            ..params()
        });
        assert_eq!(criteria.age_min, None);
        assert_eq!(criteria.age_max, None);
        assert_eq!(criteria.date_from, None);
        assert_eq!(criteria.page, 1);
    }

    #[test]
    fn fractional_ages_round_inwards() {
        let criteria = FilterCriteria::from_params(&SalesQueryParams {
            age_min: Some("30.5".into()),
            age_max: Some("40.9".into()),
            ..params()
        });
        assert_eq!(criteria.age_min, Some(31));
        assert_eq!(criteria.age_max, Some(40));
    }

    #[test]
    fn page_below_one_becomes_one() {
        for raw in ["0", "-3", "0.5"] {
            let criteria = FilterCriteria::from_params(&SalesQueryParams {
                page: Some(raw.into()),
                ..params()
            });
            assert_eq!(criteria.page, 1, "page={raw}");
        }

        let criteria = FilterCriteria::from_params(&SalesQueryParams {
            page: Some("3.7".into()),
            ..params()
        });
        assert_eq!(criteria.page, 3);
    }

    #[test]
    fn sort_resolution() {
        assert_eq!(SortSpec::resolve(None, None), SortSpec::default());
        assert_eq!(
            SortSpec::resolve(Some("quantity"), Some("ASC")),
            SortSpec { field: SortField::Quantity, order: SortOrder::Asc }
        );
        assert_eq!(
            SortSpec::resolve(Some("customerName"), Some("desc")),
            SortSpec { field: SortField::CustomerName, order: SortOrder::Desc }
        );
        assert_eq!(
            SortSpec::resolve(None, Some("asc")),
            SortSpec { field: SortField::Date, order: SortOrder::Asc }
        );
        // campo desconhecido ignora a ordem pedida
        assert_eq!(SortSpec::resolve(Some("price"), Some("asc")), SortSpec::default());
    }

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn query_pairs_use_camel_case_keys() {
        let parsed = SalesQueryParams::from_pairs(pairs(&[
            ("productCategories", "Beauty"),
            ("ageMin", "18"),
            ("sortBy", "quantity"),
            ("pageSize", "50"),
        ]));
        let criteria = FilterCriteria::from_params(&parsed);
        assert_eq!(criteria.product_categories, vec!["Beauty"]);
        assert_eq!(criteria.age_min, Some(18));
        assert_eq!(criteria.sort.field, SortField::Quantity);
        assert_eq!(criteria.page, 1);
    }

    #[test]
    fn repeated_keys_never_fail() {
        let parsed = SalesQueryParams::from_pairs(pairs(&[
            ("tags", "sale"),
            ("tags", "eco,organic"),
            ("page", "2"),
            ("page", "5"),
        ]));
        let criteria = FilterCriteria::from_params(&parsed);
        assert_eq!(criteria.tags, vec!["sale", "eco", "organic"]);
        assert_eq!(criteria.page, 5);
    }
}
