//! Aggregates behind the insights dashboard charts

use crate::core::columns::{ColumnMapping, ColumnRole};
use crate::types::NormalizedTable;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

const TOP_SECTORS: usize = 10;
const TOP_STAGES: usize = 6;
const FIRST_YEAR: i32 = 2000;
const OTHERS: &str = "Others";

/// A labelled count in a distribution
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bucket {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearCount {
    pub year: i32,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CityPoint {
    pub city: String,
    pub count: usize,
    /// (lat, lon) for cities on the map
    pub coords: Option<(f64, f64)>,
}

/// Descending by count, ties broken by label
fn ranked(counts: HashMap<String, usize>) -> Vec<Bucket> {
    let mut buckets: Vec<Bucket> = counts
        .into_iter()
        .map(|(label, count)| Bucket { label, count })
        .collect();
    buckets.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    buckets
}

/// Keep the top `n` buckets and fold the rest into `Others`
fn top_with_others(mut buckets: Vec<Bucket>, n: usize) -> Vec<Bucket> {
    if buckets.len() <= n {
        return buckets;
    }
    let rest: usize = buckets.split_off(n).iter().map(|b| b.count).sum();
    match buckets.iter_mut().find(|b| b.label == OTHERS) {
        Some(others) => others.count += rest,
        None => buckets.push(Bucket {
            label: OTHERS.to_string(),
            count: rest,
        }),
    }
    buckets
}

fn count_by<F>(table: &NormalizedTable, key: &str, mut label: F) -> HashMap<String, usize>
where
    F: FnMut(Option<String>) -> Option<String>,
{
    let mut counts = HashMap::new();
    for row in 0..table.row_count() {
        if let Some(l) = label(table.text(row, key)) {
            *counts.entry(l).or_insert(0) += 1;
        }
    }
    counts
}

/// Sector pie: top ten sectors plus `Others`
pub fn sector_distribution(table: &NormalizedTable, key: &str) -> Vec<Bucket> {
    top_with_others(ranked(count_by(table, key, |v| v)), TOP_SECTORS)
}

/// Companies per founding year, ascending, limited to 2000..=current_year
pub fn founding_years(table: &NormalizedTable, key: &str, current_year: i32) -> Vec<YearCount> {
    let mut counts: BTreeMap<i32, usize> = BTreeMap::new();
    for row in 0..table.row_count() {
        let year = table
            .cell(row, key)
            .and_then(|c| c.as_number())
            .filter(|y| y.is_finite())
            .map(|y| y.trunc() as i32);
        if let Some(year) = year.filter(|y| (FIRST_YEAR..=current_year).contains(y)) {
            *counts.entry(year).or_insert(0) += 1;
        }
    }
    counts
        .into_iter()
        .map(|(year, count)| YearCount { year, count })
        .collect()
}

/// Bucket a free-text funding stage
pub fn normalize_stage(raw: Option<&str>) -> &'static str {
    let Some(raw) = raw else {
        return "Unfunded";
    };
    let v = raw.to_lowercase();
    if v.contains("boot") || v.contains("self") {
        "Bootstrapped"
    } else if v.contains("pre") && v.contains("seed") {
        "Pre-Seed"
    } else if v.contains("seed") {
        "Seed"
    } else if v.contains("series a") {
        "Series A"
    } else if v.contains("series b") {
        "Series B"
    } else if v.contains("angel") {
        "Angel"
    } else {
        OTHERS
    }
}

/// Funding stage bar: top six buckets plus `Others`
pub fn stage_distribution(table: &NormalizedTable, key: &str) -> Vec<Bucket> {
    let counts = count_by(table, key, |v| Some(normalize_stage(v.as_deref()).to_string()));
    top_with_others(ranked(counts), TOP_STAGES)
}

/// Bucket a free-text founder type into a gender label
pub fn normalize_gender(raw: Option<&str>) -> &'static str {
    let Some(raw) = raw else {
        return "Unknown";
    };
    let v = raw.to_lowercase();
    if v.contains("mix") || v.contains("both") || v.contains("diverse") {
        "Mixed"
    } else if v.contains("female") {
        "Female"
    } else if v.contains("male") {
        "Male"
    } else {
        "Unknown"
    }
}

pub fn gender_distribution(table: &NormalizedTable, key: &str) -> Vec<Bucket> {
    ranked(count_by(table, key, |v| {
        Some(normalize_gender(v.as_deref()).to_string())
    }))
}

/// Spelling variants → canonical city, checked in order by substring
const CITY_ALIASES: &[(&str, &str)] = &[
    ("bangalore", "Bengaluru"),
    ("bengaluru", "Bengaluru"),
    ("delhi", "Delhi"),
    ("new delhi", "Delhi"),
    ("delhi ncr", "Delhi"),
    ("mumbai", "Mumbai"),
    ("bombay", "Mumbai"),
    ("chennai", "Chennai"),
    ("madras", "Chennai"),
    ("kolkata", "Kolkata"),
    ("calcutta", "Kolkata"),
    ("pune", "Pune"),
    ("poona", "Pune"),
    ("gurgaon", "Gurugram"),
    ("gurugram", "Gurugram"),
];

const CITY_COORDS: &[(&str, (f64, f64))] = &[
    ("Delhi", (28.61, 77.20)),
    ("Mumbai", (19.07, 72.87)),
    ("Bengaluru", (12.97, 77.59)),
    ("Chennai", (13.08, 80.27)),
    ("Hyderabad", (17.38, 78.48)),
    ("Pune", (18.52, 73.85)),
    ("Kolkata", (22.57, 88.36)),
    ("Gurugram", (28.45, 77.02)),
];

fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

/// Canonical city name: alias table first, otherwise title case
pub fn normalize_city(raw: &str) -> String {
    let v = raw.to_lowercase();
    CITY_ALIASES
        .iter()
        .find(|(alias, _)| v.contains(alias))
        .map(|(_, city)| city.to_string())
        .unwrap_or_else(|| title_case(&v))
}

pub fn city_coords(city: &str) -> Option<(f64, f64)> {
    CITY_COORDS
        .iter()
        .find(|(name, _)| *name == city)
        .map(|(_, coords)| *coords)
}

pub fn city_distribution(table: &NormalizedTable, key: &str) -> Vec<CityPoint> {
    ranked(count_by(table, key, |v| v.map(|c| normalize_city(&c))))
        .into_iter()
        .map(|b| CityPoint {
            coords: city_coords(&b.label),
            city: b.label,
            count: b.count,
        })
        .collect()
}

/// All dashboard aggregates; a chart is absent when its column is unresolved
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insights {
    pub sectors: Option<Vec<Bucket>>,
    pub founding_years: Option<Vec<YearCount>>,
    pub stages: Option<Vec<Bucket>>,
    pub founder_gender: Option<Vec<Bucket>>,
    pub cities: Option<Vec<CityPoint>>,
}

impl Insights {
    pub fn compute(table: &NormalizedTable, mapping: &ColumnMapping, current_year: i32) -> Self {
        Self {
            sectors: mapping
                .get(ColumnRole::Sector)
                .map(|k| sector_distribution(table, k)),
            founding_years: mapping
                .get(ColumnRole::FoundingYear)
                .map(|k| founding_years(table, k, current_year)),
            stages: mapping
                .get(ColumnRole::FundingLevel)
                .map(|k| stage_distribution(table, k)),
            founder_gender: mapping
                .get(ColumnRole::FounderType)
                .map(|k| gender_distribution(table, k)),
            cities: mapping
                .get(ColumnRole::City)
                .map(|k| city_distribution(table, k)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::columns::Page;
    use crate::types::{Column, ColumnValues};

    fn text_column(key: &str, values: &[Option<&str>]) -> Column {
        Column::new(
            key,
            ColumnValues::Text(values.iter().map(|v| v.map(str::to_string)).collect()),
        )
    }

    fn bucket(label: &str, count: usize) -> Bucket {
        Bucket {
            label: label.to_string(),
            count,
        }
    }

    #[test]
    fn test_sector_top_ten_plus_others() {
        let mut values: Vec<String> = Vec::new();
        for i in 0..12 {
            // sector_i appears 12 - i times
            for _ in 0..(12 - i) {
                values.push(format!("sector_{:02}", i));
            }
        }
        let refs: Vec<Option<&str>> = values.iter().map(|s| Some(s.as_str())).collect();
        let table = NormalizedTable::from_columns(vec![text_column("sector", &refs)]).unwrap();

        let dist = sector_distribution(&table, "sector");
        assert_eq!(dist.len(), 11);
        assert_eq!(dist[0], bucket("sector_00", 12));
        assert_eq!(dist[10], bucket("Others", 2 + 1));
    }

    #[test]
    fn test_founding_years_range_and_coercion() {
        let table = NormalizedTable::from_columns(vec![Column::new(
            "founding_year",
            ColumnValues::Number(vec![
                Some(2015.0),
                Some(1999.0),
                Some(2015.0),
                None,
                Some(2031.0),
                Some(2020.0),
            ]),
        )])
        .unwrap();
        let years = founding_years(&table, "founding_year", 2026);
        assert_eq!(
            years,
            vec![
                YearCount { year: 2015, count: 2 },
                YearCount { year: 2020, count: 1 }
            ]
        );

        let text = NormalizedTable::from_columns(vec![text_column(
            "founded",
            &[Some("2018"), Some("circa 2010"), Some(" 2019 ")],
        )])
        .unwrap();
        assert_eq!(
            founding_years(&text, "founded", 2026),
            vec![
                YearCount { year: 2018, count: 1 },
                YearCount { year: 2019, count: 1 }
            ]
        );
    }

    #[test]
    fn test_normalize_stage() {
        assert_eq!(normalize_stage(None), "Unfunded");
        assert_eq!(normalize_stage(Some("Self-funded")), "Bootstrapped");
        assert_eq!(normalize_stage(Some("Pre Seed")), "Pre-Seed");
        assert_eq!(normalize_stage(Some("Seed")), "Seed");
        assert_eq!(normalize_stage(Some("Series A")), "Series A");
        assert_eq!(normalize_stage(Some("series b+")), "Series B");
        assert_eq!(normalize_stage(Some("Angel round")), "Angel");
        assert_eq!(normalize_stage(Some("IPO")), "Others");
    }

    #[test]
    fn test_stage_distribution_merges_into_existing_others() {
        let table = NormalizedTable::from_columns(vec![text_column(
            "funding_level",
            &[
                Some("IPO"),
                Some("IPO"),
                Some("IPO"),
                Some("Seed"),
                Some("Seed"),
                Some("Series A"),
                Some("Series B"),
                Some("Angel"),
                Some("Pre-seed"),
                Some("Bootstrapped"),
                None,
            ],
        )])
        .unwrap();
        let dist = stage_distribution(&table, "funding_level");
        assert_eq!(dist.len(), 6);
        assert_eq!(dist[0], bucket("Others", 3 + 2));
        assert_eq!(dist[1], bucket("Seed", 2));
        assert_eq!(dist.iter().map(|b| b.count).sum::<usize>(), 11);
    }

    #[test]
    fn test_normalize_gender() {
        assert_eq!(normalize_gender(Some("Female")), "Female");
        assert_eq!(normalize_gender(Some("Male")), "Male");
        assert_eq!(normalize_gender(Some("Mixed team")), "Mixed");
        assert_eq!(normalize_gender(Some("Both")), "Mixed");
        assert_eq!(normalize_gender(Some("n/a")), "Unknown");
        assert_eq!(normalize_gender(None), "Unknown");
    }

    #[test]
    fn test_normalize_city() {
        assert_eq!(normalize_city("Bangalore"), "Bengaluru");
        assert_eq!(normalize_city("New Delhi"), "Delhi");
        assert_eq!(normalize_city("Gurgaon, Haryana"), "Gurugram");
        assert_eq!(normalize_city("hyderabad"), "Hyderabad");
        assert_eq!(normalize_city("navi mumbai"), "Mumbai");
        assert_eq!(normalize_city("SAN FRANCISCO"), "San Francisco");
        assert_eq!(city_coords("Hyderabad"), Some((17.38, 78.48)));
        assert_eq!(city_coords("San Francisco"), None);
    }

    #[test]
    fn test_compute_skips_unresolved_charts() {
        let table = NormalizedTable::from_columns(vec![
            text_column("company", &[Some("Acme"), Some("Beta")]),
            text_column("city", &[Some("Bombay"), Some("Mumbai")]),
        ])
        .unwrap();
        let mapping = ColumnMapping::for_page(&table, Page::Insights);
        let insights = Insights::compute(&table, &mapping, 2026);

        assert!(insights.sectors.is_none());
        assert!(insights.founding_years.is_none());
        assert_eq!(
            insights.cities,
            Some(vec![CityPoint {
                city: "Mumbai".to_string(),
                count: 2,
                coords: Some((19.07, 72.87)),
            }])
        );
    }
}
