use crate::cache::{CacheLoad, CacheManager, CacheState, LoadOrigin};
use crate::config::AnalyticsConfig;
use crate::core::columns::{ColumnMapping, ColumnRole, Page};
use crate::core::filters::{FilterSet, FundingFilter};
use crate::core::funding::{derive_funding, format_funding, funding_bounds};
use crate::core::insights::{Bucket, Insights};
use crate::core::profile::{build_profile, company_names, select_company};
use crate::error::{AnalyticsError, AnalyticsResult};
use crate::excel::TableExporter;
use crate::types::{format_number, CellRef, NormalizedTable};
use chrono::Datelike;
use colored::Colorize;
use serde_json::{Map, Value};
use std::path::PathBuf;

/// Roles shown (and exported) by the list view, in display order
const LIST_COLUMNS: [ColumnRole; 7] = [
    ColumnRole::Company,
    ColumnRole::Sector,
    ColumnRole::City,
    ColumnRole::Tier,
    ColumnRole::FundingLevel,
    ColumnRole::Funding,
    ColumnRole::Hot,
];

const BAR_WIDTH: usize = 30;

/// Flags shared by every subcommand; anything unset falls back to the config file
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    pub config: Option<PathBuf>,
    pub source: Option<PathBuf>,
    pub cache: Option<PathBuf>,
    pub ttl: Option<u64>,
    pub sheet: Option<String>,
    pub full_scan: bool,
}

impl GlobalOptions {
    pub fn resolve(&self) -> AnalyticsResult<AnalyticsConfig> {
        let mut config = match &self.config {
            Some(path) => AnalyticsConfig::from_file(path)?,
            None => AnalyticsConfig::default(),
        };
        if let Some(source) = &self.source {
            config.source = source.clone();
        }
        if let Some(cache) = &self.cache {
            config.cache = cache.clone();
        }
        if let Some(ttl) = self.ttl {
            config.ttl_secs = ttl;
        }
        if let Some(sheet) = &self.sheet {
            config.sheet = Some(sheet.clone());
        }
        if self.full_scan {
            config.full_scan_fallback = true;
        }
        config.validate()?;
        Ok(config)
    }
}

/// Funding flags of the list command
#[derive(Debug, Clone, Default)]
pub struct FundingArgs {
    pub unfunded_only: bool,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub exclude_unfunded: bool,
}

impl FundingArgs {
    /// Open range ends default to the observed funding bounds
    pub fn to_filter(&self, bounds: Option<(f64, f64)>) -> FundingFilter {
        if self.unfunded_only {
            return FundingFilter::UnfundedOnly;
        }
        if self.min.is_none() && self.max.is_none() && !self.exclude_unfunded {
            return FundingFilter::Any;
        }
        let (lo, hi) = bounds.unwrap_or((0.0, f64::MAX));
        FundingFilter::Range {
            min: self.min.unwrap_or(lo),
            max: self.max.unwrap_or(hi),
            include_unfunded: !self.exclude_unfunded,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ListArgs {
    pub sectors: Vec<String>,
    pub cities: Vec<String>,
    pub tiers: Vec<String>,
    pub hot: Vec<String>,
    pub keyword: Option<String>,
    pub funding: FundingArgs,
    pub limit: Option<usize>,
    pub export: Option<PathBuf>,
    pub json: bool,
}

fn load_table(config: AnalyticsConfig, quiet: bool) -> AnalyticsResult<CacheLoad> {
    let manager = CacheManager::new(config);
    let load = manager.load()?;
    if !quiet {
        if let LoadOrigin::Rebuilt(_) = load.origin {
            println!(
                "{}",
                "⚙️  Initial setup: data optimized for speed (cache written)".cyan()
            );
        }
    }
    Ok(load)
}

fn warn_missing(mapping: &ColumnMapping) {
    for role in mapping.missing() {
        eprintln!("{}", format!("⚠️  {} column not found", role).yellow());
    }
}

fn cell_to_json(cell: Option<CellRef<'_>>) -> Value {
    match cell {
        Some(CellRef::Text(s)) => Value::String(s.to_string()),
        Some(CellRef::Number(n)) => serde_json::Number::from_f64(n)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        None => Value::Null,
    }
}

fn display_cell(table: &NormalizedTable, row: usize, key: Option<&str>) -> String {
    key.and_then(|k| table.cell(row, k))
        .map(|c| match c {
            CellRef::Text(s) => s.to_string(),
            CellRef::Number(n) => format_number(n),
        })
        .unwrap_or_else(|| "-".to_string())
}

fn print_bars(title: &str, buckets: &[Bucket]) {
    println!("{}", title.bold().cyan());
    let Some(max) = buckets.iter().map(|b| b.count).max().filter(|&m| m > 0) else {
        println!("   (no data)\n");
        return;
    };
    let width = buckets.iter().map(|b| b.label.chars().count()).max().unwrap_or(0);
    for b in buckets {
        let bar = "█".repeat((b.count * BAR_WIDTH).div_ceil(max));
        println!(
            "   {:<width$}  {} {}",
            b.label,
            bar.green(),
            b.count,
            width = width
        );
    }
    println!();
}

/// Execute the list command - filtered startup directory
pub fn list(config: AnalyticsConfig, args: ListArgs) -> AnalyticsResult<()> {
    let load = load_table(config, args.json)?;
    let table = &load.table;
    let mapping = ColumnMapping::for_page(table, Page::List);
    warn_missing(&mapping);

    let funding = derive_funding(table, mapping.get(ColumnRole::Funding));
    let filters = FilterSet {
        sectors: args.sectors,
        cities: args.cities,
        tiers: args.tiers,
        hot: args.hot,
        keyword: args.keyword,
        funding: args.funding.to_filter(funding_bounds(&funding)),
    };
    let matched = filters.apply(table, &mapping, &funding);
    let shown: Vec<usize> = match args.limit {
        Some(limit) => matched.iter().copied().take(limit).collect(),
        None => matched.clone(),
    };

    let mut columns: Vec<(ColumnRole, &str)> = Vec::new();
    for role in LIST_COLUMNS {
        if let Some(key) = mapping.get(role) {
            if !columns.iter().any(|(_, k)| *k == key) {
                columns.push((role, key));
            }
        }
    }

    if let Some(path) = &args.export {
        let keys = columns.iter().map(|(_, k)| k.to_string()).collect();
        TableExporter::new(table, keys, matched.clone()).export(path)?;
        if !args.json {
            println!(
                "{}",
                format!("✅ Exported {} rows to {}", matched.len(), path.display()).green()
            );
        }
    }

    if args.json {
        let rows: Vec<Value> = shown
            .iter()
            .map(|&row| {
                let mut obj = Map::new();
                for (_, key) in &columns {
                    obj.insert(key.to_string(), cell_to_json(table.cell(row, key)));
                }
                obj.insert(
                    "funding_numeric".to_string(),
                    funding[row]
                        .and_then(serde_json::Number::from_f64)
                        .map(Value::Number)
                        .unwrap_or(Value::Null),
                );
                Value::Object(obj)
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!("{}", "🚀 Startup Directory".bold().green());
    println!(
        "   Showing {} of {} matching startups ({} total)\n",
        shown.len(),
        matched.len(),
        table.row_count()
    );
    for &row in &shown {
        let name = display_cell(table, row, mapping.get(ColumnRole::Company));
        println!("   {}", name.bright_blue().bold());
        for &(role, key) in columns.iter().filter(|(r, _)| *r != ColumnRole::Company) {
            let value = match role {
                ColumnRole::Funding => format_funding(funding[row]),
                _ => display_cell(table, row, Some(key)),
            };
            println!("      {}: {}", role.label().cyan(), value);
        }
    }
    Ok(())
}

/// Execute the profile command - single company card
pub fn profile(config: AnalyticsConfig, company: Option<String>, json: bool) -> AnalyticsResult<()> {
    let load = load_table(config, json)?;
    let table = &load.table;
    let mapping = ColumnMapping::for_page(table, Page::Profile);
    warn_missing(&mapping);

    let names = company_names(table, &mapping);
    let selected = select_company(&names, company.as_deref())
        .ok_or_else(|| AnalyticsError::CompanyNotFound(company.clone().unwrap_or_default()))?;
    if let Some(requested) = company.as_deref().filter(|r| *r != selected) {
        eprintln!(
            "{}",
            format!("⚠️  Company '{}' not found, showing '{}'", requested, selected).yellow()
        );
    }

    let funding = derive_funding(table, mapping.get(ColumnRole::Funding));
    let profile = build_profile(table, &mapping, &funding, selected)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&profile)?);
        return Ok(());
    }

    println!("{}", format!("🏢 {}", profile.company).bold().green());
    let fields = [
        ("Sector", &profile.sector),
        ("City", &profile.city),
        ("Funding Stage", &profile.funding_stage),
        ("Hot Startup", &profile.hot),
    ];
    for (label, value) in fields {
        println!("   {}: {}", label.cyan(), value.as_deref().unwrap_or("-"));
    }
    println!("   {}: {}", "Funding".cyan(), profile.funding_display.bold());

    if let Some(description) = &profile.description {
        println!("\n{}", "📝 About".bold().cyan());
        println!("   {}", description);
    }

    let contacts = [
        ("Founders", &profile.founders),
        ("Email", &profile.email),
        ("Phone", &profile.phone),
    ];
    if contacts.iter().any(|(_, v)| v.is_some()) {
        println!("\n{}", "👥 Team & Contact".bold().cyan());
        for (label, value) in contacts {
            if let Some(value) = value {
                println!("   {}: {}", label.cyan(), value);
            }
        }
    }
    Ok(())
}

/// Execute the insights command - dashboard aggregates
pub fn insights(config: AnalyticsConfig, json: bool) -> AnalyticsResult<()> {
    let load = load_table(config, json)?;
    let table = &load.table;
    let mapping = ColumnMapping::for_page(table, Page::Insights);
    warn_missing(&mapping);

    let current_year = chrono::Local::now().year();
    let insights = Insights::compute(table, &mapping, current_year);

    if json {
        println!("{}", serde_json::to_string_pretty(&insights)?);
        return Ok(());
    }

    println!("{}", "📊 Ecosystem Insights".bold().green());
    println!("   {} startups\n", table.row_count());

    if let Some(sectors) = &insights.sectors {
        print_bars("Top Sectors", sectors);
    }
    if let Some(years) = &insights.founding_years {
        let buckets: Vec<Bucket> = years
            .iter()
            .map(|y| Bucket {
                label: y.year.to_string(),
                count: y.count,
            })
            .collect();
        print_bars("Companies Founded per Year", &buckets);
    }
    if let Some(stages) = &insights.stages {
        print_bars("Funding Stages", stages);
    }
    if let Some(gender) = &insights.founder_gender {
        print_bars("Founder Gender", gender);
    }
    if let Some(cities) = &insights.cities {
        println!("{}", "Startup Hubs".bold().cyan());
        for point in cities {
            let coords = point
                .coords
                .map(|(lat, lon)| format!("({:.4}, {:.4})", lat, lon))
                .unwrap_or_else(|| "(unmapped)".to_string());
            println!("   {:<16} {:>5}  {}", point.city, point.count, coords.dimmed());
        }
    }
    Ok(())
}

/// Execute `cache status`
pub fn cache_status(config: AnalyticsConfig, json: bool) -> AnalyticsResult<()> {
    let status = CacheManager::new(config).inspect()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("{}", "🗄️  Cache Status".bold().green());
    println!("   Artifact: {}", status.artifact.display());
    println!(
        "   Source:   {}{}",
        status.source.display(),
        if status.source_present { "" } else { " (missing)" }
    );
    let state = match &status.state {
        CacheState::Absent => "absent".yellow(),
        CacheState::Valid => "valid".green(),
        CacheState::Stale(reason) => format!("stale ({:?})", reason).yellow(),
        CacheState::Corrupt(reason) => format!("corrupt: {}", reason).red(),
    };
    println!("   State:    {}", state);
    if let (Some(rows), Some(columns)) = (status.rows, status.columns) {
        println!("   Table:    {} rows × {} columns", rows, columns);
    }
    if let Some(header_row) = status.header_row {
        println!("   Header:   row {}", header_row);
    }
    if let Some(built_at) = status.built_at {
        println!(
            "   Built:    {} ({}s ago)",
            built_at.format("%Y-%m-%d %H:%M:%S"),
            status.age_secs.unwrap_or(0)
        );
    }
    Ok(())
}

/// Execute `cache rebuild`
pub fn cache_rebuild(config: AnalyticsConfig) -> AnalyticsResult<()> {
    let manager = CacheManager::new(config);
    let load = manager.rebuild()?;
    println!("{}", "✅ Cache rebuilt".bold().green());
    println!("   Header row: {}", load.header_row);
    println!(
        "   Table: {} rows × {} columns",
        load.table.row_count(),
        load.table.column_count()
    );
    println!("   Artifact: {}", manager.config().cache.display());
    Ok(())
}

/// Execute `cache clear`
pub fn cache_clear(config: AnalyticsConfig) -> AnalyticsResult<()> {
    let path = config.cache.clone();
    if CacheManager::new(config).clear()? {
        println!("{}", format!("🗑️  Removed {}", path.display()).green());
    } else {
        println!("{}", format!("No cache artifact at {}", path.display()).yellow());
    }
    Ok(())
}

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;
