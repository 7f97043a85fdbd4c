use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::Context;
use cay_dbsync::{DbSyncError, EntityMergeListener, EntityMergeSupport, MergeConfig};
use cay_map::{DataMap, DbRelationship, ObjAttribute, ObjRelationship};
use colored::Colorize;
use serde::Serialize;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let format = cli.format;
    match cli.command {
        Command::Sync(args) => print_sync(&cmd_sync(&args)?, format),
        Command::Diff(args) => print_diff(&cmd_diff(&args)?, format),
        Command::Entities(args) => print_entities(&cmd_entities(&args)?, format),
        Command::DefaultConfig => {
            print!("{}", MergeConfig::default().to_toml_string()?);
            Ok(())
        }
    }
}

// ----------------------------------------------------------------------
// Reports
// ----------------------------------------------------------------------

#[derive(Debug, Default, Serialize)]
pub struct SyncReport {
    pub changed: bool,
    pub attributes: Vec<AddedAttribute>,
    pub relationships: Vec<AddedRelationship>,
    pub written: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
pub struct AddedAttribute {
    pub entity: String,
    pub name: String,
    pub column: Option<String>,
    pub value_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AddedRelationship {
    pub entity: String,
    pub name: String,
    pub target: Option<String>,
    pub db_relationship: String,
    pub delete_rule: String,
}

#[derive(Debug, Serialize)]
pub struct EntityDiff {
    pub entity: String,
    pub table: String,
    pub remove_fk_columns: Vec<String>,
    pub add_columns: Vec<String>,
    pub add_relationships: Vec<String>,
    /// Pending relationships that sync skips because attributes are
    /// flattened through them.
    pub blocked_relationships: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct EntityRow {
    pub name: String,
    pub table: Option<String>,
    pub super_entity: Option<String>,
    pub attributes: usize,
    pub relationships: usize,
}

/// Records every addition for the sync report.
#[derive(Default)]
struct Collector {
    attributes: Mutex<Vec<AddedAttribute>>,
    relationships: Mutex<Vec<AddedRelationship>>,
}

impl EntityMergeListener for Collector {
    fn obj_attribute_added(&self, attribute: &mut ObjAttribute) {
        self.attributes.lock().expect("lock poisoned").push(AddedAttribute {
            entity: attribute.entity_name.clone(),
            name: attribute.name.clone(),
            column: attribute.db_attribute_path.clone(),
            value_type: attribute.type_name().map(str::to_string),
        });
    }

    fn obj_relationship_added(&self, relationship: &mut ObjRelationship, db_relationship: &DbRelationship) {
        self.relationships.lock().expect("lock poisoned").push(AddedRelationship {
            entity: relationship.source_entity.clone(),
            name: relationship.name.clone(),
            target: relationship.target_entity.clone(),
            db_relationship: db_relationship.name.clone(),
            delete_rule: relationship.delete_rule.to_string(),
        });
    }
}

// ----------------------------------------------------------------------
// Commands
// ----------------------------------------------------------------------

fn load_map(path: &Path) -> anyhow::Result<DataMap> {
    DataMap::load(path).with_context(|| format!("failed to load data map {}", path.display()))
}

fn load_config(path: Option<&Path>) -> anyhow::Result<MergeConfig> {
    match path {
        Some(path) => MergeConfig::load(path)
            .with_context(|| format!("failed to load sync policy {}", path.display())),
        None => Ok(MergeConfig::default()),
    }
}

/// Requested entity names, or every object entity when none are given.
fn entity_names(map: &DataMap, requested: &[String]) -> anyhow::Result<Vec<String>> {
    if requested.is_empty() {
        return Ok(map.obj_entities().iter().map(|e| e.name.clone()).collect());
    }
    for name in requested {
        map.require_obj_entity(name)?;
    }
    Ok(requested.to_vec())
}

pub fn cmd_sync(args: &SyncArgs) -> anyhow::Result<SyncReport> {
    let map = load_map(&args.map)?;
    let config = load_config(args.config.as_deref())?;
    let names = entity_names(&map, &args.entities)?;

    let collector = Arc::new(Collector::default());
    let mut support = EntityMergeSupport::new(config);
    support.add_listener(collector.clone());

    let map = Mutex::new(map);
    let changed = support.synchronize_with_db_entities(&map, &names)?;
    let map = map.into_inner().map_err(|_| DbSyncError::LockPoisoned)?;

    let mut report = SyncReport {
        changed,
        ..Default::default()
    };
    report.attributes = std::mem::take(&mut *collector.attributes.lock().expect("lock poisoned"));
    report.relationships =
        std::mem::take(&mut *collector.relationships.lock().expect("lock poisoned"));

    if changed && !args.dry_run {
        let target = args.output.clone().unwrap_or_else(|| args.map.clone());
        map.save(&target)
            .with_context(|| format!("failed to write data map {}", target.display()))?;
        report.written = Some(target);
    }
    Ok(report)
}

pub fn cmd_diff(args: &DiffArgs) -> anyhow::Result<Vec<EntityDiff>> {
    let map = load_map(&args.map)?;
    let config = load_config(args.config.as_deref())?;
    let names = entity_names(&map, &args.entities)?;
    let support = EntityMergeSupport::new(config);

    let mut diffs = Vec::new();
    for name in names {
        let Some(table) = map.db_entity_name_for(&name) else {
            continue;
        };
        let remove_fk_columns = if support.is_removing_meaningful_fks() {
            support
                .meaningful_fks(&map, &name)
                .iter()
                .map(|c| c.name.clone())
                .collect()
        } else {
            Vec::new()
        };
        let (blocked, pending): (Vec<_>, Vec<_>) = support
            .relationships_to_add(&map, &name)
            .into_iter()
            .partition(|r| support.is_relationship_blocked(&map, &name, r));
        let diff = EntityDiff {
            table: table.to_string(),
            remove_fk_columns,
            add_columns: support
                .attributes_to_add(&map, &name)
                .iter()
                .map(|c| c.name.clone())
                .collect(),
            add_relationships: pending.iter().map(|r| r.name.clone()).collect(),
            blocked_relationships: blocked.iter().map(|r| r.name.clone()).collect(),
            entity: name,
        };
        if !diff.remove_fk_columns.is_empty()
            || !diff.add_columns.is_empty()
            || !diff.add_relationships.is_empty()
        {
            diffs.push(diff);
        }
    }
    Ok(diffs)
}

pub fn cmd_entities(args: &EntitiesArgs) -> anyhow::Result<Vec<EntityRow>> {
    let map = load_map(&args.map)?;
    Ok(map
        .obj_entities()
        .iter()
        .map(|e| EntityRow {
            name: e.name.clone(),
            table: map.db_entity_name_for(&e.name).map(str::to_string),
            super_entity: e.super_entity_name.clone(),
            attributes: e.attributes.len(),
            relationships: e.relationships.len(),
        })
        .collect())
}

// ----------------------------------------------------------------------
// Output
// ----------------------------------------------------------------------

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_sync(report: &SyncReport, format: OutputFormat) -> anyhow::Result<()> {
    if format == OutputFormat::Json {
        return print_json(report);
    }
    if !report.changed {
        println!("{} Already in sync.", "✓".green());
        return Ok(());
    }
    for attr in &report.attributes {
        println!(
            "  {} {}.{} <- {} ({})",
            "attribute".green(),
            attr.entity.bold(),
            attr.name,
            attr.column.as_deref().unwrap_or("?").cyan(),
            attr.value_type.as_deref().unwrap_or("untyped"),
        );
    }
    for rel in &report.relationships {
        println!(
            "  {} {}.{} -> {} via {} [{}]",
            "relationship".green(),
            rel.entity.bold(),
            rel.name,
            rel.target.as_deref().unwrap_or("?").yellow(),
            rel.db_relationship.cyan(),
            rel.delete_rule,
        );
    }
    match &report.written {
        Some(path) => println!("{} Wrote {}", "✓".green().bold(), path.display()),
        None => println!("{} Dry run, map not written.", "!".yellow().bold()),
    }
    Ok(())
}

fn print_diff(diffs: &[EntityDiff], format: OutputFormat) -> anyhow::Result<()> {
    if format == OutputFormat::Json {
        return print_json(&diffs);
    }
    if diffs.is_empty() {
        println!("{} Nothing to do.", "✓".green());
        return Ok(());
    }
    for diff in diffs {
        println!("{} ({})", diff.entity.bold(), diff.table.dimmed());
        for column in &diff.remove_fk_columns {
            println!("  {} {}", "-".red(), column);
        }
        for column in &diff.add_columns {
            println!("  {} {}", "+".green(), column);
        }
        for rel in &diff.add_relationships {
            println!("  {} {}", "+".green(), rel.cyan());
        }
        for rel in &diff.blocked_relationships {
            println!("  {} {} {}", "!".yellow(), rel.cyan(), "(flattened attributes, skipped)".dimmed());
        }
    }
    Ok(())
}

fn print_entities(rows: &[EntityRow], format: OutputFormat) -> anyhow::Result<()> {
    if format == OutputFormat::Json {
        return print_json(&rows);
    }
    for row in rows {
        let table = row.table.as_deref().unwrap_or("(unmapped)");
        let parent = row
            .super_entity
            .as_deref()
            .map(|s| format!(" extends {s}"))
            .unwrap_or_default();
        println!(
            "{}{} -> {}  {} attributes, {} relationships",
            row.name.bold(),
            parent,
            table.cyan(),
            row.attributes,
            row.relationships,
        );
    }
    Ok(())
}
