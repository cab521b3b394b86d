mod manifest;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;
use log::{debug, warn};
use tokio::sync::watch;

use awx_core::provider::{ErrorKind, Provider, ProviderError, ResourceKind, ResourceType};
use awx_core::resource::{Resource, ResourceId, State, Value};
use awx_core::schema::{AttributeSchema, ResourceSchema};
use awx_provider::resources::find_resource_type;
use awx_provider::{AwxProvider, ProviderConfig};
use awx_state::{BackendConfig, ResourceState, StateBackend, StateFile, create_backend};

use manifest::Manifest;

const BIN_NAME: &str = "terraform-provider-awx";

#[derive(Parser)]
#[command(name = "terraform-provider-awx")]
#[command(about = "Manage AWX job templates and inventory groups", long_about = None)]
struct Cli {
    /// Path to the state file
    #[arg(long, global = true, default_value = "awx.state.json")]
    state: PathBuf,

    /// Log at debug level (RUST_LOG still takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print resource and data source schemas
    Schema {
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Validate a manifest against the schemas
    Validate {
        /// Path to the JSON manifest
        #[arg(default_value = "awx.json")]
        file: PathBuf,
    },
    /// Create or update every resource in the manifest
    Apply {
        #[arg(default_value = "awx.json")]
        file: PathBuf,
    },
    /// Re-read every resource in state from AWX
    Refresh {
        #[arg(default_value = "awx.json")]
        file: PathBuf,
    },
    /// Delete the manifest's resources, in reverse order
    Destroy {
        #[arg(default_value = "awx.json")]
        file: PathBuf,

        /// Skip confirmation prompt (auto-approve)
        #[arg(long)]
        auto_approve: bool,
    },
    /// Bring an existing AWX record under management
    Import {
        /// Resource type (job_template, inventory_group)
        resource_type: String,
        /// Local name to record it under
        name: String,
        /// AWX numeric id
        id: String,

        /// Manifest to take the provider block from
        #[arg(long)]
        manifest: Option<PathBuf>,
    },
    /// Look up a record by name and print its attributes
    Data {
        /// Data source type (host, inventory, inventory_group, job_template, project)
        data_type: String,
        /// AWX name to look up
        name: String,

        /// Restrict inventory group lookups to one inventory
        #[arg(long)]
        inventory_id: Option<i64>,

        /// Manifest to take the provider block from
        #[arg(long)]
        manifest: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Schema { json } => run_schema(json),
        Commands::Validate { file } => run_validate(&file),
        Commands::Apply { file } => run_apply(&file, &cli.state).await,
        Commands::Refresh { file } => run_refresh(&file, &cli.state).await,
        Commands::Destroy { file, auto_approve } => {
            run_destroy(&file, &cli.state, auto_approve).await
        }
        Commands::Import {
            resource_type,
            name,
            id,
            manifest,
        } => run_import(&resource_type, &name, &id, manifest.as_deref(), &cli.state).await,
        Commands::Data {
            data_type,
            name,
            inventory_id,
            manifest,
        } => run_data(&data_type, &name, inventory_id, manifest.as_deref()).await,
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

// =============================================================================
// Provider and state plumbing
// =============================================================================

fn build_provider(attributes: &HashMap<String, Value>) -> Result<AwxProvider, String> {
    let config = ProviderConfig::from_attributes(attributes)
        .map_err(|e| format!("Invalid provider configuration: {}", e))?;
    debug!("Provider configuration: {:?}", config);
    let provider = AwxProvider::from_config(&config).map_err(|e| e.to_string())?;
    Ok(provider.with_cancel(cancel_on_ctrl_c()))
}

/// Provider block from an optional manifest; environment and defaults otherwise
fn provider_attributes(manifest: Option<&Path>) -> Result<HashMap<String, Value>, String> {
    match manifest {
        Some(path) => Ok(Manifest::load(path)?.provider_attributes()),
        None => Ok(HashMap::new()),
    }
}

/// Turns true on Ctrl-C so a pending project-sync wait stops
fn cancel_on_ctrl_c() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling pending waits");
            let _ = tx.send(true);
        }
    });
    rx
}

/// State file plus the backend it came from; every change is written through
struct StateStore {
    backend: Box<dyn StateBackend>,
    state: StateFile,
}

impl StateStore {
    async fn open(path: &Path) -> Result<Self, String> {
        let backend = create_backend(&BackendConfig::local(path.display().to_string()))
            .map_err(|e| e.to_string())?;
        let state = backend
            .read_state()
            .await
            .map_err(|e| format!("Failed to read state from {}: {}", backend.location(), e))?
            .unwrap_or_default();
        Ok(Self { backend, state })
    }

    fn get(&self, id: &ResourceId) -> Option<State> {
        self.state
            .find_resource(&id.resource_type, &id.name)
            .filter(|r| r.identifier.is_some())
            .map(ResourceState::to_state)
    }

    async fn record(&mut self, state: &State) -> Result<(), String> {
        self.state.upsert_resource(ResourceState::from_state(state));
        self.save().await
    }

    async fn forget(&mut self, id: &ResourceId) -> Result<(), String> {
        if self
            .state
            .remove_resource(&id.resource_type, &id.name)
            .is_some()
        {
            self.save().await?;
        }
        Ok(())
    }

    async fn save(&mut self) -> Result<(), String> {
        self.state.increment_serial();
        self.backend
            .write_state(&self.state)
            .await
            .map_err(|e| format!("Failed to write state to {}: {}", self.backend.location(), e))
    }
}

fn schema_for(resource: &Resource) -> Result<ResourceSchema, String> {
    let kind = if resource.is_data_source() {
        ResourceKind::DataSource
    } else {
        ResourceKind::Resource
    };
    find_resource_type(&resource.id.resource_type, kind)
        .map(|t| t.schema())
        .ok_or_else(|| format!("Unknown type '{}'", resource.id.resource_type))
}

fn validate_resources(resources: &[Resource]) -> Result<(), String> {
    let mut all_errors = Vec::new();

    for resource in resources {
        let schema = schema_for(resource)?;
        if let Err(errors) = schema.validate(&resource.attributes) {
            for error in errors {
                all_errors.push(format!("{}: {}", label(&resource.id), error));
            }
        }
    }

    if all_errors.is_empty() {
        Ok(())
    } else {
        Err(all_errors.join("\n"))
    }
}

fn label(id: &ResourceId) -> String {
    format!("{}.{}", id.resource_type, id.name)
}

// =============================================================================
// Change detection
// =============================================================================

#[derive(Debug, PartialEq)]
enum Change {
    Create,
    Update(Vec<String>),
    /// A force-new attribute changed; delete then create
    Replace(Vec<String>),
    NoOp,
}

/// Compare desired attributes (with defaults, normalized) against the recorded state
fn plan_change(schema: &ResourceSchema, desired: &Resource, recorded: Option<&State>) -> Change {
    let Some(current) = recorded else {
        return Change::Create;
    };

    let desired = schema.normalize(&schema.with_defaults(&desired.attributes));
    let changed: Vec<String> = schema
        .attribute_names()
        .into_iter()
        .filter(|name| {
            desired
                .get(*name)
                .is_some_and(|value| current.attributes.get(*name) != Some(value))
        })
        .map(str::to_string)
        .collect();

    if changed.is_empty() {
        return Change::NoOp;
    }

    let replace: Vec<String> = changed
        .iter()
        .filter(|name| schema.attributes[name.as_str()].force_new)
        .cloned()
        .collect();
    if replace.is_empty() {
        Change::Update(changed)
    } else {
        Change::Replace(replace)
    }
}

// =============================================================================
// Commands
// =============================================================================

fn run_schema(json: bool) -> Result<(), String> {
    let types = awx_provider::resources::resource_types();
    if json {
        let doc = schema_json(&types);
        let text = serde_json::to_string_pretty(&doc).map_err(|e| e.to_string())?;
        println!("{}", text);
        return Ok(());
    }

    for resource_type in &types {
        let schema = resource_type.schema();
        let kind = match resource_type.kind() {
            ResourceKind::Resource => "resource",
            ResourceKind::DataSource => "data",
        };
        println!("{} {}", kind.cyan().bold(), schema.resource_type.bold());
        if let Some(description) = &schema.description {
            println!("  {}", description.dimmed());
        }
        for name in schema.attribute_names() {
            let attr = &schema.attributes[name];
            println!(
                "    {:<28} {:<16} {}",
                name,
                attr.attr_type.to_string(),
                attribute_flags(attr).join(", ").dimmed()
            );
        }
        println!();
    }
    Ok(())
}

fn attribute_flags(attr: &AttributeSchema) -> Vec<String> {
    let mut flags = Vec::new();
    if attr.required {
        flags.push("required".to_string());
    }
    if attr.computed {
        flags.push(if attr.optional_computed {
            "optional, computed".to_string()
        } else {
            "computed".to_string()
        });
    }
    if let Some(default) = &attr.default {
        flags.push(format!("default {}", format_value(default)));
    }
    if attr.force_new {
        flags.push("forces replacement".to_string());
    }
    for other in &attr.conflicts_with {
        flags.push(format!("conflicts with {}", other));
    }
    flags
}

fn schema_json(types: &[Box<dyn ResourceType>]) -> serde_json::Value {
    let mut resources = serde_json::Map::new();
    let mut data_sources = serde_json::Map::new();

    for resource_type in types {
        let schema = resource_type.schema();
        let attributes: serde_json::Map<String, serde_json::Value> = schema
            .attribute_names()
            .into_iter()
            .map(|name| {
                let attr = &schema.attributes[name];
                let value = serde_json::json!({
                    "type": attr.attr_type.to_string(),
                    "description": attr.description,
                    "required": attr.required,
                    "computed": attr.computed,
                    "optional_computed": attr.optional_computed,
                    "default": attr.default.as_ref().map(Value::to_json),
                    "force_new": attr.force_new,
                    "conflicts_with": attr.conflicts_with,
                });
                (name.to_string(), value)
            })
            .collect();

        let entry = serde_json::json!({
            "description": schema.description,
            "importable": resource_type.importable(),
            "attributes": attributes,
        });
        match resource_type.kind() {
            ResourceKind::Resource => resources.insert(schema.resource_type.clone(), entry),
            ResourceKind::DataSource => data_sources.insert(schema.resource_type.clone(), entry),
        };
    }

    serde_json::json!({
        "provider": "awx",
        "resources": resources,
        "data_sources": data_sources,
    })
}

fn run_validate(file: &Path) -> Result<(), String> {
    let manifest = Manifest::load(file)?;
    let resources = manifest.resources();
    let data_sources = manifest.data_sources();

    validate_resources(&resources)?;
    validate_resources(&data_sources)?;
    ProviderConfig::from_attributes(&manifest.provider_attributes())
        .map_err(|e| format!("Invalid provider configuration: {}", e))?;

    println!(
        "{}",
        format!(
            "Manifest is valid: {} resources, {} data sources.",
            resources.len(),
            data_sources.len()
        )
        .green()
    );
    Ok(())
}

async fn run_apply(file: &Path, state_path: &Path) -> Result<(), String> {
    let manifest = Manifest::load(file)?;
    let resources = manifest.resources();
    let data_sources = manifest.data_sources();
    validate_resources(&resources)?;
    validate_resources(&data_sources)?;

    let provider = build_provider(&manifest.provider_attributes())?;
    let mut store = StateStore::open(state_path).await?;

    let mut success_count = 0;
    let mut failure_count = 0;
    let mut unchanged_count = 0;

    if !data_sources.is_empty() {
        println!("{}", "Reading data sources...".cyan().bold());
        for data in &data_sources {
            match provider.read_data_source(data).await {
                Ok(state) if state.exists => println!(
                    "  {} data.{} (id {})",
                    "✓".green(),
                    label(&data.id),
                    state.identifier.as_deref().unwrap_or("?")
                ),
                Ok(_) => println!("  {} data.{} - no match", "!".yellow(), label(&data.id)),
                Err(e) => {
                    println!("  {} data.{} - {}", "✗".red(), label(&data.id), e);
                    failure_count += 1;
                }
            }
        }
        println!();
    }

    println!("{}", "Applying changes...".cyan().bold());
    println!();

    for resource in &resources {
        let schema = schema_for(resource)?;
        let recorded = store.get(&resource.id);
        let change = plan_change(&schema, resource, recorded.as_ref());

        if change == Change::NoOp {
            unchanged_count += 1;
            continue;
        }
        let result = execute_change(&provider, &mut store, resource, &change, recorded.as_ref())
            .await?;

        let summary = describe_change(&resource.id, &change);
        match result {
            Ok(state) => {
                println!("  {} {}", "✓".green(), summary);
                store.record(&state).await?;
                success_count += 1;
            }
            Err(e) => {
                println!("  {} {} - {}", "✗".red(), summary, e);
                failure_count += 1;
                keep_partial_record(&provider, &mut store, &resource.id, &e).await?;
                if e.is(ErrorKind::Duplicate)
                    && let Some(identifier) = &e.identifier
                {
                    println!(
                        "    {}",
                        format!(
                            "hint: {} import {} {} {}",
                            BIN_NAME, resource.id.resource_type, resource.id.name, identifier
                        )
                        .yellow()
                    );
                }
            }
        }
    }

    println!();
    if failure_count == 0 {
        println!(
            "{}",
            format!(
                "Apply complete! {} changes applied, {} unchanged.",
                success_count, unchanged_count
            )
            .green()
            .bold()
        );
        Ok(())
    } else {
        Err(format!(
            "Apply failed. {} succeeded, {} failed.",
            success_count, failure_count
        ))
    }
}

/// Carry out a planned change. The outer error is a state write failure.
async fn execute_change(
    provider: &AwxProvider,
    store: &mut StateStore,
    resource: &Resource,
    change: &Change,
    recorded: Option<&State>,
) -> Result<Result<State, ProviderError>, String> {
    let result = match (change, recorded) {
        (Change::Update(_), Some(current)) => {
            let identifier = current.identifier.as_deref().unwrap_or_default();
            provider
                .update(&resource.id, identifier, current, resource)
                .await
        }
        (Change::Replace(_), Some(current)) => {
            let identifier = current.identifier.as_deref().unwrap_or_default();
            match provider.delete(&resource.id, identifier).await {
                Ok(()) => {
                    store.forget(&resource.id).await?;
                    provider.create(resource).await
                }
                Err(e) => Err(e),
            }
        }
        _ => provider.create(resource).await,
    };
    Ok(result)
}

fn describe_change(id: &ResourceId, change: &Change) -> String {
    match change {
        Change::Create => format!("{} {}", "+".green().bold(), label(id)),
        Change::Update(attrs) => format!(
            "{} {} ({})",
            "~".yellow().bold(),
            label(id),
            attrs.join(", ")
        ),
        Change::Replace(attrs) => format!(
            "{} {} (replaced: {})",
            "-/+".red().bold(),
            label(id),
            attrs.join(", ")
        ),
        Change::NoOp => label(id),
    }
}

/// A failed link still leaves the primary record in AWX; record it so the
/// next apply updates it instead of tripping over a duplicate.
async fn keep_partial_record(
    provider: &AwxProvider,
    store: &mut StateStore,
    id: &ResourceId,
    err: &ProviderError,
) -> Result<(), String> {
    if !err.is(ErrorKind::PartialLink) {
        return Ok(());
    }
    let Some(identifier) = err.identifier.as_deref() else {
        return Ok(());
    };

    match provider.read(id, Some(identifier)).await {
        Ok(state) if state.exists => store.record(&state).await,
        Ok(_) => Ok(()),
        Err(e) => {
            warn!("{}: could not read back {} after partial link: {}", id, identifier, e);
            Ok(())
        }
    }
}

async fn run_refresh(file: &Path, state_path: &Path) -> Result<(), String> {
    let manifest = Manifest::load(file)?;
    let provider = build_provider(&manifest.provider_attributes())?;
    let mut store = StateStore::open(state_path).await?;

    if store.state.resources.is_empty() {
        println!("{}", "No resources in state.".yellow());
        return Ok(());
    }

    let mut failure_count = 0;
    for entry in store.state.resources.clone() {
        let id = entry.resource_id();
        match provider.read(&id, entry.identifier.as_deref()).await {
            Ok(state) if state.exists => {
                println!("  {} {}", "✓".green(), label(&id));
                store.record(&state).await?;
            }
            Ok(_) => {
                println!("  {} {} - gone from AWX, removed from state", "-".red(), label(&id));
                store.forget(&id).await?;
            }
            Err(e) => {
                println!("  {} {} - {}", "✗".red(), label(&id), e);
                failure_count += 1;
            }
        }
    }

    if failure_count == 0 {
        println!("{}", "Refresh complete!".green().bold());
        Ok(())
    } else {
        Err(format!("Refresh failed for {} resources.", failure_count))
    }
}

async fn run_destroy(file: &Path, state_path: &Path, auto_approve: bool) -> Result<(), String> {
    let manifest = Manifest::load(file)?;
    let provider = build_provider(&manifest.provider_attributes())?;
    let mut store = StateStore::open(state_path).await?;

    // Reverse declaration order: dependents first
    let to_destroy: Vec<(ResourceId, String)> = manifest
        .resources()
        .into_iter()
        .rev()
        .filter_map(|r| {
            let identifier = store.get(&r.id)?.identifier?;
            Some((r.id, identifier))
        })
        .collect();

    if to_destroy.is_empty() {
        println!("{}", "No resources to destroy.".green());
        return Ok(());
    }

    println!("{}", "Destroy Plan:".red().bold());
    println!();
    for (id, identifier) in &to_destroy {
        println!("  {} {} (id {})", "-".red().bold(), label(id), identifier);
    }
    println!();
    println!("Plan: {} to destroy.", to_destroy.len().to_string().red());
    println!();

    if !auto_approve {
        println!(
            "{}",
            "Do you really want to destroy all resources?"
                .yellow()
                .bold()
        );
        println!(
            "  {}",
            "This action cannot be undone. Type 'yes' to confirm.".yellow()
        );
        print!("\n  Enter a value: ");
        std::io::Write::flush(&mut std::io::stdout()).map_err(|e| e.to_string())?;

        let mut input = String::new();
        std::io::stdin()
            .read_line(&mut input)
            .map_err(|e| e.to_string())?;

        if input.trim() != "yes" {
            println!();
            println!("{}", "Destroy cancelled.".yellow());
            return Ok(());
        }
        println!();
    }

    let mut success_count = 0;
    let mut failure_count = 0;
    for (id, identifier) in &to_destroy {
        match provider.delete(id, identifier).await {
            Ok(()) => {
                println!("  {} {}", "✓".green(), label(id));
                store.forget(id).await?;
                success_count += 1;
            }
            Err(e) => {
                println!("  {} {} - {}", "✗".red(), label(id), e);
                failure_count += 1;
            }
        }
    }

    println!();
    if failure_count == 0 {
        println!(
            "{}",
            format!("Destroy complete! {} resources destroyed.", success_count)
                .green()
                .bold()
        );
        Ok(())
    } else {
        Err(format!(
            "Destroy failed. {} succeeded, {} failed.",
            success_count, failure_count
        ))
    }
}

async fn run_import(
    resource_type: &str,
    name: &str,
    identifier: &str,
    manifest: Option<&Path>,
    state_path: &Path,
) -> Result<(), String> {
    let importable = find_resource_type(resource_type, ResourceKind::Resource)
        .ok_or_else(|| format!("Unknown resource type '{}'", resource_type))?
        .importable();
    if !importable {
        return Err(format!("Resource type '{}' cannot be imported", resource_type));
    }

    let id = ResourceId::new(resource_type, name);
    let mut store = StateStore::open(state_path).await?;
    if let Some(existing) = store.get(&id) {
        return Err(format!(
            "{} is already managed (id {})",
            label(&id),
            existing.identifier.unwrap_or_default()
        ));
    }

    let provider = build_provider(&provider_attributes(manifest)?)?;
    let state = provider
        .import(&id, identifier)
        .await
        .map_err(|e| e.to_string())?;
    store.record(&state).await?;

    println!(
        "{}",
        format!("Imported {} (id {}).", label(&id), identifier)
            .green()
            .bold()
    );
    print_attributes(&state);
    Ok(())
}

async fn run_data(
    data_type: &str,
    name: &str,
    inventory_id: Option<i64>,
    manifest: Option<&Path>,
) -> Result<(), String> {
    let mut resource = Resource::new(data_type, name)
        .with_read_only(true)
        .with_attribute("name", name);
    if let Some(inventory_id) = inventory_id {
        resource = resource.with_attribute("inventory_id", inventory_id);
    }
    validate_resources(std::slice::from_ref(&resource))?;

    let provider = build_provider(&provider_attributes(manifest)?)?;
    let state = provider
        .read_data_source(&resource)
        .await
        .map_err(|e| e.to_string())?;

    if !state.exists {
        println!("{}", format!("No {} named '{}'.", data_type, name).yellow());
        return Ok(());
    }
    println!("{}", format!("data.{}.{}", data_type, name).bold());
    print_attributes(&state);
    Ok(())
}

// =============================================================================
// Display
// =============================================================================

fn print_attributes(state: &State) {
    let mut keys: Vec<&String> = state.attributes.keys().collect();
    keys.sort();
    for key in keys {
        println!("  {} = {}", key, format_value(&state.attributes[key]));
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{}\"", s),
        Value::Int(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::List(items) => {
            let strs: Vec<_> = items.iter().map(format_value).collect();
            format!("[{}]", strs.join(", "))
        }
        Value::Map(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let strs: Vec<_> = keys
                .into_iter()
                .map(|k| format!("{}: {}", k, format_value(&map[k])))
                .collect();
            format!("{{{}}}", strs.join(", "))
        }
    }
}
