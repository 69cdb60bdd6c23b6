mod config;

use std::collections::HashMap;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colored::Colorize;
use log::warn;

use lyra_core::provider::{DeleteOutcome, Provider, ProviderError};
use lyra_core::resource::{Resource, ResourceId, State};
use lyra_core::schema::ResourceSchema;
use lyra_provider_aws::AwsProvider;
use lyra_provider_aws::context::AwsContext;
use lyra_provider_aws::schemas;
use lyra_state::backends::LocalBackend;
use lyra_state::{BackendConfig, ResourceState, StateBackend, StateFile, create_backend};

use crate::config::Config;

#[derive(Parser)]
#[command(name = "lyra")]
#[command(about = "Manage individual AWS resources against a local state file", long_about = None)]
struct Cli {
    /// Path to the JSON configuration file
    #[arg(long, short, global = true, default_value = "lyra.json")]
    config: PathBuf,

    /// Increase log output (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the configuration file against the resource schemas
    Validate,
    /// Create a resource and start tracking it
    Create {
        /// Resource name in the configuration file
        #[arg(long)]
        name: String,
    },
    /// Refresh a tracked resource from AWS
    Read {
        #[arg(long)]
        name: String,
    },
    /// Apply in-place changes to a tracked resource
    Update {
        #[arg(long)]
        name: String,
    },
    /// Delete a tracked resource and stop tracking it
    Delete {
        #[arg(long)]
        name: String,
    },
    /// Start tracking an existing resource
    Import {
        #[arg(long)]
        name: String,

        /// Remote ID to import (e.g., the capacity provider name)
        #[arg(long)]
        id: String,
    },
    /// Inspect the state file
    State {
        #[command(subcommand)]
        command: StateCommands,
    },
}

#[derive(Subcommand)]
enum StateCommands {
    /// List tracked resources
    List,
    /// Show the stored state of one resource
    Show {
        #[arg(long)]
        name: String,
    },
}

/// A lifecycle operation on one configured resource
#[derive(Debug, Clone, PartialEq, Eq)]
enum Action {
    Create,
    Read,
    Update,
    Delete,
    Import { id: String },
}

impl Action {
    fn operation(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Read => "read",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::Import { .. } => "import",
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

async fn run(cli: Cli) -> Result<(), String> {
    let config = Config::load(&cli.config)?;

    let (action, name) = match cli.command {
        Commands::Validate => return run_validate(&config),
        Commands::State { command } => {
            let backend = get_backend(&config).await?;
            return run_state_command(backend.as_ref(), command).await;
        }
        Commands::Create { name } => (Action::Create, name),
        Commands::Read { name } => (Action::Read, name),
        Commands::Update { name } => (Action::Update, name),
        Commands::Delete { name } => (Action::Delete, name),
        Commands::Import { name, id } => (Action::Import { id }, name),
    };

    let resource = config.resource(&name)?;
    let provider = get_provider(&config).await?;
    let backend = get_backend(&config).await?;
    run_action(provider.as_ref(), backend.as_ref(), &action, &resource).await
}

fn get_schemas() -> HashMap<String, ResourceSchema> {
    schemas::all_schemas()
        .into_iter()
        .map(|schema| (schema.resource_type.clone(), schema))
        .collect()
}

fn validate_resources(resources: &[Resource]) -> Result<(), String> {
    let schemas = get_schemas();
    let mut all_errors = Vec::new();

    for resource in resources {
        match schemas.get(&resource.id.resource_type) {
            None => all_errors.push(format!(
                "{}: unknown resource type '{}'",
                resource.id, resource.id.resource_type
            )),
            Some(schema) => {
                if let Err(errors) = schema.validate(&resource.attributes) {
                    for error in errors {
                        all_errors.push(format!("{}: {}", resource.id, error));
                    }
                }
            }
        }
    }

    if all_errors.is_empty() {
        Ok(())
    } else {
        Err(all_errors.join("\n"))
    }
}

fn run_validate(config: &Config) -> Result<(), String> {
    let resources = config.resources()?;
    validate_resources(&resources)?;
    println!(
        "{}",
        format!("✓ {} resources validated successfully.", resources.len()).green()
    );
    Ok(())
}

async fn get_provider(config: &Config) -> Result<Box<dyn Provider>, String> {
    let context = AwsContext::load(
        config.provider.region.as_deref(),
        config.provider.profile.as_deref(),
    )
    .await
    .map_err(|e| e.to_string())?;
    Ok(Box::new(AwsProvider::new(&context)))
}

async fn get_backend(config: &Config) -> Result<Box<dyn StateBackend>, String> {
    let path = config
        .state
        .path
        .clone()
        .unwrap_or_else(|| PathBuf::from(LocalBackend::DEFAULT_STATE_FILE));
    create_backend(&BackendConfig::local(path))
        .await
        .map_err(|e| e.to_string())
}

/// Run one action while holding the state lock
async fn run_action(
    provider: &dyn Provider,
    backend: &dyn StateBackend,
    action: &Action,
    resource: &Resource,
) -> Result<(), String> {
    let lock = backend
        .acquire_lock(action.operation(), &resource.id.to_string())
        .await
        .map_err(|e| e.to_string())?;

    let result = run_locked(provider, backend, action, resource).await;

    if let Err(e) = backend.release_lock(&lock).await {
        warn!("Failed to release state lock {}: {}", lock.id, e);
    }
    result
}

async fn run_locked(
    provider: &dyn Provider,
    backend: &dyn StateBackend,
    action: &Action,
    resource: &Resource,
) -> Result<(), String> {
    let mut state = backend
        .read_state()
        .await
        .map_err(|e| e.to_string())?
        .unwrap_or_default();
    let before = state.resources.clone();

    let result = match action {
        Action::Create => create(provider, &mut state, resource).await,
        Action::Read => read(provider, &mut state, &resource.id).await,
        Action::Update => update(provider, &mut state, resource).await,
        Action::Delete => delete(provider, &mut state, &resource.id).await,
        Action::Import { id } => import(provider, &mut state, &resource.id, id).await,
    };

    // Partial results (e.g. a created resource whose read-back failed) are kept
    if state.resources != before {
        state.increment_serial();
        backend
            .write_state(&state)
            .await
            .map_err(|e| e.to_string())?;
    }
    result
}

fn tracked<'a>(state: &'a StateFile, id: &ResourceId) -> Result<&'a ResourceState, String> {
    state
        .find_resource(id)
        .ok_or_else(|| format!("{} is not tracked in state", id))
}

fn identifier_of<'a>(stored: &'a ResourceState, id: &ResourceId) -> Result<&'a str, String> {
    stored
        .identifier
        .as_deref()
        .ok_or_else(|| format!("{} has no identifier recorded in state", id))
}

fn describe(error: &ProviderError) -> String {
    match &error.identifier {
        Some(identifier) => format!("{} (created as {})", error, identifier),
        None => error.to_string(),
    }
}

fn print_done(verb: &str, state: &State) {
    println!(
        "  {} {} {} {}",
        "✓".green(),
        verb,
        state.id,
        state.identifier.as_deref().unwrap_or_default().dimmed()
    );
}

async fn create(
    provider: &dyn Provider,
    state: &mut StateFile,
    resource: &Resource,
) -> Result<(), String> {
    if let Some(existing) = state.find_resource(&resource.id) {
        return Err(format!(
            "{} is already tracked as {}; use update or delete",
            resource.id,
            existing.identifier.as_deref().unwrap_or("unknown")
        ));
    }

    match provider.create(resource).await {
        Ok(created) if created.exists => {
            state.record(provider.name(), &created);
            print_done("Created", &created);
            Ok(())
        }
        Ok(missing) => {
            if let Some(identifier) = &missing.identifier {
                record_partial(provider, state, resource, identifier);
            }
            Err(format!(
                "{} was created but could not be found when reading it back",
                resource.id
            ))
        }
        Err(e) => {
            if let Some(identifier) = &e.identifier {
                record_partial(provider, state, resource, identifier);
            }
            Err(describe(&e))
        }
    }
}

/// Track a created resource under its identifier using the configured attributes
fn record_partial(
    provider: &dyn Provider,
    state: &mut StateFile,
    resource: &Resource,
    identifier: &str,
) {
    warn!(
        "Recording {} as {} with configured attributes",
        resource.id, identifier
    );
    let partial =
        State::existing(resource.id.clone(), resource.attributes.clone()).with_identifier(identifier);
    state.record(provider.name(), &partial);
}

async fn read(
    provider: &dyn Provider,
    state: &mut StateFile,
    id: &ResourceId,
) -> Result<(), String> {
    let stored = tracked(state, id)?;
    let identifier = identifier_of(stored, id)?.to_string();

    let current = provider
        .read(id, &identifier)
        .await
        .map_err(|e| describe(&e))?;
    state.record(provider.name(), &current);

    if current.exists {
        print_done("Refreshed", &current);
    } else {
        warn!("{} ({}) no longer exists, removing from state", id, identifier);
        println!("  {} {} no longer exists", "-".red().bold(), id);
    }
    Ok(())
}

async fn update(
    provider: &dyn Provider,
    state: &mut StateFile,
    desired: &Resource,
) -> Result<(), String> {
    let id = &desired.id;
    let from = tracked(state, id)?
        .to_state()
        .map_err(|e| format!("{} has invalid stored attributes: {}", id, e))?;
    let identifier = identifier_of(tracked(state, id)?, id)?.to_string();

    if let Some(schema) = get_schemas().get(&id.resource_type) {
        let replace = schema.replacement_attributes(&from.attributes, &desired.attributes);
        if !replace.is_empty() {
            return Err(format!(
                "{} cannot be updated in place: changing {} requires replacement; delete and create it instead",
                id,
                replace.join(", ")
            ));
        }
    }

    let updated = provider
        .update(id, &identifier, &from, desired)
        .await
        .map_err(|e| describe(&e))?;
    state.record(provider.name(), &updated);
    print_done("Updated", &updated);
    Ok(())
}

async fn delete(
    provider: &dyn Provider,
    state: &mut StateFile,
    id: &ResourceId,
) -> Result<(), String> {
    let from = tracked(state, id)?
        .to_state()
        .map_err(|e| format!("{} has invalid stored attributes: {}", id, e))?;

    match provider.delete(&from).await.map_err(|e| describe(&e))? {
        DeleteOutcome::Deleted => {
            println!("  {} Deleted {}", "✓".green(), id);
        }
        DeleteOutcome::Detached { reason } => {
            println!("  {} Detached {}: {}", "!".yellow().bold(), id, reason);
        }
    }
    state.remove_resource(id);
    Ok(())
}

async fn import(
    provider: &dyn Provider,
    state: &mut StateFile,
    id: &ResourceId,
    import_id: &str,
) -> Result<(), String> {
    if state.find_resource(id).is_some() {
        return Err(format!("{} is already tracked in state", id));
    }

    let imported = provider
        .import(id, import_id)
        .await
        .map_err(|e| describe(&e))?;
    if !imported.exists {
        return Err(format!("Cannot import {}: {} was not found", id, import_id));
    }

    state.record(provider.name(), &imported);
    print_done("Imported", &imported);
    Ok(())
}

async fn run_state_command(
    backend: &dyn StateBackend,
    command: StateCommands,
) -> Result<(), String> {
    let state = backend
        .read_state()
        .await
        .map_err(|e| e.to_string())?
        .unwrap_or_default();

    match command {
        StateCommands::List => {
            if state.resources.is_empty() {
                println!("{}", "No resources tracked.".yellow());
            }
            for resource in &state.resources {
                println!(
                    "{}.{}  {}",
                    resource.resource_type,
                    resource.name.bold(),
                    resource.identifier.as_deref().unwrap_or("-").dimmed()
                );
            }
            Ok(())
        }
        StateCommands::Show { name } => {
            let resource = state
                .resources
                .iter()
                .find(|r| r.name == name)
                .ok_or_else(|| format!("No resource named '{}' in state", name))?;
            let json = serde_json::to_string_pretty(resource).map_err(|e| e.to_string())?;
            println!("{}", json);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lyra_core::provider::{BoxFuture, ProviderResult, ResourceType};
    use lyra_core::resource::Value;

    /// Provider that answers from the request, without remote calls
    struct EchoProvider;

    impl Provider for EchoProvider {
        fn name(&self) -> &'static str {
            "echo"
        }

        fn resource_types(&self) -> Vec<Box<dyn ResourceType>> {
            vec![]
        }

        fn read(&self, id: &ResourceId, identifier: &str) -> BoxFuture<'_, ProviderResult<State>> {
            let state = if identifier == "gone" {
                State::not_found(id.clone())
            } else {
                State::existing(id.clone(), HashMap::new()).with_identifier(identifier)
            };
            Box::pin(async move { Ok(state) })
        }

        fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
            let resource = resource.clone();
            Box::pin(async move {
                if resource.id.name == "partial" {
                    return Err(ProviderError::api("read back failed").with_identifier("id-partial"));
                }
                if resource.id.name == "vanished" {
                    return Ok(State::not_found(resource.id.clone()).with_identifier("id-vanished"));
                }
                Ok(State::existing(resource.id.clone(), resource.attributes)
                    .with_identifier(format!("id-{}", resource.id.name)))
            })
        }

        fn update(
            &self,
            id: &ResourceId,
            identifier: &str,
            _from: &State,
            to: &Resource,
        ) -> BoxFuture<'_, ProviderResult<State>> {
            let state = State::existing(id.clone(), to.attributes.clone()).with_identifier(identifier);
            Box::pin(async move { Ok(state) })
        }

        fn delete(&self, _from: &State) -> BoxFuture<'_, ProviderResult<DeleteOutcome>> {
            Box::pin(async {
                Ok(DeleteOutcome::Detached {
                    reason: "no remote delete".to_string(),
                })
            })
        }
    }

    const ASG_ARN: &str = "arn:aws:autoscaling:us-east-1:123456789012:autoScalingGroup:x";

    fn capacity_provider(name: &str, target_capacity: Option<i64>) -> Resource {
        let mut asg = HashMap::new();
        asg.insert("auto_scaling_group_arn".to_string(), Value::string(ASG_ARN));
        if let Some(target) = target_capacity {
            let mut scaling = HashMap::new();
            scaling.insert("target_capacity".to_string(), Value::Int(target));
            asg.insert("managed_scaling".to_string(), Value::block(scaling));
        }
        Resource::new("ecs_capacity_provider", name)
            .with_attribute("name", Value::string(name))
            .with_attribute("auto_scaling_group_provider", Value::block(asg))
    }

    fn backend() -> (tempfile::TempDir, LocalBackend) {
        let dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::with_path(dir.path().join("lyra.state.json"));
        (dir, backend)
    }

    async fn stored(backend: &LocalBackend) -> StateFile {
        backend.read_state().await.unwrap().unwrap_or_default()
    }

    #[tokio::test]
    async fn create_records_identifier() {
        let (_dir, backend) = backend();
        let resource = capacity_provider("cp", None);

        run_action(&EchoProvider, &backend, &Action::Create, &resource)
            .await
            .unwrap();

        let state = stored(&backend).await;
        assert_eq!(state.serial, 1);
        let entry = state.find_resource(&resource.id).unwrap();
        assert_eq!(entry.identifier.as_deref(), Some("id-cp"));
        assert_eq!(entry.provider, "echo");

        let again = run_action(&EchoProvider, &backend, &Action::Create, &resource).await;
        assert!(again.unwrap_err().contains("already tracked"));
    }

    #[tokio::test]
    async fn failed_create_keeps_partial_state() {
        let (_dir, backend) = backend();
        let resource = capacity_provider("partial", None);

        let err = run_action(&EchoProvider, &backend, &Action::Create, &resource)
            .await
            .unwrap_err();
        assert!(err.contains("id-partial"));

        let state = stored(&backend).await;
        assert_eq!(
            state.find_resource(&resource.id).unwrap().identifier.as_deref(),
            Some("id-partial")
        );
    }

    #[tokio::test]
    async fn create_missing_on_read_back_is_still_tracked() {
        let (_dir, backend) = backend();
        let resource = capacity_provider("vanished", None);

        let err = run_action(&EchoProvider, &backend, &Action::Create, &resource)
            .await
            .unwrap_err();
        assert!(err.contains("could not be found"));

        let state = stored(&backend).await;
        assert_eq!(
            state.find_resource(&resource.id).unwrap().identifier.as_deref(),
            Some("id-vanished")
        );
    }

    #[tokio::test]
    async fn update_refuses_replacement() {
        let (_dir, backend) = backend();
        let resource = capacity_provider("cp", Some(100));
        run_action(&EchoProvider, &backend, &Action::Create, &resource)
            .await
            .unwrap();

        let changed = capacity_provider("cp", Some(50));
        let err = run_action(&EchoProvider, &backend, &Action::Update, &changed)
            .await
            .unwrap_err();
        assert!(err.contains("auto_scaling_group_provider"));

        let tagged = capacity_provider("cp", Some(100)).with_attribute(
            "tags",
            Value::Map(HashMap::from([("Env".to_string(), Value::string("prod"))])),
        );
        run_action(&EchoProvider, &backend, &Action::Update, &tagged)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn detached_delete_stops_tracking() {
        let (_dir, backend) = backend();
        let resource = capacity_provider("cp", None);
        run_action(&EchoProvider, &backend, &Action::Create, &resource)
            .await
            .unwrap();

        run_action(&EchoProvider, &backend, &Action::Delete, &resource)
            .await
            .unwrap();
        assert!(stored(&backend).await.find_resource(&resource.id).is_none());
    }

    #[tokio::test]
    async fn read_of_untracked_resource_fails() {
        let (_dir, backend) = backend();
        let resource = capacity_provider("cp", None);
        let err = run_action(&EchoProvider, &backend, &Action::Read, &resource)
            .await
            .unwrap_err();
        assert!(err.contains("not tracked"));
        assert!(backend.acquire_lock("check", "x.y").await.is_ok());
    }

    #[tokio::test]
    async fn import_unsupported_by_default() {
        let (_dir, backend) = backend();
        let resource = capacity_provider("cp", None);
        let action = Action::Import {
            id: "cp".to_string(),
        };
        let err = run_action(&EchoProvider, &backend, &action, &resource)
            .await
            .unwrap_err();
        assert!(err.contains("Import is not supported"));
    }

    #[test]
    fn validate_reports_every_problem() {
        let bad = capacity_provider("cp", Some(500));
        let unknown = Resource::new("s3_bucket", "logs");
        let err = validate_resources(&[bad, unknown]).unwrap_err();
        assert!(err.contains("target_capacity"));
        assert!(err.contains("unknown resource type 's3_bucket'"));
        assert!(validate_resources(&[capacity_provider("cp", Some(75))]).is_ok());
    }
}
