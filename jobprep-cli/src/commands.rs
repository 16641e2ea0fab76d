//! CLI subcommand handlers.

use crate::Commands;
use crate::ConfigAction;
use anyhow::Context;
use jobprep_core::JobprepConfig;
use jobprep_core::config::{load_config, to_toml, workspace_config_path};
use jobprep_ml::FittedEncoders;
use jobprep_ml::data::SchemaDefinition;
use jobprep_ml::pipeline::{
    DataTransformationStage, DataValidationStage, FeatureTransformer, ModelEvaluationStage,
    ModelTrainerStage, Stage, all_stages, run_pipeline,
};
use std::path::Path;

/// Handle a CLI subcommand.
pub fn handle_command(
    command: Commands,
    workspace: &Path,
    config_path: Option<&Path>,
) -> anyhow::Result<()> {
    let stages: Vec<Box<dyn Stage>> = match command {
        Commands::Config { action } => return handle_config(action, workspace, config_path),
        Commands::Transform {
            input: Some(input),
            encoders,
            output: Some(output),
        } => {
            let config = load(workspace, config_path)?;
            let encoders =
                encoders.unwrap_or_else(|| config.data_transformation.encoders_file.clone());
            return handle_apply(&config, &input, &encoders, &output);
        }
        Commands::Validate => vec![Box::new(DataValidationStage)],
        Commands::Transform { .. } => vec![Box::new(DataTransformationStage)],
        Commands::Train => vec![Box::new(ModelTrainerStage)],
        Commands::Evaluate => vec![Box::new(ModelEvaluationStage)],
        Commands::Run => all_stages(),
    };

    let config = load(workspace, config_path)?;
    run_pipeline(&config, &stages)?;
    Ok(())
}

fn load(workspace: &Path, config_path: Option<&Path>) -> anyhow::Result<JobprepConfig> {
    load_config(Some(workspace), config_path)
        .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))
}

fn handle_apply(
    config: &JobprepConfig,
    input: &Path,
    encoders: &Path,
    output: &Path,
) -> anyhow::Result<()> {
    let fitted = FittedEncoders::load(encoders)
        .with_context(|| format!("Failed to load encoders from {}", encoders.display()))?;
    let mut settings = config.data_transformation.clone();
    settings.data_path = input.to_path_buf();
    settings.lineage_file = output.with_extension("lineage.json");

    let mut transformer = FeatureTransformer::load(settings)?;
    let features = transformer.apply_fitted(fitted, output)?;
    println!(
        "Wrote {} rows x {} columns to {}",
        features.row_count(),
        features.column_count(),
        output.display()
    );
    Ok(())
}

fn handle_config(
    action: ConfigAction,
    workspace: &Path,
    config_path: Option<&Path>,
) -> anyhow::Result<()> {
    match action {
        ConfigAction::Init => {
            let config_path = workspace_config_path(workspace);
            if config_path.exists() {
                println!(
                    "Configuration file already exists at: {}",
                    config_path.display()
                );
                return Ok(());
            }
            if let Some(dir) = config_path.parent() {
                std::fs::create_dir_all(dir)?;
            }

            let toml_str = to_toml(&JobprepConfig::default())?;
            std::fs::write(&config_path, &toml_str)?;
            println!(
                "Created default configuration at: {}",
                config_path.display()
            );
            Ok(())
        }
        ConfigAction::Show => {
            let config = load(workspace, config_path)?;
            println!("{}", to_toml(&config)?);
            let schema = SchemaDefinition::load_or_default(
                config.data_validation.schema_file.as_deref(),
            )?;
            println!("# schema: {} columns, target '{}'", schema.columns.len(), schema.target_column);
            println!("# schema_hash = {}", schema.schema_hash());
            Ok(())
        }
    }
}
