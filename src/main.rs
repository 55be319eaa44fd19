//! sensor-fault binary

use clap::Parser;
use sensor_fault::cli::{cmd_predict, cmd_train, Cli, Commands, TrainOptions};
use sensor_fault::logging::init_logging;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Train {
            data,
            schema,
            model_config,
            artifact_dir,
            expected_score,
            split_ratio,
            strict_schema,
            json,
            log_dir,
        } => {
            let _guard = init_logging(Some(&log_dir));
            let options = TrainOptions {
                expected_score,
                split_ratio,
                strict_schema,
                json,
            };
            cmd_train(&data, &schema, &model_config, &artifact_dir, options)?;
        }
        Commands::Predict {
            model,
            encoder,
            data,
            output,
        } => {
            let _guard = init_logging(None);
            cmd_predict(&model, &encoder, &data, output.as_deref())?;
        }
    }

    Ok(())
}
