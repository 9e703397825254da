use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};

use ortho_config::OrthoConfig;
use review_topics::api::{ReviewRequest, handle_request};
use review_topics::cli::ReviewsArgs;
use review_topics::manifest::ModelManifest;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = ReviewsArgs::load()?;
    let manifest_path = args
        .manifest
        .as_deref()
        .ok_or("no model manifest given; pass --manifest or set REVIEWS_MANIFEST")?;
    let mut manifest = ModelManifest::load(manifest_path)?;
    manifest.pipeline = args.apply(manifest.pipeline);
    let (predictor, taxonomies) = manifest.build()?;

    let request: ReviewRequest = match &args.input {
        Some(path) => serde_json::from_reader(BufReader::new(File::open(path)?))?,
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            serde_json::from_str(&buffer)?
        }
    };
    tracing::info!(reviews = request.data.len(), "received request");

    let response = handle_request(&predictor, &request, &taxonomies)?;
    let mut writer = BufWriter::new(io::stdout().lock());
    if args.pretty.unwrap_or(false) {
        serde_json::to_writer_pretty(&mut writer, &response)?;
    } else {
        serde_json::to_writer(&mut writer, &response)?;
    }
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}
