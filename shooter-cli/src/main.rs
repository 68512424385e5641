use anyhow::{Context, Result};
use clap::Parser;
use shooter::{ShooterClient, ShooterConfig, SubtitleCandidate, compute_fingerprint};
use std::path::{Path, PathBuf};

/// Download subtitles for film files from shooter.cn
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Directory to save subtitles in (defaults to the directory of each film)
    #[arg(short, long)]
    dir: Option<PathBuf>,

    /// Film files to find subtitles for
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    let client = ShooterClient::new(ShooterConfig::from_env())
        .context("Failed to create shooter client")?;

    for film in &args.files {
        if let Err(e) = process_film(&client, film, args.dir.as_deref()).await {
            println!("[ERROR] {e:#}");
        }
    }

    Ok(())
}

/// Fingerprint one film, look it up and download everything that matched.
async fn process_film(client: &ShooterClient, film: &Path, dir: Option<&Path>) -> Result<()> {
    let fingerprint = compute_fingerprint(film)
        .with_context(|| format!("Failed to fingerprint {}", film.display()))?;
    let (directory, filename) = resolve_target(film, dir)?;
    log::info!("Saving subtitles for {filename} to {}", directory.display());

    let candidates = client
        .query(&fingerprint, &filename)
        .await
        .with_context(|| format!("Failed to query subtitles for {filename}"))?;
    println!("Found {} subtitles for {filename}", candidates.len());

    let report = client.fetch_all(candidates, directory).await;
    for (i, result) in report.results().iter().enumerate() {
        match &result.outcome {
            Ok(path) => println!("[DONE] {}", path.display()),
            Err(e) => println!("[ERROR] {}-{i} {e}", describe(&result.candidate)),
        }
    }

    Ok(())
}

/// `Film.srt` style label for a candidate in error lines.
fn describe(candidate: &SubtitleCandidate) -> String {
    format!(
        "{}.{}",
        candidate.base_film_name().unwrap_or("subtitle"),
        candidate.extension()
    )
}

/// Where to save subtitles and which file name to query with.
/// Without `--dir`, subtitles land next to the film.
fn resolve_target(film: &Path, dir: Option<&Path>) -> Result<(PathBuf, String)> {
    let filename = film
        .file_name()
        .with_context(|| format!("{} has no file name", film.display()))?
        .to_string_lossy()
        .into_owned();

    let directory = match dir {
        Some(dir) => dir.to_path_buf(),
        None => std::path::absolute(film)
            .with_context(|| format!("Failed to resolve {}", film.display()))?
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default(),
    };

    Ok((directory, filename))
}
