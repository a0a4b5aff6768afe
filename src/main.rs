use clap::{Parser, Subcommand};
use exposure::generate::{self, THUMBNAILS_SUBDIR};
use exposure::thumbnails::{ThumbnailGenerator, ThumbnailRecord};
use exposure::{config, scan, yaml_sync};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

fn version_string() -> &'static str {
    let sha = env!("BUILD_GIT_SHA");
    if sha.is_empty() {
        env!("CARGO_PKG_VERSION")
    } else {
        // Leaked once at startup — trivial, called exactly once
        Box::leak(format!("{} ({sha})", env!("CARGO_PKG_VERSION")).into_boxed_str())
    }
}

#[derive(Parser)]
#[command(name = "exposure")]
#[command(about = "Static image gallery generator")]
#[command(long_about = "\
Static image gallery generator

Scans a flat directory of photos, keeps a gallery.yaml metadata file in
sync, generates privacy-scrubbed WebP+JPEG thumbnails with inline blur
placeholders, and renders a single responsive HTML page.

Workflow:

  1. Drop photos into the content directory
  2. Run 'exposure build' — new photos get stub entries in gallery.yaml
  3. Edit gallery.yaml: assign categories, titles, descriptions
  4. Run 'exposure build' again and publish the output directory

Thumbnails are cached by content hash; unchanged photos are never
re-encoded. EXIF data in published files is reduced to a small allow-list
(orientation, camera model, capture time, exposure) — GPS position,
serial numbers, and authorship tags never reach the output.")]
#[command(version = version_string())]
struct Cli {
    /// Settings file (default: settings.yaml if present)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Enable debug-level log output
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the full pipeline: scan → sync → thumbnails → HTML
    Build {
        /// Ignore the build cache — force re-encoding of all thumbnails
        #[arg(long)]
        no_cache: bool,
    },
    /// Validate settings, content directory, and gallery file without writing
    Check,
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "exposure=debug" } else { "exposure=info" })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .without_time()
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Command::Build { no_cache } => run_build(cli.settings.as_deref(), no_cache),
        Command::Check => run_check(cli.settings.as_deref()),
    };
    if let Err(err) = result {
        error!("{err}");
        std::process::exit(1);
    }
}

fn run_build(
    settings: Option<&std::path::Path>,
    no_cache: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = config::load_config(settings)?;
    let images = scan::discover_images(&config.content_dir)?;
    info!("found {} images in {}", images.len(), config.content_dir.display());

    let duplicates = scan::find_duplicate_stems(&images);
    if !duplicates.is_empty() {
        return Err(format!(
            "duplicate image stems would collide in the output: {}",
            duplicates.join(", ")
        )
        .into());
    }

    let mut gallery = yaml_sync::load_gallery_file(&config.gallery_file, &config.default_category)?;
    yaml_sync::check_duplicates(&gallery)?;
    let added = yaml_sync::sync_stub_entries(&mut gallery, &images, &config.default_category);
    if !added.is_empty() {
        yaml_sync::save_gallery_file(&config.gallery_file, &gallery)?;
        info!("added {} stub entries to {}", added.len(), config.gallery_file.display());
    }

    let thumb_dir = config.output_dir.join(THUMBNAILS_SUBDIR);
    let mut generator = ThumbnailGenerator::new(
        &config.thumbnails,
        &config.placeholders,
        &thumb_dir,
        !no_cache,
    )?;
    let mut progress = |done: usize, total: usize| debug!("thumbnails {done}/{total}");
    let outcome = generator.generate_batch(&images, Some(&mut progress));
    for failed in &outcome.failed {
        warn!("excluded from gallery: {}", failed.display());
    }

    let thumbnails: HashMap<PathBuf, ThumbnailRecord> = outcome
        .successful
        .into_iter()
        .map(|record| (record.source_path.clone(), record))
        .collect();
    let categories = generate::organize_by_category(
        &gallery,
        &images,
        &thumbnails,
        &config.default_category,
    );
    generate::generate(&categories, &config.site_title, &config.output_dir)?;

    info!(
        "build complete: {} images in {} categories → {}",
        thumbnails.len(),
        categories.len(),
        config.output_dir.display()
    );
    Ok(())
}

/// Validate without writing anything: settings load, content directory
/// scan, gallery file parse, duplicate checks.
fn run_check(settings: Option<&std::path::Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = config::load_config(settings)?;
    let images = scan::discover_images(&config.content_dir)?;

    let duplicates = scan::find_duplicate_stems(&images);
    if !duplicates.is_empty() {
        return Err(format!("duplicate image stems: {}", duplicates.join(", ")).into());
    }

    let gallery = yaml_sync::load_gallery_file(&config.gallery_file, &config.default_category)?;
    yaml_sync::check_duplicates(&gallery)?;

    let known: std::collections::HashSet<&str> =
        gallery.images.iter().map(|e| e.filename.as_str()).collect();
    let pending = images
        .iter()
        .filter_map(|p| p.file_name().and_then(|n| n.to_str()))
        .filter(|name| !known.contains(name))
        .count();

    info!(
        "ok: {} images, {} categories, {} gallery entries ({} pending stub sync)",
        images.len(),
        gallery.categories.len(),
        gallery.images.len(),
        pending
    );
    Ok(())
}
