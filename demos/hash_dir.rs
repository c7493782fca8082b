use clap::Parser;
use hashmark::prelude::*;
use std::path::PathBuf;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "hash_dir")]
#[command(about = "Hash every file in a directory and write a manifest")]
struct Cli {
    /// The directory containing assets (e.g., "./public")
    dir: PathBuf,

    /// Output directory for hashed files. Defaults to `dir`.
    #[arg(long)]
    out: Option<PathBuf>,

    #[arg(long, default_value = "sha1")]
    hasher: String,

    #[arg(long, default_value_t = 10)]
    length: usize,

    /// Delete originals once hashed
    #[arg(long)]
    replace: bool,

    #[arg(long, default_value = "assets.json")]
    manifest: PathBuf,

    #[arg(long, env = "HASHMARK_KEY")]
    hash_key: Option<String>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let hasher = AssetHasher::new(FileSystemStorage);

    let mut patch = ConfigPatch::new()
        .base(&cli.dir)
        .hasher(cli.hasher)
        .length(cli.length)
        .replace(cli.replace)
        .manifest(&cli.manifest);
    if let Some(out) = cli.out {
        patch = patch.path(out);
    }
    if let Some(key) = cli.hash_key {
        patch = patch.hash_key(key);
    }
    hasher.set(patch)?;

    let mut files = Vec::new();
    for entry in WalkDir::new(&cli.dir) {
        let entry = entry?;
        if entry.file_type().is_dir() {
            continue;
        }
        let relative = entry.path().strip_prefix(&cli.dir)?.to_path_buf();
        if relative == cli.manifest {
            continue;
        }
        files.push(relative);
    }

    let report = hasher.hash_batch(&files, ConfigPatch::new());
    for (file, result) in files.iter().zip(&report.files) {
        match result {
            Ok(outcome) => println!("{} -> {}", file.display(), outcome.path.display()),
            Err(e) => eprintln!("⚠️ {}: {e}", file.display()),
        }
    }

    let hashed = report.hashed();
    if let Some(manifest) = report.manifest? {
        println!(
            "✅ Hashed {hashed} files, manifest written to {}",
            manifest.display()
        );
    }

    Ok(())
}
