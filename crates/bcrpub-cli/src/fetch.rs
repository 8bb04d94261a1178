//! Fetch command - download a release archive and locate its MODULE.bazel.

use anyhow::{Context, Result};
use bcrpub_archive::{ArchiveError, ArchiveFetcher, FetchConfig, ModuleFile, ReleaseArchive};
use clap::Args;
use console::style;
use std::path::PathBuf;

use crate::progress;
use crate::source::SourceSpec;

#[derive(Args, Debug)]
pub struct FetchArgs {
    /// JSON file with `url` and `strip_prefix`
    #[arg(short, long, value_name = "FILE")]
    pub source: Option<PathBuf>,

    /// Archive URL (overrides the source file)
    #[arg(long)]
    pub url: Option<String>,

    /// Directory inside the archive that contains MODULE.bazel (overrides the source file)
    #[arg(long)]
    pub strip_prefix: Option<String>,

    /// Print the contents of MODULE.bazel instead of its path
    #[arg(long)]
    pub print: bool,

    /// Leave the downloaded and extracted files in place
    #[arg(long)]
    pub keep: bool,

    /// Do not show a download progress bar
    #[arg(long)]
    pub no_progress: bool,
}

pub async fn execute(args: FetchArgs) -> Result<i32> {
    let spec = match &args.source {
        Some(path) => SourceSpec::load(path)?,
        None => SourceSpec::default(),
    }
    .with_overrides(args.url.clone(), args.strip_prefix.clone());

    let Some(url) = spec.url.as_deref() else {
        eprintln!(
            "{} No archive URL given, pass --url or --source",
            style("Error:").red().bold()
        );
        return Ok(2);
    };

    let config = FetchConfig::from_env().context("Invalid environment configuration")?;
    let fetcher = ArchiveFetcher::new(config)?;

    let bar = progress::download_bar(url, !args.no_progress);
    let fetched = fetcher
        .fetch_with_progress(
            url,
            &spec.strip_prefix,
            Some(|downloaded, total| progress::update(&bar, downloaded, total)),
        )
        .await;
    bar.finish_and_clear();

    let mut archive = match fetched {
        Ok(archive) => archive,
        Err(e) => return Ok(report(&e)),
    };
    log::info!("Downloaded {}", archive.disk_path().display());

    let located = archive.extract().await;
    let code = match &located {
        Ok(module) => {
            show(module, args.print).await?;
            0
        }
        Err(e) => report(e),
    };

    if args.keep {
        keep_notice(&archive);
    } else {
        archive.cleanup().await.context("Failed to clean up release archive")?;
    }

    Ok(code)
}

async fn show(module: &ModuleFile, print: bool) -> Result<()> {
    if print {
        print!("{}", module.read_to_string().await?);
    } else {
        println!("{}", module.path().display());
    }
    Ok(())
}

fn report(err: &ArchiveError) -> i32 {
    eprintln!("{} {}", style("Error:").red().bold(), err);
    if err.is_user_actionable() {
        1
    } else {
        3
    }
}

fn keep_notice(archive: &ReleaseArchive) {
    let location = archive
        .extract_dir()
        .unwrap_or_else(|| archive.disk_path());
    eprintln!(
        "{} Keeping {}",
        style("Note:").yellow().bold(),
        location.display()
    );
}
