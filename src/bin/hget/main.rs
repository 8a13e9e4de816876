mod config;
mod error;
mod fetch;
mod logging;

use anyhow::{bail, Context};
use chrono::{DateTime, Local};
use config::Config;
use crossbeam_utils::thread;
use fetch::Source;
use headway::{Progress, Reader, Ticker, DEFAULT_TICK_INTERVAL};
use indicatif::{HumanDuration, ProgressBar, ProgressStyle};
use log::*;
use num_format::{SystemLocale, ToFormattedString};
use std::{
    fmt::Display,
    fs, io,
    path::{Path, PathBuf},
    str::FromStr,
    time::{Duration, Instant},
};
use structopt::StructOpt;
use tempfile::NamedTempFile;
use url::Url;

const APP_NAME: &str = "hget";
const DEFAULT_FILENAME: &str = "download";

#[derive(Debug, Copy, Clone)]
struct ConnectTimeout(u64);

impl Default for ConnectTimeout {
    fn default() -> Self {
        Self(fetch::HTTP_CONNECT_TIMEOUT)
    }
}

impl FromStr for ConnectTimeout {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

impl Display for ConnectTimeout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Copy, Clone)]
struct TickInterval(u64);

impl Default for TickInterval {
    fn default() -> Self {
        Self(DEFAULT_TICK_INTERVAL.as_millis() as u64)
    }
}

impl FromStr for TickInterval {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

impl Display for TickInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, StructOpt)]
#[structopt(
    name = APP_NAME,
    about = "Downloads a file over HTTP, showing live progress and a remaining-time estimate."
)]
struct Opt {
    /// Enable verbose logging
    #[structopt(short, long)]
    verbose: bool,
    /// Custom path to the app's configuration file. By default the app will use the system-specific user configuration
    /// directory.
    #[structopt(short, long)]
    config: Option<PathBuf>,
    /// Write the download to this path instead of deriving a file name from the source.
    #[structopt(short, long)]
    output: Option<PathBuf>,
    /// The timeout to wait for HTTP requests to succeed in milliseconds.
    #[structopt(default_value, short, long)]
    timeout: ConnectTimeout,
    /// The time between progress updates in milliseconds.
    #[structopt(default_value, short, long)]
    interval: TickInterval,
    /// The URL to download.
    url: Url,
}

fn main() -> anyhow::Result<()> {
    let opt = Opt::from_args();

    setup_logging(&opt)?;
    let cfg = load_config(&opt)?;

    debug!("{:?}", opt);
    debug!("{:?}", cfg);

    let source = fetch::open(&opt.url, opt.timeout.0, cfg.user_agent.as_deref())?;

    if let Some(length) = source.length {
        info!("Downloading {} with length {}", opt.url, length);
    } else {
        info!("Downloading {} with indeterminate length", opt.url);
    }

    let destination = destination(&opt, &cfg, &source);
    let started = Instant::now();
    let written = download(source, &destination, Duration::from_millis(opt.interval.0))?;

    let locale = SystemLocale::default().expect("failed to get system locale");
    info!(
        "Downloaded {} bytes to {} in {}s",
        written.to_formatted_string(&locale),
        destination.display(),
        started.elapsed().as_secs_f32()
    );

    Ok(())
}

fn setup_logging(opt: &Opt) -> anyhow::Result<()> {
    logging::setup_logging(if opt.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    })?;
    Ok(())
}

fn load_config(opt: &Opt) -> anyhow::Result<Config> {
    Ok(match opt.config.as_deref() {
        Some(path) => confy::load_path(path)?,
        None => confy::load(APP_NAME)?,
    })
}

fn destination(opt: &Opt, cfg: &Config, source: &Source) -> PathBuf {
    match &opt.output {
        Some(path) => path.clone(),
        None => {
            let filename = source.filename.as_deref().unwrap_or(DEFAULT_FILENAME);
            match &cfg.download_dir {
                Some(dir) => dir.join(filename),
                None => PathBuf::from(filename),
            }
        }
    }
}

fn download(source: Source, destination: &Path, interval: Duration) -> anyhow::Result<u64> {
    let parent = destination.parent().filter(|path| !path.as_os_str().is_empty());

    if let Some(parent) = parent {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    // the download is staged next to its destination so finishing it is a rename, and a failed
    // download never leaves a partial file behind
    let mut staging = match parent {
        Some(parent) => NamedTempFile::new_in(parent),
        None => NamedTempFile::new_in("."),
    }
    .context("failed to create a staging file")?;

    let length = source.length;
    let mut reader = match length {
        Some(total) => Reader::with_total(source.reader, total),
        None => Reader::new(source.reader),
    };

    let ticks = Ticker::new(reader.counter()).interval(interval).start()?;
    let cancel = ticks.cancel_token();
    let bar = progress_bar(length);

    let written = thread::scope(|s| {
        let bar = &bar;
        s.spawn(move |_| {
            for progress in ticks {
                render(bar, &progress);
            }
            bar.finish_and_clear();
        });

        let written = io::copy(&mut reader, staging.as_file_mut());

        // the ticker stops by itself only once a snapshot reaches the expected length; any other
        // outcome has to stop it explicitly or the render thread never finishes
        let complete = matches!((&written, length), (Ok(written), Some(length)) if *written >= length);
        if !complete {
            cancel.cancel();
        }
        written
    })
    .expect("render scope failed")
    .context("failed to download the file")?;

    if let Some(length) = length {
        if written < length {
            bail!("the source closed after {} of {} bytes", written, length);
        }
    }

    staging
        .persist(destination)
        .with_context(|| format!("failed to persist the download to {}", destination.display()))?;

    Ok(written)
}

fn progress_bar(length: Option<u64>) -> ProgressBar {
    match length {
        Some(length) => ProgressBar::new(length).with_style(
            ProgressStyle::default_bar()
                .template("{bytes}/{total_bytes} [{bar:40}] {percent}% {msg}")
                .progress_chars("=>-"),
        ),
        None => ProgressBar::new_spinner()
            .with_style(ProgressStyle::default_spinner().template("{spinner} {bytes} {msg}")),
    }
}

fn render(bar: &ProgressBar, progress: &Progress) {
    bar.set_position(progress.bytes());

    if let (Some(remaining), Some(eta)) = (progress.remaining(), progress.eta()) {
        bar.set_message(format!(
            "{} remaining, ETA {}",
            HumanDuration(remaining),
            DateTime::<Local>::from(eta).format("%H:%M:%S")
        ));
    }
}
