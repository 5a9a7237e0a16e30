use std::path::Path;

use anyhow::Context;
use clap::{Parser, Subcommand};

use cutline_timeline::formatter;
use cutline_timeline::{ClipSource, Timecode, Timeline, uri};

#[derive(Parser, Debug)]
#[command(name = "cutline")]
#[command(about = "Inspect and convert frame-accurate timeline projects")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the tracks, layers, and clips of a project
    Info {
        /// Project URI or local path
        target: String,
    },
    /// Load a project in any recognized format and save it natively
    Convert {
        /// Source URI or path
        input: String,
        /// Destination URI or path
        output: String,
        /// Replace the destination if it already exists
        #[arg(long)]
        overwrite: bool,
    },
    /// List the registered formatters
    Formatters,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    formatter::init();
    #[cfg(feature = "interchange")]
    if !interchange_formatter::register() {
        eprintln!("[cutline] interchange adapters unavailable, native projects only");
    }

    match args.command {
        Command::Info { target } => info(&as_uri(&target)?),
        Command::Convert {
            input,
            output,
            overwrite,
        } => convert(&as_uri(&input)?, &as_uri(&output)?, overwrite),
        Command::Formatters => {
            list_formatters();
            Ok(())
        }
    }
}

/// Pass URIs through, turn bare paths into file URIs.
fn as_uri(target: &str) -> anyhow::Result<String> {
    if uri::scheme(target).is_some() {
        return Ok(target.to_owned());
    }
    let path = Path::new(target);
    if path.is_absolute() {
        Ok(uri::from_file_path(path))
    } else {
        let cwd = std::env::current_dir().context("resolving the working directory")?;
        Ok(uri::from_file_path(&cwd.join(path)))
    }
}

fn info(target: &str) -> anyhow::Result<()> {
    let timeline = Timeline::new_from_uri(target).with_context(|| format!("loading {target}"))?;

    println!("project: {target}");
    match timeline.timecodes_config() {
        Some(config) => println!("timecodes: {} flags {}", config.rate, config.flags),
        None => println!("timecodes: free-running"),
    }

    let duration = timeline.duration();
    match timeline
        .fduration()
        .ok()
        .zip(timeline.timecodes_config())
        .and_then(|(frames, config)| Timecode::from_frames(frames, config).ok())
    {
        Some(timecode) => println!("duration: {duration} ({timecode})"),
        None => println!("duration: {duration}"),
    }

    for track in timeline.tracks() {
        println!("track {}: {}", track.id(), track.kind());
    }

    for layer in timeline.layers() {
        println!("layer {}:", layer.priority());
        for clip in layer.clips() {
            let source = match clip.source() {
                ClipSource::Pattern => "pattern".to_owned(),
                ClipSource::Media { asset_id } => asset_id.clone(),
            };
            println!("  clip {:?} <- {source}", clip.name());
            println!(
                "    start {} inpoint {} duration {}",
                clip.start(),
                clip.inpoint(),
                clip.duration()
            );
            if clip.fstart().is_valid() || clip.finpoint().is_valid() || clip.fduration().is_valid()
            {
                println!(
                    "    frames: start {} inpoint {} duration {}",
                    clip.fstart(),
                    clip.finpoint(),
                    clip.fduration()
                );
            }
        }
    }

    let assets = timeline.project().assets();
    if !assets.is_empty() {
        println!("assets:");
        for asset in assets {
            match asset.duration() {
                Some(duration) => println!("  {} ({duration})", asset.id()),
                None => println!("  {}", asset.id()),
            }
        }
    }

    Ok(())
}

fn convert(input: &str, output: &str, overwrite: bool) -> anyhow::Result<()> {
    let timeline = Timeline::new_from_uri(input).with_context(|| format!("loading {input}"))?;
    timeline
        .save_to_uri(output, overwrite)
        .with_context(|| format!("saving {output}"))?;
    println!("[cutline] wrote {output}");
    Ok(())
}

fn list_formatters() {
    for info in formatter::formatters() {
        println!("{} (rank {})", info.name(), info.rank());
        if !info.description().is_empty() {
            println!("  {}", info.description());
        }
        if !info.extensions().is_empty() {
            println!("  extensions: {}", info.extensions());
        }
        if !info.mimetype().is_empty() {
            println!("  mimetype: {}", info.mimetype());
        }
    }
}
