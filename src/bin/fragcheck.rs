use clap::{ArgAction, Parser};
use fragbox::{FilesetSession, FilesetVerdict};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Validate a set of surveillance recording files as one chain"
)]
struct Args {
    /// File paths, in any order
    #[arg(required = true)]
    paths: Vec<String>,

    /// Emit JSON instead of a human-readable report
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut session = FilesetSession::new();
    for path in &args.paths {
        session.add_path(path)?;
    }
    let report = session.finish();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("fragments ({}):", report.fragments.len());
    for frag in &report.fragments {
        let ord = frag
            .ordinal
            .map(|o| o.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("  [{}] {} ({})", ord, frag.display, frag.classification);
        if let Some(fps) = frag.estimated_fps {
            println!("       ~{:.1} fps", fps);
        }
    }

    let verdict_str = match report.verdict {
        FilesetVerdict::Conformant => "conformant surveillance fileset",
        FilesetVerdict::NotSurveillanceFormat => "not a surveillance format",
        FilesetVerdict::NotSurveillanceFileset => "not a valid surveillance fileset",
    };
    println!("\nverdict: {}", verdict_str);

    if report.verdict != FilesetVerdict::Conformant {
        std::process::exit(1);
    }
    Ok(())
}
