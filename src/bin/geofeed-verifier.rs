use anyhow::Result;
use clap::Parser;
use geofeed_verifier::lookup::mmdb::{MmdbAsnLookup, MmdbCityLookup};
use geofeed_verifier::*;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Verify geofeed bulk-correction files against a MaxMind DB
#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    /// configuration file path, by default $HOME/.geofeed-verifier.toml is used
    #[clap(short, long)]
    config: Option<String>,

    /// Print debug information
    #[clap(long)]
    debug: bool,

    #[clap(flatten)]
    verify: VerifyArgs,
}

fn init_logging(debug: bool) {
    // --debug wins over RUST_LOG; otherwise only warnings reach stderr
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = VerifierConfig::new(&cli.config)?;
    debug!("configuration:\n{}", config.summary());

    let args = cli.verify;
    let db_path = args.db.clone().unwrap_or(config.db_path);
    if db_path.is_empty() {
        return Err(GeofeedError::configuration("--db can not be an empty string").into());
    }
    let isp_path = args.isp.clone().or(config.isp_path);
    let options = args.options().with_lax(args.lax || config.lax);

    let city = MmdbCityLookup::open(&db_path)?;
    info!("city database: {}", city.info());
    let isp = isp_path.map(MmdbAsnLookup::open).transpose()?;
    if let Some(isp) = &isp {
        info!("ASN database: {}", isp.info());
    }

    let lens = VerifyLens::new(
        &city,
        isp.as_ref().map(|l| l as &dyn AsnLookup),
        options,
    );
    let report = lens.verify_path(&args.geofeed).map_err(|e| {
        // file:line so editors can jump straight to the offending row
        let location = match e.line() {
            Some(line) => format!("{}:{}", args.geofeed.display(), line),
            None => args.geofeed.display().to_string(),
        };
        anyhow::Error::new(e).context(format!("unable to process geofeed {}", location))
    })?;

    debug!("writing {} report", args.format);
    println!("{}", lens.format_report(&report, args.format));
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.debug);

    if let Err(e) = run(cli) {
        eprintln!("ERROR: {:#}", e);
        std::process::exit(1);
    }
}
