mod crt0;
mod report;

use anyhow::Context;
use clap::Parser;
use fae_config::ImageLayout;
use fae_core::gdbinit::GDBINIT_FILE;
use fae_core::GdbInit;
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "FAE image builder for post-issuance software",
    long_about = None
)]
struct Args {
    /// Path to the linked application ELF file (name.elf)
    elf: PathBuf,

    /// Directory holding crt0.fae and crt0.elf
    #[arg(long = "crt0-path", visible_alias = "crt0_path", default_value = crt0::DEFAULT_CRT0_DIR)]
    crt0_path: PathBuf,

    /// Image layout overrides (YAML)
    #[arg(short, long)]
    layout: Option<PathBuf>,

    /// Write a JSON build report to this path
    #[arg(short, long)]
    report: Option<PathBuf>,

    /// Rebuild crt0 with `make realclean all` before packing
    #[arg(long)]
    make_crt0: bool,

    /// Skip writing the gdbinit file
    #[arg(long)]
    no_gdbinit: bool,

    /// Enable debug logging
    #[arg(short, long)]
    trace: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.trace {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_writer(std::io::stderr)
            .init();
    }

    info!("Starting FAE image builder");

    let output = fae_core::output_path(&args.elf)?;

    let layout = if let Some(layout_path) = &args.layout {
        info!("Loading image layout: {:?}", layout_path);
        ImageLayout::from_file(layout_path)?
    } else {
        debug!("Using default image layout");
        ImageLayout::default()
    };

    if args.make_crt0 {
        crt0::make(&args.crt0_path)?;
    }
    let crt0 = crt0::read_blob(&args.crt0_path)?;

    info!("Loading application: {:?}", args.elf);
    let object = fae_loader::load_elf(&args.elf)?;

    let image = fae_core::build_image(&object, &crt0, &layout)
        .with_context(|| format!("Failed to build image from {:?}", args.elf))?;

    std::fs::write(&output, &image.bytes)
        .with_context(|| format!("Failed to write {:?}", output))?;
    info!("Wrote {:?} ({} bytes)", output, image.bytes.len());

    if !args.no_gdbinit {
        let gdbinit = GdbInit::from_object(
            &object,
            image.metadata_size(),
            crt0::absolute(&args.crt0_path.join(crt0::CRT0_ELF))?,
            crt0::absolute(&args.elf)?,
        )?;
        let gdbinit_path = output.with_file_name(GDBINIT_FILE);
        std::fs::write(&gdbinit_path, gdbinit.to_string())
            .with_context(|| format!("Failed to write {:?}", gdbinit_path))?;
        info!("Wrote {:?}", gdbinit_path);
    }

    if let Some(report_path) = &args.report {
        report::BuildReport::new(&output, &image).write(report_path)?;
        info!("Wrote build report {:?}", report_path);
    }

    Ok(())
}
