//! `molimport`: import a structure document into an in-memory scene and
//! write the resulting scene as JSON.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::Parser;
use molimport::error::ImportError;
use molimport::loader::{DocumentLoader, FileFormat, StructureSource};
use molimport::options::{ImportOptions, Style};
use molimport::pipeline::import_structure;
use molimport::scene::MemoryScene;

#[derive(Parser, Debug)]
#[command(
    name = "molimport",
    about = "Import a molecular structure document and emit the scene it builds.",
    version
)]
struct Cli {
    /// Structure document (JSON atom columns with MMTF-style metadata).
    document: PathBuf,
    /// Source format; guessed from the inner extension when omitted
    /// (e.g. `4hhb.cif.json`).
    #[arg(long)]
    format: Option<FileFormat>,
    /// Object name; defaults to the document's file stem.
    #[arg(long)]
    name: Option<String>,
    /// TOML preset to start from.
    #[arg(long, value_name = "FILE")]
    options: Option<PathBuf>,
    /// Visual style preset.
    #[arg(long)]
    style: Option<Style>,
    /// Instance the biological assembly.
    #[arg(long)]
    build_assembly: bool,
    /// Assembly to instance; the first one when omitted.
    #[arg(long, value_name = "ID")]
    assembly: Option<String>,
    /// Skip style graph creation.
    #[arg(long)]
    no_nodes: bool,
    /// Move the structure's centroid to the origin.
    #[arg(long)]
    centre: bool,
    /// Keep water and other solvent residues.
    #[arg(long)]
    keep_solvent: bool,
    /// Destination collection.
    #[arg(long)]
    collection: Option<String>,
    /// Cache directory handed to the loader.
    #[arg(long, value_name = "DIR")]
    cache_dir: Option<PathBuf>,
    /// Log pipeline steps.
    #[arg(short, long)]
    verbose: bool,
    /// Output file. When omitted, stdout is used.
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

impl Cli {
    fn import_options(&self) -> Result<ImportOptions, ImportError> {
        let mut options = match &self.options {
            Some(path) => ImportOptions::load(path)?,
            None => ImportOptions::default(),
        };
        if let Some(style) = self.style {
            options.style = style;
        }
        if self.assembly.is_some() {
            options.assembly_id.clone_from(&self.assembly);
        }
        if self.collection.is_some() {
            options.collection.clone_from(&self.collection);
        }
        if self.cache_dir.is_some() {
            options.cache_dir.clone_from(&self.cache_dir);
        }
        options.build_assembly |= self.build_assembly;
        options.setup_nodes &= !self.no_nodes;
        options.centre |= self.centre;
        options.del_solvent &= !self.keep_solvent;
        options.verbose |= self.verbose;
        Ok(options)
    }

    fn source(&self) -> StructureSource {
        // `4hhb.cif.json` -> look at `4hhb.cif`
        let inner = self.document.file_stem().map(Path::new);
        let format = self
            .format
            .or_else(|| inner.and_then(FileFormat::from_path))
            .or_else(|| FileFormat::from_path(&self.document))
            .unwrap_or_default();
        StructureSource::from_path(&self.document).with_format(format)
    }

    fn name(&self) -> String {
        self.name.clone().unwrap_or_else(|| {
            self.document
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| n.split('.').next())
                .unwrap_or("molecule")
                .to_owned()
        })
    }
}

fn run(cli: &Cli) -> Result<(), ImportError> {
    let options = cli.import_options()?;
    let mut scene = MemoryScene::new();
    let model = import_structure(
        &DocumentLoader,
        &mut scene,
        &cli.source(),
        &cli.name(),
        &options,
    )?;
    log::info!(
        "imported {} ({} chains, {} objects)",
        model.name,
        model.chain_ids.len(),
        scene.object_count()
    );

    let writer: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(File::create(path)?),
        None => Box::new(io::stdout().lock()),
    };
    let mut writer = BufWriter::new(writer);
    serde_json::to_writer_pretty(&mut writer, &scene.snapshot())
        .map_err(io::Error::from)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(default_level),
    )
    .init();

    if let Err(e) = run(&cli) {
        log::error!("{e}");
        std::process::exit(1);
    }
}
