//! labelkit command-line front end.
//!
//! Drives the editing engine end-to-end: renders designs to PNG, manages
//! the design library, writes template designs and runs batch prints into
//! a directory sink.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use labelkit_core::canvas::Canvas;
use labelkit_core::config::EditorConfig;
use labelkit_core::media::Media;
use labelkit_core::print::{BatchItem, DirectorySink, SubmissionGuard, plan_batch};
use labelkit_core::storage::{FileStorage, Library};
use labelkit_core::templates::BuiltinTemplate;
use labelkit_render::ExportRenderer;
use pollster::block_on;
use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(name = "labelkit")]
#[command(about = "Label designer engine")]
pub struct Cli {
    /// Editor settings file (JSON).
    #[arg(long, global = true, env = "LABELKIT_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,
    /// Design library directory.
    #[arg(long, global = true, env = "LABELKIT_STORE", value_name = "DIR")]
    store: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Render a design to a PNG print raster.
    Render {
        /// Design JSON file.
        #[arg(long, value_name = "FILE", conflicts_with = "id", required_unless_present = "id")]
        file: Option<PathBuf>,
        /// Library design id.
        #[arg(long)]
        id: Option<String>,
        #[arg(long, short, value_name = "FILE")]
        output: PathBuf,
    },
    /// List library designs, newest first.
    List,
    /// Store a design file in the library.
    Save {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[arg(long)]
        name: Option<String>,
        /// Overwrite this design instead of allocating a new id.
        #[arg(long)]
        id: Option<String>,
    },
    /// Import a design file as a new library entry.
    Import {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Write a library design as JSON.
    Export {
        id: String,
        /// Output file; stdout when omitted.
        #[arg(long, short, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Remove a design from the library.
    Delete { id: String },
    /// List built-in templates.
    Templates,
    /// Write a new design file, optionally from a template.
    New {
        #[arg(long, conflicts_with = "media")]
        template: Option<String>,
        #[arg(long)]
        media: Option<String>,
        #[arg(long, short, value_name = "FILE")]
        output: PathBuf,
    },
    /// Print several library designs into a directory of numbered PNGs.
    Batch {
        /// JSON list of `{"designId": ..., "qty": ...}`.
        #[arg(value_name = "FILE")]
        items: PathBuf,
        #[arg(long, value_name = "DIR")]
        out_dir: PathBuf,
    },
}

pub fn run<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);
    let mut stdout = std::io::stdout().lock();
    execute(cli, &mut stdout)
}

/// Run a parsed command, writing its report to `out`.
pub fn execute(cli: Cli, out: &mut impl Write) -> Result<()> {
    let config = match &cli.config {
        Some(path) => EditorConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => EditorConfig::default(),
    };
    let session = Session {
        store: cli.store.or_else(|| config.storage_dir.clone()),
        config,
    };

    match cli.command {
        Commands::Render { file, id, output } => session.render(file.as_deref(), id.as_deref(), &output, out),
        Commands::List => session.list(out),
        Commands::Save { file, name, id } => session.save(&file, name.as_deref(), id.as_deref(), out),
        Commands::Import { file } => session.import(&file, out),
        Commands::Export { id, output } => session.export(&id, output.as_deref(), out),
        Commands::Delete { id } => session.delete(&id, out),
        Commands::Templates => list_templates(out),
        Commands::New { template, media, output } => {
            session.new_design(template.as_deref(), media.as_deref(), &output, out)
        }
        Commands::Batch { items, out_dir } => session.batch(&items, &out_dir, out),
    }
}

struct Session {
    config: EditorConfig,
    store: Option<PathBuf>,
}

impl Session {
    fn library(&self) -> Result<Library<FileStorage>> {
        let storage = match &self.store {
            Some(dir) => FileStorage::new(dir.clone()),
            None => FileStorage::default_location(),
        }
        .context("failed to open design library")?;
        log::debug!("Using library at {}", storage.base_path().display());
        Ok(Library::new(Arc::new(storage)))
    }

    fn read_design(&self, file: &Path) -> Result<Canvas> {
        let json = fs::read_to_string(file)
            .with_context(|| format!("failed to read {}", file.display()))?;
        let mut canvas = Canvas::new(self.config.clone());
        canvas
            .load_json(&json)
            .with_context(|| format!("invalid design {}", file.display()))?;
        Ok(canvas)
    }

    fn open_design(&self, id: &str) -> Result<Canvas> {
        let stored = block_on(self.library()?.open(id))?;
        Ok(Canvas::with_document(stored.document, self.config.clone()))
    }

    fn render(&self, file: Option<&Path>, id: Option<&str>, output: &Path, out: &mut impl Write) -> Result<()> {
        let mut canvas = match (file, id) {
            (Some(file), _) => self.read_design(file)?,
            (None, Some(id)) => self.open_design(id)?,
            (None, None) => anyhow::bail!("either --file or --id is required"),
        };
        canvas.load_images();

        let label = ExportRenderer::from_config(&self.config)
            .export(canvas.document())
            .context("failed to render design")?;
        write_file(output, &label.png)?;
        writeln!(out, "{} ({}x{})", output.display(), label.width, label.height)?;
        Ok(())
    }

    fn list(&self, out: &mut impl Write) -> Result<()> {
        for summary in block_on(self.library()?.list())? {
            let updated = summary
                .updated_at
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "-".to_string());
            writeln!(out, "{}\t{}\t{}\t{}", summary.id, summary.name, summary.media, updated)?;
        }
        Ok(())
    }

    fn save(&self, file: &Path, name: Option<&str>, id: Option<&str>, out: &mut impl Write) -> Result<()> {
        let canvas = self.read_design(file)?;
        let library = self.library()?;
        let id = match id {
            Some(id) => {
                block_on(library.save(id, name, canvas.document()))?;
                id.to_string()
            }
            None => {
                let name = name.map(str::to_string).unwrap_or_else(|| default_name(file));
                block_on(library.save_as(&name, canvas.document()))?
            }
        };
        writeln!(out, "{id}")?;
        Ok(())
    }

    fn import(&self, file: &Path, out: &mut impl Write) -> Result<()> {
        let json = fs::read_to_string(file)
            .with_context(|| format!("failed to read {}", file.display()))?;
        let id = block_on(self.library()?.import_json(&json))?;
        writeln!(out, "{id}")?;
        Ok(())
    }

    fn export(&self, id: &str, output: Option<&Path>, out: &mut impl Write) -> Result<()> {
        let stored = block_on(self.library()?.open(id))?;
        let json = Library::<FileStorage>::export_json(Some(id), stored.name.as_deref(), &stored.document)?;
        match output {
            Some(path) => {
                write_file(path, json.as_bytes())?;
                writeln!(out, "{}", path.display())?;
            }
            None => writeln!(out, "{json}")?,
        }
        Ok(())
    }

    fn delete(&self, id: &str, out: &mut impl Write) -> Result<()> {
        block_on(self.library()?.delete(id))?;
        writeln!(out, "deleted {id}")?;
        Ok(())
    }

    fn new_design(
        &self,
        template: Option<&str>,
        media: Option<&str>,
        output: &Path,
        out: &mut impl Write,
    ) -> Result<()> {
        let mut canvas = Canvas::new(self.config.clone());
        if let Some(id) = template {
            let template = BuiltinTemplate::from_id(id)
                .with_context(|| format!("unknown template {id:?}"))?;
            canvas.apply_template(template);
        }
        if let Some(id) = media {
            let media = Media::from_id(id);
            if media.dimensions().is_none() {
                anyhow::bail!("unknown media {id:?}");
            }
            canvas.set_media(media);
        }
        write_file(output, canvas.to_json()?.as_bytes())?;
        writeln!(out, "{}", output.display())?;
        Ok(())
    }

    fn batch(&self, items: &Path, out_dir: &Path, out: &mut impl Write) -> Result<()> {
        let json = fs::read_to_string(items)
            .with_context(|| format!("failed to read {}", items.display()))?;
        let requested: Vec<BatchItem> =
            serde_json::from_str(&json).with_context(|| format!("invalid batch {}", items.display()))?;
        let planned = plan_batch(&requested);

        let library = self.library()?;
        let renderer = ExportRenderer::from_config(&self.config);
        let sink = DirectorySink::new(out_dir)?;
        let guard = SubmissionGuard::new();

        for item in &planned {
            let stored = block_on(library.open(&item.design_id))?;
            let mut canvas = Canvas::with_document(stored.document, self.config.clone());
            canvas.load_images();
            let label = renderer.export(canvas.document())?;
            for _ in 0..item.qty {
                let status = block_on(guard.submit(&sink, &label))?;
                log::debug!("{status}");
            }
        }
        writeln!(out, "printed {} labels to {}", sink.written(), out_dir.display())?;
        Ok(())
    }
}

fn list_templates(out: &mut impl Write) -> Result<()> {
    for template in BuiltinTemplate::all() {
        writeln!(
            out,
            "{}\t{}\t{}\t{}",
            template.id(),
            template.name(),
            template.media().id(),
            template.media().display_name()
        )?;
    }
    Ok(())
}

fn default_name(file: &Path) -> String {
    file.file_stem()
        .and_then(|name| name.to_str())
        .unwrap_or("Untitled")
        .to_string()
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, bytes).with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use labelkit_core::document::LabelDocument;
    use tempfile::tempdir;

    fn read_document(path: &Path) -> LabelDocument {
        LabelDocument::from_json(&fs::read_to_string(path).unwrap()).unwrap()
    }

    fn exec(args: &[&str]) -> Result<String> {
        let cli = Cli::try_parse_from(std::iter::once("labelkit").chain(args.iter().copied()))?;
        let mut out = Vec::new();
        execute(cli, &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_templates_listed() {
        let out = exec(&["templates"]).unwrap();
        assert!(out.contains("t_50x30_basic\t"));
        assert!(out.contains("\tlabel100x150\tLabel 100x150 mm\n"));
        assert!(out.contains("t_100x150_basic\t"));
    }

    #[test]
    fn test_new_from_template_and_render() {
        let dir = tempdir().unwrap();
        let design = dir.path().join("label.json");
        let png = dir.path().join("out/label.png");

        exec(&["new", "--template", "t_50x30_basic", "-o", design.to_str().unwrap()]).unwrap();
        let doc = read_document(&design);
        assert_eq!(doc.media, Media::Label50x30);
        assert_eq!(doc.len(), 2);

        let out = exec(&["render", "--file", design.to_str().unwrap(), "-o", png.to_str().unwrap()]).unwrap();
        assert!(out.contains("(400x240)"));
        assert_eq!(&fs::read(&png).unwrap()[..4], b"\x89PNG");
    }

    #[test]
    fn test_unknown_template_is_an_error() {
        let dir = tempdir().unwrap();
        let design = dir.path().join("label.json");
        assert!(exec(&["new", "--template", "nope", "-o", design.to_str().unwrap()]).is_err());
        assert!(!design.exists());
    }

    #[test]
    fn test_library_round_trip() {
        let dir = tempdir().unwrap();
        let store = dir.path().join("store");
        let store = store.to_str().unwrap();
        let design = dir.path().join("shelf.json");
        exec(&["new", "--media", "continuous58", "-o", design.to_str().unwrap()]).unwrap();

        let id = exec(&["--store", store, "save", design.to_str().unwrap()]).unwrap();
        let id = id.trim();
        assert!(id.starts_with('d'));

        let listing = exec(&["--store", store, "list"]).unwrap();
        assert!(listing.starts_with(&format!("{id}\tshelf\tcontinuous58\t")));

        let exported = exec(&["--store", store, "export", id]).unwrap();
        assert!(exported.contains("\"continuous58\""));

        exec(&["--store", store, "delete", id]).unwrap();
        assert_eq!(exec(&["--store", store, "list"]).unwrap(), "");
        assert!(exec(&["--store", store, "export", id]).is_err());
    }

    #[test]
    fn test_import_rejects_invalid_json() {
        let dir = tempdir().unwrap();
        let store = dir.path().join("store");
        let bad = dir.path().join("bad.json");
        fs::write(&bad, "{ not json").unwrap();
        assert!(exec(&["--store", store.to_str().unwrap(), "import", bad.to_str().unwrap()]).is_err());
        assert_eq!(exec(&["--store", store.to_str().unwrap(), "list"]).unwrap(), "");
    }

    #[test]
    fn test_batch_prints_planned_quantities() {
        let dir = tempdir().unwrap();
        let store = dir.path().join("store");
        let store = store.to_str().unwrap();
        let design = dir.path().join("tag.json");
        exec(&["new", "--media", "label55x30", "-o", design.to_str().unwrap()]).unwrap();
        let id = exec(&["--store", store, "save", design.to_str().unwrap()]).unwrap();

        let items = dir.path().join("batch.json");
        fs::write(&items, format!(r#"[{{"designId":"{}","qty":3}}]"#, id.trim())).unwrap();
        let out_dir = dir.path().join("prints");

        let out = exec(&["--store", store, "batch", items.to_str().unwrap(), "--out-dir", out_dir.to_str().unwrap()]).unwrap();
        assert!(out.starts_with("printed 3 labels"));
        assert!(out_dir.join("label-003.png").exists());
        assert!(!out_dir.join("label-004.png").exists());
    }
}
