use clap::{Parser, Subcommand};
use filelens_scrub::{StripOptions, clean_image_with, extract_metadata};
use std::fs;
use std::path::{Path, PathBuf};

/// Reporta la metadata de un archivo o genera una copia limpia de una imagen.
#[derive(Debug, Parser)]
#[command(name = "filelens-scrub", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Imprime el reporte de metadata en JSON.
    Extract {
        file: PathBuf,
        /// JSON en una sola línea.
        #[arg(long)]
        compact: bool,
    },
    /// Escribe una copia de la imagen sin metadata.
    Clean {
        file: PathBuf,
        /// Directorio de salida; por defecto, junto al original.
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Calidad JPEG (1-100).
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=100))]
        quality: Option<u8>,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(message) = run(cli.command) {
        eprintln!("{message}");
        std::process::exit(1);
    }
}

fn run(command: Command) -> Result<(), String> {
    match command {
        Command::Extract { file, compact } => {
            let bytes = read_input(&file)?;
            let report = extract_metadata(&bytes);
            let rendered = if compact {
                serde_json::to_string(&report)
            } else {
                serde_json::to_string_pretty(&report)
            }
            .map_err(|e| format!("No se pudo serializar el reporte: {}", e))?;
            println!("{rendered}");
            Ok(())
        }
        Command::Clean {
            file,
            output,
            quality,
        } => {
            let bytes = read_input(&file)?;
            let mut options = StripOptions::default();
            if let Some(quality) = quality {
                options.jpeg_quality = quality;
            }

            let original_name = file.file_name().map(|name| name.to_string_lossy());
            let cleaned = clean_image_with(&bytes, original_name.as_deref(), &options)
                .map_err(|e| e.to_string())?;

            let directory = output.unwrap_or_else(|| {
                file.parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| PathBuf::from("."))
            });
            let target = directory.join(&cleaned.file_name);
            fs::write(&target, &cleaned.bytes).map_err(|e| {
                format!("No se pudo guardar la imagen limpia en {}: {}", target.display(), e)
            })?;

            println!("Imagen limpia guardada en {} ({})", target.display(), cleaned.mime);
            Ok(())
        }
    }
}

fn read_input(path: &Path) -> Result<Vec<u8>, String> {
    fs::read(path).map_err(|e| format!("No se pudo leer {}: {}", path.display(), e))
}
