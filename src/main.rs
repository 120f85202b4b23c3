//! VIG.IA command line
//!
//! Usage:
//!     vigia standards
//!     vigia analyze --inspector "Ana" --project TK-204 --discipline mechanical \
//!         --standard "API 653" --image tank.jpg --pdf verdict.pdf
//!     vigia history --inspector ana
//!     vigia purge --inspector ana --yes

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use vigia_lib::ai::{GeminiClient, ImageInput};
use vigia_lib::config::VigiaConfig;
use vigia_lib::inspection::{
    AnalysisRequest, ElectricalCondition, Inspector, PersistenceStatus, RequestInfo,
    TechnicalContext, VoltageClass, WeldPosition, WeldingProcess,
};
use vigia_lib::report::ReportRenderer;
use vigia_lib::standards::{self, Discipline};
use vigia_lib::store::list_or_empty;

#[derive(Parser, Debug)]
#[command(name = "vigia", about = "Industrial inspection verdicts from field photos")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List disciplines and their reference standards
    Standards {
        /// Only this discipline
        #[arg(long)]
        discipline: Option<String>,
    },

    /// Analyze photos, archive the verdict, optionally write a PDF
    Analyze(AnalyzeArgs),

    /// Show archived inspections, newest first
    History {
        #[arg(long)]
        inspector: Option<String>,
    },

    /// Delete archived inspections
    Purge {
        /// Only this inspector's records
        #[arg(long)]
        inspector: Option<String>,

        /// Required to actually delete
        #[arg(long)]
        yes: bool,
    },

    /// Build a PDF from an existing report text
    Report {
        #[command(flatten)]
        info: InfoArgs,

        /// File with the report text
        #[arg(long)]
        text: PathBuf,

        #[arg(long = "image")]
        images: Vec<PathBuf>,

        #[arg(long)]
        out: PathBuf,
    },
}

#[derive(Args, Debug)]
struct InfoArgs {
    #[arg(long)]
    inspector: String,

    #[arg(long)]
    project: String,

    #[arg(long, value_parser = parse_discipline)]
    discipline: Discipline,

    #[arg(long)]
    standard: String,
}

impl InfoArgs {
    fn into_info(self) -> RequestInfo {
        RequestInfo {
            inspector: self.inspector,
            project: self.project,
            discipline: self.discipline,
            standard: self.standard,
        }
    }
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    #[command(flatten)]
    info: InfoArgs,

    /// Photo to analyze (repeatable)
    #[arg(long = "image", required = true)]
    images: Vec<PathBuf>,

    /// Free technical context; replaces the structured sheet
    #[arg(long)]
    context: Option<String>,

    #[command(flatten)]
    sheet: SheetArgs,

    /// Used only when no key is configured in the environment
    #[arg(long)]
    api_key: Option<String>,

    /// Write the PDF report here
    #[arg(long)]
    pdf: Option<PathBuf>,
}

/// Structured technical sheet overrides
#[derive(Args, Debug, Default)]
struct SheetArgs {
    #[arg(long)]
    diameter: Option<f64>,
    #[arg(long)]
    height: Option<f64>,
    #[arg(long)]
    material: Option<String>,
    #[arg(long)]
    fluid: Option<String>,

    #[arg(long)]
    equipment: Option<String>,
    #[arg(long)]
    voltage: Option<VoltageClass>,
    #[arg(long)]
    load: Option<f64>,
    #[arg(long)]
    condition: Option<ElectricalCondition>,

    #[arg(long)]
    process: Option<WeldingProcess>,
    #[arg(long)]
    position: Option<WeldPosition>,
}

fn parse_discipline(s: &str) -> Result<Discipline, String> {
    Discipline::parse(s).ok_or_else(|| {
        format!(
            "unknown discipline '{}' (expected one of: {})",
            s,
            standards::list_disciplines().join(", ")
        )
    })
}

/// Discipline defaults with any flags applied
fn technical_context(discipline: Discipline, free: Option<String>, sheet: SheetArgs) -> TechnicalContext {
    if let Some(text) = free {
        return TechnicalContext::FreeText(text);
    }

    match TechnicalContext::defaults_for(discipline) {
        TechnicalContext::Mechanical {
            diameter_m,
            height_m,
            material,
            fluid,
        } => TechnicalContext::Mechanical {
            diameter_m: sheet.diameter.unwrap_or(diameter_m),
            height_m: sheet.height.unwrap_or(height_m),
            material: sheet.material.unwrap_or(material),
            fluid: sheet.fluid.unwrap_or(fluid),
        },
        TechnicalContext::Electrical {
            equipment,
            voltage,
            load_amps,
            condition,
        } => TechnicalContext::Electrical {
            equipment: sheet.equipment.unwrap_or(equipment),
            voltage: sheet.voltage.unwrap_or(voltage),
            load_amps: sheet.load.unwrap_or(load_amps),
            condition: sheet.condition.unwrap_or(condition),
        },
        TechnicalContext::Welding { process, position } => TechnicalContext::Welding {
            process: sheet.process.unwrap_or(process),
            position: sheet.position.unwrap_or(position),
        },
        other => other,
    }
}

fn renderer(config: &VigiaConfig) -> ReportRenderer {
    match &config.logo_path {
        Some(path) => ReportRenderer::new().with_logo(path),
        None => ReportRenderer::new(),
    }
}

fn print_standards(discipline: Option<String>) -> Result<(), String> {
    let disciplines = match discipline {
        Some(name) => vec![parse_discipline(&name)?],
        None => Discipline::ALL.to_vec(),
    };

    for discipline in disciplines {
        println!("{} ({})", discipline.label(), discipline.as_str());
        for standard in discipline.standards() {
            println!("  - {}", standard);
        }
    }
    Ok(())
}

async fn analyze(config: &VigiaConfig, args: AnalyzeArgs) -> Result<(), String> {
    let (api_key, source) = config
        .resolve_api_key(args.api_key.as_deref())
        .map_err(|e| e.to_string())?;
    tracing::debug!(?source, "Resolved API key");

    let store = config.build_store().map_err(|e| e.to_string())?;
    let provider = Arc::new(GeminiClient::new(config.gemini_config(api_key)));
    let inspector = Inspector::new(store, provider, config.model_preference());

    let info = args.info.into_info();
    let context = technical_context(info.discipline, args.context, args.sheet);
    let images: Vec<ImageInput> = args.images.into_iter().map(ImageInput::from).collect();

    let request = AnalysisRequest {
        info,
        technical_context: context.render(),
        images,
    };

    let outcome = inspector.analyze(&request).await.map_err(|e| e.to_string())?;

    println!("{}", outcome.report);
    eprintln!();
    eprintln!("Model: {}", outcome.model);
    match &outcome.persistence {
        PersistenceStatus::Stored(record) => eprintln!("Archived: {}", record.summary_line()),
        PersistenceStatus::Failed(reason) => eprintln!("Not archived: {}", reason),
    }

    if let Some(path) = args.pdf {
        let bytes = renderer(config)
            .render_async(request.info.clone(), outcome.report.clone(), request.images.clone())
            .await
            .map_err(|e| e.to_string())?;
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| format!("Failed to write {}: {}", path.display(), e))?;
        eprintln!("PDF written to {}", path.display());
    }

    Ok(())
}

async fn run(cli: Cli) -> Result<(), String> {
    let config = VigiaConfig::from_env().map_err(|e| e.to_string())?;

    match cli.command {
        Command::Standards { discipline } => print_standards(discipline),
        Command::Analyze(args) => analyze(&config, args).await,
        Command::History { inspector } => {
            let store = config.build_store().map_err(|e| e.to_string())?;
            let records = list_or_empty(store.as_ref(), inspector.as_deref()).await;

            if records.is_empty() {
                println!("No inspections archived.");
            }
            for record in records {
                println!("{}  [{}]", record.summary_line(), record.inspector);
            }
            Ok(())
        }
        Command::Purge { inspector, yes } => {
            if !yes {
                return Err("refusing to delete without --yes".to_string());
            }
            let store = config.build_store().map_err(|e| e.to_string())?;
            let removed = store
                .purge(inspector.as_deref())
                .await
                .map_err(|e| e.to_string())?;
            println!("Removed {} record(s)", removed);
            Ok(())
        }
        Command::Report {
            info,
            text,
            images,
            out,
        } => {
            let report_text = tokio::fs::read_to_string(&text)
                .await
                .map_err(|e| format!("Failed to read {}: {}", text.display(), e))?;
            let images = images.into_iter().map(ImageInput::from).collect();

            let bytes = renderer(&config)
                .render_async(info.into_info(), report_text, images)
                .await
                .map_err(|e| e.to_string())?;
            tokio::fs::write(&out, bytes)
                .await
                .map_err(|e| format!("Failed to write {}: {}", out.display(), e))?;
            println!("PDF written to {}", out.display());
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    vigia_lib::load_env();
    vigia_lib::init_tracing();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
