use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::info;

use school_performance_analytics::benchmark::{self, BenchmarkParams};
use school_performance_analytics::chat::ChatSurface;
use school_performance_analytics::context::{self, AnalysisView, CollectionOverview};
use school_performance_analytics::dashboard::{self, DashboardParams};
use school_performance_analytics::import::{self, ImportTarget};
use school_performance_analytics::intervention::{self, InterventionParams};
use school_performance_analytics::models::{
    self, AcademicYear, ClassDefinition, ExamLevel, Student, TeacherDefinition,
};
use school_performance_analytics::risk::{self, RiskParams};
use school_performance_analytics::{catalog, config, export, generator, report};

#[derive(Parser)]
#[command(name = "school-analytics")]
#[command(about = "Academic performance analytics for a school's student records", long_about = None)]
struct Cli {
    /// Import students from a CSV of name, predicted grade, target grade
    #[arg(long, global = true)]
    csv: Option<PathBuf>,
    /// Subject that imported grades and subject-level analyses refer to
    #[arg(long, global = true, default_value = catalog::DEFAULT_SUBJECT)]
    subject: String,
    /// Reference academic year
    #[arg(long, global = true, default_value = "2023/2024")]
    year: AcademicYear,
    /// Size of the generated cohort when nothing is imported
    #[arg(long, global = true, default_value_t = 100)]
    students: usize,
    #[arg(long, global = true, default_value_t = 42)]
    seed: u64,
    /// Print analyzer output as JSON instead of markdown
    #[arg(long, global = true)]
    json: bool,
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List students below target for a subject
    Intervention {
        #[arg(long, default_value_t = 3)]
        target_alps: u8,
    },
    /// Classify exam risk per subject
    Predict {
        #[arg(long, value_enum, default_value = "gcse")]
        level: ExamLevel,
    },
    /// Class snapshot for a teacher's class
    Dashboard {
        #[arg(long, default_value = "classA")]
        class: String,
    },
    /// Multi-year benchmarking
    Benchmark {
        #[arg(long, default_value_t = 4)]
        years: usize,
    },
    /// Write the intervention tracker CSV
    Export {
        #[arg(long, default_value_t = 3)]
        target_alps: u8,
        #[arg(long)]
        out: Option<PathBuf>,
        /// Ask the assistant first and include the exchange in the tracker
        #[arg(long)]
        ask: Option<String>,
        #[command(flatten)]
        provider: ProviderArgs,
    },
    /// Ask the assistant about an analysis
    Chat {
        #[arg(value_enum)]
        tab: Tab,
        question: String,
        #[arg(long, default_value_t = 3)]
        target_alps: u8,
        #[arg(long, value_enum, default_value = "gcse")]
        level: ExamLevel,
        #[arg(long, default_value = "classA")]
        class: String,
        #[arg(long, default_value_t = 4)]
        years: usize,
        #[command(flatten)]
        provider: ProviderArgs,
    },
    /// List the known classes and teachers
    Classes,
}

#[derive(Clone, Copy, ValueEnum)]
enum Tab {
    Intervention,
    Prediction,
    Dashboard,
    Benchmarking,
}

impl Tab {
    fn name(self) -> &'static str {
        match self {
            Tab::Intervention => "intervention",
            Tab::Prediction => "prediction",
            Tab::Dashboard => "dashboard",
            Tab::Benchmarking => "benchmarking",
        }
    }
}

#[derive(clap::Args)]
struct ProviderArgs {
    #[arg(long, env = "GOOGLE_GENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
    #[arg(long, env = "GENAI_MODEL", default_value = config::DEFAULT_MODEL)]
    model: String,
    #[arg(long, env = "GENAI_BASE_URL", default_value = config::DEFAULT_BASE_URL)]
    base_url: String,
}

impl ProviderArgs {
    fn settings(self) -> anyhow::Result<config::CompletionSettings> {
        config::CompletionSettings::resolve(self.api_key, self.model, self.base_url)
    }
}

fn load_students(cli: &Cli) -> anyhow::Result<Vec<Student>> {
    let imported = match &cli.csv {
        Some(path) => {
            let target = ImportTarget {
                subject: cli.subject.clone(),
                year: cli.year,
            };
            import::import_csv_file(path, &target)
                .with_context(|| format!("failed to import {}", path.display()))?
        }
        None => Vec::new(),
    };

    let generated = generator::generate_students(cli.students, cli.seed);
    Ok(models::select_collection(&imported, &generated).to_vec())
}

fn resolve_class(id: &str) -> anyhow::Result<(ClassDefinition, TeacherDefinition)> {
    let class = catalog::find_class(id).with_context(|| format!("unknown class '{id}'"))?;
    let teacher = catalog::find_teacher(&class.teacher_id)
        .with_context(|| format!("class '{id}' references unknown teacher"))?;
    Ok((class, teacher))
}

fn emit<T: Serialize>(json: bool, value: &T, markdown: impl FnOnce() -> String) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        print!("{}", markdown());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    config::init_tracing(cli.verbose);

    let students = load_students(&cli)?;
    info!(students = students.len(), "working collection ready");

    match cli.command {
        Commands::Intervention { target_alps } => {
            let params = InterventionParams {
                subject: cli.subject.clone(),
                target_alps_grade: target_alps,
                year: cli.year,
            };
            let findings = intervention::analyze_interventions(&students, &params);
            emit(cli.json, &findings, || report::render_intervention(&findings))?;
        }
        Commands::Predict { level } => {
            let risks = risk::predict_exam_risk(&students, &RiskParams { level, year: cli.year });
            emit(cli.json, &risks, || report::render_risk(level, &risks))?;
        }
        Commands::Dashboard { class } => {
            let (class, teacher) = resolve_class(&class)?;
            let dashboard = dashboard::build_dashboard(
                &students,
                &DashboardParams {
                    class: class.clone(),
                    year: cli.year,
                },
            );
            emit(cli.json, &dashboard, || {
                report::render_dashboard(&teacher, &class, &dashboard)
            })?;
        }
        Commands::Benchmark { years } => {
            let findings = benchmark::run_benchmark(
                &students,
                &BenchmarkParams {
                    years,
                    anchor: cli.year,
                },
            );
            emit(cli.json, &findings, || report::render_benchmark(&findings))?;
        }
        Commands::Export {
            target_alps,
            out,
            ask,
            provider,
        } => {
            let params = InterventionParams {
                subject: cli.subject.clone(),
                target_alps_grade: target_alps,
                year: cli.year,
            };
            let findings = intervention::analyze_interventions(&students, &params);

            let surface = ChatSurface::new(Tab::Intervention.name());
            if let Some(question) = ask {
                let client = provider.settings()?.client();
                let overview = CollectionOverview::of(&students, cli.year);
                let summary = context::summarize(&overview, &AnalysisView::Intervention(&findings));
                if let Err(error) = surface.ask(&client, &summary, &question).await {
                    eprintln!("Error: {error}");
                }
            }

            let csv = export::build_tracker_csv(&findings.candidates, &surface.transcript())?;
            let out = out.unwrap_or_else(|| PathBuf::from(export::tracker_file_name(&cli.subject)));
            std::fs::write(&out, csv)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!(
                "Tracker with {} students written to {}.",
                findings.candidates.len(),
                out.display()
            );
        }
        Commands::Chat {
            tab,
            question,
            target_alps,
            level,
            class,
            years,
            provider,
        } => {
            let client = provider.settings()?.client();
            let overview = CollectionOverview::of(&students, cli.year);

            let summary = match tab {
                Tab::Intervention => {
                    let findings = intervention::analyze_interventions(
                        &students,
                        &InterventionParams {
                            subject: cli.subject.clone(),
                            target_alps_grade: target_alps,
                            year: cli.year,
                        },
                    );
                    context::summarize(&overview, &AnalysisView::Intervention(&findings))
                }
                Tab::Prediction => {
                    let risks =
                        risk::predict_exam_risk(&students, &RiskParams { level, year: cli.year });
                    context::summarize(&overview, &AnalysisView::ExamRisk { level, risks: &risks })
                }
                Tab::Dashboard => {
                    let (class, teacher) = resolve_class(&class)?;
                    let dashboard = dashboard::build_dashboard(
                        &students,
                        &DashboardParams {
                            class: class.clone(),
                            year: cli.year,
                        },
                    );
                    context::summarize(
                        &overview,
                        &AnalysisView::Dashboard {
                            teacher: &teacher,
                            class: &class,
                            dashboard: &dashboard,
                        },
                    )
                }
                Tab::Benchmarking => {
                    let findings = benchmark::run_benchmark(
                        &students,
                        &BenchmarkParams {
                            years,
                            anchor: cli.year,
                        },
                    );
                    context::summarize(&overview, &AnalysisView::Benchmark(&findings))
                }
            };

            let surface = ChatSurface::new(tab.name());
            match surface.ask(&client, &summary, &question).await {
                Ok(answer) => println!("AI: {answer}"),
                Err(error) => eprintln!("Error: {error}"),
            }
        }
        Commands::Classes => {
            for class in catalog::classes() {
                let teacher = catalog::find_teacher(&class.teacher_id)
                    .map(|teacher| teacher.name)
                    .unwrap_or_default();
                println!(
                    "- {} ({}): {} [{}], year {}",
                    class.id,
                    teacher,
                    class.name,
                    class.subjects.join(", "),
                    class.year_group
                );
            }
        }
    }

    Ok(())
}
