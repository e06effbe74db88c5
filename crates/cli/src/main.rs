use clap::{Parser, Subcommand};
use lims_core::{
    seed_file_from_env_value, transition_policy_from_env_value, views_for, CoreConfig, LabStore,
    NewPatient, NewSample, NonEmptyText, Priority, ResultEntrySession, ReviewDecision, Role,
    SampleStatus,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "lims")]
#[command(about = "Laboratory sample and results CLI")]
struct Cli {
    /// Catalog seed file (YAML); falls back to LIMS_CATALOG_FILE
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,
    /// Parameter panel seed file (YAML); falls back to LIMS_PANELS_FILE
    #[arg(long, global = true)]
    panels: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the test catalog
    Tests,
    /// Classify measured values against a test's reference ranges
    Classify {
        /// Catalog test id, e.g. T001
        test_id: String,
        /// Measurements as PARAM=VALUE, e.g. WBC=12000
        values: Vec<String>,
    },
    /// List the views available to a role
    Views {
        /// lab-technician, doctor, patient or researcher
        role: String,
    },
    /// Run an intake, result entry and review cycle and print the summary
    Demo,
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("lims_core=warn".parse()?))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Tests) => {
            let lab = open_store(cli.catalog, cli.panels)?;
            for test in lab.catalog().list() {
                println!(
                    "{}  {:<24} {:<12} {:>4} min  {:>9}  {}{}",
                    test.id,
                    test.name.as_str(),
                    test.category.as_str(),
                    test.duration_minutes,
                    test.price.to_string(),
                    test.sample_kind.as_str(),
                    if test.is_active { "" } else { "  (inactive)" }
                );
            }
        }
        Some(Commands::Classify { test_id, values }) => {
            let lab = open_store(cli.catalog, cli.panels)?;
            let session = classify(&lab, &test_id, &values)?;
            print_session(&session);
        }
        Some(Commands::Views { role }) => {
            let role: Role = role.parse()?;
            println!("{}:", role.display_name());
            for view in views_for(role) {
                println!("  {view}");
            }
        }
        Some(Commands::Demo) => {
            let mut lab = open_store(cli.catalog, cli.panels)?;
            run_demo(&mut lab)?;
        }
        None => {
            println!("Use 'lims --help' for commands");
        }
    }

    Ok(())
}

fn open_store(catalog: Option<PathBuf>, panels: Option<PathBuf>) -> anyhow::Result<LabStore> {
    let catalog = match catalog {
        Some(path) => Some(path),
        None => seed_file_from_env_value(std::env::var("LIMS_CATALOG_FILE").ok())?,
    };
    let panels = match panels {
        Some(path) => Some(path),
        None => seed_file_from_env_value(std::env::var("LIMS_PANELS_FILE").ok())?,
    };
    let policy = transition_policy_from_env_value(std::env::var("LIMS_TRANSITION_POLICY").ok())?;

    let cfg = CoreConfig::new(
        lims_core::constants::DEFAULT_SAMPLE_ID_PREFIX.into(),
        policy,
        catalog,
        panels,
    )?
    .with_lab_name(std::env::var("LIMS_LAB_NAME").ok());
    Ok(LabStore::new(Arc::new(cfg))?)
}

/// Enters `PARAM=VALUE` pairs into a session for `test_id`. Malformed pairs are
/// reported and skipped.
fn classify(lab: &LabStore, test_id: &str, values: &[String]) -> anyhow::Result<ResultEntrySession> {
    let Some(panel) = lab.panels().get(test_id) else {
        anyhow::bail!("no parameter panel for test {test_id}");
    };
    let mut session = ResultEntrySession::new("-", test_id, panel.parameters.clone());
    for pair in values {
        let Some((param, raw)) = pair.split_once('=') else {
            eprintln!("Ignoring '{pair}': expected PARAM=VALUE");
            continue;
        };
        if session.enter(param.trim(), raw).is_none() {
            eprintln!("Ignoring '{pair}': unknown parameter or not a number");
        }
    }
    Ok(session)
}

fn print_session(session: &ResultEntrySession) {
    for value in session.values() {
        let Some(param) = session
            .parameters()
            .iter()
            .find(|p| p.id == value.parameter_id)
        else {
            continue;
        };
        println!(
            "{:<5} {:>12} {:<9} {:<8} (normal {}-{})",
            param.id,
            value.value.to_string(),
            param.unit,
            value.badge().to_string(),
            param.normal_range.min,
            param.normal_range.max
        );
    }
    let counts = session.counts();
    println!(
        "critical: {}, abnormal: {}, normal: {}",
        counts.critical, counts.abnormal, counts.normal
    );
}

fn run_demo(lab: &mut LabStore) -> anyhow::Result<()> {
    let patient = lab.register_patient(NewPatient::named(NonEmptyText::new("Jane Smith")?));
    println!("Registered patient {} ({})", patient.id, patient.name);

    let sample = lab.intake(NewSample {
        patient_id: patient.id.clone(),
        patient_name: String::new(),
        test_definition_ref: "T001".into(),
        status: SampleStatus::Received,
        priority: Priority::Urgent,
        notes: Some("demo run".into()),
    })?;
    println!("Received sample {} for {}", sample.id, sample.test_definition_ref);

    let mut session = lab.start_result_entry(&sample.id)?;
    for (param, raw) in [
        ("WBC", "12000"),
        ("RBC", "4800000"),
        ("HGB", "6.5"),
        ("HCT", "41"),
        ("PLT", "250000"),
    ] {
        session.enter(param, raw);
    }
    session.comment("HGB", "repeat to confirm");
    session.interpret("Severe anaemia with mild leukocytosis.");
    print_session(&session);

    let technician = NonEmptyText::new("Lab Technician")?;
    lab.save_draft(&session, technician.clone())?;
    let submitted = lab.submit(&session, technician)?;
    println!("Submitted result set {} ({})", submitted.id, submitted.status);

    let reviewed = lab.review(&sample.id, NonEmptyText::new("Dr. Reviewer")?, ReviewDecision::Approve)?;
    println!("Review: {}", reviewed.status);

    lab.transition(&sample.id, SampleStatus::Archived)?;
    let report = lab.render_report("RT001", &sample.id)?;
    println!("\n{}\n", report.text);
    println!("{}", serde_json::to_string_pretty(&lab.summary())?);
    Ok(())
}
