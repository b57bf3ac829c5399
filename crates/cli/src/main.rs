use clap::{Args, Parser, Subcommand};
use pacientes_core::{
    CoreConfig, PatientForm, PatientService, StoreBackend, DEFAULT_PATIENT_DATA_DIR,
    PATIENTS_COLLECTION,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pacientes")]
#[command(about = "Patient records CLI (file-backed store)")]
struct Cli {
    /// Root directory of the file store
    #[arg(long, env = "PATIENT_DATA_DIR", default_value = DEFAULT_PATIENT_DATA_DIR)]
    data_dir: PathBuf,
    /// Collection holding patient documents
    #[arg(long, env = "PACIENTES_COLLECTION", default_value = PATIENTS_COLLECTION)]
    collection: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List all patients ordered by name
    List,
    /// Show one patient
    Show {
        /// Patient id
        id: String,
    },
    /// Create a patient
    Create(PatientArgs),
    /// Overwrite all fields of a patient
    Update {
        /// Patient id
        id: String,
        #[command(flatten)]
        fields: PatientArgs,
    },
    /// Delete a patient
    Delete {
        /// Patient id
        id: String,
    },
}

/// Patient fields, coerced exactly like the web form.
#[derive(Args)]
struct PatientArgs {
    /// Patient name
    #[arg(long)]
    name: Option<String>,
    /// Birth date (YYYY-MM-DD)
    #[arg(long)]
    birth_date: Option<String>,
    /// Weight in kg
    #[arg(long)]
    weight: Option<String>,
    /// Height in m
    #[arg(long)]
    height: Option<String>,
    /// Blood type code, e.g. O+
    #[arg(long)]
    blood_type: Option<String>,
}

impl From<PatientArgs> for PatientForm {
    fn from(args: PatientArgs) -> Self {
        PatientForm {
            nome_pac: args.name,
            data_nasc_pac: args.birth_date,
            peso_pac: args.weight,
            alt_pac: args.height,
            tipo_sang: args.blood_type,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let cfg = CoreConfig::new(cli.data_dir, cli.collection, StoreBackend::File)?;
    let service = PatientService::from_config(&cfg);

    match cli.command {
        Some(Commands::List) => {
            let patients = service.list_patients()?;
            if patients.is_empty() {
                println!("No patients found.");
            } else {
                for p in patients {
                    println!(
                        "ID: {}, Name: {}, Born: {}, Weight: {}, Height: {}, Blood: {}",
                        p.id,
                        p.name,
                        p.birth_date,
                        p.weight_display(),
                        p.height_display(),
                        p.blood_type
                    );
                }
            }
        }
        Some(Commands::Show { id }) => match service.find_patient(&id)? {
            Some(p) => {
                println!("ID:         {}", p.id);
                println!("Name:       {}", p.name);
                println!("Born:       {}", p.birth_date);
                println!("Weight:     {}", p.weight_display());
                println!("Height:     {}", p.height_display());
                println!("Blood type: {}", p.blood_type);
            }
            None => eprintln!("Patient not found: {}", id),
        },
        Some(Commands::Create(args)) => match service.create_patient(&args.into()) {
            Ok(id) => println!("Created patient with ID: {}", id),
            Err(e) => eprintln!("Error creating patient: {}", e),
        },
        Some(Commands::Update { id, fields }) => {
            match service.update_patient(&id, &fields.into()) {
                Ok(()) => println!("Updated patient: {}", id),
                Err(e) => eprintln!("Error updating patient: {}", e),
            }
        }
        Some(Commands::Delete { id }) => match service.delete_patient(&id) {
            Ok(()) => println!("Deleted patient: {}", id),
            Err(e) => eprintln!("Error deleting patient: {}", e),
        },
        None => {
            println!("Use 'pacientes --help' for commands");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_arguments_map_to_form_fields() {
        let cli = Cli::try_parse_from([
            "pacientes",
            "--data-dir",
            "/tmp/pacientes",
            "create",
            "--name",
            "Ana",
            "--weight",
            "60.5",
            "--blood-type",
            "O+",
        ])
        .expect("arguments should parse");

        assert_eq!(cli.data_dir, PathBuf::from("/tmp/pacientes"));
        let Some(Commands::Create(args)) = cli.command else {
            panic!("expected create command");
        };
        let form = PatientForm::from(args);
        assert_eq!(form.nome_pac.as_deref(), Some("Ana"));
        assert_eq!(form.peso_pac.as_deref(), Some("60.5"));
        assert_eq!(form.tipo_sang.as_deref(), Some("O+"));
        assert_eq!(form.data_nasc_pac, None);
        assert_eq!(form.alt_pac, None);
    }

    #[test]
    fn update_requires_an_id() {
        assert!(Cli::try_parse_from(["pacientes", "update", "--name", "Ana"]).is_err());
    }
}
