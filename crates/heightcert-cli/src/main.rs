use clap::{Parser, Subcommand};
use dialoguer::{Input, Password};
use dotenvy::dotenv;
use heightcert_cli::admin::create_admin;
use heightcert_cli::seeder::{self, SeedConfig};
use sqlx::PgPool;

#[derive(Parser)]
#[command(name = "heightcert-cli")]
#[command(about = "heightcert CLI - Administrative tools for the training dashboard", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an ADMIN dashboard account
    CreateAdmin {
        #[arg(short = 'f', long)]
        first_name: Option<String>,

        #[arg(short = 'l', long)]
        last_name: Option<String>,

        #[arg(short = 'e', long)]
        email: Option<String>,

        /// Password (will be prompted securely if not provided)
        #[arg(short = 'p', long)]
        password: Option<String>,
    },
    /// Seed fake collaborators, courses, coaches, trainings and enrollments
    Seed {
        #[arg(short = 'c', long, default_value = "100")]
        collaborators: usize,

        #[arg(long, default_value = "4")]
        courses: usize,

        #[arg(long, default_value = "6")]
        coaches: usize,

        #[arg(short = 't', long, default_value = "20")]
        trainings: usize,

        /// Collaborators enrolled in each training
        #[arg(long, default_value = "12")]
        enrollments: usize,
    },
    /// Clear all seeded data (keeps admins and non-seeded rows)
    ClearSeed,
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    let cli = Cli::parse();

    let pool = match heightcert_db::init_db_pool().await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    match cli.command {
        Commands::CreateAdmin {
            first_name,
            last_name,
            email,
            password,
        } => handle_create_admin(&pool, first_name, last_name, email, password).await,
        Commands::Seed {
            collaborators,
            courses,
            coaches,
            trainings,
            enrollments,
        } => {
            let config = SeedConfig::new(collaborators)
                .with_catalogue(courses, coaches)
                .with_trainings(trainings)
                .with_enrollments(enrollments);
            if let Err(e) = seeder::seed_all(&pool, config).await {
                eprintln!("\n❌ Error seeding database: {}", e);
                std::process::exit(1);
            }
        }
        Commands::ClearSeed => {
            if let Err(e) = seeder::clear_all(&pool).await {
                eprintln!("\n❌ Error clearing seeded data: {}", e);
                std::process::exit(1);
            }
        }
    }
}

fn prompt_or(value: Option<String>, prompt: &str) -> Result<String, dialoguer::Error> {
    match value {
        Some(v) => Ok(v),
        None => Input::new().with_prompt(prompt).interact_text(),
    }
}

async fn handle_create_admin(
    pool: &PgPool,
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
    password: Option<String>,
) {
    let prompted = (|| -> Result<_, dialoguer::Error> {
        let first_name = prompt_or(first_name, "First name")?;
        let last_name = prompt_or(last_name, "Last name")?;
        let email = prompt_or(email, "Email address")?;
        let password = match password {
            Some(p) => p,
            None => Password::new()
                .with_prompt("Password")
                .with_confirmation("Confirm password", "Passwords don't match")
                .interact()?,
        };
        Ok((first_name, last_name, email, password))
    })();

    let (first_name, last_name, email, password) = match prompted {
        Ok(values) => values,
        Err(e) => {
            eprintln!("\n❌ Failed to read input: {}", e);
            std::process::exit(1);
        }
    };

    match create_admin(pool, &first_name, &last_name, &email, &password).await {
        Ok(_) => {
            println!("\n✅ Admin created successfully!");
            println!("   Email: {}", email);
            println!("   Name: {} {}", first_name, last_name);
        }
        Err(e) => {
            eprintln!("\n❌ Error creating admin: {}", e);
            std::process::exit(1);
        }
    }
}
