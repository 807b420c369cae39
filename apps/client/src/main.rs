use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use recruit_client::api::{ApiClient, Upload};
use recruit_client::auth::{AuthContext, AuthUser, PollingProfileSource, TokenIdentity};
use recruit_client::config::Config;
use recruit_client::models::application::ApplicationStatus;
use recruit_client::models::cover_letter::Tone;
use recruit_client::models::cv::ExportTemplate;
use recruit_client::models::photo::{Background, PhotoEnhanceParams};
use recruit_client::store::DraftStore;
use recruit_client::workflows::applications::ApplicationTracker;
use recruit_client::workflows::cover_letter::CoverLetterWorkflow;
use recruit_client::workflows::cv_optimizer::CvOptimizer;
use recruit_client::workflows::dashboard::Dashboard;
use recruit_client::workflows::photo::PhotoWorkflow;
use recruit_client::workflows::settings::Settings;
use recruit_client::workflows::{Lifecycle, Phase};

const APP_URL: &str = "http://localhost:3000";

#[derive(Parser)]
#[command(name = "recruit", version, about = "Recruit AI from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the signed-in user's profile and plan
    Profile,
    /// Show usage counters
    Stats,
    /// Score a CV against a job description
    Analyze { cv: PathBuf, jd_file: PathBuf },
    /// Analyze, then rewrite the CV for the job
    Optimize {
        cv: PathBuf,
        jd_file: PathBuf,
        /// Write the optimized CV as PDF here
        #[arg(long)]
        export: Option<PathBuf>,
        #[arg(long, value_enum, ignore_case = true, default_value = "classic")]
        template: ExportTemplate,
    },
    /// Generate a cover letter
    CoverLetter {
        #[arg(long)]
        title: String,
        #[arg(long)]
        company: String,
        #[arg(long)]
        jd_file: PathBuf,
        #[arg(long, value_enum, ignore_case = true, default_value = "classic")]
        tone: Tone,
        #[arg(long)]
        context: Option<String>,
    },
    /// List saved cover letters
    Letters,
    /// Enhance a headshot
    Photo {
        input: PathBuf,
        output: PathBuf,
        #[arg(long, value_enum, ignore_case = true, default_value = "blur")]
        background: Background,
        #[arg(long, default_value_t = 1.1)]
        brightness: f32,
        #[arg(long, default_value_t = 1.1)]
        contrast: f32,
        #[arg(long, default_value_t = 1.2)]
        sharpness: f32,
    },
    /// Job application tracker
    Apps {
        #[command(subcommand)]
        command: AppsCommand,
    },
    /// Start a premium checkout and print its URL
    Upgrade,
    /// Open the billing portal and print its URL
    Portal,
}

#[derive(Subcommand)]
enum AppsCommand {
    List,
    Add {
        #[arg(long)]
        company: String,
        #[arg(long)]
        position: String,
        #[arg(long, value_enum, ignore_case = true, default_value = "saved")]
        status: ApplicationStatus,
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    Status {
        id: String,
        #[arg(value_enum, ignore_case = true)]
        status: ApplicationStatus,
    },
    Delete {
        id: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Recruit client v{} against {}", env!("CARGO_PKG_VERSION"), config.api_url);

    let identity = Arc::new(match &config.id_token {
        Some(token) => TokenIdentity::signed_in(AuthUser::new(config.user_id.clone()), token.clone()),
        None => TokenIdentity::signed_out(),
    });
    let api = ApiClient::new(&config, identity.clone()).context("Failed to build HTTP client")?;
    let profiles = Arc::new(PollingProfileSource::new(api.clone(), config.profile_poll_interval));
    let auth = Arc::new(AuthContext::start(identity, profiles));
    let state = auth.wait_until_loaded().await;

    let host = Host {
        api,
        auth,
        store: DraftStore::new(),
        lifecycle: Lifecycle::new(),
    };

    match cli.command {
        Command::Profile => {
            if !state.is_authenticated() {
                bail!("Not signed in; set RECRUIT_ID_TOKEN");
            }
            print_json(&state.profile)?;
            println!(
                "plan: {}, free uses remaining: {}",
                if state.is_premium() { "premium" } else { "free" },
                state.free_uses_remaining()
            );
        }
        Command::Stats => host.stats().await?,
        Command::Analyze { cv, jd_file } => {
            host.analyze(&cv, &jd_file).await?;
        }
        Command::Optimize {
            cv,
            jd_file,
            export,
            template,
        } => host.optimize(&cv, &jd_file, export.as_deref(), template).await?,
        Command::CoverLetter {
            title,
            company,
            jd_file,
            tone,
            context,
        } => {
            host.cover_letter(title, company, &jd_file, tone, context)
                .await?
        }
        Command::Letters => host.letters().await?,
        Command::Photo {
            input,
            output,
            background,
            brightness,
            contrast,
            sharpness,
        } => {
            let params = PhotoEnhanceParams {
                background,
                brightness,
                contrast,
                sharpness,
            };
            host.photo(&input, &output, params).await?
        }
        Command::Apps { command } => host.apps(command).await?,
        Command::Upgrade => host.upgrade().await?,
        Command::Portal => {
            let settings = Settings::new(host.api.clone(), host.auth.clone(), host.lifecycle.clone());
            match settings.open_portal(&format!("{APP_URL}/settings")).await {
                Some(url) => println!("{url}"),
                None => bail!("Could not open the billing portal"),
            }
        }
    }

    Ok(())
}

/// Everything a command needs to build a workflow.
struct Host {
    api: ApiClient,
    auth: Arc<AuthContext>,
    store: DraftStore,
    lifecycle: Lifecycle,
}

impl Host {
    async fn stats(&self) -> Result<()> {
        let dashboard = Dashboard::new(self.api.clone(), self.auth.clone(), self.lifecycle.clone());
        dashboard.load_stats().await;
        match dashboard.view().stats {
            Some(stats) => print_json(&stats)?,
            None => bail!("Could not load stats"),
        }
        let entitlement = dashboard.entitlement();
        println!(
            "premium: {}, free uses remaining: {}",
            entitlement.is_premium(),
            entitlement.free_uses_remaining
        );
        Ok(())
    }

    fn optimizer(&self) -> CvOptimizer {
        CvOptimizer::new(
            self.api.clone(),
            self.auth.clone(),
            self.store.clone(),
            self.lifecycle.clone(),
        )
    }

    async fn load_inputs(&self, optimizer: &CvOptimizer, cv: &Path, jd_file: &Path) -> Result<()> {
        let file = Upload::from_path(cv)
            .await
            .with_context(|| format!("Failed to read {}", cv.display()))?;
        let description = tokio::fs::read_to_string(jd_file)
            .await
            .with_context(|| format!("Failed to read {}", jd_file.display()))?;
        optimizer.set_file(file);
        optimizer.set_job_description(description);
        Ok(())
    }

    async fn analyze(&self, cv: &Path, jd_file: &Path) -> Result<CvOptimizer> {
        let optimizer = self.optimizer();
        self.load_inputs(&optimizer, cv, jd_file).await?;
        optimizer.analyze().await;

        let view = optimizer.view();
        self.settle(&view.analyze).await?;
        if let Some(analysis) = &view.analysis {
            print_json(analysis)?;
        }
        Ok(optimizer)
    }

    async fn optimize(
        &self,
        cv: &Path,
        jd_file: &Path,
        export: Option<&Path>,
        template: ExportTemplate,
    ) -> Result<()> {
        let optimizer = self.analyze(cv, jd_file).await?;
        optimizer.optimize().await;

        let view = optimizer.view();
        self.settle(&view.optimize).await?;
        if let Some(optimized) = &view.optimized {
            print_json(optimized)?;
        }

        if let Some(path) = export {
            optimizer.set_template(template);
            let Some(pdf) = optimizer.export_pdf().await else {
                bail!("Export failed");
            };
            tokio::fs::write(path, &pdf.bytes)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Wrote {}", path.display());
        }
        Ok(())
    }

    async fn cover_letter(
        &self,
        title: String,
        company: String,
        jd_file: &Path,
        tone: Tone,
        context: Option<String>,
    ) -> Result<()> {
        let description = tokio::fs::read_to_string(jd_file)
            .await
            .with_context(|| format!("Failed to read {}", jd_file.display()))?;

        let workflow = CoverLetterWorkflow::new(
            self.api.clone(),
            self.auth.clone(),
            self.store.clone(),
            self.lifecycle.clone(),
        );
        workflow.set_job_title(title);
        workflow.set_company_name(company);
        workflow.set_job_description(description);
        workflow.set_tone(tone);
        if let Some(context) = context {
            workflow.set_additional_context(context);
        }
        workflow.generate().await;

        let view = workflow.view();
        self.settle(&view.generate).await?;
        if let Some(letter) = view.letter {
            println!("{}\n\n({} words, id {})", letter.content, letter.word_count, letter.id);
        }
        Ok(())
    }

    async fn letters(&self) -> Result<()> {
        let workflow = CoverLetterWorkflow::new(
            self.api.clone(),
            self.auth.clone(),
            self.store.clone(),
            self.lifecycle.clone(),
        );
        workflow.load_history().await;
        for letter in workflow.view().history {
            println!(
                "{}  {} @ {}  ({:?}, {} words)",
                letter.id, letter.job_title, letter.company_name, letter.tone, letter.word_count
            );
        }
        Ok(())
    }

    async fn photo(&self, input: &Path, output: &Path, params: PhotoEnhanceParams) -> Result<()> {
        let file = Upload::from_path(input)
            .await
            .with_context(|| format!("Failed to read {}", input.display()))?;

        let workflow = PhotoWorkflow::new(self.api.clone(), self.auth.clone(), self.lifecycle.clone());
        if !workflow.select_file(file) {
            bail!("{} is not an image", input.display());
        }
        workflow.set_params(params);
        workflow.enhance().await;

        let view = workflow.view();
        self.settle(&view.enhance).await?;
        let Some(blob) = view.result else {
            bail!("No image returned");
        };
        tokio::fs::write(output, &blob.bytes)
            .await
            .with_context(|| format!("Failed to write {}", output.display()))?;
        println!("Wrote {}", output.display());
        Ok(())
    }

    async fn apps(&self, command: AppsCommand) -> Result<()> {
        let tracker = ApplicationTracker::new(self.api.clone(), self.lifecycle.clone());
        tracker.load().await;

        match command {
            AppsCommand::List => {
                for (status, column) in tracker.view().grouped() {
                    println!("{} ({})", status.as_str(), column.len());
                    for app in column {
                        println!("  {}  {} @ {}", app.id, app.position, app.company_name);
                    }
                }
            }
            AppsCommand::Add {
                company,
                position,
                status,
                url,
                notes,
            } => {
                tracker.open_create();
                tracker.update_form(|form| {
                    form.company_name = company;
                    form.position = position;
                    form.status = status;
                    form.job_url = url.unwrap_or_default();
                    form.notes = notes.unwrap_or_default();
                });
                if !tracker.view().form.is_valid() {
                    bail!("Company and position are required");
                }
                tracker.save().await;
                if let Some(message) = tracker.view().save.error() {
                    bail!("{message}");
                }
                println!("Saved");
            }
            AppsCommand::Status { id, status } => {
                if !tracker.change_status(&id, status).await {
                    bail!("Could not update application {id}");
                }
                println!("{id} -> {}", status.as_str());
            }
            AppsCommand::Delete { id, yes } => {
                let confirm = |prompt: &str| yes || ask(prompt);
                if tracker.delete(&id, &confirm).await {
                    println!("Deleted {id}");
                }
            }
        }
        Ok(())
    }

    async fn upgrade(&self) -> Result<()> {
        match self.checkout_url().await {
            Some(url) => println!("{url}"),
            None => bail!("Could not start checkout"),
        }
        Ok(())
    }

    async fn checkout_url(&self) -> Option<String> {
        let settings = Settings::new(self.api.clone(), self.auth.clone(), self.lifecycle.clone());
        settings
            .start_checkout(
                &format!("{APP_URL}/dashboard?upgraded=true"),
                &format!("{APP_URL}/pricing"),
            )
            .await
    }

    /// Turns a finished phase into the command's outcome. Gated actions
    /// print a checkout link instead of failing silently.
    async fn settle(&self, phase: &Phase) -> Result<()> {
        match phase {
            Phase::Failed(message) => bail!("{message}"),
            Phase::Gated => {
                eprintln!("You have used all free AI actions. Upgrade to premium to continue.");
                if let Some(url) = self.checkout_url().await {
                    eprintln!("Checkout: {url}");
                }
                bail!("Upgrade required")
            }
            _ => Ok(()),
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn ask(prompt: &str) -> bool {
    print!("{prompt} [y/N] ");
    if std::io::stdout().flush().is_err() {
        return false;
    }
    let mut line = String::new();
    if std::io::stdin().lock().read_line(&mut line).is_err() {
        return false;
    }
    matches!(line.trim(), "y" | "Y" | "yes")
}
