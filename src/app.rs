use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing::debug;
use tracing::level_filters::LevelFilter;

use crate::analyzer::Finding;
use crate::config::{ANALYSIS_DEBOUNCE, ANALYSIS_MIN_CHARS, ANALYSIS_TIMEOUT, DEFAULT_SERVICE_URL, SERVICE_URL_ENV, ServiceConfig};
use crate::controller::EncodedArtifact;
use crate::error::TransferError;
use crate::file::{CarrierFile, discover};
use crate::form::{DecodeForm, EncodeForm};
use crate::preview::{ObjectUrlStore, TempFileStore};
use crate::secret::Password;
use crate::service::HttpService;
use crate::types::{Medium, Operation};
use crate::ui::display;
use crate::ui::progress::Bar;
use crate::ui::prompt::Prompt;

#[derive(Subcommand)]
pub enum Commands {
    /// Hide a message inside an image or WAV file.
    Encode {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        message: Option<String>,

        #[arg(short, long)]
        password: Option<String>,

        /// Directory the encoded carrier is written to.
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,
    },

    /// Reveal the message hidden in a carrier.
    Decode {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        password: Option<String>,
    },

    Interactive,
}

#[derive(Parser)]
#[command(name = "hushbox", version = "26.1.0", about = "Hide secret messages inside images and audio using a steganography service.")]
pub struct App {
    /// Base address of the steganography service.
    #[arg(long, global = true, env = SERVICE_URL_ENV, default_value = DEFAULT_SERVICE_URL)]
    server: String,

    /// Log debug output to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

struct Session {
    service: Arc<HttpService>,
    store: Arc<dyn ObjectUrlStore>,
    prompt: Prompt,
}

impl App {
    pub fn init() -> Result<Self> {
        let app = Self::parse();

        let level = if app.verbose { LevelFilter::DEBUG } else { LevelFilter::WARN };
        let subscriber = tracing_subscriber::fmt().with_writer(std::io::stderr).with_max_level(level).with_file(true).with_line_number(true).finish();
        tracing::subscriber::set_global_default(subscriber)?;

        Ok(app)
    }

    pub async fn execute(self) -> Result<()> {
        let service = HttpService::new(ServiceConfig::new(&self.server)).context("failed to create http client")?;
        let store = TempFileStore::new().context("failed to create preview directory")?;
        let session = Session { service: Arc::new(service), store: Arc::new(store), prompt: Prompt::new() };

        match self.command {
            Some(Commands::Encode { input, message, password, output_dir }) => Self::run_encode(&session, &input, message, password, &output_dir).await,
            Some(Commands::Decode { input, password }) => Self::run_decode(&session, &input, password).await,
            Some(Commands::Interactive) | None => Self::run_interactive(&session).await,
        }
    }

    async fn run_encode(session: &Session, input: &Path, message: Option<String>, password: Option<String>, output_dir: &Path) -> Result<()> {
        let file = CarrierFile::load(input).await?;
        let mut form = EncodeForm::new(Self::medium_of(&file)?, Arc::clone(&session.service), Arc::clone(&session.store));

        form.select_file(file);
        display::show_selection(form.preview(), form.warning());

        let message = match message {
            Some(message) => message,
            None => session.prompt.message()?,
        };
        Self::compose(&mut form, message).await;

        let password = match password.map(Password::from_string) {
            Some(password) => password,
            None => session.prompt.encode_password()?,
        };
        form.set_password(password);
        display::show_strength(form.password_strength());

        let artifact = Self::submit_encode(&mut form).await?;
        let path = artifact.save_in(output_dir).await?;
        display::show_saved(&path);

        Ok(())
    }

    async fn run_decode(session: &Session, input: &Path, password: Option<String>) -> Result<()> {
        let file = CarrierFile::load(input).await?;
        let mut form = DecodeForm::new(Self::medium_of(&file)?, Arc::clone(&session.service), Arc::clone(&session.store));

        form.select_file(file);
        display::show_selection(form.preview(), form.warning());

        let password = match password.map(Password::from_string) {
            Some(password) => password,
            None => session.prompt.decode_password()?,
        };
        form.set_password(password);

        let message = Self::submit_decode(&mut form).await?;
        display::show_decoded(&message);

        Ok(())
    }

    async fn run_interactive(session: &Session) -> Result<()> {
        display::clear_screen()?;
        display::print_banner();

        let operation = session.prompt.select_operation()?;
        let medium = session.prompt.select_medium()?;

        let cwd = std::env::current_dir().context("failed to read current directory")?;
        let files = discover(&cwd, operation, medium);
        if files.is_empty() {
            bail!("no {} files found ({})", medium.label().to_lowercase(), medium.supported_formats());
        }

        display::show_files(&files);
        let path = session.prompt.select_file(&files)?;
        let file = CarrierFile::load(&path).await?;

        match operation {
            Operation::Encode => Self::interactive_encode(session, medium, file, &cwd).await,
            Operation::Decode => Self::interactive_decode(session, medium, file).await,
        }
    }

    async fn interactive_encode(session: &Session, medium: Medium, file: CarrierFile, output_dir: &Path) -> Result<()> {
        let mut form = EncodeForm::new(medium, Arc::clone(&session.service), Arc::clone(&session.store));
        form.select_file(file);
        display::show_selection(form.preview(), form.warning());

        let findings = Self::compose(&mut form, session.prompt.message()?).await;
        if !findings.is_empty() && !session.prompt.confirm_sensitive()? {
            bail!("operation canceled");
        }

        form.set_password(session.prompt.encode_password()?);
        display::show_strength(form.password_strength());

        let artifact = loop {
            match Self::submit_encode(&mut form).await {
                Ok(artifact) => break artifact,
                Err(err) => {
                    display::show_error(&err.to_string());
                    if !session.prompt.confirm_retry()? {
                        bail!("operation canceled");
                    }
                }
            }
        };

        let target = output_dir.join(artifact.file_name());
        if tokio::fs::try_exists(&target).await.unwrap_or(false) && !session.prompt.confirm_overwrite(&target)? {
            bail!("operation canceled");
        }

        let path = artifact.save_in(output_dir).await?;
        display::show_saved(&path);

        Ok(())
    }

    /// Re-prompts for the password until the message is revealed or the form locks.
    async fn interactive_decode(session: &Session, medium: Medium, file: CarrierFile) -> Result<()> {
        let mut form = DecodeForm::new(medium, Arc::clone(&session.service), Arc::clone(&session.store));
        form.select_file(file);
        display::show_selection(form.preview(), form.warning());

        loop {
            display::show_attempts(form.attempts());
            form.set_password(session.prompt.decode_password()?);

            match Self::submit_decode(&mut form).await {
                Ok(message) => {
                    display::show_decoded(&message);
                    return Ok(());
                }
                Err(err @ TransferError::LockedOut) => {
                    display::show_lockout(&err.to_string());
                    return Ok(());
                }
                Err(err) => display::show_error(&err.to_string()),
            }
        }
    }

    /// Sets the message and waits for the analysis of it.
    ///
    /// The wait is bounded by the debounce window plus the analysis timeout, and is
    /// skipped for text too short to be analyzed.
    async fn compose(form: &mut EncodeForm<HttpService>, message: String) -> Vec<Finding> {
        let analyzed = message.chars().count() >= ANALYSIS_MIN_CHARS;
        let mut findings = form.subscribe_findings();
        form.set_message(message);

        if analyzed {
            await_analysis(&mut findings, ANALYSIS_DEBOUNCE + ANALYSIS_TIMEOUT).await;
        }

        let findings = form.findings();
        display::show_findings(&findings);
        findings
    }

    async fn submit_encode(form: &mut EncodeForm<HttpService>) -> Result<EncodedArtifact, TransferError> {
        let bar = Bar::attach(form.progress(), Operation::Encode.progress_label());
        let result = form.submit().await;
        if result.is_ok() { bar.finish() } else { bar.abandon() }
        result
    }

    async fn submit_decode(form: &mut DecodeForm<HttpService>) -> Result<String, TransferError> {
        if form.is_locked() {
            return form.submit().await;
        }

        let bar = Bar::attach(form.progress(), Operation::Decode.progress_label());
        let result = form.submit().await;
        if result.is_ok() { bar.finish() } else { bar.abandon() }
        result
    }

    fn medium_of(file: &CarrierFile) -> Result<Medium> {
        Medium::for_mime(file.mime()).with_context(|| format!("unsupported carrier type {} for {}", file.mime(), file.name()))
    }
}

/// Waits up to `limit` for the next analysis pass. Returns whether one arrived.
async fn await_analysis(findings: &mut watch::Receiver<Vec<Finding>>, limit: Duration) -> bool {
    match tokio::time::timeout(limit, findings.changed()).await {
        Ok(Ok(())) => true,
        Ok(Err(err)) => {
            debug!(%err, "analysis channel closed");
            false
        }
        Err(_) => {
            debug!(?limit, "analysis did not finish in time, continuing without findings");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_await_analysis_sees_update() {
        let (tx, mut rx) = watch::channel(Vec::new());
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(600)).await;
            tx.send_replace(vec![Finding { kind: "email".into(), value: "a@b.io".into() }]);
            tokio::time::sleep(Duration::from_secs(10)).await;
        });

        assert!(await_analysis(&mut rx, Duration::from_secs(1)).await);
        assert_eq!(rx.borrow().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_await_analysis_gives_up_after_limit() {
        let (_tx, mut rx) = watch::channel(Vec::<Finding>::new());
        let start = tokio::time::Instant::now();

        assert!(!await_analysis(&mut rx, Duration::from_secs(1)).await);
        assert!(start.elapsed() >= Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_await_analysis_stops_when_channel_closes() {
        let (tx, mut rx) = watch::channel(Vec::<Finding>::new());
        drop(tx);

        assert!(!await_analysis(&mut rx, Duration::from_secs(1)).await);
    }
}
