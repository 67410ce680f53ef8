mod config;
mod diff;
mod model;
mod photo;
mod remote;
mod repository;
mod urls;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};

use config::Config;
use diff::ListOp;
use model::Contact;
use remote::rest::{NetProbe, RestStore};
use repository::Repository;
use urls::PhotoUrlResolver;

#[derive(Parser, Debug)]
#[command(name = "teledex")]
struct Cli {
    /// Path to the configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List contacts from the remote store
    List,
    /// Show a single contact
    Show(ShowArgs),
    /// Create a new contact
    Add(AddArgs),
    /// Update an existing contact
    Edit(EditArgs),
    /// Delete a contact
    Delete(DeleteArgs),
    /// Upload a photo for an existing contact
    Photo(PhotoArgs),
    /// Poll the list and print only the rows that changed between refreshes
    Watch(WatchArgs),
}

#[derive(Args, Debug)]
struct ShowArgs {
    id: String,
}

#[derive(Args, Debug)]
struct AddArgs {
    #[arg(long)]
    name: String,

    #[arg(long)]
    email: String,

    #[arg(long)]
    phone: String,

    #[arg(long)]
    title: Option<String>,

    #[arg(long)]
    address: Option<String>,

    #[arg(long)]
    status: Option<String>,

    /// Photo file to upload once the contact is created
    #[arg(long, value_name = "FILE")]
    photo: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct EditArgs {
    id: String,

    #[arg(long)]
    name: Option<String>,

    #[arg(long)]
    email: Option<String>,

    #[arg(long)]
    phone: Option<String>,

    #[arg(long)]
    title: Option<String>,

    #[arg(long)]
    address: Option<String>,

    #[arg(long)]
    status: Option<String>,

    /// Photo file to upload after the update
    #[arg(long, value_name = "FILE")]
    photo: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct DeleteArgs {
    id: String,
}

#[derive(Args, Debug)]
struct PhotoArgs {
    id: String,

    #[arg(value_name = "FILE")]
    file: PathBuf,
}

#[derive(Args, Debug)]
struct WatchArgs {
    /// Seconds between refreshes
    #[arg(long, default_value_t = 30)]
    interval: u64,

    /// Stop after this many refreshes instead of running forever
    #[arg(long)]
    rounds: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = config::load(cli.config.as_deref())?;

    let resolver = PhotoUrlResolver::new(
        config.base_url.clone(),
        config.loopback_base_url.clone(),
    );
    let store = Arc::new(RestStore::new(&config));
    let probe = Arc::new(NetProbe::from_base_url(&config.base_url)?);
    let repo = Repository::new(store, probe, resolver.clone());

    match cli.command {
        Command::List => handle_list(&repo).await,
        Command::Show(args) => handle_show(&repo, &resolver, args).await,
        Command::Add(args) => handle_add(&repo, &config, args).await,
        Command::Edit(args) => handle_edit(&repo, &config, args).await,
        Command::Delete(args) => handle_delete(&repo, args).await,
        Command::Photo(args) => handle_photo(&repo, &config, args).await,
        Command::Watch(args) => handle_watch(&repo, args).await,
    }
}

async fn handle_list(repo: &Repository) -> Result<()> {
    repo.load_contacts().await?;

    if *repo.network_error().borrow() {
        bail!("no network connection available");
    }

    let contacts = repo.contacts().borrow().clone();
    if contacts.is_empty() {
        println!("No contacts.");
        return Ok(());
    }

    println!("Found {} contact(s):", contacts.len());
    for contact in &contacts {
        println!(
            "{}\t{}\t{}\t{}",
            contact.id.as_deref().unwrap_or("-"),
            contact.name,
            contact.email,
            contact.phone
        );
    }
    Ok(())
}

async fn handle_show(repo: &Repository, resolver: &PhotoUrlResolver, args: ShowArgs) -> Result<()> {
    repo.get_contact(args.id).await?;

    if let Some(message) = repo.error().borrow().clone() {
        bail!(message);
    }
    let contact = repo
        .selected_contact()
        .borrow()
        .clone()
        .context("contact not loaded")?;

    println!("Name:    {}", contact.name);
    println!("Email:   {}", contact.email);
    println!("Phone:   {}", contact.phone);
    println!(
        "Title:   {}",
        contact.title.as_deref().unwrap_or("No title provided")
    );
    println!(
        "Address: {}",
        contact.address.as_deref().unwrap_or("No address provided")
    );
    println!(
        "Status:  {}",
        contact.status.as_deref().unwrap_or("No status provided")
    );
    match contact.photo_url.as_deref() {
        Some(url) => println!("Photo:   {}", resolver.resolve(url)),
        None => println!("Photo:   {}", photo::PLACEHOLDER_ASSET),
    }
    Ok(())
}

async fn handle_add(repo: &Repository, config: &Config, args: AddArgs) -> Result<()> {
    require_filled(&args.name, &args.email, &args.phone)?;

    let contact = Contact {
        id: None,
        name: args.name,
        title: args.title,
        email: args.email,
        phone: args.phone,
        address: args.address,
        status: args.status,
        photo_url: None,
    };

    repo.create_new_contact(contact).await?;
    finish_save(repo, config, args.photo.as_deref(), "Created").await
}

async fn handle_edit(repo: &Repository, config: &Config, args: EditArgs) -> Result<()> {
    repo.get_contact(args.id.clone()).await?;
    if let Some(message) = repo.error().borrow().clone() {
        bail!(message);
    }
    let Some(mut contact) = repo.selected_contact().borrow().clone() else {
        bail!("contact {} not found", args.id);
    };

    if let Some(name) = args.name {
        contact.name = name;
    }
    if let Some(email) = args.email {
        contact.email = email;
    }
    if let Some(phone) = args.phone {
        contact.phone = phone;
    }
    if args.title.is_some() {
        contact.title = args.title;
    }
    if args.address.is_some() {
        contact.address = args.address;
    }
    if args.status.is_some() {
        contact.status = args.status;
    }
    // The save payload never carries a photo URL; photos travel through the
    // dedicated upload endpoint.
    contact.photo_url = None;

    require_filled(&contact.name, &contact.email, &contact.phone)?;

    repo.update_contact(contact).await?;
    finish_save(repo, config, args.photo.as_deref(), "Updated").await
}

async fn handle_delete(repo: &Repository, args: DeleteArgs) -> Result<()> {
    repo.delete_contact(&args.id).await?;
    println!("Deleted contact {}", args.id);
    Ok(())
}

async fn handle_photo(repo: &Repository, config: &Config, args: PhotoArgs) -> Result<()> {
    upload_photo_file(repo, config, Some(&args.id), &args.file).await
}

async fn handle_watch(repo: &Repository, args: WatchArgs) -> Result<()> {
    let mut shown: Vec<Contact> = Vec::new();
    let mut rounds = 0u64;

    loop {
        repo.load_contacts().await?;
        if *repo.network_error().borrow() {
            bail!("no network connection available");
        }
        let latest = repo.contacts().borrow().clone();

        let ops = diff::diff(&shown, &latest);
        if ops.is_empty() {
            println!("No changes ({} contact(s))", latest.len());
        } else {
            for op in &ops {
                match op {
                    ListOp::Insert { index } => println!("+ {}", row(&latest[*index])),
                    ListOp::Remove { index } => println!("- {}", row(&shown[*index])),
                    ListOp::Move { from, to } => {
                        println!("> {} now at row {}", row(&shown[*from]), to)
                    }
                    ListOp::Update { index } => println!("* {}", row(&latest[*index])),
                }
            }
        }
        shown = latest;

        rounds += 1;
        if let Some(max) = args.rounds {
            if rounds >= max {
                break;
            }
        }
        tokio::time::sleep(Duration::from_secs(args.interval)).await;
    }
    Ok(())
}

fn row(contact: &Contact) -> String {
    format!(
        "{}\t{}",
        contact.id.as_deref().unwrap_or("-"),
        contact.name
    )
}

/// Name, email and phone are mandatory on every save.
fn require_filled(name: &str, email: &str, phone: &str) -> Result<()> {
    if name.trim().is_empty() || email.trim().is_empty() || phone.trim().is_empty() {
        bail!("name, email and phone must not be blank");
    }
    Ok(())
}

/// Report the outcome of a create/update and chain the optional photo
/// upload onto the freshly assigned id.
async fn finish_save(
    repo: &Repository,
    config: &Config,
    photo_file: Option<&Path>,
    verb: &str,
) -> Result<()> {
    let result = repo
        .operation_result()
        .borrow()
        .clone()
        .context("no operation result")?;

    match result {
        Ok(saved) => {
            println!(
                "{} contact {} ({})",
                verb,
                saved.name,
                saved.id.as_deref().unwrap_or("?")
            );
            if let Some(file) = photo_file {
                upload_photo_file(repo, config, saved.id.as_deref(), file).await?;
            }
            Ok(())
        }
        Err(message) => bail!(message),
    }
}

async fn upload_photo_file(
    repo: &Repository,
    config: &Config,
    id: Option<&str>,
    file: &Path,
) -> Result<()> {
    let (bytes, file_name) = photo::prepare_upload(file)?;
    // Stage a normalized copy first; the upload reads the staged file.
    let staged = photo::stage_photo(config, &bytes)?;
    let bytes = std::fs::read(&staged)?;
    let body = repo.upload_photo(id, bytes, &file_name).await?;
    println!("Uploaded photo: {body}");
    Ok(())
}
