use std::path::Path;

use pst::config::{ReaderConfig, input_path};
use pst::messaging::{AttachmentData, Folder, PstError, PstFile};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pst=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration from environment variables
    let config = match ReaderConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };
    let path = match input_path(std::env::args().nth(1)) {
        Ok(path) => path,
        Err(e) => {
            tracing::error!("No input file (pass a path or set PST_FILE): {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(
        "Loaded configuration: verify_crc={}, lazy_btrees={}, collection_policy={:?}",
        config.verify_crc,
        config.lazy_btrees,
        config.collection_policy
    );

    if let Err(e) = run(&path, config) {
        tracing::error!("Failed to read {}: {e}", path.display());
        std::process::exit(1);
    }
}

fn run(path: &Path, config: ReaderConfig) -> Result<(), PstError> {
    let pst = PstFile::open(path, config)?;
    println!("{}", pst.header());

    let store = pst.message_store()?;
    println!(
        "Store: {}{}",
        store.display_name()?.unwrap_or_default(),
        if store.has_password()? { " (password protected)" } else { "" }
    );
    match pst.name_to_id_map() {
        Ok(map) => println!("Named properties: {}", map.len()),
        Err(e) => tracing::warn!("Name-to-ID map unavailable: {e}"),
    }

    let root = pst.root_folder()?;
    print_folder(&pst, &root, 0)
}

fn print_folder(pst: &PstFile, folder: &Folder<'_>, depth: usize) -> Result<(), PstError> {
    let indent = "  ".repeat(depth);
    println!(
        "{indent}{} [{}] ({} messages, {} unread)",
        folder.display_name()?.unwrap_or_else(|| "<unnamed>".to_string()),
        folder.nid(),
        folder.content_count()?.unwrap_or(0),
        folder.unread_count()?.unwrap_or(0),
    );

    let contents = folder.contents()?;
    for summary in &contents.items {
        println!(
            "{indent}  - {} ({})",
            summary.subject.as_deref().unwrap_or("<no subject>"),
            summary.kind
        );
        let message = summary.open(pst)?;
        for attachment in &message.attachments()?.items {
            let described = match attachment.data()? {
                Some(AttachmentData::Bytes(bytes)) => format!("{} bytes", bytes.len()),
                Some(AttachmentData::Embedded(_)) => "embedded message".to_string(),
                Some(AttachmentData::Reference(target)) => format!("link to {target}"),
                Some(AttachmentData::Storage(object)) => format!("storage object {}", object.nid),
                None => "no data".to_string(),
            };
            println!(
                "{indent}      attachment {}: {described}",
                attachment.filename()?.unwrap_or_else(|| "<unnamed>".to_string())
            );
        }
    }
    if !contents.is_complete() {
        tracing::warn!(
            folder = %folder.nid(),
            skipped = contents.failures.len(),
            "some messages could not be listed"
        );
    }

    for subfolder in &folder.subfolders()?.items {
        print_folder(pst, subfolder, depth + 1)?;
    }
    Ok(())
}
